//! Configuration for the OCR pipeline.

use serde::{Deserialize, Serialize};

use crate::core::errors::{OcrError, OcrResult};
use crate::processors::NormalizationKind;

/// Tunable parameters of the OCR pipeline.
///
/// All fields have defaults, so a partial JSON document is enough:
///
/// ```rust
/// use craft_ocr::pipeline::PipelineConfig;
///
/// let config = PipelineConfig::from_json(r#"{ "text_threshold": 0.7, "link_threshold": 0.4 }"#).unwrap();
/// assert_eq!(config.min_area, 10);
/// ```
///
/// The normalization kinds are part of each model's contract. Feeding a
/// model values normalized differently from its training data degrades
/// accuracy without raising any error, so they are configured per model
/// rather than shared.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sigmoid probability above which a detector position counts as text.
    pub text_threshold: f32,
    /// Sigmoid probability above which a detector position counts as a link.
    pub link_threshold: f32,
    /// Minimum blob area, in mask cells, for a detection to survive.
    pub min_area: usize,
    /// Byte normalization the detector was trained with.
    pub detector_normalization: NormalizationKind,
    /// Byte normalization the recognizer was trained with.
    pub recognizer_normalization: NormalizationKind,
    /// Recognizer alphabet override. `None` selects the stock alphabet.
    pub alphabet: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            text_threshold: 0.5,
            link_threshold: 0.5,
            min_area: 10,
            detector_normalization: NormalizationKind::Linear,
            recognizer_normalization: NormalizationKind::Linear,
            alphabet: None,
        }
    }
}

impl PipelineConfig {
    /// Loads a configuration from a JSON document.
    pub fn from_json(json: &str) -> OcrResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| OcrError::config_error(format!("invalid pipeline config: {e}")))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either threshold lies outside (0, 1), the
    /// minimum area is zero, or an explicit alphabet is empty.
    pub fn validate(&self) -> OcrResult<()> {
        for (name, value) in [
            ("text_threshold", self.text_threshold),
            ("link_threshold", self.link_threshold),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(OcrError::config_error(format!(
                    "{name} must lie strictly between 0 and 1, got {value}"
                )));
            }
        }

        if self.min_area == 0 {
            return Err(OcrError::config_error("min_area must be at least 1"));
        }

        if let Some(alphabet) = &self.alphabet {
            if alphabet.is_empty() {
                return Err(OcrError::config_error("alphabet override must not be empty"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = PipelineConfig::from_json(r#"{ "min_area": 5 }"#).unwrap();
        assert_eq!(config.min_area, 5);
        assert_eq!(config.text_threshold, 0.5);
        assert_eq!(config.detector_normalization, NormalizationKind::Linear);
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = PipelineConfig::default();
        config.recognizer_normalization = NormalizationKind::ZeroCentered;
        config.alphabet = Some("AB".to_string());

        let json = serde_json::to_string(&config).unwrap();
        let parsed = PipelineConfig::from_json(&json).unwrap();
        assert_eq!(
            parsed.recognizer_normalization,
            NormalizationKind::ZeroCentered
        );
        assert_eq!(parsed.alphabet.as_deref(), Some("AB"));
    }

    #[test]
    fn test_out_of_range_threshold_is_rejected() {
        let mut config = PipelineConfig::default();
        config.text_threshold = 1.0;
        assert!(config.validate().is_err());

        config.text_threshold = 0.5;
        config.link_threshold = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_alphabet_is_rejected() {
        let mut config = PipelineConfig::default();
        config.alphabet = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        assert!(matches!(
            PipelineConfig::from_json("not json"),
            Err(OcrError::ConfigError { .. })
        ));
    }
}
