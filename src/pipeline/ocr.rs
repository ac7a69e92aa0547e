//! The pipeline orchestrator.
//!
//! [`OcrPipeline`] is the only component aware of the two external
//! collaborators. It sequences, per image: normalize for the detector,
//! detect, threshold into masks, extract components, map boxes to image
//! coordinates, then per box: crop, normalize, recognize, decode.
//!
//! A detector-stage failure aborts the image with its specific error. A
//! recognizer-stage failure stays local to its box: the per-box loop
//! captures it into that region's result so the remaining boxes still come
//! back with text.

use tracing::{debug, warn};

use crate::core::buffer::PixelBuffer;
use crate::core::errors::{OcrError, OcrResult};
use crate::core::tensor::{ResolvedLayout, TensorSpec};
use crate::core::traits::{ImageSource, InferenceEngine};
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::result::{OcrOutput, RecognizedText, TextRegion};
use crate::processors::connected::ConnectedComponentExtractor;
use crate::processors::decode::CtcGreedyDecode;
use crate::processors::geometry::{BoundingBox, CoordinateMapper};
use crate::processors::normalization::ImageNormalizer;
use crate::processors::postprocess::CraftPostProcess;

/// The end-to-end two-stage OCR pipeline.
///
/// Build one with [`OcrPipelineBuilder`]. The pipeline is stateless per
/// invocation: every buffer it creates lives inside one [`Self::process`]
/// call, so a single pipeline can serve concurrent callers as long as the
/// engines allow it.
pub struct OcrPipeline {
    detector: Box<dyn InferenceEngine>,
    recognizer: Box<dyn InferenceEngine>,
    detection: CraftPostProcess,
    extractor: ConnectedComponentExtractor,
    decoder: CtcGreedyDecode,
    det_normalizer: ImageNormalizer,
    rec_normalizer: ImageNormalizer,
    det_input: TensorSpec,
    det_resolved: ResolvedLayout,
    det_output_dims: (usize, usize, usize),
    rec_input: TensorSpec,
    rec_resolved: ResolvedLayout,
    rec_sequence_dims: (usize, usize),
}

impl std::fmt::Debug for OcrPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrPipeline")
            .field("detector", &self.detector.name())
            .field("recognizer", &self.recognizer.name())
            .finish()
    }
}

impl OcrPipeline {
    /// Runs the full pipeline over one image.
    ///
    /// Returns the detected regions in discovery order. Zero detections
    /// yield an empty output without ever invoking the recognizer.
    pub fn process(&self, source: &dyn ImageSource) -> OcrResult<OcrOutput> {
        let (original_width, original_height) = source.dimensions();
        if original_width == 0 || original_height == 0 {
            return Err(OcrError::invalid_geometry(format!(
                "source image has zero dimension: {original_width}x{original_height}"
            )));
        }

        debug!(
            "running detector '{}' on {}x{} image",
            self.detector.name(),
            original_width,
            original_height
        );

        let frame = source.read_region(
            None,
            self.det_resolved.width as u32,
            self.det_resolved.height as u32,
        )?;
        let input = self.det_normalizer.apply(&frame, &self.det_input)?;
        let output = self.detector.run(input).map_err(|e| {
            OcrError::inference(self.detector.name(), "text detection inference failed", e)
        })?;

        let (out_height, out_width, out_channels) = self.det_output_dims;
        let scores = output.to_f32();
        let map = self
            .detection
            .apply(&scores, out_height, out_width, out_channels)?;

        let boxes = self
            .extractor
            .extract(&map.text_mask, map.width, map.height)?;
        if boxes.is_empty() {
            debug!("no text detected");
            return Ok(OcrOutput::default());
        }
        debug!("detected {} text regions", boxes.len());

        let mapper = CoordinateMapper::new(
            (map.width as u32, map.height as u32),
            (
                self.det_resolved.width as u32,
                self.det_resolved.height as u32,
            ),
            (original_width, original_height),
        )?;
        let mapped: Vec<BoundingBox> = boxes.iter().map(|b| mapper.map(b)).collect();

        let regions = self.recognize_regions(source, mapped);
        Ok(OcrOutput { regions })
    }

    /// Crops, normalizes, and recognizes every mapped box.
    ///
    /// Failures are captured per box; the output vector always has one
    /// entry per input box, in input order.
    fn recognize_regions(
        &self,
        source: &dyn ImageSource,
        mapped: Vec<BoundingBox>,
    ) -> Vec<TextRegion> {
        let mut recognitions: Vec<Option<Result<RecognizedText, OcrError>>> =
            (0..mapped.len()).map(|_| None).collect();

        // Crop everything first so normalization can run as one batch.
        let mut pending: Vec<(usize, PixelBuffer)> = Vec::with_capacity(mapped.len());
        for (index, bbox) in mapped.iter().enumerate() {
            match source.read_region(
                Some(bbox),
                self.rec_resolved.width as u32,
                self.rec_resolved.height as u32,
            ) {
                Ok(buffer) => pending.push((index, buffer)),
                Err(e) => {
                    warn!("crop failed for region {}: {}", index, e);
                    recognitions[index] = Some(Err(e));
                }
            }
        }

        let (indices, buffers): (Vec<usize>, Vec<PixelBuffer>) = pending.into_iter().unzip();
        let tensors = self.rec_normalizer.apply_batch(buffers, &self.rec_input);

        let (time_steps, num_classes) = self.rec_sequence_dims;
        for (index, prepared) in indices.into_iter().zip(tensors) {
            let outcome = prepared.and_then(|tensor| {
                let output = self.recognizer.run(tensor).map_err(|e| {
                    OcrError::inference(
                        self.recognizer.name(),
                        "text recognition inference failed",
                        e,
                    )
                })?;
                let scores = output.to_f32();
                let (text, confidence) = self.decoder.apply(&scores, time_steps, num_classes)?;
                Ok(RecognizedText {
                    text: text.into(),
                    confidence,
                })
            });
            if let Err(e) = &outcome {
                warn!("recognition failed for region {}: {}", index, e);
            }
            recognitions[index] = Some(outcome);
        }

        mapped
            .into_iter()
            .zip(recognitions)
            .map(|(bounding_box, recognition)| TextRegion {
                bounding_box,
                recognition: recognition.unwrap_or_else(|| {
                    Err(OcrError::invalid_input(
                        "recognition was not attempted for this region",
                    ))
                }),
            })
            .collect()
    }
}

/// Builder for [`OcrPipeline`].
///
/// Validates the configuration and both engine contracts up front, so a
/// misdeclared model shape fails at build time instead of mid-image.
#[derive(Debug, Default)]
pub struct OcrPipelineBuilder {
    config: PipelineConfig,
}

impl OcrPipelineBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the detector text threshold.
    pub fn text_threshold(mut self, value: f32) -> Self {
        self.config.text_threshold = value;
        self
    }

    /// Sets the detector link threshold.
    pub fn link_threshold(mut self, value: f32) -> Self {
        self.config.link_threshold = value;
        self
    }

    /// Sets the minimum blob area.
    pub fn min_area(mut self, value: usize) -> Self {
        self.config.min_area = value;
        self
    }

    /// Overrides the recognizer alphabet.
    pub fn alphabet(mut self, alphabet: impl Into<String>) -> Self {
        self.config.alphabet = Some(alphabet.into());
        self
    }

    /// Builds the pipeline around the two engines.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid, either engine declares no
    /// inputs or outputs, an input layout cannot be resolved, or the
    /// declared output shapes are unusable.
    pub fn build(
        self,
        detector: Box<dyn InferenceEngine>,
        recognizer: Box<dyn InferenceEngine>,
    ) -> OcrResult<OcrPipeline> {
        self.config.validate()?;

        let det_input = first_spec(detector.as_ref(), detector.inputs(), "input")?.clone();
        let det_resolved = det_input.resolve_layout()?;
        let det_output = first_spec(detector.as_ref(), detector.outputs(), "output")?;
        let det_output_dims = detection_output_dims(detector.name(), det_output)?;

        let rec_input = first_spec(recognizer.as_ref(), recognizer.inputs(), "input")?.clone();
        let rec_resolved = rec_input.resolve_layout()?;
        let rec_output = first_spec(recognizer.as_ref(), recognizer.outputs(), "output")?;
        let rec_sequence_dims = sequence_dims(recognizer.name(), rec_output)?;

        Ok(OcrPipeline {
            detection: CraftPostProcess::new(
                Some(self.config.text_threshold),
                Some(self.config.link_threshold),
            ),
            extractor: ConnectedComponentExtractor::new(Some(self.config.min_area)),
            decoder: CtcGreedyDecode::new(self.config.alphabet.as_deref()),
            det_normalizer: ImageNormalizer::new(self.config.detector_normalization),
            rec_normalizer: ImageNormalizer::new(self.config.recognizer_normalization),
            detector,
            recognizer,
            det_input,
            det_resolved,
            det_output_dims,
            rec_input,
            rec_resolved,
            rec_sequence_dims,
        })
    }
}

/// The first declared spec of an engine, or a configuration error.
fn first_spec<'a>(
    engine: &dyn InferenceEngine,
    specs: &'a [TensorSpec],
    role: &str,
) -> OcrResult<&'a TensorSpec> {
    specs.first().ok_or_else(|| {
        OcrError::config_error(format!("model '{}' declares no {role}s", engine.name()))
    })
}

/// Spatial dims and channel count of the detector's declared output.
///
/// Detector score maps are channel-last; a two-channel map never qualifies
/// for shape-based layout inference, so the order is part of the model
/// contract rather than inferred.
fn detection_output_dims(name: &str, spec: &TensorSpec) -> OcrResult<(usize, usize, usize)> {
    match spec.shape.as_slice() {
        [_, height, width, channels] if *channels >= 2 => Ok((*height, *width, *channels)),
        [_, _, _, channels] => Err(OcrError::config_error(format!(
            "model '{name}' output declares {channels} channels, need text and link"
        ))),
        _ => Err(OcrError::config_error(format!(
            "model '{name}' output shape must be 4-D, got {:?}",
            spec.shape
        ))),
    }
}

/// Timestep and class counts from the recognizer's declared output.
///
/// Accepts both `[batch, timesteps, classes]` and 4-D declarations; the
/// last two dimensions are the sequence.
fn sequence_dims(name: &str, spec: &TensorSpec) -> OcrResult<(usize, usize)> {
    match spec.shape.as_slice() {
        [.., time_steps, num_classes] if spec.shape.len() >= 3 => Ok((*time_steps, *num_classes)),
        _ => Err(OcrError::config_error(format!(
            "model '{name}' output shape must declare timesteps and classes, got {:?}",
            spec.shape
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tensor::{DType, Layout, Tensor};
    use std::cell::{Cell, RefCell};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Detector stub: declared 32x32 RGB input, 16x16x2 output map.
    struct StubDetector {
        inputs: Vec<TensorSpec>,
        outputs: Vec<TensorSpec>,
        logits: Vec<f32>,
    }

    impl StubDetector {
        /// Builds a detector whose text channel is strongly positive inside
        /// the given mask rectangles and strongly negative elsewhere.
        fn with_blobs(blobs: &[(usize, usize, usize, usize)]) -> Self {
            let (height, width, channels) = (16, 16, 2);
            let mut logits = vec![-9.0f32; height * width * channels];
            for &(bx, by, bw, bh) in blobs {
                for y in by..by + bh {
                    for x in bx..bx + bw {
                        logits[(y * width + x) * channels] = 9.0;
                    }
                }
            }
            Self {
                inputs: vec![TensorSpec::new(vec![1, 32, 32, 3], DType::Float32)],
                outputs: vec![TensorSpec::new(vec![1, 16, 16, 2], DType::Float32)],
                logits,
            }
        }
    }

    impl InferenceEngine for StubDetector {
        fn name(&self) -> &str {
            "stub-detector"
        }
        fn inputs(&self) -> &[TensorSpec] {
            &self.inputs
        }
        fn outputs(&self) -> &[TensorSpec] {
            &self.outputs
        }
        fn run(&self, input: Tensor) -> OcrResult<Tensor> {
            assert_eq!(input.shape(), &[1, 32, 32, 3]);
            Tensor::from_f32(self.logits.clone(), &[1, 16, 16, 2], Layout::Hwc)
        }
    }

    /// Recognizer stub: 32x8 grayscale input, 5 timesteps over 3 classes,
    /// always predicting the class sequence [0, 1, 1, 0, 2].
    struct StubRecognizer {
        inputs: Vec<TensorSpec>,
        outputs: Vec<TensorSpec>,
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl StubRecognizer {
        fn new(calls: Arc<AtomicUsize>, fail: bool) -> Self {
            Self {
                inputs: vec![TensorSpec::new(vec![1, 8, 32, 1], DType::Float32)],
                outputs: vec![TensorSpec::new(vec![1, 5, 3], DType::Float32)],
                calls,
                fail,
            }
        }
    }

    impl InferenceEngine for StubRecognizer {
        fn name(&self) -> &str {
            "stub-recognizer"
        }
        fn inputs(&self) -> &[TensorSpec] {
            &self.inputs
        }
        fn outputs(&self) -> &[TensorSpec] {
            &self.outputs
        }
        fn run(&self, input: Tensor) -> OcrResult<Tensor> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(OcrError::invalid_input("engine exploded"));
            }
            assert_eq!(input.shape(), &[1, 8, 32, 1]);
            let winners = [0usize, 1, 1, 0, 2];
            let mut scores = vec![0.0f32; 5 * 3];
            for (t, &w) in winners.iter().enumerate() {
                scores[t * 3 + w] = 1.0;
            }
            Tensor::from_f32(scores, &[1, 5, 3], Layout::Hwc)
        }
    }

    /// Image source stub handing out gray buffers at any requested size.
    struct StubSource {
        width: u32,
        height: u32,
        crops: RefCell<Vec<BoundingBox>>,
        fail_crop_index: Cell<Option<usize>>,
    }

    impl StubSource {
        fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                crops: RefCell::new(Vec::new()),
                fail_crop_index: Cell::new(None),
            }
        }
    }

    impl ImageSource for StubSource {
        fn dimensions(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn read_region(
            &self,
            region: Option<&BoundingBox>,
            target_width: u32,
            target_height: u32,
        ) -> OcrResult<PixelBuffer> {
            if let Some(bbox) = region {
                let crop_index = self.crops.borrow().len();
                self.crops.borrow_mut().push(*bbox);
                if self.fail_crop_index.get() == Some(crop_index) {
                    return Err(OcrError::invalid_input("simulated decode failure"));
                }
            }
            PixelBuffer::new(
                vec![128u8; target_width as usize * target_height as usize * 3],
                target_width,
                target_height,
            )
        }
    }

    fn build_pipeline(
        detector: StubDetector,
        recognizer: StubRecognizer,
    ) -> OcrResult<OcrPipeline> {
        OcrPipelineBuilder::new()
            .alphabet("AB")
            .min_area(10)
            .build(Box::new(detector), Box::new(recognizer))
    }

    #[test]
    fn test_empty_mask_skips_recognizer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = build_pipeline(
            StubDetector::with_blobs(&[]),
            StubRecognizer::new(Arc::clone(&calls), false),
        )
        .unwrap();
        let source = StubSource::new(64, 64);

        let output = pipeline.process(&source).unwrap();
        assert!(output.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(source.crops.borrow().is_empty());
    }

    #[test]
    fn test_detects_and_recognizes_in_discovery_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = build_pipeline(
            StubDetector::with_blobs(&[(2, 2, 4, 4), (9, 9, 5, 5)]),
            StubRecognizer::new(Arc::clone(&calls), false),
        )
        .unwrap();
        let source = StubSource::new(64, 64);

        let output = pipeline.process(&source).unwrap();
        assert_eq!(output.regions.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // The 16x16 mask maps onto the 64x64 image with a factor of 4.
        assert_eq!(output.regions[0].bounding_box, BoundingBox::new(8, 8, 16, 16));
        assert_eq!(
            output.regions[1].bounding_box,
            BoundingBox::new(36, 36, 20, 20)
        );

        // [0, 1, 1, 0, 2] collapses to classes [1, 2] under alphabet "AB".
        for region in &output.regions {
            let text = region.text().expect("recognition should succeed");
            assert_eq!(text.text.as_ref(), "AB");
        }
    }

    #[test]
    fn test_crop_failure_stays_local_to_its_box() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = build_pipeline(
            StubDetector::with_blobs(&[(2, 2, 4, 4), (9, 9, 5, 5)]),
            StubRecognizer::new(Arc::clone(&calls), false),
        )
        .unwrap();
        let source = StubSource::new(64, 64);
        source.fail_crop_index.set(Some(1));

        let output = pipeline.process(&source).unwrap();
        assert_eq!(output.regions.len(), 2);
        assert!(output.regions[0].recognition.is_ok());
        assert!(output.regions[1].recognition.is_err());
        // Only the surviving crop reaches the recognizer.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_engine_failure_is_captured_per_box() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = build_pipeline(
            StubDetector::with_blobs(&[(2, 2, 4, 4)]),
            StubRecognizer::new(Arc::clone(&calls), true),
        )
        .unwrap();
        let source = StubSource::new(64, 64);

        let output = pipeline.process(&source).unwrap();
        assert_eq!(output.regions.len(), 1);
        let err = output.regions[0].recognition.as_ref().unwrap_err();
        assert!(matches!(err, OcrError::Inference { .. }));
        assert_eq!(output.failures().count(), 1);
    }

    #[test]
    fn test_zero_dimension_source_is_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = build_pipeline(
            StubDetector::with_blobs(&[]),
            StubRecognizer::new(calls, false),
        )
        .unwrap();
        let source = StubSource::new(0, 64);

        assert!(matches!(
            pipeline.process(&source),
            Err(OcrError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn test_build_rejects_engine_without_outputs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut detector = StubDetector::with_blobs(&[]);
        detector.outputs.clear();
        let result = build_pipeline(detector, StubRecognizer::new(calls, false));
        assert!(matches!(result, Err(OcrError::ConfigError { .. })));
    }

    #[test]
    fn test_build_rejects_ambiguous_detector_input() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut detector = StubDetector::with_blobs(&[]);
        detector.inputs = vec![TensorSpec::new(vec![1, 3, 3, 3], DType::Float32)];
        let result = build_pipeline(detector, StubRecognizer::new(calls, false));
        assert!(matches!(result, Err(OcrError::AmbiguousLayout { .. })));
    }
}
