//! Greedy CTC decoding of recognizer output.
//!
//! The recognizer emits a score per class per timestep. Greedy CTC decoding
//! takes the arg-max class at each timestep, collapses consecutive duplicate
//! predictions, drops the reserved blank class, and maps the survivors
//! through the alphabet. A blank between two identical predictions keeps
//! both, which is what lets the model emit doubled letters.

use tracing::debug;

use crate::core::errors::{OcrError, OcrResult};

/// Class index reserved for the blank (no character) symbol.
const BLANK_INDEX: usize = 0;

/// The character set of the stock recognizer model. Class `i` maps to the
/// character at `i - 1`; class 0 is the blank.
pub const DEFAULT_ALPHABET: &str =
    "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz.,- /_";

/// Greedy CTC decoder mapping class indices to characters.
pub struct CtcGreedyDecode {
    alphabet: Vec<char>,
}

impl std::fmt::Debug for CtcGreedyDecode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CtcGreedyDecode")
            .field("alphabet_len", &self.alphabet.len())
            .finish()
    }
}

impl CtcGreedyDecode {
    /// Creates a decoder for the given alphabet.
    ///
    /// The alphabet covers classes 1 and up; class 0 is always the blank.
    /// `None` selects [`DEFAULT_ALPHABET`].
    pub fn new(alphabet: Option<&str>) -> Self {
        let alphabet = alphabet.unwrap_or(DEFAULT_ALPHABET).chars().collect();
        Self { alphabet }
    }

    /// The number of characters the decoder can emit.
    pub fn alphabet_len(&self) -> usize {
        self.alphabet.len()
    }

    /// Decodes a flat score buffer into a string and a confidence value.
    ///
    /// `scores` is read row-major as `time_steps x num_classes`. Per
    /// timestep the class with the highest score wins, ties broken by the
    /// lowest index. Collapsing compares each prediction with its
    /// predecessor in the uncollapsed sequence, then blanks are dropped.
    /// Class indices beyond the alphabet decode to nothing; that is
    /// deliberate, a model with a bigger head than the alphabet should not
    /// crash the pipeline.
    ///
    /// The confidence is the mean winning score of the surviving timesteps,
    /// 0.0 when nothing survives.
    ///
    /// # Errors
    ///
    /// Fails with [`OcrError::OutputSizeMismatch`] when the buffer is
    /// shorter than `time_steps * num_classes`.
    pub fn apply(
        &self,
        scores: &[f32],
        time_steps: usize,
        num_classes: usize,
    ) -> OcrResult<(String, f32)> {
        let needed = time_steps * num_classes;
        if scores.len() < needed {
            return Err(OcrError::output_size_mismatch(needed, scores.len()));
        }
        if time_steps == 0 || num_classes == 0 {
            return Ok((String::new(), 0.0));
        }

        let mut sequence_idx = Vec::with_capacity(time_steps);
        let mut sequence_score = Vec::with_capacity(time_steps);

        for t in 0..time_steps {
            let row = &scores[t * num_classes..(t + 1) * num_classes];
            let mut best_idx = 0usize;
            let mut best = row[0];
            for (idx, &value) in row.iter().enumerate().skip(1) {
                if value > best {
                    best = value;
                    best_idx = idx;
                }
            }
            sequence_idx.push(best_idx);
            sequence_score.push(best);
        }

        let mut selection = vec![true; time_steps];
        for t in 1..time_steps {
            if sequence_idx[t] == sequence_idx[t - 1] {
                selection[t] = false;
            }
        }
        for (t, &idx) in sequence_idx.iter().enumerate() {
            if idx == BLANK_INDEX {
                selection[t] = false;
            }
        }

        let mut text = String::new();
        let mut kept_scores = Vec::new();
        for (t, &idx) in sequence_idx.iter().enumerate() {
            if !selection[t] {
                continue;
            }
            if let Some(&ch) = self.alphabet.get(idx - 1) {
                text.push(ch);
            }
            kept_scores.push(sequence_score[t]);
        }

        let confidence = if kept_scores.is_empty() {
            0.0
        } else {
            kept_scores.iter().sum::<f32>() / kept_scores.len() as f32
        };

        debug!(
            "ctc decode: {} timesteps collapsed to {} characters",
            time_steps,
            text.chars().count()
        );

        Ok((text, confidence))
    }
}
