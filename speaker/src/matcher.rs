//! Identification by scanning committed fingerprints.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use voxid_registry::Registry;

use crate::embedding::dot_similarity;
use crate::error::SpeakerError;

/// Result of scanning the registry with a probe fingerprint.
#[derive(Debug, Clone, Serialize)]
pub struct Identification {
    /// Best-matching identity, when its score clears the threshold.
    pub prediction: Option<String>,
    /// Score of the best-matching identity; 0.0 on an empty registry.
    pub confidence: f32,
    /// Threshold the best score was gated against.
    pub threshold: f32,
    /// Score for every registered identity.
    pub scores: BTreeMap<String, f32>,
}

/// Finds the enrolled identity closest to a probe fingerprint.
///
/// Pure read over the registry; never mutates stored state.
pub struct Matcher {
    registry: Arc<dyn Registry>,
    threshold: f32,
}

impl Matcher {
    pub fn new(registry: Arc<dyn Registry>, threshold: f32) -> Self {
        Self {
            registry,
            threshold,
        }
    }

    /// Score the probe against every committed fingerprint.
    ///
    /// Records are visited in registry list order (sorted by identity);
    /// an exact score tie keeps the earlier identity, so results are
    /// reproducible. An empty registry short-circuits to an unknown
    /// prediction with confidence exactly 0.0.
    pub fn identify(&self, probe: &[f32]) -> Result<Identification, SpeakerError> {
        let records = self.registry.list()?;
        if records.is_empty() {
            return Ok(Identification {
                prediction: None,
                confidence: 0.0,
                threshold: self.threshold,
                scores: BTreeMap::new(),
            });
        }

        let mut scores = BTreeMap::new();
        let mut best_identity = String::new();
        let mut best_score = f32::NEG_INFINITY;
        for record in &records {
            let score = dot_similarity(probe, &record.fingerprint);
            scores.insert(record.identity.clone(), score);
            if score > best_score {
                best_score = score;
                best_identity = record.identity.clone();
            }
        }

        let prediction = (best_score >= self.threshold).then_some(best_identity);
        Ok(Identification {
            prediction,
            confidence: best_score,
            threshold: self.threshold,
            scores,
        })
    }
}
