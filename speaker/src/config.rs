use voxid_encoder::TargetFormat;

/// Configuration for the enrollment and identification pipeline.
#[derive(Debug, Clone, Copy)]
pub struct SpeakerConfig {
    /// Clips collected per identity before a fingerprint is committed
    /// (default: 4).
    pub required_clips: usize,

    /// Minimum similarity score for a positive identification
    /// (default: 0.75).
    pub similarity_threshold: f32,

    /// Canonical audio format uploads are transcoded to
    /// (default: 16kHz mono).
    pub target: TargetFormat,
}

impl Default for SpeakerConfig {
    fn default() -> Self {
        Self {
            required_clips: 4,
            similarity_threshold: 0.75,
            target: TargetFormat::default(),
        }
    }
}
