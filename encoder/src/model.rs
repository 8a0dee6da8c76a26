use crate::ExtractError;

/// Extracts speaker embedding vectors from canonical audio.
///
/// The input audio must be PCM16 signed little-endian, mono, at the
/// sample rate the implementation was built for (16kHz for the bundled
/// tools). The output is a dense f32 vector whose dimensionality is
/// returned by [`VoiceEncoder::dimension`]; the enrollment and matching
/// pipeline assumes the vectors are unit-normalized so that a dot
/// product approximates cosine similarity.
///
/// Clips shorter than ~400ms rarely yield a meaningful embedding and
/// implementations may reject them with [`ExtractError::AudioTooShort`].
///
/// Implementations must be safe for concurrent use (Send + Sync).
pub trait VoiceEncoder: Send + Sync {
    /// Compute a speaker embedding from canonical PCM16 audio.
    fn extract(&self, audio: &[u8]) -> Result<Vec<f32>, ExtractError>;

    /// Return the dimensionality of the embedding vectors (e.g., 256).
    fn dimension(&self) -> usize;
}
