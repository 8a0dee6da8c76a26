//! Subprocess bridge to an external embedding model.

use std::process::Command;

use crate::pipe::{run_piped, stderr_excerpt};
use crate::{ExtractError, VoiceEncoder};

/// Minimum canonical audio accepted by [`CommandEncoder`]:
/// 400ms of PCM16 mono at 16kHz (6400 samples, 2 bytes each).
pub const MIN_AUDIO_BYTES: usize = 12_800;

/// A [`VoiceEncoder`] that runs an external embedding model process.
///
/// The tool receives canonical PCM16 audio on stdin and must print a
/// single JSON array of floats (the embedding) on stdout. A nonzero
/// exit status or a vector of the wrong length is an extraction error.
pub struct CommandEncoder {
    program: String,
    args: Vec<String>,
    dimension: usize,
    min_bytes: usize,
}

impl CommandEncoder {
    /// Create an encoder bridge for the given command and expected
    /// embedding dimension.
    pub fn new(program: impl Into<String>, args: Vec<String>, dimension: usize) -> Self {
        Self {
            program: program.into(),
            args,
            dimension,
            min_bytes: MIN_AUDIO_BYTES,
        }
    }

    /// Override the minimum accepted audio length in bytes.
    pub fn with_min_bytes(mut self, min_bytes: usize) -> Self {
        self.min_bytes = min_bytes;
        self
    }
}

impl VoiceEncoder for CommandEncoder {
    fn extract(&self, audio: &[u8]) -> Result<Vec<f32>, ExtractError> {
        if audio.len() < self.min_bytes {
            return Err(ExtractError::AudioTooShort {
                min_bytes: self.min_bytes,
                got_bytes: audio.len(),
            });
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        let output = run_piped(cmd, audio).map_err(|e| ExtractError::Io(e.to_string()))?;

        if !output.status.success() {
            return Err(ExtractError::Encoder(format!(
                "exit status {}: {}",
                output.status.code().unwrap_or(-1),
                stderr_excerpt(&output)
            )));
        }

        let vector: Vec<f32> = serde_json::from_slice(&output.stdout)
            .map_err(|e| ExtractError::Encoder(format!("bad embedding output: {e}")))?;

        if vector.len() != self.dimension {
            return Err(ExtractError::DimensionMismatch {
                expected: self.dimension,
                got: vector.len(),
            });
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
