use thiserror::Error;

use voxid_encoder::{ExtractError, TranscodeError};
use voxid_registry::RegistryError;

/// Errors returned by enrollment and identification operations.
#[derive(Error, Debug)]
pub enum SpeakerError {
    #[error("speaker: invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("speaker: clip slot {got} out of range 1..={max}")]
    SlotOutOfRange { got: usize, max: usize },

    #[error("speaker: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("speaker: {0}")]
    Extraction(#[from] ExtractError),

    #[error("speaker: no clips could be extracted")]
    InsufficientData,

    #[error("speaker: identity not found")]
    NotFound,

    #[error("speaker: storage error: {0}")]
    Storage(String),
}

impl From<RegistryError> for SpeakerError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound => SpeakerError::NotFound,
            other => SpeakerError::Storage(other.to_string()),
        }
    }
}
