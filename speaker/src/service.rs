//! Transport-facing service facade.

use std::sync::Arc;

use voxid_encoder::{Transcoder, VoiceEncoder};
use voxid_registry::{Registry, SpeakerRecord};

use crate::config::SpeakerConfig;
use crate::enroll::{EnrollProgress, Enroller, normalize_identity};
use crate::error::SpeakerError;
use crate::matcher::{Identification, Matcher};

/// Ties enrollment, identification, and the registry together behind
/// the API the transport layer calls.
///
/// All operations are synchronous and safe for concurrent callers; the
/// transport is expected to run them on a blocking-friendly thread.
pub struct SpeakerService {
    transcoder: Arc<dyn Transcoder>,
    encoder: Arc<dyn VoiceEncoder>,
    registry: Arc<dyn Registry>,
    enroller: Enroller,
    matcher: Matcher,
    config: SpeakerConfig,
}

impl SpeakerService {
    /// Create a service with the default configuration.
    pub fn new(
        transcoder: Arc<dyn Transcoder>,
        encoder: Arc<dyn VoiceEncoder>,
        registry: Arc<dyn Registry>,
    ) -> Self {
        Self::with_config(transcoder, encoder, registry, SpeakerConfig::default())
    }

    /// Create a service with the given configuration.
    /// Out-of-range values fall back to their defaults.
    pub fn with_config(
        transcoder: Arc<dyn Transcoder>,
        encoder: Arc<dyn VoiceEncoder>,
        registry: Arc<dyn Registry>,
        cfg: SpeakerConfig,
    ) -> Self {
        let defaults = SpeakerConfig::default();
        let config = SpeakerConfig {
            required_clips: if cfg.required_clips > 0 {
                cfg.required_clips
            } else {
                defaults.required_clips
            },
            similarity_threshold: if cfg.similarity_threshold.is_finite() {
                cfg.similarity_threshold
            } else {
                defaults.similarity_threshold
            },
            target: cfg.target,
        };

        Self {
            enroller: Enroller::new(
                transcoder.clone(),
                encoder.clone(),
                registry.clone(),
                config.required_clips,
                config.target,
            ),
            matcher: Matcher::new(registry.clone(), config.similarity_threshold),
            transcoder,
            encoder,
            registry,
            config,
        }
    }

    /// Submit one enrollment clip for an identity slot.
    pub fn submit_clip(
        &self,
        identity: &str,
        slot: usize,
        upload: &[u8],
    ) -> Result<EnrollProgress, SpeakerError> {
        self.enroller.submit_clip(identity, slot, upload)
    }

    /// Identify the speaker in an audio probe.
    pub fn identify(&self, upload: &[u8]) -> Result<Identification, SpeakerError> {
        let canonical = self.transcoder.transcode(upload, self.config.target)?;
        let probe = self.encoder.extract(&canonical)?;
        self.matcher.identify(&probe)
    }

    /// All committed identities, sorted by key.
    pub fn list_identities(&self) -> Result<Vec<SpeakerRecord>, SpeakerError> {
        Ok(self.registry.list()?)
    }

    /// Remove a committed identity and discard any transient slot state
    /// collected for it.
    pub fn delete_identity(&self, identity: &str) -> Result<(), SpeakerError> {
        let key = normalize_identity(identity)?;
        self.registry.delete(&key)?;
        self.enroller.forget(&key);
        Ok(())
    }

    /// Number of committed identities.
    pub fn enrolled_count(&self) -> Result<usize, SpeakerError> {
        Ok(self.registry.list()?.len())
    }

    pub fn config(&self) -> &SpeakerConfig {
        &self.config
    }
}
