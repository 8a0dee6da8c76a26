//! Enrollment accumulation and fingerprint commit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;

use voxid_encoder::{TargetFormat, Transcoder, VoiceEncoder};
use voxid_registry::{Registry, SpeakerRecord};

use crate::embedding::mean_embedding;
use crate::error::SpeakerError;
use crate::session::Session;

/// Progress of one identity's enrollment after a clip submission.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollProgress {
    /// Normalized identity key.
    pub identity: String,
    /// Filled slots after this submission.
    pub clips_received: usize,
    /// Slots required before commit.
    pub required_clips: usize,
    /// True when this submission triggered a successful commit.
    pub enrollment_complete: bool,
}

/// Normalize an identity to its registry key: trim whitespace, lowercase.
pub fn normalize_identity(raw: &str) -> Result<String, SpeakerError> {
    let key = raw.trim().to_lowercase();
    if key.is_empty() {
        return Err(SpeakerError::InvalidIdentity(
            "identity must not be empty".to_string(),
        ));
    }
    Ok(key)
}

/// Collects clips per identity and commits averaged fingerprints.
///
/// Each identity has its own session behind its own mutex, so the
/// fill -> completeness check -> commit sequence is serialized per
/// identity while unrelated identities enroll in parallel. The
/// registry put is a single atomic write; on any commit failure the
/// session keeps its slots and stays collecting so the caller can
/// resubmit failing clips and retry.
pub struct Enroller {
    transcoder: Arc<dyn Transcoder>,
    encoder: Arc<dyn VoiceEncoder>,
    registry: Arc<dyn Registry>,
    required_clips: usize,
    target: TargetFormat,
    sessions: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
}

impl Enroller {
    pub fn new(
        transcoder: Arc<dyn Transcoder>,
        encoder: Arc<dyn VoiceEncoder>,
        registry: Arc<dyn Registry>,
        required_clips: usize,
        target: TargetFormat,
    ) -> Self {
        Self {
            transcoder,
            encoder,
            registry,
            required_clips,
            target,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Submit one clip for an identity slot.
    ///
    /// Validates the identity and slot, transcodes the upload, stores it
    /// at the slot (overwriting prior content), and commits once every
    /// slot is filled. Submitting a clip for an already-committed
    /// identity starts a fresh enrollment round.
    pub fn submit_clip(
        &self,
        identity: &str,
        slot: usize,
        upload: &[u8],
    ) -> Result<EnrollProgress, SpeakerError> {
        let key = normalize_identity(identity)?;
        if slot < 1 || slot > self.required_clips {
            return Err(SpeakerError::SlotOutOfRange {
                got: slot,
                max: self.required_clips,
            });
        }

        // Transcode before touching the session: a conversion failure
        // must leave existing slot state untouched.
        let canonical = self.transcoder.transcode(upload, self.target)?;

        let session = self.session(&key);
        let mut session = session.lock().unwrap();
        session.put_slot(slot, canonical);

        if !session.is_full() {
            return Ok(EnrollProgress {
                identity: key,
                clips_received: session.filled(),
                required_clips: self.required_clips,
                enrollment_complete: false,
            });
        }

        self.commit(key, &mut session)
    }

    /// Drop any transient slot state for an identity.
    pub fn forget(&self, key: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.remove(key);
    }

    fn session(&self, key: &str) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(self.required_clips))))
            .clone()
    }

    /// Extract every filled slot, average the survivors, and write the
    /// record in a single registry put.
    fn commit(&self, key: String, session: &mut Session) -> Result<EnrollProgress, SpeakerError> {
        let expected = self.encoder.dimension();
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(self.required_clips);
        for clip in session.clips() {
            match self.encoder.extract(clip) {
                Ok(v) if v.len() == expected => vectors.push(v),
                // Failed or malformed extractions are skipped; the
                // fingerprint averages whatever survived.
                Ok(_) | Err(_) => {}
            }
        }

        if vectors.is_empty() {
            return Err(SpeakerError::InsufficientData);
        }

        let record = SpeakerRecord {
            identity: key.clone(),
            enrolled_date: Utc::now(),
            clips_count: vectors.len(),
            fingerprint: mean_embedding(&vectors),
        };
        self.registry.put(&record)?;
        session.mark_complete();

        Ok(EnrollProgress {
            identity: key,
            clips_received: self.required_clips,
            required_clips: self.required_clips,
            enrollment_complete: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxid_encoder::{ExtractError, TranscodeError};
    use voxid_registry::MemoryRegistry;

    /// Passes uploads through unchanged; rejects uploads starting 0xEE.
    struct PassTranscoder;

    impl Transcoder for PassTranscoder {
        fn transcode(&self, upload: &[u8], _t: TargetFormat) -> Result<Vec<u8>, TranscodeError> {
            if upload.first() == Some(&0xEE) {
                return Err(TranscodeError::EmptyOutput);
            }
            Ok(upload.to_vec())
        }
    }

    /// Maps a clip's first byte to a one-hot unit vector; clips starting
    /// 0xFF fail extraction.
    struct OneHotEncoder {
        dim: usize,
    }

    impl VoiceEncoder for OneHotEncoder {
        fn extract(&self, audio: &[u8]) -> Result<Vec<f32>, ExtractError> {
            match audio.first() {
                Some(&b) if b != 0xFF => {
                    let mut v = vec![0.0; self.dim];
                    v[(b as usize) % self.dim] = 1.0;
                    Ok(v)
                }
                _ => Err(ExtractError::Encoder("unreadable clip".to_string())),
            }
        }

        fn dimension(&self) -> usize {
            self.dim
        }
    }

    fn enroller(registry: Arc<dyn Registry>, required_clips: usize) -> Enroller {
        Enroller::new(
            Arc::new(PassTranscoder),
            Arc::new(OneHotEncoder { dim: 4 }),
            registry,
            required_clips,
            TargetFormat::default(),
        )
    }

    #[test]
    fn rejects_empty_identity() {
        let e = enroller(Arc::new(MemoryRegistry::new()), 4);
        assert!(matches!(
            e.submit_clip("   ", 1, &[1]),
            Err(SpeakerError::InvalidIdentity(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_slot() {
        let e = enroller(Arc::new(MemoryRegistry::new()), 4);
        assert!(matches!(
            e.submit_clip("alice", 0, &[1]),
            Err(SpeakerError::SlotOutOfRange { got: 0, max: 4 })
        ));
        assert!(matches!(
            e.submit_clip("alice", 5, &[1]),
            Err(SpeakerError::SlotOutOfRange { got: 5, max: 4 })
        ));
    }

    #[test]
    fn reports_partial_progress() {
        let e = enroller(Arc::new(MemoryRegistry::new()), 4);

        let p = e.submit_clip("bob", 1, &[1]).unwrap();
        assert_eq!(p.clips_received, 1);
        assert_eq!(p.required_clips, 4);
        assert!(!p.enrollment_complete);

        let p = e.submit_clip("bob", 3, &[2]).unwrap();
        assert_eq!(p.clips_received, 2);
        assert!(!p.enrollment_complete);
    }

    #[test]
    fn commit_averages_extracted_vectors() {
        let registry = Arc::new(MemoryRegistry::new());
        let e = enroller(registry.clone(), 4);

        e.submit_clip("alice", 1, &[1]).unwrap();
        e.submit_clip("alice", 2, &[1]).unwrap();
        e.submit_clip("alice", 3, &[3]).unwrap();
        let p = e.submit_clip("alice", 4, &[3]).unwrap();
        assert!(p.enrollment_complete);
        assert_eq!(p.clips_received, 4);

        let record = registry.get("alice").unwrap();
        assert_eq!(record.clips_count, 4);
        assert_eq!(record.fingerprint, vec![0.0, 0.5, 0.0, 0.5]);
    }

    #[test]
    fn identity_is_normalized_before_storage() {
        let registry = Arc::new(MemoryRegistry::new());
        let e = enroller(registry.clone(), 1);

        let p = e.submit_clip("  Alice ", 1, &[1]).unwrap();
        assert_eq!(p.identity, "alice");
        assert!(registry.get("alice").is_ok());
    }

    #[test]
    fn slot_overwrite_uses_latest_clip() {
        let registry = Arc::new(MemoryRegistry::new());
        let e = enroller(registry.clone(), 2);

        e.submit_clip("carol", 1, &[1]).unwrap();
        // Resubmit slot 1 with different audio before completing.
        e.submit_clip("carol", 1, &[3]).unwrap();
        e.submit_clip("carol", 2, &[3]).unwrap();

        let record = registry.get("carol").unwrap();
        assert_eq!(record.fingerprint, vec![0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn transcode_failure_leaves_slots_untouched() {
        let registry = Arc::new(MemoryRegistry::new());
        let e = enroller(registry.clone(), 2);

        e.submit_clip("dave", 1, &[1]).unwrap();
        assert!(matches!(
            e.submit_clip("dave", 1, &[0xEE]),
            Err(SpeakerError::Transcode(_))
        ));

        // Slot 1 still holds the first clip.
        e.submit_clip("dave", 2, &[1]).unwrap();
        let record = registry.get("dave").unwrap();
        assert_eq!(record.clips_count, 2);
        assert_eq!(record.fingerprint, vec![0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn skips_failing_clips_and_counts_survivors() {
        let registry = Arc::new(MemoryRegistry::new());
        let e = enroller(registry.clone(), 3);

        e.submit_clip("erin", 1, &[1]).unwrap();
        e.submit_clip("erin", 2, &[0xFF]).unwrap();
        let p = e.submit_clip("erin", 3, &[1]).unwrap();
        assert!(p.enrollment_complete);

        let record = registry.get("erin").unwrap();
        assert_eq!(record.clips_count, 2);
        assert_eq!(record.fingerprint, vec![0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn insufficient_data_preserves_slots_for_retry() {
        let registry = Arc::new(MemoryRegistry::new());
        let e = enroller(registry.clone(), 2);

        e.submit_clip("frank", 1, &[0xFF]).unwrap();
        assert!(matches!(
            e.submit_clip("frank", 2, &[0xFF]),
            Err(SpeakerError::InsufficientData)
        ));
        assert!(registry.get("frank").is_err());

        // Replacing one failing clip retries the commit.
        let p = e.submit_clip("frank", 1, &[2]).unwrap();
        assert!(p.enrollment_complete);
        let record = registry.get("frank").unwrap();
        assert_eq!(record.clips_count, 1);
        assert_eq!(record.fingerprint, vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn reenrollment_replaces_fingerprint_wholesale() {
        let registry = Arc::new(MemoryRegistry::new());
        let e = enroller(registry.clone(), 2);

        e.submit_clip("gina", 1, &[1]).unwrap();
        e.submit_clip("gina", 2, &[1]).unwrap();
        assert_eq!(registry.get("gina").unwrap().fingerprint, vec![0.0, 1.0, 0.0, 0.0]);

        // New round: first clip clears the old slots.
        let p = e.submit_clip("gina", 1, &[2]).unwrap();
        assert_eq!(p.clips_received, 1);
        assert!(!p.enrollment_complete);

        e.submit_clip("gina", 2, &[2]).unwrap();
        assert_eq!(registry.get("gina").unwrap().fingerprint, vec![0.0, 0.0, 1.0, 0.0]);
    }
}
