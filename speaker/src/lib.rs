//! Speaker enrollment and identification.
//!
//! # Architecture
//!
//! The pipeline has three parts:
//!
//! 1. [`Enroller::submit_clip`]: uploaded clips -> per-identity slot
//!    state; when every slot is filled the clips are embedded, averaged,
//!    and committed to the registry as a single fingerprint
//! 2. [`Matcher::identify`]: probe embedding -> best enrolled identity
//!    above the similarity threshold, or unknown
//! 3. [`SpeakerService`]: facade wiring transcoder, encoder, enroller,
//!    and matcher behind the transport-facing API
//!
//! # State machine
//!
//! Each identity moves through `NEW -> COLLECTING -> COMPLETE`. Slots
//! may be overwritten while collecting; the only exit from COMPLETE is
//! a fresh clip submission, which clears all slots and starts a new
//! round whose commit replaces the previous fingerprint wholesale.
//!
//! # Concurrency
//!
//! Submissions for the same identity serialize on a per-identity mutex
//! around the fill -> completeness check -> commit sequence; unrelated
//! identities enroll fully in parallel. Matching is a pure read.

mod config;
mod embedding;
mod enroll;
mod error;
mod matcher;
mod service;
mod session;

pub use config::SpeakerConfig;
pub use embedding::{dot_similarity, l2_normalize, mean_embedding};
pub use enroll::{EnrollProgress, Enroller, normalize_identity};
pub use error::SpeakerError;
pub use matcher::{Identification, Matcher};
pub use service::SpeakerService;
