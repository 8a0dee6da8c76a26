//! Audio transcoding and voice embedding extraction.
//!
//! Two collaborator contracts consumed by the enrollment and
//! identification pipeline:
//!
//! 1. [`Transcoder::transcode`]: arbitrary upload -> canonical PCM16 audio
//! 2. [`VoiceEncoder::extract`]: canonical PCM16 audio -> embedding vector
//!
//! Both come with subprocess-backed defaults: [`FfmpegTranscoder`] pipes
//! uploads through ffmpeg, and [`CommandEncoder`] bridges to an external
//! embedding model process (PCM on stdin, JSON floats on stdout).

mod command;
mod error;
mod ffmpeg;
mod model;
mod pipe;
mod transcode;

pub use command::CommandEncoder;
pub use error::{ExtractError, TranscodeError};
pub use ffmpeg::FfmpegTranscoder;
pub use model::VoiceEncoder;
pub use transcode::{TargetFormat, Transcoder};
