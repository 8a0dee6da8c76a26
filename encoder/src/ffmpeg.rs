//! Ffmpeg-based transcoder implementation.

use std::process::Command;

use crate::pipe::{run_piped, stderr_excerpt};
use crate::{TargetFormat, TranscodeError, Transcoder};

/// A [`Transcoder`] that pipes uploads through ffmpeg.
///
/// The upload is fed on stdin and raw PCM16 little-endian audio is read
/// from stdout, so no temporary files are written. Requires an ffmpeg
/// binary on PATH (or an explicit path via [`FfmpegTranscoder::with_program`]).
pub struct FfmpegTranscoder {
    program: String,
}

impl FfmpegTranscoder {
    /// Create a transcoder using `ffmpeg` from PATH.
    pub fn new() -> Self {
        Self::with_program("ffmpeg")
    }

    /// Create a transcoder using the given ffmpeg binary.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(&self, upload: &[u8], target: TargetFormat) -> Result<Vec<u8>, TranscodeError> {
        if upload.is_empty() {
            return Err(TranscodeError::EmptyUpload);
        }

        let mut cmd = Command::new(&self.program);
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-i",
            "pipe:0",
            "-f",
            "s16le",
            "-acodec",
            "pcm_s16le",
            "-ac",
            &target.channels.to_string(),
            "-ar",
            &target.sample_rate.to_string(),
            "pipe:1",
        ]);

        let output = run_piped(cmd, upload).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TranscodeError::ConverterNotFound(self.program.clone())
            } else {
                TranscodeError::Io(e.to_string())
            }
        })?;

        if !output.status.success() {
            return Err(TranscodeError::ConverterFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: stderr_excerpt(&output),
            });
        }

        if output.stdout.is_empty() {
            return Err(TranscodeError::EmptyOutput);
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_upload_rejected() {
        let t = FfmpegTranscoder::new();
        assert!(matches!(
            t.transcode(&[], TargetFormat::default()),
            Err(TranscodeError::EmptyUpload)
        ));
    }

    #[test]
    fn missing_converter_reported() {
        let t = FfmpegTranscoder::with_program("no-such-converter-binary");
        match t.transcode(b"RIFF", TargetFormat::default()) {
            Err(TranscodeError::ConverterNotFound(program)) => {
                assert_eq!(program, "no-such-converter-binary");
            }
            other => panic!("expected ConverterNotFound, got {other:?}"),
        }
    }
}
