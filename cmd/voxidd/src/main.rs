//! voxidd - Speaker recognition HTTP service.

mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;

use voxid_encoder::{CommandEncoder, FfmpegTranscoder, TargetFormat};
use voxid_registry::RedbRegistry;
use voxid_speaker::{SpeakerConfig, SpeakerService};

/// Speaker recognition service: enrollment, identification, registry admin.
///
/// Uploads are transcoded to 16kHz mono PCM via ffmpeg and embedded by an
/// external encoder command, which receives the PCM on stdin and must
/// print a JSON float array on stdout.
#[derive(Parser, Debug)]
#[command(name = "voxidd")]
#[command(about = "Speaker recognition HTTP service")]
struct Args {
    /// Listen address (e.g. :5000 or 127.0.0.1:5000)
    #[arg(long, default_value = ":5000")]
    addr: String,

    /// Data directory holding the fingerprint registry
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Embedding model command; extra words become arguments
    #[arg(long)]
    encoder_cmd: String,

    /// Embedding dimension produced by the encoder command
    #[arg(long, default_value_t = 256)]
    dimension: usize,

    /// ffmpeg binary used to transcode uploads
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: String,

    /// Clips required per enrollment
    #[arg(long, default_value_t = 4)]
    clips: usize,

    /// Similarity threshold for positive identification
    #[arg(long, default_value_t = 0.75)]
    threshold: f32,

    /// Maximum upload size in megabytes
    #[arg(long, default_value_t = 10)]
    max_upload_mb: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    std::fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("creating data dir {:?}", args.data_dir))?;
    let registry = Arc::new(
        RedbRegistry::open(args.data_dir.join("registry.redb"))
            .context("opening fingerprint registry")?,
    );

    let mut words = args.encoder_cmd.split_whitespace();
    let Some(program) = words.next() else {
        bail!("--encoder-cmd is empty");
    };
    let encoder_args: Vec<String> = words.map(str::to_string).collect();
    let encoder = Arc::new(CommandEncoder::new(program, encoder_args, args.dimension));

    let transcoder = Arc::new(FfmpegTranscoder::with_program(args.ffmpeg.as_str()));

    let service = Arc::new(SpeakerService::with_config(
        transcoder,
        encoder,
        registry,
        SpeakerConfig {
            required_clips: args.clips,
            similarity_threshold: args.threshold,
            target: TargetFormat::default(),
        },
    ));

    tracing::info!(
        clips = service.config().required_clips,
        threshold = service.config().similarity_threshold,
        enrolled = service.enrolled_count().unwrap_or(0),
        "speaker service ready"
    );

    server::serve(&args.addr, service, args.max_upload_mb * 1024 * 1024).await
}
