//! pdf2mp3 - Convert PDF documents to a handful of MP3 files using text-to-speech

mod audio;
mod config;
mod document;
mod error;
mod pipeline;
mod text;
mod tts;

use anyhow::{Context, Result};
use audio::{FfmpegJoiner, MergeError, Merger};
use clap::{Parser, Subcommand};
use config::{FailurePolicy, PipelineConfig};
use error::PipelineError;
use pipeline::{CancelFlag, Pipeline};
use std::path::PathBuf;
use std::process::ExitCode;
use tts::{RetryPolicy, Synthesizer};
use tts_client::TtsError;

/// Exit status for a missing external tool or credential
const EXIT_DEPENDENCY: u8 = 3;
/// Exit status after a second Ctrl-C
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser, Debug)]
#[command(name = "pdf2mp3")]
#[command(about = "Convert a PDF into a few MP3 files using text-to-speech", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the PDF (or .txt/.md) document
    file: Option<PathBuf>,

    /// Folder where audio files will be saved (default: output_mp3s)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Approximate number of characters per text chunk (default: 6000)
    #[arg(short, long)]
    chunk_size: Option<usize>,

    /// Voice to use (default: en-US-JennyNeural)
    #[arg(short, long)]
    voice: Option<String>,

    /// Target number of merged files (default: 7)
    #[arg(short, long)]
    merge_count: Option<usize>,

    /// Seconds to pause between synthesis requests (default: 2)
    #[arg(long)]
    pause: Option<f64>,

    /// TTS provider: edge-tts, openai, openai-compatible
    #[arg(long)]
    provider: Option<String>,

    /// Attempts per chunk before giving up (default: 3)
    #[arg(long)]
    retries: Option<u32>,

    /// Skip chunks that keep failing instead of aborting the run
    #[arg(long)]
    skip_failed: bool,

    /// Bitrate of the merged files (default: 128k)
    #[arg(long)]
    bitrate: Option<String>,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default voice
    SetVoice {
        /// Voice identifier (e.g. en-GB-SoniaNeural)
        voice: String,
    },
    /// Set default chunk size
    SetChunkSize {
        /// Characters per chunk
        value: usize,
    },
    /// Set default number of merged files
    SetMergeCount {
        /// Target file count
        value: usize,
    },
    /// Set default pause between requests
    SetPause {
        /// Seconds
        value: f64,
    },
    /// Set default TTS provider
    SetProvider {
        /// Provider name (edge-tts, openai, openai-compatible)
        name: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            if is_dependency_error(&e) {
                ExitCode::from(EXIT_DEPENDENCY)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Print the error and any causes its own message does not already include.
fn report_error(e: &anyhow::Error) {
    let mut shown = e.to_string();
    eprintln!("Error: {shown}");
    for cause in e.chain().skip(1) {
        let cause = cause.to_string();
        if !shown.contains(&cause) {
            eprintln!("  Caused by: {cause}");
            shown.push_str(&cause);
        }
    }
}

fn is_dependency_error(e: &anyhow::Error) -> bool {
    if let Some(err) = e.downcast_ref::<PipelineError>() {
        return err.is_dependency_error();
    }
    if let Some(MergeError::FfmpegMissing) = e.downcast_ref::<MergeError>() {
        return true;
    }
    matches!(
        e.downcast_ref::<TtsError>(),
        Some(TtsError::ProviderUnavailable(_) | TtsError::MissingApiKey { .. })
    )
}

async fn run(args: Args) -> Result<()> {
    if let Some(Commands::Config { action }) = &args.command {
        return handle_config_command(action);
    }

    let document_path = args.file.clone().ok_or_else(|| {
        anyhow::anyhow!("Document path is required. Run 'pdf2mp3 --help' for usage.")
    })?;

    // CLI flags > pdf2mp3.toml > built-in defaults
    let mut config = PipelineConfig::load().context("Failed to load configuration")?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let tts_config = tts_client::Config::load().context("Failed to load TTS configuration")?;
    let provider_name = config
        .provider
        .clone()
        .unwrap_or_else(|| tts_config.default_provider.clone());
    let provider = tts_client::get_provider(
        &provider_name,
        tts_config.get_provider_config(&provider_name),
    )
    .context(format!("Failed to initialize TTS provider '{}'", provider_name))?;
    provider.is_available()?;

    log::debug!("Document: {}", document_path.display());
    log::debug!("Provider: {} ({})", provider_name, provider.name());
    log::debug!("Config: {:?}", config);

    let joiner = FfmpegJoiner::new(config.format, config.bitrate.clone())
        .with_ffmpeg_path(config.ffmpeg_path.clone());
    let merger = Merger::new(Box::new(joiner), config.format);
    merger.ensure_available()?;

    let synthesizer = Synthesizer::new(
        provider,
        config.voice.clone(),
        config.format,
        config.pause(),
        RetryPolicy::default().with_max_attempts(config.retries),
    );
    synthesizer.ensure_format_supported()?;

    let cancel = CancelFlag::new();
    spawn_interrupt_handler(cancel.clone());

    let output_dir = config.output_dir.clone();
    let mut pipeline = Pipeline::new(config, synthesizer, merger)?.with_cancel_flag(cancel);
    let report = pipeline.run(&document_path).await?;

    if !report.skipped.is_empty() {
        let skipped: Vec<String> = report.skipped.iter().map(|i| i.to_string()).collect();
        eprintln!(
            "Skipped {} chunk(s) that could not be synthesized: {}",
            report.skipped.len(),
            skipped.join(", ")
        );
    }

    eprintln!(
        "All tasks completed! {} chunk(s), {} part file(s), {} merged file(s) in {}",
        report.chunk_count,
        report.artifacts.len(),
        report.merged.len(),
        output_dir.display()
    );

    Ok(())
}

/// First Ctrl-C stops after the current step; a second one exits at once.
fn spawn_interrupt_handler(cancel: CancelFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!("\nCancelling after the current step (press Ctrl-C again to quit now)...");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(EXIT_INTERRUPTED);
        }
    });
}

fn apply_overrides(config: &mut PipelineConfig, args: &Args) {
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(voice) = &args.voice {
        config.voice = voice.clone();
    }
    if let Some(merge_count) = args.merge_count {
        config.merge_count = merge_count;
    }
    if let Some(pause) = args.pause {
        config.pause_secs = pause;
    }
    if let Some(provider) = &args.provider {
        config.provider = Some(provider.clone());
    }
    if let Some(retries) = args.retries {
        config.retries = retries;
    }
    if args.skip_failed {
        config.on_failure = FailurePolicy::Skip;
    }
    if let Some(bitrate) = &args.bitrate {
        config.bitrate = bitrate.clone();
    }
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = PipelineConfig::load()?;
            println!("Configuration file: {:?}", PipelineConfig::config_path()?);
            println!();
            println!("chunk_size = {}", config.chunk_size);
            println!("output_dir = \"{}\"", config.output_dir.display());
            println!("voice = \"{}\"", config.voice);
            println!("merge_count = {}", config.merge_count);
            println!("pause_secs = {}", config.pause_secs);
            println!("retries = {}", config.retries);
            println!("on_failure = {:?}", config.on_failure);
            println!("bitrate = \"{}\"", config.bitrate);
            println!("format = \"{}\"", config.format.extension());
            match &config.provider {
                Some(provider) => println!("provider = \"{}\"", provider),
                None => println!("provider = (tts.toml default)"),
            }
            match &config.ffmpeg_path {
                Some(path) => println!("ffmpeg_path = \"{}\"", path.display()),
                None => println!("ffmpeg_path = (PATH)"),
            }
        }
        ConfigAction::SetVoice { voice } => {
            let mut config = PipelineConfig::load()?;
            config.voice = voice.clone();
            config.save()?;
            println!("Default voice set to: {}", voice);
        }
        ConfigAction::SetChunkSize { value } => {
            if *value == 0 {
                anyhow::bail!("Chunk size must be greater than 0");
            }
            let mut config = PipelineConfig::load()?;
            config.chunk_size = *value;
            config.save()?;
            println!("Default chunk size set to: {}", config.chunk_size);
        }
        ConfigAction::SetMergeCount { value } => {
            if *value == 0 {
                anyhow::bail!("Merge count must be greater than 0");
            }
            let mut config = PipelineConfig::load()?;
            config.merge_count = *value;
            config.save()?;
            println!("Default merge count set to: {}", config.merge_count);
        }
        ConfigAction::SetPause { value } => {
            let mut config = PipelineConfig::load()?;
            config.pause_secs = *value;
            config.validate()?;
            config.save()?;
            println!("Default pause set to: {}s", config.pause_secs);
        }
        ConfigAction::SetProvider { name } => {
            // Reject typos before they are persisted
            tts_client::ProviderKind::from_str(name)?;
            let mut config = PipelineConfig::load()?;
            config.provider = Some(name.clone());
            config.save()?;
            println!("Default provider set to: {}", name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_args() {
        let args = Args::try_parse_from(["pdf2mp3", "book.pdf"]).unwrap();
        assert_eq!(args.file, Some(PathBuf::from("book.pdf")));
        assert!(args.output.is_none());
        assert!(!args.skip_failed);
        assert!(args.command.is_none());
    }

    #[test]
    fn test_overrides_take_precedence() {
        let args = Args::try_parse_from([
            "pdf2mp3",
            "book.pdf",
            "-o",
            "audio",
            "-c",
            "3000",
            "-v",
            "en-GB-RyanNeural",
            "-m",
            "4",
            "--pause",
            "0.5",
            "--skip-failed",
            "--provider",
            "openai",
        ])
        .unwrap();

        let mut config = PipelineConfig::default();
        apply_overrides(&mut config, &args);

        assert_eq!(config.output_dir, PathBuf::from("audio"));
        assert_eq!(config.chunk_size, 3000);
        assert_eq!(config.voice, "en-GB-RyanNeural");
        assert_eq!(config.merge_count, 4);
        assert_eq!(config.pause_secs, 0.5);
        assert_eq!(config.on_failure, FailurePolicy::Skip);
        assert_eq!(config.provider.as_deref(), Some("openai"));
        // Untouched values keep their defaults
        assert_eq!(config.retries, 3);
        assert_eq!(config.bitrate, "128k");
    }

    #[test]
    fn test_config_subcommand() {
        let args = Args::try_parse_from(["pdf2mp3", "config", "set-chunk-size", "4000"]).unwrap();
        match args.command {
            Some(Commands::Config {
                action: ConfigAction::SetChunkSize { value },
            }) => assert_eq!(value, 4000),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_dependency_errors() {
        let err = anyhow::Error::new(MergeError::FfmpegMissing);
        assert!(is_dependency_error(&err));

        let err = anyhow::Error::new(TtsError::ProviderUnavailable("edge-tts".into()))
            .context("Failed to initialize TTS provider 'edge-tts'");
        assert!(is_dependency_error(&err));

        let err = anyhow::Error::new(PipelineError::EmptyText(PathBuf::from("a.pdf")));
        assert!(!is_dependency_error(&err));
    }
}
