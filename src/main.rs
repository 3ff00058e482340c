use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use tts_prosody::utils::logger::init_logger;
use tts_prosody::{
    Locale, OpenAiSynthesizer, PipelineConfig, ProsodyPipeline, RateSpec, RunMode, RunOptions,
    VoiceConfig,
};

/// Озвучивание новостных расшифровок с контролем пауз
#[derive(Parser, Debug)]
#[command(name = "tts-prosody")]
#[command(version)]
#[command(about = "Text-to-speech for news transcripts with prosody control")]
#[command(long_about = "Normalizes transcript punctuation so the speech service does not pause \
inside sentences, synthesizes the text and optionally compresses mid-sentence pauses.

EXAMPLES:
    tts-prosody news/en_GB/digest.txt                 # Synthesize the original text
    tts-prosody --normalize news/pl_PL/digest.txt     # Synthesize the normalized text
    tts-prosody --compare news/bella/digest.txt       # Both variants plus a text diff
    tts-prosody --normalize --compress-silences --rate=-5% digest.txt")]
struct Cli {
    /// Transcript file to synthesize
    #[arg(value_name = "TRANSCRIPT_FILE")]
    transcript_file: PathBuf,

    /// Synthesize the normalized text instead of the original
    #[arg(short, long, conflicts_with = "compare")]
    normalize: bool,

    /// Synthesize both variants and print a text comparison
    #[arg(short, long)]
    compare: bool,

    /// Directory for generated audio
    #[arg(short, long, default_value = "test_audio")]
    output_dir: PathBuf,

    /// Speech rate such as +10% or -5%
    #[arg(short, long, allow_hyphen_values = true)]
    rate: Option<String>,

    /// Voice to use instead of the locale default
    #[arg(long)]
    voice: Option<String>,

    /// Locale to use instead of detecting it from the path
    #[arg(short, long)]
    locale: Option<String>,

    /// Compress mid-sentence pauses after synthesis
    #[arg(long)]
    compress_silences: bool,

    /// Pipeline configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Voice settings file with tts_settings.edge_tts.rate
    #[arg(long)]
    voice_config: Option<PathBuf>,

    /// API key for the speech service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn mode(&self) -> RunMode {
        if self.compare {
            RunMode::Compare
        } else if self.normalize {
            RunMode::Normalized
        } else {
            RunMode::Original
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(path) = &cli.voice_config {
        let voice_config = VoiceConfig::load(path)?;
        config.apply_voice_config(&voice_config)?;
    }
    if cli.compress_silences {
        config.compress_silences = true;
    }

    let locale = cli
        .locale
        .as_deref()
        .map(str::parse::<Locale>)
        .transpose()?;
    let rate = cli.rate.as_deref().map(str::parse::<RateSpec>).transpose()?;

    let synthesizer = match &cli.api_key {
        Some(key) => OpenAiSynthesizer::new(&config.synthesizer, key.as_str())?,
        None => OpenAiSynthesizer::from_config(&config.synthesizer)?,
    };
    let pipeline = ProsodyPipeline::new(config, Box::new(synthesizer));

    let options = RunOptions {
        output_dir: cli.output_dir.clone(),
        locale,
        voice: cli.voice.clone(),
        rate,
    };

    let report = pipeline
        .process(&cli.transcript_file, cli.mode(), &options)
        .await
        .with_context(|| format!("Failed to process {}", cli.transcript_file.display()))?;

    if let Some(comparison) = &report.comparison {
        println!("TEXT COMPARISON");
        for line in comparison.summary_lines() {
            println!("  {}", line);
        }
    }

    for output in &report.outputs {
        println!(
            "{} audio: {} ({} bytes{})",
            output.variant.suffix(),
            output.path.display(),
            output.size_bytes,
            if output.compressed { ", pauses compressed" } else { "" }
        );
    }
    info!("Done");

    Ok(())
}
