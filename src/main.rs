use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use brandvoice::normalize::channel_name_from_path;
use brandvoice::{
    create_llm, CaptionFetcher, ClipService, Config, MemoryStore, OpusClipClient, ParameterMode,
    Pipeline, PipelineInput, ProgressHandle, SubtitleUrlFetcher, TranscriptMode, LLM,
};

fn cli() -> Command {
    Command::new("BrandVoice")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Transcribe a creator's videos into CSV records and LLM training data")
        .arg(
            Arg::new("json")
                .short('j')
                .long("json")
                .value_name("FILE")
                .help("Video listing JSON; the file stem names the channel")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Directory for CSV output (also checked for duplicates)"),
        )
        .arg(
            Arg::new("training-dir")
                .long("training-dir")
                .value_name("DIR")
                .help("Directory for JSONL training data"),
        )
        .arg(
            Arg::new("count")
                .short('c')
                .long("count")
                .value_name("NUM")
                .help("Process only the top N videos by views")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("batch-size")
                .short('b')
                .long("batch-size")
                .value_name("NUM")
                .help("Videos per submission batch")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("api-key")
                .long("api-key")
                .value_name("KEY")
                .help("OpusClip API key (overrides OPUSCLIP_API_KEY)"),
        )
        .arg(
            Arg::new("enhanced")
                .long("enhanced")
                .help("Include visual context markers in transcripts")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("language")
                .long("language")
                .value_name("LANG")
                .help("Language written into training examples"),
        )
        .arg(
            Arg::new("max-char")
                .long("max-char")
                .value_name("NUM")
                .help("Maximum description length for training examples")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("style")
                .long("style")
                .value_name("TEXT")
                .help("Creator style instructions for the training system message"),
        )
        .arg(
            Arg::new("manual")
                .long("manual")
                .help("Use --language/--max-char as given instead of asking the LLM")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-captions")
                .long("no-captions")
                .help("Skip native captions and send every video to the clip service")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    let default_filter = if matches.get_flag("verbose") {
        "brandvoice=debug,info".to_string()
    } else {
        format!("brandvoice={},warn", config.output.log_level)
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let json_path = PathBuf::from(
        matches
            .get_one::<String>("json")
            .ok_or_else(|| anyhow!("--json is required"))?,
    );
    if let Some(dir) = matches.get_one::<String>("output") {
        config.output.output_dir = PathBuf::from(dir);
    }
    if let Some(dir) = matches.get_one::<String>("training-dir") {
        config.output.training_dir = PathBuf::from(dir);
    }
    if let Some(count) = matches.get_one::<usize>("count") {
        config.pipeline.videos_to_process = Some(*count);
    }
    if let Some(batch_size) = matches.get_one::<usize>("batch-size") {
        config.pipeline.batch_size = *batch_size;
    }
    if let Some(api_key) = matches.get_one::<String>("api-key") {
        config.service.api_key = Some(api_key.clone());
    }
    if matches.get_flag("enhanced") {
        config.pipeline.transcript_mode = TranscriptMode::Enhanced;
    }
    if let Some(language) = matches.get_one::<String>("language") {
        config.pipeline.language = language.clone();
    }
    if let Some(max_char) = matches.get_one::<u32>("max-char") {
        config.pipeline.max_char = *max_char;
    }
    if let Some(style) = matches.get_one::<String>("style") {
        config.pipeline.style = style.clone();
    }
    if matches.get_flag("manual") {
        config.pipeline.parameter_mode = ParameterMode::Manual;
    }
    if matches.get_flag("no-captions") {
        config.pipeline.native_captions = false;
    }

    config.validate()?;

    info!("🚀 BrandVoice starting...");
    info!("📄 Input: {}", json_path.display());
    info!("{}", config.summary());

    let raw = tokio::fs::read_to_string(&json_path)
        .await
        .with_context(|| format!("Failed to read {}", json_path.display()))?;
    let document: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid JSON in {}", json_path.display()))?;
    let creator_name = channel_name_from_path(&json_path);

    let service: Arc<dyn ClipService> = Arc::new(OpusClipClient::new(&config.service)?);
    let captions: Arc<dyn CaptionFetcher> =
        Arc::new(SubtitleUrlFetcher::new(config.service.request_timeout_seconds)?);

    let llm: Option<Arc<dyn LLM>> = if config.pipeline.parameter_mode == ParameterMode::Auto
        && config.llm.enabled
    {
        match create_llm(&config.llm) {
            Ok(llm) => Some(Arc::from(llm)),
            Err(e) => {
                warn!("⚠️ LLM unavailable for parameter analysis: {}", e);
                None
            }
        }
    } else {
        None
    };

    let mut pipeline = Pipeline::new(config, service).with_captions(captions);
    if let Some(llm) = llm {
        pipeline = pipeline.with_llm(llm);
    }

    let jobs: MemoryStore<ProgressHandle> = MemoryStore::new();
    let run = Arc::new(pipeline)
        .spawn(
            PipelineInput {
                creator_name,
                document,
            },
            &jobs,
        )
        .await;

    let progress = run.progress.clone();
    let mut last_reported = (String::new(), 0u8);
    let mut ticker = tokio::time::interval(Duration::from_secs(5));
    while !run.is_finished() {
        ticker.tick().await;
        let snapshot = progress.read_snapshot().await;
        if (snapshot.current_phase.clone(), snapshot.progress) != last_reported {
            info!("📊 {}% - {}", snapshot.progress, snapshot.current_phase);
            last_reported = (snapshot.current_phase, snapshot.progress);
        }
    }

    match run.wait().await {
        Ok(output) => {
            info!("🎉 Processing completed in {}", output.summary.total_time);
            info!("✅ Processed: {}", output.summary.processed);
            info!("⏭️ Skipped: {}", output.summary.skipped);
            info!("❌ Failed: {}", output.summary.failed);
            if let Some(path) = &output.csv_path {
                info!("📊 CSV: {}", path.display());
            }
            if let Some(path) = &output.jsonl_path {
                info!("🧠 Training data: {}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            let snapshot = progress.read_snapshot().await;
            error!(
                "❌ Run failed during '{}' at {}%",
                snapshot.current_phase, snapshot.progress
            );
            Err(e)
        }
    }
}
