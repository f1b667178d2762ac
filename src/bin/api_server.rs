use anyhow::Result;
use clap::{Arg, Command};
use std::sync::Arc;
use tracing::{info, warn};

use brandvoice::api::ApiServer;
use brandvoice::{
    create_llm, CaptionFetcher, ClipService, Config, OpusClipClient, Pipeline, SubtitleUrlFetcher,
    LLM,
};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("BrandVoice API")
        .version(env!("CARGO_PKG_VERSION"))
        .about("HTTP API for starting BrandVoice runs and polling their progress")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Port to listen on")
                .default_value("8080")
                .value_parser(clap::value_parser!(u16)),
        )
        .get_matches();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "brandvoice={},tower_http=info,warn",
                    config.output.log_level
                ))
            }),
        )
        .init();

    config.validate()?;
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let service: Arc<dyn ClipService> = Arc::new(OpusClipClient::new(&config.service)?);
    let captions: Arc<dyn CaptionFetcher> =
        Arc::new(SubtitleUrlFetcher::new(config.service.request_timeout_seconds)?);

    let llm: Option<Arc<dyn LLM>> = if config.llm.enabled {
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

    info!("{}", config.summary());

    let mut pipeline = Pipeline::new(config, service).with_captions(captions);
    if let Some(llm) = llm {
        pipeline = pipeline.with_llm(llm);
    }

    ApiServer::new(Arc::new(pipeline), port).start().await
}
