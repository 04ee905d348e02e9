use clap::Parser;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use sentiment_review::ai::{HuggingFaceClassifier, SentimentClassifier};
use sentiment_review::cli::{Args, Command};
use sentiment_review::config::Config;
use sentiment_review::infrastructure::{setup_logging, LoggingConfig, SentimentError};
use sentiment_review::pipeline::SentimentPipeline;
use sentiment_review::storage;

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn error_report(error: &SentimentError) -> serde_json::Value {
    json!({
        "error": error.kind(),
        "stage": error.stage(),
        "message": error.to_string(),
        "detail": error,
    })
}

/// 以结构化 JSON 输出错误，标明出错阶段
fn report_error(error: &SentimentError) -> anyhow::Result<()> {
    print_json(&error_report(error))
}

async fn build_pipeline(config: &Config) -> Result<SentimentPipeline, SentimentError> {
    let classifier = HuggingFaceClassifier::from_config(config)?;
    if !classifier.is_available() {
        warn!("HUGGINGFACE_API_TOKEN is not set; analyze requests will fail until it is configured");
    }

    let store = storage::connect(config).await?;

    let mut pipeline = SentimentPipeline::new(Arc::new(classifier), store)
        .with_history_limit(config.history_limit);
    if let Some(max_concurrency) = config.max_concurrency {
        pipeline = pipeline.with_max_concurrency(max_concurrency);
    }

    Ok(pipeline)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = Config::new();

    config.update_from_args(&args);
    if let Err(e) = config.validate() {
        report_error(&e)?;
        std::process::exit(1);
    }

    setup_logging(LoggingConfig::for_debug(config.debug))?;

    // 启动阶段的错误同样以结构化 JSON 输出
    let pipeline = match build_pipeline(&config).await {
        Ok(pipeline) => pipeline,
        Err(e) => {
            report_error(&e)?;
            std::process::exit(1);
        }
    };

    let outcome = match &args.command {
        Command::Analyze { text } => match pipeline.analyze(text).await {
            Ok(result) => print_json(&result).map(|_| true)?,
            Err(e) => report_error(&e).map(|_| false)?,
        },
        Command::History { limit } => match pipeline.history(*limit).await {
            Ok(entries) => print_json(&entries).map(|_| true)?,
            Err(e) => report_error(&e).map(|_| false)?,
        },
        Command::Stats => {
            let healthy = pipeline.health_check().await.unwrap_or(false);
            match pipeline.stats().await {
                Ok(stats) => print_json(&json!({ "healthy": healthy, "stats": stats })).map(|_| true)?,
                Err(e) => report_error(&e).map(|_| false)?,
            }
        }
    };

    if !outcome {
        std::process::exit(1);
    }

    Ok(())
}
