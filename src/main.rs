//! cropwise - headless prediction driver
//!
//! Runs the prediction core without a web layer: each request is a JSON
//! object, each answer is one envelope printed as a JSON line on stdout.
//! Logs go to stderr so stdout stays machine-readable.
//!
//! # Usage
//! ```sh
//! cropwise --input request.json
//! cat requests.ndjson | cropwise
//! cat conditions.ndjson | cropwise --rank
//! cropwise --health
//! cropwise --recent farmer-7 --limit 5
//! cropwise --crop wheat
//! ```
//!
//! # Environment Variables
//! - `MODELS_DIR` - Directory holding the model artifacts (default: models)
//! - `DATABASE_URL` - Prediction store (default: sqlite://data/cropwise.db)
//! - `PERSISTENCE_ASYNC` - Write in the background; drained before exit
//! - `RUST_LOG` - Log filter (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use cropwise::application::bootstrap::Application;
use cropwise::application::service::PredictionService;
use cropwise::config::Config;
use cropwise::domain::errors::{FieldViolation, ValidationError};
use cropwise::interfaces::envelope::ResponseEnvelope;
use serde_json::Value;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{Level, error, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Read a single JSON request from this file instead of NDJSON on stdin
    #[arg(long)]
    input: Option<PathBuf>,

    /// Print the health report and exit
    #[arg(long)]
    health: bool,

    /// Print the latest stored predictions for this user and exit
    #[arg(long, value_name = "USER_ID")]
    recent: Option<String>,

    /// Number of stored predictions to return with --recent
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// Treat each request as field conditions and rank every crop
    #[arg(long)]
    rank: bool,

    /// Print the crop catalogue and exit
    #[arg(long)]
    crops: bool,

    /// Print one crop's profile and exit
    #[arg(long, value_name = "NAME")]
    crop: Option<String>,

    /// Dump Prometheus metrics to stderr before exiting
    #[arg(long)]
    metrics: bool,
}

fn emit(value: &Value) {
    println!("{}", value);
}

fn malformed_json(detail: &serde_json::Error) -> ResponseEnvelope {
    info!(error = %detail, "Request is not valid JSON");
    ResponseEnvelope::validation(&ValidationError {
        violations: vec![FieldViolation::new("body", "must be valid JSON")],
    })
}

async fn process(service: &PredictionService, raw: &str, rank: bool) {
    match serde_json::from_str::<Value>(raw) {
        Ok(payload) if rank => emit(&service.rank_crops(&payload).to_value()),
        Ok(payload) => {
            let response = service.handle(&payload).await;
            if let Some(outcome) = &response.persistence {
                info!(
                    persistence = outcome.label(),
                    degraded = response.degraded,
                    "Request handled"
                );
            }
            emit(&response.to_value());
        }
        Err(e) => emit(&malformed_json(&e).to_value()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    info!("cropwise {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        models_dir = ?config.models.models_dir,
        persistence = config.persistence.enabled,
        profitability = config.pricing.enabled,
        "Configuration loaded"
    );

    let service = match Application::build(&config).await {
        Ok(service) => service,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Startup failed");
            emit(&ResponseEnvelope::startup_failure(&e).to_value());
            return Err(e);
        }
    };

    if args.health {
        emit(&serde_json::to_value(service.health().await)?);
    } else if let Some(user_id) = &args.recent {
        emit(&service.recent_predictions(user_id, args.limit).await.to_value());
    } else if args.crops {
        emit(&service.crop_catalogue().to_value());
    } else if let Some(name) = &args.crop {
        emit(&service.crop_details(name).to_value());
    } else if let Some(path) = &args.input {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read request file {:?}", path))?;
        process(&service, &raw, args.rank).await;
    } else {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            process(&service, &line, args.rank).await;
        }
    }

    // Background writes die with the runtime
    let abandoned = service.shutdown(config.persistence.drain_timeout()).await;
    if abandoned > 0 {
        error!(abandoned, "Shutting down with unsaved predictions");
    }

    if args.metrics {
        eprintln!("{}", service.metrics().gather_text());
    }

    Ok(())
}
