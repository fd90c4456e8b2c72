use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use monwatch::config::Settings;
use monwatch::duration::parse_duration;
use monwatch::{QueryEngine, TimeRange};

#[derive(Parser, Debug)]
#[command(name = "monwatch")]
#[command(about = "Query monitor errors, telemetry and status page changes")]
struct Args {
    /// Path to a TOML settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one query and print the response as JSON
    Query {
        /// Record kind to query
        #[arg(short = 't', long = "type", value_enum)]
        kind: QueryKind,

        /// Query JSON, e.g. '{"monitors": ["awslambda"]}'
        #[arg(short, long)]
        query: String,

        /// Relative window ending now (e.g. "6h", "7d"); defaults to 6h
        #[arg(long, conflicts_with_all = ["from", "to"])]
        last: Option<String>,

        /// Window start (RFC 3339)
        #[arg(long, requires = "to")]
        from: Option<DateTime<Utc>>,

        /// Window end (RFC 3339)
        #[arg(long, requires = "from")]
        to: Option<DateTime<Utc>>,
    },

    /// Print an option list (Monitors, Checks, Instances or BuildHash)
    Resource {
        path: String,

        /// Comma-separated monitor logical names
        #[arg(short, long)]
        monitors: Option<String>,

        #[arg(long)]
        include_shared: bool,
    },

    /// Verify the configured API key
    Health,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum QueryKind {
    Errors,
    Telemetry,
    StatusChanges,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    let api = settings
        .api
        .build_client()
        .context("Failed to build API client")?;
    info!(endpoint = %api.endpoint(), "Using monitoring API");
    let engine = QueryEngine::new(Arc::new(api), settings.engine);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(engine, args.command))
}

async fn run(engine: QueryEngine, command: Command) -> Result<()> {
    match command {
        Command::Query {
            kind,
            query,
            last,
            from,
            to,
        } => {
            let json: serde_json::Value =
                serde_json::from_str(&query).context("Query is not valid JSON")?;
            let range = time_range(last.as_deref(), from, to)?;

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling query");
                    on_interrupt.cancel();
                }
            });

            let response = match kind {
                QueryKind::Errors => engine.handle_errors_query(&json, &range, &cancel).await,
                QueryKind::Telemetry => engine.handle_telemetry_query(&json, &range, &cancel).await,
                QueryKind::StatusChanges => {
                    engine
                        .handle_status_changes_query(&json, &range, &cancel)
                        .await
                }
            };
            print_json(&response)?;
            if let Some(error) = response.error {
                bail!("Query failed ({}): {}", error.status, error.message);
            }
        }
        Command::Resource {
            path,
            monitors,
            include_shared,
        } => {
            let mut url = path.clone();
            if let Some(monitors) = monitors {
                url.push_str(&format!("?monitors={monitors}&includeShared={include_shared}"));
            }
            let response = engine.call_resource(&path, &url).await;
            print_json(&response)?;
            if response.status != 200 {
                bail!("Resource {} answered with status {}", path, response.status);
            }
        }
        Command::Health => {
            let result = engine
                .check_health()
                .await
                .context("Health check request failed")?;
            print_json(&result)?;
            if !result.is_ok() {
                bail!("{}", result.message);
            }
        }
    }
    Ok(())
}

fn time_range(
    last: Option<&str>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<TimeRange> {
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            bail!("--from must not be after --to");
        }
        return Ok(TimeRange::new(from, to));
    }
    let window = parse_duration(last.unwrap_or("6h"))?;
    let window = chrono::Duration::from_std(window).context("Window is too long")?;
    Ok(TimeRange::last(window))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
