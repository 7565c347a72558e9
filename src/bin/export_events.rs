//! Writes the filtered event log as CSV, straight from the database.
//!
//! Uses the same filters, ordering and serializer as `GET /api/events/export`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use digital_eye::{
    config::ConfigLoader,
    db,
    export::write_events_csv,
    models::{EventStatus, RiskLevel},
    repositories::{EventFilter, EventLogRepository, EventRecord},
    telemetry,
    validation::parse_timestamp,
};
use metrics::counter;

#[derive(Debug, Parser)]
#[command(name = "export-events", about = "Export safety events to CSV")]
struct Args {
    /// Only events in this state (handled, pending, observing)
    #[arg(long)]
    status: Option<EventStatus>,

    /// Only events at this risk level (high, medium, low)
    #[arg(long)]
    risk_level: Option<RiskLevel>,

    /// Inclusive lower bound on event time (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<String>,

    /// Inclusive upper bound on event time (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<String>,

    /// Output file; defaults to stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overrides DIGITAL_EYE_DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,
}

impl Args {
    fn filter(&self) -> Result<EventFilter> {
        Ok(EventFilter {
            status: self.status,
            risk_level: self.risk_level,
            start: date_arg("--start-date", self.start_date.as_deref())?,
            end: date_arg("--end-date", self.end_date.as_deref())?,
        })
    }
}

fn date_arg(
    flag: &str,
    raw: Option<&str>,
) -> Result<Option<chrono::DateTime<chrono::FixedOffset>>> {
    raw.map(|value| {
        parse_timestamp(value).ok_or_else(|| anyhow!("{flag} '{value}' is not a valid date"))
    })
    .transpose()
}

/// Writes the CSV exactly as the HTTP export serves it, with no trailing newline
fn write_export<W: Write>(mut out: W, events: &[EventRecord]) -> io::Result<usize> {
    let rows = write_events_csv(&mut out, events)?;
    out.flush()?;
    Ok(rows)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let filter = args.filter()?;

    let mut config = ConfigLoader::new()
        .without_identity_provider()
        .load()
        .context("loading configuration")?;
    if let Some(url) = &args.database_url {
        config.database_url = url.clone();
    }
    telemetry::init_tracing(&config).context("initializing tracing")?;

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;

    let events = EventLogRepository::new(&db)
        .list_all(&filter)
        .await
        .context("querying events")?;

    let rows = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            write_export(BufWriter::new(file), &events)?
        }
        None => write_export(io::stdout().lock(), &events)?,
    };

    counter!("events_exported_rows_total").increment(rows as u64);
    tracing::info!(
        rows,
        output = %args
            .output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".to_string()),
        "Exported events"
    );

    Ok(())
}
