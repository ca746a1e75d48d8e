mod main_lib;
mod snapshot;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use income_calendar_core::calendar::{CalendarMonth, StatusFilter};
use income_calendar_core::{IncomeCalendarConfig, IncomeCalendarService, IncomeCalendarServiceTrait};
use main_lib::init_tracing;
use snapshot::{SnapshotFile, SnapshotProvider};

#[derive(Debug, Parser)]
#[command(name = "income-calendar")]
#[command(about = "Reconcile income events from a snapshot and print the calendar view")]
struct Cli {
    /// Snapshot file with positions and per-month provider records
    #[arg(long)]
    snapshot: PathBuf,

    /// Displayed month, YYYY-MM
    #[arg(long)]
    month: CalendarMonth,

    /// Reference date deciding paid vs provisioned, YYYY-MM-DD
    #[arg(long)]
    today: NaiveDate,

    #[arg(long, default_value = "default")]
    portfolio: String,

    #[arg(long)]
    hide_paid: bool,

    #[arg(long)]
    hide_provisioned: bool,

    /// Select a day of the displayed month
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Select an event by id
    #[arg(long)]
    event: Option<String>,

    /// Expand a calendar cell (repeatable)
    #[arg(long)]
    expand: Vec<NaiveDate>,

    /// Print compact instead of pretty JSON
    #[arg(long)]
    compact: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Commands {
    /// Full view: events, grid, insights and scope
    View,
    /// Per-ticker insights only
    Insights,
    /// Deduplicated events only
    Events,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let config = IncomeCalendarConfig::from_env();
    let file = SnapshotFile::load(&cli.snapshot)?;
    let provider = Arc::new(SnapshotProvider::from_file(file)?);
    let service = IncomeCalendarService::new(provider.clone(), provider, config);

    service.select_portfolio(&cli.portfolio, cli.today)?;
    service
        .show_month(cli.month)
        .await?
        .ok_or_else(|| anyhow!("Calendar view for {} was superseded", cli.month))?;

    if cli.hide_paid || cli.hide_provisioned {
        service.set_status_filter(StatusFilter {
            paid: !cli.hide_paid,
            provisioned: !cli.hide_provisioned,
        })?;
    }
    for date in &cli.expand {
        service.toggle_expanded_date(*date)?;
    }
    if let Some(date) = cli.date {
        service.select_date(date)?;
    }
    if let Some(event_id) = cli.event.as_deref() {
        service.toggle_event(event_id)?;
    }

    let view = service
        .current_view()?
        .context("No calendar view was committed")?;
    tracing::info!(
        "Rendered {} with {} events and {} tickers",
        view.month,
        view.events.len(),
        view.insights.len()
    );

    match cli.command.unwrap_or(Commands::View) {
        Commands::View => print_json(&view, cli.compact),
        Commands::Insights => print_json(&view.insights, cli.compact),
        Commands::Events => print_json(&view.events, cli.compact),
    }
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", rendered);
    Ok(())
}
