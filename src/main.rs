use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use market_scanner::delivery::TelegramSink;
use market_scanner::market_data::adapters::{HttpFetcher, JsonFetcher};
use market_scanner::pipeline::{self, Report};
use market_scanner::settings::Settings;
use market_scanner::telemetry;

#[derive(Parser)]
#[command(name = "market-scanner")]
#[command(about = "Builds a crypto market report and posts it to Telegram", long_about = None)]
struct Cli {
    /// Config file stem, looked up as <stem>.toml / .yaml / .json
    #[arg(short, long, default_value = "scanner")]
    config: String,

    /// Default log filter when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the report but do not deliver it
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    report: ReportCommand,
}

#[derive(Subcommand, Clone, Copy, Debug)]
enum ReportCommand {
    /// Fixed-symbol table plus top gainers/losers (CoinMarketCap)
    Scanner,
    /// Biggest move among a few majors (CoinMarketCap)
    Pulse,
    /// Overnight candle-window report (Binance)
    Overnight,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok(); // load .env

    let cli = Cli::parse();
    telemetry::init_tracing(&cli.log_level);

    let settings = Settings::load(&cli.config)?;
    telemetry::init_metrics(settings.metrics_port)?;

    let fetcher: Arc<dyn JsonFetcher> = Arc::new(HttpFetcher::new(settings.request_timeout())?);
    info!(report = ?cli.report, dry_run = cli.dry_run, "Starting run");

    let report = match cli.report {
        ReportCommand::Scanner => pipeline::run_scanner(fetcher, &settings).await,
        ReportCommand::Pulse => pipeline::run_pulse(fetcher, &settings).await,
        ReportCommand::Overnight => pipeline::run_overnight(fetcher, &settings).await,
    };
    print_report(&report);

    if cli.dry_run || !report.is_deliverable() {
        info!(status = ?report.status, "Skipping delivery");
        return Ok(());
    }

    // Delivery problems are logged; the process still exits 0
    match TelegramSink::from_settings(&settings) {
        Ok(sink) => {
            pipeline::deliver(&sink, &settings, &report).await;
        }
        Err(e) => error!(error = %e, "Telegram sink unavailable"),
    }
    Ok(())
}

fn print_report(report: &Report) {
    println!("{}", "=".repeat(60));
    println!("{}", report.text);
    println!("{}", "=".repeat(60));
}
