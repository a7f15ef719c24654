//! Per-variant orchestration: fetch -> rank/classify -> render, then deliver.
//!
//! Primary fetch failures end the run with the fixed error text. Secondary
//! failures (the listing, single Binance symbols) only drop what they would
//! have contributed.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument, warn};

use crate::delivery::DeliverySink;
use crate::engine::{rank_and_classify, EngineConfig};
use crate::error::{ScanError, ScanResult};
use crate::market_data::adapters::binance::{BinanceClient, WindowOptions};
use crate::market_data::adapters::coinmarketcap::CoinMarketCapClient;
use crate::market_data::adapters::JsonFetcher;
use crate::market_data::types::QuoteSet;
use crate::render::{render, RenderOptions, ReportKind};
use crate::settings::Settings;
use crate::telemetry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every query succeeded.
    Complete,
    /// A secondary query failed; some sections are missing.
    Degraded,
    /// The primary query failed; `text` is the fixed error message.
    Failed,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub kind: ReportKind,
    pub text: String,
    pub status: RunStatus,
}

impl Report {
    fn failed(opts: &RenderOptions, err: &ScanError) -> Self {
        error!(kind = ?opts.kind, error = %err, "Run aborted");
        Report {
            kind: opts.kind,
            text: render(None, &QuoteSet::new(), opts),
            status: RunStatus::Failed,
        }
    }

    pub fn is_deliverable(&self) -> bool {
        self.status != RunStatus::Failed
    }
}

fn finish(quotes: &QuoteSet, cfg: &EngineConfig, opts: &RenderOptions, status: RunStatus) -> Report {
    match rank_and_classify(quotes, cfg) {
        Ok(result) => Report {
            kind: opts.kind,
            text: render(Some(&result), quotes, opts),
            status,
        },
        Err(e) => Report::failed(opts, &e),
    }
}

fn require_quotes(quotes: QuoteSet) -> ScanResult<QuoteSet> {
    if quotes.is_empty() {
        return Err(ScanError::InsufficientData { needed: 1, got: 0 });
    }
    Ok(quotes)
}

/// Fixed-symbol table plus top movers from the CoinMarketCap listing.
#[instrument(skip_all)]
pub async fn run_scanner(fetcher: Arc<dyn JsonFetcher>, settings: &Settings) -> Report {
    let scan = &settings.scanner;
    let opts = RenderOptions {
        kind: ReportKind::Scanner,
        fixed_symbols: scan.fixed_symbols.clone(),
        top_k: scan.top_k,
        number_format: settings.number_format,
    };

    let api_key = match settings.cmc_api_key() {
        Ok(key) => key,
        Err(e) => return Report::failed(&opts, &e),
    };
    let client = CoinMarketCapClient::new(fetcher, &settings.endpoints.cmc_base_url, api_key, &scan.convert);

    let primary = client.fetch_quotes(&scan.fixed_symbols).await.and_then(require_quotes);
    let mut quotes = match primary {
        Ok(quotes) => quotes,
        Err(e) => return Report::failed(&opts, &e),
    };

    let mut status = RunStatus::Complete;
    match client.fetch_listings(1, scan.listing_limit).await {
        // Fixed rows only ever show what the quotes query returned
        Ok(listing) => quotes.extend(
            listing
                .iter()
                .filter(|q| !scan.fixed_symbols.contains(&q.symbol))
                .cloned()
                .collect(),
        ),
        Err(e) => {
            warn!(error = %e, "Listing unavailable, omitting movers");
            status = RunStatus::Degraded;
        }
    }

    let cfg = EngineConfig {
        anchors: scan.anchors.clone(),
        excluded: scan.fixed_symbols.clone(),
        top_k: scan.top_k,
        thresholds: settings.thresholds.clone(),
    };
    finish(&quotes, &cfg, &opts, status)
}

/// Biggest gainer/loser and volatility focus among a few majors.
#[instrument(skip_all)]
pub async fn run_pulse(fetcher: Arc<dyn JsonFetcher>, settings: &Settings) -> Report {
    let pulse = &settings.pulse;
    let opts = RenderOptions {
        kind: ReportKind::Pulse,
        fixed_symbols: pulse.symbols.clone(),
        top_k: 1,
        number_format: settings.number_format,
    };

    let api_key = match settings.cmc_api_key() {
        Ok(key) => key,
        Err(e) => return Report::failed(&opts, &e),
    };
    let client = CoinMarketCapClient::new(fetcher, &settings.endpoints.cmc_base_url, api_key, &pulse.convert);

    let quotes = match client.fetch_quotes(&pulse.symbols).await.and_then(require_quotes) {
        Ok(quotes) => quotes,
        Err(e) => return Report::failed(&opts, &e),
    };

    let cfg = EngineConfig {
        anchors: pulse.anchors.clone(),
        excluded: Vec::new(),
        top_k: 1,
        thresholds: settings.thresholds.clone(),
    };
    finish(&quotes, &cfg, &opts, RunStatus::Complete)
}

/// Binance candle-window report over the configured symbols.
#[instrument(skip_all)]
pub async fn run_overnight(fetcher: Arc<dyn JsonFetcher>, settings: &Settings) -> Report {
    let night = &settings.overnight;
    let opts = RenderOptions {
        kind: ReportKind::Overnight,
        fixed_symbols: night.symbols.clone(),
        top_k: 1,
        number_format: settings.number_format,
    };
    let client = BinanceClient::new(fetcher, &settings.endpoints.binance_base_url);

    let mut symbols = night.symbols.clone();
    if night.validate_symbols {
        let pairs = match client.fetch_tradable_symbols(&night.quote_asset).await {
            Ok(pairs) => pairs,
            Err(e) => return Report::failed(&opts, &e),
        };
        symbols.retain(|base| {
            let tradable = pairs.contains(&format!("{base}{}", night.quote_asset));
            if !tradable {
                info!(symbol = %base, "Pair not tradable, skipping");
            }
            tradable
        });
    }

    let window = WindowOptions {
        quote_asset: night.quote_asset.clone(),
        interval: night.interval.clone(),
        window_len: night.window_len,
        request_delay: Duration::from_millis(night.request_delay_ms),
        max_in_flight: night.max_in_flight,
    };
    let quotes = match require_quotes(client.fetch_window_quotes(&symbols, &window).await) {
        Ok(quotes) => quotes,
        Err(e) => return Report::failed(&opts, &e),
    };

    let status = if quotes.len() < night.symbols.len() {
        RunStatus::Degraded
    } else {
        RunStatus::Complete
    };
    let cfg = EngineConfig {
        anchors: Vec::new(),
        excluded: Vec::new(),
        top_k: 1,
        thresholds: settings.thresholds.clone(),
    };
    finish(&quotes, &cfg, &opts, status)
}

/// Hand a report to the sink. Failed reports are not sent; delivery errors are
/// logged and swallowed. Returns whether the sink accepted the message.
pub async fn deliver(sink: &dyn DeliverySink, settings: &Settings, report: &Report) -> bool {
    if !report.is_deliverable() {
        warn!(kind = ?report.kind, "Not delivering report of a failed run");
        telemetry::record_delivery("skipped");
        return false;
    }
    let destination = match settings.chat_id() {
        Ok(chat) => chat,
        Err(e) => {
            error!(error = %e, "Delivery not configured");
            telemetry::record_delivery("skipped");
            return false;
        }
    };

    match sink.deliver(destination, &report.text, settings.render_mode).await {
        Ok(()) => {
            telemetry::record_delivery("sent");
            true
        }
        Err(e) => {
            error!(error = %e, "Delivery failed");
            telemetry::record_delivery("failed");
            false
        }
    }
}
