// Binance spot adapter: klines window + 24h ticker per symbol.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::binance_types::{ExchangeInfo, RawKlines, Ticker24h};
use super::{ApiRequest, JsonFetcher};
use crate::error::{ScanError, ScanResult};
use crate::market_data::normaliser::{aggregate_window, parse_kline, str_to_f64};
use crate::market_data::types::{Kline, QuoteRecord, QuoteSet};
use crate::telemetry;

const PROVIDER: &str = "binance";

/// How the per-symbol loop is run.
#[derive(Debug, Clone)]
pub struct WindowOptions {
    pub quote_asset: String,
    pub interval: String,
    pub window_len: usize,
    /// Pause between sequential symbols (upstream rate limit).
    pub request_delay: Duration,
    /// 1 = sequential with `request_delay`; more = bounded concurrency, no delay.
    pub max_in_flight: usize,
}

pub struct BinanceClient {
    fetcher: Arc<dyn JsonFetcher>,
    base_url: String,
}

impl BinanceClient {
    pub fn new(fetcher: Arc<dyn JsonFetcher>, base_url: &str) -> Self {
        Self { fetcher, base_url: base_url.trim_end_matches('/').to_string() }
    }

    fn request(&self, path: &str) -> ApiRequest {
        ApiRequest::get(format!("{}/api/v3{}", self.base_url, path))
    }

    /// Pairs currently `TRADING` and quoted in `quote_asset`.
    #[instrument(skip(self))]
    pub async fn fetch_tradable_symbols(&self, quote_asset: &str) -> ScanResult<HashSet<String>> {
        let body = self.get(&self.request("/exchangeInfo"), "exchange_info").await?;
        let info: ExchangeInfo = decode(body)?;
        let pairs: HashSet<String> = info
            .symbols
            .into_iter()
            .filter(|s| s.status == "TRADING" && s.quote_asset == quote_asset)
            .map(|s| s.symbol)
            .collect();
        info!(pairs = pairs.len(), "Loaded tradable pairs");
        Ok(pairs)
    }

    pub async fn fetch_klines(&self, pair: &str, interval: &str, limit: usize) -> ScanResult<Vec<Kline>> {
        let request = self
            .request("/klines")
            .query("symbol", pair)
            .query("interval", interval)
            .query("limit", limit.to_string());
        let body = self.get(&request, "klines").await?;
        let rows: RawKlines = decode(body)?;
        rows.iter().map(|row| parse_kline(row)).collect()
    }

    pub async fn fetch_ticker(&self, pair: &str) -> ScanResult<Ticker24h> {
        let request = self.request("/ticker/24hr").query("symbol", pair);
        let body = self.get(&request, "ticker_24h").await?;
        decode(body)
    }

    /// Klines window plus 24h ticker for one base symbol (e.g. "SOL").
    #[instrument(skip(self, opts))]
    pub async fn fetch_window_quote(&self, base: &str, opts: &WindowOptions) -> ScanResult<QuoteRecord> {
        let pair = format!("{base}{}", opts.quote_asset);
        let klines = self.fetch_klines(&pair, &opts.interval, opts.window_len).await?;
        let window = aggregate_window(&klines, opts.window_len)?;
        let ticker = self.fetch_ticker(&pair).await?;

        let price = str_to_f64(PROVIDER, "lastPrice", &ticker.last_price)?;
        let change_24h = str_to_f64(PROVIDER, "priceChangePercent", &ticker.price_change_percent)?;
        debug!(%pair, price, change_24h, window_change = window.change_percent, "Built window quote");

        Ok(QuoteRecord::new(base, price, change_24h).with_window(window))
    }

    /// Window quotes for every symbol, in input order. A symbol that fails is
    /// logged and skipped; the rest of the run carries on.
    pub async fn fetch_window_quotes(&self, bases: &[String], opts: &WindowOptions) -> QuoteSet {
        let results: Vec<(&String, ScanResult<QuoteRecord>)> = if opts.max_in_flight <= 1 {
            let mut results = Vec::with_capacity(bases.len());
            for (idx, base) in bases.iter().enumerate() {
                if idx > 0 && !opts.request_delay.is_zero() {
                    tokio::time::sleep(opts.request_delay).await;
                }
                results.push((base, self.fetch_window_quote(base, opts).await));
            }
            results
        } else {
            stream::iter(bases)
                .map(|base| async move { (base, self.fetch_window_quote(base, opts).await) })
                .buffered(opts.max_in_flight)
                .collect()
                .await
        };

        let mut set = QuoteSet::new();
        for (base, result) in results {
            match result {
                Ok(record) => {
                    set.push(record);
                }
                Err(e) => warn!(symbol = %base, error = %e, "Skipping symbol"),
            }
        }
        info!(requested = bases.len(), received = set.len(), "Fetched window quotes");
        set
    }

    async fn get(&self, request: &ApiRequest, endpoint: &'static str) -> ScanResult<Value> {
        self.fetcher.get_json(request).await.inspect_err(|e| {
            warn!(endpoint, error = %e, "Binance request failed");
            telemetry::record_fetch_failure(endpoint);
        })
    }
}

fn decode<T: serde::de::DeserializeOwned>(body: Value) -> ScanResult<T> {
    serde_json::from_value(body).map_err(|e| ScanError::malformed(PROVIDER, e.to_string()))
}
