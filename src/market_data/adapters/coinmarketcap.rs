// CoinMarketCap adapter: fixed-symbol quotes and the ranked listing.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::coinmarketcap_types::{CmcAsset, ListingsResponse, QuotesResponse};
use super::{ApiRequest, JsonFetcher};
use crate::error::{ScanError, ScanResult};
use crate::market_data::types::{QuoteRecord, QuoteSet};
use crate::telemetry;

const PROVIDER: &str = "coinmarketcap";

pub struct CoinMarketCapClient {
    fetcher: Arc<dyn JsonFetcher>,
    base_url: String,
    api_key: String,
    convert: String,
}

impl CoinMarketCapClient {
    pub fn new(fetcher: Arc<dyn JsonFetcher>, base_url: &str, api_key: &str, convert: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            convert: convert.to_string(),
        }
    }

    fn request(&self, path: &str) -> ApiRequest {
        ApiRequest::get(format!("{}{}", self.base_url, path))
            .header("Accepts", "application/json")
            .header("X-CMC_PRO_API_KEY", self.api_key.clone())
            .query("convert", self.convert.clone())
    }

    /// Quotes for a fixed symbol list, in the order requested. Symbols the
    /// provider does not return (or returns without a price) are left out.
    #[instrument(skip(self), fields(count = symbols.len()))]
    pub async fn fetch_quotes(&self, symbols: &[String]) -> ScanResult<QuoteSet> {
        let request = self
            .request("/v1/cryptocurrency/quotes/latest")
            .query("symbol", symbols.join(","));

        let body = self.get(&request, "quotes").await?;
        let mut response: QuotesResponse = decode(body)?;

        let mut set = QuoteSet::new();
        for symbol in symbols {
            match response.data.remove(symbol) {
                Some(asset) => {
                    if let Some(record) = self.normalise(asset) {
                        set.push(record);
                    }
                }
                None => warn!(%symbol, "Symbol missing from quotes response"),
            }
        }
        info!(received = set.len(), "Fetched fixed-symbol quotes");
        Ok(set)
    }

    /// Ranked listing page, in provider order.
    #[instrument(skip(self))]
    pub async fn fetch_listings(&self, start: u32, limit: u32) -> ScanResult<QuoteSet> {
        let request = self
            .request("/v1/cryptocurrency/listings/latest")
            .query("start", start.to_string())
            .query("limit", limit.to_string());

        let body = self.get(&request, "listings").await?;
        let response: ListingsResponse = decode(body)?;

        let set: QuoteSet = response.data.into_iter().filter_map(|a| self.normalise(a)).collect();
        info!(received = set.len(), "Fetched listing");
        Ok(set)
    }

    async fn get(&self, request: &ApiRequest, endpoint: &'static str) -> ScanResult<Value> {
        self.fetcher.get_json(request).await.inspect_err(|e| {
            warn!(endpoint, error = %e, "CoinMarketCap request failed");
            telemetry::record_fetch_failure(endpoint);
        })
    }

    fn normalise(&self, mut asset: CmcAsset) -> Option<QuoteRecord> {
        let Some(quote) = asset.quote.remove(&self.convert) else {
            debug!(symbol = %asset.symbol, convert = %self.convert, "No quote in convert currency");
            return None;
        };
        let Some(price) = quote.price else {
            debug!(symbol = %asset.symbol, "Quote without price");
            return None;
        };
        Some(
            QuoteRecord::new(asset.symbol, price, quote.percent_change_24h.unwrap_or(0.0))
                .with_change_7d(quote.percent_change_7d)
                .with_volume(quote.volume_24h),
        )
    }
}

fn decode<T: serde::de::DeserializeOwned>(body: Value) -> ScanResult<T> {
    serde_json::from_value(body).map_err(|e| ScanError::malformed(PROVIDER, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::adapters::testing::ScriptedFetcher;
    use serde_json::json;

    fn asset(symbol: &str, price: f64, c24: f64, c7: f64) -> Value {
        json!({
            "symbol": symbol,
            "quote": { "USD": {
                "price": price,
                "percent_change_24h": c24,
                "percent_change_7d": c7,
                "volume_24h": 1_000_000.0
            }}
        })
    }

    fn client(fetcher: ScriptedFetcher) -> (Arc<ScriptedFetcher>, CoinMarketCapClient) {
        let fetcher = Arc::new(fetcher);
        let client = CoinMarketCapClient::new(fetcher.clone(), "https://cmc.test/", "secret", "USD");
        (fetcher, client)
    }

    #[tokio::test]
    async fn quotes_follow_requested_order_and_skip_missing() {
        let body = json!({ "data": {
            "ETH": asset("ETH", 3200.5, -0.8, 2.0),
            "BTC": asset("BTC", 65000.0, 0.3, 12.0)
        }});
        let (fetcher, client) = client(ScriptedFetcher::new().ok("/quotes/latest", body));

        let symbols = vec!["BTC".to_string(), "ETH".to_string(), "ADA".to_string()];
        let set = client.fetch_quotes(&symbols).await.unwrap();

        let order: Vec<&str> = set.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["BTC", "ETH"]);
        assert_eq!(set.get("BTC").unwrap().percent_change_7d, Some(12.0));
        assert_eq!(set.get("ETH").unwrap().volume, Some(1_000_000.0));

        let sent = fetcher.requests();
        assert_eq!(sent[0].url, "https://cmc.test/v1/cryptocurrency/quotes/latest");
        assert!(sent[0].query.contains(&("symbol".to_string(), "BTC,ETH,ADA".to_string())));
        assert!(sent[0].headers.contains(&("X-CMC_PRO_API_KEY".to_string(), "secret".to_string())));
    }

    #[tokio::test]
    async fn missing_data_field_is_malformed() {
        let (_, client) = client(ScriptedFetcher::new().ok("/quotes/latest", json!({ "status": {} })));
        let err = client.fetch_quotes(&["BTC".to_string()]).await.unwrap_err();
        assert!(matches!(err, ScanError::Malformed { provider: "coinmarketcap", .. }));
    }

    #[tokio::test]
    async fn listing_keeps_provider_order_and_drops_null_prices() {
        let body = json!({ "data": [
            asset("AAA", 1.0, 5.0, 1.0),
            { "symbol": "NUL", "quote": { "USD": { "price": null, "percent_change_24h": 1.0 } } },
            asset("BBB", 2.0, -5.0, 1.0)
        ]});
        let (fetcher, client) = client(ScriptedFetcher::new().ok("/listings/latest", body));

        let set = client.fetch_listings(1, 100).await.unwrap();
        let order: Vec<&str> = set.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["AAA", "BBB"]);
        assert!(fetcher.requests()[0].query.contains(&("limit".to_string(), "100".to_string())));
    }

    #[tokio::test]
    async fn http_error_propagates() {
        let (_, client) = client(ScriptedFetcher::new().status("/listings/latest", 429));
        let err = client.fetch_listings(1, 100).await.unwrap_err();
        assert!(matches!(err, ScanError::Status { status: 429, .. }));
    }
}
