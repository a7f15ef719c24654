// Source: https://coinmarketcap.com/api/documentation/v1/
// Only the fields the scanner reads are modelled; serde ignores the rest.
use std::collections::HashMap;

/// GET /v1/cryptocurrency/quotes/latest?symbol=...
#[derive(Debug, serde::Deserialize)]
pub struct QuotesResponse {
    pub data: HashMap<String, CmcAsset>,
}

/// GET /v1/cryptocurrency/listings/latest
#[derive(Debug, serde::Deserialize)]
pub struct ListingsResponse {
    pub data: Vec<CmcAsset>,
}

#[derive(Debug, serde::Deserialize)]
pub struct CmcAsset {
    pub symbol: String,
    pub quote: HashMap<String, CmcQuote>, // keyed by convert currency, e.g. "USD"
}

#[derive(Debug, serde::Deserialize)]
pub struct CmcQuote {
    pub price: Option<f64>,
    pub percent_change_24h: Option<f64>,
    pub percent_change_7d: Option<f64>,
    pub volume_24h: Option<f64>,
}
