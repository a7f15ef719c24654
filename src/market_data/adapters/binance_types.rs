// Source: https://binance-docs.github.io/apidocs/spot/en/ (market data endpoints)

/// GET /api/v3/ticker/24hr?symbol=...
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24h {
    pub symbol: String,
    pub last_price: String,           // e.g. "65000.01000000"
    pub price_change_percent: String, // e.g. "-1.234"
}

/// GET /api/v3/exchangeInfo
#[derive(Debug, serde::Deserialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    pub status: String,
    pub quote_asset: String,
    // we ignore filters, permissions etc.
}

// Klines come back as heterogeneous arrays; see normaliser::parse_kline.
pub type RawKlines = Vec<Vec<serde_json::Value>>;
