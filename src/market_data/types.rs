use tracing::warn;

/// One OHLCV bar, already parsed from the wire strings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kline {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Aggregate of the last N klines for a symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandleWindow {
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub total_volume: f64,
    /// (close - open) / open * 100, zero when open is zero
    pub change_percent: f64,
    pub bars: usize,
}

/// Snapshot of one traded symbol at fetch time.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRecord {
    pub symbol: String,
    pub price: f64,
    pub percent_change_24h: f64,
    pub percent_change_7d: Option<f64>,
    pub volume: Option<f64>,
    pub period_high: Option<f64>,
    pub period_low: Option<f64>,
    pub window: Option<CandleWindow>,
}

impl QuoteRecord {
    pub fn new(symbol: impl Into<String>, price: f64, percent_change_24h: f64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            percent_change_24h,
            percent_change_7d: None,
            volume: None,
            period_high: None,
            period_low: None,
            window: None,
        }
    }

    pub fn with_change_7d(mut self, change: Option<f64>) -> Self {
        self.percent_change_7d = change;
        self
    }

    pub fn with_volume(mut self, volume: Option<f64>) -> Self {
        self.volume = volume;
        self
    }

    /// Attach a candle window; volume and the period extremes come from it.
    pub fn with_window(mut self, window: CandleWindow) -> Self {
        self.volume = Some(window.total_volume);
        self.period_high = Some(window.high);
        self.period_low = Some(window.low);
        self.window = Some(window);
        self
    }
}

/// Ordered quotes from one fetch cycle. Symbols are unique; the first
/// occurrence of a symbol wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteSet {
    records: Vec<QuoteRecord>,
}

impl QuoteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Returns false (and drops it) when the symbol is already present.
    pub fn push(&mut self, record: QuoteRecord) -> bool {
        if self.contains(&record.symbol) {
            warn!(symbol = %record.symbol, "Duplicate symbol in quote set, keeping first");
            return false;
        }
        self.records.push(record);
        true
    }

    /// Append every record of `other` whose symbol is not yet present.
    pub fn extend(&mut self, other: QuoteSet) {
        for record in other.records {
            self.push(record);
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&QuoteRecord> {
        self.records.iter().find(|r| r.symbol == symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QuoteRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[QuoteRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<QuoteRecord> for QuoteSet {
    fn from_iter<I: IntoIterator<Item = QuoteRecord>>(iter: I) -> Self {
        let mut set = QuoteSet::new();
        for record in iter {
            set.push(record);
        }
        set
    }
}

impl<'a> IntoIterator for &'a QuoteSet {
    type Item = &'a QuoteRecord;
    type IntoIter = std::slice::Iter<'a, QuoteRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
