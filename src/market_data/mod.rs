// Market data module entrypoint
pub mod adapters;   // HTTP seam + venue-specific fetchers (CoinMarketCap, Binance)
pub mod normaliser; // wire strings / kline rows -> typed values
pub mod types;      // QuoteRecord, QuoteSet, CandleWindow

pub use types::{CandleWindow, Kline, QuoteRecord, QuoteSet};
