// Convert wire values (numeric strings, kline rows) into typed quotes.

use serde_json::Value;

use crate::error::{ScanError, ScanResult};
use crate::market_data::types::{CandleWindow, Kline};

/// Percent change from `open` to `close`. An open of zero yields zero.
pub fn change_percent(open: f64, close: f64) -> f64 {
    if open == 0.0 {
        return 0.0;
    }
    (close - open) / open * 100.0
}

/// Parse a number that may arrive as a JSON string ("65000.10") or a JSON number.
pub fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Same as `value_to_f64` for plain strings.
pub fn str_to_f64(provider: &'static str, field: &str, s: &str) -> ScanResult<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| ScanError::malformed(provider, format!("{field} is not numeric: {s:?}")))
}

/// Parse one `[open_time, open, high, low, close, volume, close_time, ...]` row.
/// Only the OHLCV fields are kept.
pub fn parse_kline(row: &[Value]) -> ScanResult<Kline> {
    if row.len() < 7 {
        return Err(ScanError::malformed(
            "binance",
            format!("kline row has {} fields, expected at least 7", row.len()),
        ));
    }

    let num = |idx: usize, field: &str| {
        value_to_f64(&row[idx])
            .ok_or_else(|| ScanError::malformed("binance", format!("kline {field} is not numeric")))
    };

    Ok(Kline {
        open: num(1, "open")?,
        high: num(2, "high")?,
        low: num(3, "low")?,
        close: num(4, "close")?,
        volume: num(5, "volume")?,
    })
}

/// Aggregate the last `window_len` klines: first open, last close, max high,
/// min low and summed volume.
pub fn aggregate_window(klines: &[Kline], window_len: usize) -> ScanResult<CandleWindow> {
    if window_len == 0 || klines.len() < window_len {
        return Err(ScanError::InsufficientData { needed: window_len.max(1), got: klines.len() });
    }

    let bars = &klines[klines.len() - window_len..];
    let open = bars[0].open;
    let close = bars[bars.len() - 1].close;
    let high = bars.iter().map(|k| k.high).fold(f64::NEG_INFINITY, f64::max);
    let low = bars.iter().map(|k| k.low).fold(f64::INFINITY, f64::min);
    let total_volume = bars.iter().map(|k| k.volume).sum();

    Ok(CandleWindow {
        open,
        close,
        high,
        low,
        total_volume,
        change_percent: change_percent(open, close),
        bars: bars.len(),
    })
}
