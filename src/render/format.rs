// Number formatting for reports.

use num_format::{Locale, ToFormattedString};
use serde::Deserialize;

/// Separator convention for currency amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberFormat {
    /// `65.000,00`: period groups thousands, comma marks decimals.
    #[default]
    Swapped,
    /// `65,000.00`
    Standard,
}

impl NumberFormat {
    fn grouping(&self) -> Locale {
        match self {
            NumberFormat::Swapped => Locale::de,
            NumberFormat::Standard => Locale::en,
        }
    }

    fn decimal_mark(&self) -> char {
        match self {
            NumberFormat::Swapped => ',',
            NumberFormat::Standard => '.',
        }
    }
}

/// Fixed-precision amount with thousands grouping.
pub fn format_amount(value: f64, decimals: usize, fmt: NumberFormat) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (whole, frac) = match fixed.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (fixed.as_str(), None),
    };
    let grouped = match whole.parse::<u64>() {
        Ok(n) => n.to_formatted_string(&fmt.grouping()),
        Err(_) => whole.to_string(),
    };

    let mut out = String::with_capacity(fixed.len() + 8);
    if value < 0.0 {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac {
        out.push(fmt.decimal_mark());
        out.push_str(frac);
    }
    out
}

pub fn format_usd(value: f64, decimals: usize, fmt: NumberFormat) -> String {
    format!("${}", format_amount(value, decimals, fmt))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Price with precision scaled to its magnitude: 2, 4 or 8 decimals. The tier
/// is picked on the rounded value, so 999.99999 prints as `1.000,00`.
pub fn format_price_tiered(price: f64, fmt: NumberFormat) -> String {
    let decimals = if round_to(price, 4) >= 1000.0 {
        2
    } else if round_to(price, 8) >= 1.0 {
        4
    } else {
        8
    };
    format_usd(price, decimals, fmt)
}

/// Signed percentage, e.g. `+1.25%` / `-0.80%`.
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:+.*}%", decimals, value)
}

/// Volume abbreviated at 10^3 / 10^6 / 10^9. A unit is used once the next
/// smaller unit would print a value that reaches it (999_999 is `1.00M`).
pub fn format_volume(volume: f64) -> String {
    const UNITS: [(f64, &str); 3] = [(1e9, "B"), (1e6, "M"), (1e3, "K")];
    for (i, (scale, suffix)) in UNITS.iter().enumerate() {
        let shown = match UNITS.get(i + 1) {
            Some((smaller, _)) => round_to(volume / smaller, 2) * smaller,
            None => volume.round(),
        };
        if shown >= *scale {
            return format!("{:.2}{}", volume / scale, suffix);
        }
    }
    format!("{:.0}", volume)
}

/// Green for flat-or-up, red for down.
pub fn change_icon(change: f64) -> &'static str {
    if change >= 0.0 {
        "🟢"
    } else {
        "🔴"
    }
}
