// Ordering helpers. All of them are stable: ties keep provider order.

use ordered_float::OrderedFloat;

use crate::market_data::types::QuoteRecord;

/// Records sorted by 24h change, highest first. Equal changes keep input order.
pub fn sort_by_change_desc<'a, I>(records: I) -> Vec<&'a QuoteRecord>
where
    I: IntoIterator<Item = &'a QuoteRecord>,
{
    let mut sorted: Vec<&QuoteRecord> = records.into_iter().collect();
    // sort_by_key is stable, so Reverse keeps ties in input order
    sorted.sort_by_key(|r| std::cmp::Reverse(OrderedFloat(r.percent_change_24h)));
    sorted
}

/// First K of a descending ranking, and the last K reordered worst-first.
pub fn top_and_bottom<'a>(sorted_desc: &[&'a QuoteRecord], k: usize) -> (Vec<&'a QuoteRecord>, Vec<&'a QuoteRecord>) {
    let gainers = sorted_desc.iter().take(k).copied().collect();
    let losers = sorted_desc.iter().rev().take(k).copied().collect();
    (gainers, losers)
}

/// First record holding the maximum of `key`; records where `key` is `None` are skipped.
pub fn first_max_by<'a, I, F>(records: I, key: F) -> Option<&'a QuoteRecord>
where
    I: IntoIterator<Item = &'a QuoteRecord>,
    F: Fn(&QuoteRecord) -> Option<f64>,
{
    extreme_by(records, key, |candidate, best| candidate > best)
}

/// First record holding the minimum of `key`.
pub fn first_min_by<'a, I, F>(records: I, key: F) -> Option<&'a QuoteRecord>
where
    I: IntoIterator<Item = &'a QuoteRecord>,
    F: Fn(&QuoteRecord) -> Option<f64>,
{
    extreme_by(records, key, |candidate, best| candidate < best)
}

fn extreme_by<'a, I, F, B>(records: I, key: F, better: B) -> Option<&'a QuoteRecord>
where
    I: IntoIterator<Item = &'a QuoteRecord>,
    F: Fn(&QuoteRecord) -> Option<f64>,
    B: Fn(OrderedFloat<f64>, OrderedFloat<f64>) -> bool,
{
    let mut best: Option<(&QuoteRecord, OrderedFloat<f64>)> = None;
    for record in records {
        let Some(value) = key(record).map(OrderedFloat) else { continue };
        match best {
            Some((_, current)) if !better(value, current) => {}
            _ => best = Some((record, value)),
        }
    }
    best.map(|(record, _)| record)
}

/// First record with the largest absolute 24h change, strictly above zero.
pub fn volatility_focus<'a, I>(records: I) -> Option<&'a QuoteRecord>
where
    I: IntoIterator<Item = &'a QuoteRecord>,
{
    first_max_by(records, |r| Some(r.percent_change_24h.abs())).filter(|r| r.percent_change_24h.abs() > 0.0)
}
