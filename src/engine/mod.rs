//! Ranking & classification over one `QuoteSet`.
//!
//! `rank_and_classify` never mutates its input; the `RankingResult` it returns
//! borrows from the set it was computed over.

pub mod classify;
pub mod ranking;

use tracing::{debug, instrument};

use crate::error::{ScanError, ScanResult};
use crate::market_data::types::{QuoteRecord, QuoteSet};
use classify::{classify_breakout, classify_change, classify_downtrend, classify_uptrend, ClassificationLabel, Thresholds};
use ranking::{first_max_by, first_min_by, sort_by_change_desc, top_and_bottom, volatility_focus};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Reference symbols whose 24h change feeds the narrative.
    pub anchors: Vec<String>,
    /// Symbols left out of the movers ranking (the fixed table).
    pub excluded: Vec<String>,
    pub top_k: usize,
    pub thresholds: Thresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            anchors: vec!["BTC".into(), "ETH".into()],
            excluded: Vec::new(),
            top_k: 5,
            thresholds: Thresholds::default(),
        }
    }
}

/// An anchor symbol and, when it was fetched, its 24h label.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorStatus<'a> {
    pub symbol: String,
    pub quote: Option<&'a QuoteRecord>,
    pub label: Option<ClassificationLabel>,
}

/// Best or worst mover plus its 7-day trend tier, if the 7d change is known.
#[derive(Debug, Clone, PartialEq)]
pub struct Mover<'a> {
    pub quote: &'a QuoteRecord,
    pub trend: Option<ClassificationLabel>,
}

/// Price-action label for one candle window.
#[derive(Debug, Clone, PartialEq)]
pub struct TechnicalSignal<'a> {
    pub quote: &'a QuoteRecord,
    pub label: ClassificationLabel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankingResult<'a> {
    pub anchors: Vec<AnchorStatus<'a>>,
    /// Top-K by 24h change, highest first.
    pub gainers: Vec<&'a QuoteRecord>,
    /// Bottom-K by 24h change, lowest first.
    pub losers: Vec<&'a QuoteRecord>,
    pub best_mover: Option<Mover<'a>>,
    pub worst_mover: Option<Mover<'a>>,
    pub volume_leader: Option<&'a QuoteRecord>,
    /// First record with the highest 7-day change. Exposed for callers; no
    /// report layout prints it.
    pub strongest_7d: Option<&'a QuoteRecord>,
    /// Best and worst candle-window change (candle quotes only).
    pub window_best: Option<&'a QuoteRecord>,
    pub window_worst: Option<&'a QuoteRecord>,
    pub volatility_focus: Option<&'a QuoteRecord>,
    pub signals: Vec<TechnicalSignal<'a>>,
}

impl RankingResult<'_> {
    /// True when there were movers to rank (i.e. the dynamic sections apply).
    pub fn has_movers(&self) -> bool {
        !self.gainers.is_empty()
    }
}

#[instrument(skip_all, fields(quotes = set.len(), top_k = cfg.top_k))]
pub fn rank_and_classify<'a>(set: &'a QuoteSet, cfg: &EngineConfig) -> ScanResult<RankingResult<'a>> {
    if set.is_empty() {
        return Err(ScanError::InsufficientData { needed: 1, got: 0 });
    }
    let t = &cfg.thresholds;

    let anchors = cfg
        .anchors
        .iter()
        .map(|symbol| {
            let quote = set.get(symbol);
            AnchorStatus {
                symbol: symbol.clone(),
                quote,
                label: quote.map(|q| classify_change(q.percent_change_24h, t)),
            }
        })
        .collect();

    let movers = sort_by_change_desc(set.iter().filter(|r| !cfg.excluded.contains(&r.symbol)));
    let (gainers, losers) = top_and_bottom(&movers, cfg.top_k);

    let best_mover = movers.first().copied().map(|q| Mover {
        quote: q,
        trend: q.percent_change_7d.map(|c| classify_uptrend(c, t)),
    });
    let worst_mover = movers.last().copied().map(|q| Mover {
        quote: q,
        trend: q.percent_change_7d.map(|c| classify_downtrend(c, t)),
    });

    let signals: Vec<TechnicalSignal> = set
        .iter()
        .filter_map(|q| {
            let w = q.window.as_ref()?;
            let label = classify_breakout(w.close, w.high, w.low, w.change_percent, t)?;
            Some(TechnicalSignal { quote: q, label })
        })
        .collect();

    let result = RankingResult {
        anchors,
        gainers,
        losers,
        best_mover,
        worst_mover,
        volume_leader: first_max_by(set, |r| r.volume),
        strongest_7d: first_max_by(set, |r| r.percent_change_7d),
        window_best: first_max_by(set, |r| r.window.map(|w| w.change_percent)),
        window_worst: first_min_by(set, |r| r.window.map(|w| w.change_percent)),
        volatility_focus: volatility_focus(set),
        signals,
    };
    debug!(
        movers = movers.len(),
        signals = result.signals.len(),
        volume_leader = result.volume_leader.map(|q| q.symbol.as_str()),
        "Ranked quote set"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::types::CandleWindow;
    use ClassificationLabel::*;

    fn rec(symbol: &str, c24: f64, c7: f64) -> QuoteRecord {
        QuoteRecord::new(symbol, 1.0, c24).with_change_7d(Some(c7))
    }

    fn window(open: f64, close: f64, high: f64, low: f64, volume: f64) -> CandleWindow {
        CandleWindow {
            open,
            close,
            high,
            low,
            total_volume: volume,
            change_percent: crate::market_data::normaliser::change_percent(open, close),
            bars: 7,
        }
    }

    fn scanner_cfg() -> EngineConfig {
        EngineConfig { excluded: vec!["BTC".into(), "ETH".into()], ..EngineConfig::default() }
    }

    #[test]
    fn empty_set_is_insufficient() {
        let set = QuoteSet::new();
        assert!(matches!(
            rank_and_classify(&set, &EngineConfig::default()),
            Err(ScanError::InsufficientData { .. })
        ));
    }

    #[test]
    fn anchors_are_labelled() {
        let set: QuoteSet = vec![
            QuoteRecord::new("BTC", 65_000.0, 0.3),
            QuoteRecord::new("ETH", 3_200.5, -0.8),
        ]
        .into_iter()
        .collect();
        let result = rank_and_classify(&set, &EngineConfig::default()).unwrap();
        assert_eq!(result.anchors[0].label, Some(Lateral));
        assert_eq!(result.anchors[1].label, Some(MildNegative));
    }

    #[test]
    fn missing_anchor_has_no_label() {
        let set: QuoteSet = vec![QuoteRecord::new("BTC", 1.0, 2.0)].into_iter().collect();
        let result = rank_and_classify(&set, &EngineConfig::default()).unwrap();
        assert_eq!(result.anchors[1].symbol, "ETH");
        assert!(result.anchors[1].quote.is_none());
        assert!(result.anchors[1].label.is_none());
    }

    #[test]
    fn movers_exclude_fixed_symbols() {
        let set: QuoteSet = vec![
            rec("BTC", 50.0, 0.0),
            rec("ETH", -50.0, 0.0),
            rec("AAA", 12.0, 15.0),
            rec("BBB", 3.0, 2.0),
            rec("CCC", -9.0, -20.0),
        ]
        .into_iter()
        .collect();
        let result = rank_and_classify(&set, &scanner_cfg()).unwrap();

        let gainers: Vec<&str> = result.gainers.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(gainers, vec!["AAA", "BBB", "CCC"]);
        let best = result.best_mover.as_ref().unwrap();
        assert_eq!(best.quote.symbol, "AAA");
        assert_eq!(best.trend, Some(StrongUptrend));
        let worst = result.worst_mover.as_ref().unwrap();
        assert_eq!(worst.quote.symbol, "CCC");
        assert_eq!(worst.trend, Some(StrongDowntrend));
        assert!(result.has_movers());
    }

    #[test]
    fn only_fixed_symbols_means_no_movers() {
        let set: QuoteSet = vec![rec("BTC", 1.0, 0.0), rec("ETH", 1.0, 0.0)].into_iter().collect();
        let result = rank_and_classify(&set, &scanner_cfg()).unwrap();
        assert!(!result.has_movers());
        assert!(result.best_mover.is_none());
        assert!(result.worst_mover.is_none());
    }

    #[test]
    fn window_quotes_produce_leaders_and_signals() {
        let set: QuoteSet = vec![
            QuoteRecord::new("AAA", 105.0, 1.0).with_window(window(100.0, 105.0, 106.0, 99.0, 10.0)),
            QuoteRecord::new("BBB", 105.0, 1.0).with_window(window(100.0, 105.0, 105.2, 99.0, 50.0)),
            QuoteRecord::new("CCC", 95.0, -1.0).with_window(window(100.0, 95.0, 101.0, 94.8, 20.0)),
        ]
        .into_iter()
        .collect();
        let result = rank_and_classify(&set, &EngineConfig::default()).unwrap();

        assert_eq!(result.volume_leader.unwrap().symbol, "BBB");
        assert_eq!(result.window_best.unwrap().symbol, "AAA");
        assert_eq!(result.window_worst.unwrap().symbol, "CCC");

        let signals: Vec<(&str, ClassificationLabel)> =
            result.signals.iter().map(|s| (s.quote.symbol.as_str(), s.label)).collect();
        assert_eq!(signals, vec![("BBB", BreakoutResistance), ("CCC", BreakoutSupport)]);
    }

    #[test]
    fn strongest_7d_is_first_max_and_skips_unknown() {
        let set: QuoteSet = vec![
            QuoteRecord::new("AAA", 1.0, 1.0),
            rec("BBB", 1.0, 8.0),
            QuoteRecord::new("CCC", 1.0, 2.0).with_change_7d(None),
            rec("DDD", 1.0, 8.0),
            rec("EEE", 1.0, -3.0),
        ]
        .into_iter()
        .collect();
        let result = rank_and_classify(&set, &EngineConfig::default()).unwrap();
        assert_eq!(result.strongest_7d.map(|q| q.symbol.as_str()), Some("BBB"));

        let unknown: QuoteSet = vec![QuoteRecord::new("AAA", 1.0, 1.0)].into_iter().collect();
        let result = rank_and_classify(&unknown, &EngineConfig::default()).unwrap();
        assert!(result.strongest_7d.is_none());
    }

    #[test]
    fn ranking_is_deterministic() {
        let set: QuoteSet = vec![rec("A", 1.0, 1.0), rec("B", 1.0, 1.0), rec("C", 2.0, 1.0)].into_iter().collect();
        let first = rank_and_classify(&set, &EngineConfig::default()).unwrap();
        let second = rank_and_classify(&set, &EngineConfig::default()).unwrap();
        assert_eq!(first, second);
    }
}
