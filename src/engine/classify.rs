use std::fmt;

use serde::Deserialize;

/// Qualitative tag assigned from fixed numeric thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassificationLabel {
    Lateral,
    MildPositive,
    MildNegative,
    StrongUptrend,
    Uptrend,
    Correction,
    StrongDowntrend,
    Downtrend,
    Consolidating,
    BreakoutResistance,
    BreakoutSupport,
    RangeTestResistance,
    RangeTestSupport,
}

impl ClassificationLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationLabel::Lateral => "lateral",
            ClassificationLabel::MildPositive => "mild-positive",
            ClassificationLabel::MildNegative => "mild-negative",
            ClassificationLabel::StrongUptrend => "strong-uptrend",
            ClassificationLabel::Uptrend => "uptrend",
            ClassificationLabel::Correction => "correction",
            ClassificationLabel::StrongDowntrend => "strong-downtrend",
            ClassificationLabel::Downtrend => "downtrend",
            ClassificationLabel::Consolidating => "consolidating",
            ClassificationLabel::BreakoutResistance => "breakout-resistance",
            ClassificationLabel::BreakoutSupport => "breakout-support",
            ClassificationLabel::RangeTestResistance => "range-test-resistance",
            ClassificationLabel::RangeTestSupport => "range-test-support",
        }
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Threshold constants. Defaults reproduce the scheduled reports exactly.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// |24h change| at or below this is lateral (inclusive).
    pub lateral_band: f64,
    /// 7d change beyond +/- this is a strong trend.
    pub strong_trend_7d: f64,
    /// Window change needed for a breakout.
    pub breakout_change: f64,
    /// Max distance from the extreme, as a fraction of it, for a breakout.
    pub breakout_proximity: f64,
    /// Window change above which a range test is considered.
    pub range_test_min_change: f64,
    pub range_test_band_low: f64,
    pub range_test_band_high: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            lateral_band: 0.5,
            strong_trend_7d: 10.0,
            breakout_change: 3.0,
            breakout_proximity: 0.005,
            range_test_min_change: 0.5,
            range_test_band_low: 0.01,
            range_test_band_high: 0.05,
        }
    }
}

/// Lateral / mild-positive / mild-negative from a 24h change.
pub fn classify_change(change: f64, t: &Thresholds) -> ClassificationLabel {
    if -t.lateral_band <= change && change <= t.lateral_band {
        ClassificationLabel::Lateral
    } else if change > t.lateral_band {
        ClassificationLabel::MildPositive
    } else {
        ClassificationLabel::MildNegative
    }
}

/// Trend tier for a symbol that is leading the gainers.
pub fn classify_uptrend(change_7d: f64, t: &Thresholds) -> ClassificationLabel {
    if change_7d > t.strong_trend_7d {
        ClassificationLabel::StrongUptrend
    } else if change_7d > 0.0 {
        ClassificationLabel::Uptrend
    } else {
        ClassificationLabel::Correction
    }
}

/// Trend tier for a symbol that is leading the losers.
pub fn classify_downtrend(change_7d: f64, t: &Thresholds) -> ClassificationLabel {
    if change_7d < -t.strong_trend_7d {
        ClassificationLabel::StrongDowntrend
    } else if change_7d < 0.0 {
        ClassificationLabel::Downtrend
    } else {
        ClassificationLabel::Consolidating
    }
}

/// Price-action label for a candle window, or `None` when nothing stands out.
///
/// The range-test branches only fire inside the 1%-5% band from the extreme,
/// while breakouts need to close within 0.5%; a strong move closing between
/// the two bands gets no label at all.
pub fn classify_breakout(close: f64, high: f64, low: f64, change: f64, t: &Thresholds) -> Option<ClassificationLabel> {
    if high <= 0.0 || low <= 0.0 {
        return None;
    }
    let from_high = (high - close) / high;
    let from_low = (close - low) / low;
    let in_band = |r: f64| t.range_test_band_low < r && r < t.range_test_band_high;

    if change > t.breakout_change && from_high < t.breakout_proximity {
        Some(ClassificationLabel::BreakoutResistance)
    } else if change < -t.breakout_change && from_low < t.breakout_proximity {
        Some(ClassificationLabel::BreakoutSupport)
    } else if t.range_test_min_change < change && change < t.breakout_change && in_band(from_high) {
        Some(ClassificationLabel::RangeTestResistance)
    } else if -t.breakout_change < change && change < -t.range_test_min_change && in_band(from_low) {
        Some(ClassificationLabel::RangeTestSupport)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use ClassificationLabel::*;

    fn t() -> Thresholds {
        Thresholds::default()
    }

    #[test]
    fn lateral_band_is_inclusive() {
        assert_eq!(classify_change(0.5, &t()), Lateral);
        assert_eq!(classify_change(-0.5, &t()), Lateral);
        assert_eq!(classify_change(0.50001, &t()), MildPositive);
        assert_eq!(classify_change(-0.50001, &t()), MildNegative);
    }

    #[test]
    fn anchor_example_labels() {
        assert_eq!(classify_change(0.3, &t()), Lateral);
        assert_eq!(classify_change(-0.8, &t()), MildNegative);
    }

    #[test]
    fn trend_tiers() {
        assert_eq!(classify_uptrend(10.5, &t()), StrongUptrend);
        assert_eq!(classify_uptrend(10.0, &t()), Uptrend);
        assert_eq!(classify_uptrend(0.0, &t()), Correction);
        assert_eq!(classify_downtrend(-10.5, &t()), StrongDowntrend);
        assert_eq!(classify_downtrend(-10.0, &t()), Downtrend);
        assert_eq!(classify_downtrend(0.0, &t()), Consolidating);
    }

    #[test]
    fn strong_move_between_bands_gets_no_label() {
        // open=100 close=105 high=106: +5% but 0.94% off the high
        assert_eq!(classify_breakout(105.0, 106.0, 99.0, 5.0, &t()), None);
    }

    #[test]
    fn breakout_resistance_and_support() {
        assert_eq!(classify_breakout(105.0, 105.2, 99.0, 5.0, &t()), Some(BreakoutResistance));
        assert_eq!(classify_breakout(95.0, 101.0, 94.8, -5.0, &t()), Some(BreakoutSupport));
    }

    #[test]
    fn range_tests() {
        // +2%, 2% below the high
        assert_eq!(classify_breakout(102.0, 104.1, 99.0, 2.0, &t()), Some(RangeTestResistance));
        // -2%, 2% above the low
        assert_eq!(classify_breakout(98.0, 101.0, 96.0, -2.0, &t()), Some(RangeTestSupport));
        // +2% but closing on the high: neither band
        assert_eq!(classify_breakout(102.0, 102.0, 99.0, 2.0, &t()), None);
    }

    #[test]
    fn degenerate_extremes_are_ignored() {
        assert_eq!(classify_breakout(1.0, 0.0, 0.0, 10.0, &t()), None);
    }

    #[test]
    fn labels_render_kebab_case() {
        assert_eq!(MildNegative.to_string(), "mild-negative");
        assert_eq!(RangeTestSupport.as_str(), "range-test-support");
    }

    proptest! {
        #[test]
        fn change_label_is_a_step_function(change in -100.0f64..100.0) {
            let label = classify_change(change, &t());
            let expected = if change.abs() <= 0.5 { Lateral } else if change > 0.0 { MildPositive } else { MildNegative };
            prop_assert_eq!(label, expected);
        }

        #[test]
        fn trend_labels_never_cross_sign(change in -50.0f64..50.0) {
            let up = classify_uptrend(change, &t());
            prop_assert_eq!(up == Correction, change <= 0.0);
            let down = classify_downtrend(change, &t());
            prop_assert_eq!(down == Consolidating, change >= 0.0);
        }
    }
}
