//! Closing "Observação" sentence.
//!
//! Labels come from the engine; this module only maps them to phrases through
//! the tables below, so no threshold is evaluated twice.

use crate::engine::classify::ClassificationLabel::{self, *};
use crate::engine::{AnchorStatus, Mover, RankingResult};
use crate::render::format::format_percent;

/// Phrase per change tier, for the first and for any later anchor.
const ANCHOR_PHRASES: &[(ClassificationLabel, [&str; 2])] = &[
    (Lateral, ["está lateral", "levemente lateral"]),
    (MildPositive, ["levemente positiva", "levemente positiva"]),
    (MildNegative, ["levemente negativa", "levemente negativa"]),
];

const ANCHOR_UNAVAILABLE: &str = "sem cotação disponível";

/// `{pct}` is replaced by the signed 7-day change.
const TREND_TEMPLATES: &[(ClassificationLabel, &str)] = &[
    (StrongUptrend, "em forte tendência de alta ({pct} em 7 dias)"),
    (Uptrend, "em tendência de alta ({pct} em 7 dias)"),
    (Correction, "em correção de 7 dias ({pct})"),
    (StrongDowntrend, "em forte tendência de baixa ({pct} em 7 dias)"),
    (Downtrend, "em tendência de baixa ({pct} em 7 dias)"),
    (Consolidating, "em consolidação de 7 dias ({pct})"),
];

pub fn anchor_phrase(position: usize, label: Option<ClassificationLabel>) -> &'static str {
    label
        .and_then(|label| ANCHOR_PHRASES.iter().find(|(l, _)| *l == label))
        .map(|(_, phrases)| phrases[position.min(1)])
        .unwrap_or(ANCHOR_UNAVAILABLE)
}

pub fn trend_phrase(label: ClassificationLabel, change_7d: f64) -> Option<String> {
    TREND_TEMPLATES
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, template)| template.replace("{pct}", &format_percent(change_7d, 1)))
}

/// "BTC está lateral, ETH levemente negativa"
pub fn anchors_clause(anchors: &[AnchorStatus<'_>]) -> String {
    anchors
        .iter()
        .enumerate()
        .map(|(i, a)| format!("{} {}", a.symbol, anchor_phrase(i, a.label)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn mover_clause(lead: &str, mover: &Mover<'_>) -> String {
    let quote = mover.quote;
    let mut clause = format!(
        "{lead} <b>{}</b> ({})",
        quote.symbol,
        format_percent(quote.percent_change_24h, 1)
    );
    let trend = mover
        .trend
        .zip(quote.percent_change_7d)
        .and_then(|(label, change_7d)| trend_phrase(label, change_7d));
    if let Some(trend) = trend {
        clause.push_str(", que está ");
        clause.push_str(&trend);
    }
    clause.push('.');
    clause
}

/// Scanner narrative: anchors, then the leading gainer and loser of the listing.
pub fn scanner_observation(result: &RankingResult<'_>) -> String {
    let anchors = anchors_clause(&result.anchors);
    match (&result.best_mover, &result.worst_mover) {
        (Some(best), Some(worst)) => format!(
            "Observação: {anchors}. {} {}",
            mover_clause("O destaque de alta é", best),
            mover_clause("A maior pressão de venda está em", worst),
        ),
        _ => format!("Observação: {anchors}. Não foi possível analisar o mercado dinâmico."),
    }
}

/// Pulse narrative: anchors plus the most volatile symbol.
pub fn pulse_observation(result: &RankingResult<'_>) -> String {
    let focus = result.volatility_focus.map(|q| q.symbol.as_str()).unwrap_or("nenhum ativo");
    format!(
        "Observação: {}, foco de volatilidade hoje em {focus}.",
        anchors_clause(&result.anchors)
    )
}
