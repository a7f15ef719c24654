// Report layouts. Every function here is pure: same input, same string.

use itertools::Itertools;

use crate::engine::classify::ClassificationLabel;
use crate::engine::{RankingResult, TechnicalSignal};
use crate::market_data::types::{QuoteRecord, QuoteSet};
use crate::render::format::{
    change_icon, format_amount, format_percent, format_price_tiered, format_usd, format_volume, NumberFormat,
};
use crate::render::narrative::{pulse_observation, scanner_observation};

pub const QUOTES_ERROR: &str = "Erro ao obter dados das criptomoedas. Tente novamente mais tarde.";
pub const BINANCE_ERROR: &str = "Erro ao obter dados da Binance. A análise não pôde ser concluída.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Fixed table + listing movers (CoinMarketCap).
    Scanner,
    /// Biggest gainer/loser among a few majors (CoinMarketCap).
    Pulse,
    /// Candle-window highlights and price action (Binance).
    Overnight,
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub kind: ReportKind,
    /// Symbols of the fixed table, in display order.
    pub fixed_symbols: Vec<String>,
    pub top_k: usize,
    pub number_format: NumberFormat,
}

impl ReportKind {
    /// Fixed text returned instead of a report when there is no data.
    pub fn error_text(&self) -> &'static str {
        match self {
            ReportKind::Scanner | ReportKind::Pulse => QUOTES_ERROR,
            ReportKind::Overnight => BINANCE_ERROR,
        }
    }
}

/// Render a report. `None` is the "no data" marker and yields the fixed error text.
pub fn render(result: Option<&RankingResult<'_>>, quotes: &QuoteSet, opts: &RenderOptions) -> String {
    let Some(result) = result else {
        return opts.kind.error_text().to_string();
    };
    match opts.kind {
        ReportKind::Scanner => render_scanner(result, quotes, opts),
        ReportKind::Pulse => render_pulse(result, opts),
        ReportKind::Overnight => render_overnight(result, quotes, opts),
    }
}

fn quote_line(quote: &QuoteRecord, price: String, icon: &str) -> String {
    format!(
        "<b>{}</b>: {} {} ({})",
        quote.symbol,
        price,
        icon,
        format_percent(quote.percent_change_24h, 2)
    )
}

fn render_scanner(result: &RankingResult<'_>, quotes: &QuoteSet, opts: &RenderOptions) -> String {
    let nf = opts.number_format;
    let mut lines = vec![
        "<b>Análise VIP do Mercado Crypto</b>".to_string(),
        String::new(),
        format!("--- Moedas Fixas ({}) ---", opts.fixed_symbols.len()),
    ];

    for symbol in &opts.fixed_symbols {
        match quotes.get(symbol) {
            Some(q) => lines.push(quote_line(q, format_usd(q.price, 2, nf), change_icon(q.percent_change_24h))),
            None => lines.push(format!("<b>{symbol}</b>: Cotação não disponível.")),
        }
    }

    if result.has_movers() {
        lines.push(String::new());
        lines.push(format!("--- Top {} Ganhadoras (24h) ---", opts.top_k));
        for q in result.gainers.iter().filter(|q| q.percent_change_24h > 0.0) {
            lines.push(quote_line(q, format_usd(q.price, 2, nf), "🟢"));
        }

        lines.push(String::new());
        lines.push(format!("--- Top {} Perdedoras (24h) ---", opts.top_k));
        for q in result.losers.iter().filter(|q| q.percent_change_24h < 0.0) {
            lines.push(quote_line(q, format_usd(q.price, 2, nf), "🔴"));
        }
    }

    lines.push(String::new());
    lines.push(scanner_observation(result));
    lines.join("\n")
}

fn render_pulse(result: &RankingResult<'_>, opts: &RenderOptions) -> String {
    let count = opts.fixed_symbols.len();
    let mut lines = vec!["<b>Scanner VIP</b>".to_string(), String::new()];

    if let Some(best) = &result.best_mover {
        lines.push(format!(
            "🔼 Maior alta entre as {count}: <b>{}</b> {} (24h)",
            best.quote.symbol,
            format_percent(best.quote.percent_change_24h, 1)
        ));
    }
    if let Some(worst) = &result.worst_mover {
        lines.push(format!(
            "🔽 Maior queda entre as {count}: <b>{}</b> {} (24h)",
            worst.quote.symbol,
            format_percent(worst.quote.percent_change_24h, 1)
        ));
    }

    lines.push(String::new());
    lines.push(pulse_observation(result));
    lines.join("\n")
}

/// Price-action templates; `{hours}`, `{high}` and `{low}` are filled per signal.
const SIGNAL_TEMPLATES: &[(ClassificationLabel, &str)] = &[
    (
        ClassificationLabel::BreakoutResistance,
        "Fechou o período de {hours}h na máxima, indicando um <b>forte rompimento de resistência</b> \
         e pressão compradora. Próximo alvo em {high}.",
    ),
    (
        ClassificationLabel::BreakoutSupport,
        "Fechou o período de {hours}h na mínima, indicando <b>rompimento de fundo importante</b> \
         e pressão vendedora. Próximo suporte em {low}.",
    ),
    (
        ClassificationLabel::RangeTestResistance,
        "Testou a resistência em {high} e recuou, indicando <b>pressão vendedora</b> no topo do range.",
    ),
    (
        ClassificationLabel::RangeTestSupport,
        "Testou o suporte em {low} e se recuperou, indicando <b>pressão compradora</b> no fundo do range.",
    ),
];

fn signal_line(signal: &TechnicalSignal<'_>, nf: NumberFormat) -> Option<String> {
    let (_, template) = SIGNAL_TEMPLATES.iter().find(|(label, _)| *label == signal.label)?;
    let q = signal.quote;
    let hours = q.window.map(|w| w.bars).unwrap_or_default();
    let body = template
        .replace("{hours}", &hours.to_string())
        .replace("{high}", &format_amount(q.period_high.unwrap_or_default(), 4, nf))
        .replace("{low}", &format_amount(q.period_low.unwrap_or_default(), 4, nf));
    Some(format!("<b>{}</b>: {}", q.symbol, body))
}

fn render_overnight(result: &RankingResult<'_>, quotes: &QuoteSet, opts: &RenderOptions) -> String {
    let nf = opts.number_format;
    let (Some(volume), Some(best), Some(worst)) = (result.volume_leader, result.window_best, result.window_worst)
    else {
        return BINANCE_ERROR.to_string();
    };
    let window_change = |q: &QuoteRecord| q.window.map(|w| w.change_percent).unwrap_or_default();

    let mut lines = vec![
        "<b>Giro da Madrugada VIP 🌙</b>".to_string(),
        "(Análise Gráfico 1H - 00:00 às 07:00 Lisboa)".to_string(),
        String::new(),
        "--- Destaques do Período ---".to_string(),
        format!(
            "🔥 Maior Volume Negociado: <b>{}</b> ({})",
            volume.symbol,
            format_volume(volume.volume.unwrap_or_default())
        ),
        format!("🚀 Maior Alta: <b>{}</b> ({})", best.symbol, format_percent(window_change(best), 2)),
        format!("📉 Maior Baixa: <b>{}</b> ({})", worst.symbol, format_percent(window_change(worst), 2)),
        String::new(),
        "--- Análise Técnica (Price Action) ---".to_string(),
    ];

    let signals: Vec<String> = result.signals.iter().filter_map(|s| signal_line(s, nf)).collect();
    if signals.is_empty() {
        lines.push(
            "O mercado se manteve em consolidação, sem rompimentos significativos de máxima ou mínima do período."
                .to_string(),
        );
    } else {
        lines.extend(signals);
    }

    lines.push(String::new());
    lines.push("--- Cotações Atuais ---".to_string());
    for q in quotes.iter().sorted_by(|a, b| a.symbol.cmp(&b.symbol)) {
        lines.push(quote_line(q, format_price_tiered(q.price, nf), change_icon(q.percent_change_24h)));
    }

    lines.push(String::new());
    lines.push("<i>Análise baseada no método Marcus Aurora</i>".to_string());
    lines.join("\n")
}
