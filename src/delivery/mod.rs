// Outbound delivery of a rendered report.

use std::borrow::Cow;

use serde::Deserialize;

use crate::error::ScanResult;

pub mod telegram;

pub use telegram::TelegramSink;

/// How the destination should treat the report's HTML markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    #[default]
    Html,
    /// Tags are stripped before sending.
    Plain,
}

impl RenderMode {
    /// Value for Telegram's `parse_mode`; plain text sends none.
    pub fn parse_mode(&self) -> Option<&'static str> {
        match self {
            RenderMode::Html => Some("HTML"),
            RenderMode::Plain => None,
        }
    }

    /// The rendered report as this mode sends it.
    pub fn prepare<'a>(&self, html: &'a str) -> Cow<'a, str> {
        match self {
            RenderMode::Html => Cow::Borrowed(html),
            RenderMode::Plain => Cow::Owned(strip_tags(html)),
        }
    }
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Best-effort, single-attempt delivery.
#[async_trait::async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, destination: &str, text: &str, mode: RenderMode) -> ScanResult<()>;
}
