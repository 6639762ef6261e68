//! Tiered field extraction from rendered profile pages
//!
//! Page layouts are not contractually stable, so a field is recovered by an
//! ordered list of strategies, most trusted first:
//! 1. precise selector for the known layout
//! 2. loose heading heuristic
//! 3. `<title>` heuristic
//! 4. literal text patterns over the raw markup
//!
//! Each strategy is pure and total: it returns `None` on a miss and never
//! panics. The first non-empty result wins.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Precise selector for the player name heading
const NAME_SELECTOR: &str = "h1.PlayerSummary_playerNameText__K7ZXO";

/// Info lines: `HEIGHT: 6'9" | WEIGHT: 250lb | ...`
const INFO_SELECTOR: &str = "p.PlayerSummary_playerInfoText__JrK0r";

static NAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)<h1[^>]*>([^<]+)</h1>"#,
        r#"(?i)<div[^>]*class="[^"]*player-name[^"]*"[^>]*>([^<]+)</div>"#,
        r#"(?i)player name: "([^"]+)""#,
        r#"(?i)playerName: "([^"]+)""#,
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// What to extract and the context the heuristics need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name, used for logging
    pub field: &'static str,
    /// CSS selector for the known page layout
    pub selector: &'static str,
    /// Identifier of the player the page describes
    pub identifier: String,
}

impl FieldSpec {
    pub fn display_name(identifier: impl Into<String>) -> Self {
        Self {
            field: crate::fields::DISPLAY_NAME,
            selector: NAME_SELECTOR,
            identifier: identifier.into(),
        }
    }
}

/// Markup parsed once and shared by every strategy
pub struct ParsedPage<'a> {
    pub raw: &'a str,
    pub document: Html,
}

impl<'a> ParsedPage<'a> {
    pub fn parse(raw: &'a str) -> Self {
        Self {
            raw,
            document: Html::parse_document(raw),
        }
    }
}

/// Strategy signature: pure, total
pub type Strategy = fn(&ParsedPage<'_>, &FieldSpec) -> Option<String>;

/// Strategies in trust order
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("precise_selector", precise_selector),
    ("heading_heuristic", heading_heuristic),
    ("title_heuristic", title_heuristic),
    ("text_patterns", text_patterns),
];

/// Run the strategies in order; `None` is the NotFound result
pub fn extract_field(raw_markup: &str, spec: &FieldSpec) -> Option<String> {
    let page = ParsedPage::parse(raw_markup);
    extract_from(&page, spec)
}

/// [`extract_field`] over an already parsed page
pub fn extract_from(page: &ParsedPage<'_>, spec: &FieldSpec) -> Option<String> {
    for (name, strategy) in STRATEGIES {
        if let Some(value) = strategy(page, spec) {
            debug!(
                field = spec.field,
                identifier = %spec.identifier,
                strategy = name,
                "Field extracted"
            );
            return Some(value);
        }
    }

    debug!(field = spec.field, identifier = %spec.identifier, "Field not found on page");
    None
}

/// Strategy 1: the selector tuned to the known layout
pub fn precise_selector(page: &ParsedPage<'_>, spec: &FieldSpec) -> Option<String> {
    let selector = Selector::parse(spec.selector).ok()?;
    page.document
        .select(&selector)
        .next()
        .and_then(|el| non_empty(element_text(el)))
}

/// Strategy 2: first `h1` whose id mentions the identifier or whose first
/// class mentions "player"
pub fn heading_heuristic(page: &ParsedPage<'_>, spec: &FieldSpec) -> Option<String> {
    let selector = Selector::parse("h1").ok()?;

    page.document
        .select(&selector)
        .filter(|h1| {
            let element = h1.value();
            let id_matches = !spec.identifier.is_empty()
                && element
                    .id()
                    .map(|id| id.contains(spec.identifier.as_str()))
                    .unwrap_or(false);
            let class_matches = element
                .classes()
                .next()
                .map(|class| class.to_lowercase().contains("player"))
                .unwrap_or(false);
            id_matches || class_matches
        })
        .find_map(|h1| non_empty(element_text(h1)))
}

/// Strategy 3: `<title>Name | Site</title>` → `Name`
pub fn title_heuristic(page: &ParsedPage<'_>, _spec: &FieldSpec) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let title = page.document.select(&selector).next().map(element_text)?;
    let (before, _) = title.split_once('|')?;
    non_empty(before.to_string())
}

/// Strategy 4: literal markers in the raw text
pub fn text_patterns(page: &ParsedPage<'_>, _spec: &FieldSpec) -> Option<String> {
    NAME_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(page.raw)
            .and_then(|caps| caps.get(1))
            .and_then(|m| non_empty(m.as_str().to_string()))
    })
}

/// Key/value pairs from the profile info lines
///
/// Each line is split on `|`; every part containing `:` becomes a
/// `(lower-cased key, value)` pair. Parts without `:` are skipped.
pub fn extract_info_pairs(raw_markup: &str) -> Vec<(String, String)> {
    let page = ParsedPage::parse(raw_markup);
    info_pairs_from(&page)
}

pub fn info_pairs_from(page: &ParsedPage<'_>) -> Vec<(String, String)> {
    let Ok(selector) = Selector::parse(INFO_SELECTOR) else {
        return Vec::new();
    };

    page.document
        .select(&selector)
        .map(element_text)
        .flat_map(|line| {
            line.split('|')
                .filter_map(|part| {
                    let (key, value) = part.split_once(':')?;
                    let key = key.trim().to_lowercase();
                    let value = value.trim().to_string();
                    (!key.is_empty() && !value.is_empty()).then_some((key, value))
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Element text with whitespace runs collapsed
fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(text: String) -> Option<String> {
    let collapsed = collapse_whitespace(&text);
    (!collapsed.is_empty()).then_some(collapsed)
}
