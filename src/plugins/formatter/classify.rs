//! Segment classification.
//!
//! The rules form an ordered table; the first predicate that accepts a segment
//! decides its kind. Parsing a segment into a [`Block`] may still fall back to
//! a paragraph when a list rule finds nothing to list.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::inline::{has_resolved_strong, strip_emphasis_markers};

static BLANK_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t\r]*\n").expect("static regex"));
static BULLET_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^|\s)[*•]\s").expect("static regex"));
static BULLET_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^|\s)[*•]\s+").expect("static regex"));
static BULLET_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[*•]\s").expect("static regex"));
static NUMBERED_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\.\s*(.*)$").expect("static regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

const GREETING_PHRASES: &[&str] = &["namaste", "lawbuddy here"];
const DISCLAIMER_PHRASES: &[&str] = &["disclaimer", "important notes"];

/// Header icons, matched by keyword in table order.
const HEADER_ICONS: &[(&[&str], HeaderIcon)] = &[
    (&["legal", "basis"], HeaderIcon::Legal),
    (&["police", "stopped"], HeaderIcon::Police),
    (&["documents", "papers"], HeaderIcon::Documents),
    (&["fine", "penalty"], HeaderIcon::Fine),
    (&["consequences"], HeaderIcon::Consequences),
    (&["procedure", "steps"], HeaderIcon::Procedure),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    Header,
    BulletList,
    NumberedList,
    Disclaimer,
    Greeting,
    Paragraph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HeaderIcon {
    Legal,
    Police,
    Documents,
    Fine,
    Consequences,
    Procedure,
    Default,
}

impl HeaderIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            HeaderIcon::Legal => "⚖️",
            HeaderIcon::Police => "🚓",
            HeaderIcon::Documents => "📄",
            HeaderIcon::Fine => "💰",
            HeaderIcon::Consequences => "⚠️",
            HeaderIcon::Procedure => "📋",
            HeaderIcon::Default => "📌",
        }
    }

    /// Pick the icon for a header by keyword.
    pub fn for_header(text: &str) -> Self {
        let lower = text.to_lowercase();
        HEADER_ICONS
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(_, icon)| *icon)
            .unwrap_or(HeaderIcon::Default)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberedItem {
    /// `None` for continuation lines, which render indented and unnumbered.
    pub number: Option<u32>,
    pub text: String,
}

/// A classified segment with its structure extracted.
///
/// Text fields still hold raw inline markers; the renderer formats them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Block {
    Header {
        icon: HeaderIcon,
        text: String,
        body: Option<String>,
    },
    BulletList {
        header: Option<String>,
        items: Vec<String>,
    },
    NumberedList {
        items: Vec<NumberedItem>,
    },
    Disclaimer {
        text: String,
    },
    Greeting {
        text: String,
    },
    Paragraph {
        text: String,
    },
}

struct Rule {
    kind: BlockKind,
    matches: fn(&str) -> bool,
}

const RULES: &[Rule] = &[
    Rule {
        kind: BlockKind::Header,
        matches: is_header,
    },
    Rule {
        kind: BlockKind::BulletList,
        matches: is_bullet_list,
    },
    Rule {
        kind: BlockKind::NumberedList,
        matches: is_numbered_list,
    },
    Rule {
        kind: BlockKind::Disclaimer,
        matches: is_disclaimer,
    },
];

fn is_header(segment: &str) -> bool {
    has_resolved_strong(segment) && (segment.contains('?') || segment.contains(':'))
}

fn is_bullet_list(segment: &str) -> bool {
    BULLET_MARKER_RE.is_match(segment)
}

fn is_numbered_list(segment: &str) -> bool {
    segment
        .lines()
        .next()
        .is_some_and(|line| NUMBERED_LINE_RE.is_match(line))
}

fn contains_any(segment: &str, phrases: &[&str]) -> bool {
    let lower = segment.to_lowercase();
    phrases.iter().any(|p| lower.contains(p))
}

fn is_disclaimer(segment: &str) -> bool {
    contains_any(segment, DISCLAIMER_PHRASES)
}

fn is_greeting(segment: &str) -> bool {
    contains_any(segment, GREETING_PHRASES)
}

/// Split text into trimmed, non-empty blank-line-delimited segments.
pub fn segments(text: &str) -> Vec<&str> {
    BLANK_LINE_RE
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Classify one segment. Total over non-empty input.
pub fn classify(segment: &str) -> BlockKind {
    RULES
        .iter()
        .find(|rule| (rule.matches)(segment))
        .map(|rule| rule.kind)
        .unwrap_or_else(|| paragraph_kind(segment))
}

fn paragraph_kind(segment: &str) -> BlockKind {
    if is_greeting(segment) {
        BlockKind::Greeting
    } else {
        BlockKind::Paragraph
    }
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

fn parse_header(segment: &str) -> Block {
    let mut lines = segment.lines();
    let first = lines.next().unwrap_or_default();
    let text = strip_emphasis_markers(first).trim().to_string();
    let body = lines.collect::<Vec<_>>().join("\n");
    let body = body.trim();
    Block::Header {
        icon: HeaderIcon::for_header(&text),
        text,
        body: (!body.is_empty()).then(|| body.to_string()),
    }
}

fn parse_bullet_list(segment: &str) -> Option<Block> {
    let (header, body) = match segment.split_once('\n') {
        Some((first, rest)) if !BULLET_LINE_RE.is_match(first) => {
            (Some(first.trim().to_string()), rest)
        }
        None if !BULLET_LINE_RE.is_match(segment) => {
            // A single line with mid-line markers: "Carry: * DL * RC".
            match BULLET_SPLIT_RE.find(segment) {
                Some(m) => (
                    Some(segment[..m.start()].trim().to_string()),
                    &segment[m.start()..],
                ),
                None => (None, segment),
            }
        }
        _ => (None, segment),
    };

    let items: Vec<String> = BULLET_SPLIT_RE
        .split(body)
        .map(collapse_whitespace)
        .filter(|item| !item.is_empty())
        .collect();

    if items.is_empty() {
        return None;
    }
    Some(Block::BulletList {
        header: header.filter(|h| !h.is_empty()),
        items,
    })
}

fn parse_numbered_list(segment: &str) -> Option<Block> {
    let mut items = Vec::new();
    for line in segment.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match NUMBERED_LINE_RE.captures(line) {
            Some(caps) => {
                let number = caps[1].parse::<u32>().ok();
                items.push(NumberedItem {
                    number,
                    text: caps[2].trim().to_string(),
                });
            }
            None => items.push(NumberedItem {
                number: None,
                text: line.to_string(),
            }),
        }
    }

    if !items.iter().any(|item| item.number.is_some()) {
        return None;
    }
    Some(Block::NumberedList { items })
}

/// Extract the structure of `segment` as `kind`.
///
/// List kinds that yield no items degrade to a paragraph.
pub fn parse_block(kind: BlockKind, segment: &str) -> Block {
    let parsed = match kind {
        BlockKind::Header => Some(parse_header(segment)),
        BlockKind::BulletList => parse_bullet_list(segment),
        BlockKind::NumberedList => parse_numbered_list(segment),
        BlockKind::Disclaimer => Some(Block::Disclaimer {
            text: segment.to_string(),
        }),
        BlockKind::Greeting => Some(Block::Greeting {
            text: segment.to_string(),
        }),
        BlockKind::Paragraph => Some(Block::Paragraph {
            text: segment.to_string(),
        }),
    };

    parsed.unwrap_or_else(|| {
        log::debug!("segment classified as {kind:?} had no items; rendering as paragraph");
        Block::Paragraph {
            text: segment.to_string(),
        }
    })
}

/// Segment and classify the whole text.
pub fn blocks(text: &str) -> Vec<Block> {
    segments(text)
        .into_iter()
        .map(|segment| parse_block(classify(segment), segment))
        .collect()
}
