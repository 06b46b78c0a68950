//! Inline emphasis and entity highlighting.
//!
//! `format_inline` rewrites raw assistant text into a small, fixed HTML-like
//! markup. Rules run in strict precedence order and only ever touch text runs
//! between tags, so a later rule can never re-open a span produced by an
//! earlier one. Highlight rules additionally leave highlight span contents
//! alone, which is what makes the transform idempotent.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

/// Statute names, agencies and documents highlighted as domain terms.
///
/// Longer alternatives come first so the alternation prefers them.
const DOMAIN_TERMS: &[&str] = &[
    "Central Motor Vehicle Rules",
    "Motor Vehicles Act",
    "Motor Vehicle Act",
    "Bharatiya Nyaya Sanhita",
    "Indian Penal Code",
    "Lok Adalat",
    "traffic police",
    "Traffic Police",
    "DigiLocker",
    "mParivahan",
    "e-challan",
    "challan",
    "Challan",
    "MV Act",
    "CrPC",
    "IPC",
    "RTO",
    "FIR",
    "PUC",
];

// Emphasis content must start and end with a non-asterisk, so runs of stars
// never leak into a span.
static STRONG_QUAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*{4}([^*](?:.*?[^*])?)\*{4}").expect("static regex"));
static STRONG_TRIPLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*{3}([^*](?:.*?[^*])?)\*{3}").expect("static regex"));
static SEMIBOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*](?:.*?[^*])?)\*\*").expect("static regex"));
static ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\n]+?)\*").expect("static regex"));
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:₹\s?|\bRs\.?\s?|\bINR\s?)\d+(?:,\d+)*(?:\.\d+)?").expect("static regex")
});
static CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bSection\s+\d+[A-Z]*").expect("static regex"));
static TERM_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = DOMAIN_TERMS
        .iter()
        .map(|term| regex::escape(term))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternatives})\b")).expect("static regex")
});

/// Semantic span produced by the inline formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SpanKind {
    Strong,
    Semibold,
    Italic,
    Amount,
    Citation,
    Term,
}

impl SpanKind {
    const ALL: [SpanKind; 6] = [
        SpanKind::Strong,
        SpanKind::Semibold,
        SpanKind::Italic,
        SpanKind::Amount,
        SpanKind::Citation,
        SpanKind::Term,
    ];

    pub fn open_tag(self) -> &'static str {
        match self {
            SpanKind::Strong => r#"<strong class="emphasis-strong">"#,
            SpanKind::Semibold => r#"<strong class="emphasis-semibold">"#,
            SpanKind::Italic => r#"<em class="emphasis-italic">"#,
            SpanKind::Amount => r#"<span class="highlight-amount">"#,
            SpanKind::Citation => r#"<span class="highlight-citation">"#,
            SpanKind::Term => r#"<span class="highlight-term">"#,
        }
    }

    pub fn close_tag(self) -> &'static str {
        match self {
            SpanKind::Strong | SpanKind::Semibold => "</strong>",
            SpanKind::Italic => "</em>",
            SpanKind::Amount | SpanKind::Citation | SpanKind::Term => "</span>",
        }
    }

    pub fn is_highlight(self) -> bool {
        matches!(self, SpanKind::Amount | SpanKind::Citation | SpanKind::Term)
    }
}

/// A node of formatted inline content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InlineNode {
    Text { text: String },
    Span { kind: SpanKind, children: Vec<InlineNode> },
}

impl InlineNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Concatenated text content with all markup removed.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.push_plain(&mut out);
        out
    }

    fn push_plain(&self, out: &mut String) {
        match self {
            InlineNode::Text { text } => out.push_str(text),
            InlineNode::Span { children, .. } => {
                for child in children {
                    child.push_plain(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    Open(SpanKind),
    Close(SpanKind),
}

/// Split formatted text into text runs and recognised tags.
///
/// Only the exact tags emitted by this module count as markup; any other `<`
/// is literal text. A close tag is only recognised when it closes the
/// innermost open span.
fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut stack: Vec<SpanKind> = Vec::new();
    let mut run_start = 0;
    let mut i = 0;

    while let Some(offset) = input[i..].find('<') {
        let at = i + offset;
        let rest = &input[at..];

        let tag = if let Some(kind) = SpanKind::ALL
            .into_iter()
            .find(|kind| rest.starts_with(kind.open_tag()))
        {
            stack.push(kind);
            Some((Token::Open(kind), kind.open_tag().len()))
        } else {
            match stack.last().copied() {
                Some(kind) if rest.starts_with(kind.close_tag()) => {
                    stack.pop();
                    Some((Token::Close(kind), kind.close_tag().len()))
                }
                _ => None,
            }
        };

        match tag {
            Some((token, len)) => {
                if run_start < at {
                    tokens.push(Token::Text(&input[run_start..at]));
                }
                tokens.push(token);
                i = at + len;
                run_start = i;
            }
            None => i = at + 1,
        }
    }

    if run_start < input.len() {
        tokens.push(Token::Text(&input[run_start..]));
    }
    tokens
}

/// Rewrite every text run outside highlight spans, keeping tags verbatim.
fn map_text_runs(input: &str, f: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(input.len());
    let mut highlight_depth = 0usize;

    for token in tokenize(input) {
        match token {
            Token::Text(text) if highlight_depth == 0 => out.push_str(&f(text)),
            Token::Text(text) => out.push_str(text),
            Token::Open(kind) => {
                if kind.is_highlight() {
                    highlight_depth += 1;
                }
                out.push_str(kind.open_tag());
            }
            Token::Close(kind) => {
                if kind.is_highlight() {
                    highlight_depth = highlight_depth.saturating_sub(1);
                }
                out.push_str(kind.close_tag());
            }
        }
    }
    out
}

fn wrap_group(input: &str, re: &Regex, kind: SpanKind) -> String {
    map_text_runs(input, |text| {
        re.replace_all(text, |caps: &Captures<'_>| {
            format!("{}{}{}", kind.open_tag(), &caps[1], kind.close_tag())
        })
        .into_owned()
    })
}

fn wrap_match(input: &str, re: &Regex, kind: SpanKind) -> String {
    map_text_runs(input, |text| {
        re.replace_all(text, |caps: &Captures<'_>| {
            format!("{}{}{}", kind.open_tag(), &caps[0], kind.close_tag())
        })
        .into_owned()
    })
}

/// Resolve inline emphasis and highlight entities.
///
/// Calling this on its own output is a no-op.
pub fn format_inline(text: &str) -> String {
    let out = wrap_group(text, &STRONG_QUAD_RE, SpanKind::Strong);
    let out = wrap_group(&out, &STRONG_TRIPLE_RE, SpanKind::Strong);
    let out = wrap_group(&out, &SEMIBOLD_RE, SpanKind::Semibold);
    let out = wrap_group(&out, &ITALIC_RE, SpanKind::Italic);
    let out = wrap_match(&out, &AMOUNT_RE, SpanKind::Amount);
    let out = wrap_match(&out, &CITATION_RE, SpanKind::Citation);
    wrap_match(&out, &TERM_RE, SpanKind::Term)
}

/// True when `text` holds a closed `**…**` (or longer) emphasis pair.
pub fn has_resolved_strong(text: &str) -> bool {
    SEMIBOLD_RE.is_match(text)
}

/// Remove emphasis asterisks, leaving the words.
pub fn strip_emphasis_markers(text: &str) -> String {
    text.replace('*', "")
}

/// Parse formatter output back into a typed tree.
///
/// Unclosed spans are closed at the end of input.
pub fn parse_markup(formatted: &str) -> Vec<InlineNode> {
    let mut stack: Vec<(SpanKind, Vec<InlineNode>)> = Vec::new();
    let mut root: Vec<InlineNode> = Vec::new();

    fn push_node(stack: &mut [(SpanKind, Vec<InlineNode>)], root: &mut Vec<InlineNode>, node: InlineNode) {
        let target = match stack.last_mut() {
            Some((_, children)) => children,
            None => root,
        };
        target.push(node);
    }

    for token in tokenize(formatted) {
        match token {
            Token::Text(text) => push_node(&mut stack, &mut root, InlineNode::text(text)),
            Token::Open(kind) => stack.push((kind, Vec::new())),
            Token::Close(_) => {
                if let Some((kind, children)) = stack.pop() {
                    push_node(&mut stack, &mut root, InlineNode::Span { kind, children });
                }
            }
        }
    }

    while let Some((kind, children)) = stack.pop() {
        push_node(&mut stack, &mut root, InlineNode::Span { kind, children });
    }
    root
}

/// Format raw text and return its inline tree.
pub fn format_nodes(text: &str) -> Vec<InlineNode> {
    parse_markup(&format_inline(text))
}

/// Plain text of an inline tree.
pub fn plain_text(nodes: &[InlineNode]) -> String {
    nodes.iter().map(InlineNode::plain_text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(kind: SpanKind, text: &str) -> String {
        format!("{}{}{}", kind.open_tag(), text, kind.close_tag())
    }

    #[test]
    fn test_emphasis_precedence() {
        assert_eq!(
            format_inline("****loud****"),
            span(SpanKind::Strong, "loud")
        );
        assert_eq!(format_inline("***loud***"), span(SpanKind::Strong, "loud"));
        assert_eq!(
            format_inline("a **bold** word"),
            format!("a {} word", span(SpanKind::Semibold, "bold"))
        );
        assert_eq!(
            format_inline("an *aside* here"),
            format!("an {} here", span(SpanKind::Italic, "aside"))
        );
    }

    #[test]
    fn test_italic_nested_inside_semibold() {
        let out = format_inline("**bold *inner* text**");
        assert_eq!(
            out,
            span(
                SpanKind::Semibold,
                &format!("bold {} text", span(SpanKind::Italic, "inner"))
            )
        );
    }

    #[test]
    fn test_highlights() {
        assert_eq!(
            format_inline("Pay ₹500 fine."),
            format!("Pay {} fine.", span(SpanKind::Amount, "₹500"))
        );
        assert_eq!(
            format_inline("Fine of ₹1,000 or Rs. 2,000"),
            format!(
                "Fine of {} or {}",
                span(SpanKind::Amount, "₹1,000"),
                span(SpanKind::Amount, "Rs. 2,000")
            )
        );
        assert_eq!(
            format_inline("See Section 194D of the Motor Vehicles Act"),
            format!(
                "See {} of the {}",
                span(SpanKind::Citation, "Section 194D"),
                span(SpanKind::Term, "Motor Vehicles Act")
            )
        );
        assert_eq!(
            format_inline("Visit the RTO"),
            format!("Visit the {}", span(SpanKind::Term, "RTO"))
        );
        // Word boundaries keep abbreviations from matching inside words.
        assert_eq!(format_inline("FIRST PUCK"), "FIRST PUCK");
    }

    #[test]
    fn test_highlight_inside_emphasis() {
        let out = format_inline("**₹5,000 fine**");
        assert_eq!(
            out,
            span(
                SpanKind::Semibold,
                &format!("{} fine", span(SpanKind::Amount, "₹5,000"))
            )
        );
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "",
            "plain text",
            "**What should I do?**",
            "****a**** ***b*** **c** *d*",
            "***a** b**",
            "a ** b * c",
            "5 * 3 = 15",
            "**bold *inner* text**",
            "Pay ₹500 under Section 177 of the Motor Vehicles Act at the RTO.",
            "x < 5 and <b>not ours</b>",
            "Section 12RTO challan e-challan",
            "********",
            "**unterminated",
        ];
        for sample in samples {
            let once = format_inline(sample);
            let twice = format_inline(&once);
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }

    fn assert_span_edges_clean(nodes: &[InlineNode], input: &str) {
        for node in nodes {
            if let InlineNode::Span { children, .. } = node {
                let text = node.plain_text();
                assert!(
                    !text.starts_with('*') && !text.ends_with('*'),
                    "span {text:?} keeps an asterisk for {input:?}"
                );
                assert_span_edges_clean(children, input);
            }
        }
    }

    #[test]
    fn test_formatted_spans_hold_no_asterisks() {
        let inputs = [
            "**a** and *b* and ***c***",
            "***Note:** text",
            "  ******* Section 1",
            "****<:***x**\n",
            "*****",
            "****a**** ***b*** **c** *d*",
            "***a** b**",
        ];
        for input in inputs {
            let nodes = format_nodes(input);
            assert_span_edges_clean(&nodes, input);
        }
    }

    #[test]
    fn test_star_runs_stay_literal() {
        assert_eq!(format_inline("*****"), "*****");
        assert_eq!(
            format_inline("***Note:** text"),
            format!("*{} text", span(SpanKind::Semibold, "Note:"))
        );
        assert_eq!(
            format_inline("  ******* Section 1"),
            format!("  ******* {}", span(SpanKind::Citation, "Section 1"))
        );
        assert_eq!(
            format_inline("****<:***x**\n"),
            format!("*{}x**\n", span(SpanKind::Strong, "<:"))
        );
    }

    #[test]
    fn test_literal_angle_brackets_are_text() {
        let nodes = format_nodes("speed < 40 km/h");
        assert_eq!(nodes, vec![InlineNode::text("speed < 40 km/h")]);
    }

    #[test]
    fn test_parse_markup_tree() {
        let nodes = format_nodes("Pay **₹500** now");
        assert_eq!(
            nodes,
            vec![
                InlineNode::text("Pay "),
                InlineNode::Span {
                    kind: SpanKind::Semibold,
                    children: vec![InlineNode::Span {
                        kind: SpanKind::Amount,
                        children: vec![InlineNode::text("₹500")],
                    }],
                },
                InlineNode::text(" now"),
            ]
        );
        assert_eq!(plain_text(&nodes), "Pay ₹500 now");
    }

    #[test]
    fn test_has_resolved_strong() {
        assert!(has_resolved_strong("**Legal basis:**"));
        assert!(has_resolved_strong("***x***"));
        assert!(!has_resolved_strong("**Legal basis:"));
        assert!(!has_resolved_strong("*x*"));
    }
}
