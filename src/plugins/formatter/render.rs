use serde::Serialize;

use super::classify::{Block, HeaderIcon, blocks};
use super::inline::{InlineNode, format_nodes, plain_text};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberedLine {
    pub number: Option<u32>,
    pub indented: bool,
    pub content: Vec<InlineNode>,
}

/// Ready-to-display tree for one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DisplayNode {
    Header {
        icon: HeaderIcon,
        content: Vec<InlineNode>,
        body: Vec<DisplayNode>,
    },
    BulletList {
        header: Option<Vec<InlineNode>>,
        items: Vec<Vec<InlineNode>>,
    },
    NumberedList {
        items: Vec<NumberedLine>,
    },
    Disclaimer {
        content: Vec<InlineNode>,
    },
    Greeting {
        content: Vec<InlineNode>,
    },
    Paragraph {
        content: Vec<InlineNode>,
    },
}

pub fn render_block(block: &Block) -> DisplayNode {
    match block {
        Block::Header { icon, text, body } => DisplayNode::Header {
            icon: *icon,
            content: format_nodes(text),
            body: body.as_deref().map(render_document).unwrap_or_default(),
        },
        Block::BulletList { header, items } => DisplayNode::BulletList {
            header: header.as_deref().map(format_nodes),
            items: items.iter().map(|item| format_nodes(item)).collect(),
        },
        Block::NumberedList { items } => DisplayNode::NumberedList {
            items: items
                .iter()
                .map(|item| NumberedLine {
                    number: item.number,
                    indented: item.number.is_none(),
                    content: format_nodes(&item.text),
                })
                .collect(),
        },
        Block::Disclaimer { text } => DisplayNode::Disclaimer {
            content: format_nodes(text),
        },
        Block::Greeting { text } => DisplayNode::Greeting {
            content: format_nodes(text),
        },
        Block::Paragraph { text } => DisplayNode::Paragraph {
            content: format_nodes(text),
        },
    }
}

/// Segment, classify and render `text` from scratch.
pub fn render_document(text: &str) -> Vec<DisplayNode> {
    blocks(text).iter().map(render_block).collect()
}

fn push_node_plain(node: &DisplayNode, out: &mut Vec<String>) {
    match node {
        DisplayNode::Header {
            icon,
            content,
            body,
        } => {
            out.push(format!("{} {}", icon.glyph(), plain_text(content)));
            for child in body {
                push_node_plain(child, out);
            }
        }
        DisplayNode::BulletList { header, items } => {
            if let Some(header) = header {
                out.push(plain_text(header));
            }
            for item in items {
                out.push(format!("  • {}", plain_text(item)));
            }
        }
        DisplayNode::NumberedList { items } => {
            for item in items {
                match item.number {
                    Some(n) => out.push(format!("  {n}. {}", plain_text(&item.content))),
                    None => out.push(format!("     {}", plain_text(&item.content))),
                }
            }
        }
        DisplayNode::Disclaimer { content } => {
            out.push(format!("ℹ️  {}", plain_text(content)));
        }
        DisplayNode::Greeting { content } => {
            out.push(format!("🙏 {}", plain_text(content)));
        }
        DisplayNode::Paragraph { content } => out.push(plain_text(content)),
    }
}

/// Terminal rendering: blocks separated by blank lines, markup dropped.
pub fn render_plain(nodes: &[DisplayNode]) -> String {
    nodes
        .iter()
        .map(|node| {
            let mut lines = Vec::new();
            push_node_plain(node, &mut lines);
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::formatter::inline::SpanKind;

    #[test]
    fn test_scenario_a_render() {
        let nodes = render_document("**What should I do?**\n\nCall the police immediately.");
        assert_eq!(
            nodes,
            vec![
                DisplayNode::Header {
                    icon: HeaderIcon::Default,
                    content: vec![InlineNode::text("What should I do?")],
                    body: Vec::new(),
                },
                DisplayNode::Paragraph {
                    content: vec![InlineNode::text("Call the police immediately.")],
                },
            ]
        );
    }

    #[test]
    fn test_scenario_c_amount_span() {
        let nodes = render_document("Pay ₹500 fine.");
        assert_eq!(
            nodes,
            vec![DisplayNode::Paragraph {
                content: vec![
                    InlineNode::text("Pay "),
                    InlineNode::Span {
                        kind: SpanKind::Amount,
                        children: vec![InlineNode::text("₹500")],
                    },
                    InlineNode::text(" fine."),
                ],
            }]
        );
    }

    #[test]
    fn test_header_body_renders_as_blocks() {
        let nodes = render_document("**Required documents:**\n* Licence\n* **Insurance**");
        match &nodes[..] {
            [DisplayNode::Header { icon, body, .. }] => {
                assert_eq!(*icon, HeaderIcon::Documents);
                assert_eq!(body.len(), 1);
                match &body[0] {
                    DisplayNode::BulletList { header, items } => {
                        assert!(header.is_none());
                        assert_eq!(items.len(), 2);
                        assert_eq!(
                            items[1],
                            vec![InlineNode::Span {
                                kind: SpanKind::Semibold,
                                children: vec![InlineNode::text("Insurance")],
                            }]
                        );
                    }
                    other => panic!("expected bullet list, got {other:?}"),
                }
            }
            other => panic!("expected one header, got {other:?}"),
        }
    }

    #[test]
    fn test_render_plain() {
        let text = "Namaste! LawBuddy here.\n\n**Legal basis:**\n\n1. Carry your **DL**\nat all times\n2. Pay ₹500\n\n* Stay calm\n* Be polite\n\nDisclaimer: consult a lawyer.";
        let plain = render_plain(&render_document(text));
        assert_eq!(
            plain,
            "🙏 Namaste! LawBuddy here.\n\n⚖️ Legal basis:\n\n  1. Carry your DL\n     at all times\n  2. Pay ₹500\n\n  • Stay calm\n  • Be polite\n\nℹ️  Disclaimer: consult a lawyer."
        );
    }

    #[test]
    fn test_markers_are_consumed() {
        let plain = render_plain(&render_document(
            "**Fine:** ***₹1,000*** for *no helmet*\n\n* one\n* two",
        ));
        assert!(!plain.contains('*'), "leftover marker in {plain:?}");
    }
}
