//! Top-level block collection over the pulldown-cmark event stream.
//!
//! The segmenter wants to reason about a flat, ordered sequence of typed
//! block nodes, not a token stream. This module folds the CommonMark event
//! stream (tables and strikethrough enabled) into that sequence, computing
//! each node's flattened text along the way.
//!
//! "Flattened text" is the depth-first concatenation of all text-bearing
//! leaves with single-space separators, trimmed. Inline markup is not
//! preserved; the alt text of an inline image contributes to the flattened
//! text and the first image's target is captured separately.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// A typed top-level block node.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Block {
    Heading {
        level: u8,
        text: String,
    },
    Paragraph {
        text: String,
        /// First inline image in the paragraph, as (path, alt).
        image: Option<(String, String)>,
    },
    List {
        ordered: bool,
        items: Vec<String>,
    },
    CodeBlock {
        language: String,
        body: String,
    },
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

/// Parse Markdown and collect its top-level blocks.
///
/// Block kinds with no slide semantics (blockquotes, thematic breaks, raw
/// HTML blocks, footnote definitions) are consumed and dropped here.
pub(crate) fn collect_blocks(source: &str) -> Vec<Block> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut events = Parser::new_ext(source, options);
    let mut blocks = Vec::new();

    while let Some(event) = events.next() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                let text = flatten_until_end(&mut events, &mut None);
                blocks.push(Block::Heading {
                    level: heading_rank(level),
                    text,
                });
            }
            Event::Start(Tag::Paragraph) => {
                let mut image = None;
                let text = flatten_until_end(&mut events, &mut image);
                blocks.push(Block::Paragraph { text, image });
            }
            Event::Start(Tag::List(start)) => {
                blocks.push(collect_list(&mut events, start.is_some()));
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info.trim().to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                blocks.push(Block::CodeBlock {
                    language,
                    body: collect_code_body(&mut events),
                });
            }
            Event::Start(Tag::Table(_)) => {
                blocks.push(collect_table(&mut events));
            }
            Event::Start(_) => skip_container(&mut events),
            // Thematic breaks, loose HTML and other top-level events carry
            // no slide content.
            _ => {}
        }
    }

    blocks
}

fn heading_rank(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Flatten everything up to the current container's matching `End` event.
///
/// Nested inline or block tags contribute their text and nothing else.
/// When `first_image` is provided, the first inline image's destination and
/// alt text are recorded; the alt text also joins the flattened output.
fn flatten_until_end(
    events: &mut Parser<'_>,
    first_image: &mut Option<(String, String)>,
) -> String {
    let mut pieces: Vec<String> = Vec::new();
    let mut depth = 0usize;

    while let Some(event) = events.next() {
        match event {
            Event::Start(Tag::Image { dest_url, .. }) => {
                let alt = flatten_until_end(events, &mut None);
                if first_image.is_none() {
                    *first_image = Some((dest_url.to_string(), alt.clone()));
                }
                if !alt.is_empty() {
                    pieces.push(alt);
                }
            }
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Text(text) | Event::Code(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    pieces.push(trimmed.to_string());
                }
            }
            // Both break kinds act as a plain separator in flattened text.
            Event::SoftBreak | Event::HardBreak => {}
            _ => {}
        }
    }

    pieces.join(" ")
}

/// Collect a list's direct items. Each item is flattened to text; nested
/// sub-lists dissolve into their parent item's text.
fn collect_list(events: &mut Parser<'_>, ordered: bool) -> Block {
    let mut items = Vec::new();

    while let Some(event) = events.next() {
        match event {
            Event::Start(Tag::Item) => {
                items.push(flatten_until_end(events, &mut None));
            }
            Event::End(TagEnd::List(_)) => break,
            _ => {}
        }
    }

    Block::List { ordered, items }
}

/// Collect the raw, unescaped body of a code block.
fn collect_code_body(events: &mut Parser<'_>) -> String {
    let mut body = String::new();

    for event in events.by_ref() {
        match event {
            Event::Text(text) => body.push_str(&text),
            Event::End(TagEnd::CodeBlock) => break,
            _ => {}
        }
    }

    body
}

/// Collect a table's header cells and body rows in document order.
fn collect_table(events: &mut Parser<'_>) -> Block {
    let mut headers = Vec::new();
    let mut rows = Vec::new();
    let mut current_row: Option<Vec<String>> = None;
    let mut in_head = false;

    while let Some(event) = events.next() {
        match event {
            Event::Start(Tag::TableHead) => in_head = true,
            Event::End(TagEnd::TableHead) => in_head = false,
            Event::Start(Tag::TableRow) => current_row = Some(Vec::new()),
            Event::End(TagEnd::TableRow) => {
                if let Some(row) = current_row.take() {
                    rows.push(row);
                }
            }
            Event::Start(Tag::TableCell) => {
                let text = flatten_until_end(events, &mut None);
                if in_head {
                    headers.push(text);
                } else if let Some(row) = current_row.as_mut() {
                    row.push(text);
                }
            }
            Event::End(TagEnd::Table) => break,
            _ => {}
        }
    }

    Block::Table { headers, rows }
}

/// Consume a container block that produces no output.
fn skip_container(events: &mut Parser<'_>) {
    let mut depth = 0usize;

    for event in events.by_ref() {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_and_paragraphs() {
        let blocks = collect_blocks("# Title\n\nSome **bold** prose.\n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0],
            Block::Heading {
                level: 1,
                text: "Title".into()
            }
        );
        match &blocks[1] {
            Block::Paragraph { text, image } => {
                assert_eq!(text, "Some bold prose.");
                assert!(image.is_none());
            }
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[test]
    fn test_inline_image_capture() {
        let blocks = collect_blocks("![A chart](chart.png)\n");
        match &blocks[0] {
            Block::Paragraph { image, .. } => {
                assert_eq!(
                    image.as_ref().unwrap(),
                    &("chart.png".to_string(), "A chart".to_string())
                );
            }
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_list_flattens_into_parent_item() {
        let blocks = collect_blocks("- outer\n  - inner one\n  - inner two\n- second\n");
        match &blocks[0] {
            Block::List { ordered, items } => {
                assert!(!ordered);
                assert_eq!(items.len(), 2);
                assert_eq!(items[0], "outer inner one inner two");
                assert_eq!(items[1], "second");
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_fenced_code_block_keeps_raw_body() {
        let blocks = collect_blocks("```python\ndef hello():\n    pass\n```\n");
        match &blocks[0] {
            Block::CodeBlock { language, body } => {
                assert_eq!(language, "python");
                assert_eq!(body, "def hello():\n    pass\n");
            }
            other => panic!("expected code block, got {other:?}"),
        }
    }

    #[test]
    fn test_table_collection() {
        let blocks = collect_blocks("| H1 | H2 |\n|--|--|\n| a | b |\n| c | d |\n");
        match &blocks[0] {
            Block::Table { headers, rows } => {
                assert_eq!(headers, &["H1", "H2"]);
                assert_eq!(rows, &[vec!["a", "b"], vec!["c", "d"]]);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_table_without_body_rows() {
        let blocks = collect_blocks("| H1 | H2 |\n|--|--|\n");
        match &blocks[0] {
            Block::Table { headers, rows } => {
                assert_eq!(headers.len(), 2);
                assert!(rows.is_empty());
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_blockquote_is_dropped() {
        let blocks = collect_blocks("> quoted text\n\nafter\n");
        assert_eq!(blocks.len(), 1);
        match &blocks[0] {
            Block::Paragraph { text, .. } => assert_eq!(text, "after"),
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[test]
    fn test_thematic_break_is_dropped() {
        let blocks = collect_blocks("before\n\n---\n\nafter\n");
        assert_eq!(blocks.len(), 2);
    }
}
