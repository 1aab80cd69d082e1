//! Heading-driven document segmentation.
//!
//! A single top-to-bottom pass over the top-level block sequence partitions
//! the document into slides:
//!
//! - the **first** H1 opens the title slide (index 0); any later H1 is
//!   inert, a documented limitation rather than an error;
//! - every H2 closes the open slide and opens a content slide with a
//!   1-based index;
//! - an H3 immediately following an H2 becomes that slide's lead text and
//!   contributes no element; any other H3 contributes nothing;
//! - other blocks map to at most one element each and attach to the open
//!   slide; blocks outside any open slide are dropped.
//!
//! Speaker notes duplicate the governing heading's flattened text, matching
//! the converter this crate replaces (see DESIGN.md).

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::blocks::{Block, collect_blocks};
use crate::document::{Element, ListKind, SlideContent};

/// Inline image syntax, `![alt](path)`. Only the first match in a
/// paragraph is ever used.
static IMAGE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").expect("image pattern compiles"));

/// A fenced Mermaid block that survived inside a paragraph's flattened
/// text (for example when indented into a loose line).
static MERMAID_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```mermaid\s*\n(.*?)\n?```").expect("mermaid pattern compiles"));

/// Segment Markdown source into an ordered sequence of slides.
///
/// Input lacking any heading yields an empty sequence. The slide count is
/// `(1 if an H1 exists else 0) + (number of H2 headings)`.
///
/// # Examples
///
/// ```rust
/// let slides = longan::markdown::segment("# Deck\n\n## First\n\nBody.");
/// assert_eq!(slides.len(), 2);
/// assert_eq!(slides[0].index, 0);
/// assert_eq!(slides[1].title, "First");
/// ```
pub fn segment(source: &str) -> Vec<SlideContent> {
    let mut slides: Vec<SlideContent> = Vec::new();
    let mut current: Option<SlideContent> = None;
    let mut h1_seen = false;
    let mut content_index = 0usize;

    let mut blocks = collect_blocks(source).into_iter().peekable();

    while let Some(block) = blocks.next() {
        match block {
            Block::Heading { level: 1, text } => {
                if h1_seen {
                    debug!("ignoring repeated H1 '{text}'");
                    continue;
                }
                h1_seen = true;
                if let Some(slide) = current.take() {
                    slides.push(slide);
                }
                let mut slide = SlideContent::new(text.clone(), 0);
                slide.set_notes(text);
                current = Some(slide);
            }
            Block::Heading { level: 2, text } => {
                if let Some(slide) = current.take() {
                    slides.push(slide);
                }
                content_index += 1;
                let mut slide = SlideContent::new(text.clone(), content_index);
                slide.set_notes(text);
                // An H3 as the very next block is lead text, consumed here.
                if matches!(blocks.peek(), Some(Block::Heading { level: 3, .. })) {
                    if let Some(Block::Heading { text: lead, .. }) = blocks.next() {
                        slide.lead_text = Some(lead);
                    }
                }
                current = Some(slide);
            }
            Block::Heading { .. } => {}
            other => match current.as_mut() {
                Some(slide) => {
                    if let Some(element) = block_to_element(other) {
                        slide.add_element(element);
                    }
                }
                None => debug!("dropping block outside any slide"),
            },
        }
    }

    if let Some(slide) = current.take() {
        slides.push(slide);
    }

    debug!("segmented {} slide(s)", slides.len());
    slides
}

/// Map one block to at most one element; first matching rule wins.
fn block_to_element(block: Block) -> Option<Element> {
    match block {
        Block::CodeBlock { language, body } if language == "mermaid" => Some(Element::Diagram {
            source: body.trim().to_string(),
        }),
        Block::CodeBlock { language, body } => Some(Element::CodeBlock {
            language,
            source: body,
        }),
        Block::Paragraph { text, image } => {
            if let Some(caps) = MERMAID_LITERAL.captures(&text) {
                return Some(Element::Diagram {
                    source: caps[1].trim().to_string(),
                });
            }
            if let Some((path, alt)) = image {
                return Some(Element::Image { path, alt });
            }
            if let Some(caps) = IMAGE_PATTERN.captures(&text) {
                return Some(Element::Image {
                    path: caps[2].to_string(),
                    alt: caps[1].to_string(),
                });
            }
            Some(Element::Paragraph { text })
        }
        Block::List { ordered, items } => Some(Element::List {
            kind: if ordered {
                ListKind::Ordered
            } else {
                ListKind::Unordered
            },
            items,
        }),
        Block::Table { headers, rows } => Some(Element::Table { headers, rows }),
        Block::Heading { .. } => None,
    }
}
