//! Typed value objects for parsed Markdown constructs.
//!
//! Each variant carries exactly the payload its kind allows, so an image
//! with table attributes or a paragraph with children cannot be
//! constructed. Heading nodes never appear here: the segmenter consumes
//! them while partitioning the document into slides.

/// Discriminant for [`Element`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Paragraph,
    ListUnordered,
    ListOrdered,
    Image,
    CodeBlock,
    Table,
    Diagram,
}

/// Whether a list numbers its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Unordered,
    Ordered,
}

/// One parsed Markdown construct owned by a slide.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// A plain paragraph of flattened text.
    Paragraph { text: String },

    /// A bullet or numbered list. Items hold the flattened text of each
    /// direct list item; nested sub-lists are flattened into their parent
    /// item's text rather than preserved structurally.
    List { kind: ListKind, items: Vec<String> },

    /// An inline image reference. The path is used as a filesystem path,
    /// resolved against the process working directory.
    Image { path: String, alt: String },

    /// A fenced or indented code block. `language` is the fence info
    /// string, empty when absent.
    CodeBlock { language: String, source: String },

    /// A pipe table. Every row has exactly `headers.len()` cells.
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },

    /// A Mermaid diagram description, passed verbatim to the rasterizer.
    Diagram { source: String },
}

impl Element {
    /// Get the discriminant for this element.
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Paragraph { .. } => ElementKind::Paragraph,
            Element::List {
                kind: ListKind::Unordered,
                ..
            } => ElementKind::ListUnordered,
            Element::List {
                kind: ListKind::Ordered,
                ..
            } => ElementKind::ListOrdered,
            Element::Image { .. } => ElementKind::Image,
            Element::CodeBlock { .. } => ElementKind::CodeBlock,
            Element::Table { .. } => ElementKind::Table,
            Element::Diagram { .. } => ElementKind::Diagram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_dispatch() {
        let para = Element::Paragraph {
            text: "hello".into(),
        };
        assert_eq!(para.kind(), ElementKind::Paragraph);

        let list = Element::List {
            kind: ListKind::Ordered,
            items: vec!["one".into()],
        };
        assert_eq!(list.kind(), ElementKind::ListOrdered);

        let diagram = Element::Diagram {
            source: "graph TD".into(),
        };
        assert_eq!(diagram.kind(), ElementKind::Diagram);
    }
}
