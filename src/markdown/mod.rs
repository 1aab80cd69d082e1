//! Markdown ingestion: CommonMark parsing and document segmentation.
//!
//! Parsing is delegated to pulldown-cmark (CommonMark plus the table and
//! strikethrough extensions). This module's own work is the part a generic
//! parser cannot do: deciding which heading starts a slide, which heading
//! becomes lead text, and what content belongs to which slide.

mod blocks;
mod segmenter;

pub use segmenter::segment;
