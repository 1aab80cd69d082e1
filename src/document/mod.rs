//! The slide document model.
//!
//! A parsed Markdown document becomes an ordered sequence of
//! [`SlideContent`] records (zero or one title slide followed by content
//! slides), each owning its [`Element`]s. The model is write-once: the
//! segmenter builds it, everything downstream reads it.

mod element;
mod slide;

pub use element::{Element, ElementKind, ListKind};
pub use slide::SlideContent;
