//! Presentation file writing.
//!
//! This module supplies the presentation capability the rest of the
//! pipeline treats as opaque: open a template, add a slide from a layout
//! index, drop placeholder-bound text or freeform shapes onto it, and
//! persist an Office Open XML package. Placeholder semantics follow the
//! standard model: ordinal 1 is the body (or subtitle on the title
//! layout), and template regions may also be addressed by shape name.

mod defaults;
mod package;
mod presentation;
mod shape;
mod slide;
mod template;

pub use presentation::Presentation;
pub use shape::{ImageFormat, Rect, Shape, TextFrame, TextParagraph};
pub use slide::Slide;
pub use template::{LayoutInfo, LayoutShape, Placeholder, Template};
