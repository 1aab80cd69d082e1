//! Longan - Markdown to PowerPoint presentation converter
//!
//! This library converts structured Markdown documents into Office Open XML
//! presentations. The first heading becomes the title slide, each
//! second-level heading opens a content slide, and a third-level heading
//! directly under it becomes that slide's lead text. Lists, tables, code
//! blocks, images and Mermaid diagram fences map onto slide content, with
//! an optional template supplying layouts and placeholders.
//!
//! # Example - Converting a file
//!
//! ```no_run
//! use longan::{ConvertOptions, convert_file};
//!
//! # fn main() -> Result<(), longan::Error> {
//! let options = ConvertOptions::new()
//!     .with_template("corporate.pptx")
//!     .with_dpi(150);
//! let output = convert_file("talk.md".as_ref(), &options)?;
//! println!("created {}", output.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Driving the stages directly
//!
//! ```no_run
//! use longan::builder::SlideBuilder;
//! use longan::diagram::{MermaidCli, render_all};
//!
//! # fn main() -> Result<(), longan::Error> {
//! let slides = longan::markdown::segment("# Deck\n\n## One\n\nBody.");
//!
//! let mut renderer = MermaidCli::new()?;
//! let images = render_all(&slides, &mut renderer);
//!
//! let mut builder = SlideBuilder::from_template_path(None)?;
//! builder.build(&slides, &images, "deck.pptx".as_ref())?;
//! # Ok(())
//! # }
//! ```
//!
//! # Pipeline
//!
//! - [`markdown`]: CommonMark parsing and heading-driven segmentation into
//!   [`document::SlideContent`] records.
//! - [`diagram`]: the blocking rasterizer boundary with per-source caching;
//!   ships a Mermaid CLI collaborator.
//! - [`builder`]: the layout engine, binding placeholders when the target
//!   layout has them and flowing freeform shapes when it does not.
//! - [`pptx`]: template reading and Office Open XML package writing.

pub mod builder;
pub mod common;
mod convert;
pub mod diagram;
pub mod document;
pub mod markdown;
pub mod pptx;

// Re-export commonly used types for convenience
pub use common::{Error, Result};
pub use convert::{ConvertOptions, NoopRenderer, convert_file, convert_str};
pub use document::{Element, ElementKind, ListKind, SlideContent};
