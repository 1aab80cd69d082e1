//! Diagram rasterization boundary.
//!
//! The core pipeline treats rendering as a blocking call that either
//! returns a path to a rasterized image or fails with a reportable error.
//! Failures degrade to a skipped visual; they never abort the run. The
//! bundled collaborator drives the Mermaid CLI, but anything implementing
//! [`DiagramRenderer`] can be injected, which is also how the tests count
//! invocations.

mod mermaid;

pub use mermaid::MermaidCli;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::warn;

use crate::common::Result;
use crate::document::{Element, SlideContent};

/// A collaborator that turns diagram-description text into an image file.
///
/// Implementations must be idempotent per distinct source text within a
/// run; callers additionally cache results so a renderer is invoked at most
/// once per distinct source.
pub trait DiagramRenderer {
    /// Render diagram source to an image, returning the image file path.
    fn render(&mut self, source: &str) -> Result<PathBuf>;
}

/// Rendered-image lookup keyed by exact diagram source text.
///
/// Two identical diagram blocks collapse to one render.
#[derive(Debug, Default)]
pub struct ImageCache {
    images: HashMap<String, PathBuf>,
}

impl ImageCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the rendered image for a diagram source.
    pub fn get(&self, source: &str) -> Option<&Path> {
        self.images.get(source).map(PathBuf::as_path)
    }

    /// Register a rendered image for a diagram source.
    pub fn insert(&mut self, source: impl Into<String>, path: PathBuf) {
        self.images.insert(source.into(), path);
    }

    /// Number of distinct rendered diagrams.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the cache holds no images.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Render every diagram element across `slides`, filling a cache.
///
/// The renderer is invoked at most once per distinct source string; a
/// failed render is logged and leaves that diagram out of the cache, which
/// the layout engine later treats as a silent skip.
pub fn render_all(slides: &[SlideContent], renderer: &mut dyn DiagramRenderer) -> ImageCache {
    let mut cache = ImageCache::new();
    let mut attempted: std::collections::HashSet<&str> = std::collections::HashSet::new();

    for slide in slides {
        for element in &slide.elements {
            let Element::Diagram { source } = element else {
                continue;
            };
            if !attempted.insert(source.as_str()) {
                continue;
            }
            match renderer.render(source) {
                Ok(path) => cache.insert(source.clone(), path),
                Err(err) => {
                    warn!("diagram on slide {} failed to render: {err}", slide.index);
                }
            }
        }
    }

    cache
}
