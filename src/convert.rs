//! One-call conversion pipeline.
//!
//! Wires the stages together: segment the Markdown, rasterize diagram
//! blocks through a caching pass, place every slide, persist the package.
//! Only run-boundary I/O is fatal; per-element failures degrade inside
//! their stage.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::builder::SlideBuilder;
use crate::common::Result;
use crate::diagram::{DiagramRenderer, MermaidCli, render_all};
use crate::markdown::segment;

/// Options for one conversion run.
///
/// # Examples
///
/// ```rust
/// use longan::ConvertOptions;
///
/// let options = ConvertOptions::new()
///     .with_template("corporate.pptx")
///     .with_dpi(300);
/// ```
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Optional template presentation supplying layouts.
    pub template_path: Option<PathBuf>,
    /// Explicit output path; defaults to the input with a `.pptx` extension.
    pub output_path: Option<PathBuf>,
    /// DPI forwarded opaquely to the diagram rasterizer.
    pub dpi: u32,
    /// Override for the Mermaid CLI executable.
    pub mermaid_command: Option<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            template_path: None,
            output_path: None,
            dpi: 150,
            mermaid_command: None,
        }
    }
}

impl ConvertOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the template presentation path.
    pub fn with_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    /// Set the output path.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Set the diagram DPI (default 150).
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Override the Mermaid CLI executable.
    pub fn with_mermaid_command(mut self, command: impl Into<String>) -> Self {
        self.mermaid_command = Some(command.into());
        self
    }
}

/// Convert Markdown text into a presentation at `output_path`.
///
/// The renderer is injected so front-ends can share one instance per job
/// and tests can instrument the collaborator boundary.
pub fn convert_str(
    markdown: &str,
    output_path: &Path,
    options: &ConvertOptions,
    renderer: &mut dyn DiagramRenderer,
) -> Result<()> {
    let slides = segment(markdown);
    info!("parsed {} slide(s)", slides.len());

    let images = render_all(&slides, renderer);
    if !images.is_empty() {
        info!("rasterized {} diagram(s)", images.len());
    }

    let mut builder = SlideBuilder::from_template_path(options.template_path.as_deref())?;
    builder.build(&slides, &images, output_path)
}

/// Convert a Markdown file, returning the output path.
///
/// The whole file is read into memory up front; the default output path
/// swaps the input extension for `.pptx`.
pub fn convert_file(markdown_path: &Path, options: &ConvertOptions) -> Result<PathBuf> {
    let output_path = options
        .output_path
        .clone()
        .unwrap_or_else(|| markdown_path.with_extension("pptx"));

    info!(
        "converting {} to {}",
        markdown_path.display(),
        output_path.display()
    );

    let markdown = fs::read_to_string(markdown_path)?;

    let mut renderer = build_mermaid_renderer(options)?;
    convert_str(&markdown, &output_path, options, renderer.as_mut())?;

    Ok(output_path)
}

fn build_mermaid_renderer(options: &ConvertOptions) -> Result<Box<dyn DiagramRenderer>> {
    let mut renderer = MermaidCli::new()?.with_dpi(options.dpi);
    if let Some(command) = &options.mermaid_command {
        renderer = renderer.with_command(command.clone());
    }
    Ok(Box::new(renderer))
}

/// A renderer that refuses every diagram, for callers that want diagram
/// rasterization disabled entirely.
#[derive(Debug, Default)]
pub struct NoopRenderer;

impl DiagramRenderer for NoopRenderer {
    fn render(&mut self, _source: &str) -> Result<PathBuf> {
        warn!("diagram rendering disabled; skipping diagram");
        Err(crate::common::Error::Rasterization(
            "diagram rendering disabled".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = ConvertOptions::new()
            .with_template("template.pptx")
            .with_output("out.pptx")
            .with_dpi(300)
            .with_mermaid_command("npx");

        assert_eq!(options.template_path.as_deref(), Some(Path::new("template.pptx")));
        assert_eq!(options.output_path.as_deref(), Some(Path::new("out.pptx")));
        assert_eq!(options.dpi, 300);
        assert_eq!(options.mermaid_command.as_deref(), Some("npx"));
    }

    #[test]
    fn test_default_output_path_swaps_extension() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("deck.md");
        fs::write(&input, "# Deck\n\n## One\n\nBody.\n").unwrap();

        let options = ConvertOptions::new();
        let output = convert_file(&input, &options).unwrap();

        assert_eq!(output, dir.path().join("deck.pptx"));
        assert!(output.exists());
    }

    #[test]
    fn test_convert_str_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("deck.pptx");

        let markdown = "# T\n\nSubtitle text.\n\n## S\n\n- a\n- b\n\n```mermaid\ngraph TD\n A-->B\n```\n";
        convert_str(markdown, &output, &ConvertOptions::new(), &mut NoopRenderer).unwrap();

        let bytes = fs::read(&output).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        // Title slide + one content slide, with the failed diagram skipped.
        assert!(archive.by_name("ppt/slides/slide1.xml").is_ok());
        assert!(archive.by_name("ppt/slides/slide2.xml").is_ok());
        assert!(archive.by_name("ppt/slides/slide3.xml").is_err());
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let options = ConvertOptions::new();
        let err = convert_file(Path::new("no-such-input.md"), &options).unwrap_err();
        assert!(matches!(err, crate::common::Error::Io(_)));
    }
}
