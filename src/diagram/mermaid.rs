//! Mermaid CLI collaborator.
//!
//! Drives the `mmdc` executable (which hosts its own headless renderer) as
//! a plain blocking subprocess. Rendered images live in a scratch directory
//! owned by the renderer, so cached paths stay valid for the whole run.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use log::{debug, info};
use tempfile::TempDir;

use super::DiagramRenderer;
use crate::common::{Error, Result};

const DEFAULT_COMMAND: &str = "mmdc";
const DEFAULT_DPI: u32 = 150;
/// Mermaid's scale factor is relative to its 96 DPI baseline.
const BASELINE_DPI: f64 = 96.0;

/// Renders Mermaid diagrams to PNG via the Mermaid CLI.
///
/// # Examples
///
/// ```rust,no_run
/// use longan::diagram::{DiagramRenderer, MermaidCli};
///
/// let mut renderer = MermaidCli::new()?.with_dpi(150);
/// let image = renderer.render("graph TD\n A-->B")?;
/// println!("rendered to {}", image.display());
/// # Ok::<(), longan::Error>(())
/// ```
pub struct MermaidCli {
    command: String,
    dpi: u32,
    scratch: TempDir,
    counter: usize,
}

impl MermaidCli {
    /// Create a renderer with a fresh scratch directory.
    pub fn new() -> Result<Self> {
        let scratch = TempDir::new()?;
        debug!("mermaid scratch directory: {}", scratch.path().display());
        Ok(Self {
            command: DEFAULT_COMMAND.to_string(),
            dpi: DEFAULT_DPI,
            scratch,
            counter: 0,
        })
    }

    /// Set the output DPI (default 150).
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Override the Mermaid CLI executable name or path.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }
}

impl DiagramRenderer for MermaidCli {
    fn render(&mut self, source: &str) -> Result<PathBuf> {
        self.counter += 1;
        let input = self.scratch.path().join(format!("diagram-{}.mmd", self.counter));
        let output = self.scratch.path().join(format!("diagram-{}.png", self.counter));
        fs::write(&input, source)?;

        let scale = (f64::from(self.dpi) / BASELINE_DPI).max(1.0);
        let result = Command::new(&self.command)
            .arg("--input")
            .arg(&input)
            .arg("--output")
            .arg(&output)
            .arg("--scale")
            .arg(format!("{scale:.2}"))
            .arg("--backgroundColor")
            .arg("white")
            .output()
            .map_err(|err| {
                Error::Rasterization(format!("failed to launch '{}': {err}", self.command))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::Rasterization(format!(
                "'{}' exited with {}: {}",
                self.command,
                result.status,
                stderr.trim()
            )));
        }
        if !output.exists() {
            return Err(Error::Rasterization(format!(
                "'{}' reported success but produced no image",
                self.command
            )));
        }

        info!("rendered diagram to {}", output.display());
        Ok(output)
    }
}
