//! Unified error types for the Longan library.
//!
//! This module provides a single error type covering the whole conversion
//! pipeline, presenting a consistent API to users. Element- and slide-level
//! failures (a missing image file, a placeholder absent from a template, one
//! diagram that fails to render) are deliberately *not* represented here:
//! they are logged and skipped at the point of use and never abort a run.
use thiserror::Error;

/// Main error type for Longan operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Markdown parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Diagram rasterization failure
    #[error("Diagram rendering failed: {0}")]
    Rasterization(String),

    /// Template could not be opened or understood
    #[error("Template error: {0}")]
    Template(String),

    /// XML parsing or generation error
    #[error("XML error: {0}")]
    Xml(String),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(String),

    /// Image decoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type for Longan operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Zip(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Error::Xml(err.to_string())
    }
}
