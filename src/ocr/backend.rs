//! OCR engine and PDF rasterizer abstractions.
//!
//! Both are synchronous and are expected to run on a blocking thread.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from OCR engines and rasterizers.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("{0} not found")]
    ToolNotFound(String),

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("Image error: {0}")]
    Image(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text recognition over a single raster image.
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &'static str;

    /// Check if this engine can run (binary installed).
    fn is_available(&self) -> bool;

    /// Describe what's needed to make this engine available.
    fn availability_hint(&self) -> String;

    /// Recognize the text in an image file using an engine language code.
    fn recognize(&self, image_path: &Path, language: &str) -> Result<String, OcrError>;
}

/// Conversion of a PDF document into page images.
pub trait PdfRasterizer: Send + Sync {
    /// Short rasterizer name for logs.
    fn name(&self) -> &'static str;

    /// Check if this rasterizer can run (binary installed).
    fn is_available(&self) -> bool;

    /// Describe what's needed to make this rasterizer available.
    fn availability_hint(&self) -> String;

    /// Render every page of `pdf_path` into `output_dir`.
    /// Returns the page images in document order; may be empty.
    fn rasterize(&self, pdf_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, OcrError>;
}
