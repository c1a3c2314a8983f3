//! Text extraction from uploaded images and PDFs.
//!
//! Extraction is fail-soft: every outcome, including decode and tool
//! failures, is an [`Extraction`] value. It only becomes a plain string at the
//! HTTP boundary via [`Extraction::into_text`].

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat};
use tempfile::TempDir;

use super::backend::{OcrEngine, OcrError, PdfRasterizer};
use super::poppler::PopplerRasterizer;
use super::tesseract::TesseractEngine;
use crate::config::OcrSettings;

/// Text returned when OCR finds nothing.
pub const NO_TEXT_DETECTED: &str = "No text detected.";

/// Text returned when a PDF rasterizes to zero pages.
pub const PDF_CONVERSION_FAILED: &str = "PDF conversion failed.";

/// Kind of uploaded document, chosen by file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Image,
    Pdf,
}

impl DocumentKind {
    /// `.pdf` (any case) is a PDF; everything else is treated as an image.
    pub fn from_filename(filename: &str) -> Self {
        if filename.to_lowercase().ends_with(".pdf") {
            DocumentKind::Pdf
        } else {
            DocumentKind::Image
        }
    }

    fn error_label(&self) -> &'static str {
        match self {
            DocumentKind::Image => "image",
            DocumentKind::Pdf => "PDF",
        }
    }
}

/// Outcome of extracting text from one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Non-empty page texts joined with newlines.
    Text(String),
    /// OCR ran but every page was blank.
    Empty,
    /// The PDF produced no page images.
    PdfConversionFailed,
    /// Decoding, rasterization or OCR failed.
    Failed { kind: DocumentKind, reason: String },
}

impl Extraction {
    /// Build a result from per-page OCR output, dropping blank pages.
    pub fn from_pages<I>(pages: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let texts: Vec<String> = pages
            .into_iter()
            .map(|page| page.as_ref().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect();

        if texts.is_empty() {
            Extraction::Empty
        } else {
            Extraction::Text(texts.join("\n"))
        }
    }

    fn failed(kind: DocumentKind, error: OcrError) -> Self {
        Extraction::Failed {
            kind,
            reason: error.to_string(),
        }
    }

    /// Whether this result describes a failure rather than recognized text.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Extraction::PdfConversionFailed | Extraction::Failed { .. }
        )
    }

    /// Flatten to the text returned to clients.
    pub fn into_text(self) -> String {
        match self {
            Extraction::Text(text) => text,
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Extraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extraction::Text(text) => f.write_str(text),
            Extraction::Empty => f.write_str(NO_TEXT_DETECTED),
            Extraction::PdfConversionFailed => f.write_str(PDF_CONVERSION_FAILED),
            Extraction::Failed { kind, reason } => {
                write!(f, "Error processing {}: {}", kind.error_label(), reason)
            }
        }
    }
}

/// Runs OCR over uploaded documents.
#[derive(Clone)]
pub struct TextExtractor {
    engine: Arc<dyn OcrEngine>,
    rasterizer: Arc<dyn PdfRasterizer>,
}

impl TextExtractor {
    /// Create an extractor from an OCR engine and a PDF rasterizer.
    pub fn new(engine: Arc<dyn OcrEngine>, rasterizer: Arc<dyn PdfRasterizer>) -> Self {
        Self { engine, rasterizer }
    }

    /// Tesseract and pdftoppm, as configured.
    pub fn from_settings(settings: &OcrSettings) -> Self {
        Self::new(
            Arc::new(TesseractEngine::new(&settings.tesseract_cmd)),
            Arc::new(PopplerRasterizer::new(&settings.pdftoppm_cmd, settings.dpi)),
        )
    }

    pub fn engine(&self) -> &dyn OcrEngine {
        self.engine.as_ref()
    }

    pub fn rasterizer(&self) -> &dyn PdfRasterizer {
        self.rasterizer.as_ref()
    }

    /// Extract text from a document of the given kind.
    pub fn extract(&self, kind: DocumentKind, bytes: &[u8], language: &str) -> Extraction {
        match kind {
            DocumentKind::Pdf => self.extract_pdf(bytes, language),
            DocumentKind::Image => self.extract_image(bytes, language),
        }
    }

    /// Extract text from an encoded raster image (PNG, JPEG, TIFF, ...).
    pub fn extract_image(&self, bytes: &[u8], language: &str) -> Extraction {
        match self.ocr_image_bytes(bytes, language) {
            Ok(text) => Extraction::from_pages([text]),
            Err(e) => {
                tracing::warn!("Image OCR failed: {}", e);
                Extraction::failed(DocumentKind::Image, e)
            }
        }
    }

    /// Extract text from a PDF by rasterizing and OCRing each page in order.
    pub fn extract_pdf(&self, bytes: &[u8], language: &str) -> Extraction {
        match self.ocr_pdf_bytes(bytes, language) {
            Ok(Some(pages)) => Extraction::from_pages(pages),
            Ok(None) => {
                tracing::warn!("{} produced no page images", self.rasterizer.name());
                Extraction::PdfConversionFailed
            }
            Err(e) => {
                tracing::warn!("PDF OCR failed: {}", e);
                Extraction::failed(DocumentKind::Pdf, e)
            }
        }
    }

    fn ocr_image_bytes(&self, bytes: &[u8], language: &str) -> Result<String, OcrError> {
        let image = image::load_from_memory(bytes).map_err(|e| OcrError::Image(e.to_string()))?;

        // PNG can't hold float samples
        let image = match image {
            DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                DynamicImage::ImageRgba8(image.to_rgba8())
            }
            other => other,
        };

        let temp_dir = TempDir::new()?;
        let image_path = temp_dir.path().join("upload.png");
        image
            .save_with_format(&image_path, ImageFormat::Png)
            .map_err(|e| OcrError::Image(e.to_string()))?;

        self.engine.recognize(&image_path, language)
    }

    /// Returns `None` when the rasterizer produced no pages.
    fn ocr_pdf_bytes(&self, bytes: &[u8], language: &str) -> Result<Option<Vec<String>>, OcrError> {
        let temp_dir = TempDir::new()?;
        let pdf_path = temp_dir.path().join("upload.pdf");
        std::fs::write(&pdf_path, bytes)?;

        let pages_dir = temp_dir.path().join("pages");
        std::fs::create_dir(&pages_dir)?;

        let pages = self.rasterizer.rasterize(&pdf_path, &pages_dir)?;
        if pages.is_empty() {
            return Ok(None);
        }

        let mut texts = Vec::with_capacity(pages.len());
        for (i, page) in pages.iter().enumerate() {
            tracing::debug!("OCR page {}/{} ({})", i + 1, pages.len(), language);
            texts.push(self.engine.recognize(page, language)?);
        }
        Ok(Some(texts))
    }

    /// Extract text from a file on disk, choosing the kind by its name.
    pub fn extract_file(&self, path: &Path, language: &str) -> std::io::Result<Extraction> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self.extract(DocumentKind::from_filename(&name), &bytes, language))
    }
}
