//! OCR and text extraction module.
//!
//! Extracts text from uploads using:
//! - Tesseract OCR for raster images and rasterized PDF pages
//! - pdftoppm (Poppler) to turn PDF pages into images
//!
//! Engines sit behind the [`OcrEngine`] and [`PdfRasterizer`] traits so the
//! extraction pipeline can run without the real binaries.

mod backend;
mod extractor;
mod poppler;
mod tesseract;

pub use backend::{OcrEngine, OcrError, PdfRasterizer};
pub use extractor::{
    DocumentKind, Extraction, TextExtractor, NO_TEXT_DETECTED, PDF_CONVERSION_FAILED,
};
pub use poppler::PopplerRasterizer;
pub use tesseract::TesseractEngine;
