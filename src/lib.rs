//! readaloud - OCR text extraction service with spoken read-back.
//!
//! Accepts an uploaded PDF or image over HTTP, extracts its text with
//! Tesseract (rasterizing PDFs through Poppler first), returns the text as
//! JSON and reads it aloud in the background.

pub mod cli;
pub mod config;
pub mod language;
pub mod ocr;
pub mod server;
pub mod speech;
pub mod tools;
