//! Tesseract OCR engine implementation.
//!
//! Uses Tesseract OCR via command-line for text extraction.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use super::backend::{OcrEngine, OcrError};
use crate::tools::{check_binary, failure_message, tool_name};

/// Tesseract OCR engine.
pub struct TesseractEngine {
    command: PathBuf,
}

impl TesseractEngine {
    /// Create an engine that runs `command` (a bare name or a path).
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        check_binary(&self.command)
    }

    fn availability_hint(&self) -> String {
        if self.is_available() {
            "Tesseract is available".to_string()
        } else {
            format!(
                "{} not found. Install with: apt install tesseract-ocr tesseract-ocr-hin tesseract-ocr-mar",
                self.command.display()
            )
        }
    }

    fn recognize(&self, image_path: &Path, language: &str) -> Result<String, OcrError> {
        let start = Instant::now();
        let output = Command::new(&self.command)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", language])
            .output();

        match output {
            Ok(output) if output.status.success() => {
                tracing::debug!(
                    "tesseract ({}) finished {} in {}ms",
                    language,
                    image_path.display(),
                    start.elapsed().as_millis()
                );
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            }
            Ok(output) => Err(OcrError::ToolFailed {
                tool: tool_name(&self.command),
                message: failure_message(&output),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OcrError::ToolNotFound(
                format!("{} (install tesseract-ocr)", tool_name(&self.command)),
            )),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_reports_not_found() {
        let engine = TesseractEngine::new("readaloud-missing-tesseract");
        assert!(!engine.is_available());
        assert!(engine.availability_hint().contains("not found"));

        let err = engine
            .recognize(Path::new("page.png"), "eng")
            .unwrap_err();
        assert!(matches!(err, OcrError::ToolNotFound(_)));
    }
}
