//! PDF rasterization with Poppler's `pdftoppm`.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::backend::{OcrError, PdfRasterizer};
use crate::tools::{check_binary, failure_message, tool_name};

/// Prefix for generated page images (`page-1.png`, `page-01.png`, ...).
const PAGE_PREFIX: &str = "page";

/// Rasterizer that shells out to `pdftoppm`.
pub struct PopplerRasterizer {
    command: PathBuf,
    dpi: u32,
}

impl PopplerRasterizer {
    pub fn new(command: impl Into<PathBuf>, dpi: u32) -> Self {
        Self {
            command: command.into(),
            dpi,
        }
    }
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm", 300)
    }
}

impl PdfRasterizer for PopplerRasterizer {
    fn name(&self) -> &'static str {
        "pdftoppm"
    }

    fn is_available(&self) -> bool {
        check_binary(&self.command)
    }

    fn availability_hint(&self) -> String {
        if self.is_available() {
            "pdftoppm is available".to_string()
        } else {
            format!(
                "{} not found. Install with: apt install poppler-utils",
                self.command.display()
            )
        }
    }

    fn rasterize(&self, pdf_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
        let dpi = self.dpi.to_string();
        let output = Command::new(&self.command)
            .args(["-png", "-r", &dpi])
            .arg(pdf_path)
            .arg(output_dir.join(PAGE_PREFIX))
            .output();

        match output {
            Ok(output) if output.status.success() => {}
            Ok(output) => {
                return Err(OcrError::ToolFailed {
                    tool: tool_name(&self.command),
                    message: failure_message(&output),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OcrError::ToolNotFound(format!(
                    "{} (install poppler-utils)",
                    tool_name(&self.command)
                )))
            }
            Err(e) => return Err(OcrError::Io(e)),
        }

        collect_page_images(output_dir)
    }
}

/// Find generated page images in document order.
fn collect_page_images(dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
    let mut images: Vec<(u32, PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
        .filter_map(|p| page_number(&p).map(|n| (n, p)))
        .collect();

    images.sort();
    Ok(images.into_iter().map(|(_, path)| path).collect())
}

/// Page number from a pdftoppm file name such as `page-07.png`.
fn page_number(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    let (prefix, number) = stem.rsplit_once('-')?;
    if prefix != PAGE_PREFIX {
        return None;
    }
    number.parse().ok()
}
