//! eSpeak NG speech synthesizer.
//!
//! Text is passed on stdin so long OCR results don't hit argument limits and
//! text starting with `-` isn't read as an option.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::backend::{SpeechError, SpeechSynthesizer};
use crate::tools::{check_binary, failure_message, tool_name};

/// Synthesizer that runs `espeak-ng -v <lang> -w <wav> --stdin`.
pub struct EspeakSynthesizer {
    command: PathBuf,
}

impl EspeakSynthesizer {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for EspeakSynthesizer {
    fn default() -> Self {
        Self::new("espeak-ng")
    }
}

#[async_trait]
impl SpeechSynthesizer for EspeakSynthesizer {
    fn name(&self) -> &'static str {
        "espeak-ng"
    }

    fn is_available(&self) -> bool {
        check_binary(&self.command)
    }

    async fn synthesize(
        &self,
        text: &str,
        language: &str,
        output: &Path,
    ) -> Result<(), SpeechError> {
        let spawned = Command::new(&self.command)
            .args(["-v", language, "-w"])
            .arg(output)
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SpeechError::ToolNotFound(format!(
                    "{} (install espeak-ng)",
                    tool_name(&self.command)
                )))
            }
            Err(e) => return Err(SpeechError::Io(e)),
        };

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(SpeechError::ToolFailed {
                tool: tool_name(&self.command),
                message: failure_message(&output),
            })
        }
    }
}
