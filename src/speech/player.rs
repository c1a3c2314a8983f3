//! Audio playback through a command-line player (`aplay`, `paplay`, `ffplay`, ...).

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::{Child, Command};

use super::backend::{AudioPlayer, Playback, SpeechError};
use crate::tools::{check_binary, tool_name};

/// Player that runs `<command> [args..] <file>` and waits for it to exit.
pub struct CommandPlayer {
    command: PathBuf,
    args: Vec<String>,
}

impl CommandPlayer {
    pub fn new(command: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

impl Default for CommandPlayer {
    fn default() -> Self {
        Self::new("aplay", vec!["-q".to_string()])
    }
}

#[async_trait]
impl AudioPlayer for CommandPlayer {
    fn name(&self) -> &'static str {
        "command"
    }

    fn is_available(&self) -> bool {
        check_binary(&self.command)
    }

    async fn play(&self, path: &Path) -> Result<Box<dyn Playback>, SpeechError> {
        let spawned = Command::new(&self.command)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        match spawned {
            Ok(child) => Ok(Box::new(ChildPlayback {
                child,
                tool: tool_name(&self.command),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(SpeechError::ToolNotFound(
                tool_name(&self.command),
            )),
            Err(e) => Err(SpeechError::Io(e)),
        }
    }
}

/// Playback backed by a running player process.
struct ChildPlayback {
    child: Child,
    tool: String,
}

#[async_trait]
impl Playback for ChildPlayback {
    fn is_busy(&mut self) -> Result<bool, SpeechError> {
        match self.child.try_wait()? {
            None => Ok(true),
            Some(status) if status.success() => Ok(false),
            Some(status) => Err(SpeechError::ToolFailed {
                tool: self.tool.clone(),
                message: format!("exited with {}", status),
            }),
        }
    }

    async fn stop(&mut self) -> Result<(), SpeechError> {
        self.child.kill().await?;
        Ok(())
    }
}
