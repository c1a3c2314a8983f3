//! Configuration management for readaloud using the prefer crate.
//!
//! A [`Config`] mirrors the optional keys of a config file. It is applied on
//! top of [`Settings::default`], then environment overrides are applied, and
//! the resulting [`Settings`] is handed to the server at startup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::language::{LanguageMap, DEFAULT_ENGINE_LANGUAGE};

/// Default bind address for the HTTP server.
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Default port used when a bind address names only a host.
pub const DEFAULT_PORT: u16 = 5000;

/// Default upload limit in megabytes.
const DEFAULT_MAX_UPLOAD_MB: usize = 50;

/// OCR tool settings.
#[derive(Debug, Clone)]
pub struct OcrSettings {
    /// Tesseract executable (bare name resolved through PATH, or a path).
    pub tesseract_cmd: PathBuf,
    /// Poppler `pdftoppm` executable.
    pub pdftoppm_cmd: PathBuf,
    /// Rasterization resolution for PDF pages.
    pub dpi: u32,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            tesseract_cmd: PathBuf::from("tesseract"),
            pdftoppm_cmd: PathBuf::from("pdftoppm"),
            dpi: 300,
        }
    }
}

/// Speech synthesis and playback settings.
#[derive(Debug, Clone)]
pub struct SpeechSettings {
    /// Whether extracted text is read aloud at all.
    pub enabled: bool,
    /// eSpeak NG executable.
    pub espeak_cmd: PathBuf,
    /// Audio player executable; the WAV path is appended to `player_args`.
    pub player_cmd: PathBuf,
    pub player_args: Vec<String>,
    /// Pending speech jobs beyond this are dropped.
    pub queue_capacity: usize,
    /// How often the worker checks whether playback finished.
    pub poll_interval: Duration,
    /// Playback still running after this long is stopped.
    pub playback_timeout: Duration,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            espeak_cmd: PathBuf::from("espeak-ng"),
            player_cmd: PathBuf::from("aplay"),
            player_args: vec!["-q".to_string()],
            queue_capacity: 8,
            poll_interval: Duration::from_millis(100),
            playback_timeout: Duration::from_secs(300),
        }
    }
}

/// Application settings, fully resolved.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Server bind address (`PORT`, `HOST` or `HOST:PORT`).
    pub bind: String,
    /// Largest accepted request body in bytes.
    pub max_upload_bytes: usize,
    pub ocr: OcrSettings,
    pub languages: LanguageMap,
    pub speech: SpeechSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            ocr: OcrSettings::default(),
            languages: LanguageMap::default(),
            speech: SpeechSettings::default(),
        }
    }
}

/// `[ocr]` section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tesseract_cmd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdftoppm_cmd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,
}

/// `[languages]` section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Engine code used for unknown or missing client codes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Client code to engine code. Replaces the built-in table when present.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub map: HashMap<String, String>,
}

/// `[speech]` section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub espeak_cmd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_cmd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playback_timeout_secs: Option<u64>,
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_upload_mb: Option<usize>,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub languages: LanguageConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to defaults when no readable config file is found.
    pub async fn load() -> Self {
        match prefer::load("readaloud").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config {}: {}", path.display(), e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse config file contents in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, String> {
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e)),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Apply configuration to settings.
    /// `base_dir` is used to resolve relative tool paths.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref bind) = self.bind {
            settings.bind = bind.clone();
        }
        if let Some(mb) = self.max_upload_mb {
            settings.max_upload_bytes = mb * 1024 * 1024;
        }

        if let Some(ref cmd) = self.ocr.tesseract_cmd {
            settings.ocr.tesseract_cmd = resolve_command(cmd, base_dir);
        }
        if let Some(ref cmd) = self.ocr.pdftoppm_cmd {
            settings.ocr.pdftoppm_cmd = resolve_command(cmd, base_dir);
        }
        if let Some(dpi) = self.ocr.dpi {
            settings.ocr.dpi = dpi;
        }

        if self.languages.default.is_some() || !self.languages.map.is_empty() {
            let default = self
                .languages
                .default
                .clone()
                .unwrap_or_else(|| DEFAULT_ENGINE_LANGUAGE.to_string());
            settings.languages = if self.languages.map.is_empty() {
                LanguageMap::default().with_default(&default)
            } else {
                LanguageMap::new(self.languages.map.clone(), &default)
            };
        }

        let speech = &self.speech;
        if let Some(enabled) = speech.enabled {
            settings.speech.enabled = enabled;
        }
        if let Some(ref cmd) = speech.espeak_cmd {
            settings.speech.espeak_cmd = resolve_command(cmd, base_dir);
        }
        if let Some(ref cmd) = speech.player_cmd {
            settings.speech.player_cmd = resolve_command(cmd, base_dir);
        }
        if let Some(ref args) = speech.player_args {
            settings.speech.player_args = args.clone();
        }
        if let Some(capacity) = speech.queue_capacity {
            settings.speech.queue_capacity = capacity.max(1);
        }
        if let Some(ms) = speech.poll_interval_ms {
            settings.speech.poll_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(secs) = speech.playback_timeout_secs {
            settings.speech.playback_timeout = Duration::from_secs(secs);
        }
    }
}

/// Resolve a tool command from config.
/// - Bare names (`tesseract`) are left for PATH lookup
/// - Paths starting with ~ are expanded
/// - Relative paths are resolved against `base_dir`
fn resolve_command(cmd: &str, base_dir: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(cmd);
    let path = Path::new(expanded.as_ref());

    if path.is_absolute() || path.components().count() <= 1 {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Apply environment variable overrides, which take precedence over config.
/// `lookup` returns the value of a variable, if set.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|s| !s.is_empty());

    if let Some(bind) = var("READALOUD_BIND") {
        tracing::debug!("Using READALOUD_BIND from environment: {}", bind);
        settings.bind = bind;
    }
    if let Some(cmd) = var("TESSERACT_CMD") {
        settings.ocr.tesseract_cmd = PathBuf::from(shellexpand::tilde(&cmd).as_ref());
    }
    if let Some(cmd) = var("PDFTOPPM_CMD") {
        settings.ocr.pdftoppm_cmd = PathBuf::from(shellexpand::tilde(&cmd).as_ref());
    }
    if let Some(cmd) = var("ESPEAK_CMD") {
        settings.speech.espeak_cmd = PathBuf::from(shellexpand::tilde(&cmd).as_ref());
    }
    if let Some(cmd) = var("READALOUD_PLAYER") {
        settings.speech.player_cmd = PathBuf::from(shellexpand::tilde(&cmd).as_ref());
    }
    if let Some(flag) = var("READALOUD_SPEECH") {
        settings.speech.enabled = !(flag == "0" || flag.eq_ignore_ascii_case("false"));
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
}

/// Load settings from config file, defaults and environment.
pub async fn load_settings_with_options(options: LoadOptions) -> Settings {
    let config = match options.config_path {
        Some(ref path) => match Config::load_from_path(path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config {}: {}", path.display(), e);
                Config::default()
            }
        },
        None => Config::load().await,
    };

    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    settings
}
