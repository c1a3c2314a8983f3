//! Client language codes and their OCR/speech engine equivalents.

use std::collections::HashMap;

/// Tesseract code used when a client code is unknown or missing.
pub const DEFAULT_ENGINE_LANGUAGE: &str = "eng";

/// Client code assumed when a request names no language.
pub const DEFAULT_CLIENT_LANGUAGE: &str = "en";

/// Built-in client code to Tesseract code table.
const BUILTIN_LANGUAGES: &[(&str, &str)] = &[("en", "eng"), ("hi", "hin"), ("mr", "mar")];

/// Maps short client language codes onto OCR engine identifiers.
///
/// Resolution never fails: anything not in the table becomes the default
/// engine code, so extraction always receives a usable language.
#[derive(Debug, Clone)]
pub struct LanguageMap {
    table: HashMap<String, String>,
    default: String,
}

impl Default for LanguageMap {
    fn default() -> Self {
        let table = BUILTIN_LANGUAGES
            .iter()
            .map(|(client, engine)| (client.to_string(), engine.to_string()))
            .collect();
        Self::new(table, DEFAULT_ENGINE_LANGUAGE)
    }
}

impl LanguageMap {
    /// Create a map from a client-to-engine table and a default engine code.
    /// An empty default falls back to [`DEFAULT_ENGINE_LANGUAGE`].
    pub fn new(table: HashMap<String, String>, default: &str) -> Self {
        let default = if default.trim().is_empty() {
            DEFAULT_ENGINE_LANGUAGE.to_string()
        } else {
            default.trim().to_string()
        };
        let table = table
            .into_iter()
            .filter(|(_, engine)| !engine.trim().is_empty())
            .collect();
        Self { table, default }
    }

    /// Replace the default engine code, keeping the table.
    pub fn with_default(self, default: &str) -> Self {
        Self::new(self.table, default)
    }

    /// The engine code used for unrecognized input.
    pub fn default_code(&self) -> &str {
        &self.default
    }

    /// Resolve a client code (e.g. `hi`) to its engine code (e.g. `hin`).
    pub fn resolve(&self, code: Option<&str>) -> &str {
        code.and_then(|c| self.table.get(c))
            .map(String::as_str)
            .unwrap_or(self.default.as_str())
    }

    /// Normalize a code into the speech engine's code space.
    ///
    /// Tesseract and eSpeak disagree on language codes (`eng` vs `en`), so an
    /// engine code is mapped back to its client code. Codes that are not
    /// engine codes pass through unchanged.
    pub fn speech_code(&self, code: &str) -> String {
        if code == DEFAULT_ENGINE_LANGUAGE {
            return DEFAULT_CLIENT_LANGUAGE.to_string();
        }
        if self.table.contains_key(code) {
            return code.to_string();
        }
        // Smallest key keeps the result stable when several clients share an engine code
        self.table
            .iter()
            .filter(|(_, engine)| engine.as_str() == code)
            .map(|(client, _)| client)
            .min()
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }

    /// Client codes with a table entry, sorted.
    pub fn client_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.table.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_codes() {
        let map = LanguageMap::default();
        assert_eq!(map.resolve(Some("en")), "eng");
        assert_eq!(map.resolve(Some("hi")), "hin");
        assert_eq!(map.resolve(Some("mr")), "mar");
        assert_eq!(map.client_codes(), vec!["en", "hi", "mr"]);
    }

    #[test]
    fn test_unrecognized_codes_fall_back() {
        let map = LanguageMap::default();
        for code in ["fr", "", "EN", "eng", " en"] {
            assert_eq!(map.resolve(Some(code)), "eng", "code {:?}", code);
        }
        assert_eq!(map.resolve(None), "eng");
    }

    #[test]
    fn test_empty_default_is_replaced() {
        let map = LanguageMap::new(HashMap::new(), "  ");
        assert_eq!(map.default_code(), "eng");
        assert_eq!(map.resolve(Some("en")), "eng");
    }

    #[test]
    fn test_speech_code() {
        let map = LanguageMap::default();
        assert_eq!(map.speech_code("eng"), "en");
        assert_eq!(map.speech_code("hin"), "hi");
        assert_eq!(map.speech_code("mar"), "mr");
        assert_eq!(map.speech_code("en"), "en");
        assert_eq!(map.speech_code("deu"), "deu");
    }
}
