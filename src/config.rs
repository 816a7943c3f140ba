//! Configuration
//!
//! Settings come from, in increasing priority: built-in defaults, a TOML
//! file, environment variables and finally command-line flags (applied by the
//! binary). The file is looked up at `--config`, then `page-quiz.toml` in the
//! working directory, then `~/.config/page-quiz/config.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extract::DEFAULT_MAX_CHARS;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODELS: [&str; 3] = ["gemini-2.0-flash", "gemini-1.5-flash", "gemini-1.0-pro"];
const LOCAL_CONFIG: &str = "page-quiz.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Candidate models, most preferred first.
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_question_count")]
    pub question_count: usize,
    #[serde(default)]
    pub generation: GenerationSettings,
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            models: default_models(),
            max_chars: default_max_chars(),
            request_timeout_secs: default_request_timeout_secs(),
            question_count: default_question_count(),
            generation: GenerationSettings::default(),
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_models() -> Vec<String> {
    DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
}
fn default_max_chars() -> usize {
    DEFAULT_MAX_CHARS
}
fn default_request_timeout_secs() -> u64 {
    60
}
fn default_question_count() -> usize {
    5
}
fn default_temperature() -> f32 {
    0.2
}
fn default_top_k() -> u32 {
    40
}
fn default_top_p() -> f32 {
    0.95
}
fn default_max_output_tokens() -> u32 {
    2048
}

impl Config {
    /// Load from `path`, or from the default locations when `path` is `None`,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_paths().into_iter().find(|p| p.is_file()) {
                Some(p) => Self::from_file(&p)?,
                None => {
                    debug!("no config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Apply `GEMINI_API_KEY`, `PAGE_QUIZ_BASE_URL`, `PAGE_QUIZ_MODELS`
    /// (comma separated) and `PAGE_QUIZ_MAX_CHARS`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup("PAGE_QUIZ_BASE_URL") {
            self.base_url = url;
        }
        if let Some(models) = lookup("PAGE_QUIZ_MODELS") {
            let models = parse_model_list(&models);
            if !models.is_empty() {
                self.models = models;
            }
        }
        if let Some(max_chars) = lookup("PAGE_QUIZ_MAX_CHARS") {
            if let Ok(n) = max_chars.trim().parse::<usize>() {
                self.max_chars = n;
            }
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

pub fn parse_model_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect()
}

fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config/page-quiz/config.toml"));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.models, vec!["gemini-2.0-flash", "gemini-1.5-flash", "gemini-1.0-pro"]);
        assert_eq!(config.max_chars, 10_000);
        assert_eq!(config.generation.top_k, 40);
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "models = [\"gemini-1.5-flash\"]\n\n[generation]\ntemperature = 0.5").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.models, vec!["gemini-1.5-flash"]);
        assert_eq!(config.generation.temperature, 0.5);
        assert_eq!(config.generation.max_output_tokens, 2048);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_bad_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "models = 3").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(format!("{err}").contains("Failed to parse config"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", "secret"),
            ("PAGE_QUIZ_MODELS", " a , ,b "),
            ("PAGE_QUIZ_MAX_CHARS", "oops"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.api_key(), Some("secret"));
        assert_eq!(config.models, vec!["a", "b"]);
        assert_eq!(config.max_chars, 10_000);
    }
}
