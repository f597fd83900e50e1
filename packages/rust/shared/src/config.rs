//! Application configuration for edugen.
//!
//! User config lives at `~/.edugen/edugen.toml`. Every field has a default,
//! so the file is optional. API keys are never stored in the file: each
//! service section names the environment variable that holds its key.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EdugenError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "edugen.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".edugen";

// ---------------------------------------------------------------------------
// Config structs (matching edugen.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Draft generation model settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Structured simplification model settings.
    #[serde(default)]
    pub simplification: SimplificationConfig,

    /// Web search settings.
    #[serde(default)]
    pub search: SearchConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory persisted runs are written to (and analyzed from).
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "output_json".into()
}

/// `[generation]` section: OpenAI-compatible chat completions (Groq).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,

    #[serde(default = "default_generation_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_generation_max_tokens")]
    pub max_tokens: u32,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_generation_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Extra attempts after a transient failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_generation_base_url(),
            model: default_generation_model(),
            temperature: default_temperature(),
            max_tokens: default_generation_max_tokens(),
            api_key_env: default_generation_key_env(),
            timeout_secs: default_llm_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_generation_base_url() -> String {
    "https://api.groq.com/openai/v1".into()
}
fn default_generation_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_generation_max_tokens() -> u32 {
    6024
}
fn default_generation_key_env() -> String {
    "GROQ_API_KEY".into()
}
fn default_llm_timeout() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    1
}

/// `[simplification]` section: Gemini `generateContent` with JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplificationConfig {
    #[serde(default = "default_simplification_base_url")]
    pub base_url: String,

    #[serde(default = "default_simplification_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_simplification_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Extra attempts after a transient failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for SimplificationConfig {
    fn default() -> Self {
        Self {
            base_url: default_simplification_base_url(),
            model: default_simplification_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
            api_key_env: default_simplification_key_env(),
            timeout_secs: default_llm_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_simplification_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_simplification_model() -> String {
    "gemini-2.0-flash-exp".into()
}
fn default_top_p() -> f32 {
    0.95
}
fn default_top_k() -> u32 {
    40
}
fn default_max_output_tokens() -> u32 {
    8192
}
fn default_simplification_key_env() -> String {
    "GEMINI_API_KEY".into()
}

/// `[search]` section: DuckDuckGo HTML endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Maximum number of results fed to the simplifier.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_base_url(),
            max_results: default_max_results(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_search_base_url() -> String {
    "https://html.duckduckgo.com".into()
}
fn default_max_results() -> usize {
    5
}
fn default_search_timeout() -> u64 {
    15
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// API keys resolved from the environment at startup.
#[derive(Clone)]
pub struct Secrets {
    pub generation_api_key: String,
    pub simplification_api_key: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("generation_api_key", &"<redacted>")
            .field("simplification_api_key", &"<redacted>")
            .finish()
    }
}

/// Resolve both API keys from the process environment.
///
/// Missing or empty keys are fatal; the error names every missing variable.
pub fn resolve_secrets(config: &AppConfig) -> Result<Secrets> {
    resolve_secrets_with(config, |name| std::env::var(name).ok())
}

/// Resolve both API keys through `lookup` (env var name → value).
pub fn resolve_secrets_with<F>(config: &AppConfig, lookup: F) -> Result<Secrets>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let generation = get(&config.generation.api_key_env);
    let simplification = get(&config.simplification.api_key_env);

    match (generation, simplification) {
        (Some(generation_api_key), Some(simplification_api_key)) => Ok(Secrets {
            generation_api_key,
            simplification_api_key,
        }),
        (generation, simplification) => {
            let mut missing = Vec::new();
            if generation.is_none() {
                missing.push(config.generation.api_key_env.as_str());
            }
            if simplification.is_none() {
                missing.push(config.simplification.api_key_env.as_str());
            }
            Err(EdugenError::config(format!(
                "API key not found. Set {} in the environment or a local .env file.",
                missing.join(" and ")
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.edugen/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| EdugenError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.edugen/edugen.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| EdugenError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| EdugenError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| EdugenError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| EdugenError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| EdugenError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_dir"));
        assert!(toml_str.contains("GROQ_API_KEY"));
        assert!(toml_str.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
[defaults]
output_dir = "/tmp/edugen-out"

[simplification]
model = "gemini-1.5-pro"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.output_dir, "/tmp/edugen-out");
        assert_eq!(config.simplification.model, "gemini-1.5-pro");
        assert_eq!(config.simplification.top_k, 40);
        assert_eq!(config.generation.model, "llama-3.3-70b-versatile");
        assert_eq!(config.search.max_results, 5);
    }

    #[test]
    fn secrets_resolve_when_both_present() {
        let config = AppConfig::default();
        let secrets = resolve_secrets_with(&config, |name| match name {
            "GROQ_API_KEY" => Some("gsk-test".into()),
            "GEMINI_API_KEY" => Some("gm-test".into()),
            _ => None,
        })
        .expect("resolve");
        assert_eq!(secrets.generation_api_key, "gsk-test");
        assert!(!format!("{secrets:?}").contains("gm-test"));
    }

    #[test]
    fn missing_secret_is_fatal_and_named() {
        let config = AppConfig::default();
        let err = resolve_secrets_with(&config, |name| {
            (name == "GROQ_API_KEY").then(|| "gsk-test".to_string())
        })
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("API key not found"));
        assert!(msg.contains("GEMINI_API_KEY"));
        assert!(!msg.contains("GROQ_API_KEY"));
    }

    #[test]
    fn empty_secret_counts_as_missing() {
        let mut config = AppConfig::default();
        // Unique names so the real environment cannot interfere.
        config.generation.api_key_env = "EDUGEN_TEST_NONEXISTENT_GEN_KEY".into();
        config.simplification.api_key_env = "EDUGEN_TEST_NONEXISTENT_SIMP_KEY".into();
        let err = resolve_secrets_with(&config, |_| Some("  ".into())).unwrap_err();
        assert!(err.to_string().contains("EDUGEN_TEST_NONEXISTENT_GEN_KEY and"));
    }
}
