//! Layered configuration for the service: defaults, `.cog/settings.toml`,
//! then `COG_`-prefixed environment variables (highest precedence).
//!
//! # Environment variables
//!
//! `COG_INDEXING__PARALLEL=true` sets `indexing.parallel`;
//! `COG_MCP__BRAIN_URL=http://localhost:9000` sets `mcp.brain_url`.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub const COG_DIR_NAME: &str = ".cog";
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub languages: HashMap<String, LanguageConfig>,

    #[serde(default)]
    pub mcp: McpConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexingConfig {
    /// Dispatch per-file backend invocations across a rayon pool instead of
    /// sequentially. Off by default to match the reference design's
    /// sequential dispatch (§4.2); the merge semantics hold either way.
    #[serde(default = "default_false")]
    pub parallel: bool,

    #[serde(default = "default_parallel_threads")]
    pub threads: usize,

    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LanguageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct McpConfig {
    /// Base URL of the upstream memory MCP endpoint, if any (§4.6.2).
    #[serde(default)]
    pub brain_url: Option<String>,

    #[serde(default = "default_max_context_size")]
    pub max_context_size: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub default: String,

    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_version() -> u32 {
    1
}
fn default_parallel_threads() -> usize {
    num_cpus::get()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_max_context_size() -> usize {
    100_000
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            indexing: IndexingConfig::default(),
            languages: default_languages(),
            mcp: McpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            threads: default_parallel_threads(),
            ignore_patterns: vec![
                "target/**".to_string(),
                "node_modules/**".to_string(),
                ".git/**".to_string(),
            ],
        }
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            brain_url: None,
            max_context_size: default_max_context_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

fn default_languages() -> HashMap<String, LanguageConfig> {
    let mut langs = HashMap::new();
    langs.insert(
        "rust".to_string(),
        LanguageConfig { enabled: true, extensions: vec!["rs".to_string()] },
    );
    langs.insert(
        "python".to_string(),
        LanguageConfig { enabled: true, extensions: vec!["py".to_string(), "pyi".to_string()] },
    );
    langs.insert(
        "javascript".to_string(),
        LanguageConfig {
            enabled: true,
            extensions: vec!["js".to_string(), "jsx".to_string(), "ts".to_string(), "tsx".to_string()],
        },
    );
    langs
}

impl Settings {
    /// Load configuration from all sources: defaults, `.cog/settings.toml`
    /// (found by walking upward from the current directory), then
    /// `COG_`-prefixed environment variables.
    pub fn load() -> Result<Self, figment::Error> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(COG_DIR_NAME).join(SETTINGS_FILE_NAME));

        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("COG_").map(|key| key.as_str().to_lowercase().replace("__", ".").into()))
            .extract()
    }

    /// Walk upward from the current directory looking for a `.cog` dir.
    pub fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        for ancestor in current.ancestors() {
            let cog_dir = ancestor.join(COG_DIR_NAME);
            if cog_dir.is_dir() {
                return Some(cog_dir.join(SETTINGS_FILE_NAME));
            }
        }
        None
    }

    /// The directory containing `.cog`, or the current directory if none
    /// exists yet (§6: "created in the current directory" otherwise).
    pub fn workspace_root() -> PathBuf {
        let current = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        for ancestor in current.ancestors() {
            if ancestor.join(COG_DIR_NAME).is_dir() {
                return ancestor.to_path_buf();
            }
        }
        current
    }

    pub fn cog_dir() -> PathBuf {
        Self::workspace_root().join(COG_DIR_NAME)
    }

    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("COG_").map(|key| key.as_str().to_lowercase().replace("__", ".").into()))
            .extract()
    }

    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(COG_DIR_NAME).join(SETTINGS_FILE_NAME);
        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }
        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_have_rust_enabled() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert!(settings.languages["rust"].enabled);
        assert!(!settings.indexing.parallel);
    }

    #[test]
    fn load_from_toml_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("settings.toml");
        fs::write(
            &config_path,
            r#"
[indexing]
parallel = true
threads = 4

[mcp]
brain_url = "http://localhost:9000"
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert!(settings.indexing.parallel);
        assert_eq!(settings.indexing.threads, 4);
        assert_eq!(settings.mcp.brain_url.as_deref(), Some("http://localhost:9000"));
        assert!(settings.languages["rust"].enabled);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("settings.toml");
        let mut settings = Settings::default();
        settings.indexing.threads = 2;

        settings.save(&config_path).unwrap();
        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.indexing.threads, 2);
    }

    #[test]
    fn env_vars_override_config_file() {
        let dir = TempDir::new().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&dir).unwrap();

        let cog_dir = dir.path().join(COG_DIR_NAME);
        fs::create_dir_all(&cog_dir).unwrap();
        fs::write(
            cog_dir.join(SETTINGS_FILE_NAME),
            r#"
[indexing]
threads = 8
"#,
        )
        .unwrap();

        unsafe {
            std::env::set_var("COG_INDEXING__THREADS", "16");
        }

        let settings = Settings::load().unwrap();
        assert_eq!(settings.indexing.threads, 16);

        unsafe {
            std::env::remove_var("COG_INDEXING__THREADS");
        }
        std::env::set_current_dir(original_dir).unwrap();
    }
}
