//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! Nested keys in the environment use `__`, e.g. `APP_PIPELINE__RRF_K=40`.
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_from(Path::new("."), &env_name)
    }

    /// Load with config files looked up under `dir`.
    pub fn load_from(dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub embed: EmbedSettings,
    pub llm: LlmSettings,
    pub pipeline: PipelineSettings,
    pub server: ServerSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        let p = &self.pipeline;
        if p.rrf_k <= 0.0 {
            return Err(Error::InvalidConfig(format!("pipeline.rrf_k must be positive, got {}", p.rrf_k)));
        }
        if p.max_queries == 0 || p.lexical_limit == 0 || p.lexical_pool == 0 || p.vector_top_k == 0 || p.context_top_k == 0 {
            return Err(Error::InvalidConfig("pipeline limits must be at least 1".to_string()));
        }
        if p.stage_timeout_secs == 0 {
            return Err(Error::InvalidConfig("pipeline.stage_timeout_secs must be at least 1".to_string()));
        }
        if self.embed.dim == 0 {
            return Err(Error::InvalidConfig("embed.dim must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub raw_txt_dir: String,
    pub tantivy_index_dir: String,
    pub lancedb_dir: String,
    pub table_name: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            raw_txt_dir: "../dev_data/txt".to_string(),
            tantivy_index_dir: "../dev_data/indexes/tantivy".to_string(),
            lancedb_dir: "../dev_data/indexes/lancedb".to_string(),
            table_name: "chunks".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedProviderKind {
    Hash,
    Ollama,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedSettings {
    pub provider: EmbedProviderKind,
    pub model: String,
    pub dim: usize,
    pub base_url: String,
    pub model_dir: Option<String>,
}

impl Default for EmbedSettings {
    fn default() -> Self {
        Self {
            provider: EmbedProviderKind::Ollama,
            model: "bge-m3".to_string(),
            dim: 1024,
            base_url: "http://localhost:11434".to_string(),
            model_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub chat_model: String,
    pub expansion_model: String,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.1".to_string(),
            expansion_model: "llama3.1".to_string(),
            temperature: 0.2,
        }
    }
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant answering questions about the user's documents. \
Use the numbered context passages provided in the conversation. Cite passages as [n] where you use them. \
If the context does not contain the answer, say so instead of guessing.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub rrf_k: f64,
    pub max_queries: usize,
    pub lexical_limit: usize,
    pub lexical_pool: usize,
    pub vector_top_k: usize,
    pub context_top_k: usize,
    pub stage_timeout_secs: u64,
    pub event_buffer: usize,
    pub system_prompt: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            rrf_k: 60.0,
            max_queries: 5,
            lexical_limit: 5,
            lexical_pool: 10,
            vector_top_k: 5,
            context_top_k: 10,
            stage_timeout_secs: 30,
            event_buffer: 64,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl PipelineSettings {
    pub fn stage_timeout(&self) -> Duration { Duration::from_secs(self.stage_timeout_secs) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: "127.0.0.1:8787".to_string() }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
