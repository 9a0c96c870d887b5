//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g. `APP_STORE__TABLE`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::schema::{CollectionSchema, DEFAULT_EMBEDDING_DIM, EMBEDDING_FIELD};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self { Self { figment } }

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

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.settings()?;
        if settings.embedding.dim == 0 {
            anyhow::bail!("embedding.dim must be greater than 0");
        }
        if settings.ingest.concurrency == 0 {
            anyhow::bail!("ingest.concurrency must be greater than 0");
        }
        match env {
            "prod" | "production" if settings.embedding.backend != "openai" => {
                anyhow::bail!("production requires embedding.backend = \"openai\"")
            }
            _ => {}
        }
        Ok(())
    }
}

/// Typed view of the configuration tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub store: StoreConfig,
    pub embedding: EmbeddingConfig,
    pub ingest: IngestConfig,
    pub search: SearchConfig,
}

impl Settings {
    pub fn collection_schema(&self) -> CollectionSchema {
        let mut schema = CollectionSchema::movies(self.embedding.dim);
        schema.embedding_field = self.store.vector_column.clone();
        schema
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `lancedb` or `memory`.
    pub backend: String,
    pub uri: String,
    pub table: String,
    pub vector_column: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "lancedb".to_string(),
            uri: "../dev_data/indexes/movies".to_string(),
            table: "movies".to_string(),
            vector_column: EMBEDDING_FIELD.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `openai` or `hash`.
    pub backend: String,
    pub model: String,
    pub endpoint: String,
    pub dim: usize,
    pub timeout_secs: u64,
    /// Name of the environment variable holding the API key. The core never
    /// reads it; the caller resolves it and passes the key in.
    pub api_key_env: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
            dim: DEFAULT_EMBEDDING_DIM,
            timeout_secs: 30,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub dataset: String,
    pub concurrency: usize,
    pub show_progress: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { dataset: "imdb_top_1000.csv".to_string(), concurrency: 4, show_progress: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_k: usize,
    /// Per-query deadline; 0 disables it.
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self { Self { default_k: 5, timeout_secs: 10 } }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
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
