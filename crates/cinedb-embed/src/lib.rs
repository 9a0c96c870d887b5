//! cinedb-embed
//!
//! Embedding clients behind `cinedb_core::traits::Embedder`: the remote
//! OpenAI-compatible client used in production and a deterministic hash
//! embedder for offline runs and tests.

pub mod hash;
pub mod openai;

use std::sync::Arc;

use cinedb_core::config::EmbeddingConfig;
use cinedb_core::error::{Error, Result};
use cinedb_core::traits::Embedder;

pub use hash::HashEmbedder;
pub use openai::OpenAiEmbedder;

fn fake_requested() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Build the embedder named by `config.backend`.
///
/// `APP_USE_FAKE_EMBEDDINGS=1` forces the hash embedder regardless of the
/// configured backend. The remote backend requires `api_key`.
pub fn build_embedder(config: &EmbeddingConfig, api_key: Option<String>) -> Result<Arc<dyn Embedder>> {
    if config.dim == 0 {
        return Err(Error::InvalidConfig("embedding.dim must be greater than 0".into()));
    }
    if fake_requested() {
        tracing::info!(dim = config.dim, "using hash embedder (APP_USE_FAKE_EMBEDDINGS)");
        return Ok(Arc::new(HashEmbedder::new(config.dim)));
    }
    match config.backend.trim().to_lowercase().as_str() {
        "" | "openai" => {
            let key = api_key
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| Error::InvalidConfig(format!("{} is not set", config.api_key_env)))?;
            tracing::info!(model = %config.model, dim = config.dim, "using remote embedder");
            Ok(Arc::new(OpenAiEmbedder::new(config, key)?))
        }
        "hash" => Ok(Arc::new(HashEmbedder::new(config.dim))),
        other => Err(Error::InvalidConfig(format!("unknown embedding backend: {other}"))),
    }
}
