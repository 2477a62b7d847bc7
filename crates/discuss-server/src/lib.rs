//! Server wiring for Discuss: configuration, identity gateways and the HTTP
//! router. The binary in `main.rs` only parses arguments and calls into here.

pub mod identity;

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use config::{Config, ConfigError, Environment, Source};
use discuss_core::{
  identity::IdentityGateway,
  service::{ArgumentService, SubmitPolicy},
  store::DiscussStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `DISCUSS_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub identity:   IdentityConfig,
  #[serde(default)]
  pub policy:     SubmitPolicy,
}

/// Which identity gateway to use, selected by `kind`.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentityConfig {
  /// An external validator answering `POST <url>/validate`.
  Remote {
    url:          String,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
  },
  /// A fixed table of token digests.
  Static {
    #[serde(default)]
    tokens: Vec<TokenEntry>,
  },
}

fn default_timeout_secs() -> u64 { 5 }

/// `DISCUSS_*` overrides; `__` descends into tables, so
/// `DISCUSS_IDENTITY__URL` sets `identity.url`.
pub fn environment() -> Environment {
  Environment::with_prefix("DISCUSS")
    .prefix_separator("_")
    .separator("__")
}

/// Layer `env` over `file` and deserialise the result.
pub fn load_config<F>(file: F, env: Environment) -> Result<ServerConfig, ConfigError>
where
  F: Source + Send + Sync + 'static,
{
  Config::builder()
    .add_source(file)
    .add_source(env)
    .build()?
    .try_deserialize()
}

/// One accepted token. Only its SHA-256 digest is configured; generate it with
/// `discuss-server --hash-token`.
#[derive(Debug, Deserialize, Clone)]
pub struct TokenEntry {
  pub token_sha256: String,
  pub user_id:      i64,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the top-level router: the JSON API under `/api`, with request
/// tracing.
pub fn router<S, G>(service: Arc<ArgumentService<S, G>>) -> Router
where
  S: DiscussStore + 'static,
  G: IdentityGateway + 'static,
{
  Router::new()
    .nest("/api", discuss_api::api_router(service))
    .layer(TraceLayer::new_for_http())
}
