//! Identity gateways: the remote token validator and a static token table.

use std::{collections::HashMap, time::Duration};

use discuss_core::{argument::UserId, identity::IdentityGateway};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::{IdentityConfig, TokenEntry};

#[derive(Debug, Error)]
pub enum Error {
  #[error("validator request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("validator answered {0}")]
  Status(reqwest::StatusCode),

  #[error("validator accepted the token but returned no user id")]
  MissingUserId,

  #[error("invalid token digest {0:?}: expected 64 hex characters")]
  InvalidDigest(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Hex-encoded SHA-256 digest of `token`, as stored in the static table.
pub fn hash_token(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

// ─── Remote ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ValidateRequest<'a> {
  token: &'a str,
}

/// The validator's answer: one call carries both the verdict and the user.
#[derive(Debug, Deserialize)]
struct Verdict {
  valid:   bool,
  #[serde(default)]
  user_id: Option<i64>,
}

/// Client for an external token validator at `POST <base_url>/validate`.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct RemoteGateway {
  client:   Client,
  endpoint: String,
}

impl RemoteGateway {
  pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
    let client = Client::builder().timeout(timeout).build()?;
    let endpoint = format!("{}/validate", base_url.trim_end_matches('/'));
    Ok(Self { client, endpoint })
  }

  async fn verdict(&self, token: &str) -> Result<Verdict> {
    let resp = self
      .client
      .post(&self.endpoint)
      .json(&ValidateRequest { token })
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(Error::Status(resp.status()));
    }
    Ok(resp.json().await?)
  }

  pub async fn validate(&self, token: &str) -> Result<bool> {
    Ok(self.verdict(token).await?.valid)
  }

  pub async fn resolve(&self, token: &str) -> Result<Option<UserId>> {
    let verdict = self.verdict(token).await?;
    if !verdict.valid {
      return Ok(None);
    }
    verdict.user_id.map(|id| Some(UserId(id))).ok_or(Error::MissingUserId)
  }
}

// ─── Static ───────────────────────────────────────────────────────────────────

/// A fixed table of token digests, for development and single-tenant setups.
#[derive(Debug, Clone, Default)]
pub struct StaticGateway {
  by_digest: HashMap<String, UserId>,
}

impl StaticGateway {
  pub fn new(entries: &[TokenEntry]) -> Result<Self> {
    let mut by_digest = HashMap::with_capacity(entries.len());
    for entry in entries {
      let digest = entry.token_sha256.trim().to_ascii_lowercase();
      match hex::decode(&digest) {
        Ok(bytes) if bytes.len() == 32 => {}
        _ => return Err(Error::InvalidDigest(entry.token_sha256.clone())),
      }
      by_digest.insert(digest, UserId(entry.user_id));
    }
    Ok(Self { by_digest })
  }

  pub fn lookup(&self, token: &str) -> Option<UserId> {
    self.by_digest.get(&hash_token(token)).copied()
  }
}

// ─── Dispatch ─────────────────────────────────────────────────────────────────

/// The gateway selected by `[identity]` in the server configuration.
#[derive(Clone)]
pub enum Gateway {
  Remote(RemoteGateway),
  Static(StaticGateway),
}

impl Gateway {
  pub fn from_config(config: &IdentityConfig) -> Result<Self> {
    Ok(match config {
      IdentityConfig::Remote { url, timeout_secs } => {
        Self::Remote(RemoteGateway::new(url, Duration::from_secs(*timeout_secs))?)
      }
      IdentityConfig::Static { tokens } => Self::Static(StaticGateway::new(tokens)?),
    })
  }
}

impl IdentityGateway for Gateway {
  type Error = Error;

  async fn validate(&self, token: &str) -> Result<bool> {
    match self {
      Self::Remote(g) => g.validate(token).await,
      Self::Static(g) => Ok(g.lookup(token).is_some()),
    }
  }

  async fn resolve(&self, token: &str) -> Result<Option<UserId>> {
    match self {
      Self::Remote(g) => g.resolve(token).await,
      Self::Static(g) => Ok(g.lookup(token)),
    }
  }
}
