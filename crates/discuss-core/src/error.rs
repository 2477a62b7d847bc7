//! Error types for `discuss-core`.
//!
//! [`Error`] is the service-level taxonomy. Every variant collapses onto one of
//! four caller-facing [`ErrorKind`]s.

use serde::Serialize;
use thiserror::Error;

use crate::{argument::ArgumentId, tag::TagId};

#[derive(Debug, Error)]
pub enum Error {
  #[error("token rejected by identity gateway")]
  Unauthorized,

  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("argument not found: {0}")]
  ArgumentNotFound(ArgumentId),

  #[error("tag not found: {0}")]
  TagNotFound(TagId),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("identity gateway error: {0}")]
  Gateway(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn invalid(reason: impl Into<String>) -> Self {
    Self::InvalidArgument(reason.into())
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Unauthorized => ErrorKind::Unauthorized,
      Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
      Self::ArgumentNotFound(_) | Self::TagNotFound(_) => ErrorKind::NotFound,
      Self::Store(_) | Self::Gateway(_) => ErrorKind::DependencyFailure,
    }
  }
}

/// The caller-facing classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  Unauthorized,
  InvalidArgument,
  NotFound,
  DependencyFailure,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
