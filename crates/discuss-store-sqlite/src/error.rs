//! Error type for `discuss-store-sqlite`.

use discuss_core::{argument::ArgumentId, tag::TagId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A submitted argument referenced a tag that does not exist. The argument
  /// was not written.
  #[error("unknown tag: {0}")]
  UnknownTag(TagId),

  /// A vote referenced an argument that does not exist.
  #[error("argument not found: {0}")]
  ArgumentNotFound(ArgumentId),
}

impl From<Error> for discuss_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::UnknownTag(id) => Self::invalid(format!("unknown tag {id}")),
      Error::ArgumentNotFound(id) => Self::ArgumentNotFound(id),
      other => Self::Store(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
