//! Tags: free-form labels attached to arguments at creation time.
//!
//! Tag names are not unique; two tags may share a name and still be distinct.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TagId(pub i64);

impl fmt::Display for TagId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
  pub id:         TagId,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}
