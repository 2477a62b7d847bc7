//! Arguments, the unit of discourse.
//!
//! An argument is either top-level (it starts a thread) or a response anchored
//! into its parent. Arguments are immutable once stored; votes and tag
//! associations live in their own tables and are joined in on read.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, tag::TagId};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Store-assigned argument key. Monotonic with creation order.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ArgumentId(pub i64);

impl fmt::Display for ArgumentId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// A user identity as resolved by the identity gateway.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Anchoring ───────────────────────────────────────────────────────────────

/// A half-open character range `[start, end)` into a parent argument's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSpan {
  pub start: u32,
  pub end:   u32,
}

impl ResponseSpan {
  pub fn new(start: u32, end: u32) -> Result<Self> {
    if start > end {
      return Err(Error::invalid(format!(
        "response span start {start} is past its end {end}"
      )));
    }
    Ok(Self { start, end })
  }

  /// Whether the span lies within a text of `len` characters.
  pub fn fits(&self, len: usize) -> bool { self.end as usize <= len }
}

/// Where a new argument sits in the discussion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
  /// Starts a new thread; only top-level arguments carry a title.
  TopLevel { title: Option<String> },
  /// Answers a span of `parent`.
  Response {
    parent: ArgumentId,
    span:   ResponseSpan,
  },
}

// ─── Argument ────────────────────────────────────────────────────────────────

/// A stored argument. No field changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
  pub id:             ArgumentId,
  pub author_id:      UserId,
  pub text:           String,
  pub title:          Option<String>,
  pub in_response_to: Option<ArgumentId>,
  pub response_span:  Option<ResponseSpan>,
  /// Server-assigned; informational only. Feeds order by `id`.
  pub created_at:     DateTime<Utc>,
}

/// Input to [`crate::store::DiscussStore::create_argument`].
///
/// `author_id` is always the identity resolved from the caller's token.
#[derive(Debug, Clone)]
pub struct NewArgument {
  pub author_id: UserId,
  pub text:      String,
  pub placement: Placement,
  pub tag_ids:   Vec<TagId>,
}

/// The read model returned by `ReadArgument`: the argument plus its tags and a
/// freshly counted vote total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentView {
  #[serde(flatten)]
  pub argument: Argument,
  pub tag_ids:  Vec<TagId>,
  pub votes:    u64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn span_rejects_inverted_offsets() {
    assert!(matches!(
      ResponseSpan::new(5, 2),
      Err(Error::InvalidArgument(_))
    ));
  }

  #[test]
  fn span_fits_counts_inclusive_end() {
    let span = ResponseSpan::new(0, 5).unwrap();
    assert!(span.fits(5));
    assert!(!span.fits(4));
  }
}
