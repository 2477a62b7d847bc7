//! Votes are keyed by `(user, argument)` and toggled, never set.

use serde::{Deserialize, Serialize};

/// The outcome of a vote toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteState {
  /// No vote existed; one was recorded.
  Cast,
  /// A vote existed; it was removed.
  Withdrawn,
}
