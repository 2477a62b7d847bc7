//! The `DiscussStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `discuss-store-sqlite`).
//! [`crate::service::ArgumentService`] depends on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use crate::{
  argument::{Argument, ArgumentId, ArgumentView, NewArgument, UserId},
  tag::{Tag, TagId},
  vote::VoteState,
};

// ─── Feeds ───────────────────────────────────────────────────────────────────

/// Selects which arguments [`DiscussStore::feed`] returns. Every feed is
/// ordered newest first, i.e. strictly descending by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
  /// Arguments with no parent.
  TopLevel,
  /// Arguments with a parent, across all threads.
  Responses,
  /// Direct responses to one argument.
  RepliesTo(ArgumentId),
  /// Everything one user has posted, top-level and responses alike.
  ByAuthor(UserId),
}

impl Feed {
  /// Whether `argument` belongs in this feed.
  #[cfg(test)]
  pub(crate) fn admits(&self, argument: &Argument) -> bool {
    match *self {
      Self::TopLevel => argument.in_response_to.is_none(),
      Self::Responses => argument.in_response_to.is_some(),
      Self::RepliesTo(parent) => argument.in_response_to == Some(parent),
      Self::ByAuthor(user) => argument.author_id == user,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Discuss persistence backend.
///
/// Arguments, tags and tag associations are append-only. Votes are the only
/// rows ever deleted, and only through [`DiscussStore::toggle_vote`].
///
/// Backend errors must convert into the service taxonomy so the service can
/// tell a caller mistake (unknown tag, missing argument) from a failed store.
pub trait DiscussStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Arguments ─────────────────────────────────────────────────────────

  /// Persist an argument and one association per tag id, atomically. If any
  /// association cannot be written, nothing is.
  fn create_argument(
    &self,
    input: NewArgument,
  ) -> impl Future<Output = Result<Argument, Self::Error>> + Send + '_;

  /// Retrieve a bare argument by id. Returns `None` if not found.
  fn get_argument(
    &self,
    id: ArgumentId,
  ) -> impl Future<Output = Result<Option<Argument>, Self::Error>> + Send + '_;

  /// Retrieve an argument with its tag ids and current vote count.
  fn read_argument(
    &self,
    id: ArgumentId,
  ) -> impl Future<Output = Result<Option<ArgumentView>, Self::Error>> + Send + '_;

  /// Argument ids selected by `feed`, newest first.
  fn feed(
    &self,
    feed: Feed,
  ) -> impl Future<Output = Result<Vec<ArgumentId>, Self::Error>> + Send + '_;

  // ── Tags ──────────────────────────────────────────────────────────────

  fn create_tag(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Tag, Self::Error>> + Send + '_;

  fn get_tag(
    &self,
    id: TagId,
  ) -> impl Future<Output = Result<Option<Tag>, Self::Error>> + Send + '_;

  /// Every tag id, in insertion order.
  fn list_tags(
    &self,
  ) -> impl Future<Output = Result<Vec<TagId>, Self::Error>> + Send + '_;

  // ── Votes ─────────────────────────────────────────────────────────────

  /// Insert the `(user, argument)` vote if absent, delete it if present, as a
  /// single indivisible operation.
  fn toggle_vote(
    &self,
    user: UserId,
    argument: ArgumentId,
  ) -> impl Future<Output = Result<VoteState, Self::Error>> + Send + '_;
}
