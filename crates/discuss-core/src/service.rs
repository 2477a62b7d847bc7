//! [`ArgumentService`]: the operations of the Discuss service.
//!
//! Every mutating operation checks the caller's token before it looks at the
//! request, and checks the request before it touches the store. Reads go
//! straight to the store; nothing is cached in-process.

use std::sync::Arc;

use serde::Deserialize;

use crate::{
  Error, Result,
  argument::{ArgumentId, ArgumentView, NewArgument, Placement, ResponseSpan, UserId},
  identity::IdentityGateway,
  store::{DiscussStore, Feed},
  tag::{Tag, TagId},
  vote::VoteState,
};

// ─── Requests ────────────────────────────────────────────────────────────────

/// A `SubmitArgument` request, minus the token.
///
/// A request with neither span offset creates a top-level argument, even if
/// `in_response_to` is set; one with both creates a response to
/// `in_response_to`. `title` is only kept for top-level arguments.
#[derive(Debug, Clone, Default)]
pub struct SubmitArgument {
  pub text:           String,
  pub title:          Option<String>,
  pub in_response_to: Option<ArgumentId>,
  pub span_start:     Option<u32>,
  pub span_end:       Option<u32>,
  pub tag_ids:        Vec<TagId>,
}

impl SubmitArgument {
  fn placement(&self) -> Result<Placement> {
    match (self.in_response_to, self.span_start, self.span_end) {
      (None, None, None) => Ok(Placement::TopLevel { title: self.title.clone() }),
      (Some(parent), Some(start), Some(end)) => Ok(Placement::Response {
        parent,
        span: ResponseSpan::new(start, end)?,
      }),
      (_, Some(_), None) | (_, None, Some(_)) => Err(Error::invalid(
        "span_start and span_end must be given together",
      )),
      (None, Some(_), Some(_)) => {
        Err(Error::invalid("a response span requires in_response_to"))
      }
      // No span means no anchor: the parent is dropped.
      (Some(_), None, None) => Ok(Placement::TopLevel { title: self.title.clone() }),
    }
  }

  /// Tag ids with repeats removed, first occurrence kept.
  fn distinct_tags(&self) -> Vec<TagId> {
    let mut seen = Vec::with_capacity(self.tag_ids.len());
    for id in &self.tag_ids {
      if !seen.contains(id) {
        seen.push(*id);
      }
    }
    seen
  }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Knobs for checks the store does not enforce on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SubmitPolicy {
  /// Reject responses whose parent is missing or whose span runs past the
  /// end of the parent's text. Off by default: responses may dangle.
  pub verify_parent: bool,
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct ArgumentService<S, G> {
  store:   Arc<S>,
  gateway: Arc<G>,
  policy:  SubmitPolicy,
}

impl<S, G> ArgumentService<S, G>
where
  S: DiscussStore,
  G: IdentityGateway,
{
  pub fn new(store: Arc<S>, gateway: Arc<G>) -> Self {
    Self { store, gateway, policy: SubmitPolicy::default() }
  }

  pub fn with_policy(mut self, policy: SubmitPolicy) -> Self {
    self.policy = policy;
    self
  }

  #[cfg(test)]
  fn store(&self) -> &S { &self.store }

  // ── Write path ────────────────────────────────────────────────────────

  /// Reject `token` unless the gateway accepts it. For callers that must
  /// refuse a request before they can even parse it.
  pub async fn authenticate(&self, token: &str) -> Result<()> {
    if self.gateway.validate(token).await.map_err(gateway_error)? {
      Ok(())
    } else {
      tracing::debug!("token rejected");
      Err(Error::Unauthorized)
    }
  }

  /// `SubmitArgument`: create a top-level argument or a response and tag it.
  pub async fn submit_argument(
    &self,
    token: &str,
    request: SubmitArgument,
  ) -> Result<ArgumentId> {
    let author_id = self.resolve(token).await?;
    if request.text.is_empty() {
      return Err(Error::invalid("argument text is empty"));
    }
    let placement = request.placement()?;
    if let Placement::Response { parent, span } = &placement
      && self.policy.verify_parent
    {
      self.check_parent(*parent, span).await?;
    }

    let tag_ids = request.distinct_tags();
    let argument = self
      .store
      .create_argument(NewArgument {
        author_id,
        text: request.text,
        placement,
        tag_ids,
      })
      .await
      .map_err(store_error)?;

    tracing::info!(
      argument = %argument.id,
      author = %author_id,
      in_response_to = ?argument.in_response_to,
      "argument submitted"
    );
    Ok(argument.id)
  }

  /// `ToggleVote`: cast the caller's vote on `argument`, or withdraw it.
  pub async fn toggle_vote(
    &self,
    token: &str,
    argument: ArgumentId,
  ) -> Result<VoteState> {
    let user = self.resolve(token).await?;
    let state = self
      .store
      .toggle_vote(user, argument)
      .await
      .map_err(store_error)?;
    tracing::info!(%argument, %user, ?state, "vote toggled");
    Ok(state)
  }

  /// `CreateTag`. The new id is deliberately not returned.
  pub async fn create_tag(&self, name: String) -> Result<()> {
    if name.is_empty() {
      return Err(Error::invalid("tag name is empty"));
    }
    let tag = self.store.create_tag(name).await.map_err(store_error)?;
    tracing::info!(tag = %tag.id, name = %tag.name, "tag created");
    Ok(())
  }

  // ── Read path ─────────────────────────────────────────────────────────

  /// `ReadArgument`.
  pub async fn read_argument(&self, id: ArgumentId) -> Result<ArgumentView> {
    self
      .store
      .read_argument(id)
      .await
      .map_err(store_error)?
      .ok_or(Error::ArgumentNotFound(id))
  }

  /// `ReadLatestArguments`.
  pub async fn latest_arguments(&self) -> Result<Vec<ArgumentId>> {
    self.feed(Feed::TopLevel).await
  }

  /// `ReadLatestResponses`.
  pub async fn latest_responses(&self) -> Result<Vec<ArgumentId>> {
    self.feed(Feed::Responses).await
  }

  /// `ReadResponses`.
  pub async fn responses_to(&self, parent: ArgumentId) -> Result<Vec<ArgumentId>> {
    self.feed(Feed::RepliesTo(parent)).await
  }

  /// `ReadUserArguments`.
  pub async fn user_arguments(&self, user: UserId) -> Result<Vec<ArgumentId>> {
    self.feed(Feed::ByAuthor(user)).await
  }

  /// `ReadTag`.
  pub async fn read_tag(&self, id: TagId) -> Result<Tag> {
    self
      .store
      .get_tag(id)
      .await
      .map_err(store_error)?
      .ok_or(Error::TagNotFound(id))
  }

  /// `ListTags`.
  pub async fn list_tags(&self) -> Result<Vec<TagId>> {
    self.store.list_tags().await.map_err(store_error)
  }

  // ── Helpers ───────────────────────────────────────────────────────────

  async fn feed(&self, feed: Feed) -> Result<Vec<ArgumentId>> {
    self.store.feed(feed).await.map_err(store_error)
  }

  async fn resolve(&self, token: &str) -> Result<UserId> {
    match self.gateway.resolve(token).await.map_err(gateway_error)? {
      Some(user) => Ok(user),
      None => {
        tracing::debug!("token did not resolve to a user");
        Err(Error::Unauthorized)
      }
    }
  }

  async fn check_parent(&self, parent: ArgumentId, span: &ResponseSpan) -> Result<()> {
    let Some(parent_arg) = self.store.get_argument(parent).await.map_err(store_error)?
    else {
      return Err(Error::invalid(format!("parent argument {parent} does not exist")));
    };
    if !span.fits(parent_arg.text.chars().count()) {
      return Err(Error::invalid(format!(
        "response span {}..{} runs past the end of argument {parent}",
        span.start, span.end
      )));
    }
    Ok(())
  }
}

fn store_error<E: Into<Error>>(e: E) -> Error { e.into() }

fn gateway_error<E>(e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::Gateway(Box::new(e))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::{
    collections::HashMap,
    sync::{
      Mutex,
      atomic::{AtomicUsize, Ordering},
    },
  };

  use chrono::Utc;

  use super::*;
  use crate::argument::Argument;

  // An in-memory store with the same observable semantics as a real backend.
  #[derive(Default)]
  struct MemoryStore {
    inner: Mutex<Inner>,
  }

  #[derive(Default)]
  struct Inner {
    arguments: Vec<Argument>,
    tags:      Vec<Tag>,
    links:     Vec<(ArgumentId, TagId)>,
    votes:     Vec<(UserId, ArgumentId)>,
  }

  impl MemoryStore {
    fn argument_count(&self) -> usize { self.inner.lock().unwrap().arguments.len() }
  }

  impl DiscussStore for MemoryStore {
    type Error = Error;

    async fn create_argument(&self, input: NewArgument) -> Result<Argument> {
      let mut inner = self.inner.lock().unwrap();
      if let Some(missing) = input
        .tag_ids
        .iter()
        .find(|id| !inner.tags.iter().any(|t| t.id == **id))
      {
        return Err(Error::invalid(format!("unknown tag {missing}")));
      }
      let (title, in_response_to, response_span) = match input.placement {
        Placement::TopLevel { title } => (title, None, None),
        Placement::Response { parent, span } => (None, Some(parent), Some(span)),
      };
      let argument = Argument {
        id: ArgumentId(inner.arguments.len() as i64 + 1),
        author_id: input.author_id,
        text: input.text,
        title,
        in_response_to,
        response_span,
        created_at: Utc::now(),
      };
      for tag in input.tag_ids {
        inner.links.push((argument.id, tag));
      }
      inner.arguments.push(argument.clone());
      Ok(argument)
    }

    async fn get_argument(&self, id: ArgumentId) -> Result<Option<Argument>> {
      let inner = self.inner.lock().unwrap();
      Ok(inner.arguments.iter().find(|a| a.id == id).cloned())
    }

    async fn read_argument(&self, id: ArgumentId) -> Result<Option<ArgumentView>> {
      let inner = self.inner.lock().unwrap();
      Ok(inner.arguments.iter().find(|a| a.id == id).map(|a| ArgumentView {
        argument: a.clone(),
        tag_ids:  inner.links.iter().filter(|l| l.0 == id).map(|l| l.1).collect(),
        votes:    inner.votes.iter().filter(|v| v.1 == id).count() as u64,
      }))
    }

    async fn feed(&self, feed: Feed) -> Result<Vec<ArgumentId>> {
      let inner = self.inner.lock().unwrap();
      Ok(
        inner
          .arguments
          .iter()
          .rev()
          .filter(|a| feed.admits(a))
          .map(|a| a.id)
          .collect(),
      )
    }

    async fn create_tag(&self, name: String) -> Result<Tag> {
      let mut inner = self.inner.lock().unwrap();
      let tag = Tag {
        id: TagId(inner.tags.len() as i64 + 1),
        name,
        created_at: Utc::now(),
      };
      inner.tags.push(tag.clone());
      Ok(tag)
    }

    async fn get_tag(&self, id: TagId) -> Result<Option<Tag>> {
      let inner = self.inner.lock().unwrap();
      Ok(inner.tags.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tags(&self) -> Result<Vec<TagId>> {
      Ok(self.inner.lock().unwrap().tags.iter().map(|t| t.id).collect())
    }

    async fn toggle_vote(&self, user: UserId, argument: ArgumentId) -> Result<VoteState> {
      let mut inner = self.inner.lock().unwrap();
      if let Some(pos) = inner.votes.iter().position(|v| *v == (user, argument)) {
        inner.votes.remove(pos);
        Ok(VoteState::Withdrawn)
      } else {
        inner.votes.push((user, argument));
        Ok(VoteState::Cast)
      }
    }
  }

  #[derive(Debug, thiserror::Error)]
  #[error("validator unreachable")]
  struct Unreachable;

  // Maps fixed tokens to users; `"down"` simulates an outage.
  struct TokenTable {
    users: HashMap<&'static str, UserId>,
    calls: AtomicUsize,
  }

  impl TokenTable {
    fn lookup(&self, token: &str) -> Result<Option<UserId>, Unreachable> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if token == "down" {
        return Err(Unreachable);
      }
      Ok(self.users.get(token).copied())
    }
  }

  impl IdentityGateway for TokenTable {
    type Error = Unreachable;

    async fn validate(&self, token: &str) -> Result<bool, Unreachable> {
      Ok(self.lookup(token)?.is_some())
    }

    async fn resolve(&self, token: &str) -> Result<Option<UserId>, Unreachable> {
      self.lookup(token)
    }
  }

  const ALICE: UserId = UserId(1);
  const BOB: UserId = UserId(2);

  fn service() -> ArgumentService<MemoryStore, TokenTable> {
    let gateway = TokenTable {
      users: HashMap::from([("alice", ALICE), ("bob", BOB)]),
      calls: AtomicUsize::new(0),
    };
    ArgumentService::new(Arc::new(MemoryStore::default()), Arc::new(gateway))
  }

  fn top_level(text: &str) -> SubmitArgument {
    SubmitArgument { text: text.into(), ..Default::default() }
  }

  fn response(parent: ArgumentId, start: u32, end: u32, text: &str) -> SubmitArgument {
    SubmitArgument {
      text: text.into(),
      in_response_to: Some(parent),
      span_start: Some(start),
      span_end: Some(end),
      ..Default::default()
    }
  }

  // ── Submit ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn submit_top_level_records_resolved_author() {
    let svc = service();
    let mut req = top_level("X");
    req.title = Some("On X".into());
    let id = svc.submit_argument("alice", req).await.unwrap();

    let view = svc.read_argument(id).await.unwrap();
    assert_eq!(view.argument.author_id, ALICE);
    assert_eq!(view.argument.text, "X");
    assert_eq!(view.argument.title.as_deref(), Some("On X"));
    assert_eq!(view.argument.in_response_to, None);
    assert_eq!(view.votes, 0);
  }

  #[tokio::test]
  async fn submit_response_keeps_parent_and_span_but_drops_title() {
    let svc = service();
    let parent = svc.submit_argument("alice", top_level("hello world")).await.unwrap();
    let mut req = response(parent, 0, 5, "why hello?");
    req.title = Some("ignored".into());
    let id = svc.submit_argument("bob", req).await.unwrap();

    let view = svc.read_argument(id).await.unwrap();
    assert_eq!(view.argument.in_response_to, Some(parent));
    assert_eq!(view.argument.response_span, Some(ResponseSpan { start: 0, end: 5 }));
    assert_eq!(view.argument.title, None);
    assert_eq!(view.argument.author_id, BOB);
  }

  #[tokio::test]
  async fn invalid_token_is_unauthorized_even_with_text() {
    let svc = service();
    let err = svc.submit_argument("mallory", top_level("hi")).await.unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
    assert_eq!(svc.store().argument_count(), 0);
  }

  #[tokio::test]
  async fn identity_is_checked_before_text() {
    let svc = service();
    let err = svc.submit_argument("mallory", top_level("")).await.unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
  }

  #[tokio::test]
  async fn empty_text_is_invalid_and_writes_nothing() {
    let svc = service();
    let err = svc.submit_argument("alice", top_level("")).await.unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    assert_eq!(svc.store().argument_count(), 0);
  }

  #[tokio::test]
  async fn half_a_span_is_invalid() {
    let svc = service();
    let mut req = response(ArgumentId(1), 0, 3, "x");
    req.span_end = None;
    let err = svc.submit_argument("alice", req).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
  }

  #[tokio::test]
  async fn span_without_parent_is_invalid() {
    let svc = service();
    let mut req = top_level("x");
    req.span_start = Some(0);
    req.span_end = Some(1);
    let err = svc.submit_argument("alice", req).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert_eq!(svc.store().argument_count(), 0);
  }

  #[tokio::test]
  async fn parent_without_span_posts_top_level() {
    let svc = service();
    let parent = svc.submit_argument("alice", top_level("hello")).await.unwrap();
    let mut req = top_level("unanchored");
    req.title = Some("Standalone".into());
    req.in_response_to = Some(parent);
    let id = svc.submit_argument("bob", req).await.unwrap();

    let view = svc.read_argument(id).await.unwrap();
    assert_eq!(view.argument.in_response_to, None);
    assert_eq!(view.argument.response_span, None);
    assert_eq!(view.argument.title.as_deref(), Some("Standalone"));
    assert_eq!(svc.latest_arguments().await.unwrap(), vec![id, parent]);
    assert!(svc.responses_to(parent).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn submit_asks_the_gateway_once() {
    let svc = service();
    svc.submit_argument("alice", top_level("X")).await.unwrap();
    assert_eq!(svc.gateway.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn authenticate_checks_the_token_only() {
    let svc = service();
    svc.authenticate("alice").await.unwrap();
    assert!(matches!(svc.authenticate("mallory").await, Err(Error::Unauthorized)));
    assert_eq!(
      svc.authenticate("down").await.unwrap_err().kind(),
      crate::ErrorKind::DependencyFailure
    );
  }

  #[tokio::test]
  async fn dangling_parent_accepted_by_default() {
    let svc = service();
    let id = svc
      .submit_argument("alice", response(ArgumentId(99), 0, 1, "orphan"))
      .await
      .unwrap();
    assert_eq!(svc.responses_to(ArgumentId(99)).await.unwrap(), vec![id]);
  }

  #[tokio::test]
  async fn verify_parent_rejects_missing_parent_and_overlong_span() {
    let svc = service().with_policy(SubmitPolicy { verify_parent: true });
    let err = svc
      .submit_argument("alice", response(ArgumentId(99), 0, 1, "orphan"))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    let parent = svc.submit_argument("alice", top_level("héllo")).await.unwrap();
    svc.submit_argument("bob", response(parent, 0, 5, "ok")).await.unwrap();
    let err = svc
      .submit_argument("bob", response(parent, 2, 6, "too far"))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
  }

  #[tokio::test]
  async fn tags_are_attached_once_each() {
    let svc = service();
    svc.create_tag("science".into()).await.unwrap();
    let tag = svc.list_tags().await.unwrap()[0];

    let mut req = top_level("tagged");
    req.tag_ids = vec![tag, tag];
    let id = svc.submit_argument("alice", req).await.unwrap();
    assert_eq!(svc.read_argument(id).await.unwrap().tag_ids, vec![tag]);
  }

  #[tokio::test]
  async fn gateway_outage_is_a_dependency_failure() {
    let svc = service();
    let err = svc.submit_argument("down", top_level("hi")).await.unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::DependencyFailure);
    let err = svc.toggle_vote("down", ArgumentId(1)).await.unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::DependencyFailure);
  }

  // ── Votes ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn toggle_twice_restores_count() {
    let svc = service();
    let a = svc.submit_argument("alice", top_level("X")).await.unwrap();

    assert_eq!(svc.toggle_vote("bob", a).await.unwrap(), VoteState::Cast);
    assert_eq!(svc.read_argument(a).await.unwrap().votes, 1);
    assert_eq!(svc.toggle_vote("bob", a).await.unwrap(), VoteState::Withdrawn);
    assert_eq!(svc.read_argument(a).await.unwrap().votes, 0);
  }

  #[tokio::test]
  async fn vote_with_invalid_token_is_unauthorized() {
    let svc = service();
    let a = svc.submit_argument("alice", top_level("X")).await.unwrap();
    let err = svc.toggle_vote("mallory", a).await.unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
    assert_eq!(svc.read_argument(a).await.unwrap().votes, 0);
  }

  // ── Reads ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn feeds_partition_and_descend() {
    let svc = service();
    let a = svc.submit_argument("alice", top_level("a")).await.unwrap();
    let b = svc.submit_argument("bob", top_level("b")).await.unwrap();
    let ra = svc.submit_argument("bob", response(a, 0, 1, "re a")).await.unwrap();
    let rb = svc.submit_argument("alice", response(b, 0, 1, "re b")).await.unwrap();
    let ra2 = svc.submit_argument("alice", response(a, 0, 1, "re a 2")).await.unwrap();

    assert_eq!(svc.latest_arguments().await.unwrap(), vec![b, a]);
    assert_eq!(svc.latest_responses().await.unwrap(), vec![ra2, rb, ra]);
    assert_eq!(svc.responses_to(a).await.unwrap(), vec![ra2, ra]);
    assert_eq!(svc.user_arguments(ALICE).await.unwrap(), vec![ra2, rb, a]);
  }

  #[tokio::test]
  async fn missing_entities_are_not_found() {
    let svc = service();
    let err = svc.read_argument(ArgumentId(7)).await.unwrap_err();
    assert!(matches!(err, Error::ArgumentNotFound(ArgumentId(7))));
    let err = svc.read_tag(TagId(7)).await.unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::NotFound);
  }

  #[tokio::test]
  async fn empty_tag_name_is_invalid() {
    let svc = service();
    let err = svc.create_tag(String::new()).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(svc.list_tags().await.unwrap().is_empty());
  }
}
