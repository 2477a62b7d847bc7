//! JSON API for Discuss.
//!
//! Exposes an axum [`Router`] backed by an [`ArgumentService`]. TLS and
//! transport concerns are the caller's responsibility; token validation is
//! the service's.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", discuss_api::api_router(service.clone()))
//! ```

pub mod arguments;
pub mod auth;
pub mod error;
pub mod tags;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use discuss_core::{
  identity::IdentityGateway, service::ArgumentService, store::DiscussStore,
};

pub use error::ApiError;

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, G>(service: Arc<ArgumentService<S, G>>) -> Router<()>
where
  S: DiscussStore + 'static,
  G: IdentityGateway + 'static,
{
  Router::new()
    // Arguments
    .route("/arguments", post(arguments::submit::<S, G>))
    .route("/arguments/{id}", get(arguments::get_one::<S, G>))
    .route("/arguments/{id}/responses", get(arguments::responses::<S, G>))
    .route("/arguments/{id}/vote", post(arguments::vote::<S, G>))
    .route("/users/{id}/arguments", get(arguments::by_user::<S, G>))
    // Feeds
    .route("/feed/arguments", get(arguments::latest::<S, G>))
    .route("/feed/responses", get(arguments::latest_responses::<S, G>))
    // Tags
    .route("/tags", get(tags::list::<S, G>).post(tags::create::<S, G>))
    .route("/tags/{id}", get(tags::get_one::<S, G>))
    .with_state(service)
}

// ─── Integration tests ────────────────────────────────────────────────────────
