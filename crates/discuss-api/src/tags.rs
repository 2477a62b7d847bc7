//! Handlers for `/tags` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/tags` | All tag ids, insertion order |
//! | `POST` | `/tags` | Body: `{"name":"science"}`; 201, no id echoed |
//! | `GET`  | `/tags/{id}` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use discuss_core::{
  identity::IdentityGateway,
  service::ArgumentService,
  store::DiscussStore,
  tag::{Tag, TagId},
};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /tags`
pub async fn list<S, G>(
  State(service): State<Arc<ArgumentService<S, G>>>,
) -> Result<Json<Vec<TagId>>, ApiError>
where
  S: DiscussStore,
  G: IdentityGateway,
{
  Ok(Json(service.list_tags().await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name: String,
}

/// `POST /tags`, body: `{"name":"science"}`
pub async fn create<S, G>(
  State(service): State<Arc<ArgumentService<S, G>>>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DiscussStore,
  G: IdentityGateway,
{
  let Json(body) = body?;
  service.create_tag(body.name).await?;
  Ok((StatusCode::CREATED, Json(json!({ "status": "ok" }))))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /tags/{id}`
pub async fn get_one<S, G>(
  State(service): State<Arc<ArgumentService<S, G>>>,
  id: Result<Path<TagId>, PathRejection>,
) -> Result<Json<Tag>, ApiError>
where
  S: DiscussStore,
  G: IdentityGateway,
{
  let Path(id) = id?;
  Ok(Json(service.read_tag(id).await?))
}
