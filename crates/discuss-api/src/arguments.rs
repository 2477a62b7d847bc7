//! Handlers for argument, feed and vote endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/arguments` | Bearer token; body: [`SubmitBody`]; 201 + `{"id","status"}` |
//! | `GET`  | `/arguments/{id}` | Argument, tag ids and vote count |
//! | `GET`  | `/arguments/{id}/responses` | Direct responses, newest first |
//! | `POST` | `/arguments/{id}/vote` | Bearer token; toggles the caller's vote; 204 |
//! | `GET`  | `/feed/arguments` | Top-level arguments, newest first |
//! | `GET`  | `/feed/responses` | All responses, newest first |
//! | `GET`  | `/users/{id}/arguments` | Everything a user posted, newest first |

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
  argument::{ArgumentId, ArgumentView, UserId},
  identity::IdentityGateway,
  service::{ArgumentService, SubmitArgument},
  store::DiscussStore,
  tag::TagId,
};
use serde::Deserialize;
use serde_json::json;

use crate::{auth::BearerToken, error::ApiError};

type Service<S, G> = State<Arc<ArgumentService<S, G>>>;

// ─── Submit ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /arguments`.
///
/// Omitting both span offsets posts a top-level argument; giving both posts a
/// response to `in_response_to`.
#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  #[serde(default)]
  pub text:           String,
  pub title:          Option<String>,
  pub in_response_to: Option<ArgumentId>,
  pub span_start:     Option<u32>,
  pub span_end:       Option<u32>,
  #[serde(default)]
  pub tag_ids:        Vec<TagId>,
}

impl From<SubmitBody> for SubmitArgument {
  fn from(b: SubmitBody) -> Self {
    SubmitArgument {
      text:           b.text,
      title:          b.title,
      in_response_to: b.in_response_to,
      span_start:     b.span_start,
      span_end:       b.span_end,
      tag_ids:        b.tag_ids,
    }
  }
}

/// `POST /arguments`
pub async fn submit<S, G>(
  State(service): Service<S, G>,
  BearerToken(token): BearerToken,
  body: Result<Json<SubmitBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DiscussStore,
  G: IdentityGateway,
{
  // An unparseable body from an unknown caller is still a token problem.
  let Json(body) = match body {
    Ok(body) => body,
    Err(rejection) => {
      service.authenticate(&token).await?;
      return Err(rejection.into());
    }
  };
  let id = service.submit_argument(&token, body.into()).await?;
  Ok((StatusCode::CREATED, Json(json!({ "id": id, "status": "ok" }))))
}

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /arguments/{id}`
pub async fn get_one<S, G>(
  State(service): Service<S, G>,
  id: Result<Path<ArgumentId>, PathRejection>,
) -> Result<Json<ArgumentView>, ApiError>
where
  S: DiscussStore,
  G: IdentityGateway,
{
  let Path(id) = id?;
  Ok(Json(service.read_argument(id).await?))
}

// ─── Feeds ────────────────────────────────────────────────────────────────────

/// `GET /feed/arguments`
pub async fn latest<S, G>(
  State(service): Service<S, G>,
) -> Result<Json<Vec<ArgumentId>>, ApiError>
where
  S: DiscussStore,
  G: IdentityGateway,
{
  Ok(Json(service.latest_arguments().await?))
}

/// `GET /feed/responses`
pub async fn latest_responses<S, G>(
  State(service): Service<S, G>,
) -> Result<Json<Vec<ArgumentId>>, ApiError>
where
  S: DiscussStore,
  G: IdentityGateway,
{
  Ok(Json(service.latest_responses().await?))
}

/// `GET /arguments/{id}/responses`
pub async fn responses<S, G>(
  State(service): Service<S, G>,
  id: Result<Path<ArgumentId>, PathRejection>,
) -> Result<Json<Vec<ArgumentId>>, ApiError>
where
  S: DiscussStore,
  G: IdentityGateway,
{
  let Path(id) = id?;
  Ok(Json(service.responses_to(id).await?))
}

/// `GET /users/{id}/arguments`
pub async fn by_user<S, G>(
  State(service): Service<S, G>,
  user: Result<Path<UserId>, PathRejection>,
) -> Result<Json<Vec<ArgumentId>>, ApiError>
where
  S: DiscussStore,
  G: IdentityGateway,
{
  let Path(user) = user?;
  Ok(Json(service.user_arguments(user).await?))
}

// ─── Vote ─────────────────────────────────────────────────────────────────────

/// `POST /arguments/{id}/vote`: no body; answers 204 whichever way the
/// toggle went.
pub async fn vote<S, G>(
  State(service): Service<S, G>,
  BearerToken(token): BearerToken,
  id: Result<Path<ArgumentId>, PathRejection>,
) -> Result<StatusCode, ApiError>
where
  S: DiscussStore,
  G: IdentityGateway,
{
  let Path(id) = match id {
    Ok(id) => id,
    Err(rejection) => {
      service.authenticate(&token).await?;
      return Err(rejection.into());
    }
  };
  service.toggle_vote(&token, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
