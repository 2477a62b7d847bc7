//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure leaves as `{"error": <message>, "code": <kind>}`, where
//! `code` is the [`ErrorKind`] of the underlying service error.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use discuss_core::{Error, ErrorKind};
use serde_json::json;

/// An error returned by an API handler.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub Error);

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match &self.0 {
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
      Error::ArgumentNotFound(_) | Error::TagNotFound(_) => StatusCode::NOT_FOUND,
      Error::Gateway(_) => StatusCode::BAD_GATEWAY,
      Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

// Extractor rejections answer with the same `{"error","code"}` body as
// service errors.

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    Self(Error::invalid(rejection.body_text()))
  }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self {
    Self(Error::invalid(rejection.body_text()))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let kind = self.0.kind();
    if kind == ErrorKind::DependencyFailure {
      tracing::warn!(error = %self.0, "dependency failure");
    }
    let body = json!({ "error": self.0.to_string(), "code": kind });
    (self.status(), Json(body)).into_response()
  }
}
