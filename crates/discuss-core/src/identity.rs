//! The `IdentityGateway` trait.
//!
//! Tokens are opaque to this service. A gateway either answers with a verdict
//! or with the user the token belongs to; an invalid token resolves to `None`.
//! Transport failures are errors, never a negative verdict.

use std::future::Future;

use crate::argument::UserId;

pub trait IdentityGateway: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Whether `token` is currently valid.
  fn validate<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// The user `token` belongs to, or `None` if the token is not valid.
  fn resolve<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<Option<UserId>, Self::Error>> + Send + 'a;
}
