//! Core types and trait definitions for the Discuss argument service.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`store::DiscussStore`], token validators implement
//! [`identity::IdentityGateway`], and [`service::ArgumentService`] ties the two
//! together into the operations exposed by the API.

pub mod argument;
pub mod error;
pub mod identity;
pub mod service;
pub mod store;
pub mod tag;
pub mod vote;

pub use error::{Error, ErrorKind, Result};
