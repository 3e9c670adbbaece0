//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints.

pub mod call;
pub mod health;
pub mod message;
