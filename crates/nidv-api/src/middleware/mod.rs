//! # Middleware
//!
//! Request counting runs as an Axum `from_fn` layer. The per-credential
//! rate limiter needs the authenticated credential, so the request pipeline
//! consults it directly after authentication.

pub mod metrics;
pub mod rate_limit;
