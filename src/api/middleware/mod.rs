//! HTTP middleware.
//!
//! The audit layer wraps every route; CORS and request tracing come from
//! `tower-http` and are applied in the router.

pub mod audit;
