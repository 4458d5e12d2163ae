//! HTTP surface for the triage engine and wellbeing service.
//!
//! `build_router()` returns a composable `Router`; `server` owns the
//! listener lifecycle.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::build_router;
pub use server::{serve_until_ctrl_c, start, ApiServer, ServerError};
pub use types::ApiContext;
