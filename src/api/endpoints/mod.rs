//! Request handlers, one module per feature area.

pub mod health;
pub mod triage;
pub mod wellbeing;
