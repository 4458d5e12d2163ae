//! Symptom triage: signal extraction, priority classification, question
//! catalog and routing, and the final advisory content.

pub mod classify;
pub mod questions;
pub mod router;
pub mod signals;
pub mod summary;

pub use classify::{classify, Classification};
pub use questions::{QuestionCatalog, CONTINUE_QUESTION_ID};
pub use router::{QuestionRouter, RouterDecision, RouterState, Trigger};
pub use summary::final_result;
