//! Risk scoring, fusion and action selection for the companion chat flow.

pub mod actions;
pub mod fusion;
pub mod keywords;

pub use actions::select_actions;
pub use fusion::{fuse, reply_override, ExternalSignal, CRISIS_MESSAGE};
pub use keywords::{level_for_score, score_text, KeywordScore};
