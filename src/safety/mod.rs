//! Safety interception: emergency detection that runs before any other
//! interpretation of user input.

pub mod interceptor;

pub use interceptor::*;
