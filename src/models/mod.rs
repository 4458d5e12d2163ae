pub mod assessment;
pub mod enums;
pub mod question;
pub mod session;
pub mod triage_result;

pub use assessment::*;
pub use enums::*;
pub use question::*;
pub use session::*;
pub use triage_result::*;
