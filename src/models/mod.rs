pub mod chat;
pub mod enums;
pub mod report;
pub mod symptom;
pub mod user;

pub use chat::*;
pub use enums::*;
pub use report::*;
pub use symptom::*;
pub use user::*;

use chrono::{DateTime, Utc};

/// Current UTC time truncated to millisecond precision, the precision the
/// store keeps. Records returned from a write match what a later read yields.
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
