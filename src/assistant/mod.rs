//! Placeholder "AI": static, data-driven lookups with no inference.
//!
//! - `ResponseEngine`: chat replies (keyword rules today, swappable later)
//! - `assessment`: symptom → conditions, actions, urgency
//! - `solutions`: symptom → immediate aid
//! - `analysis`: fixed report analysis and scan results

pub mod analysis;
pub mod assessment;
pub mod rules;
pub mod solutions;

pub use analysis::*;
pub use assessment::*;
pub use rules::*;
pub use solutions::*;

/// Produces chatbot turns. Implementations must be deterministic for a given
/// input and safe to share across request tasks.
pub trait ResponseEngine: Send + Sync {
    /// Seed message placed at the start of every new conversation.
    fn greeting(&self) -> String;

    /// Bot reply to a user message.
    fn reply(&self, message: &str) -> String;
}
