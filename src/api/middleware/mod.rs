//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Access logger: every request, public or not
//! 2. Auth validator: protected routes only, injects `AuthUser`

pub mod audit;
pub mod auth;
