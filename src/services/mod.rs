pub mod advisor;
pub mod heuristic;
pub mod providers;
pub mod validator;

pub use advisor::{Advisor, AdvisorSnapshot, AdvisorState, FallbackReason, IgnoreReason, Submission};
