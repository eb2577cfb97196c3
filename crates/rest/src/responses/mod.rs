//! Response bodies shared by handlers and middleware.
//!
//! - [`problem`] - `application/problem+json` error bodies

pub mod problem;

pub use problem::{PROBLEM_JSON, ProblemDetail};
