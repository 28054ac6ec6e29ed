//! Runners: handlers that interpret effect signatures with a concrete
//! backend.

pub mod algebra;
pub mod bigraph;

pub use algebra::{substitute, substitute_term, Runner, RunnerError};
