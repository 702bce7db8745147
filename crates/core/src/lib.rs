//! # stampede-core
//!
//! Shared error taxonomy for stampede crates.
//!
//! A fan-out run has exactly one runtime failure mode: a task unit losing
//! its race against the shared deadline. That outcome travels as a value
//! over the errors channel rather than as an `Err` return, so this crate
//! exports the error type alone.

mod error;

pub use error::Error;
