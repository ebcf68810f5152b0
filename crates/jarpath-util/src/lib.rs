//! Shared utilities for jarpath.
//!
//! This crate provides cross-cutting concerns used by all other jarpath crates:
//! the error taxonomy, filesystem helpers, and terminal status and progress
//! indicators.

pub mod errors;
pub mod fs;
pub mod progress;
