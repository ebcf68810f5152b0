//! Core data types for jarpath.
//!
//! This crate defines the vocabulary shared by every other jarpath crate:
//! artifact coordinates and their textual notation, dependency scopes and
//! their propagation rules, dependency edges, locally built artifacts,
//! resolution configuration, and the narrow collaborator traits through
//! which metadata and artifact files are obtained.
//!
//! Nothing here performs network I/O; the collaborator traits are
//! implemented elsewhere.

/// Packaging type assumed when a notation omits it.
pub const DEFAULT_PACKAGING: &str = "jar";

pub mod artifact;
pub mod config;
pub mod coordinate;
pub mod dependency;
pub mod provider;
pub mod scope;
