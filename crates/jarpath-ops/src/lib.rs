//! High-level operations over a [`session::Session`]: declaring
//! dependencies and build artifacts, managing remote repositories,
//! resolving, and querying or downloading the result.

pub mod ops_download;
pub mod ops_repository;
pub mod ops_resolve;
pub mod session;
