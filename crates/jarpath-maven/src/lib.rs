//! Maven repository transport: POM parsing, artifact download, checksum
//! verification, local cache, and authentication. Provides the metadata
//! provider, descriptor reader and artifact materializer used by resolution.

pub mod auth;
pub mod cache;
pub mod checksum;
pub mod download;
pub mod materialize;
pub mod pom;
pub mod provider;
pub mod repository;
