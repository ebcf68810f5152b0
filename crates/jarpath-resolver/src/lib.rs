//! Dependency resolution engine: breadth-first collection, nearest-wins
//! conflict resolution, build artifact overlay, and graph export.

pub mod cache;
pub mod collector;
pub mod conflict;
pub mod context;
pub mod export;
pub mod graph;
pub mod materialize;
pub mod overlay;
