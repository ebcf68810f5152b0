//! Metadata cache shared by concurrent fetches within and across
//! resolutions.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use jarpath_core::coordinate::Coordinate;
use jarpath_core::dependency::DependencyEdge;
use jarpath_util::errors::JarpathError;
use tokio::sync::{Mutex, OnceCell};

type Slot = Arc<OnceCell<Arc<Vec<DependencyEdge>>>>;

/// Declared dependencies per coordinate.
///
/// Each coordinate is fetched at most once: concurrent callers for the same
/// coordinate wait on a single in-flight fetch. Failures are not cached, so
/// a later resolution retries them.
#[derive(Debug, Default)]
pub struct MetadataCache {
    slots: Mutex<HashMap<Coordinate, Slot>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_fetch<F, Fut>(
        &self,
        coordinate: &Coordinate,
        fetch: F,
    ) -> Result<Arc<Vec<DependencyEdge>>, JarpathError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<DependencyEdge>, JarpathError>>,
    {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.entry(coordinate.clone()).or_default().clone()
        };
        slot.get_or_try_init(|| async { fetch().await.map(Arc::new) })
            .await
            .cloned()
    }

    /// Cached edges for a coordinate, if already fetched.
    pub async fn get(&self, coordinate: &Coordinate) -> Option<Arc<Vec<DependencyEdge>>> {
        let slots = self.slots.lock().await;
        slots.get(coordinate).and_then(|slot| slot.get().cloned())
    }

    pub async fn clear(&self) {
        self.slots.lock().await.clear();
    }
}
