//! Single-flight artifact materialization.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use jarpath_core::coordinate::Coordinate;
use jarpath_core::provider::ArtifactMaterializer;
use jarpath_util::errors::JarpathError;
use tokio::sync::{Mutex, OnceCell, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

type Slot = Arc<OnceCell<PathBuf>>;

/// Serializes materialization per coordinate: the first caller performs it,
/// concurrent callers for the same coordinate wait and reuse its path.
/// Distinct coordinates proceed in parallel.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    slots: Arc<Mutex<HashMap<Coordinate, Slot>>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn materialize(
        &self,
        materializer: &dyn ArtifactMaterializer,
        coordinate: &Coordinate,
        timeout: Duration,
    ) -> Result<PathBuf, JarpathError> {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.entry(coordinate.clone()).or_default().clone()
        };
        slot.get_or_try_init(|| async {
            match tokio::time::timeout(timeout, materializer.materialize(coordinate)).await {
                Ok(Ok(path)) => Ok(path),
                Ok(Err(e)) => Err(attribute(coordinate, e)),
                Err(_) => Err(JarpathError::Materialization {
                    coordinate: coordinate.to_string(),
                    message: format!("timed out after {}s", timeout.as_secs()),
                }),
            }
        })
        .await
        .cloned()
    }

    /// Materialize `coordinates` concurrently, returning paths in input
    /// order. The first failure in input order is returned.
    pub async fn materialize_all(
        &self,
        materializer: Arc<dyn ArtifactMaterializer>,
        coordinates: &[Coordinate],
        concurrency: usize,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Vec<PathBuf>, JarpathError> {
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for (slot, coordinate) in coordinates.iter().cloned().enumerate() {
            let flight = self.clone();
            let materializer = materializer.clone();
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let run = async {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|_| JarpathError::Cancelled)?;
                    flight
                        .materialize(materializer.as_ref(), &coordinate, timeout)
                        .await
                };
                let result = tokio::select! {
                    _ = cancel.cancelled() => Err(JarpathError::Cancelled),
                    r = run => r,
                };
                (slot, result)
            });
        }

        let mut results: Vec<Option<Result<PathBuf, JarpathError>>> =
            (0..coordinates.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, result)) => results[slot] = Some(result),
                Err(e) => tracing::warn!("Materialization task failed: {e}"),
            }
        }

        results
            .into_iter()
            .zip(coordinates)
            .map(|(result, coordinate)| {
                result.unwrap_or_else(|| {
                    Err(JarpathError::Materialization {
                        coordinate: coordinate.to_string(),
                        message: "materialization task aborted".to_string(),
                    })
                })
            })
            .collect()
    }

    /// Forget every remembered path.
    pub async fn clear(&self) {
        self.slots.lock().await.clear();
    }
}

fn attribute(coordinate: &Coordinate, err: JarpathError) -> JarpathError {
    match err {
        JarpathError::Materialization { .. }
        | JarpathError::Transport { .. }
        | JarpathError::Cancelled => err,
        other => JarpathError::Materialization {
            coordinate: coordinate.to_string(),
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    struct Slow {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ArtifactMaterializer for Slow {
        async fn materialize(&self, coordinate: &Coordinate) -> Result<PathBuf, JarpathError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(PathBuf::from(format!("/cache/{}", coordinate.file_name())))
        }
    }

    #[tokio::test]
    async fn same_coordinate_is_materialized_once() {
        let slow = Arc::new(Slow {
            calls: AtomicUsize::new(0),
        });
        let lib = Coordinate::new("g", "lib", "1");
        let coords = vec![lib.clone(), lib.clone(), Coordinate::new("g", "other", "1")];

        let paths = SingleFlight::new()
            .materialize_all(
                slow.clone(),
                &coords,
                4,
                Duration::from_secs(5),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(paths[0], PathBuf::from("/cache/lib-1.jar"));
        assert_eq!(paths[0], paths[1]);
        assert_eq!(paths[2], PathBuf::from("/cache/other-1.jar"));
        assert_eq!(slow.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn slow_materializer_times_out() {
        let slow = Slow {
            calls: AtomicUsize::new(0),
        };
        let err = SingleFlight::new()
            .materialize(&slow, &Coordinate::new("g", "a", "1"), Duration::from_millis(1))
            .await
            .unwrap_err();
        assert!(matches!(err, JarpathError::Materialization { .. }));
    }

    #[tokio::test]
    async fn cancelled_token_stops_work() {
        let slow = Arc::new(Slow {
            calls: AtomicUsize::new(0),
        });
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = SingleFlight::new()
            .materialize_all(
                slow,
                &[Coordinate::new("g", "a", "1")],
                1,
                Duration::from_secs(5),
                &cancel,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, JarpathError::Cancelled));
    }
}
