use crate::{AssetError, AssetId, AssetStore, Loader};
use serde::Serialize;

/// Lifecycle callbacks for a load batch. Every method defaults to a no-op.
pub trait LoadObserver {
    /// The batch began; fired once, before the first item.
    fn on_start(&mut self, _uri: &str, _loaded: usize, _total: usize) {}
    /// One item finished, successfully or not.
    fn on_progress(&mut self, _uri: &str, _loaded: usize, _total: usize) {}
    /// Every item finished; fired once.
    fn on_load(&mut self) {}
    fn on_error(&mut self, _uri: &str, _error: &AssetError) {}
}

impl LoadObserver for () {}

/// Observer that reports batch progress through `tracing`.
#[derive(Debug, Default)]
pub struct ProgressLog;

impl LoadObserver for ProgressLog {
    fn on_progress(&mut self, uri: &str, loaded: usize, total: usize) {
        tracing::info!(uri, loaded, total, "loading");
    }

    fn on_load(&mut self) {
        tracing::info!("loading finished");
    }
}

/// Result of one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub loaded: Vec<AssetId>,
    /// `(uri, reason)` per failed item.
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.loaded.len() + self.failed.len()
    }
}

/// Drives batches of loads and reports their lifecycle to an observer.
#[derive(Debug, Default)]
pub struct LoadingManager {
    batches: u64,
}

impl LoadingManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches started so far.
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Load every URI in order, storing successes in `store`.
    ///
    /// Items are awaited one at a time on the caller's task. An empty batch
    /// fires no callbacks.
    pub async fn load_batch<L: Loader>(
        &mut self,
        loader: &L,
        uris: &[String],
        store: &mut AssetStore,
        observer: &mut dyn LoadObserver,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let total = uris.len();
        let Some(first) = uris.first() else {
            return report;
        };
        self.batches += 1;
        tracing::info!(batch = self.batches, total, "load batch started");
        observer.on_start(first, 0, total);

        for (i, uri) in uris.iter().enumerate() {
            match loader.load(uri).await {
                Ok(asset) => {
                    report.loaded.push(store.insert(asset));
                }
                Err(err) => {
                    tracing::warn!(uri, %err, "asset failed to load");
                    observer.on_error(uri, &err);
                    report.failed.push((uri.clone(), err.to_string()));
                }
            }
            observer.on_progress(uri, i + 1, total);
        }

        observer.on_load();
        tracing::info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "load batch complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoadedAsset;

    struct FakeLoader;

    impl Loader for FakeLoader {
        async fn load(&self, uri: &str) -> Result<LoadedAsset, AssetError> {
            if uri.contains("missing") {
                Err(AssetError::NotFound(uri.to_string()))
            } else {
                Ok(LoadedAsset::new(uri, uri.as_bytes().to_vec()))
            }
        }
    }

    #[derive(Default)]
    struct Log(Vec<String>);

    impl LoadObserver for Log {
        fn on_start(&mut self, uri: &str, loaded: usize, total: usize) {
            self.0.push(format!("start {uri} {loaded}/{total}"));
        }
        fn on_progress(&mut self, uri: &str, loaded: usize, total: usize) {
            self.0.push(format!("progress {uri} {loaded}/{total}"));
        }
        fn on_load(&mut self) {
            self.0.push("load".into());
        }
        fn on_error(&mut self, uri: &str, _error: &AssetError) {
            self.0.push(format!("error {uri}"));
        }
    }

    fn uris(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn lifecycle_order() {
        let mut manager = LoadingManager::new();
        let mut store = AssetStore::new();
        let mut log = Log::default();
        let batch = uris(&["a.png", "missing.png", "b.jpg"]);
        let report = pollster::block_on(manager.load_batch(&FakeLoader, &batch, &mut store, &mut log));

        assert_eq!(
            log.0,
            vec![
                "start a.png 0/3",
                "progress a.png 1/3",
                "error missing.png",
                "progress missing.png 2/3",
                "progress b.jpg 3/3",
                "load",
            ]
        );
        assert_eq!(report.loaded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.total(), 3);
        assert_eq!(store.len(), 2);
        assert!(store.get_by_uri("a.png").is_some());
    }

    #[test]
    fn start_and_load_once_per_batch() {
        let mut manager = LoadingManager::new();
        let mut store = AssetStore::new();
        let mut log = Log::default();
        for _ in 0..2 {
            let batch = uris(&["a.png", "b.png"]);
            pollster::block_on(manager.load_batch(&FakeLoader, &batch, &mut store, &mut log));
        }
        let starts = log.0.iter().filter(|l| l.starts_with("start")).count();
        let loads = log.0.iter().filter(|l| *l == "load").count();
        assert_eq!((starts, loads), (2, 2));
        assert_eq!(manager.batches(), 2);
    }

    #[test]
    fn empty_batch_is_silent() {
        let mut manager = LoadingManager::new();
        let mut store = AssetStore::new();
        let mut log = Log::default();
        let report = pollster::block_on(manager.load_batch(&FakeLoader, &[], &mut store, &mut log));
        assert!(log.0.is_empty());
        assert_eq!(report.total(), 0);
        assert_eq!(manager.batches(), 0);
    }
}
