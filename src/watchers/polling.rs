//! Interval-based metadata polling watcher

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::{
    ConfigError, ConfigLoader, ConfigResult, ConfigSource, ConfigWatcher, SourceMetadata,
};
use crate::watchers::types::{ConfigWatchEvent, ConfigWatchEventType, WatchCallback};

/// Watcher that polls source metadata on an interval
///
/// Works on filesystems where OS notifications are unreliable (network mounts,
/// some containers). Compares the loader-reported metadata between ticks and
/// reports created, modified and deleted sources.
pub struct PollingWatcher {
    interval: Duration,
    loader: Arc<dyn ConfigLoader>,
    callbacks: Arc<RwLock<Vec<WatchCallback>>>,
    watching: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for PollingWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingWatcher")
            .field("interval", &self.interval)
            .field("watching", &self.is_watching())
            .finish()
    }
}

impl PollingWatcher {
    /// Create a new polling watcher
    pub fn new(loader: Arc<dyn ConfigLoader>, interval: Duration) -> Self {
        Self {
            interval,
            loader,
            callbacks: Arc::new(RwLock::new(Vec::new())),
            watching: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
        }
    }

    /// Register a callback invoked for every observed change
    pub fn on_change<F>(&self, callback: F)
    where
        F: Fn(&ConfigWatchEvent) + Send + Sync + 'static,
    {
        self.callbacks.write().push(Arc::new(callback));
    }

    fn check_interval(&self) -> ConfigResult<()> {
        if self.interval.is_zero() {
            return Err(ConfigError::invalid_argument(
                "Polling interval must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn metadata_changed(previous: &SourceMetadata, current: &SourceMetadata) -> bool {
    previous.last_modified != current.last_modified
        || previous.size != current.size
        || previous.checksum != current.checksum
}

fn dispatch(callbacks: &RwLock<Vec<WatchCallback>>, event: &ConfigWatchEvent) {
    let snapshot: Vec<WatchCallback> = callbacks.read().clone();
    for callback in &snapshot {
        callback(event);
    }
}

#[async_trait]
impl ConfigWatcher for PollingWatcher {
    async fn start_watching(&self, sources: &[ConfigSource]) -> ConfigResult<()> {
        self.check_interval()?;

        let sources: Vec<ConfigSource> = sources
            .iter()
            .filter(|s| s.is_file_based())
            .cloned()
            .collect();
        if sources.is_empty() {
            return Err(ConfigError::watch_error("No file-based sources to poll"));
        }

        if self.watching.swap(true, Ordering::SeqCst) {
            return Err(ConfigError::watch_error("Watcher is already running"));
        }

        let loader = Arc::clone(&self.loader);
        let callbacks = Arc::clone(&self.callbacks);
        let watching = Arc::clone(&self.watching);
        let interval = self.interval;

        // Take the baseline before returning so changes made right after
        // start_watching are not missed.
        let mut snapshots: HashMap<ConfigSource, Option<SourceMetadata>> = HashMap::new();
        for source in &sources {
            snapshots.insert(source.clone(), loader.metadata(source).await.ok());
        }

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if !watching.load(Ordering::SeqCst) {
                    break;
                }

                for source in &sources {
                    let current = loader.metadata(source).await.ok();
                    let previous = snapshots.get(source).cloned().flatten();

                    let event_type = match (&previous, &current) {
                        (None, Some(_)) => Some(ConfigWatchEventType::Created),
                        (Some(_), None) => Some(ConfigWatchEventType::Deleted),
                        (Some(prev), Some(cur)) if metadata_changed(prev, cur) => {
                            Some(ConfigWatchEventType::Modified)
                        }
                        _ => None,
                    };

                    snapshots.insert(source.clone(), current);

                    if let Some(event_type) = event_type {
                        tracing::debug!(source = %source, event = ?event_type, "Poll detected change");
                        let event = ConfigWatchEvent::new(event_type, source.clone());
                        dispatch(&callbacks, &event);
                    }
                }
            }

            tracing::debug!("Polling watcher stopped");
        });

        *self.task.lock() = Some(handle);
        Ok(())
    }

    async fn stop_watching(&self) -> ConfigResult<()> {
        self.watching.store(false, Ordering::SeqCst);
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
        Ok(())
    }

    fn is_watching(&self) -> bool {
        self.watching.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loaders::FileLoader;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let watcher = PollingWatcher::new(Arc::new(FileLoader::new()), Duration::ZERO);
        let err = watcher
            .start_watching(&[ConfigSource::File("app.toml".into())])
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn env_only_sources_are_rejected() {
        let watcher =
            PollingWatcher::new(Arc::new(FileLoader::new()), Duration::from_millis(10));
        let err = watcher.start_watching(&[ConfigSource::Env]).await.unwrap_err();
        assert!(matches!(err, ConfigError::WatchError { .. }));
    }

    #[tokio::test]
    async fn reports_deleted_and_recreated_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.json");
        tokio::fs::write(&path, "{\"a\": 1}").await.unwrap();

        let watcher =
            PollingWatcher::new(Arc::new(FileLoader::new()), Duration::from_millis(50));

        let deletions = Arc::new(AtomicUsize::new(0));
        let creations = Arc::new(AtomicUsize::new(0));
        let d = Arc::clone(&deletions);
        let c = Arc::clone(&creations);
        watcher.on_change(move |event| match event.event_type {
            ConfigWatchEventType::Deleted => {
                d.fetch_add(1, Ordering::SeqCst);
            }
            ConfigWatchEventType::Created => {
                c.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        });

        watcher
            .start_watching(&[ConfigSource::File(path.clone())])
            .await
            .unwrap();

        tokio::fs::remove_file(&path).await.unwrap();
        let mut waited = Duration::ZERO;
        while deletions.load(Ordering::SeqCst) == 0 && waited < Duration::from_secs(5) {
            tokio::time::sleep(Duration::from_millis(50)).await;
            waited += Duration::from_millis(50);
        }
        assert_eq!(deletions.load(Ordering::SeqCst), 1);

        tokio::fs::write(&path, "{\"a\": 2}").await.unwrap();
        waited = Duration::ZERO;
        while creations.load(Ordering::SeqCst) == 0 && waited < Duration::from_secs(5) {
            tokio::time::sleep(Duration::from_millis(50)).await;
            waited += Duration::from_millis(50);
        }
        assert_eq!(creations.load(Ordering::SeqCst), 1);

        watcher.stop_watching().await.unwrap();
        assert!(!watcher.is_watching());
    }
}
