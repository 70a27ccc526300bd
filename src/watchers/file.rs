//! Filesystem-notification based watcher

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;

use crate::core::{ConfigError, ConfigResult, ConfigSource, ConfigWatcher};
use crate::watchers::types::{ConfigWatchEvent, ConfigWatchEventType, WatchCallback};

/// Watcher backed by OS filesystem notifications
///
/// Watches the file-based sources of a configuration and invokes registered
/// callbacks when they change. Rapid event bursts from editors are collapsed
/// with a per-path debounce window.
pub struct FileWatcher {
    debounce: Duration,
    callbacks: Arc<RwLock<Vec<WatchCallback>>>,
    watching: Arc<AtomicBool>,
    inner: Mutex<Option<RecommendedWatcher>>,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("debounce", &self.debounce)
            .field("watching", &self.is_watching())
            .field("callbacks", &self.callbacks.read().len())
            .finish()
    }
}

impl FileWatcher {
    /// Create a new file watcher with a 500ms debounce window
    pub fn new() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            callbacks: Arc::new(RwLock::new(Vec::new())),
            watching: Arc::new(AtomicBool::new(false)),
            inner: Mutex::new(None),
        }
    }

    /// Set the debounce window for collapsing event bursts
    #[must_use = "builder methods must be chained or built"]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Register a callback invoked for every observed change
    pub fn on_change<F>(&self, callback: F)
    where
        F: Fn(&ConfigWatchEvent) + Send + Sync + 'static,
    {
        self.callbacks.write().push(Arc::new(callback));
    }

    fn collect_routes(sources: &[ConfigSource]) -> Vec<(PathBuf, ConfigSource)> {
        sources
            .iter()
            .filter_map(|source| match source {
                ConfigSource::File(path)
                | ConfigSource::FileAuto(path)
                | ConfigSource::Directory(path) => Some((path.clone(), source.clone())),
                _ => None,
            })
            .collect()
    }

    fn setup(
        &self,
        routes: &[(PathBuf, ConfigSource)],
    ) -> ConfigResult<(
        RecommendedWatcher,
        tokio::sync::mpsc::UnboundedReceiver<Result<notify::Event, notify::Error>>,
    )> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;

        for (path, source) in routes {
            let mode = if matches!(source, ConfigSource::Directory(_)) {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };
            watcher.watch(path, mode)?;
            tracing::debug!(path = %path.display(), "Watching path");
        }

        Ok((watcher, rx))
    }

    fn spawn_processor(
        &self,
        routes: Vec<(PathBuf, ConfigSource)>,
        mut rx: tokio::sync::mpsc::UnboundedReceiver<Result<notify::Event, notify::Error>>,
    ) {
        let callbacks = Arc::clone(&self.callbacks);
        let watching = Arc::clone(&self.watching);
        let debounce = self.debounce;

        tokio::spawn(async move {
            let mut last_seen: HashMap<PathBuf, Instant> = HashMap::new();

            while let Some(res) = rx.recv().await {
                if !watching.load(Ordering::SeqCst) {
                    break;
                }

                let event = match res {
                    Ok(raw) => match classify(&raw, &routes) {
                        Some(event) => event,
                        None => continue,
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "Filesystem watcher error");
                        let source = routes
                            .first()
                            .map_or(ConfigSource::Default, |(_, s)| s.clone());
                        ConfigWatchEvent::new(ConfigWatchEventType::Error, source)
                            .with_metadata(serde_json::json!({"error": e.to_string()}))
                    }
                };

                if let Some(path) = &event.path {
                    let now = Instant::now();
                    let suppressed = last_seen
                        .get(path)
                        .is_some_and(|seen| now.duration_since(*seen) < debounce);
                    if suppressed {
                        continue;
                    }
                    last_seen.insert(path.clone(), now);
                }

                tracing::debug!(event = ?event.event_type, "Configuration change detected");

                let snapshot: Vec<WatchCallback> = callbacks.read().clone();
                for callback in &snapshot {
                    callback(&event);
                }
            }

            tracing::debug!("File watch processor stopped");
        });
    }
}

impl Default for FileWatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a raw notification onto a watch event, routed to its source
fn classify(
    raw: &notify::Event,
    routes: &[(PathBuf, ConfigSource)],
) -> Option<ConfigWatchEvent> {
    let path = raw.paths.first()?;

    let source = routes
        .iter()
        .find(|(watched, _)| path == watched || path.starts_with(watched))
        .or_else(|| routes.first())
        .map(|(_, source)| source.clone())?;

    let event_type = match raw.kind {
        EventKind::Create(_) => ConfigWatchEventType::Created,
        EventKind::Remove(_) => ConfigWatchEventType::Deleted,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            if let [from, to] = raw.paths.as_slice() {
                ConfigWatchEventType::Renamed {
                    from: from.clone(),
                    to: to.clone(),
                }
            } else {
                ConfigWatchEventType::Modified
            }
        }
        EventKind::Modify(_) => ConfigWatchEventType::Modified,
        // Reads are noise
        EventKind::Access(_) => return None,
        _ => ConfigWatchEventType::Other,
    };

    Some(ConfigWatchEvent::new(event_type, source).with_path(path.clone()))
}

#[async_trait]
impl ConfigWatcher for FileWatcher {
    async fn start_watching(&self, sources: &[ConfigSource]) -> ConfigResult<()> {
        if self.watching.swap(true, Ordering::SeqCst) {
            return Err(ConfigError::watch_error("Watcher is already running"));
        }

        let routes = Self::collect_routes(sources);
        if routes.is_empty() {
            self.watching.store(false, Ordering::SeqCst);
            return Err(ConfigError::watch_error(
                "No file-based sources to watch",
            ));
        }

        match self.setup(&routes) {
            Ok((watcher, rx)) => {
                *self.inner.lock() = Some(watcher);
                self.spawn_processor(routes, rx);
                Ok(())
            }
            Err(e) => {
                self.watching.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    async fn stop_watching(&self) -> ConfigResult<()> {
        self.watching.store(false, Ordering::SeqCst);
        // Dropping the OS watcher closes the event channel and ends the task
        *self.inner.lock() = None;
        Ok(())
    }

    fn is_watching(&self) -> bool {
        self.watching.load(Ordering::SeqCst)
    }
}
