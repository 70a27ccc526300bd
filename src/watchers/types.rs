//! Watch event types shared by watcher implementations

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ConfigSource;

/// Kind of change observed on a watched source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigWatchEventType {
    /// Source appeared
    Created,
    /// Source content changed
    Modified,
    /// Source disappeared
    Deleted,
    /// Source was renamed
    Renamed {
        /// Previous path
        from: PathBuf,
        /// New path
        to: PathBuf,
    },
    /// Watcher-level error
    Error,
    /// Unclassified change
    Other,
}

impl ConfigWatchEventType {
    /// Whether this event represents a watcher failure
    pub fn is_error(&self) -> bool {
        matches!(self, ConfigWatchEventType::Error)
    }

    /// Whether this event should trigger a reload
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            ConfigWatchEventType::Created
                | ConfigWatchEventType::Modified
                | ConfigWatchEventType::Deleted
                | ConfigWatchEventType::Renamed { .. }
        )
    }
}

/// Change notification delivered to watch callbacks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWatchEvent {
    /// What happened
    pub event_type: ConfigWatchEventType,

    /// Source the event belongs to
    pub source: ConfigSource,

    /// Affected path, when the source is file-based
    pub path: Option<PathBuf>,

    /// When the event was observed
    pub timestamp: DateTime<Utc>,

    /// Extra watcher-specific detail
    pub metadata: Option<serde_json::Value>,
}

impl ConfigWatchEvent {
    /// Create a new watch event
    pub fn new(event_type: ConfigWatchEventType, source: ConfigSource) -> Self {
        Self {
            event_type,
            source,
            path: None,
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    /// Attach the affected path
    #[must_use = "builder methods must be chained or built"]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach watcher-specific metadata
    #[must_use = "builder methods must be chained or built"]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Callback invoked for every observed change
pub type WatchCallback = Arc<dyn Fn(&ConfigWatchEvent) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_classification() {
        assert!(ConfigWatchEventType::Modified.is_change());
        assert!(ConfigWatchEventType::Deleted.is_change());
        assert!(!ConfigWatchEventType::Error.is_change());
        assert!(ConfigWatchEventType::Error.is_error());
        assert!(!ConfigWatchEventType::Other.is_change());
    }

    #[test]
    fn events_carry_source_and_path() {
        let event = ConfigWatchEvent::new(
            ConfigWatchEventType::Modified,
            ConfigSource::File("app.toml".into()),
        )
        .with_path("app.toml");

        assert_eq!(event.path.as_deref(), Some(std::path::Path::new("app.toml")));
        assert!(event.event_type.is_change());
    }
}
