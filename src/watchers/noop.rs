//! Watcher that never reports changes

use async_trait::async_trait;

use crate::core::{ConfigResult, ConfigSource, ConfigWatcher};

/// Watcher that does nothing
///
/// Useful for disabling hot reload in environments where the configuration is
/// immutable, without changing the builder wiring.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpWatcher;

impl NoOpWatcher {
    /// Create a new no-op watcher
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConfigWatcher for NoOpWatcher {
    async fn start_watching(&self, _sources: &[ConfigSource]) -> ConfigResult<()> {
        Ok(())
    }

    async fn stop_watching(&self) -> ConfigResult<()> {
        Ok(())
    }

    fn is_watching(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn never_reports_watching() {
        let watcher = NoOpWatcher::new();
        watcher
            .start_watching(&[ConfigSource::File("app.toml".into())])
            .await
            .unwrap();
        assert!(!watcher.is_watching());
        watcher.stop_watching().await.unwrap();
    }
}
