//! Loader for inline configuration content

use async_trait::async_trait;
use std::path::PathBuf;

use crate::core::{ConfigError, ConfigLoader, ConfigResult, ConfigSource, SourceMetadata};
use crate::loaders::file::parse_content;

/// Loader for [`ConfigSource::Inline`] sources
///
/// Parses the embedded content with the same format parsers used for files.
/// Mostly useful for tests and for seeding configuration from compiled-in
/// strings.
#[derive(Debug, Clone, Default)]
pub struct InlineLoader;

impl InlineLoader {
    /// Create a new inline loader
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConfigLoader for InlineLoader {
    async fn load(&self, source: &ConfigSource) -> ConfigResult<serde_json::Value> {
        match source {
            ConfigSource::Inline { format, content } => {
                parse_content(content, format, &PathBuf::from("inline"))
            }
            _ => Err(ConfigError::source_error(
                "InlineLoader does not support this source type",
                source.name(),
            )),
        }
    }

    fn supports(&self, source: &ConfigSource) -> bool {
        matches!(source, ConfigSource::Inline { .. })
    }

    async fn metadata(&self, source: &ConfigSource) -> ConfigResult<SourceMetadata> {
        match source {
            ConfigSource::Inline { format, content } => Ok(SourceMetadata::new(source.clone())
                .with_format(format.clone())
                .with_size(content.len() as u64)
                .with_last_modified(chrono::Utc::now())),
            _ => Err(ConfigError::source_error(
                "InlineLoader does not support this source type",
                source.name(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConfigFormat;

    #[tokio::test]
    async fn parses_inline_toml() {
        let loader = InlineLoader::new();
        let source = ConfigSource::inline(ConfigFormat::Toml, "[app]\nname = \"demo\"\n");

        let value = loader.load(&source).await.unwrap();
        assert_eq!(value["app"]["name"], "demo");

        let meta = loader.metadata(&source).await.unwrap();
        assert_eq!(meta.format, Some(ConfigFormat::Toml));
    }

    #[tokio::test]
    async fn malformed_inline_content_is_a_parse_error() {
        let loader = InlineLoader::new();
        let source = ConfigSource::inline(ConfigFormat::Json, "{not json");

        assert!(matches!(
            loader.load(&source).await.unwrap_err(),
            ConfigError::ParseError { .. }
        ));
    }

    #[tokio::test]
    async fn rejects_other_sources() {
        let loader = InlineLoader::new();
        assert!(!loader.supports(&ConfigSource::Env));
        assert!(loader.load(&ConfigSource::Env).await.is_err());
    }
}
