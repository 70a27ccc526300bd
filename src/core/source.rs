//! Configuration source definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration source type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Environment variables
    Env,

    /// Environment variables with prefix
    EnvWithPrefix(String),

    /// Configuration file
    File(PathBuf),

    /// Configuration file with format auto-detection
    FileAuto(PathBuf),

    /// Configuration directory (load all files)
    Directory(PathBuf),

    /// Inline configuration content
    Inline {
        /// Format of the inline content
        format: ConfigFormat,
        /// Raw content
        content: String,
    },

    /// Default values
    Default,
}

impl ConfigSource {
    /// Create an inline source
    pub fn inline(format: ConfigFormat, content: impl Into<String>) -> Self {
        Self::Inline {
            format,
            content: content.into(),
        }
    }

    /// Check if this source is file-based
    pub fn is_file_based(&self) -> bool {
        matches!(
            self,
            ConfigSource::File(_) | ConfigSource::FileAuto(_) | ConfigSource::Directory(_)
        )
    }

    /// Check if this source is environment-based
    pub fn is_env_based(&self) -> bool {
        matches!(self, ConfigSource::Env | ConfigSource::EnvWithPrefix(_))
    }

    /// Check if this source is optional (can fail without aborting a build)
    pub fn is_optional(&self) -> bool {
        matches!(
            self,
            ConfigSource::Env | ConfigSource::EnvWithPrefix(_) | ConfigSource::Default
        )
    }

    /// Get the priority of this source (lower = loaded later = wins)
    pub fn priority(&self) -> u8 {
        match self {
            ConfigSource::Default => 100,
            ConfigSource::File(_) | ConfigSource::FileAuto(_) => 50,
            ConfigSource::Directory(_) => 40,
            ConfigSource::Env | ConfigSource::EnvWithPrefix(_) => 30,
            ConfigSource::Inline { .. } => 1,
        }
    }

    /// Get the source name for display
    pub fn name(&self) -> &'static str {
        match self {
            ConfigSource::Env => "environment",
            ConfigSource::EnvWithPrefix(_) => "environment (prefixed)",
            ConfigSource::File(_) => "file",
            ConfigSource::FileAuto(_) => "file (auto-detect)",
            ConfigSource::Directory(_) => "directory",
            ConfigSource::Inline { .. } => "inline",
            ConfigSource::Default => "default",
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Env => write!(f, "environment variables"),
            ConfigSource::EnvWithPrefix(prefix) => {
                write!(f, "environment variables (prefix: {prefix})")
            }
            ConfigSource::File(path) => write!(f, "file: {}", path.display()),
            ConfigSource::FileAuto(path) => write!(f, "file (auto): {}", path.display()),
            ConfigSource::Directory(path) => write!(f, "directory: {}", path.display()),
            ConfigSource::Inline { format, content } => {
                // Truncate on char boundaries, not byte offsets
                let preview: String = content.chars().take(50).collect();
                if preview.len() < content.len() {
                    write!(f, "inline {format}: {preview}...")
                } else {
                    write!(f, "inline {format}: {preview}")
                }
            }
            ConfigSource::Default => write!(f, "default values"),
        }
    }
}

/// Configuration source metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Source identifier
    pub source: ConfigSource,

    /// Last modified timestamp
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,

    /// Source version/ETag
    pub version: Option<String>,

    /// Source checksum
    pub checksum: Option<String>,

    /// Source size in bytes
    pub size: Option<u64>,

    /// Source format
    pub format: Option<ConfigFormat>,

    /// Additional metadata
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}

impl SourceMetadata {
    /// Create new source metadata
    pub fn new(source: ConfigSource) -> Self {
        Self {
            source,
            last_modified: None,
            version: None,
            checksum: None,
            size: None,
            format: None,
            extra: std::collections::HashMap::new(),
        }
    }

    /// Set last modified timestamp
    pub fn with_last_modified(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        self.last_modified = Some(timestamp);
        self
    }

    /// Set version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set checksum
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    /// Set size
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Set format
    pub fn with_format(mut self, format: ConfigFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Add extra metadata
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Configuration format
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigFormat {
    /// JSON format
    Json,

    /// TOML format
    Toml,

    /// YAML format
    Yaml,

    /// INI format
    Ini,

    /// Properties format
    Properties,

    /// Environment format
    Env,

    /// Unknown format
    Unknown(String),
}

impl ConfigFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &str {
        match self {
            ConfigFormat::Json => "json",
            ConfigFormat::Toml => "toml",
            ConfigFormat::Yaml => "yml",
            ConfigFormat::Ini => "ini",
            ConfigFormat::Properties => "properties",
            ConfigFormat::Env => "env",
            ConfigFormat::Unknown(ext) => ext,
        }
    }

    /// Get MIME type for this format
    pub fn mime_type(&self) -> &str {
        match self {
            ConfigFormat::Json => "application/json",
            ConfigFormat::Toml => "application/toml",
            ConfigFormat::Yaml => "application/x-yaml",
            ConfigFormat::Ini | ConfigFormat::Properties | ConfigFormat::Env => "text/plain",
            ConfigFormat::Unknown(_) => "application/octet-stream",
        }
    }

    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "json" => ConfigFormat::Json,
            "toml" => ConfigFormat::Toml,
            "yml" | "yaml" => ConfigFormat::Yaml,
            "ini" | "cfg" => ConfigFormat::Ini,
            "properties" | "props" => ConfigFormat::Properties,
            "env" => ConfigFormat::Env,
            _ => ConfigFormat::Unknown(ext.to_string()),
        }
    }

    /// Detect format from file path
    pub fn from_path(path: &std::path::Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(ConfigFormat::Unknown("no_extension".to_string()))
    }
}

impl std::fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigFormat::Json => write!(f, "JSON"),
            ConfigFormat::Toml => write!(f, "TOML"),
            ConfigFormat::Yaml => write!(f, "YAML"),
            ConfigFormat::Ini => write!(f, "INI"),
            ConfigFormat::Properties => write!(f, "Properties"),
            ConfigFormat::Env => write!(f, "Environment"),
            ConfigFormat::Unknown(s) => write!(f, "Unknown ({s})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_orders_defaults_below_overrides() {
        assert!(ConfigSource::Default.priority() > ConfigSource::File("a.toml".into()).priority());
        assert!(
            ConfigSource::File("a.toml".into()).priority() > ConfigSource::Env.priority(),
            "env overrides files"
        );
        let inline = ConfigSource::inline(ConfigFormat::Json, "{}");
        assert!(ConfigSource::Env.priority() > inline.priority());
    }

    #[test]
    fn inline_display_truncates_on_char_boundaries() {
        let content = format!("{}é plus more text beyond the preview window", "a".repeat(49));
        let source = ConfigSource::inline(ConfigFormat::Yaml, content);

        // 50th char is multi-byte; formatting must not split it
        let shown = source.to_string();
        assert!(shown.contains("inline"));
        assert!(shown.ends_with("..."));
        assert!(shown.contains('é'));

        let short = ConfigSource::inline(ConfigFormat::Json, "{}");
        assert!(!short.to_string().ends_with("..."));
    }

    #[test]
    fn format_detection_from_path() {
        use std::path::Path;

        assert_eq!(
            ConfigFormat::from_path(Path::new("app.toml")),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("deploy.yaml")),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("legacy.cfg")),
            ConfigFormat::Ini
        );
        assert!(matches!(
            ConfigFormat::from_path(Path::new("Makefile")),
            ConfigFormat::Unknown(_)
        ));
    }
}
