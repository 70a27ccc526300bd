//! Configuration loader implementations

mod composite;
mod env;
mod file;
mod inline;

pub use composite::CompositeLoader;
pub use env::EnvLoader;
pub use file::FileLoader;
pub use inline::InlineLoader;

pub(crate) use file::parse_content;

// Re-export trait from core for convenience
pub use crate::core::ConfigLoader;
