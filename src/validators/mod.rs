//! Configuration validator implementations

mod composite;
mod function;
mod noop;
mod schema;

pub use composite::CompositeValidator;
pub use function::{FunctionValidator, FunctionValidatorBuilder};
pub use noop::NoOpValidator;
pub use schema::SchemaValidator;

// Re-export trait from core for convenience
pub use crate::core::ConfigValidator;
