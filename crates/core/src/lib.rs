//! # Laragen Core
//!
//! Core types, traits, and error handling for Laragen.
//!
//! This crate provides the foundational building blocks shared by the
//! schema IR, the inference engine and the migration compiler:
//!
//! - **Types**: the column type vocabulary, referential actions and
//!   relationship kinds
//! - **Traits**: `Validatable` for consistency checks on inputs
//! - **Errors**: unified error handling with `EngineError` and `EngineResult`
//!

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{EngineError, EngineResult, ResultExt};
pub use traits::Validatable;
pub use types::{ColumnType, MorphCardinality, ReferentialAction, RelationKind};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
