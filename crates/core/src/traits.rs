//! Core traits for Laragen
//!
//! This module defines the traits that inputs implement to report their
//! internal consistency before the compiler consumes them.

use crate::error::EngineResult;

// ============================================================================
// Validatable Trait
// ============================================================================

/// Trait for types that can be validated
///
/// Types implementing this trait can check their internal consistency
/// and return an error if the state is invalid.
///
/// # Example
///
/// ```rust,ignore
/// use laragen_core::{Validatable, EngineResult, EngineError};
///
/// struct MorphSuffixes {
///     id: String,
///     kind: String,
/// }
///
/// impl Validatable for MorphSuffixes {
///     fn validate(&self) -> EngineResult<()> {
///         if self.id.is_empty() || self.kind.is_empty() {
///             return Err(EngineError::config("morph suffixes must not be empty"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validatable {
    /// Validate the current state of the object
    ///
    /// Returns `Ok(())` if valid, or an `EngineError` describing the problem.
    fn validate(&self) -> EngineResult<()>;

    /// Check if the object is valid without returning error details
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Get all validation errors (for types that can have multiple errors)
    fn validation_errors(&self) -> Vec<String> {
        match self.validate() {
            Ok(()) => vec![],
            Err(e) => vec![e.to_string()],
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
