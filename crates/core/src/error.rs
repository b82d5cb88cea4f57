//! Error types for Laragen
//!
//! This module provides unified error handling across the compiler,
//! covering schema inconsistencies, directive parsing, rule contracts,
//! dependency cycles, configuration and IO.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Laragen
#[derive(Debug, Error)]
pub enum EngineError {
    // ========================================================================
    // Schema Errors
    // ========================================================================
    /// The schema document contradicts itself (dangling relation, missing counterpart)
    #[error("Schema inconsistency in model '{model}': {message}")]
    SchemaInconsistency { model: String, message: String },

    /// A model referenced by name does not exist in the document
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// A field referenced by name does not exist on its model
    #[error("Field '{field}' not found in model '{model}'")]
    FieldNotFound { model: String, field: String },

    // ========================================================================
    // Directive Errors
    // ========================================================================
    /// A documentation directive has a malformed body
    #[error("Malformed directive '@{directive}': {message}")]
    Directive { directive: String, message: String },

    // ========================================================================
    // Rule Errors
    // ========================================================================
    /// A caller-supplied rule violates the rule contract
    #[error("Rule '{rule}' rejected: {message}")]
    RuleContract { rule: String, message: String },

    // ========================================================================
    // Ordering Errors
    // ========================================================================
    /// Owning foreign keys form a cycle; no valid migration order exists
    #[error(
        "Dependency cycle between tables [{}]; edges: [{}]",
        .stuck.join(", "),
        .edges.iter().map(|(from, to)| format!("{} -> {}", from, to)).collect::<Vec<_>>().join(", ")
    )]
    DependencyCycle {
        stuck: Vec<String>,
        edges: Vec<(String, String)>,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// TOML configuration could not be parsed
    #[error("TOML deserialization error: {0}")]
    TomlDeserialization(#[from] toml::de::Error),

    // ========================================================================
    // IO Errors
    // ========================================================================
    /// File IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File read error
    #[error("Failed to read file '{path}': {message}")]
    FileRead { path: PathBuf, message: String },

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },
}

impl EngineError {
    /// Create a schema inconsistency error
    pub fn inconsistency(model: impl Into<String>, msg: impl Into<String>) -> Self {
        EngineError::SchemaInconsistency {
            model: model.into(),
            message: msg.into(),
        }
    }

    /// Create a directive error
    pub fn directive(directive: impl Into<String>, msg: impl Into<String>) -> Self {
        EngineError::Directive {
            directive: directive.into(),
            message: msg.into(),
        }
    }

    /// Create a rule contract error
    pub fn rule_contract(rule: impl Into<String>, msg: impl Into<String>) -> Self {
        EngineError::RuleContract {
            rule: rule.into(),
            message: msg.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        EngineError::InvalidConfig(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        EngineError::Internal(msg.into())
    }

    /// Create an error with context
    pub fn with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        EngineError::WithContext {
            context: context.into(),
            message: msg.into(),
        }
    }

    /// Check if this error describes an inconsistent schema document
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            EngineError::SchemaInconsistency { .. }
                | EngineError::ModelNotFound(_)
                | EngineError::FieldNotFound { .. }
        )
    }

    /// Check if this error is a dependency cycle
    pub fn is_cycle(&self) -> bool {
        matches!(self, EngineError::DependencyCycle { .. })
    }

    /// Check if this error is an IO error
    pub fn is_io(&self) -> bool {
        matches!(self, EngineError::Io(_) | EngineError::FileRead { .. })
    }
}

/// Result type alias using EngineError
pub type EngineResult<T> = Result<T, EngineError>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> EngineResult<T>;
}

impl<T, E: Into<EngineError>> ResultExt<T> for Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> EngineResult<T> {
        self.map_err(|e| {
            let err: EngineError = e.into();
            EngineError::WithContext {
                context: context.into(),
                message: err.to_string(),
            }
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
