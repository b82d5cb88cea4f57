//! # Laragen Codegen
//!
//! The migration compiler of Laragen.
//!
//! This crate turns a validated schema document into the artefacts of a
//! Laravel data layer:
//!
//! ## Features
//!
//! - **Column Descriptors**: every field normalised into a typed descriptor
//! - **Rule Resolution**: ordered, mutually-aware rules producing schema
//!   builder statements (`id()`, `timestamps()`, `foreignId()`, `morphs()`, ...)
//! - **Dependency Ordering**: tables sorted so referenced tables come first,
//!   with cycle detection
//! - **Model Descriptors**: properties, casts, directive metadata and inferred
//!   relations per model
//! - **Implicit Pivots**: junction tables synthesized for implicit
//!   many-to-many relations
//!

// ============================================================================
// Modules
// ============================================================================

pub mod context;
pub mod descriptor;
pub mod generator;
pub mod migration;
pub mod model;
pub mod pivot;
pub mod resolve;
pub mod rules;
pub mod sort;

// ============================================================================
// Re-exports
// ============================================================================

pub use context::GenerationContext;
pub use descriptor::{
    ColumnDefault, ColumnDescriptor, ColumnHandle, DescriptorSet, ForeignKeyMeta, IndexDescriptor,
    build_descriptors,
};
pub use generator::{GenerationSummary, Generator, generate, summarize};
pub use migration::MigrationUnit;
pub use model::{ModelDescriptor, PropertyDescriptor};
pub use resolve::resolve;
pub use rules::{ColumnRule, RuleContext, RuleProvider, RuleSet, UtilityRule};
pub use sort::sort_units;

use laragen_core::{EngineError, EngineResult, Validatable};
use laragen_ir::InferenceOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// GeneratorConfig
// ============================================================================

/// Naming of polymorphic discriminator columns.
///
/// The suffixes drive `morphTo` detection on models. The migration
/// shorthands (`morphs`, `uuidMorphs`, ...) always create `<base>_id` and
/// `<base>_type`, so they only collapse pairs named that way; pairs using
/// other suffixes are emitted as two plain columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphConfig {
    /// Suffix of the id column (`commentable_id`)
    pub id_suffix: String,

    /// Suffix of the type column (`commentable_type`)
    pub type_suffix: String,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            id_suffix: "_id".to_string(),
            type_suffix: "_type".to_string(),
        }
    }
}

/// Configuration for the generator, usually read from `laragen.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Polymorphic column naming
    pub morph: MorphConfig,

    /// Identifier suffixes stripped from relation field names
    pub relation_suffixes: Vec<String>,

    /// Whether implicit many-to-many junction tables are synthesized
    pub implicit_pivots: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            morph: MorphConfig::default(),
            relation_suffixes: vec!["Id".to_string(), "_id".to_string(), "ID".to_string()],
            implicit_pivots: true,
        }
    }
}

impl GeneratorConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML configuration
    pub fn from_toml_str(content: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| EngineError::FileRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded generator configuration");
        Ok(config)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> EngineResult<String> {
        toml::to_string_pretty(self).map_err(|e| EngineError::config(e.to_string()))
    }

    /// Set the polymorphic column suffixes
    pub fn with_morph_suffixes(mut self, id: impl Into<String>, kind: impl Into<String>) -> Self {
        self.morph.id_suffix = id.into();
        self.morph.type_suffix = kind.into();
        self
    }

    /// Replace the relation identifier suffixes
    pub fn with_relation_suffixes(mut self, suffixes: &[&str]) -> Self {
        self.relation_suffixes = suffixes.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Disable implicit pivot synthesis
    pub fn without_implicit_pivots(mut self) -> Self {
        self.implicit_pivots = false;
        self
    }

    /// Inference options for the relationship engine
    pub fn inference_options(&self) -> InferenceOptions {
        InferenceOptions {
            relation_suffixes: self.relation_suffixes.clone(),
            morph_id_suffix: self.morph.id_suffix.clone(),
            morph_type_suffix: self.morph.type_suffix.clone(),
        }
    }
}

impl Validatable for GeneratorConfig {
    fn validate(&self) -> EngineResult<()> {
        if self.morph.id_suffix.is_empty() || self.morph.type_suffix.is_empty() {
            return Err(EngineError::config("morph suffixes must not be empty"));
        }
        if self.morph.id_suffix == self.morph.type_suffix {
            return Err(EngineError::config("morph id and type suffixes must differ"));
        }
        if self.relation_suffixes.iter().any(|s| s.is_empty()) {
            return Err(EngineError::config("relation suffixes must not be empty"));
        }
        Ok(())
    }
}

// ============================================================================
// GenerationOutput
// ============================================================================

/// Everything one generator run produces
#[derive(Debug, Clone, Default)]
pub struct GenerationOutput {
    /// Migration units in dependency order (silent units included)
    pub migrations: Vec<MigrationUnit>,

    /// Model descriptors in document order (silent models included)
    pub models: Vec<ModelDescriptor>,

    /// Diagnostics recorded during the run
    pub warnings: Vec<String>,
}

impl GenerationOutput {
    /// Add a warning
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Migration units that are emitted
    pub fn emitted_migrations(&self) -> impl Iterator<Item = &MigrationUnit> {
        self.migrations.iter().filter(|m| !m.silent)
    }

    /// Model descriptors that are emitted
    pub fn emitted_models(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.iter().filter(|m| !m.silent)
    }

    /// Find a migration unit by table name
    pub fn migration(&self, table: &str) -> Option<&MigrationUnit> {
        self.migrations.iter().find(|m| m.table == table)
    }

    /// Find a model descriptor by class name
    pub fn model(&self, class_name: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.class_name == class_name)
    }

    /// Table names in migration order
    pub fn table_order(&self) -> Vec<&str> {
        self.migrations.iter().map(|m| m.table.as_str()).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_generator_config_default() {
        let config = GeneratorConfig::default();
        assert_eq!(config.morph.id_suffix, "_id");
        assert_eq!(config.morph.type_suffix, "_type");
        assert_eq!(config.relation_suffixes, vec!["Id", "_id", "ID"]);
        assert!(config.implicit_pivots);
        assert!(config.is_valid());
    }

    #[test]
    fn test_generator_config_builder() {
        let config = GeneratorConfig::new()
            .with_morph_suffixes("Ref", "Kind")
            .with_relation_suffixes(&["Ref"])
            .without_implicit_pivots();

        let opts = config.inference_options();
        assert_eq!(opts.morph_id_suffix, "Ref");
        assert_eq!(opts.relation_suffixes, vec!["Ref"]);
        assert!(!config.implicit_pivots);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = GeneratorConfig::from_toml_str(
            r#"
            implicit_pivots = false

            [morph]
            type_suffix = "_kind"
            "#,
        )
        .unwrap();
        assert!(!config.implicit_pivots);
        assert_eq!(config.morph.id_suffix, "_id");
        assert_eq!(config.morph.type_suffix, "_kind");
        assert_eq!(config.relation_suffixes.len(), 3);
    }

    #[test]
    fn test_from_toml_rejects_empty_suffix() {
        let err = GeneratorConfig::from_toml_str("[morph]\nid_suffix = \"\"\n").unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));

        let err = GeneratorConfig::from_toml_str("relation_suffixes = [\"Id\", \"\"]\n").unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_toml_syntax_error() {
        let err = GeneratorConfig::from_toml_str("implicit_pivots = ").unwrap_err();
        assert!(matches!(err, EngineError::TomlDeserialization(_)));
    }

    #[test]
    fn test_load_and_roundtrip() {
        let config = GeneratorConfig::new().with_morph_suffixes("_ref", "_kind");
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(config.to_toml_string().unwrap().as_bytes()).unwrap();

        let loaded = GeneratorConfig::load(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = GeneratorConfig::load("/nonexistent/laragen.toml").unwrap_err();
        assert!(err.is_io());
    }
}
