//! # Laragen IR (Intermediate Representation)
//!
//! This crate holds the read-only input of the compiler and everything
//! derived from it without looking at the output side.
//!
//! ## Core Concepts
//!
//! - **SchemaDocument**: the introspected data model (models, enums)
//! - **Model**: a table with ordered fields, primary key and indexes
//! - **Field**: a scalar, enum or relation field
//! - **DirectiveSet**: typed directives parsed from documentation strings
//! - **RelationDefinition**: one Eloquent accessor recovered by inference
//!

pub mod directive;
pub mod field;
pub mod inference;
pub mod model;
pub mod naming;
pub mod polymorphic;
pub mod relationship;
pub mod schema;
pub mod serialization;
pub mod validation;

pub use directive::{DirectiveSet, MorphDirective, NamespacedRef, Scope, Structured};
pub use field::{DefaultValue, Field, FieldKind, GeneratorDefault, NativeType};
pub use inference::{InferenceOptions, accessor_name, infer_document, infer_relations};
pub use model::{Index, IndexField, IndexKind, Model, PrimaryKey};
pub use relationship::{MorphSpec, PivotSpec, RelationDefinition, RelationSet};
pub use schema::{EnumDef, EnumValue, SchemaDocument};
pub use serialization::{load_schema, load_schema_from_string, schema_to_string};
pub use validation::{ValidationResult, ValidationRule, Validator};

pub use laragen_core::{
    EngineError, EngineResult, MorphCardinality, ReferentialAction, RelationKind,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Prelude Module
// ============================================================================

/// Convenient re-exports for common usage
pub mod prelude {
    pub use crate::{
        DirectiveSet, EngineError, EngineResult, Field, FieldKind, InferenceOptions, Model,
        ReferentialAction, RelationDefinition, RelationKind, SchemaDocument, infer_relations,
        load_schema,
    };
}
