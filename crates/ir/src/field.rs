//! Field definitions for model properties
//!
//! This module contains the `Field` struct and related types describing one
//! property of a model as delivered by the schema introspection document.
//! Fields are scalar columns, enum columns, or relation fields.

use laragen_core::ReferentialAction;
use serde::{Deserialize, Serialize};

// ============================================================================
// FieldKind
// ============================================================================

/// What a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// A plain column (`Int`, `String`, `DateTime`, ...)
    Scalar,
    /// A column constrained to an enum's values
    Enum,
    /// A relation to another model; not a column by itself
    Object,
    /// A column type the introspection tool could not describe
    Unsupported,
}

// ============================================================================
// Field
// ============================================================================

/// Represents a field within a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Field name as declared in the schema
    pub name: String,

    /// Physical column name, when it differs from `name`
    #[serde(default)]
    pub db_name: Option<String>,

    /// Field kind
    pub kind: FieldKind,

    /// Declared type: a scalar name, an enum name, or a model name
    #[serde(rename = "type")]
    pub type_name: String,

    /// Native database type with its width/precision arguments
    #[serde(default)]
    pub native_type: Option<NativeType>,

    /// Whether the field is NOT NULL
    #[serde(default)]
    pub is_required: bool,

    /// Whether the field is list-valued
    #[serde(default)]
    pub is_list: bool,

    /// Whether the field is (part of) the primary key
    #[serde(default)]
    pub is_id: bool,

    /// Whether the field carries a single-column unique constraint
    #[serde(default)]
    pub is_unique: bool,

    /// Whether the field is maintained as an update timestamp
    #[serde(default)]
    pub is_updated_at: bool,

    /// Default value descriptor
    #[serde(default)]
    pub default: Option<DefaultValue>,

    /// Relation identity shared by both sides of a relation
    #[serde(default)]
    pub relation_name: Option<String>,

    /// Local fields holding the foreign key (owning side only)
    #[serde(default)]
    pub relation_from_fields: Vec<String>,

    /// Referenced fields on the related model (owning side only)
    #[serde(default)]
    pub relation_to_fields: Vec<String>,

    /// Referential action on delete
    #[serde(default)]
    pub relation_on_delete: Option<ReferentialAction>,

    /// Referential action on update
    #[serde(default)]
    pub relation_on_update: Option<ReferentialAction>,

    /// Documentation string; may embed directives
    #[serde(default)]
    pub documentation: Option<String>,
}

impl Field {
    /// Create a new field of the given kind and type
    pub fn new(name: impl Into<String>, kind: FieldKind, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            db_name: None,
            kind,
            type_name: type_name.into(),
            native_type: None,
            is_required: true,
            is_list: false,
            is_id: false,
            is_unique: false,
            is_updated_at: false,
            default: None,
            relation_name: None,
            relation_from_fields: Vec::new(),
            relation_to_fields: Vec::new(),
            relation_on_delete: None,
            relation_on_update: None,
            documentation: None,
        }
    }

    /// Create a required scalar field
    pub fn scalar(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Scalar, type_name)
    }

    /// Create a required enum field
    pub fn enumeration(name: impl Into<String>, enum_name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Enum, enum_name)
    }

    /// Create a relation field pointing at `model`
    pub fn relation(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Object, model)
    }

    /// Create an auto-incrementing integer primary key named `id`
    pub fn autoincrement_id() -> Self {
        Self::scalar("id", "Int")
            .id()
            .with_default_fn("autoincrement", Vec::new())
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Mark the field as nullable
    pub fn optional(mut self) -> Self {
        self.is_required = false;
        self
    }

    /// Mark the field as list-valued (list fields are never required)
    pub fn list(mut self) -> Self {
        self.is_list = true;
        self.is_required = false;
        self
    }

    /// Mark the field as the primary key
    pub fn id(mut self) -> Self {
        self.is_id = true;
        self.is_required = true;
        self
    }

    /// Mark the field as unique
    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    /// Mark the field as an update timestamp
    pub fn updated_at(mut self) -> Self {
        self.is_updated_at = true;
        self
    }

    /// Set the physical column name
    pub fn with_db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = Some(db_name.into());
        self
    }

    /// Set the native database type
    pub fn with_native(mut self, name: impl Into<String>, args: &[&str]) -> Self {
        self.native_type = Some(NativeType(
            name.into(),
            args.iter().map(|a| a.to_string()).collect(),
        ));
        self
    }

    /// Set a literal default
    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(DefaultValue::Literal(value));
        self
    }

    /// Set a generator default such as `now()` or `autoincrement()`
    pub fn with_default_fn(mut self, name: impl Into<String>, args: Vec<serde_json::Value>) -> Self {
        self.default = Some(DefaultValue::Generator(GeneratorDefault {
            name: name.into(),
            args,
        }));
        self
    }

    /// Set the relation identity
    pub fn in_relation(mut self, relation_name: impl Into<String>) -> Self {
        self.relation_name = Some(relation_name.into());
        self
    }

    /// Make this relation field the owning side
    pub fn references(mut self, from_fields: &[&str], to_fields: &[&str]) -> Self {
        self.relation_from_fields = from_fields.iter().map(|f| f.to_string()).collect();
        self.relation_to_fields = to_fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Set the on delete action
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.relation_on_delete = Some(action);
        self
    }

    /// Set the on update action
    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.relation_on_update = Some(action);
        self
    }

    /// Set the documentation string
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.documentation = Some(doc.into());
        self
    }

    // ========================================================================
    // Query methods
    // ========================================================================

    /// Physical column name
    pub fn column_name(&self) -> &str {
        self.db_name.as_deref().unwrap_or(&self.name)
    }

    /// Check if this is a relation field
    pub fn is_relation(&self) -> bool {
        self.kind == FieldKind::Object
    }

    /// Check if this is a relation field that owns a foreign key
    pub fn is_owning(&self) -> bool {
        self.is_relation() && !self.relation_from_fields.is_empty()
    }

    /// Check if this field maps to a physical column
    pub fn is_column(&self) -> bool {
        !self.is_relation()
    }

    /// The generator default, if the default is a function call
    pub fn default_generator(&self) -> Option<&GeneratorDefault> {
        match &self.default {
            Some(DefaultValue::Generator(generator)) => Some(generator),
            _ => None,
        }
    }

    /// Check if the field defaults to `autoincrement()`
    pub fn is_autoincrement(&self) -> bool {
        self.default_generator()
            .map(|g| g.name == "autoincrement")
            .unwrap_or(false)
    }

    /// Native type name, if any
    pub fn native_name(&self) -> Option<&str> {
        self.native_type.as_ref().map(|n| n.0.as_str())
    }
}

// ============================================================================
// NativeType
// ============================================================================

/// Native database type: name plus width/precision arguments,
/// serialized as `["VarChar", ["191"]]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeType(pub String, #[serde(default)] pub Vec<String>);

impl NativeType {
    /// Native type name
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Width/precision arguments
    pub fn args(&self) -> &[String] {
        &self.1
    }
}

// ============================================================================
// DefaultValue
// ============================================================================

/// Default value descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    /// A named generator such as `now()`, `uuid()` or `dbgenerated("...")`
    Generator(GeneratorDefault),
    /// A literal value
    Literal(serde_json::Value),
}

/// A named default generator with its arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorDefault {
    pub name: String,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

impl std::fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefaultValue::Generator(generator) => {
                let args = generator
                    .args
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{}({})", generator.name, args)
            }
            DefaultValue::Literal(value) => write!(f, "{}", value),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
