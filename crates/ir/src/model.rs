//! Model definitions
//!
//! This module contains the `Model` struct and related types describing a
//! data model (table) of the schema document: its ordered fields, primary
//! key and indexes.

use crate::field::Field;
use laragen_core::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

// ============================================================================
// Model
// ============================================================================

/// Represents a data model (maps to a database table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Model name (PascalCase, e.g., "User", "BlogPost")
    pub name: String,

    /// Physical table name, when it differs from `name`
    #[serde(default)]
    pub db_name: Option<String>,

    /// Documentation string; may embed directives
    #[serde(default)]
    pub documentation: Option<String>,

    /// Fields in declaration order
    #[serde(default)]
    pub fields: Vec<Field>,

    /// Compound primary key, when declared at model level
    #[serde(default)]
    pub primary_key: Option<PrimaryKey>,

    /// Indexes declared on the model
    #[serde(default)]
    pub indexes: Vec<Index>,
}

impl Model {
    /// Create a new model with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            db_name: None,
            documentation: None,
            fields: Vec::new(),
            primary_key: None,
            indexes: Vec::new(),
        }
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the physical table name
    pub fn with_db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = Some(db_name.into());
        self
    }

    /// Set the documentation string
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.documentation = Some(doc.into());
        self
    }

    /// Append a field
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare a compound primary key over the given fields
    pub fn with_primary_key(mut self, fields: &[&str]) -> Self {
        self.primary_key = Some(PrimaryKey {
            name: None,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        });
        self
    }

    /// Declare an index of the given kind over the given fields
    pub fn with_index(mut self, kind: IndexKind, fields: &[&str]) -> Self {
        self.indexes.push(Index::new(kind, fields));
        self
    }

    // ========================================================================
    // Query methods
    // ========================================================================

    /// Physical table name
    pub fn table_name(&self) -> &str {
        self.db_name.as_deref().unwrap_or(&self.name)
    }

    /// Get a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get a field by name or fail with `FieldNotFound`
    pub fn require_field(&self, name: &str) -> EngineResult<&Field> {
        self.field(name).ok_or_else(|| EngineError::FieldNotFound {
            model: self.name.clone(),
            field: name.to_string(),
        })
    }

    /// Physical column name of a field, falling back to the field name
    pub fn column_of(&self, field_name: &str) -> String {
        self.field(field_name)
            .map(|f| f.column_name().to_string())
            .unwrap_or_else(|| field_name.to_string())
    }

    /// Map field names to physical column names
    pub fn columns_of(&self, field_names: &[String]) -> Vec<String> {
        field_names.iter().map(|f| self.column_of(f)).collect()
    }

    /// Primary key field names: the model-level key when declared,
    /// otherwise every field flagged `isId`
    pub fn primary_key_fields(&self) -> Vec<String> {
        if let Some(pk) = &self.primary_key {
            if !pk.fields.is_empty() {
                return pk.fields.clone();
            }
        }
        let ids: Vec<String> = self
            .fields
            .iter()
            .filter(|f| f.is_id)
            .map(|f| f.name.clone())
            .collect();
        if !ids.is_empty() {
            return ids;
        }
        self.indexes
            .iter()
            .find(|i| i.kind == IndexKind::Id)
            .map(|i| i.field_names())
            .unwrap_or_default()
    }

    /// Primary key column names
    pub fn primary_key_columns(&self) -> Vec<String> {
        self.columns_of(&self.primary_key_fields())
    }

    /// Column fields (scalar, enum and unsupported)
    pub fn columns(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_column())
    }

    /// Relation fields
    pub fn relation_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_relation())
    }

    /// Relation fields owning a foreign key
    pub fn owning_relations(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_owning())
    }

    /// Column sets under a uniqueness guarantee: the primary key, every
    /// unique index, and every single-column `@unique` field
    pub fn unique_sets(&self) -> Vec<Vec<String>> {
        let mut sets = Vec::new();
        let pk = self.primary_key_columns();
        if !pk.is_empty() {
            sets.push(pk);
        }
        for index in &self.indexes {
            if matches!(index.kind, IndexKind::Unique | IndexKind::Id) {
                sets.push(self.columns_of(&index.field_names()));
            }
        }
        for field in self.fields.iter().filter(|f| f.is_unique) {
            sets.push(vec![field.column_name().to_string()]);
        }
        sets
    }
}

// ============================================================================
// PrimaryKey
// ============================================================================

/// Model-level primary key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKey {
    #[serde(default)]
    pub name: Option<String>,
    pub fields: Vec<String>,
}

// ============================================================================
// Index
// ============================================================================

/// Kind of an index declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Id,
    Unique,
    Normal,
    Fulltext,
}

/// One field inside an index declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexField {
    pub name: String,
}

/// An index over one or more fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    #[serde(rename = "type")]
    pub kind: IndexKind,
    pub fields: Vec<IndexField>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub db_name: Option<String>,
}

impl Index {
    /// Create an index over the given field names
    pub fn new(kind: IndexKind, fields: &[&str]) -> Self {
        Self {
            kind,
            fields: fields
                .iter()
                .map(|f| IndexField { name: f.to_string() })
                .collect(),
            name: None,
            db_name: None,
        }
    }

    /// Set the physical index name
    pub fn named(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = Some(db_name.into());
        self
    }

    /// Field names covered by this index
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
