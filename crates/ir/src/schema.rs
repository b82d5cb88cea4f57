//! Schema document
//!
//! The root container handed to the compiler: every model and enum of the
//! introspected data model. Read-only once loaded.

use crate::model::Model;
use laragen_core::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// The fully-resolved data model produced by schema introspection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    /// Models in declaration order
    #[serde(default)]
    pub models: Vec<Model>,

    /// Enumerations
    #[serde(default)]
    pub enums: Vec<EnumDef>,
}

impl SchemaDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a model
    pub fn with_model(mut self, model: Model) -> Self {
        self.models.push(model);
        self
    }

    /// Append an enum
    pub fn with_enum(mut self, name: impl Into<String>, values: &[&str]) -> Self {
        self.enums.push(EnumDef {
            name: name.into(),
            values: values
                .iter()
                .map(|v| EnumValue {
                    name: v.to_string(),
                    db_name: None,
                })
                .collect(),
        });
        self
    }

    /// Get a model by name
    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Get a model by name or fail with `ModelNotFound`
    pub fn require_model(&self, name: &str) -> EngineResult<&Model> {
        self.model(name)
            .ok_or_else(|| EngineError::ModelNotFound(name.to_string()))
    }

    /// Get an enum by name
    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// Physical values of an enum, empty if the enum is unknown
    pub fn enum_values(&self, name: &str) -> Vec<String> {
        self.enum_def(name)
            .map(|e| e.values.iter().map(|v| v.value().to_string()).collect())
            .unwrap_or_default()
    }

    /// Number of models
    pub fn model_count(&self) -> usize {
        self.models.len()
    }
}

/// An enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    #[serde(default)]
    pub values: Vec<EnumValue>,
}

/// One enumeration value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub name: String,
    #[serde(default)]
    pub db_name: Option<String>,
}

impl EnumValue {
    /// Physical value
    pub fn value(&self) -> &str {
        self.db_name.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup() {
        let doc = SchemaDocument::new()
            .with_model(Model::new("User"))
            .with_enum("Role", &["ADMIN", "USER"]);
        assert!(doc.model("User").is_some());
        assert!(doc.model("Post").is_none());
        assert!(matches!(
            doc.require_model("Post"),
            Err(EngineError::ModelNotFound(name)) if name == "Post"
        ));
        assert_eq!(doc.enum_values("Role"), vec!["ADMIN", "USER"]);
        assert!(doc.enum_values("Missing").is_empty());
    }

    #[test]
    fn test_enum_db_name() {
        let doc: SchemaDocument = serde_json::from_value(json!({
            "enums": [{ "name": "Status", "values": [{ "name": "ACTIVE", "dbName": "active" }] }]
        }))
        .unwrap();
        assert_eq!(doc.enum_values("Status"), vec!["active"]);
        assert!(doc.models.is_empty());
    }
}
