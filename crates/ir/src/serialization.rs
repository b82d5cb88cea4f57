//! Loading schema documents
//!
//! Documents are JSON. Both the bare `{ "models", "enums" }` shape and the
//! full introspection dump wrapping it in `{ "datamodel": { ... } }` are
//! accepted.

use crate::schema::SchemaDocument;
use laragen_core::{EngineError, EngineResult};
use std::path::Path;

/// Key wrapping the data model in a full introspection dump
pub const DATAMODEL_KEY: &str = "datamodel";

/// Load a schema document from a file
///
/// # Example
///
/// ```rust,ignore
/// use laragen_ir::load_schema;
///
/// let doc = load_schema("schema.json").unwrap();
/// println!("{} models", doc.model_count());
/// ```
pub fn load_schema(path: impl AsRef<Path>) -> EngineResult<SchemaDocument> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| EngineError::FileRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    load_schema_from_string(&content).map_err(|e| EngineError::FileRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a schema document from a JSON string
pub fn load_schema_from_string(json: &str) -> EngineResult<SchemaDocument> {
    let mut value: serde_json::Value = serde_json::from_str(json)?;
    if let Some(inner) = value.get_mut(DATAMODEL_KEY) {
        value = inner.take();
    }
    let doc: SchemaDocument = serde_json::from_value(value)?;
    tracing::debug!(
        models = doc.models.len(),
        enums = doc.enums.len(),
        "Loaded schema document"
    );
    Ok(doc)
}

/// Serialize a schema document to pretty JSON
pub fn schema_to_string(doc: &SchemaDocument) -> EngineResult<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DOC: &str = r#"{
        "models": [
            {
                "name": "User",
                "dbName": "users",
                "fields": [
                    { "name": "id", "kind": "scalar", "type": "Int", "isId": true, "isRequired": true,
                      "default": { "name": "autoincrement", "args": [] } },
                    { "name": "role", "kind": "enum", "type": "Role", "isRequired": true }
                ]
            }
        ],
        "enums": [{ "name": "Role", "values": [{ "name": "ADMIN" }, { "name": "USER" }] }]
    }"#;

    #[test]
    fn test_load_from_string() {
        let doc = load_schema_from_string(DOC).unwrap();
        assert_eq!(doc.model_count(), 1);
        assert!(doc.model("User").unwrap().fields[0].is_autoincrement());
        assert_eq!(doc.enum_values("Role"), vec!["ADMIN", "USER"]);
    }

    #[test]
    fn test_load_wrapped_datamodel() {
        let wrapped = format!(r#"{{ "datamodel": {} }}"#, DOC);
        let doc = load_schema_from_string(&wrapped).unwrap();
        assert_eq!(doc.model_count(), 1);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(DOC.as_bytes()).unwrap();
        let doc = load_schema(file.path()).unwrap();
        assert_eq!(doc.models[0].table_name(), "users");
    }

    #[test]
    fn test_missing_file() {
        let err = load_schema("/nonexistent/schema.json").unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_invalid_json() {
        let err = load_schema_from_string("{ not json").unwrap_err();
        assert!(matches!(err, EngineError::JsonSerialization(_)));
    }

    #[test]
    fn test_string_roundtrip_preserves_document() {
        let doc = load_schema_from_string(DOC).unwrap();
        let json = schema_to_string(&doc).unwrap();
        assert_eq!(load_schema_from_string(&json).unwrap(), doc);
    }
}
