//! Reference validation for schema documents
//!
//! Checks that every name the document uses resolves: relation targets,
//! relation fields, enums, index fields and directives. Anything deeper
//! (type compatibility, naming style) is left to the introspection tool.

use crate::directive::DirectiveSet;
use crate::schema::SchemaDocument;
use laragen_core::{EngineError, EngineResult, Validatable};
use std::collections::HashSet;

// ============================================================================
// ValidationResult
// ============================================================================

/// Result of a validation operation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the validation passed
    pub valid: bool,

    /// List of errors (empty if valid)
    pub errors: Vec<ValidationError>,

    /// List of warnings (non-fatal issues)
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, error: ValidationError) {
        self.valid = false;
        self.errors.push(error);
    }

    /// Add a warning to the result
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Merge another validation result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Convert to EngineResult (fails on the first model with errors)
    pub fn to_result(self) -> EngineResult<()> {
        let Some(first) = self.errors.first() else {
            return Ok(());
        };
        let model = first.model.clone();
        let msg = self
            .errors
            .iter()
            .filter(|e| e.model == model)
            .map(|e| e.message.clone())
            .collect::<Vec<_>>()
            .join("; ");
        Err(EngineError::inconsistency(model, msg))
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

// ============================================================================
// ValidationError / ValidationWarning
// ============================================================================

/// A validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Error code for programmatic handling
    pub code: ValidationErrorCode,

    /// Model the error belongs to
    pub model: String,

    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(code: ValidationErrorCode, model: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            model: model.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.model, self.message)
    }
}

/// Error codes for validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorCode {
    DuplicateModelName,
    DuplicateFieldName,
    UnknownRelationTarget,
    UnknownRelationField,
    UnknownEnum,
    UnknownIndexField,
    MalformedDirective,
}

/// A validation warning (non-fatal issue)
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub code: ValidationWarningCode,
    pub model: String,
    pub message: String,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] Warning: {}", self.model, self.message)
    }
}

/// Warning codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationWarningCode {
    NoPrimaryKey,
}

// ============================================================================
// ValidationRule Trait
// ============================================================================

/// Trait for validation rules
pub trait ValidationRule {
    /// Get the rule name
    fn name(&self) -> &'static str;

    /// Validate a document and return the result
    fn validate(&self, doc: &SchemaDocument) -> ValidationResult;
}

// ============================================================================
// Validator
// ============================================================================

/// Document validator that runs multiple validation rules
#[derive(Default)]
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create a validator with default rules
    pub fn with_default_rules() -> Self {
        let mut validator = Self::new();
        validator.add_rule(Box::new(ModelNamesRule));
        validator.add_rule(Box::new(RelationReferencesRule));
        validator.add_rule(Box::new(EnumReferencesRule));
        validator.add_rule(Box::new(IndexFieldsRule));
        validator.add_rule(Box::new(DirectivesRule));
        validator
    }

    /// Add a validation rule
    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    /// Validate a document with all rules
    pub fn validate(&self, doc: &SchemaDocument) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for rule in &self.rules {
            tracing::trace!(rule = rule.name(), "Running validation rule");
            result.merge(rule.validate(doc));
        }
        result
    }

    /// Validate and return Result
    pub fn validate_result(&self, doc: &SchemaDocument) -> EngineResult<()> {
        self.validate(doc).to_result()
    }
}

impl Validatable for SchemaDocument {
    fn validate(&self) -> EngineResult<()> {
        Validator::with_default_rules().validate_result(self)
    }

    fn validation_errors(&self) -> Vec<String> {
        Validator::with_default_rules()
            .validate(self)
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect()
    }
}

// ============================================================================
// Built-in Validation Rules
// ============================================================================

/// Rule: model and field names are unique
pub struct ModelNamesRule;

impl ValidationRule for ModelNamesRule {
    fn name(&self) -> &'static str {
        "model_names"
    }

    fn validate(&self, doc: &SchemaDocument) -> ValidationResult {
        let mut result = ValidationResult::ok();
        let mut seen: HashSet<&str> = HashSet::new();

        for model in &doc.models {
            if !seen.insert(&model.name) {
                result.add_error(ValidationError::new(
                    ValidationErrorCode::DuplicateModelName,
                    &model.name,
                    format!("Duplicate model name: '{}'", model.name),
                ));
            }

            let mut fields: HashSet<&str> = HashSet::new();
            for field in &model.fields {
                if !fields.insert(&field.name) {
                    result.add_error(ValidationError::new(
                        ValidationErrorCode::DuplicateFieldName,
                        &model.name,
                        format!("Duplicate field name: '{}'", field.name),
                    ));
                }
            }

            if model.primary_key_fields().is_empty() {
                result.add_warning(ValidationWarning {
                    code: ValidationWarningCode::NoPrimaryKey,
                    model: model.name.clone(),
                    message: "model has no primary key".to_string(),
                });
            }
        }
        result
    }
}

/// Rule: relation targets and key fields exist
pub struct RelationReferencesRule;

impl ValidationRule for RelationReferencesRule {
    fn name(&self) -> &'static str {
        "relation_references"
    }

    fn validate(&self, doc: &SchemaDocument) -> ValidationResult {
        let mut result = ValidationResult::ok();

        for model in &doc.models {
            for field in model.relation_fields() {
                let Some(target) = doc.model(&field.type_name) else {
                    result.add_error(ValidationError::new(
                        ValidationErrorCode::UnknownRelationTarget,
                        &model.name,
                        format!(
                            "relation field '{}' targets unknown model '{}'",
                            field.name, field.type_name
                        ),
                    ));
                    continue;
                };

                for from in &field.relation_from_fields {
                    if model.field(from).is_none() {
                        result.add_error(ValidationError::new(
                            ValidationErrorCode::UnknownRelationField,
                            &model.name,
                            format!("relation '{}' uses unknown local field '{}'", field.name, from),
                        ));
                    }
                }
                for to in &field.relation_to_fields {
                    if target.field(to).is_none() {
                        result.add_error(ValidationError::new(
                            ValidationErrorCode::UnknownRelationField,
                            &model.name,
                            format!(
                                "relation '{}' references unknown field '{}.{}'",
                                field.name, target.name, to
                            ),
                        ));
                    }
                }
            }
        }
        result
    }
}

/// Rule: enum fields name a declared enum
pub struct EnumReferencesRule;

impl ValidationRule for EnumReferencesRule {
    fn name(&self) -> &'static str {
        "enum_references"
    }

    fn validate(&self, doc: &SchemaDocument) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for model in &doc.models {
            for field in model
                .fields
                .iter()
                .filter(|f| f.kind == crate::field::FieldKind::Enum)
            {
                if doc.enum_def(&field.type_name).is_none() {
                    result.add_error(ValidationError::new(
                        ValidationErrorCode::UnknownEnum,
                        &model.name,
                        format!("field '{}' uses unknown enum '{}'", field.name, field.type_name),
                    ));
                }
            }
        }
        result
    }
}

/// Rule: primary keys and indexes name existing fields
pub struct IndexFieldsRule;

impl ValidationRule for IndexFieldsRule {
    fn name(&self) -> &'static str {
        "index_fields"
    }

    fn validate(&self, doc: &SchemaDocument) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for model in &doc.models {
            let pk = model
                .primary_key
                .iter()
                .flat_map(|pk| pk.fields.iter().cloned());
            let indexed = model.indexes.iter().flat_map(|i| i.field_names());
            for name in pk.chain(indexed) {
                if model.field(&name).is_none() {
                    result.add_error(ValidationError::new(
                        ValidationErrorCode::UnknownIndexField,
                        &model.name,
                        format!("index references unknown field '{}'", name),
                    ));
                }
            }
        }
        result
    }
}

/// Rule: every documentation string parses
pub struct DirectivesRule;

impl ValidationRule for DirectivesRule {
    fn name(&self) -> &'static str {
        "directives"
    }

    fn validate(&self, doc: &SchemaDocument) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for model in &doc.models {
            let docs = std::iter::once(model.documentation.as_deref())
                .chain(model.fields.iter().map(|f| f.documentation.as_deref()));
            for text in docs {
                if let Err(err) = DirectiveSet::from_doc(text) {
                    result.add_error(ValidationError::new(
                        ValidationErrorCode::MalformedDirective,
                        &model.name,
                        err.to_string(),
                    ));
                }
            }
        }
        result
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::model::{IndexKind, Model};

    fn valid_doc() -> SchemaDocument {
        SchemaDocument::new()
            .with_enum("Role", &["ADMIN", "USER"])
            .with_model(
                Model::new("User")
                    .with_field(Field::autoincrement_id())
                    .with_field(Field::enumeration("role", "Role"))
                    .with_field(Field::relation("posts", "Post").in_relation("PostToUser").list()),
            )
            .with_model(
                Model::new("Post")
                    .with_field(Field::autoincrement_id())
                    .with_field(Field::scalar("userId", "Int"))
                    .with_field(
                        Field::relation("user", "User")
                            .in_relation("PostToUser")
                            .references(&["userId"], &["id"]),
                    )
                    .with_index(IndexKind::Normal, &["userId"]),
            )
    }

    #[test]
    fn test_valid_document() {
        let doc = valid_doc();
        let result = Validator::with_default_rules().validate(&doc);
        assert!(result.valid);
        assert!(!result.has_warnings());
        assert!(doc.is_valid());
    }

    #[test]
    fn test_unknown_references() {
        let doc = valid_doc().with_model(
            Model::new("Audit")
                .with_field(Field::autoincrement_id())
                .with_field(Field::enumeration("level", "Level"))
                .with_field(Field::relation("ghost", "Ghost"))
                .with_index(IndexKind::Unique, &["missing"]),
        );
        let result = Validator::with_default_rules().validate(&doc);
        let codes: Vec<ValidationErrorCode> = result.errors.iter().map(|e| e.code).collect();
        assert!(codes.contains(&ValidationErrorCode::UnknownEnum));
        assert!(codes.contains(&ValidationErrorCode::UnknownRelationTarget));
        assert!(codes.contains(&ValidationErrorCode::UnknownIndexField));

        let err = result.to_result().unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().starts_with("Schema inconsistency in model 'Audit'"));
    }

    #[test]
    fn test_duplicates_and_missing_pk() {
        let doc = SchemaDocument::new()
            .with_model(Model::new("Log").with_field(Field::scalar("line", "String")))
            .with_model(Model::new("Log"));
        let result = Validator::with_default_rules().validate(&doc);
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == ValidationErrorCode::DuplicateModelName));
        assert!(result.has_warnings());
    }

    #[test]
    fn test_malformed_directive() {
        let doc = SchemaDocument::new().with_model(
            Model::new("User")
                .with_field(Field::autoincrement_id())
                .with_field(Field::scalar("name", "String").with_doc("@fillable(name")),
        );
        let errors = doc.validation_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("@fillable"));
    }
}
