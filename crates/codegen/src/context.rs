//! # Generation Context
//!
//! The `GenerationContext` holds everything the compiler stages share for
//! one run over a schema document:
//!
//! - the document itself and the generator configuration
//! - the typed directive sets of every model and field, parsed once up front
//! - the inference options derived from the configuration
//!
//! Directives are parsed at this boundary so a malformed directive fails the
//! run before any output is produced.

use laragen_core::EngineResult;
use laragen_ir::{DirectiveSet, InferenceOptions, Model, SchemaDocument};
use std::collections::HashMap;

use crate::GeneratorConfig;

// ============================================================================
// GenerationContext
// ============================================================================

/// Context carrying the shared inputs of one compilation
#[derive(Debug, Clone)]
pub struct GenerationContext<'a> {
    /// The schema document being compiled
    pub doc: &'a SchemaDocument,

    /// Generator configuration
    pub config: &'a GeneratorConfig,

    model_directives: HashMap<String, DirectiveSet>,
    field_directives: HashMap<(String, String), DirectiveSet>,
    empty: DirectiveSet,
}

impl<'a> GenerationContext<'a> {
    /// Build a context, parsing every documentation string of the document
    pub fn new(doc: &'a SchemaDocument, config: &'a GeneratorConfig) -> EngineResult<Self> {
        let mut model_directives = HashMap::new();
        let mut field_directives = HashMap::new();

        for model in &doc.models {
            let directives = DirectiveSet::from_doc(model.documentation.as_deref())?;
            if !directives.is_empty() || directives.comment.is_some() {
                model_directives.insert(model.name.clone(), directives);
            }
            for field in &model.fields {
                let directives = DirectiveSet::from_doc(field.documentation.as_deref())?;
                if !directives.is_empty() || directives.comment.is_some() {
                    field_directives.insert((model.name.clone(), field.name.clone()), directives);
                }
            }
        }

        tracing::debug!(
            models = doc.models.len(),
            model_directives = model_directives.len(),
            field_directives = field_directives.len(),
            "Built generation context"
        );

        Ok(Self {
            doc,
            config,
            model_directives,
            field_directives,
            empty: DirectiveSet::default(),
        })
    }

    // ── directives ───────────────────────────────────────────────────────

    /// Directives of a model (empty for synthesized or undocumented models)
    pub fn model_directives(&self, model: &str) -> &DirectiveSet {
        self.model_directives.get(model).unwrap_or(&self.empty)
    }

    /// Directives of a field
    pub fn field_directives(&self, model: &str, field: &str) -> &DirectiveSet {
        self.field_directives
            .get(&(model.to_string(), field.to_string()))
            .unwrap_or(&self.empty)
    }

    // ── models ───────────────────────────────────────────────────────────

    /// Models in document order
    pub fn models(&self) -> &'a [Model] {
        &self.doc.models
    }

    /// Whether a model is left out of migration output
    pub fn is_silent_in_migrations(&self, model: &str) -> bool {
        self.model_directives(model).silent_in_migrations()
    }

    /// Whether a model is left out of model output
    pub fn is_silent_in_models(&self, model: &str) -> bool {
        self.model_directives(model).silent_in_models()
    }

    // ── options ──────────────────────────────────────────────────────────

    /// Inference options derived from the configuration
    pub fn inference_options(&self) -> InferenceOptions {
        self.config.inference_options()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use laragen_ir::Field;

    fn doc() -> SchemaDocument {
        SchemaDocument::new().with_model(
            Model::new("User")
                .with_doc("Registered accounts @hidden(password) @silent(models)")
                .with_field(Field::autoincrement_id())
                .with_field(Field::scalar("password", "String").with_doc("@cast(hashed)")),
        )
    }

    #[test]
    fn test_directives_are_parsed_once() {
        let doc = doc();
        let config = GeneratorConfig::default();
        let ctx = GenerationContext::new(&doc, &config).unwrap();

        let model = ctx.model_directives("User");
        assert_eq!(model.comment.as_deref(), Some("Registered accounts"));
        assert!(model.lists_hidden("password"));
        assert!(ctx.is_silent_in_models("User"));
        assert!(!ctx.is_silent_in_migrations("User"));

        let field = ctx.field_directives("User", "password");
        assert_eq!(field.cast.as_ref().and_then(|c| c.value.as_deref()), Some("hashed"));
        assert!(ctx.field_directives("User", "id").is_empty());
        assert!(ctx.model_directives("Missing").is_empty());
    }

    #[test]
    fn test_malformed_directive_fails_fast() {
        let doc = SchemaDocument::new().with_model(
            Model::new("User")
                .with_field(Field::autoincrement_id())
                .with_field(Field::scalar("meta", "Json").with_doc("@cast(json")),
        );
        let config = GeneratorConfig::default();
        let err = GenerationContext::new(&doc, &config).unwrap_err();
        assert!(matches!(err, laragen_core::EngineError::Directive { .. }));
    }

    #[test]
    fn test_inference_options_follow_config() {
        let doc = doc();
        let config = GeneratorConfig::default().with_morph_suffixes("Ref", "Kind");
        let ctx = GenerationContext::new(&doc, &config).unwrap();
        let opts = ctx.inference_options();
        assert_eq!(opts.morph_id_suffix, "Ref");
        assert_eq!(opts.morph_type_suffix, "Kind");
    }
}
