//! # Generator Orchestrator
//!
//! The `Generator` is the top-level entry point of the compiler. It takes a
//! [`SchemaDocument`] and a [`GeneratorConfig`], builds a
//! [`GenerationContext`], and runs every stage in order to produce a
//! [`GenerationOutput`].
//!
//! ## Pipeline
//!
//! ```text
//! SchemaDocument + GeneratorConfig
//!         │
//!         ▼
//!   Validator (reference checks) ──► fail fast
//!         │
//!         ▼
//!   GenerationContext::new()      (directives parsed once)
//!         │
//!         ├──► infer_relations()   per model → RelationSet
//!         ├──► compile_model()     per model → MigrationUnit
//!         ├──► synthesize_pivots() + compile_pivot()
//!         │
//!         ▼
//!   sort_units()                  (referenced tables first)
//!         │
//!         ▼
//!   GenerationOutput { migrations, models, warnings }
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use laragen_codegen::{Generator, GeneratorConfig};
//! use laragen_ir::load_schema;
//!
//! let doc = load_schema("schema.json")?;
//! let output = Generator::new(GeneratorConfig::default()).generate(&doc)?;
//!
//! for unit in output.emitted_migrations() {
//!     println!("{}", unit.schema_block());
//! }
//! ```

use laragen_core::{EngineResult, Validatable};
use laragen_ir::{RelationSet, SchemaDocument, Validator, infer_relations};

use crate::context::GenerationContext;
use crate::descriptor::build_descriptors;
use crate::migration::{compile_model, compile_pivot};
use crate::model::build_model_descriptor;
use crate::pivot::synthesize_pivots;
use crate::rules::{RuleProvider, RuleSet};
use crate::sort::sort_units;
use crate::{GenerationOutput, GeneratorConfig};

// ============================================================================
// Generator
// ============================================================================

/// Top-level generator that orchestrates the full compilation pipeline.
///
/// The `Generator` holds its configuration and the rule set used for column
/// resolution. Call [`generate`](Generator::generate) with a schema document
/// to produce every migration unit and model descriptor.
#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,
    rules: RuleSet,
}

impl Generator {
    /// Create a generator with the given configuration and the built-in rules
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            rules: RuleSet::with_default_rules(),
        }
    }

    /// Create a generator with default configuration
    pub fn with_defaults() -> Self {
        Self::new(GeneratorConfig::default())
    }

    /// Get a reference to the current configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Replace the configuration
    pub fn set_config(&mut self, config: GeneratorConfig) {
        self.config = config;
    }

    /// The rules used for column resolution
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Register caller-supplied column rules.
    ///
    /// Caller rules are tried after the built-in ones. The whole batch is
    /// rejected with [`EngineError::RuleContract`](laragen_core::EngineError::RuleContract)
    /// if any name is empty, duplicated or already taken.
    pub fn register_rules(&mut self, provider: &dyn RuleProvider) -> EngineResult<usize> {
        let count = self.rules.register(provider)?;
        tracing::debug!(count, "Registered caller rules");
        Ok(count)
    }

    /// Compile a schema document.
    ///
    /// # Steps
    ///
    /// 1. Validate the configuration and the document's references
    /// 2. Parse every directive into the generation context
    /// 3. Infer the relations of every model
    /// 4. Resolve each model's columns into a migration unit
    /// 5. Synthesize and resolve implicit pivot tables
    /// 6. Order the units so referenced tables come first
    /// 7. Build the model descriptors
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration, a dangling reference, a malformed
    /// directive or a foreign key cycle. Ambiguous relations are reported as
    /// warnings instead.
    pub fn generate(&self, doc: &SchemaDocument) -> EngineResult<GenerationOutput> {
        let mut output = GenerationOutput::default();

        // ── 1. Validate ──────────────────────────────────────────────────
        self.config.validate()?;
        let validation = Validator::with_default_rules().validate(doc);
        for warning in &validation.warnings {
            output.add_warning(warning.to_string());
        }
        validation.to_result()?;

        // ── 2. Build context ─────────────────────────────────────────────
        let ctx = GenerationContext::new(doc, &self.config)?;
        let opts = ctx.inference_options();

        // ── 3. Infer relations ───────────────────────────────────────────
        let mut relations: Vec<(String, RelationSet)> = Vec::with_capacity(doc.models.len());
        for model in ctx.models() {
            let set = infer_relations(doc, &model.name, &opts)?;
            for diagnostic in &set.diagnostics {
                tracing::warn!(model = %model.name, "{}", diagnostic);
                output.add_warning(diagnostic.clone());
            }
            relations.push((model.name.clone(), set));
        }

        // ── 4. Resolve tables ────────────────────────────────────────────
        let mut units = Vec::with_capacity(doc.models.len());
        for model in ctx.models() {
            units.push(compile_model(&ctx, &self.rules, model)?);
        }

        // ── 5. Implicit pivots ───────────────────────────────────────────
        if self.config.implicit_pivots {
            for pivot in synthesize_pivots(doc, &relations)? {
                units.push(compile_pivot(&ctx, &self.rules, &pivot)?);
            }
        }

        // ── 6. Order ─────────────────────────────────────────────────────
        output.migrations = sort_units(units)?;

        // ── 7. Model descriptors ─────────────────────────────────────────
        for (model, (_, set)) in ctx.models().iter().zip(relations.iter()) {
            let descriptors = build_descriptors(&ctx, model)?;
            output
                .models
                .push(build_model_descriptor(&ctx, model, set, &descriptors));
        }

        tracing::info!(
            tables = output.migrations.len(),
            models = output.models.len(),
            warnings = output.warnings.len(),
            "Generation complete",
        );

        Ok(output)
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// Standalone convenience function
// ============================================================================

/// Compile a schema document using default configuration.
///
/// This is a shorthand for `Generator::with_defaults().generate(doc)`.
pub fn generate(doc: &SchemaDocument) -> EngineResult<GenerationOutput> {
    Generator::with_defaults().generate(doc)
}

// ============================================================================
// GenerationSummary
// ============================================================================

/// A human-readable summary of a completed generation run.
///
/// Use [`summarize`] to produce a `GenerationSummary` from a `GenerationOutput`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Migration units compiled (silent and pivot units included).
    pub tables: usize,
    /// Migration units that are emitted.
    pub emitted_tables: usize,
    /// Synthesized pivot tables.
    pub pivots: usize,
    /// Schema builder statements across emitted units.
    pub statements: usize,
    /// Model descriptors that are emitted.
    pub models: usize,
    /// Relations across emitted models.
    pub relations: usize,
    /// Number of warnings.
    pub warnings: usize,
}

impl GenerationSummary {
    /// Build a summary from a generation output.
    pub fn from_output(output: &GenerationOutput) -> Self {
        Self {
            tables: output.migrations.len(),
            emitted_tables: output.emitted_migrations().count(),
            pivots: output.migrations.iter().filter(|m| m.pivot).count(),
            statements: output
                .emitted_migrations()
                .map(|m| m.statements.len())
                .sum(),
            models: output.emitted_models().count(),
            relations: output.emitted_models().map(|m| m.relations.len()).sum(),
            warnings: output.warnings.len(),
        }
    }

    /// Format the summary as a human-readable string.
    pub fn display(&self) -> String {
        let mut out = String::with_capacity(512);

        out.push_str("╔══════════════════════════════════════════════════╗\n");
        out.push_str("║         Generation Complete                      ║\n");
        out.push_str("╠══════════════════════════════════════════════════╣\n");
        out.push_str(&format!("║  Tables:      {:<35}║\n", self.tables));
        out.push_str(&format!("║    Emitted:   {:<35}║\n", self.emitted_tables));
        out.push_str(&format!("║    Pivots:    {:<35}║\n", self.pivots));
        out.push_str(&format!("║  Statements:  {:<35}║\n", self.statements));
        out.push_str(&format!("║  Models:      {:<35}║\n", self.models));
        out.push_str(&format!("║  Relations:   {:<35}║\n", self.relations));
        out.push_str(&format!("║  Warnings:    {:<35}║\n", self.warnings));
        out.push_str("╚══════════════════════════════════════════════════╝\n");

        out
    }
}

impl std::fmt::Display for GenerationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Produce a [`GenerationSummary`] from a [`GenerationOutput`].
pub fn summarize(output: &GenerationOutput) -> GenerationSummary {
    GenerationSummary::from_output(output)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ColumnHandle;
    use crate::rules::{ColumnRule, RuleContext};
    use crate::DescriptorSet;
    use laragen_core::{EngineError, ReferentialAction, RelationKind};
    use laragen_ir::{Field, Model};
    use pretty_assertions::assert_eq;

    /// Helper: users with posts, posts with timestamps.
    fn blog() -> SchemaDocument {
        SchemaDocument::new()
            .with_model(
                Model::new("Post")
                    .with_db_name("posts")
                    .with_field(Field::autoincrement_id())
                    .with_field(Field::scalar("title", "String"))
                    .with_field(
                        Field::relation("user", "User")
                            .in_relation("PostToUser")
                            .references(&["userId"], &["id"])
                            .on_delete(ReferentialAction::Cascade),
                    )
                    .with_field(Field::scalar("userId", "Int").with_db_name("user_id"))
                    .with_field(Field::scalar("created_at", "DateTime"))
                    .with_field(Field::scalar("updated_at", "DateTime")),
            )
            .with_model(
                Model::new("User")
                    .with_db_name("users")
                    .with_field(Field::autoincrement_id())
                    .with_field(Field::scalar("email", "String").unique())
                    .with_field(Field::relation("posts", "Post").in_relation("PostToUser").list()),
            )
    }

    /// Helper: posts and tags joined by an implicit junction table.
    fn tagged() -> SchemaDocument {
        SchemaDocument::new()
            .with_model(
                Model::new("Post")
                    .with_db_name("posts")
                    .with_field(Field::autoincrement_id())
                    .with_field(Field::relation("tags", "Tag").in_relation("PostToTag").list()),
            )
            .with_model(
                Model::new("Tag")
                    .with_db_name("tags")
                    .with_field(Field::autoincrement_id())
                    .with_field(Field::relation("posts", "Post").in_relation("PostToTag").list()),
            )
    }

    // ── Generator construction ───────────────────────────────────────────

    #[test]
    fn test_generator_defaults() {
        let generator = Generator::default();
        assert!(generator.config().implicit_pivots);
        assert_eq!(generator.rules().names().len(), 13);
    }

    #[test]
    fn test_generator_set_config() {
        let mut generator = Generator::with_defaults();
        generator.set_config(GeneratorConfig::new().without_implicit_pivots());
        assert!(!generator.config().implicit_pivots);
    }

    // ── Scenarios ────────────────────────────────────────────────────────

    #[test]
    fn test_users_and_posts() {
        let output = generate(&blog()).unwrap();

        assert_eq!(output.table_order(), vec!["users", "posts"]);
        assert_eq!(
            output.migration("posts").unwrap().statements,
            vec![
                "$table->id();",
                "$table->string('title');",
                "$table->foreignId('user_id')->constrained('users')->cascadeOnDelete();",
                "$table->timestamps();",
            ]
        );
        assert!(
            output
                .migration("users")
                .unwrap()
                .statements
                .contains(&"$table->unique('email');".to_string())
        );

        let user = output.model("User").unwrap();
        assert_eq!(user.relation("posts").unwrap().kind, RelationKind::HasMany);
        let post = output.model("Post").unwrap();
        assert_eq!(post.relation("user").unwrap().kind, RelationKind::BelongsTo);
        assert!(!output.has_warnings());
    }

    #[test]
    fn test_comments_commentable() {
        let doc = SchemaDocument::new().with_model(
            Model::new("Comment")
                .with_db_name("comments")
                .with_field(Field::autoincrement_id())
                .with_field(Field::scalar("body", "String"))
                .with_field(Field::scalar("commentable_id", "Int"))
                .with_field(Field::scalar("commentable_type", "String")),
        );
        let output = generate(&doc).unwrap();
        let unit = output.migration("comments").unwrap();

        assert_eq!(
            unit.statements,
            vec![
                "$table->id();",
                "$table->string('body');",
                "$table->morphs('commentable');",
            ]
        );
        let id = unit.descriptors.find("commentable_id").unwrap();
        let kind = unit.descriptors.find("commentable_type").unwrap();
        assert!(unit.descriptors.is_ignored(id));
        assert!(unit.descriptors.is_ignored(kind));

        let comment = output.model("Comment").unwrap();
        assert_eq!(comment.relation("commentable").unwrap().kind, RelationKind::MorphTo);
    }

    #[test]
    fn test_implicit_many_to_many() {
        let output = generate(&tagged()).unwrap();

        let post = output.model("Post").unwrap().relation("tags").unwrap();
        let tag = output.model("Tag").unwrap().relation("posts").unwrap();
        assert_eq!(post.kind, RelationKind::BelongsToManyImplicit);
        assert_eq!(tag.kind, RelationKind::BelongsToManyImplicit);
        assert_eq!(
            post.pivot.as_ref().map(|p| p.table.as_str()),
            tag.pivot.as_ref().map(|p| p.table.as_str())
        );

        assert_eq!(output.table_order(), vec!["posts", "tags", "posts_tags"]);
        let pivot = output.migration("posts_tags").unwrap();
        assert!(pivot.pivot);
        assert!(pivot.statements.contains(
            &"$table->foreignId('post_id')->constrained('posts')->cascadeOnDelete();".to_string()
        ));
        assert!(
            pivot
                .statements
                .contains(&"$table->primary(['post_id', 'tag_id']);".to_string())
        );
        assert!(output.model("PostsTags").is_none());
    }

    #[test]
    fn test_owned_key_beside_type_column_is_not_a_morph() {
        let doc = SchemaDocument::new()
            .with_model(
                Model::new("User")
                    .with_db_name("users")
                    .with_field(Field::autoincrement_id())
                    .with_field(Field::relation("assets", "Asset").in_relation("AssetToUser").list()),
            )
            .with_model(
                Model::new("Asset")
                    .with_db_name("assets")
                    .with_field(Field::autoincrement_id())
                    .with_field(Field::scalar("owner_id", "Int"))
                    .with_field(Field::scalar("owner_type", "String"))
                    .with_field(
                        Field::relation("owner", "User")
                            .in_relation("AssetToUser")
                            .references(&["owner_id"], &["id"]),
                    ),
            );

        let output = generate(&doc).unwrap();
        assert_eq!(
            output.migration("assets").unwrap().statements,
            vec![
                "$table->id();",
                "$table->foreignId('owner_id')->constrained('users');",
                "$table->string('owner_type');",
            ]
        );
        let asset = output.model("Asset").unwrap();
        assert_eq!(asset.relation("owner").unwrap().kind, RelationKind::BelongsTo);
        assert_eq!(asset.relations.len(), 1);
    }

    #[test]
    fn test_pivot_keys_keep_model_names_ending_in_s() {
        let doc = SchemaDocument::new()
            .with_model(
                Model::new("Status")
                    .with_db_name("statuses")
                    .with_field(Field::autoincrement_id())
                    .with_field(Field::relation("campuses", "Campus").in_relation("CampusToStatus").list()),
            )
            .with_model(
                Model::new("Campus")
                    .with_db_name("campuses")
                    .with_field(Field::autoincrement_id())
                    .with_field(Field::relation("statuses", "Status").in_relation("CampusToStatus").list()),
            );

        let output = generate(&doc).unwrap();
        let pivot = output.migration("campuses_statuses").unwrap();
        assert!(pivot.statements.contains(
            &"$table->foreignId('status_id')->constrained('statuses')->cascadeOnDelete();".to_string()
        ));
        assert!(pivot.statements.contains(
            &"$table->foreignId('campus_id')->constrained('campuses')->cascadeOnDelete();".to_string()
        ));

        let campuses = output.model("Status").unwrap().relation("campuses").unwrap();
        let keys = &campuses.pivot.as_ref().unwrap().foreign_pivot_keys;
        assert_eq!(keys, &vec!["status_id".to_string()]);
    }

    #[test]
    fn test_custom_morph_suffixes_keep_plain_columns() {
        let doc = SchemaDocument::new().with_model(
            Model::new("Comment")
                .with_db_name("comments")
                .with_field(Field::autoincrement_id())
                .with_field(Field::scalar("subjectRef", "Int"))
                .with_field(Field::scalar("subjectKind", "String")),
        );
        let generator = Generator::new(GeneratorConfig::new().with_morph_suffixes("Ref", "Kind"));
        let output = generator.generate(&doc).unwrap();

        assert_eq!(
            output.migration("comments").unwrap().statements,
            vec![
                "$table->id();",
                "$table->integer('subjectRef');",
                "$table->string('subjectKind');",
            ]
        );
        let comment = output.model("Comment").unwrap();
        assert_eq!(comment.relation("subject").unwrap().kind, RelationKind::MorphTo);
    }

    #[test]
    fn test_implicit_pivots_disabled() {
        let generator = Generator::new(GeneratorConfig::new().without_implicit_pivots());
        let output = generator.generate(&tagged()).unwrap();
        assert_eq!(output.table_order(), vec!["posts", "tags"]);
    }

    #[test]
    fn test_cycle_aborts() {
        let doc = SchemaDocument::new()
            .with_model(
                Model::new("Alpha")
                    .with_db_name("alphas")
                    .with_field(Field::autoincrement_id())
                    .with_field(Field::scalar("betaId", "Int").with_db_name("beta_id"))
                    .with_field(
                        Field::relation("beta", "Beta")
                            .in_relation("AlphaToBeta")
                            .references(&["betaId"], &["id"]),
                    )
                    .with_field(Field::relation("betas", "Beta").in_relation("BetaToAlpha").list()),
            )
            .with_model(
                Model::new("Beta")
                    .with_db_name("betas")
                    .with_field(Field::autoincrement_id())
                    .with_field(Field::scalar("alphaId", "Int").with_db_name("alpha_id"))
                    .with_field(
                        Field::relation("alpha", "Alpha")
                            .in_relation("BetaToAlpha")
                            .references(&["alphaId"], &["id"]),
                    )
                    .with_field(Field::relation("alphas", "Alpha").in_relation("AlphaToBeta").list()),
            );

        let err = generate(&doc).unwrap_err();
        assert!(err.is_cycle());
        match err {
            EngineError::DependencyCycle { stuck, .. } => assert_eq!(stuck, vec!["alphas", "betas"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_silent_model_still_ordered() {
        let mut doc = blog();
        doc.models[1].documentation = Some("@silent(migrations)".to_string());

        let output = generate(&doc).unwrap();
        assert_eq!(output.table_order(), vec!["users", "posts"]);
        assert!(output.migration("users").unwrap().silent);

        let emitted: Vec<&str> = output.emitted_migrations().map(|m| m.table.as_str()).collect();
        assert_eq!(emitted, vec!["posts"]);
    }

    #[test]
    fn test_dangling_reference_fails_fast() {
        let doc = SchemaDocument::new().with_model(
            Model::new("Post")
                .with_field(Field::autoincrement_id())
                .with_field(Field::relation("author", "Ghost")),
        );
        let err = generate(&doc).unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn test_collision_becomes_warning() {
        let doc = SchemaDocument::new()
            .with_model(
                Model::new("Comment")
                    .with_db_name("comments")
                    .with_field(Field::autoincrement_id())
                    .with_field(Field::scalar("commentable_id", "Int"))
                    .with_field(Field::scalar("commentable_type", "String"))
                    .with_field(Field::scalar("commentableId", "Int").with_db_name("owner_ref"))
                    .with_field(
                        Field::relation("commentable", "User")
                            .in_relation("CommentToUser")
                            .references(&["commentableId"], &["id"]),
                    ),
            )
            .with_model(
                Model::new("User")
                    .with_db_name("users")
                    .with_field(Field::autoincrement_id())
                    .with_field(Field::relation("comments", "Comment").in_relation("CommentToUser").list()),
            );

        let output = generate(&doc).unwrap();
        assert_eq!(output.warnings.len(), 1);
        let comment = output.model("Comment").unwrap();
        assert_eq!(comment.relation("commentable").unwrap().kind, RelationKind::BelongsTo);
    }

    // ── Caller rules ─────────────────────────────────────────────────────

    struct Money;

    impl ColumnRule for Money {
        fn name(&self) -> &str {
            "money"
        }

        fn test(&self, set: &DescriptorSet, handle: ColumnHandle, _ctx: &RuleContext) -> bool {
            set.get(handle).name == "price"
        }

        fn render(&self, set: &mut DescriptorSet, handle: ColumnHandle, _ctx: &RuleContext) -> Vec<String> {
            vec![format!("$table->unsignedDecimal('{}', 10, 2);", set.get(handle).name)]
        }
    }

    struct Shop;

    impl RuleProvider for Shop {
        fn rules(&self) -> Vec<Box<dyn ColumnRule>> {
            vec![Box::new(Money)]
        }
    }

    #[test]
    fn test_caller_rules() {
        let doc = SchemaDocument::new().with_model(
            Model::new("Product")
                .with_db_name("products")
                .with_field(Field::autoincrement_id())
                .with_field(Field::scalar("price", "Decimal")),
        );

        let mut generator = Generator::with_defaults();
        assert_eq!(generator.register_rules(&Shop).unwrap(), 1);
        let output = generator.generate(&doc).unwrap();
        assert_eq!(
            output.migration("products").unwrap().statements,
            vec!["$table->id();", "$table->unsignedDecimal('price', 10, 2);"]
        );

        let err = generator.register_rules(&Shop).unwrap_err();
        assert!(matches!(err, EngineError::RuleContract { .. }));
    }

    // ── Summary ──────────────────────────────────────────────────────────

    #[test]
    fn test_summary() {
        let output = generate(&tagged()).unwrap();
        let summary = summarize(&output);

        assert_eq!(summary.tables, 3);
        assert_eq!(summary.emitted_tables, 3);
        assert_eq!(summary.pivots, 1);
        assert_eq!(summary.models, 2);
        assert_eq!(summary.relations, 2);
        assert_eq!(summary.warnings, 0);

        let text = summary.to_string();
        assert!(text.contains("Generation Complete"));
        assert!(text.contains("Pivots:"));
    }
}
