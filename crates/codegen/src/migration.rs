//! # Migration Units
//!
//! One [`MigrationUnit`] per table: the resolved statements plus the
//! descriptor set they came from. Units of silenced models are still
//! compiled and ordered; they are only left out of the emitted output.

use crate::context::GenerationContext;
use crate::descriptor::{DescriptorSet, build_descriptors};
use crate::resolve::resolve;
use crate::rules::{RuleContext, RuleSet};
use laragen_core::EngineResult;
use laragen_ir::Model;
use serde::{Deserialize, Serialize};

/// The compiled migration of one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationUnit {
    /// Source model name
    pub model: String,

    /// Physical table name
    pub table: String,

    /// Schema builder statements in order
    pub statements: Vec<String>,

    /// Descriptors after resolution (suppression state included)
    pub descriptors: DescriptorSet,

    /// Compiled but not emitted (`@silent` / `@ignore` on the model)
    pub silent: bool,

    /// Synthesized pivot table for an implicit many-to-many relation
    pub pivot: bool,
}

impl MigrationUnit {
    /// Tables this unit must be created after
    pub fn dependencies(&self) -> Vec<String> {
        self.descriptors
            .dependencies()
            .into_iter()
            .filter(|t| t != &self.table)
            .collect()
    }

    /// Conventional migration class suffix, e.g. `create_users_table`
    pub fn migration_name(&self) -> String {
        format!("create_{}_table", self.table)
    }

    /// Render the `Schema::create` block
    pub fn schema_block(&self) -> String {
        let mut out = format!(
            "Schema::create('{}', function (Blueprint $table) {{\n",
            self.table
        );
        for statement in &self.statements {
            out.push_str("    ");
            out.push_str(statement);
            out.push('\n');
        }
        out.push_str("});\n");
        out
    }
}

/// Compile a model of the document into its migration unit
pub fn compile_model(ctx: &GenerationContext<'_>, rules: &RuleSet, model: &Model) -> EngineResult<MigrationUnit> {
    let silent = ctx.model_directives(&model.name).silent_in_migrations();
    compile(ctx, rules, model, silent, false)
}

/// Compile a synthesized pivot model
pub fn compile_pivot(ctx: &GenerationContext<'_>, rules: &RuleSet, model: &Model) -> EngineResult<MigrationUnit> {
    compile(ctx, rules, model, false, true)
}

fn compile(
    ctx: &GenerationContext<'_>,
    rules: &RuleSet,
    model: &Model,
    silent: bool,
    pivot: bool,
) -> EngineResult<MigrationUnit> {
    let mut descriptors = build_descriptors(ctx, model)?;
    let rule_ctx = RuleContext::new(&model.name, model.table_name());
    let statements = resolve(&mut descriptors, rules, &rule_ctx);

    Ok(MigrationUnit {
        model: model.name.clone(),
        table: model.table_name().to_string(),
        statements,
        descriptors,
        silent,
        pivot,
    })
}
