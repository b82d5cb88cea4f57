//! Output rendering for CLI commands
//!
//! Text output is a readable preview of what the resolved units amount to;
//! it is not a template for the final PHP files.

use crate::OutputFormat;
use anyhow::{Result, bail};
use colored::Colorize;
use laragen_codegen::{GenerationOutput, MigrationUnit, ModelDescriptor, summarize};
use serde::Serialize;

// ============================================================================
// Migrations
// ============================================================================

#[derive(Serialize)]
struct MigrationView<'a> {
    table: &'a str,
    model: &'a str,
    migration: String,
    pivot: bool,
    dependencies: Vec<String>,
    statements: &'a [String],
}

impl<'a> From<&'a MigrationUnit> for MigrationView<'a> {
    fn from(unit: &'a MigrationUnit) -> Self {
        Self {
            table: &unit.table,
            model: &unit.model,
            migration: unit.migration_name(),
            pivot: unit.pivot,
            dependencies: unit.dependencies(),
            statements: &unit.statements,
        }
    }
}

/// Emitted migrations in dependency order, optionally a single table
pub fn migrations(output: &GenerationOutput, table: Option<&str>, format: OutputFormat) -> Result<String> {
    if let Some(table) = table {
        if output.migration(table).is_none() {
            bail!("unknown table '{}'", table);
        }
    }
    let units: Vec<&MigrationUnit> = output
        .emitted_migrations()
        .filter(|m| table.is_none_or(|t| m.table == t))
        .collect();

    if format == OutputFormat::Json {
        let views: Vec<MigrationView<'_>> = units.into_iter().map(MigrationView::from).collect();
        return Ok(serde_json::to_string_pretty(&views)? + "\n");
    }

    let mut out = String::new();
    for unit in units {
        out.push_str(&format!("{} {}\n", "//".dimmed(), unit.migration_name().cyan().bold()));
        out.push_str(&unit.schema_block());
        out.push('\n');
    }
    Ok(out)
}

// ============================================================================
// Models
// ============================================================================

/// Emitted models in document order, optionally a single model
pub fn models(output: &GenerationOutput, model: Option<&str>, format: OutputFormat) -> Result<String> {
    if let Some(model) = model {
        if output.model(model).is_none() {
            bail!("unknown model '{}'", model);
        }
    }
    let models: Vec<&ModelDescriptor> = output
        .emitted_models()
        .filter(|m| model.is_none_or(|name| m.class_name == name))
        .collect();

    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(&models)? + "\n");
    }

    let mut out = String::new();
    for model in models {
        out.push_str(&model_class(model));
        out.push('\n');
    }
    Ok(out)
}

fn model_class(model: &ModelDescriptor) -> String {
    let mut out = String::new();
    let extends = model.extends.as_ref().map(|e| e.short_name()).unwrap_or("Model");

    if let Some(comment) = &model.comment {
        out.push_str(&format!("{}\n", format!("/** {} */", comment).dimmed()));
    }
    out.push_str(&format!(
        "{} {} extends {}\n{{\n",
        "class".magenta(),
        model.class_name.bold(),
        extends
    ));

    let mut traits: Vec<&str> = model.traits.iter().map(|t| t.short_name()).collect();
    if model.soft_deletes {
        traits.push("SoftDeletes");
    }
    if !traits.is_empty() {
        out.push_str(&format!("    use {};\n\n", traits.join(", ")));
    }

    out.push_str(&format!("    protected $table = '{}';\n", model.table));
    if let [key] = model.primary_key.as_slice() {
        if key != "id" {
            out.push_str(&format!("    protected $primaryKey = '{}';\n", key));
        }
    }
    if !model.incrementing {
        out.push_str("    public $incrementing = false;\n");
    }
    if model.key_type != "int" {
        out.push_str(&format!("    protected $keyType = '{}';\n", model.key_type));
    }
    if !model.timestamps {
        out.push_str("    public $timestamps = false;\n");
    }
    for (name, values) in [
        ("fillable", &model.fillable),
        ("hidden", &model.hidden),
        ("guarded", &model.guarded),
        ("with", &model.with),
    ] {
        if !values.is_empty() {
            out.push_str(&format!("    protected ${} = {};\n", name, php_list(values)));
        }
    }
    if !model.casts.is_empty() {
        let entries: Vec<String> = model
            .casts
            .iter()
            .map(|(column, cast)| format!("'{}' => '{}'", column, cast))
            .collect();
        out.push_str(&format!("    protected $casts = [{}];\n", entries.join(", ")));
    }

    for relation in &model.relations {
        out.push_str(&format!(
            "\n    public function {}()\n    {{\n        return {};\n    }}\n",
            relation.name.green(),
            relation.eloquent_call()
        ));
    }
    out.push_str("}\n");
    out
}

fn php_list(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("'{}'", v)).collect();
    format!("[{}]", items.join(", "))
}

// ============================================================================
// Check
// ============================================================================

/// Summary of a compilation plus its warnings
pub fn check(output: &GenerationOutput, format: OutputFormat) -> Result<String> {
    let summary = summarize(output);

    if format == OutputFormat::Json {
        let value = serde_json::json!({
            "tables": summary.tables,
            "emitted_tables": summary.emitted_tables,
            "pivots": summary.pivots,
            "statements": summary.statements,
            "models": summary.models,
            "relations": summary.relations,
            "order": output.table_order(),
            "warnings": output.warnings,
        });
        return Ok(serde_json::to_string_pretty(&value)? + "\n");
    }

    let mut out = summary.display();
    for warning in &output.warnings {
        out.push_str(&format!("{} {}\n", "warning:".yellow().bold(), warning));
    }
    out.push_str(&format!("{}\n", "✓ schema compiles".green()));
    Ok(out)
}
