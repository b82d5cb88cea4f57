//! Polymorphic relations
//!
//! Two independent passes:
//!
//! - child side: a model carrying a `<base>_id` / `<base>_type` column pair
//!   gets a `morphTo` accessor named after the base;
//! - owner side: `@morph(...)` directives on a model declare `morphOne`,
//!   `morphMany`, `morphToMany` or `morphedByMany` accessors.

use crate::directive::DirectiveSet;
use crate::inference::InferenceOptions;
use crate::model::Model;
use crate::naming;
use crate::relationship::{MorphSpec, PivotSpec, RelationDefinition};
use crate::schema::SchemaDocument;
use laragen_core::{EngineError, EngineResult, RelationKind};
use std::collections::HashSet;

/// Detect `<base><id suffix>` / `<base><type suffix>` column pairs.
/// Pairs whose id column is the local column of an owned foreign key are
/// ordinary `belongsTo` relations and are skipped.
pub fn detect_morph_to(model: &Model, opts: &InferenceOptions) -> Vec<RelationDefinition> {
    if opts.morph_id_suffix.is_empty() || opts.morph_type_suffix.is_empty() {
        return Vec::new();
    }

    let fk_columns: HashSet<String> = model
        .owning_relations()
        .flat_map(|rel| model.columns_of(&rel.relation_from_fields))
        .collect();
    let columns: Vec<&str> = model.columns().map(|f| f.column_name()).collect();

    let mut relations = Vec::new();
    for column in &columns {
        let Some(base) = column.strip_suffix(opts.morph_id_suffix.as_str()) else {
            continue;
        };
        if base.is_empty() || fk_columns.contains(*column) {
            continue;
        }
        let type_column = format!("{}{}", base, opts.morph_type_suffix);
        if !columns.contains(&type_column.as_str()) {
            continue;
        }
        tracing::debug!(model = %model.name, base = %base, "Detected polymorphic column pair");
        relations.push(
            RelationDefinition::new(naming::camel(base), RelationKind::MorphTo, None).with_morph(
                MorphSpec {
                    base: base.to_string(),
                    id_column: column.to_string(),
                    type_column,
                },
            ),
        );
    }
    relations
}

/// Build owner-side relations from `@morph` directives on `model`
pub fn owner_morphs(
    doc: &SchemaDocument,
    model: &Model,
    directives: &DirectiveSet,
    opts: &InferenceOptions,
) -> EngineResult<Vec<RelationDefinition>> {
    let mut relations = Vec::with_capacity(directives.morphs.len());

    for morph in &directives.morphs {
        let target = doc.model(&morph.model).ok_or_else(|| {
            EngineError::inconsistency(
                &model.name,
                format!("@morph '{}' targets unknown model '{}'", morph.name, morph.model),
            )
        })?;

        let name = match &morph.alias {
            Some(alias) => alias.clone(),
            None => {
                let base = naming::camel(&target.name);
                if morph.cardinality.is_multi_valued() {
                    naming::pluralize(&base)
                } else {
                    base
                }
            }
        };

        let spec = MorphSpec {
            base: morph.name.clone(),
            id_column: morph
                .id
                .clone()
                .unwrap_or_else(|| format!("{}{}", morph.name, opts.morph_id_suffix)),
            type_column: morph
                .type_column
                .clone()
                .unwrap_or_else(|| format!("{}{}", morph.name, opts.morph_type_suffix)),
        };

        let kind = morph.cardinality.relation_kind();
        let mut relation = RelationDefinition::new(name, kind, Some(target.name.clone()))
            .with_keys(vec![spec.id_column.clone()], model.primary_key_columns())
            .with_morph(spec)
            .with_chain(morph.chain.clone());

        if kind.is_pivot() {
            relation = relation.with_pivot(PivotSpec {
                table: morph
                    .table
                    .clone()
                    .unwrap_or_else(|| naming::pluralize(&morph.name)),
                ..PivotSpec::default()
            });
        }
        relations.push(relation);
    }
    Ok(relations)
}
