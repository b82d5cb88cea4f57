//! # Relationship Inference
//!
//! Recovers Eloquent relations from the relation fields of a schema
//! document. Each relation field is resolved against its counterpart (the
//! field on the related model sharing the same relation name):
//!
//! | field   | this side owns FK | counterpart          | result                  |
//! |---------|-------------------|----------------------|-------------------------|
//! | single  | yes               | any                  | `belongsTo`             |
//! | single  | no                | owns FK, single      | `hasOne`                |
//! | single  | no                | owns FK, list        | `hasMany`               |
//! | list    | no                | list, no FK          | implicit `belongsToMany`|
//! | list    | -                 | owns FK on a pivot   | explicit `belongsToMany`|
//! | list    | -                 | owns FK              | `hasMany`               |
//!
//! To-many fields take the first matching row in the order above.
//! Polymorphic relations are merged in afterwards (see [`crate::polymorphic`]).

use crate::directive::DirectiveSet;
use crate::field::Field;
use crate::model::Model;
use crate::naming;
use crate::polymorphic;
use crate::relationship::{PivotSpec, RelationDefinition, RelationSet};
use crate::schema::SchemaDocument;
use laragen_core::{EngineError, EngineResult, RelationKind};
use std::collections::BTreeSet;

// ============================================================================
// Options
// ============================================================================

/// Naming conventions used while inferring relations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceOptions {
    /// Identifier suffixes stripped from field names to derive accessors
    pub relation_suffixes: Vec<String>,
    /// Suffix of a polymorphic id column
    pub morph_id_suffix: String,
    /// Suffix of a polymorphic type column
    pub morph_type_suffix: String,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            relation_suffixes: vec!["Id".to_string(), "_id".to_string(), "ID".to_string()],
            morph_id_suffix: "_id".to_string(),
            morph_type_suffix: "_type".to_string(),
        }
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Infer every relation of `model_name`, each exactly once
pub fn infer_relations(
    doc: &SchemaDocument,
    model_name: &str,
    opts: &InferenceOptions,
) -> EngineResult<RelationSet> {
    let model = doc.require_model(model_name)?;
    let mut set = RelationSet::default();

    for field in model.relation_fields() {
        let directives = DirectiveSet::from_doc(field.documentation.as_deref())?;
        if directives.silent_in_models() {
            continue;
        }
        if let Some(relation) = infer_field(doc, model, field, &directives, opts)? {
            tracing::debug!(
                model = %model.name,
                field = %field.name,
                kind = %relation.kind,
                "Inferred relation"
            );
            set.register(&model.name, relation);
        }
    }

    for relation in polymorphic::detect_morph_to(model, opts) {
        set.register(&model.name, relation);
    }

    let model_directives = DirectiveSet::from_doc(model.documentation.as_deref())?;
    for relation in polymorphic::owner_morphs(doc, model, &model_directives, opts)? {
        set.register(&model.name, relation);
    }

    Ok(set)
}

/// Infer relations for every model, in document order
pub fn infer_document(
    doc: &SchemaDocument,
    opts: &InferenceOptions,
) -> EngineResult<Vec<(String, RelationSet)>> {
    doc.models
        .iter()
        .map(|m| Ok((m.name.clone(), infer_relations(doc, &m.name, opts)?)))
        .collect()
}

// ============================================================================
// Field resolution
// ============================================================================

fn infer_field(
    doc: &SchemaDocument,
    model: &Model,
    field: &Field,
    directives: &DirectiveSet,
    opts: &InferenceOptions,
) -> EngineResult<Option<RelationDefinition>> {
    let target = doc.model(&field.type_name).ok_or_else(|| {
        EngineError::inconsistency(
            &model.name,
            format!(
                "relation field '{}' targets unknown model '{}'",
                field.name, field.type_name
            ),
        )
    })?;
    let counterpart = find_counterpart(model, field, target);
    let name = accessor_name(&field.name, opts);

    if !field.is_owning() && counterpart.is_none() {
        return Err(EngineError::inconsistency(
            &model.name,
            format!(
                "relation field '{}' has no counterpart on '{}'",
                field.name, target.name
            ),
        ));
    }

    if field.is_list {
        let Some(counterpart) = counterpart else {
            return Ok(None);
        };

        if !field.is_owning() && !counterpart.is_owning() && counterpart.is_list {
            return Ok(Some(implicit_many_to_many(
                model,
                field,
                target,
                counterpart,
                directives,
                name,
            )));
        }

        if let Some(relation) =
            explicit_many_to_many(doc, model, field, target, counterpart, directives, &name)?
        {
            return Ok(Some(relation));
        }

        if counterpart.is_owning() {
            return Ok(Some(
                RelationDefinition::new(name, RelationKind::HasMany, Some(target.name.clone()))
                    .from_field(&field.name)
                    .with_keys(
                        target.columns_of(&counterpart.relation_from_fields),
                        model.columns_of(&counterpart.relation_to_fields),
                    ),
            ));
        }
        return Ok(None);
    }

    if field.is_owning() {
        return Ok(Some(
            RelationDefinition::new(name, RelationKind::BelongsTo, Some(target.name.clone()))
                .from_field(&field.name)
                .with_keys(
                    model.columns_of(&field.relation_from_fields),
                    target.columns_of(&field.relation_to_fields),
                ),
        ));
    }

    match counterpart {
        Some(cp) if cp.is_owning() => {
            let kind = if cp.is_list {
                RelationKind::HasMany
            } else {
                RelationKind::HasOne
            };
            Ok(Some(
                RelationDefinition::new(name, kind, Some(target.name.clone()))
                    .from_field(&field.name)
                    .with_keys(
                        target.columns_of(&cp.relation_from_fields),
                        model.columns_of(&cp.relation_to_fields),
                    ),
            ))
        }
        _ => Ok(None),
    }
}

/// The field on `target` sharing `field`'s relation name and pointing back
/// at `model`; for self relations, the other field
fn find_counterpart<'a>(model: &Model, field: &Field, target: &'a Model) -> Option<&'a Field> {
    target.relation_fields().find(|candidate| {
        candidate.relation_name == field.relation_name
            && candidate.type_name == model.name
            && !(target.name == model.name && candidate.name == field.name)
    })
}

/// Accessor name: the field name with any identifier suffix stripped
pub fn accessor_name(field_name: &str, opts: &InferenceOptions) -> String {
    naming::camel(naming::strip_identifier_suffix(
        field_name,
        &opts.relation_suffixes,
    ))
}

// ============================================================================
// Many-to-many
// ============================================================================

fn implicit_many_to_many(
    model: &Model,
    field: &Field,
    target: &Model,
    counterpart: &Field,
    directives: &DirectiveSet,
    name: String,
) -> RelationDefinition {
    let local_keys = model.primary_key_columns();
    let related_keys = target.primary_key_columns();

    let own_side: Vec<String> = local_keys
        .iter()
        .map(|c| naming::pivot_key_column(&model.name, c))
        .collect();
    let related_side: Vec<String> = related_keys
        .iter()
        .map(|c| naming::pivot_key_column(&target.name, c))
        .collect();

    // Self relations: the field sorting first owns the unprefixed columns,
    // so both sides agree on the same junction layout.
    let (foreign_pivot_keys, related_pivot_keys) = if model.name == target.name {
        let prefixed = |cols: &[String]| -> Vec<String> {
            cols.iter().map(|c| format!("related_{}", c)).collect()
        };
        if field.name <= counterpart.name {
            (own_side, prefixed(&related_side))
        } else {
            (prefixed(&own_side), related_side)
        }
    } else {
        (own_side, related_side)
    };

    RelationDefinition::new(
        name,
        RelationKind::BelongsToManyImplicit,
        Some(target.name.clone()),
    )
    .from_field(&field.name)
    .with_keys(related_keys, local_keys)
    .with_pivot(PivotSpec {
        table: naming::pivot_table_name(model.table_name(), target.table_name()),
        foreign_pivot_keys,
        related_pivot_keys,
        extra_columns: Vec::new(),
        with_timestamps: directives.with_timestamps,
        alias: directives.pivot_alias.clone(),
        using: None,
    })
}

/// Try to read `pivot` as a junction model between `model` and exactly one
/// other model. Ambiguous layouts are not a pivot.
fn explicit_many_to_many(
    doc: &SchemaDocument,
    model: &Model,
    field: &Field,
    pivot: &Model,
    back: &Field,
    directives: &DirectiveSet,
    name: &str,
) -> EngineResult<Option<RelationDefinition>> {
    if !back.is_owning() || field.is_owning() {
        return Ok(None);
    }

    let owning: Vec<&Field> = pivot.owning_relations().collect();
    let back_refs = owning.iter().filter(|f| f.type_name == model.name).count();
    let others: Vec<&&Field> = owning.iter().filter(|f| f.name != back.name).collect();
    let [other] = others.as_slice() else {
        return Ok(None);
    };

    let self_join = other.type_name == model.name;
    let expected_back_refs = if self_join { 2 } else { 1 };
    if back_refs != expected_back_refs {
        return Ok(None);
    }

    let back_cols = pivot.columns_of(&back.relation_from_fields);
    let other_cols = pivot.columns_of(&other.relation_from_fields);
    let back_set: BTreeSet<&String> = back_cols.iter().collect();
    let other_set: BTreeSet<&String> = other_cols.iter().collect();
    if !back_set.is_disjoint(&other_set) {
        return Ok(None);
    }
    let union: BTreeSet<&String> = back_set.union(&other_set).copied().collect();
    let constrained = pivot
        .unique_sets()
        .iter()
        .any(|set| set.iter().collect::<BTreeSet<_>>() == union);
    if !constrained {
        return Ok(None);
    }

    let related = doc.model(&other.type_name).ok_or_else(|| {
        EngineError::inconsistency(
            &pivot.name,
            format!(
                "relation field '{}' targets unknown model '{}'",
                other.name, other.type_name
            ),
        )
    })?;

    let pivot_directives = DirectiveSet::from_doc(pivot.documentation.as_deref())?;
    let mut extra_columns = Vec::new();
    for column in pivot.columns() {
        let column_directives = DirectiveSet::from_doc(column.documentation.as_deref())?;
        let col = column.column_name().to_string();
        if column_directives.pivot && !union.contains(&col) {
            extra_columns.push(col);
        }
    }

    Ok(Some(
        RelationDefinition::new(
            name,
            RelationKind::BelongsToManyExplicit,
            Some(related.name.clone()),
        )
        .from_field(&field.name)
        .with_keys(
            related.columns_of(&other.relation_to_fields),
            model.columns_of(&back.relation_to_fields),
        )
        .with_pivot(PivotSpec {
            table: pivot.table_name().to_string(),
            foreign_pivot_keys: back_cols,
            related_pivot_keys: other_cols,
            extra_columns,
            with_timestamps: directives.with_timestamps || pivot_directives.with_timestamps,
            alias: directives
                .pivot_alias
                .clone()
                .or(pivot_directives.pivot_alias),
            using: Some(pivot.name.clone()),
        }),
    ))
}

// ============================================================================
// Tests
// ============================================================================
