//! # Implicit Pivot Synthesis
//!
//! Implicit many-to-many relations have no junction model in the schema.
//! For each distinct pivot table one is synthesized here: a key column per
//! side typed like that side's primary key, an owning relation to each
//! side, and a composite primary key over all key columns. The result is
//! an ordinary [`Model`] that goes through the same descriptor, resolution
//! and ordering pipeline as the declared ones.

use heck::{ToLowerCamelCase, ToUpperCamelCase};
use laragen_core::{EngineError, EngineResult, ReferentialAction, RelationKind};
use laragen_ir::{Field, Model, RelationDefinition, RelationSet, SchemaDocument};
use std::collections::HashMap;

/// Synthesize one pivot model per implicit many-to-many junction table,
/// in order of first appearance.
pub fn synthesize_pivots(doc: &SchemaDocument, relations: &[(String, RelationSet)]) -> EngineResult<Vec<Model>> {
    let mut order: Vec<(&str, &RelationDefinition)> = Vec::new();
    let mut timestamps: HashMap<String, bool> = HashMap::new();

    for (model, set) in relations {
        for relation in &set.relations {
            if relation.kind != RelationKind::BelongsToManyImplicit {
                continue;
            }
            let Some(pivot) = &relation.pivot else {
                continue;
            };
            let entry = timestamps.entry(pivot.table.clone()).or_insert(false);
            *entry |= pivot.with_timestamps;
            if !order.iter().any(|(_, r)| r.pivot.as_ref().map(|p| &p.table) == Some(&pivot.table)) {
                order.push((model.as_str(), relation));
            }
        }
    }

    let mut pivots = Vec::with_capacity(order.len());
    for (model, relation) in order {
        let with_timestamps = relation
            .pivot
            .as_ref()
            .and_then(|p| timestamps.get(&p.table).copied())
            .unwrap_or(false);
        let pivot = pivot_model(doc, model, relation, with_timestamps)?;
        tracing::debug!(table = %pivot.table_name(), "Synthesized implicit pivot");
        pivots.push(pivot);
    }
    Ok(pivots)
}

fn pivot_model(
    doc: &SchemaDocument,
    model_name: &str,
    relation: &RelationDefinition,
    with_timestamps: bool,
) -> EngineResult<Model> {
    let spec = relation
        .pivot
        .as_ref()
        .ok_or_else(|| EngineError::internal("implicit many-to-many without pivot"))?;
    let owner = doc.require_model(model_name)?;
    let related_name = relation
        .target
        .as_deref()
        .ok_or_else(|| EngineError::internal("implicit many-to-many without target"))?;
    let related = doc.require_model(related_name)?;

    let own_accessor = owner.name.to_lower_camel_case();
    let related_accessor = if owner.name == related.name {
        format!("related{}", related.name.to_upper_camel_case())
    } else {
        related.name.to_lower_camel_case()
    };

    let mut pivot = Model::new(spec.table.to_upper_camel_case()).with_db_name(&spec.table);
    let mut key_fields: Vec<String> = Vec::new();

    let sides = [
        (owner, &spec.foreign_pivot_keys, &relation.local_keys, own_accessor),
        (related, &spec.related_pivot_keys, &relation.foreign_keys, related_accessor),
    ];
    let mut relation_fields = Vec::with_capacity(2);
    for (side, pivot_columns, referenced, accessor) in sides {
        let mut from = Vec::with_capacity(pivot_columns.len());
        let mut to = Vec::with_capacity(referenced.len());
        for (column, target_column) in pivot_columns.iter().zip(referenced.iter()) {
            let key = side
                .fields
                .iter()
                .find(|f| f.is_column() && f.column_name() == target_column.as_str())
                .ok_or_else(|| {
                    EngineError::inconsistency(
                        &side.name,
                        format!("primary key column '{}' has no field", target_column),
                    )
                })?;
            pivot = pivot.with_field(key_column(column, key));
            key_fields.push(column.clone());
            from.push(column.as_str());
            to.push(key.name.as_str());
        }
        relation_fields.push(
            Field::relation(&accessor, &side.name)
                .in_relation(format!("{}_{}", spec.table, accessor))
                .references(&from, &to)
                .on_delete(ReferentialAction::Cascade),
        );
    }

    if with_timestamps {
        pivot = pivot
            .with_field(Field::scalar("created_at", "DateTime").optional())
            .with_field(Field::scalar("updated_at", "DateTime").optional());
    }
    for field in relation_fields {
        pivot = pivot.with_field(field);
    }

    let keys: Vec<&str> = key_fields.iter().map(String::as_str).collect();
    Ok(pivot.with_primary_key(&keys))
}

/// A required key column typed like `key`, without its identity traits.
/// App-side uuid/ulid generators are kept so the column type matches.
fn key_column(name: &str, key: &Field) -> Field {
    let mut field = Field::new(name, key.kind, &key.type_name);
    field.native_type = key.native_type.clone();
    if let Some(generator) = key.default_generator() {
        if matches!(generator.name.as_str(), "uuid" | "ulid") {
            field.default = key.default.clone();
        }
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use laragen_ir::{InferenceOptions, infer_document};
    use pretty_assertions::assert_eq;

    fn blog() -> SchemaDocument {
        SchemaDocument::new()
            .with_model(
                Model::new("Post")
                    .with_db_name("posts")
                    .with_field(Field::autoincrement_id())
                    .with_field(
                        Field::relation("tags", "Tag")
                            .in_relation("PostToTag")
                            .list()
                            .with_doc("@withTimestamps"),
                    ),
            )
            .with_model(
                Model::new("Tag")
                    .with_db_name("tags")
                    .with_field(Field::scalar("id", "String").id().with_default_fn("uuid", vec![]))
                    .with_field(Field::relation("posts", "Post").in_relation("PostToTag").list()),
            )
    }

    #[test]
    fn test_one_pivot_per_table() {
        let doc = blog();
        let relations = infer_document(&doc, &InferenceOptions::default()).unwrap();
        let pivots = synthesize_pivots(&doc, &relations).unwrap();
        assert_eq!(pivots.len(), 1);

        let pivot = &pivots[0];
        assert_eq!(pivot.name, "PostsTags");
        assert_eq!(pivot.table_name(), "posts_tags");
        assert_eq!(pivot.primary_key_columns(), vec!["post_id", "tag_id"]);

        let names: Vec<&str> = pivot.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["post_id", "tag_id", "created_at", "updated_at", "post", "tag"]);

        assert_eq!(pivot.field("post_id").unwrap().type_name, "Int");
        assert_eq!(
            pivot.field("tag_id").unwrap().default_generator().map(|g| g.name.as_str()),
            Some("uuid")
        );

        let tag = pivot.field("tag").unwrap();
        assert!(tag.is_owning());
        assert_eq!(tag.relation_from_fields, vec!["tag_id"]);
        assert_eq!(tag.relation_to_fields, vec!["id"]);
    }

    #[test]
    fn test_self_relation_pivot() {
        let doc = SchemaDocument::new().with_model(
            Model::new("User")
                .with_db_name("users")
                .with_field(Field::autoincrement_id())
                .with_field(Field::relation("followers", "User").in_relation("Follows").list())
                .with_field(Field::relation("following", "User").in_relation("Follows").list()),
        );
        let relations = infer_document(&doc, &InferenceOptions::default()).unwrap();
        let pivots = synthesize_pivots(&doc, &relations).unwrap();
        assert_eq!(pivots.len(), 1);

        let pivot = &pivots[0];
        assert_eq!(pivot.primary_key_columns(), vec!["user_id", "related_user_id"]);
        assert!(pivot.field("user").is_some());
        assert!(pivot.field("relatedUser").is_some());
    }
}
