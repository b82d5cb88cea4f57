//! # Model Descriptors
//!
//! The model-side counterpart of a migration unit: everything an Eloquent
//! class needs, resolved from the schema and its directives. Rendering the
//! PHP class itself happens outside this crate.

use crate::context::GenerationContext;
use crate::descriptor::{ColumnDescriptor, DescriptorSet};
use laragen_core::ColumnType;
use laragen_ir::{DirectiveSet, Model, NamespacedRef, RelationDefinition, RelationSet};
use serde::{Deserialize, Serialize};

const CREATED_AT: &str = "created_at";
const UPDATED_AT: &str = "updated_at";
const DELETED_AT: &str = "deleted_at";
const REMEMBER_TOKEN: &str = "remember_token";

// ============================================================================
// Types
// ============================================================================

/// One attribute of an Eloquent model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    /// Physical column name (the attribute key)
    pub column: String,
    /// Source field name
    pub field: String,
    /// PHP type without nullability
    pub php_type: String,
    pub nullable: bool,
    pub cast: Option<String>,
    pub fillable: bool,
    pub hidden: bool,
    pub guarded: bool,
    pub comment: Option<String>,
}

impl PropertyDescriptor {
    /// Docblock type, e.g. `int` or `string|null`
    pub fn doc_type(&self) -> String {
        if self.nullable {
            format!("{}|null", self.php_type)
        } else {
            self.php_type.clone()
        }
    }
}

/// Everything needed to emit one Eloquent model class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub class_name: String,
    pub table: String,
    pub primary_key: Vec<String>,
    pub incrementing: bool,
    /// `int` or `string`
    pub key_type: String,
    pub timestamps: bool,
    pub soft_deletes: bool,
    pub properties: Vec<PropertyDescriptor>,
    pub relations: Vec<RelationDefinition>,
    pub fillable: Vec<String>,
    pub hidden: Vec<String>,
    pub guarded: Vec<String>,
    pub with: Vec<String>,
    /// Attribute casts in declaration order
    pub casts: Vec<(String, String)>,
    pub traits: Vec<NamespacedRef>,
    pub implements: Vec<NamespacedRef>,
    pub observer: Option<NamespacedRef>,
    pub factory: Option<NamespacedRef>,
    pub extends: Option<NamespacedRef>,
    pub comment: Option<String>,
    /// Built but not emitted (`@silent(models)`)
    pub silent: bool,
}

impl ModelDescriptor {
    pub fn property(&self, column: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.column == column)
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDefinition> {
        self.relations.iter().find(|r| r.name == name)
    }

    pub fn cast(&self, column: &str) -> Option<&str> {
        self.casts
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, cast)| cast.as_str())
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Build the model descriptor of `model`
pub fn build_model_descriptor(
    ctx: &GenerationContext<'_>,
    model: &Model,
    relations: &RelationSet,
    descriptors: &DescriptorSet,
) -> ModelDescriptor {
    let directives = ctx.model_directives(&model.name);
    let columns: Vec<&ColumnDescriptor> = descriptors
        .iter()
        .filter(|d| !d.is_marker())
        .filter(|d| !ctx.field_directives(&model.name, &d.field_name).silent_in_models())
        .collect();
    let has = |name: &str| columns.iter().any(|d| d.name == name);

    let timestamps = has(CREATED_AT) && has(UPDATED_AT);
    let soft_deletes = has(DELETED_AT);
    let primary_key = model.primary_key_columns();
    let primary: Vec<&&ColumnDescriptor> = columns.iter().filter(|d| d.primary).collect();
    let incrementing = matches!(primary.as_slice(), [only] if only.auto_increment);
    let key_type = match primary.as_slice() {
        [only] if only.column_type.is_integer() => "int",
        [] => "int",
        _ => "string",
    };

    let field_flag = |d: &ColumnDescriptor, pick: fn(&DirectiveSet) -> bool| {
        pick(ctx.field_directives(&model.name, &d.field_name))
    };
    let listed = |list: &Option<Vec<String>>, d: &ColumnDescriptor| {
        list.as_ref()
            .map(|l| l.iter().any(|n| n == &d.name || n == &d.field_name))
            .unwrap_or(false)
    };

    let hidden: Vec<String> = columns
        .iter()
        .filter(|d| listed(&directives.hidden, d) || field_flag(d, |f| f.hidden.is_some()))
        .map(|d| d.name.clone())
        .collect();
    let guarded: Vec<String> = columns
        .iter()
        .filter(|d| listed(&directives.guarded, d) || field_flag(d, |f| f.guarded.is_some()))
        .map(|d| d.name.clone())
        .collect();

    let explicit_fillable =
        directives.fillable.is_some() || columns.iter().any(|d| field_flag(d, |f| f.fillable.is_some()));
    let fillable: Vec<String> = if explicit_fillable {
        columns
            .iter()
            .filter(|d| listed(&directives.fillable, d) || field_flag(d, |f| f.fillable.is_some()))
            .map(|d| d.name.clone())
            .collect()
    } else if guarded.is_empty() {
        columns
            .iter()
            .filter(|d| !d.primary && !d.auto_increment && !is_managed(&d.name, timestamps, soft_deletes))
            .map(|d| d.name.clone())
            .collect()
    } else {
        Vec::new()
    };

    let mut properties = Vec::with_capacity(columns.len());
    let mut casts = Vec::new();
    for d in &columns {
        let field_directives = ctx.field_directives(&model.name, &d.field_name);
        let cast = field_directives
            .cast
            .as_ref()
            .and_then(|c| c.value.clone())
            .or_else(|| structured_entry(&directives.cast, d))
            .or_else(|| {
                if is_managed(&d.name, timestamps, soft_deletes) {
                    None
                } else {
                    derived_cast(d)
                }
            });
        if let Some(cast) = &cast {
            casts.push((d.name.clone(), cast.clone()));
        }

        let php_type = field_directives
            .type_hint
            .as_ref()
            .and_then(|t| t.value.clone())
            .or_else(|| structured_entry(&directives.type_hint, d))
            .unwrap_or_else(|| php_type(d.column_type).to_string());

        properties.push(PropertyDescriptor {
            column: d.name.clone(),
            field: d.field_name.clone(),
            php_type,
            nullable: d.nullable,
            cast,
            fillable: fillable.contains(&d.name),
            hidden: hidden.contains(&d.name),
            guarded: guarded.contains(&d.name),
            comment: d.comment.clone(),
        });
    }

    tracing::debug!(
        model = %model.name,
        properties = properties.len(),
        relations = relations.len(),
        casts = casts.len(),
        "Built model descriptor"
    );

    ModelDescriptor {
        class_name: model.name.clone(),
        table: model.table_name().to_string(),
        primary_key,
        incrementing,
        key_type: key_type.to_string(),
        timestamps,
        soft_deletes,
        properties,
        relations: relations.relations.clone(),
        fillable,
        hidden,
        guarded,
        with: directives.with.clone().unwrap_or_default(),
        casts,
        traits: directives.traits.clone(),
        implements: directives.implements.clone(),
        observer: directives.observer.clone(),
        factory: directives.factory.clone(),
        extends: directives.extends.clone(),
        comment: directives.comment.clone(),
        silent: directives.silent_in_models(),
    }
}

/// Columns Eloquent maintains itself
fn is_managed(column: &str, timestamps: bool, soft_deletes: bool) -> bool {
    match column {
        CREATED_AT | UPDATED_AT => timestamps,
        DELETED_AT => soft_deletes,
        REMEMBER_TOKEN => true,
        _ => false,
    }
}

/// Look up a model-level `@cast{...}` / `@type{...}` entry by field or column
fn structured_entry(structured: &Option<laragen_ir::Structured>, d: &ColumnDescriptor) -> Option<String> {
    let structured = structured.as_ref()?;
    structured
        .get(&d.field_name)
        .or_else(|| structured.get(&d.name))
        .map(str::to_string)
}

/// Cast implied by the column type
pub fn derived_cast(d: &ColumnDescriptor) -> Option<String> {
    let cast = match d.column_type {
        ColumnType::Boolean => "boolean".to_string(),
        ColumnType::Json | ColumnType::Jsonb => "array".to_string(),
        ColumnType::Date => "date".to_string(),
        ColumnType::DateTime | ColumnType::DateTimeTz | ColumnType::Timestamp | ColumnType::TimestampTz => {
            "datetime".to_string()
        }
        ColumnType::Decimal => format!("decimal:{}", d.args.get(1).map(String::as_str).unwrap_or("2")),
        _ => return None,
    };
    Some(cast)
}

/// PHP type of an attribute
pub fn php_type(column_type: ColumnType) -> &'static str {
    match column_type {
        t if t.is_integer() => "int",
        ColumnType::Float | ColumnType::Double => "float",
        ColumnType::Boolean => "bool",
        ColumnType::Json | ColumnType::Jsonb => "array",
        ColumnType::Date
        | ColumnType::DateTime
        | ColumnType::DateTimeTz
        | ColumnType::Timestamp
        | ColumnType::TimestampTz => "\\Illuminate\\Support\\Carbon",
        _ => "string",
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeneratorConfig;
    use crate::descriptor::build_descriptors;
    use laragen_ir::{Field, InferenceOptions, SchemaDocument, infer_relations};
    use pretty_assertions::assert_eq;

    fn doc() -> SchemaDocument {
        SchemaDocument::new()
            .with_model(
                Model::new("User")
                    .with_db_name("users")
                    .with_doc(
                        "Accounts\n@hidden(password) @with(posts) @trait:App\\Concerns\\HasRoles \
                         @observer:App\\Observers\\UserObserver @cast{settings: collection}",
                    )
                    .with_field(Field::autoincrement_id())
                    .with_field(Field::scalar("email", "String").unique())
                    .with_field(Field::scalar("password", "String"))
                    .with_field(Field::scalar("isAdmin", "Boolean").with_db_name("is_admin"))
                    .with_field(Field::scalar("settings", "Json").optional())
                    .with_field(Field::scalar("balance", "Decimal").with_native("Decimal", &["12", "4"]))
                    .with_field(Field::scalar("birthday", "DateTime").optional().with_native("Date", &[]))
                    .with_field(Field::scalar("nickname", "String").optional().with_doc("@type(\"?Nick\")"))
                    .with_field(Field::scalar("internal", "String").with_doc("@silent(models)"))
                    .with_field(Field::scalar("createdAt", "DateTime").with_db_name("created_at"))
                    .with_field(Field::scalar("updatedAt", "DateTime").with_db_name("updated_at"))
                    .with_field(Field::relation("posts", "Post").in_relation("PostToUser").list()),
            )
            .with_model(
                Model::new("Post")
                    .with_db_name("posts")
                    .with_field(Field::autoincrement_id())
                    .with_field(Field::scalar("title", "String").with_doc("@fillable"))
                    .with_field(Field::scalar("userId", "Int").with_db_name("user_id"))
                    .with_field(
                        Field::relation("user", "User")
                            .in_relation("PostToUser")
                            .references(&["userId"], &["id"]),
                    ),
            )
    }

    fn descriptor(doc: &SchemaDocument, name: &str) -> ModelDescriptor {
        let config = GeneratorConfig::default();
        let ctx = GenerationContext::new(doc, &config).unwrap();
        let model = doc.model(name).unwrap();
        let relations = infer_relations(doc, name, &InferenceOptions::default()).unwrap();
        let set = build_descriptors(&ctx, model).unwrap();
        build_model_descriptor(&ctx, model, &relations, &set)
    }

    #[test]
    fn test_casts_and_types() {
        let doc = doc();
        let user = descriptor(&doc, "User");

        assert_eq!(
            user.casts,
            vec![
                ("is_admin".to_string(), "boolean".to_string()),
                ("settings".to_string(), "collection".to_string()),
                ("balance".to_string(), "decimal:4".to_string()),
                ("birthday".to_string(), "date".to_string()),
            ]
        );
        assert_eq!(user.property("id").unwrap().php_type, "int");
        assert_eq!(user.property("nickname").unwrap().php_type, "?Nick");
        assert_eq!(user.property("settings").unwrap().doc_type(), "array|null");
        assert!(user.property("internal").is_none());
        assert!(user.timestamps);
        assert!(!user.soft_deletes);
        assert!(user.incrementing);
        assert_eq!(user.key_type, "int");
    }

    #[test]
    fn test_default_fillable_and_directive_lists() {
        let doc = doc();
        let user = descriptor(&doc, "User");

        assert_eq!(
            user.fillable,
            vec!["email", "password", "is_admin", "settings", "balance", "birthday", "nickname"]
        );
        assert_eq!(user.hidden, vec!["password"]);
        assert!(user.property("password").unwrap().hidden);
        assert_eq!(user.with, vec!["posts"]);
        assert_eq!(user.traits[0].short_name(), "HasRoles");
        assert_eq!(user.observer.as_ref().unwrap().path, "App\\Observers\\UserObserver");
        assert_eq!(user.comment.as_deref(), Some("Accounts"));
        assert!(user.relation("posts").is_some());
    }

    #[test]
    fn test_explicit_field_fillable() {
        let doc = doc();
        let post = descriptor(&doc, "Post");
        assert_eq!(post.fillable, vec!["title"]);
        assert_eq!(
            post.relation("user").unwrap().eloquent_call(),
            "$this->belongsTo(User::class, 'user_id', 'id')"
        );
    }
}
