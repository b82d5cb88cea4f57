//! Relation definitions
//!
//! This module contains the `RelationDefinition` struct produced by the
//! inference engine: one Eloquent accessor on one model, with everything
//! needed to declare it.

use laragen_core::RelationKind;
use serde::{Deserialize, Serialize};

// ============================================================================
// RelationDefinition
// ============================================================================

/// One relationship accessor recovered for a model
///
/// Key columns follow Eloquent's argument order:
///
/// * `belongsTo`: `foreign_keys` live on this model, `local_keys` are the
///   owner keys on the target.
/// * `hasOne` / `hasMany`: `foreign_keys` live on the target, `local_keys`
///   on this model.
/// * `belongsToMany`: `local_keys` are this model's parent keys,
///   `foreign_keys` the related model's keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDefinition {
    /// Accessor name (e.g., "posts", "author")
    pub name: String,

    /// Relationship kind
    pub kind: RelationKind,

    /// Related model; `None` for `morphTo`
    pub target: Option<String>,

    /// Source relation field, when the relation comes from one
    pub field: Option<String>,

    /// Foreign key columns
    pub foreign_keys: Vec<String>,

    /// Local / owner key columns
    pub local_keys: Vec<String>,

    /// Junction table details for many-to-many kinds
    pub pivot: Option<PivotSpec>,

    /// Discriminator details for polymorphic kinds
    pub morph: Option<MorphSpec>,

    /// Raw call chain appended verbatim
    pub chain: Option<String>,
}

impl RelationDefinition {
    /// Create a new relation definition
    pub fn new(name: impl Into<String>, kind: RelationKind, target: Option<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            target,
            field: None,
            foreign_keys: Vec::new(),
            local_keys: Vec::new(),
            pivot: None,
            morph: None,
            chain: None,
        }
    }

    /// Set the source field
    pub fn from_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the key columns
    pub fn with_keys(mut self, foreign_keys: Vec<String>, local_keys: Vec<String>) -> Self {
        self.foreign_keys = foreign_keys;
        self.local_keys = local_keys;
        self
    }

    /// Set the pivot details
    pub fn with_pivot(mut self, pivot: PivotSpec) -> Self {
        self.pivot = Some(pivot);
        self
    }

    /// Set the polymorphic details
    pub fn with_morph(mut self, morph: MorphSpec) -> Self {
        self.morph = Some(morph);
        self
    }

    /// Set the trailing call chain
    pub fn with_chain(mut self, chain: Option<String>) -> Self {
        self.chain = chain;
        self
    }

    /// Render the Eloquent call returned by the accessor, e.g.
    /// `$this->hasMany(Post::class, 'user_id', 'id')`
    pub fn eloquent_call(&self) -> String {
        let method = self.kind.eloquent_method();
        let class = self
            .target
            .as_deref()
            .map(|t| format!("{}::class", t))
            .unwrap_or_default();

        let mut call = match self.kind {
            RelationKind::BelongsTo | RelationKind::HasOne | RelationKind::HasMany => format!(
                "$this->{}({}, {}, {})",
                method,
                class,
                php_keys(&self.foreign_keys),
                php_keys(&self.local_keys)
            ),
            RelationKind::BelongsToManyImplicit | RelationKind::BelongsToManyExplicit => {
                match &self.pivot {
                    Some(pivot) => {
                        let mut call = format!(
                            "$this->{}({}, '{}', {}, {}, {}, {})",
                            method,
                            class,
                            pivot.table,
                            php_keys(&pivot.foreign_pivot_keys),
                            php_keys(&pivot.related_pivot_keys),
                            php_keys(&self.local_keys),
                            php_keys(&self.foreign_keys)
                        );
                        call.push_str(&pivot.modifiers());
                        call
                    }
                    None => format!("$this->{}({})", method, class),
                }
            }
            RelationKind::MorphTo => match &self.morph {
                Some(morph) => format!(
                    "$this->morphTo('{}', '{}', '{}')",
                    morph.base, morph.type_column, morph.id_column
                ),
                None => "$this->morphTo()".to_string(),
            },
            RelationKind::MorphOne | RelationKind::MorphMany => match &self.morph {
                Some(morph) if !morph.uses_default_columns() => format!(
                    "$this->{}({}, '{}', '{}', '{}')",
                    method, class, morph.base, morph.type_column, morph.id_column
                ),
                Some(morph) => format!("$this->{}({}, '{}')", method, class, morph.base),
                None => format!("$this->{}({})", method, class),
            },
            RelationKind::MorphToMany | RelationKind::MorphedByMany => {
                let base = self.morph.as_ref().map(|m| m.base.as_str()).unwrap_or_default();
                match &self.pivot {
                    Some(pivot) => {
                        let mut call =
                            format!("$this->{}({}, '{}', '{}')", method, class, base, pivot.table);
                        call.push_str(&pivot.modifiers());
                        call
                    }
                    None => format!("$this->{}({}, '{}')", method, class, base),
                }
            }
        };

        if let Some(chain) = &self.chain {
            call.push_str(chain);
        }
        call
    }
}

/// Single key as `'col'`, composite keys as `['a', 'b']`
fn php_keys(keys: &[String]) -> String {
    match keys {
        [single] => format!("'{}'", single),
        _ => format!(
            "[{}]",
            keys.iter()
                .map(|k| format!("'{}'", k))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

// ============================================================================
// PivotSpec
// ============================================================================

/// Junction table details of a many-to-many relation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotSpec {
    /// Physical junction table name
    pub table: String,

    /// Pivot columns referencing this model
    pub foreign_pivot_keys: Vec<String>,

    /// Pivot columns referencing the related model
    pub related_pivot_keys: Vec<String>,

    /// Additional pivot columns exposed through `withPivot`
    pub extra_columns: Vec<String>,

    /// Whether the pivot maintains timestamps
    pub with_timestamps: bool,

    /// Accessor name for the pivot record
    pub alias: Option<String>,

    /// Explicit pivot model class
    pub using: Option<String>,
}

impl PivotSpec {
    /// Trailing modifiers: `->using()`, `->withPivot()`, `->withTimestamps()`, `->as()`
    pub fn modifiers(&self) -> String {
        let mut out = String::new();
        if let Some(using) = &self.using {
            out.push_str(&format!("->using({}::class)", using));
        }
        if !self.extra_columns.is_empty() {
            let cols = self
                .extra_columns
                .iter()
                .map(|c| format!("'{}'", c))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!("->withPivot({})", cols));
        }
        if self.with_timestamps {
            out.push_str("->withTimestamps()");
        }
        if let Some(alias) = &self.alias {
            out.push_str(&format!("->as('{}')", alias));
        }
        out
    }
}

// ============================================================================
// MorphSpec
// ============================================================================

/// Discriminator columns of a polymorphic relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphSpec {
    /// Discriminator base (e.g., "commentable")
    pub base: String,
    pub id_column: String,
    pub type_column: String,
}

impl MorphSpec {
    /// Create a spec with the conventional `<base>_id` / `<base>_type` columns
    pub fn conventional(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            id_column: format!("{}_id", base),
            type_column: format!("{}_type", base),
            base,
        }
    }

    /// Whether both columns follow Eloquent's default naming
    pub fn uses_default_columns(&self) -> bool {
        self.id_column == format!("{}_id", self.base)
            && self.type_column == format!("{}_type", self.base)
    }
}

// ============================================================================
// RelationSet
// ============================================================================

/// The relations inferred for one model, plus any diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSet {
    pub relations: Vec<RelationDefinition>,
    pub diagnostics: Vec<String>,
}

impl RelationSet {
    /// Get a relation by accessor name
    pub fn get(&self, name: &str) -> Option<&RelationDefinition> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Whether an accessor name is taken
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Register a relation; on a name collision the first registration
    /// wins and a diagnostic is recorded for `model`
    pub fn register(&mut self, model: &str, relation: RelationDefinition) -> bool {
        if self.contains(&relation.name) {
            let message = format!(
                "{}: relation '{}' ({}) collides with an existing accessor and was dropped",
                model, relation.name, relation.kind
            );
            tracing::warn!(model = %model, relation = %relation.name, "Relation name collision");
            self.diagnostics.push(message);
            return false;
        }
        self.relations.push(relation);
        true
    }

    /// Number of relations
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// Whether no relation was inferred
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_belongs_to_call() {
        let rel = RelationDefinition::new("author", RelationKind::BelongsTo, Some("User".into()))
            .with_keys(strings(&["user_id"]), strings(&["id"]));
        assert_eq!(
            rel.eloquent_call(),
            "$this->belongsTo(User::class, 'user_id', 'id')"
        );
    }

    #[test]
    fn test_composite_keys() {
        let rel = RelationDefinition::new("order", RelationKind::BelongsTo, Some("Order".into()))
            .with_keys(strings(&["order_id", "tenant_id"]), strings(&["id", "tenant_id"]));
        assert_eq!(
            rel.eloquent_call(),
            "$this->belongsTo(Order::class, ['order_id', 'tenant_id'], ['id', 'tenant_id'])"
        );
    }

    #[test]
    fn test_belongs_to_many_call() {
        let rel = RelationDefinition::new(
            "tags",
            RelationKind::BelongsToManyExplicit,
            Some("Tag".into()),
        )
        .with_keys(strings(&["id"]), strings(&["id"]))
        .with_pivot(PivotSpec {
            table: "post_tag".into(),
            foreign_pivot_keys: strings(&["post_id"]),
            related_pivot_keys: strings(&["tag_id"]),
            extra_columns: strings(&["weight"]),
            with_timestamps: true,
            alias: Some("tagging".into()),
            using: Some("PostTag".into()),
        });
        assert_eq!(
            rel.eloquent_call(),
            "$this->belongsToMany(Tag::class, 'post_tag', 'post_id', 'tag_id', 'id', 'id')\
             ->using(PostTag::class)->withPivot('weight')->withTimestamps()->as('tagging')"
        );
    }

    #[test]
    fn test_morph_calls() {
        let to = RelationDefinition::new("commentable", RelationKind::MorphTo, None)
            .with_morph(MorphSpec::conventional("commentable"));
        assert_eq!(
            to.eloquent_call(),
            "$this->morphTo('commentable', 'commentable_type', 'commentable_id')"
        );

        let many = RelationDefinition::new("comments", RelationKind::MorphMany, Some("Comment".into()))
            .with_morph(MorphSpec::conventional("commentable"))
            .with_chain(Some("->latest()".into()));
        assert_eq!(
            many.eloquent_call(),
            "$this->morphMany(Comment::class, 'commentable')->latest()"
        );
    }

    #[test]
    fn test_register_collision_keeps_first() {
        let mut set = RelationSet::default();
        let first = RelationDefinition::new("owner", RelationKind::BelongsTo, Some("User".into()));
        let second = RelationDefinition::new("owner", RelationKind::MorphTo, None);
        assert!(set.register("Post", first.clone()));
        assert!(!set.register("Post", second));
        assert_eq!(set.relations, vec![first]);
        assert_eq!(set.diagnostics.len(), 1);
        assert!(set.diagnostics[0].contains("owner"));
    }
}
