//! # Column Descriptors
//!
//! Every field of a model is normalised into a [`ColumnDescriptor`] before
//! rule resolution. Descriptors of one table live in a [`DescriptorSet`]
//! arena and are addressed by [`ColumnHandle`]s, so rules can inspect and
//! suppress siblings without holding references into the set.
//!
//! Relation fields become *relation markers* (`ColumnType::Relation`).
//! Owning markers carry the foreign key metadata; non-owning markers start
//! suppressed and never produce output.

use crate::context::GenerationContext;
use laragen_core::{ColumnType, EngineError, EngineResult, ReferentialAction};
use laragen_ir::{Field, FieldKind, IndexKind, Model};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// ColumnDescriptor
// ============================================================================

/// Normalised per-field record carrying output type and constraint metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Physical column name (relation markers use the field name)
    pub name: String,

    /// Source field name
    pub field_name: String,

    /// Semantic column type
    pub column_type: ColumnType,

    /// Width / precision arguments
    pub args: Vec<String>,

    pub nullable: bool,
    pub unsigned: bool,
    pub auto_increment: bool,
    pub primary: bool,
    pub unique: bool,

    /// Default value descriptor
    pub default: Option<ColumnDefault>,

    /// Allowed values for enum columns
    pub enum_values: Vec<String>,

    /// Documentation with directives stripped
    pub comment: Option<String>,

    /// Foreign key metadata of an owning relation
    pub relationship: Option<ForeignKeyMeta>,

    /// Set by `@silent` / `@ignore`
    pub silent: bool,

    ignored: bool,
}

impl ColumnDescriptor {
    /// Create a descriptor for a plain column
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        let name = name.into();
        Self {
            field_name: name.clone(),
            name,
            column_type,
            args: Vec::new(),
            nullable: false,
            unsigned: false,
            auto_increment: false,
            primary: false,
            unique: false,
            default: None,
            enum_values: Vec::new(),
            comment: None,
            relationship: None,
            silent: false,
            ignored: false,
        }
    }

    /// Create a relation marker
    pub fn marker(field_name: impl Into<String>, relationship: Option<ForeignKeyMeta>) -> Self {
        let mut descriptor = Self::new(field_name, ColumnType::Relation);
        descriptor.relationship = relationship;
        descriptor
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    // ========================================================================
    // Query methods
    // ========================================================================

    /// Whether a rule has suppressed this descriptor
    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Whether this is a relation marker
    pub fn is_marker(&self) -> bool {
        self.column_type.is_relation()
    }

    /// Foreign key metadata that contributes a dependency edge
    pub fn owning_fk(&self) -> Option<&ForeignKeyMeta> {
        self.relationship
            .as_ref()
            .filter(|fk| !fk.ignore && !fk.local_columns.is_empty())
    }
}

// ============================================================================
// ColumnDefault / ForeignKeyMeta
// ============================================================================

/// Default value of a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnDefault {
    /// A literal value
    Literal(serde_json::Value),
    /// A named generator (`now`, `dbgenerated`, `cuid`, ...)
    Generator {
        name: String,
        args: Vec<serde_json::Value>,
    },
}

impl ColumnDefault {
    /// Create a generator default without arguments
    pub fn generator(name: impl Into<String>) -> Self {
        ColumnDefault::Generator {
            name: name.into(),
            args: Vec::new(),
        }
    }
}

/// Foreign key metadata of an owning relation field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyMeta {
    /// Relation field name
    pub field: String,
    /// Referenced physical table
    pub target_table: String,
    /// Local columns holding the key
    pub local_columns: Vec<String>,
    /// Referenced columns on the target table
    pub references: Vec<String>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
    /// Application-side only (`@local`); no constraint, no dependency
    pub ignore: bool,
}

impl ForeignKeyMeta {
    /// Create metadata for a single-column key
    pub fn new(field: impl Into<String>, target_table: impl Into<String>, local: &str, reference: &str) -> Self {
        Self {
            field: field.into(),
            target_table: target_table.into(),
            local_columns: vec![local.to_string()],
            references: vec![reference.to_string()],
            on_delete: None,
            on_update: None,
            ignore: false,
        }
    }
}

// ============================================================================
// IndexDescriptor
// ============================================================================

/// A table-level index carried alongside the column descriptors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub kind: IndexKind,
    pub columns: Vec<String>,
    pub name: Option<String>,
}

// ============================================================================
// DescriptorSet
// ============================================================================

/// Index of a descriptor inside its [`DescriptorSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnHandle(pub usize);

/// Arena of the descriptors of one table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptorSet {
    descriptors: Vec<ColumnDescriptor>,

    /// Table-level indexes (unique / normal / fulltext)
    pub indexes: Vec<IndexDescriptor>,

    /// Descriptor rendered by the identity shorthand
    identity: Option<ColumnHandle>,

    /// Utility rules that already fired
    consumed: BTreeSet<String>,
}

impl DescriptorSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor
    pub fn push(&mut self, descriptor: ColumnDescriptor) -> ColumnHandle {
        self.descriptors.push(descriptor);
        ColumnHandle(self.descriptors.len() - 1)
    }

    /// Append a descriptor (builder form)
    pub fn with(mut self, descriptor: ColumnDescriptor) -> Self {
        self.push(descriptor);
        self
    }

    /// Append an index (builder form)
    pub fn with_index(mut self, kind: IndexKind, columns: &[&str]) -> Self {
        self.indexes.push(IndexDescriptor {
            kind,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            name: None,
        });
        self
    }

    pub fn get(&self, handle: ColumnHandle) -> &ColumnDescriptor {
        &self.descriptors[handle.0]
    }

    /// Mutable access; suppression stays one-way through [`Self::suppress`]
    pub fn get_mut(&mut self, handle: ColumnHandle) -> &mut ColumnDescriptor {
        &mut self.descriptors[handle.0]
    }

    /// Suppress a descriptor for the rest of the pass
    pub fn suppress(&mut self, handle: ColumnHandle) {
        self.descriptors[handle.0].ignored = true;
    }

    pub fn is_ignored(&self, handle: ColumnHandle) -> bool {
        self.descriptors[handle.0].ignored
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Every handle in declaration order
    pub fn handles(&self) -> impl Iterator<Item = ColumnHandle> {
        (0..self.descriptors.len()).map(ColumnHandle)
    }

    /// Every descriptor in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.descriptors.iter()
    }

    /// Non-ignored descriptors
    pub fn active(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.descriptors.iter().filter(|d| !d.ignored)
    }

    /// Find a non-marker column by physical name
    pub fn find(&self, name: &str) -> Option<ColumnHandle> {
        self.descriptors
            .iter()
            .position(|d| !d.is_marker() && d.name == name)
            .map(ColumnHandle)
    }

    /// Find a non-ignored, non-marker column by physical name
    pub fn find_active(&self, name: &str) -> Option<ColumnHandle> {
        self.find(name).filter(|h| !self.is_ignored(*h))
    }

    /// Non-ignored relation markers claiming `column` as a local key column
    pub fn markers_claiming(&self, column: &str) -> Vec<ColumnHandle> {
        self.handles()
            .filter(|h| {
                let d = self.get(*h);
                d.is_marker()
                    && !d.ignored
                    && d.owning_fk()
                        .map(|fk| fk.local_columns.iter().any(|c| c == column))
                        .unwrap_or(false)
            })
            .collect()
    }

    /// Primary key columns, in declaration order
    pub fn primary_columns(&self) -> Vec<ColumnHandle> {
        self.handles()
            .filter(|h| {
                let d = self.get(*h);
                d.primary && !d.is_marker() && !d.silent
            })
            .collect()
    }

    /// Record the descriptor rendered by the identity shorthand
    pub fn mark_identity(&mut self, handle: ColumnHandle) {
        self.identity = Some(handle);
    }

    pub fn identity(&self) -> Option<ColumnHandle> {
        self.identity
    }

    /// Flip the consumed flag of a utility rule; `false` if already consumed
    pub fn consume(&mut self, rule: &str) -> bool {
        self.consumed.insert(rule.to_string())
    }

    /// Target tables of every non-ignored owning foreign key, deduplicated
    pub fn dependencies(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.active()
            .filter_map(|d| d.owning_fk())
            .filter(|fk| seen.insert(fk.target_table.clone()))
            .map(|fk| fk.target_table.clone())
            .collect()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Build the descriptor set of one model
pub fn build_descriptors(ctx: &GenerationContext<'_>, model: &Model) -> EngineResult<DescriptorSet> {
    let mut set = DescriptorSet::new();
    let primary = model.primary_key_columns();

    for field in &model.fields {
        let directives = ctx.field_directives(&model.name, &field.name);
        let mut descriptor = match field.kind {
            FieldKind::Object => relation_marker(ctx, model, field)?,
            _ => column_descriptor(ctx, field)?,
        };
        descriptor.comment = directives.comment.clone();
        descriptor.silent = directives.silent_in_migrations();
        if !descriptor.is_marker() {
            descriptor.primary = primary.iter().any(|c| c == &descriptor.name);
            if descriptor.primary && descriptor.auto_increment && descriptor.column_type.is_integer() {
                descriptor.unsigned = true;
            }
        }

        let suppressed = descriptor.silent
            || (descriptor.is_marker()
                && descriptor
                    .relationship
                    .as_ref()
                    .map(|fk| fk.ignore)
                    .unwrap_or(true));
        let handle = set.push(descriptor);
        if suppressed {
            set.suppress(handle);
        }
    }

    for index in &model.indexes {
        if index.kind == IndexKind::Id {
            continue;
        }
        set.indexes.push(IndexDescriptor {
            kind: index.kind,
            columns: model.columns_of(&index.field_names()),
            name: index.db_name.clone().or_else(|| index.name.clone()),
        });
    }

    tracing::debug!(
        model = %model.name,
        descriptors = set.len(),
        indexes = set.indexes.len(),
        "Built column descriptors"
    );
    Ok(set)
}

fn relation_marker(
    ctx: &GenerationContext<'_>,
    model: &Model,
    field: &Field,
) -> EngineResult<ColumnDescriptor> {
    let mut marker = ColumnDescriptor::marker(&field.name, None);
    marker.nullable = !field.is_required;
    if !field.is_owning() {
        return Ok(marker);
    }

    let target = ctx.doc.model(&field.type_name).ok_or_else(|| {
        EngineError::inconsistency(
            &model.name,
            format!(
                "relation field '{}' targets unknown model '{}'",
                field.name, field.type_name
            ),
        )
    })?;
    let directives = ctx.field_directives(&model.name, &field.name);
    marker.relationship = Some(ForeignKeyMeta {
        field: field.name.clone(),
        target_table: target.table_name().to_string(),
        local_columns: model.columns_of(&field.relation_from_fields),
        references: target.columns_of(&field.relation_to_fields),
        on_delete: field.relation_on_delete,
        on_update: field.relation_on_update,
        ignore: directives.local_in_migrations(),
    });
    Ok(marker)
}

fn column_descriptor(ctx: &GenerationContext<'_>, field: &Field) -> EngineResult<ColumnDescriptor> {
    let mut d = ColumnDescriptor::new(field.column_name(), ColumnType::String);
    d.field_name = field.name.clone();
    d.nullable = !field.is_required;
    d.unique = field.is_unique;

    if field.kind == FieldKind::Enum {
        d.column_type = ColumnType::Enum;
        d.enum_values = ctx.doc.enum_values(&field.type_name);
    } else {
        map_scalar(field, &mut d);
    }

    match &field.default {
        Some(laragen_ir::DefaultValue::Literal(value)) => {
            d.default = Some(ColumnDefault::Literal(value.clone()));
        }
        Some(laragen_ir::DefaultValue::Generator(generator)) => match generator.name.as_str() {
            "autoincrement" => d.auto_increment = true,
            "uuid" | "ulid" if d.column_type == ColumnType::String && d.args.is_empty() => {
                d.column_type = if generator.name == "uuid" {
                    ColumnType::Uuid
                } else {
                    ColumnType::Ulid
                };
                d.default = Some(ColumnDefault::generator(&generator.name));
            }
            _ => {
                d.default = Some(ColumnDefault::Generator {
                    name: generator.name.clone(),
                    args: generator.args.clone(),
                })
            }
        },
        None => {}
    }
    Ok(d)
}

/// Map a scalar type (refined by its native type) onto the column vocabulary
fn map_scalar(field: &Field, d: &mut ColumnDescriptor) {
    let native = field.native_name().map(|n| n.to_ascii_lowercase());
    let native_args: Vec<String> = field
        .native_type
        .as_ref()
        .map(|n| n.args().to_vec())
        .unwrap_or_default();
    let native = native.as_deref();

    match field.type_name.as_str() {
        "Int" | "BigInt" => {
            let base = native.map(|n| n.trim_start_matches("unsigned"));
            if native.map(|n| n.starts_with("unsigned")).unwrap_or(false) {
                d.unsigned = true;
            }
            d.column_type = match base {
                Some("tinyint") => ColumnType::TinyInteger,
                Some("smallint") => ColumnType::SmallInteger,
                Some("mediumint") => ColumnType::MediumInteger,
                Some("bigint") => ColumnType::BigInteger,
                Some("int") | Some("integer") => ColumnType::Integer,
                _ if field.type_name == "BigInt" => ColumnType::BigInteger,
                _ => ColumnType::Integer,
            };
        }
        "Float" => {
            d.column_type = match native {
                Some("real") | Some("float") => ColumnType::Float,
                _ => ColumnType::Double,
            };
        }
        "Decimal" => {
            d.column_type = ColumnType::Decimal;
            d.args = if native_args.is_empty() {
                vec!["8".to_string(), "2".to_string()]
            } else {
                native_args
            };
        }
        "Boolean" => d.column_type = ColumnType::Boolean,
        "String" => {
            let (column_type, keep_args) = match native {
                Some("varchar") => (ColumnType::String, true),
                Some("char") => (ColumnType::Char, true),
                Some("text") => (ColumnType::Text, false),
                Some("tinytext") => (ColumnType::TinyText, false),
                Some("mediumtext") => (ColumnType::MediumText, false),
                Some("longtext") => (ColumnType::LongText, false),
                Some("uuid") => (ColumnType::Uuid, false),
                _ => (ColumnType::String, false),
            };
            d.column_type = column_type;
            if keep_args {
                d.args = native_args;
            }
        }
        "DateTime" => {
            let (column_type, keep_args) = match native {
                Some("timestamptz") => (ColumnType::TimestampTz, true),
                Some("timestamp") => (ColumnType::Timestamp, true),
                Some("date") => (ColumnType::Date, false),
                Some("time") => (ColumnType::Time, true),
                Some("timetz") => (ColumnType::TimeTz, true),
                Some("datetime") | Some("datetime2") => (ColumnType::DateTime, true),
                Some("year") => (ColumnType::Year, false),
                _ => (ColumnType::Timestamp, false),
            };
            d.column_type = column_type;
            if keep_args {
                d.args = native_args;
            }
        }
        "Json" => {
            d.column_type = match native {
                Some("jsonb") => ColumnType::Jsonb,
                _ => ColumnType::Json,
            };
        }
        "Bytes" => d.column_type = ColumnType::Binary,
        other => {
            tracing::debug!(field = %field.name, scalar = %other, "Unknown scalar type, using string");
            d.column_type = ColumnType::String;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
