//! Core types used throughout Laragen
//!
//! This module contains the fixed vocabularies shared by the IR, the
//! inference engine and the migration compiler: column types, referential
//! actions and relationship kinds.

use serde::{Deserialize, Serialize};

// ============================================================================
// Column Types
// ============================================================================

/// Semantic column types understood by the migration compiler.
///
/// Every variant except [`ColumnType::Relation`] maps onto a Laravel schema
/// builder method of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    // Integers
    TinyInteger,
    SmallInteger,
    MediumInteger,
    Integer,
    BigInteger,

    // Numerics
    Decimal,
    Float,
    Double,

    Boolean,

    // Text
    Char,
    String,
    TinyText,
    Text,
    MediumText,
    LongText,

    // Temporal
    Date,
    Time,
    TimeTz,
    DateTime,
    DateTimeTz,
    Timestamp,
    TimestampTz,
    Year,

    // Identifiers
    Uuid,
    Ulid,

    // Documents
    Json,
    Jsonb,

    Enum,
    Binary,

    /// Marker for a relation field; never rendered as a column
    Relation,
}

impl ColumnType {
    /// Laravel schema builder method for this type, `None` for relation markers
    pub fn builder_method(&self) -> Option<&'static str> {
        let method = match self {
            ColumnType::TinyInteger => "tinyInteger",
            ColumnType::SmallInteger => "smallInteger",
            ColumnType::MediumInteger => "mediumInteger",
            ColumnType::Integer => "integer",
            ColumnType::BigInteger => "bigInteger",
            ColumnType::Decimal => "decimal",
            ColumnType::Float => "float",
            ColumnType::Double => "double",
            ColumnType::Boolean => "boolean",
            ColumnType::Char => "char",
            ColumnType::String => "string",
            ColumnType::TinyText => "tinyText",
            ColumnType::Text => "text",
            ColumnType::MediumText => "mediumText",
            ColumnType::LongText => "longText",
            ColumnType::Date => "date",
            ColumnType::Time => "time",
            ColumnType::TimeTz => "timeTz",
            ColumnType::DateTime => "dateTime",
            ColumnType::DateTimeTz => "dateTimeTz",
            ColumnType::Timestamp => "timestamp",
            ColumnType::TimestampTz => "timestampTz",
            ColumnType::Year => "year",
            ColumnType::Uuid => "uuid",
            ColumnType::Ulid => "ulid",
            ColumnType::Json => "json",
            ColumnType::Jsonb => "jsonb",
            ColumnType::Enum => "enum",
            ColumnType::Binary => "binary",
            ColumnType::Relation => return None,
        };
        Some(method)
    }

    /// The auto-incrementing counterpart for integer types
    /// (`BigInteger` -> `bigIncrements`, `Integer` -> `increments`, ...)
    pub fn increments_method(&self) -> Option<&'static str> {
        match self {
            ColumnType::TinyInteger => Some("tinyIncrements"),
            ColumnType::SmallInteger => Some("smallIncrements"),
            ColumnType::MediumInteger => Some("mediumIncrements"),
            ColumnType::Integer => Some("increments"),
            ColumnType::BigInteger => Some("bigIncrements"),
            _ => None,
        }
    }

    /// Check if this is one of the integer widths
    pub fn is_integer(&self) -> bool {
        self.increments_method().is_some()
    }

    /// Check if this is a `timestamp`/`timestampTz` column
    pub fn is_timestamp(&self) -> bool {
        matches!(self, ColumnType::Timestamp | ColumnType::TimestampTz)
    }

    /// Check if this type carries a timezone
    pub fn is_timezone_aware(&self) -> bool {
        matches!(
            self,
            ColumnType::TimeTz | ColumnType::DateTimeTz | ColumnType::TimestampTz
        )
    }

    /// Check if this is a text-like type
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            ColumnType::Char
                | ColumnType::String
                | ColumnType::TinyText
                | ColumnType::Text
                | ColumnType::MediumText
                | ColumnType::LongText
        )
    }

    /// Check if this is a date or time type
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            ColumnType::Date
                | ColumnType::Time
                | ColumnType::TimeTz
                | ColumnType::DateTime
                | ColumnType::DateTimeTz
                | ColumnType::Timestamp
                | ColumnType::TimestampTz
                | ColumnType::Year
        )
    }

    /// Check if this is the relation marker
    pub fn is_relation(&self) -> bool {
        matches!(self, ColumnType::Relation)
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.builder_method().unwrap_or("relation"))
    }
}

// ============================================================================
// Referential Actions
// ============================================================================

/// Actions for foreign key constraints
///
/// Variant names match the spelling used by the introspection document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReferentialAction {
    /// Delete related records when parent is deleted
    Cascade,
    /// Set foreign key to NULL when parent is deleted
    SetNull,
    /// Prevent deletion if related records exist
    Restrict,
    /// Do nothing (database default)
    #[default]
    NoAction,
    /// Set to default value
    SetDefault,
}

impl ReferentialAction {
    /// Get SQL keyword
    pub fn to_sql(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }

    /// Schema builder modifier applied to a foreign key for `ON DELETE`
    pub fn on_delete_modifier(&self) -> String {
        match self {
            ReferentialAction::Cascade => "->cascadeOnDelete()".to_string(),
            ReferentialAction::SetNull => "->nullOnDelete()".to_string(),
            ReferentialAction::Restrict => "->restrictOnDelete()".to_string(),
            ReferentialAction::NoAction => "->noActionOnDelete()".to_string(),
            ReferentialAction::SetDefault => "->onDelete('set default')".to_string(),
        }
    }

    /// Schema builder modifier applied to a foreign key for `ON UPDATE`
    pub fn on_update_modifier(&self) -> String {
        match self {
            ReferentialAction::Cascade => "->cascadeOnUpdate()".to_string(),
            ReferentialAction::SetNull => "->nullOnUpdate()".to_string(),
            ReferentialAction::Restrict => "->restrictOnUpdate()".to_string(),
            ReferentialAction::NoAction => "->noActionOnUpdate()".to_string(),
            ReferentialAction::SetDefault => "->onUpdate('set default')".to_string(),
        }
    }
}

impl std::fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_sql())
    }
}

// ============================================================================
// Relationship Kinds
// ============================================================================

/// High-level relationship kinds recovered by the inference engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// This model owns the foreign key to a single parent
    BelongsTo,
    /// The related model owns a foreign key back to this one (single)
    HasOne,
    /// The related model owns a foreign key back to this one (many)
    HasMany,
    /// Many-to-many through a conventionally named junction table
    BelongsToManyImplicit,
    /// Many-to-many through an explicitly modeled junction table
    BelongsToManyExplicit,
    /// Child side of a polymorphic association
    MorphTo,
    MorphOne,
    MorphMany,
    MorphToMany,
    MorphedByMany,
}

impl RelationKind {
    /// Eloquent method used to declare the relation
    pub fn eloquent_method(&self) -> &'static str {
        match self {
            RelationKind::BelongsTo => "belongsTo",
            RelationKind::HasOne => "hasOne",
            RelationKind::HasMany => "hasMany",
            RelationKind::BelongsToManyImplicit | RelationKind::BelongsToManyExplicit => {
                "belongsToMany"
            }
            RelationKind::MorphTo => "morphTo",
            RelationKind::MorphOne => "morphOne",
            RelationKind::MorphMany => "morphMany",
            RelationKind::MorphToMany => "morphToMany",
            RelationKind::MorphedByMany => "morphedByMany",
        }
    }

    /// Check if the relation goes through a pivot table
    pub fn is_pivot(&self) -> bool {
        matches!(
            self,
            RelationKind::BelongsToManyImplicit
                | RelationKind::BelongsToManyExplicit
                | RelationKind::MorphToMany
                | RelationKind::MorphedByMany
        )
    }

    /// Check if the relation is polymorphic
    pub fn is_polymorphic(&self) -> bool {
        matches!(
            self,
            RelationKind::MorphTo
                | RelationKind::MorphOne
                | RelationKind::MorphMany
                | RelationKind::MorphToMany
                | RelationKind::MorphedByMany
        )
    }

    /// Check if the relation yields a collection
    pub fn is_many(&self) -> bool {
        matches!(
            self,
            RelationKind::HasMany
                | RelationKind::BelongsToManyImplicit
                | RelationKind::BelongsToManyExplicit
                | RelationKind::MorphMany
                | RelationKind::MorphToMany
                | RelationKind::MorphedByMany
        )
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.eloquent_method())
    }
}

/// Cardinality declared by an owner-side `@morph` directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MorphCardinality {
    One,
    Many,
    ToMany,
    ByMany,
}

impl MorphCardinality {
    /// Parse the cardinality spelling used in directives
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "one" => Some(MorphCardinality::One),
            "many" => Some(MorphCardinality::Many),
            "to-many" | "toMany" | "to_many" => Some(MorphCardinality::ToMany),
            "by-many" | "byMany" | "by_many" => Some(MorphCardinality::ByMany),
            _ => None,
        }
    }

    /// Relation kind produced on the owner side
    pub fn relation_kind(&self) -> RelationKind {
        match self {
            MorphCardinality::One => RelationKind::MorphOne,
            MorphCardinality::Many => RelationKind::MorphMany,
            MorphCardinality::ToMany => RelationKind::MorphToMany,
            MorphCardinality::ByMany => RelationKind::MorphedByMany,
        }
    }

    /// Whether the accessor name should be pluralised
    pub fn is_multi_valued(&self) -> bool {
        !matches!(self, MorphCardinality::One)
    }
}

// ============================================================================
// Tests
// ============================================================================
