//! Built-in column rules
//!
//! Each rule recognises a Laravel schema builder shorthand. Paired rules
//! (timestamps, morphs) match from either member of the pair and suppress
//! the other so the pair renders exactly once.

use super::fallback::{actions, modifiers};
use super::{ColumnRule, RuleContext, quote};
use crate::descriptor::{ColumnDescriptor, ColumnHandle, DescriptorSet};
use laragen_core::ColumnType;

const CREATED_AT: &str = "created_at";
const UPDATED_AT: &str = "updated_at";
const DELETED_AT: &str = "deleted_at";
const REMEMBER_TOKEN: &str = "remember_token";
const MORPH_ID: &str = "_id";
const MORPH_TYPE: &str = "_type";

// ============================================================================
// Identity
// ============================================================================

/// Sole auto-incrementing integer primary key
#[derive(Debug, Clone, Copy)]
pub struct Identity;

impl ColumnRule for Identity {
    fn name(&self) -> &str {
        "identity"
    }

    fn test(&self, set: &DescriptorSet, handle: ColumnHandle, _ctx: &RuleContext) -> bool {
        let d = set.get(handle);
        d.primary && d.auto_increment && d.column_type.is_integer() && set.primary_columns().len() == 1
    }

    fn render(&self, set: &mut DescriptorSet, handle: ColumnHandle, _ctx: &RuleContext) -> Vec<String> {
        set.mark_identity(handle);
        let d = set.get(handle);
        let call = match (d.name.as_str(), d.column_type) {
            ("id", ColumnType::Integer | ColumnType::BigInteger) => "$table->id()".to_string(),
            _ => format!(
                "$table->{}({})",
                d.column_type.increments_method().unwrap_or("increments"),
                quote(&d.name)
            ),
        };
        let comment = d
            .comment
            .as_ref()
            .map(|c| format!("->comment({})", quote(c)))
            .unwrap_or_default();
        vec![format!("{}{};", call, comment)]
    }
}

// ============================================================================
// Timestamps
// ============================================================================

/// `created_at` + `updated_at` of matching type
#[derive(Debug, Clone, Copy)]
pub struct Timestamps {
    column_type: ColumnType,
}

impl Timestamps {
    pub fn plain() -> Self {
        Self {
            column_type: ColumnType::Timestamp,
        }
    }

    pub fn tz() -> Self {
        Self {
            column_type: ColumnType::TimestampTz,
        }
    }

    fn sibling(&self, set: &DescriptorSet, handle: ColumnHandle) -> Option<ColumnHandle> {
        let d = set.get(handle);
        if d.column_type != self.column_type {
            return None;
        }
        let other = match d.name.as_str() {
            CREATED_AT => UPDATED_AT,
            UPDATED_AT => CREATED_AT,
            _ => return None,
        };
        set.find_active(other).filter(|h| {
            let s = set.get(*h);
            s.column_type == d.column_type && s.args == d.args
        })
    }
}

impl ColumnRule for Timestamps {
    fn name(&self) -> &str {
        match self.column_type {
            ColumnType::TimestampTz => "timestamps_tz",
            _ => "timestamps",
        }
    }

    fn test(&self, set: &DescriptorSet, handle: ColumnHandle, _ctx: &RuleContext) -> bool {
        self.sibling(set, handle).is_some()
    }

    fn render(&self, set: &mut DescriptorSet, handle: ColumnHandle, _ctx: &RuleContext) -> Vec<String> {
        if let Some(sibling) = self.sibling(set, handle) {
            set.suppress(sibling);
        }
        let method = match self.column_type {
            ColumnType::TimestampTz => "timestampsTz",
            _ => "timestamps",
        };
        vec![format!("$table->{}({});", method, set.get(handle).args.join(", "))]
    }
}

// ============================================================================
// Soft Deletes
// ============================================================================

/// Nullable `deleted_at` timestamp
#[derive(Debug, Clone, Copy)]
pub struct SoftDeletes {
    column_type: ColumnType,
}

impl SoftDeletes {
    pub fn plain() -> Self {
        Self {
            column_type: ColumnType::Timestamp,
        }
    }

    pub fn tz() -> Self {
        Self {
            column_type: ColumnType::TimestampTz,
        }
    }
}

impl ColumnRule for SoftDeletes {
    fn name(&self) -> &str {
        match self.column_type {
            ColumnType::TimestampTz => "soft_deletes_tz",
            _ => "soft_deletes",
        }
    }

    fn test(&self, set: &DescriptorSet, handle: ColumnHandle, _ctx: &RuleContext) -> bool {
        let d = set.get(handle);
        d.name == DELETED_AT && d.column_type == self.column_type && d.nullable
    }

    fn render(&self, set: &mut DescriptorSet, handle: ColumnHandle, _ctx: &RuleContext) -> Vec<String> {
        let method = match self.column_type {
            ColumnType::TimestampTz => "softDeletesTz",
            _ => "softDeletes",
        };
        let args = &set.get(handle).args;
        if args.is_empty() {
            vec![format!("$table->{}();", method)]
        } else {
            vec![format!("$table->{}({}, {});", method, quote(DELETED_AT), args.join(", "))]
        }
    }
}

// ============================================================================
// Remember Token
// ============================================================================

/// Nullable `remember_token` string
#[derive(Debug, Clone, Copy)]
pub struct RememberToken;

impl ColumnRule for RememberToken {
    fn name(&self) -> &str {
        "remember_token"
    }

    fn test(&self, set: &DescriptorSet, handle: ColumnHandle, _ctx: &RuleContext) -> bool {
        let d = set.get(handle);
        d.name == REMEMBER_TOKEN
            && d.column_type == ColumnType::String
            && d.nullable
            && (d.args.is_empty() || d.args == ["100"])
    }

    fn render(&self, _set: &mut DescriptorSet, _handle: ColumnHandle, _ctx: &RuleContext) -> Vec<String> {
        vec!["$table->rememberToken();".to_string()]
    }
}

// ============================================================================
// Foreign Key Shorthand
// ============================================================================

/// Collapses a single-column owning foreign key and its column into
/// `foreignId` / `foreignUuid` / `foreignUlid`.
///
/// A relation marker visited before its column renders nothing and leaves
/// the work to the column; whichever side renders suppresses the marker.
#[derive(Debug, Clone, Copy)]
pub struct ForeignKeyShorthand;

impl ForeignKeyShorthand {
    fn method(column_type: ColumnType) -> Option<&'static str> {
        match column_type {
            ColumnType::Integer | ColumnType::BigInteger => Some("foreignId"),
            ColumnType::Uuid => Some("foreignUuid"),
            ColumnType::Ulid => Some("foreignUlid"),
            _ => None,
        }
    }

    /// The sole marker owning `column` through a single-column key
    fn owner_of(set: &DescriptorSet, column: ColumnHandle) -> Option<ColumnHandle> {
        let d = set.get(column);
        Self::method(d.column_type)?;
        if d.auto_increment {
            return None;
        }
        match set.markers_claiming(&d.name).as_slice() {
            [marker] => {
                let fk = set.get(*marker).owning_fk()?;
                (fk.local_columns.len() == 1 && fk.references.len() == 1).then_some(*marker)
            }
            _ => None,
        }
    }

    /// The column a marker would collapse into
    fn column_of(set: &DescriptorSet, marker: ColumnHandle) -> Option<ColumnHandle> {
        let fk = set.get(marker).owning_fk()?;
        let [local] = fk.local_columns.as_slice() else {
            return None;
        };
        let column = set.find_active(local)?;
        (Self::owner_of(set, column) == Some(marker)).then_some(column)
    }
}

impl ColumnRule for ForeignKeyShorthand {
    fn name(&self) -> &str {
        "foreign_key"
    }

    fn test(&self, set: &DescriptorSet, handle: ColumnHandle, _ctx: &RuleContext) -> bool {
        if set.get(handle).is_marker() {
            Self::column_of(set, handle).is_some()
        } else {
            Self::owner_of(set, handle).is_some()
        }
    }

    fn render(&self, set: &mut DescriptorSet, handle: ColumnHandle, _ctx: &RuleContext) -> Vec<String> {
        if set.get(handle).is_marker() {
            return Vec::new();
        }
        let Some(marker) = Self::owner_of(set, handle) else {
            return Vec::new();
        };
        let relationship = set.get(marker).relationship.clone();
        set.suppress(marker);
        set.get_mut(handle).relationship = relationship;

        let d = set.get(handle);
        let Some(fk) = d.relationship.as_ref() else {
            return Vec::new();
        };
        let method = Self::method(d.column_type).unwrap_or("foreignId");
        let constrained = match fk.references.first().map(String::as_str) {
            Some("id") | None => format!("->constrained({})", quote(&fk.target_table)),
            Some(column) => format!(
                "->constrained({}, {})",
                quote(&fk.target_table),
                quote(column)
            ),
        };
        vec![format!(
            "$table->{}({}){}{}{};",
            method,
            quote(&d.name),
            modifiers(d),
            constrained,
            actions(fk)
        )]
    }
}

// ============================================================================
// Morphs
// ============================================================================

/// Find the `<base>_id` / `<base>_type` pair around `handle`
fn morph_pair(
    set: &DescriptorSet,
    handle: ColumnHandle,
    id_ok: impl Fn(&ColumnDescriptor) -> bool,
) -> Option<(ColumnHandle, ColumnHandle, String)> {
    let d = set.get(handle);
    if d.is_marker() {
        return None;
    }
    let (id, kind, base) = if let Some(base) = d.name.strip_suffix(MORPH_ID) {
        let kind = set.find_active(&format!("{}{}", base, MORPH_TYPE))?;
        (handle, kind, base)
    } else if let Some(base) = d.name.strip_suffix(MORPH_TYPE) {
        let id = set.find_active(&format!("{}{}", base, MORPH_ID))?;
        (id, handle, base)
    } else {
        return None;
    };
    if base.is_empty() {
        return None;
    }

    let id_d = set.get(id);
    let kind_d = set.get(kind);
    let matches = id_ok(id_d)
        && kind_d.column_type == ColumnType::String
        && id_d.nullable == kind_d.nullable
        && !id_d.primary
        && !kind_d.primary
        && id_d.relationship.is_none()
        && kind_d.relationship.is_none()
        && set.markers_claiming(&id_d.name).is_empty();
    matches.then(|| (id, kind, base.to_string()))
}

/// `uuidMorphs` / `ulidMorphs` and their nullable variants
#[derive(Debug, Clone, Copy)]
pub struct KeyedMorphs {
    column_type: ColumnType,
}

impl KeyedMorphs {
    pub fn uuid() -> Self {
        Self {
            column_type: ColumnType::Uuid,
        }
    }

    pub fn ulid() -> Self {
        Self {
            column_type: ColumnType::Ulid,
        }
    }

    fn method(&self, nullable: bool) -> &'static str {
        match (self.column_type, nullable) {
            (ColumnType::Ulid, false) => "ulidMorphs",
            (ColumnType::Ulid, true) => "nullableUlidMorphs",
            (_, false) => "uuidMorphs",
            (_, true) => "nullableUuidMorphs",
        }
    }
}

impl ColumnRule for KeyedMorphs {
    fn name(&self) -> &str {
        match self.column_type {
            ColumnType::Ulid => "ulid_morphs",
            _ => "uuid_morphs",
        }
    }

    fn test(&self, set: &DescriptorSet, handle: ColumnHandle, _ctx: &RuleContext) -> bool {
        morph_pair(set, handle, |d| d.column_type == self.column_type).is_some()
    }

    fn render(&self, set: &mut DescriptorSet, handle: ColumnHandle, _ctx: &RuleContext) -> Vec<String> {
        render_morphs(set, handle, |d| d.column_type == self.column_type, |n| self.method(n))
    }
}

/// `morphs` / `nullableMorphs` over an integer id column
#[derive(Debug, Clone, Copy)]
pub struct Morphs;

impl ColumnRule for Morphs {
    fn name(&self) -> &str {
        "morphs"
    }

    fn test(&self, set: &DescriptorSet, handle: ColumnHandle, _ctx: &RuleContext) -> bool {
        morph_pair(set, handle, integer_id).is_some()
    }

    fn render(&self, set: &mut DescriptorSet, handle: ColumnHandle, _ctx: &RuleContext) -> Vec<String> {
        render_morphs(set, handle, integer_id, |nullable| {
            if nullable { "nullableMorphs" } else { "morphs" }
        })
    }
}

fn integer_id(d: &ColumnDescriptor) -> bool {
    matches!(d.column_type, ColumnType::Integer | ColumnType::BigInteger) && !d.auto_increment
}

fn render_morphs(
    set: &mut DescriptorSet,
    handle: ColumnHandle,
    id_ok: impl Fn(&ColumnDescriptor) -> bool,
    method: impl Fn(bool) -> &'static str,
) -> Vec<String> {
    let Some((id, kind, base)) = morph_pair(set, handle, id_ok) else {
        return Vec::new();
    };
    let nullable = set.get(id).nullable;
    set.suppress(id);
    set.suppress(kind);
    vec![format!("$table->{}({});", method(nullable), quote(&base))]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ColumnDefault, ForeignKeyMeta};
    use laragen_core::ReferentialAction;
    use pretty_assertions::assert_eq;

    fn ctx() -> RuleContext {
        RuleContext::new("Post", "posts")
    }

    fn run(rule: &dyn ColumnRule, set: &mut DescriptorSet, at: usize) -> Option<Vec<String>> {
        let h = ColumnHandle(at);
        rule.test(set, h, &ctx()).then(|| rule.render(set, h, &ctx()))
    }

    #[test]
    fn test_identity() {
        let mut set = DescriptorSet::new().with(
            ColumnDescriptor::new("id", ColumnType::Integer)
                .primary()
                .auto_increment()
                .unsigned(),
        );
        assert_eq!(run(&Identity, &mut set, 0).unwrap(), vec!["$table->id();"]);
        assert_eq!(set.identity(), Some(ColumnHandle(0)));

        let mut set = DescriptorSet::new().with(
            ColumnDescriptor::new("post_no", ColumnType::SmallInteger)
                .primary()
                .auto_increment(),
        );
        assert_eq!(
            run(&Identity, &mut set, 0).unwrap(),
            vec!["$table->smallIncrements('post_no');"]
        );
    }

    #[test]
    fn test_identity_skips_composite_keys() {
        let mut set = DescriptorSet::new()
            .with(ColumnDescriptor::new("id", ColumnType::Integer).primary().auto_increment())
            .with(ColumnDescriptor::new("tenant", ColumnType::Integer).primary());
        assert!(run(&Identity, &mut set, 0).is_none());
    }

    #[test]
    fn test_timestamps_pair_from_either_side() {
        let build = || {
            DescriptorSet::new()
                .with(ColumnDescriptor::new("updated_at", ColumnType::TimestampTz))
                .with(ColumnDescriptor::new("created_at", ColumnType::TimestampTz))
        };

        let mut set = build();
        assert!(run(&Timestamps::plain(), &mut set, 0).is_none());
        assert_eq!(
            run(&Timestamps::tz(), &mut set, 0).unwrap(),
            vec!["$table->timestampsTz();"]
        );
        assert!(set.is_ignored(ColumnHandle(1)));
        assert!(!set.is_ignored(ColumnHandle(0)));

        let mut set = build();
        assert!(run(&Timestamps::tz(), &mut set, 1).is_some());
        assert!(set.is_ignored(ColumnHandle(0)));
    }

    #[test]
    fn test_timestamps_need_matching_types() {
        let mut set = DescriptorSet::new()
            .with(ColumnDescriptor::new("created_at", ColumnType::Timestamp))
            .with(ColumnDescriptor::new("updated_at", ColumnType::TimestampTz));
        assert!(run(&Timestamps::plain(), &mut set, 0).is_none());
        assert!(run(&Timestamps::tz(), &mut set, 1).is_none());
    }

    #[test]
    fn test_soft_deletes_and_remember_token() {
        let mut set = DescriptorSet::new()
            .with(ColumnDescriptor::new("deleted_at", ColumnType::Timestamp).nullable())
            .with(ColumnDescriptor::new("remember_token", ColumnType::String).nullable().with_args(&["100"]))
            .with(ColumnDescriptor::new("deleted_at", ColumnType::Timestamp));
        assert_eq!(
            run(&SoftDeletes::plain(), &mut set, 0).unwrap(),
            vec!["$table->softDeletes();"]
        );
        assert!(run(&SoftDeletes::tz(), &mut set, 0).is_none());
        assert!(run(&SoftDeletes::plain(), &mut set, 2).is_none());
        assert_eq!(
            run(&RememberToken, &mut set, 1).unwrap(),
            vec!["$table->rememberToken();"]
        );
    }

    fn fk_set(column_first: bool) -> DescriptorSet {
        let mut fk = ForeignKeyMeta::new("author", "users", "author_id", "id");
        fk.on_delete = Some(ReferentialAction::Cascade);
        let column = ColumnDescriptor::new("author_id", ColumnType::Integer)
            .nullable()
            .with_comment("Writer");
        let marker = ColumnDescriptor::marker("author", Some(fk));
        if column_first {
            DescriptorSet::new().with(column).with(marker)
        } else {
            DescriptorSet::new().with(marker).with(column)
        }
    }

    #[test]
    fn test_foreign_key_collapse_column_first() {
        let mut set = fk_set(true);
        assert_eq!(
            run(&ForeignKeyShorthand, &mut set, 0).unwrap(),
            vec!["$table->foreignId('author_id')->nullable()->comment('Writer')->constrained('users')->cascadeOnDelete();"]
        );
        assert!(set.is_ignored(ColumnHandle(1)));
        assert_eq!(
            set.get(ColumnHandle(0)).relationship.as_ref().map(|fk| fk.target_table.as_str()),
            Some("users")
        );
    }

    #[test]
    fn test_foreign_key_collapse_marker_first() {
        let mut set = fk_set(false);
        assert_eq!(run(&ForeignKeyShorthand, &mut set, 0).unwrap(), Vec::<String>::new());
        assert!(!set.is_ignored(ColumnHandle(0)));

        let lines = run(&ForeignKeyShorthand, &mut set, 1).unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("$table->foreignId('author_id')"));
        assert!(set.is_ignored(ColumnHandle(0)));
    }

    #[test]
    fn test_foreign_key_custom_reference_and_uuid() {
        let fk = ForeignKeyMeta::new("team", "teams", "team_ref", "uuid");
        let mut set = DescriptorSet::new()
            .with(ColumnDescriptor::new("team_ref", ColumnType::Uuid))
            .with(ColumnDescriptor::marker("team", Some(fk)));
        assert_eq!(
            run(&ForeignKeyShorthand, &mut set, 0).unwrap(),
            vec!["$table->foreignUuid('team_ref')->constrained('teams', 'uuid');"]
        );
    }

    #[test]
    fn test_foreign_key_skips_string_and_composite() {
        let fk = ForeignKeyMeta::new("user", "users", "email", "email");
        let mut set = DescriptorSet::new()
            .with(ColumnDescriptor::new("email", ColumnType::String))
            .with(ColumnDescriptor::marker("user", Some(fk)));
        assert!(run(&ForeignKeyShorthand, &mut set, 0).is_none());
        assert!(run(&ForeignKeyShorthand, &mut set, 1).is_none());

        let mut fk = ForeignKeyMeta::new("member", "members", "org_id", "org_id");
        fk.local_columns.push("user_id".into());
        fk.references.push("user_id".into());
        let mut set = DescriptorSet::new()
            .with(ColumnDescriptor::new("org_id", ColumnType::Integer))
            .with(ColumnDescriptor::new("user_id", ColumnType::Integer))
            .with(ColumnDescriptor::marker("member", Some(fk)));
        assert!(run(&ForeignKeyShorthand, &mut set, 0).is_none());
        assert!(run(&ForeignKeyShorthand, &mut set, 2).is_none());
    }

    #[test]
    fn test_morphs_merge_and_suppress_both() {
        let mut set = DescriptorSet::new()
            .with(ColumnDescriptor::new("body", ColumnType::Text))
            .with(ColumnDescriptor::new("commentable_id", ColumnType::Integer))
            .with(ColumnDescriptor::new("commentable_type", ColumnType::String));
        assert!(run(&Morphs, &mut set, 0).is_none());
        assert_eq!(
            run(&Morphs, &mut set, 1).unwrap(),
            vec!["$table->morphs('commentable');"]
        );
        assert!(set.is_ignored(ColumnHandle(1)));
        assert!(set.is_ignored(ColumnHandle(2)));
    }

    #[test]
    fn test_keyed_and_nullable_morphs() {
        let mut set = DescriptorSet::new()
            .with(ColumnDescriptor::new("owner_type", ColumnType::String).nullable())
            .with(ColumnDescriptor::new("owner_id", ColumnType::Uuid).nullable());
        assert!(run(&Morphs, &mut set, 0).is_none());
        assert!(run(&KeyedMorphs::ulid(), &mut set, 0).is_none());
        assert_eq!(
            run(&KeyedMorphs::uuid(), &mut set, 0).unwrap(),
            vec!["$table->nullableUuidMorphs('owner');"]
        );

        let mut set = DescriptorSet::new()
            .with(ColumnDescriptor::new("owner_id", ColumnType::Integer).nullable())
            .with(ColumnDescriptor::new("owner_type", ColumnType::String));
        assert!(run(&Morphs, &mut set, 0).is_none());
    }

    #[test]
    fn test_morph_pair_owned_by_foreign_key_is_not_merged() {
        let fk = ForeignKeyMeta::new("owner", "users", "owner_id", "id");
        let mut set = DescriptorSet::new()
            .with(ColumnDescriptor::new("owner_id", ColumnType::Integer))
            .with(ColumnDescriptor::new("owner_type", ColumnType::String).with_default(ColumnDefault::generator("cuid")))
            .with(ColumnDescriptor::marker("owner", Some(fk)));
        assert!(run(&Morphs, &mut set, 0).is_none());
        assert!(run(&ForeignKeyShorthand, &mut set, 0).is_some());
        // The collapsed column keeps its key even though the marker is gone
        assert!(run(&Morphs, &mut set, 1).is_none());
    }
}
