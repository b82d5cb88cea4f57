//! # Column Rules
//!
//! Rule resolution turns a table's [`DescriptorSet`] into schema builder
//! statements. Column rules are tried in a fixed priority order against
//! each non-ignored descriptor; the first rule whose `test` passes renders
//! it. A matched rule may suppress sibling descriptors, which are then
//! skipped for the rest of the pass. Descriptors no rule claims go to the
//! structural fallback.
//!
//! Utility rules run once per table after the column pass and emit
//! table-level statements (primary keys, indexes).
//!
//! ## Priority
//!
//! 1. identity shorthand (`$table->id()`, `increments`)
//! 2. `timestampsTz`, `timestamps`
//! 3. `softDeletesTz`, `softDeletes`
//! 4. `rememberToken`
//! 5. foreign key shorthand (`foreignId` / `foreignUuid` / `foreignUlid`)
//! 6. `uuidMorphs`, `ulidMorphs` (and nullable variants)
//! 7. `morphs`, `nullableMorphs`
//! 8. caller-supplied rules
//!
//! Callers extend the set through a [`RuleProvider`]. Provided rules are
//! appended after the built-in ones and may never shadow them.

pub mod builtin;
pub mod fallback;
pub mod utility;

use crate::descriptor::{ColumnHandle, DescriptorSet};
use laragen_core::{EngineError, EngineResult};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

pub use fallback::StructuralFallback;

// ============================================================================
// Rule Context
// ============================================================================

/// Table-level information available to every rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleContext {
    /// Source model name
    pub model: String,
    /// Physical table name
    pub table: String,
}

impl RuleContext {
    pub fn new(model: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            table: table.into(),
        }
    }
}

// ============================================================================
// Rule Traits
// ============================================================================

/// A rule matching a single descriptor
pub trait ColumnRule: Send + Sync {
    /// Unique rule name
    fn name(&self) -> &str;

    /// Whether this rule claims the descriptor at `handle`
    fn test(&self, set: &DescriptorSet, handle: ColumnHandle, ctx: &RuleContext) -> bool;

    /// Render the descriptor; may suppress siblings in `set`
    fn render(&self, set: &mut DescriptorSet, handle: ColumnHandle, ctx: &RuleContext) -> Vec<String>;
}

/// A table-level rule applied once after the column pass
pub trait UtilityRule: Send + Sync {
    /// Unique rule name, also the key of its consumed flag
    fn name(&self) -> &str;

    /// Emit table-level statements
    fn apply(&self, set: &mut DescriptorSet, ctx: &RuleContext) -> Vec<String>;
}

/// Source of caller-supplied column rules
pub trait RuleProvider {
    fn rules(&self) -> Vec<Box<dyn ColumnRule>>;
}

// ============================================================================
// RuleSet
// ============================================================================

/// Ordered collection of column and utility rules
#[derive(Clone, Default)]
pub struct RuleSet {
    column: Vec<Arc<dyn ColumnRule>>,
    utility: Vec<Arc<dyn UtilityRule>>,
}

impl RuleSet {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a rule set with the built-in rules in priority order
    pub fn with_default_rules() -> Self {
        let mut set = Self::new();
        set.add_utility(utility::CompositePrimary);
        set.add_utility(utility::SinglePrimary);
        set.add_utility(utility::Indexes);

        set.add_rule(builtin::Identity);
        set.add_rule(builtin::Timestamps::tz());
        set.add_rule(builtin::Timestamps::plain());
        set.add_rule(builtin::SoftDeletes::tz());
        set.add_rule(builtin::SoftDeletes::plain());
        set.add_rule(builtin::RememberToken);
        set.add_rule(builtin::ForeignKeyShorthand);
        set.add_rule(builtin::KeyedMorphs::uuid());
        set.add_rule(builtin::KeyedMorphs::ulid());
        set.add_rule(builtin::Morphs);
        set
    }

    /// Append a column rule
    pub fn add_rule<R: ColumnRule + 'static>(&mut self, rule: R) {
        self.column.push(Arc::new(rule));
    }

    /// Append a utility rule
    pub fn add_utility<R: UtilityRule + 'static>(&mut self, rule: R) {
        self.utility.push(Arc::new(rule));
    }

    /// Append every rule of a provider after the existing ones.
    ///
    /// Fails with [`EngineError::RuleContract`] when a provided rule has an
    /// empty name, repeats a name within the batch, or shadows an existing
    /// rule. Nothing is registered on failure.
    pub fn register(&mut self, provider: &dyn RuleProvider) -> EngineResult<usize> {
        let mut existing: HashSet<String> = self.names().into_iter().collect();
        existing.insert(StructuralFallback.name().to_string());

        let provided = provider.rules();
        let mut batch: HashSet<String> = HashSet::new();
        for rule in &provided {
            let name = rule.name();
            if name.trim().is_empty() {
                return Err(EngineError::rule_contract("<unnamed>", "rule name must not be empty"));
            }
            if existing.contains(name) {
                return Err(EngineError::rule_contract(
                    name,
                    "name is already taken by a registered rule",
                ));
            }
            if !batch.insert(name.to_string()) {
                return Err(EngineError::rule_contract(name, "name appears twice in the provided rules"));
            }
        }

        let count = provided.len();
        self.column.extend(provided.into_iter().map(Arc::from));
        tracing::debug!(rules = count, "Registered provided column rules");
        Ok(count)
    }

    /// First column rule claiming the descriptor at `handle`
    pub fn matching(
        &self,
        set: &DescriptorSet,
        handle: ColumnHandle,
        ctx: &RuleContext,
    ) -> Option<&Arc<dyn ColumnRule>> {
        self.column.iter().find(|rule| rule.test(set, handle, ctx))
    }

    pub fn column_rules(&self) -> &[Arc<dyn ColumnRule>] {
        &self.column
    }

    pub fn utility_rules(&self) -> &[Arc<dyn UtilityRule>] {
        &self.utility
    }

    /// Names of every registered rule, utilities first
    pub fn names(&self) -> Vec<String> {
        self.utility
            .iter()
            .map(|r| r.name().to_string())
            .chain(self.column.iter().map(|r| r.name().to_string()))
            .collect()
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet").field("rules", &self.names()).finish()
    }
}

// ============================================================================
// Rendering Helpers
// ============================================================================

/// Quote a PHP string literal
pub(crate) fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Render one column name as `'a'`, several as `['a', 'b']`
pub(crate) fn column_list(columns: &[String]) -> String {
    match columns {
        [single] => quote(single),
        many => format!(
            "[{}]",
            many.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ")
        ),
    }
}

/// Render a JSON value as a PHP literal
pub(crate) fn php_literal(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => quote(s),
        other => quote(&other.to_string()),
    }
}
