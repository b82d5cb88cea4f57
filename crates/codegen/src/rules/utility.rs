//! Table-level utility rules

use super::{RuleContext, UtilityRule, column_list, quote};
use crate::descriptor::DescriptorSet;
use laragen_ir::IndexKind;

/// `$table->primary([...])` for keys spanning several columns
#[derive(Debug, Clone, Copy)]
pub struct CompositePrimary;

impl UtilityRule for CompositePrimary {
    fn name(&self) -> &str {
        "composite_primary"
    }

    fn apply(&self, set: &mut DescriptorSet, _ctx: &RuleContext) -> Vec<String> {
        let columns = primary_names(set);
        if columns.len() < 2 {
            return Vec::new();
        }
        vec![format!("$table->primary({});", column_list(&columns))]
    }
}

/// `$table->primary('col')` unless the identity shorthand covered it
#[derive(Debug, Clone, Copy)]
pub struct SinglePrimary;

impl UtilityRule for SinglePrimary {
    fn name(&self) -> &str {
        "primary"
    }

    fn apply(&self, set: &mut DescriptorSet, _ctx: &RuleContext) -> Vec<String> {
        match set.primary_columns().as_slice() {
            [only] if set.identity() != Some(*only) => {
                vec![format!("$table->primary({});", quote(&set.get(*only).name))]
            }
            _ => Vec::new(),
        }
    }
}

/// Unique, plain and full-text indexes
#[derive(Debug, Clone, Copy)]
pub struct Indexes;

impl UtilityRule for Indexes {
    fn name(&self) -> &str {
        "indexes"
    }

    fn apply(&self, set: &mut DescriptorSet, _ctx: &RuleContext) -> Vec<String> {
        let mut lines = Vec::new();
        let mut unique_columns: Vec<&str> = Vec::new();

        for d in set.iter() {
            if d.unique && !d.primary && !d.silent && !d.is_marker() {
                lines.push(format!("$table->unique({});", quote(&d.name)));
                unique_columns.push(d.name.as_str());
            }
        }

        for index in &set.indexes {
            let silenced = index
                .columns
                .iter()
                .any(|c| set.find(c).map(|h| set.get(h).silent).unwrap_or(false));
            if silenced || index.columns.is_empty() {
                continue;
            }
            let method = match index.kind {
                IndexKind::Unique => {
                    if let [single] = index.columns.as_slice() {
                        if unique_columns.contains(&single.as_str()) && index.name.is_none() {
                            continue;
                        }
                    }
                    "unique"
                }
                IndexKind::Normal => "index",
                IndexKind::Fulltext => "fullText",
                IndexKind::Id => continue,
            };
            let name = index
                .name
                .as_ref()
                .map(|n| format!(", {}", quote(n)))
                .unwrap_or_default();
            lines.push(format!("$table->{}({}{});", method, column_list(&index.columns), name));
        }
        lines
    }
}

fn primary_names(set: &DescriptorSet) -> Vec<String> {
    set.primary_columns()
        .into_iter()
        .map(|h| set.get(h).name.clone())
        .collect()
}
