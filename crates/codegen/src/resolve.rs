//! Rule resolution over one table

use crate::descriptor::DescriptorSet;
use crate::rules::{ColumnRule, RuleContext, RuleSet, StructuralFallback};

/// Resolve every descriptor of `set` into schema builder statements.
///
/// Descriptors are visited in declaration order. A descriptor suppressed
/// by an earlier rule is skipped. Utility rules run once afterwards, each
/// guarded by its consumed flag.
pub fn resolve(set: &mut DescriptorSet, rules: &RuleSet, ctx: &RuleContext) -> Vec<String> {
    let mut lines = Vec::new();
    let handles: Vec<_> = set.handles().collect();

    for handle in handles {
        if set.is_ignored(handle) {
            continue;
        }
        let rendered = match rules.matching(set, handle, ctx) {
            Some(rule) => {
                tracing::trace!(
                    table = %ctx.table,
                    column = %set.get(handle).name,
                    rule = rule.name(),
                    "Rule matched"
                );
                rule.render(set, handle, ctx)
            }
            None => StructuralFallback.render(set, handle, ctx),
        };
        lines.extend(rendered);
    }

    for utility in rules.utility_rules() {
        if set.consume(utility.name()) {
            lines.extend(utility.apply(set, ctx));
        }
    }

    tracing::debug!(table = %ctx.table, statements = lines.len(), "Resolved table");
    lines
}
