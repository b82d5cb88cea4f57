//! Structural fallback
//!
//! Renders any descriptor no specialised rule claimed: plain columns through
//! their builder method plus modifiers, relation markers as explicit
//! `foreign(...)->references(...)->on(...)` constraints.

use super::{ColumnRule, RuleContext, column_list, php_literal, quote};
use crate::descriptor::{ColumnDefault, ColumnDescriptor, ColumnHandle, DescriptorSet, ForeignKeyMeta};
use laragen_core::ColumnType;

/// Unconditional last-resort rule
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralFallback;

impl ColumnRule for StructuralFallback {
    fn name(&self) -> &str {
        "structural"
    }

    fn test(&self, _set: &DescriptorSet, _handle: ColumnHandle, _ctx: &RuleContext) -> bool {
        true
    }

    fn render(&self, set: &mut DescriptorSet, handle: ColumnHandle, _ctx: &RuleContext) -> Vec<String> {
        let descriptor = set.get(handle);
        if descriptor.is_marker() {
            return descriptor
                .owning_fk()
                .map(|fk| vec![foreign_constraint(fk)])
                .unwrap_or_default();
        }
        render_column(descriptor).into_iter().collect()
    }
}

/// `$table->method('name', args...)` with modifiers
pub fn render_column(d: &ColumnDescriptor) -> Option<String> {
    let method = d.column_type.builder_method()?;
    let mut line = format!("$table->{}({}", method, quote(&d.name));

    if d.column_type == ColumnType::Enum {
        let values: Vec<String> = d.enum_values.iter().map(|v| quote(v)).collect();
        line.push_str(&format!(", [{}]", values.join(", ")));
    } else {
        for arg in &d.args {
            line.push_str(", ");
            line.push_str(&builder_arg(arg));
        }
    }
    line.push(')');

    if d.auto_increment {
        line.push_str("->autoIncrement()");
    } else if d.unsigned {
        line.push_str("->unsigned()");
    }
    line.push_str(&modifiers(d));
    line.push(';');
    Some(line)
}

/// `->nullable()`, default and comment modifiers
pub fn modifiers(d: &ColumnDescriptor) -> String {
    let mut out = String::new();
    if d.nullable {
        out.push_str("->nullable()");
    }
    if let Some(default) = &d.default {
        out.push_str(&default_modifier(default));
    }
    if let Some(comment) = &d.comment {
        out.push_str(&format!("->comment({})", quote(comment)));
    }
    out
}

/// Modifier for a default value; app-side generators render nothing
pub fn default_modifier(default: &ColumnDefault) -> String {
    match default {
        ColumnDefault::Literal(value) => format!("->default({})", php_literal(value)),
        ColumnDefault::Generator { name, args } => match name.as_str() {
            "now" => "->useCurrent()".to_string(),
            "dbgenerated" => match args.first().and_then(|a| a.as_str()) {
                Some(expr) => format!("->default(DB::raw({}))", quote(expr)),
                None => String::new(),
            },
            _ => String::new(),
        },
    }
}

/// Explicit foreign key constraint with referential actions
pub fn foreign_constraint(fk: &ForeignKeyMeta) -> String {
    let mut line = format!(
        "$table->foreign({})->references({})->on({})",
        column_list(&fk.local_columns),
        column_list(&fk.references),
        quote(&fk.target_table)
    );
    line.push_str(&actions(fk));
    line.push(';');
    line
}

/// `->cascadeOnDelete()` style modifiers for the actions that are set
pub fn actions(fk: &ForeignKeyMeta) -> String {
    let mut out = String::new();
    if let Some(action) = fk.on_delete {
        out.push_str(&action.on_delete_modifier());
    }
    if let Some(action) = fk.on_update {
        out.push_str(&action.on_update_modifier());
    }
    out
}

fn builder_arg(arg: &str) -> String {
    if arg.parse::<f64>().is_ok() {
        arg.to_string()
    } else {
        quote(arg)
    }
}
