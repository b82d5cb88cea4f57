//! # Documentation Directives
//!
//! Models and fields may embed directives in their documentation string.
//! Four shapes are recognised:
//!
//! ```text
//! @tag              flag form
//! @tag(a, b)        argument list
//! @tag{key: value}  structured block
//! @tag:Value        single value, optionally followed by `as Alias`
//! ```
//!
//! Bodies are balanced over `()`, `[]` and `{}` and quote-aware. Directives
//! are parsed once at the boundary into a typed [`DirectiveSet`]; the text
//! left after stripping them becomes the column comment.

use laragen_core::{EngineError, EngineResult, MorphCardinality};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)@([A-Za-z_]\w*)").expect("directive pattern compiles"));

// ============================================================================
// Typed directive values
// ============================================================================

/// A class reference such as `App\Models\Concerns\HasUuid as Uuid`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespacedRef {
    pub path: String,
    pub alias: Option<String>,
}

impl NamespacedRef {
    fn parse(raw: &str) -> Self {
        let raw = unquote(raw.trim());
        match raw.split_once(" as ") {
            Some((path, alias)) => Self {
                path: path.trim().to_string(),
                alias: Some(alias.trim().to_string()),
            },
            None => Self {
                path: raw.to_string(),
                alias: None,
            },
        }
    }

    /// Short class name (alias, or last namespace segment)
    pub fn short_name(&self) -> &str {
        self.alias
            .as_deref()
            .unwrap_or_else(|| self.path.rsplit('\\').next().unwrap_or(&self.path))
    }
}

/// A cast or type hint: either one bare value or `key: value` entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structured {
    pub value: Option<String>,
    pub entries: Vec<(String, String)>,
}

impl Structured {
    /// Look up an entry by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn merge(&mut self, other: Structured) {
        if other.value.is_some() {
            self.value = other.value;
        }
        self.entries.extend(other.entries);
    }
}

/// Where a `@local` / `@silent` directive applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub migrations: bool,
    pub models: bool,
}

impl Scope {
    /// Both stages
    pub fn all() -> Self {
        Self {
            migrations: true,
            models: true,
        }
    }
}

/// An owner-side polymorphic declaration
///
/// `@morph(name: commentable, type: many, model: Comment)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphDirective {
    /// Discriminator base (`commentable` -> `commentable_id`/`commentable_type`)
    pub name: String,
    pub cardinality: MorphCardinality,
    /// Related model
    pub model: String,
    /// Pivot table for `to-many` / `by-many`
    pub table: Option<String>,
    /// Accessor name override
    pub alias: Option<String>,
    /// Raw call chain appended to the relation
    pub chain: Option<String>,
    pub id: Option<String>,
    pub type_column: Option<String>,
}

// ============================================================================
// DirectiveSet
// ============================================================================

/// Every directive found in one documentation string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveSet {
    /// `Some(vec![])` is the bare flag form used on fields
    pub fillable: Option<Vec<String>>,
    pub hidden: Option<Vec<String>>,
    pub guarded: Option<Vec<String>>,
    pub with: Option<Vec<String>>,
    pub ignore: bool,
    pub cast: Option<Structured>,
    pub type_hint: Option<Structured>,
    pub traits: Vec<NamespacedRef>,
    pub implements: Vec<NamespacedRef>,
    pub observer: Option<NamespacedRef>,
    pub factory: Option<NamespacedRef>,
    pub extends: Option<NamespacedRef>,
    pub pivot: bool,
    pub pivot_alias: Option<String>,
    pub with_timestamps: bool,
    pub morphs: Vec<MorphDirective>,
    pub local: Option<Scope>,
    pub silent: Option<Scope>,
    /// Unrecognised tags with their raw body
    pub other: Vec<(String, Option<String>)>,
    /// Documentation with every directive removed
    pub comment: Option<String>,
}

impl DirectiveSet {
    /// Parse an optional documentation string
    pub fn from_doc(doc: Option<&str>) -> EngineResult<Self> {
        match doc {
            Some(text) => Self::parse(text),
            None => Ok(Self::default()),
        }
    }

    /// Parse every directive out of `text`
    pub fn parse(text: &str) -> EngineResult<Self> {
        let mut set = Self::default();
        let mut remainder = String::with_capacity(text.len());
        let mut cursor = 0;

        for caps in TAG.captures_iter(text) {
            let name = match caps.get(1) {
                Some(m) => m,
                None => continue,
            };
            let at = name.start() - 1;
            if at < cursor {
                continue;
            }
            remainder.push_str(&text[cursor..at]);

            let (body, end) = read_body(text, name.as_str(), name.end())?;
            set.apply(name.as_str(), body)?;
            cursor = end;
        }
        remainder.push_str(&text[cursor..]);

        let comment = remainder
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !comment.is_empty() {
            set.comment = Some(comment);
        }
        Ok(set)
    }

    fn apply(&mut self, tag: &str, body: Option<Body<'_>>) -> EngineResult<()> {
        match tag {
            "fillable" => extend_list(&mut self.fillable, body),
            "hidden" => extend_list(&mut self.hidden, body),
            "guarded" => extend_list(&mut self.guarded, body),
            "with" => extend_list(&mut self.with, body),
            "ignore" => self.ignore = true,
            "pivot" => self.pivot = true,
            "withTimestamps" => self.with_timestamps = true,
            "cast" | "type" => {
                let parsed = parse_structured(tag, body)?;
                let slot = if tag == "cast" {
                    &mut self.cast
                } else {
                    &mut self.type_hint
                };
                match slot {
                    Some(existing) => existing.merge(parsed),
                    None => *slot = Some(parsed),
                }
            }
            "trait" | "implements" => {
                let raw = require_body(tag, body)?;
                let refs = split_top_level(raw.text)
                    .into_iter()
                    .filter(|p| !p.trim().is_empty())
                    .map(NamespacedRef::parse);
                if tag == "trait" {
                    self.traits.extend(refs);
                } else {
                    self.implements.extend(refs);
                }
            }
            "observer" => self.observer = Some(NamespacedRef::parse(require_body(tag, body)?.text)),
            "factory" => self.factory = Some(NamespacedRef::parse(require_body(tag, body)?.text)),
            "extend" | "extends" => {
                self.extends = Some(NamespacedRef::parse(require_body(tag, body)?.text))
            }
            "pivotAlias" => {
                let alias = unquote(require_body(tag, body)?.text.trim()).to_string();
                if alias.is_empty() {
                    return Err(EngineError::directive(tag, "missing alias"));
                }
                self.pivot_alias = Some(alias);
            }
            "morph" => {
                let raw = require_body(tag, body)?;
                self.morphs.push(parse_morph(raw.text)?);
            }
            "local" => self.local = Some(parse_scope(tag, body)?),
            "silent" => self.silent = Some(parse_scope(tag, body)?),
            _ => self
                .other
                .push((tag.to_string(), body.map(|b| b.text.trim().to_string()))),
        }
        Ok(())
    }

    // ========================================================================
    // Query methods
    // ========================================================================

    /// Whether the field/model is excluded from migration output
    pub fn silent_in_migrations(&self) -> bool {
        self.silent.map(|s| s.migrations).unwrap_or(false) || self.ignore
    }

    /// Whether the field/model is excluded from model output
    pub fn silent_in_models(&self) -> bool {
        self.silent.map(|s| s.models).unwrap_or(false)
    }

    /// Whether a foreign key is kept application-side only
    pub fn local_in_migrations(&self) -> bool {
        self.local.map(|s| s.migrations).unwrap_or(false)
    }

    /// Whether a relation is skipped when building model relations
    pub fn local_in_models(&self) -> bool {
        self.local.map(|s| s.models).unwrap_or(false)
    }

    /// Whether a bare or listed `@fillable` mentions `name`
    pub fn lists_fillable(&self, name: &str) -> bool {
        lists(&self.fillable, name)
    }

    /// Whether a bare or listed `@hidden` mentions `name`
    pub fn lists_hidden(&self, name: &str) -> bool {
        lists(&self.hidden, name)
    }

    /// Whether a bare or listed `@guarded` mentions `name`
    pub fn lists_guarded(&self, name: &str) -> bool {
        lists(&self.guarded, name)
    }

    /// Whether no directive was found
    pub fn is_empty(&self) -> bool {
        let comment = self.comment.clone();
        let bare = Self {
            comment,
            ..Self::default()
        };
        *self == bare
    }
}

fn lists(slot: &Option<Vec<String>>, name: &str) -> bool {
    match slot {
        Some(names) => names.is_empty() || names.iter().any(|n| n == name),
        None => false,
    }
}

// ============================================================================
// Body scanning
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyShape {
    Args,
    Block,
    Value,
}

#[derive(Debug, Clone, Copy)]
struct Body<'a> {
    shape: BodyShape,
    text: &'a str,
}

/// Read the body following a tag name ending at `start`.
/// Returns the body and the byte offset just past it.
fn read_body<'a>(text: &'a str, tag: &str, start: usize) -> EngineResult<(Option<Body<'a>>, usize)> {
    let rest = &text[start..];
    match rest.chars().next() {
        Some('(') => {
            let inner = read_enclosed(tag, rest)?;
            let end = start + inner.len() + 2;
            Ok((
                Some(Body {
                    shape: BodyShape::Args,
                    text: inner,
                }),
                end,
            ))
        }
        Some('{') => {
            let inner = read_enclosed(tag, rest)?;
            let end = start + inner.len() + 2;
            Ok((
                Some(Body {
                    shape: BodyShape::Block,
                    text: inner,
                }),
                end,
            ))
        }
        Some(':') => {
            let value_start = start + 1;
            let value_len = text[value_start..]
                .find(char::is_whitespace)
                .unwrap_or(text.len() - value_start);
            if value_len == 0 {
                return Err(EngineError::directive(tag, "missing value after ':'"));
            }
            let mut end = value_start + value_len;
            // `@trait:Foo\Bar as Alias`
            let tail = &text[end..];
            let trimmed = tail.trim_start_matches([' ', '\t']);
            if let Some(after_as) = trimmed.strip_prefix("as ") {
                let alias_ws = after_as.len() - after_as.trim_start_matches([' ', '\t']).len();
                let alias = &after_as[alias_ws..];
                let alias_len = alias.find(char::is_whitespace).unwrap_or(alias.len());
                if alias_len > 0 {
                    end += (tail.len() - trimmed.len()) + 3 + alias_ws + alias_len;
                }
            }
            Ok((
                Some(Body {
                    shape: BodyShape::Value,
                    text: &text[value_start..end],
                }),
                end,
            ))
        }
        _ => Ok((None, start)),
    }
}

/// Read a balanced, quote-aware bracketed body; `src` starts at the opener.
/// Returns the text between the outer brackets.
fn read_enclosed<'a>(tag: &str, src: &'a str) -> EngineResult<&'a str> {
    let mut stack: Vec<char> = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, ch) in src.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' => stack.push(')'),
            '[' => stack.push(']'),
            '{' => stack.push('}'),
            ')' | ']' | '}' => {
                if stack.pop() != Some(ch) {
                    return Err(EngineError::directive(
                        tag,
                        format!("unexpected '{}' in body", ch),
                    ));
                }
                if stack.is_empty() {
                    return Ok(&src[1..idx]);
                }
            }
            _ => {}
        }
    }
    Err(EngineError::directive(tag, "unbalanced brackets"))
}

/// Split on commas outside brackets and quotes
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (idx, ch) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Split `key: value` at the first lone colon (`::` is part of a value)
fn split_key_value(part: &str) -> Option<(&str, &str)> {
    let bytes = part.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'[' | b'{' | b'\'' | b'"' => return None,
            b':' => {
                if bytes.get(i + 1) == Some(&b':') {
                    return None;
                }
                return Some((&part[..i], &part[i + 1..]));
            }
            _ => i += 1,
        }
    }
    None
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    for q in ['\'', '"'] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

fn require_body<'a>(tag: &str, body: Option<Body<'a>>) -> EngineResult<Body<'a>> {
    match body {
        Some(b) if !b.text.trim().is_empty() => Ok(b),
        _ => Err(EngineError::directive(tag, "missing value")),
    }
}

// ============================================================================
// Body interpretation
// ============================================================================

fn extend_list(slot: &mut Option<Vec<String>>, body: Option<Body<'_>>) {
    let names = slot.get_or_insert_with(Vec::new);
    if let Some(body) = body {
        names.extend(
            split_top_level(body.text)
                .into_iter()
                .map(|p| unquote(p).to_string())
                .filter(|p| !p.is_empty()),
        );
    }
}

fn parse_structured(tag: &str, body: Option<Body<'_>>) -> EngineResult<Structured> {
    let body = require_body(tag, body)?;
    let mut structured = Structured::default();

    if body.shape == BodyShape::Value {
        structured.value = Some(unquote(body.text).to_string());
        return Ok(structured);
    }

    for part in split_top_level(body.text) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match split_key_value(part) {
            Some((key, value)) => {
                let key = unquote(key);
                if key.is_empty() {
                    return Err(EngineError::directive(tag, "empty key in structured body"));
                }
                structured
                    .entries
                    .push((key.to_string(), unquote(value).to_string()));
            }
            None => structured.value = Some(unquote(part).to_string()),
        }
    }
    Ok(structured)
}

fn parse_scope(tag: &str, body: Option<Body<'_>>) -> EngineResult<Scope> {
    let body = match body {
        Some(b) if !b.text.trim().is_empty() => b,
        _ => return Ok(Scope::all()),
    };
    let mut scope = Scope {
        migrations: false,
        models: false,
    };
    for part in split_top_level(body.text) {
        match unquote(part) {
            "migrations" | "migration" => scope.migrations = true,
            "models" | "model" => scope.models = true,
            "" => {}
            other => {
                return Err(EngineError::directive(
                    tag,
                    format!("unknown scope '{}'", other),
                ));
            }
        }
    }
    Ok(scope)
}

fn parse_morph(text: &str) -> EngineResult<MorphDirective> {
    let mut name = None;
    let mut cardinality = None;
    let mut model = None;
    let mut morph = MorphDirective {
        name: String::new(),
        cardinality: MorphCardinality::Many,
        model: String::new(),
        table: None,
        alias: None,
        chain: None,
        id: None,
        type_column: None,
    };

    for part in split_top_level(text) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (key, value) = split_key_value(part).ok_or_else(|| {
            EngineError::directive("morph", format!("expected 'key: value', found '{}'", part))
        })?;
        let key = key.trim();
        let value = unquote(value).to_string();
        match key {
            "name" => name = Some(value),
            "type" => {
                cardinality = Some(MorphCardinality::parse(&value).ok_or_else(|| {
                    EngineError::directive("morph", format!("unknown type '{}'", value))
                })?)
            }
            "model" => model = Some(value),
            "table" => morph.table = Some(value),
            "as" => morph.alias = Some(value),
            "chain" => morph.chain = Some(value),
            "id" => morph.id = Some(value),
            "type_column" | "typeColumn" => morph.type_column = Some(value),
            "" => return Err(EngineError::directive("morph", "empty key in structured body")),
            other => {
                return Err(EngineError::directive(
                    "morph",
                    format!("unknown key '{}'", other),
                ));
            }
        }
    }

    morph.name = name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| EngineError::directive("morph", "missing 'name'"))?;
    morph.cardinality =
        cardinality.ok_or_else(|| EngineError::directive("morph", "missing 'type'"))?;
    morph.model = model
        .filter(|m| !m.is_empty())
        .ok_or_else(|| EngineError::directive("morph", "missing 'model'"))?;
    Ok(morph)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text_has_no_directives() {
        let set = DirectiveSet::parse("The user's display name").unwrap();
        assert!(set.is_empty());
        assert_eq!(set.comment.as_deref(), Some("The user's display name"));
    }

    #[test]
    fn test_email_is_not_a_directive() {
        let set = DirectiveSet::parse("Contact admin@example.com").unwrap();
        assert!(set.other.is_empty());
        assert_eq!(set.comment.as_deref(), Some("Contact admin@example.com"));
    }

    #[test]
    fn test_list_directives() {
        let set = DirectiveSet::parse("@fillable(name, 'email')\n@hidden{password}\n@with:posts")
            .unwrap();
        assert_eq!(set.fillable, Some(vec!["name".to_string(), "email".to_string()]));
        assert_eq!(set.hidden, Some(vec!["password".to_string()]));
        assert_eq!(set.with, Some(vec!["posts".to_string()]));
        assert!(set.comment.is_none());
    }

    #[test]
    fn test_bare_flags() {
        let set = DirectiveSet::parse("Secret token @hidden @guarded").unwrap();
        assert!(set.lists_hidden("anything"));
        assert!(set.lists_guarded("anything"));
        assert!(!set.lists_fillable("anything"));
        assert_eq!(set.comment.as_deref(), Some("Secret token"));
    }

    #[test]
    fn test_cast_forms() {
        let set = DirectiveSet::parse("@cast{settings: array, price: 'decimal:2'}").unwrap();
        let cast = set.cast.unwrap();
        assert_eq!(cast.get("settings"), Some("array"));
        assert_eq!(cast.get("price"), Some("decimal:2"));

        let set = DirectiveSet::parse("@cast:AsArrayObject::class").unwrap();
        assert_eq!(set.cast.unwrap().value.as_deref(), Some("AsArrayObject::class"));

        let set = DirectiveSet::parse("@cast(AsCollection::class)").unwrap();
        assert_eq!(set.cast.unwrap().value.as_deref(), Some("AsCollection::class"));
    }

    #[test]
    fn test_namespaced_refs() {
        let set = DirectiveSet::parse(
            "@trait:Illuminate\\Notifications\\Notifiable as Notify more text\n\
             @implements(App\\Contracts\\HasAvatar, App\\Contracts\\Sluggable)\n\
             @observer:App\\Observers\\UserObserver",
        )
        .unwrap();
        assert_eq!(set.traits.len(), 1);
        assert_eq!(set.traits[0].path, "Illuminate\\Notifications\\Notifiable");
        assert_eq!(set.traits[0].alias.as_deref(), Some("Notify"));
        assert_eq!(set.traits[0].short_name(), "Notify");
        assert_eq!(set.implements.len(), 2);
        assert_eq!(set.implements[1].short_name(), "Sluggable");
        assert_eq!(set.observer.unwrap().path, "App\\Observers\\UserObserver");
        assert_eq!(set.comment.as_deref(), Some("more text"));
    }

    #[test]
    fn test_pivot_directives() {
        let set = DirectiveSet::parse("@pivot @pivotAlias(membership) @withTimestamps").unwrap();
        assert!(set.pivot);
        assert!(set.with_timestamps);
        assert_eq!(set.pivot_alias.as_deref(), Some("membership"));
    }

    #[test]
    fn test_morph_directive() {
        let set = DirectiveSet::parse(
            "@morph(name: commentable, type: many, model: Comment, chain: ->latest('id'))",
        )
        .unwrap();
        assert_eq!(
            set.morphs,
            vec![MorphDirective {
                name: "commentable".to_string(),
                cardinality: MorphCardinality::Many,
                model: "Comment".to_string(),
                table: None,
                alias: None,
                chain: Some("->latest('id')".to_string()),
                id: None,
                type_column: None,
            }]
        );
    }

    #[test]
    fn test_scopes() {
        let set = DirectiveSet::parse("@silent(migrations) @local").unwrap();
        assert!(set.silent_in_migrations());
        assert!(!set.silent_in_models());
        assert!(set.local_in_migrations());
        assert!(set.local_in_models());
    }

    #[test]
    fn test_unknown_tags_are_kept() {
        let set = DirectiveSet::parse("@deprecated @label(Full name)").unwrap();
        assert_eq!(
            set.other,
            vec![
                ("deprecated".to_string(), None),
                ("label".to_string(), Some("Full name".to_string())),
            ]
        );
    }

    #[test]
    fn test_nested_braces_inside_quotes() {
        let set = DirectiveSet::parse("@cast{meta: 'json{)'} tail").unwrap();
        assert_eq!(set.cast.unwrap().get("meta"), Some("json{)"));
        assert_eq!(set.comment.as_deref(), Some("tail"));
    }

    #[test]
    fn test_malformed_directives() {
        for text in [
            "@fillable(name, email",
            "@cast{: array}",
            "@cast",
            "@trait:",
            "@morph(name: x, model: Y)",
            "@morph(name: x, type: sideways, model: Y)",
            "@silent(everywhere)",
            "@hidden(a])",
        ] {
            let err = DirectiveSet::parse(text).unwrap_err();
            assert!(
                matches!(err, EngineError::Directive { .. }),
                "expected directive error for {:?}, got {:?}",
                text,
                err
            );
        }
    }
}
