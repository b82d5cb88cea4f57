//! Naming helpers
//!
//! Case conversion goes through `heck`. Pluralisation is a small English
//! heuristic with an irregular table; it preserves the case of the input.

use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};

/// Convert to snake_case
pub fn snake(s: &str) -> String {
    s.to_snake_case()
}

/// Convert to lowerCamelCase
pub fn camel(s: &str) -> String {
    s.to_lower_camel_case()
}

/// Convert to PascalCase
pub fn pascal(s: &str) -> String {
    s.to_upper_camel_case()
}

/// Plurals that do not follow the suffix rules
const IRREGULAR: &[(&str, &str)] = &[
    ("child", "children"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("man", "men"),
    ("mouse", "mice"),
    ("ox", "oxen"),
    ("person", "people"),
    ("tooth", "teeth"),
    ("woman", "women"),
];

/// Words with no distinct plural
const UNCOUNTABLE: &[&str] = &[
    "audio", "data", "equipment", "feedback", "information", "media", "metadata", "money", "news",
    "series", "sheep", "species", "staff",
];

/// Split off the last word of a snake_case or camelCase identifier
fn split_last_word(s: &str) -> (&str, &str) {
    let start = s
        .char_indices()
        .rev()
        .find(|(i, c)| *i > 0 && (c.is_ascii_uppercase() && !s[..*i].ends_with(|p: char| p.is_ascii_uppercase())))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let start = s[start..].rfind('_').map(|i| start + i + 1).unwrap_or(start);
    s.split_at(start)
}

/// Apply the case of `like` (lower, Capitalised or UPPER) to `word`
fn match_case(like: &str, word: &str) -> String {
    if like.len() > 1 && like.chars().all(|c| !c.is_ascii_lowercase()) {
        word.to_ascii_uppercase()
    } else if like.starts_with(|c: char| c.is_ascii_uppercase()) {
        let mut out = word[..1].to_ascii_uppercase();
        out.push_str(&word[1..]);
        out
    } else {
        word.to_string()
    }
}

/// Pluralise the last word of `s`, preserving its case
pub fn pluralize(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let (head, word) = split_last_word(s);
    let lower_word = word.to_ascii_lowercase();
    if UNCOUNTABLE.contains(&lower_word.as_str()) {
        return s.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(single, _)| *single == lower_word) {
        return format!("{}{}", head, match_case(word, plural));
    }

    let lower = s.to_ascii_lowercase();
    let upper = s.chars().last().map(|c| c.is_ascii_uppercase()).unwrap_or(false);
    let suffix = |plain: &str| if upper { plain.to_ascii_uppercase() } else { plain.to_string() };

    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        format!("{}{}", s, suffix("es"))
    } else if lower.ends_with('y')
        && !lower.ends_with("ay")
        && !lower.ends_with("ey")
        && !lower.ends_with("oy")
        && !lower.ends_with("uy")
    {
        format!("{}{}", &s[..s.len() - 1], suffix("ies"))
    } else {
        format!("{}{}", s, suffix("s"))
    }
}

/// Strip the first matching identifier suffix (`Id`, `_id`, ...) from a
/// field name. A name equal to the suffix is returned unchanged.
pub fn strip_identifier_suffix<'a>(name: &'a str, suffixes: &[String]) -> &'a str {
    for suffix in suffixes {
        if !suffix.is_empty() && name.len() > suffix.len() && name.ends_with(suffix.as_str()) {
            return &name[..name.len() - suffix.len()];
        }
    }
    name
}

/// Conventional junction table name: both physical table names sorted
/// alphabetically and joined with `_`
pub fn pivot_table_name(a: &str, b: &str) -> String {
    let mut pair = [a, b];
    pair.sort_unstable();
    format!("{}_{}", pair[0], pair[1])
}

/// Conventional pivot-side key column: `<snake model>_<column>`.
/// Model names are already singular and are not inflected.
pub fn pivot_key_column(model: &str, column: &str) -> String {
    format!("{}_{}", snake(model), column)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_conversion() {
        assert_eq!(snake("BlogPost"), "blog_post");
        assert_eq!(camel("BlogPost"), "blogPost");
        assert_eq!(pascal("blog_post"), "BlogPost");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("post"), "posts");
        assert_eq!(pluralize("Category"), "Categories");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("commentable"), "commentables");
        assert_eq!(pluralize("TAG"), "TAGS");
    }

    #[test]
    fn test_pluralize_irregular_and_uncountable() {
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("Child"), "Children");
        assert_eq!(pluralize("salesPerson"), "salesPeople");
        assert_eq!(pluralize("sales_person"), "sales_people");
        assert_eq!(pluralize("news"), "news");
        assert_eq!(pluralize("mediaItem"), "mediaItems");
        assert_eq!(pluralize("human"), "humans");
    }

    #[test]
    fn test_strip_identifier_suffix() {
        let suffixes = vec!["Id".to_string(), "_id".to_string(), "ID".to_string()];
        assert_eq!(strip_identifier_suffix("authorId", &suffixes), "author");
        assert_eq!(strip_identifier_suffix("owner_id", &suffixes), "owner");
        assert_eq!(strip_identifier_suffix("parentID", &suffixes), "parent");
        assert_eq!(strip_identifier_suffix("Id", &suffixes), "Id");
        assert_eq!(strip_identifier_suffix("author", &suffixes), "author");
    }

    #[test]
    fn test_pivot_names() {
        assert_eq!(pivot_table_name("tags", "posts"), "posts_tags");
        assert_eq!(pivot_table_name("posts", "tags"), "posts_tags");
        assert_eq!(pivot_key_column("Post", "id"), "post_id");
        assert_eq!(pivot_key_column("BlogPost", "uuid"), "blog_post_uuid");
        assert_eq!(pivot_key_column("Status", "id"), "status_id");
        assert_eq!(pivot_key_column("Campus", "id"), "campus_id");
        assert_eq!(pivot_key_column("News", "id"), "news_id");
    }
}
