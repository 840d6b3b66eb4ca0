//! Name Derivation
//!
//! Turns schema text (property names, titles, definitions keys,
//! discriminant values) into declaration and member identifiers, and
//! assigns every declaration site a name that depends only on where it sits.
//!
//! Naming is language-agnostic: identifiers are PascalCase here, and the
//! emitter applies host-language casing and escaping on top.

use crate::graph::{CorpusIndex, SchemaKey};
use crate::schema::pointer::{Keyword, ReferenceToken};
use crate::schema::Schema;

/// Prefix for names derived from a root document
pub const ROOT_PREFIX: &str = "Schema_";

// =============================================================================
// Identifier derivation
// =============================================================================

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Derive an identifier from arbitrary text.
///
/// The text is split at every character that cannot appear in an
/// identifier; each segment's first letter is upper-cased and the segments
/// are joined. When nothing is left, or the text does not start with a
/// letter, `prefix` is prepended (it should already end in `_`). Leading
/// underscores survive: `"_a"` becomes `"{prefix}_a"`.
pub fn to_identifier(source: &str, prefix: &str) -> String {
    let mut identifier = String::with_capacity(source.len());
    for segment in source.split(|c: char| !is_identifier_char(c)) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            identifier.extend(first.to_uppercase());
            identifier.push_str(chars.as_str());
        }
    }

    let starts_with_letter = source
        .chars()
        .next()
        .map(char::is_alphabetic)
        .unwrap_or(false);

    if identifier.is_empty() || !starts_with_letter {
        format!("{prefix}{identifier}")
    } else {
        identifier
    }
}

/// Convert a PascalCase identifier to snake_case
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let chars: Vec<char> = s.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).map(|n| n.is_lowercase()).unwrap_or(false);
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            if i > 0 && chars[i - 1] != '_' && (prev_lower || (prev_upper && next_lower)) {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Constant discriminant value a union branch declares for `discriminant`:
/// a string `const`, or an `enum` with exactly one string member
pub fn discriminant_value<'s>(branch: &'s Schema, discriminant: &str) -> Option<&'s str> {
    let property = branch.property(discriminant)?;
    if let Some(value) = property.const_value.as_ref().and_then(|v| v.as_str()) {
        return Some(value);
    }
    match property.enum_values.as_deref() {
        Some([only]) => only.as_str(),
        _ => None,
    }
}

// =============================================================================
// Declaration naming
// =============================================================================

/// Assigns declaration names from schema locations
pub struct Namer<'c, 'a> {
    corpus: &'c CorpusIndex<'a>,
    discriminant: &'c str,
}

impl<'c, 'a> Namer<'c, 'a> {
    pub fn new(corpus: &'c CorpusIndex<'a>, discriminant: &'c str) -> Self {
        Self {
            corpus,
            discriminant,
        }
    }

    /// Name of the declaration generated for the subschema at `key`.
    ///
    /// The walk starts at the root's name and refines it with every step of
    /// the pointer: a property or definitions key replaces it, a tuple
    /// position appends `Item{i}`, `additionalProperties` appends `Value`,
    /// and a union branch takes the branch title or its discriminant value.
    /// A single `items` keeps the name of an inline array but appends `Item`
    /// when the array is the root or a definitions entry, since those arrays
    /// are declarations of their own.
    pub fn declaration_name(&self, key: &SchemaKey) -> String {
        let Some(document) = self.corpus.document(key.root) else {
            return ROOT_PREFIX.to_string();
        };
        let root_title = document
            .root()
            .and_then(|entry| entry.schema.title.as_deref());
        let mut name = to_identifier(root_title.unwrap_or(document.name()), ROOT_PREFIX);

        let tokens = &key.pointer;
        let mut i = 0;
        // Root and definitions entries declare even when they are arrays
        let mut at_site = true;
        while i < tokens.len() {
            let next = match tokens.get(i + 1) {
                Some(ReferenceToken::Name(next)) => Some(next.as_str()),
                _ => None,
            };
            match (&tokens[i], next) {
                (ReferenceToken::Keyword(Keyword::Definitions), Some(member)) => {
                    name = to_identifier(member, &format!("{name}_"));
                    i += 2;
                    at_site = true;
                    continue;
                }
                (ReferenceToken::Keyword(Keyword::Properties), Some(member)) => {
                    name = to_identifier(member, &format!("{name}_"));
                    i += 2;
                }
                (ReferenceToken::Keyword(Keyword::Items), Some(position)) => {
                    name = format!("{name}Item{position}");
                    i += 2;
                }
                (ReferenceToken::Keyword(Keyword::Items), None) if at_site => {
                    name = format!("{name}Item");
                    i += 1;
                }
                (ReferenceToken::Keyword(Keyword::AdditionalProperties), _) => {
                    name = format!("{name}Value");
                    i += 1;
                }
                (
                    ReferenceToken::Keyword(Keyword::OneOf | Keyword::AnyOf | Keyword::AllOf),
                    Some(position),
                ) => {
                    let branch = document.get(&tokens[..i + 2]).map(|entry| entry.schema);
                    name = self.branch_name(&name, branch, position);
                    i += 2;
                }
                _ => i += 1,
            }
            at_site = false;
        }
        name
    }

    fn branch_name(&self, enclosing: &str, branch: Option<&Schema>, position: &str) -> String {
        let prefix = format!("{enclosing}_");
        match branch {
            Some(schema) => {
                if let Some(title) = &schema.title {
                    to_identifier(title, &prefix)
                } else if let Some(value) = discriminant_value(schema, self.discriminant) {
                    to_identifier(value, &prefix)
                } else {
                    format!("{enclosing}Variant{position}")
                }
            }
            None => format!("{enclosing}Variant{position}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{RootId, SchemaDocument};
    use serde_json::json;

    #[test]
    fn test_to_identifier() {
        let cases = [
            ("a", "A"),
            ("aBC", "ABC"),
            ("aaBbCc", "AaBbCc"),
            ("_A", "Prefix__A"),
            ("_a", "Prefix__a"),
            ("1", "Prefix_1"),
            (" a", "Prefix_A"),
            ("-a", "Prefix_A"),
            ("aa.bb", "AaBb"),
            ("-", "Prefix_"),
            ("--", "Prefix_"),
            ("", "Prefix_"),
            ("search.savedQueries", "SearchSavedQueries"),
            ("http-header", "HttpHeader"),
        ];
        for (input, want) in cases {
            assert_eq!(to_identifier(input, "Prefix_"), want, "input {input:?}");
        }
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("SearchSavedQueries"), "search_saved_queries");
        assert_eq!(to_snake_case("HTTPHeader"), "http_header");
        assert_eq!(to_snake_case("P0"), "p0");
        assert_eq!(to_snake_case("Prefix__a"), "prefix__a");
        assert_eq!(to_snake_case("Type"), "type");
    }

    #[test]
    fn test_discriminant_value() {
        let branch = Schema::from_value(json!({
            "properties": {"type": {"const": "b"}}
        }))
        .unwrap();
        assert_eq!(discriminant_value(&branch, "type"), Some("b"));
        assert_eq!(discriminant_value(&branch, "kind"), None);

        let single_enum = Schema::from_value(json!({
            "properties": {"type": {"enum": ["c"]}}
        }))
        .unwrap();
        assert_eq!(discriminant_value(&single_enum, "type"), Some("c"));

        let wide_enum = Schema::from_value(json!({
            "properties": {"type": {"enum": ["c", "d"]}}
        }))
        .unwrap();
        assert_eq!(discriminant_value(&wide_enum, "type"), None);
    }

    #[test]
    fn test_declaration_names_follow_location() {
        let documents = vec![SchemaDocument::new(
            "site",
            Schema::from_value(json!({
                "title": "Site configuration",
                "properties": {
                    "search.savedQueries": {
                        "type": "array",
                        "items": {"type": "object", "properties": {"key": {}}}
                    },
                    "point": {"items": [{}, {"type": "object"}]},
                    "labels": {"additionalProperties": {"type": "object"}},
                    "auth": {
                        "oneOf": [
                            {"properties": {"type": {"const": "http-header"}}},
                            {"title": "Builtin", "properties": {"type": {"const": "builtin"}}},
                            {"type": "object"}
                        ]
                    }
                },
                "definitions": {"1st": {}}
            }))
            .unwrap(),
        )];
        let corpus = CorpusIndex::build(&documents, None).unwrap();
        let namer = Namer::new(&corpus, "type");
        let name_at = |pointer: &str| {
            let (key, _) = corpus
                .iter()
                .find(|(key, _)| crate::schema::pointer::encode_pointer(&key.pointer) == pointer)
                .unwrap();
            namer.declaration_name(&key)
        };

        assert_eq!(name_at(""), "SiteConfiguration");
        assert_eq!(name_at("/properties/search.savedQueries/items"), "SearchSavedQueries");
        assert_eq!(name_at("/properties/point/items/1"), "PointItem1");
        assert_eq!(name_at("/properties/labels/additionalProperties"), "LabelsValue");
        assert_eq!(name_at("/properties/auth/oneOf/0"), "HttpHeader");
        assert_eq!(name_at("/properties/auth/oneOf/1"), "Builtin");
        assert_eq!(name_at("/properties/auth/oneOf/2"), "AuthVariant2");
        assert_eq!(name_at("/definitions/1st"), "SiteConfiguration_1st");

        let untitled = SchemaKey::root(RootId(0));
        assert_eq!(namer.declaration_name(&untitled), "SiteConfiguration");
    }

    #[test]
    fn test_array_declarations_name_their_elements() {
        let documents = vec![SchemaDocument::new(
            "people",
            Schema::from_value(json!({
                "title": "People",
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {"labels": {"type": "array", "items": {"type": "object"}}}
                },
                "definitions": {
                    "Tags": {"type": "array", "items": {"type": "array", "items": {"type": "object"}}}
                }
            }))
            .unwrap(),
        )];
        let corpus = CorpusIndex::build(&documents, None).unwrap();
        let namer = Namer::new(&corpus, "type");
        let name_at = |pointer: &str| {
            let (key, _) = corpus
                .iter()
                .find(|(key, _)| crate::schema::pointer::encode_pointer(&key.pointer) == pointer)
                .unwrap();
            namer.declaration_name(&key)
        };

        assert_eq!(name_at(""), "People");
        assert_eq!(name_at("/items"), "PeopleItem");
        assert_eq!(name_at("/items/properties/labels/items"), "Labels");
        assert_eq!(name_at("/definitions/Tags"), "Tags");
        assert_eq!(name_at("/definitions/Tags/items"), "TagsItem");
        assert_eq!(name_at("/definitions/Tags/items/items"), "TagsItem");
    }
}
