//! Reference Tokens
//!
//! A position inside a schema document is a sequence of reference tokens.
//! Tokens are either one of the structural keywords the walker descends
//! through, or a plain name (property name, definitions key, array index).
//! Keywords and names are kept apart so a property literally called
//! `"items"` never looks like the `items` keyword.

use std::fmt;

use percent_encoding::percent_decode_str;

/// Schema keywords that introduce subschemas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Keyword {
    Properties,
    Items,
    AdditionalProperties,
    Definitions,
    OneOf,
    AnyOf,
    AllOf,
    Not,
}

impl Keyword {
    /// The keyword as it appears in a schema document
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Properties => "properties",
            Keyword::Items => "items",
            Keyword::AdditionalProperties => "additionalProperties",
            Keyword::Definitions => "definitions",
            Keyword::OneOf => "oneOf",
            Keyword::AnyOf => "anyOf",
            Keyword::AllOf => "allOf",
            Keyword::Not => "not",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a location inside a schema document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReferenceToken {
    Keyword(Keyword),
    Name(String),
}

impl ReferenceToken {
    pub fn name(name: impl Into<String>) -> Self {
        ReferenceToken::Name(name.into())
    }

    pub fn index(index: usize) -> Self {
        ReferenceToken::Name(index.to_string())
    }

    /// The unescaped text of this token
    pub fn as_str(&self) -> &str {
        match self {
            ReferenceToken::Keyword(keyword) => keyword.as_str(),
            ReferenceToken::Name(name) => name,
        }
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, ReferenceToken::Keyword(k) if *k == keyword)
    }
}

impl From<Keyword> for ReferenceToken {
    fn from(keyword: Keyword) -> Self {
        ReferenceToken::Keyword(keyword)
    }
}

impl fmt::Display for ReferenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&escape_token(self.as_str()))
    }
}

/// Escape a token for use in a JSON pointer (`~` → `~0`, `/` → `~1`)
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Reverse of [`escape_token`]
pub fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Encode tokens as a JSON pointer. The empty sequence encodes as `""`.
pub fn encode_pointer(tokens: &[ReferenceToken]) -> String {
    let mut pointer = String::new();
    for token in tokens {
        pointer.push('/');
        pointer.push_str(&escape_token(token.as_str()));
    }
    pointer
}

/// Decode a URI fragment into unescaped pointer segments.
///
/// The fragment is percent-decoded first. Returns `None` when the fragment
/// is not a JSON pointer (a plain-name fragment such as `#foo`).
pub fn decode_pointer(fragment: &str) -> Option<Vec<String>> {
    let decoded = percent_decode_str(fragment).decode_utf8().ok()?;
    if decoded.is_empty() {
        return Some(Vec::new());
    }
    let rest = decoded.strip_prefix('/')?;
    Some(rest.split('/').map(unescape_token).collect())
}

/// Whether a token sequence spells the given pointer segments
pub fn matches_segments(tokens: &[ReferenceToken], segments: &[String]) -> bool {
    tokens.len() == segments.len()
        && tokens
            .iter()
            .zip(segments)
            .all(|(token, segment)| token.as_str() == segment)
}
