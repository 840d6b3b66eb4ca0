//! Schema Identity
//!
//! An identity is the absolute URI of a subschema, built from the URI of the
//! nearest enclosing `$id` plus the reference tokens walked since then.
//! Relative identities are resolved against a fixed placeholder base so two
//! relative `$id`s compare the same way absolute ones do.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use thiserror::Error;
use url::Url;

use super::pointer::{encode_pointer, ReferenceToken};

/// Base that relative identities are resolved against
pub const PLACEHOLDER_BASE: &str = "file:///";

/// Parsed once; the input is the constant above, so the parse cannot fail.
static PLACEHOLDER: LazyLock<Url> =
    LazyLock::new(|| Url::parse(PLACEHOLDER_BASE).expect("placeholder base is a valid URL"));

/// The placeholder base as a parsed URL
pub fn placeholder_base() -> Url {
    PLACEHOLDER.clone()
}

/// Why a URI string was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UriError {
    #[error("invalid character {character:?} at offset {offset}")]
    InvalidCharacter { character: char, offset: usize },

    #[error("invalid percent-escape at offset {offset}")]
    InvalidEscape { offset: usize },

    #[error("{0}")]
    Parse(#[from] url::ParseError),
}

/// Parse a URI reference and resolve it against `base`.
///
/// The url crate is lenient and silently re-encodes input; identities must
/// be well-formed as written, so whitespace, control characters and broken
/// percent-escapes are rejected up front.
pub fn resolve_uri(base: &Url, reference: &str) -> Result<Url, UriError> {
    let bytes = reference.as_bytes();
    for (offset, character) in reference.char_indices() {
        if character.is_whitespace() || character.is_control() {
            return Err(UriError::InvalidCharacter { character, offset });
        }
        if character == '%' {
            let valid = bytes.len() > offset + 2
                && bytes[offset + 1].is_ascii_hexdigit()
                && bytes[offset + 2].is_ascii_hexdigit();
            if !valid {
                return Err(UriError::InvalidEscape { offset });
            }
        }
    }
    Ok(base.join(reference)?)
}

/// Drop an empty fragment: `node#` and `node` name the same schema
pub fn canonical(mut url: Url) -> Url {
    if url.fragment() == Some("") {
        url.set_fragment(None);
    }
    url
}

/// Strip the fragment from a URL, leaving the document it points into
pub fn document_of(url: &Url) -> Url {
    let mut document = url.clone();
    document.set_fragment(None);
    document
}

/// Absolute identity of a subschema
#[derive(Debug, Clone)]
pub struct Identity {
    base: Url,
    tokens: Vec<ReferenceToken>,
}

impl Identity {
    /// Identity declared directly by an anchor
    pub fn new(base: Url) -> Self {
        Self {
            base: canonical(base),
            tokens: Vec::new(),
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Tokens walked since the anchor
    pub fn tokens(&self) -> &[ReferenceToken] {
        &self.tokens
    }

    /// Identity of a descendant reached by `steps`
    pub fn descend(&self, steps: &[ReferenceToken]) -> Identity {
        let mut tokens = self.tokens.clone();
        tokens.extend_from_slice(steps);
        Identity {
            base: self.base.clone(),
            tokens,
        }
    }

    /// Canonical URL: the anchor URL with the walked tokens appended to its
    /// fragment as a JSON pointer.
    pub fn to_url(&self) -> Url {
        if self.tokens.is_empty() {
            return self.base.clone();
        }
        let mut url = self.base.clone();
        let fragment = format!(
            "{}{}",
            self.base.fragment().unwrap_or(""),
            encode_pointer(&self.tokens)
        );
        url.set_fragment(Some(&fragment));
        url
    }

    /// URL of the document this identity lives in
    pub fn document(&self) -> Url {
        document_of(&self.base)
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.to_url() == other.to_url()
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_url().as_str().hash(state);
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let url = self.to_url();
        let text = url.as_str();
        f.write_str(text.strip_prefix(PLACEHOLDER_BASE).unwrap_or(text))
    }
}
