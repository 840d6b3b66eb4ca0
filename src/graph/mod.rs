//! Schema Corpus Index
//!
//! The set of root documents being compiled, with every subschema located
//! once and addressable by a [`SchemaKey`]. Later phases (reference
//! resolution, type generation) borrow the index; nothing here is global.
//!
//! A subschema's key is its root plus its pointer relative to that root, so
//! two structurally identical subschemas at different places are distinct.

pub mod analysis;
pub mod locate;
pub mod resolve;

pub use analysis::{analyze_recursion, RecursionAnalysis};
pub use locate::index_document;
pub use resolve::{resolve_references, ResolvedReferences, Resolver};

use std::fmt;

use indexmap::IndexMap;
use rayon::prelude::*;
use url::Url;

use crate::error::{CompileError, Result};
use crate::schema::identity::{placeholder_base, resolve_uri, Identity};
use crate::schema::pointer::{encode_pointer, Keyword, ReferenceToken};
use crate::schema::Schema;

// =============================================================================
// Documents and keys
// =============================================================================

/// One root schema with the name it is compiled under
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    /// Document name; used for the root declaration when the root has no
    /// title
    pub name: String,
    pub schema: Schema,
}

impl SchemaDocument {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// Position of a root document in the corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RootId(pub usize);

/// Stable key of a subschema: its root and its pointer from that root
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaKey {
    pub root: RootId,
    pub pointer: Vec<ReferenceToken>,
}

impl SchemaKey {
    pub fn root(root: RootId) -> Self {
        Self {
            root,
            pointer: Vec::new(),
        }
    }

    /// Key of a descendant reached by `steps`
    pub fn child(&self, steps: &[ReferenceToken]) -> Self {
        let mut pointer = self.pointer.clone();
        pointer.extend_from_slice(steps);
        Self {
            root: self.root,
            pointer,
        }
    }

    pub fn is_root(&self) -> bool {
        self.pointer.is_empty()
    }

    /// Whether this is an entry of a `definitions` block
    pub fn is_definition(&self) -> bool {
        let n = self.pointer.len();
        n >= 2
            && self.pointer[n - 2].is_keyword(Keyword::Definitions)
            && matches!(self.pointer[n - 1], ReferenceToken::Name(_))
    }
}

impl fmt::Display for SchemaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]#{}", self.root.0, encode_pointer(&self.pointer))
    }
}

// =============================================================================
// Locations
// =============================================================================

/// Where a subschema sits: relative to its root, and absolutely when some
/// enclosing schema (or the schema itself) declares an `$id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub rel: Vec<ReferenceToken>,
    pub id: Option<Identity>,
}

/// A located subschema
#[derive(Debug, Clone)]
pub struct IndexedSchema<'a> {
    pub schema: &'a Schema,
    pub location: Location,
}

/// Every subschema of one root document, in depth-first order
#[derive(Debug)]
pub struct DocumentIndex<'a> {
    pub(crate) root: RootId,
    pub(crate) name: &'a str,
    pub(crate) entries: IndexMap<Vec<ReferenceToken>, IndexedSchema<'a>>,
}

impl<'a> DocumentIndex<'a> {
    pub fn root_id(&self) -> RootId {
        self.root
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn get(&self, pointer: &[ReferenceToken]) -> Option<&IndexedSchema<'a>> {
        self.entries.get(pointer)
    }

    /// The root entry. Indexing always records it first.
    pub fn root(&self) -> Option<&IndexedSchema<'a>> {
        self.entries.get(&Vec::new())
    }

    /// Identity of the root schema, if it declares one
    pub fn root_identity(&self) -> Option<&Identity> {
        self.root().and_then(|entry| entry.location.id.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (SchemaKey, &IndexedSchema<'a>)> + '_ {
        self.entries.iter().map(move |(pointer, entry)| {
            (
                SchemaKey {
                    root: self.root,
                    pointer: pointer.clone(),
                },
                entry,
            )
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All root documents of one compilation, indexed
#[derive(Debug)]
pub struct CorpusIndex<'a> {
    base: Url,
    documents: Vec<DocumentIndex<'a>>,
}

impl<'a> CorpusIndex<'a> {
    /// Index every document. Documents are independent, so they are indexed
    /// in parallel; the first failure (in document order) is returned.
    ///
    /// `base_uri` is the URI unanchored roots are treated as living at.
    pub fn build(documents: &'a [SchemaDocument], base_uri: Option<&str>) -> Result<Self> {
        let placeholder = placeholder_base();
        let base = match base_uri {
            Some(raw) => resolve_uri(&placeholder, raw).map_err(|e| {
                CompileError::MalformedIdentity {
                    document: "<corpus>".to_string(),
                    pointer: String::new(),
                    value: raw.to_string(),
                    reason: e.to_string(),
                }
            })?,
            None => placeholder,
        };

        let indexed: Vec<Result<DocumentIndex<'a>>> = documents
            .par_iter()
            .enumerate()
            .map(|(i, document)| index_document(RootId(i), document, &base))
            .collect();
        let documents = indexed.into_iter().collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            documents = documents.len(),
            subschemas = documents.iter().map(DocumentIndex::len).sum::<usize>(),
            base = %base,
            "indexed schema corpus"
        );

        Ok(Self { base, documents })
    }

    /// URI unanchored roots live at
    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn documents(&self) -> &[DocumentIndex<'a>] {
        &self.documents
    }

    pub fn document(&self, root: RootId) -> Option<&DocumentIndex<'a>> {
        self.documents.get(root.0)
    }

    pub fn get(&self, key: &SchemaKey) -> Option<&IndexedSchema<'a>> {
        self.document(key.root).and_then(|doc| doc.get(&key.pointer))
    }

    /// Name of the document a key belongs to, for diagnostics
    pub fn document_name(&self, key: &SchemaKey) -> &str {
        self.document(key.root).map(|doc| doc.name()).unwrap_or("<unknown>")
    }

    /// Every subschema of every document
    pub fn iter(&self) -> impl Iterator<Item = (SchemaKey, &IndexedSchema<'a>)> + '_ {
        self.documents.iter().flat_map(|doc| doc.iter())
    }
}
