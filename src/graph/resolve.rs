//! Reference Resolver
//!
//! Maps every `$ref` in the corpus to the subschema it designates.
//!
//! A reference is resolved against the identity of the schema that holds it
//! (or the corpus base when no `$id` is in scope). The resulting URI is then
//! matched in two ways:
//!
//! 1. against the composed identity of every subschema in the corpus;
//! 2. failing that, its fragment is read as a JSON pointer into the root
//!    documents that live at the URI's document part.
//!
//! An unanchored root is only searched from inside itself, so two roots
//! without `$id` never see each other's `#/definitions`.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use url::Url;

use super::{CorpusIndex, RootId, SchemaKey};
use crate::error::{CompileError, Result};
use crate::schema::identity::{canonical, document_of, resolve_uri, Identity};
use crate::schema::pointer::{decode_pointer, encode_pointer};

/// The target of every reference in the corpus, keyed by the referring
/// subschema
#[derive(Debug, Default, Clone)]
pub struct ResolvedReferences {
    targets: HashMap<SchemaKey, SchemaKey>,
}

impl ResolvedReferences {
    pub fn target(&self, referrer: &SchemaKey) -> Option<&SchemaKey> {
        self.targets.get(referrer)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SchemaKey, &SchemaKey)> {
        self.targets.iter()
    }
}

/// Resolve every `$ref` in the corpus. Fails on the first reference (in
/// document order) that cannot be resolved.
pub fn resolve_references(corpus: &CorpusIndex<'_>) -> Result<ResolvedReferences> {
    let resolver = Resolver::new(corpus);

    let per_document: Vec<Result<Vec<(SchemaKey, SchemaKey)>>> = corpus
        .documents()
        .par_iter()
        .map(|document| {
            document
                .iter()
                .filter_map(|(key, entry)| {
                    entry.schema.reference.as_ref().map(|reference| {
                        resolver
                            .resolve(Some(&key), reference)
                            .map(|target| (key, target))
                    })
                })
                .collect()
        })
        .collect();

    let mut targets = HashMap::new();
    for resolved in per_document {
        targets.extend(resolved?);
    }

    tracing::debug!(references = targets.len(), "resolved references");
    Ok(ResolvedReferences { targets })
}

/// Lookup tables for resolving references against one corpus
pub struct Resolver<'c, 'a> {
    corpus: &'c CorpusIndex<'a>,
    /// Canonical identity URL → subschemas carrying it
    identities: HashMap<Url, Vec<SchemaKey>>,
    /// Document URL → anchored roots living there
    anchored_roots: HashMap<Url, Vec<RootId>>,
    /// (root, unescaped pointer segments) → subschema
    pointers: HashMap<(RootId, Vec<String>), SchemaKey>,
    /// Documents that exist in this corpus
    known_documents: HashSet<Url>,
}

impl<'c, 'a> Resolver<'c, 'a> {
    pub fn new(corpus: &'c CorpusIndex<'a>) -> Self {
        let mut identities: HashMap<Url, Vec<SchemaKey>> = HashMap::new();
        let mut anchored_roots: HashMap<Url, Vec<RootId>> = HashMap::new();
        let mut pointers = HashMap::new();
        let mut known_documents = HashSet::new();
        known_documents.insert(document_of(corpus.base()));

        for (key, entry) in corpus.iter() {
            if let Some(id) = &entry.location.id {
                identities.entry(id.to_url()).or_default().push(key.clone());
                known_documents.insert(id.document());
            }
            let segments = key.pointer.iter().map(|t| t.as_str().to_string()).collect();
            pointers.insert((key.root, segments), key);
        }

        for document in corpus.documents() {
            if let Some(id) = document.root_identity() {
                anchored_roots
                    .entry(id.document())
                    .or_default()
                    .push(document.root_id());
            }
        }

        Self {
            corpus,
            identities,
            anchored_roots,
            pointers,
            known_documents,
        }
    }

    /// Resolve one reference as seen from `referrer`. Without a referrer the
    /// reference is read against the corpus base, and every unanchored root
    /// is a candidate.
    pub fn resolve(&self, referrer: Option<&SchemaKey>, reference: &str) -> Result<SchemaKey> {
        let (document, pointer) = match referrer {
            Some(key) => (
                self.corpus.document_name(key).to_string(),
                encode_pointer(&key.pointer),
            ),
            None => ("<corpus>".to_string(), String::new()),
        };

        let scope = referrer
            .and_then(|key| self.corpus.get(key))
            .and_then(|entry| entry.location.id.as_ref())
            .map(Identity::to_url)
            .unwrap_or_else(|| self.corpus.base().clone());

        let target = resolve_uri(&scope, reference)
            .map(canonical)
            .map_err(|e| CompileError::UnresolvedReference {
                document: document.clone(),
                pointer: pointer.clone(),
                reference: reference.to_string(),
                reason: format!("malformed reference: {e}"),
            })?;

        let mut matches: Vec<SchemaKey> = self
            .identities
            .get(&target)
            .cloned()
            .unwrap_or_default();

        let target_document = document_of(&target);
        let roots = self.candidate_roots(referrer, &target_document);

        if matches.is_empty() {
            let segments = match target.fragment() {
                Some(fragment) => decode_pointer(fragment),
                None => Some(Vec::new()),
            };
            if let Some(segments) = segments {
                for root in &roots {
                    if let Some(key) = self.pointers.get(&(*root, segments.clone())) {
                        matches.push(key.clone());
                    }
                }
            }
        }

        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 if roots.is_empty() && !self.known_documents.contains(&target_document) => {
                Err(CompileError::ExternalReference {
                    document,
                    pointer,
                    reference: reference.to_string(),
                    target_document: target_document.to_string(),
                })
            }
            0 => Err(CompileError::UnresolvedReference {
                document,
                pointer,
                reference: reference.to_string(),
                reason: format!("no schema at {target}"),
            }),
            _ => Err(CompileError::AmbiguousReference {
                document,
                pointer,
                reference: reference.to_string(),
                candidates: matches
                    .iter()
                    .map(|key| {
                        format!(
                            "{}#{}",
                            self.corpus.document_name(key),
                            encode_pointer(&key.pointer)
                        )
                    })
                    .collect(),
            }),
        }
    }

    /// Roots whose pointers a reference into `target_document` may address
    fn candidate_roots(&self, referrer: Option<&SchemaKey>, target_document: &Url) -> Vec<RootId> {
        let mut roots = self
            .anchored_roots
            .get(target_document)
            .cloned()
            .unwrap_or_default();

        if *target_document == document_of(self.corpus.base()) {
            let unanchored = self
                .corpus
                .documents()
                .iter()
                .filter(|doc| doc.root_identity().is_none())
                .map(|doc| doc.root_id());
            match referrer {
                Some(key) => roots.extend(unanchored.filter(|root| *root == key.root)),
                None => roots.extend(unanchored),
            }
        }
        roots
    }
}
