//! Location Indexer
//!
//! Walks one root document and records, for every subschema reachable
//! through the structural keywords, its pointer from the root and (when an
//! `$id` is in scope) its absolute identity.

use indexmap::IndexMap;
use url::Url;

use super::{DocumentIndex, IndexedSchema, Location, RootId, SchemaDocument};
use crate::error::{CompileError, Result};
use crate::schema::identity::{resolve_uri, Identity};
use crate::schema::pointer::{encode_pointer, ReferenceToken};
use crate::schema::Schema;

/// Index every subschema of `document`.
///
/// `base` is the URI unanchored roots live at; a root `$id` is resolved
/// against it, nested `$id`s against the identity of their enclosing scope.
pub fn index_document<'a>(
    root: RootId,
    document: &'a SchemaDocument,
    base: &Url,
) -> Result<DocumentIndex<'a>> {
    let mut walker = Walker {
        document: &document.name,
        base,
        entries: IndexMap::new(),
    };
    walker.visit(&document.schema, Vec::new(), None)?;

    tracing::trace!(
        document = %document.name,
        subschemas = walker.entries.len(),
        "indexed document"
    );

    Ok(DocumentIndex {
        root,
        name: &document.name,
        entries: walker.entries,
    })
}

struct Walker<'a, 'b> {
    document: &'b str,
    base: &'b Url,
    entries: IndexMap<Vec<ReferenceToken>, IndexedSchema<'a>>,
}

impl<'a, 'b> Walker<'a, 'b> {
    /// `inherited` is the parent's identity extended by the step to this node
    fn visit(
        &mut self,
        schema: &'a Schema,
        rel: Vec<ReferenceToken>,
        inherited: Option<Identity>,
    ) -> Result<()> {
        let id = match &schema.id {
            Some(anchor) => {
                let scope = inherited
                    .as_ref()
                    .map(Identity::to_url)
                    .unwrap_or_else(|| self.base.clone());
                let url = resolve_uri(&scope, anchor).map_err(|e| {
                    CompileError::MalformedIdentity {
                        document: self.document.to_string(),
                        pointer: encode_pointer(&rel),
                        value: anchor.clone(),
                        reason: e.to_string(),
                    }
                })?;
                Some(Identity::new(url))
            }
            None => inherited,
        };

        self.entries.insert(
            rel.clone(),
            IndexedSchema {
                schema,
                location: Location {
                    rel: rel.clone(),
                    id: id.clone(),
                },
            },
        );

        for (step, child) in schema.subschemas() {
            let mut child_rel = rel.clone();
            child_rel.extend_from_slice(&step);
            let child_id = id.as_ref().map(|id| id.descend(&step));
            self.visit(child, child_rel, child_id)?;
        }
        Ok(())
    }
}
