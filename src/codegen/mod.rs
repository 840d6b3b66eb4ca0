//! Code Generation
//!
//! Derives a language-agnostic declaration model from a resolved corpus and
//! hands it to a host-language emitter.
//!
//! Architecture:
//! - Generation: one pass per root document ([`generate`]); roots are
//!   independent and run in parallel ([`generate_all`])
//! - Declarations: named types with members and serialization metadata;
//!   built once, never mutated afterward
//! - Emitters: render declarations to source text using a [`RenderProfile`]
//!
//! Emitters never read schemas; everything they need is on the declaration.

pub mod config;
pub mod derive;
pub mod names;
pub mod rust;

pub use config::RenderProfile;
pub use names::{to_identifier, to_snake_case, Namer};

use std::collections::HashMap;

use rayon::prelude::*;

use crate::config::CompilerConfig;
use crate::error::{CompileError, CompileErrors};
use crate::graph::{CorpusIndex, ResolvedReferences, RootId, SchemaKey};
use derive::Generator;

// =============================================================================
// Type references
// =============================================================================

/// Scalar JSON kinds. Integers and numbers share one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Number,
    Boolean,
    Null,
}

/// The type of a member, array element, map value or alias target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// Any JSON value
    Any,
    Scalar(ScalarKind),
    /// Another declaration, by name
    Named(String),
    Array(Box<TypeRef>),
    Tuple(Vec<TypeRef>),
    /// String-keyed map
    Map(Box<TypeRef>),
    /// The value may also be `null`
    Nullable(Box<TypeRef>),
}

impl TypeRef {
    pub fn nullable(self) -> TypeRef {
        match self {
            TypeRef::Nullable(_) | TypeRef::Any | TypeRef::Scalar(ScalarKind::Null) => self,
            other => TypeRef::Nullable(Box::new(other)),
        }
    }

    /// Declarations this type stores inline, i.e. not behind an array or a
    /// map
    pub fn by_value_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(false, &mut names);
        names
    }

    /// Every declaration this type mentions
    pub fn all_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(true, &mut names);
        names
    }

    fn collect_names<'t>(&'t self, through_indirection: bool, names: &mut Vec<&'t str>) {
        match self {
            TypeRef::Named(name) => names.push(name),
            TypeRef::Nullable(inner) => inner.collect_names(through_indirection, names),
            TypeRef::Tuple(items) => {
                for item in items {
                    item.collect_names(through_indirection, names);
                }
            }
            TypeRef::Array(inner) | TypeRef::Map(inner) => {
                if through_indirection {
                    inner.collect_names(through_indirection, names);
                }
            }
            TypeRef::Any | TypeRef::Scalar(_) => {}
        }
    }
}

// =============================================================================
// Declarations
// =============================================================================

/// A declared property of a struct
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Key in the JSON object
    pub json_name: String,
    pub identifier: String,
    /// Required fields are always serialized; optional ones are omitted when
    /// absent
    pub required: bool,
    pub ty: TypeRef,
    pub doc: Option<String>,
}

/// Catch-all member holding every key that is not a declared property
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionField {
    /// Type of the extra values
    pub value: TypeRef,
}

/// One branch of a tagged union
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    /// Constant the discriminant property holds for this branch
    pub discriminant_value: String,
    pub identifier: String,
    pub ty: TypeRef,
}

/// What a declaration is
#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationKind {
    Struct {
        fields: Vec<Field>,
        /// `None` when `additionalProperties` is `false`
        extension: Option<ExtensionField>,
    },
    TaggedUnion {
        /// Name of the discriminant property
        discriminant: String,
        variants: Vec<Variant>,
    },
    /// Sequence type (array or tuple)
    Array(TypeRef),
    /// String-keyed map type
    Map(TypeRef),
    /// Any other type
    Alias(TypeRef),
}

/// A named type in the output
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub doc: Option<String>,
    /// Subschema this declaration was derived from
    pub origin: SchemaKey,
    /// `document#pointer` of the origin, for diagnostics
    pub source: String,
}

impl Declaration {
    /// Every (member identifier, type) pair this declaration stores.
    /// Aliases report a single member with an empty identifier.
    pub fn members(&self) -> Vec<(&str, &TypeRef)> {
        match &self.kind {
            DeclarationKind::Struct { fields, extension } => {
                let mut members: Vec<(&str, &TypeRef)> = fields
                    .iter()
                    .map(|f| (f.identifier.as_str(), &f.ty))
                    .collect();
                if let Some(extension) = extension {
                    members.push(("", &extension.value));
                }
                members
            }
            DeclarationKind::TaggedUnion { variants, .. } => variants
                .iter()
                .map(|v| (v.identifier.as_str(), &v.ty))
                .collect(),
            DeclarationKind::Array(ty) | DeclarationKind::Map(ty) | DeclarationKind::Alias(ty) => {
                vec![("", ty)]
            }
        }
    }
}

// =============================================================================
// Generation driver
// =============================================================================

/// Generate the declarations of one root document.
///
/// Errors in one declaration do not stop the others; everything found is
/// returned together.
pub fn generate(
    root: RootId,
    corpus: &CorpusIndex<'_>,
    resolved: &ResolvedReferences,
    config: &CompilerConfig,
) -> Result<Vec<Declaration>, CompileErrors> {
    let mut generator = Generator::new(corpus, resolved, config);
    generator.generate_root(root);
    generator.finish()
}

/// Generate every root in parallel, merge and sort by name.
///
/// A declaration reached from several roots (through a cross-root
/// reference) is kept once. Two different subschemas that derive the same
/// name are a naming collision.
pub fn generate_all(
    corpus: &CorpusIndex<'_>,
    resolved: &ResolvedReferences,
    config: &CompilerConfig,
) -> Result<Vec<Declaration>, CompileErrors> {
    let per_root: Vec<Result<Vec<Declaration>, CompileErrors>> = corpus
        .documents()
        .par_iter()
        .map(|document| generate(document.root_id(), corpus, resolved, config))
        .collect();

    let mut errors: Vec<CompileError> = Vec::new();
    let mut seen_errors = std::collections::HashSet::new();
    let mut by_name: HashMap<String, Declaration> = HashMap::new();

    for result in per_root {
        match result {
            Ok(declarations) => {
                for declaration in declarations {
                    merge(&mut by_name, declaration, &mut errors);
                }
            }
            Err(failed) => {
                // a cross-root reference reports the same failure from each root
                for error in failed {
                    if seen_errors.insert(error.to_string()) {
                        errors.push(error);
                    }
                }
            }
        }
    }

    if !errors.is_empty() {
        return Err(CompileErrors::new(errors));
    }

    let mut declarations: Vec<Declaration> = by_name.into_values().collect();
    declarations.sort_by(|a, b| a.name.cmp(&b.name));

    tracing::info!(declarations = declarations.len(), "generated declarations");
    Ok(declarations)
}

fn merge(
    by_name: &mut HashMap<String, Declaration>,
    declaration: Declaration,
    errors: &mut Vec<CompileError>,
) {
    match by_name.get(&declaration.name) {
        None => {
            by_name.insert(declaration.name.clone(), declaration);
        }
        Some(existing) if existing.origin == declaration.origin => {}
        Some(existing) => errors.push(CompileError::NamingCollision {
            declaration: "<output>".to_string(),
            identifier: declaration.name.clone(),
            first: existing.source.clone(),
            second: declaration.source,
        }),
    }
}
