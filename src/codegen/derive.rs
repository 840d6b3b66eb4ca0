//! Type Derivation
//!
//! Classifies schemas by shape and derives the declaration model from them.
//!
//! Declaration sites are roots, `definitions` entries, and every inline
//! object or tagged-union schema reached in a type position. Every other
//! schema becomes an inline [`TypeRef`] of whatever holds it.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use super::names::{discriminant_value, to_identifier, Namer};
use super::{Declaration, DeclarationKind, ExtensionField, Field, ScalarKind, TypeRef, Variant};
use crate::config::CompilerConfig;
use crate::error::{CompileError, CompileErrors, Result};
use crate::graph::{CorpusIndex, IndexedSchema, ResolvedReferences, RootId, SchemaKey};
use crate::schema::pointer::{encode_pointer, Keyword, ReferenceToken};
use crate::schema::{AdditionalProperties, Items, PrimitiveType, Schema};

// =============================================================================
// Shape
// =============================================================================

/// Structural classification of a single schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `$ref`; siblings are ignored
    Reference,
    /// `oneOf`
    Union,
    /// `allOf`
    Merged,
    /// Object with declared properties (or closed to extra ones)
    Object,
    /// Object with only `additionalProperties`
    Map,
    Array,
    Tuple,
    Scalar(ScalarKind),
    /// Unconstrained or not expressible
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Object,
    Array,
    Scalar(ScalarKind),
}

fn category(kind: PrimitiveType) -> Option<Category> {
    match kind {
        PrimitiveType::Null => None,
        PrimitiveType::Object => Some(Category::Object),
        PrimitiveType::Array => Some(Category::Array),
        PrimitiveType::String => Some(Category::Scalar(ScalarKind::String)),
        PrimitiveType::Integer | PrimitiveType::Number => Some(Category::Scalar(ScalarKind::Number)),
        PrimitiveType::Boolean => Some(Category::Scalar(ScalarKind::Boolean)),
    }
}

/// Scalar kind shared by every literal, if there is one
fn literal_kind<'v>(values: impl Iterator<Item = &'v serde_json::Value>) -> Option<ScalarKind> {
    let mut kind = None;
    for value in values {
        let this = match value {
            serde_json::Value::String(_) => ScalarKind::String,
            serde_json::Value::Number(_) => ScalarKind::Number,
            serde_json::Value::Bool(_) => ScalarKind::Boolean,
            _ => return None,
        };
        match kind {
            None => kind = Some(this),
            Some(k) if k == this => {}
            Some(_) => return None,
        }
    }
    kind
}

/// Classify a schema. The flag is true when `null` is also allowed.
pub fn shape_of(schema: &Schema) -> (Shape, bool) {
    if schema.boolean.is_some() {
        return (Shape::Any, false);
    }
    if schema.reference.is_some() {
        return (Shape::Reference, false);
    }

    let declared = schema
        .type_constraint
        .as_ref()
        .map(|t| t.kinds().to_vec())
        .unwrap_or_default();
    let nullable = declared.contains(&PrimitiveType::Null);

    if schema.one_of.is_some() {
        return (Shape::Union, nullable);
    }
    if schema.all_of.is_some() {
        return (Shape::Merged, nullable);
    }
    if schema.any_of.is_some() {
        return (Shape::Any, false);
    }

    let mut categories: Vec<Category> = Vec::new();
    for kind in declared.iter().filter_map(|k| category(*k)) {
        if !categories.contains(&kind) {
            categories.push(kind);
        }
    }
    if categories.len() > 1 {
        return (Shape::Any, false);
    }

    let category = match categories.first() {
        Some(category) => *category,
        None if schema.properties.is_some() || schema.additional_properties.is_some() => {
            Category::Object
        }
        None if schema.items.is_some() => Category::Array,
        None => {
            let literals = schema
                .enum_values
                .iter()
                .flatten()
                .chain(schema.const_value.iter());
            let has_literals = schema.enum_values.is_some() || schema.const_value.is_some();
            return match literal_kind(literals) {
                Some(kind) if has_literals => (Shape::Scalar(kind), nullable),
                _ if nullable && declared.len() == 1 => (Shape::Scalar(ScalarKind::Null), false),
                _ => (Shape::Any, false),
            };
        }
    };

    let shape = match category {
        Category::Object => {
            let closed = matches!(
                schema.additional_properties,
                Some(AdditionalProperties::Allowed(false))
            );
            if schema.has_properties() || closed {
                Shape::Object
            } else {
                Shape::Map
            }
        }
        Category::Array => match schema.items {
            Some(Items::Tuple(_)) => Shape::Tuple,
            _ => Shape::Array,
        },
        Category::Scalar(kind) => Shape::Scalar(kind),
    };
    (shape, nullable)
}

/// Documentation text for a schema
fn doc_text(schema: &Schema) -> Option<String> {
    schema
        .description
        .as_ref()
        .or(schema.title.as_ref())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

// =============================================================================
// Generator
// =============================================================================

/// Builds declarations for the roots it is asked to generate
pub struct Generator<'c, 'a> {
    corpus: &'c CorpusIndex<'a>,
    resolved: &'c ResolvedReferences,
    namer: Namer<'c, 'a>,
    discriminant: &'c str,
    declarations: IndexMap<SchemaKey, Declaration>,
    /// Declaration sites already processed (or in progress)
    visited: HashSet<SchemaKey>,
    /// Reference targets currently being derived inline
    inlining: HashSet<SchemaKey>,
    errors: Vec<CompileError>,
}

impl<'c, 'a> Generator<'c, 'a> {
    pub fn new(
        corpus: &'c CorpusIndex<'a>,
        resolved: &'c ResolvedReferences,
        config: &'c CompilerConfig,
    ) -> Self {
        Self {
            corpus,
            resolved,
            namer: Namer::new(corpus, &config.discriminant),
            discriminant: &config.discriminant,
            declarations: IndexMap::new(),
            visited: HashSet::new(),
            inlining: HashSet::new(),
            errors: Vec::new(),
        }
    }

    /// Declare the root and every `definitions` entry of one document, and
    /// everything they reach.
    pub fn generate_root(&mut self, root: RootId) {
        let corpus = self.corpus;
        let Some(document) = corpus.document(root) else {
            return;
        };
        let _span = tracing::info_span!("generate", document = document.name()).entered();

        let sites: Vec<SchemaKey> = document
            .iter()
            .map(|(key, _)| key)
            .filter(|key| key.is_root() || key.is_definition())
            .collect();
        for key in sites {
            self.declare(&key);
        }
    }

    /// Everything generated so far, or every error found
    pub fn finish(self) -> std::result::Result<Vec<Declaration>, CompileErrors> {
        let mut errors = self.errors;
        let mut names: HashMap<&str, &Declaration> = HashMap::new();
        for declaration in self.declarations.values() {
            if let Some(first) = names.insert(&declaration.name, declaration) {
                errors.push(CompileError::NamingCollision {
                    declaration: "<output>".to_string(),
                    identifier: declaration.name.clone(),
                    first: first.source.clone(),
                    second: declaration.source.clone(),
                });
            }
        }
        if !errors.is_empty() {
            return Err(CompileErrors::new(errors));
        }
        Ok(self.declarations.into_values().collect())
    }

    // -------------------------------------------------------------------------
    // Lookup helpers
    // -------------------------------------------------------------------------

    fn entry(&self, key: &SchemaKey) -> Result<&'c IndexedSchema<'a>> {
        self.corpus
            .get(key)
            .ok_or_else(|| CompileError::UnresolvedReference {
                document: self.corpus.document_name(key).to_string(),
                pointer: encode_pointer(&key.pointer),
                reference: key.to_string(),
                reason: "no indexed schema at this location".to_string(),
            })
    }

    fn source(&self, key: &SchemaKey) -> String {
        format!(
            "{}#{}",
            self.corpus.document_name(key),
            encode_pointer(&key.pointer)
        )
    }

    fn target(&self, key: &SchemaKey) -> Result<SchemaKey> {
        self.resolved
            .target(key)
            .cloned()
            .ok_or_else(|| CompileError::UnresolvedReference {
                document: self.corpus.document_name(key).to_string(),
                pointer: encode_pointer(&key.pointer),
                reference: self
                    .corpus
                    .get(key)
                    .and_then(|e| e.schema.reference.clone())
                    .unwrap_or_default(),
                reason: "reference was not resolved".to_string(),
            })
    }

    /// Follow `$ref`s from `key` to the first schema that is not a reference
    fn follow(&self, key: &SchemaKey) -> Result<SchemaKey> {
        let mut current = key.clone();
        let mut seen = HashSet::new();
        loop {
            let entry = self.entry(&current)?;
            let Some(reference) = &entry.schema.reference else {
                return Ok(current);
            };
            if !seen.insert(current.clone()) {
                return Err(CompileError::UnresolvedReference {
                    document: self.corpus.document_name(key).to_string(),
                    pointer: encode_pointer(&key.pointer),
                    reference: reference.clone(),
                    reason: "references form a cycle with no schema".to_string(),
                });
            }
            current = self.target(&current)?;
        }
    }

    fn is_declaration_site(&self, key: &SchemaKey, schema: &Schema) -> bool {
        key.is_root()
            || key.is_definition()
            || matches!(
                shape_of(schema).0,
                Shape::Object | Shape::Union | Shape::Merged
            )
    }

    // -------------------------------------------------------------------------
    // Declarations
    // -------------------------------------------------------------------------

    /// Declare the subschema at `key` (once) and return its name
    fn declare(&mut self, key: &SchemaKey) -> String {
        let name = self.namer.declaration_name(key);
        if !self.visited.insert(key.clone()) {
            return name;
        }

        let schema = match self.entry(key) {
            Ok(entry) => entry.schema,
            Err(e) => {
                self.errors.push(e);
                return name;
            }
        };

        match self.declaration_kind(key, schema, &name) {
            Ok(kind) => {
                tracing::debug!(declaration = %name, source = %self.source(key), "declared");
                self.declarations.insert(
                    key.clone(),
                    Declaration {
                        name: name.clone(),
                        kind,
                        doc: doc_text(schema),
                        origin: key.clone(),
                        source: self.source(key),
                    },
                );
            }
            Err(e) => self.errors.push(e),
        }
        name
    }

    fn declaration_kind(
        &mut self,
        key: &SchemaKey,
        schema: &'a Schema,
        name: &str,
    ) -> Result<DeclarationKind> {
        match shape_of(schema).0 {
            Shape::Object => self.structure(key, schema, name),
            Shape::Union => self.union(key, schema, name),
            Shape::Merged => self.merged(key, schema, name),
            Shape::Map => Ok(DeclarationKind::Map(self.type_of(key)?)),
            Shape::Array | Shape::Tuple => Ok(DeclarationKind::Array(self.type_of(key)?)),
            Shape::Reference | Shape::Scalar(_) | Shape::Any => {
                Ok(DeclarationKind::Alias(self.type_of(key)?))
            }
        }
    }

    /// Derive the type of the subschema at `key` as it appears in a type
    /// position
    fn type_of(&mut self, key: &SchemaKey) -> Result<TypeRef> {
        let schema = self.entry(key)?.schema;
        let (shape, nullable) = shape_of(schema);

        let ty = match shape {
            Shape::Reference => self.reference_type(key)?,
            Shape::Object | Shape::Union | Shape::Merged => TypeRef::Named(self.declare(key)),
            Shape::Map => TypeRef::Map(Box::new(self.additional_type(key, schema)?)),
            Shape::Array => {
                let element = match &schema.items {
                    Some(Items::Single(_)) => self.type_of(&key.child(&[Keyword::Items.into()]))?,
                    _ => TypeRef::Any,
                };
                TypeRef::Array(Box::new(element))
            }
            Shape::Tuple => {
                let count = match &schema.items {
                    Some(Items::Tuple(items)) => items.len(),
                    _ => 0,
                };
                let mut items = Vec::with_capacity(count);
                for i in 0..count {
                    items.push(self.type_of(&key.child(&[
                        Keyword::Items.into(),
                        ReferenceToken::index(i),
                    ]))?);
                }
                TypeRef::Tuple(items)
            }
            Shape::Scalar(kind) => TypeRef::Scalar(kind),
            Shape::Any => {
                if schema.any_of.is_some() {
                    tracing::warn!(source = %self.source(key), "anyOf is not supported; using an open value");
                }
                TypeRef::Any
            }
        };

        Ok(if nullable { ty.nullable() } else { ty })
    }

    fn reference_type(&mut self, key: &SchemaKey) -> Result<TypeRef> {
        let target = self.target(key)?;
        let target_schema = self.entry(&target)?.schema;

        if self.is_declaration_site(&target, target_schema) {
            return Ok(TypeRef::Named(self.declare(&target)));
        }

        if !self.inlining.insert(target.clone()) {
            tracing::warn!(
                source = %self.source(key),
                target = %self.source(&target),
                "reference cycle through inline schemas; using an open value"
            );
            return Ok(TypeRef::Any);
        }
        let ty = self.type_of(&target);
        self.inlining.remove(&target);
        ty
    }

    /// Type of the values allowed by `additionalProperties`
    fn additional_type(&mut self, key: &SchemaKey, schema: &Schema) -> Result<TypeRef> {
        match &schema.additional_properties {
            Some(AdditionalProperties::Schema(_)) => {
                self.type_of(&key.child(&[Keyword::AdditionalProperties.into()]))
            }
            _ => Ok(TypeRef::Any),
        }
    }

    fn extension(&mut self, key: &SchemaKey, schema: &Schema) -> Result<Option<ExtensionField>> {
        match &schema.additional_properties {
            Some(AdditionalProperties::Allowed(false)) => Ok(None),
            _ => Ok(Some(ExtensionField {
                value: self.additional_type(key, schema)?,
            })),
        }
    }

    fn structure(&mut self, key: &SchemaKey, schema: &'a Schema, name: &str) -> Result<DeclarationKind> {
        let mut builder = StructBuilder::new(name);
        builder.add_properties(self, key, schema, &|property| schema.is_required(property))?;
        let extension = self.extension(key, schema)?;
        Ok(DeclarationKind::Struct {
            fields: builder.fields,
            extension,
        })
    }

    /// `allOf` of object schemas: one struct with every branch's properties
    fn merged(&mut self, key: &SchemaKey, schema: &'a Schema, name: &str) -> Result<DeclarationKind> {
        let mut parts: Vec<(SchemaKey, &'a Schema)> = Vec::new();
        if schema.properties.is_some() || schema.additional_properties.is_some() {
            parts.push((key.clone(), schema));
        }

        let count = schema.all_of.as_ref().map(Vec::len).unwrap_or(0);
        for i in 0..count {
            let branch = self.follow(&key.child(&[Keyword::AllOf.into(), ReferenceToken::index(i)]))?;
            let branch_schema = self.entry(&branch)?.schema;
            match shape_of(branch_schema).0 {
                Shape::Object | Shape::Map => parts.push((branch, branch_schema)),
                _ => {
                    tracing::warn!(
                        source = %self.source(key),
                        branch = i,
                        "allOf branch is not an object; using an open value"
                    );
                    return Ok(DeclarationKind::Alias(TypeRef::Any));
                }
            }
        }

        let required = |property: &str| parts.iter().any(|(_, part)| part.is_required(property));
        let mut builder = StructBuilder::new(name);
        for (part_key, part_schema) in &parts {
            builder.add_properties(self, part_key, *part_schema, &required)?;
        }

        let closed = parts.iter().any(|(_, part)| {
            matches!(
                part.additional_properties,
                Some(AdditionalProperties::Allowed(false))
            )
        });
        let extension = if closed {
            None
        } else {
            match parts.iter().find(|(_, part)| {
                matches!(part.additional_properties, Some(AdditionalProperties::Schema(_)))
            }) {
                Some((part_key, part_schema)) => Some(ExtensionField {
                    value: self.additional_type(part_key, part_schema)?,
                }),
                None => Some(ExtensionField {
                    value: TypeRef::Any,
                }),
            }
        };

        Ok(DeclarationKind::Struct {
            fields: builder.fields,
            extension,
        })
    }

    /// `oneOf` of object schemas that each pin the discriminant property to
    /// a constant
    fn union(&mut self, key: &SchemaKey, schema: &'a Schema, name: &str) -> Result<DeclarationKind> {
        let count = schema.one_of.as_ref().map(Vec::len).unwrap_or(0);
        if count == 0 {
            return Err(self.unclassifiable(key, name, "oneOf has no branches".to_string()));
        }

        let prefix = format!("{name}_");
        let mut variants = Vec::with_capacity(count);
        let mut values: HashMap<&'a str, usize> = HashMap::new();
        let mut identifiers: HashMap<String, &'a str> = HashMap::new();

        for i in 0..count {
            let branch_key = key.child(&[Keyword::OneOf.into(), ReferenceToken::index(i)]);
            let target = self.follow(&branch_key)?;
            let target_schema = self.entry(&target)?.schema;

            let value = discriminant_value(target_schema, self.discriminant).ok_or_else(|| {
                self.unclassifiable(
                    key,
                    name,
                    format!(
                        "branch {i} has no constant {:?} property",
                        self.discriminant
                    ),
                )
            })?;
            if let Some(j) = values.insert(value, i) {
                return Err(self.unclassifiable(
                    key,
                    name,
                    format!("branches {j} and {i} share discriminant value {value:?}"),
                ));
            }

            let identifier = to_identifier(value, &prefix);
            if let Some(first) = identifiers.insert(identifier.clone(), value) {
                return Err(CompileError::NamingCollision {
                    declaration: name.to_string(),
                    identifier,
                    first: first.to_string(),
                    second: value.to_string(),
                });
            }

            let ty = match self.type_of(&branch_key)? {
                ty @ TypeRef::Named(_) => ty,
                _ => {
                    return Err(self.unclassifiable(
                        key,
                        name,
                        format!("branch {i} is not an object schema"),
                    ))
                }
            };

            variants.push(Variant {
                discriminant_value: value.to_string(),
                identifier,
                ty,
            });
        }

        Ok(DeclarationKind::TaggedUnion {
            discriminant: self.discriminant.to_string(),
            variants,
        })
    }

    fn unclassifiable(&self, key: &SchemaKey, name: &str, reason: String) -> CompileError {
        CompileError::UnclassifiableUnion {
            document: self.corpus.document_name(key).to_string(),
            pointer: encode_pointer(&key.pointer),
            declaration: name.to_string(),
            reason,
        }
    }
}

/// Accumulates struct fields, rejecting two properties that map to one
/// identifier
struct StructBuilder {
    prefix: String,
    declaration: String,
    fields: Vec<Field>,
    /// identifier → JSON key
    taken: HashMap<String, String>,
}

impl StructBuilder {
    fn new(name: &str) -> Self {
        Self {
            prefix: format!("{name}_"),
            declaration: name.to_string(),
            fields: Vec::new(),
            taken: HashMap::new(),
        }
    }

    fn add_properties<'c, 'a>(
        &mut self,
        generator: &mut Generator<'c, 'a>,
        key: &SchemaKey,
        schema: &'a Schema,
        required: &dyn Fn(&str) -> bool,
    ) -> Result<()> {
        let Some(properties) = &schema.properties else {
            return Ok(());
        };
        for (property, property_schema) in properties {
            // a property repeated by another allOf branch keeps its first type
            if self.fields.iter().any(|f| &f.json_name == property) {
                continue;
            }
            let identifier = to_identifier(property, &self.prefix);
            if let Some(first) = self.taken.insert(identifier.clone(), property.clone()) {
                return Err(CompileError::NamingCollision {
                    declaration: self.declaration.clone(),
                    identifier,
                    first,
                    second: property.clone(),
                });
            }
            let ty = generator.type_of(&key.child(&[
                Keyword::Properties.into(),
                ReferenceToken::name(property.as_str()),
            ]))?;
            self.fields.push(Field {
                json_name: property.clone(),
                identifier,
                required: required(property),
                ty,
                doc: doc_text(property_schema),
            });
        }
        Ok(())
    }
}
