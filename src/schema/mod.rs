//! Schema Model
//!
//! In-memory form of a JSON Schema (draft-07 subset). Every keyword the
//! compiler reads is a typed field; anything else is kept verbatim in
//! [`Schema::extra`] so a parse/serialize cycle loses nothing.
//!
//! Boolean schemas (`true` / `false`) are supported: they parse into a
//! [`Schema`] with only [`Schema::boolean`] set.

pub mod identity;
pub mod pointer;

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use pointer::{Keyword, ReferenceToken};

// =============================================================================
// Type Constraint
// =============================================================================

/// Primitive JSON Schema types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

/// The `type` keyword: one primitive type or a list of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeConstraint {
    Single(PrimitiveType),
    List(Vec<PrimitiveType>),
}

impl TypeConstraint {
    pub fn kinds(&self) -> &[PrimitiveType] {
        match self {
            TypeConstraint::Single(kind) => std::slice::from_ref(kind),
            TypeConstraint::List(kinds) => kinds,
        }
    }

    pub fn contains(&self, kind: PrimitiveType) -> bool {
        self.kinds().contains(&kind)
    }
}

// =============================================================================
// Structural keywords
// =============================================================================

/// The `additionalProperties` keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `true` leaves extra properties unconstrained, `false` forbids them
    Allowed(bool),
    Schema(Box<Schema>),
}

/// The `items` keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Items {
    /// Every element matches one schema
    Single(Box<Schema>),
    /// Positional (tuple) schemas
    Tuple(Vec<Schema>),
}

// =============================================================================
// Schema
// =============================================================================

/// A JSON Schema node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SchemaRepr", into = "SchemaRepr")]
pub struct Schema {
    /// Set for boolean schemas; all other fields are then empty
    pub boolean: Option<bool>,
    pub schema: Option<String>,
    pub id: Option<String>,
    pub reference: Option<String>,
    pub comment: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub type_constraint: Option<TypeConstraint>,
    pub properties: Option<IndexMap<String, Schema>>,
    pub required: Option<Vec<String>>,
    pub additional_properties: Option<AdditionalProperties>,
    pub items: Option<Items>,
    pub definitions: Option<IndexMap<String, Schema>>,
    pub one_of: Option<Vec<Schema>>,
    pub any_of: Option<Vec<Schema>>,
    pub all_of: Option<Vec<Schema>>,
    pub not: Option<Box<Schema>>,
    pub enum_values: Option<Vec<Value>>,
    pub const_value: Option<Value>,
    pub format: Option<String>,
    pub default: Option<Value>,
    /// Keywords the compiler does not interpret
    pub extra: IndexMap<String, Value>,
}

impl Schema {
    /// Parse a schema from a JSON value
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Whether the `type` keyword admits `kind`
    pub fn has_type(&self, kind: PrimitiveType) -> bool {
        self.type_constraint
            .as_ref()
            .map(|t| t.contains(kind))
            .unwrap_or(false)
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required
            .as_ref()
            .map(|required| required.iter().any(|r| r == property))
            .unwrap_or(false)
    }

    pub fn property(&self, name: &str) -> Option<&Schema> {
        self.properties.as_ref().and_then(|p| p.get(name))
    }

    pub fn has_properties(&self) -> bool {
        self.properties.as_ref().map(|p| !p.is_empty()).unwrap_or(false)
    }

    /// Direct subschemas with the reference tokens that lead to each one.
    ///
    /// Order is fixed: properties, additionalProperties, items, definitions,
    /// allOf, anyOf, oneOf, not.
    pub fn subschemas(&self) -> Vec<(Vec<ReferenceToken>, &Schema)> {
        let mut children = Vec::new();

        if let Some(properties) = &self.properties {
            for (name, schema) in properties {
                children.push((
                    vec![Keyword::Properties.into(), ReferenceToken::name(name.as_str())],
                    schema,
                ));
            }
        }

        if let Some(AdditionalProperties::Schema(schema)) = &self.additional_properties {
            children.push((vec![Keyword::AdditionalProperties.into()], schema.as_ref()));
        }

        match &self.items {
            Some(Items::Single(schema)) => {
                children.push((vec![Keyword::Items.into()], schema.as_ref()));
            }
            Some(Items::Tuple(schemas)) => {
                for (i, schema) in schemas.iter().enumerate() {
                    children.push((vec![Keyword::Items.into(), ReferenceToken::index(i)], schema));
                }
            }
            None => {}
        }

        if let Some(definitions) = &self.definitions {
            for (name, schema) in definitions {
                children.push((
                    vec![Keyword::Definitions.into(), ReferenceToken::name(name.as_str())],
                    schema,
                ));
            }
        }

        for (keyword, list) in [
            (Keyword::AllOf, &self.all_of),
            (Keyword::AnyOf, &self.any_of),
            (Keyword::OneOf, &self.one_of),
        ] {
            if let Some(schemas) = list {
                for (i, schema) in schemas.iter().enumerate() {
                    children.push((vec![keyword.into(), ReferenceToken::index(i)], schema));
                }
            }
        }

        if let Some(schema) = &self.not {
            children.push((vec![Keyword::Not.into()], schema.as_ref()));
        }

        children
    }
}

impl FromStr for Schema {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// Serialized form
// =============================================================================

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SchemaRepr {
    Boolean(bool),
    Object(Box<SchemaObject>),
}

#[derive(Default, Serialize, Deserialize)]
struct SchemaObject {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    schema: Option<String>,
    #[serde(rename = "$id", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
    #[serde(rename = "$comment", default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    type_constraint: Option<TypeConstraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<IndexMap<String, Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    required: Option<Vec<String>>,
    #[serde(rename = "additionalProperties", default, skip_serializing_if = "Option::is_none")]
    additional_properties: Option<AdditionalProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    items: Option<Items>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    definitions: Option<IndexMap<String, Schema>>,
    #[serde(rename = "oneOf", default, skip_serializing_if = "Option::is_none")]
    one_of: Option<Vec<Schema>>,
    #[serde(rename = "anyOf", default, skip_serializing_if = "Option::is_none")]
    any_of: Option<Vec<Schema>>,
    #[serde(rename = "allOf", default, skip_serializing_if = "Option::is_none")]
    all_of: Option<Vec<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    not: Option<Box<Schema>>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    enum_values: Option<Vec<Value>>,
    #[serde(
        rename = "const",
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    const_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    default: Option<Value>,
    #[serde(flatten)]
    extra: IndexMap<String, Value>,
}

/// `"const": null` is a real constraint, so a present key always maps to
/// `Some` even when its value is null.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl From<SchemaRepr> for Schema {
    fn from(repr: SchemaRepr) -> Self {
        match repr {
            SchemaRepr::Boolean(value) => Schema {
                boolean: Some(value),
                ..Schema::default()
            },
            SchemaRepr::Object(object) => {
                let o = *object;
                Schema {
                    boolean: None,
                    schema: o.schema,
                    id: o.id,
                    reference: o.reference,
                    comment: o.comment,
                    title: o.title,
                    description: o.description,
                    type_constraint: o.type_constraint,
                    properties: o.properties,
                    required: o.required,
                    additional_properties: o.additional_properties,
                    items: o.items,
                    definitions: o.definitions,
                    one_of: o.one_of,
                    any_of: o.any_of,
                    all_of: o.all_of,
                    not: o.not,
                    enum_values: o.enum_values,
                    const_value: o.const_value,
                    format: o.format,
                    default: o.default,
                    extra: o.extra,
                }
            }
        }
    }
}

impl From<Schema> for SchemaRepr {
    fn from(s: Schema) -> Self {
        if let Some(value) = s.boolean {
            return SchemaRepr::Boolean(value);
        }
        SchemaRepr::Object(Box::new(SchemaObject {
            schema: s.schema,
            id: s.id,
            reference: s.reference,
            comment: s.comment,
            title: s.title,
            description: s.description,
            type_constraint: s.type_constraint,
            properties: s.properties,
            required: s.required,
            additional_properties: s.additional_properties,
            items: s.items,
            definitions: s.definitions,
            one_of: s.one_of,
            any_of: s.any_of,
            all_of: s.all_of,
            not: s.not,
            enum_values: s.enum_values,
            const_value: s.const_value,
            format: s.format,
            default: s.default,
            extra: s.extra,
        }))
    }
}
