//! Rust Code Emitter
//!
//! Renders declarations as Rust source using a [`RenderProfile`].
//!
//! Key constraints:
//! - Only declarations, the recursion analysis and the profile are read;
//!   never schemas
//! - Type names come from the declaration (already derived); the emitter
//!   only adds Rust casing and escaping
//! - Structs and aliases lean on serde derives; tagged unions get
//!   hand-written impls because exactly one branch must be present

use std::collections::HashSet;

use super::{Declaration, DeclarationKind, Field, RenderProfile, TypeRef, Variant};
use crate::codegen::names::to_snake_case;
use crate::graph::RecursionAnalysis;

/// Error text when a tagged union does not hold exactly one branch
pub const UNION_ARITY_ERROR: &str = "tagged union type must have exactly 1 non-absent field value";

// =============================================================================
// Public API
// =============================================================================

/// Render a complete Rust source file.
///
/// `header` lines become `//` comments at the top of the file.
pub fn render(
    declarations: &[Declaration],
    recursion: &RecursionAnalysis,
    profile: &RenderProfile,
    header: &[String],
) -> String {
    let mut output = String::new();

    for line in header {
        output.push_str(&format!("// {}\n", line));
    }
    if !header.is_empty() {
        output.push('\n');
    }

    output.push_str("use serde::{Deserialize, Serialize};\n");

    let emitter = Emitter { recursion, profile };
    for declaration in declarations {
        output.push('\n');
        output.push_str(&emitter.emit_declaration(declaration));
    }

    output
}

struct Emitter<'r> {
    recursion: &'r RecursionAnalysis,
    profile: &'r RenderProfile,
}

impl<'r> Emitter<'r> {
    fn emit_declaration(&self, declaration: &Declaration) -> String {
        let mut output = String::new();
        emit_doc(&mut output, declaration.doc.as_deref(), "");

        let name = self.type_name(&declaration.name);
        if name.contains('_') {
            output.push_str("#[allow(non_camel_case_types)]\n");
        }

        match &declaration.kind {
            DeclarationKind::Struct { fields, extension } => {
                let extension = extension.as_ref().map(|e| &e.value);
                self.emit_struct(&mut output, declaration, &name, fields, extension);
            }
            DeclarationKind::TaggedUnion {
                discriminant,
                variants,
            } => {
                self.emit_tagged_union(&mut output, declaration, &name, discriminant, variants);
            }
            DeclarationKind::Array(ty) | DeclarationKind::Map(ty) | DeclarationKind::Alias(ty) => {
                if self.recursion.is_recursive_alias(&declaration.name) {
                    self.emit_newtype(&mut output, declaration, &name, ty);
                } else {
                    output.push_str(&format!("pub type {} = {};\n", name, self.rust_type(ty, false)));
                }
            }
        }
        output
    }

    fn derives(&self, exclude_serde: bool) -> String {
        self.profile
            .derives
            .iter()
            .filter(|d| !(exclude_serde && matches!(d.as_str(), "Serialize" | "Deserialize" | "Default")))
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }

    // =========================================================================
    // Struct Emission
    // =========================================================================

    fn emit_struct(
        &self,
        output: &mut String,
        declaration: &Declaration,
        name: &str,
        fields: &[Field],
        extension: Option<&TypeRef>,
    ) {
        output.push_str(&format!("#[derive({})]\n", self.derives(false)));
        output.push_str(&format!("pub struct {} {{\n", name));

        let mut names = MemberNames::default();
        for field in fields {
            let boxed = self.recursion.is_boxed(&declaration.name, &field.identifier);
            let (raw, escaped) = names.claim(&to_snake_case(&field.identifier), self.profile);
            emit_doc(output, field.doc.as_deref(), "    ");

            let mut attrs = Vec::new();
            if raw != field.json_name {
                attrs.push(format!("rename = {:?}", field.json_name));
            }
            let rust_type = self.rust_type(&field.ty, boxed);
            let full_type = if field.required {
                rust_type
            } else {
                attrs.push("skip_serializing_if = \"Option::is_none\"".to_string());
                match &field.ty {
                    // absent and null collapse into one Option
                    TypeRef::Nullable(_) => rust_type,
                    _ => self.profile.wrap_optional(&rust_type),
                }
            };
            if !attrs.is_empty() {
                output.push_str(&format!("    #[serde({})]\n", attrs.join(", ")));
            }
            output.push_str(&format!("    pub {}: {},\n", escaped, full_type));
        }

        if let Some(value) = extension {
            let (_, escaped) = names.claim(&self.profile.extension_field, self.profile);
            let map = match value {
                TypeRef::Any => self.profile.wrap_map(None),
                other => self.profile.wrap_map(Some(&self.rust_type(other, false))),
            };
            output.push_str("    #[serde(flatten)]\n");
            output.push_str(&format!("    pub {}: {},\n", escaped, map));
        }

        output.push_str("}\n");
    }

    // =========================================================================
    // Tagged Union Emission
    // =========================================================================

    fn emit_tagged_union(
        &self,
        output: &mut String,
        declaration: &Declaration,
        name: &str,
        discriminant: &str,
        variants: &[Variant],
    ) {
        let mut names = MemberNames::default();
        let members: Vec<(String, &Variant)> = variants
            .iter()
            .map(|v| (names.claim(&to_snake_case(&v.identifier), self.profile).1, v))
            .collect();

        let derives = self.derives(true);
        if derives.is_empty() {
            output.push_str("#[derive(Default)]\n");
        } else {
            output.push_str(&format!("#[derive({}, Default)]\n", derives));
        }
        output.push_str(&format!("pub struct {} {{\n", name));
        for (member, variant) in &members {
            let boxed = self.recursion.is_boxed(&declaration.name, &variant.identifier);
            let ty = self.rust_type(&variant.ty, boxed);
            output.push_str(&format!("    pub {}: {},\n", member, self.profile.wrap_optional(&ty)));
        }
        output.push_str("}\n\n");

        // Serialize: exactly one branch, written as the branch itself
        output.push_str(&format!("impl serde::Serialize for {} {{\n", name));
        output.push_str("    fn serialize<__S>(&self, serializer: __S) -> ::std::result::Result<__S::Ok, __S::Error>\n");
        output.push_str("    where\n");
        output.push_str("        __S: serde::Serializer,\n");
        output.push_str("    {\n");
        let count = members
            .iter()
            .map(|(member, _)| format!("usize::from(self.{}.is_some())", member))
            .collect::<Vec<_>>()
            .join(" + ");
        output.push_str(&format!("        let present = {};\n", count));
        output.push_str("        if present == 1 {\n");
        for (member, _) in &members {
            output.push_str(&format!("            if let Some(value) = &self.{} {{\n", member));
            output.push_str("                return value.serialize(serializer);\n");
            output.push_str("            }\n");
        }
        output.push_str("        }\n");
        output.push_str(&format!(
            "        Err(serde::ser::Error::custom({:?}))\n",
            UNION_ARITY_ERROR
        ));
        output.push_str("    }\n");
        output.push_str("}\n\n");

        // Deserialize: read the discriminant, then decode the whole payload
        // into the matching branch
        let accepted = variants
            .iter()
            .map(|v| format!("{:?}", v.discriminant_value))
            .collect::<Vec<_>>()
            .join(", ");
        let unknown = format!(
            "tagged union type must have a {:?} property whose value is one of [{}]",
            discriminant, accepted
        );

        output.push_str(&format!("impl<'de> serde::Deserialize<'de> for {} {{\n", name));
        output.push_str("    fn deserialize<__D>(deserializer: __D) -> ::std::result::Result<Self, __D::Error>\n");
        output.push_str("    where\n");
        output.push_str("        __D: serde::Deserializer<'de>,\n");
        output.push_str("    {\n");
        output.push_str("        let value = serde_json::Value::deserialize(deserializer)?;\n");
        output.push_str(&format!(
            "        let tag = value.get({:?}).and_then(serde_json::Value::as_str).map(str::to_owned);\n",
            discriminant
        ));
        output.push_str("        match tag.as_deref() {\n");
        for (member, variant) in &members {
            let boxed = self.recursion.is_boxed(&declaration.name, &variant.identifier);
            let wrap = if boxed { "Box::new(v)" } else { "v" };
            output.push_str(&format!("            Some({:?}) => serde_json::from_value(value)\n", variant.discriminant_value));
            output.push_str(&format!(
                "                .map(|v| Self {{ {}: Some({}), ..Self::default() }})\n",
                member, wrap
            ));
            output.push_str("                .map_err(serde::de::Error::custom),\n");
        }
        output.push_str(&format!(
            "            Some(other) => Err(serde::de::Error::custom(format!(\"{{}}, got {{:?}}\", {:?}, other))),\n",
            unknown
        ));
        output.push_str(&format!(
            "            None => Err(serde::de::Error::custom({:?})),\n",
            unknown
        ));
        output.push_str("        }\n");
        output.push_str("    }\n");
        output.push_str("}\n");
    }

    // =========================================================================
    // Newtype Emission
    // =========================================================================

    fn emit_newtype(&self, output: &mut String, declaration: &Declaration, name: &str, ty: &TypeRef) {
        let boxed = self.recursion.is_boxed(&declaration.name, "");
        output.push_str(&format!("#[derive({})]\n", self.derives(false)));
        output.push_str("#[serde(transparent)]\n");
        output.push_str(&format!("pub struct {}(pub {});\n", name, self.rust_type(ty, boxed)));
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn type_name(&self, name: &str) -> String {
        if self.profile.is_reserved_type_name(name) {
            format!("{}_", name)
        } else {
            name.to_string()
        }
    }

    /// Render a type; `boxed` puts the value (inside any `Option`) behind a
    /// `Box`
    fn rust_type(&self, ty: &TypeRef, boxed: bool) -> String {
        match ty {
            TypeRef::Nullable(inner) => self.profile.wrap_optional(&self.rust_type(inner, boxed)),
            other if boxed => self.profile.wrap_box(&self.rust_type(other, false)),
            TypeRef::Any => self.profile.types.any.clone(),
            TypeRef::Scalar(kind) => self.profile.scalar_type(*kind).to_string(),
            TypeRef::Named(name) => self.type_name(name),
            TypeRef::Array(inner) => self.profile.wrap_array(&self.rust_type(inner, false)),
            TypeRef::Map(inner) => match inner.as_ref() {
                TypeRef::Any => self.profile.wrap_map(None),
                other => self.profile.wrap_map(Some(&self.rust_type(other, false))),
            },
            TypeRef::Tuple(items) => {
                let items: Vec<String> = items.iter().map(|t| self.rust_type(t, false)).collect();
                match items.len() {
                    1 => format!("({},)", items[0]),
                    _ => format!("({})", items.join(", ")),
                }
            }
        }
    }
}

/// Member names already used in one struct
#[derive(Default)]
struct MemberNames {
    taken: HashSet<String>,
}

impl MemberNames {
    /// Claim a unique field name; returns the bare name and the
    /// keyword-escaped form
    fn claim(&mut self, wanted: &str, profile: &RenderProfile) -> (String, String) {
        let mut base = String::with_capacity(wanted.len());
        for c in wanted.chars() {
            if !(c == '_' && base.ends_with('_')) {
                base.push(c);
            }
        }
        let mut candidate = base.clone();
        let mut n = 2;
        while !self.taken.insert(candidate.clone()) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        let escaped = profile.escape_keyword(&candidate);
        (candidate, escaped)
    }
}

fn emit_doc(output: &mut String, doc: Option<&str>, indent: &str) {
    if let Some(doc) = doc {
        for line in doc.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                output.push_str(&format!("{}///\n", indent));
            } else {
                output.push_str(&format!("{}/// {}\n", indent, line));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{ExtensionField, ScalarKind};
    use crate::graph::{analyze_recursion, RootId, SchemaKey};

    fn declaration(name: &str, kind: DeclarationKind) -> Declaration {
        Declaration {
            name: name.to_string(),
            kind,
            doc: None,
            origin: SchemaKey::root(RootId(0)),
            source: format!("test#/{name}"),
        }
    }

    fn field(json_name: &str, identifier: &str, required: bool, ty: TypeRef) -> Field {
        Field {
            json_name: json_name.to_string(),
            identifier: identifier.to_string(),
            required,
            ty,
            doc: None,
        }
    }

    fn render_one(declarations: Vec<Declaration>) -> String {
        let recursion = analyze_recursion(&declarations);
        render(&declarations, &recursion, &RenderProfile::rust(), &[])
    }

    #[test]
    fn test_struct_fields_and_extension() {
        let mut decl = declaration(
            "ObjectWithProps",
            DeclarationKind::Struct {
                fields: vec![
                    field("p0", "P0", true, TypeRef::Scalar(ScalarKind::String)),
                    field("searchScopes", "SearchScopes", false, TypeRef::Array(Box::new(TypeRef::Any))),
                    field("type", "Type", true, TypeRef::Scalar(ScalarKind::String)),
                ],
                extension: Some(ExtensionField { value: TypeRef::Any }),
            },
        );
        decl.doc = Some("An object.\n\nWith props.".to_string());
        let code = render_one(vec![decl]);

        assert!(code.contains("/// An object.\n///\n/// With props.\n"));
        assert!(code.contains("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\npub struct ObjectWithProps {"));
        assert!(code.contains("    pub p0: String,\n"));
        assert!(code.contains(
            "    #[serde(rename = \"searchScopes\", skip_serializing_if = \"Option::is_none\")]\n    pub search_scopes: Option<Vec<serde_json::Value>>,\n"
        ));
        assert!(code.contains("    pub r#type: String,\n"));
        assert!(code.contains("    #[serde(flatten)]\n    pub additional: serde_json::Map<String, serde_json::Value>,\n"));
    }

    #[test]
    fn test_closed_struct_has_no_extension() {
        let code = render_one(vec![declaration(
            "Closed",
            DeclarationKind::Struct {
                fields: vec![],
                extension: None,
            },
        )]);
        assert!(code.contains("pub struct Closed {\n}\n"));
        assert!(!code.contains("flatten"));
    }

    #[test]
    fn test_tagged_union_impls() {
        let code = render_one(vec![declaration(
            "Auth",
            DeclarationKind::TaggedUnion {
                discriminant: "type".to_string(),
                variants: vec![
                    Variant {
                        discriminant_value: "http-header".to_string(),
                        identifier: "HttpHeader".to_string(),
                        ty: TypeRef::Named("HttpHeader".to_string()),
                    },
                    Variant {
                        discriminant_value: "builtin".to_string(),
                        identifier: "Builtin".to_string(),
                        ty: TypeRef::Named("Builtin".to_string()),
                    },
                ],
            },
        )]);

        assert!(code.contains("#[derive(Debug, Clone, PartialEq, Default)]\npub struct Auth {"));
        assert!(code.contains("    pub http_header: Option<HttpHeader>,\n"));
        assert!(code.contains("impl serde::Serialize for Auth {"));
        assert!(code.contains(
            "let present = usize::from(self.http_header.is_some()) + usize::from(self.builtin.is_some());"
        ));
        assert!(code.contains("impl<'de> serde::Deserialize<'de> for Auth {"));
        assert!(code.contains("Some(\"http-header\") => serde_json::from_value(value)"));
        assert!(code.contains(
            r#"whose value is one of [\"http-header\", \"builtin\"]"#
        ));
    }

    #[test]
    fn test_aliases_and_recursion() {
        let code = render_one(vec![
            declaration(
                "Node",
                DeclarationKind::Struct {
                    fields: vec![field(
                        "next",
                        "Next",
                        false,
                        TypeRef::Named("Node".to_string()),
                    )],
                    extension: None,
                },
            ),
            declaration(
                "Tree",
                DeclarationKind::Array(TypeRef::Array(Box::new(TypeRef::Named("Tree".to_string())))),
            ),
            declaration(
                "Labels",
                DeclarationKind::Map(TypeRef::Map(Box::new(TypeRef::Scalar(ScalarKind::String)))),
            ),
            declaration(
                "Point",
                DeclarationKind::Array(TypeRef::Tuple(vec![
                    TypeRef::Scalar(ScalarKind::Number),
                    TypeRef::Scalar(ScalarKind::Number),
                ])),
            ),
        ]);
        assert!(code.contains("    pub next: Option<Box<Node>>,\n"));
        assert!(code.contains("#[serde(transparent)]\npub struct Tree(pub Vec<Tree>);\n"));
        assert!(code.contains("pub type Labels = std::collections::HashMap<String, String>;\n"));
        assert!(code.contains("pub type Point = (serde_json::Number, serde_json::Number);\n"));
    }

    #[test]
    fn test_member_name_dedup_and_reserved_types() {
        let code = render_one(vec![declaration(
            "Option",
            DeclarationKind::Struct {
                fields: vec![
                    field("a_b", "A_b", true, TypeRef::Scalar(ScalarKind::Boolean)),
                    field("A_B", "A_B", true, TypeRef::Scalar(ScalarKind::Boolean)),
                    field("additional", "Additional", true, TypeRef::Any),
                ],
                extension: Some(ExtensionField { value: TypeRef::Any }),
            },
        )]);
        assert!(code.contains("pub struct Option_ {"));
        assert!(code.contains("    pub a_b: bool,\n"));
        assert!(code.contains("    #[serde(rename = \"A_B\")]\n    pub a_b_2: bool,\n"));
        assert!(code.contains("    pub additional: serde_json::Value,\n"));
        assert!(code.contains("    pub additional_2: serde_json::Map<String, serde_json::Value>,\n"));
    }

    #[test]
    fn test_header_lines() {
        let code = render(
            &[],
            &RecursionAnalysis::default(),
            &RenderProfile::rust(),
            &["Generated by familiar-typegen - DO NOT EDIT".to_string()],
        );
        assert!(code.starts_with("// Generated by familiar-typegen - DO NOT EDIT\n\nuse serde::{Deserialize, Serialize};\n"));
    }
}
