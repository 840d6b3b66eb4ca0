//! Golden Tests for Generated Code
//!
//! Compiles each fixture schema and compares the rendered Rust against the
//! checked-in expectation under `fixtures/rendered/`, plus structural
//! checks on the declaration model.

use std::path::{Path, PathBuf};

use familiar_typegen::codegen::{DeclarationKind, ScalarKind, TypeRef};
use familiar_typegen::config::LoaderConfig;
use familiar_typegen::{
    compile, loader, Compilation, CompilerConfig, RenderProfile, Schema, SchemaDocument,
    GENERATED_BANNER,
};
use serde_json::json;

fn fixtures_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn compile_fixture(name: &str) -> Compilation {
    let corpus = loader::load_files(&[fixtures_path().join(name)]).unwrap();
    compile(&corpus.documents, &CompilerConfig::default())
        .unwrap_or_else(|errors| panic!("{} failed to compile:\n{}", name, errors))
}

fn render(compilation: &Compilation) -> String {
    compilation.render(&RenderProfile::rust(), &[GENERATED_BANNER.to_string()])
}

fn names(compilation: &Compilation) -> Vec<&str> {
    compilation
        .declarations
        .iter()
        .map(|d| d.name.as_str())
        .collect()
}

// =============================================================================
// Rendered Output
// =============================================================================

#[test]
fn test_object_with_props_golden() {
    let compilation = compile_fixture("object-with-props.json");
    assert_eq!(
        render(&compilation),
        include_str!("fixtures/rendered/object_with_props.rs")
    );
}

#[test]
fn test_one_of_golden() {
    let compilation = compile_fixture("oneOf.json");
    assert_eq!(names(&compilation), vec!["A", "B", "C", "D", "OneOf"]);
    assert_eq!(render(&compilation), include_str!("fixtures/rendered/one_of.rs"));
}

#[test]
fn test_recursion_golden() {
    let compilation = compile_fixture("recursion.json");
    assert!(compilation.recursion.is_boxed("Tree", "Parent"));
    assert!(!compilation.recursion.is_boxed("Tree", "Children"));
    assert_eq!(render(&compilation), include_str!("fixtures/rendered/recursion.rs"));
}

// =============================================================================
// Declaration Model
// =============================================================================

#[test]
fn test_nullable_array_elements() {
    let compilation = compile_fixture("nullable-array.json");
    assert_eq!(names(&compilation), vec!["Array", "Wrapper"]);

    let wrapper = compilation.declaration("Wrapper").unwrap();
    match &wrapper.kind {
        DeclarationKind::Struct { fields, .. } => {
            assert_eq!(fields[0].json_name, "array");
            assert!(!fields[0].required);
            assert_eq!(
                fields[0].ty,
                TypeRef::Array(Box::new(TypeRef::Nullable(Box::new(TypeRef::Named(
                    "Array".to_string()
                )))))
            );
        }
        other => panic!("Expected struct, got {:?}", other),
    }

    let code = render(&compilation);
    assert!(code.contains("    pub array: Option<Vec<Option<Array>>>,\n"));
}

#[test]
fn test_schema_refs() {
    let compilation = compile_fixture("schema-refs.json");
    assert_eq!(names(&compilation), vec!["D", "E", "SchemaRefs"]);

    let refs = compilation.declaration("SchemaRefs").unwrap();
    let DeclarationKind::Struct { fields, .. } = &refs.kind else {
        panic!("Expected struct, got {:?}", refs.kind);
    };
    let summary: Vec<(&str, bool, &TypeRef)> = fields
        .iter()
        .map(|f| (f.json_name.as_str(), f.required, &f.ty))
        .collect();
    let d = TypeRef::Named("D".to_string());
    assert_eq!(
        summary,
        vec![
            ("d", true, &d),
            ("dArray", true, &TypeRef::Array(Box::new(d.clone()))),
            ("dPointer", false, &d),
        ]
    );

    let e = compilation.declaration("E").unwrap();
    assert_eq!(e.doc.as_deref(), Some("E"));
    match &e.kind {
        DeclarationKind::Struct { fields, extension } => {
            assert!(extension.is_none());
            assert_eq!(fields[0].ty, TypeRef::Scalar(ScalarKind::String));
        }
        other => panic!("Expected struct, got {:?}", other),
    }

    let code = render(&compilation);
    assert!(code.contains("    #[serde(rename = \"dArray\")]\n    pub d_array: Vec<D>,\n"));
    assert!(code.contains(
        "    #[serde(rename = \"eArray\")]\n    pub e_array: Vec<E>,\n"
    ));
    assert!(compilation.recursion.groups().is_empty());
}

#[test]
fn test_multi_document_directory() {
    let corpus =
        loader::load_directory(&fixtures_path().join("multi"), &LoaderConfig::default()).unwrap();
    let names_loaded: Vec<&str> = corpus.documents.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names_loaded, vec!["order", "person"]);

    let compilation = compile(&corpus.documents, &CompilerConfig::default()).unwrap();
    assert_eq!(names(&compilation), vec!["Address", "Order", "Person"]);

    let order = compilation.declaration("Order").unwrap();
    let DeclarationKind::Struct { fields, .. } = &order.kind else {
        panic!("Expected struct, got {:?}", order.kind);
    };
    assert_eq!(fields[0].ty, TypeRef::Named("Person".to_string()));
    assert_eq!(fields[1].ty, TypeRef::Named("Address".to_string()));
    assert_eq!(
        fields[2].ty,
        TypeRef::Map(Box::new(TypeRef::Scalar(ScalarKind::String)))
    );

    let code = render(&compilation);
    assert!(code.contains("    pub buyer: Person,\n"));
    assert!(code.contains(
        "    #[serde(rename = \"shipTo\", skip_serializing_if = \"Option::is_none\")]\n    pub ship_to: Option<Address>,\n"
    ));
    assert!(code.contains(
        "    pub labels: Option<std::collections::HashMap<String, String>>,\n"
    ));
}

#[test]
fn test_generation_is_deterministic() {
    let first = render(&compile_fixture("oneOf.json"));
    for _ in 0..5 {
        assert_eq!(render(&compile_fixture("oneOf.json")), first);
    }
}

#[test]
fn test_declarations_ignore_document_order() {
    let zed = || {
        SchemaDocument::new(
            "zed",
            Schema::from_value(json!({"properties": {"a": {"$ref": "alpha"}}})).unwrap(),
        )
    };
    let alpha = || {
        SchemaDocument::new(
            "alpha",
            Schema::from_value(json!({"$id": "alpha", "properties": {"n": {"type": "number"}}}))
                .unwrap(),
        )
    };

    let forward = compile(&[zed(), alpha()], &CompilerConfig::default()).unwrap();
    let backward = compile(&[alpha(), zed()], &CompilerConfig::default()).unwrap();
    assert_eq!(names(&forward), vec!["Alpha", "Zed"]);
    assert_eq!(names(&backward), vec!["Alpha", "Zed"]);
    assert_eq!(render(&forward), render(&backward));
}

#[test]
fn test_root_array_of_objects() {
    let document = SchemaDocument::new(
        "people",
        Schema::from_value(json!({
            "title": "People",
            "type": "array",
            "items": {"type": "object", "properties": {"name": {"type": "string"}}},
            "definitions": {
                "Tags": {"type": "array", "items": {"type": "object", "properties": {"label": {}}}}
            }
        }))
        .unwrap(),
    );
    let compilation = compile(&[document], &CompilerConfig::default())
        .unwrap_or_else(|errors| panic!("failed to compile:\n{}", errors));
    assert_eq!(names(&compilation), vec!["People", "PeopleItem", "Tags", "TagsItem"]);

    let code = render(&compilation);
    assert!(code.contains("pub type People = Vec<PeopleItem>;\n"), "{}", code);
    assert!(code.contains("pub type Tags = Vec<TagsItem>;\n"), "{}", code);
    assert!(code.contains("pub struct PeopleItem {\n"), "{}", code);
}
