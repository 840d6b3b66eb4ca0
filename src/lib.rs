//! Familiar Type Generator
//!
//! Compiles a set of JSON Schema documents into typed declarations and
//! renders them as Rust source.
//!
//! ## Pipeline
//!
//! ```text
//! documents ──► index ──► resolve ──► generate ──► recursion ──► render
//!               (locations,  ($ref →     (declarations  (boxing,     (Rust source)
//!                identities)  target)     per root)      newtypes)
//! ```
//!
//! Every phase borrows the output of the previous one; nothing is global
//! and nothing is mutated once built. The phases stop at the first phase
//! that reports errors, and every error from that phase is returned.

pub mod codegen;
pub mod config;
pub mod error;
pub mod graph;
pub mod loader;
pub mod schema;

pub use codegen::{Declaration, DeclarationKind, RenderProfile, TypeRef};
pub use config::{CompilerConfig, TypegenConfig};
pub use error::{CompileError, CompileErrors, Result};
pub use graph::{CorpusIndex, RecursionAnalysis, SchemaDocument};
pub use loader::LoadedCorpus;
pub use schema::Schema;

/// Banner written at the top of generated files
pub const GENERATED_BANNER: &str = "Generated by familiar-typegen - DO NOT EDIT";

/// Output of a successful compilation
#[derive(Debug, Clone)]
pub struct Compilation {
    /// Declarations sorted by name
    pub declarations: Vec<Declaration>,
    pub recursion: RecursionAnalysis,
}

impl Compilation {
    /// Render as a Rust source file
    pub fn render(&self, profile: &RenderProfile, header: &[String]) -> String {
        codegen::rust::render(&self.declarations, &self.recursion, profile, header)
    }

    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }
}

/// Compile a corpus of root documents
pub fn compile(
    documents: &[SchemaDocument],
    config: &CompilerConfig,
) -> std::result::Result<Compilation, CompileErrors> {
    let corpus = {
        let _span = tracing::info_span!("index", documents = documents.len()).entered();
        CorpusIndex::build(documents, config.base_uri.as_deref())?
    };

    let resolved = {
        let _span = tracing::info_span!("resolve").entered();
        graph::resolve_references(&corpus)?
    };
    tracing::debug!(references = resolved.len(), "resolved references");

    let declarations = codegen::generate_all(&corpus, &resolved, config)?;
    let recursion = graph::analyze_recursion(&declarations);

    Ok(Compilation {
        declarations,
        recursion,
    })
}

/// Header lines for a generated file
pub fn header_lines(fingerprint: Option<&str>) -> Vec<String> {
    let mut lines = vec![GENERATED_BANNER.to_string()];
    if let Some(fingerprint) = fingerprint {
        lines.push(format!("Source fingerprint: sha256:{}", fingerprint));
    }
    lines
}
