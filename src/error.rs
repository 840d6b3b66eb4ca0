//! Error types for schema compilation

use std::fmt;

use thiserror::Error;

/// Result type for compilation operations
pub type Result<T> = std::result::Result<T, CompileError>;

/// Compilation errors.
///
/// All of these are structural problems with the input documents; none are
/// transient and none are retried.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Malformed identity {value:?} at {document}#{pointer}: {reason}")]
    MalformedIdentity {
        document: String,
        pointer: String,
        value: String,
        reason: String,
    },

    #[error("Unresolved reference {reference:?} at {document}#{pointer}: {reason}")]
    UnresolvedReference {
        document: String,
        pointer: String,
        reference: String,
        reason: String,
    },

    #[error("Ambiguous reference {reference:?} at {document}#{pointer}: matches {}", .candidates.join(", "))]
    AmbiguousReference {
        document: String,
        pointer: String,
        reference: String,
        candidates: Vec<String>,
    },

    #[error("External reference {reference:?} at {document}#{pointer}: target document {target_document} is not in the schema set")]
    ExternalReference {
        document: String,
        pointer: String,
        reference: String,
        target_document: String,
    },

    #[error("Cannot classify union {declaration} ({document}#{pointer}): {reason}")]
    UnclassifiableUnion {
        document: String,
        pointer: String,
        declaration: String,
        reason: String,
    },

    #[error("Naming collision in {declaration}: {first:?} and {second:?} both map to {identifier}")]
    NamingCollision {
        declaration: String,
        identifier: String,
        first: String,
        second: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CompileError {
    /// Stable diagnostic code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedIdentity { .. } => "E001",
            Self::UnresolvedReference { .. } => "E002",
            Self::AmbiguousReference { .. } => "E003",
            Self::ExternalReference { .. } => "E004",
            Self::UnclassifiableUnion { .. } => "E005",
            Self::NamingCollision { .. } => "E006",
            Self::Json(_) => "E000",
        }
    }
}

/// Several errors collected from one phase.
///
/// Generation keeps going across independent documents, so a failed run can
/// report every broken declaration at once.
#[derive(Debug, Default)]
pub struct CompileErrors {
    errors: Vec<CompileError>,
}

impl CompileErrors {
    pub fn new(errors: Vec<CompileError>) -> Self {
        Self { errors }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompileError> {
        self.errors.iter()
    }

    pub fn into_vec(self) -> Vec<CompileError> {
        self.errors
    }
}

impl From<CompileError> for CompileErrors {
    fn from(error: CompileError) -> Self {
        Self { errors: vec![error] }
    }
}

impl IntoIterator for CompileErrors {
    type Item = CompileError;
    type IntoIter = std::vec::IntoIter<CompileError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[{}] {}", error.code(), error)?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileErrors {}
