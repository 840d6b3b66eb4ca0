//! Render Configuration
//!
//! Host-language rendering settings. Derivation (shapes, names, unions) is
//! config-free apart from the discriminant; only emission reads this.

use serde::{Deserialize, Serialize};

use super::ScalarKind;

/// Rust rendering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderProfile {
    /// Type mappings for JSON scalars
    pub types: TypeMappings,

    /// Derives placed on every generated struct
    pub derives: Vec<String>,

    /// Rust field name of the catch-all member of open structs
    pub extension_field: String,

    /// Prefix that escapes a keyword used as an identifier
    pub keyword_escape: String,
}

/// Type mappings for JSON scalar types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeMappings {
    pub string: String,
    /// Integers and numbers share one type so `1` and `1.5` both keep their
    /// written form
    pub number: String,
    pub boolean: String,
    pub null: String,
    /// Unknown/any value
    pub any: String,
    /// Map with typed values; `{}` is replaced by the value type
    pub map: String,
    /// Map with open values
    pub any_map: String,
}

impl Default for TypeMappings {
    fn default() -> Self {
        Self {
            string: "String".to_string(),
            number: "serde_json::Number".to_string(),
            boolean: "bool".to_string(),
            null: "()".to_string(),
            any: "serde_json::Value".to_string(),
            map: "std::collections::HashMap<String, {}>".to_string(),
            any_map: "serde_json::Map<String, serde_json::Value>".to_string(),
        }
    }
}

impl Default for RenderProfile {
    fn default() -> Self {
        Self::rust()
    }
}

impl RenderProfile {
    /// The default Rust profile
    pub fn rust() -> Self {
        Self {
            types: TypeMappings::default(),
            derives: ["Debug", "Clone", "PartialEq", "Serialize", "Deserialize"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            extension_field: "additional".to_string(),
            keyword_escape: "r#".to_string(),
        }
    }

    /// Escape a keyword if needed. `self`, `Self`, `super` and `crate`
    /// cannot be raw identifiers, so they get a trailing underscore instead.
    pub fn escape_keyword(&self, name: &str) -> String {
        if matches!(name, "self" | "Self" | "super" | "crate") {
            format!("{name}_")
        } else if RUST_KEYWORDS.contains(&name) {
            format!("{}{}", self.keyword_escape, name)
        } else {
            name.to_string()
        }
    }

    /// Whether a type name would shadow a prelude or std type the generated
    /// code relies on
    pub fn is_reserved_type_name(&self, name: &str) -> bool {
        RESERVED_TYPE_NAMES.contains(&name) || name == "Self"
    }

    /// Get the type string for a JSON scalar
    pub fn scalar_type(&self, scalar: ScalarKind) -> &str {
        match scalar {
            ScalarKind::String => &self.types.string,
            ScalarKind::Number => &self.types.number,
            ScalarKind::Boolean => &self.types.boolean,
            ScalarKind::Null => &self.types.null,
        }
    }

    /// Wrap a type to make it optional or nullable
    pub fn wrap_optional(&self, type_str: &str) -> String {
        format!("Option<{}>", type_str)
    }

    /// Wrap a type in a container (array)
    pub fn wrap_array(&self, type_str: &str) -> String {
        format!("Vec<{}>", type_str)
    }

    /// Wrap a type in a map; open values use the open map type
    pub fn wrap_map(&self, value_type: Option<&str>) -> String {
        match value_type {
            Some(value_type) => self.types.map.replace("{}", value_type),
            None => self.types.any_map.clone(),
        }
    }

    /// Wrap a type in Box (for recursion)
    pub fn wrap_box(&self, type_str: &str) -> String {
        format!("Box<{}>", type_str)
    }
}

// =============================================================================
// Keywords
// =============================================================================

const RUST_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct",
    "super", "trait", "true", "type", "unsafe", "use", "where", "while",
    "async", "await", "dyn", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "typeof", "unsized", "virtual", "yield", "try",
];

const RESERVED_TYPE_NAMES: &[&str] = &[
    "String", "Vec", "Option", "Result", "Box", "Some", "None", "Ok", "Err",
    "Serialize", "Deserialize", "Debug", "Clone", "PartialEq", "Default",
    "Copy", "Send", "Sync",
];
