//! Configuration management for the type generator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (typegen.toml)
//! - Environment variables (TYPEGEN__*)
//!
//! ## Example config file (typegen.toml):
//! ```toml
//! [compiler]
//! base_uri = "https://schemas.familiar.dev/"
//! discriminant = "type"
//!
//! [output]
//! path = "src/generated.rs"
//! header = true
//!
//! [loader]
//! extension = "json"
//! skip_prefixes = ["draft-"]
//!
//! [render]
//! extension_field = "additional"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::codegen::RenderProfile;

/// Main configuration for the type generator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypegenConfig {
    /// Compiler settings
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Schema discovery settings
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Rust rendering profile
    #[serde(default)]
    pub render: RenderProfile,
}

/// Settings that change what the compiler derives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Base URI that documents without an `$id` are resolved against
    #[serde(default)]
    pub base_uri: Option<String>,

    /// Property whose constant value tells `oneOf` branches apart
    #[serde(default = "default_discriminant")]
    pub discriminant: String,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Write generated code here instead of stdout
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Start the file with a "generated" banner and the input fingerprint
    #[serde(default = "default_true")]
    pub header: bool,
}

/// Which files a directory input contributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// File extension of schema files
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Skip files whose name starts with any of these
    #[serde(default)]
    pub skip_prefixes: Vec<String>,

    /// When non-empty, only files whose name starts with one of these
    #[serde(default)]
    pub include_prefixes: Vec<String>,
}

// Default value functions
fn default_discriminant() -> String {
    "type".to_string()
}

fn default_true() -> bool {
    true
}

fn default_extension() -> String {
    "json".to_string()
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            base_uri: None,
            discriminant: default_discriminant(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: None,
            header: true,
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            skip_prefixes: Vec::new(),
            include_prefixes: Vec::new(),
        }
    }
}

impl LoaderConfig {
    /// Whether a file name passes the prefix filters
    pub fn accepts(&self, file_name: &str) -> bool {
        if self.skip_prefixes.iter().any(|p| file_name.starts_with(p.as_str())) {
            return false;
        }
        self.include_prefixes.is_empty()
            || self
                .include_prefixes
                .iter()
                .any(|p| file_name.starts_with(p.as_str()))
    }
}

impl TypegenConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["typegen.toml", ".typegen.toml", "config/typegen.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "typegen") {
            let xdg_config = config_dir.config_dir().join("typegen.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // TYPEGEN__COMPILER__DISCRIMINANT=kind
        builder = builder.add_source(
            Environment::with_prefix("TYPEGEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
