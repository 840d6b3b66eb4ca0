//! Schema Loading
//!
//! Reads schema documents from files and directories and fingerprints the
//! set, so generated output can record exactly what it was built from.

use anyhow::Context;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::LoaderConfig;
use crate::graph::SchemaDocument;
use crate::schema::Schema;

/// Documents read from disk, in load order
#[derive(Debug, Clone)]
pub struct LoadedCorpus {
    pub documents: Vec<SchemaDocument>,
    /// SHA256 over every file's relative path and content
    pub fingerprint: String,
}

impl LoadedCorpus {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Document name for a schema file: the file stem without `.schema`
pub fn document_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    stem.strip_suffix(".schema").unwrap_or(stem).to_string()
}

/// Load every matching schema file below a directory, sorted by relative
/// path
pub fn load_directory(schema_dir: &Path, config: &LoaderConfig) -> anyhow::Result<LoadedCorpus> {
    let files = discover(schema_dir, config)?;
    let entries: Vec<(String, PathBuf)> = files
        .into_iter()
        .map(|path| {
            let relative = path
                .strip_prefix(schema_dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            (relative, path)
        })
        .collect();
    load_entries(&entries)
}

/// Load the given files, in the given order
pub fn load_files(files: &[PathBuf]) -> anyhow::Result<LoadedCorpus> {
    let entries: Vec<(String, PathBuf)> = files
        .iter()
        .map(|path| (path.to_string_lossy().replace('\\', "/"), path.clone()))
        .collect();
    load_entries(&entries)
}

/// Load a mix of files and directories. Directories expand to their
/// matching files; explicit files are taken as they are.
pub fn load_paths(paths: &[PathBuf], config: &LoaderConfig) -> anyhow::Result<LoadedCorpus> {
    let mut entries = Vec::new();
    for path in paths {
        if path.is_dir() {
            for file in discover(path, config)? {
                let relative = file
                    .strip_prefix(path)
                    .unwrap_or(&file)
                    .to_string_lossy()
                    .replace('\\', "/");
                entries.push((format!("{}/{}", path.display(), relative), file));
            }
        } else {
            entries.push((path.to_string_lossy().replace('\\', "/"), path.clone()));
        }
    }
    load_entries(&entries)
}

fn discover(schema_dir: &Path, config: &LoaderConfig) -> anyhow::Result<Vec<PathBuf>> {
    if !schema_dir.is_dir() {
        anyhow::bail!("Schema directory not found: {}", schema_dir.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(schema_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext == config.extension.as_str())
                .unwrap_or(false)
        })
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|name| config.accepts(name))
                .unwrap_or(false)
        })
        .collect();
    files.sort();

    tracing::debug!(dir = %schema_dir.display(), files = files.len(), "discovered schema files");
    Ok(files)
}

fn load_entries(entries: &[(String, PathBuf)]) -> anyhow::Result<LoadedCorpus> {
    let mut hasher = Sha256::new();
    let mut documents = Vec::with_capacity(entries.len());

    for (relative, path) in entries {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        hasher.update(relative.as_bytes());
        hasher.update([0u8]);
        hasher.update(content.as_bytes());

        let schema: Schema = content
            .parse()
            .with_context(|| format!("Failed to parse schema in {}", path.display()))?;
        documents.push(SchemaDocument::new(document_name(path), schema));
    }

    let fingerprint = format!("{:x}", hasher.finalize());
    tracing::info!(documents = documents.len(), fingerprint = %fingerprint, "loaded schemas");
    Ok(LoadedCorpus {
        documents,
        fingerprint,
    })
}
