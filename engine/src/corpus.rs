use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::index::DocId;

/// A raw corpus document handed to the index builder. Ids are assigned by
/// the loader and cover 0..N contiguously.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocId,
    pub source: PathBuf,
    pub text: String,
}

/// Enumerate every regular file under `dir` and read it as UTF-8.
///
/// Paths are sorted before ids are assigned so that rebuilding from the
/// same directory always yields the same id mapping. A file that cannot
/// be read or decoded fails the whole load; no partial corpus is
/// returned.
pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<Document>> {
    let dir = dir.as_ref();
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry =
            entry.with_context(|| format!("walking corpus directory {}", dir.display()))?;
        if entry.file_type().is_file() {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    let mut docs = Vec::with_capacity(paths.len());
    for (id, path) in paths.into_iter().enumerate() {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading corpus document {}", path.display()))?;
        docs.push(Document {
            id: id as DocId,
            source: path,
            text,
        });
    }
    tracing::info!(num_docs = docs.len(), dir = %dir.display(), "corpus loaded");
    Ok(docs)
}
