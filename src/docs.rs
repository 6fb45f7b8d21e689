//! Discovery and loading of per-product documentation files.
//!
//! Documentation lives as `<product_id>.txt` files directly under the docs
//! directory. Files are returned in name order so downstream chunking and
//! indexing see a stable sequence across runs.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};

/// A loaded product document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Product identifier, taken from the file stem.
    pub product_id: String,
    /// File name, recorded as the chunk source.
    pub source: String,
    pub text: String,
}

/// Load every `.txt` document under `dir`, sorted by file name.
///
/// A missing or unreadable directory logs a warning and yields no documents
/// rather than failing; files that cannot be read are skipped the same way.
pub fn load_documents(dir: &Path) -> Vec<Document> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("documents directory unavailable {}: {err}", dir.display());
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some("txt")
        })
        .collect();
    paths.sort();

    // Reads are independent; parallelize and keep the sorted order.
    let documents: Vec<Document> = paths
        .par_iter()
        .filter_map(|path| {
            let text = match std::fs::read_to_string(path) {
                Ok(text) => text,
                Err(err) => {
                    warn!("skipping unreadable {}: {err}", path.display());
                    return None;
                }
            };
            let product_id =
                path.file_stem()?.to_string_lossy().to_string();
            let source = path.file_name()?.to_string_lossy().to_string();
            Some(Document {
                product_id,
                source,
                text,
            })
        })
        .collect();

    debug!("loaded {} documents from {}", documents.len(), dir.display());
    documents
}
