//! The product catalog: a read-only table of known products.
//!
//! Loaded once from CSV at startup. A missing or unreadable catalog degrades
//! to an empty catalog so the matcher stays constructible; malformed rows are
//! skipped at load time instead of failing per-query.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Result;

/// One physical product. Immutable after load.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub product_id: String,
    pub title: String,
    pub model: String,
    pub brand: String,
}

/// In-memory product catalog, read-only after construction.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// An empty catalog; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the catalog from a CSV file with a
    /// `product_id,title,model,brand` header.
    ///
    /// Fails if the file cannot be opened; rows that fail to parse, or that
    /// carry an empty `product_id`, are logged and skipped.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;

        let mut entries = Vec::new();
        for (row, record) in reader.deserialize::<CatalogEntry>().enumerate() {
            match record {
                Ok(entry) if entry.product_id.trim().is_empty() => {
                    warn!("skipping catalog row {}: empty product_id", row + 1);
                }
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    warn!("skipping catalog row {}: {err}", row + 1);
                }
            }
        }

        debug!("loaded catalog with {} products", entries.len());
        Ok(Self { entries })
    }

    /// Load the catalog, degrading to an empty one when the file is missing
    /// or unreadable.
    ///
    /// The matcher stays constructible either way; over an empty catalog it
    /// simply never matches.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!("failed to load catalog {}: {err}", path.display());
                Self::empty()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in catalog order. The matcher relies on this order for
    /// stable tie-breaking.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn get(&self, product_id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.product_id == product_id)
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.get(product_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_catalog(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("catalog.csv");
        std::fs::write(&path, contents).unwrap();
        (tmp, path)
    }

    #[test]
    fn loads_well_formed_rows() {
        let (_tmp, path) = write_catalog(
            "product_id,title,model,brand\n\
             iphone-15-pro-max,iPhone 15 Pro Max,A3105,Apple\n\
             galaxy-s24,Galaxy S24,SM-S921,Samsung\n",
        );

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.get("iphone-15-pro-max").unwrap().title,
            "iPhone 15 Pro Max"
        );
        assert!(catalog.contains("galaxy-s24"));
        assert!(!catalog.contains("pixel-8"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(Catalog::load(&tmp.path().join("nope.csv")).is_err());
    }

    #[test]
    fn load_or_empty_degrades_on_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let catalog = Catalog::load_or_empty(&tmp.path().join("nope.csv"));
        assert!(catalog.is_empty());
        assert!(catalog.get("anything").is_none());
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let (_tmp, path) = write_catalog(
            "product_id,title,model,brand\n\
             good-1,Good One,M1,Acme\n\
             only,two,columns\n\
             good-2,Good Two,M2,Acme\n",
        );

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("good-1"));
        assert!(catalog.contains("good-2"));
    }

    #[test]
    fn empty_product_id_is_skipped() {
        let (_tmp, path) = write_catalog(
            "product_id,title,model,brand\n\
             ,No Id,M0,Acme\n\
             good-1,Good One,M1,Acme\n",
        );

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.iter().next().unwrap().product_id, "good-1");
    }

    #[test]
    fn iteration_preserves_file_order() {
        let (_tmp, path) = write_catalog(
            "product_id,title,model,brand\n\
             zeta,Zeta,Z,Acme\n\
             alpha,Alpha,A,Acme\n",
        );

        let catalog = Catalog::load(&path).unwrap();
        let ids: Vec<_> =
            catalog.iter().map(|e| e.product_id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha"]);
    }
}
