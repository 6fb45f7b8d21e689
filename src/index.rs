//! Flat vector index with exact nearest-neighbor search.
//!
//! Vectors are stored in one contiguous f32 array, row id = chunk position.
//! Search is a brute-force scan over squared Euclidean distance, which is
//! exact and fast enough at catalog-documentation scale. The index persists
//! to a single binary snapshot file.
//!
//! Snapshot layout: `dimension: u32 LE`, `count: u32 LE`, then
//! `count * dimension` f32 LE values in row-major order.

use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// Snapshot header size: 4 bytes dimension + 4 bytes vector count.
const HEADER_SIZE: usize = 8;

#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<f32>,
}

impl VectorIndex {
    /// Build an index over one embedding per chunk, in chunk order.
    ///
    /// Fails on an empty batch or inconsistent dimensions; callers decide
    /// whether zero chunks mean "leave the index uninitialized".
    pub fn from_embeddings(embeddings: &[Vec<f32>]) -> Result<Self> {
        let Some(first) = embeddings.first() else {
            return Err(Error::Config(
                "cannot build an index from zero vectors".into(),
            ));
        };
        let dimension = first.len();
        if dimension == 0 {
            return Err(Error::Config("embedding dimension is zero".into()));
        }

        let mut vectors = Vec::with_capacity(embeddings.len() * dimension);
        for (i, embedding) in embeddings.iter().enumerate() {
            if embedding.len() != dimension {
                return Err(Error::Config(format!(
                    "embedding {i} has dimension {}, expected {dimension}",
                    embedding.len()
                )));
            }
            vectors.extend_from_slice(embedding);
        }

        Ok(Self { dimension, vectors })
    }

    pub fn len(&self) -> usize {
        self.vectors.len() / self.dimension.max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Return up to `k` row ids ordered by increasing squared Euclidean
    /// distance to `query`.
    ///
    /// An empty index or a query of the wrong dimension yields an empty
    /// result rather than an error.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        if self.is_empty() || k == 0 {
            return Vec::new();
        }
        if query.len() != self.dimension {
            debug!(
                "query dimension {} does not match index dimension {}",
                query.len(),
                self.dimension
            );
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(row, vector)| {
                let dist = vector
                    .iter()
                    .zip(query)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f32>();
                (row, dist)
            })
            .collect();

        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        scored
    }

    /// Write the snapshot to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + self.vectors.len() * 4);
        bytes.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.len() as u32).to_le_bytes());
        bytes.extend_from_slice(bytemuck::cast_slice(&self.vectors));
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a snapshot back. Any structural mismatch is an error; callers
    /// treat that as a corruption state and rebuild.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        if bytes.len() < HEADER_SIZE {
            return Err(Error::Config(format!(
                "vector snapshot {} is truncated",
                path.display()
            )));
        }

        let dimension =
            u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
        let count =
            u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;

        let expected = HEADER_SIZE + count * dimension * 4;
        if dimension == 0 || bytes.len() != expected {
            return Err(Error::Config(format!(
                "vector snapshot {} is corrupt ({} bytes, expected {expected})",
                path.display(),
                bytes.len()
            )));
        }

        let vectors: Vec<f32> = bytes[HEADER_SIZE..]
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes(b.try_into().unwrap()))
            .collect();

        Ok(Self { dimension, vectors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> VectorIndex {
        VectorIndex::from_embeddings(&[
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 3.0],
            vec![5.0, 5.0],
        ])
        .unwrap()
    }

    #[test]
    fn search_orders_by_distance() {
        let index = sample_index();
        let results = index.search(&[0.9, 0.0], 4);

        let rows: Vec<usize> = results.iter().map(|(row, _)| *row).collect();
        assert_eq!(rows, vec![1, 0, 2, 3]);
        for window in results.windows(2) {
            assert!(window[0].1 <= window[1].1);
        }
    }

    #[test]
    fn search_truncates_to_k() {
        let index = sample_index();
        assert_eq!(index.search(&[0.0, 0.0], 2).len(), 2);
    }

    #[test]
    fn k_larger_than_index_returns_everything() {
        let index = sample_index();
        assert_eq!(index.search(&[0.0, 0.0], 100).len(), 4);
    }

    #[test]
    fn mismatched_query_dimension_returns_empty() {
        let index = sample_index();
        assert!(index.search(&[0.0, 0.0, 0.0], 3).is_empty());
    }

    #[test]
    fn zero_vectors_is_an_error() {
        assert!(VectorIndex::from_embeddings(&[]).is_err());
    }

    #[test]
    fn inconsistent_dimensions_are_rejected() {
        let result = VectorIndex::from_embeddings(&[
            vec![1.0, 2.0],
            vec![1.0, 2.0, 3.0],
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn snapshot_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("vectors.bin");

        let index = sample_index();
        index.save(&path).unwrap();

        let loaded = VectorIndex::load(&path).unwrap();
        assert_eq!(loaded.dimension(), 2);
        assert_eq!(loaded.len(), 4);
        assert_eq!(
            loaded.search(&[0.9, 0.0], 4),
            index.search(&[0.9, 0.0], 4)
        );
    }

    #[test]
    fn truncated_snapshot_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("vectors.bin");

        let index = sample_index();
        index.save(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        assert!(VectorIndex::load(&path).is_err());
    }

    #[test]
    fn garbage_snapshot_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("vectors.bin");
        std::fs::write(&path, b"junk").unwrap();
        assert!(VectorIndex::load(&path).is_err());
    }

    #[test]
    fn missing_snapshot_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(VectorIndex::load(&tmp.path().join("absent.bin")).is_err());
    }
}
