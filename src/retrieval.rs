//! The retrieval coordinator: builds, persists, and queries the vector
//! index over product documentation.
//!
//! The index state (chunks paired with their vectors) sits behind a
//! read-write lock and is only ever replaced wholesale: a rebuild computes
//! and persists the complete new state before swapping it in, so concurrent
//! readers observe either the old index or the new one, never a mix.

use std::{path::PathBuf, sync::Arc};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    chunking::{Chunk, chunk_document},
    config::Settings,
    docs::load_documents,
    embedding::Embedder,
    error::{Error, Result},
    index::VectorIndex,
};

/// Nearest-neighbor snapshot file, companion to [`CHUNKS_FILE`].
pub const VECTORS_FILE: &str = "vectors.bin";
/// Chunk metadata snapshot, ordered to match the vector rows.
pub const CHUNKS_FILE: &str = "chunks.json";

/// How many extra neighbors to fetch when post-filtering by product.
const OVERFETCH_FACTOR: usize = 5;

/// A retrieved chunk with its distance to the query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Chunk metadata persisted alongside the vector snapshot.
///
/// `model` records which embedding model produced the vectors; a snapshot
/// built with a different model than the active one is stale and gets
/// rebuilt instead of silently serving mismatched distances.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotMeta {
    model: String,
    chunks: Vec<Chunk>,
}

/// The paired vectors and chunk metadata; immutable once constructed.
struct IndexState {
    index: VectorIndex,
    chunks: Vec<Chunk>,
}

/// Coordinates query embedding, nearest-neighbor search, and product
/// filtering over the chunk index.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    docs_dir: PathBuf,
    index_dir: PathBuf,
    settings: Settings,
    state: RwLock<Option<Arc<IndexState>>>,
    // Serializes rebuilds; never held while answering queries.
    rebuild_lock: Mutex<()>,
}

impl Retriever {
    /// Construct a retriever, loading the persisted snapshot if one exists.
    ///
    /// Absent or corrupt artifacts leave the retriever uninitialized (every
    /// query returns empty) with the reason logged; [`Self::ensure_index`]
    /// or [`Self::build_index`] repairs it.
    pub fn open(
        embedder: Arc<dyn Embedder>,
        docs_dir: PathBuf,
        index_dir: PathBuf,
        settings: Settings,
    ) -> Self {
        let retriever = Self {
            embedder,
            docs_dir,
            index_dir,
            settings,
            state: RwLock::new(None),
            rebuild_lock: Mutex::new(()),
        };

        match retriever.load_snapshot() {
            Ok(state) => {
                info!(
                    "loaded index snapshot: {} chunks, dimension {}",
                    state.chunks.len(),
                    state.index.dimension()
                );
                *retriever.state.write() = Some(Arc::new(state));
            }
            Err(err) => {
                warn!("index snapshot unavailable, starting empty: {err}");
            }
        }

        retriever
    }

    fn vectors_path(&self) -> PathBuf {
        self.index_dir.join(VECTORS_FILE)
    }

    fn chunks_path(&self) -> PathBuf {
        self.index_dir.join(CHUNKS_FILE)
    }

    fn load_snapshot(&self) -> Result<IndexState> {
        let meta_bytes = std::fs::read(self.chunks_path())?;
        let meta: SnapshotMeta = serde_json::from_slice(&meta_bytes)?;
        let index = VectorIndex::load(&self.vectors_path())?;

        if index.len() != meta.chunks.len() {
            return Err(Error::Config(format!(
                "snapshot mismatch: {} vectors vs {} chunks",
                index.len(),
                meta.chunks.len()
            )));
        }
        if meta.model != self.embedder.model_id() {
            return Err(Error::Config(format!(
                "snapshot was built with model {:?}, active model is {:?}",
                meta.model,
                self.embedder.model_id()
            )));
        }

        Ok(IndexState {
            index,
            chunks: meta.chunks,
        })
    }

    fn persist_snapshot(&self, state: &IndexState) -> Result<()> {
        let meta = SnapshotMeta {
            model: self.embedder.model_id().to_string(),
            chunks: state.chunks.clone(),
        };

        // Write both artifacts to temporaries first, then rename, so a
        // crash mid-write leaves either the old pair or a detectable
        // mismatch, not a silently half-updated snapshot.
        let chunks_tmp = self.chunks_path().with_extension("json.tmp");
        let vectors_tmp = self.vectors_path().with_extension("bin.tmp");

        std::fs::write(&chunks_tmp, serde_json::to_vec(&meta)?)?;
        state.index.save(&vectors_tmp)?;

        std::fs::rename(&chunks_tmp, self.chunks_path())?;
        std::fs::rename(&vectors_tmp, self.vectors_path())?;
        Ok(())
    }

    /// Whether the index currently holds any chunks.
    pub fn is_initialized(&self) -> bool {
        self.state.read().is_some()
    }

    /// Number of indexed chunks (0 when uninitialized).
    pub fn chunk_count(&self) -> usize {
        self.state
            .read()
            .as_ref()
            .map_or(0, |state| state.chunks.len())
    }

    /// Embedding model the retriever is running with.
    pub fn model_id(&self) -> &str {
        self.embedder.model_id()
    }

    /// Rebuild the index if it is uninitialized; a no-op otherwise.
    pub fn ensure_index(&self) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }
        self.build_index().map(|_| ())
    }

    /// Rebuild the whole index from the documents directory and persist it.
    ///
    /// Idempotent; replaces the in-memory state atomically from the
    /// perspective of concurrent readers. Returns the number of indexed
    /// chunks. Zero documents (or a missing docs directory) is a valid
    /// terminal state: the index is left uninitialized and queries return
    /// empty results.
    pub fn build_index(&self) -> Result<usize> {
        let _rebuild_guard = self.rebuild_lock.lock();

        let documents = load_documents(&self.docs_dir);
        let chunks: Vec<Chunk> = documents
            .iter()
            .flat_map(|doc| {
                chunk_document(
                    &doc.text,
                    &doc.product_id,
                    &doc.source,
                    self.settings.chunk_size,
                    self.settings.chunk_overlap,
                )
            })
            .collect();

        info!(
            "chunked {} documents into {} chunks",
            documents.len(),
            chunks.len()
        );

        if chunks.is_empty() {
            warn!("no chunks produced; index left uninitialized");
            *self.state.write() = None;
            return Ok(0);
        }

        let texts: Vec<String> =
            chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = self.embedder.embed(&texts)?;
        let index = VectorIndex::from_embeddings(&embeddings)?;

        let state = IndexState { index, chunks };
        if let Err(err) = self.persist_snapshot(&state) {
            // The in-memory index is still good; the snapshot will be
            // rebuilt on the next startup instead of loaded.
            warn!("failed to persist index snapshot: {err}");
        }

        let count = state.chunks.len();
        *self.state.write() = Some(Arc::new(state));
        info!("index rebuilt: {count} chunks");
        Ok(count)
    }

    /// Retrieve the `top_k` chunks most relevant to `query`, optionally
    /// restricted to one product.
    ///
    /// With a product filter the index is over-fetched (5x) to compensate
    /// for filtered-out neighbors; fewer than `top_k` results may still be
    /// returned. An empty query, an uninitialized index, or an embedding
    /// failure all yield an empty result, never an error.
    pub fn retrieve(
        &self,
        query: &str,
        product_id: Option<&str>,
        top_k: usize,
    ) -> Vec<ScoredChunk> {
        let Some(state) = self.state.read().clone() else {
            return Vec::new();
        };
        if query.trim().is_empty() || top_k == 0 {
            return Vec::new();
        }

        let query_vector = match self.embedder.embed(&[query.to_string()]) {
            Ok(mut vectors) if !vectors.is_empty() => vectors.remove(0),
            Ok(_) => return Vec::new(),
            Err(err) => {
                warn!("query embedding failed: {err}");
                return Vec::new();
            }
        };

        let search_k = if product_id.is_some() {
            top_k.saturating_mul(OVERFETCH_FACTOR)
        } else {
            top_k
        };

        let mut results = Vec::with_capacity(top_k);
        for (row, distance) in state.index.search(&query_vector, search_k) {
            let chunk = &state.chunks[row];
            if let Some(wanted) = product_id
                && chunk.product_id != wanted
            {
                continue;
            }
            results.push(ScoredChunk {
                chunk: chunk.clone(),
                distance,
            });
            if results.len() >= top_k {
                break;
            }
        }
        results
    }
}
