//! Chunking utilities for splitting product documentation into overlapping
//! word windows.
//!
//! Each window becomes one retrievable passage, tagged with the product it
//! documents and the file it came from. Chunking is fully deterministic:
//! the same document and configuration always produce the same sequence.

use serde::{Deserialize, Serialize};

/// Windows with fewer words than this are dropped; only the final,
/// truncated window can fall below it.
pub const MIN_CHUNK_WORDS: usize = 20;

/// A slice of a product document, the atomic unit of retrieval.
///
/// Chunks are created once at index-build time and identified by their
/// position in the chunk sequence, which doubles as the vector index row id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// The window's words rejoined with single spaces.
    pub text: String,
    /// The product this passage documents.
    pub product_id: String,
    /// File name the passage was read from.
    pub source: String,
}

/// Split a document into overlapping word windows.
///
/// The text is split on whitespace; a window of `chunk_size` words advances
/// by `chunk_size - overlap` words each step, starting at word 0. Windows
/// shorter than [`MIN_CHUNK_WORDS`] are discarded, which can only affect the
/// final window.
///
/// # Examples
///
/// ```
/// use prodsense::chunking::chunk_document;
///
/// let doc = (0..400).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
/// let chunks = chunk_document(&doc, "widget-1", "widget-1.txt", 300, 75);
/// assert_eq!(chunks.len(), 2);
/// assert!(chunks[0].text.starts_with("w0 "));
/// assert!(chunks[1].text.starts_with("w225 "));
/// ```
pub fn chunk_document(
    text: &str,
    product_id: &str,
    source: &str,
    chunk_size: usize,
    overlap: usize,
) -> Vec<Chunk> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let stride = chunk_size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + chunk_size).min(words.len());
        if end - start >= MIN_CHUNK_WORDS {
            chunks.push(Chunk {
                text: words[start..end].join(" "),
                product_id: product_id.to_string(),
                source: source.to_string(),
            });
        }
        start += stride;
    }

    chunks
}
