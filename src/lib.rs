//! prodsense - product identification and documentation Q&A from noisy
//! extracted text.
//!
//! prodsense matches raw text (typically OCR output produced by an external
//! tool) against a product catalog using weighted token-set similarity, and
//! answers questions about the matched product by retrieving embedded
//! documentation chunks from a persisted vector index.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use prodsense::{
//!     Catalog, DataDir, Matcher, Retriever, Settings,
//!     embedding::embedder_from_settings,
//!     recognize::recognize,
//! };
//!
//! let data_dir = DataDir::resolve(None).unwrap();
//! let settings = Settings::from_env();
//!
//! let catalog = Catalog::load_or_empty(&data_dir.catalog_csv());
//! let matcher = Matcher::new(catalog, settings.clone());
//!
//! let recognition = recognize(&matcher, "iPhone 15 Pro Max A3105", 3);
//! for candidate in &recognition.candidates {
//!     println!("{} (score: {:.3})", candidate.product_id, candidate.score);
//! }
//!
//! let retriever = Retriever::open(
//!     embedder_from_settings(&settings),
//!     data_dir.docs_dir(),
//!     data_dir.index_dir().unwrap(),
//!     settings.clone(),
//! );
//! retriever.ensure_index().unwrap();
//! for result in retriever.retrieve("battery capacity", None, 5) {
//!     println!("[{:.3}] {}", result.distance, result.chunk.source);
//! }
//! ```

pub mod answer;
pub mod catalog;
pub mod chunking;
pub mod config;
pub mod data_dir;
pub mod docs;
pub mod embedding;
pub mod error;
pub mod index;
pub mod matcher;
pub mod qa;
pub mod recognize;
pub mod retrieval;

pub use answer::AnswerClient;
pub use catalog::{Catalog, CatalogEntry};
pub use chunking::Chunk;
pub use config::Settings;
pub use data_dir::DataDir;
pub use error::{Error, Result};
pub use matcher::{Matcher, ProductCandidate};
pub use retrieval::Retriever;
