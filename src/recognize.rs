//! The recognition pipeline: extracted text in, ranked product candidates
//! out.

use serde::Serialize;

use crate::matcher::{Matcher, ProductCandidate};

/// Canned answer when a question was asked but no product was recognized.
pub const UNRECOGNIZED_ANSWER: &str =
    "Cannot answer question: product not recognized from the extracted text.";

/// Result of matching extracted text against the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct Recognition {
    pub candidates: Vec<ProductCandidate>,
    /// Product id of the highest-scoring candidate, if any.
    pub best_product_id: Option<String>,
}

/// Match extracted text against the catalog.
///
/// Empty text short-circuits to an empty recognition without touching the
/// matcher, mirroring how a failed extraction degrades upstream.
pub fn recognize(matcher: &Matcher, text: &str, top_k: usize) -> Recognition {
    if text.trim().is_empty() {
        return Recognition {
            candidates: Vec::new(),
            best_product_id: None,
        };
    }

    let candidates = matcher.find_matches(text, top_k);
    let best_product_id =
        candidates.first().map(|c| c.product_id.clone());

    Recognition {
        candidates,
        best_product_id,
    }
}

/// Human-readable recognition output.
pub fn format_human(recognition: &Recognition) {
    if recognition.candidates.is_empty() {
        println!("No matching products found.");
        return;
    }

    for (i, candidate) in recognition.candidates.iter().enumerate() {
        println!(
            "{:>3}. [{:.3}] {}",
            i + 1,
            candidate.score,
            candidate.product_id
        );
        println!("     {}", candidate.title);
        for line in &candidate.evidence {
            println!("     {line}");
        }
    }
}

/// JSON recognition output.
pub fn format_json(recognition: &Recognition) -> crate::error::Result<()> {
    println!("{}", serde_json::to_string(recognition)?);
    Ok(())
}
