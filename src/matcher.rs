//! Fuzzy matching of extracted text against the product catalog.
//!
//! Every catalog row is scored with three token-set similarities (title,
//! model, brand) which are blended into a single confidence score. Token-set
//! similarity is order- and duplicate-insensitive: a catalog field whose
//! tokens all appear in the extracted text scores 1.0 no matter how much
//! surrounding noise the extraction picked up.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::{catalog::Catalog, config::Settings};

/// Sub-scores above this threshold are reported as evidence and contribute
/// to the blended confidence score.
pub const EVIDENCE_THRESHOLD: f64 = 0.6;

/// Characters of raw input quoted in the generic evidence line.
const EVIDENCE_TEXT_PREFIX: usize = 50;

/// A candidate product match with confidence score and evidence.
#[derive(Debug, Clone, Serialize)]
pub struct ProductCandidate {
    pub product_id: String,
    pub title: String,
    /// Blended confidence in `[0, 1]`, rounded to three decimals.
    pub score: f64,
    /// Human-readable justification lines, one per matching field.
    pub evidence: Vec<String>,
}

/// Matches raw extracted text to catalog products.
///
/// Read-only after construction; safe to share across request contexts.
#[derive(Debug)]
pub struct Matcher {
    catalog: Catalog,
    settings: Settings,
}

impl Matcher {
    pub fn new(catalog: Catalog, settings: Settings) -> Self {
        Self { catalog, settings }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Whether the product id exists in the catalog.
    ///
    /// Always false on a matcher constructed over an empty (or failed-to-
    /// load) catalog.
    pub fn validate_product_id(&self, product_id: &str) -> bool {
        self.catalog.contains(product_id)
    }

    pub fn product(&self, product_id: &str) -> Option<&crate::catalog::CatalogEntry> {
        self.catalog.get(product_id)
    }

    /// Score `text` against every catalog row and return the best matches.
    ///
    /// Rows below the configured minimum confidence are dropped; the rest
    /// are sorted by score descending (ties keep catalog order) and
    /// truncated to `top_k`. Empty input or an empty catalog yields an
    /// empty result, not an error.
    pub fn find_matches(&self, text: &str, top_k: usize) -> Vec<ProductCandidate> {
        if text.trim().is_empty() || self.catalog.is_empty() {
            return Vec::new();
        }

        let mut candidates = Vec::new();

        for entry in self.catalog.iter() {
            let fields = [
                ("Title", &entry.title, self.settings.title_weight),
                ("Model", &entry.model, self.settings.model_weight),
                ("Brand", &entry.brand, self.settings.brand_weight),
            ];

            let scored: Vec<(&str, &String, f64, f64)> = fields
                .iter()
                .map(|&(label, value, weight)| {
                    (label, value, weight, token_set_ratio(text, value))
                })
                .collect();

            // Confidence blends the fields that produced evidence; weights
            // are renormalized over that subset so a clean single-field
            // match is not diluted by fields absent from the extraction.
            // With no evidence the plain three-way blend applies.
            let evidencing: Vec<_> = scored
                .iter()
                .filter(|(_, _, _, score)| *score > EVIDENCE_THRESHOLD)
                .collect();

            let combined = if evidencing.is_empty() {
                scored.iter().map(|(_, _, w, s)| w * s).sum::<f64>()
            } else {
                let weight_sum: f64 =
                    evidencing.iter().map(|(_, _, w, _)| w).sum();
                evidencing.iter().map(|(_, _, w, s)| w * s).sum::<f64>()
                    / weight_sum
            };

            if combined < self.settings.min_confidence {
                continue;
            }

            let mut evidence: Vec<String> = evidencing
                .iter()
                .map(|(label, value, _, score)| {
                    format!("{label} match: {value} ({score:.2})")
                })
                .collect();
            if evidence.is_empty() {
                evidence.push(format!(
                    "Extracted text: {}",
                    text.chars().take(EVIDENCE_TEXT_PREFIX).collect::<String>()
                ));
            }

            candidates.push(ProductCandidate {
                product_id: entry.product_id.clone(),
                title: entry.title.clone(),
                score: (combined * 1000.0).round() / 1000.0,
                evidence,
            });
        }

        // Stable sort keeps catalog order for equal scores.
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(top_k);
        candidates
    }
}

/// Normalize and split text into lowercase alphanumeric tokens.
///
/// Non-alphanumeric characters act as separators, so `"Model: A3105!"`
/// tokenizes the same as `"model a3105"`.
fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Token-set similarity between two texts, in `[0, 1]`.
///
/// Both sides are tokenized into sets (order- and duplicate-insensitive).
/// When one side's tokens are fully contained in the other's, the score is
/// 1.0 regardless of surrounding noise. Otherwise the score is the best
/// normalized indel ratio among the sorted intersection and the two
/// intersection-plus-difference strings.
///
/// # Examples
///
/// ```
/// use prodsense::matcher::token_set_ratio;
///
/// // Containment beats noise and word order.
/// let score = token_set_ratio("sale! iphone 15 pro max today", "iPhone 15 Pro Max");
/// assert_eq!(score, 1.0);
///
/// assert_eq!(token_set_ratio("", "anything"), 0.0);
/// ```
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let sect: Vec<&str> =
        tokens_a.intersection(&tokens_b).map(String::as_str).collect();
    let diff_ab: Vec<&str> =
        tokens_a.difference(&tokens_b).map(String::as_str).collect();
    let diff_ba: Vec<&str> =
        tokens_b.difference(&tokens_a).map(String::as_str).collect();

    if !sect.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 1.0;
    }

    let sect_joined = sect.join(" ");
    let combined_ab = join_parts(&sect_joined, &diff_ab);
    let combined_ba = join_parts(&sect_joined, &diff_ba);

    [
        indel_ratio(&sect_joined, &combined_ab),
        indel_ratio(&sect_joined, &combined_ba),
        indel_ratio(&combined_ab, &combined_ba),
    ]
    .into_iter()
    .fold(0.0, f64::max)
}

fn join_parts(sect: &str, diff: &[&str]) -> String {
    let diff_joined = diff.join(" ");
    if sect.is_empty() {
        diff_joined
    } else if diff_joined.is_empty() {
        sect.to_string()
    } else {
        format!("{sect} {diff_joined}")
    }
}

/// Normalized indel similarity: `1 - distance / (len_a + len_b)` over
/// characters, where distance counts insertions and deletions only.
fn indel_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let distance = total - 2 * lcs_len(&a, &b);
    1.0 - distance as f64 / total as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
