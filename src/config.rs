//! Runtime settings for matching, chunking, and the model providers.
//!
//! Every knob is a plain scalar with a default, overridable through a
//! `PRODSENSE_*` environment variable. Malformed values keep the default and
//! log a warning rather than failing startup.

use tracing::warn;

/// Minimum combined score for a candidate to be reported.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.6;
/// Default number of product candidates returned by the matcher.
pub const DEFAULT_TOP_K_MATCHES: usize = 3;
/// Default number of chunks returned by retrieval.
pub const DEFAULT_TOP_K_RETRIEVAL: usize = 5;
/// Chunk window size in words.
pub const DEFAULT_CHUNK_SIZE: usize = 300;
/// Overlap between consecutive chunks in words.
pub const DEFAULT_CHUNK_OVERLAP: usize = 75;

pub const DEFAULT_TITLE_WEIGHT: f64 = 0.5;
pub const DEFAULT_MODEL_WEIGHT: f64 = 0.3;
pub const DEFAULT_BRAND_WEIGHT: f64 = 0.2;

pub const DEFAULT_EMBED_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variable holding the API key for the remote providers.
pub const API_KEY_ENV_VAR: &str = "PRODSENSE_API_KEY";

#[derive(Debug, Clone)]
pub struct Settings {
    pub min_confidence: f64,
    pub top_k_matches: usize,
    pub top_k_retrieval: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub title_weight: f64,
    pub model_weight: f64,
    pub brand_weight: f64,
    pub embed_model: String,
    pub chat_model: String,
    pub api_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            top_k_matches: DEFAULT_TOP_K_MATCHES,
            top_k_retrieval: DEFAULT_TOP_K_RETRIEVAL,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            title_weight: DEFAULT_TITLE_WEIGHT,
            model_weight: DEFAULT_MODEL_WEIGHT,
            brand_weight: DEFAULT_BRAND_WEIGHT,
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl Settings {
    /// Build settings from defaults plus `PRODSENSE_*` environment overrides.
    ///
    /// Scoring weights are normalized to sum to 1.0 after overrides are
    /// applied, so combined scores stay within `[0, 1]` even for weight
    /// triples that do not sum to one.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        apply(&mut settings.min_confidence, "PRODSENSE_MIN_CONFIDENCE");
        apply(&mut settings.top_k_matches, "PRODSENSE_TOP_K_MATCHES");
        apply(&mut settings.top_k_retrieval, "PRODSENSE_TOP_K_RETRIEVAL");
        apply(&mut settings.chunk_size, "PRODSENSE_CHUNK_SIZE");
        apply(&mut settings.chunk_overlap, "PRODSENSE_CHUNK_OVERLAP");
        apply(&mut settings.title_weight, "PRODSENSE_TITLE_WEIGHT");
        apply(&mut settings.model_weight, "PRODSENSE_MODEL_WEIGHT");
        apply(&mut settings.brand_weight, "PRODSENSE_BRAND_WEIGHT");

        if let Ok(val) = std::env::var("PRODSENSE_EMBED_MODEL") {
            settings.embed_model = val;
        }
        if let Ok(val) = std::env::var("PRODSENSE_CHAT_MODEL") {
            settings.chat_model = val;
        }
        if let Ok(val) = std::env::var("PRODSENSE_API_BASE_URL") {
            settings.api_base_url = val;
        }

        settings.normalize_weights();
        settings
    }

    /// Normalize the scoring weight triple to sum to 1.0.
    ///
    /// A non-positive or non-finite sum restores the default weights.
    pub fn normalize_weights(&mut self) {
        let sum = self.title_weight + self.model_weight + self.brand_weight;
        if !sum.is_finite() || sum <= 0.0 {
            warn!(
                "invalid scoring weights (sum {sum}); restoring defaults"
            );
            self.title_weight = DEFAULT_TITLE_WEIGHT;
            self.model_weight = DEFAULT_MODEL_WEIGHT;
            self.brand_weight = DEFAULT_BRAND_WEIGHT;
            return;
        }
        self.title_weight /= sum;
        self.model_weight /= sum;
        self.brand_weight /= sum;
    }

    /// Word stride between consecutive chunk windows.
    pub fn chunk_stride(&self) -> usize {
        self.chunk_size.saturating_sub(self.chunk_overlap).max(1)
    }
}

/// Override `target` from an environment variable, keeping the current value
/// when the variable is unset or unparseable.
fn apply<T: std::str::FromStr + std::fmt::Display>(target: &mut T, var: &str) {
    let Ok(raw) = std::env::var(var) else {
        return;
    };
    match raw.parse::<T>() {
        Ok(parsed) => *target = parsed,
        Err(_) => warn!("ignoring malformed {var}={raw:?}; keeping {target}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let s = Settings::default();
        assert_eq!(s.min_confidence, 0.6);
        assert_eq!(s.top_k_matches, 3);
        assert_eq!(s.top_k_retrieval, 5);
        assert_eq!(s.chunk_size, 300);
        assert_eq!(s.chunk_overlap, 75);
        assert_eq!(s.chunk_stride(), 225);
    }

    #[test]
    fn default_weights_already_sum_to_one() {
        let mut s = Settings::default();
        s.normalize_weights();
        assert!((s.title_weight - 0.5).abs() < 1e-9);
        assert!((s.model_weight - 0.3).abs() < 1e-9);
        assert!((s.brand_weight - 0.2).abs() < 1e-9);
    }

    #[test]
    fn oversized_weights_are_normalized() {
        let mut s = Settings {
            title_weight: 2.0,
            model_weight: 1.0,
            brand_weight: 1.0,
            ..Settings::default()
        };
        s.normalize_weights();
        let sum = s.title_weight + s.model_weight + s.brand_weight;
        assert!((sum - 1.0).abs() < 1e-9);
        assert!((s.title_weight - 0.5).abs() < 1e-9);
    }

    #[test]
    fn zero_weight_sum_restores_defaults() {
        let mut s = Settings {
            title_weight: 0.0,
            model_weight: 0.0,
            brand_weight: 0.0,
            ..Settings::default()
        };
        s.normalize_weights();
        assert!((s.title_weight - DEFAULT_TITLE_WEIGHT).abs() < 1e-9);
        assert!((s.brand_weight - DEFAULT_BRAND_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn stride_never_reaches_zero() {
        let s = Settings {
            chunk_size: 50,
            chunk_overlap: 50,
            ..Settings::default()
        };
        assert_eq!(s.chunk_stride(), 1);
    }
}
