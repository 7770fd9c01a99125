use serde::{Deserialize, Serialize};

/// Maximum number of recommendations in a shortlist
pub const MAX_RECOMMENDATIONS: usize = 3;

/// A single ranked recommendation
///
/// `product_id` is not guaranteed to exist in the catalog; consumers must resolve it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub product_id: String,
    /// Certainty in [0, 1]
    pub confidence: f64,
    pub reason: String,
}

impl Recommendation {
    /// Creates a recommendation, clamping confidence into [0, 1]
    pub fn new(product_id: impl Into<String>, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            confidence: clamp_confidence(confidence),
            reason: reason.into(),
        }
    }
}

/// Clamps a confidence value into [0, 1]; NaN maps to 0
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Outcome of one advisor submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorResponse {
    /// Highest-ranked first, at most three entries
    pub recommendations: Vec<Recommendation>,
    /// Provenance label (remote model name or heuristic fallback)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Unparsed model output, kept for debugging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}
