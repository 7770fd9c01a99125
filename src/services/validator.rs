//! Turns raw model output into typed recommendations.
//!
//! Malformed output is a recovered condition: it is logged and yields an empty list,
//! which the advisor treats as a signal to fall back to heuristic scoring.

use serde_json::Value;
use thiserror::Error;

use crate::models::Recommendation;

/// Reasons raw model output could not be used at all
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("model returned no text")]
    MissingText,
    #[error("model output is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("model output has no recommendations array")]
    MissingRecommendations,
}

/// Parses raw model text into recommendations, never failing.
///
/// Entries missing a string `productId`, numeric `confidence` or string `reason` are
/// dropped. Confidence is clamped into [0, 1]. Model order is preserved.
pub fn normalize(raw_text: Option<&str>) -> Vec<Recommendation> {
    match validate(raw_text) {
        Ok(recommendations) => recommendations,
        Err(ValidationError::MissingText) => Vec::new(),
        Err(e) => {
            tracing::debug!(error = %e, "Discarding unusable model output");
            Vec::new()
        }
    }
}

/// Like [`normalize`], but reports why the output was unusable.
///
/// An `Ok` result may still be empty when the model returned no valid entries.
pub fn validate(raw_text: Option<&str>) -> Result<Vec<Recommendation>, ValidationError> {
    let raw_text = raw_text.ok_or(ValidationError::MissingText)?;
    let parsed: Value = serde_json::from_str(strip_code_fence(raw_text))?;

    let entries = parsed
        .get("recommendations")
        .and_then(Value::as_array)
        .ok_or(ValidationError::MissingRecommendations)?;

    let recommendations: Vec<Recommendation> = entries.iter().filter_map(parse_entry).collect();

    let dropped = entries.len() - recommendations.len();
    if dropped > 0 {
        tracing::debug!(dropped, kept = recommendations.len(), "Dropped malformed recommendation entries");
    }

    Ok(recommendations)
}

fn parse_entry(entry: &Value) -> Option<Recommendation> {
    let product_id = entry.get("productId")?.as_str()?;
    let confidence = entry.get("confidence")?.as_f64()?;
    let reason = entry.get("reason")?.as_str()?;
    Some(Recommendation::new(product_id, confidence, reason))
}

/// Strips a surrounding Markdown code fence (```json ... ```), if present
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the optional language tag on the opening line
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_text() {
        assert!(normalize(None).is_empty());
    }

    #[test]
    fn test_non_json_text() {
        assert!(normalize(Some("Sure! Here are my picks: the laptop.")).is_empty());
        assert!(normalize(Some("")).is_empty());
    }

    #[test]
    fn test_json_without_recommendations_array() {
        assert!(normalize(Some(r#"{"picks": []}"#)).is_empty());
        assert!(normalize(Some(r#"{"recommendations": "laptop-ultra-13"}"#)).is_empty());
        assert!(normalize(Some(r#"[1, 2, 3]"#)).is_empty());
    }

    #[test]
    fn test_entries_missing_fields_are_dropped() {
        let raw = r#"{"recommendations": [
            {"productId": "a", "confidence": 0.5},
            {"productId": 7, "confidence": 0.5, "reason": "numeric id"},
            {"confidence": 0.5, "reason": "no id"},
            {"productId": "b", "confidence": "high", "reason": "string confidence"}
        ]}"#;
        assert!(normalize(Some(raw)).is_empty());
    }

    #[test]
    fn test_valid_entries_kept_in_model_order() {
        let raw = r#"{"recommendations": [
            {"productId": "watch-fitness", "confidence": 0.4, "reason": "tracks sleep"},
            {"productId": "broken"},
            {"productId": "laptop-ultra-13", "confidence": 0.9, "reason": "light"}
        ]}"#;
        let recs = normalize(Some(raw));
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].product_id, "watch-fitness");
        assert_eq!(recs[0].reason, "tracks sleep");
        assert_eq!(recs[1].product_id, "laptop-ultra-13");
    }

    #[test]
    fn test_confidence_clamped() {
        let raw = r#"{"recommendations": [
            {"productId": "a", "confidence": 1.7, "reason": "too sure"},
            {"productId": "b", "confidence": -0.3, "reason": "negative"}
        ]}"#;
        let recs = normalize(Some(raw));
        assert_eq!(recs[0].confidence, 1.0);
        assert_eq!(recs[1].confidence, 0.0);
    }

    #[test]
    fn test_integer_confidence_accepted() {
        let raw = r#"{"recommendations": [{"productId": "a", "confidence": 1, "reason": "r"}]}"#;
        assert_eq!(normalize(Some(raw))[0].confidence, 1.0);
    }

    #[test]
    fn test_code_fenced_output() {
        let raw = "```json\n{\"recommendations\": [{\"productId\": \"a\", \"confidence\": 0.5, \"reason\": \"r\"}]}\n```";
        let recs = normalize(Some(raw));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].product_id, "a");
    }

    #[test]
    fn test_validate_reports_recovered_errors() {
        assert!(matches!(validate(None), Err(ValidationError::MissingText)));
        assert!(matches!(
            validate(Some("not json")),
            Err(ValidationError::Malformed(_))
        ));
        assert!(matches!(
            validate(Some("{}")),
            Err(ValidationError::MissingRecommendations)
        ));
        assert!(matches!(
            validate(Some(r#"{"recommendations": []}"#)),
            Ok(recs) if recs.is_empty()
        ));
    }
}
