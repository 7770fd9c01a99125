//! Deterministic fallback scorer
//!
//! Ranks catalog products against a free-text query using keyword and numeric signals.
//! Used whenever the remote advisor yields nothing usable.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Product, Recommendation, MAX_RECOMMENDATIONS};

const FALLBACK_REASON: &str = "well-reviewed";
const LIGHTWEIGHT_MAX_KG: f64 = 1.5;
const PERFORMANCE_MIN_RAM_GB: f64 = 16.0;
const RATING_WEIGHT: f64 = 0.25;
const CONFIDENCE_SCALE: f64 = 5.0;

static BUDGET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:(?:under|below|less than|budget(?:\s+of)?|around|about)\s*\$?\s*|\$\s*)(\d[\d,]*)",
    )
    .expect("budget pattern is valid")
});

static CATEGORY_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("laptop", r"\b(?:laptops?|notebooks?|ultrabooks?)\b"),
        ("smartphone", r"\b(?:phones?|smartphones?|mobiles?)\b"),
        ("earbuds", r"\b(?:earbuds?|earphones?|headphones?)\b"),
        ("smartwatch", r"\b(?:watch(?:es)?|smartwatch(?:es)?)\b"),
    ]
    .into_iter()
    .map(|(category, pattern)| {
        (
            category,
            Regex::new(pattern).expect("category pattern is valid"),
        )
    })
    .collect()
});

static PORTABILITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"lightweight|travel|portable|compact").expect("valid pattern"));

static PERFORMANCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"gaming|video editing|render|heavy duty|powerful|creator|graphics")
        .expect("valid pattern")
});

static FITNESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"fitness|running|workout|health|sleep tracking").expect("valid pattern"));

/// Signals extracted from a user query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySignals {
    /// Maximum price in dollars, if the query names one
    pub budget: Option<u64>,
    /// Lowercase category names ("laptop", "smartphone", "earbuds", "smartwatch")
    pub categories: BTreeSet<&'static str>,
    pub wants_portability: bool,
    pub wants_performance: bool,
    pub wants_fitness: bool,
    pub mentions_battery: bool,
    pub mentions_camera: bool,
    pub mentions_noise: bool,
}

impl QuerySignals {
    /// Extracts signals from a query (case-insensitive)
    pub fn extract(query: &str) -> Self {
        let q = query.to_lowercase();

        let budget = BUDGET_RE
            .captures(&q)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().replace(',', "").parse::<u64>().ok());

        let categories = CATEGORY_PATTERNS
            .iter()
            .filter(|(_, re)| re.is_match(&q))
            .map(|(category, _)| *category)
            .collect();

        Self {
            budget,
            categories,
            wants_portability: PORTABILITY_RE.is_match(&q),
            wants_performance: PERFORMANCE_RE.is_match(&q),
            wants_fitness: FITNESS_RE.is_match(&q),
            mentions_battery: q.contains("battery"),
            mentions_camera: q.contains("camera"),
            mentions_noise: q.contains("noise"),
        }
    }
}

/// Additive score of one product plus the reasons that contributed to it
#[derive(Debug, Clone, PartialEq)]
struct ProductScore<'a> {
    product: &'a Product,
    score: f64,
    reasons: Vec<String>,
}

fn score_product<'a>(signals: &QuerySignals, product: &'a Product) -> ProductScore<'a> {
    let mut score = 0.0;
    let mut reasons = Vec::new();

    if !signals.categories.is_empty() {
        let category = product.category.to_lowercase();
        if signals.categories.contains(category.as_str()) {
            score += 1.5;
            reasons.push(format!("matches {} category", category));
        } else {
            score -= 1.0;
        }
    }

    if let Some(budget) = signals.budget {
        if product.price_usd <= budget as f64 {
            score += 1.0;
            reasons.push(format!("within ${} budget", budget));
        } else {
            score -= 1.0;
        }
    }

    if signals.wants_portability {
        if let Some(weight) = product.weight_kg().filter(|w| *w < LIGHTWEIGHT_MAX_KG) {
            score += 1.2;
            reasons.push(format!("lightweight ({} kg)", weight));
        }
    }

    if signals.mentions_battery && product.has_battery_spec() {
        score += 1.0;
        reasons.push("good battery".to_string());
    }

    if signals.mentions_camera && product.is_category("smartphone") {
        score += 1.0;
        reasons.push("good camera".to_string());
    }

    if signals.mentions_noise && product.is_category("earbuds") {
        score += 1.0;
        reasons.push("noise cancelling".to_string());
    }

    if signals.wants_performance && product.is_category("laptop") {
        if product
            .ram_gb()
            .is_some_and(|ram| ram >= PERFORMANCE_MIN_RAM_GB)
        {
            score += 0.8;
            reasons.push("16GB+ RAM".to_string());
        }
        if product.has_feature_matching(&["gpu", "graphics"]) {
            score += 0.8;
            reasons.push("dedicated graphics".to_string());
        }
    }

    if signals.wants_fitness && product.is_category("smartwatch") {
        score += 1.0;
        reasons.push("fitness tracking".to_string());
    }

    score += product.rating * RATING_WEIGHT;

    ProductScore {
        product,
        score,
        reasons,
    }
}

/// Ranks `catalog` against `query` and returns at most three recommendations.
///
/// Pure and deterministic; ties keep catalog order.
pub fn score(query: &str, catalog: &[Product]) -> Vec<Recommendation> {
    let signals = QuerySignals::extract(query);

    let mut scored: Vec<ProductScore<'_>> = catalog
        .iter()
        .map(|product| score_product(&signals, product))
        .collect();

    // sort_by is stable, which keeps catalog order on ties
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));

    let recommendations: Vec<Recommendation> = scored
        .into_iter()
        .take(MAX_RECOMMENDATIONS)
        .map(|s| {
            let reason = if s.reasons.is_empty() {
                FALLBACK_REASON.to_string()
            } else {
                s.reasons.join(", ")
            };
            Recommendation::new(
                s.product.id.clone(),
                (s.score / CONFIDENCE_SCALE).min(1.0),
                reason,
            )
        })
        .collect();

    tracing::debug!(
        budget = ?signals.budget,
        categories = ?signals.categories,
        candidates = catalog.len(),
        selected = recommendations.len(),
        "Heuristic scoring completed"
    );

    recommendations
}
