use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Spec keys that indicate some form of battery capacity or endurance
const BATTERY_SPEC_KEYS: [&str; 4] = ["batteryWh", "batteryHours", "batteryDays", "batteryMah"];

/// A single spec value; catalogs mix numeric and textual specs per category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SpecValue {
    Number(f64),
    Text(String),
}

impl SpecValue {
    /// Returns the numeric value, if this spec is numeric
    pub fn as_number(&self) -> Option<f64> {
        match self {
            SpecValue::Number(n) => Some(*n),
            SpecValue::Text(_) => None,
        }
    }
}

/// Represents a catalog product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique, stable identifier (e.g. "laptop-ultra-13")
    pub id: String,
    pub title: String,
    /// Open category label such as "Laptop" or "Earbuds"
    pub category: String,
    pub brand: String,
    /// Price in US dollars
    #[serde(rename = "priceUSD")]
    pub price_usd: f64,
    /// Short feature labels, most important first
    #[serde(default)]
    pub features: Vec<String>,
    /// Category-specific specs keyed by spec name
    #[serde(default)]
    pub specs: BTreeMap<String, SpecValue>,
    /// Average review rating in [0, 5]
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Product {
    /// Numeric spec lookup; textual specs yield `None`
    pub fn spec_number(&self, key: &str) -> Option<f64> {
        self.specs.get(key).and_then(SpecValue::as_number)
    }

    /// Weight in kilograms (`weightKg`)
    pub fn weight_kg(&self) -> Option<f64> {
        self.spec_number("weightKg")
    }

    /// Memory in gigabytes (`ramGB`)
    pub fn ram_gb(&self) -> Option<f64> {
        self.spec_number("ramGB")
    }

    /// True when any numeric battery spec is present
    pub fn has_battery_spec(&self) -> bool {
        BATTERY_SPEC_KEYS
            .iter()
            .any(|key| self.spec_number(key).is_some())
    }

    /// Case-insensitive category comparison
    pub fn is_category(&self, category: &str) -> bool {
        self.category.eq_ignore_ascii_case(category)
    }

    /// True when any feature label mentions one of `needles` (case-insensitive)
    pub fn has_feature_matching(&self, needles: &[&str]) -> bool {
        self.features.iter().any(|feature| {
            let feature = feature.to_lowercase();
            needles.iter().any(|needle| feature.contains(needle))
        })
    }
}
