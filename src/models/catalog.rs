use std::{collections::HashSet, path::Path, sync::Arc};

use serde_json::json;

use super::Product;
use crate::error::{AppError, AppResult};

/// Immutable, cheaply cloneable product catalog
///
/// Passed explicitly into the scorer, the remote provider and the advisor so tests
/// can substitute their own product sets.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Arc<[Product]>,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate ids and out-of-range prices or ratings
    pub fn new(products: Vec<Product>) -> AppResult<Self> {
        let mut seen = HashSet::new();
        for product in &products {
            if !seen.insert(product.id.as_str()) {
                return Err(AppError::InvalidCatalog(format!(
                    "duplicate product id '{}'",
                    product.id
                )));
            }
            if product.price_usd.is_nan() || product.price_usd < 0.0 {
                return Err(AppError::InvalidCatalog(format!(
                    "product '{}' has a negative price",
                    product.id
                )));
            }
            if !(0.0..=5.0).contains(&product.rating) {
                return Err(AppError::InvalidCatalog(format!(
                    "product '{}' has rating {} outside [0, 5]",
                    product.id, product.rating
                )));
            }
        }

        Ok(Self {
            products: products.into(),
        })
    }

    /// Loads a catalog from a JSON array of products
    pub fn from_json_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::InvalidCatalog(format!("failed to read {}: {}", path.display(), e))
        })?;
        let products: Vec<Product> = serde_json::from_str(&contents).map_err(|e| {
            AppError::InvalidCatalog(format!("failed to parse {}: {}", path.display(), e))
        })?;

        let catalog = Self::new(products)?;
        tracing::info!(
            path = %path.display(),
            products = catalog.len(),
            "Loaded catalog from file"
        );
        Ok(catalog)
    }

    /// The built-in six product sample catalog
    pub fn sample() -> Self {
        let products: Vec<Product> = serde_json::from_value(json!([
            {
                "id": "laptop-ultra-13",
                "title": "AeroBook Ultra 13",
                "category": "Laptop",
                "brand": "AeroTech",
                "priceUSD": 1199,
                "features": ["lightweight", "long battery life", "backlit keyboard", "Wi-Fi 6"],
                "specs": { "weightKg": 1.1, "screenInches": 13.3, "batteryWh": 60, "ramGB": 16, "storageGB": 512 },
                "rating": 4.6,
                "thumbnail": "https://picsum.photos/seed/aerobook/200",
                "url": "https://example.com/aerobook-ultra-13"
            },
            {
                "id": "laptop-travel-14",
                "title": "Voyager 14 Travel",
                "category": "Laptop",
                "brand": "Voyage",
                "priceUSD": 899,
                "features": ["portable", "fast charge", "fingerprint reader"],
                "specs": { "weightKg": 1.25, "screenInches": 14, "batteryWh": 50, "ramGB": 8, "storageGB": 256 },
                "rating": 4.3,
                "thumbnail": "https://picsum.photos/seed/voyager14/200",
                "url": "https://example.com/voyager-14-travel"
            },
            {
                "id": "laptop-pro-16",
                "title": "Creator Pro 16",
                "category": "Laptop",
                "brand": "CreateX",
                "priceUSD": 1999,
                "features": ["discrete GPU", "color-accurate display", "Thunderbolt 4"],
                "specs": { "weightKg": 2.1, "screenInches": 16, "batteryWh": 80, "ramGB": 32, "storageGB": 1024 },
                "rating": 4.8,
                "thumbnail": "https://picsum.photos/seed/creatorpro16/200",
                "url": "https://example.com/creator-pro-16"
            },
            {
                "id": "buds-noise-cancel",
                "title": "QuietBuds 2",
                "category": "Earbuds",
                "brand": "Silencio",
                "priceUSD": 179,
                "features": ["ANC", "wireless charging", "multipoint"],
                "specs": { "batteryHours": 8, "waterResistance": "IPX4" },
                "rating": 4.5,
                "thumbnail": "https://picsum.photos/seed/quietbuds/200",
                "url": "https://example.com/quietbuds-2"
            },
            {
                "id": "phone-compact",
                "title": "Pixelate Mini",
                "category": "Smartphone",
                "brand": "Photon",
                "priceUSD": 599,
                "features": ["compact", "great camera", "clean OS"],
                "specs": { "screenInches": 5.9, "batteryMah": 4300, "storageGB": 128, "ramGB": 8 },
                "rating": 4.4,
                "thumbnail": "https://picsum.photos/seed/pixelatemini/200",
                "url": "https://example.com/pixelate-mini"
            },
            {
                "id": "watch-fitness",
                "title": "FitTrack S",
                "category": "Smartwatch",
                "brand": "Tracko",
                "priceUSD": 229,
                "features": ["GPS", "sleep tracking", "waterproof"],
                "specs": { "batteryDays": 5, "waterResistance": "5ATM" },
                "rating": 4.2,
                "thumbnail": "https://picsum.photos/seed/fittracks/200",
                "url": "https://example.com/fittrack-s"
            }
        ]))
        .expect("sample catalog is valid");

        Self {
            products: products.into(),
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Looks up a product by id
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_catalog() {
        let catalog = Catalog::sample();
        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog.products()[0].id, "laptop-ultra-13");
        assert!(catalog.contains("watch-fitness"));
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_sample_catalog_passes_validation() {
        let products = Catalog::sample().products().to_vec();
        assert!(Catalog::new(products).is_ok());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let product = Catalog::sample().products()[0].clone();
        let result = Catalog::new(vec![product.clone(), product]);
        assert!(matches!(result, Err(AppError::InvalidCatalog(_))));
    }

    #[test]
    fn test_out_of_range_rating_rejected() {
        let mut product = Catalog::sample().products()[0].clone();
        product.rating = 5.5;
        assert!(matches!(
            Catalog::new(vec![product]),
            Err(AppError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut product = Catalog::sample().products()[0].clone();
        product.price_usd = -1.0;
        assert!(matches!(
            Catalog::new(vec![product]),
            Err(AppError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = Catalog::from_json_file("/definitely/not/here.json");
        assert!(matches!(result, Err(AppError::InvalidCatalog(_))));
    }
}
