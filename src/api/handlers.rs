use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::{AdvisorResponse, Catalog, Product};
use crate::services::{AdvisorSnapshot, AdvisorState, FallbackReason, IgnoreReason, Submission};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct AdviseRequest {
    pub query: String,
}

/// A recommendation resolved against the catalog
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationView {
    pub product_id: String,
    pub confidence: f64,
    pub reason: String,
    pub product: Product,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviseResponse {
    pub state: AdvisorState,
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
    pub recommendations: Vec<RecommendationView>,
}

impl AdviseResponse {
    /// Resolves recommendations against the catalog, dropping unknown product ids
    fn resolve(
        state: AdvisorState,
        response: AdvisorResponse,
        fallback_reason: Option<FallbackReason>,
        catalog: &Catalog,
    ) -> Self {
        let total = response.recommendations.len();
        let recommendations: Vec<RecommendationView> = response
            .recommendations
            .into_iter()
            .filter_map(|rec| {
                let product = catalog.get(&rec.product_id)?.clone();
                Some(RecommendationView {
                    product_id: rec.product_id,
                    confidence: rec.confidence,
                    reason: rec.reason,
                    product,
                })
            })
            .collect();

        if recommendations.len() < total {
            tracing::warn!(
                dropped = total - recommendations.len(),
                "Dropped recommendations referencing unknown products"
            );
        }

        Self {
            state,
            model: response.model,
            raw_text: response.raw_text,
            fallback_reason,
            recommendations,
        }
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Get all catalog products
pub async fn get_products(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(state.catalog().products().to_vec())
}

/// Get a single product by id
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    state
        .catalog()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Product '{}' not found", id)))
}

/// Submit a query and resolve recommendations
pub async fn advise(
    State(state): State<AppState>,
    Json(request): Json<AdviseRequest>,
) -> AppResult<Json<AdviseResponse>> {
    match state.advisor.submit(&request.query).await {
        Submission::Succeeded(response) => Ok(Json(AdviseResponse::resolve(
            AdvisorState::Succeeded,
            response,
            None,
            state.catalog(),
        ))),
        Submission::FallbackApplied { response, reason } => Ok(Json(AdviseResponse::resolve(
            AdvisorState::FallbackApplied,
            response,
            Some(reason),
            state.catalog(),
        ))),
        Submission::Failed(e) => Err(e),
        Submission::Ignored(IgnoreReason::EmptyQuery) => Err(AppError::InvalidInput(
            "Query cannot be empty".to_string(),
        )),
        Submission::Ignored(IgnoreReason::Busy) => Err(AppError::Busy),
    }
}

/// Current advisor state (loading flag, last response, last error)
pub async fn advise_status(State(state): State<AppState>) -> Json<AdvisorSnapshot> {
    Json(state.advisor.snapshot())
}
