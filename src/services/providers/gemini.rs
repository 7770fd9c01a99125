/// Google Gemini provider
///
/// Calls `generateContent` once per query with the instruction preamble, the user query
/// and the full catalog as JSON context. Structured output is forced through
/// `responseMimeType: application/json`.
use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{Catalog, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part},
    services::providers::{AdvisorProvider, RemoteCompletion},
};

const INSTRUCTION_PREAMBLE: &str = r#"You are an AI Product Advisor. Given a user query and a JSON catalog, select 1-3 best products. Respond ONLY as strict JSON matching this TypeScript type:
{
  "recommendations": Array<{
    "productId": string, // must match an id in the catalog
    "confidence": number, // 0..1
    "reason": string // concise rationale tailored to the user's needs
  }>
}"#;

const JSON_MIME_TYPE: &str = "application/json";

/// Credential header; keeps the key out of URLs and therefore out of error messages
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiProvider {
    /// Creates a provider from configuration
    ///
    /// A missing credential is not an error here; it surfaces on the first request.
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            api_key: config.api_key(),
            api_url: config.gemini_api_url.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url, self.model
        )
    }

    fn build_request(&self, query: &str, catalog: &Catalog) -> AppResult<GenerateContentRequest> {
        let catalog_json = serde_json::to_string(catalog.products())
            .map_err(|e| AppError::Internal(format!("Catalog serialization error: {}", e)))?;

        Ok(GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::text(INSTRUCTION_PREAMBLE),
                    Part::text(format!("User query: {}", query)),
                    Part::text("Catalog JSON:"),
                    Part::text(catalog_json),
                ],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
                response_mime_type: JSON_MIME_TYPE.to_string(),
            },
        })
    }
}

#[async_trait::async_trait]
impl AdvisorProvider for GeminiProvider {
    async fn request_recommendations(
        &self,
        query: &str,
        catalog: &Catalog,
    ) -> AppResult<RemoteCompletion> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::Configuration(
                "Missing GEMINI_API_KEY in env (EXPO_PUBLIC_GEMINI_API_KEY or GEMINI_API_KEY)."
                    .to_string(),
            )
        })?;

        let request = self.build_request(query, catalog)?;

        tracing::debug!(
            model = %self.model,
            products = catalog.len(),
            "Sending generateContent request"
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                provider = "gemini",
                "generateContent request failed"
            );
            return Err(AppError::RemoteService {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GenerateContentResponse = response.json().await?;
        let completion = RemoteCompletion {
            text: envelope.first_text(),
            model: envelope.model_version,
        };

        tracing::info!(
            has_text = completion.text.is_some(),
            model = ?completion.model,
            provider = "gemini",
            "generateContent completed"
        );

        Ok(completion)
    }

    fn model_label(&self) -> String {
        self.model.clone()
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode, Uri},
        Json, Router,
    };
    use serde_json::{json, Value};

    fn provider_at(api_url: &str, api_key: Option<&str>) -> GeminiProvider {
        let config = Config {
            gemini_api_key: api_key.map(str::to_string),
            gemini_api_url: api_url.to_string(),
            request_timeout_secs: 5,
            ..Config::default()
        };
        GeminiProvider::new(&config).unwrap()
    }

    fn create_test_provider(api_key: Option<&str>) -> GeminiProvider {
        provider_at("http://test.local/", api_key)
    }

    /// Serves `router` on an ephemeral local port and returns its base URL
    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_endpoint() {
        let provider = create_test_provider(Some("test_key"));
        assert_eq!(
            provider.endpoint(),
            "http://test.local/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_build_request_carries_preamble_query_and_catalog() {
        let provider = create_test_provider(Some("test_key"));
        let catalog = Catalog::sample();
        let request = provider
            .build_request("phone under $700", &catalog)
            .unwrap();

        let json = serde_json::to_value(&request).unwrap();
        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 4);
        assert!(parts[0]["text"]
            .as_str()
            .unwrap()
            .contains("\"recommendations\""));
        assert_eq!(parts[1]["text"], "User query: phone under $700");
        assert_eq!(parts[2]["text"], "Catalog JSON:");

        let embedded: Vec<serde_json::Value> =
            serde_json::from_str(parts[3]["text"].as_str().unwrap()).unwrap();
        assert_eq!(embedded.len(), 6);
        assert_eq!(embedded[0]["id"], "laptop-ultra-13");

        assert_eq!(json["generationConfig"]["maxOutputTokens"], 512);
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_network() {
        let provider = create_test_provider(None);
        let result = provider
            .request_recommendations("anything", &Catalog::sample())
            .await;
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_model_label() {
        let provider = create_test_provider(Some("test_key"));
        assert_eq!(provider.model_label(), "gemini-1.5-flash");
        assert_eq!(provider.name(), "gemini");
    }

    #[tokio::test]
    async fn test_success_envelope_is_decoded() {
        let upstream = Router::new().fallback(
            |headers: HeaderMap, uri: Uri, Json(body): Json<Value>| async move {
                let authorized = headers
                    .get(API_KEY_HEADER)
                    .is_some_and(|value| value == "test_key");
                if !authorized || uri.query().is_some() {
                    return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "bad key" })));
                }
                if uri.path() != "/v1beta/models/gemini-1.5-flash:generateContent"
                    || body["contents"][0]["parts"][1]["text"] != "User query: travel laptop"
                {
                    return (StatusCode::BAD_REQUEST, Json(json!({ "error": "bad request" })));
                }
                (
                    StatusCode::OK,
                    Json(json!({
                        "candidates": [{
                            "content": {
                                "role": "model",
                                "parts": [{ "text": "{\"recommendations\": []}" }]
                            }
                        }],
                        "modelVersion": "gemini-1.5-flash-002"
                    })),
                )
            },
        );
        let url = spawn_upstream(upstream).await;
        let provider = provider_at(&url, Some("test_key"));

        let completion = provider
            .request_recommendations("travel laptop", &Catalog::sample())
            .await
            .unwrap();
        assert_eq!(
            completion.text.as_deref(),
            Some(r#"{"recommendations": []}"#)
        );
        assert_eq!(completion.model.as_deref(), Some("gemini-1.5-flash-002"));
    }

    #[tokio::test]
    async fn test_non_success_status_maps_to_remote_service_error() {
        let upstream = Router::new().fallback(|| async {
            (StatusCode::INTERNAL_SERVER_ERROR, "quota exhausted")
        });
        let url = spawn_upstream(upstream).await;
        let provider = provider_at(&url, Some("test_key"));

        let result = provider
            .request_recommendations("laptop", &Catalog::sample())
            .await;
        match result {
            Err(AppError::RemoteService { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "quota exhausted");
            }
            other => panic!("expected remote service error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_api_key() {
        let provider = provider_at("http://127.0.0.1:1", Some("SUPERSECRETKEY123"));

        let err = provider
            .request_recommendations("laptop", &Catalog::sample())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::HttpClient(_)));
        let message = err.to_string();
        assert!(!message.contains("SUPERSECRETKEY123"), "leaked: {}", message);
        assert!(!format!("{:?}", err).contains("SUPERSECRETKEY123"));
    }
}
