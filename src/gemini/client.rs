use std::future::Future;
use std::time::Duration;

use reqwest::Client;

use super::error::GeminiError;
use super::types::{GenerateContentResponse, Generation, GenerationParams};

/// The seam between the dispatch engine and the inference provider.
///
/// The engine is generic over this trait so tests can substitute a mock
/// without any network. Implementations must be shareable across in-flight
/// jobs (`&self`, `Send + Sync`).
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt` under the given parameters.
    fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> impl Future<Output = Result<Generation, GeminiError>> + Send;
}

/// HTTP client for one Vertex AI region.
///
/// Each region is an independent rate-limit domain, so the batch holds one
/// client per configured region and rotates across them.
pub struct VertexClient {
    client: Client,
    endpoint: String,
    access_token: String,
}

impl VertexClient {
    pub fn new(project_id: &str, location: &str, model: &str, access_token: &str) -> Self {
        let endpoint = format!(
            "https://{location}-aiplatform.googleapis.com/v1/projects/{project_id}/locations/{location}/publishers/google/models/{model}:generateContent"
        );
        Self::with_endpoint(endpoint, access_token.to_string())
    }

    /// Create a client pointing at a custom endpoint (useful for testing).
    pub fn with_endpoint(endpoint: String, access_token: String) -> Self {
        // No overall request timeout here: the per-job deadline is enforced
        // by the job executor, which also covers the HTTP exchange.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            endpoint,
            access_token,
        }
    }
}

impl TextGenerator for VertexClient {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Generation, GeminiError> {
        let req = params.to_request(prompt);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .header("content-type", "application/json")
            .json(&req)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(1000);
            return Err(GeminiError::RateLimited {
                retry_after_ms: retry_after,
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.json::<GenerateContentResponse>().await?;
        Ok(body.into_generation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> VertexClient {
        VertexClient::with_endpoint(server.uri(), "test-token".to_string())
    }

    fn test_params() -> GenerationParams {
        GenerationParams {
            max_output_tokens: 128,
            temperature: None,
            safety_settings: Vec::new(),
        }
    }

    #[test]
    fn endpoint_url_embeds_project_location_and_model() {
        let client = VertexClient::new("my-proj", "europe-west4", "gemini-pro", "tok");
        assert_eq!(
            client.endpoint,
            "https://europe-west4-aiplatform.googleapis.com/v1/projects/my-proj/locations/europe-west4/publishers/google/models/gemini-pro:generateContent"
        );
    }

    #[tokio::test]
    async fn generate_parses_successful_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "tell me a story"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "OK"}]},
                    "finishReason": "STOP"
                }]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let generation = client
            .generate("tell me a story", &test_params())
            .await
            .unwrap();
        assert_eq!(generation.text, "OK");
        assert!(generation.warnings.is_empty());
    }

    #[tokio::test]
    async fn generate_maps_429_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.generate("x", &test_params()).await.unwrap_err();
        match err {
            GeminiError::RateLimited { retry_after_ms } => assert_eq!(retry_after_ms, 7000),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn generate_maps_server_error_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.generate("x", &test_params()).await.unwrap_err();
        match err {
            GeminiError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "internal");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }
}
