use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ServiceError;
use crate::message::Message;

/// Bounded wait for one completion call. The request fails with a network
/// error after this rather than hanging indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Generative Language API (non-streaming `generateContent`).
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    system_instruction: Option<SystemInstruction>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Content {
    parts: Vec<Part>,
    role: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "topK")]
    top_k: i32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: i32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
    #[serde(rename = "finishReason")]
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            system_instruction: None,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_system_prompt(mut self, prompt_content: &str) -> Self {
        self.system_instruction = Some(SystemInstruction {
            parts: vec![Part {
                text: prompt_content.to_string(),
            }],
        });
        self
    }

    /// Send the full history and return the assistant's reply text.
    ///
    /// The service is stateless per call, so the entire conversation is
    /// resent every time. No retries happen here.
    pub async fn complete(&self, history: &[Message]) -> Result<String, ServiceError> {
        if self.api_key.is_empty() {
            return Err(ServiceError::auth("no API key configured"));
        }

        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = GenerateContentRequest {
            contents: Self::build_contents(history),
            generation_config: GenerationConfig {
                temperature: 0.7,
                top_p: 0.95,
                top_k: 40,
                max_output_tokens: 2048,
            },
            system_instruction: self.system_instruction.clone(),
        };

        debug!(model = %self.model, turns = history.len(), "sending completion request");

        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ServiceError::network(format!("request timed out: {}", e))
                } else if e.is_connect() {
                    ServiceError::network(format!("connection failed: {}", e))
                } else {
                    ServiceError::network(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::network(format!("failed to read response: {}", e)))?;

        debug!(%status, "completion response received");

        if !status.is_success() {
            return Err(Self::classify_http_error(status, &body));
        }

        let api_response: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| ServiceError::empty_response(format!("unparseable response: {}", e)))?;

        Self::extract_text(api_response)
    }

    fn build_contents(history: &[Message]) -> Vec<Content> {
        history
            .iter()
            .map(|message| Content {
                role: if message.is_user { "user" } else { "model" }.to_string(),
                parts: vec![Part {
                    text: message.text.clone(),
                }],
            })
            .collect()
    }

    fn classify_http_error(status: StatusCode, body: &str) -> ServiceError {
        // The service wraps failures in an { "error": { "message": ... } }
        // payload; fall back to the raw body when it doesn't.
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ServiceError::auth(format!("credential rejected: {}", message))
            }
            _ => ServiceError::remote(format!("HTTP {}: {}", status.as_u16(), message)),
        }
    }

    fn extract_text(response: GenerateContentResponse) -> Result<String, ServiceError> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::empty_response("no candidates in response"))?;

        let content = candidate
            .content
            .ok_or_else(|| ServiceError::empty_response("candidate has no content"))?;

        for part in content.parts {
            if !part.text.is_empty() {
                return Ok(part.text);
            }
        }

        Err(ServiceError::empty_response("no text content in response"))
    }
}

#[async_trait::async_trait]
impl crate::completion::CompletionClient for GeminiClient {
    async fn complete(&self, history: &[Message]) -> Result<String, ServiceError> {
        self.complete(history).await
    }

    fn client_name(&self) -> &str {
        "Gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with_text(text: &str) -> GenerateContentResponse {
        GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: "model".to_string(),
                    parts: vec![Part {
                        text: text.to_string(),
                    }],
                }),
                finish_reason: Some("STOP".to_string()),
            }],
        }
    }

    #[test]
    fn test_extract_text() {
        let text = GeminiClient::extract_text(response_with_text("Hello!")).unwrap();
        assert_eq!(text, "Hello!");
    }

    #[test]
    fn test_extract_text_no_candidates() {
        let response = GenerateContentResponse { candidates: vec![] };
        let err = GeminiClient::extract_text(response).unwrap_err();
        assert!(matches!(err, ServiceError::EmptyResponse(_)));
    }

    #[test]
    fn test_extract_text_blank_part() {
        let response = response_with_text("");
        let err = GeminiClient::extract_text(response).unwrap_err();
        assert!(matches!(err, ServiceError::EmptyResponse(_)));
    }

    #[test]
    fn test_build_contents_roles() {
        let history = vec![Message::user("Hi"), Message::assistant("Hello!")];
        let contents = GeminiClient::build_contents(&history);

        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].role, "user");
        assert_eq!(contents[1].role, "model");
        assert_eq!(contents[1].parts[0].text, "Hello!");
    }

    #[test]
    fn test_classify_http_error() {
        let body = r#"{"error": {"message": "API key not valid"}}"#;
        let err = GeminiClient::classify_http_error(StatusCode::FORBIDDEN, body);
        assert!(matches!(err, ServiceError::Auth(_)));
        assert!(err.to_string().contains("API key not valid"));

        let err = GeminiClient::classify_http_error(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(err, ServiceError::Remote(_)));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_io() {
        let client = GeminiClient::new(String::new(), "gemini-2.0-flash-exp".to_string());
        let err = client.complete(&[Message::user("Hi")]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Auth(_)));
    }
}
