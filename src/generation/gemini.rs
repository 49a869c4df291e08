//! Generative Language REST client.
//!
//! System turns are folded into `systemInstruction`; assistant turns are sent
//! with the API's `model` role.

use crate::error::GenerationError;
use crate::generation::{GenerationClient, GenerationReply};
use crate::session::{Role, Turn};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, model_id: &str) -> String {
        let model = model_id.trim().trim_start_matches("models/");
        format!("{}/{model}:generateContent", self.base_url)
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(
        &self,
        api_key: &str,
        model_id: &str,
        turns: &[Turn],
    ) -> Result<GenerationReply, GenerationError> {
        if model_id.trim().is_empty() {
            return Err(GenerationError::Other("please enter a model id".to_string()));
        }
        let body = build_request(turns);
        let response = self
            .client
            .post(self.endpoint(model_id))
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|err| GenerationError::Transport(err.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| GenerationError::Decode(err.without_url().to_string()))?;

        Ok(GenerationReply {
            text: extract_text(parsed),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn build_request(turns: &[Turn]) -> GenerateContentRequest {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();

    for turn in turns {
        let part = Part {
            text: turn.text.clone(),
        };
        match turn.role {
            Role::System => system_parts.push(part),
            Role::User => contents.push(Content {
                role: "user",
                parts: vec![part],
            }),
            Role::Assistant => contents.push(Content {
                role: "model",
                parts: vec![part],
            }),
        }
    }

    GenerateContentRequest {
        contents,
        system_instruction: (!system_parts.is_empty()).then(|| SystemInstruction {
            parts: system_parts,
        }),
    }
}

fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let parts = response
        .candidates?
        .into_iter()
        .next()?
        .content?
        .parts;
    let text: String = parts.into_iter().filter_map(|part| part.text).collect();
    (!text.is_empty()).then_some(text)
}

fn map_http_error(status: StatusCode, body: &str) -> GenerationError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_string());

    GenerationError::Api {
        status: status.as_u16(),
        message,
    }
}
