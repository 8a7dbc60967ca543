use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::http::{build_client, send_json};
use crate::structured::{parse_fields, StructuredPrompt};
use crate::{Instruction, Oracle, OracleConfig, OracleError, OracleFields};

/// Oracle backed by an OpenAI-compatible Chat Completions endpoint
pub struct OpenAiOracle {
    client: Client,
    config: OracleConfig,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiOracle {
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let client = build_client(&config)?;
        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.config.endpoint())
    }

    fn request_body(&self, prompt: &StructuredPrompt) -> serde_json::Value {
        let mut body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user },
            ],
        });
        if let Some(temperature) = self.config.temperature {
            body["temperature"] = json!(temperature);
        }
        body
    }

    fn response_text(response: ChatCompletionResponse) -> Result<String, OracleError> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                OracleError::MalformedResponse("Empty chat completion response".to_string())
            })
    }
}

#[async_trait]
impl Oracle for OpenAiOracle {
    fn name(&self) -> &str {
        "OpenAI"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn predict(&self, instruction: &Instruction) -> Result<OracleFields, OracleError> {
        instruction.validate()?;
        let api_key = self.config.require_api_key()?;

        let prompt = StructuredPrompt::build(instruction);
        debug!(
            oracle = self.name(),
            operation = %instruction.operation(),
            prompt_len = prompt.user.len(),
            "Sending instruction"
        );

        let request = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&self.request_body(&prompt));

        let response: ChatCompletionResponse = send_json(request).await?;
        let text = Self::response_text(response)?;

        parse_fields(&text, instruction.signature())
    }
}
