use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::http::{build_client, send_json};
use crate::structured::{parse_fields, StructuredPrompt};
use crate::{Instruction, Oracle, OracleConfig, OracleError, OracleFields};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Oracle backed by the Anthropic Messages API
pub struct AnthropicOracle {
    client: Client,
    config: OracleConfig,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicOracle {
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let client = build_client(&config)?;
        Ok(Self { client, config })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.endpoint())
    }

    fn request_body(&self, prompt: &StructuredPrompt) -> serde_json::Value {
        let mut body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "system": prompt.system,
            "messages": [{
                "role": "user",
                "content": prompt.user,
            }],
        });
        if let Some(temperature) = self.config.temperature {
            body["temperature"] = json!(temperature);
        }
        body
    }

    fn response_text(response: MessagesResponse) -> Result<String, OracleError> {
        let text = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(OracleError::MalformedResponse(
                "No text in Anthropic response".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl Oracle for AnthropicOracle {
    fn name(&self) -> &str {
        "Anthropic"
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
            .post(self.messages_url())
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&self.request_body(&prompt));

        let response: MessagesResponse = send_json(request).await?;
        let text = Self::response_text(response)?;

        parse_fields(&text, instruction.signature())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Operation;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn oracle() -> AnthropicOracle {
        AnthropicOracle::new(OracleConfig::default().with_temperature(0.2)).unwrap()
    }

    #[test]
    fn test_messages_url() {
        assert_eq!(
            oracle().messages_url(),
            "https://api.anthropic.com/v1/messages"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let instruction =
            Instruction::new(Operation::Explain).with_input("user_input", "What is a monad?");
        let prompt = StructuredPrompt::build(&instruction);
        let body = oracle().request_body(&prompt);

        assert_eq!(body["model"], "claude-3-5-sonnet-20241022");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["messages"][0]["role"], "user");
        assert!(body["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("What is a monad?"));
        assert!(body["temperature"].is_number());
    }

    #[test]
    fn test_response_text_joins_text_blocks() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"content": [{"type": "text", "text": "<output>{\"task\": "}, {"type": "text", "text": "\"none\"}</output>"}]}"#,
        )
        .unwrap();
        let text = AnthropicOracle::response_text(response).unwrap();
        assert_eq!(text, "<output>{\"task\": \"none\"}</output>");
    }

    #[test]
    fn test_response_without_text_is_malformed() {
        let response: MessagesResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert!(matches!(
            AnthropicOracle::response_text(response),
            Err(OracleError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_predict_without_api_key_fails_before_sending() {
        let instruction =
            Instruction::new(Operation::Classify).with_input("user_input", "Explain gravity");
        let err = oracle().predict(&instruction).await.unwrap_err();
        assert!(matches!(err, OracleError::NotConfigured { .. }));
    }

    fn live_oracle(server: &MockServer) -> AnthropicOracle {
        let config = OracleConfig::default()
            .with_base_url(server.uri())
            .with_api_key("test-key".into());
        AnthropicOracle::new(config).unwrap()
    }

    fn classify() -> Instruction {
        Instruction::new(Operation::Classify).with_input("user_input", "Explain gravity")
    }

    async fn mount(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(response)
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_predict_parses_output_block() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "<output>{\"task\": \"Explain\"}</output>"}]
            })),
        )
        .await;

        let fields = live_oracle(&server).predict(&classify()).await.unwrap();
        assert_eq!(fields.get("task"), Some("Explain"));
    }

    #[tokio::test]
    async fn test_predict_rate_limited() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(429)).await;

        let err = live_oracle(&server).predict(&classify()).await.unwrap_err();
        assert!(matches!(err, OracleError::RateLimited));
    }

    #[tokio::test]
    async fn test_predict_error_status_keeps_body() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(401).set_body_string(r#"{"error":"bad key"}"#),
        )
        .await;

        let err = live_oracle(&server).predict(&classify()).await.unwrap_err();
        match err {
            OracleError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, r#"{"error":"bad key"}"#);
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_predict_non_json_body_is_malformed() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(200).set_body_string("not json")).await;

        let err = live_oracle(&server).predict(&classify()).await.unwrap_err();
        assert!(matches!(err, OracleError::MalformedResponse(_)));
    }
}
