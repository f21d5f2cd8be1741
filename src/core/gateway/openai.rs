//! OpenAI-compatible gateway: chat completions through async-openai, images and ping over HTTP.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use futures::StreamExt;
use serde_json::{Map, Value, json};

use crate::core::app;
use crate::core::config::Config;

use super::{ChatReply, Gateway, GatewayError, GatewayReply, ImageHandle, RequestOptions};
use super::map_api_error;

pub struct OpenAiGateway {
    client: Client<OpenAIConfig>,
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiGateway {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::with_config(config.openai_config.clone()),
            http: reqwest::Client::builder()
                .user_agent(app::USER_AGENT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key().to_string(),
        }
    }

    fn chat_request(options: &RequestOptions, messages: Value) -> Value {
        let mut request = Map::new();
        request.insert("model".to_string(), json!(options.model));
        request.insert("messages".to_string(), messages);
        for (key, value) in &options.parameters {
            request.insert(key.clone(), value.clone());
        }
        if options.stream {
            request.insert("stream".to_string(), json!(true));
        }
        Value::Object(request)
    }
}

impl Gateway for OpenAiGateway {
    async fn chat(
        &self,
        prompt: &str,
        options: &RequestOptions,
    ) -> Result<ChatReply, GatewayError> {
        let request = Self::chat_request(options, json!([{ "role": "user", "content": prompt }]));
        log::debug!("chat request: model={} stream={}", options.model, options.stream);

        if options.stream {
            let stream = self
                .client
                .chat()
                .create_stream_byot::<_, Value>(request)
                .await
                .map_err(map_api_error)?;
            let fragments = stream.map(|chunk| {
                let chunk = chunk.map_err(map_api_error)?;
                if let Some(err) = chunk.get("error") {
                    let msg = err
                        .get("message")
                        .and_then(|v| v.as_str())
                        .unwrap_or("Unknown error");
                    return Err(GatewayError::Api(msg.to_string()));
                }
                Ok(chunk)
            });
            return Ok(ChatReply::Stream(fragments.boxed()));
        }

        let body: Value = self
            .client
            .chat()
            .create_byot(request)
            .await
            .map_err(map_api_error)?;
        Ok(ChatReply::Complete(GatewayReply::new(body)))
    }

    async fn chat_with_image(
        &self,
        prompt: &str,
        image_data_url: &str,
        options: &RequestOptions,
    ) -> Result<GatewayReply, GatewayError> {
        let mut options = options.clone();
        options.stream = false;
        let request = Self::chat_request(
            &options,
            json!([{
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    { "type": "image_url", "image_url": { "url": image_data_url } }
                ]
            }]),
        );
        log::debug!(
            "vision request: model={} image={} KB",
            options.model,
            image_data_url.len() / 1024
        );
        let body: Value = self
            .client
            .chat()
            .create_byot(request)
            .await
            .map_err(map_api_error)?;
        Ok(GatewayReply::new(body))
    }

    async fn generate_image(
        &self,
        prompt: &str,
        options: &RequestOptions,
    ) -> Result<ImageHandle, GatewayError> {
        let mut body = Map::new();
        body.insert("model".to_string(), json!(options.model));
        body.insert("prompt".to_string(), json!(prompt));
        body.insert("n".to_string(), json!(1));
        for (key, value) in &options.parameters {
            body.insert(key.clone(), value.clone());
        }

        let response = self
            .http
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_api_error)?;
        let status = response.status();
        let text = response.text().await.map_err(map_api_error)?;
        if !status.is_success() {
            return Err(GatewayError::from_status(status.as_u16(), &text));
        }
        let payload: Value =
            serde_json::from_str(&text).map_err(|e| GatewayError::Malformed(e.to_string()))?;
        image_handle_from(&payload)
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        let response = self
            .http
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(map_api_error)?;
        // Any answer means the gateway is reachable; only rejected credentials are fatal.
        match response.status().as_u16() {
            401 | 403 => {
                let body = response.text().await.unwrap_or_default();
                Err(GatewayError::from_status(401, &body))
            }
            _ => Ok(()),
        }
    }
}

/// First image of an `images/generations` payload (`url` or inline `b64_json`).
fn image_handle_from(payload: &Value) -> Result<ImageHandle, GatewayError> {
    let first = payload
        .get("data")
        .and_then(|d| d.get(0))
        .ok_or_else(|| GatewayError::Malformed("image response has no data".to_string()))?;
    let revised_prompt = first
        .get("revised_prompt")
        .and_then(Value::as_str)
        .map(str::to_string);
    if let Some(url) = first.get("url").and_then(Value::as_str) {
        return Ok(ImageHandle {
            url: url.to_string(),
            revised_prompt,
        });
    }
    if let Some(b64) = first.get("b64_json").and_then(Value::as_str) {
        return Ok(ImageHandle {
            url: format!("data:image/png;base64,{}", b64),
            revised_prompt,
        });
    }
    Err(GatewayError::Malformed(
        "image response has neither url nor b64_json".to_string(),
    ))
}
