use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use hivebase_pricing::prelude::{Modality, ServiceDefinition, Usage, UsageKind};

use crate::errors::GatewayError;

/// What the pipeline hands the backend after resolution: the canonical
/// service, its backend model, and the caller's body.
#[derive(Clone, Debug)]
pub struct BackendCall {
    pub service: ServiceDefinition,
    pub body: Value,
}

/// Backend output plus the usage it reports. Cloneable so coalesced
/// requests can share one instance.
#[derive(Clone, Debug)]
pub struct BackendResponse {
    pub status: u16,
    pub body: Value,
    pub model_used: String,
    pub usage: Usage,
}

#[async_trait]
pub trait BackendInvoker: Send + Sync {
    async fn invoke(&self, call: BackendCall) -> Result<BackendResponse, GatewayError>;
}

/// Loopback backend for local runs and tests: echoes the prompt and
/// reports token counts derived from its length.
#[derive(Default)]
pub struct EchoInvoker;

fn prompt_of(body: &Value) -> String {
    body.get("prompt")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            body.get("messages")
                .and_then(Value::as_array)
                .and_then(|messages| messages.last())
                .and_then(|message| message.get("content"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_default()
}

#[async_trait]
impl BackendInvoker for EchoInvoker {
    async fn invoke(&self, call: BackendCall) -> Result<BackendResponse, GatewayError> {
        let prompt = prompt_of(&call.body);
        let prompt_tokens = (prompt.len() as f64 / 4.0).ceil().max(1.0);
        let completion_tokens = prompt_tokens * 2.0;

        let mut usage = Usage::new().with(UsageKind::PromptTextTokens, prompt_tokens);
        let output = call
            .service
            .output_modalities
            .first()
            .copied()
            .unwrap_or(Modality::Text);
        match output {
            Modality::Text => usage.set(UsageKind::CompletionTextTokens, completion_tokens),
            Modality::Image => usage.set(UsageKind::CompletionImageTokens, 1.0),
            Modality::Audio => usage.set(UsageKind::CompletionAudioTokens, completion_tokens),
            Modality::Video => {
                usage.set(UsageKind::CompletionVideoSeconds, 4.0);
                usage.set(UsageKind::CompletionVideoTokens, completion_tokens);
            }
        }

        Ok(BackendResponse {
            status: 200,
            body: json!({
                "model": call.service.model_id,
                "output": format!("echo: {prompt}"),
            }),
            model_used: call.service.model_id.clone(),
            usage,
        })
    }
}

/// Forwards the call to a real model backend over HTTP.
pub struct HttpInvoker {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpInvoker {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| {
                GatewayError::upstream_timeout(&format!("build backend client: {err}"))
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn parse_usage(value: &Value) -> Usage {
        let mut usage = Usage::new();
        let Some(map) = value.get("usage").and_then(Value::as_object) else {
            return usage;
        };
        for kind in UsageKind::ALL {
            if let Some(amount) = map.get(kind.as_str()).and_then(Value::as_f64) {
                usage.set(kind, amount);
            }
        }
        usage
    }
}

#[async_trait]
impl BackendInvoker for HttpInvoker {
    async fn invoke(&self, call: BackendCall) -> Result<BackendResponse, GatewayError> {
        let url = format!("{}/v1/{}", self.base_url, call.service.model_id);
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&call.body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    GatewayError::upstream_timeout("backend invocation")
                } else {
                    GatewayError::upstream_timeout(&format!("backend request failed: {err}"))
                }
            })?;

        let status = response.status().as_u16();
        let body: Value = response.json().await.map_err(|err| {
            GatewayError::upstream_timeout(&format!("backend response decode: {err}"))
        })?;
        let usage = Self::parse_usage(&body);
        let model_used = body
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(&call.service.model_id)
            .to_string();

        Ok(BackendResponse {
            status,
            body,
            model_used,
            usage,
        })
    }
}
