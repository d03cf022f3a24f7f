use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::AnalyticsError;
use crate::event::AnalyticsEvent;

#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn deliver(&self, event: &AnalyticsEvent) -> Result<(), AnalyticsError>;
}

/// Posts events as JSON to the external ingestion endpoint.
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpSink {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, AnalyticsError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| AnalyticsError::delivery(&format!("build http client: {err}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            timeout,
        })
    }
}

#[async_trait]
impl AnalyticsSink for HttpSink {
    async fn deliver(&self, event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(event)
            .send()
            .await
            .map_err(|err| AnalyticsError::delivery(&format!("send: {err}")))?;
        if !response.status().is_success() {
            return Err(AnalyticsError::delivery(&format!(
                "ingest endpoint returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Discards everything; used when analytics is switched off.
#[derive(Default)]
pub struct NullSink;

#[async_trait]
impl AnalyticsSink for NullSink {
    async fn deliver(&self, _event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
        Ok(())
    }
}

/// Collects events in memory for assertions in tests.
#[derive(Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<AnalyticsEvent>>>,
}

impl MemorySink {
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl AnalyticsSink for MemorySink {
    async fn deliver(&self, event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}
