use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::backoff::RetryPolicy;
use crate::event::AnalyticsEvent;
use crate::sink::AnalyticsSink;

/// Cloneable producer side of the analytics queue. `emit` never blocks and
/// never fails the caller: a full queue drops the event with a warning.
#[derive(Clone)]
pub struct AnalyticsHandle {
    tx: mpsc::Sender<AnalyticsEvent>,
}

impl AnalyticsHandle {
    pub fn emit(&self, event: AnalyticsEvent) {
        if let Err(err) = self.tx.try_send(event) {
            warn!(target: "hivebase::analytics", "dropping analytics event: {err}");
        }
    }
}

/// Spawn the background dispatcher. Each received event is delivered with
/// exponential backoff; exhausting the attempts logs and moves on, so a
/// dead sink can never block or fail a request.
pub fn spawn(
    sink: Arc<dyn AnalyticsSink>,
    policy: RetryPolicy,
    capacity: usize,
) -> AnalyticsHandle {
    let (tx, mut rx) = mpsc::channel::<AnalyticsEvent>(capacity.max(1));
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            deliver_with_retry(sink.as_ref(), &policy, &event).await;
        }
    });
    AnalyticsHandle { tx }
}

async fn deliver_with_retry(sink: &dyn AnalyticsSink, policy: &RetryPolicy, event: &AnalyticsEvent) {
    for attempt in 1..=policy.max_attempts.max(1) {
        match sink.deliver(event).await {
            Ok(()) => return,
            Err(err) if attempt < policy.max_attempts => {
                let delay = policy.next_delay(attempt);
                debug!(
                    target: "hivebase::analytics",
                    attempt,
                    ?delay,
                    "analytics delivery failed, retrying: {err}"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                warn!(
                    target: "hivebase::analytics",
                    "analytics delivery abandoned after {attempt} attempts: {err}"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AnalyticsError;
    use crate::sink::MemorySink;
    use async_trait::async_trait;
    use hivebase_pricing::prelude::Usage;
    use hivebase_types::prelude::{CredentialKind, Tier, Timestamp};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn event(name: &str) -> AnalyticsEvent {
        AnalyticsEvent {
            event_name: name.to_string(),
            occurred_at: Timestamp(0),
            user_id: None,
            username: "anonymous".into(),
            tier: Tier::Anonymous,
            credential: CredentialKind::None,
            requested_service: "openai".into(),
            resolved_service: None,
            model_used: None,
            fallback_used: false,
            usage: Usage::new(),
            cost: None,
            price: None,
            billed: false,
            client_ip: "ip".into(),
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            min_delay_ms: 1,
            max_delay_ms: 5,
            max_attempts: 4,
            jitter: 0.0,
        }
    }

    #[tokio::test]
    async fn events_reach_the_sink() {
        let sink = MemorySink::default();
        let handle = spawn(Arc::new(sink.clone()), fast_policy(), 16);
        handle.emit(event("generation"));
        tokio::time::sleep(Duration::from_millis(50)).await;
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_name, "generation");
    }

    struct FlakySink {
        failures_left: AtomicUsize,
        delivered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AnalyticsSink for FlakySink {
        async fn deliver(&self, event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(AnalyticsError::delivery("transient outage"));
            }
            self.delivered.lock().push(event.event_name.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let sink = Arc::new(FlakySink {
            failures_left: AtomicUsize::new(2),
            delivered: Mutex::new(Vec::new()),
        });
        let handle = spawn(sink.clone(), fast_policy(), 16);
        handle.emit(event("retried"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sink.delivered.lock().as_slice(), &["retried".to_string()]);
    }

    #[tokio::test]
    async fn exhausted_retries_are_swallowed() {
        let sink = Arc::new(FlakySink {
            failures_left: AtomicUsize::new(usize::MAX),
            delivered: Mutex::new(Vec::new()),
        });
        let handle = spawn(sink.clone(), fast_policy(), 16);
        handle.emit(event("doomed"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(sink.delivered.lock().is_empty());
        // The queue stays alive for later events.
        handle.emit(event("still-doomed"));
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        struct StuckSink;
        #[async_trait]
        impl AnalyticsSink for StuckSink {
            async fn deliver(&self, _event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
                tokio::time::sleep(Duration::from_secs(3_600)).await;
                Ok(())
            }
        }
        let handle = spawn(Arc::new(StuckSink), fast_policy(), 1);
        for _ in 0..50 {
            handle.emit(event("burst"));
        }
        // Reaching this line without awaiting proves emit never blocks.
    }
}
