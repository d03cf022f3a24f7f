use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::time::timeout;
use tracing::debug;

use hivebase_admission::prelude::AdmissionDecision;
use hivebase_analytics::prelude::{AnalyticsEvent, AnalyticsHandle};
use hivebase_auth::prelude::{DenyReason, RequestCredentials};
use hivebase_coalesce::prelude::fingerprint;
use hivebase_errors::prelude::ErrorObj;
use hivebase_pricing::prelude::*;
use hivebase_types::prelude::{Principal, ServiceId, Timestamp};

use crate::backend::{BackendCall, BackendInvoker};
use crate::errors::GatewayError;
use crate::state::AppState;

pub fn now_ts() -> Timestamp {
    Timestamp(Utc::now().timestamp_millis())
}

/// One finished backend execution, shared verbatim among coalesced
/// requests.
#[derive(Clone, Debug)]
pub struct CompletedCall {
    pub status: u16,
    pub body: Value,
    pub model_used: String,
    pub usage: Usage,
    pub cost: UsageMoney,
    pub price: UsageMoney,
}

pub type SharedCallResult = Result<CompletedCall, ErrorObj>;

/// Everything the HTTP layer needs to shape the response: the shared
/// result, the admission headers, and what identity/service resolution
/// settled on (for debug headers).
pub struct PipelineOutcome {
    pub result: SharedCallResult,
    pub admission: Option<AdmissionDecision>,
    pub principal: Option<Principal>,
    pub service: Option<ServiceId>,
    pub fallback_used: bool,
    pub joined: bool,
}

impl PipelineOutcome {
    fn failed(err: GatewayError) -> Self {
        Self {
            result: Err(err.into_inner()),
            admission: None,
            principal: None,
            service: None,
            fallback_used: false,
            joined: false,
        }
    }
}

fn deny_error(reason: DenyReason, requested: &str) -> GatewayError {
    match reason {
        DenyReason::AnonymousDisallowed => {
            GatewayError::authentication_required("anonymous usage is disabled")
        }
        DenyReason::AnonymousPaidService => {
            GatewayError::authentication_required("anonymous callers may only use free services")
        }
        DenyReason::InsufficientTier => GatewayError::insufficient_tier(requested),
        DenyReason::PermissionDenied => GatewayError::permission_denied(requested),
        DenyReason::NotFound => GatewayError::service_not_found(requested),
    }
}

/// Nominal usage for estimating a request's pollen debit before the real
/// usage is known.
fn nominal_usage(service: &ServiceDefinition) -> Usage {
    let mut usage = Usage::new().with(UsageKind::PromptTextTokens, 500.0);
    match service.output_modalities.first() {
        Some(Modality::Image) => usage.set(UsageKind::CompletionImageTokens, 1.0),
        Some(Modality::Audio) => usage.set(UsageKind::CompletionAudioTokens, 500.0),
        Some(Modality::Video) => {
            usage.set(UsageKind::CompletionVideoSeconds, 4.0);
            usage.set(UsageKind::CompletionVideoTokens, 1_000.0);
        }
        _ => usage.set(UsageKind::CompletionTextTokens, 1_000.0),
    }
    usage
}

fn estimate_debit(
    registry: &ServiceRegistry,
    service: &ServiceDefinition,
    now: Timestamp,
    default_debit: f64,
) -> f64 {
    match registry.calculate_price(&service.service_id, &nominal_usage(service), now) {
        Ok(money) if money.total > 0.0 => money.total,
        _ => default_debit,
    }
}

/// The full decision pipeline for a generation call: resolve identity,
/// gate by tier/permission (with fallback), admit against the pollen
/// bucket, then coalesce with any identical in-flight request around one
/// backend execution that also records cost and emits analytics.
pub async fn run_generation(
    state: &AppState,
    credentials: RequestCredentials,
    requested: &str,
    method: &str,
    path: &str,
    body: Value,
) -> PipelineOutcome {
    let now = now_ts();

    let principal = match timeout(
        state.config.auth.lookup_timeout(),
        state.resolver.resolve(&credentials, now),
    )
    .await
    {
        Err(_) => return PipelineOutcome::failed(GatewayError::upstream_timeout("identity lookup")),
        Ok(Err(err)) => return PipelineOutcome::failed(err.into()),
        Ok(Ok(principal)) => principal,
    };

    let decision = state.gate.authorize(&principal, requested, now);
    let Some(service_id) = decision.service.clone().filter(|_| decision.allowed) else {
        let reason = decision.deny.unwrap_or(DenyReason::NotFound);
        let mut outcome = PipelineOutcome::failed(deny_error(reason, requested));
        outcome.principal = Some(principal);
        return outcome;
    };
    let Some(service) = state.registry.service(&service_id).cloned() else {
        let mut outcome = PipelineOutcome::failed(GatewayError::service_not_found(requested));
        outcome.principal = Some(principal);
        return outcome;
    };

    let debit = estimate_debit(
        &state.registry,
        &service,
        now,
        state.config.admission.default_debit,
    );
    let admission = match state
        .admission
        .admit(&principal, &credentials.client_ip, debit)
        .await
    {
        Ok(admission) => admission,
        Err(err) => {
            let mut outcome = PipelineOutcome::failed(err.into());
            outcome.principal = Some(principal);
            return outcome;
        }
    };
    if !admission.allowed() {
        let decision = admission.decision().copied();
        let remaining = decision.map(|d| d.remaining).unwrap_or(0.0);
        let mut outcome = PipelineOutcome::failed(GatewayError::rate_limited(remaining));
        outcome.admission = decision;
        outcome.principal = Some(principal);
        outcome.service = Some(service_id);
        return outcome;
    }

    // Coalesce on (identity, method, path, body): identical concurrent
    // calls share one backend execution and one analytics record.
    let identity = credentials
        .api_key()
        .map(str::to_string)
        .unwrap_or_else(|| credentials.client_ip.clone());
    let body_bytes = serde_json::to_vec(&body).unwrap_or_default();
    let print = fingerprint(&identity, method, path, &body_bytes);

    let exec = {
        let registry = state.registry.clone();
        let invoker = state.invoker.clone();
        let analytics = state.analytics.clone();
        let backend_timeout = state.config.backend.timeout();
        let service = service.clone();
        let principal = principal.clone();
        let requested = requested.to_string();
        let fallback_used = decision.fallback_used;
        let client_ip = credentials.client_ip.clone();
        move || {
            execute_call(
                registry,
                invoker,
                analytics,
                backend_timeout,
                service,
                principal,
                requested,
                fallback_used,
                client_ip,
                body,
            )
        }
    };
    let (result, joined) = state.inflight.coalesce(print, exec).await;
    if joined {
        debug!(target: "hivebase::gateway", service = %service_id, "joined in-flight execution");
    }

    PipelineOutcome {
        result,
        admission: admission.decision().copied(),
        principal: Some(principal),
        service: Some(service_id),
        fallback_used: decision.fallback_used,
        joined,
    }
}

#[allow(clippy::too_many_arguments)]
async fn execute_call(
    registry: Arc<ServiceRegistry>,
    invoker: Arc<dyn BackendInvoker>,
    analytics: AnalyticsHandle,
    backend_timeout: std::time::Duration,
    service: ServiceDefinition,
    principal: Principal,
    requested: String,
    fallback_used: bool,
    client_ip: String,
    body: Value,
) -> SharedCallResult {
    let service_id = service.service_id.clone();
    let call = BackendCall {
        service: service.clone(),
        body,
    };
    let response = match timeout(backend_timeout, invoker.invoke(call)).await {
        Err(_) => return Err(GatewayError::upstream_timeout("backend invocation").into_inner()),
        Ok(Err(err)) => return Err(err.into_inner()),
        Ok(Ok(response)) => response,
    };

    let now = now_ts();
    let cost = registry
        .calculate_cost(&service.model_id, &response.usage, now)
        .map_err(PricingError::into_inner)?;
    let price = registry
        .calculate_price(&service_id, &response.usage, now)
        .map_err(PricingError::into_inner)?;

    analytics.emit(AnalyticsEvent {
        event_name: "generation".to_string(),
        occurred_at: now,
        user_id: principal.user_id.clone(),
        username: principal.username.clone(),
        tier: principal.tier,
        credential: principal.credential,
        requested_service: requested,
        resolved_service: Some(service_id),
        model_used: Some(response.model_used.clone()),
        fallback_used,
        usage: response.usage.clone(),
        cost: Some(cost.clone()),
        price: Some(price.clone()),
        billed: price.total > 0.0,
        client_ip,
    });

    Ok(CompletedCall {
        status: response.status,
        body: response.body,
        model_used: response.model_used,
        usage: response.usage,
        cost,
        price,
    })
}
