use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::time::timeout;

use hivebase_auth::prelude::RequestCredentials;
use hivebase_types::prelude::{AdminScope, CredentialKind, Tier, UserId};

use crate::errors::{error_response, GatewayError};
use crate::pipeline::{now_ts, run_generation, PipelineOutcome};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/api/models", get(models))
        .route("/api/account/key", get(account_key))
        .route("/api/account/billing", get(billing))
        .route("/api/generate/:service", post(generate_post))
        .route("/api/generate/:service/:prompt", get(generate_get))
        .route("/api/admin/update-tier", post(admin_update_tier))
        .route("/api/admin/trigger-refill", post(admin_trigger_refill))
        .with_state(state)
}

fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| "local".to_string())
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get("cookie")?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Pull every supported credential shape out of the request. The body is
/// consulted for `key`/`referrer` fields on generation calls.
fn extract_credentials(
    state: &AppState,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
    body: Option<&Value>,
) -> RequestCredentials {
    let header_str =
        |name: &str| -> Option<String> { headers.get(name)?.to_str().ok().map(str::to_string) };

    let bearer = header_str("authorization")
        .and_then(|value| value.strip_prefix("Bearer ").map(str::to_string));
    let body_field = |field: &str| -> Option<String> {
        body.and_then(|value| value.get(field))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    RequestCredentials {
        admin_token: header_str("x-admin-token"),
        session_token: cookie_value(headers, &state.config.auth.session_cookie),
        bearer,
        key_header: header_str("x-pollen-key"),
        key_query: query.get("key").cloned().or_else(|| body_field("key")),
        referrer: header_str("referer")
            .or_else(|| header_str("origin"))
            .or_else(|| body_field("referrer")),
        client_ip: client_ip(headers),
    }
}

fn fmt_pollen(value: f64) -> String {
    let text = format!("{value:.6}");
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn generation_response(state: &AppState, outcome: PipelineOutcome) -> Response {
    let debug = state.config.debug;
    let mut response = match outcome.result {
        Ok(call) => {
            let status = StatusCode::from_u16(call.status).unwrap_or(StatusCode::OK);
            (status, Json(call.body)).into_response()
        }
        Err(err) => error_response(&err, debug),
    };

    let headers = response.headers_mut();
    if let Some(decision) = outcome.admission {
        if let Ok(value) = HeaderValue::from_str(&fmt_pollen(decision.limit)) {
            headers.insert("ratelimit-limit", value);
        }
        if let Ok(value) = HeaderValue::from_str(&fmt_pollen(decision.remaining)) {
            headers.insert("ratelimit-remaining", value);
        }
    }
    if debug {
        if let Some(principal) = &outcome.principal {
            headers.insert(
                "x-debug-credential",
                HeaderValue::from_static(principal.credential.as_str()),
            );
            headers.insert(
                "x-debug-tier",
                HeaderValue::from_static(principal.tier.as_str()),
            );
        }
        if let Some(service) = &outcome.service {
            if let Ok(value) = HeaderValue::from_str(service.as_str()) {
                headers.insert("x-debug-service", value);
            }
        }
        headers.insert(
            "x-debug-fallback",
            HeaderValue::from_static(if outcome.fallback_used { "true" } else { "false" }),
        );
    }
    response
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn version(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "version": state.version.version,
        "commit": state.version.commit,
    }))
}

#[derive(Serialize)]
struct ModelInfo {
    service: String,
    model: String,
    provider: String,
    aliases: Vec<String>,
    tier: Tier,
    free: bool,
}

async fn models(State(state): State<AppState>) -> impl IntoResponse {
    let now = now_ts();
    let rows: Vec<ModelInfo> = state
        .registry
        .services()
        .map(|service| ModelInfo {
            service: service.service_id.0.clone(),
            model: service.model_id.clone(),
            provider: service.provider.clone(),
            aliases: service.aliases.clone(),
            tier: service.required_tier,
            free: state.registry.is_free_service(&service.service_id, now),
        })
        .collect();
    Json(rows)
}

#[derive(Serialize)]
struct KeyStatusResponse {
    valid: bool,
    #[serde(rename = "type")]
    key_type: &'static str,
    name: String,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    permissions: Option<Vec<String>>,
    pollen_budget: Option<f64>,
    rate_limit_enabled: bool,
}

async fn account_key(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let credentials = extract_credentials(&state, &headers, &query, None);
    let Some(key) = credentials.api_key() else {
        return error_response(
            &GatewayError::authentication_required("no api key presented").into_inner(),
            state.config.debug,
        );
    };

    let looked_up = match timeout(state.config.auth.lookup_timeout(), state.keys.lookup(key)).await
    {
        Err(_) => Err(GatewayError::upstream_timeout("key lookup")),
        Ok(result) => result.map_err(GatewayError::from),
    };
    let record = match looked_up {
        Ok(Some(record)) => record,
        Ok(None) => {
            return error_response(
                &GatewayError::authentication_required("unknown api key").into_inner(),
                state.config.debug,
            )
        }
        Err(err) => return error_response(&err.into_inner(), state.config.debug),
    };

    let now = now_ts();
    if record.is_expired(now) {
        return error_response(
            &GatewayError::authentication_required("api key expired").into_inner(),
            state.config.debug,
        );
    }

    let rate_limit_enabled = record.kind == hivebase_auth::prelude::KeyKind::Publishable
        || record.rate_limit_enabled;
    Json(KeyStatusResponse {
        valid: true,
        key_type: record.kind.as_str(),
        name: record.name,
        expires_at: record.expires_at.map(|ts| ts.0),
        expires_in: record.expires_at.map(|ts| ts.seconds_from(now.0)),
        permissions: record
            .permissions
            .map(|ids| ids.into_iter().map(|id| id.0).collect()),
        pollen_budget: record.pollen_budget,
        rate_limit_enabled,
    })
    .into_response()
}

async fn generate_post(
    State(state): State<AppState>,
    Path(service): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let credentials = extract_credentials(&state, &headers, &query, Some(&body));
    let path = format!("/api/generate/{service}");
    let outcome = run_generation(&state, credentials, &service, "POST", &path, body).await;
    generation_response(&state, outcome)
}

async fn generate_get(
    State(state): State<AppState>,
    Path((service, prompt)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let credentials = extract_credentials(&state, &headers, &query, None);
    let path = format!("/api/generate/{service}/{prompt}");
    let body = json!({ "prompt": prompt });
    let outcome = run_generation(&state, credentials, &service, "GET", &path, body).await;
    generation_response(&state, outcome)
}

#[derive(Deserialize)]
struct UpdateTierBody {
    user_id: String,
    tier: String,
}

async fn resolve_admin(
    state: &AppState,
    headers: &HeaderMap,
    scope: AdminScope,
) -> Result<(), GatewayError> {
    let credentials = extract_credentials(state, headers, &HashMap::new(), None);
    if credentials.admin_token.is_none() {
        return Err(GatewayError::authentication_required("admin token required"));
    }
    let principal = state
        .resolver
        .resolve(&credentials, now_ts())
        .await
        .map_err(GatewayError::from)?;
    if !principal.has_admin_scope(scope) {
        return Err(GatewayError::authentication_required(
            "token lacks the required admin scope",
        ));
    }
    Ok(())
}

async fn admin_update_tier(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<UpdateTierBody>,
) -> Response {
    if let Err(err) = resolve_admin(&state, &headers, AdminScope::UpdateTier).await {
        return error_response(&err.into_inner(), state.config.debug);
    }
    let Some(tier) = Tier::parse(&body.tier) else {
        return error_response(
            &GatewayError::schema(&format!("unknown tier {}", body.tier)).into_inner(),
            state.config.debug,
        );
    };
    let user_id = UserId(body.user_id);
    match state.users.set_tier(&user_id, tier).await {
        Ok(true) => Json(json!({ "status": "ok", "user_id": user_id.0, "tier": tier }))
            .into_response(),
        Ok(false) => error_response(
            &GatewayError::user_not_found(&user_id.0).into_inner(),
            state.config.debug,
        ),
        Err(err) => error_response(&GatewayError::from(err).into_inner(), state.config.debug),
    }
}

async fn admin_trigger_refill(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(err) = resolve_admin(&state, &headers, AdminScope::TriggerRefill).await {
        return error_response(&err.into_inner(), state.config.debug);
    }
    match state.admission.trigger_refill().await {
        Ok(()) => Json(json!({ "status": "ok" })).into_response(),
        Err(err) => error_response(&GatewayError::from(err).into_inner(), state.config.debug),
    }
}

async fn billing(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let credentials = extract_credentials(&state, &headers, &query, None);
    if credentials.session_token.is_none() {
        return error_response(
            &GatewayError::authentication_required("billing requires a session").into_inner(),
            state.config.debug,
        );
    }
    let principal = match state.resolver.resolve(&credentials, now_ts()).await {
        Ok(principal) => principal,
        Err(err) => return error_response(&GatewayError::from(err).into_inner(), state.config.debug),
    };
    if principal.credential != CredentialKind::Session {
        return error_response(
            &GatewayError::authentication_required("billing requires a session").into_inner(),
            state.config.debug,
        );
    }
    let Some(user_id) = principal.user_id else {
        return error_response(
            &GatewayError::authentication_required("session has no user").into_inner(),
            state.config.debug,
        );
    };
    match state.billing.snapshot(&user_id).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(err) => error_response(&err.into_inner(), state.config.debug),
    }
}
