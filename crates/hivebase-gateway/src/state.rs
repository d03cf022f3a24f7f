use std::env;
use std::sync::Arc;

use hivebase_admission::prelude::{AdmissionController, BucketStore, MemoryBucketStore};
use hivebase_analytics::prelude::{AnalyticsHandle, HttpSink, NullSink};
use hivebase_auth::prelude::{
    ApiKeyStore, Gate, IdentityResolver, MemoryApiKeyStore, MemoryReferrerStore,
    MemorySessionStore, MemoryUserStore, ReferrerStore, SessionStore, UserStore,
};
use hivebase_coalesce::prelude::InFlightTable;
use hivebase_pricing::prelude::ServiceRegistry;

use crate::backend::{BackendInvoker, EchoInvoker, HttpInvoker};
use crate::billing::{BillingProvider, MemoryBillingProvider};
use crate::config::{BackendSettings, GatewayConfig};
use crate::pipeline::SharedCallResult;

/// External collaborators injected into the gateway. Tests pass memory
/// implementations they keep handles to; production wires real stores.
pub struct Stores {
    pub sessions: Arc<dyn SessionStore>,
    pub keys: Arc<dyn ApiKeyStore>,
    pub referrers: Arc<dyn ReferrerStore>,
    pub users: Arc<dyn UserStore>,
    pub buckets: Arc<dyn BucketStore>,
    pub billing: Arc<dyn BillingProvider>,
    pub invoker: Arc<dyn BackendInvoker>,
    pub analytics: AnalyticsHandle,
}

impl Stores {
    /// All-in-memory wiring with the echo backend and a discarded
    /// analytics stream.
    pub fn in_memory(config: &GatewayConfig) -> Self {
        Stores {
            sessions: Arc::new(MemorySessionStore::default()),
            keys: Arc::new(MemoryApiKeyStore::default()),
            referrers: Arc::new(MemoryReferrerStore::default()),
            users: Arc::new(MemoryUserStore::default()),
            buckets: Arc::new(MemoryBucketStore::new(config.admission.bucket_config())),
            billing: Arc::new(MemoryBillingProvider::default()),
            invoker: Arc::new(EchoInvoker),
            analytics: hivebase_analytics::queue::spawn(
                Arc::new(NullSink),
                config.analytics.retry.clone(),
                config.analytics.queue_capacity,
            ),
        }
    }
}

#[derive(Clone)]
pub struct VersionInfo {
    pub version: String,
    pub commit: Option<String>,
}

impl VersionInfo {
    pub fn from_env() -> Self {
        Self {
            version: env::var("HIVE_GATEWAY_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            commit: env::var("GIT_COMMIT_HASH").ok(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub registry: Arc<ServiceRegistry>,
    pub resolver: Arc<IdentityResolver>,
    pub gate: Arc<Gate>,
    pub admission: Arc<AdmissionController>,
    pub inflight: InFlightTable<SharedCallResult>,
    pub keys: Arc<dyn ApiKeyStore>,
    pub users: Arc<dyn UserStore>,
    pub billing: Arc<dyn BillingProvider>,
    pub invoker: Arc<dyn BackendInvoker>,
    pub analytics: AnalyticsHandle,
    pub version: VersionInfo,
}

impl AppState {
    pub fn new(config: GatewayConfig, stores: Stores) -> anyhow::Result<Self> {
        let secrets = config.auth.admin_secrets()?;
        let registry = Arc::new(ServiceRegistry::with_default_catalog());
        let resolver = Arc::new(IdentityResolver::new(
            secrets,
            stores.sessions,
            stores.keys.clone(),
            stores.referrers,
        ));
        let gate = Arc::new(Gate::new(registry.clone(), config.gate.clone()));
        let admission = Arc::new(AdmissionController::new(stores.buckets));

        Ok(Self {
            config: Arc::new(config),
            registry,
            resolver,
            gate,
            admission,
            inflight: InFlightTable::default(),
            keys: stores.keys,
            users: stores.users,
            billing: stores.billing,
            invoker: stores.invoker,
            analytics: stores.analytics,
            version: VersionInfo::from_env(),
        })
    }

    /// Production wiring from configuration alone: memory stores, the
    /// configured backend, and the HTTP analytics sink when enabled.
    pub fn from_config(config: GatewayConfig) -> anyhow::Result<Self> {
        let mut stores = Stores::in_memory(&config);

        stores.invoker = match &config.backend {
            BackendSettings::Echo => Arc::new(EchoInvoker),
            BackendSettings::Http { base_url, .. } => Arc::new(
                HttpInvoker::new(base_url, config.backend.timeout())
                    .map_err(|err| anyhow::anyhow!("backend client: {err}"))?,
            ),
        };

        if config.analytics.enabled {
            let endpoint = config
                .analytics
                .endpoint
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("analytics.enabled requires analytics.endpoint"))?;
            let sink = HttpSink::new(endpoint, config.analytics.timeout())
                .map_err(|err| anyhow::anyhow!("analytics sink: {err}"))?;
            stores.analytics = hivebase_analytics::queue::spawn(
                Arc::new(sink),
                config.analytics.retry.clone(),
                config.analytics.queue_capacity,
            );
        }

        Self::new(config, stores)
    }
}
