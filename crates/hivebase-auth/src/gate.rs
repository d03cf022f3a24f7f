use std::sync::Arc;

use serde::{Deserialize, Serialize};

use hivebase_pricing::prelude::{ServiceDefinition, ServiceRegistry};
use hivebase_types::prelude::{Principal, ServiceId, Timestamp};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default = "GateConfig::default_enable_fallback")]
    pub enable_fallback: bool,
    #[serde(default = "GateConfig::default_allow_anonymous_usage")]
    pub allow_anonymous_usage: bool,
    /// Preferred substitutes when the requested service is unavailable to
    /// the caller, tried in order after a same-provider match.
    #[serde(default = "GateConfig::default_fallback_priority")]
    pub fallback_priority: Vec<ServiceId>,
}

impl GateConfig {
    fn default_enable_fallback() -> bool {
        true
    }

    fn default_allow_anonymous_usage() -> bool {
        true
    }

    fn default_fallback_priority() -> Vec<ServiceId> {
        vec![
            ServiceId("openai-fast".into()),
            ServiceId("openai".into()),
            ServiceId("mistral".into()),
        ]
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enable_fallback: Self::default_enable_fallback(),
            allow_anonymous_usage: Self::default_allow_anonymous_usage(),
            fallback_priority: Self::default_fallback_priority(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// Anonymous calls are switched off entirely.
    AnonymousDisallowed,
    /// Anonymous callers may only use free services.
    AnonymousPaidService,
    InsufficientTier,
    PermissionDenied,
    NotFound,
}

#[derive(Clone, Debug, Serialize)]
pub struct GateDecision {
    pub allowed: bool,
    pub service: Option<ServiceId>,
    pub fallback_used: bool,
    pub deny: Option<DenyReason>,
}

impl GateDecision {
    fn allow(service: ServiceId, fallback_used: bool) -> Self {
        Self {
            allowed: true,
            service: Some(service),
            fallback_used,
            deny: None,
        }
    }

    fn deny(reason: DenyReason) -> Self {
        Self {
            allowed: false,
            service: None,
            fallback_used: false,
            deny: Some(reason),
        }
    }
}

/// Decides whether a principal may invoke a service, substituting an
/// accessible fallback when permitted. Pure over its inputs; never mutates
/// the registry.
pub struct Gate {
    registry: Arc<ServiceRegistry>,
    config: GateConfig,
}

impl Gate {
    pub fn new(registry: Arc<ServiceRegistry>, config: GateConfig) -> Self {
        Self { registry, config }
    }

    pub fn authorize(&self, principal: &Principal, requested: &str, now: Timestamp) -> GateDecision {
        let resolved = self
            .registry
            .resolve_service_id(requested)
            .or_else(|| {
                self.registry
                    .resolve_model(requested)
                    .map(|service| service.service_id.clone())
            });

        let denied = match resolved.and_then(|id| self.registry.service(&id)) {
            Some(service) => match self.can_access(principal, service, now) {
                Ok(()) => return GateDecision::allow(service.service_id.clone(), false),
                Err(reason) => (Some(service.provider.clone()), reason),
            },
            None => (None, DenyReason::NotFound),
        };

        let (provider_hint, reason) = denied;
        if self.config.enable_fallback {
            if let Some(fallback) = self.select_fallback(principal, provider_hint.as_deref(), now) {
                return GateDecision::allow(fallback, true);
            }
        }
        GateDecision::deny(reason)
    }

    fn can_access(
        &self,
        principal: &Principal,
        service: &ServiceDefinition,
        now: Timestamp,
    ) -> Result<(), DenyReason> {
        if principal.is_anonymous() {
            if !self.config.allow_anonymous_usage {
                return Err(DenyReason::AnonymousDisallowed);
            }
            if !self.registry.is_free_service(&service.service_id, now) {
                return Err(DenyReason::AnonymousPaidService);
            }
        }
        if !principal.tier.satisfies(service.required_tier) {
            return Err(DenyReason::InsufficientTier);
        }
        if let Some(allowed) = principal.permissions.as_deref() {
            let permitted = service
                .permission_names()
                .any(|name| allowed.iter().any(|entry| entry.as_str() == name));
            if !permitted {
                return Err(DenyReason::PermissionDenied);
            }
        }
        Ok(())
    }

    fn select_fallback(
        &self,
        principal: &Principal,
        provider_hint: Option<&str>,
        now: Timestamp,
    ) -> Option<ServiceId> {
        if let Some(provider) = provider_hint {
            if let Some(service) = self.registry.services().find(|service| {
                service.provider == provider && self.can_access(principal, service, now).is_ok()
            }) {
                return Some(service.service_id.clone());
            }
        }
        for preferred in &self.config.fallback_priority {
            if let Some(service) = self.registry.service(preferred) {
                if self.can_access(principal, service, now).is_ok() {
                    return Some(service.service_id.clone());
                }
            }
        }
        self.registry
            .services()
            .find(|service| self.can_access(principal, service, now).is_ok())
            .map(|service| service.service_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hivebase_types::prelude::{CredentialKind, Tier, UserId};

    const NOW: Timestamp = Timestamp(1_754_000_000_000);

    fn gate(config: GateConfig) -> Gate {
        Gate::new(Arc::new(ServiceRegistry::with_default_catalog()), config)
    }

    fn seed_user() -> Principal {
        Principal {
            user_id: Some(UserId("u-1".into())),
            username: "worker".into(),
            tier: Tier::Seed,
            credential: CredentialKind::SecretKey,
            permissions: None,
            pollen_budget: None,
            rate_limit_enabled: false,
            expires_at: None,
            admin_scopes: Vec::new(),
        }
    }

    #[test]
    fn tier_gates_and_falls_back() {
        let gate = gate(GateConfig::default());
        let decision = gate.authorize(&seed_user(), "openai-large", NOW);
        // Seed cannot reach the flower-tier service; the same-provider
        // fallback kicks in.
        assert!(decision.allowed);
        assert!(decision.fallback_used);
        let fallback = decision.service.unwrap();
        assert_ne!(fallback.as_str(), "openai-large");

        let no_fallback = Gate::new(
            Arc::new(ServiceRegistry::with_default_catalog()),
            GateConfig {
                enable_fallback: false,
                ..GateConfig::default()
            },
        );
        let denied = no_fallback.authorize(&seed_user(), "openai-large", NOW);
        assert!(!denied.allowed);
        assert_eq!(denied.deny, Some(DenyReason::InsufficientTier));
    }

    #[test]
    fn same_provider_fallback_is_preferred() {
        let gate = gate(GateConfig::default());
        let decision = gate.authorize(&seed_user(), "openai-large", NOW);
        let fallback = decision.service.unwrap();
        let registry = ServiceRegistry::with_default_catalog();
        assert_eq!(
            registry.service(&fallback).unwrap().provider,
            "azure-openai"
        );
    }

    #[test]
    fn permission_allow_list_wins_over_tier() {
        let mut principal = seed_user();
        principal.permissions = Some(vec![
            ServiceId("openai-fast".into()),
            ServiceId("flux".into()),
        ]);
        let gate = Gate::new(
            Arc::new(ServiceRegistry::with_default_catalog()),
            GateConfig {
                enable_fallback: false,
                ..GateConfig::default()
            },
        );
        assert!(gate.authorize(&principal, "openai-fast", NOW).allowed);
        assert!(gate.authorize(&principal, "flux", NOW).allowed);
        let denied = gate.authorize(&principal, "openai", NOW);
        assert_eq!(denied.deny, Some(DenyReason::PermissionDenied));
    }

    #[test]
    fn pop_identifier_satisfies_the_allow_list() {
        let mut principal = seed_user();
        principal.permissions = Some(vec![ServiceId("flux-pop".into())]);
        let gate = Gate::new(
            Arc::new(ServiceRegistry::with_default_catalog()),
            GateConfig {
                enable_fallback: false,
                ..GateConfig::default()
            },
        );
        assert!(gate.authorize(&principal, "flux", NOW).allowed);
    }

    #[test]
    fn anonymous_policy_switch() {
        let closed = gate(GateConfig {
            allow_anonymous_usage: false,
            enable_fallback: false,
            ..GateConfig::default()
        });
        let anon = Principal::anonymous();
        let denied = closed.authorize(&anon, "openai-fast", NOW);
        assert_eq!(denied.deny, Some(DenyReason::AnonymousDisallowed));

        let open = gate(GateConfig {
            enable_fallback: false,
            ..GateConfig::default()
        });
        assert!(open.authorize(&anon, "openai-fast", NOW).allowed);
        let paid = open.authorize(&anon, "openai", NOW);
        assert_eq!(paid.deny, Some(DenyReason::AnonymousPaidService));
    }

    #[test]
    fn unknown_service_is_not_found_without_fallback() {
        let gate = gate(GateConfig {
            enable_fallback: false,
            ..GateConfig::default()
        });
        let decision = gate.authorize(&seed_user(), "imaginary", NOW);
        assert_eq!(decision.deny, Some(DenyReason::NotFound));
    }

    #[test]
    fn unknown_service_falls_back_when_enabled() {
        let gate = gate(GateConfig::default());
        let decision = gate.authorize(&seed_user(), "imaginary", NOW);
        assert!(decision.allowed);
        assert!(decision.fallback_used);
        assert_eq!(decision.service.unwrap().as_str(), "openai-fast");
    }
}
