use hivebase_pricing::prelude::*;
use hivebase_types::prelude::{ServiceId, Timestamp};

// Any moment after every catalog card is effective.
const NOW: Timestamp = Timestamp(1_754_000_000_000);

fn registry() -> ServiceRegistry {
    ServiceRegistry::with_default_catalog()
}

#[test]
fn every_alias_resolves_to_its_service() {
    let registry = registry();
    for service in registry.services() {
        let via_id = registry.resolve_service_id(service.service_id.as_str());
        assert_eq!(via_id, Some(service.service_id.clone()));
        for alias in &service.aliases {
            assert_eq!(
                registry.resolve_service_id(alias),
                Some(service.service_id.clone()),
                "alias {alias} should resolve to {}",
                service.service_id
            );
        }
    }
}

#[test]
fn unknown_name_resolves_to_none() {
    assert_eq!(registry().resolve_service_id("no-such-service"), None);
}

#[test]
fn alias_scan_is_case_sensitive_but_model_lookup_is_not() {
    let registry = registry();
    assert_eq!(registry.resolve_service_id("FLUX-DEV"), None);
    let service = registry.resolve_model("Flux-Dev").expect("model lookup");
    assert_eq!(service.service_id, ServiceId("flux".into()));
}

#[test]
fn cost_scales_linearly() {
    let registry = registry();
    let usage = Usage::new()
        .with(UsageKind::PromptTextTokens, 1_000.0)
        .with(UsageKind::CompletionTextTokens, 2_000.0);
    let one = registry.calculate_cost("gpt-5-nano", &usage, NOW).unwrap();
    for k in [2.0, 7.0, 1_000.0] {
        let scaled = registry
            .calculate_cost("gpt-5-nano", &usage.scaled(k), NOW)
            .unwrap();
        let expected = one.total * k;
        assert!(
            (scaled.total - expected).abs() < 1e-6,
            "k={k}: {} vs {expected}",
            scaled.total
        );
    }
}

#[test]
fn free_service_means_zero_price_not_zero_cost() {
    let registry = registry();
    let fast = ServiceId("openai-fast".into());
    assert!(registry.is_free_service(&fast, NOW));

    let usage = Usage::new()
        .with(UsageKind::PromptTextTokens, 10_000.0)
        .with(UsageKind::CompletionTextTokens, 10_000.0);
    let price = registry.calculate_price(&fast, &usage, NOW).unwrap();
    assert_eq!(price.total, 0.0);
    let cost = registry.calculate_cost("gpt-4.1-nano", &usage, NOW).unwrap();
    assert!(cost.total > 0.0);

    // Paid services are not free.
    assert!(!registry.is_free_service(&ServiceId("openai".into()), NOW));
    assert!(!registry.is_free_service(&ServiceId("veo".into()), NOW));
}

#[test]
fn unknown_usage_kind_never_prices_as_zero() {
    let registry = registry();
    let usage = Usage::new().with(UsageKind::CompletionVideoSeconds, 8.0);
    let err = registry
        .calculate_price(&ServiceId("openai".into()), &usage, NOW)
        .unwrap_err();
    assert_eq!(err.0.code, "PRICING_UNKNOWN_USAGE_KIND");
    assert_eq!(err.0.http_status, 500);
}

#[test]
fn newer_rate_card_takes_over_after_its_date() {
    let registry = registry();
    let usage = Usage::new().with(UsageKind::CompletionVideoSeconds, 10.0);
    let veo = ServiceId("veo".into());

    let before = Timestamp(RATES_2025_06.0 - 1);
    let cost_before = registry.calculate_cost("veo-3", &usage, before).unwrap();
    assert_eq!(cost_before.total, 0.4);

    let cost_after = registry.calculate_cost("veo-3", &usage, NOW).unwrap();
    assert_eq!(cost_after.total, 0.25);

    // Before any card is effective there is no active definition.
    let err = registry
        .calculate_price(&veo, &usage, Timestamp(RATES_2025_01.0))
        .unwrap_err();
    assert_eq!(err.0.code, "PRICING_NO_ACTIVE_DEFINITION");
}

#[test]
fn markup_price_exceeds_cost() {
    let registry = registry();
    let usage = Usage::new()
        .with(UsageKind::PromptTextTokens, 1_000.0)
        .with(UsageKind::CompletionTextTokens, 1_000.0);
    let cost = registry.calculate_cost("gpt-5", &usage, NOW).unwrap();
    let price = registry
        .calculate_price(&ServiceId("openai-large".into()), &usage, NOW)
        .unwrap();
    assert!((price.total - cost.total * 1.25).abs() < 1e-8);
}

#[test]
fn all_catalog_rates_round_trip_through_micro_pollen() {
    for service in registry().services() {
        for card in service.cost.iter().chain(service.price.iter()) {
            for (kind, rate) in &card.rates {
                // Token rates are tiny; round-trip at micro-pollen per
                // million units, the granularity amounts are stored at.
                let per_million = round8(rate * 1_000_000.0);
                let micro = to_micro_pollen(per_million);
                assert!(
                    (from_micro_pollen(micro) - per_million).abs() < 1e-9,
                    "{} {:?} rate {rate} does not round-trip",
                    service.service_id,
                    kind
                );
            }
        }
    }
}
