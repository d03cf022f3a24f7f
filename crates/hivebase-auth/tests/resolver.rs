use std::sync::Arc;

use hivebase_auth::prelude::*;
use hivebase_types::prelude::*;

const NOW: Timestamp = Timestamp(1_754_000_000_000);

struct Fixture {
    resolver: IdentityResolver,
    keys: MemoryApiKeyStore,
}

fn fixture() -> Fixture {
    let sessions = MemorySessionStore::default();
    sessions.insert(
        "sess-abc",
        SessionRecord {
            user_id: UserId("u-7".into()),
            username: "beekeeper".into(),
            tier: Tier::Flower,
        },
    );

    let keys = MemoryApiKeyStore::default();
    keys.insert(
        "sk_live_ok",
        KeyRecord {
            kind: KeyKind::Secret,
            name: "prod".into(),
            user_id: UserId("u-1".into()),
            username: "worker".into(),
            tier: Tier::Nectar,
            permissions: None,
            pollen_budget: Some(25.0),
            rate_limit_enabled: false,
            expires_at: None,
        },
    );
    keys.insert(
        "pk_site",
        KeyRecord {
            kind: KeyKind::Publishable,
            name: "site".into(),
            user_id: UserId("u-2".into()),
            username: "frontend".into(),
            tier: Tier::Seed,
            permissions: Some(vec![ServiceId("openai-fast".into())]),
            pollen_budget: None,
            rate_limit_enabled: false,
            expires_at: Some(Timestamp(NOW.0 + 86_400_000)),
        },
    );
    keys.insert(
        "sk_expired",
        KeyRecord {
            kind: KeyKind::Secret,
            name: "old".into(),
            user_id: UserId("u-3".into()),
            username: "old".into(),
            tier: Tier::Seed,
            permissions: None,
            pollen_budget: None,
            rate_limit_enabled: false,
            expires_at: Some(Timestamp(NOW.0 - 1)),
        },
    );

    let referrers = MemoryReferrerStore::default();
    referrers.insert(ReferrerRecord {
        domain: "app.example.com".into(),
        user_id: UserId("u-9".into()),
        username: "partner".into(),
        tier: Tier::Seed,
    });

    let secrets = AdminSecrets {
        admin: Some("admin-secret".into()),
        refill: Some("refill-secret".into()),
    };

    Fixture {
        resolver: IdentityResolver::new(
            secrets,
            Arc::new(sessions),
            Arc::new(keys.clone()),
            Arc::new(referrers),
        ),
        keys,
    }
}

#[tokio::test]
async fn no_credential_resolves_anonymous() {
    let fx = fixture();
    let principal = fx
        .resolver
        .resolve(&RequestCredentials::anonymous("198.51.100.1"), NOW)
        .await
        .unwrap();
    assert!(principal.is_anonymous());
    assert_eq!(principal.tier, Tier::Anonymous);
    assert!(principal.rate_limit_enabled);
}

#[tokio::test]
async fn admin_secret_grants_both_scopes_refill_secret_one() {
    let fx = fixture();
    let mut creds = RequestCredentials::anonymous("ip");
    creds.admin_token = Some("admin-secret".into());
    let admin = fx.resolver.resolve(&creds, NOW).await.unwrap();
    assert_eq!(admin.credential, CredentialKind::AdminToken);
    assert!(admin.has_admin_scope(AdminScope::UpdateTier));
    assert!(admin.has_admin_scope(AdminScope::TriggerRefill));
    assert!(!admin.rate_limit_enabled);

    creds.admin_token = Some("refill-secret".into());
    let refill = fx.resolver.resolve(&creds, NOW).await.unwrap();
    assert!(!refill.has_admin_scope(AdminScope::UpdateTier));
    assert!(refill.has_admin_scope(AdminScope::TriggerRefill));

    creds.admin_token = Some("wrong".into());
    let err = fx.resolver.resolve(&creds, NOW).await.unwrap_err();
    assert_eq!(err.0.code, "AUTH_INVALID_CREDENTIAL");
}

#[tokio::test]
async fn session_cookie_yields_full_principal() {
    let fx = fixture();
    let mut creds = RequestCredentials::anonymous("ip");
    creds.session_token = Some("sess-abc".into());
    let principal = fx.resolver.resolve(&creds, NOW).await.unwrap();
    assert_eq!(principal.credential, CredentialKind::Session);
    assert_eq!(principal.tier, Tier::Flower);
    assert_eq!(principal.username, "beekeeper");

    creds.session_token = Some("sess-bogus".into());
    let err = fx.resolver.resolve(&creds, NOW).await.unwrap_err();
    assert_eq!(err.0.code, "AUTH_INVALID_CREDENTIAL");
}

#[tokio::test]
async fn secret_key_resolves_with_budget_and_no_rate_limit() {
    let fx = fixture();
    let mut creds = RequestCredentials::anonymous("ip");
    creds.bearer = Some("sk_live_ok".into());
    let principal = fx.resolver.resolve(&creds, NOW).await.unwrap();
    assert_eq!(principal.credential, CredentialKind::SecretKey);
    assert_eq!(principal.tier, Tier::Nectar);
    assert_eq!(principal.pollen_budget, Some(25.0));
    assert!(!principal.rate_limit_enabled);
}

#[tokio::test]
async fn publishable_key_is_always_rate_limited() {
    let fx = fixture();
    let mut creds = RequestCredentials::anonymous("ip");
    creds.key_header = Some("pk_site".into());
    let principal = fx.resolver.resolve(&creds, NOW).await.unwrap();
    assert_eq!(principal.credential, CredentialKind::PublishableKey);
    // The stored record said false; publishable keys get limited anyway.
    assert!(principal.rate_limit_enabled);
    assert_eq!(
        principal.permissions,
        Some(vec![ServiceId("openai-fast".into())])
    );
}

#[tokio::test]
async fn any_prefix_is_accepted_from_the_query_parameter() {
    let fx = fixture();
    fx.keys.insert(
        "legacy-key",
        KeyRecord {
            kind: KeyKind::Secret,
            name: "legacy".into(),
            user_id: UserId("u-4".into()),
            username: "legacy".into(),
            tier: Tier::Seed,
            permissions: None,
            pollen_budget: None,
            rate_limit_enabled: true,
            expires_at: None,
        },
    );
    let mut creds = RequestCredentials::anonymous("ip");
    creds.key_query = Some("legacy-key".into());
    let principal = fx.resolver.resolve(&creds, NOW).await.unwrap();
    assert_eq!(principal.username, "legacy");

    creds.key_query = Some("garbage-value".into());
    let err = fx.resolver.resolve(&creds, NOW).await.unwrap_err();
    assert_eq!(err.0.code, "AUTH_INVALID_CREDENTIAL");
}

#[tokio::test]
async fn expired_key_is_invalid_not_anonymous() {
    let fx = fixture();
    let mut creds = RequestCredentials::anonymous("ip");
    creds.bearer = Some("sk_expired".into());
    let err = fx.resolver.resolve(&creds, NOW).await.unwrap_err();
    assert_eq!(err.0.code, "AUTH_INVALID_CREDENTIAL");
    assert_eq!(err.0.http_status, 401);
}

#[tokio::test]
async fn registered_referrer_maps_to_its_user() {
    let fx = fixture();
    let mut creds = RequestCredentials::anonymous("ip");
    creds.referrer = Some("https://app.example.com/generate?x=1".into());
    let principal = fx.resolver.resolve(&creds, NOW).await.unwrap();
    assert_eq!(principal.credential, CredentialKind::TrustedReferrer);
    assert_eq!(principal.tier, Tier::Seed);
    assert!(principal.permissions.is_none());
}

#[tokio::test]
async fn unregistered_referrer_falls_through_to_anonymous() {
    let fx = fixture();
    let mut creds = RequestCredentials::anonymous("ip");
    creds.referrer = Some("https://stranger.example.net/".into());
    let principal = fx.resolver.resolve(&creds, NOW).await.unwrap();
    assert!(principal.is_anonymous());
}

#[tokio::test]
async fn session_takes_precedence_over_api_key() {
    let fx = fixture();
    let mut creds = RequestCredentials::anonymous("ip");
    creds.session_token = Some("sess-abc".into());
    creds.bearer = Some("sk_live_ok".into());
    let principal = fx.resolver.resolve(&creds, NOW).await.unwrap();
    assert_eq!(principal.credential, CredentialKind::Session);
}
