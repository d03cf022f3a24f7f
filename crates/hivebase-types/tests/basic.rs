use hivebase_types::prelude::*;

#[test]
fn principal_anonymous_defaults() {
    let principal = Principal::anonymous();
    assert!(principal.is_anonymous());
    assert_eq!(principal.tier, Tier::Anonymous);
    assert!(principal.rate_limit_enabled);
    assert!(principal.admin_scopes.is_empty());
    assert_eq!(principal.bucket_key("203.0.113.9"), "ip:203.0.113.9");
}

#[test]
fn bucket_key_prefers_user_id() {
    let mut principal = Principal::anonymous();
    principal.user_id = Some(UserId("u-42".into()));
    assert_eq!(principal.bucket_key("203.0.113.9"), "user:u-42");
}

#[test]
fn tier_serde_uses_lowercase_names() {
    let json = serde_json::to_string(&Tier::Flower).unwrap();
    assert_eq!(json, "\"flower\"");
    let back: Tier = serde_json::from_str("\"nectar\"").unwrap();
    assert_eq!(back, Tier::Nectar);
}

#[test]
fn expires_in_is_floor_seconds() {
    let expires = Timestamp(10_500);
    assert_eq!(expires.seconds_from(0), 10);
    assert_eq!(expires.seconds_from(10_499), 0);
    assert_eq!(expires.seconds_from(11_000), -1);
}
