use super::*;
use crate::identity::Role;
use crate::token_store::MemoryTokenStore;

// =============================================================================
// parse_identity
// =============================================================================

#[test]
fn parse_identity_reads_user_out() {
    let identity = parse_identity(r#"{"id":3,"username":"carol","role":"user"}"#).unwrap();
    assert_eq!(identity, Identity { id: 3, username: "carol".into(), role: Role::User });
}

#[test]
fn parse_identity_bad_role_is_decode_error() {
    let err = parse_identity(r#"{"id":3,"username":"carol","role":"root"}"#).unwrap_err();
    assert!(matches!(err, AuthError::Decode(_)));
}

// =============================================================================
// parse_token
// =============================================================================

#[test]
fn parse_token_accepts_bearer() {
    let token = parse_token(r#"{"access_token":"abc.def","token_type":"bearer"}"#).unwrap();
    assert_eq!(token, "abc.def");
}

#[test]
fn parse_token_missing_type_is_accepted() {
    assert_eq!(parse_token(r#"{"access_token":"abc"}"#).unwrap(), "abc");
}

#[test]
fn parse_token_rejects_other_types() {
    let err = parse_token(r#"{"access_token":"abc","token_type":"mac"}"#).unwrap_err();
    assert!(matches!(err, AuthError::Decode(msg) if msg.contains("mac")));
}

#[test]
fn parse_token_rejects_empty_token() {
    assert!(parse_token(r#"{"access_token":""}"#).is_err());
}

// =============================================================================
// rejection_detail
// =============================================================================

#[test]
fn rejection_detail_prefers_detail_string() {
    assert_eq!(rejection_detail(r#"{"detail":"Incorrect username or password"}"#), "Incorrect username or password");
}

#[test]
fn rejection_detail_uses_first_validation_msg() {
    let body = r#"{"detail":[{"loc":["body","password"],"msg":"String should have at least 6 characters"}]}"#;
    assert_eq!(rejection_detail(body), "String should have at least 6 characters");
}

#[test]
fn rejection_detail_falls_back_to_raw_body() {
    assert_eq!(rejection_detail("Bad Gateway\n"), "Bad Gateway");
    assert_eq!(rejection_detail(r#"{"error":"x"}"#), r#"{"error":"x"}"#);
}

// =============================================================================
// HttpAuthService
// =============================================================================

#[test]
fn endpoint_joins_base_url_without_double_slash() {
    let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
    let config = AuthConfig { base_url: "http://localhost:8000/".into(), ..AuthConfig::default() };
    let service = HttpAuthService::new(&config, tokens).unwrap();
    assert_eq!(service.endpoint(ME_PATH), "http://localhost:8000/api/v1/auth/me");
}

#[tokio::test]
async fn who_am_i_without_credential_skips_request() {
    let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
    // Unroutable port: any request attempt would surface as a transport error.
    let config = AuthConfig::default().with_base_url("http://127.0.0.1:1").unwrap();
    let service = HttpAuthService::new(&config, tokens).unwrap();
    let err = service.who_am_i().await.unwrap_err();
    assert!(matches!(err, AuthError::MissingCredential));
}

#[test]
fn clear_credential_empties_store() {
    let store = Arc::new(MemoryTokenStore::seeded(Credential::new("abc")));
    let service = HttpAuthService::new(&AuthConfig::default(), store.clone()).unwrap();
    service.clear_credential();
    assert!(store.load().is_none());
}
