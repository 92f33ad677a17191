use super::*;

fn bob() -> Identity {
    Identity { id: 1, username: "bob".to_owned(), role: Role::User }
}

// =============================================================
// Role serde
// =============================================================

#[test]
fn role_serializes_to_lowercase() {
    assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
}

#[test]
fn role_rejects_unknown_label() {
    assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
}

#[test]
fn role_display_matches_wire_label() {
    assert_eq!(Role::Admin.to_string(), "admin");
}

// =============================================================
// Identity
// =============================================================

#[test]
fn identity_decodes_user_out_payload() {
    let identity: Identity =
        serde_json::from_value(serde_json::json!({"id": 7, "username": "alice", "role": "admin"})).unwrap();
    assert_eq!(identity.id, 7);
    assert_eq!(identity.username, "alice");
    assert!(identity.is_admin());
}

#[test]
fn identity_ignores_extra_fields() {
    let identity: Identity = serde_json::from_value(
        serde_json::json!({"id": 1, "username": "bob", "role": "user", "created_at": "2024-01-01T00:00:00"}),
    )
    .unwrap();
    assert_eq!(identity, bob());
}

// =============================================================
// SessionState
// =============================================================

#[test]
fn session_state_default_is_signed_out_and_settled() {
    let state = SessionState::default();
    assert!(!state.is_signed_in());
    assert!(state.is_settled());
    assert_eq!(state.phase(), SessionPhase::SignedOut);
}

#[test]
fn session_phase_resolving_wins_over_identity() {
    let state = SessionState { identity: Some(bob()), resolving: true };
    assert_eq!(state.phase(), SessionPhase::Resolving);
}

#[test]
fn session_phase_signed_in_when_settled_with_identity() {
    let state = SessionState { identity: Some(bob()), resolving: false };
    assert_eq!(state.phase(), SessionPhase::SignedIn);
}

// =============================================================
// Credential
// =============================================================

#[test]
fn credential_debug_is_redacted() {
    let credential = Credential::new("secret-token");
    let rendered = format!("{credential:?}");
    assert!(!rendered.contains("secret-token"));
    assert_eq!(credential.expose(), "secret-token");
}
