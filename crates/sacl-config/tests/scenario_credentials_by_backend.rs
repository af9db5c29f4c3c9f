//! Backend-aware credential enforcement.
//!
//! Failure cases use globally unique sentinel env var names that are never
//! set anywhere, so no test mutates the process environment.

use sacl_config::load_layered_yaml_from_strings;
use sacl_config::secrets::{resolve_credentials, ResolvedCredentials};
use sacl_config::Backend;

fn load(yaml: &str) -> serde_json::Value {
    load_layered_yaml_from_strings(&[yaml])
        .expect("test yaml must parse cleanly")
        .config_json
}

const SENTINEL_YAML: &str = r#"
remote:
  keys_env:
    access_key_id: "SACL_SENTINEL_AKID_NEVER_SET_7F3A"
    access_key_secret: "SACL_SENTINEL_AKSECRET_NEVER_SET_7F3A"
"#;

#[test]
fn http_backend_fails_closed_naming_the_variable() {
    let err = resolve_credentials(&load(SENTINEL_YAML), Backend::Http).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("SECRETS_MISSING"), "got: {msg}");
    assert!(msg.contains("backend=http"), "got: {msg}");
    assert!(
        msg.contains("SACL_SENTINEL_AKID_NEVER_SET_7F3A"),
        "error must name the missing var, got: {msg}"
    );
}

#[test]
fn paper_backend_needs_no_credentials() {
    let creds = resolve_credentials(&load(SENTINEL_YAML), Backend::Paper).unwrap();
    assert!(creds.access_key_id.is_none());
    assert!(creds.access_key_secret.is_none());
}

#[test]
fn debug_output_is_redacted() {
    let creds = ResolvedCredentials {
        access_key_id: Some("LTAI5tRealLookingId".to_string()),
        access_key_secret: Some("super-secret-value".to_string()),
    };
    let dbg = format!("{creds:?}");
    assert!(dbg.contains("<REDACTED>"));
    assert!(!dbg.contains("LTAI5tRealLookingId"));
    assert!(!dbg.contains("super-secret-value"));
}
