use std::path::PathBuf;
use std::time::Duration;

use sacl_config::{load_layered_yaml_from_strings, Backend, Settings};

const BASE: &str = r#"
remote:
  backend: paper
  region: cn-shanghai
paper:
  store_path: "state/paper.json"
  supported_regions: ["cn-hangzhou", "cn-shanghai"]
  max_acls: 3
  delete_visibility_lag: 2
delete:
  timeout_secs: 120
  initial_backoff_ms: 500
  max_backoff_ms: 4000
"#;

fn settings(docs: &[&str]) -> anyhow::Result<Settings> {
    let loaded = load_layered_yaml_from_strings(docs)?;
    Settings::from_config_json(&loaded.config_json)
}

#[test]
fn every_consumed_key_reaches_settings() {
    let s = settings(&[BASE]).unwrap();

    assert_eq!(s.backend, Backend::Paper);
    assert_eq!(s.region, "cn-shanghai");
    assert_eq!(s.paper.store_path, PathBuf::from("state/paper.json"));
    assert_eq!(s.paper.supported_regions, vec!["cn-hangzhou", "cn-shanghai"]);
    assert_eq!(s.paper.max_acls, 3);
    assert_eq!(s.paper.delete_visibility_lag, 2);
    assert_eq!(s.delete.timeout, Duration::from_secs(120));
    assert_eq!(s.delete.initial_backoff, Duration::from_millis(500));
    assert_eq!(s.delete.max_backoff, Duration::from_secs(4));
}

#[test]
fn http_overlay_switches_backend_and_endpoint() {
    let overlay = r#"
remote:
  backend: http
  endpoint: "https://slb.cn-shanghai.aliyuncs.com/"
  request_timeout_secs: 5
"#;
    let s = settings(&[BASE, overlay]).unwrap();
    assert_eq!(s.backend, Backend::Http);
    assert_eq!(s.endpoint, "https://slb.cn-shanghai.aliyuncs.com");
    assert_eq!(s.request_timeout, Duration::from_secs(5));
}

#[test]
fn missing_backend_is_reported_by_pointer() {
    let err = settings(&["remote:\n  region: cn-hangzhou\n"]).unwrap_err();
    assert!(err.to_string().contains("CONFIG_MISSING_KEY /remote/backend"));
}

#[test]
fn missing_region_is_reported_by_pointer() {
    let err = settings(&["remote:\n  backend: paper\n"]).unwrap_err();
    assert!(err.to_string().contains("CONFIG_MISSING_KEY /remote/region"));
}

#[test]
fn unknown_backend_is_rejected() {
    let err = settings(&["remote:\n  backend: grpc\n  region: r\n"]).unwrap_err();
    assert!(err.to_string().contains("unknown backend 'grpc'"));
}

#[test]
fn backoff_bounds_are_checked() {
    let overlay = "delete:\n  initial_backoff_ms: 20000\n";
    let err = settings(&[BASE, overlay]).unwrap_err();
    assert!(err.to_string().contains("exceeds max_backoff_ms"));
}
