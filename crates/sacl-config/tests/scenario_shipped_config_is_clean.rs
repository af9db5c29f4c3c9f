//! The config files shipped under `config/` load, hash, and are fully
//! consumed by the backend they select.

use std::path::PathBuf;

use sacl_config::{load_layered_yaml, report_unused_keys, Backend, Settings, UnusedKeyPolicy};

fn repo_file(rel: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join(rel)
        .to_string_lossy()
        .to_string()
}

#[test]
fn paper_layers_are_clean() {
    let base = repo_file("config/defaults/base.yaml");
    let paper = repo_file("config/backends/paper.yaml");
    let loaded = load_layered_yaml(&[base.as_str(), paper.as_str()]).unwrap();

    let settings = Settings::from_config_json(&loaded.config_json).unwrap();
    assert_eq!(settings.backend, Backend::Paper);

    report_unused_keys(Backend::Paper, &loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
}

#[test]
fn http_layers_are_clean() {
    let base = repo_file("config/defaults/base.yaml");
    let http = repo_file("config/backends/http.yaml");
    let loaded = load_layered_yaml(&[base.as_str(), http.as_str()]).unwrap();

    let settings = Settings::from_config_json(&loaded.config_json).unwrap();
    assert_eq!(settings.backend, Backend::Http);
    assert_eq!(settings.endpoint, "https://slb.aliyuncs.com");

    report_unused_keys(Backend::Http, &loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
}

#[test]
fn missing_file_names_the_path() {
    let err = load_layered_yaml(&["does/not/exist.yaml"]).unwrap_err();
    assert!(err.to_string().contains("does/not/exist.yaml"));
}
