//! Command handlers for `sacl`.
//!
//! Shared plumbing (config, remote construction, state and manifest files)
//! lives here. Command logic lives in the submodules.

pub mod converge;
pub mod lifecycle;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use sacl_config::secrets::resolve_credentials;
use sacl_config::{
    report_unused_keys, Backend, DeleteSettings, LoadedConfig, Settings, UnusedKeyPolicy,
};
use sacl_reconcile::DeletePolicy;
use sacl_remote::{AccessKey, HttpSlbClient, PaperConfig, PaperSlb, SlbClient};
use sacl_schemas::{AclSpec, AclState};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

pub struct RunContext {
    pub loaded: LoadedConfig,
    pub settings: Settings,
}

/// Load layered config, build typed settings, and log unused keys.
pub fn load_context(config_paths: &[String]) -> Result<RunContext> {
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = sacl_config::load_layered_yaml(&path_refs)?;
    let settings = Settings::from_config_json(&loaded.config_json)?;

    let report = report_unused_keys(settings.backend, &loaded.config_json, UnusedKeyPolicy::Warn)?;
    for pointer in &report.unused_leaf_pointers {
        warn!(pointer = %pointer, backend = %settings.backend, "unused config key");
    }

    info!(
        config_hash = %loaded.config_hash,
        backend = %settings.backend,
        region = %settings.region,
        "config loaded"
    );
    Ok(RunContext { loaded, settings })
}

pub fn config_hash(paths: &[String]) -> Result<()> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = sacl_config::load_layered_yaml(&path_refs)?;
    print_json(&serde_json::json!({
        "config_hash": loaded.config_hash,
        "config": loaded.config_json,
    }))
}

pub fn delete_policy(d: &DeleteSettings) -> DeletePolicy {
    DeletePolicy {
        timeout: d.timeout,
        initial_backoff: d.initial_backoff,
        max_backoff: d.max_backoff,
        ..DeletePolicy::default()
    }
}

// ---------------------------------------------------------------------------
// Remote
// ---------------------------------------------------------------------------

/// The configured remote. The paper backend is loaded from and saved back to
/// its store file around each command.
pub enum Remote {
    Paper { slb: PaperSlb, store_path: PathBuf },
    Http(HttpSlbClient),
}

impl Remote {
    pub fn open(ctx: &RunContext) -> Result<Self> {
        let s = &ctx.settings;
        match s.backend {
            Backend::Paper => {
                let config = PaperConfig {
                    region: s.region.clone(),
                    supported_regions: s.paper.supported_regions.clone(),
                    max_acls: s.paper.max_acls,
                    delete_visibility_lag: s.paper.delete_visibility_lag,
                };
                let slb = PaperSlb::load_or_new(&s.paper.store_path, config)?;
                Ok(Remote::Paper {
                    slb,
                    store_path: s.paper.store_path.clone(),
                })
            }
            Backend::Http => {
                let creds = resolve_credentials(&ctx.loaded.config_json, Backend::Http)?;
                let access_key = creds
                    .access_key_id
                    .zip(creds.access_key_secret)
                    .map(|(id, secret)| AccessKey::new(id, secret));
                let client = HttpSlbClient::new(&s.endpoint, &s.region, s.request_timeout)?
                    .with_access_key(access_key);
                Ok(Remote::Http(client))
            }
        }
    }

    pub fn client(&self) -> &dyn SlbClient {
        match self {
            Remote::Paper { slb, .. } => slb,
            Remote::Http(c) => c,
        }
    }

    /// Save paper-backend state. No-op for the real remote.
    pub fn persist(&self) -> Result<()> {
        if let Remote::Paper { slb, store_path } = self {
            slb.save(store_path)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// A missing state file is an empty record.
pub fn load_state(path: &str) -> Result<AclState> {
    let p = Path::new(path);
    if !p.exists() {
        return Ok(AclState::empty());
    }
    let raw = fs::read_to_string(p).with_context(|| format!("failed to read state file: {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("state file is not valid JSON: {path}"))
}

pub fn save_state(path: &str, state: &AclState) -> Result<()> {
    let p = Path::new(path);
    if let Some(dir) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create state dir: {}", dir.display()))?;
    }
    let mut raw = serde_json::to_string_pretty(state).context("serialize state failed")?;
    raw.push('\n');
    fs::write(p, raw).with_context(|| format!("failed to write state file: {path}"))
}

/// Parse and validate a desired-state manifest.
pub fn load_manifest(path: &str) -> Result<AclSpec> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed to read manifest: {path}"))?;
    let spec: AclSpec =
        serde_yaml::from_str(&raw).with_context(|| format!("manifest is not valid YAML: {path}"))?;
    spec.validate()
        .with_context(|| format!("MANIFEST_INVALID {path}"))?;
    Ok(spec)
}

pub fn print_json<T: Serialize>(v: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(v).context("serialize output failed")?;
    println!("{s}");
    Ok(())
}
