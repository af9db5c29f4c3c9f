//! Typed view over the merged config JSON.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use serde::Serialize;
use serde_json::Value;

use crate::Backend;

pub const DEFAULT_ENDPOINT: &str = "https://slb.aliyuncs.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PAPER_STORE: &str = ".sacl/paper.json";
pub const DEFAULT_PAPER_MAX_ACLS: u64 = 50;
pub const DEFAULT_DELETE_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1_000;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaperSettings {
    pub store_path: PathBuf,
    /// Empty means every region is accepted.
    pub supported_regions: Vec<String>,
    pub max_acls: usize,
    pub delete_visibility_lag: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteSettings {
    pub timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    #[serde(serialize_with = "ser_backend")]
    pub backend: Backend,
    pub region: String,
    pub endpoint: String,
    pub request_timeout: Duration,
    pub paper: PaperSettings,
    pub delete: DeleteSettings,
}

fn ser_backend<S: serde::Serializer>(b: &Backend, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(b.as_str())
}

fn str_at<'a>(v: &'a Value, ptr: &str) -> Option<&'a str> {
    v.pointer(ptr)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn u64_at(v: &Value, ptr: &str, default: u64) -> Result<u64> {
    match v.pointer(ptr) {
        None | Some(Value::Null) => Ok(default),
        Some(x) => match x.as_u64() {
            Some(n) => Ok(n),
            None => bail!("CONFIG_INVALID {ptr}: expected a non-negative integer, got {x}"),
        },
    }
}

fn strings_at(v: &Value, ptr: &str) -> Result<Vec<String>> {
    match v.pointer(ptr) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|i| match i.as_str() {
                Some(s) => Ok(s.trim().to_string()),
                None => bail!("CONFIG_INVALID {ptr}: expected a list of strings"),
            })
            .collect(),
        Some(_) => bail!("CONFIG_INVALID {ptr}: expected a list of strings"),
    }
}

impl Settings {
    /// Read every setting the tool consumes. Keys read here must stay in sync
    /// with [`crate::consumed_pointers_for_backend`].
    pub fn from_config_json(v: &Value) -> Result<Self> {
        let backend: Backend = match str_at(v, "/remote/backend") {
            Some(b) => b.parse()?,
            None => bail!("CONFIG_MISSING_KEY /remote/backend"),
        };
        let region = match str_at(v, "/remote/region") {
            Some(r) => r.to_string(),
            None => bail!("CONFIG_MISSING_KEY /remote/region"),
        };
        let endpoint = str_at(v, "/remote/endpoint")
            .unwrap_or(DEFAULT_ENDPOINT)
            .trim_end_matches('/')
            .to_string();
        let request_timeout = Duration::from_secs(u64_at(
            v,
            "/remote/request_timeout_secs",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);

        let max_acls = u64_at(v, "/paper/max_acls", DEFAULT_PAPER_MAX_ACLS)?;
        let lag = u64_at(v, "/paper/delete_visibility_lag", 0)?;
        let paper = PaperSettings {
            store_path: PathBuf::from(
                str_at(v, "/paper/store_path").unwrap_or(DEFAULT_PAPER_STORE),
            ),
            supported_regions: strings_at(v, "/paper/supported_regions")?,
            max_acls: usize::try_from(max_acls)
                .map_err(|_| anyhow::anyhow!("CONFIG_INVALID /paper/max_acls: out of range"))?,
            delete_visibility_lag: u32::try_from(lag).map_err(|_| {
                anyhow::anyhow!("CONFIG_INVALID /paper/delete_visibility_lag: out of range")
            })?,
        };

        let delete = DeleteSettings {
            timeout: Duration::from_secs(u64_at(
                v,
                "/delete/timeout_secs",
                DEFAULT_DELETE_TIMEOUT_SECS,
            )?),
            initial_backoff: Duration::from_millis(u64_at(
                v,
                "/delete/initial_backoff_ms",
                DEFAULT_INITIAL_BACKOFF_MS,
            )?),
            max_backoff: Duration::from_millis(u64_at(
                v,
                "/delete/max_backoff_ms",
                DEFAULT_MAX_BACKOFF_MS,
            )?),
        };
        if delete.initial_backoff.is_zero() {
            bail!("CONFIG_INVALID /delete/initial_backoff_ms: must be > 0");
        }
        if delete.initial_backoff > delete.max_backoff {
            bail!(
                "CONFIG_INVALID /delete: initial_backoff_ms ({}) exceeds max_backoff_ms ({})",
                delete.initial_backoff.as_millis(),
                delete.max_backoff.as_millis()
            );
        }

        Ok(Self {
            backend,
            region,
            endpoint,
            request_timeout,
            paper,
            delete,
        })
    }
}
