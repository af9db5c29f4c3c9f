//! Blocking HTTP adapter speaking the remote's RPC-style API.
//!
//! Each call is a single `GET {endpoint}/?Action=...` with the action's
//! parameters in the query string. Successful responses are JSON bodies;
//! failures carry `{"Code": ..., "Message": ...}` with a non-2xx status.
//!
//! With an [`AccessKey`] configured every request is signed (see
//! [`crate::sign`]). Without one, requests go out unsigned, which only a
//! mock or a signing proxy in front of the endpoint will accept.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::debug;

use sacl_schemas::{Entry, IpVersion};

use crate::error::{Operation, RemoteError};
use crate::sign::{canonical_query, sign_params, AccessKey};
use crate::types::{encode_entries, AclAttributes, CreateAclResponse, ErrorBody};
use crate::{RemoteResult, SlbClient};

pub const DEFAULT_ENDPOINT: &str = "https://slb.aliyuncs.com";
pub const API_VERSION: &str = "2014-05-15";

pub struct HttpSlbClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    region: String,
    access_key: Option<AccessKey>,
}

impl std::fmt::Debug for HttpSlbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSlbClient")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .finish()
    }
}

impl HttpSlbClient {
    pub fn new(
        endpoint: impl Into<String>,
        region: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            region: region.into(),
            access_key: None,
        })
    }

    pub fn with_access_key(mut self, access_key: Option<AccessKey>) -> Self {
        self.access_key = access_key;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn is_signing(&self) -> bool {
        self.access_key.is_some()
    }

    fn url(&self) -> String {
        format!("{}/", self.endpoint.trim_end_matches('/'))
    }

    /// Full parameter set for one action, signed when a key is configured.
    fn request_params(
        &self,
        op: Operation,
        acl_id: Option<&str>,
        params: &[(&str, &str)],
    ) -> RemoteResult<BTreeMap<String, String>> {
        let mut query: BTreeMap<String, String> = BTreeMap::new();
        query.insert("Action".into(), op.action().into());
        query.insert("Version".into(), API_VERSION.into());
        query.insert("RegionId".into(), self.region.clone());
        query.insert("Format".into(), "JSON".into());
        if let Some(id) = acl_id {
            query.insert("AclId".into(), id.into());
        }
        for (k, v) in params {
            query.insert((*k).into(), (*v).into());
        }

        if let Some(key) = &self.access_key {
            let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
            let nonce = uuid::Uuid::new_v4().to_string();
            sign_params(&mut query, key, &timestamp, &nonce).map_err(|e| {
                RemoteError::transport(op, acl_id, format!("request signing failed: {e}"))
            })?;
        }
        Ok(query)
    }

    /// Issue one action and decode its JSON body into `T`.
    fn call<T: DeserializeOwned>(
        &self,
        op: Operation,
        acl_id: Option<&str>,
        params: &[(&str, &str)],
    ) -> RemoteResult<T> {
        let query = self.request_params(op, acl_id, params)?;

        debug!(op = %op, acl_id = acl_id.unwrap_or(""), signed = self.is_signing(), "remote call");

        // Encoded by hand so the bytes on the wire match what was signed.
        let url = format!("{}?{}", self.url(), canonical_query(&query));
        let resp = self
            .http
            .get(url)
            .send()
            .map_err(|e| RemoteError::transport(op, acl_id, format!("request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| RemoteError::transport(op, acl_id, format!("read body failed: {e}")))?;

        if !status.is_success() {
            let err: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
            let message = err
                .message
                .unwrap_or_else(|| format!("http status {}", status.as_u16()));
            return Err(match err.code {
                Some(code) => RemoteError::from_code(op, acl_id, code, message),
                None => RemoteError::transport(op, acl_id, message),
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| RemoteError::transport(op, acl_id, format!("response decode failed: {e}")))
    }

    fn call_unit(&self, op: Operation, acl_id: &str, params: &[(&str, &str)]) -> RemoteResult<()> {
        let _: serde_json::Value = self.call(op, Some(acl_id), params)?;
        Ok(())
    }

    fn entries_param(op: Operation, acl_id: &str, entries: &[Entry]) -> RemoteResult<String> {
        encode_entries(entries).map_err(|e| {
            RemoteError::transport(op, Some(acl_id), format!("entry encode failed: {e}"))
        })
    }
}

impl SlbClient for HttpSlbClient {
    fn create_acl(&self, name: &str, ip_version: IpVersion) -> RemoteResult<String> {
        let resp: CreateAclResponse = self.call(
            Operation::Create,
            None,
            &[("AclName", name), ("AddressIPVersion", ip_version.as_str())],
        )?;
        Ok(resp.acl_id)
    }

    fn describe_acl(&self, acl_id: &str) -> RemoteResult<AclAttributes> {
        self.call(Operation::Describe, Some(acl_id), &[])
    }

    fn set_acl_attributes(&self, acl_id: &str, name: &str) -> RemoteResult<()> {
        self.call_unit(Operation::SetAttributes, acl_id, &[("AclName", name)])
    }

    fn add_entries(&self, acl_id: &str, entries: &[Entry]) -> RemoteResult<()> {
        let encoded = Self::entries_param(Operation::AddEntries, acl_id, entries)?;
        self.call_unit(Operation::AddEntries, acl_id, &[("AclEntrys", encoded.as_str())])
    }

    fn remove_entries(&self, acl_id: &str, entries: &[Entry]) -> RemoteResult<()> {
        let encoded = Self::entries_param(Operation::RemoveEntries, acl_id, entries)?;
        self.call_unit(Operation::RemoveEntries, acl_id, &[("AclEntrys", encoded.as_str())])
    }

    fn delete_acl(&self, acl_id: &str) -> RemoteResult<()> {
        self.call_unit(Operation::Delete, acl_id, &[])
    }
}
