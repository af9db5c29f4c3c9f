//! Deterministic in-memory "paper" remote.
//!
//! Design decisions (kept simple/deterministic):
//! - ids are `acl-paper-{seq:04}`, allocated from a counter; never reused.
//! - entry sets are `BTreeSet`s so describe output order is stable.
//! - add/remove are idempotent: adding a present entry or removing an absent
//!   one is a no-op.
//! - renaming to a name any ACL already carries (itself included) fails with
//!   `AclNameExist`, as the real service does.
//! - a non-zero `delete_visibility_lag` keeps a deleted ACL describable for
//!   that many reads, modelling eventual consistency.
//! - faults injected with [`PaperSlb::inject_fault`] fire once, in order, on
//!   the next call of the matching operation. Faults are not persisted.
//!
//! The whole store is serde-serializable so the CLI can keep a paper remote
//! in a JSON file between invocations.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use sacl_schemas::{Entry, IpVersion, Listener, MAX_ENTRIES};

use crate::error::{
    Operation, RemoteError, CODE_ACL_NAME_EXIST, CODE_ACL_NOT_EXIST, CODE_ACL_NUMBER_OVER_LIMIT,
    CODE_REGION_NOT_SUPPORTED,
};
use crate::types::{AclAttributes, AclEntryItem, AclEntrys, RelatedListener, RelatedListeners};
use crate::{RemoteResult, SlbClient};

const CODE_ENTRY_NUMBER_OVER_LIMIT: &str = "AclEntryNumberOverLimit";

/// Behavioural knobs of the paper remote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperConfig {
    /// Region this remote pretends to serve.
    pub region: String,
    /// Regions where ACLs are offered. Empty means every region.
    #[serde(default)]
    pub supported_regions: Vec<String>,
    /// Account-wide ACL quota.
    pub max_acls: usize,
    /// Number of describes a deleted ACL stays visible for.
    #[serde(default)]
    pub delete_visibility_lag: u32,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            region: "cn-hangzhou".to_string(),
            supported_regions: Vec::new(),
            max_acls: 50,
            delete_visibility_lag: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct PaperAcl {
    name: String,
    ip_version: IpVersion,
    entries: BTreeSet<Entry>,
    #[serde(default)]
    listeners: Vec<Listener>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct PaperStore {
    config: PaperConfig,
    next_seq: u64,
    acls: BTreeMap<String, PaperAcl>,
    /// Deleted but still describable: id -> (last state, describes left).
    #[serde(default)]
    lingering: BTreeMap<String, (PaperAcl, u32)>,
}

#[derive(Clone, Debug)]
struct Fault {
    op: Operation,
    code: String,
    message: String,
}

#[derive(Debug)]
pub struct PaperSlb {
    store: RefCell<PaperStore>,
    faults: RefCell<VecDeque<Fault>>,
}

impl PaperSlb {
    pub fn new(config: PaperConfig) -> Self {
        Self {
            store: RefCell::new(PaperStore {
                config,
                next_seq: 1,
                ..PaperStore::default()
            }),
            faults: RefCell::new(VecDeque::new()),
        }
    }

    /// Load a persisted paper remote, or start a fresh one if `path` is absent.
    ///
    /// `config` always wins over the persisted config so operators can change
    /// quotas or lag between runs.
    pub fn load_or_new(path: &Path, config: PaperConfig) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new(config));
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read paper store: {}", path.display()))?;
        let mut store: PaperStore = serde_json::from_str(&raw)
            .with_context(|| format!("paper store is not valid JSON: {}", path.display()))?;
        store.config = config;
        Ok(Self {
            store: RefCell::new(store),
            faults: RefCell::new(VecDeque::new()),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create paper store dir: {}", dir.display()))?;
        }
        let raw = serde_json::to_string_pretty(&*self.store.borrow())
            .context("paper store serialize failed")?;
        fs::write(path, raw)
            .with_context(|| format!("failed to write paper store: {}", path.display()))
    }

    /// Queue a one-shot failure for the next call of `op`.
    pub fn inject_fault(&self, op: Operation, code: impl Into<String>, message: impl Into<String>) {
        self.faults.borrow_mut().push_back(Fault {
            op,
            code: code.into(),
            message: message.into(),
        });
    }

    /// Attach a listener so describe reports it under related listeners.
    /// Returns `false` when the ACL does not exist.
    pub fn attach_listener(&self, acl_id: &str, listener: Listener) -> bool {
        match self.store.borrow_mut().acls.get_mut(acl_id) {
            Some(acl) => {
                acl.listeners.push(listener);
                true
            }
            None => false,
        }
    }

    pub fn set_delete_visibility_lag(&self, lag: u32) {
        self.store.borrow_mut().config.delete_visibility_lag = lag;
    }

    pub fn acl_count(&self) -> usize {
        self.store.borrow().acls.len()
    }

    pub fn contains(&self, acl_id: &str) -> bool {
        self.store.borrow().acls.contains_key(acl_id)
    }

    fn take_fault(&self, op: Operation, acl_id: Option<&str>) -> RemoteResult<()> {
        let mut faults = self.faults.borrow_mut();
        if let Some(pos) = faults.iter().position(|f| f.op == op) {
            if let Some(f) = faults.remove(pos) {
                return Err(RemoteError::from_code(op, acl_id, f.code, f.message));
            }
        }
        Ok(())
    }

    fn not_found(op: Operation, acl_id: &str) -> RemoteError {
        RemoteError::from_code(
            op,
            Some(acl_id),
            CODE_ACL_NOT_EXIST,
            format!("the specified acl {acl_id} does not exist"),
        )
    }
}

fn attributes(acl_id: &str, acl: &PaperAcl) -> AclAttributes {
    AclAttributes {
        acl_id: acl_id.to_string(),
        acl_name: acl.name.clone(),
        address_ip_version: acl.ip_version.as_str().to_string(),
        acl_entrys: AclEntrys {
            acl_entry: acl
                .entries
                .iter()
                .map(|e| AclEntryItem {
                    acl_entry_ip: e.cidr.clone(),
                    acl_entry_comment: e.comment.clone(),
                })
                .collect(),
        },
        related_listeners: RelatedListeners {
            related_listener: acl
                .listeners
                .iter()
                .map(|l| RelatedListener {
                    load_balancer_id: l.load_balancer_id.clone(),
                    listener_port: l.frontend_port,
                    acl_type: l.acl_type.clone(),
                    protocol: l.protocol.clone(),
                })
                .collect(),
        },
    }
}

impl SlbClient for PaperSlb {
    fn create_acl(&self, name: &str, ip_version: IpVersion) -> RemoteResult<String> {
        let op = Operation::Create;
        self.take_fault(op, None)?;
        let mut store = self.store.borrow_mut();

        let cfg = &store.config;
        if !cfg.supported_regions.is_empty() && !cfg.supported_regions.contains(&cfg.region) {
            return Err(RemoteError::from_code(
                op,
                None,
                CODE_REGION_NOT_SUPPORTED,
                format!("acl is not supported in region {}", cfg.region),
            ));
        }
        if store.acls.len() >= cfg.max_acls {
            return Err(RemoteError::from_code(
                op,
                None,
                CODE_ACL_NUMBER_OVER_LIMIT,
                format!("acl quota of {} reached", cfg.max_acls),
            ));
        }
        if store.acls.values().any(|a| a.name == name) {
            return Err(RemoteError::from_code(
                op,
                None,
                CODE_ACL_NAME_EXIST,
                format!("an acl named {name} already exists"),
            ));
        }

        let acl_id = format!("acl-paper-{:04}", store.next_seq);
        store.next_seq += 1;
        store.acls.insert(
            acl_id.clone(),
            PaperAcl {
                name: name.to_string(),
                ip_version,
                entries: BTreeSet::new(),
                listeners: Vec::new(),
            },
        );
        debug!(acl_id = %acl_id, "paper: created");
        Ok(acl_id)
    }

    fn describe_acl(&self, acl_id: &str) -> RemoteResult<AclAttributes> {
        let op = Operation::Describe;
        self.take_fault(op, Some(acl_id))?;
        let mut store = self.store.borrow_mut();

        if let Some(acl) = store.acls.get(acl_id) {
            return Ok(attributes(acl_id, acl));
        }

        // Eventual consistency: a deleted ACL may still be visible.
        let mut expired = false;
        let found = match store.lingering.get_mut(acl_id) {
            Some((acl, left)) => {
                *left = left.saturating_sub(1);
                expired = *left == 0;
                Some(attributes(acl_id, acl))
            }
            None => None,
        };
        if expired {
            store.lingering.remove(acl_id);
        }
        found.ok_or_else(|| Self::not_found(op, acl_id))
    }

    fn set_acl_attributes(&self, acl_id: &str, name: &str) -> RemoteResult<()> {
        let op = Operation::SetAttributes;
        self.take_fault(op, Some(acl_id))?;
        let mut store = self.store.borrow_mut();

        if !store.acls.contains_key(acl_id) {
            return Err(Self::not_found(op, acl_id));
        }
        if store.acls.values().any(|a| a.name == name) {
            return Err(RemoteError::from_code(
                op,
                Some(acl_id),
                CODE_ACL_NAME_EXIST,
                format!("an acl named {name} already exists"),
            ));
        }
        if let Some(acl) = store.acls.get_mut(acl_id) {
            acl.name = name.to_string();
        }
        Ok(())
    }

    fn add_entries(&self, acl_id: &str, entries: &[Entry]) -> RemoteResult<()> {
        let op = Operation::AddEntries;
        self.take_fault(op, Some(acl_id))?;
        let mut store = self.store.borrow_mut();

        let acl = store
            .acls
            .get_mut(acl_id)
            .ok_or_else(|| Self::not_found(op, acl_id))?;

        let added = entries.iter().filter(|e| !acl.entries.contains(e)).count();
        if acl.entries.len() + added > MAX_ENTRIES {
            return Err(RemoteError::from_code(
                op,
                Some(acl_id),
                CODE_ENTRY_NUMBER_OVER_LIMIT,
                format!("an acl holds at most {MAX_ENTRIES} entries"),
            ));
        }
        acl.entries.extend(entries.iter().cloned());
        Ok(())
    }

    fn remove_entries(&self, acl_id: &str, entries: &[Entry]) -> RemoteResult<()> {
        let op = Operation::RemoveEntries;
        self.take_fault(op, Some(acl_id))?;
        let mut store = self.store.borrow_mut();

        let acl = store
            .acls
            .get_mut(acl_id)
            .ok_or_else(|| Self::not_found(op, acl_id))?;
        for e in entries {
            acl.entries.remove(e);
        }
        Ok(())
    }

    fn delete_acl(&self, acl_id: &str) -> RemoteResult<()> {
        let op = Operation::Delete;
        self.take_fault(op, Some(acl_id))?;
        let mut store = self.store.borrow_mut();

        let acl = store
            .acls
            .remove(acl_id)
            .ok_or_else(|| Self::not_found(op, acl_id))?;
        let lag = store.config.delete_visibility_lag;
        if lag > 0 {
            store.lingering.insert(acl_id.to_string(), (acl, lag));
        }
        debug!(acl_id = %acl_id, lag, "paper: deleted");
        Ok(())
    }
}
