//! Test-only call recorder.
//!
//! Compiled only under `cfg(test)` or the `testkit` feature. Wraps any
//! [`SlbClient`] and records every call, in order, before delegating.

use std::cell::RefCell;

use sacl_schemas::{Entry, IpVersion};

use crate::types::AclAttributes;
use crate::{Operation, RemoteResult, SlbClient};

/// One recorded remote call with its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Create { name: String, ip_version: IpVersion },
    Describe { acl_id: String },
    SetAttributes { acl_id: String, name: String },
    AddEntries { acl_id: String, entries: Vec<Entry> },
    RemoveEntries { acl_id: String, entries: Vec<Entry> },
    Delete { acl_id: String },
}

impl Call {
    pub fn op(&self) -> Operation {
        match self {
            Call::Create { .. } => Operation::Create,
            Call::Describe { .. } => Operation::Describe,
            Call::SetAttributes { .. } => Operation::SetAttributes,
            Call::AddEntries { .. } => Operation::AddEntries,
            Call::RemoveEntries { .. } => Operation::RemoveEntries,
            Call::Delete { .. } => Operation::Delete,
        }
    }
}

pub struct RecordingClient<C> {
    inner: C,
    calls: RefCell<Vec<Call>>,
}

impl<C: SlbClient> RecordingClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Operations only, in call order.
    pub fn ops(&self) -> Vec<Operation> {
        self.calls.borrow().iter().map(Call::op).collect()
    }

    pub fn count(&self, op: Operation) -> usize {
        self.calls.borrow().iter().filter(|c| c.op() == op).count()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl<C: SlbClient> SlbClient for RecordingClient<C> {
    fn create_acl(&self, name: &str, ip_version: IpVersion) -> RemoteResult<String> {
        self.record(Call::Create {
            name: name.to_string(),
            ip_version,
        });
        self.inner.create_acl(name, ip_version)
    }

    fn describe_acl(&self, acl_id: &str) -> RemoteResult<AclAttributes> {
        self.record(Call::Describe {
            acl_id: acl_id.to_string(),
        });
        self.inner.describe_acl(acl_id)
    }

    fn set_acl_attributes(&self, acl_id: &str, name: &str) -> RemoteResult<()> {
        self.record(Call::SetAttributes {
            acl_id: acl_id.to_string(),
            name: name.to_string(),
        });
        self.inner.set_acl_attributes(acl_id, name)
    }

    fn add_entries(&self, acl_id: &str, entries: &[Entry]) -> RemoteResult<()> {
        self.record(Call::AddEntries {
            acl_id: acl_id.to_string(),
            entries: entries.to_vec(),
        });
        self.inner.add_entries(acl_id, entries)
    }

    fn remove_entries(&self, acl_id: &str, entries: &[Entry]) -> RemoteResult<()> {
        self.record(Call::RemoveEntries {
            acl_id: acl_id.to_string(),
            entries: entries.to_vec(),
        });
        self.inner.remove_entries(acl_id, entries)
    }

    fn delete_acl(&self, acl_id: &str) -> RemoteResult<()> {
        self.record(Call::Delete {
            acl_id: acl_id.to_string(),
        });
        self.inner.delete_acl(acl_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PaperConfig, PaperSlb};

    #[test]
    fn records_calls_in_order_including_failures() {
        let rec = RecordingClient::new(PaperSlb::new(PaperConfig::default()));
        let id = rec.create_acl("a", IpVersion::V4).unwrap();
        rec.delete_acl(&id).unwrap();
        assert!(rec.describe_acl(&id).is_err());
        assert_eq!(
            rec.ops(),
            vec![Operation::Create, Operation::Delete, Operation::Describe]
        );
        assert_eq!(rec.count(Operation::Describe), 1);
    }
}
