//! sacl-remote
//!
//! Remote client adapter for load-balancer access-control lists.
//!
//! This crate owns the [`SlbClient`] contract and its concrete adapters:
//! - [`HttpSlbClient`]: blocking RPC client against the remote service.
//! - [`PaperSlb`]: deterministic in-memory remote for dry runs and tests.
//!
//! Adapters hold no reconciliation state between calls. Every failure is
//! returned as a classified [`RemoteError`]; deciding what is benign,
//! retryable, or fatal is the reconciler's job, not the adapter's.

pub mod error;
pub mod http;
pub mod paper;
pub mod sign;
pub mod types;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use error::{classify, ErrorKind, Operation, RemoteError};
pub use http::HttpSlbClient;
pub use paper::{PaperConfig, PaperSlb};
pub use sign::AccessKey;
pub use types::{AclAttributes, AclEntryItem, AclEntrys, RelatedListener, RelatedListeners};

use sacl_schemas::{Entry, IpVersion};

/// Convenience alias used by every adapter method.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Contract every remote adapter implements.
///
/// Calls are synchronous and blocking; one call, one response. Methods
/// take `&self` so a single handle can be borrowed by the reconciler for
/// the whole lifecycle of one resource.
pub trait SlbClient {
    /// Create an ACL and return its remote-assigned id.
    fn create_acl(&self, name: &str, ip_version: IpVersion) -> RemoteResult<String>;

    fn describe_acl(&self, acl_id: &str) -> RemoteResult<AclAttributes>;

    /// Rename an ACL.
    fn set_acl_attributes(&self, acl_id: &str, name: &str) -> RemoteResult<()>;

    fn add_entries(&self, acl_id: &str, entries: &[Entry]) -> RemoteResult<()>;

    fn remove_entries(&self, acl_id: &str, entries: &[Entry]) -> RemoteResult<()>;

    fn delete_acl(&self, acl_id: &str) -> RemoteResult<()>;
}
