use std::fmt;
use std::time::Duration;

use sacl_remote::RemoteError;
use sacl_schemas::SchemaError;

/// Reconciliation failure returned to the caller.
///
/// Benign outcomes (absent resource on read/delete, name already taken on
/// rename) never surface here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Capacity or region constraint at creation. Non-retryable; the remote
    /// error is carried verbatim.
    Rejected(RemoteError),
    /// Any unclassified remote failure, with operation and resource context.
    Remote(RemoteError),
    /// An immutable field differs; the resource must be replaced.
    RequiresReplacement {
        field: &'static str,
        from: String,
        to: String,
    },
    /// Operation needs a remote id and the record has none.
    MissingId { op: &'static str },
    /// The remote returned a payload that does not fit the data model.
    Projection { acl_id: String, source: SchemaError },
    /// Delete kept failing transiently until the retry budget ran out.
    DeleteTimedOut {
        acl_id: String,
        attempts: u32,
        elapsed: Duration,
        last: RemoteError,
    },
    /// Delete succeeded but the resource is still describable.
    DeleteNotPropagated { acl_id: String },
}

impl ReconcileError {
    /// Underlying remote error, when there is one.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            ReconcileError::Rejected(e) | ReconcileError::Remote(e) => Some(e),
            ReconcileError::DeleteTimedOut { last, .. } => Some(last),
            _ => None,
        }
    }
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::Rejected(e) => write!(f, "remote rejected request: {e}"),
            ReconcileError::Remote(e) => write!(f, "remote call failed: {e}"),
            ReconcileError::RequiresReplacement { field, from, to } => write!(
                f,
                "{field} cannot change in place ({from} -> {to}); resource must be replaced"
            ),
            ReconcileError::MissingId { op } => {
                write!(f, "{op} requires a remote acl id but the record has none")
            }
            ReconcileError::Projection { acl_id, source } => {
                write!(f, "acl {acl_id} returned an unusable payload: {source}")
            }
            ReconcileError::DeleteTimedOut {
                acl_id,
                attempts,
                elapsed,
                last,
            } => write!(
                f,
                "delete of acl {acl_id} timed out after {attempts} attempt(s) in {}s; last error: {last}",
                elapsed.as_secs()
            ),
            ReconcileError::DeleteNotPropagated { acl_id } => write!(
                f,
                "acl {acl_id} is still visible after a successful delete"
            ),
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReconcileError::Rejected(e) | ReconcileError::Remote(e) => Some(e),
            ReconcileError::DeleteTimedOut { last, .. } => Some(last),
            ReconcileError::Projection { source, .. } => Some(source),
            _ => None,
        }
    }
}
