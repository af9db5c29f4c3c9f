//! Remote error vocabulary and per-operation classification.

use std::fmt;

// ---------------------------------------------------------------------------
// Wire error codes
// ---------------------------------------------------------------------------

pub const CODE_REGION_NOT_SUPPORTED: &str = "InvalidAction.RegionNotSupport";
pub const CODE_ACL_NUMBER_OVER_LIMIT: &str = "AclNumberOverLimit";
pub const CODE_ACL_NAME_EXIST: &str = "AclNameExist";
pub const CODE_ACL_NOT_EXIST: &str = "AclNotExist";

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// The remote actions the adapter issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Describe,
    SetAttributes,
    AddEntries,
    RemoveEntries,
    Delete,
}

impl Operation {
    /// RPC action name on the wire.
    pub fn action(&self) -> &'static str {
        match self {
            Operation::Create => "CreateAccessControlList",
            Operation::Describe => "DescribeAccessControlListAttribute",
            Operation::SetAttributes => "SetAccessControlListAttribute",
            Operation::AddEntries => "AddAccessControlListEntry",
            Operation::RemoveEntries => "RemoveAccessControlListEntry",
            Operation::Delete => "DeleteAccessControlList",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Classified failure. Anything outside the fixed vocabulary is `Unknown`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    RegionUnsupported,
    CountOverLimit,
    NameConflict,
    NotFound,
    Unknown,
}

/// Map a raw wire code to a kind, honouring only the codes `op` can
/// legitimately return. A `AclNotExist` from `Create`, for example, is
/// not something the caller can act on and stays `Unknown`.
pub fn classify(op: Operation, code: &str) -> ErrorKind {
    match (op, code) {
        (Operation::Create, CODE_REGION_NOT_SUPPORTED) => ErrorKind::RegionUnsupported,
        (Operation::Create, CODE_ACL_NUMBER_OVER_LIMIT) => ErrorKind::CountOverLimit,
        (Operation::SetAttributes, CODE_ACL_NAME_EXIST) => ErrorKind::NameConflict,
        (Operation::Describe | Operation::Delete, CODE_ACL_NOT_EXIST) => ErrorKind::NotFound,
        _ => ErrorKind::Unknown,
    }
}

// ---------------------------------------------------------------------------
// RemoteError
// ---------------------------------------------------------------------------

/// A failed remote call, with enough context to surface to an operator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteError {
    pub op: Operation,
    /// Resource id the call targeted; `None` for `Create`.
    pub acl_id: Option<String>,
    pub kind: ErrorKind,
    /// Raw code from the remote; `None` for transport or decode failures.
    pub code: Option<String>,
    pub message: String,
}

impl RemoteError {
    /// Build from a remote error response, classifying `code` for `op`.
    pub fn from_code(
        op: Operation,
        acl_id: Option<&str>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let code = code.into();
        Self {
            op,
            acl_id: acl_id.map(str::to_string),
            kind: classify(op, &code),
            code: Some(code),
            message: message.into(),
        }
    }

    /// Network, timeout, or decode failure. Always `Unknown`.
    pub fn transport(op: Operation, acl_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            op,
            acl_id: acl_id.map(str::to_string),
            kind: ErrorKind::Unknown,
            code: None,
            message: message.into(),
        }
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op)?;
        if let Some(id) = &self.acl_id {
            write!(f, " acl_id={id}")?;
        }
        match &self.code {
            Some(code) => write!(f, " failed code={code}: {}", self.message),
            None => write!(f, " failed: {}", self.message),
        }
    }
}

impl std::error::Error for RemoteError {}
