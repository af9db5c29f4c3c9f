//! sacl-schemas
//!
//! Shared data model for a load-balancer access-control list:
//! the caller's desired declaration ([`AclSpec`]) and the persisted,
//! remote-observed record ([`AclState`]).
//!
//! Pure types. No IO. No remote calls.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Maximum number of entries a single ACL may carry.
pub const MAX_ENTRIES: usize = 300;

// ---------------------------------------------------------------------------
// IpVersion
// ---------------------------------------------------------------------------

/// Address family of an ACL. Fixed at creation time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IpVersion {
    #[default]
    V4,
    V6,
}

impl IpVersion {
    /// Wire form used by the remote service.
    pub fn as_str(&self) -> &'static str {
        match self {
            IpVersion::V4 => "ipv4",
            IpVersion::V6 => "ipv6",
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IpVersion {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "4" | "v4" | "ipv4" => Ok(IpVersion::V4),
            "6" | "v6" | "ipv6" => Ok(IpVersion::V6),
            other => Err(SchemaError::InvalidIpVersion(other.to_string())),
        }
    }
}

impl TryFrom<String> for IpVersion {
    type Error = SchemaError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<IpVersion> for String {
    fn from(v: IpVersion) -> Self {
        v.as_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// Entry / Listener
// ---------------------------------------------------------------------------

/// One access rule: a CIDR range plus a free-text comment.
///
/// Identity is the full value; two entries with the same CIDR but different
/// comments are distinct members of an entry set.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "entry")]
    pub cidr: String,
    #[serde(default)]
    pub comment: String,
}

impl Entry {
    pub fn new(cidr: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            cidr: cidr.into(),
            comment: comment.into(),
        }
    }
}

/// A load-balancer listener the ACL is attached to. Observed only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listener {
    pub load_balancer_id: String,
    pub frontend_port: u16,
    pub acl_type: String,
    pub protocol: String,
}

// ---------------------------------------------------------------------------
// SchemaError
// ---------------------------------------------------------------------------

/// Caller-facing schema violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    InvalidIpVersion(String),
    EmptyName,
    TooManyEntries { count: usize, max: usize },
    EmptyCidr { comment: String },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::InvalidIpVersion(v) => {
                write!(f, "invalid ip_version '{v}'. expected one of: ipv4 | ipv6")
            }
            SchemaError::EmptyName => write!(f, "name must not be empty"),
            SchemaError::TooManyEntries { count, max } => {
                write!(f, "entries: {count} given, at most {max} allowed")
            }
            SchemaError::EmptyCidr { comment } => {
                write!(f, "entry with comment '{comment}' has an empty cidr")
            }
        }
    }
}

impl std::error::Error for SchemaError {}

// ---------------------------------------------------------------------------
// AclSpec (desired)
// ---------------------------------------------------------------------------

/// Desired declaration supplied by the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclSpec {
    pub name: String,
    #[serde(default)]
    pub ip_version: IpVersion,
    #[serde(default)]
    pub entries: BTreeSet<Entry>,
}

impl AclSpec {
    pub fn new(name: impl Into<String>, ip_version: IpVersion) -> Self {
        Self {
            name: name.into(),
            ip_version,
            entries: BTreeSet::new(),
        }
    }

    pub fn with_entry(mut self, cidr: impl Into<String>, comment: impl Into<String>) -> Self {
        self.entries.insert(Entry::new(cidr, comment));
        self
    }

    /// Name with surrounding spaces removed, as sent to the remote.
    pub fn trimmed_name(&self) -> &str {
        self.name.trim()
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.trimmed_name().is_empty() {
            return Err(SchemaError::EmptyName);
        }
        if self.entries.len() > MAX_ENTRIES {
            return Err(SchemaError::TooManyEntries {
                count: self.entries.len(),
                max: MAX_ENTRIES,
            });
        }
        if let Some(e) = self.entries.iter().find(|e| e.cidr.trim().is_empty()) {
            return Err(SchemaError::EmptyCidr {
                comment: e.comment.clone(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AclState (observed / persisted)
// ---------------------------------------------------------------------------

/// Persisted record of the remote ACL as last observed.
///
/// An empty `id` means either "not created yet" or "gone remotely"; callers
/// must purge a record whose id was cleared by a read.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclState {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ip_version: IpVersion,
    #[serde(default)]
    pub entries: BTreeSet<Entry>,
    #[serde(default)]
    pub related_listeners: Vec<Listener>,
}

impl AclState {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Id-only record; a subsequent read fills in every other field.
    pub fn import(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn is_gone(&self) -> bool {
        self.id.is_empty()
    }

    /// Drop everything but the address family, which the caller may still
    /// need to decide between update and replacement.
    pub fn clear(&mut self) {
        self.id.clear();
        self.name.clear();
        self.entries.clear();
        self.related_listeners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_version_parse_accepts_short_forms() {
        assert_eq!("4".parse::<IpVersion>().unwrap(), IpVersion::V4);
        assert_eq!(" IPv6 ".parse::<IpVersion>().unwrap(), IpVersion::V6);
        assert_eq!("v4".parse::<IpVersion>().unwrap(), IpVersion::V4);
        assert!("ipv5".parse::<IpVersion>().is_err());
    }

    #[test]
    fn ip_version_serializes_as_wire_form() {
        let s = serde_json::to_string(&IpVersion::V6).unwrap();
        assert_eq!(s, "\"ipv6\"");
        let v: IpVersion = serde_json::from_str("\"4\"").unwrap();
        assert_eq!(v, IpVersion::V4);
    }

    #[test]
    fn entry_uses_boundary_field_names() {
        let e: Entry = serde_json::from_str(r#"{"entry":"10.0.0.0/8"}"#).unwrap();
        assert_eq!(e, Entry::new("10.0.0.0/8", ""));
        let json = serde_json::to_value(Entry::new("1.2.3.4/32", "a")).unwrap();
        assert_eq!(json["entry"], "1.2.3.4/32");
        assert_eq!(json["comment"], "a");
    }

    #[test]
    fn same_cidr_different_comment_are_distinct() {
        let spec = AclSpec::new("x", IpVersion::V4)
            .with_entry("1.2.3.4/32", "a")
            .with_entry("1.2.3.4/32", "b")
            .with_entry("1.2.3.4/32", "a");
        assert_eq!(spec.entries.len(), 2);
    }

    #[test]
    fn validate_rejects_blank_name() {
        let spec = AclSpec::new("   ", IpVersion::V4);
        assert_eq!(spec.validate(), Err(SchemaError::EmptyName));
    }

    #[test]
    fn validate_rejects_more_than_max_entries() {
        let mut spec = AclSpec::new("big", IpVersion::V4);
        for i in 0..=MAX_ENTRIES {
            spec.entries
                .insert(Entry::new(format!("10.0.{}.{}/32", i / 256, i % 256), ""));
        }
        assert_eq!(
            spec.validate(),
            Err(SchemaError::TooManyEntries {
                count: MAX_ENTRIES + 1,
                max: MAX_ENTRIES
            })
        );
    }

    #[test]
    fn validate_rejects_empty_cidr() {
        let spec = AclSpec::new("acl", IpVersion::V4).with_entry(" ", "oops");
        assert!(matches!(spec.validate(), Err(SchemaError::EmptyCidr { .. })));
    }

    #[test]
    fn trimmed_name_strips_spaces() {
        assert_eq!(AclSpec::new("  acl1 ", IpVersion::V4).trimmed_name(), "acl1");
    }

    #[test]
    fn import_record_only_carries_id() {
        let s = AclState::import("acl-1");
        assert_eq!(s.id, "acl-1");
        assert!(s.name.is_empty());
        assert!(!s.is_gone());
    }

    #[test]
    fn state_roundtrips_through_json_with_missing_fields() {
        let s: AclState = serde_json::from_str(r#"{"id":"acl-9"}"#).unwrap();
        assert_eq!(s.ip_version, IpVersion::V4);
        assert!(s.entries.is_empty());
    }
}
