//! Wire payloads, shaped as the remote returns them.
//!
//! Collections stay nested (`AclEntrys.AclEntry[]`, `RelatedListeners.RelatedListener[]`);
//! flattening into the declared-state shape happens in the reconciler's projector.

use serde::{Deserialize, Serialize};

use sacl_schemas::Entry;

/// `DescribeAccessControlListAttribute` response body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AclAttributes {
    #[serde(default)]
    pub acl_id: String,
    #[serde(default)]
    pub acl_name: String,
    #[serde(rename = "AddressIPVersion", default)]
    pub address_ip_version: String,
    #[serde(default)]
    pub acl_entrys: AclEntrys,
    #[serde(default)]
    pub related_listeners: RelatedListeners,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AclEntrys {
    #[serde(default)]
    pub acl_entry: Vec<AclEntryItem>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AclEntryItem {
    #[serde(rename = "AclEntryIP")]
    pub acl_entry_ip: String,
    #[serde(default)]
    pub acl_entry_comment: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RelatedListeners {
    #[serde(default)]
    pub related_listener: Vec<RelatedListener>,
}

/// Absent fields decode to zero values; the remote omits some per listener type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RelatedListener {
    pub load_balancer_id: String,
    pub listener_port: u16,
    pub acl_type: String,
    pub protocol: String,
}

/// `CreateAccessControlList` response body.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct CreateAclResponse {
    pub acl_id: String,
}

/// Error body returned with a non-2xx status.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Request-side encoding of the `AclEntrys` parameter: a JSON list of
/// `{"entry": ..., "comment": ...}` objects.
pub fn encode_entries(entries: &[Entry]) -> Result<String, serde_json::Error> {
    serde_json::to_string(entries)
}
