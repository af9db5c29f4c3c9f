//! Projection of the remote's nested payload into the flat persisted record.

use std::collections::BTreeSet;

use sacl_remote::{AclAttributes, AclEntryItem, RelatedListener};
use sacl_schemas::{AclState, Entry, IpVersion, Listener, SchemaError};

pub fn project_entries(items: &[AclEntryItem]) -> BTreeSet<Entry> {
    items
        .iter()
        .map(|i| Entry::new(i.acl_entry_ip.clone(), i.acl_entry_comment.clone()))
        .collect()
}

pub fn project_listeners(items: &[RelatedListener]) -> Vec<Listener> {
    items
        .iter()
        .map(|l| Listener {
            load_balancer_id: l.load_balancer_id.clone(),
            frontend_port: l.listener_port,
            acl_type: l.acl_type.clone(),
            protocol: l.protocol.clone(),
        })
        .collect()
}

/// Build a full record from an observed payload.
///
/// Every field comes from the payload, the id included; an empty remote id
/// yields a record that reads as gone.
pub fn project(attrs: &AclAttributes) -> Result<AclState, SchemaError> {
    let ip_version = if attrs.address_ip_version.trim().is_empty() {
        IpVersion::default()
    } else {
        attrs.address_ip_version.parse()?
    };

    Ok(AclState {
        id: attrs.acl_id.clone(),
        name: attrs.acl_name.clone(),
        ip_version,
        entries: project_entries(&attrs.acl_entrys.acl_entry),
        related_listeners: project_listeners(&attrs.related_listeners.related_listener),
    })
}
