use sacl_reconcile::*;
use sacl_remote::{Operation, PaperConfig, PaperSlb, SlbClient};
use sacl_schemas::{AclSpec, AclState, Entry, IpVersion, Listener};

#[test]
fn scenario_read_purges_record_when_remote_acl_vanished() {
    let remote = PaperSlb::new(PaperConfig::default());
    let r = Reconciler::new(&remote);

    let mut state = AclState::empty();
    r.create(&mut state, &AclSpec::new("acl1", IpVersion::V4))
        .unwrap();
    remote.delete_acl(&state.id).unwrap();

    assert_eq!(r.read(&mut state).unwrap(), ReadOutcome::Gone);
    assert!(state.id.is_empty());
    assert!(state.name.is_empty());
}

#[test]
fn scenario_read_overwrites_out_of_band_changes() {
    let remote = PaperSlb::new(PaperConfig::default());
    let r = Reconciler::new(&remote);

    let mut state = AclState::empty();
    r.create(
        &mut state,
        &AclSpec::new("acl1", IpVersion::V4).with_entry("1.2.3.4/32", "a"),
    )
    .unwrap();

    remote.set_acl_attributes(&state.id, "edited").unwrap();
    remote
        .add_entries(&state.id, &[Entry::new("6.6.6.6/32", "rogue")])
        .unwrap();
    remote.attach_listener(
        &state.id,
        Listener {
            load_balancer_id: "lb-1".to_string(),
            frontend_port: 443,
            acl_type: "white".to_string(),
            protocol: "https".to_string(),
        },
    );

    r.read(&mut state).unwrap();
    assert_eq!(state.name, "edited");
    assert_eq!(state.entries.len(), 2);
    assert_eq!(state.related_listeners.len(), 1);
    assert_eq!(state.related_listeners[0].load_balancer_id, "lb-1");
}

#[test]
fn scenario_import_by_id_populates_full_record() {
    let remote = PaperSlb::new(PaperConfig::default());
    let id = remote.create_acl("legacy", IpVersion::V6).unwrap();
    remote
        .add_entries(&id, &[Entry::new("2001:db8::/32", "hq")])
        .unwrap();

    let r = Reconciler::new(&remote);
    let mut state = AclState::import(id.clone());
    assert_eq!(r.read(&mut state).unwrap(), ReadOutcome::Present);

    assert_eq!(state.id, id);
    assert_eq!(state.name, "legacy");
    assert_eq!(state.ip_version, IpVersion::V6);
    assert!(state.entries.contains(&Entry::new("2001:db8::/32", "hq")));
}

#[test]
fn scenario_read_propagates_unclassified_failure() {
    let remote = PaperSlb::new(PaperConfig::default());
    let id = remote.create_acl("a", IpVersion::V4).unwrap();
    remote.inject_fault(Operation::Describe, "InternalError", "boom");

    let r = Reconciler::new(&remote);
    let mut state = AclState::import(id.clone());
    let err = r.read(&mut state).unwrap_err();

    assert!(matches!(err, ReconcileError::Remote(_)));
    assert_eq!(state.id, id, "a failed read must not purge the record");
}

#[test]
fn scenario_read_without_id_is_refused() {
    let remote = PaperSlb::new(PaperConfig::default());
    let err = Reconciler::new(&remote)
        .read(&mut AclState::empty())
        .unwrap_err();
    assert_eq!(err, ReconcileError::MissingId { op: "read" });
}
