use sacl_reconcile::*;
use sacl_remote::testkit::RecordingClient;
use sacl_remote::{Operation, PaperConfig, PaperSlb, SlbClient};
use sacl_schemas::{AclSpec, AclState, Entry, IpVersion};

fn created(spec: &AclSpec) -> (RecordingClient<PaperSlb>, AclState) {
    let remote = RecordingClient::new(PaperSlb::new(PaperConfig::default()));
    let mut state = AclState::empty();
    Reconciler::new(&remote).create(&mut state, spec).unwrap();
    remote.clear();
    (remote, state)
}

#[test]
fn scenario_name_conflict_is_swallowed_and_update_continues() {
    let (remote, mut state) = created(&AclSpec::new("acl1", IpVersion::V4));
    // Another ACL already owns the desired name.
    remote
        .inner()
        .create_acl("taken", IpVersion::V4)
        .unwrap();
    remote.clear();

    let r = Reconciler::new(&remote);
    let spec = AclSpec::new("taken", IpVersion::V4).with_entry("1.2.3.4/32", "a");
    r.update(&mut state, &spec).unwrap();

    assert_eq!(
        remote.ops(),
        vec![
            Operation::SetAttributes,
            Operation::AddEntries,
            Operation::Describe
        ]
    );
    // The refresh reports remote truth: the rename never happened.
    assert_eq!(state.name, "acl1");
    assert_eq!(state.entries.len(), 1);
}

#[test]
fn scenario_rename_commits_even_when_entry_removal_fails() {
    let spec = AclSpec::new("acl1", IpVersion::V4).with_entry("1.1.1.1/32", "x");
    let (remote, mut state) = created(&spec);
    remote
        .inner()
        .inject_fault(Operation::RemoveEntries, "InternalError", "boom");

    let r = Reconciler::new(&remote);
    let next = AclSpec::new("acl2", IpVersion::V4).with_entry("9.9.9.9/32", "c");
    let err = r.update(&mut state, &next).unwrap_err();

    assert!(matches!(err, ReconcileError::Remote(ref e) if e.op == Operation::RemoveEntries));
    // Removal failed: additions were never attempted and no refresh happened.
    assert_eq!(
        remote.ops(),
        vec![Operation::SetAttributes, Operation::RemoveEntries]
    );
    assert_eq!(state.name, "acl2");
    assert!(state.entries.contains(&Entry::new("1.1.1.1/32", "x")));

    let observed = remote.inner().describe_acl(&state.id).unwrap();
    assert_eq!(observed.acl_name, "acl2");
}

#[test]
fn scenario_add_failure_keeps_committed_removals() {
    let spec = AclSpec::new("acl1", IpVersion::V4).with_entry("1.1.1.1/32", "x");
    let (remote, mut state) = created(&spec);
    remote
        .inner()
        .inject_fault(Operation::AddEntries, "InternalError", "boom");

    let r = Reconciler::new(&remote);
    let next = AclSpec::new("acl1", IpVersion::V4).with_entry("9.9.9.9/32", "c");
    assert!(r.update(&mut state, &next).is_err());

    assert!(state.entries.is_empty());
    assert_eq!(
        remote.ops(),
        vec![Operation::RemoveEntries, Operation::AddEntries]
    );
}

#[test]
fn scenario_unknown_rename_failure_aborts_before_entries() {
    let (remote, mut state) = created(&AclSpec::new("acl1", IpVersion::V4));
    remote
        .inner()
        .inject_fault(Operation::SetAttributes, "Forbidden.RAM", "denied");

    let r = Reconciler::new(&remote);
    let next = AclSpec::new("acl2", IpVersion::V4).with_entry("9.9.9.9/32", "c");
    let err = r.update(&mut state, &next).unwrap_err();

    assert!(err.to_string().contains("Forbidden.RAM"));
    assert_eq!(remote.ops(), vec![Operation::SetAttributes]);
    assert_eq!(state.name, "acl1");
}
