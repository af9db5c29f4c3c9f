use serde::Serialize;
use tracing::{debug, info, warn};

use sacl_remote::{ErrorKind, RemoteError, SlbClient};
use sacl_schemas::{AclSpec, AclState};

use crate::clock::{Clock, SystemClock};
use crate::delete::{DeleteMachine, DeleteOutcome, DeletePolicy};
use crate::diff::diff_entries;
use crate::error::ReconcileError;
use crate::projector::project;

/// What a refresh found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    Present,
    /// Remote resource no longer exists; the record was purged.
    Gone,
}

/// Action needed to converge a record to a declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Plan {
    Create,
    Update {
        rename: bool,
        remove: usize,
        add: usize,
    },
    /// An immutable field changed: delete, then create.
    Replace,
    NoOp,
}

/// Create/read/update/delete orchestration for one ACL.
///
/// Borrows the remote client; owns the clock and delete policy.
pub struct Reconciler<'a, C: SlbClient + ?Sized, K: Clock = SystemClock> {
    client: &'a C,
    clock: K,
    delete_policy: DeletePolicy,
}

impl<'a, C: SlbClient + ?Sized> Reconciler<'a, C, SystemClock> {
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            clock: SystemClock::new(),
            delete_policy: DeletePolicy::default(),
        }
    }
}

impl<'a, C: SlbClient + ?Sized, K: Clock> Reconciler<'a, C, K> {
    pub fn with_clock<K2: Clock>(self, clock: K2) -> Reconciler<'a, C, K2> {
        Reconciler {
            client: self.client,
            clock,
            delete_policy: self.delete_policy,
        }
    }

    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    pub fn delete_policy(&self) -> &DeletePolicy {
        &self.delete_policy
    }

    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    /// Create the remote ACL, then run the update flow to attach entries and
    /// refresh the record.
    ///
    /// Region/quota rejections come back as [`ReconcileError::Rejected`] with
    /// no id assigned. Once the create call succeeds the id is recorded, so a
    /// later update failure leaves a record the caller can retry against.
    pub fn create(&self, state: &mut AclState, spec: &AclSpec) -> Result<(), ReconcileError> {
        let name = spec.trimmed_name();
        info!(name, ip_version = %spec.ip_version, "creating acl");

        let acl_id = self
            .client
            .create_acl(name, spec.ip_version)
            .map_err(classify_create_error)?;

        info!(acl_id = %acl_id, "acl created");
        *state = AclState {
            id: acl_id,
            name: name.to_string(),
            ip_version: spec.ip_version,
            ..AclState::empty()
        };

        self.update(state, spec)
    }

    // -----------------------------------------------------------------------
    // Read
    // -----------------------------------------------------------------------

    /// Refresh every field of `state` from the remote.
    ///
    /// A missing resource is drift, not an error: the record is purged and
    /// [`ReadOutcome::Gone`] returned.
    pub fn read(&self, state: &mut AclState) -> Result<ReadOutcome, ReconcileError> {
        if state.id.is_empty() {
            return Err(ReconcileError::MissingId { op: "read" });
        }

        let attrs = match self.client.describe_acl(&state.id) {
            Ok(a) => a,
            Err(e) if e.is(ErrorKind::NotFound) => {
                info!(acl_id = %state.id, "acl no longer exists remotely; purging record");
                state.clear();
                return Ok(ReadOutcome::Gone);
            }
            Err(e) => return Err(ReconcileError::Remote(e)),
        };

        let observed = project(&attrs).map_err(|source| ReconcileError::Projection {
            acl_id: state.id.clone(),
            source,
        })?;
        *state = observed;

        if state.is_gone() {
            info!("remote returned an acl without id; purging record");
            state.clear();
            return Ok(ReadOutcome::Gone);
        }
        Ok(ReadOutcome::Present)
    }

    // -----------------------------------------------------------------------
    // Update
    // -----------------------------------------------------------------------

    /// Push `spec` onto the remote resource described by `state`.
    ///
    /// Steps commit individually: rename, then entry removals, then entry
    /// additions, then a full refresh. A failure returns immediately and
    /// `state` keeps whatever earlier steps already applied.
    pub fn update(&self, state: &mut AclState, spec: &AclSpec) -> Result<(), ReconcileError> {
        if state.id.is_empty() {
            return Err(ReconcileError::MissingId { op: "update" });
        }
        if state.ip_version != spec.ip_version {
            return Err(ReconcileError::RequiresReplacement {
                field: "ip_version",
                from: state.ip_version.to_string(),
                to: spec.ip_version.to_string(),
            });
        }

        let acl_id = state.id.clone();
        let name = spec.trimmed_name();

        if name != state.name {
            match self.client.set_acl_attributes(&acl_id, name) {
                Ok(()) => {}
                // TODO: distinguish "already ours" from a real collision once
                // the remote exposes the owning acl id on AclNameExist.
                Err(e) if e.is(ErrorKind::NameConflict) => {
                    warn!(acl_id = %acl_id, name, error = %e, "name already exists; treating rename as applied");
                }
                Err(e) => return Err(ReconcileError::Remote(e)),
            }
            state.name = name.to_string();
        }

        let delta = diff_entries(&state.entries, &spec.entries);
        debug!(
            acl_id = %acl_id,
            remove = delta.to_remove.len(),
            add = delta.to_add.len(),
            "entry delta"
        );

        if !delta.to_remove.is_empty() {
            self.client
                .remove_entries(&acl_id, &delta.to_remove)
                .map_err(ReconcileError::Remote)?;
            for e in &delta.to_remove {
                state.entries.remove(e);
            }
        }

        if !delta.to_add.is_empty() {
            self.client
                .add_entries(&acl_id, &delta.to_add)
                .map_err(ReconcileError::Remote)?;
            state.entries.extend(delta.to_add);
        }

        self.read(state).map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    /// Delete with retry and confirmation. Clears the record on success;
    /// leaves it untouched on failure so the caller can try again.
    pub fn delete(&self, state: &mut AclState) -> Result<DeleteOutcome, ReconcileError> {
        if state.id.is_empty() {
            return Ok(DeleteOutcome {
                attempts: 0,
                elapsed: std::time::Duration::ZERO,
            });
        }

        info!(acl_id = %state.id, "deleting acl");
        let outcome =
            DeleteMachine::new(self.client, &self.clock, self.delete_policy, state.id.clone())
                .run()?;
        info!(acl_id = %state.id, attempts = outcome.attempts, "acl deleted");
        state.clear();
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Plan / converge
    // -----------------------------------------------------------------------

    /// Refresh (when the record has an id), plan, and execute the plan.
    pub fn converge(&self, state: &mut AclState, spec: &AclSpec) -> Result<Plan, ReconcileError> {
        if !state.is_gone() {
            self.read(state)?;
        }

        let plan = plan(state, spec);
        match &plan {
            Plan::Create => self.create(state, spec)?,
            Plan::Update { .. } => self.update(state, spec)?,
            Plan::Replace => {
                info!(acl_id = %state.id, "ip_version changed; replacing acl");
                self.delete(state)?;
                self.create(state, spec)?;
            }
            Plan::NoOp => debug!(acl_id = %state.id, "already converged"),
        }
        Ok(plan)
    }
}

/// Decide what converging `state` to `spec` takes. No remote calls.
pub fn plan(state: &AclState, spec: &AclSpec) -> Plan {
    if state.is_gone() {
        return Plan::Create;
    }
    if state.ip_version != spec.ip_version {
        return Plan::Replace;
    }
    let rename = spec.trimmed_name() != state.name;
    let delta = diff_entries(&state.entries, &spec.entries);
    if !rename && delta.is_empty() {
        return Plan::NoOp;
    }
    Plan::Update {
        rename,
        remove: delta.to_remove.len(),
        add: delta.to_add.len(),
    }
}

fn classify_create_error(e: RemoteError) -> ReconcileError {
    match e.kind {
        ErrorKind::RegionUnsupported | ErrorKind::CountOverLimit => ReconcileError::Rejected(e),
        _ => ReconcileError::Remote(e),
    }
}
