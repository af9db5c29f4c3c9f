//! sacl-reconcile
//!
//! State-reconciliation engine for one access-control list.
//!
//! Architectural decisions:
//! - Desired state is an explicit [`AclSpec`]; the previously observed state
//!   is an explicit [`AclState`]. The entry delta is computed between the two,
//!   never inferred from hidden change tracking.
//! - The remote client is borrowed for the duration of a call chain; there is
//!   no global connection.
//! - Update is partial-apply: each committed step is reflected in the state
//!   record even when a later step fails.
//! - Removals are issued before additions.
//! - Delete is an explicit state machine with an injectable [`Clock`].
//!
//! Synchronous and single-threaded per resource. One remote call at a time.
//!
//! [`AclSpec`]: sacl_schemas::AclSpec
//! [`AclState`]: sacl_schemas::AclState

mod clock;
mod delete;
mod diff;
mod engine;
mod error;
mod projector;

pub use clock::{Clock, ManualClock, SystemClock};
pub use delete::{DeleteMachine, DeleteOutcome, DeletePhase, DeletePolicy};
pub use diff::{diff_entries, EntryDelta};
pub use engine::{plan, Plan, ReadOutcome, Reconciler};
pub use error::ReconcileError;
pub use projector::{project, project_entries, project_listeners};
