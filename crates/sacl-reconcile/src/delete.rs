//! Delete state machine.
//!
//! ```text
//!            delete ok                 describe: AclNotExist
//!  Attempting ─────────► Confirming ──────────────────────────► Done
//!    │  ▲   │                 │
//!    │  │   │ AclNotExist     │ describe ok       → Failed (not propagated)
//!    │  │   └──────────────► Done                 describe other error → Failed
//!    │  │
//!    │  └── other error, budget left: sleep(backoff), retry
//!    └───── other error, budget spent               → Failed (timed out)
//! ```
//!
//! Only the delete call is retried. A confirmation that still sees the
//! resource is reported, not retried; the caller recovers by deleting again.

use std::time::Duration;

use tracing::{debug, warn};

use sacl_remote::{ErrorKind, SlbClient};

use crate::clock::Clock;
use crate::error::ReconcileError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeletePhase {
    Attempting,
    Confirming,
    /// **Terminal.** Resource is gone.
    Done,
    /// **Terminal.** See [`DeleteMachine::failure`].
    Failed,
}

impl DeletePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Retry budget and backoff shape for the delete call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeletePolicy {
    /// Wall-clock budget measured from the first attempt.
    pub timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: u32,
}

impl Default for DeletePolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5 * 60),
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(10),
            multiplier: 2,
        }
    }
}

impl DeletePolicy {
    fn next_backoff(&self, current: Duration) -> Duration {
        current
            .saturating_mul(self.multiplier.max(1))
            .min(self.max_backoff)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Delete calls issued; zero when there was nothing to delete.
    pub attempts: u32,
    pub elapsed: Duration,
}

pub struct DeleteMachine<'a, C: SlbClient + ?Sized, K: Clock> {
    client: &'a C,
    clock: K,
    policy: DeletePolicy,
    acl_id: String,
    phase: DeletePhase,
    attempts: u32,
    started: Duration,
    backoff: Duration,
    failure: Option<ReconcileError>,
}

impl<'a, C: SlbClient + ?Sized, K: Clock> DeleteMachine<'a, C, K> {
    pub fn new(client: &'a C, clock: K, policy: DeletePolicy, acl_id: impl Into<String>) -> Self {
        let started = clock.now();
        Self {
            client,
            clock,
            policy,
            acl_id: acl_id.into(),
            phase: DeletePhase::Attempting,
            attempts: 0,
            started,
            backoff: policy.initial_backoff,
            failure: None,
        }
    }

    pub fn phase(&self) -> DeletePhase {
        self.phase
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn failure(&self) -> Option<&ReconcileError> {
        self.failure.as_ref()
    }

    fn elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.started)
    }

    fn fail(&mut self, err: ReconcileError) -> DeletePhase {
        self.failure = Some(err);
        DeletePhase::Failed
    }

    /// Perform one transition. A no-op once terminal.
    pub fn step(&mut self) -> DeletePhase {
        self.phase = match self.phase {
            DeletePhase::Attempting => self.attempt(),
            DeletePhase::Confirming => self.confirm(),
            terminal => terminal,
        };
        self.phase
    }

    fn attempt(&mut self) -> DeletePhase {
        self.attempts += 1;
        match self.client.delete_acl(&self.acl_id) {
            Ok(()) => DeletePhase::Confirming,
            Err(e) if e.is(ErrorKind::NotFound) => {
                debug!(acl_id = %self.acl_id, "delete: already absent");
                DeletePhase::Done
            }
            Err(e) => {
                let elapsed = self.elapsed();
                if elapsed >= self.policy.timeout {
                    return self.fail(ReconcileError::DeleteTimedOut {
                        acl_id: self.acl_id.clone(),
                        attempts: self.attempts,
                        elapsed,
                        last: e,
                    });
                }
                let wait = self.backoff.min(self.policy.timeout - elapsed);
                warn!(
                    acl_id = %self.acl_id,
                    attempt = self.attempts,
                    wait_ms = wait.as_millis() as u64,
                    error = %e,
                    "delete failed; retrying"
                );
                self.clock.sleep(wait);
                self.backoff = self.policy.next_backoff(self.backoff);
                DeletePhase::Attempting
            }
        }
    }

    fn confirm(&mut self) -> DeletePhase {
        match self.client.describe_acl(&self.acl_id) {
            Err(e) if e.is(ErrorKind::NotFound) => DeletePhase::Done,
            Ok(_) => self.fail(ReconcileError::DeleteNotPropagated {
                acl_id: self.acl_id.clone(),
            }),
            Err(e) => self.fail(ReconcileError::Remote(e)),
        }
    }

    /// Drive to a terminal phase.
    pub fn run(mut self) -> Result<DeleteOutcome, ReconcileError> {
        while !self.phase.is_terminal() {
            self.step();
        }
        let elapsed = self.elapsed();
        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(DeleteOutcome {
                attempts: self.attempts,
                elapsed,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use sacl_remote::{Operation, PaperConfig, PaperSlb};
    use sacl_schemas::IpVersion;

    fn paper_with_acl() -> (PaperSlb, String) {
        let p = PaperSlb::new(PaperConfig::default());
        let id = p.create_acl("doomed", IpVersion::V4).unwrap();
        (p, id)
    }

    #[test]
    fn clean_delete_walks_attempting_confirming_done() {
        let (p, id) = paper_with_acl();
        let clock = ManualClock::new();
        let mut m = DeleteMachine::new(&p, &clock, DeletePolicy::default(), id);
        assert_eq!(m.phase(), DeletePhase::Attempting);
        assert_eq!(m.step(), DeletePhase::Confirming);
        assert_eq!(m.step(), DeletePhase::Done);
        assert_eq!(m.step(), DeletePhase::Done);
        assert_eq!(m.attempts(), 1);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn absent_resource_goes_straight_to_done() {
        let p = PaperSlb::new(PaperConfig::default());
        let clock = ManualClock::new();
        let mut m = DeleteMachine::new(&p, &clock, DeletePolicy::default(), "acl-missing");
        assert_eq!(m.step(), DeletePhase::Done);
    }

    #[test]
    fn lingering_resource_fails_confirmation() {
        let (p, id) = paper_with_acl();
        p.set_delete_visibility_lag(1);
        let clock = ManualClock::new();
        let mut m = DeleteMachine::new(&p, &clock, DeletePolicy::default(), id.clone());
        m.step();
        assert_eq!(m.step(), DeletePhase::Failed);
        assert_eq!(
            m.failure(),
            Some(&ReconcileError::DeleteNotPropagated { acl_id: id })
        );
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let (p, id) = paper_with_acl();
        for _ in 0..6 {
            p.inject_fault(Operation::Delete, "Throttling", "slow down");
        }
        let clock = ManualClock::new();
        let out = DeleteMachine::new(&p, &clock, DeletePolicy::default(), id)
            .run()
            .unwrap();
        assert_eq!(out.attempts, 7);
        let secs: Vec<u64> = clock.sleeps().iter().map(Duration::as_secs).collect();
        assert_eq!(secs, vec![1, 2, 4, 8, 10, 10]);
    }

    #[test]
    fn describe_error_during_confirmation_is_not_retried() {
        let (p, id) = paper_with_acl();
        p.inject_fault(Operation::Describe, "InternalError", "boom");
        let clock = ManualClock::new();
        let err = DeleteMachine::new(&p, &clock, DeletePolicy::default(), id)
            .run()
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Remote(ref e) if e.op == Operation::Describe));
        assert!(clock.sleeps().is_empty());
    }
}
