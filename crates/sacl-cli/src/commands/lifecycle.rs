//! `sacl refresh | import | destroy | show`.

use anyhow::{bail, Result};
use serde_json::json;
use tracing::warn;

use sacl_reconcile::{ReadOutcome, Reconciler};
use sacl_schemas::AclState;

use super::{delete_policy, load_context, load_state, print_json, save_state, Remote};

pub fn refresh(config_paths: &[String], state_path: &str) -> Result<()> {
    let ctx = load_context(config_paths)?;
    let mut state = load_state(state_path)?;
    if state.is_gone() {
        bail!("STATE_EMPTY: {state_path} tracks no acl; nothing to refresh");
    }
    let acl_id = state.id.clone();
    let remote = Remote::open(&ctx)?;

    let outcome = Reconciler::new(remote.client()).read(&mut state)?;
    let outcome = match outcome {
        ReadOutcome::Present => "present",
        ReadOutcome::Gone => {
            warn!(acl_id = %acl_id, "drift: acl no longer exists remotely; record purged");
            "gone"
        }
    };

    save_state(state_path, &state)?;
    remote.persist()?;
    print_json(&json!({
        "acl_id": acl_id,
        "outcome": outcome,
        "state": state,
    }))
}

/// Only an empty state file, or one already tracking `id`, may be imported into.
pub fn import(config_paths: &[String], id: &str, state_path: &str) -> Result<()> {
    let ctx = load_context(config_paths)?;
    let existing = load_state(state_path)?;
    if !existing.is_gone() && existing.id != id {
        bail!(
            "REFUSING IMPORT: {state_path} already tracks acl {}; destroy it or use another state file",
            existing.id
        );
    }
    let remote = Remote::open(&ctx)?;

    let mut state = AclState::import(id);
    let outcome = Reconciler::new(remote.client()).read(&mut state)?;
    remote.persist()?;
    if outcome == ReadOutcome::Gone {
        bail!("IMPORT_NOT_FOUND: acl {id} does not exist remotely");
    }

    save_state(state_path, &state)?;
    print_json(&json!({
        "imported": id,
        "state": state,
    }))
}

pub fn destroy(config_paths: &[String], state_path: &str) -> Result<()> {
    let ctx = load_context(config_paths)?;
    let mut state = load_state(state_path)?;
    let acl_id = state.id.clone();
    let remote = Remote::open(&ctx)?;

    let result = Reconciler::new(remote.client())
        .with_delete_policy(delete_policy(&ctx.settings.delete))
        .delete(&mut state);

    remote.persist()?;
    let outcome = result?;
    save_state(state_path, &state)?;
    print_json(&json!({
        "acl_id": acl_id,
        "destroyed": true,
        "attempts": outcome.attempts,
        "elapsed_ms": outcome.elapsed.as_millis() as u64,
    }))
}

pub fn show(state_path: &str) -> Result<()> {
    if !std::path::Path::new(state_path).exists() {
        bail!("STATE_MISSING: {state_path} does not exist");
    }
    print_json(&load_state(state_path)?)
}
