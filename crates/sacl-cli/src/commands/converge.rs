//! `sacl plan` and `sacl apply`.

use anyhow::Result;
use serde_json::json;
use tracing::info;

use sacl_reconcile::{plan as plan_for, Reconciler};

use super::{delete_policy, load_context, load_manifest, load_state, print_json, save_state, Remote};

/// Offline: compares the manifest with the last recorded state.
pub fn plan(desired: &str, state_path: &str) -> Result<()> {
    let spec = load_manifest(desired)?;
    let state = load_state(state_path)?;
    let plan = plan_for(&state, &spec);
    print_json(&json!({
        "acl_id": state.id,
        "plan": plan,
    }))
}

/// Refresh, plan, converge.
///
/// The state file and paper store are written before the result is
/// inspected, so steps that committed before a failure are recorded.
pub fn apply(config_paths: &[String], desired: &str, state_path: &str) -> Result<()> {
    let ctx = load_context(config_paths)?;
    let spec = load_manifest(desired)?;
    let mut state = load_state(state_path)?;
    let remote = Remote::open(&ctx)?;

    let reconciler = Reconciler::new(remote.client())
        .with_delete_policy(delete_policy(&ctx.settings.delete));
    let result = reconciler.converge(&mut state, &spec);

    save_state(state_path, &state)?;
    remote.persist()?;

    let plan = result?;
    info!(acl_id = %state.id, "apply complete");
    print_json(&json!({
        "config_hash": ctx.loaded.config_hash,
        "plan": plan,
        "state": state,
    }))
}
