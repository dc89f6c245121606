//! Bootstrap decision
//!
//! Only Pod 0 of a cluster that has never been configured, holding no previous
//! Galera state, may start a new cluster. Anyone else joins.

use crate::common::Result;
use crate::galera::files::StateStore;
use crate::galera::state::{has_galera_state, BOOTSTRAP_FILE, BOOTSTRAP_FILE_NAME};

pub fn should_bootstrap(configured: bool, has_galera_state: bool, pod_index: u32) -> bool {
    pod_index == 0 && !configured && !has_galera_state
}

/// Write the bootstrap marker when this Pod must start a new cluster.
///
/// Never removes a marker left by a previous run. Returns whether the marker was written.
pub fn configure_galera_bootstrap(
    files: &dyn StateStore,
    configured: bool,
    pod_index: u32,
) -> Result<bool> {
    let has_state = has_galera_state(files)?;
    if !should_bootstrap(configured, has_state, pod_index) {
        return Ok(false);
    }
    tracing::info!("Configuring Galera bootstrap");

    files.write_config_file(BOOTSTRAP_FILE_NAME, BOOTSTRAP_FILE)?;
    Ok(true)
}
