//! Removal of stale Galera state files

use crate::cluster::resource::MariaDB;
use crate::common::Result;
use crate::galera::files::{delete_state_file_if_exists, StateStore};
use crate::galera::state::{MEMBERSHIP_FILES, TRANSFER_FILES};

/// Drop membership state restored from another cluster's VolumeSnapshot.
///
/// Only applies while the cluster is not yet configured; returns the number of
/// files deleted.
pub fn cleanup_state_for_volume_snapshot(
    files: &dyn StateStore,
    mariadb: &MariaDB,
) -> Result<usize> {
    if mariadb.has_galera_configured_condition() || mariadb.volume_snapshot_ref().is_none() {
        return Ok(0);
    }
    tracing::info!("Cleaning up state for VolumeSnapshot");

    delete_all(files, &MEMBERSHIP_FILES)
}

/// Drop markers of a State Snapshot Transfer from a previous incarnation
pub fn cleanup_previous_sst(files: &dyn StateStore) -> Result<usize> {
    delete_all(files, &TRANSFER_FILES)
}

fn delete_all(files: &dyn StateStore, names: &[&str]) -> Result<usize> {
    let mut deleted = 0;
    for name in names {
        if delete_state_file_if_exists(files, name)? {
            deleted += 1;
        }
    }
    Ok(deleted)
}
