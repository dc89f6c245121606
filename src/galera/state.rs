//! File names shared with the MariaDB/Galera process
//!
//! These names are read and written by an unmodified `mariadbd`, so they must
//! not change.

use crate::common::Result;
use crate::galera::files::StateStore;

/// Galera config rendered by the init container (config dir)
pub const CONFIG_FILE_NAME: &str = "0-galera.cnf";

/// Tells `mariadbd` to start a new cluster instead of joining one (config dir)
pub const BOOTSTRAP_FILE_NAME: &str = "1-bootstrap.cnf";

pub const BOOTSTRAP_FILE: &[u8] = b"[galera]\nwsrep_new_cluster=\"ON\"";

/// Galera saved state, written once the node has been part of a cluster (state dir)
pub const GALERA_STATE_FILE_NAME: &str = "grastate.dat";

/// Last primary component view (state dir)
pub const GALERA_PRIMARY_COMPONENT_FILE_NAME: &str = "gvwstate.dat";

pub const MEMBERSHIP_FILES: [&str; 2] = [GALERA_STATE_FILE_NAME, GALERA_PRIMARY_COMPONENT_FILE_NAME];

/// Present while a State Snapshot Transfer is running (state dir)
pub const WSREP_SST_PID_FILE_NAME: &str = "wsrep_sst.pid";

pub const SST_IN_PROGRESS_FILE_NAME: &str = "sst_in_progress";

pub const TRANSFER_FILES: [&str; 2] = [WSREP_SST_PID_FILE_NAME, SST_IN_PROGRESS_FILE_NAME];

/// Has this node previously joined or formed a cluster?
pub fn has_galera_state(store: &dyn StateStore) -> Result<bool> {
    for file in MEMBERSHIP_FILES {
        if store.state_file_exists(file)? {
            return Ok(true);
        }
    }
    Ok(false)
}
