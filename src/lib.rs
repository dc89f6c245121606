//! # galera-init
//!
//! Init container for MariaDB Galera Pods managed by an ordinal-indexed StatefulSet:
//! - Renders the Galera config from the MariaDB resource
//! - Lets exactly one Pod (ordinal 0) bootstrap a brand-new cluster
//! - Makes joining Pods wait for their predecessor to be ready
//! - Purges stale state after a VolumeSnapshot restore or an interrupted SST
//!
//! ## Sequence
//!
//! ```text
//! ┌──────────────┐   not found   ┌───────────────────────┐
//! │ get MariaDB  ├──────────────►│ patch existing config │──► exit 0
//! └──────┬───────┘               └───────────────────────┘
//!        │ found
//! ┌──────▼───────────────┐
//! │ snapshot cleanup     │  grastate.dat, gvwstate.dat
//! │ render 0-galera.cnf  │
//! │ bootstrap decision   │  1-bootstrap.cnf (ordinal 0 only)
//! │ wait for <name>-N-1  │  1s polls until Ready
//! │ SST cleanup          │  wsrep_sst.pid, sst_in_progress
//! └──────┬───────────────┘
//!        ▼
//!      exit 0
//! ```
//!
//! ## Usage
//!
//! ```bash
//! galera-init \
//!   --config-dir /etc/mysql/mariadb.conf.d \
//!   --state-dir /var/lib/mysql
//! ```
//!
//! `POD_NAME`, `POD_NAMESPACE`, `POD_IP` and `MARIADB_NAME` must be set.

pub mod cluster;
pub mod common;
pub mod galera;
pub mod init;

// Re-export commonly used types
pub use common::{Error, InitConfig, PodEnvironment, Result};
pub use init::{InitContext, InitOutcome, Initializer};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build info
pub const BUILD_INFO: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARGO_PKG_NAME"), ")");
