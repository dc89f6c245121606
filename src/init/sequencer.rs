//! Init sequence
//!
//! ```text
//! ResolveEnv → ConnectCluster → ResolveOrdinal → FetchResource
//!   ├─ lookup failed: FallbackUpdateConfig → done
//!   └─ found:         SnapshotCleanup → MaterializeConfig → BootstrapDecision
//!                     → PredecessorWait → TransferCleanup → done
//! ```
//!
//! Steps run once, in order. A failing step aborts the run unless its
//! [`FailurePolicy`] is `Continue`.

use crate::cluster::resource::MariaDB;
use crate::cluster::statefulset::pod_index;
use crate::common::Result;
use crate::galera::state::CONFIG_FILE_NAME;
use crate::init::bootstrap::configure_galera_bootstrap;
use crate::init::cleanup::{cleanup_previous_sst, cleanup_state_for_volume_snapshot};
use crate::init::context::InitContext;
use crate::init::wait::wait_for_previous_pod;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    ResolveEnv,
    ConnectCluster,
    ResolveOrdinal,
    FetchResource,
    FallbackUpdateConfig,
    SnapshotCleanup,
    MaterializeConfig,
    BootstrapDecision,
    PredecessorWait,
    TransferCleanup,
}

/// What happens to the run when a step fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    Abort,
    /// Log the error and carry on with the next step
    Continue,
}

impl InitStep {
    /// Only the bootstrap marker write may fail without aborting the run
    pub fn failure_policy(&self) -> FailurePolicy {
        match self {
            InitStep::BootstrapDecision => FailurePolicy::Continue,
            _ => FailurePolicy::Abort,
        }
    }
}

impl fmt::Display for InitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            InitStep::ResolveEnv => "error getting environment variables",
            InitStep::ConnectCluster => "error getting Kubernetes client",
            InitStep::ResolveOrdinal => "error getting index from Pod",
            InitStep::FetchResource => "error getting MariaDB",
            InitStep::FallbackUpdateConfig => "error updating Galera config",
            InitStep::SnapshotCleanup => "error cleaning up state for VolumeSnapshot",
            InitStep::MaterializeConfig => "error configuring Galera",
            InitStep::BootstrapDecision => "error configuring Galera bootstrap",
            InitStep::PredecessorWait => "error waiting for previous Pod",
            InitStep::TransferCleanup => "error cleaning up previous SST",
        };
        f.write_str(msg)
    }
}

/// How a successful run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// MariaDB was unreachable; only the existing config was patched
    ConfigUpdated,
    Initialized {
        bootstrapped: bool,
        waited_for: Option<String>,
    },
}

/// Apply the step's failure policy to its result
fn check<T: Default>(step: InitStep, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) => match step.failure_policy() {
            FailurePolicy::Abort => Err(e.in_step(step)),
            FailurePolicy::Continue => {
                tracing::error!(error = %e, "{}, continuing", step);
                Ok(T::default())
            }
        },
    }
}

pub struct Initializer {
    ctx: InitContext,
}

impl Initializer {
    pub fn new(ctx: InitContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &InitContext {
        &self.ctx
    }

    pub async fn run(&self) -> Result<InitOutcome> {
        let ctx = &self.ctx;
        tracing::info!(pod = %ctx.env.pod_name, "Starting init");

        let index = check(InitStep::ResolveOrdinal, pod_index(&ctx.env.pod_name))?;

        let mariadb = match ctx.client.get_mariadb(&ctx.env.resource_key()).await {
            Ok(mariadb) => mariadb,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "{}, updating existing config only",
                    InitStep::FetchResource
                );
                check(InitStep::FallbackUpdateConfig, self.update_galera_config())?;
                tracing::info!("Updated Galera config");
                return Ok(InitOutcome::ConfigUpdated);
            }
        };
        let configured = mariadb.has_galera_configured_condition();

        check(
            InitStep::SnapshotCleanup,
            cleanup_state_for_volume_snapshot(ctx.files.as_ref(), &mariadb),
        )?;
        check(InitStep::MaterializeConfig, self.configure_galera(&mariadb))?;
        let bootstrapped = check(
            InitStep::BootstrapDecision,
            configure_galera_bootstrap(ctx.files.as_ref(), configured, index),
        )?;
        let waited_for = check(
            InitStep::PredecessorWait,
            wait_for_previous_pod(ctx, &mariadb, index).await,
        )?;
        check(
            InitStep::TransferCleanup,
            cleanup_previous_sst(ctx.files.as_ref()),
        )?;

        tracing::info!("Init done");
        Ok(InitOutcome::Initialized {
            bootstrapped,
            waited_for,
        })
    }

    fn configure_galera(&self, mariadb: &MariaDB) -> Result<()> {
        tracing::info!("Configuring Galera");

        let bytes = self.ctx.renderer.render(mariadb, &self.ctx.env)?;
        self.ctx.files.write_config_file(CONFIG_FILE_NAME, &bytes)
    }

    fn update_galera_config(&self) -> Result<()> {
        tracing::info!("Updating existing Galera config");

        let existing = self.ctx.files.read_config_file(CONFIG_FILE_NAME)?;
        let updated = self.ctx.renderer.update(&existing, &self.ctx.env)?;
        self.ctx.files.write_config_file(CONFIG_FILE_NAME, &updated)
    }
}
