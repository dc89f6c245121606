//! Everything one init run needs, built once and passed down explicitly

use crate::cluster::{ClusterClient, PodReadyCondition, ReadinessCheck};
use crate::common::PodEnvironment;
use crate::galera::{ConfigRenderer, GaleraConfigRenderer, StateStore};
use crate::init::shutdown::Shutdown;
use std::sync::Arc;

pub struct InitContext {
    pub env: PodEnvironment,
    pub files: Arc<dyn StateStore>,
    pub client: Arc<dyn ClusterClient>,
    pub renderer: Arc<dyn ConfigRenderer>,
    pub readiness: Arc<dyn ReadinessCheck>,
    pub shutdown: Shutdown,
}

impl InitContext {
    /// Context with the default Galera renderer and Pod readiness check
    pub fn new(
        env: PodEnvironment,
        files: Arc<dyn StateStore>,
        client: Arc<dyn ClusterClient>,
    ) -> Self {
        Self {
            env,
            files,
            client,
            renderer: Arc::new(GaleraConfigRenderer),
            readiness: Arc::new(PodReadyCondition),
            shutdown: Shutdown::new(),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ConfigRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_readiness(mut self, readiness: Arc<dyn ReadinessCheck>) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }
}
