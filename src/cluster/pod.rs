//! Pod readiness

use k8s_openapi::api::core::v1::Pod;

/// Decides whether a fetched Pod counts as healthy
pub trait ReadinessCheck: Send + Sync {
    fn is_ready(&self, pod: &Pod) -> bool;
}

/// A Pod is ready when its `Ready` condition is `True`
#[derive(Debug, Clone, Copy, Default)]
pub struct PodReadyCondition;

impl ReadinessCheck for PodReadyCondition {
    fn is_ready(&self, pod: &Pod) -> bool {
        pod_ready(pod)
    }
}

pub fn pod_ready(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
        .unwrap_or(false)
}
