//! Waiting for the previous Pod
//!
//! A Pod joining a cluster for the first time waits until the Pod with the
//! previous ordinal is ready, so Pods come up in ascending ordinal order.
//! The wait is skipped for Pod 0, for clusters already configured and for
//! nodes that hold Galera state (they are resuming, not joining).

use crate::cluster::resource::MariaDB;
use crate::cluster::statefulset::previous_pod_name;
use crate::cluster::{ClusterClient, ReadinessCheck};
use crate::common::{Error, ObjectKey, Result};
use crate::galera::state::has_galera_state;
use crate::init::context::InitContext;
use crate::init::shutdown::Shutdown;
use kube::ResourceExt;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Delay between readiness polls
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

pub fn needs_wait(configured: bool, has_galera_state: bool, pod_index: u32) -> bool {
    !(configured || has_galera_state || pod_index == 0)
}

/// Block until the previous Pod is ready, when required.
///
/// Returns the name of the Pod waited on, or `None` if no wait was needed.
pub async fn wait_for_previous_pod(
    ctx: &InitContext,
    mariadb: &MariaDB,
    pod_index: u32,
) -> Result<Option<String>> {
    let has_state = has_galera_state(ctx.files.as_ref())?;
    if !needs_wait(mariadb.has_galera_configured_condition(), has_state, pod_index) {
        return Ok(None);
    }
    let previous = previous_pod_name(&mariadb.name_any(), pod_index)?;

    tracing::info!(pod = %previous, "Waiting for previous Pod to be ready");
    let key = ctx.env.pod_key(&previous);
    wait_for_pod_ready(
        ctx.client.as_ref(),
        ctx.readiness.as_ref(),
        &ctx.shutdown,
        &key,
        POLL_INTERVAL,
    )
    .await
    .map_err(|e| Error::PredecessorWait {
        pod: previous.clone(),
        reason: e.to_string(),
    })?;

    tracing::info!(pod = %previous, "Previous Pod is ready");
    Ok(Some(previous))
}

/// Poll a Pod every `interval` until it is ready or `shutdown` fires.
///
/// Lookup errors count as "not ready yet". The first poll happens immediately.
pub async fn wait_for_pod_ready(
    client: &dyn ClusterClient,
    readiness: &dyn ReadinessCheck,
    shutdown: &Shutdown,
    key: &ObjectKey,
    interval: Duration,
) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Err(Error::Cancelled),
            _ = ticker.tick() => {}
        }

        let lookup = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Err(Error::Cancelled),
            res = client.get_pod(key) => res,
        };

        match lookup {
            Ok(pod) if readiness.is_ready(&pod) => {
                tracing::debug!(pod = %key.name, "Pod ready");
                return Ok(());
            }
            Ok(_) => tracing::debug!(pod = %key.name, "Pod not ready"),
            Err(e) => tracing::debug!(pod = %key.name, error = %e, "Error getting Pod"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{MemClusterClient, PodReadyCondition};
    use k8s_openapi::api::core::v1::{Pod, PodCondition, PodStatus};
    use std::sync::Arc;

    fn ready_pod() -> Pod {
        Pod {
            status: Some(PodStatus {
                conditions: Some(vec![PodCondition {
                    type_: "Ready".into(),
                    status: "True".into(),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_needs_wait() {
        assert!(!needs_wait(false, false, 0));
        assert!(!needs_wait(true, false, 1));
        assert!(!needs_wait(false, true, 1));
        assert!(needs_wait(false, false, 1));
        assert!(needs_wait(false, false, 5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_on_first_poll() {
        let client = MemClusterClient::new();
        let key = ObjectKey::new("mariadb-galera-0", "default");
        client.put_pod(key.clone(), ready_pod());

        wait_for_pod_ready(&client, &PodReadyCondition, &Shutdown::new(), &key, POLL_INTERVAL)
            .await
            .unwrap();
        assert_eq!(client.pod_lookups(&key).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_every_second_through_errors() {
        let client = Arc::new(MemClusterClient::new());
        let key = ObjectKey::new("mariadb-galera-0", "default");
        client.put_pod(key.clone(), Pod::default());
        client.fail_next_pod_lookups(2);

        let becomes_ready = {
            let client = client.clone();
            let key = key.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(4500)).await;
                client.put_pod(key, ready_pod());
            })
        };

        wait_for_pod_ready(
            client.as_ref(),
            &PodReadyCondition,
            &Shutdown::new(),
            &key,
            POLL_INTERVAL,
        )
        .await
        .unwrap();
        becomes_ready.await.unwrap();

        let lookups = client.pod_lookups(&key);
        assert_eq!(lookups.len(), 6);
        for pair in lookups.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= POLL_INTERVAL && gap < POLL_INTERVAL * 2, "{:?}", gap);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation() {
        let client = MemClusterClient::new();
        let key = ObjectKey::new("mariadb-galera-1", "default");
        let shutdown = Shutdown::new();

        let trigger = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(3)).await;
                shutdown.trigger();
            })
        };

        let err = wait_for_pod_ready(&client, &PodReadyCondition, &shutdown, &key, POLL_INTERVAL)
            .await
            .unwrap_err();
        trigger.await.unwrap();

        assert!(matches!(err, Error::Cancelled));
        assert!(!client.pod_lookups(&key).is_empty());
    }
}
