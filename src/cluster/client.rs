//! Kubernetes API access used by the init container
//!
//! The coordinator only ever reads two kinds of objects: its own MariaDB resource
//! and the Pod it waits on. Both go through [`ClusterClient`] so the sequencing
//! logic can run against an in-memory fake.

use crate::cluster::resource::MariaDB;
use crate::common::{Error, ObjectKey, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

/// Read access to the declarative cluster store
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Fetch the MariaDB resource. Missing objects yield [`Error::NotFound`].
    async fn get_mariadb(&self, key: &ObjectKey) -> Result<MariaDB>;

    /// Fetch a Pod. Missing objects yield [`Error::NotFound`].
    async fn get_pod(&self, key: &ObjectKey) -> Result<Pod>;
}

/// [`ClusterClient`] backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from in-cluster config or the local kubeconfig
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default()
            .await
            .map_err(|e| Error::ClusterClient(e.to_string()))?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn get_mariadb(&self, key: &ObjectKey) -> Result<MariaDB> {
        let api: Api<MariaDB> = Api::namespaced(self.client.clone(), &key.namespace);
        api.get(&key.name)
            .await
            .map_err(|e| lookup_error("MariaDB", key, e))
    }

    async fn get_pod(&self, key: &ObjectKey) -> Result<Pod> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), &key.namespace);
        api.get(&key.name)
            .await
            .map_err(|e| lookup_error("Pod", key, e))
    }
}

fn lookup_error(kind: &str, key: &ObjectKey, err: kube::Error) -> Error {
    match err {
        kube::Error::Api(ref resp) if resp.code == 404 => {
            Error::NotFound(format!("{} {}", kind, key))
        }
        other => Error::Kube(other),
    }
}

#[derive(Default)]
struct MemObjects {
    mariadbs: HashMap<ObjectKey, MariaDB>,
    pods: HashMap<ObjectKey, Pod>,
    mariadb_lookups: usize,
    pod_lookups: HashMap<ObjectKey, Vec<Instant>>,
    failing_pod_lookups: usize,
}

/// In-memory [`ClusterClient`] that records every lookup
#[derive(Default)]
pub struct MemClusterClient {
    objects: Mutex<MemObjects>,
}

impl MemClusterClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemObjects> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn put_mariadb(&self, key: ObjectKey, mariadb: MariaDB) {
        self.lock().mariadbs.insert(key, mariadb);
    }

    pub fn remove_mariadb(&self, key: &ObjectKey) {
        self.lock().mariadbs.remove(key);
    }

    pub fn put_pod(&self, key: ObjectKey, pod: Pod) {
        self.lock().pods.insert(key, pod);
    }

    /// Fail the next `n` Pod lookups with a transient error
    pub fn fail_next_pod_lookups(&self, n: usize) {
        self.lock().failing_pod_lookups = n;
    }

    pub fn mariadb_lookups(&self) -> usize {
        self.lock().mariadb_lookups
    }

    /// When each lookup of `key` happened
    pub fn pod_lookups(&self, key: &ObjectKey) -> Vec<Instant> {
        self.lock().pod_lookups.get(key).cloned().unwrap_or_default()
    }

    pub fn total_pod_lookups(&self) -> usize {
        self.lock().pod_lookups.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl ClusterClient for MemClusterClient {
    async fn get_mariadb(&self, key: &ObjectKey) -> Result<MariaDB> {
        let mut objects = self.lock();
        objects.mariadb_lookups += 1;
        objects
            .mariadbs
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("MariaDB {}", key)))
    }

    async fn get_pod(&self, key: &ObjectKey) -> Result<Pod> {
        let mut objects = self.lock();
        objects
            .pod_lookups
            .entry(key.clone())
            .or_default()
            .push(Instant::now());
        if objects.failing_pod_lookups > 0 {
            objects.failing_pod_lookups -= 1;
            return Err(Error::Internal("connection refused".into()));
        }
        objects
            .pods
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Pod {}", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".into(),
            message: "boom".into(),
            reason: "Unknown".into(),
            code,
        })
    }

    #[test]
    fn test_lookup_error_mapping() {
        let key = ObjectKey::new("mariadb-galera", "default");

        let err = lookup_error("MariaDB", &key, api_error(404));
        assert!(matches!(err, Error::NotFound(ref msg) if msg == "MariaDB default/mariadb-galera"));

        let err = lookup_error("MariaDB", &key, api_error(503));
        assert!(matches!(err, Error::Kube(_)));
        assert!(!err.is_not_found());
    }
}
