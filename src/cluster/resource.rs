//! MariaDB custom resource, as far as the init container reads it

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Condition set by the operator once the Galera cluster has bootstrapped
pub const CONDITION_GALERA_CONFIGURED: &str = "GaleraConfigured";

const CONDITION_TRUE: &str = "True";

/// MariaDB is the Schema for the mariadbs API
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[kube(
    group = "k8s.mariadb.com",
    version = "v1alpha1",
    kind = "MariaDB",
    plural = "mariadbs",
    shortname = "mdb",
    namespaced,
    status = "MariaDBStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct MariaDBSpec {
    /// Number of Pods in the StatefulSet
    #[serde(default = "default_replicas")]
    pub replicas: i32,

    /// Galera cluster settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub galera: Option<Galera>,

    /// Source used to provision the initial data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_from: Option<BootstrapFrom>,
}

fn default_replicas() -> i32 {
    1
}

impl Default for MariaDBSpec {
    fn default() -> Self {
        Self {
            replicas: default_replicas(),
            galera: None,
            bootstrap_from: None,
        }
    }
}

/// State Snapshot Transfer method
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SstMethod {
    Rsync,
    #[default]
    Mariabackup,
    Mysqldump,
}

impl SstMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SstMethod::Rsync => "rsync",
            SstMethod::Mariabackup => "mariabackup",
            SstMethod::Mysqldump => "mysqldump",
        }
    }

    /// Does the donor need database credentials for this method?
    pub fn needs_auth(&self) -> bool {
        !matches!(self, SstMethod::Rsync)
    }
}

impl fmt::Display for SstMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Galera {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub sst: SstMethod,

    /// Number of applier threads (`wsrep_slave_threads`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_threads: Option<i32>,

    /// Extra `wsrep_provider_options`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub provider_options: BTreeMap<String, String>,

    /// Path to the Galera provider library
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub galera_lib_path: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapFrom {
    /// VolumeSnapshot the data volumes were restored from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_snapshot_ref: Option<LocalObjectReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_ref: Option<LocalObjectReference>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
pub struct LocalObjectReference {
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MariaDBStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// Kubernetes-style condition
#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,

    /// True, False, or Unknown
    pub status: String,

    #[serde(default)]
    pub reason: String,

    #[serde(default)]
    pub message: String,
}

impl Condition {
    pub fn new(type_: &str, status: bool) -> Self {
        Self {
            type_: type_.to_string(),
            status: if status { CONDITION_TRUE } else { "False" }.to_string(),
            ..Default::default()
        }
    }
}

impl MariaDB {
    /// Has the cluster completed its first bootstrap, ever?
    pub fn has_galera_configured_condition(&self) -> bool {
        self.status
            .as_ref()
            .map(|s| {
                s.conditions
                    .iter()
                    .any(|c| c.type_ == CONDITION_GALERA_CONFIGURED && c.status == CONDITION_TRUE)
            })
            .unwrap_or(false)
    }

    pub fn volume_snapshot_ref(&self) -> Option<&LocalObjectReference> {
        self.spec
            .bootstrap_from
            .as_ref()
            .and_then(|b| b.volume_snapshot_ref.as_ref())
    }

    /// Galera settings, defaulted when the resource leaves them out
    pub fn galera(&self) -> Galera {
        self.spec.galera.clone().unwrap_or_default()
    }

    pub fn replicas(&self) -> u32 {
        u32::try_from(self.spec.replicas).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mariadb(conditions: Vec<Condition>) -> MariaDB {
        let mut mdb = MariaDB::new("mariadb-galera", MariaDBSpec::default());
        mdb.status = Some(MariaDBStatus { conditions });
        mdb
    }

    #[test]
    fn test_galera_configured_condition() {
        assert!(!MariaDB::new("m", MariaDBSpec::default()).has_galera_configured_condition());
        assert!(!mariadb(vec![]).has_galera_configured_condition());
        assert!(!mariadb(vec![Condition::new("Ready", true)]).has_galera_configured_condition());
        assert!(!mariadb(vec![Condition::new(CONDITION_GALERA_CONFIGURED, false)])
            .has_galera_configured_condition());
        assert!(mariadb(vec![
            Condition::new("Ready", false),
            Condition::new(CONDITION_GALERA_CONFIGURED, true),
        ])
        .has_galera_configured_condition());
    }

    #[test]
    fn test_deserialize_spec() {
        let mdb: MariaDB = serde_json::from_value(serde_json::json!({
            "apiVersion": "k8s.mariadb.com/v1alpha1",
            "kind": "MariaDB",
            "metadata": { "name": "mariadb-galera", "namespace": "default" },
            "spec": {
                "replicas": 3,
                "galera": { "enabled": true, "sst": "rsync", "replicaThreads": 2 },
                "bootstrapFrom": { "volumeSnapshotRef": { "name": "snap-1" } }
            },
            "status": {
                "conditions": [{ "type": "GaleraConfigured", "status": "True" }]
            }
        }))
        .unwrap();

        assert_eq!(mdb.replicas(), 3);
        assert_eq!(mdb.galera().sst, SstMethod::Rsync);
        assert_eq!(mdb.galera().replica_threads, Some(2));
        assert_eq!(mdb.volume_snapshot_ref().map(|r| r.name.as_str()), Some("snap-1"));
        assert!(mdb.has_galera_configured_condition());
    }

    #[test]
    fn test_defaults() {
        let mdb = MariaDB::new("mariadb", MariaDBSpec::default());
        assert_eq!(mdb.replicas(), 1);
        assert_eq!(mdb.galera().sst, SstMethod::Mariabackup);
        assert!(mdb.volume_snapshot_ref().is_none());
        assert!(SstMethod::Mariabackup.needs_auth());
        assert!(!SstMethod::Rsync.needs_auth());
    }
}
