//! Pod environment, as injected by the operator through the downward API

use crate::common::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

pub const POD_NAME: &str = "POD_NAME";
pub const POD_NAMESPACE: &str = "POD_NAMESPACE";
pub const POD_IP: &str = "POD_IP";
pub const MARIADB_NAME: &str = "MARIADB_NAME";
pub const CLUSTER_NAME: &str = "CLUSTER_NAME";
pub const MARIADB_ROOT_PASSWORD: &str = "MARIADB_ROOT_PASSWORD";
pub const MYSQL_TCP_PORT: &str = "MYSQL_TCP_PORT";

const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";
const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Source of environment variables
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Namespaced object key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub name: String,
    pub namespace: String,
}

impl ObjectKey {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Immutable snapshot of the Pod environment, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodEnvironment {
    pub pod_name: String,
    pub pod_namespace: String,
    pub pod_ip: IpAddr,
    pub mariadb_name: String,
    /// Kubernetes cluster domain, e.g. `cluster.local`
    pub cluster_name: String,
    pub root_password: Option<String>,
    pub mysql_port: u16,
}

impl PodEnvironment {
    /// Resolve the environment, failing on the first missing required variable
    pub fn resolve(source: &impl EnvSource) -> Result<Self> {
        let pod_ip = required(source, POD_IP)?;
        let pod_ip = pod_ip
            .parse::<IpAddr>()
            .map_err(|_| Error::Environment(format!("{} is not an IP address: {}", POD_IP, pod_ip)))?;

        let mysql_port = match optional(source, MYSQL_TCP_PORT) {
            Some(port) => port.parse::<u16>().map_err(|_| {
                Error::Environment(format!("{} is not a valid port: {}", MYSQL_TCP_PORT, port))
            })?,
            None => DEFAULT_MYSQL_PORT,
        };

        Ok(Self {
            pod_name: required(source, POD_NAME)?,
            pod_namespace: required(source, POD_NAMESPACE)?,
            pod_ip,
            mariadb_name: required(source, MARIADB_NAME)?,
            cluster_name: optional(source, CLUSTER_NAME)
                .unwrap_or_else(|| DEFAULT_CLUSTER_DOMAIN.to_string()),
            root_password: optional(source, MARIADB_ROOT_PASSWORD),
            mysql_port,
        })
    }

    /// Key of the MariaDB resource this Pod belongs to
    pub fn resource_key(&self) -> ObjectKey {
        ObjectKey::new(&self.mariadb_name, &self.pod_namespace)
    }

    /// Key of another Pod in the same namespace
    pub fn pod_key(&self, name: impl Into<String>) -> ObjectKey {
        ObjectKey::new(name, &self.pod_namespace)
    }
}

fn required(source: &impl EnvSource, key: &str) -> Result<String> {
    optional(source, key)
        .ok_or_else(|| Error::Environment(format!("required variable {} is not set", key)))
}

fn optional(source: &impl EnvSource, key: &str) -> Option<String> {
    source
        .var(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_env() -> HashMap<String, String> {
        [
            (POD_NAME, "mariadb-galera-1"),
            (POD_NAMESPACE, "default"),
            (POD_IP, "10.244.0.12"),
            (MARIADB_NAME, "mariadb-galera"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_resolve() {
        let env = PodEnvironment::resolve(&base_env()).unwrap();
        assert_eq!(env.pod_name, "mariadb-galera-1");
        assert_eq!(env.cluster_name, "cluster.local");
        assert_eq!(env.mysql_port, 3306);
        assert_eq!(env.root_password, None);
        assert_eq!(env.resource_key(), ObjectKey::new("mariadb-galera", "default"));
        assert_eq!(env.pod_key("mariadb-galera-0").to_string(), "default/mariadb-galera-0");
    }

    #[test]
    fn test_missing_required() {
        for key in [POD_NAME, POD_NAMESPACE, POD_IP, MARIADB_NAME] {
            let mut vars = base_env();
            vars.remove(key);
            let err = PodEnvironment::resolve(&vars).unwrap_err();
            assert!(matches!(err, Error::Environment(ref msg) if msg.contains(key)));
        }
    }

    #[test]
    fn test_blank_is_missing() {
        let mut vars = base_env();
        vars.insert(POD_NAME.to_string(), "  ".to_string());
        assert!(PodEnvironment::resolve(&vars).is_err());
    }

    #[test]
    fn test_invalid_values() {
        let mut vars = base_env();
        vars.insert(POD_IP.to_string(), "not-an-ip".to_string());
        assert!(PodEnvironment::resolve(&vars).is_err());

        let mut vars = base_env();
        vars.insert(MYSQL_TCP_PORT.to_string(), "99999".to_string());
        assert!(PodEnvironment::resolve(&vars).is_err());
    }
}
