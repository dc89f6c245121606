//! Galera configuration rendering
//!
//! The full config is regenerated from the MariaDB resource whenever it is
//! reachable. When it is not, only the Pod-IP dependent keys of the existing
//! file are rewritten and everything else is left as previously rendered.

use crate::cluster::resource::MariaDB;
use crate::cluster::statefulset::pod_fqdn;
use crate::common::{Error, PodEnvironment, Result};
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

const DEFAULT_GALERA_LIB_PATH: &str = "/usr/lib/galera/libgalera_smm.so";
const CLUSTER_NAME: &str = "mariadb-operator";

pub const GALERA_CLUSTER_PORT: u16 = 4567;
pub const GALERA_IST_PORT: u16 = 4568;
pub const GALERA_SST_PORT: u16 = 4444;

const KEY_NODE_ADDRESS: &str = "wsrep_node_address";
const KEY_PROVIDER_OPTIONS: &str = "wsrep_provider_options";
const KEY_SST_RECEIVE_ADDRESS: &str = "wsrep_sst_receive_address";
const OPT_IST_RECV_ADDR: &str = "ist.recv_addr";
const OPT_GMCAST_LISTEN_ADDR: &str = "gmcast.listen_addr";

/// Produces the bytes of the Galera config file
pub trait ConfigRenderer: Send + Sync {
    /// Render the whole file from the resource and environment
    fn render(&self, mariadb: &MariaDB, env: &PodEnvironment) -> Result<Vec<u8>>;

    /// Patch a previously rendered file with the current environment
    fn update(&self, existing: &[u8], env: &PodEnvironment) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GaleraConfigRenderer;

impl ConfigRenderer for GaleraConfigRenderer {
    fn render(&self, mariadb: &MariaDB, env: &PodEnvironment) -> Result<Vec<u8>> {
        render_config(mariadb, env).map(String::into_bytes)
    }

    fn update(&self, existing: &[u8], env: &PodEnvironment) -> Result<Vec<u8>> {
        let existing = std::str::from_utf8(existing)
            .map_err(|e| Error::GaleraConfig(format!("existing config is not UTF-8: {}", e)))?;
        update_config(existing, env).map(String::into_bytes)
    }
}

/// `host:port`, with IPv6 hosts in brackets
fn host_port(ip: &IpAddr, port: u16) -> String {
    match ip {
        IpAddr::V4(v4) => format!("{}:{}", v4, port),
        IpAddr::V6(v6) => format!("[{}]:{}", v6, port),
    }
}

/// Wildcard address of the same family as `ip`
fn any_address(ip: &IpAddr) -> IpAddr {
    match ip {
        IpAddr::V4(_) => Ipv4Addr::UNSPECIFIED.into(),
        IpAddr::V6(_) => Ipv6Addr::UNSPECIFIED.into(),
    }
}

pub fn render_config(mariadb: &MariaDB, env: &PodEnvironment) -> Result<String> {
    let galera = mariadb.galera();
    let name = mariadb.name_any();
    let replicas = mariadb.replicas();
    if replicas == 0 {
        return Err(Error::GaleraConfig(format!(
            "MariaDB '{}' must have at least one replica",
            name
        )));
    }

    let cluster_address = (0..replicas)
        .map(|i| pod_fqdn(&name, i, &env.pod_namespace, &env.cluster_name))
        .collect::<Vec<_>>()
        .join(",");

    let mut provider_options = BTreeMap::new();
    provider_options.insert(
        OPT_GMCAST_LISTEN_ADDR.to_string(),
        format!("tcp://{}", host_port(&any_address(&env.pod_ip), GALERA_CLUSTER_PORT)),
    );
    provider_options.insert(
        OPT_IST_RECV_ADDR.to_string(),
        host_port(&env.pod_ip, GALERA_IST_PORT),
    );
    for (key, value) in &galera.provider_options {
        provider_options.insert(key.clone(), value.clone());
    }

    let lib_path = galera
        .galera_lib_path
        .as_deref()
        .unwrap_or(DEFAULT_GALERA_LIB_PATH);
    let replica_threads = galera.replica_threads.unwrap_or(1);

    let mut lines = vec![
        "[mariadb]".to_string(),
        format!("bind-address={}", any_address(&env.pod_ip)),
        "default_storage_engine=InnoDB".to_string(),
        "binlog_format=row".to_string(),
        "innodb_autoinc_lock_mode=2".to_string(),
        String::new(),
        "# Cluster configuration".to_string(),
        "wsrep_on=ON".to_string(),
        format!("wsrep_provider={}", lib_path),
        format!("wsrep_cluster_address=\"gcomm://{}\"", cluster_address),
        format!("wsrep_cluster_name={}", CLUSTER_NAME),
        format!("wsrep_slave_threads={}", replica_threads),
        String::new(),
        "# Node configuration".to_string(),
        format!("{}=\"{}\"", KEY_NODE_ADDRESS, env.pod_ip),
        format!("wsrep_node_name=\"{}\"", env.pod_name),
        format!(
            "{}=\"{}\"",
            KEY_PROVIDER_OPTIONS,
            join_options(&provider_options)
        ),
        String::new(),
        "# SST".to_string(),
        format!("wsrep_sst_method=\"{}\"", galera.sst),
    ];
    if galera.sst.needs_auth() {
        if let Some(password) = &env.root_password {
            lines.push(format!("wsrep_sst_auth=\"root:{}\"", password));
        }
    }
    lines.push(format!(
        "{}=\"{}\"",
        KEY_SST_RECEIVE_ADDRESS,
        host_port(&env.pod_ip, GALERA_SST_PORT)
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}

fn join_options(options: &BTreeMap<String, String>) -> String {
    options
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(";")
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Rewrite `ist.recv_addr` inside a provider options string, keeping the rest
fn update_provider_options(options: &str, ip: &IpAddr) -> String {
    options
        .split(';')
        .map(|opt| match opt.split_once('=') {
            Some((key, _)) if key.trim() == OPT_IST_RECV_ADDR => {
                format!("{}={}", OPT_IST_RECV_ADDR, host_port(ip, GALERA_IST_PORT))
            }
            _ => opt.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Split a line from its terminator (`\n`, `\r\n` or nothing at EOF)
fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Rewritten value for an IP dependent key, `None` for any other line
fn update_line(line: &str, env: &PodEnvironment) -> Option<(&'static str, String)> {
    let (key, value) = line.split_once('=')?;
    let (key, value) = match key.trim() {
        KEY_NODE_ADDRESS => (KEY_NODE_ADDRESS, env.pod_ip.to_string()),
        KEY_PROVIDER_OPTIONS => (
            KEY_PROVIDER_OPTIONS,
            update_provider_options(unquote(value.trim()), &env.pod_ip),
        ),
        KEY_SST_RECEIVE_ADDRESS => (
            KEY_SST_RECEIVE_ADDRESS,
            host_port(&env.pod_ip, GALERA_SST_PORT),
        ),
        _ => return None,
    };
    Some((key, format!("{}=\"{}\"", key, value)))
}

/// Rewrite the Pod-IP dependent keys, leaving every other byte as it was
pub fn update_config(existing: &str, env: &PodEnvironment) -> Result<String> {
    let mut found_node_address = false;
    let mut updated = String::with_capacity(existing.len());

    for line in existing.split_inclusive('\n') {
        let (body, terminator) = split_terminator(line);
        match update_line(body, env) {
            Some((key, rewritten)) => {
                found_node_address |= key == KEY_NODE_ADDRESS;
                updated.push_str(&rewritten);
                updated.push_str(terminator);
            }
            None => updated.push_str(line),
        }
    }

    if !found_node_address {
        return Err(Error::GaleraConfig(format!(
            "existing config has no {} entry",
            KEY_NODE_ADDRESS
        )));
    }
    Ok(updated)
}
