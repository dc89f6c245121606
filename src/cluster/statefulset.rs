//! StatefulSet naming conventions
//!
//! Pods are named `<group>-<ordinal>`. The ordinal is the only thing that orders
//! Pods against each other, so parsing it never panics: malformed names are errors.

use crate::common::{Error, Result};

/// Extract the ordinal from a Pod name (`mariadb-galera-2` → `2`)
pub fn pod_index(pod_name: &str) -> Result<u32> {
    let parse_err = |reason: &str| Error::OrdinalParse {
        pod: pod_name.to_string(),
        reason: reason.to_string(),
    };

    let (_, suffix) = pod_name
        .rsplit_once('-')
        .ok_or_else(|| parse_err("missing '-' separator"))?;

    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(parse_err("suffix is not a non-negative integer"));
    }

    suffix
        .parse::<u32>()
        .map_err(|_| parse_err("ordinal out of range"))
}

/// Name of the Pod at `index` in the StatefulSet `group`
pub fn pod_name(group: &str, index: u32) -> String {
    format!("{}-{}", group, index)
}

/// Name of the Pod that must be ready before `index` may start
pub fn previous_pod_name(group: &str, index: u32) -> Result<String> {
    match index.checked_sub(1) {
        Some(previous) => Ok(pod_name(group, previous)),
        None => Err(Error::Internal(format!(
            "Pod '{}' is the first Pod",
            pod_name(group, index)
        ))),
    }
}

/// Headless Service used for Pod-to-Pod Galera traffic
pub fn internal_service_name(group: &str) -> String {
    format!("{}-internal", group)
}

/// Stable DNS name of a Pod behind the internal Service
pub fn pod_fqdn(group: &str, index: u32, namespace: &str, cluster_domain: &str) -> String {
    format!(
        "{}.{}.{}.svc.{}",
        pod_name(group, index),
        internal_service_name(group),
        namespace,
        cluster_domain
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pod_index() {
        assert_eq!(pod_index("mariadb-0").unwrap(), 0);
        assert_eq!(pod_index("mariadb-galera-2").unwrap(), 2);
        assert_eq!(pod_index("a-b-c-17").unwrap(), 17);
    }

    #[test]
    fn test_pod_index_invalid() {
        for name in [
            "mariadb",
            "mariadb-",
            "mariadb-x",
            "mariadb-1a",
            "mariadb-+1",
            "mariadb-99999999999",
            "",
        ] {
            let err = pod_index(name).unwrap_err();
            assert!(matches!(err, Error::OrdinalParse { ref pod, .. } if pod == name), "{}", name);
        }
    }

    #[test]
    fn test_pod_names() {
        assert_eq!(pod_name("mariadb-galera", 1), "mariadb-galera-1");
        assert_eq!(previous_pod_name("mariadb-galera", 2).unwrap(), "mariadb-galera-1");
        assert!(previous_pod_name("mariadb-galera", 0).is_err());
        assert_eq!(
            pod_fqdn("mariadb-galera", 0, "default", "cluster.local"),
            "mariadb-galera-0.mariadb-galera-internal.default.svc.cluster.local"
        );
    }
}
