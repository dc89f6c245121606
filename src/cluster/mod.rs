//! Kubernetes side of the init container
//!
//! - MariaDB custom resource projections
//! - StatefulSet ordinal and naming rules
//! - API client and Pod readiness

pub mod client;
pub mod pod;
pub mod resource;
pub mod statefulset;

pub use client::{ClusterClient, KubeClusterClient, MemClusterClient};
pub use pod::{PodReadyCondition, ReadinessCheck};
pub use resource::{MariaDB, MariaDBSpec, MariaDBStatus};
