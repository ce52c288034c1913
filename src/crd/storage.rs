//! Storage API resources
//!
//! StorageCluster, StoragePool and StorageVolume are the caller-facing
//! objects. Their specs are written in policy terms; the lifecycle managers
//! translate them into Rook resources and fill in the status.

use crate::domain::phase::{self, ClusterPhase, ClusterState, PoolPhase};
use crate::domain::policy::{DurabilityPolicy, PerformancePolicy};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Preset name of the durability policy a pool was read back with
pub const DURABILITY_PRESET_ANNOTATION: &str = "storageapi.io/durability-policy";

/// Preset name of the performance policy, absent when no device class is set
pub const PERFORMANCE_PRESET_ANNOTATION: &str = "storageapi.io/performance-policy";

// =============================================================================
// StorageCluster CRD
// =============================================================================

/// A Ceph storage cluster, either provisioned locally or consumed from an
/// external cluster.
#[derive(CustomResource, Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "storageapi.io",
    version = "v1",
    kind = "StorageCluster",
    plural = "storageclusters",
    shortname = "stc",
    namespaced,
    status = "StorageClusterStatus",
    printcolumn = r#"{"name": "State", "type": "string", "jsonPath": ".status.state"}"#,
    printcolumn = r#"{"name": "Phase", "type": "string", "jsonPath": ".status.phase"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct StorageClusterSpec {
    /// Id of an external cluster to consume instead of provisioning one
    #[serde(default, rename = "externalClusterID", skip_serializing_if = "Option::is_none")]
    pub external_cluster_id: Option<String>,

    /// Nodes dedicated to storage. Empty means every node.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_list: Vec<NodeInfo>,

    /// Prometheus monitoring
    #[serde(default = "default_true")]
    pub monitoring_enabled: bool,
}

/// A node contributing devices to the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub host_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_addr: Option<IpAddr>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageClusterStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ClusterState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<ClusterPhase>,

    /// Explanation of the current phase
    #[serde(default)]
    pub message: String,
}

impl Default for StorageClusterSpec {
    fn default() -> Self {
        Self {
            external_cluster_id: None,
            node_list: Vec::new(),
            monitoring_enabled: true,
        }
    }
}

impl StorageClusterSpec {
    /// Whether this cluster is consumed rather than provisioned
    pub fn is_external(&self) -> bool {
        self.external_cluster_id
            .as_deref()
            .map(|id| !id.is_empty())
            .unwrap_or(false)
    }
}

impl StorageCluster {
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or("unknown")
    }

    /// Created and Ready
    pub fn is_healthy(&self) -> bool {
        self.status
            .as_ref()
            .map(|s| phase::cluster_healthy(s.state, s.phase))
            .unwrap_or(false)
    }
}

// =============================================================================
// StoragePool CRD
// =============================================================================

/// A pool carved out of a storage cluster according to durability and
/// performance policies.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "storageapi.io",
    version = "v1",
    kind = "StoragePool",
    plural = "storagepools",
    shortname = "stp",
    namespaced,
    status = "StoragePoolStatus",
    printcolumn = r#"{"name": "Cluster", "type": "string", "jsonPath": ".spec.clusterID"}"#,
    printcolumn = r#"{"name": "Phase", "type": "string", "jsonPath": ".status.phase"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct StoragePoolSpec {
    #[serde(rename = "clusterID")]
    pub cluster_id: String,

    /// Quota in bytes, 0 for unlimited
    #[serde(default)]
    pub quota: u64,

    #[serde(default)]
    pub durability_policy: DurabilityPolicy,

    #[serde(default)]
    pub perf_policy: PerformancePolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoragePoolStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<PoolPhase>,
}

impl StoragePool {
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or("unknown")
    }

    pub fn is_ready(&self) -> bool {
        self.status
            .as_ref()
            .map(|s| phase::pool_ready(s.phase))
            .unwrap_or(false)
    }
}

// =============================================================================
// StorageVolume CRD
// =============================================================================

/// A volume backed by a storage pool
#[derive(CustomResource, Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "storageapi.io",
    version = "v1",
    kind = "StorageVolume",
    plural = "storagevolumes",
    shortname = "stv",
    namespaced,
    status = "StorageVolumeStatus",
    printcolumn = r#"{"name": "Type", "type": "string", "jsonPath": ".spec.volumeType"}"#,
    printcolumn = r#"{"name": "Pool", "type": "string", "jsonPath": ".spec.poolID"}"#,
    printcolumn = r#"{"name": "Phase", "type": "string", "jsonPath": ".status.phase"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct StorageVolumeSpec {
    pub volume_type: VolumeType,

    /// Cluster the backing pool belongs to
    #[serde(rename = "clusterID")]
    pub cluster_id: String,

    #[serde(rename = "poolID")]
    pub pool_id: String,

    #[serde(default = "default_fs_type")]
    pub fs_type: String,

    #[serde(default)]
    pub read_only: bool,

    /// Delete the data once the claim is released
    #[serde(default = "default_true")]
    pub reclaim_on_delete: bool,
}

impl StorageVolumeSpec {
    /// A block volume with default mount options
    pub fn block(cluster_id: impl Into<String>, pool_id: impl Into<String>) -> Self {
        Self {
            volume_type: VolumeType::Block,
            cluster_id: cluster_id.into(),
            pool_id: pool_id.into(),
            fs_type: default_fs_type(),
            read_only: false,
            reclaim_on_delete: true,
        }
    }
}

/// Volume access type. Only block volumes can be provisioned today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VolumeType {
    Block,
    File,
    Object,
}

impl std::fmt::Display for VolumeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VolumeType::Block => write!(f, "block"),
            VolumeType::File => write!(f, "file"),
            VolumeType::Object => write!(f, "object"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum VolumePhase {
    Created,
    Deleted,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageVolumeStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<VolumePhase>,

    #[serde(default)]
    pub message: String,

    /// Explanation of the last failure
    #[serde(default)]
    pub reason: String,
}

impl StorageVolume {
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or("unknown")
    }
}

// =============================================================================
// Default Value Functions
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_fs_type() -> String {
    "ext4".to_string()
}
