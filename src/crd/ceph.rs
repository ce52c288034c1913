//! Native Rook/Ceph resources
//!
//! The subset of `ceph.rook.io/v1` CephCluster and CephBlockPool that the
//! policy layer reads and writes. Status fields stay free-form strings; the
//! phase translator owns their interpretation.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Annotation recording the caller's cluster id on a native pool
pub const CLUSTER_ID_ANNOTATION: &str = "storageapi.io/cluster-id";

/// Annotation recording the external cluster id on a native cluster
pub const EXTERNAL_CLUSTER_ID_ANNOTATION: &str = "storageapi.io/external-cluster-id";

// =============================================================================
// CephCluster
// =============================================================================

#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "ceph.rook.io",
    version = "v1",
    kind = "CephCluster",
    plural = "cephclusters",
    namespaced,
    status = "CephClusterStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct CephClusterSpec {
    /// Container image for a locally managed cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ceph_version: Option<CephVersionSpec>,

    /// Host path for monitor and OSD metadata
    #[serde(default)]
    pub data_dir_host_path: String,

    #[serde(default)]
    pub mon: MonSpec,

    #[serde(default)]
    pub storage: StorageScopeSpec,

    #[serde(default)]
    pub monitoring: MonitoringSpec,

    #[serde(default)]
    pub external: ExternalSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CephVersionSpec {
    pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonSpec {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub allow_multiple_per_node: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageScopeSpec {
    #[serde(default)]
    pub use_all_nodes: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_all_devices: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<StorageNodeSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageNodeSpec {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringSpec {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSpec {
    #[serde(default)]
    pub enable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CephClusterStatus {
    /// Condition type reported by the operator (Ready, Progressing, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,

    /// Coarse cluster state (Creating, Created, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CephCluster {
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or("unknown")
    }
}

// =============================================================================
// CephBlockPool
// =============================================================================

#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "ceph.rook.io",
    version = "v1",
    kind = "CephBlockPool",
    plural = "cephblockpools",
    namespaced,
    status = "CephBlockPoolStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct CephBlockPoolSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub failure_domain: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub crush_root: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub compression_mode: String,

    #[serde(default, skip_serializing_if = "ReplicatedSpec::is_empty")]
    pub replicated: ReplicatedSpec,

    #[serde(default, skip_serializing_if = "ErasureCodedSpec::is_empty")]
    pub erasure_coded: ErasureCodedSpec,

    #[serde(default, skip_serializing_if = "QuotaSpec::is_empty")]
    pub quotas: QuotaSpec,

    /// Fields this layer does not model, kept so replace calls don't drop them
    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplicatedSpec {
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub target_size_ratio: f64,
    #[serde(default)]
    pub require_safe_replica_size: bool,

    /// e.g. replicasPerFailureDomain, subFailureDomain
    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ReplicatedSpec {
    pub fn is_unset(&self) -> bool {
        self.size == 0
    }

    fn is_empty(&self) -> bool {
        self.is_unset() && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErasureCodedSpec {
    #[serde(default)]
    pub data_chunks: u32,
    #[serde(default)]
    pub coding_chunks: u32,

    /// e.g. algorithm
    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ErasureCodedSpec {
    pub fn new(data_chunks: u32, coding_chunks: u32) -> Self {
        Self {
            data_chunks,
            coding_chunks,
            extra: BTreeMap::new(),
        }
    }

    pub fn is_unset(&self) -> bool {
        self.data_chunks == 0 && self.coding_chunks == 0
    }

    fn is_empty(&self) -> bool {
        self.is_unset() && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotaSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<u64>,

    /// e.g. maxObjects, maxSize
    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl QuotaSpec {
    pub fn is_unlimited(&self) -> bool {
        self.max_bytes.unwrap_or(0) == 0
    }

    fn is_empty(&self) -> bool {
        self.is_unlimited() && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CephBlockPoolStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

impl CephBlockPool {
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or("unknown")
    }
}
