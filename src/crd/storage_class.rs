//! RBD StorageClass descriptor
//!
//! The Ceph CSI RBD driver expects a StorageClass with a fixed parameter set.
//! The descriptor keeps those fields in the driver's order; `to_yaml` is the
//! only serialization path.

use crate::error::Result;
use k8s_openapi::api::storage::v1::StorageClass;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Secret holding the provisioner and controller-expand credentials
pub const PROVISIONER_SECRET: &str = "rook-csi-rbd-provisioner";

/// Secret holding the node-stage credentials
pub const NODE_SECRET: &str = "rook-csi-rbd-node";

/// Driver suffix appended to the operator namespace
pub const RBD_DRIVER_SUFFIX: &str = "rbd.csi.ceph.com";

/// Reclaim policy of the generated class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReclaimPolicy {
    Delete,
    Retain,
}

impl ReclaimPolicy {
    pub fn from_reclaim(reclaim_on_delete: bool) -> Self {
        if reclaim_on_delete {
            ReclaimPolicy::Delete
        } else {
            ReclaimPolicy::Retain
        }
    }
}

impl std::fmt::Display for ReclaimPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReclaimPolicy::Delete => write!(f, "Delete"),
            ReclaimPolicy::Retain => write!(f, "Retain"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorMetadata {
    pub name: String,
}

/// Parameters consumed by the RBD provisioner, in the order it documents them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RbdParameters {
    #[serde(rename = "clusterID")]
    pub cluster_id: String,
    pub pool: String,
    #[serde(rename = "imageFormat")]
    pub image_format: String,
    #[serde(rename = "imageFeatures")]
    pub image_features: String,
    #[serde(rename = "csi.storage.k8s.io/provisioner-secret-name")]
    pub provisioner_secret_name: String,
    #[serde(rename = "csi.storage.k8s.io/provisioner-secret-namespace")]
    pub provisioner_secret_namespace: String,
    #[serde(rename = "csi.storage.k8s.io/controller-expand-secret-name")]
    pub controller_expand_secret_name: String,
    #[serde(rename = "csi.storage.k8s.io/controller-expand-secret-namespace")]
    pub controller_expand_secret_namespace: String,
    #[serde(rename = "csi.storage.k8s.io/node-stage-secret-name")]
    pub node_stage_secret_name: String,
    #[serde(rename = "csi.storage.k8s.io/node-stage-secret-namespace")]
    pub node_stage_secret_namespace: String,
    #[serde(rename = "csi.storage.k8s.io/fstype")]
    pub fs_type: String,
}

impl RbdParameters {
    fn to_map(&self) -> Result<BTreeMap<String, String>> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::from_value(value)?)
    }
}

/// StorageClass for a block volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageClassDescriptor {
    pub api_version: String,
    pub kind: String,
    pub metadata: DescriptorMetadata,
    pub provisioner: String,
    pub reclaim_policy: ReclaimPolicy,
    pub parameters: RbdParameters,
    pub allow_volume_expansion: bool,
}

impl StorageClassDescriptor {
    /// Build the class for `pool` in `cluster_id`, with secrets and the driver
    /// living in `namespace`.
    pub fn block(
        name: &str,
        namespace: &str,
        cluster_id: &str,
        pool: &str,
        reclaim: ReclaimPolicy,
    ) -> Self {
        Self {
            api_version: "storage.k8s.io/v1".to_string(),
            kind: "StorageClass".to_string(),
            metadata: DescriptorMetadata {
                name: name.to_string(),
            },
            provisioner: format!("{}.{}", namespace, RBD_DRIVER_SUFFIX),
            reclaim_policy: reclaim,
            parameters: RbdParameters {
                cluster_id: cluster_id.to_string(),
                pool: pool.to_string(),
                image_format: "2".to_string(),
                image_features: "layering".to_string(),
                provisioner_secret_name: PROVISIONER_SECRET.to_string(),
                provisioner_secret_namespace: namespace.to_string(),
                controller_expand_secret_name: PROVISIONER_SECRET.to_string(),
                controller_expand_secret_namespace: namespace.to_string(),
                node_stage_secret_name: NODE_SECRET.to_string(),
                node_stage_secret_namespace: namespace.to_string(),
                fs_type: "ext4".to_string(),
            },
            allow_volume_expansion: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Convert into the Kubernetes object for applying through the API
    pub fn to_storage_class(&self) -> Result<StorageClass> {
        Ok(StorageClass {
            metadata: ObjectMeta {
                name: Some(self.metadata.name.clone()),
                ..Default::default()
            },
            provisioner: self.provisioner.clone(),
            reclaim_policy: Some(self.reclaim_policy.to_string()),
            parameters: Some(self.parameters.to_map()?),
            allow_volume_expansion: Some(self.allow_volume_expansion),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> StorageClassDescriptor {
        StorageClassDescriptor::block(
            "bpool1-block",
            "rook-ceph",
            "rook-ceph",
            "bpool1",
            ReclaimPolicy::Delete,
        )
    }

    #[test]
    fn test_yaml_field_order() {
        let yaml = descriptor().to_yaml().unwrap();
        let keys: Vec<&str> = yaml
            .lines()
            .filter_map(|line| line.split(':').next())
            .map(str::trim)
            .collect();

        assert_eq!(
            keys,
            vec![
                "apiVersion",
                "kind",
                "metadata",
                "name",
                "provisioner",
                "reclaimPolicy",
                "parameters",
                "clusterID",
                "pool",
                "imageFormat",
                "imageFeatures",
                "csi.storage.k8s.io/provisioner-secret-name",
                "csi.storage.k8s.io/provisioner-secret-namespace",
                "csi.storage.k8s.io/controller-expand-secret-name",
                "csi.storage.k8s.io/controller-expand-secret-namespace",
                "csi.storage.k8s.io/node-stage-secret-name",
                "csi.storage.k8s.io/node-stage-secret-namespace",
                "csi.storage.k8s.io/fstype",
                "allowVolumeExpansion",
            ]
        );
    }

    #[test]
    fn test_yaml_content() {
        let yaml = descriptor().to_yaml().unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(value["apiVersion"], "storage.k8s.io/v1");
        assert_eq!(value["kind"], "StorageClass");
        assert_eq!(value["metadata"]["name"], "bpool1-block");
        assert_eq!(value["provisioner"], "rook-ceph.rbd.csi.ceph.com");
        assert_eq!(value["reclaimPolicy"], "Delete");
        assert_eq!(value["parameters"]["imageFormat"], "2");
        assert_eq!(value["parameters"]["imageFeatures"], "layering");
        assert_eq!(
            value["parameters"]["csi.storage.k8s.io/node-stage-secret-name"],
            "rook-csi-rbd-node"
        );
        assert_eq!(value["parameters"]["csi.storage.k8s.io/fstype"], "ext4");
        assert_eq!(value["allowVolumeExpansion"], true);
    }

    #[test]
    fn test_to_storage_class() {
        let mut desc = descriptor();
        desc.reclaim_policy = ReclaimPolicy::Retain;
        let class = desc.to_storage_class().unwrap();

        assert_eq!(class.metadata.name.as_deref(), Some("bpool1-block"));
        assert_eq!(class.provisioner, "rook-ceph.rbd.csi.ceph.com");
        assert_eq!(class.reclaim_policy.as_deref(), Some("Retain"));
        assert_eq!(class.allow_volume_expansion, Some(true));

        let params = class.parameters.unwrap();
        assert_eq!(params.len(), 11);
        assert_eq!(params["pool"], "bpool1");
        assert_eq!(
            params["csi.storage.k8s.io/controller-expand-secret-namespace"],
            "rook-ceph"
        );
    }

    #[test]
    fn test_reclaim_policy() {
        assert_eq!(ReclaimPolicy::from_reclaim(true), ReclaimPolicy::Delete);
        assert_eq!(ReclaimPolicy::from_reclaim(false), ReclaimPolicy::Retain);
    }
}
