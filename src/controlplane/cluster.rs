//! Storage cluster lifecycle
//!
//! Translates a StorageCluster into a Rook CephCluster and back. Clusters are
//! created once and deleted once; updates are not supported.

use crate::config::ClusterConfig;
use crate::crd::ceph::{
    CephCluster, CephClusterSpec, CephVersionSpec, ExternalSpec, MonSpec, MonitoringSpec,
    StorageNodeSpec, StorageScopeSpec, EXTERNAL_CLUSTER_ID_ANNOTATION,
};
use crate::crd::storage::{NodeInfo, StorageCluster, StorageClusterSpec, StorageClusterStatus};
use crate::domain::phase::{ClusterPhase, ClusterState};
use crate::domain::ports::ClusterStoreRef;
use crate::error::Result;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// External id reported when the native cluster is external but carries no id
pub const UNNAMED_EXTERNAL_CLUSTER: &str = "external-storage-cluster";

/// Cluster operations scoped to one namespace
pub struct StorageClusters {
    namespace: String,
    store: ClusterStoreRef,
    config: ClusterConfig,
}

impl StorageClusters {
    pub fn new(namespace: impl Into<String>, store: ClusterStoreRef, config: ClusterConfig) -> Self {
        Self {
            namespace: namespace.into(),
            store,
            config,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Create the native cluster.
    ///
    /// `cluster.status` is filled in from the stored object, or from the
    /// submitted one when the store rejects it, before any error is returned.
    pub async fn create(&self, cluster: &mut StorageCluster) -> Result<()> {
        let native = self.to_native(cluster);
        info!("Creating storage cluster: {}", cluster.name());

        match self.store.create_cluster(&self.namespace, &native).await {
            Ok(created) => {
                cluster.status = Some(status_from_native(&created));
                info!("Created storage cluster: {}", cluster.name());
                Ok(())
            }
            Err(e) => {
                warn!("Failed to create storage cluster {}: {}", cluster.name(), e);
                cluster.status = Some(status_from_native(&native));
                Err(e)
            }
        }
    }

    pub async fn get(&self, name: &str) -> Result<StorageCluster> {
        let native = self.store.get_cluster(&self.namespace, name).await?;
        debug!("Fetched native cluster: {}", name);
        Ok(from_native(&native))
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        self.store.delete_cluster(&self.namespace, name).await?;
        info!("Deleted storage cluster: {}", name);
        Ok(())
    }

    /// Clusters are immutable once created
    pub async fn update(&self, cluster: &StorageCluster) -> Result<Option<StorageCluster>> {
        debug!("Ignoring update of storage cluster: {}", cluster.name());
        Ok(None)
    }

    pub async fn list(&self) -> Result<Vec<StorageCluster>> {
        Ok(Vec::new())
    }

    fn to_native(&self, cluster: &StorageCluster) -> CephCluster {
        let spec = &cluster.spec;
        let mut annotations = BTreeMap::new();

        let (ceph_version, external) = match spec.external_cluster_id.as_deref() {
            Some(id) if spec.is_external() => {
                annotations.insert(EXTERNAL_CLUSTER_ID_ANNOTATION.to_string(), id.to_string());
                (None, ExternalSpec { enable: true })
            }
            _ => (
                Some(CephVersionSpec {
                    image: self.config.default_image.clone(),
                }),
                ExternalSpec::default(),
            ),
        };

        let nodes: Vec<StorageNodeSpec> = spec
            .node_list
            .iter()
            .map(|node| StorageNodeSpec {
                name: node.host_name.clone(),
            })
            .collect();

        CephCluster {
            metadata: ObjectMeta {
                name: Some(cluster.name().to_string()),
                namespace: Some(self.namespace.clone()),
                annotations: (!annotations.is_empty()).then_some(annotations),
                ..Default::default()
            },
            spec: CephClusterSpec {
                ceph_version,
                data_dir_host_path: self.config.data_dir_host_path.clone(),
                mon: MonSpec {
                    count: self.config.monitor_count,
                    allow_multiple_per_node: false,
                },
                storage: StorageScopeSpec {
                    use_all_nodes: nodes.is_empty(),
                    use_all_devices: Some(true),
                    nodes,
                },
                monitoring: MonitoringSpec {
                    enabled: spec.monitoring_enabled,
                },
                external,
            },
            status: None,
        }
    }
}

fn status_from_native(native: &CephCluster) -> StorageClusterStatus {
    let status = native.status.clone().unwrap_or_default();
    StorageClusterStatus {
        state: ClusterState::from_native(status.state.as_deref()),
        phase: ClusterPhase::from_native(status.phase.as_deref()),
        message: status.message.unwrap_or_default(),
    }
}

fn from_native(native: &CephCluster) -> StorageCluster {
    let external_cluster_id = native
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(EXTERNAL_CLUSTER_ID_ANNOTATION))
        .cloned()
        .or_else(|| {
            native
                .spec
                .external
                .enable
                .then(|| UNNAMED_EXTERNAL_CLUSTER.to_string())
        });

    let node_list = native
        .spec
        .storage
        .nodes
        .iter()
        .map(|node| NodeInfo {
            host_name: node.name.clone(),
            ip_addr: None,
        })
        .collect();

    let mut cluster = StorageCluster::new(
        native.name(),
        StorageClusterSpec {
            external_cluster_id,
            node_list,
            monitoring_enabled: native.spec.monitoring.enabled,
        },
    );
    cluster.metadata.namespace = native.metadata.namespace.clone();
    cluster.metadata.creation_timestamp = native.metadata.creation_timestamp.clone();
    cluster.status = Some(status_from_native(native));
    cluster
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controlplane::backends::InMemoryStore;
    use crate::error::Error;
    use assert_matches::assert_matches;
    use std::sync::Arc;

    fn setup() -> (Arc<InMemoryStore>, StorageClusters) {
        let store = Arc::new(InMemoryStore::new());
        let clusters = StorageClusters::new("rook-ceph", store.clone(), ClusterConfig::default());
        (store, clusters)
    }

    #[tokio::test]
    async fn test_create_local_cluster() {
        let (store, clusters) = setup();
        let mut cluster = StorageCluster::new("rook-ceph", StorageClusterSpec::default());

        clusters.create(&mut cluster).await.unwrap();

        let native = store.cluster("rook-ceph", "rook-ceph").unwrap();
        assert_eq!(native.spec.mon.count, 3);
        assert!(!native.spec.mon.allow_multiple_per_node);
        assert!(native.spec.storage.use_all_nodes);
        assert_eq!(native.spec.storage.use_all_devices, Some(true));
        assert!(native.spec.monitoring.enabled);
        assert!(!native.spec.external.enable);
        assert_eq!(native.spec.data_dir_host_path, "/var/lib/rook");
        assert_eq!(
            native.spec.ceph_version.map(|v| v.image).as_deref(),
            Some("ceph/ceph:v15.2.4")
        );

        let status = cluster.status.unwrap();
        assert_eq!(status.state, None);
        assert_eq!(status.phase, None);
    }

    #[tokio::test]
    async fn test_create_external_cluster() {
        let (store, clusters) = setup();
        let mut cluster = StorageCluster::new(
            "ext",
            StorageClusterSpec {
                external_cluster_id: Some("ceph-prod".into()),
                monitoring_enabled: false,
                ..Default::default()
            },
        );

        clusters.create(&mut cluster).await.unwrap();

        let native = store.cluster("rook-ceph", "ext").unwrap();
        assert!(native.spec.external.enable);
        assert!(native.spec.ceph_version.is_none());
        assert!(!native.spec.monitoring.enabled);

        let fetched = clusters.get("ext").await.unwrap();
        assert_eq!(fetched.spec.external_cluster_id.as_deref(), Some("ceph-prod"));
        assert!(!fetched.spec.monitoring_enabled);
    }

    #[tokio::test]
    async fn test_create_with_node_list() {
        let (store, clusters) = setup();
        let mut cluster = StorageCluster::new(
            "c",
            StorageClusterSpec {
                node_list: vec![
                    NodeInfo {
                        host_name: "storage-1".into(),
                        ip_addr: None,
                    },
                    NodeInfo {
                        host_name: "storage-2".into(),
                        ip_addr: Some("10.0.0.12".parse().unwrap()),
                    },
                ],
                ..Default::default()
            },
        );

        clusters.create(&mut cluster).await.unwrap();

        let native = store.cluster("rook-ceph", "c").unwrap();
        assert!(!native.spec.storage.use_all_nodes);
        assert_eq!(native.spec.storage.use_all_devices, Some(true));
        let names: Vec<&str> = native.spec.storage.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["storage-1", "storage-2"]);

        let fetched = clusters.get("c").await.unwrap();
        assert_eq!(fetched.spec.node_list.len(), 2);
    }

    #[tokio::test]
    async fn test_create_twice_populates_status_and_fails() {
        let (store, clusters) = setup();
        let mut first = StorageCluster::new("c", StorageClusterSpec::default());
        clusters.create(&mut first).await.unwrap();
        store.set_cluster_status("rook-ceph", "c", "Created", "Ready");

        let mut second = StorageCluster::new("c", StorageClusterSpec::default());
        let result = clusters.create(&mut second).await;

        assert_matches!(result, Err(Error::ResourceExists { .. }));
        assert!(second.status.is_some());
        assert!(!second.is_healthy());
    }

    #[tokio::test]
    async fn test_get_translates_status() {
        let (store, clusters) = setup();
        let mut cluster = StorageCluster::new("c", StorageClusterSpec::default());
        clusters.create(&mut cluster).await.unwrap();

        store.set_cluster_status("rook-ceph", "c", "Creating", "Progressing");
        let fetched = clusters.get("c").await.unwrap();
        let status = fetched.status.as_ref().unwrap();
        assert_eq!(status.state, Some(ClusterState::Creating));
        assert_eq!(status.phase, Some(ClusterPhase::Progressing));
        assert!(!fetched.is_healthy());

        store.set_cluster_status("rook-ceph", "c", "Created", "Ready");
        assert!(clusters.get("c").await.unwrap().is_healthy());

        store.set_cluster_status("rook-ceph", "c", "Rebalancing", "Ready");
        let fetched = clusters.get("c").await.unwrap();
        assert_eq!(fetched.status.unwrap().state, None);
    }

    #[tokio::test]
    async fn test_external_flag_without_annotation() {
        let (store, clusters) = setup();
        let mut native = CephCluster::new("legacy", CephClusterSpec::default());
        native.spec.external.enable = true;
        crate::domain::ports::ClusterStore::create_cluster(store.as_ref(), "rook-ceph", &native)
            .await
            .unwrap();

        let fetched = clusters.get("legacy").await.unwrap();
        assert_eq!(
            fetched.spec.external_cluster_id.as_deref(),
            Some(UNNAMED_EXTERNAL_CLUSTER)
        );
    }

    #[tokio::test]
    async fn test_delete_update_list() {
        let (_store, clusters) = setup();
        let mut cluster = StorageCluster::new("c", StorageClusterSpec::default());
        clusters.create(&mut cluster).await.unwrap();

        assert!(clusters.update(&cluster).await.unwrap().is_none());
        assert!(clusters.list().await.unwrap().is_empty());

        clusters.delete("c").await.unwrap();
        assert_matches!(clusters.get("c").await, Err(Error::ResourceNotFound { .. }));
        assert_matches!(clusters.delete("c").await, Err(Error::ResourceNotFound { .. }));
    }
}
