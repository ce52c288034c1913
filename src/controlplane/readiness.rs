//! Point-in-time readiness checks
//!
//! Each check is one read plus a predicate. Polling, timeouts and
//! cancellation are left to the caller.

use super::cluster::StorageClusters;
use super::pool::StoragePools;
use crate::error::Result;

pub struct ReadinessQuery {
    clusters: StorageClusters,
    pools: StoragePools,
}

impl ReadinessQuery {
    pub fn new(clusters: StorageClusters, pools: StoragePools) -> Self {
        Self { clusters, pools }
    }

    /// Whether the cluster reports Created and Ready
    pub async fn cluster_healthy(&self, name: &str) -> Result<bool> {
        Ok(self.clusters.get(name).await?.is_healthy())
    }

    /// Whether the pool reports Ready
    pub async fn pool_ready(&self, name: &str) -> Result<bool> {
        Ok(self.pools.get(name).await?.is_ready())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClusterConfig;
    use crate::controlplane::backends::InMemoryStore;
    use crate::controlplane::retry::RetryPolicy;
    use crate::crd::storage::{StorageCluster, StorageClusterSpec, StoragePool, StoragePoolSpec};
    use crate::error::Error;
    use assert_matches::assert_matches;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_readiness_follows_store() {
        let store = Arc::new(InMemoryStore::new());
        let clusters = StorageClusters::new("ns", store.clone(), ClusterConfig::default());
        let pools = StoragePools::new("ns", store.clone(), RetryPolicy::immediate(1));
        let readiness = ReadinessQuery::new(
            StorageClusters::new("ns", store.clone(), ClusterConfig::default()),
            StoragePools::new("ns", store.clone(), RetryPolicy::immediate(1)),
        );

        let mut cluster = StorageCluster::new("c", StorageClusterSpec::default());
        clusters.create(&mut cluster).await.unwrap();
        assert!(!readiness.cluster_healthy("c").await.unwrap());

        store.set_cluster_status("ns", "c", "Created", "Progressing");
        assert!(!readiness.cluster_healthy("c").await.unwrap());
        store.set_cluster_status("ns", "c", "Created", "Ready");
        assert!(readiness.cluster_healthy("c").await.unwrap());

        let pool = StoragePool::new(
            "p",
            StoragePoolSpec {
                cluster_id: "c".into(),
                ..Default::default()
            },
        );
        pools.create(&pool).await.unwrap();
        assert!(!readiness.pool_ready("p").await.unwrap());
        store.set_pool_phase("ns", "p", "Ready");
        assert!(readiness.pool_ready("p").await.unwrap());

        let gets = store.calls().get_cluster;
        readiness.cluster_healthy("c").await.unwrap();
        assert_eq!(store.calls().get_cluster, gets + 1);
    }

    #[tokio::test]
    async fn test_missing_resources() {
        let store = Arc::new(InMemoryStore::new());
        let readiness = ReadinessQuery::new(
            StorageClusters::new("ns", store.clone(), ClusterConfig::default()),
            StoragePools::new("ns", store, RetryPolicy::default()),
        );

        assert_matches!(
            readiness.cluster_healthy("absent").await,
            Err(Error::ResourceNotFound { .. })
        );
        assert_matches!(
            readiness.pool_ready("absent").await,
            Err(Error::ResourceNotFound { .. })
        );
    }
}
