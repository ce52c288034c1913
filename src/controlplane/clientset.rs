//! Client set
//!
//! Entry point bundling one resource store with the operator config.
//! Hands out namespaced lifecycle managers on demand.

use super::cluster::StorageClusters;
use super::pool::StoragePools;
use super::readiness::ReadinessQuery;
use super::retry::RetryPolicy;
use super::volume::StorageVolumes;
use crate::config::OperatorConfig;
use crate::domain::ports::{ClusterStore, ClusterStoreRef, PoolStore, PoolStoreRef};
use std::sync::Arc;

#[derive(Clone)]
pub struct Clientset {
    clusters: ClusterStoreRef,
    pools: PoolStoreRef,
    config: OperatorConfig,
}

impl Clientset {
    /// Use `store` for both clusters and pools
    pub fn new<S>(store: Arc<S>, config: OperatorConfig) -> Self
    where
        S: ClusterStore + PoolStore + 'static,
    {
        let clusters: ClusterStoreRef = store.clone();
        let pools: PoolStoreRef = store;
        Self::with_stores(clusters, pools, config)
    }

    pub fn with_stores(clusters: ClusterStoreRef, pools: PoolStoreRef, config: OperatorConfig) -> Self {
        Self {
            clusters,
            pools,
            config,
        }
    }

    pub fn config(&self) -> &OperatorConfig {
        &self.config
    }

    pub fn storage_clusters(&self, namespace: &str) -> StorageClusters {
        StorageClusters::new(namespace, self.clusters.clone(), self.config.cluster.clone())
    }

    pub fn storage_pools(&self, namespace: &str) -> StoragePools {
        StoragePools::new(
            namespace,
            self.pools.clone(),
            RetryPolicy::from(&self.config.retry),
        )
    }

    pub fn storage_volumes(&self, namespace: &str) -> StorageVolumes {
        StorageVolumes::new(namespace)
    }

    pub fn readiness(&self, namespace: &str) -> ReadinessQuery {
        ReadinessQuery::new(self.storage_clusters(namespace), self.storage_pools(namespace))
    }
}
