//! In-memory resource store
//!
//! Holds CephCluster and CephBlockPool objects in process. Used by the
//! standalone mode of the binary and by tests; supports injected conflicts
//! and failures, and counts every call.

use crate::crd::ceph::{CephBlockPool, CephBlockPoolStatus, CephCluster, CephClusterStatus};
use crate::domain::phase::{ClusterPhase, ClusterState, PoolPhase};
use crate::domain::ports::{ClusterStore, PoolStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::debug;

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

/// Number of calls received per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub create_cluster: u32,
    pub get_cluster: u32,
    pub delete_cluster: u32,
    pub create_pool: u32,
    pub get_pool: u32,
    pub update_pool: u32,
    pub delete_pool: u32,
}

impl StoreCalls {
    pub fn total(&self) -> u32 {
        self.create_cluster
            + self.get_cluster
            + self.delete_cluster
            + self.create_pool
            + self.get_pool
            + self.update_pool
            + self.delete_pool
    }
}

/// Resource store backed by process memory
#[derive(Default)]
pub struct InMemoryStore {
    clusters: Mutex<BTreeMap<Key, CephCluster>>,
    pools: Mutex<BTreeMap<Key, CephBlockPool>>,
    calls: Mutex<StoreCalls>,
    revision: AtomicU64,
    pending_conflicts: AtomicU32,
    pending_failures: AtomicU32,
    /// Report new objects as ready straight away
    auto_ready: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark created clusters Created/Ready and created pools Ready, the way a
    /// settled operator would.
    pub fn with_auto_ready(mut self) -> Self {
        self.auto_ready = true;
        self
    }

    /// Reject the next `n` pool updates with a conflict
    pub fn inject_conflicts(&self, n: u32) {
        self.pending_conflicts.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` writes with a store error
    pub fn inject_failures(&self, n: u32) {
        self.pending_failures.store(n, Ordering::SeqCst);
    }

    pub fn calls(&self) -> StoreCalls {
        *self.calls.lock()
    }

    pub fn set_cluster_status(&self, namespace: &str, name: &str, state: &str, phase: &str) {
        if let Some(cluster) = self.clusters.lock().get_mut(&key(namespace, name)) {
            cluster.status = Some(CephClusterStatus {
                state: Some(state.to_string()),
                phase: Some(phase.to_string()),
                message: None,
            });
        }
    }

    pub fn set_pool_phase(&self, namespace: &str, name: &str, phase: &str) {
        if let Some(pool) = self.pools.lock().get_mut(&key(namespace, name)) {
            pool.status = Some(CephBlockPoolStatus {
                phase: Some(phase.to_string()),
            });
        }
    }

    /// Stored pool, bypassing call accounting
    pub fn pool(&self, namespace: &str, name: &str) -> Option<CephBlockPool> {
        self.pools.lock().get(&key(namespace, name)).cloned()
    }

    /// Stored cluster, bypassing call accounting
    pub fn cluster(&self, namespace: &str, name: &str) -> Option<CephCluster> {
        self.clusters.lock().get(&key(namespace, name)).cloned()
    }

    fn next_revision(&self) -> String {
        (self.revision.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    fn take(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn injected_failure(&self) -> Result<()> {
        if Self::take(&self.pending_failures) {
            return Err(Error::Store("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterStore for InMemoryStore {
    async fn create_cluster(&self, namespace: &str, cluster: &CephCluster) -> Result<CephCluster> {
        self.calls.lock().create_cluster += 1;
        self.injected_failure()?;

        let name = cluster.name().to_string();
        let mut clusters = self.clusters.lock();
        if clusters.contains_key(&key(namespace, &name)) {
            return Err(Error::exists("CephCluster", &name));
        }

        let mut stored = cluster.clone();
        stored.metadata.namespace = Some(namespace.to_string());
        stored.metadata.resource_version = Some(self.next_revision());
        stored.metadata.creation_timestamp = Some(Time(chrono::Utc::now()));
        if self.auto_ready {
            stored.status = Some(CephClusterStatus {
                state: Some(ClusterState::Created.as_native().to_string()),
                phase: Some(ClusterPhase::Ready.as_native().to_string()),
                message: Some("Cluster created successfully".to_string()),
            });
        }

        debug!("Stored CephCluster {}/{}", namespace, name);
        clusters.insert(key(namespace, &name), stored.clone());
        Ok(stored)
    }

    async fn get_cluster(&self, namespace: &str, name: &str) -> Result<CephCluster> {
        self.calls.lock().get_cluster += 1;
        self.clusters
            .lock()
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| Error::not_found("CephCluster", name))
    }

    async fn delete_cluster(&self, namespace: &str, name: &str) -> Result<()> {
        self.calls.lock().delete_cluster += 1;
        self.injected_failure()?;
        self.clusters
            .lock()
            .remove(&key(namespace, name))
            .map(|_| ())
            .ok_or_else(|| Error::not_found("CephCluster", name))
    }
}

#[async_trait]
impl PoolStore for InMemoryStore {
    async fn create_pool(&self, namespace: &str, pool: &CephBlockPool) -> Result<CephBlockPool> {
        self.calls.lock().create_pool += 1;
        self.injected_failure()?;

        let name = pool.name().to_string();
        let mut pools = self.pools.lock();
        if pools.contains_key(&key(namespace, &name)) {
            return Err(Error::exists("CephBlockPool", &name));
        }

        let mut stored = pool.clone();
        stored.metadata.namespace = Some(namespace.to_string());
        stored.metadata.resource_version = Some(self.next_revision());
        stored.metadata.creation_timestamp = Some(Time(chrono::Utc::now()));
        if self.auto_ready {
            stored.status = Some(CephBlockPoolStatus {
                phase: Some(PoolPhase::Ready.as_native().to_string()),
            });
        }

        debug!("Stored CephBlockPool {}/{}", namespace, name);
        pools.insert(key(namespace, &name), stored.clone());
        Ok(stored)
    }

    async fn get_pool(&self, namespace: &str, name: &str) -> Result<CephBlockPool> {
        self.calls.lock().get_pool += 1;
        self.pools
            .lock()
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| Error::not_found("CephBlockPool", name))
    }

    async fn update_pool(&self, namespace: &str, pool: &CephBlockPool) -> Result<CephBlockPool> {
        self.calls.lock().update_pool += 1;
        let name = pool.name().to_string();

        if Self::take(&self.pending_conflicts) {
            debug!("Injected conflict on CephBlockPool {}/{}", namespace, name);
            return Err(Error::conflict("CephBlockPool", &name));
        }
        self.injected_failure()?;

        let mut pools = self.pools.lock();
        let current = pools
            .get(&key(namespace, &name))
            .ok_or_else(|| Error::not_found("CephBlockPool", &name))?;
        if current.metadata.resource_version != pool.metadata.resource_version {
            return Err(Error::conflict("CephBlockPool", &name));
        }

        let mut stored = pool.clone();
        stored.metadata.resource_version = Some(self.next_revision());
        // status is not part of a spec replace
        stored.status = current.status.clone();
        pools.insert(key(namespace, &name), stored.clone());
        Ok(stored)
    }

    async fn delete_pool(&self, namespace: &str, name: &str) -> Result<()> {
        self.calls.lock().delete_pool += 1;
        self.injected_failure()?;
        self.pools
            .lock()
            .remove(&key(namespace, name))
            .map(|_| ())
            .ok_or_else(|| Error::not_found("CephBlockPool", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::ceph::{CephBlockPoolSpec, CephClusterSpec};
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_create_sets_metadata() {
        let store = InMemoryStore::new();
        let created = store
            .create_pool("rook-ceph", &CephBlockPool::new("p", CephBlockPoolSpec::default()))
            .await
            .unwrap();

        assert_eq!(created.metadata.namespace.as_deref(), Some("rook-ceph"));
        assert!(created.metadata.resource_version.is_some());
        assert!(created.metadata.creation_timestamp.is_some());
        assert!(created.status.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_and_missing() {
        let store = InMemoryStore::new();
        let cluster = CephCluster::new("c", CephClusterSpec::default());
        store.create_cluster("ns", &cluster).await.unwrap();

        assert_matches!(
            store.create_cluster("ns", &cluster).await,
            Err(Error::ResourceExists { .. })
        );
        assert_matches!(
            store.get_cluster("other", "c").await,
            Err(Error::ResourceNotFound { .. })
        );
        store.delete_cluster("ns", "c").await.unwrap();
        assert_matches!(
            store.delete_cluster("ns", "c").await,
            Err(Error::ResourceNotFound { .. })
        );
    }

    #[tokio::test]
    async fn test_stale_update_conflicts() {
        let store = InMemoryStore::new();
        let pool = CephBlockPool::new("p", CephBlockPoolSpec::default());
        let first = store.create_pool("ns", &pool).await.unwrap();

        let second = store.update_pool("ns", &first).await.unwrap();
        assert_ne!(first.metadata.resource_version, second.metadata.resource_version);

        assert_matches!(
            store.update_pool("ns", &first).await,
            Err(Error::Conflict { .. })
        );
    }

    #[tokio::test]
    async fn test_injected_conflicts_and_failures() {
        let store = InMemoryStore::new();
        let pool = store
            .create_pool("ns", &CephBlockPool::new("p", CephBlockPoolSpec::default()))
            .await
            .unwrap();

        store.inject_conflicts(2);
        assert_matches!(store.update_pool("ns", &pool).await, Err(Error::Conflict { .. }));
        assert_matches!(store.update_pool("ns", &pool).await, Err(Error::Conflict { .. }));
        assert!(store.update_pool("ns", &pool).await.is_ok());

        store.inject_failures(1);
        assert_matches!(store.delete_pool("ns", "p").await, Err(Error::Store(_)));
        assert!(store.delete_pool("ns", "p").await.is_ok());

        let calls = store.calls();
        assert_eq!(calls.update_pool, 3);
        assert_eq!(calls.delete_pool, 2);
        assert_eq!(calls.total(), 6);
    }

    #[tokio::test]
    async fn test_auto_ready_and_status_setters() {
        let store = InMemoryStore::new().with_auto_ready();
        let cluster = store
            .create_cluster("ns", &CephCluster::new("c", CephClusterSpec::default()))
            .await
            .unwrap();
        let status = cluster.status.unwrap();
        assert_eq!(status.state.as_deref(), Some("Created"));
        assert_eq!(status.phase.as_deref(), Some("Ready"));

        store.set_cluster_status("ns", "c", "Error", "Failure");
        let status = store.cluster("ns", "c").unwrap().status.unwrap();
        assert_eq!(status.phase.as_deref(), Some("Failure"));

        store
            .create_pool("ns", &CephBlockPool::new("p", CephBlockPoolSpec::default()))
            .await
            .unwrap();
        store.set_pool_phase("ns", "p", "Creating");
        let phase = store.pool("ns", "p").unwrap().status.unwrap().phase;
        assert_eq!(phase.as_deref(), Some("Creating"));
    }
}
