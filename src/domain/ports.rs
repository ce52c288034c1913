//! Domain Ports - Resource store contract
//!
//! The native control plane is an opaque store of CephCluster and
//! CephBlockPool objects. Adapters must report a missing object as
//! `Error::ResourceNotFound`, a duplicate create as `Error::ResourceExists`
//! and a stale write as `Error::Conflict`; everything else passes through.

use crate::crd::ceph::{CephBlockPool, CephCluster};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

// =============================================================================
// Cluster Store Port
// =============================================================================

#[async_trait]
pub trait ClusterStore: Send + Sync {
    /// Create a native cluster, returning the object as stored
    async fn create_cluster(&self, namespace: &str, cluster: &CephCluster) -> Result<CephCluster>;

    async fn get_cluster(&self, namespace: &str, name: &str) -> Result<CephCluster>;

    async fn delete_cluster(&self, namespace: &str, name: &str) -> Result<()>;
}

// =============================================================================
// Pool Store Port
// =============================================================================

#[async_trait]
pub trait PoolStore: Send + Sync {
    /// Create a native pool, returning the object as stored
    async fn create_pool(&self, namespace: &str, pool: &CephBlockPool) -> Result<CephBlockPool>;

    async fn get_pool(&self, namespace: &str, name: &str) -> Result<CephBlockPool>;

    /// Replace a pool. The write must be rejected with `Error::Conflict` when
    /// `pool.metadata.resource_version` is stale.
    async fn update_pool(&self, namespace: &str, pool: &CephBlockPool) -> Result<CephBlockPool>;

    async fn delete_pool(&self, namespace: &str, name: &str) -> Result<()>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type ClusterStoreRef = Arc<dyn ClusterStore>;
pub type PoolStoreRef = Arc<dyn PoolStore>;
