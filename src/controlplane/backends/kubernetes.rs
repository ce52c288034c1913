//! Kubernetes resource store
//!
//! Reads and writes Rook custom resources through the API server. Status
//! codes are folded into the store error contract here so the lifecycle
//! managers never look at HTTP details.

use crate::crd::ceph::{CephBlockPool, CephCluster};
use crate::crd::storage_class::StorageClassDescriptor;
use crate::domain::ports::{ClusterStore, PoolStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::api::storage::v1::StorageClass;
use kube::api::{Api, DeleteParams, Patch, PatchParams, PostParams};
use kube::Client;
use tracing::{debug, info};

/// Field manager used for server-side apply
pub const FIELD_MANAGER: &str = "storage-policy-api";

/// Resource store talking to a live cluster
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect with the ambient kubeconfig or in-cluster credentials
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self::new(client))
    }

    fn clusters(&self, namespace: &str) -> Api<CephCluster> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn pools(&self, namespace: &str) -> Api<CephBlockPool> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Server-side apply a generated StorageClass
    pub async fn apply_storage_class(&self, descriptor: &StorageClassDescriptor) -> Result<StorageClass> {
        let class = descriptor.to_storage_class()?;
        let api: Api<StorageClass> = Api::all(self.client.clone());

        info!("Applying StorageClass: {}", descriptor.name());
        let params = PatchParams::apply(FIELD_MANAGER).force();
        let applied = api
            .patch(descriptor.name(), &params, &Patch::Apply(&class))
            .await
            .map_err(|e| map_api_error(e, "StorageClass", descriptor.name()))?;
        Ok(applied)
    }
}

/// Fold API status codes into the store error contract
fn map_api_error(err: kube::Error, kind: &str, name: &str) -> Error {
    match err {
        kube::Error::Api(ref response) if response.code == 404 => Error::not_found(kind, name),
        kube::Error::Api(ref response) if response.code == 409 => {
            if response.reason == "AlreadyExists" {
                Error::exists(kind, name)
            } else {
                Error::conflict(kind, name)
            }
        }
        other => Error::Kube(other),
    }
}

#[async_trait]
impl ClusterStore for KubeStore {
    async fn create_cluster(&self, namespace: &str, cluster: &CephCluster) -> Result<CephCluster> {
        debug!("Creating CephCluster {}/{}", namespace, cluster.name());
        self.clusters(namespace)
            .create(&PostParams::default(), cluster)
            .await
            .map_err(|e| map_api_error(e, "CephCluster", cluster.name()))
    }

    async fn get_cluster(&self, namespace: &str, name: &str) -> Result<CephCluster> {
        self.clusters(namespace)
            .get(name)
            .await
            .map_err(|e| map_api_error(e, "CephCluster", name))
    }

    async fn delete_cluster(&self, namespace: &str, name: &str) -> Result<()> {
        debug!("Deleting CephCluster {}/{}", namespace, name);
        self.clusters(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| map_api_error(e, "CephCluster", name))
    }
}

#[async_trait]
impl PoolStore for KubeStore {
    async fn create_pool(&self, namespace: &str, pool: &CephBlockPool) -> Result<CephBlockPool> {
        debug!("Creating CephBlockPool {}/{}", namespace, pool.name());
        self.pools(namespace)
            .create(&PostParams::default(), pool)
            .await
            .map_err(|e| map_api_error(e, "CephBlockPool", pool.name()))
    }

    async fn get_pool(&self, namespace: &str, name: &str) -> Result<CephBlockPool> {
        self.pools(namespace)
            .get(name)
            .await
            .map_err(|e| map_api_error(e, "CephBlockPool", name))
    }

    async fn update_pool(&self, namespace: &str, pool: &CephBlockPool) -> Result<CephBlockPool> {
        // replace carries metadata.resourceVersion, so a stale object gets a 409
        self.pools(namespace)
            .replace(pool.name(), &PostParams::default(), pool)
            .await
            .map_err(|e| map_api_error(e, "CephBlockPool", pool.name()))
    }

    async fn delete_pool(&self, namespace: &str, name: &str) -> Result<()> {
        debug!("Deleting CephBlockPool {}/{}", namespace, name);
        self.pools(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| map_api_error(e, "CephBlockPool", name))
    }
}
