//! Storage pool lifecycle
//!
//! Pools are the only resource updated in place. An update is a
//! read-modify-write of the native CephBlockPool; a concurrent writer makes
//! the write conflict and the cycle restarts from the read, bounded by the
//! injected retry policy.

use super::retry::RetryPolicy;
use crate::crd::ceph::{CephBlockPool, CephBlockPoolSpec, CLUSTER_ID_ANNOTATION};
use crate::crd::storage::{
    StoragePool, StoragePoolSpec, StoragePoolStatus, DURABILITY_PRESET_ANNOTATION,
    PERFORMANCE_PRESET_ANNOTATION,
};
use crate::domain::phase::PoolPhase;
use crate::domain::ports::PoolStoreRef;
use crate::domain::resolver;
use crate::error::{Error, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Compression mode set on every new pool
pub const COMPRESSION_NONE: &str = "none";

/// Pool operations scoped to one namespace
pub struct StoragePools {
    namespace: String,
    store: PoolStoreRef,
    retry: RetryPolicy,
}

impl StoragePools {
    pub fn new(namespace: impl Into<String>, store: PoolStoreRef, retry: RetryPolicy) -> Self {
        Self {
            namespace: namespace.into(),
            store,
            retry,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Create the native pool.
    ///
    /// Policies are resolved before the store is touched. An existing pool
    /// with the same name is reported as `ResourceExists` without a create.
    pub async fn create(&self, pool: &StoragePool) -> Result<StoragePool> {
        let name = pool.name();
        let resolved = resolve(&pool.spec)?;

        match self.store.get_pool(&self.namespace, name).await {
            Ok(_) => return Err(Error::exists("CephBlockPool", name)),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let mut spec = resolved;
        spec.compression_mode = COMPRESSION_NONE.to_string();

        let native = CephBlockPool {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(self.namespace.clone()),
                annotations: Some(BTreeMap::from([(
                    CLUSTER_ID_ANNOTATION.to_string(),
                    pool.spec.cluster_id.clone(),
                )])),
                ..Default::default()
            },
            spec,
            status: None,
        };

        info!("Creating storage pool: {}", name);
        let created = self
            .store
            .create_pool(&self.namespace, &native)
            .await
            .map_err(|e| {
                warn!("Failed to create storage pool {}: {}", name, e);
                e
            })?;

        let mut result = pool.clone();
        result.metadata.namespace = created.metadata.namespace.clone();
        result.metadata.resource_version = created.metadata.resource_version.clone();
        result.metadata.creation_timestamp = created.metadata.creation_timestamp.clone();
        result.status = Some(status_from_native(&created));
        info!("Created storage pool: {}", name);
        Ok(result)
    }

    pub async fn get(&self, name: &str) -> Result<StoragePool> {
        let native = self.store.get_pool(&self.namespace, name).await?;
        debug!("Fetched native pool: {}", name);
        from_native(&native, &self.namespace)
    }

    /// Apply new policies and quota to an existing pool.
    ///
    /// Switching between replicated and erasure-coded layouts is rejected.
    pub async fn update(&self, pool: &StoragePool) -> Result<StoragePool> {
        let name = pool.name();
        let resolved = resolve(&pool.spec)?;

        let updated = self
            .retry
            .retry_on_conflict(|| self.try_update(pool, &resolved))
            .await
            .map_err(|e| {
                warn!("Failed to update storage pool {}: {}", name, e);
                e
            })?;

        info!("Updated storage pool: {}", name);
        from_native(&updated, &self.namespace)
    }

    async fn try_update(&self, pool: &StoragePool, resolved: &CephBlockPoolSpec) -> Result<CephBlockPool> {
        let name = pool.name();
        let mut current = self.store.get_pool(&self.namespace, name).await?;

        let requested = pool.spec.durability_policy.durability_class;
        let existing = resolver::native_class(&current.spec);
        if requested != existing {
            return Err(Error::validation(format!(
                "cannot change durability class of pool '{}' from {} to {}",
                name, existing, requested
            )));
        }

        // modelled fields only, the rest of the native spec is carried over
        let spec = &mut current.spec;
        spec.failure_domain = resolved.failure_domain.clone();
        spec.device_class = resolved.device_class.clone();
        spec.replicated.size = resolved.replicated.size;
        spec.replicated.target_size_ratio = resolved.replicated.target_size_ratio;
        spec.replicated.require_safe_replica_size = resolved.replicated.require_safe_replica_size;
        spec.erasure_coded.data_chunks = resolved.erasure_coded.data_chunks;
        spec.erasure_coded.coding_chunks = resolved.erasure_coded.coding_chunks;
        spec.quotas.max_bytes = resolved.quotas.max_bytes;

        self.store.update_pool(&self.namespace, &current).await
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        self.store.delete_pool(&self.namespace, name).await?;
        info!("Deleted storage pool: {}", name);
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<StoragePool>> {
        Ok(Vec::new())
    }
}

/// Native spec fields derived from the caller's policies and quota
fn resolve(spec: &StoragePoolSpec) -> Result<CephBlockPoolSpec> {
    let mut native = CephBlockPoolSpec::default();
    resolver::apply_policies(&mut native, &spec.durability_policy, &spec.perf_policy)?;
    if spec.quota > 0 {
        native.quotas.max_bytes = Some(spec.quota);
    }
    Ok(native)
}

fn status_from_native(native: &CephBlockPool) -> StoragePoolStatus {
    StoragePoolStatus {
        phase: PoolPhase::from_native(native.status.as_ref().and_then(|s| s.phase.as_deref())),
    }
}

fn from_native(native: &CephBlockPool, namespace: &str) -> Result<StoragePool> {
    let durability_policy = resolver::unresolve_durability(&native.spec)?;
    let perf_policy = resolver::unresolve_device_class(native.spec.device_class.as_deref());

    let cluster_id = native
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(CLUSTER_ID_ANNOTATION))
        .cloned()
        .or_else(|| native.metadata.namespace.clone())
        .unwrap_or_else(|| namespace.to_string());

    let mut annotations = BTreeMap::from([(
        DURABILITY_PRESET_ANNOTATION.to_string(),
        durability_policy.preset_name(),
    )]);
    if let Some(preset) = perf_policy.preset_name() {
        annotations.insert(PERFORMANCE_PRESET_ANNOTATION.to_string(), preset.to_string());
    }

    let mut pool = StoragePool::new(
        native.name(),
        StoragePoolSpec {
            cluster_id,
            quota: native.spec.quotas.max_bytes.unwrap_or(0),
            durability_policy,
            perf_policy,
        },
    );
    pool.metadata.annotations = Some(annotations);
    pool.metadata.namespace = native.metadata.namespace.clone();
    pool.metadata.resource_version = native.metadata.resource_version.clone();
    pool.metadata.creation_timestamp = native.metadata.creation_timestamp.clone();
    pool.status = Some(status_from_native(native));
    Ok(pool)
}
