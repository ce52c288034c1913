//! Block volume provisioning
//!
//! A volume is not stored anywhere by this layer. Creating one produces the
//! RBD StorageClass the CSI driver needs; the caller applies it.

use crate::crd::storage::{StorageVolume, StorageVolumeStatus, VolumePhase, VolumeType};
use crate::crd::storage_class::{ReclaimPolicy, StorageClassDescriptor};
use crate::error::{Error, Result};
use tracing::{debug, info};

/// Suffix of the generated StorageClass name
pub const BLOCK_CLASS_SUFFIX: &str = "block";

/// Volume operations scoped to one namespace
pub struct StorageVolumes {
    namespace: String,
}

impl StorageVolumes {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Build the StorageClass for a block volume and mark the volume created
    pub async fn create(&self, volume: &StorageVolume) -> Result<(StorageVolume, StorageClassDescriptor)> {
        if volume.spec.volume_type != VolumeType::Block {
            return Err(Error::validation(format!(
                "invalid volume type '{}' for volume '{}', only block is supported",
                volume.spec.volume_type,
                volume.name()
            )));
        }

        let descriptor = StorageClassDescriptor::block(
            &format!("{}-{}", volume.name(), BLOCK_CLASS_SUFFIX),
            &self.namespace,
            &volume.spec.cluster_id,
            &volume.spec.pool_id,
            ReclaimPolicy::from_reclaim(volume.spec.reclaim_on_delete),
        );

        let mut created = volume.clone();
        created.status = Some(StorageVolumeStatus {
            phase: Some(VolumePhase::Created),
            message: format!("StorageClass {} generated", descriptor.name()),
            reason: String::new(),
        });

        info!(
            "Created block volume {} on pool {}",
            volume.name(),
            volume.spec.pool_id
        );
        Ok((created, descriptor))
    }

    pub async fn update(&self, volume: &StorageVolume) -> Result<Option<StorageVolume>> {
        debug!("Ignoring update of volume: {}", volume.name());
        Ok(None)
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        debug!("Ignoring delete of volume: {}", name);
        Ok(())
    }

    pub async fn get(&self, _name: &str) -> Result<Option<StorageVolume>> {
        Ok(None)
    }

    pub async fn list(&self) -> Result<Vec<StorageVolume>> {
        Ok(Vec::new())
    }
}
