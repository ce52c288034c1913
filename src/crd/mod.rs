//! Custom Resource Definitions
//!
//! - StorageCluster, StoragePool, StorageVolume: the policy-level API
//! - CephCluster, CephBlockPool: the Rook resources they translate into
//! - StorageClassDescriptor: the CSI StorageClass generated for a volume

pub mod ceph;
pub mod storage;
pub mod storage_class;

pub use ceph::{CephBlockPool, CephBlockPoolSpec, CephCluster, CephClusterSpec};
pub use storage::*;
pub use storage_class::{ReclaimPolicy, StorageClassDescriptor};
