//! Storage Policy API
//!
//! A policy-level interface over Rook/Ceph. Callers describe clusters, pools
//! and volumes in terms of durability and performance; the library resolves
//! those policies into CephCluster and CephBlockPool resources, reads them
//! back, and generates the RBD StorageClass for block volumes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            Clientset                             │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐            │
//! │  │   Clusters   │  │    Pools     │  │   Volumes    │ Readiness  │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘            │
//! │         │                 │ RetryPolicy     │                    │
//! ├─────────┼─────────────────┼─────────────────┼────────────────────┤
//! │         │    Resolver / Phase translator    │ StorageClass       │
//! │         │       (bidirectional tables)      │ descriptor         │
//! ├─────────┴─────────────────┴─────────────────┴────────────────────┤
//! │                  ClusterStore / PoolStore ports                  │
//! │       ┌────────────────────┐     ┌────────────────────┐          │
//! │       │     KubeStore      │     │   InMemoryStore    │          │
//! │       └────────────────────┘     └────────────────────┘          │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`controlplane`]: Lifecycle managers, retry and store adapters
//! - [`crd`]: Custom Resource Definitions
//! - [`domain`]: Policy model, translation tables and ports
//! - [`config`]: Operator configuration
//! - [`error`]: Error types and handling

pub mod config;
pub mod controlplane;
pub mod crd;
pub mod domain;
pub mod error;

// Re-export commonly used types
pub use config::{ClusterConfig, OperatorConfig, RetryConfig};

pub use controlplane::{
    Clientset, InMemoryStore, KubeStore, ReadinessQuery, RetryPolicy, StorageClusters,
    StoragePools, StorageVolumes,
};

pub use crd::{
    StorageCluster, StorageClusterSpec, StorageClusterStatus, StoragePool, StoragePoolSpec,
    StoragePoolStatus, StorageVolume, StorageVolumeSpec, StorageVolumeStatus,
    StorageClassDescriptor, VolumeType,
};

pub use domain::{
    ClusterPhase, ClusterState, ClusterStore, DurabilityClass, DurabilityLevel,
    DurabilityPolicy, FailureDomain, PerfClass, PerformancePolicy, PoolPhase, PoolStore,
};

pub use error::{Error, ErrorAction, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
