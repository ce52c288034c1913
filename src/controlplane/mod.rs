//! Control Plane Module
//!
//! Lifecycle managers for clusters, pools and volumes, the conflict retry
//! they share, and the resource store adapters they run against.

pub mod backends;
pub mod clientset;
pub mod cluster;
pub mod pool;
pub mod readiness;
pub mod retry;
pub mod volume;

pub use backends::{InMemoryStore, KubeStore, StoreCalls};
pub use clientset::Clientset;
pub use cluster::StorageClusters;
pub use pool::StoragePools;
pub use readiness::ReadinessQuery;
pub use retry::{BackoffStrategy, RetryPolicy};
pub use volume::StorageVolumes;
