//! Resource Store Adapters
//!
//! - Kubernetes: live API server
//! - Memory: in-process store for standalone runs and tests

pub mod kubernetes;
pub mod memory;

pub use kubernetes::{KubeStore, FIELD_MANAGER};
pub use memory::{InMemoryStore, StoreCalls};
