//! Domain layer - Policy model, translation tables and port definitions
//!
//! Everything here is pure: the resolver and translator never touch the
//! resource store, they only map between typed policy and native fields.

pub mod mapping;
pub mod phase;
pub mod policy;
pub mod ports;
pub mod resolver;

pub use phase::{ClusterPhase, ClusterState, PoolPhase};
pub use policy::*;
pub use ports::*;
