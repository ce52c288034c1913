//! Phase/state translation
//!
//! Rook reports cluster and pool progress as free-form strings. These map
//! them onto closed enums; anything unrecognized becomes `None` rather than
//! a guessed value.

use super::mapping::LookupTable;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lifecycle stage of a storage cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ClusterPhase {
    Ignored,
    Connecting,
    Connected,
    Progressing,
    Ready,
    Updating,
    Failure,
    Upgrading,
    Deleting,
}

/// Coarse operational status of a storage cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ClusterState {
    Creating,
    Created,
    Updating,
    Connecting,
    Connected,
    Error,
}

/// Lifecycle stage of a storage pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum PoolPhase {
    Connecting,
    Ready,
    Failure,
    Deleting,
}

static CLUSTER_PHASES: LookupTable<ClusterPhase, &str> = LookupTable::new(&[
    (ClusterPhase::Ignored, "Ignored"),
    (ClusterPhase::Connecting, "Connecting"),
    (ClusterPhase::Connected, "Connected"),
    (ClusterPhase::Progressing, "Progressing"),
    (ClusterPhase::Ready, "Ready"),
    (ClusterPhase::Updating, "Updating"),
    (ClusterPhase::Failure, "Failure"),
    (ClusterPhase::Upgrading, "Upgrading"),
    (ClusterPhase::Deleting, "Deleting"),
]);

static CLUSTER_STATES: LookupTable<ClusterState, &str> = LookupTable::new(&[
    (ClusterState::Creating, "Creating"),
    (ClusterState::Created, "Created"),
    (ClusterState::Updating, "Updating"),
    (ClusterState::Connecting, "Connecting"),
    (ClusterState::Connected, "Connected"),
    (ClusterState::Error, "Error"),
]);

// Rook reports a pool being built as "Creating"
static POOL_PHASES: LookupTable<PoolPhase, &str> = LookupTable::new(&[
    (PoolPhase::Connecting, "Creating"),
    (PoolPhase::Ready, "Ready"),
    (PoolPhase::Failure, "Failure"),
    (PoolPhase::Deleting, "Deleting"),
]);

fn translate<K>(table: &LookupTable<K, &'static str>, what: &str, native: Option<&str>) -> Option<K>
where
    K: Copy + PartialEq,
{
    let native = native?;
    let found = table.reverse_by(|v| v == native);
    if found.is_none() {
        debug!("Unrecognized native {} '{}'", what, native);
    }
    found
}

impl ClusterPhase {
    pub fn from_native(native: Option<&str>) -> Option<Self> {
        translate(&CLUSTER_PHASES, "cluster phase", native)
    }

    pub fn as_native(self) -> &'static str {
        CLUSTER_PHASES.forward(self).unwrap_or_default()
    }
}

impl ClusterState {
    pub fn from_native(native: Option<&str>) -> Option<Self> {
        translate(&CLUSTER_STATES, "cluster state", native)
    }

    pub fn as_native(self) -> &'static str {
        CLUSTER_STATES.forward(self).unwrap_or_default()
    }
}

impl PoolPhase {
    pub fn from_native(native: Option<&str>) -> Option<Self> {
        translate(&POOL_PHASES, "pool phase", native)
    }

    pub fn as_native(self) -> &'static str {
        POOL_PHASES.forward(self).unwrap_or_default()
    }
}

impl std::fmt::Display for ClusterPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::fmt::Display for ClusterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::fmt::Display for PoolPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A cluster is healthy once it is both created and ready
pub fn cluster_healthy(state: Option<ClusterState>, phase: Option<ClusterPhase>) -> bool {
    state == Some(ClusterState::Created) && phase == Some(ClusterPhase::Ready)
}

pub fn pool_ready(phase: Option<PoolPhase>) -> bool {
    phase == Some(PoolPhase::Ready)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_PHASES: [ClusterPhase; 9] = [
        ClusterPhase::Ignored,
        ClusterPhase::Connecting,
        ClusterPhase::Connected,
        ClusterPhase::Progressing,
        ClusterPhase::Ready,
        ClusterPhase::Updating,
        ClusterPhase::Failure,
        ClusterPhase::Upgrading,
        ClusterPhase::Deleting,
    ];

    const ALL_STATES: [ClusterState; 6] = [
        ClusterState::Creating,
        ClusterState::Created,
        ClusterState::Updating,
        ClusterState::Connecting,
        ClusterState::Connected,
        ClusterState::Error,
    ];

    #[test]
    fn test_cluster_phase_translation() {
        for phase in ALL_PHASES {
            assert_eq!(ClusterPhase::from_native(Some(phase.as_native())), Some(phase));
        }
        assert_eq!(ClusterPhase::from_native(Some("ready")), None);
        assert_eq!(ClusterPhase::from_native(Some("")), None);
        assert_eq!(ClusterPhase::from_native(None), None);
    }

    #[test]
    fn test_cluster_state_translation() {
        for state in ALL_STATES {
            assert_eq!(ClusterState::from_native(Some(state.as_native())), Some(state));
        }
        assert_eq!(ClusterState::from_native(Some("Degraded")), None);
    }

    #[test]
    fn test_pool_phase_translation() {
        assert_eq!(PoolPhase::from_native(Some("Creating")), Some(PoolPhase::Connecting));
        assert_eq!(PoolPhase::from_native(Some("Ready")), Some(PoolPhase::Ready));
        assert_eq!(PoolPhase::from_native(Some("Failure")), Some(PoolPhase::Failure));
        assert_eq!(PoolPhase::from_native(Some("Deleting")), Some(PoolPhase::Deleting));
        assert_eq!(PoolPhase::from_native(Some("Connecting")), None);
        assert_eq!(PoolPhase::from_native(Some("Progressing")), None);
    }

    #[test]
    fn test_cluster_healthy_only_when_created_and_ready() {
        let states = ALL_STATES.iter().copied().map(Some).chain([None]);
        for state in states {
            for phase in ALL_PHASES.iter().copied().map(Some).chain([None]) {
                let expected =
                    state == Some(ClusterState::Created) && phase == Some(ClusterPhase::Ready);
                assert_eq!(cluster_healthy(state, phase), expected, "{:?}/{:?}", state, phase);
            }
        }
    }

    #[test]
    fn test_pool_ready() {
        assert!(pool_ready(Some(PoolPhase::Ready)));
        assert!(!pool_ready(Some(PoolPhase::Connecting)));
        assert!(!pool_ready(Some(PoolPhase::Failure)));
        assert!(!pool_ready(None));
    }
}
