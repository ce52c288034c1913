//! Policy resolver
//!
//! Maps durability and performance policies onto CephBlockPool fields and
//! back. Both directions go through the same tables so that
//! `unresolve(resolve(p)) == p` holds for every supported policy.
//!
//! | class        | level  | replicas | (data, coding) |
//! |--------------|--------|----------|----------------|
//! | replicated   | low    | 1        |                |
//! | replicated   | semi   | 2        |                |
//! | replicated   | normal | 3        |                |
//! | replicated   | high   | 4        |                |
//! | erasurecoded | semi   |          | (2, 1)         |
//! | erasurecoded | normal |          | (3, 2)         |
//! | erasurecoded | high   |          | (4, 3)         |

use super::mapping::LookupTable;
use super::policy::{
    DurabilityClass, DurabilityLevel, DurabilityPolicy, FailureDomain, PerfClass,
    PerformancePolicy,
};
use crate::crd::ceph::{CephBlockPoolSpec, ErasureCodedSpec, ReplicatedSpec};
use crate::error::{Error, Result};
use tracing::debug;

// =============================================================================
// Tables
// =============================================================================

static FAILURE_DOMAINS: LookupTable<FailureDomain, &str> = LookupTable::new(&[
    (FailureDomain::Host, "host"),
    (FailureDomain::Rack, "rack"),
]);

static DEVICE_CLASSES: LookupTable<PerfClass, &str> = LookupTable::new(&[
    (PerfClass::Standard, "hdd"),
    (PerfClass::Medium, "ssd"),
    (PerfClass::Fast, "nvme"),
]);

static REPLICA_SIZES: LookupTable<DurabilityLevel, u32> = LookupTable::new(&[
    (DurabilityLevel::Low, 1),
    (DurabilityLevel::Semi, 2),
    (DurabilityLevel::Normal, 3),
    (DurabilityLevel::High, 4),
]);

/// `(dataChunks, codingChunks)` per level
static ERASURE_CHUNKS: LookupTable<DurabilityLevel, (u32, u32)> = LookupTable::new(&[
    (DurabilityLevel::Semi, (2, 1)),
    (DurabilityLevel::Normal, (3, 2)),
    (DurabilityLevel::High, (4, 3)),
]);

/// Pool sizing hint handed to the balancer for every replicated pool
pub const TARGET_SIZE_RATIO: f64 = 1.0;

// =============================================================================
// Native Durability
// =============================================================================

/// Native redundancy fields produced from a durability policy
#[derive(Debug, Clone, PartialEq)]
pub enum NativeDurability {
    Replicated(ReplicatedSpec),
    ErasureCoded(ErasureCodedSpec),
}

impl NativeDurability {
    /// Write these fields into a pool spec, clearing the other class
    pub fn apply(self, spec: &mut CephBlockPoolSpec) {
        match self {
            NativeDurability::Replicated(replicated) => {
                spec.replicated = replicated;
                spec.erasure_coded = ErasureCodedSpec::default();
            }
            NativeDurability::ErasureCoded(erasure) => {
                spec.erasure_coded = erasure;
                spec.replicated = ReplicatedSpec::default();
            }
        }
    }
}

// =============================================================================
// Resolve
// =============================================================================

pub fn resolve_failure_domain(domain: FailureDomain) -> Result<&'static str> {
    FAILURE_DOMAINS.forward(domain).ok_or_else(|| {
        Error::validation(format!(
            "invalid failure domain '{}', cannot resolve storage pool",
            domain
        ))
    })
}

/// `None` when the policy leaves the device tier open
pub fn resolve_device_class(policy: &PerformancePolicy) -> Option<&'static str> {
    policy
        .io_perf_class
        .and_then(|class| DEVICE_CLASSES.forward(class))
}

pub fn resolve_durability(policy: &DurabilityPolicy) -> Result<NativeDurability> {
    let level = policy.durability_level;
    match policy.durability_class {
        DurabilityClass::Replicated => {
            let size = REPLICA_SIZES
                .forward(level)
                .ok_or_else(|| unsupported(policy))?;
            Ok(NativeDurability::Replicated(ReplicatedSpec {
                size,
                target_size_ratio: TARGET_SIZE_RATIO,
                // a single replica can never satisfy the safety check
                require_safe_replica_size: level != DurabilityLevel::Low,
                ..Default::default()
            }))
        }
        DurabilityClass::ErasureCoded => ERASURE_CHUNKS
            .forward(level)
            .map(|(data, coding)| NativeDurability::ErasureCoded(ErasureCodedSpec::new(data, coding)))
            .ok_or_else(|| unsupported(policy)),
    }
}

fn unsupported(policy: &DurabilityPolicy) -> Error {
    Error::validation(format!(
        "durability level '{}' is not supported for durability class '{}'",
        policy.durability_level, policy.durability_class
    ))
}

/// Resolve every policy field and write it into `spec`.
///
/// Nothing is written unless all fields resolve.
pub fn apply_policies(
    spec: &mut CephBlockPoolSpec,
    durability: &DurabilityPolicy,
    performance: &PerformancePolicy,
) -> Result<()> {
    let domain = resolve_failure_domain(durability.failure_domain)?;
    let native = resolve_durability(durability)?;

    spec.failure_domain = domain.to_string();
    spec.device_class = resolve_device_class(performance).map(str::to_string);
    native.apply(spec);
    Ok(())
}

// =============================================================================
// Unresolve
// =============================================================================

pub fn unresolve_failure_domain(native: &str) -> Result<FailureDomain> {
    FAILURE_DOMAINS
        .reverse_by(|v| v == native)
        .ok_or_else(|| Error::UnmappedNativeField {
            field: "failureDomain".into(),
            value: native.to_string(),
        })
}

/// Device classes this model doesn't know leave the policy unset
pub fn unresolve_device_class(native: Option<&str>) -> PerformancePolicy {
    let io_perf_class = native.and_then(|class| {
        let found = DEVICE_CLASSES.reverse_by(|v| v == class);
        if found.is_none() {
            debug!("Unrecognized device class '{}', leaving perf class unset", class);
        }
        found
    });
    PerformancePolicy { io_perf_class }
}

pub fn unresolve_durability(spec: &CephBlockPoolSpec) -> Result<DurabilityPolicy> {
    let failure_domain = unresolve_failure_domain(&spec.failure_domain)?;

    let (durability_class, durability_level) = if spec.replicated.size != 0 {
        let size = spec.replicated.size;
        let level = REPLICA_SIZES
            .reverse(size)
            .ok_or_else(|| Error::UnmappedNativeField {
                field: "replicated.size".into(),
                value: size.to_string(),
            })?;
        (DurabilityClass::Replicated, level)
    } else {
        let coding = spec.erasure_coded.coding_chunks;
        let level = ERASURE_CHUNKS
            .reverse_by(|(_, chunks)| chunks == coding)
            .ok_or_else(|| Error::UnmappedNativeField {
                field: "erasureCoded.codingChunks".into(),
                value: coding.to_string(),
            })?;
        (DurabilityClass::ErasureCoded, level)
    };

    Ok(DurabilityPolicy {
        failure_domain,
        durability_class,
        durability_level,
    })
}

/// Durability class the native pool is currently laid out as
pub fn native_class(spec: &CephBlockPoolSpec) -> DurabilityClass {
    if spec.replicated.size != 0 {
        DurabilityClass::Replicated
    } else {
        DurabilityClass::ErasureCoded
    }
}

/// Every (class, level) combination the tables accept
pub fn supported_combinations() -> impl Iterator<Item = (DurabilityClass, DurabilityLevel)> {
    REPLICA_SIZES
        .keys()
        .map(|level| (DurabilityClass::Replicated, level))
        .chain(
            ERASURE_CHUNKS
                .keys()
                .map(|level| (DurabilityClass::ErasureCoded, level)),
        )
}
