//! Storage policy model
//!
//! Durability and performance policies describe what a pool should look
//! like. They carry no behavior; `resolver` turns them into native fields.
//!
//! Durability classes trade resources differently: replication spends
//! storage to save CPU, erasure coding spends CPU to save storage. The
//! durability level picks how much redundancy the class provides.

use crate::error::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// =============================================================================
// Failure Domain
// =============================================================================

/// Topological unit redundant copies are spread across
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FailureDomain {
    #[default]
    Host,
    Rack,
}

impl std::fmt::Display for FailureDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureDomain::Host => write!(f, "host"),
            FailureDomain::Rack => write!(f, "rack"),
        }
    }
}

impl FromStr for FailureDomain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "host" => Ok(FailureDomain::Host),
            "rack" => Ok(FailureDomain::Rack),
            other => Err(Error::validation(format!(
                "invalid failure domain '{}', expected host or rack",
                other
            ))),
        }
    }
}

// =============================================================================
// Durability
// =============================================================================

/// Redundancy strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DurabilityClass {
    #[default]
    Replicated,
    ErasureCoded,
}

impl std::fmt::Display for DurabilityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DurabilityClass::Replicated => write!(f, "replicated"),
            DurabilityClass::ErasureCoded => write!(f, "erasurecoded"),
        }
    }
}

impl FromStr for DurabilityClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "replicated" => Ok(DurabilityClass::Replicated),
            "erasurecoded" => Ok(DurabilityClass::ErasureCoded),
            other => Err(Error::validation(format!(
                "invalid durability class '{}', expected replicated or erasurecoded",
                other
            ))),
        }
    }
}

/// Redundancy intensity within a class; higher levels use more storage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DurabilityLevel {
    Low,
    Semi,
    #[default]
    Normal,
    High,
}

impl std::fmt::Display for DurabilityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DurabilityLevel::Low => write!(f, "low"),
            DurabilityLevel::Semi => write!(f, "semi"),
            DurabilityLevel::Normal => write!(f, "normal"),
            DurabilityLevel::High => write!(f, "high"),
        }
    }
}

impl FromStr for DurabilityLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(DurabilityLevel::Low),
            "semi" => Ok(DurabilityLevel::Semi),
            "normal" => Ok(DurabilityLevel::Normal),
            "high" => Ok(DurabilityLevel::High),
            other => Err(Error::validation(format!(
                "invalid durability level '{}', expected low, semi, normal or high",
                other
            ))),
        }
    }
}

/// Desired durability of a pool
///
/// Defaults to host failure domain, replicated, normal level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DurabilityPolicy {
    #[serde(default)]
    pub failure_domain: FailureDomain,
    #[serde(default)]
    pub durability_class: DurabilityClass,
    #[serde(default)]
    pub durability_level: DurabilityLevel,
}

impl DurabilityPolicy {
    pub fn new(
        failure_domain: FailureDomain,
        durability_class: DurabilityClass,
        durability_level: DurabilityLevel,
    ) -> Self {
        Self {
            failure_domain,
            durability_class,
            durability_level,
        }
    }

    /// Canonical preset name, e.g. `sp-durability-normal`
    pub fn preset_name(&self) -> String {
        format!("sp-durability-{}", self.durability_level)
    }
}

// =============================================================================
// Performance
// =============================================================================

/// Device tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PerfClass {
    /// Rotational devices
    Standard,
    /// SSD
    Medium,
    /// NVMe
    Fast,
}

impl std::fmt::Display for PerfClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PerfClass::Standard => write!(f, "standard"),
            PerfClass::Medium => write!(f, "medium"),
            PerfClass::Fast => write!(f, "fast"),
        }
    }
}

impl FromStr for PerfClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "standard" => Ok(PerfClass::Standard),
            "medium" => Ok(PerfClass::Medium),
            "fast" => Ok(PerfClass::Fast),
            other => Err(Error::validation(format!(
                "invalid io perf class '{}', expected standard, medium or fast",
                other
            ))),
        }
    }
}

/// Desired device tier of a pool
///
/// Unset means every raw device is eligible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub io_perf_class: Option<PerfClass>,
}

impl PerformancePolicy {
    pub fn new(class: PerfClass) -> Self {
        Self {
            io_perf_class: Some(class),
        }
    }

    /// Canonical preset name, e.g. `sp-performance-fast`
    pub fn preset_name(&self) -> Option<&'static str> {
        self.io_perf_class.map(|class| match class {
            PerfClass::Standard => "sp-performance-std",
            PerfClass::Medium => "sp-performance-medium",
            PerfClass::Fast => "sp-performance-fast",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_display_matches_wire_names() {
        assert_eq!(FailureDomain::Rack.to_string(), "rack");
        assert_eq!(DurabilityClass::ErasureCoded.to_string(), "erasurecoded");
        assert_eq!(DurabilityLevel::Semi.to_string(), "semi");
        assert_eq!(PerfClass::Fast.to_string(), "fast");
    }

    #[test]
    fn test_parse_rejects_unknown_failure_domain() {
        assert_eq!("host".parse::<FailureDomain>().unwrap(), FailureDomain::Host);
        assert_matches!("zone".parse::<FailureDomain>(), Err(Error::Validation(_)));
        assert_matches!("Host".parse::<FailureDomain>(), Err(Error::Validation(_)));
    }

    #[test]
    fn test_parse_rejects_unknown_class_and_level() {
        assert_matches!("mirrored".parse::<DurabilityClass>(), Err(Error::Validation(_)));
        assert_matches!("extreme".parse::<DurabilityLevel>(), Err(Error::Validation(_)));
        assert_matches!("turbo".parse::<PerfClass>(), Err(Error::Validation(_)));
    }

    #[test]
    fn test_default_durability_policy() {
        let policy = DurabilityPolicy::default();
        assert_eq!(policy.failure_domain, FailureDomain::Host);
        assert_eq!(policy.durability_class, DurabilityClass::Replicated);
        assert_eq!(policy.durability_level, DurabilityLevel::Normal);
    }

    #[test]
    fn test_deserialize_policy() {
        let policy: DurabilityPolicy = serde_json::from_str(
            r#"{"failureDomain":"rack","durabilityClass":"erasurecoded","durabilityLevel":"high"}"#,
        )
        .unwrap();
        assert_eq!(
            policy,
            DurabilityPolicy::new(
                FailureDomain::Rack,
                DurabilityClass::ErasureCoded,
                DurabilityLevel::High
            )
        );

        let partial: DurabilityPolicy = serde_json::from_str(r#"{"durabilityLevel":"low"}"#).unwrap();
        assert_eq!(partial.durability_class, DurabilityClass::Replicated);
        assert_eq!(partial.durability_level, DurabilityLevel::Low);
    }

    #[test]
    fn test_deserialize_rejects_unknown_failure_domain() {
        let parsed = serde_json::from_str::<DurabilityPolicy>(r#"{"failureDomain":"zone"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_preset_names() {
        let policy = DurabilityPolicy::new(
            FailureDomain::Host,
            DurabilityClass::Replicated,
            DurabilityLevel::High,
        );
        assert_eq!(policy.preset_name(), "sp-durability-high");
        assert_eq!(
            PerformancePolicy::new(PerfClass::Standard).preset_name(),
            Some("sp-performance-std")
        );
        assert_eq!(PerformancePolicy::default().preset_name(), None);
    }
}
