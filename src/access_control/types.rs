//! Authorization decision types
//!
//! The decision surface returned to the gateway: an allow/deny verdict with
//! a reason code attributing the denial to the layer that caused it, plus
//! the effective limit pair used for throttling and cost capping outside
//! the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// The capability is permitted
    Allowed,
    /// The service gate failed: role or some team does not grant the service
    ServiceNotGranted,
    /// The role layer excludes the capability
    DeniedByRole,
    /// The folded team layer excludes the capability
    DeniedByTeam,
    /// The principal override excludes the capability
    DeniedByOverride,
    /// The principal, its role, or one of its teams could not be resolved
    PrincipalUnresolved,
}

impl DecisionReason {
    /// Get the reason code as a string
    pub const fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::Allowed => "allowed",
            DecisionReason::ServiceNotGranted => "service_not_granted",
            DecisionReason::DeniedByRole => "denied_by_role",
            DecisionReason::DeniedByTeam => "denied_by_team",
            DecisionReason::DeniedByOverride => "denied_by_override",
            DecisionReason::PrincipalUnresolved => "principal_unresolved",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    pub reason: DecisionReason,
}

impl Decision {
    pub const fn allowed() -> Self {
        Self {
            allowed: true,
            reason: DecisionReason::Allowed,
        }
    }

    pub const fn denied(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }

    pub const fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub const fn is_denied(&self) -> bool {
        !self.allowed
    }
}

/// Effective rate and cost ceilings for a principal.
///
/// The most restrictive of role and team limits, unless the principal's
/// override replaces them outright.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveLimits {
    /// Requests per minute
    pub rate_limit: u32,

    /// Daily cost ceiling
    pub cost_limit_daily: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes() {
        assert_eq!(DecisionReason::Allowed.as_str(), "allowed");
        assert_eq!(
            DecisionReason::ServiceNotGranted.as_str(),
            "service_not_granted"
        );
        assert_eq!(DecisionReason::DeniedByRole.as_str(), "denied_by_role");
        assert_eq!(DecisionReason::DeniedByTeam.as_str(), "denied_by_team");
        assert_eq!(
            DecisionReason::DeniedByOverride.as_str(),
            "denied_by_override"
        );
        assert_eq!(
            DecisionReason::PrincipalUnresolved.as_str(),
            "principal_unresolved"
        );
    }

    #[test]
    fn test_decision_constructors() {
        assert!(Decision::allowed().is_allowed());
        let denied = Decision::denied(DecisionReason::DeniedByTeam);
        assert!(denied.is_denied());
        assert_eq!(denied.reason, DecisionReason::DeniedByTeam);
    }

    #[test]
    fn test_decision_serializes_with_snake_case_reason() {
        let json = serde_json::to_string(&Decision::denied(DecisionReason::ServiceNotGranted))
            .unwrap();
        assert_eq!(json, r#"{"allowed":false,"reason":"service_not_granted"}"#);
    }
}
