//! Layer resolution
//!
//! Turns one role, team or principal-override record into an
//! [`AccessExpr`] for a given (service, capability kind).
//!
//! Roles and teams are gating layers: a service absent from the record's
//! `service_access` set resolves to `Empty` for every kind, regardless of
//! any restriction entry (the service-level gate takes precedence over
//! capability-level configuration). Overrides are adjustment layers: a
//! service with no override entry resolves to `Universal`, the identity
//! under intersection, meaning "no adjustment".
//!
//! Restriction names outside the current capability universe are stale
//! configuration, not an error: they are dropped from the expression and
//! reported through a `warn!` for operator visibility.

use std::collections::{BTreeSet, HashMap};
use tracing::{trace, warn};

use crate::access_control::expr::AccessExpr;
use crate::policy::types::{
    CapabilityKind, PrincipalOverride, Restriction, RestrictionMode, Role, ServiceName, Team,
};

/// Common shape of the gating layers.
pub trait GatedLayer {
    /// Human-readable layer label, used only for log attribution.
    fn label(&self) -> &str;

    fn service_access(&self) -> &BTreeSet<ServiceName>;

    fn restrictions(&self) -> &HashMap<ServiceName, Restriction>;
}

impl GatedLayer for Role {
    fn label(&self) -> &str {
        &self.name
    }

    fn service_access(&self) -> &BTreeSet<ServiceName> {
        &self.service_access
    }

    fn restrictions(&self) -> &HashMap<ServiceName, Restriction> {
        &self.restrictions
    }
}

impl GatedLayer for Team {
    fn label(&self) -> &str {
        &self.name
    }

    fn service_access(&self) -> &BTreeSet<ServiceName> {
        &self.service_access
    }

    fn restrictions(&self) -> &HashMap<ServiceName, Restriction> {
        &self.restrictions
    }
}

/// Resolve a role or team layer for one (service, kind).
pub fn resolve_gated_layer<L: GatedLayer>(
    layer: &L,
    service: &str,
    kind: CapabilityKind,
    universe: &BTreeSet<String>,
) -> AccessExpr {
    if !layer.service_access().contains(service) {
        trace!(
            layer = layer.label(),
            service,
            "service not granted by layer"
        );
        return AccessExpr::Empty;
    }

    match layer.restrictions().get(service) {
        Some(restriction) => resolve_restriction(layer.label(), service, restriction, kind, universe),
        // Service granted with no restriction entry: unrestricted.
        None => AccessExpr::Universal,
    }
}

/// Resolve the principal-override layer for one (service, kind).
pub fn resolve_override_layer(
    record: &PrincipalOverride,
    principal: &str,
    service: &str,
    kind: CapabilityKind,
    universe: &BTreeSet<String>,
) -> AccessExpr {
    match record.restrictions.get(service) {
        Some(restriction) => resolve_restriction(principal, service, restriction, kind, universe),
        // No adjustment for this service.
        None => AccessExpr::Universal,
    }
}

fn resolve_restriction(
    label: &str,
    service: &str,
    restriction: &Restriction,
    kind: CapabilityKind,
    universe: &BTreeSet<String>,
) -> AccessExpr {
    match restriction.mode {
        RestrictionMode::All => AccessExpr::Universal,
        RestrictionMode::None => AccessExpr::Empty,
        RestrictionMode::Allow => {
            AccessExpr::allow(known_names(label, service, restriction, kind, universe))
        }
        RestrictionMode::Deny => {
            AccessExpr::deny(known_names(label, service, restriction, kind, universe))
        }
    }
}

/// Intersect a restriction's name set with the universe, reporting names
/// the service no longer exposes.
fn known_names(
    label: &str,
    service: &str,
    restriction: &Restriction,
    kind: CapabilityKind,
    universe: &BTreeSet<String>,
) -> BTreeSet<String> {
    let names = restriction.names(kind);
    let stale: Vec<&str> = names
        .iter()
        .filter(|n| !universe.contains(*n))
        .map(String::as_str)
        .collect();

    if !stale.is_empty() {
        warn!(
            layer = label,
            service,
            kind = %kind,
            stale = ?stale,
            "restriction lists capability names the service no longer exposes"
        );
    }

    names.intersection(universe).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe() -> BTreeSet<String> {
        ["read_file", "write_file", "delete_file", "list_directory"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn role_with(service: &str, restriction: Restriction) -> Role {
        Role {
            name: "test-role".into(),
            service_access: [service.to_string()].into(),
            restrictions: [(service.to_string(), restriction)].into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_mode_all_resolves_universal() {
        let role = role_with("filesystem", Restriction::all());
        let expr = resolve_gated_layer(&role, "filesystem", CapabilityKind::Tool, &universe());
        assert!(expr.is_universal());
    }

    #[test]
    fn test_mode_none_resolves_empty() {
        let role = role_with("filesystem", Restriction::none());
        let expr = resolve_gated_layer(&role, "filesystem", CapabilityKind::Tool, &universe());
        assert!(expr.is_empty());
    }

    #[test]
    fn test_mode_none_ignores_name_sets() {
        let mut restriction = Restriction::allow_tools(["read_file"]);
        restriction.mode = RestrictionMode::None;
        let role = role_with("filesystem", restriction);
        let expr = resolve_gated_layer(&role, "filesystem", CapabilityKind::Tool, &universe());
        assert!(expr.is_empty());
    }

    #[test]
    fn test_allow_intersects_with_universe() {
        let role = role_with(
            "filesystem",
            Restriction::allow_tools(["read_file", "retired_tool"]),
        );
        let expr = resolve_gated_layer(&role, "filesystem", CapabilityKind::Tool, &universe());
        // The stale name is dropped, not an error
        assert!(expr.contains("read_file"));
        assert!(!expr.contains("retired_tool"));
    }

    #[test]
    fn test_deny_of_only_stale_names_is_universal() {
        let role = role_with("filesystem", Restriction::deny_tools(["retired_tool"]));
        let expr = resolve_gated_layer(&role, "filesystem", CapabilityKind::Tool, &universe());
        // Denying names that no longer exist denies nothing
        assert!(expr.is_universal());
    }

    #[test]
    fn test_service_gate_precedes_restriction() {
        // A permissive restriction for a service the layer cannot reach is inert
        let role = Role {
            name: "gated".into(),
            service_access: BTreeSet::new(),
            restrictions: [("filesystem".to_string(), Restriction::all())].into(),
            ..Default::default()
        };
        let expr = resolve_gated_layer(&role, "filesystem", CapabilityKind::Tool, &universe());
        assert!(expr.is_empty());
    }

    #[test]
    fn test_granted_service_without_restriction_is_universal() {
        let role = Role {
            name: "open".into(),
            service_access: ["filesystem".to_string()].into(),
            ..Default::default()
        };
        let expr = resolve_gated_layer(&role, "filesystem", CapabilityKind::Tool, &universe());
        assert!(expr.is_universal());
    }

    #[test]
    fn test_override_without_entry_is_identity() {
        let record = PrincipalOverride::default();
        let expr =
            resolve_override_layer(&record, "alice", "filesystem", CapabilityKind::Tool, &universe());
        assert!(expr.is_universal());
    }

    #[test]
    fn test_override_deny_resolves() {
        let record = PrincipalOverride {
            restrictions: [(
                "filesystem".to_string(),
                Restriction::deny_tools(["delete_file"]),
            )]
            .into(),
            ..Default::default()
        };
        let expr =
            resolve_override_layer(&record, "alice", "filesystem", CapabilityKind::Tool, &universe());
        assert!(expr.contains("read_file"));
        assert!(!expr.contains("delete_file"));
    }

    #[test]
    fn test_kinds_resolve_independently() {
        let mut restriction = Restriction::allow_tools(["read_file"]);
        restriction.prompts.insert("summarize".into());
        let role = role_with("filesystem", restriction);

        let tool_universe = universe();
        let prompt_universe: BTreeSet<String> = ["summarize".to_string()].into();

        let tools = resolve_gated_layer(&role, "filesystem", CapabilityKind::Tool, &tool_universe);
        let prompts =
            resolve_gated_layer(&role, "filesystem", CapabilityKind::Prompt, &prompt_universe);

        assert!(tools.contains("read_file"));
        assert!(prompts.contains("summarize"));
        assert!(!prompts.contains("read_file"));
    }
}
