//! Policy record types
//!
//! Role, Team and Principal Override records as handed to the engine by a
//! policy store adapter. The engine treats them as read-only snapshots;
//! they are created and edited only through the administrative surface.
//!
//! `Restriction` is a strongly-typed tagged union: the `mode` tag is a
//! closed enum validated at the adapter boundary during deserialization,
//! so an unknown mode tag can never reach the resolution algebra.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Identifier of an authenticated actor.
pub type PrincipalId = String;
/// Identifier of a role record.
pub type RoleId = String;
/// Identifier of a team record.
pub type TeamId = String;
/// Name of an upstream MCP service.
pub type ServiceName = String;

/// Capability kind exposed by an MCP service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Tool,
    Resource,
    Prompt,
}

impl CapabilityKind {
    /// Get the kind name as a string
    pub const fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::Tool => "tool",
            CapabilityKind::Resource => "resource",
            CapabilityKind::Prompt => "prompt",
        }
    }

    /// Try to parse a kind from a string
    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "tool" => Some(CapabilityKind::Tool),
            "resource" => Some(CapabilityKind::Resource),
            "prompt" => Some(CapabilityKind::Prompt),
            _ => None,
        }
    }

    /// Get all capability kinds
    pub const fn all() -> &'static [CapabilityKind] {
        &[
            CapabilityKind::Tool,
            CapabilityKind::Resource,
            CapabilityKind::Prompt,
        ]
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Restriction mode for one (layer, service) entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestrictionMode {
    /// Every capability the service exposes
    All,
    /// Exactly the listed names
    Allow,
    /// Everything except the listed names
    Deny,
    /// Nothing
    #[default]
    None,
}

/// Per-service restriction entry on a role, team, or principal override.
///
/// The three name sets are interpreted against the capability universe of
/// the service. When `mode` is `All` or `None` the sets are inert and must
/// not affect resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Restriction {
    pub mode: RestrictionMode,

    /// Tool names (interpreted per `mode`)
    pub tools: BTreeSet<String>,

    /// Resource names (interpreted per `mode`)
    pub resources: BTreeSet<String>,

    /// Prompt names (interpreted per `mode`)
    pub prompts: BTreeSet<String>,
}

impl Restriction {
    /// Restriction permitting every capability
    pub fn all() -> Self {
        Self {
            mode: RestrictionMode::All,
            ..Default::default()
        }
    }

    /// Restriction permitting nothing
    pub fn none() -> Self {
        Self {
            mode: RestrictionMode::None,
            ..Default::default()
        }
    }

    /// Allow-list restriction over tool names
    pub fn allow_tools<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: RestrictionMode::Allow,
            tools: names.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Deny-list restriction over tool names
    pub fn deny_tools<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: RestrictionMode::Deny,
            tools: names.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// The name set for a capability kind
    pub fn names(&self, kind: CapabilityKind) -> &BTreeSet<String> {
        match kind {
            CapabilityKind::Tool => &self.tools,
            CapabilityKind::Resource => &self.resources,
            CapabilityKind::Prompt => &self.prompts,
        }
    }

    /// Mutable name set for a capability kind
    pub fn names_mut(&mut self, kind: CapabilityKind) -> &mut BTreeSet<String> {
        match kind {
            CapabilityKind::Tool => &mut self.tools,
            CapabilityKind::Resource => &mut self.resources,
            CapabilityKind::Prompt => &mut self.prompts,
        }
    }
}

/// Dashboard access level carried on a role.
///
/// Consumed by the administrative surface, not by the resolution algebra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardAccess {
    #[default]
    None,
    ReadOnly,
    Full,
}

/// Role record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
    pub name: String,

    /// Services principals holding this role may reach at all
    pub service_access: BTreeSet<ServiceName>,

    /// Per-service capability restrictions
    pub restrictions: HashMap<ServiceName, Restriction>,

    /// Requests per minute
    pub rate_limit: u32,

    /// Daily cost ceiling, in account currency units
    pub cost_limit_daily: f64,

    /// Session/token expiry
    pub session_expiry_secs: u64,

    pub dashboard_access: DashboardAccess,
}

impl Default for Role {
    fn default() -> Self {
        Self {
            name: String::new(),
            service_access: BTreeSet::new(),
            restrictions: HashMap::new(),
            rate_limit: 60,
            cost_limit_daily: 10.0,
            session_expiry_secs: 3600,
            dashboard_access: DashboardAccess::None,
        }
    }
}

/// Team record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Team {
    pub name: String,

    /// Principals belonging to this team
    pub members: BTreeSet<PrincipalId>,

    /// Services this team may reach; a service absent here is revoked for
    /// every member regardless of role
    pub service_access: BTreeSet<ServiceName>,

    /// Per-service capability restrictions
    pub restrictions: HashMap<ServiceName, Restriction>,

    /// Requests per minute
    pub rate_limit: u32,

    /// Daily cost ceiling
    pub cost_limit_daily: f64,
}

impl Default for Team {
    fn default() -> Self {
        Self {
            name: String::new(),
            members: BTreeSet::new(),
            service_access: BTreeSet::new(),
            restrictions: HashMap::new(),
            rate_limit: 60,
            cost_limit_daily: 10.0,
        }
    }
}

/// Principal-specific override record. At most one per principal.
///
/// Overrides are restriction-only: they can remove permissions granted by
/// the role and team layers but never add new ones. The limit overrides
/// replace rather than combine with the lower layers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrincipalOverride {
    /// Per-service restriction adjustments
    pub restrictions: HashMap<ServiceName, Restriction>,

    /// Replaces the role/team rate limits when present
    pub rate_limit_override: Option<u32>,

    /// Replaces the role/team cost ceilings when present
    pub cost_limit_override: Option<f64>,
}

/// Principal record: forward references only, no back-pointers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrincipalRecord {
    pub role_id: RoleId,
    pub team_ids: BTreeSet<TeamId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_kind_roundtrip() {
        for kind in CapabilityKind::all() {
            assert_eq!(CapabilityKind::try_parse(kind.as_str()), Some(*kind));
        }
        assert_eq!(CapabilityKind::try_parse("widget"), None);
    }

    #[test]
    fn test_restriction_mode_rejects_unknown_tag() {
        // Unknown mode tags are a deserialization failure at the adapter
        // boundary, never a value inside the core.
        let err = serde_json::from_str::<Restriction>(r#"{"mode": "sometimes"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_restriction_defaults_to_none() {
        let r: Restriction = serde_json::from_str("{}").unwrap();
        assert_eq!(r.mode, RestrictionMode::None);
        assert!(r.tools.is_empty());
    }

    #[test]
    fn test_restriction_name_sets_by_kind() {
        let mut r = Restriction::allow_tools(["read_file"]);
        r.names_mut(CapabilityKind::Prompt).insert("summarize".into());

        assert!(r.names(CapabilityKind::Tool).contains("read_file"));
        assert!(r.names(CapabilityKind::Prompt).contains("summarize"));
        assert!(r.names(CapabilityKind::Resource).is_empty());
    }

    #[test]
    fn test_role_deserializes_from_toml() {
        let role: Role = toml::from_str(
            r#"
            name = "analyst"
            service_access = ["filesystem"]
            rate_limit = 120

            [restrictions.filesystem]
            mode = "allow"
            tools = ["read_file", "list_directory"]
            "#,
        )
        .unwrap();

        assert_eq!(role.name, "analyst");
        assert_eq!(role.rate_limit, 120);
        let r = &role.restrictions["filesystem"];
        assert_eq!(r.mode, RestrictionMode::Allow);
        assert!(r.tools.contains("read_file"));
        // Unset fields keep their defaults
        assert_eq!(role.dashboard_access, DashboardAccess::None);
    }
}
