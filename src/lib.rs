//! mcp-warden
//!
//! Effective-permission resolution for MCP gateways. Every inbound tool
//! invocation and capability-listing request passes through this engine
//! before reaching the upstream service: it combines a principal's role
//! policy, team policies and principal-specific overrides into one
//! authorization decision, and reports the rate and cost ceilings that
//! apply.
//!
//! ## Resolution Model
//!
//! ```text
//! service gate -> role ∩ team₁ ∩ ... ∩ teamₙ ∩ override
//! ```
//!
//! Each layer resolves to an access expression (`Universal`, `Empty`,
//! `Allow(names)` or `Deny(names)`), and layers combine under an
//! intersection that is associative, commutative and monotonically
//! restrictive: adding a team or an override can only shrink access.
//!
//! ## Example
//!
//! ```
//! use mcp_warden::{
//!     AuthzEngine, CapabilityKind, InMemoryPolicyStore, PrincipalRecord, Restriction, Role,
//!     StaticUniverse,
//! };
//!
//! let store = InMemoryPolicyStore::new();
//! store.upsert_role(
//!     "analyst",
//!     Role {
//!         name: "Analyst".into(),
//!         service_access: ["filesystem".to_string()].into(),
//!         restrictions: [(
//!             "filesystem".to_string(),
//!             Restriction::allow_tools(["read_file", "list_directory"]),
//!         )]
//!         .into(),
//!         ..Default::default()
//!     },
//! );
//! store.upsert_principal(
//!     "alice",
//!     PrincipalRecord {
//!         role_id: "analyst".into(),
//!         ..Default::default()
//!     },
//! );
//!
//! let universe = StaticUniverse::new().with(
//!     "filesystem",
//!     CapabilityKind::Tool,
//!     ["read_file", "list_directory", "delete_file"],
//! );
//!
//! let engine = AuthzEngine::new(store, universe);
//! let decision = engine
//!     .check("alice", "filesystem", CapabilityKind::Tool, "read_file")
//!     .unwrap();
//! assert!(decision.is_allowed());
//! ```
//!
//! The engine owns no transport, persistence or CRUD surface: a policy
//! store adapter hands it record snapshots, a universe provider supplies
//! the capability names each service exposes, and administrative edits
//! arrive as [`PolicyChange`] notifications for synchronous cache
//! invalidation.

pub mod access_control;
pub mod error;
pub mod policy;

// Re-export main types
pub use access_control::{
    AccessExpr, AuthzEngine, Decision, DecisionCache, DecisionReason, EffectiveLimits,
    EffectivePermission, KindExprs, PermissionCalculator,
};
pub use error::{AuthzError, PolicyStoreError, Result};
pub use policy::{
    CapabilityKind, DashboardAccess, InMemoryPolicyStore, PolicyChange, PolicyStore,
    PrincipalOverride, PrincipalRecord, Restriction, RestrictionMode, Role, StaticUniverse, Team,
    UniverseProvider,
};
