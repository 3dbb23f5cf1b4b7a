//! Access control core
//!
//! Layered effective-permission resolution for MCP capabilities.
//!
//! ## Layering Model
//!
//! A principal's permission for one service is the intersection of up to
//! three layers, combined in a fixed order:
//!
//! 1. **Service gate** - the role *and* every team the principal belongs
//!    to must list the service in their `service_access`; otherwise the
//!    result is `Empty` for every capability kind and no set algebra runs.
//! 2. **Role layer** - the role's restriction for the service.
//! 3. **Team layers** - every team's restriction, folded together under
//!    intersection. No teams means the identity element `Universal`.
//! 4. **Override layer** - the principal's restriction-only adjustments,
//!    folded last so the clamp can be verified against role ∩ team.
//!
//! Intersection is associative and commutative, so team order never
//! changes the result, and adding a layer can only shrink the permitted
//! set. Effective limits follow the same direction: most restrictive of
//! role and team ceilings, unless the override replaces them.
//!
//! Decisions are memoized per (principal, service) and invalidated
//! synchronously on policy change notifications; an administrative edit is
//! visible to the very next decision for every affected principal.

pub mod cache;
pub mod calculator;
pub mod engine;
pub mod expr;
pub mod resolver;
pub mod types;

pub use cache::DecisionCache;
pub use calculator::{Computed, EffectivePermission, KindExprs, PermissionCalculator};
pub use engine::AuthzEngine;
pub use expr::AccessExpr;
pub use resolver::{GatedLayer, resolve_gated_layer, resolve_override_layer};
pub use types::{Decision, DecisionReason, EffectiveLimits};
