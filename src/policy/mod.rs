//! Policy model
//!
//! Record types for roles, teams and principal overrides, plus the seams
//! through which they reach the engine: the [`PolicyStore`] /
//! [`UniverseProvider`] traits and the [`PolicyChange`] notification type.
//!
//! Records reference each other by id only. A principal points at its role
//! and teams; nothing points back. The engine performs forward lookups
//! through the store on every cache miss and holds no record graph of its
//! own.

pub mod memory;
pub mod store;
pub mod types;

pub use memory::{InMemoryPolicyStore, StaticUniverse};
pub use store::{PolicyChange, PolicyStore, UniverseProvider};
pub use types::{
    CapabilityKind, DashboardAccess, PrincipalId, PrincipalOverride, PrincipalRecord, Restriction,
    RestrictionMode, Role, RoleId, ServiceName, Team, TeamId,
};
