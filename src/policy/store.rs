//! Policy store and capability universe seams
//!
//! The engine never talks to a database or the network itself. A store
//! adapter hands it in-memory record snapshots through [`PolicyStore`], and
//! a [`UniverseProvider`] supplies the set of capability names each service
//! currently exposes. Administrative mutations arrive as [`PolicyChange`]
//! notifications which the engine uses for synchronous cache invalidation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::PolicyStoreError;
use crate::policy::types::{
    CapabilityKind, PrincipalId, PrincipalOverride, PrincipalRecord, Role, RoleId, Team, TeamId,
};

/// Read access to role, team and principal records.
///
/// Implementations return owned snapshots: a record handed to the engine is
/// immutable for the duration of one resolution even if the backing store
/// is edited concurrently.
pub trait PolicyStore: Send + Sync {
    fn get_principal(&self, principal_id: &str) -> Result<PrincipalRecord, PolicyStoreError>;

    fn get_role(&self, role_id: &str) -> Result<Role, PolicyStoreError>;

    fn get_team(&self, team_id: &str) -> Result<Team, PolicyStoreError>;

    /// The principal's override record, if one exists.
    fn get_override(
        &self,
        principal_id: &str,
    ) -> Result<Option<PrincipalOverride>, PolicyStoreError>;
}

/// Supplies the current set of capability names per (service, kind).
///
/// A service unknown to the provider has an empty universe, which resolves
/// every allow/deny list against nothing and fails closed.
pub trait UniverseProvider: Send + Sync {
    fn get_universe(&self, service: &str, kind: CapabilityKind) -> BTreeSet<String>;
}

/// Change notification emitted by the administrative surface on every
/// policy mutation.
///
/// Delivery is synchronous with respect to cache invalidation: once
/// [`crate::AuthzEngine::apply_change`] returns, no subsequent decision
/// can observe the pre-edit policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PolicyChange {
    /// A role record was created, edited or deleted.
    Role(RoleId),
    /// A team record (including its member set) was created, edited or deleted.
    Team(TeamId),
    /// A principal's override record was created, edited or deleted.
    Override(PrincipalId),
    /// A principal record itself changed (role reassignment, team list edit).
    Principal(PrincipalId),
}
