//! In-memory policy store and static universe provider
//!
//! Default collaborator implementations for embedding and tests. The store
//! keeps all records behind one `RwLock`; mutators return the
//! [`PolicyChange`] the administrative surface is expected to forward to
//! [`crate::AuthzEngine::apply_change`].

use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};

use crate::error::PolicyStoreError;
use crate::policy::store::{PolicyChange, PolicyStore, UniverseProvider};
use crate::policy::types::{
    CapabilityKind, PrincipalOverride, PrincipalRecord, Role, Team,
};

#[derive(Default)]
struct Records {
    roles: HashMap<String, Role>,
    teams: HashMap<String, Team>,
    principals: HashMap<String, PrincipalRecord>,
    overrides: HashMap<String, PrincipalOverride>,
}

/// Thread-safe in-memory policy store.
#[derive(Default)]
pub struct InMemoryPolicyStore {
    records: RwLock<Records>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_role(&self, role_id: impl Into<String>, role: Role) -> PolicyChange {
        let role_id = role_id.into();
        self.records.write().roles.insert(role_id.clone(), role);
        PolicyChange::Role(role_id)
    }

    pub fn remove_role(&self, role_id: &str) -> PolicyChange {
        self.records.write().roles.remove(role_id);
        PolicyChange::Role(role_id.to_string())
    }

    pub fn upsert_team(&self, team_id: impl Into<String>, team: Team) -> PolicyChange {
        let team_id = team_id.into();
        self.records.write().teams.insert(team_id.clone(), team);
        PolicyChange::Team(team_id)
    }

    pub fn remove_team(&self, team_id: &str) -> PolicyChange {
        self.records.write().teams.remove(team_id);
        PolicyChange::Team(team_id.to_string())
    }

    pub fn upsert_principal(
        &self,
        principal_id: impl Into<String>,
        record: PrincipalRecord,
    ) -> PolicyChange {
        let principal_id = principal_id.into();
        self.records
            .write()
            .principals
            .insert(principal_id.clone(), record);
        PolicyChange::Principal(principal_id)
    }

    pub fn upsert_override(
        &self,
        principal_id: impl Into<String>,
        record: PrincipalOverride,
    ) -> PolicyChange {
        let principal_id = principal_id.into();
        self.records
            .write()
            .overrides
            .insert(principal_id.clone(), record);
        PolicyChange::Override(principal_id)
    }

    pub fn remove_override(&self, principal_id: &str) -> PolicyChange {
        self.records.write().overrides.remove(principal_id);
        PolicyChange::Override(principal_id.to_string())
    }
}

impl PolicyStore for InMemoryPolicyStore {
    fn get_principal(&self, principal_id: &str) -> Result<PrincipalRecord, PolicyStoreError> {
        self.records
            .read()
            .principals
            .get(principal_id)
            .cloned()
            .ok_or_else(|| PolicyStoreError::PrincipalNotFound(principal_id.to_string()))
    }

    fn get_role(&self, role_id: &str) -> Result<Role, PolicyStoreError> {
        self.records
            .read()
            .roles
            .get(role_id)
            .cloned()
            .ok_or_else(|| PolicyStoreError::RoleNotFound(role_id.to_string()))
    }

    fn get_team(&self, team_id: &str) -> Result<Team, PolicyStoreError> {
        self.records
            .read()
            .teams
            .get(team_id)
            .cloned()
            .ok_or_else(|| PolicyStoreError::TeamNotFound(team_id.to_string()))
    }

    fn get_override(
        &self,
        principal_id: &str,
    ) -> Result<Option<PrincipalOverride>, PolicyStoreError> {
        Ok(self.records.read().overrides.get(principal_id).cloned())
    }
}

/// Fixed capability universe, built up front.
#[derive(Default)]
pub struct StaticUniverse {
    names: HashMap<(String, CapabilityKind), BTreeSet<String>>,
}

impl StaticUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the names a service exposes for one capability kind.
    pub fn with<I, S>(mut self, service: impl Into<String>, kind: CapabilityKind, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.insert(
            (service.into(), kind),
            names.into_iter().map(Into::into).collect(),
        );
        self
    }
}

impl UniverseProvider for StaticUniverse {
    fn get_universe(&self, service: &str, kind: CapabilityKind) -> BTreeSet<String> {
        self.names
            .get(&(service.to_string(), kind))
            .cloned()
            .unwrap_or_default()
    }
}
