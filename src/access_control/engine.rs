//! Authorization query API
//!
//! The two operations the gateway calls on every request, `check` and
//! `list_permitted`, plus `effective_limits` for throttling and cost
//! capping, built on the calculator and the decision cache.
//!
//! Policy edits reach the engine through [`AuthzEngine::apply_change`];
//! invalidation completes before the call returns, so a decision made
//! after the notification is delivered always reflects the edit.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::access_control::calculator::{EffectivePermission, PermissionCalculator, effective_limits};
use crate::access_control::cache::DecisionCache;
use crate::access_control::types::{Decision, DecisionReason, EffectiveLimits};
use crate::error::{AuthzError, Result};
use crate::policy::store::{PolicyChange, PolicyStore, UniverseProvider};
use crate::policy::types::CapabilityKind;

/// The authorization engine.
///
/// Read-mostly and call-heavy: `check` and `list_permitted` run on every
/// gateway-routed capability invocation, concurrently across principals.
/// All methods take `&self`; the only shared mutable structure is the
/// decision cache.
pub struct AuthzEngine<S, U> {
    store: S,
    universe: U,
    cache: DecisionCache,
}

impl<S: PolicyStore, U: UniverseProvider> AuthzEngine<S, U> {
    pub fn new(store: S, universe: U) -> Self {
        Self {
            store,
            universe,
            cache: DecisionCache::new(),
        }
    }

    /// The backing policy store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Is the principal allowed to call `name` on `service`?
    ///
    /// An unresolved principal, role, or team collapses to a denial with
    /// reason `principal_unresolved`; only a store failure returns `Err`.
    pub fn check(
        &self,
        principal: &str,
        service: &str,
        kind: CapabilityKind,
        name: &str,
    ) -> Result<Decision> {
        let Some(permission) = self.permission_for(principal, service)? else {
            return Ok(Decision::denied(DecisionReason::PrincipalUnresolved));
        };

        let decision = decide(&permission, kind, name);
        debug!(
            principal,
            service,
            kind = %kind,
            name,
            allowed = decision.allowed,
            reason = %decision.reason,
            "authorization check"
        );
        Ok(decision)
    }

    /// The capability names the principal may currently use on `service`,
    /// materialized against the live universe.
    pub fn list_permitted(
        &self,
        principal: &str,
        service: &str,
        kind: CapabilityKind,
    ) -> Result<BTreeSet<String>> {
        let Some(permission) = self.permission_for(principal, service)? else {
            return Ok(BTreeSet::new());
        };

        if !permission.service_granted {
            return Ok(BTreeSet::new());
        }

        let universe = self.universe.get_universe(service, kind);
        Ok(permission.combined.get(kind).materialize(&universe))
    }

    /// Effective rate and cost ceilings for a principal, independent of
    /// any particular service.
    pub fn effective_limits(&self, principal: &str) -> Result<EffectiveLimits> {
        let record = self.store.get_principal(principal)?;
        let role = self.store.get_role(&record.role_id)?;
        let teams = record
            .team_ids
            .iter()
            .map(|id| self.store.get_team(id))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let override_record = self.store.get_override(principal)?;

        Ok(effective_limits(&role, &teams, override_record.as_ref()))
    }

    /// Apply a policy change notification.
    ///
    /// Invalidation is synchronous: once this returns, no subsequent
    /// `check` or `list_permitted` call observes the pre-edit policy.
    pub fn apply_change(&self, change: &PolicyChange) {
        match change {
            PolicyChange::Role(role_id) => {
                self.cache.invalidate_role(role_id);
            }
            PolicyChange::Team(team_id) => {
                // Sweep the team's current members too: a principal added
                // by this edit has no reverse-index entry yet. A deleted
                // team has no members left to sweep.
                let members = self
                    .store
                    .get_team(team_id)
                    .map(|team| team.members)
                    .unwrap_or_default();
                self.cache.invalidate_team(team_id, &members);
            }
            PolicyChange::Override(principal) | PolicyChange::Principal(principal) => {
                self.cache.invalidate_principal(principal);
            }
        }
    }

    /// Number of cached (principal, service) decisions.
    pub fn cached_decisions(&self) -> usize {
        self.cache.len()
    }

    /// Cached permission for (principal, service), computing and storing it
    /// on miss. `None` means the principal (or its role/teams) could not be
    /// resolved.
    fn permission_for(
        &self,
        principal: &str,
        service: &str,
    ) -> Result<Option<Arc<EffectivePermission>>> {
        if let Some(cached) = self.cache.get(principal, service) {
            trace!(principal, service, "decision cache hit");
            return Ok(Some(cached));
        }

        // Captured before any store read: if an invalidation runs while we
        // compute, the snapshot may predate the edit and must not be cached.
        let observed_generation = self.cache.generation();

        let calculator = PermissionCalculator::new(&self.store, &self.universe);
        let computed = match calculator.compute(principal, service) {
            Ok(computed) => computed,
            Err(err) if err.is_not_found() => {
                debug!(principal, service, error = %err, "principal unresolved");
                return Ok(None);
            }
            Err(err) => return Err(AuthzError::Store(err)),
        };

        let permission = Arc::new(computed.permission);
        let stored = self.cache.insert(
            principal,
            service,
            Arc::clone(&permission),
            &computed.principal.role_id,
            &computed.principal.team_ids,
            observed_generation,
        );
        if !stored {
            trace!(principal, service, "computation straddled an invalidation");
        }
        Ok(Some(permission))
    }
}

/// Attribute a decision to the layer that caused it.
///
/// The service gate is checked first; after that the per-layer expressions
/// retained on the permission identify the denying layer without
/// re-resolving anything.
fn decide(permission: &EffectivePermission, kind: CapabilityKind, name: &str) -> Decision {
    if !permission.service_granted {
        return Decision::denied(DecisionReason::ServiceNotGranted);
    }

    if permission.combined.get(kind).contains(name) {
        return Decision::allowed();
    }

    if !permission.role.get(kind).contains(name) {
        Decision::denied(DecisionReason::DeniedByRole)
    } else if !permission.teams.get(kind).contains(name) {
        Decision::denied(DecisionReason::DeniedByTeam)
    } else {
        Decision::denied(DecisionReason::DeniedByOverride)
    }
}
