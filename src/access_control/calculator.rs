//! Effective permission calculation
//!
//! Composes the principal's role layer, every team layer the principal
//! belongs to, and the principal override into one final [`AccessExpr`]
//! per capability kind plus one effective limit pair.
//!
//! The order is fixed: the service-level gate is checked before any set
//! algebra (cheap short-circuit), teams fold together under intersection
//! (order-independent by the algebra's laws), and the override folds last
//! so its clamp can be verified against the already-folded role ∩ team
//! result. The calculation is a pure function of the record snapshots and
//! the capability universe; it holds no shared state and may run in
//! parallel across principals.

use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::access_control::expr::AccessExpr;
use crate::access_control::resolver::{resolve_gated_layer, resolve_override_layer};
use crate::access_control::types::EffectiveLimits;
use crate::error::PolicyStoreError;
use crate::policy::store::{PolicyStore, UniverseProvider};
use crate::policy::types::{
    CapabilityKind, PrincipalOverride, PrincipalRecord, Role, ServiceName, Team,
};

/// One [`AccessExpr`] per capability kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindExprs {
    pub tools: AccessExpr,
    pub resources: AccessExpr,
    pub prompts: AccessExpr,
}

impl KindExprs {
    pub fn universal() -> Self {
        Self {
            tools: AccessExpr::Universal,
            resources: AccessExpr::Universal,
            prompts: AccessExpr::Universal,
        }
    }

    pub fn empty() -> Self {
        Self {
            tools: AccessExpr::Empty,
            resources: AccessExpr::Empty,
            prompts: AccessExpr::Empty,
        }
    }

    pub fn get(&self, kind: CapabilityKind) -> &AccessExpr {
        match kind {
            CapabilityKind::Tool => &self.tools,
            CapabilityKind::Resource => &self.resources,
            CapabilityKind::Prompt => &self.prompts,
        }
    }

    pub fn intersect(&self, other: &KindExprs) -> KindExprs {
        KindExprs {
            tools: self.tools.intersect(&other.tools),
            resources: self.resources.intersect(&other.resources),
            prompts: self.prompts.intersect(&other.prompts),
        }
    }
}

/// Fully-resolved decision surface for one (principal, service) pair.
///
/// The per-layer expressions are retained alongside the folded result so a
/// denial can be attributed to the layer that caused it without
/// re-resolving anything. Instances are immutable; a policy edit produces
/// a freshly computed replacement, never an in-place patch.
#[derive(Debug, Clone)]
pub struct EffectivePermission {
    pub service: ServiceName,

    /// Whether role and every team grant the service at all
    pub service_granted: bool,

    /// Role layer, per kind
    pub role: KindExprs,

    /// All team layers folded together (`Universal` when the principal has
    /// no teams)
    pub teams: KindExprs,

    /// Final expression: role ∩ teams ∩ override, or `Empty` when the
    /// service gate failed
    pub combined: KindExprs,

    pub limits: EffectiveLimits,
}

/// Output of one calculation, with the record ids that fed it (the cache
/// uses them to maintain its reverse indexes).
pub struct Computed {
    pub permission: EffectivePermission,
    pub principal: PrincipalRecord,
}

/// Computes effective permissions from store snapshots.
pub struct PermissionCalculator<'a, S, U> {
    store: &'a S,
    universe: &'a U,
}

impl<'a, S: PolicyStore, U: UniverseProvider> PermissionCalculator<'a, S, U> {
    pub fn new(store: &'a S, universe: &'a U) -> Self {
        Self { store, universe }
    }

    /// Compute the effective permission for one (principal, service) pair.
    pub fn compute(
        &self,
        principal_id: &str,
        service: &str,
    ) -> Result<Computed, PolicyStoreError> {
        let principal = self.store.get_principal(principal_id)?;
        let role = self.store.get_role(&principal.role_id)?;
        let teams: Vec<Team> = principal
            .team_ids
            .iter()
            .map(|id| self.store.get_team(id))
            .collect::<Result<_, _>>()?;
        let override_record = self.store.get_override(principal_id)?;

        let limits = effective_limits(&role, &teams, override_record.as_ref());

        // Service gate: role and every team must grant the service. Checked
        // before any set algebra.
        let service_granted = role.service_access.contains(service)
            && teams.iter().all(|t| t.service_access.contains(service));

        if !service_granted {
            debug!(principal = principal_id, service, "service gate failed");
            return Ok(Computed {
                permission: EffectivePermission {
                    service: service.to_string(),
                    service_granted: false,
                    role: KindExprs::empty(),
                    teams: KindExprs::empty(),
                    combined: KindExprs::empty(),
                    limits,
                },
                principal,
            });
        }

        let mut resolved = ResolvedKinds::default();
        for kind in CapabilityKind::all() {
            let universe = self.universe.get_universe(service, *kind);

            let role_expr = resolve_gated_layer(&role, service, *kind, &universe);

            // No teams: identity element, never Empty.
            let team_expr = teams.iter().fold(AccessExpr::Universal, |acc, team| {
                acc.intersect(&resolve_gated_layer(team, service, *kind, &universe))
            });

            let base = role_expr.intersect(&team_expr);

            let combined = match &override_record {
                Some(record) => {
                    let override_expr =
                        resolve_override_layer(record, principal_id, service, *kind, &universe);
                    // A missing entry resolves to Universal ("no adjustment")
                    // and is not an expansion attempt.
                    if record.restrictions.contains_key(service) {
                        verify_clamp(principal_id, service, *kind, &base, &override_expr, &universe);
                    }
                    base.intersect(&override_expr)
                }
                None => base.clone(),
            };

            resolved.set(*kind, role_expr, team_expr, combined);
        }

        debug!(
            principal = principal_id,
            service,
            rate_limit = limits.rate_limit,
            "computed effective permission"
        );

        Ok(Computed {
            permission: EffectivePermission {
                service: service.to_string(),
                service_granted: true,
                role: resolved.role,
                teams: resolved.teams,
                combined: resolved.combined,
                limits,
            },
            principal,
        })
    }
}

#[derive(Debug)]
struct ResolvedKinds {
    role: KindExprs,
    teams: KindExprs,
    combined: KindExprs,
}

impl Default for ResolvedKinds {
    fn default() -> Self {
        Self {
            role: KindExprs::empty(),
            teams: KindExprs::empty(),
            combined: KindExprs::empty(),
        }
    }
}

impl ResolvedKinds {
    fn set(&mut self, kind: CapabilityKind, role: AccessExpr, teams: AccessExpr, combined: AccessExpr) {
        match kind {
            CapabilityKind::Tool => {
                self.role.tools = role;
                self.teams.tools = teams;
                self.combined.tools = combined;
            }
            CapabilityKind::Resource => {
                self.role.resources = role;
                self.teams.resources = teams;
                self.combined.resources = combined;
            }
            CapabilityKind::Prompt => {
                self.role.prompts = role;
                self.teams.prompts = teams;
                self.combined.prompts = combined;
            }
        }
    }
}

/// Effective rate and cost limits for a principal.
///
/// The override replaces when present; otherwise the most restrictive of
/// role and team limits wins.
pub fn effective_limits(
    role: &Role,
    teams: &[Team],
    override_record: Option<&PrincipalOverride>,
) -> EffectiveLimits {
    let rate_limit = override_record
        .and_then(|o| o.rate_limit_override)
        .unwrap_or_else(|| {
            teams
                .iter()
                .map(|t| t.rate_limit)
                .fold(role.rate_limit, u32::min)
        });

    let cost_limit_daily = override_record
        .and_then(|o| o.cost_limit_override)
        .unwrap_or_else(|| {
            teams
                .iter()
                .map(|t| t.cost_limit_daily)
                .fold(role.cost_limit_daily, f64::min)
        });

    EffectiveLimits {
        rate_limit,
        cost_limit_daily,
    }
}

/// Report an override that attempts to allow names beyond role ∩ team.
///
/// The intersection already guarantees those names stay excluded; the
/// warning gives operators visibility into a misconfigured override.
fn verify_clamp(
    principal: &str,
    service: &str,
    kind: CapabilityKind,
    base: &AccessExpr,
    override_expr: &AccessExpr,
    universe: &BTreeSet<String>,
) {
    let base_names = base.materialize(universe);
    let override_names = override_expr.materialize(universe);
    let attempted: Vec<&str> = override_names
        .iter()
        .filter(|n| !base_names.contains(*n))
        .map(String::as_str)
        .collect();

    if !attempted.is_empty() {
        warn!(
            principal,
            service,
            kind = %kind,
            attempted = ?attempted,
            "override attempts to grant names beyond the role and team layers; clamped"
        );
    }
}
