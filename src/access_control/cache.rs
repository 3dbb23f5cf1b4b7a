//! Decision cache
//!
//! Memoizes computed [`EffectivePermission`]s keyed by (principal, service)
//! so the calculator does not rerun on every gateway request. Entries are
//! `Arc`-wrapped and replaced wholesale on recompute; a concurrent reader
//! observes either the old or the new value, never a partially updated one.
//!
//! Invalidation favors correctness over retention: a role or team edit
//! drops every entry that could have been derived from the changed record.
//! Reverse indexes from role/team id to the principals whose entries were
//! computed against them are maintained at insert time. Index entries are
//! never pruned on invalidation; a stale index entry only causes an extra
//! eviction, which is the safe direction.
//!
//! Entries are versioned by an invalidation generation counter. A miss-path
//! computation captures the generation before it reads any policy record
//! and hands it back to [`DecisionCache::insert`]; if any invalidation ran
//! in between, the computed entry is discarded instead of stored. Without
//! this, a computation that read its snapshot before an edit could
//! repopulate the cache after the edit's invalidation had already
//! completed, and the stale decision would then be served until the next
//! unrelated invalidation.

use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::access_control::calculator::EffectivePermission;
use crate::policy::types::{PrincipalId, RoleId, ServiceName, TeamId};

type CacheKey = (PrincipalId, ServiceName);

/// Concurrent cache of effective permissions.
#[derive(Default)]
pub struct DecisionCache {
    entries: DashMap<CacheKey, Arc<EffectivePermission>>,
    by_role: DashMap<RoleId, BTreeSet<PrincipalId>>,
    by_team: DashMap<TeamId, BTreeSet<PrincipalId>>,
    /// Bumped by every invalidation, before any eviction.
    generation: AtomicU64,
}

impl DecisionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current invalidation generation.
    ///
    /// Capture this before reading the policy records for a computation
    /// and pass it to [`DecisionCache::insert`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self, principal: &str, service: &str) -> Option<Arc<EffectivePermission>> {
        self.entries
            .get(&(principal.to_string(), service.to_string()))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Store a freshly computed permission and index it by the records it
    /// was derived from.
    ///
    /// `observed_generation` is the value [`DecisionCache::generation`]
    /// returned before the computation read its policy snapshot. If any
    /// invalidation has run since, the snapshot may predate the edit, so
    /// the entry is withdrawn and `false` is returned; the caller may
    /// still use the permission for its own request, but the next lookup
    /// recomputes.
    pub fn insert(
        &self,
        principal: &str,
        service: &str,
        permission: Arc<EffectivePermission>,
        role_id: &str,
        team_ids: &BTreeSet<TeamId>,
        observed_generation: u64,
    ) -> bool {
        self.by_role
            .entry(role_id.to_string())
            .or_default()
            .insert(principal.to_string());
        for team_id in team_ids {
            self.by_team
                .entry(team_id.clone())
                .or_default()
                .insert(principal.to_string());
        }

        let key = (principal.to_string(), service.to_string());
        self.entries.insert(key.clone(), permission);

        // Re-check after the insert. An invalidation bumps the generation
        // before it evicts, so either we observe the bump here and remove
        // our own entry, or our insert completed before the bump and the
        // invalidation's eviction sweeps it.
        if self.generation.load(Ordering::SeqCst) != observed_generation {
            self.entries.remove(&key);
            debug!(
                principal,
                service, "discarded computation that straddled an invalidation"
            );
            return false;
        }
        true
    }

    /// Drop every cached entry for one principal.
    pub fn invalidate_principal(&self, principal: &str) {
        self.bump_generation();
        self.entries.retain(|(p, _), _| p != principal);
        debug!(principal, "invalidated cached decisions");
    }

    /// Drop every entry derived from a role. Returns the number of affected
    /// principals.
    pub fn invalidate_role(&self, role_id: &str) -> usize {
        self.bump_generation();
        let affected = self
            .by_role
            .remove(role_id)
            .map(|(_, principals)| principals)
            .unwrap_or_default();

        for principal in &affected {
            self.entries.retain(|(p, _), _| p != principal);
        }
        debug!(role = role_id, affected = affected.len(), "invalidated role");
        affected.len()
    }

    /// Drop every entry derived from a team.
    ///
    /// `current_members` is the team's member set after the edit: a
    /// principal newly added to the team has no index entry yet but must
    /// not keep serving a pre-membership decision.
    pub fn invalidate_team(&self, team_id: &str, current_members: &BTreeSet<PrincipalId>) -> usize {
        self.bump_generation();
        let mut affected = self
            .by_team
            .remove(team_id)
            .map(|(_, principals)| principals)
            .unwrap_or_default();
        affected.extend(current_members.iter().cloned());

        for principal in &affected {
            self.entries.retain(|(p, _), _| p != principal);
        }
        debug!(team = team_id, affected = affected.len(), "invalidated team");
        affected.len()
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.bump_generation();
        self.entries.clear();
        self.by_role.clear();
        self.by_team.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::calculator::KindExprs;
    use crate::access_control::types::EffectiveLimits;

    fn permission(service: &str) -> Arc<EffectivePermission> {
        Arc::new(EffectivePermission {
            service: service.to_string(),
            service_granted: true,
            role: KindExprs::universal(),
            teams: KindExprs::universal(),
            combined: KindExprs::universal(),
            limits: EffectiveLimits {
                rate_limit: 60,
                cost_limit_daily: 10.0,
            },
        })
    }

    fn teams(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_get_after_insert() {
        let cache = DecisionCache::new();
        cache.insert("alice", "filesystem", permission("filesystem"), "analyst", &teams(&[]), cache.generation());

        assert!(cache.get("alice", "filesystem").is_some());
        assert!(cache.get("alice", "database").is_none());
        assert!(cache.get("bob", "filesystem").is_none());
    }

    #[test]
    fn test_invalidate_principal_drops_all_services() {
        let cache = DecisionCache::new();
        cache.insert("alice", "filesystem", permission("filesystem"), "analyst", &teams(&[]), cache.generation());
        cache.insert("alice", "database", permission("database"), "analyst", &teams(&[]), cache.generation());
        cache.insert("bob", "filesystem", permission("filesystem"), "analyst", &teams(&[]), cache.generation());

        cache.invalidate_principal("alice");

        assert!(cache.get("alice", "filesystem").is_none());
        assert!(cache.get("alice", "database").is_none());
        assert!(cache.get("bob", "filesystem").is_some());
    }

    #[test]
    fn test_invalidate_role_uses_reverse_index() {
        let cache = DecisionCache::new();
        cache.insert("alice", "filesystem", permission("filesystem"), "analyst", &teams(&[]), cache.generation());
        cache.insert("bob", "filesystem", permission("filesystem"), "developer", &teams(&[]), cache.generation());

        let affected = cache.invalidate_role("analyst");

        assert_eq!(affected, 1);
        assert!(cache.get("alice", "filesystem").is_none());
        assert!(cache.get("bob", "filesystem").is_some());
    }

    #[test]
    fn test_invalidate_team_sweeps_new_members() {
        let cache = DecisionCache::new();
        // bob was cached before joining the team, so the index has no entry
        cache.insert("bob", "filesystem", permission("filesystem"), "developer", &teams(&[]), cache.generation());

        cache.invalidate_team("qa", &teams(&["bob"]));

        assert!(cache.get("bob", "filesystem").is_none());
    }

    #[test]
    fn test_invalidate_unknown_role_is_noop() {
        let cache = DecisionCache::new();
        cache.insert("alice", "filesystem", permission("filesystem"), "analyst", &teams(&[]), cache.generation());

        assert_eq!(cache.invalidate_role("ghost"), 0);
        assert!(cache.get("alice", "filesystem").is_some());
    }

    #[test]
    fn test_insert_discarded_when_generation_moved() {
        let cache = DecisionCache::new();
        let observed = cache.generation();

        // An invalidation lands between snapshot capture and insert
        cache.invalidate_principal("alice");

        let stored = cache.insert(
            "alice",
            "filesystem",
            permission("filesystem"),
            "analyst",
            &teams(&[]),
            observed,
        );
        assert!(!stored);
        assert!(cache.get("alice", "filesystem").is_none());
    }

    #[test]
    fn test_any_invalidation_moves_generation() {
        let cache = DecisionCache::new();
        let start = cache.generation();

        cache.invalidate_principal("alice");
        cache.invalidate_role("analyst");
        cache.invalidate_team("qa", &teams(&[]));
        cache.clear();

        assert_eq!(cache.generation(), start + 4);
    }

    #[test]
    fn test_reinsert_replaces_entry() {
        let cache = DecisionCache::new();
        cache.insert("alice", "filesystem", permission("filesystem"), "analyst", &teams(&[]), cache.generation());

        let replacement = Arc::new(EffectivePermission {
            service_granted: false,
            ..(*permission("filesystem")).clone()
        });
        cache.insert("alice", "filesystem", replacement, "analyst", &teams(&[]), cache.generation());

        let cached = cache.get("alice", "filesystem").unwrap();
        assert!(!cached.service_granted);
    }
}
