//! Role hierarchy and permission registry.
//!
//! Roles form a DAG: each role lists its parents and inherits everything they
//! grant. Resolution is default-deny.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::authorize::{AuthorizationExplanation, Grant};
use crate::{AuthError, AuthResult, Permission, Role};

#[derive(Debug, Default, Clone)]
struct RoleNode {
    /// Declaration order is resolution order.
    parents: Vec<Role>,
    permissions: HashSet<Permission>,
}

type RoleGraph = HashMap<Role, RoleNode>;

/// Registry of roles, their parents and their directly granted permissions.
///
/// Mutations are expected during startup; queries run concurrently on every
/// request. Reads take a shared lock, mutations an exclusive one. Every
/// mutation validates before touching the graph, so a poisoned lock still
/// guards a consistent graph and is recovered rather than propagated.
#[derive(Debug, Default)]
pub struct RbacRegistry {
    graph: RwLock<RoleGraph>,
}

impl RbacRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, RoleGraph> {
        self.graph.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RoleGraph> {
        self.graph.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────────

    /// Register `role` with no permissions and the given parents.
    ///
    /// Parents may name roles that are registered later. Fails without
    /// mutating anything if the role exists or if it is reachable from one of
    /// its parents.
    pub fn add_role(&self, role: &str, parents: &[&str]) -> AuthResult<()> {
        let mut graph = self.write();

        if graph.contains_key(role) {
            return Err(AuthError::already_exists(role));
        }
        if parents.iter().any(|parent| reaches(&graph, parent, role)) {
            return Err(AuthError::CyclicHierarchy(role.to_string()));
        }

        graph.insert(
            Role::new(role.to_string()),
            RoleNode {
                parents: parents.iter().map(|p| Role::new(p.to_string())).collect(),
                permissions: HashSet::new(),
            },
        );

        tracing::info!(role, ?parents, "role registered");
        Ok(())
    }

    /// Grant `permissions` directly to `role`. Granting twice is a no-op.
    pub fn add_permission(&self, role: &str, permissions: &[&str]) -> AuthResult<()> {
        let mut graph = self.write();
        let node = graph.get_mut(role).ok_or_else(|| AuthError::not_found(role))?;

        node.permissions
            .extend(permissions.iter().map(|p| Permission::new(p.to_string())));

        tracing::info!(role, ?permissions, "permissions granted");
        Ok(())
    }

    /// Revoke direct grants from `role`. Revoking an absent grant is a no-op.
    pub fn remove_permission(&self, role: &str, permissions: &[&str]) -> AuthResult<()> {
        let mut graph = self.write();
        let node = graph.get_mut(role).ok_or_else(|| AuthError::not_found(role))?;

        for permission in permissions {
            node.permissions.remove(*permission);
        }

        tracing::info!(role, ?permissions, "permissions revoked");
        Ok(())
    }

    /// Run `apply` against a staged copy of the graph and publish the copy
    /// only if it succeeds. Concurrent mutations wait until it finishes.
    pub(crate) fn apply_all<F>(&self, apply: F) -> AuthResult<()>
    where
        F: FnOnce(&RbacRegistry) -> AuthResult<()>,
    {
        let mut graph = self.write();
        let staged = RbacRegistry {
            graph: RwLock::new(graph.clone()),
        };

        apply(&staged)?;

        *graph = staged
            .graph
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether `role` grants `permission`, directly or through an ancestor.
    ///
    /// A `resource:*` grant satisfies any action on that resource. Unknown
    /// roles resolve to `false`.
    pub fn has_permission(&self, role: &str, permission: &str) -> bool {
        let graph = self.read();
        resolve_permission(&graph, role, permission).is_some()
    }

    /// Literal membership test; no hierarchy expansion.
    pub fn has_role<R: AsRef<str>>(&self, user_roles: &[R], role: &str) -> bool {
        user_roles.iter().any(|r| r.as_ref() == role)
    }

    /// Whether any of `user_roles` may perform `action` on `resource`.
    pub fn is_allowed<R: AsRef<str>>(&self, user_roles: &[R], resource: &str, action: &str) -> bool {
        let graph = self.read();
        let granted = user_roles
            .iter()
            .any(|role| resolve_action(&graph, role.as_ref(), resource, action).is_some());

        tracing::debug!(resource, action, granted, "authorization decision");
        granted
    }

    /// Explain the decision [`is_allowed`](Self::is_allowed) would make.
    pub fn explain<R: AsRef<str>>(
        &self,
        user_roles: &[R],
        resource: &str,
        action: &str,
    ) -> AuthorizationExplanation {
        let graph = self.read();
        let held: Vec<Role> = user_roles
            .iter()
            .map(|r| Role::new(r.as_ref().to_string()))
            .collect();

        let grant = held.iter().find_map(|role| {
            resolve_action(&graph, role.as_str(), resource, action).map(|(source, permission)| Grant {
                held_role: role.clone(),
                source_role: source.clone(),
                permission: permission.clone(),
            })
        });

        let unknown_roles = held
            .iter()
            .filter(|role| !graph.contains_key(role.as_str()))
            .cloned()
            .collect();

        AuthorizationExplanation::new(resource, action, held, grant, unknown_roles)
    }

    pub fn contains_role(&self, role: &str) -> bool {
        self.read().contains_key(role)
    }

    /// All registered roles, sorted.
    pub fn roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.read().keys().cloned().collect();
        roles.sort();
        roles
    }

    /// Declared parents of `role`, in resolution order.
    pub fn parents(&self, role: &str) -> Option<Vec<Role>> {
        self.read().get(role).map(|node| node.parents.clone())
    }

    /// Direct grants of `role`, sorted.
    pub fn permissions(&self, role: &str) -> Option<Vec<Permission>> {
        self.read().get(role).map(|node| {
            let mut permissions: Vec<Permission> = node.permissions.iter().cloned().collect();
            permissions.sort();
            permissions
        })
    }

    /// Direct and inherited grants of `role`, sorted. Empty for unknown roles.
    pub fn effective_permissions(&self, role: &str) -> Vec<Permission> {
        let graph = self.read();
        let mut collected = BTreeSet::new();
        let mut visited = HashSet::new();
        let mut stack = vec![role];

        while let Some(current) = stack.pop() {
            let Some((name, node)) = graph.get_key_value(current) else {
                continue;
            };
            if !visited.insert(name.as_str()) {
                continue;
            }
            collected.extend(node.permissions.iter().cloned());
            stack.extend(node.parents.iter().map(Role::as_str));
        }

        collected.into_iter().collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolution
// ─────────────────────────────────────────────────────────────────────────────

/// `resource:action` or `resource:*`, whichever some reachable role grants.
///
/// A single walk answers both checks: every node is tested against the exact
/// key and the resource wildcard before moving on to its parents.
fn resolve_action<'g>(
    graph: &'g RoleGraph,
    role: &str,
    resource: &str,
    action: &str,
) -> Option<(&'g Role, &'g Permission)> {
    let exact = Permission::of(resource, action);
    let all_actions = Permission::all_actions(resource);

    let mut accepted = grant_keys(exact);
    for key in grant_keys(all_actions) {
        if !accepted.contains(&key) {
            accepted.push(key);
        }
    }

    let mut visited = HashSet::new();
    walk(graph, role, &accepted, &mut visited)
}

/// Find the role (`role` itself or an ancestor) carrying a grant for
/// `permission`, returning it with the matching grant.
fn resolve_permission<'g>(
    graph: &'g RoleGraph,
    role: &str,
    permission: &str,
) -> Option<(&'g Role, &'g Permission)> {
    let accepted = grant_keys(Permission::new(permission.to_string()));
    let mut visited = HashSet::new();
    walk(graph, role, &accepted, &mut visited)
}

/// Grants that satisfy `permission`: the key itself, then its wildcard.
fn grant_keys(permission: Permission) -> Vec<Permission> {
    match permission.wildcard() {
        Some(wildcard) if wildcard != permission => vec![permission, wildcard],
        _ => vec![permission],
    }
}

/// Depth-first over parents in declaration order, first match wins.
fn walk<'g>(
    graph: &'g RoleGraph,
    role: &str,
    accepted: &[Permission],
    visited: &mut HashSet<&'g str>,
) -> Option<(&'g Role, &'g Permission)> {
    let (name, node) = graph.get_key_value(role)?;
    // Diamond-shaped hierarchies reach shared ancestors more than once.
    if !visited.insert(name.as_str()) {
        return None;
    }

    let direct = accepted
        .iter()
        .find_map(|key| node.permissions.get(key.as_str()));
    if let Some(granted) = direct {
        return Some((name, granted));
    }

    node.parents
        .iter()
        .find_map(|parent| walk(graph, parent.as_str(), accepted, visited))
}

/// Whether `target` is `from` or one of its registered ancestors.
fn reaches(graph: &RoleGraph, from: &str, target: &str) -> bool {
    let mut visited = HashSet::new();
    let mut stack = vec![from];

    while let Some(current) = stack.pop() {
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(node) = graph.get(current) {
            stack.extend(node.parents.iter().map(Role::as_str));
        }
    }
    false
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
