//! # Query engine
//!
//! Resolves the attributes a set of roles is granted for an action on a
//! resource.
//!
//! ## Resolution
//!
//! 1. The queried roles are flattened with everything they inherit.
//! 2. For every role owning the resource, the `action:possession` entry is
//!    looked up, falling back to `action:any`. A role owning the resource
//!    without a matching entry contributes an empty list.
//! 3. The collected lists are unioned left to right.
//!
//! The permission is granted when the union is non-empty.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::actions::{Action, ActionPossession, Possession};
use crate::error::{AccessControlError, AccessControlResult};
use crate::grants::Grants;
use crate::hierarchy;
use crate::names::{is_filled, IntoNames};
use crate::permission::Permission;

/// A fully specified permission query.
///
/// `action` may carry a `:possession` suffix; an explicit `possession`
/// takes precedence over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInfo {
    /// Roles to check.
    pub role: Vec<String>,
    /// Resource name.
    pub resource: String,
    /// Action, e.g. `"read"` or `"read:own"`.
    pub action: String,
    /// Possession, `"own"` or `"any"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possession: Option<String>,
}

impl QueryInfo {
    /// Create a query.
    pub fn new(role: impl IntoNames, resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            role: role.into_names(),
            resource: resource.into(),
            action: action.into(),
            possession: None,
        }
    }

    /// Set the possession.
    pub fn with_possession(mut self, possession: impl Into<String>) -> Self {
        self.possession = Some(possession.into());
        self
    }

    /// Validate and normalize the query.
    ///
    /// # Errors
    ///
    /// - `InvalidRole` when no roles are given or a role is blank
    /// - `InvalidResource` when the resource is blank
    /// - `InvalidAction` / `InvalidPossession` for unknown tokens
    pub fn normalize(&self) -> AccessControlResult<ResolvedQuery> {
        if self.role.is_empty() || !is_filled(&self.role) {
            return Err(AccessControlError::InvalidRole(format!("{:?}", self.role)));
        }
        let resource = self.resource.trim();
        if resource.is_empty() {
            return Err(AccessControlError::InvalidResource(format!(
                "\"{}\"",
                self.resource
            )));
        }
        let key = ActionPossession::resolve(&self.action, self.possession.as_deref())?;

        Ok(ResolvedQuery {
            roles: self.role.iter().map(|r| r.trim().to_string()).collect(),
            resource: resource.to_string(),
            key,
        })
    }
}

/// A validated query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    /// Roles to check.
    pub roles: Vec<String>,
    /// Trimmed resource name.
    pub resource: String,
    /// Typed action and possession.
    pub key: ActionPossession,
}

/// Resolve a permission against the grants.
///
/// # Errors
///
/// Validation errors from [`QueryInfo::normalize`], and `RoleNotFound`
/// when a queried or inherited role does not exist.
pub fn resolve_permission(grants: &Grants, query: &QueryInfo) -> AccessControlResult<Permission> {
    let query = query.normalize()?;
    resolve(grants, query)
}

fn resolve(grants: &Grants, query: ResolvedQuery) -> AccessControlResult<Permission> {
    let roles = hierarchy::flatten(grants, &query.roles)?;
    let fallback = query.key.as_any();

    let mut lists: Vec<Vec<String>> = Vec::new();
    for role in &roles {
        let resource = match grants.role(role).and_then(|r| r.resource(&query.resource)) {
            Some(resource) => resource,
            None => continue,
        };
        let attributes = resource
            .get(&query.key)
            .or_else(|| resource.get(&fallback))
            .cloned()
            .unwrap_or_default();
        lists.push(attributes);
    }

    let attributes = match lists.len() {
        0 => Vec::new(),
        1 => lists.remove(0),
        _ => accessgate_notation::union_all(&lists),
    };

    Ok(Permission::new(
        attributes,
        query.roles,
        query.resource,
        query.key.action,
        query.key.possession,
    ))
}

/// Query handle bound to a set of roles.
///
/// Created by [`AccessControl::can`](crate::AccessControl::can). Each
/// terminal method resolves one permission.
///
/// # Example
///
/// ```
/// use accessgate::AccessControl;
///
/// let mut ac = AccessControl::new();
/// ac.grant("user")?.create_own("video")?;
///
/// assert!(ac.can("user").create_own("video")?.granted());
/// assert!(!ac.can("user").create_any("video")?.granted());
/// # Ok::<(), accessgate::AccessControlError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Query<'a> {
    grants: &'a Grants,
    roles: Vec<String>,
    log_decisions: bool,
}

impl<'a> Query<'a> {
    pub(crate) fn new(grants: &'a Grants, roles: Vec<String>, log_decisions: bool) -> Self {
        Self {
            grants,
            roles,
            log_decisions,
        }
    }

    /// Replace the queried roles.
    pub fn role(mut self, roles: impl IntoNames) -> Self {
        self.roles = roles.into_names();
        self
    }

    /// Roles this handle queries for.
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    fn check(&self, action: Action, possession: Possession, resource: &str) -> AccessControlResult<Permission> {
        let query = QueryInfo::new(self.roles.clone(), resource, action.as_str())
            .with_possession(possession.as_str());
        let permission = resolve_permission(self.grants, &query)?;
        log_decision(&permission, self.log_decisions);
        Ok(permission)
    }

    /// Check "create" on the caller's own resource.
    pub fn create_own(&self, resource: &str) -> AccessControlResult<Permission> {
        self.check(Action::Create, Possession::Own, resource)
    }

    /// Check "create" on any resource.
    pub fn create_any(&self, resource: &str) -> AccessControlResult<Permission> {
        self.check(Action::Create, Possession::Any, resource)
    }

    /// Alias of [`create_any`](Self::create_any).
    pub fn create(&self, resource: &str) -> AccessControlResult<Permission> {
        self.create_any(resource)
    }

    /// Check "read" on the caller's own resource.
    pub fn read_own(&self, resource: &str) -> AccessControlResult<Permission> {
        self.check(Action::Read, Possession::Own, resource)
    }

    /// Check "read" on any resource.
    pub fn read_any(&self, resource: &str) -> AccessControlResult<Permission> {
        self.check(Action::Read, Possession::Any, resource)
    }

    /// Alias of [`read_any`](Self::read_any).
    pub fn read(&self, resource: &str) -> AccessControlResult<Permission> {
        self.read_any(resource)
    }

    /// Check "update" on the caller's own resource.
    pub fn update_own(&self, resource: &str) -> AccessControlResult<Permission> {
        self.check(Action::Update, Possession::Own, resource)
    }

    /// Check "update" on any resource.
    pub fn update_any(&self, resource: &str) -> AccessControlResult<Permission> {
        self.check(Action::Update, Possession::Any, resource)
    }

    /// Alias of [`update_any`](Self::update_any).
    pub fn update(&self, resource: &str) -> AccessControlResult<Permission> {
        self.update_any(resource)
    }

    /// Check "delete" on the caller's own resource.
    pub fn delete_own(&self, resource: &str) -> AccessControlResult<Permission> {
        self.check(Action::Delete, Possession::Own, resource)
    }

    /// Check "delete" on any resource.
    pub fn delete_any(&self, resource: &str) -> AccessControlResult<Permission> {
        self.check(Action::Delete, Possession::Any, resource)
    }

    /// Alias of [`delete_any`](Self::delete_any).
    pub fn delete(&self, resource: &str) -> AccessControlResult<Permission> {
        self.delete_any(resource)
    }
}

pub(crate) fn log_decision(permission: &Permission, at_info: bool) {
    if at_info {
        info!(
            roles = ?permission.roles(),
            resource = %permission.resource(),
            action = %permission.action(),
            possession = %permission.possession(),
            granted = permission.granted(),
            "Permission decision"
        );
    } else {
        debug!(
            roles = ?permission.roles(),
            resource = %permission.resource(),
            action = %permission.action(),
            possession = %permission.possession(),
            granted = permission.granted(),
            "Permission decision"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::import_grants;
    use serde_json::json;

    fn grants() -> Grants {
        import_grants(&json!({
            "user": {
                "video": {
                    "read:any": ["*", "!id"],
                    "update:own": ["title"]
                },
                "photo": { "create:own": ["*"] }
            },
            "admin": {
                "$extend": ["user"],
                "video": { "update:any": ["*"] }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_normalize_query() {
        let resolved = QueryInfo::new("user", " video ", "read:own").normalize().unwrap();
        assert_eq!(resolved.resource, "video");
        assert_eq!(resolved.key, ActionPossession::new(Action::Read, Possession::Own));

        let resolved = QueryInfo::new("user", "video", "READ").normalize().unwrap();
        assert_eq!(resolved.key.possession, Possession::Any);
    }

    #[test]
    fn test_normalize_query_errors() {
        assert!(matches!(
            QueryInfo::new((), "video", "read").normalize(),
            Err(AccessControlError::InvalidRole(_))
        ));
        assert!(matches!(
            QueryInfo::new("", "video", "read").normalize(),
            Err(AccessControlError::InvalidRole(_))
        ));
        assert!(matches!(
            QueryInfo::new("user", "  ", "read").normalize(),
            Err(AccessControlError::InvalidResource(_))
        ));
        assert!(matches!(
            QueryInfo::new("user", "video", "put").normalize(),
            Err(AccessControlError::InvalidAction(_))
        ));
        assert!(matches!(
            QueryInfo::new("user", "video", "read").with_possession("all").normalize(),
            Err(AccessControlError::InvalidPossession(_))
        ));
    }

    #[test]
    fn test_own_falls_back_to_any() {
        let grants = grants();
        let permission = resolve_permission(&grants, &QueryInfo::new("user", "video", "read:own")).unwrap();
        assert!(permission.granted());
        assert_eq!(permission.attributes(), &["*", "!id"]);
    }

    #[test]
    fn test_any_does_not_use_own() {
        let grants = grants();
        let permission = resolve_permission(&grants, &QueryInfo::new("user", "video", "update:any")).unwrap();
        assert!(!permission.granted());
        assert!(permission.attributes().is_empty());
    }

    #[test]
    fn test_union_over_inherited_roles() {
        let grants = grants();
        let permission = resolve_permission(&grants, &QueryInfo::new("admin", "video", "update:own")).unwrap();
        assert_eq!(permission.attributes(), &["*"]);
        assert_eq!(permission.roles(), &["admin"]);
    }

    #[test]
    fn test_unknown_role() {
        let grants = grants();
        assert_eq!(
            resolve_permission(&grants, &QueryInfo::new("ghost", "video", "read")),
            Err(AccessControlError::RoleNotFound("ghost".to_string()))
        );
    }

    #[test]
    fn test_query_handle() {
        let grants = grants();
        let query = Query::new(&grants, vec!["user".to_string()], false);

        assert!(query.read("video").unwrap().granted());
        assert!(query.read_own("video").unwrap().granted());
        assert!(query.update_own("video").unwrap().granted());
        assert!(!query.update("video").unwrap().granted());
        assert!(query.create_own("photo").unwrap().granted());
        assert!(!query.create("photo").unwrap().granted());
        assert!(!query.delete_any("video").unwrap().granted());
        assert!(!query.delete_own("music").unwrap().granted());

        let admin = query.role("admin");
        assert!(admin.update_any("video").unwrap().granted());
    }
}
