//! # Access control
//!
//! [`AccessControl`] owns the grants model and exposes every read and write
//! operation on it. Writes go through the [`Access`] builder or the removal
//! methods; reads go through [`Query`] handles or [`AccessControl::permission`].
//!
//! Once [`lock`](AccessControl::lock)ed, every write fails with
//! [`AccessControlError::Locked`] while reads keep working.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::access::{Access, AccessInfo};
use crate::actions::ActionPossession;
use crate::config::AccessControlConfig;
use crate::error::{AccessControlError, AccessControlResult};
use crate::grants::Grants;
use crate::hierarchy;
use crate::import::{import_grants, validate_grants};
use crate::names::{has_valid_names, is_filled, IntoNames};
use crate::permission::Permission;
use crate::query::{log_decision, resolve_permission, Query, QueryInfo};

/// Role and attribute based access control over an in-memory grants model.
///
/// # Example
///
/// ```
/// use accessgate::AccessControl;
///
/// let mut ac = AccessControl::new();
/// ac.grant("user")?
///     .create_own("video")?
///     .attributes(["*", "!views"])
///     .read_any("video")?
///     .grant("admin")?
///     .extend("user")?
///     .update_any("video")?
///     .delete_any(())?;
///
/// assert!(ac.can("admin").read_any("video")?.granted());
/// assert_eq!(ac.can("user").read_any("video")?.attributes(), &["*", "!views"]);
/// assert!(!ac.can("user").delete_any("video")?.granted());
/// # Ok::<(), accessgate::AccessControlError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    grants: Grants,
    locked: bool,
    config: AccessControlConfig,
}

impl AccessControl {
    /// Create an instance with empty grants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty instance with the given configuration.
    pub fn with_config(config: AccessControlConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Create an instance from grants built in code.
    ///
    /// # Errors
    ///
    /// `InvalidName` for reserved names, `RoleNotFound`, `SelfExtension` or
    /// `CrossInheritance` for a broken extension graph.
    pub fn from_grants(grants: Grants) -> AccessControlResult<Self> {
        validate_grants(&grants)?;
        let mut ac = Self::new();
        ac.grants = grants;
        Ok(ac)
    }

    /// Create an instance from the object or flat list JSON form.
    ///
    /// # Example
    ///
    /// ```
    /// use accessgate::AccessControl;
    /// use serde_json::json;
    ///
    /// let ac = AccessControl::from_value(&json!([
    ///     { "role": "user", "resource": "video", "action": "read:any", "attributes": ["*"] },
    ///     { "role": "admin", "resource": "video", "action": "delete" }
    /// ]))?;
    ///
    /// assert_eq!(ac.roles(), vec!["user", "admin"]);
    /// # Ok::<(), accessgate::AccessControlError>(())
    /// ```
    pub fn from_value(grants: &Value) -> AccessControlResult<Self> {
        let mut ac = Self::new();
        ac.set_grants(grants)?;
        Ok(ac)
    }

    /// Create an instance from grant entries, committed in order.
    ///
    /// # Errors
    ///
    /// `InvalidGrantsInput` when an entry lacks its role, resource or
    /// action, and the matching validation error for invalid names.
    pub fn from_entries(entries: Vec<AccessInfo>) -> AccessControlResult<Self> {
        let mut ac = Self::new();
        for (index, entry) in entries.into_iter().enumerate() {
            if !entry.is_fulfilled() {
                return Err(AccessControlError::InvalidGrantsInput(format!(
                    "entry {} needs a role, a resource and an action",
                    index
                )));
            }
            let denied = entry.denied;
            Access::from_info(&mut ac, entry, denied)?;
        }
        Ok(ac)
    }

    /// Configuration in use.
    pub fn config(&self) -> &AccessControlConfig {
        &self.config
    }

    /// Replace the grants wholesale from the object or flat list JSON form.
    ///
    /// The current grants are kept if the input is invalid. Locks the
    /// instance afterwards when `lock_on_load` is configured.
    pub fn set_grants(&mut self, grants: &Value) -> AccessControlResult<()> {
        self.ensure_unlocked("set_grants")?;
        self.grants = import_grants(grants)?;
        debug!(roles = self.grants.len(), "Grants replaced");

        if self.config.lock_on_load && !self.grants.is_empty() {
            self.lock()?;
        }
        Ok(())
    }

    /// Remove every role.
    pub fn reset(&mut self) -> AccessControlResult<()> {
        self.ensure_unlocked("reset")?;
        self.grants = Grants::new();
        info!("Grants reset");
        Ok(())
    }

    /// Lock the grants against any further change.
    ///
    /// Locking a locked instance does nothing.
    ///
    /// # Errors
    ///
    /// `EmptyGrants` when no roles are defined.
    pub fn lock(&mut self) -> AccessControlResult<()> {
        if self.grants.is_empty() {
            return Err(AccessControlError::EmptyGrants);
        }
        if !self.locked {
            self.locked = true;
            info!(roles = self.grants.len(), "Grants locked");
        }
        Ok(())
    }

    /// Check if the grants are locked.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Read-only view of the grants.
    pub fn grants(&self) -> &Grants {
        &self.grants
    }

    /// Export the grants in canonical object form.
    pub fn to_value(&self) -> Value {
        self.grants.to_value()
    }

    /// Defined role names.
    pub fn roles(&self) -> Vec<String> {
        self.grants.roles()
    }

    /// Resource names referenced by any role.
    pub fn resources(&self) -> Vec<String> {
        self.grants.resources()
    }

    /// Check if every given role exists. An empty selection is `false`.
    pub fn has_role(&self, roles: impl IntoNames) -> bool {
        let roles = roles.into_names();
        !roles.is_empty() && roles.iter().all(|role| self.grants.contains_role(role))
    }

    /// Check if every given resource is referenced. An empty selection is `false`.
    pub fn has_resource(&self, resources: impl IntoNames) -> bool {
        let resources = resources.into_names();
        let known = self.grants.resources();
        !resources.is_empty() && resources.iter().all(|resource| known.contains(resource))
    }

    /// Roles `role` inherits from, nearest first.
    pub fn inherited_roles_of(&self, role: &str) -> AccessControlResult<Vec<String>> {
        hierarchy::inherited_roles_of(&self.grants, role)
    }

    /// Start a permission query for `roles`.
    pub fn can(&self, roles: impl IntoNames) -> Query<'_> {
        Query::new(&self.grants, roles.into_names(), self.config.log_decisions)
    }

    /// Alias of [`can`](Self::can).
    pub fn query(&self, roles: impl IntoNames) -> Query<'_> {
        self.can(roles)
    }

    /// Resolve a fully specified query.
    pub fn permission(&self, query: &QueryInfo) -> AccessControlResult<Permission> {
        let permission = resolve_permission(&self.grants, query)?;
        log_decision(&permission, self.config.log_decisions);
        Ok(permission)
    }

    /// Start granting access to `roles`. Pass `()` to pick roles later
    /// with [`Access::role`].
    pub fn grant(&mut self, roles: impl IntoNames) -> AccessControlResult<Access<'_>> {
        Access::new(self, roles.into_names(), false)
    }

    /// Start denying access to `roles`.
    pub fn deny(&mut self, roles: impl IntoNames) -> AccessControlResult<Access<'_>> {
        Access::new(self, roles.into_names(), true)
    }

    /// Start a grant builder without roles.
    pub fn grant_empty(&mut self) -> AccessControlResult<Access<'_>> {
        self.grant(())
    }

    /// Start a deny builder without roles.
    pub fn deny_empty(&mut self) -> AccessControlResult<Access<'_>> {
        self.deny(())
    }

    /// Grant from a draft; committed right away when role, resource and
    /// action are all set.
    pub fn grant_info(&mut self, info: AccessInfo) -> AccessControlResult<Access<'_>> {
        Access::from_info(self, info, false)
    }

    /// Deny from a draft; committed right away when role, resource and
    /// action are all set.
    pub fn deny_info(&mut self, info: AccessInfo) -> AccessControlResult<Access<'_>> {
        Access::from_info(self, info, true)
    }

    /// Alias of [`grant`](Self::grant).
    pub fn allow(&mut self, roles: impl IntoNames) -> AccessControlResult<Access<'_>> {
        self.grant(roles)
    }

    /// Alias of [`deny`](Self::deny).
    pub fn reject(&mut self, roles: impl IntoNames) -> AccessControlResult<Access<'_>> {
        self.deny(roles)
    }

    /// Make each of `roles` extend every role in `extenders`.
    pub fn extend_role(&mut self, roles: impl IntoNames, extenders: impl IntoNames) -> AccessControlResult<()> {
        let roles = roles.into_names();
        let extenders = extenders.into_names();
        let grants = self.grants_for_update()?;
        hierarchy::extend(grants, &roles, &extenders)
    }

    /// Remove roles and strip them from every extension list.
    ///
    /// # Errors
    ///
    /// `InvalidRole` for an empty or blank selection, `RoleNotFound` when
    /// any role does not exist. Nothing is removed on error.
    pub fn remove_roles(&mut self, roles: impl IntoNames) -> AccessControlResult<()> {
        let roles = roles.into_names();
        let grants = self.grants_for_update()?;
        if roles.is_empty() || !is_filled(&roles) {
            return Err(AccessControlError::InvalidRole(format!("{:?}", roles)));
        }
        if let Some(missing) = roles.iter().find(|role| !grants.contains_role(role)) {
            return Err(AccessControlError::RoleNotFound(missing.clone()));
        }

        for role in &roles {
            grants.remove_role(role);
        }
        for (_, record) in grants.roles_mut() {
            record.drop_extends(&roles);
        }
        debug!(roles = ?roles, "Removed roles");
        Ok(())
    }

    /// Remove resources from `roles`, or from every role when `()` is passed.
    pub fn remove_resources(&mut self, resources: impl IntoNames, roles: impl IntoNames) -> AccessControlResult<()> {
        self.remove_permission(resources, roles, None)
    }

    /// Remove a single `action[:possession]` entry of resources from
    /// `roles`, or the whole resource entries when `action` is `None`.
    ///
    /// Passing `()` for `roles` targets every role.
    ///
    /// # Errors
    ///
    /// - `InvalidResource` for an empty or blank resource selection
    /// - `InvalidName` for reserved names
    /// - `InvalidRole` for a blank role, `RoleNotFound` for an unknown one
    /// - `InvalidAction` / `InvalidPossession` for a malformed action
    pub fn remove_permission(
        &mut self,
        resources: impl IntoNames,
        roles: impl IntoNames,
        action: Option<&str>,
    ) -> AccessControlResult<()> {
        let resources = resources.into_names();
        let roles = roles.into_names();
        self.ensure_unlocked("remove_permission")?;

        if resources.is_empty() || !is_filled(&resources) {
            return Err(AccessControlError::InvalidResource(format!("{:?}", resources)));
        }
        has_valid_names(&resources, true)?;
        if !is_filled(&roles) {
            return Err(AccessControlError::InvalidRole(format!("{:?}", roles)));
        }
        if let Some(missing) = roles.iter().find(|role| !self.grants.contains_role(role)) {
            return Err(AccessControlError::RoleNotFound(missing.clone()));
        }
        let key = action.map(str::parse::<ActionPossession>).transpose()?;

        let targets = if roles.is_empty() {
            self.grants.roles()
        } else {
            roles
        };
        for role in &targets {
            let Some(record) = self.grants.role_mut(role) else {
                continue;
            };
            for resource in &resources {
                match key {
                    Some(key) => {
                        if let Some(entry) = record.existing_resource_mut(resource) {
                            entry.shift_remove(&key);
                        }
                    }
                    None => {
                        record.remove_resource(resource);
                    }
                }
            }
        }

        debug!(
            resources = ?resources,
            roles = ?targets,
            action = ?key.map(|k| k.to_string()),
            "Removed permissions"
        );
        Ok(())
    }

    /// Filter data down to the given attribute globs.
    pub fn filter(data: &Value, attributes: &[impl AsRef<str>]) -> Value {
        accessgate_notation::filter(data, attributes)
    }

    /// Filter every item by the given attribute globs.
    pub fn filter_all(items: &[Value], attributes: &[impl AsRef<str>]) -> Vec<Value> {
        accessgate_notation::filter_all(items, attributes)
    }

    /// Mutable grants, or `Locked`.
    pub(crate) fn grants_for_update(&mut self) -> AccessControlResult<&mut Grants> {
        self.ensure_unlocked("update")?;
        Ok(&mut self.grants)
    }

    fn ensure_unlocked(&self, operation: &str) -> AccessControlResult<()> {
        if self.locked {
            warn!(operation = %operation, "Rejected change to locked grants");
            return Err(AccessControlError::Locked);
        }
        Ok(())
    }
}

impl TryFrom<Value> for AccessControl {
    type Error = AccessControlError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}
