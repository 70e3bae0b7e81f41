//! # Access builder
//!
//! Fluent grant/deny API over an [`AccessControl`] instance.
//!
//! A builder holds a draft [`AccessInfo`]. Selector methods (`role`,
//! `resource`, `attributes`) update the draft; terminal action methods
//! (`create_own` … `delete`) commit it:
//!
//! ```text
//! ac.grant("user")?            draft { role: [user] }         user created
//!   .attributes(["*", "!id"])  draft { attributes: [*, !id] }
//!   .read_any("video")?        user.video["read:any"] = [*, !id]
//!   .update_own(())?           user.video["update:own"] = [*]
//! ```
//!
//! Attributes set with `attributes` apply to the next terminal only;
//! afterwards the default `["*"]` is used again. Denying always stores an
//! empty list.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::actions::{Action, ActionPossession, Possession};
use crate::control::AccessControl;
use crate::error::{AccessControlError, AccessControlResult};
use crate::grants::Grants;
use crate::hierarchy;
use crate::names::{has_valid_names, is_filled, validate_name, IntoNames};

/// Draft of a grant or deny entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessInfo {
    /// Roles receiving the entry.
    pub role: Vec<String>,
    /// Resources the entry applies to.
    pub resource: Vec<String>,
    /// Action, if chosen.
    pub action: Option<Action>,
    /// Possession, defaults to `any`.
    pub possession: Option<Possession>,
    /// Attribute globs; `None` means `["*"]` when granting.
    pub attributes: Option<Vec<String>>,
    /// Whether this entry denies access.
    pub denied: bool,
}

impl AccessInfo {
    /// Create an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the roles.
    pub fn with_role(mut self, role: impl IntoNames) -> Self {
        self.role = role.into_names();
        self
    }

    /// Set the resources.
    pub fn with_resource(mut self, resource: impl IntoNames) -> Self {
        self.resource = resource.into_names();
        self
    }

    /// Set the action.
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Set the possession.
    pub fn with_possession(mut self, possession: Possession) -> Self {
        self.possession = Some(possession);
        self
    }

    /// Set the attribute globs.
    pub fn with_attributes(mut self, attributes: impl IntoNames) -> Self {
        self.attributes = Some(attributes.into_names());
        self
    }

    /// Mark as denied.
    pub fn with_denied(mut self, denied: bool) -> Self {
        self.denied = denied;
        self
    }

    /// Check if role, resource and action are all set.
    pub fn is_fulfilled(&self) -> bool {
        !self.role.is_empty() && !self.resource.is_empty() && self.action.is_some()
    }

    /// Attributes that will be stored: always empty when denied, `["*"]`
    /// when granting without explicit attributes.
    pub fn effective_attributes(&self) -> Vec<String> {
        if self.denied {
            return Vec::new();
        }
        self.attributes
            .clone()
            .unwrap_or_else(|| vec!["*".to_string()])
    }

    fn normalize(&self) -> AccessControlResult<NormalizedAccess> {
        if self.role.is_empty() || !is_filled(&self.role) {
            return Err(AccessControlError::InvalidRole(format!("{:?}", self.role)));
        }
        if self.resource.is_empty() || !is_filled(&self.resource) {
            return Err(AccessControlError::InvalidResource(format!(
                "{:?}",
                self.resource
            )));
        }

        let roles = trimmed(&self.role);
        let resources = trimmed(&self.resource);
        has_valid_names(&roles, true)?;
        has_valid_names(&resources, true)?;

        let action = self
            .action
            .ok_or_else(|| AccessControlError::InvalidAction("no action given".to_string()))?;
        let possession = self.possession.unwrap_or_default();

        Ok(NormalizedAccess {
            roles,
            resources,
            key: ActionPossession::new(action, possession),
            attributes: self.effective_attributes(),
        })
    }
}

struct NormalizedAccess {
    roles: Vec<String>,
    resources: Vec<String>,
    key: ActionPossession,
    attributes: Vec<String>,
}

fn trimmed(names: &[String]) -> Vec<String> {
    names.iter().map(|name| name.trim().to_string()).collect()
}

/// Write a fulfilled draft into the grants, creating missing roles and
/// resources. Nothing is written if the draft is invalid.
pub(crate) fn commit(grants: &mut Grants, info: &AccessInfo) -> AccessControlResult<()> {
    let access = info.normalize()?;

    for role in &access.roles {
        let record = grants.ensure_role(role);
        for resource in &access.resources {
            record
                .resource_mut(resource)
                .insert(access.key, access.attributes.clone());
        }
    }

    debug!(
        roles = ?access.roles,
        resources = ?access.resources,
        action = %access.key,
        attributes = ?access.attributes,
        denied = info.denied,
        "Committed access"
    );
    Ok(())
}

/// Create every role that does not exist yet.
fn pre_create_roles(grants: &mut Grants, roles: &[String]) -> AccessControlResult<()> {
    if roles.is_empty() {
        return Err(AccessControlError::InvalidRole("empty role list".to_string()));
    }
    for role in roles {
        validate_name(role, true)?;
    }
    for role in roles {
        grants.ensure_role(role.trim());
    }
    Ok(())
}

/// Fluent builder for grant and deny entries.
///
/// Every method returning `AccessControlResult` fails with `Locked` once
/// the underlying instance is locked.
#[derive(Debug)]
pub struct Access<'a> {
    control: &'a mut AccessControl,
    info: AccessInfo,
}

impl<'a> Access<'a> {
    /// Start a builder for `roles`. Named roles are created right away so
    /// that an unterminated chain still registers them.
    pub(crate) fn new(
        control: &'a mut AccessControl,
        roles: Vec<String>,
        denied: bool,
    ) -> AccessControlResult<Self> {
        let grants = control.grants_for_update()?;
        if !roles.is_empty() {
            pre_create_roles(grants, &roles)?;
        }
        Ok(Self {
            control,
            info: AccessInfo {
                role: trimmed(&roles),
                denied,
                ..AccessInfo::default()
            },
        })
    }

    /// Start a builder from a draft. A fulfilled draft is committed
    /// immediately.
    pub(crate) fn from_info(
        control: &'a mut AccessControl,
        mut info: AccessInfo,
        denied: bool,
    ) -> AccessControlResult<Self> {
        if info == AccessInfo::default() {
            return Err(AccessControlError::InvalidGrantsInput(
                "empty access info".to_string(),
            ));
        }
        info.denied = denied;
        let grants = control.grants_for_update()?;
        if info.is_fulfilled() {
            commit(grants, &info)?;
            info.attributes = None;
        }
        Ok(Self { control, info })
    }

    /// Current draft.
    pub fn info(&self) -> &AccessInfo {
        &self.info
    }

    /// Check if this builder denies access.
    pub fn denied(&self) -> bool {
        self.info.denied
    }

    /// Switch to other roles, creating them if needed.
    pub fn role(mut self, roles: impl IntoNames) -> AccessControlResult<Self> {
        let roles = roles.into_names();
        let grants = self.control.grants_for_update()?;
        pre_create_roles(grants, &roles)?;
        self.info.role = trimmed(&roles);
        Ok(self)
    }

    /// Switch to other resources.
    pub fn resource(mut self, resources: impl IntoNames) -> AccessControlResult<Self> {
        let resources = resources.into_names();
        if resources.is_empty() {
            return Err(AccessControlError::InvalidResource("empty resource list".to_string()));
        }
        has_valid_names(&resources, true)?;
        self.info.resource = trimmed(&resources);
        Ok(self)
    }

    /// Set the attributes for the next terminal action.
    pub fn attributes(mut self, attributes: impl IntoNames) -> Self {
        self.info.attributes = Some(attributes.into_names());
        self
    }

    /// Make the current roles extend `roles`.
    ///
    /// # Errors
    ///
    /// See [`hierarchy::extend`].
    pub fn extend(self, roles: impl IntoNames) -> AccessControlResult<Self> {
        let extenders = roles.into_names();
        let grants = self.control.grants_for_update()?;
        hierarchy::extend(grants, &self.info.role, &extenders)?;
        Ok(self)
    }

    /// Continue with a new grant builder on the same instance.
    pub fn grant(self, roles: impl IntoNames) -> AccessControlResult<Access<'a>> {
        Access::new(self.control, roles.into_names(), false)
    }

    /// Continue with a new deny builder on the same instance.
    pub fn deny(self, roles: impl IntoNames) -> AccessControlResult<Access<'a>> {
        Access::new(self.control, roles.into_names(), true)
    }

    /// Alias of [`grant`](Self::grant).
    pub fn allow(self, roles: impl IntoNames) -> AccessControlResult<Access<'a>> {
        self.grant(roles)
    }

    /// Alias of [`deny`](Self::deny).
    pub fn reject(self, roles: impl IntoNames) -> AccessControlResult<Access<'a>> {
        self.deny(roles)
    }

    /// Lock the underlying instance, ending the chain.
    pub fn lock(self) -> AccessControlResult<()> {
        self.control.lock()
    }

    fn commit_action(
        mut self,
        action: Action,
        possession: Possession,
        resource: impl IntoNames,
    ) -> AccessControlResult<Self> {
        let resources = resource.into_names();
        if !resources.is_empty() {
            self.info.resource = resources;
        }
        self.info.action = Some(action);
        self.info.possession = Some(possession);

        let grants = self.control.grants_for_update()?;
        let result = commit(grants, &self.info);
        self.info.attributes = None;
        result.map(|()| self)
    }

    /// Commit "create" on own resources. Pass `()` to reuse the current resource.
    pub fn create_own(self, resource: impl IntoNames) -> AccessControlResult<Self> {
        self.commit_action(Action::Create, Possession::Own, resource)
    }

    /// Commit "create" on any resource.
    pub fn create_any(self, resource: impl IntoNames) -> AccessControlResult<Self> {
        self.commit_action(Action::Create, Possession::Any, resource)
    }

    /// Alias of [`create_any`](Self::create_any).
    pub fn create(self, resource: impl IntoNames) -> AccessControlResult<Self> {
        self.create_any(resource)
    }

    /// Commit "read" on own resources.
    pub fn read_own(self, resource: impl IntoNames) -> AccessControlResult<Self> {
        self.commit_action(Action::Read, Possession::Own, resource)
    }

    /// Commit "read" on any resource.
    pub fn read_any(self, resource: impl IntoNames) -> AccessControlResult<Self> {
        self.commit_action(Action::Read, Possession::Any, resource)
    }

    /// Alias of [`read_any`](Self::read_any).
    pub fn read(self, resource: impl IntoNames) -> AccessControlResult<Self> {
        self.read_any(resource)
    }

    /// Commit "update" on own resources.
    pub fn update_own(self, resource: impl IntoNames) -> AccessControlResult<Self> {
        self.commit_action(Action::Update, Possession::Own, resource)
    }

    /// Commit "update" on any resource.
    pub fn update_any(self, resource: impl IntoNames) -> AccessControlResult<Self> {
        self.commit_action(Action::Update, Possession::Any, resource)
    }

    /// Alias of [`update_any`](Self::update_any).
    pub fn update(self, resource: impl IntoNames) -> AccessControlResult<Self> {
        self.update_any(resource)
    }

    /// Commit "delete" on own resources.
    pub fn delete_own(self, resource: impl IntoNames) -> AccessControlResult<Self> {
        self.commit_action(Action::Delete, Possession::Own, resource)
    }

    /// Commit "delete" on any resource.
    pub fn delete_any(self, resource: impl IntoNames) -> AccessControlResult<Self> {
        self.commit_action(Action::Delete, Possession::Any, resource)
    }

    /// Alias of [`delete_any`](Self::delete_any).
    pub fn delete(self, resource: impl IntoNames) -> AccessControlResult<Self> {
        self.delete_any(resource)
    }
}
