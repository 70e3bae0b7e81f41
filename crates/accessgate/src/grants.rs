//! # Grants model
//!
//! The canonical state of an access control instance:
//!
//! ```text
//! Grants
//!   └── role ── RoleRecord
//!                 ├── $extend: [role, ...]
//!                 └── resource ── ResourceRecord
//!                                   └── "action:possession" ── [attribute glob, ...]
//! ```
//!
//! All maps preserve insertion order. Records can be assembled by hand and
//! passed to [`AccessControl::from_grants`](crate::AccessControl::from_grants),
//! which validates names and the extension graph before accepting them.

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::actions::ActionPossession;
use crate::names::{extend_unique, EXTEND_KEY};

/// Attribute lists keyed by `"action:possession"`.
pub type ResourceRecord = IndexMap<ActionPossession, Vec<String>>;

/// Resources granted to a single role, plus the roles it extends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleRecord {
    resources: IndexMap<String, ResourceRecord>,
    extend: Vec<String>,
}

impl RoleRecord {
    /// Create an empty role record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource record.
    pub fn with_resource(mut self, name: impl Into<String>, record: ResourceRecord) -> Self {
        self.resources.insert(name.into(), record);
        self
    }

    /// Add roles to extend, skipping duplicates.
    pub fn with_extend<S: AsRef<str>>(mut self, roles: &[S]) -> Self {
        extend_unique(&mut self.extend, roles);
        self
    }

    /// Resources of this role, in insertion order.
    pub fn resources(&self) -> &IndexMap<String, ResourceRecord> {
        &self.resources
    }

    /// Look up a single resource.
    pub fn resource(&self, name: &str) -> Option<&ResourceRecord> {
        self.resources.get(name)
    }

    /// Roles this role directly extends.
    pub fn extends(&self) -> &[String] {
        &self.extend
    }

    /// Check if the role has no resources and extends nothing.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.extend.is_empty()
    }

    pub(crate) fn resource_mut(&mut self, name: &str) -> &mut ResourceRecord {
        self.resources.entry(name.to_string()).or_default()
    }

    pub(crate) fn existing_resource_mut(&mut self, name: &str) -> Option<&mut ResourceRecord> {
        self.resources.get_mut(name)
    }

    pub(crate) fn remove_resource(&mut self, name: &str) -> Option<ResourceRecord> {
        self.resources.shift_remove(name)
    }

    pub(crate) fn add_extends<S: AsRef<str>>(&mut self, roles: &[S]) {
        extend_unique(&mut self.extend, roles);
    }

    pub(crate) fn drop_extends(&mut self, roles: &[String]) {
        self.extend.retain(|role| !roles.contains(role));
    }

    pub(crate) fn take_extends(&mut self) -> Vec<String> {
        std::mem::take(&mut self.extend)
    }

    /// Render as a JSON object, `$extend` first when present.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

impl Serialize for RoleRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extend_len = usize::from(!self.extend.is_empty());
        let mut map = serializer.serialize_map(Some(self.resources.len() + extend_len))?;
        if !self.extend.is_empty() {
            map.serialize_entry(EXTEND_KEY, &self.extend)?;
        }
        for (resource, record) in &self.resources {
            map.serialize_entry(resource, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RoleRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        crate::import::validate_role_shape("role", &value).map_err(D::Error::custom)
    }
}

/// Ordered mapping of role name to [`RoleRecord`].
///
/// # Example
///
/// ```
/// use accessgate::actions::{Action, ActionPossession, Possession};
/// use accessgate::grants::{Grants, ResourceRecord, RoleRecord};
///
/// let mut video = ResourceRecord::new();
/// video.insert(ActionPossession::new(Action::Read, Possession::Any), vec!["*".to_string()]);
///
/// let grants = Grants::new()
///     .with_role("viewer", RoleRecord::new().with_resource("video", video))
///     .with_role("user", RoleRecord::new().with_extend(&["viewer"]));
///
/// assert_eq!(grants.roles(), vec!["viewer", "user"]);
/// assert_eq!(grants.resources(), vec!["video"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grants {
    roles: IndexMap<String, RoleRecord>,
}

impl Grants {
    /// Create empty grants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a role record.
    pub fn with_role(mut self, name: impl Into<String>, record: RoleRecord) -> Self {
        self.roles.insert(name.into(), record);
        self
    }

    /// Check if no roles are defined.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Number of roles.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Role names in insertion order.
    pub fn roles(&self) -> Vec<String> {
        self.roles.keys().cloned().collect()
    }

    /// Look up a role record.
    pub fn role(&self, name: &str) -> Option<&RoleRecord> {
        self.roles.get(name)
    }

    /// Check if a role exists.
    pub fn contains_role(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    /// Iterate over roles and their records.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &RoleRecord)> {
        self.roles.iter()
    }

    /// Every resource referenced by any role, first occurrence order.
    pub fn resources(&self) -> Vec<String> {
        let mut resources = Vec::new();
        for record in self.roles.values() {
            let names: Vec<&String> = record.resources.keys().collect();
            extend_unique(&mut resources, &names);
        }
        resources
    }

    /// Attribute list stored for an exact role/resource/key triple.
    pub fn attributes(&self, role: &str, resource: &str, key: &ActionPossession) -> Option<&[String]> {
        self.role(role)
            .and_then(|record| record.resource(resource))
            .and_then(|record| record.get(key))
            .map(Vec::as_slice)
    }

    /// Render the canonical object form.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    pub(crate) fn role_mut(&mut self, name: &str) -> Option<&mut RoleRecord> {
        self.roles.get_mut(name)
    }

    pub(crate) fn roles_mut(&mut self) -> impl Iterator<Item = (&String, &mut RoleRecord)> {
        self.roles.iter_mut()
    }

    /// Get a role record, creating an empty one if missing.
    pub(crate) fn ensure_role(&mut self, name: &str) -> &mut RoleRecord {
        self.roles.entry(name.to_string()).or_default()
    }

    pub(crate) fn remove_role(&mut self, name: &str) -> Option<RoleRecord> {
        self.roles.shift_remove(name)
    }
}

impl Serialize for Grants {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.roles.len()))?;
        for (name, record) in &self.roles {
            map.serialize_entry(name, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Grants {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        crate::import::import_grants(&value).map_err(D::Error::custom)
    }
}

impl TryFrom<Value> for Grants {
    type Error = crate::error::AccessControlError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        crate::import::import_grants(&value)
    }
}

impl TryFrom<&Value> for Grants {
    type Error = crate::error::AccessControlError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        crate::import::import_grants(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Action, Possession};
    use serde_json::json;

    fn key(action: Action, possession: Possession) -> ActionPossession {
        ActionPossession::new(action, possession)
    }

    fn sample() -> Grants {
        let mut account = ResourceRecord::new();
        account.insert(key(Action::Read, Possession::Own), vec!["*".to_string()]);

        let mut video = ResourceRecord::new();
        video.insert(key(Action::Update, Possession::Any), vec!["*".to_string(), "!id".to_string()]);

        Grants::new()
            .with_role("viewer", RoleRecord::new().with_resource("account", account))
            .with_role(
                "user",
                RoleRecord::new()
                    .with_extend(&["viewer"])
                    .with_resource("video", video),
            )
    }

    #[test]
    fn test_roles_and_resources() {
        let grants = sample();
        assert_eq!(grants.len(), 2);
        assert_eq!(grants.roles(), vec!["viewer", "user"]);
        assert_eq!(grants.resources(), vec!["account", "video"]);
        assert!(grants.contains_role("user"));
        assert!(!grants.contains_role("admin"));
    }

    #[test]
    fn test_attributes_lookup() {
        let grants = sample();
        assert_eq!(
            grants.attributes("user", "video", &key(Action::Update, Possession::Any)),
            Some(&["*".to_string(), "!id".to_string()][..])
        );
        assert_eq!(
            grants.attributes("user", "video", &key(Action::Update, Possession::Own)),
            None
        );
    }

    #[test]
    fn test_to_value_puts_extend_first() {
        let value = sample().to_value();
        assert_eq!(
            value,
            json!({
                "viewer": { "account": { "read:own": ["*"] } },
                "user": { "$extend": ["viewer"], "video": { "update:any": ["*", "!id"] } }
            })
        );

        let user_keys: Vec<&String> = value["user"].as_object().unwrap().keys().collect();
        assert_eq!(user_keys, vec!["$extend", "video"]);
    }

    #[test]
    fn test_serialize_matches_to_value() {
        let grants = sample();
        assert_eq!(serde_json::to_value(&grants).unwrap(), grants.to_value());

        let user = grants.role("user").unwrap().to_value();
        assert_eq!(user, grants.to_value()["user"]);
        assert_eq!(user.as_object().unwrap().keys().next().unwrap(), "$extend");
    }

    #[test]
    fn test_deserialize_through_importer() {
        let grants: Grants = serde_json::from_value(json!({
            "viewer": { "account": { "read:own": ["*"] } },
            "user": { "$extend": ["viewer"], "video": { "update:any": ["*", "!id"] } }
        }))
        .unwrap();
        assert_eq!(grants, sample());

        let invalid = serde_json::from_value::<Grants>(json!({ "user": { "$extend": ["ghost"] } }));
        assert!(invalid.is_err());
    }

    #[test]
    fn test_remove_role_keeps_order() {
        let mut grants = sample().with_role("admin", RoleRecord::new());
        grants.remove_role("viewer");
        assert_eq!(grants.roles(), vec!["user", "admin"]);
    }
}
