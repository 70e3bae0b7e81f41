//! Bulk grants import.
//!
//! Accepts the two JSON shapes a grants model is usually stored in:
//!
//! - **Object form**: `{ role: { resource: { "action:possession": [globs] }, "$extend": [roles] } }`
//! - **Flat list form**: `[{ role, resource, action, possession?, attributes? }, ...]`,
//!   typically rows loaded from a database.
//!
//! Both are validated completely before a [`Grants`] value is produced.

use serde_json::{Map, Value};
use tracing::debug;

use crate::access::{commit, AccessInfo};
use crate::actions::ActionPossession;
use crate::error::{AccessControlError, AccessControlResult};
use crate::grants::{Grants, ResourceRecord, RoleRecord};
use crate::hierarchy;
use crate::names::{to_string_array, validate_name, EXTEND_KEY};

/// Coarse classification of untyped input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// JSON object.
    Object,
    /// JSON array.
    Array,
    /// JSON string.
    String,
    /// Anything else (null, bool, number).
    Other,
}

impl Shape {
    /// Classify a JSON value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => Shape::Object,
            Value::Array(_) => Shape::Array,
            Value::String(_) => Shape::String,
            _ => Shape::Other,
        }
    }
}

/// Import grants from either supported shape.
///
/// # Errors
///
/// - `InvalidGrantsInput` when the value is neither an object nor an array,
///   or a list entry is not an object with `role`, `resource` and `action`
/// - Any validation error raised by the role, resource or extension checks
pub fn import_grants(value: &Value) -> AccessControlResult<Grants> {
    match value {
        Value::Object(map) => import_object(map),
        Value::Array(items) => import_list(items),
        other => Err(AccessControlError::InvalidGrantsInput(format!(
            "expected an object or an array, got {:?}",
            Shape::of(other)
        ))),
    }
}

fn import_object(map: &Map<String, Value>) -> AccessControlResult<Grants> {
    let mut grants = Grants::new();
    let mut pending: Vec<(String, Vec<String>)> = Vec::new();

    for (role, value) in map {
        validate_name(role, true)?;
        let mut record = validate_role_shape(role, value)?;
        let extends = record.take_extends();
        if !extends.is_empty() {
            pending.push((role.clone(), extends));
        }
        grants = grants.with_role(role.clone(), record);
    }

    // Extension targets may be declared after the role that extends them.
    for (role, extends) in pending {
        hierarchy::extend(&mut grants, std::slice::from_ref(&role), &extends)?;
    }

    debug!(roles = grants.len(), "Imported grants object");
    Ok(grants)
}

fn import_list(items: &[Value]) -> AccessControlResult<Grants> {
    let mut grants = Grants::new();
    for (index, item) in items.iter().enumerate() {
        let info = access_info_from_entry(index, item)?;
        commit(&mut grants, &info)?;
    }

    debug!(entries = items.len(), roles = grants.len(), "Imported grants list");
    Ok(grants)
}

/// Validate a role record and convert it.
///
/// Every key must be a valid resource name holding a valid resource record,
/// or `$extend` holding a list of non-empty role names (an empty list
/// extends nothing). The extension list is returned unchecked; the caller
/// registers it once all roles are known.
///
/// # Errors
///
/// - `InvalidRole` when the record is not an object or `$extend` is malformed
/// - `InvalidName` for any other reserved key
/// - Errors from [`validate_resource_shape`]
pub fn validate_role_shape(role: &str, value: &Value) -> AccessControlResult<RoleRecord> {
    let map = match value {
        Value::Object(map) => map,
        _ => {
            return Err(AccessControlError::InvalidRole(format!(
                "invalid definition for role \"{}\"",
                role
            )))
        }
    };

    let mut record = RoleRecord::new();
    for (key, value) in map {
        if validate_name(key, false)? {
            record = record.with_resource(key.clone(), validate_resource_shape(value)?);
        } else if key == EXTEND_KEY {
            let extends = filled_string_array(value).ok_or_else(|| {
                AccessControlError::InvalidRole(format!(
                    "invalid extend value for role \"{}\": {}",
                    role, value
                ))
            })?;
            record = record.with_extend(&extends);
        } else {
            return Err(AccessControlError::InvalidName(format!(
                "cannot use reserved name \"{}\" for a resource",
                key
            )));
        }
    }
    Ok(record)
}

/// Validate a resource record and convert it.
///
/// Keys must parse as `action[:possession]`; a bare action is stored as
/// `action:any`. Values must be arrays of non-empty strings, possibly empty.
///
/// # Errors
///
/// - `InvalidResource` when the record is not an object or a value is not
///   a valid attribute list
/// - `InvalidAction` / `InvalidPossession` for malformed keys
pub fn validate_resource_shape(value: &Value) -> AccessControlResult<ResourceRecord> {
    let map = match value {
        Value::Object(map) => map,
        _ => {
            return Err(AccessControlError::InvalidResource(
                "invalid resource definition".to_string(),
            ))
        }
    };

    let mut record = ResourceRecord::new();
    for (key, attributes) in map {
        let action_possession: ActionPossession = key.parse()?;
        let attributes = filled_string_array(attributes).ok_or_else(|| {
            AccessControlError::InvalidResource(format!(
                "invalid attributes for action \"{}\"",
                key
            ))
        })?;
        record.insert(action_possession, attributes);
    }
    Ok(record)
}

/// Check a grants value built in code: names, extension targets and cycles.
pub(crate) fn validate_grants(grants: &Grants) -> AccessControlResult<()> {
    for (role, record) in grants.iter() {
        validate_name(role, true)?;
        for resource in record.resources().keys() {
            validate_name(resource, true)?;
        }
    }
    for role in grants.roles() {
        hierarchy::hierarchy_of(grants, &role)?;
    }
    Ok(())
}

/// Convert one flat list entry into an [`AccessInfo`].
fn access_info_from_entry(index: usize, item: &Value) -> AccessControlResult<AccessInfo> {
    let map = match item {
        Value::Object(map) => map,
        other => {
            return Err(AccessControlError::InvalidGrantsInput(format!(
                "entry {} is not an object ({:?})",
                index,
                Shape::of(other)
            )))
        }
    };

    let roles = names_from_value(required(map, index, "role")?)
        .ok_or_else(|| AccessControlError::InvalidRole(field_text(map, "role")))?;
    let resources = names_from_value(required(map, index, "resource")?)
        .ok_or_else(|| AccessControlError::InvalidResource(field_text(map, "resource")))?;

    let action = match required(map, index, "action")? {
        Value::String(action) => action.as_str(),
        other => return Err(AccessControlError::InvalidAction(other.to_string())),
    };
    let possession = match map.get("possession") {
        Some(Value::String(possession)) => Some(possession.as_str()),
        Some(Value::Null) | None => None,
        Some(other) => return Err(AccessControlError::InvalidPossession(other.to_string())),
    };
    let key = ActionPossession::resolve(action, possession)?;

    let attributes = match map.get("attributes") {
        Some(Value::Null) | None => None,
        Some(value) => Some(names_from_value(value).ok_or_else(|| {
            AccessControlError::InvalidGrantsInput(format!(
                "entry {} has invalid attributes: {}",
                index, value
            ))
        })?),
    };
    let denied = map.get("denied").and_then(Value::as_bool).unwrap_or(false);

    let mut info = AccessInfo::new()
        .with_role(roles)
        .with_resource(resources)
        .with_action(key.action)
        .with_possession(key.possession);
    if let Some(attributes) = attributes {
        info = info.with_attributes(attributes);
    }
    Ok(info.with_denied(denied))
}

fn required<'a>(map: &'a Map<String, Value>, index: usize, name: &str) -> AccessControlResult<&'a Value> {
    match map.get(name) {
        Some(Value::Null) | None => Err(AccessControlError::InvalidGrantsInput(format!(
            "entry {} is missing \"{}\"",
            index, name
        ))),
        Some(value) => Ok(value),
    }
}

/// Names from a separated string or an array of strings.
fn names_from_value(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(names) => Some(to_string_array(names)),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

/// An array whose entries are all non-blank strings. An empty array passes.
fn filled_string_array(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| match item.as_str() {
            Some(s) if !s.trim().is_empty() => Some(s.to_string()),
            _ => None,
        })
        .collect()
}

fn field_text(map: &Map<String, Value>, name: &str) -> String {
    map.get(name).map(Value::to_string).unwrap_or_default()
}
