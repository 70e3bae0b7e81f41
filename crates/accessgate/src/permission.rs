//! Permission results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::actions::{Action, Possession};

/// Result of a permission query.
///
/// Holds whether access is granted and which attributes of the resource
/// are visible. A permission is granted exactly when its attribute list is
/// non-empty.
///
/// # Example
///
/// ```
/// use accessgate::AccessControl;
/// use serde_json::json;
///
/// let mut ac = AccessControl::new();
/// ac.grant("user")?.attributes(["*", "!password"]).read_any("account")?;
///
/// let permission = ac.can("user").read_any("account")?;
/// assert!(permission.granted());
///
/// let account = json!({ "name": "ada", "password": "secret" });
/// assert_eq!(permission.filter(&account), json!({ "name": "ada" }));
/// # Ok::<(), accessgate::AccessControlError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    granted: bool,
    attributes: Vec<String>,
    roles: Vec<String>,
    resource: String,
    action: Action,
    possession: Possession,
}

impl Permission {
    pub(crate) fn new(
        attributes: Vec<String>,
        roles: Vec<String>,
        resource: String,
        action: Action,
        possession: Possession,
    ) -> Self {
        Self {
            granted: !attributes.is_empty(),
            attributes,
            roles,
            resource,
            action,
            possession,
        }
    }

    /// Check if access is granted.
    pub fn granted(&self) -> bool {
        self.granted
    }

    /// Attribute globs granted, unioned across the role hierarchy.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Roles the query was made for.
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Queried resource.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Queried action.
    pub fn action(&self) -> Action {
        self.action
    }

    /// Queried possession.
    pub fn possession(&self) -> Possession {
        self.possession
    }

    /// Filter data down to the granted attributes.
    ///
    /// Arrays are filtered element by element. A denied permission yields
    /// `{}` for an object.
    pub fn filter(&self, data: &Value) -> Value {
        accessgate_notation::filter(data, &self.attributes)
    }

    /// Filter every item by the granted attributes.
    pub fn filter_all(&self, items: &[Value]) -> Vec<Value> {
        accessgate_notation::filter_all(items, &self.attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn permission(attributes: &[&str]) -> Permission {
        Permission::new(
            attributes.iter().map(|a| a.to_string()).collect(),
            vec!["user".to_string()],
            "account".to_string(),
            Action::Read,
            Possession::Any,
        )
    }

    #[test]
    fn test_granted_follows_attributes() {
        assert!(permission(&["*"]).granted());
        assert!(!permission(&[]).granted());
    }

    #[test]
    fn test_accessors() {
        let p = permission(&["name"]);
        assert_eq!(p.roles(), &["user".to_string()]);
        assert_eq!(p.resource(), "account");
        assert_eq!(p.action(), Action::Read);
        assert_eq!(p.possession(), Possession::Any);
    }

    #[test]
    fn test_filter() {
        let p = permission(&["*", "!account.id"]);
        let data = json!({ "name": "x", "account": { "id": 1, "plan": "pro" } });
        assert_eq!(p.filter(&data), json!({ "name": "x", "account": { "plan": "pro" } }));

        let items = vec![json!({ "name": "a", "age": 1 }), json!({ "name": "b", "age": 2 })];
        let names = permission(&["name"]).filter_all(&items);
        assert_eq!(names, vec![json!({ "name": "a" }), json!({ "name": "b" })]);
    }

    #[test]
    fn test_denied_filter_is_empty() {
        let data = json!({ "name": "x" });
        assert_eq!(permission(&[]).filter(&data), json!({}));
    }

    #[test]
    fn test_serialize() {
        let value = serde_json::to_value(permission(&["*"])).unwrap();
        assert_eq!(value["granted"], json!(true));
        assert_eq!(value["action"], json!("read"));
        assert_eq!(value["possession"], json!("any"));
    }
}
