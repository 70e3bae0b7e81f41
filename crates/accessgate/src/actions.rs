//! # Actions
//!
//! Defines the actions that can be performed on resources and the
//! possession scope they apply to. Together they form the
//! `"action:possession"` keys of a resource record, e.g. `"read:own"`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AccessControlError, AccessControlResult};

/// Actions that can be performed on resources.
///
/// - **Create**: Create new resource instances
/// - **Read**: View/access resource data
/// - **Update**: Modify existing resource data
/// - **Delete**: Remove resource instances
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Create new resource.
    Create,

    /// Read/view resource.
    Read,

    /// Update existing resource.
    Update,

    /// Delete resource.
    Delete,
}

impl Action {
    /// Get the string representation of the action.
    ///
    /// # Returns
    ///
    /// A static string representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    /// Parse action from string representation.
    ///
    /// # Arguments
    ///
    /// * `s` - String to parse (case-insensitive, surrounding whitespace ignored)
    ///
    /// # Returns
    ///
    /// `Some(Action)` if valid, `None` otherwise
    ///
    /// # Example
    ///
    /// ```
    /// use accessgate::actions::Action;
    ///
    /// assert_eq!(Action::parse("read"), Some(Action::Read));
    /// assert_eq!(Action::parse(" UPDATE "), Some(Action::Update));
    /// assert_eq!(Action::parse("put"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "create" => Some(Action::Create),
            "read" => Some(Action::Read),
            "update" => Some(Action::Update),
            "delete" => Some(Action::Delete),
            _ => None,
        }
    }

    /// Get all actions.
    pub fn all() -> Vec<Self> {
        vec![Action::Create, Action::Read, Action::Update, Action::Delete]
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scope of an action: the caller's own data, or any data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Possession {
    /// Only resources owned by the caller.
    Own,

    /// Any resource.
    #[default]
    Any,
}

impl Possession {
    /// Get the string representation of the possession.
    pub fn as_str(&self) -> &'static str {
        match self {
            Possession::Own => "own",
            Possession::Any => "any",
        }
    }

    /// Parse possession from string representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "own" => Some(Possession::Own),
            "any" => Some(Possession::Any),
            _ => None,
        }
    }

    /// Get all possessions.
    pub fn all() -> Vec<Self> {
        vec![Possession::Own, Possession::Any]
    }
}

impl fmt::Display for Possession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of a resource record: an action together with its possession.
///
/// Serialized as `"action:possession"`.
///
/// # Example
///
/// ```
/// use accessgate::actions::{Action, ActionPossession, Possession};
///
/// let key: ActionPossession = "read:own".parse().unwrap();
/// assert_eq!(key, ActionPossession::new(Action::Read, Possession::Own));
/// assert_eq!(key.to_string(), "read:own");
///
/// // Possession defaults to `any`
/// let key: ActionPossession = "update".parse().unwrap();
/// assert_eq!(key.to_string(), "update:any");
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ActionPossession {
    /// The action.
    pub action: Action,
    /// The possession scope.
    pub possession: Possession,
}

impl ActionPossession {
    /// Create a new key.
    pub fn new(action: Action, possession: Possession) -> Self {
        Self { action, possession }
    }

    /// Same action, scoped to `any`. Used as the lookup fallback for
    /// `own` queries.
    pub fn as_any(&self) -> Self {
        Self::new(self.action, Possession::Any)
    }

    /// Resolve an action string (optionally carrying `:possession`) and an
    /// explicit possession. The explicit possession wins over the suffix;
    /// without either, possession is `any`.
    ///
    /// # Errors
    ///
    /// `InvalidAction` for an unknown action, `InvalidPossession` for an
    /// unknown possession.
    pub fn resolve(action: &str, possession: Option<&str>) -> AccessControlResult<Self> {
        let mut parts = action.splitn(2, ':');
        let action_part = parts.next().unwrap_or_default();
        let suffix = parts.next();

        let parsed_action = Action::parse(action_part)
            .ok_or_else(|| AccessControlError::InvalidAction(action_part.trim().to_string()))?;

        let requested = possession
            .filter(|p| !p.trim().is_empty())
            .or(suffix.filter(|p| !p.trim().is_empty()));

        let parsed_possession = match requested {
            Some(p) => Possession::parse(p)
                .ok_or_else(|| AccessControlError::InvalidPossession(p.trim().to_string()))?,
            None => Possession::Any,
        };

        Ok(Self::new(parsed_action, parsed_possession))
    }
}

impl fmt::Display for ActionPossession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.action, self.possession)
    }
}

impl FromStr for ActionPossession {
    type Err = AccessControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s, None)
    }
}

impl TryFrom<String> for ActionPossession {
    type Error = AccessControlError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ActionPossession> for String {
    fn from(key: ActionPossession) -> Self {
        key.to_string()
    }
}
