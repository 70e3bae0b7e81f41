//! Role and resource name handling.
//!
//! Names arrive either as a single comma/semicolon separated string
//! (`"user, admin"`) or as a list. [`IntoNames`] accepts both so that the
//! builder and query APIs read naturally from Rust.

use crate::error::{AccessControlError, AccessControlResult};

/// Names that cannot be used for roles or resources.
pub const RESERVED_KEYWORDS: [&str; 4] = ["*", "!", "$", "$extend"];

/// Key of the extension list inside a serialized role record.
pub const EXTEND_KEY: &str = "$extend";

/// Split a comma or semicolon separated string into trimmed names.
///
/// Empty segments are kept so that validation can reject them.
///
/// # Example
///
/// ```
/// use accessgate::names::to_string_array;
///
/// assert_eq!(to_string_array(" user ; admin,editor "), vec!["user", "admin", "editor"]);
/// assert_eq!(to_string_array("a,,b"), vec!["a", "", "b"]);
/// ```
pub fn to_string_array(value: &str) -> Vec<String> {
    value
        .trim()
        .split([',', ';'])
        .map(|name| name.trim().to_string())
        .collect()
}

/// Validate a single role or resource name.
///
/// # Arguments
///
/// * `name` - Name to check
/// * `throw_on_invalid` - Return an error instead of `Ok(false)`
///
/// # Errors
///
/// `InvalidName` when the name is blank or reserved and
/// `throw_on_invalid` is set.
pub fn validate_name(name: &str, throw_on_invalid: bool) -> AccessControlResult<bool> {
    let problem = if name.trim().is_empty() {
        Some("expected a non-empty string".to_string())
    } else if RESERVED_KEYWORDS.contains(&name.trim()) {
        Some(format!("cannot use reserved name \"{}\"", name))
    } else {
        None
    };

    match problem {
        None => Ok(true),
        Some(message) if throw_on_invalid => Err(AccessControlError::InvalidName(message)),
        Some(_) => Ok(false),
    }
}

/// Validate every name in a list. Stops at the first invalid name.
pub fn has_valid_names<S: AsRef<str>>(names: &[S], throw_on_invalid: bool) -> AccessControlResult<bool> {
    for name in names {
        if !validate_name(name.as_ref(), throw_on_invalid)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Check that every entry is a non-blank string.
pub(crate) fn is_filled(names: &[String]) -> bool {
    names.iter().all(|name| !name.trim().is_empty())
}

/// Append `item` unless already present.
pub(crate) fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

/// Concatenate `extra` onto `list`, skipping duplicates.
pub(crate) fn extend_unique<S: AsRef<str>>(list: &mut Vec<String>, extra: &[S]) {
    for item in extra {
        push_unique(list, item.as_ref());
    }
}

/// Conversion into a list of role or resource names.
///
/// Strings are split with [`to_string_array`]; lists are taken as-is. The
/// unit value `()` means "no names", which the builder treats as "keep the
/// current selection".
pub trait IntoNames {
    /// Convert into names.
    fn into_names(self) -> Vec<String>;
}

impl IntoNames for () {
    fn into_names(self) -> Vec<String> {
        Vec::new()
    }
}

impl IntoNames for &str {
    fn into_names(self) -> Vec<String> {
        to_string_array(self)
    }
}

impl IntoNames for String {
    fn into_names(self) -> Vec<String> {
        to_string_array(&self)
    }
}

impl IntoNames for &String {
    fn into_names(self) -> Vec<String> {
        to_string_array(self)
    }
}

impl<S: AsRef<str>> IntoNames for Vec<S> {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|name| name.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>> IntoNames for &Vec<S> {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|name| name.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>> IntoNames for &[S] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|name| name.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>, const N: usize> IntoNames for [S; N] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|name| name.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>, const N: usize> IntoNames for &[S; N] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|name| name.as_ref().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_string_array() {
        assert_eq!(to_string_array("user"), vec!["user"]);
        assert_eq!(to_string_array("a;b , c"), vec!["a", "b", "c"]);
        assert_eq!(to_string_array(""), vec![""]);
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("user", true), Ok(true));
        assert_eq!(validate_name("", false), Ok(false));
        assert_eq!(validate_name("$extend", false), Ok(false));
        assert!(matches!(
            validate_name("*", true),
            Err(AccessControlError::InvalidName(_))
        ));
        assert!(matches!(
            validate_name("   ", true),
            Err(AccessControlError::InvalidName(_))
        ));
    }

    #[test]
    fn test_has_valid_names() {
        assert_eq!(has_valid_names(&["user", "admin"], true), Ok(true));
        assert_eq!(has_valid_names(&["user", "!"], false), Ok(false));
        assert!(has_valid_names(&["user", "$"], true).is_err());
    }

    #[test]
    fn test_into_names() {
        assert_eq!("a, b".into_names(), vec!["a", "b"]);
        assert_eq!(vec!["a, b"].into_names(), vec!["a, b"]);
        assert_eq!(["x", "y"].into_names(), vec!["x", "y"]);
        assert!(().into_names().is_empty());

        let owned = vec!["user".to_string()];
        assert_eq!((&owned).into_names(), vec!["user"]);
    }

    #[test]
    fn test_extend_unique() {
        let mut list = vec!["admin".to_string()];
        extend_unique(&mut list, &["user", "admin", "viewer"]);
        assert_eq!(list, vec!["admin", "user", "viewer"]);
    }
}
