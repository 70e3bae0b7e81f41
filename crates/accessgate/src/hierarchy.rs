//! # Role hierarchy
//!
//! Resolves role inheritance over the `$extend` edges of a [`Grants`] model.
//!
//! The extension graph must stay acyclic. Every resolution walks the graph
//! depth-first while tracking the current path, so an edge back onto the
//! path is reported as cross inheritance instead of recursing forever:
//!
//! ```text
//! admin ──▶ editor ──▶ user
//!   ▲                   │
//!   └───── rejected ────┘   CrossInheritance { role: "user", extender: "admin" }
//! ```

use tracing::debug;

use crate::error::{AccessControlError, AccessControlResult};
use crate::grants::Grants;
use crate::names::{extend_unique, push_unique, validate_name};

/// Resolve a role and everything it transitively extends.
///
/// The result is duplicate-free, depth-first, and starts with `role`.
///
/// # Errors
///
/// - `RoleNotFound` if `role` or any extension target does not exist
/// - `SelfExtension` if a role lists itself
/// - `CrossInheritance` if an extension target is already on the
///   resolution path
///
/// # Example
///
/// ```
/// use accessgate::AccessControl;
///
/// let mut ac = AccessControl::new();
/// ac.grant("viewer")?.read_any("video")?;
/// ac.grant("user")?.extend("viewer")?;
/// ac.grant("admin")?.extend("user")?;
///
/// let roles = accessgate::hierarchy::hierarchy_of(ac.grants(), "admin")?;
/// assert_eq!(roles, vec!["admin", "user", "viewer"]);
/// # Ok::<(), accessgate::AccessControlError>(())
/// ```
pub fn hierarchy_of(grants: &Grants, role: &str) -> AccessControlResult<Vec<String>> {
    let mut path = Vec::new();
    let mut resolved = Vec::new();
    visit(grants, role, &mut path, &mut resolved)?;
    Ok(resolved)
}

fn visit(
    grants: &Grants,
    role: &str,
    path: &mut Vec<String>,
    resolved: &mut Vec<String>,
) -> AccessControlResult<()> {
    let record = grants
        .role(role)
        .ok_or_else(|| AccessControlError::RoleNotFound(role.to_string()))?;

    push_unique(resolved, role);
    path.push(role.to_string());

    for target in record.extends() {
        if !grants.contains_role(target) {
            return Err(AccessControlError::RoleNotFound(target.clone()));
        }
        if target == role {
            return Err(AccessControlError::SelfExtension(role.to_string()));
        }
        if path.contains(target) {
            return Err(AccessControlError::CrossInheritance {
                role: role.to_string(),
                extender: target.clone(),
            });
        }
        // Already fully resolved through another branch
        if resolved.contains(target) {
            continue;
        }
        visit(grants, target, path, resolved)?;
    }

    path.pop();
    Ok(())
}

/// Roles inherited by `role`, without `role` itself.
pub fn inherited_roles_of(grants: &Grants, role: &str) -> AccessControlResult<Vec<String>> {
    let mut roles = hierarchy_of(grants, role)?;
    roles.remove(0);
    Ok(roles)
}

/// Flatten a list of roles into the queried roles followed by everything
/// they inherit.
///
/// # Errors
///
/// `InvalidRole` if `roles` is empty, otherwise any error from
/// [`hierarchy_of`].
pub fn flatten<S: AsRef<str>>(grants: &Grants, roles: &[S]) -> AccessControlResult<Vec<String>> {
    if roles.is_empty() {
        return Err(AccessControlError::InvalidRole("empty role list".to_string()));
    }

    let mut flat = Vec::new();
    extend_unique(&mut flat, roles);
    for role in roles {
        let hierarchy = hierarchy_of(grants, role.as_ref())?;
        extend_unique(&mut flat, &hierarchy);
    }
    Ok(flat)
}

/// Make each of `roles` extend every role in `extenders`.
///
/// All checks run before any edge is added, so a failure leaves the grants
/// untouched. Extension lists stay duplicate-free and keep their order.
///
/// # Arguments
///
/// * `grants` - Grants to modify
/// * `roles` - Roles receiving the new extensions
/// * `extenders` - Roles to inherit from
///
/// # Errors
///
/// - `InvalidRole` if `roles` is empty
/// - `RoleNotFound` if any role or extender does not exist
/// - `SelfExtension` if a role is among its own extenders
/// - `CrossInheritance` if an extender already inherits the role
pub fn extend<R: AsRef<str>, E: AsRef<str>>(
    grants: &mut Grants,
    roles: &[R],
    extenders: &[E],
) -> AccessControlResult<()> {
    if roles.is_empty() {
        return Err(AccessControlError::InvalidRole("empty role list".to_string()));
    }
    if extenders.is_empty() {
        return Ok(());
    }

    if let Some(missing) = extenders
        .iter()
        .map(AsRef::as_ref)
        .find(|extender| !grants.contains_role(extender))
    {
        return Err(AccessControlError::RoleNotFound(missing.to_string()));
    }

    for role in roles.iter().map(AsRef::as_ref) {
        if !grants.contains_role(role) {
            return Err(AccessControlError::RoleNotFound(role.to_string()));
        }
        validate_name(role, true)?;
        if extenders.iter().any(|extender| extender.as_ref() == role) {
            return Err(AccessControlError::SelfExtension(role.to_string()));
        }
        for extender in extenders.iter().map(AsRef::as_ref) {
            if hierarchy_of(grants, extender)?.iter().any(|r| r == role) {
                return Err(AccessControlError::CrossInheritance {
                    role: role.to_string(),
                    extender: extender.to_string(),
                });
            }
        }
    }

    for role in roles.iter().map(AsRef::as_ref) {
        if let Some(record) = grants.role_mut(role) {
            record.add_extends(extenders);
        }
        debug!(role = %role, extends = ?extenders.iter().map(AsRef::as_ref).collect::<Vec<_>>(), "Extended role");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grants::RoleRecord;

    fn chain() -> Grants {
        // a extends b, b extends c
        Grants::new()
            .with_role("a", RoleRecord::new().with_extend(&["b"]))
            .with_role("b", RoleRecord::new().with_extend(&["c"]))
            .with_role("c", RoleRecord::new())
    }

    #[test]
    fn test_hierarchy_of_chain() {
        let grants = chain();
        assert_eq!(hierarchy_of(&grants, "a").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(hierarchy_of(&grants, "c").unwrap(), vec!["c"]);
        assert_eq!(inherited_roles_of(&grants, "a").unwrap(), vec!["b", "c"]);
        assert!(inherited_roles_of(&grants, "c").unwrap().is_empty());
    }

    #[test]
    fn test_hierarchy_of_diamond() {
        let grants = Grants::new()
            .with_role("top", RoleRecord::new().with_extend(&["left", "right"]))
            .with_role("left", RoleRecord::new().with_extend(&["base"]))
            .with_role("right", RoleRecord::new().with_extend(&["base"]))
            .with_role("base", RoleRecord::new());

        assert_eq!(
            hierarchy_of(&grants, "top").unwrap(),
            vec!["top", "left", "base", "right"]
        );
    }

    #[test]
    fn test_hierarchy_of_missing() {
        let grants = chain();
        assert_eq!(
            hierarchy_of(&grants, "ghost"),
            Err(AccessControlError::RoleNotFound("ghost".to_string()))
        );

        let grants = Grants::new().with_role("a", RoleRecord::new().with_extend(&["ghost"]));
        assert_eq!(
            hierarchy_of(&grants, "a"),
            Err(AccessControlError::RoleNotFound("ghost".to_string()))
        );
    }

    #[test]
    fn test_hierarchy_of_detects_cycles() {
        let grants = Grants::new()
            .with_role("a", RoleRecord::new().with_extend(&["b"]))
            .with_role("b", RoleRecord::new().with_extend(&["c"]))
            .with_role("c", RoleRecord::new().with_extend(&["a"]));

        assert!(matches!(
            hierarchy_of(&grants, "a"),
            Err(AccessControlError::CrossInheritance { .. })
        ));

        // The cycle does not pass through the queried root
        let grants = grants.with_role("entry", RoleRecord::new().with_extend(&["b"]));
        assert!(matches!(
            hierarchy_of(&grants, "entry"),
            Err(AccessControlError::CrossInheritance { .. })
        ));

        let grants = Grants::new().with_role("x", RoleRecord::new().with_extend(&["x"]));
        assert_eq!(
            hierarchy_of(&grants, "x"),
            Err(AccessControlError::SelfExtension("x".to_string()))
        );
    }

    #[test]
    fn test_flatten() {
        let grants = chain().with_role("d", RoleRecord::new());
        assert_eq!(flatten(&grants, &["d", "b"]).unwrap(), vec!["d", "b", "c"]);
        assert_eq!(flatten(&grants, &["b", "a"]).unwrap(), vec!["b", "a", "c"]);

        let empty: [&str; 0] = [];
        assert!(matches!(
            flatten(&grants, &empty),
            Err(AccessControlError::InvalidRole(_))
        ));
    }

    #[test]
    fn test_extend() {
        let mut grants = chain().with_role("d", RoleRecord::new());
        extend(&mut grants, &["d"], &["a", "c"]).unwrap();
        extend(&mut grants, &["d"], &["c", "b"]).unwrap();
        assert_eq!(grants.role("d").unwrap().extends(), &["a", "c", "b"]);

        let empty: [&str; 0] = [];
        extend(&mut grants, &["c"], &empty).unwrap();
        assert!(grants.role("c").unwrap().extends().is_empty());
    }

    #[test]
    fn test_extend_errors() {
        let mut grants = chain();
        let empty: [&str; 0] = [];

        assert!(matches!(
            extend(&mut grants, &empty, &["a"]),
            Err(AccessControlError::InvalidRole(_))
        ));
        assert_eq!(
            extend(&mut grants, &["c"], &["ghost"]),
            Err(AccessControlError::RoleNotFound("ghost".to_string()))
        );
        assert_eq!(
            extend(&mut grants, &["ghost"], &["c"]),
            Err(AccessControlError::RoleNotFound("ghost".to_string()))
        );
        assert_eq!(
            extend(&mut grants, &["c"], &["c"]),
            Err(AccessControlError::SelfExtension("c".to_string()))
        );
        assert_eq!(
            extend(&mut grants, &["c"], &["a"]),
            Err(AccessControlError::CrossInheritance {
                role: "c".to_string(),
                extender: "a".to_string(),
            })
        );
    }

    #[test]
    fn test_extend_is_atomic() {
        let mut grants = chain().with_role("d", RoleRecord::new());
        let before = grants.clone();

        // "d" is fine, "c" would close a cycle
        let result = extend(&mut grants, &["d", "c"], &["a"]);
        assert!(matches!(result, Err(AccessControlError::CrossInheritance { .. })));
        assert_eq!(grants, before);
    }
}
