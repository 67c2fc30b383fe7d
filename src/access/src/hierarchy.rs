//! Role hierarchy resolution
//!
//! Roles form a strict DAG through their `$extend` lists. This module:
//! 1. Flattens a role (or a set of roles) into every role it inherits from
//! 2. Detects self-extension and cross inheritance before an edge is committed
//! 3. Commits new extend edges

use crate::error::{AccessError, Result};
use crate::grants::Grants;
use crate::types::validate_names;
use tracing::debug;

/// Read-only view over the inheritance edges of a grants model
///
/// # Example
///
/// ```
/// use cretoai_access::grants::{Grants, RoleGrants};
/// use cretoai_access::hierarchy::RoleHierarchy;
///
/// let mut grants = Grants::new();
/// grants.insert("user".into(), RoleGrants::new());
/// grants.insert("editor".into(), RoleGrants::new().with_extends(vec!["user".into()]));
/// grants.insert("admin".into(), RoleGrants::new().with_extends(vec!["editor".into()]));
///
/// let hierarchy = RoleHierarchy::new(&grants);
/// assert_eq!(hierarchy.hierarchy_of("admin").unwrap(), vec!["admin", "editor", "user"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RoleHierarchy<'a> {
    grants: &'a Grants,
}

impl<'a> RoleHierarchy<'a> {
    pub fn new(grants: &'a Grants) -> Self {
        Self { grants }
    }

    /// `role` followed by every role it (transitively) extends, each once,
    /// in first-seen order.
    ///
    /// # Errors
    ///
    /// - `RoleNotFound` if `role` or any extended role does not exist
    /// - `SelfExtension` if a role lists itself
    /// - `CrossInheritance` if the extend edges loop back on the current path
    pub fn hierarchy_of(&self, role: &str) -> Result<Vec<String>> {
        let mut flat = Vec::new();
        let mut path = Vec::new();
        self.collect(role, &mut path, &mut flat)?;
        Ok(flat)
    }

    /// Depth-first walk; `path` holds the roles currently being expanded
    fn collect(&self, role: &str, path: &mut Vec<String>, flat: &mut Vec<String>) -> Result<()> {
        let entry = self
            .grants
            .get(role)
            .ok_or_else(|| AccessError::RoleNotFound(format!("\"{}\"", role)))?;

        if !flat.iter().any(|r| r == role) {
            flat.push(role.to_string());
        }

        path.push(role.to_string());
        for extended in &entry.extends {
            if extended == role {
                return Err(AccessError::SelfExtension(role.to_string()));
            }
            if path.iter().any(|r| r == extended) {
                return Err(AccessError::CrossInheritance {
                    role: role.to_string(),
                    extender: extended.clone(),
                });
            }
            if flat.iter().any(|r| r == extended) {
                continue;
            }
            self.collect(extended, path, flat)?;
        }
        path.pop();

        Ok(())
    }

    /// Union (first-seen order) of the hierarchies of every given role
    pub fn flatten_roles(&self, roles: &[String]) -> Result<Vec<String>> {
        if roles.is_empty() {
            return Err(AccessError::InvalidName(format!(
                "Invalid role(s): {:?}",
                roles
            )));
        }

        let mut flat: Vec<String> = Vec::new();
        for role in roles {
            for inherited in self.hierarchy_of(role)? {
                if !flat.contains(&inherited) {
                    flat.push(inherited);
                }
            }
        }
        Ok(flat)
    }

    /// Every role `role` inherits from, without `role` itself
    pub fn inherited_roles_of(&self, role: &str) -> Result<Vec<String>> {
        let mut roles = self.hierarchy_of(role)?;
        roles.remove(0);
        Ok(roles)
    }

    /// Names from `roles` that are not defined
    pub fn non_existent_roles(&self, roles: &[String]) -> Vec<String> {
        roles
            .iter()
            .filter(|r| !self.grants.contains_key(r.as_str()))
            .cloned()
            .collect()
    }

    /// First candidate extender whose hierarchy already contains `role`.
    /// Adding the edge `role -> candidate` would then close a cycle.
    pub fn cross_extending_role(&self, role: &str, extenders: &[String]) -> Result<Option<String>> {
        for extender in extenders {
            if !self.grants.contains_key(extender) {
                continue;
            }
            if self.hierarchy_of(extender)?.iter().any(|r| r == role) {
                return Ok(Some(extender.clone()));
            }
        }
        Ok(None)
    }
}

/// Make every role of `roles` extend `extenders`.
///
/// Every check runs before any edge is written, so a failed call leaves
/// `grants` untouched. With `replace` the extend list is overwritten instead
/// of merged. Roles must already exist; an empty `extenders` is a no-op.
pub fn extend_role(
    grants: &mut Grants,
    roles: &[String],
    extenders: &[String],
    replace: bool,
) -> Result<()> {
    validate_names("role", roles)?;
    if extenders.is_empty() {
        return Ok(());
    }
    validate_names("role", extenders)?;

    let hierarchy = RoleHierarchy::new(grants);
    let missing = hierarchy.non_existent_roles(extenders);
    if !missing.is_empty() {
        return Err(AccessError::RoleNotFound(format!(
            "Cannot inherit non-existent role(s): \"{}\"",
            missing.join(", ")
        )));
    }

    for role in roles {
        if !grants.contains_key(role) {
            return Err(AccessError::RoleNotFound(format!("\"{}\"", role)));
        }
        if extenders.contains(role) {
            return Err(AccessError::SelfExtension(role.clone()));
        }
        if let Some(extender) = hierarchy.cross_extending_role(role, extenders)? {
            return Err(AccessError::CrossInheritance {
                role: role.clone(),
                extender,
            });
        }
    }

    for role in roles {
        let Some(entry) = grants.get_mut(role) else {
            continue;
        };
        if replace {
            entry.extends.clear();
        }
        for extender in extenders {
            if !entry.extends.contains(extender) {
                entry.extends.push(extender.clone());
            }
        }
        debug!(role = %role, extends = ?entry.extends, "Extended role");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grants::RoleGrants;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn grants_with(roles: &[(&str, &[&str])]) -> Grants {
        roles
            .iter()
            .map(|(name, extends)| {
                (
                    name.to_string(),
                    RoleGrants::new().with_extends(names(extends)),
                )
            })
            .collect()
    }

    #[test]
    fn test_single_role() {
        let grants = grants_with(&[("user", &[])]);
        let hierarchy = RoleHierarchy::new(&grants);
        assert_eq!(hierarchy.hierarchy_of("user").unwrap(), vec!["user"]);
        assert!(hierarchy.inherited_roles_of("user").unwrap().is_empty());
    }

    #[test]
    fn test_linear_hierarchy() {
        let grants = grants_with(&[("a", &["b"]), ("b", &["c"]), ("c", &[])]);
        let hierarchy = RoleHierarchy::new(&grants);
        assert_eq!(hierarchy.hierarchy_of("a").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(hierarchy.inherited_roles_of("a").unwrap(), vec!["b", "c"]);
    }

    #[test]
    fn test_diamond_hierarchy_dedup() {
        // lead -> (manager, developer) -> employee
        let grants = grants_with(&[
            ("lead", &["manager", "developer"]),
            ("manager", &["employee"]),
            ("developer", &["employee"]),
            ("employee", &[]),
        ]);
        let hierarchy = RoleHierarchy::new(&grants);
        assert_eq!(
            hierarchy.hierarchy_of("lead").unwrap(),
            vec!["lead", "manager", "employee", "developer"]
        );
    }

    #[test]
    fn test_unknown_role() {
        let grants = grants_with(&[("a", &["ghost"])]);
        let hierarchy = RoleHierarchy::new(&grants);
        assert!(matches!(hierarchy.hierarchy_of("x"), Err(AccessError::RoleNotFound(_))));
        assert!(matches!(hierarchy.hierarchy_of("a"), Err(AccessError::RoleNotFound(_))));
    }

    #[test]
    fn test_cycle_detected_while_walking() {
        let grants = grants_with(&[("a", &["b"]), ("b", &["c"]), ("c", &["b"])]);
        let hierarchy = RoleHierarchy::new(&grants);
        assert!(matches!(
            hierarchy.hierarchy_of("a"),
            Err(AccessError::CrossInheritance { .. })
        ));

        let grants = grants_with(&[("a", &["a"])]);
        let hierarchy = RoleHierarchy::new(&grants);
        assert!(matches!(hierarchy.hierarchy_of("a"), Err(AccessError::SelfExtension(_))));
    }

    #[test]
    fn test_flatten_roles() {
        let grants = grants_with(&[("a", &["c"]), ("b", &["c"]), ("c", &[])]);
        let hierarchy = RoleHierarchy::new(&grants);
        assert_eq!(
            hierarchy.flatten_roles(&names(&["a", "b"])).unwrap(),
            vec!["a", "c", "b"]
        );
        assert!(hierarchy.flatten_roles(&[]).is_err());
    }

    #[test]
    fn test_extend_role() {
        let mut grants = grants_with(&[("a", &[]), ("b", &[]), ("c", &[])]);
        extend_role(&mut grants, &names(&["a"]), &names(&["b"]), false).unwrap();
        extend_role(&mut grants, &names(&["a"]), &names(&["c", "b"]), false).unwrap();
        assert_eq!(grants["a"].extends, vec!["b", "c"]);

        extend_role(&mut grants, &names(&["a"]), &names(&["c"]), true).unwrap();
        assert_eq!(grants["a"].extends, vec!["c"]);

        // Empty extender list is a no-op
        extend_role(&mut grants, &names(&["a"]), &[], false).unwrap();
        assert_eq!(grants["a"].extends, vec!["c"]);
    }

    #[test]
    fn test_extend_role_rejections() {
        let mut grants = grants_with(&[("a", &["b"]), ("b", &[])]);
        let before = grants.clone();

        let err = extend_role(&mut grants, &names(&["b"]), &names(&["a"]), false).unwrap_err();
        assert!(matches!(
            err,
            AccessError::CrossInheritance { ref role, ref extender } if role == "b" && extender == "a"
        ));
        assert!(matches!(
            extend_role(&mut grants, &names(&["a"]), &names(&["a"]), false),
            Err(AccessError::SelfExtension(_))
        ));
        assert!(matches!(
            extend_role(&mut grants, &names(&["a"]), &names(&["x", "y"]), false),
            Err(AccessError::RoleNotFound(ref msg)) if msg.contains("x, y")
        ));
        assert!(matches!(
            extend_role(&mut grants, &names(&["z"]), &names(&["b"]), false),
            Err(AccessError::RoleNotFound(_))
        ));

        assert_eq!(grants, before);
    }

    #[test]
    fn test_cross_extending_role() {
        let grants = grants_with(&[("a", &["b"]), ("b", &["c"]), ("c", &[]), ("d", &[])]);
        let hierarchy = RoleHierarchy::new(&grants);
        assert_eq!(
            hierarchy.cross_extending_role("c", &names(&["d", "a"])).unwrap(),
            Some("a".to_string())
        );
        assert_eq!(hierarchy.cross_extending_role("a", &names(&["d"])).unwrap(), None);
    }
}
