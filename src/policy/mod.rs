//! Pure authorization decisions.
//!
//! Nothing in here touches the database or the request: callers resolve the
//! resource first (a missing resource is a NotFound, never a policy "deny")
//! and then ask these functions whether the principal may act on it.

use serde::{Deserialize, Serialize};

use crate::database::models::Role;

/// The authenticated identity making a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub username: String,
    pub role: Option<Role>,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }
}

/// May the principal edit or delete a resource owned by `resource_owner`?
/// Used uniformly for posts, comments, and profile operations.
pub fn can_mutate(principal: &Principal, resource_owner: &str) -> bool {
    principal.username == resource_owner || principal.is_admin()
}

/// May the principal create, edit, or delete groups?
pub fn can_manage_groups(principal: &Principal) -> bool {
    matches!(principal.role, Some(Role::Admin) | Some(Role::Tutor))
}

/// Filter describing which groups a principal may see. The registry turns
/// this into the corresponding query; policy itself stays storage-agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupScope {
    /// Admins see every group.
    All,
    /// Tutors see the groups they run.
    TutorOf(String),
    /// Students see the groups they are a member of.
    MemberOf(String),
    /// No role (or an unrecognized one) sees nothing.
    Nothing,
}

pub fn group_scope(principal: &Principal) -> GroupScope {
    match principal.role {
        Some(Role::Admin) => GroupScope::All,
        Some(Role::Tutor) => GroupScope::TutorOf(principal.username.clone()),
        Some(Role::Student) => GroupScope::MemberOf(principal.username.clone()),
        None => GroupScope::Nothing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(username: &str, role: Option<Role>) -> Principal {
        Principal {
            username: username.to_string(),
            role,
        }
    }

    #[test]
    fn owner_may_mutate_regardless_of_role() {
        assert!(can_mutate(&principal("alice", Some(Role::Student)), "alice"));
        assert!(can_mutate(&principal("alice", Some(Role::Tutor)), "alice"));
        assert!(can_mutate(&principal("alice", None), "alice"));
    }

    #[test]
    fn admin_may_mutate_anything() {
        assert!(can_mutate(&principal("root", Some(Role::Admin)), "alice"));
        assert!(can_mutate(&principal("root", Some(Role::Admin)), "root"));
    }

    #[test]
    fn non_owner_non_admin_may_not_mutate() {
        assert!(!can_mutate(&principal("bob", Some(Role::Student)), "alice"));
        assert!(!can_mutate(&principal("bob", Some(Role::Tutor)), "alice"));
        assert!(!can_mutate(&principal("bob", None), "alice"));
    }

    #[test]
    fn only_admins_and_tutors_manage_groups() {
        assert!(can_manage_groups(&principal("root", Some(Role::Admin))));
        assert!(can_manage_groups(&principal("t1", Some(Role::Tutor))));
        assert!(!can_manage_groups(&principal("s1", Some(Role::Student))));
        assert!(!can_manage_groups(&principal("nobody", None)));
    }

    #[test]
    fn group_scope_follows_role() {
        assert_eq!(group_scope(&principal("root", Some(Role::Admin))), GroupScope::All);
        assert_eq!(
            group_scope(&principal("t1", Some(Role::Tutor))),
            GroupScope::TutorOf("t1".to_string())
        );
        assert_eq!(
            group_scope(&principal("s1", Some(Role::Student))),
            GroupScope::MemberOf("s1".to_string())
        );
        assert_eq!(group_scope(&principal("x", None)), GroupScope::Nothing);
    }
}
