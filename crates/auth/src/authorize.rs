//! Role checks.
//!
//! No IO, no panics: callers resolve the principal and the stored roles first.

use thiserror::Error;

use schelper_core::UserId;

use crate::{Principal, Role};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthzError {
    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Parents can only link themselves")]
    ForeignLink,

    #[error("Roles mismatch for link")]
    RoleMismatch,
}

/// Allow the principal only if it holds one of `allowed`.
pub fn require_role(principal: &Principal, allowed: &[Role]) -> Result<(), AuthzError> {
    if allowed.contains(&principal.role) {
        Ok(())
    } else {
        Err(AuthzError::InsufficientPermissions)
    }
}

/// Who may create a parent/child link naming `parent_id`.
///
/// Admins may link anyone; a parent may only link themselves.
pub fn authorize_link(actor: &Principal, parent_id: UserId) -> Result<(), AuthzError> {
    require_role(actor, &[Role::Admin, Role::Parent])?;
    if actor.role == Role::Parent && actor.user_id != parent_id {
        return Err(AuthzError::ForeignLink);
    }
    Ok(())
}

/// A link must join a `parent` account to a `child` account.
pub fn check_link_roles(parent_role: Role, child_role: Role) -> Result<(), AuthzError> {
    if parent_role == Role::Parent && child_role == Role::Child {
        Ok(())
    } else {
        Err(AuthzError::RoleMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: i64, role: Role) -> Principal {
        Principal::new(UserId::new(id), role)
    }

    #[test]
    fn require_role_matches_membership() {
        assert!(require_role(&p(1, Role::Admin), &[Role::Admin]).is_ok());
        assert_eq!(
            require_role(&p(1, Role::Parent), &[Role::Admin]),
            Err(AuthzError::InsufficientPermissions)
        );
    }

    #[test]
    fn link_policy() {
        assert!(authorize_link(&p(1, Role::Admin), UserId::new(9)).is_ok());
        assert!(authorize_link(&p(2, Role::Parent), UserId::new(2)).is_ok());
        assert_eq!(
            authorize_link(&p(2, Role::Parent), UserId::new(3)),
            Err(AuthzError::ForeignLink)
        );
        assert_eq!(
            authorize_link(&p(4, Role::Child), UserId::new(4)),
            Err(AuthzError::InsufficientPermissions)
        );
    }

    #[test]
    fn link_roles_must_be_parent_then_child() {
        assert!(check_link_roles(Role::Parent, Role::Child).is_ok());
        assert_eq!(check_link_roles(Role::Child, Role::Parent), Err(AuthzError::RoleMismatch));
        assert_eq!(check_link_roles(Role::Admin, Role::Child), Err(AuthzError::RoleMismatch));
    }
}
