use warp::http::Method;

use crate::{
    error::{Error, HttpError},
    jwt::SessionData,
    schema::{Id, UserRole},
};

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnMemberships,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnMemberships,
            ActionType::ManageAllRecipes,
            ActionType::ManageCatalog,
        ],
    ),
];

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    CreateRecipes,

    ManageOwnRecipes,
    ManageOwnMemberships,

    /// Tags and ingredients.
    ManageCatalog,
    ManageAllRecipes,
}

impl ActionType {
    pub fn authenticate(self, session: &SessionData) -> bool {
        ACTION_TABLE
            .iter()
            .find_map(|(role, actions)| {
                if &session.role != role {
                    return None;
                }

                Some(actions.contains(&self))
            })
            .unwrap_or(false)
    }
}

pub fn is_safe_method(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS
}

fn require_session(session: Option<&SessionData>) -> Result<&SessionData, Error> {
    session.ok_or_else(|| HttpError::Unauthorized.default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Reads for everyone, writes for staff.
    IsAdminOrReadOnly,
    /// Reads for everyone, writes for authenticated users, object writes for the author or staff.
    IsAdminAuthorOrReadOnly,
}

impl Permission {
    pub fn has_permission(&self, method: &Method, session: Option<&SessionData>) -> Result<(), Error> {
        if is_safe_method(method) {
            return Ok(());
        }
        let session = require_session(session)?;

        match self {
            Permission::IsAdminOrReadOnly => session.authenticate(ActionType::ManageCatalog),
            Permission::IsAdminAuthorOrReadOnly => session.authenticate(ActionType::CreateRecipes),
        }
    }

    pub fn has_object_permission(
        &self,
        method: &Method,
        session: Option<&SessionData>,
        author_id: Id,
    ) -> Result<(), Error> {
        self.has_permission(method, session)?;
        if is_safe_method(method) {
            return Ok(());
        }
        let session = require_session(session)?;

        match self {
            Permission::IsAdminOrReadOnly => Ok(()),
            Permission::IsAdminAuthorOrReadOnly => {
                if session.authenticate(ActionType::ManageAllRecipes).is_ok() {
                    return Ok(());
                }
                session.authenticate(ActionType::ManageOwnRecipes)?;
                if session.user_id != author_id {
                    return Err(HttpError::Forbidden.default());
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: Id) -> SessionData {
        SessionData::new(id, "cook", UserRole::User)
    }

    fn admin() -> SessionData {
        SessionData::new(99, "boss", UserRole::Admin)
    }

    #[test]
    fn action_table_separates_roles() {
        assert!(ActionType::ManageOwnMemberships.authenticate(&user(1)));
        assert!(!ActionType::ManageCatalog.authenticate(&user(1)));
        assert!(ActionType::ManageCatalog.authenticate(&admin()));
        assert!(ActionType::ManageAllRecipes.authenticate(&admin()));
    }

    #[test]
    fn admin_or_read_only() {
        let policy = Permission::IsAdminOrReadOnly;

        assert!(policy.has_permission(&Method::GET, None).is_ok());
        assert_eq!(policy.has_permission(&Method::POST, None).unwrap_err().code, 401);
        assert_eq!(
            policy.has_permission(&Method::POST, Some(&user(1))).unwrap_err().code,
            403
        );
        assert!(policy.has_permission(&Method::POST, Some(&admin())).is_ok());
    }

    #[test]
    fn author_or_admin_may_change_objects() {
        let policy = Permission::IsAdminAuthorOrReadOnly;

        assert!(policy.has_object_permission(&Method::GET, None, 1).is_ok());
        assert!(policy.has_object_permission(&Method::PATCH, Some(&user(1)), 1).is_ok());
        assert!(policy.has_object_permission(&Method::DELETE, Some(&admin()), 1).is_ok());
        assert_eq!(
            policy
                .has_object_permission(&Method::PATCH, Some(&user(2)), 1)
                .unwrap_err()
                .code,
            403
        );
        assert_eq!(
            policy
                .has_object_permission(&Method::DELETE, None, 1)
                .unwrap_err()
                .code,
            401
        );
    }

    #[test]
    fn any_authenticated_user_may_create() {
        let policy = Permission::IsAdminAuthorOrReadOnly;
        assert!(policy.has_permission(&Method::POST, Some(&user(3))).is_ok());
        assert_eq!(policy.has_permission(&Method::POST, None).unwrap_err().code, 401);
    }
}
