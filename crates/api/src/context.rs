use schelper_auth::Principal;
use schelper_infra::UserRecord;

/// The authenticated caller, loaded from the store by the auth middleware.
///
/// Role checks use the stored role, not the role claim in the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    user: UserRecord,
}

impl CurrentUser {
    pub fn new(user: UserRecord) -> Self {
        Self { user }
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.user.id, self.user.role)
    }

    pub fn into_record(self) -> UserRecord {
        self.user
    }
}
