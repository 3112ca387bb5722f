use tessera_types::api::Claims;
use uuid::Uuid;

use crate::error::{Result, TesseraError};

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
}

/// "Who is making this request", answered by whatever authenticated it.
pub trait IdentityProvider {
    fn current_user(&self) -> Option<CurrentUser>;

    fn require_auth(&self) -> Result<CurrentUser> {
        self.current_user().ok_or(TesseraError::AuthenticationRequired)
    }
}

/// A caller with no identity.
pub struct Anonymous;

impl IdentityProvider for Anonymous {
    fn current_user(&self) -> Option<CurrentUser> {
        None
    }
}

impl IdentityProvider for CurrentUser {
    fn current_user(&self) -> Option<CurrentUser> {
        Some(self.clone())
    }
}

impl IdentityProvider for Claims {
    fn current_user(&self) -> Option<CurrentUser> {
        Some(CurrentUser {
            id: self.sub,
            username: self.username.clone(),
        })
    }
}

impl<T: IdentityProvider> IdentityProvider for Option<T> {
    fn current_user(&self) -> Option<CurrentUser> {
        self.as_ref().and_then(|identity| identity.current_user())
    }
}

/// Requires an identity and that it is the user the action is performed for.
pub fn require_actor(identity: &dyn IdentityProvider, acting_for: Uuid) -> Result<CurrentUser> {
    let user = identity.require_auth()?;
    if user.id != acting_for {
        return Err(TesseraError::CannotActForAnotherUser);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_callers_must_log_in() {
        assert!(matches!(
            Anonymous.require_auth(),
            Err(TesseraError::AuthenticationRequired)
        ));
        assert!(matches!(
            None::<CurrentUser>.require_auth(),
            Err(TesseraError::AuthenticationRequired)
        ));
    }

    #[test]
    fn claims_resolve_to_their_subject() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            username: "ada".into(),
            exp: 0,
        };
        let user = claims.require_auth().unwrap();
        assert_eq!(user.id, claims.sub);
        assert_eq!(user.username, "ada");
    }

    #[test]
    fn acting_for_someone_else_is_rejected() {
        let me = CurrentUser {
            id: Uuid::new_v4(),
            username: "me".into(),
        };
        assert!(require_actor(&me, me.id).is_ok());
        assert!(matches!(
            require_actor(&me, Uuid::new_v4()),
            Err(TesseraError::CannotActForAnotherUser)
        ));
    }
}
