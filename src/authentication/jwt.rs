use chrono::Duration;
use chrono::Utc;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::constants::SESSION_LIFETIME_HOURS;
use crate::error::{Error, HttpError, TypeError};
use crate::schema::{Id, UserRole};

use super::permissions::ActionType;

pub type SessionKey = Hmac<Sha256>;

pub fn session_key(secret: &str) -> Result<SessionKey, TypeError> {
    Hmac::new_from_slice(secret.as_bytes()).map_err(|_| TypeError::new("Invalid session secret"))
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Id,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Id, username: String, role: UserRole) -> Self {
        let now = Utc::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(SESSION_LIFETIME_HOURS)).timestamp();

        Self {
            user_id: id,
            username,
            role,
            iat,
            exp,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }
}

/// The identity of the requester, passed explicitly to every handler that needs it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: Id,
    pub username: String,
    pub role: UserRole,
}

impl SessionData {
    pub fn new(user_id: Id, username: &str, role: UserRole) -> Self {
        Self {
            user_id,
            username: username.to_string(),
            role,
        }
    }

    pub fn authenticate(&self, action: ActionType) -> Result<(), Error> {
        if !action.authenticate(self) {
            return Err(HttpError::Forbidden.default());
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData::new(value.user_id, &value.username, value.role)
    }
}

pub fn generate_jwt_session(
    user_id: Id,
    username: &str,
    role: UserRole,
    key: &SessionKey,
) -> Result<String, Error> {
    let claims = JwtSessionData::new(user_id, username.to_owned(), role);

    claims.sign_with_key(key).map_err(|e| {
        log::error!("Failed to sign session: {e}");
        HttpError::InternalServerError.default()
    })
}

pub fn verify_jwt_session(token: &str, key: &SessionKey) -> Result<JwtSessionData, Error> {
    let session: JwtSessionData = token
        .verify_with_key(key)
        .map_err(|_| HttpError::Unauthorized.new("Invalid session; Invalid token"))?;

    if session.is_expired() {
        return Err(HttpError::Unauthorized.new("Invalid session; Token expired"));
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SessionKey {
        session_key("test-secret").unwrap()
    }

    #[test]
    fn signed_sessions_verify() {
        let token = generate_jwt_session(7, "cook", UserRole::User, &key()).unwrap();
        let session = verify_jwt_session(&token, &key()).unwrap();

        assert_eq!(session.user_id, 7);
        assert_eq!(session.username, "cook");
        assert_eq!(session.role, UserRole::User);
    }

    #[test]
    fn tokens_signed_with_another_key_are_rejected() {
        let other = session_key("other-secret").unwrap();
        let token = generate_jwt_session(7, "cook", UserRole::User, &other).unwrap();

        let error = verify_jwt_session(&token, &key()).unwrap_err();
        assert_eq!(error.code, 401);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let mut claims = JwtSessionData::new(1, String::from("old"), UserRole::Admin);
        claims.exp = Utc::now().timestamp() - 10;
        let token = claims.sign_with_key(&key()).unwrap();

        let error = verify_jwt_session(&token, &key()).unwrap_err();
        assert_eq!(error.message(), "Invalid session; Token expired");
    }

    #[test]
    fn claims_carry_the_role_into_the_session() {
        let session: SessionData = JwtSessionData::new(1, String::from("boss"), UserRole::Admin).into();
        assert_eq!(session.role, UserRole::Admin);
        assert_eq!(session.username, "boss");
    }
}
