use warp::{reject::Rejection, Filter};

use crate::{constants::SESSION_COOKIE, error::HttpError};

use super::jwt::{verify_jwt_session, SessionData, SessionKey};

/// Accepts `Token <jwt>` and `Bearer <jwt>` authorization schemes.
fn authorization_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}

/// The authorization header wins over the session cookie.
pub fn session_token(cookie: Option<String>, authorization: Option<String>) -> Option<String> {
    authorization
        .as_deref()
        .and_then(authorization_token)
        .map(str::to_string)
        .or(cookie)
}

fn with_token() -> impl Filter<Extract = (Option<String>,), Error = Rejection> + Copy {
    warp::cookie::optional::<String>(SESSION_COOKIE)
        .and(warp::header::optional::<String>("authorization"))
        .map(session_token)
}

/// Invalid or expired tokens read as an anonymous requester.
pub fn with_possible_session(
    key: SessionKey,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    with_token().map(move |token: Option<String>| {
        token.and_then(|token| match verify_jwt_session(&token, &key) {
            Ok(data) => Some(SessionData::from(data)),
            Err(e) => {
                log::warn!("Ignoring session token: {e}");
                None
            }
        })
    })
}

pub fn with_session(
    key: SessionKey,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    with_possible_session(key).and_then(|session: Option<SessionData>| async move {
        session.ok_or_else(|| Rejection::from(HttpError::Unauthorized.default()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_header_schemes() {
        assert_eq!(authorization_token("Token abc"), Some("abc"));
        assert_eq!(authorization_token("bearer  abc "), Some("abc"));
        assert_eq!(authorization_token("Basic abc"), None);
        assert_eq!(authorization_token("abc"), None);
    }

    #[test]
    fn header_token_takes_precedence_over_cookie() {
        assert_eq!(
            session_token(Some("cookie".into()), Some("Token header".into())),
            Some(String::from("header"))
        );
        assert_eq!(
            session_token(Some("cookie".into()), Some("Basic x".into())),
            Some(String::from("cookie"))
        );
        assert_eq!(session_token(None, None), None);
    }
}
