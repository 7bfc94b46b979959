//! Session-cookie login. Passwords are stored as Argon2id PHC strings and
//! sessions live server-side, keyed by the random token in the cookie.

use crate::datastore::{
    structs::{Session, User},
    SessionStore,
};
use crate::twoface::Fallible;
use actix_web::{
    cookie::Cookie,
    http::header,
    HttpMessage, HttpRequest, HttpResponse,
};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{offset::Utc, Duration};
use rand::RngCore;
use uuid::Uuid;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Hash a password into an Argon2id PHC string for storage.
pub fn hash_password(password: &str) -> Fallible<String> {
    let mut salt_bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| anyhow::anyhow!("salting failed: {}", e))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("hashing failed: {}", e))?;
    Ok(hash.to_string())
}

/// Does the password match the stored PHC string?
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// A fresh session for the given user, expiring `ttl_hours` from now.
pub fn new_session(user_id: i32, ttl_hours: i64) -> Session {
    Session {
        token: Uuid::new_v4(),
        user_id,
        expires_at: Utc::now() + Duration::hours(ttl_hours),
    }
}

/// The cookie which carries the session token to the browser.
pub fn session_cookie(token: Uuid) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .finish()
}

/// A same-name, same-path cookie used to clear the session on logout.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, "").path("/").finish()
}

/// The session token from the request, if the cookie holds a valid one.
pub fn session_token(req: &HttpRequest) -> Option<Uuid> {
    let cookie = req.cookie(SESSION_COOKIE)?;
    Uuid::parse_str(cookie.value()).ok()
}

/// The logged-in user making this request, if any. Missing, malformed and
/// expired sessions all resolve to `None` rather than an error.
pub async fn visitor<DS: SessionStore>(ds: &DS, req: &HttpRequest) -> Fallible<Option<User>> {
    guard!(let Some(token) = session_token(req) else {
        return Ok(None)
    });
    ds.session_user(token).await
}

/// Redirect an anonymous visitor to the login page, remembering where they
/// were headed.
pub fn login_redirect(next: &str) -> HttpResponse {
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    HttpResponse::Found()
        .header(header::LOCATION, format!("/auth/login/?{}", query))
        .finish()
}

/// The logged-in user, or the login redirect to send back instead.
pub async fn require<DS: SessionStore>(
    ds: &DS,
    req: &HttpRequest,
) -> Fallible<Result<User, HttpResponse>> {
    match visitor(ds, req).await? {
        Some(user) => Ok(Ok(user)),
        None => Ok(Err(login_redirect(req.path()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("Tr0ub4dor&3", &hash));
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let token = Uuid::new_v4();
        let cookie = session_cookie(token);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), token.to_string());
        assert_eq!(cookie.path(), Some("/"));
        assert!(cookie.http_only().unwrap_or(false));
    }

    #[test]
    fn test_session_token_parsing() {
        let token = Uuid::new_v4();
        let req = TestRequest::default()
            .cookie(session_cookie(token))
            .to_http_request();
        assert_eq!(session_token(&req), Some(token));

        let no_cookie = TestRequest::default().to_http_request();
        assert_eq!(session_token(&no_cookie), None);

        let garbage = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, "not-a-uuid"))
            .to_http_request();
        assert_eq!(session_token(&garbage), None);
    }

    #[test]
    fn test_login_redirect_keeps_destination() {
        let resp = login_redirect("/posts/create/");
        assert_eq!(resp.status().as_u16(), 302);
        let location = resp
            .headers()
            .get(actix_web::http::header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(location, "/auth/login/?next=%2Fposts%2Fcreate%2F");
    }
}
