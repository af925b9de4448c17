use axum_extra::extract::cookie::{Cookie, SameSite};
use identity::Session;
use time::Duration;

pub const DEFAULT_TOKEN_COOKIE: &str = "AUTHTOKEN";
pub const DEFAULT_USER_COOKIE: &str = "USERID";

#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub token_cookie: String,
    pub user_cookie: String,
    pub secure: bool,
    /// Cookie `Max-Age`, matching the session lifetime
    pub max_age: std::time::Duration,
}

/// Session token cookie (HttpOnly) and user id cookie, both on path `/`.
pub(crate) fn session_cookies(
    settings: &CookieSettings,
    session: &Session,
) -> (Cookie<'static>, Cookie<'static>) {
    let max_age = Duration::seconds(settings.max_age.as_secs() as i64);

    let token = Cookie::build((settings.token_cookie.clone(), session.token.clone()))
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build();

    let user = Cookie::build((settings.user_cookie.clone(), session.user_id.clone()))
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build();

    (token, user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn session() -> Session {
        Session {
            id: "s1".into(),
            token: "tok123".into(),
            user_id: "u1".into(),
            roles: String::new(),
            is_oauth: true,
            props: BTreeMap::new(),
            created_at: 0,
            expires_at: 0,
        }
    }

    fn settings(secure: bool) -> CookieSettings {
        CookieSettings {
            token_cookie: DEFAULT_TOKEN_COOKIE.into(),
            user_cookie: DEFAULT_USER_COOKIE.into(),
            secure,
            max_age: std::time::Duration::from_secs(3600),
        }
    }

    #[test]
    fn token_cookie_is_http_only() {
        let (token, user) = session_cookies(&settings(false), &session());
        let token = token.to_string();
        let user = user.to_string();
        assert!(token.starts_with("AUTHTOKEN=tok123"), "got: {token}");
        assert!(token.contains("HttpOnly"));
        assert!(token.contains("SameSite=Lax"));
        assert!(token.contains("Path=/"));
        assert!(token.contains("Max-Age=3600"));
        assert!(!token.contains("Secure"));

        assert!(user.starts_with("USERID=u1"), "got: {user}");
        assert!(!user.contains("HttpOnly"));
        assert!(user.contains("Path=/"));
    }

    #[test]
    fn secure_flag_applies_to_both() {
        let (token, user) = session_cookies(&settings(true), &session());
        assert!(token.to_string().contains("Secure"));
        assert!(user.to_string().contains("Secure"));
    }
}
