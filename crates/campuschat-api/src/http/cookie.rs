//! Session cookie formatting and parsing.

use axum::http::HeaderMap;
use axum::http::header::COOKIE;

pub const SESSION_COOKIE: &str = "token";

#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
    pub max_age_secs: i64,
}

/// `Set-Cookie` value carrying a freshly minted session token.
pub fn session_cookie(token: &str, settings: &CookieSettings) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        settings.max_age_secs
    );
    if settings.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie.
pub fn cleared_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Value of cookie `name` from the request's `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_cookie_attributes() {
        let settings = CookieSettings {
            secure: false,
            max_age_secs: 2_419_200,
        };
        let cookie = session_cookie("abc", &settings);
        assert_eq!(
            cookie,
            "token=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=2419200"
        );

        let secure = session_cookie("abc", &CookieSettings { secure: true, ..settings });
        assert!(secure.ends_with("; Secure"));
        assert!(cleared_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn read_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; token=jwt.value.sig"));
        assert_eq!(read_cookie(&headers, "token").as_deref(), Some("jwt.value.sig"));
        assert_eq!(read_cookie(&headers, "theme").as_deref(), Some("dark"));
        assert!(read_cookie(&headers, "missing").is_none());

        let mut empty = HeaderMap::new();
        empty.append(COOKIE, HeaderValue::from_static("token="));
        assert!(read_cookie(&empty, "token").is_none());
    }
}
