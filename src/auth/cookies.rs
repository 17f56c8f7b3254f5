//! Session cookie helpers.

use axum::http::{header, HeaderMap, HeaderName};

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        (key.trim() == name).then(|| value.trim()).filter(|v| !v.is_empty())
    })
}

fn flags(secure: bool) -> &'static str {
    if secure {
        "Path=/; HttpOnly; Secure"
    } else {
        "Path=/; HttpOnly"
    }
}

pub fn set_cookie(name: &str, value: &str, secure: bool) -> (HeaderName, String) {
    (header::SET_COOKIE, format!("{}={}; {}", name, value, flags(secure)))
}

pub fn clear_cookie(name: &str, secure: bool) -> (HeaderName, String) {
    (
        header::SET_COOKIE,
        format!(
            "{}=; {}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            name,
            flags(secure)
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_get_cookie_multiple() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("foo=bar; accessToken=abc123; refreshToken=xyz789"),
        );
        assert_eq!(get_cookie(&headers, ACCESS_COOKIE), Some("abc123"));
        assert_eq!(get_cookie(&headers, REFRESH_COOKIE), Some("xyz789"));
        assert_eq!(get_cookie(&headers, "foo"), Some("bar"));
    }

    #[test]
    fn test_get_cookie_missing_or_empty() {
        let mut headers = HeaderMap::new();
        assert_eq!(get_cookie(&headers, ACCESS_COOKIE), None);
        headers.insert(header::COOKIE, HeaderValue::from_static("accessToken="));
        assert_eq!(get_cookie(&headers, ACCESS_COOKIE), None);
    }

    #[test]
    fn set_cookie_is_http_only_and_secure() {
        let (name, value) = set_cookie(REFRESH_COOKIE, "tok", true);
        assert_eq!(name, header::SET_COOKIE);
        assert_eq!(value, "refreshToken=tok; Path=/; HttpOnly; Secure");
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let (_, value) = clear_cookie(ACCESS_COOKIE, false);
        assert!(value.starts_with("accessToken=;"));
        assert!(value.contains("Max-Age=0"));
        assert!(!value.contains("Secure"));
    }
}
