//! The staff session rides in a single cookie holding the percent-encoded
//! JSON of [`Session`].
use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, InvalidHeaderValue},
};
use cookie::{Cookie, SameSite, time::Duration};
use gateway::Session;
use tracing::debug;

/// Reads the session cookie from every `Cookie` header of a request.
/// A cookie that is present but does not decode counts as absent.
pub fn read_session(headers: &HeaderMap, name: &str) -> Option<Session> {
    let cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse_encoded)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)?;

    serde_json::from_str(cookie.value())
        .inspect_err(|e| debug!(error = %e, "Ignoring malformed session cookie"))
        .ok()
}

pub fn session_cookie(name: &str, session: &Session, secure: bool) -> Cookie<'static> {
    let value = serde_json::to_string(session).unwrap_or_default();

    let mut cookie = Cookie::build((name.to_string(), value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .build();
    cookie.make_permanent();

    cookie
}

pub fn expired_cookie(name: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((name.to_string(), ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

pub fn set_cookie_value(cookie: &Cookie<'_>) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&cookie.encoded().to_string())
}

/// Swaps the named cookie inside the request's `Cookie` headers so handlers
/// further down see the rotated value. Other cookies keep their raw values;
/// pairs that do not parse are dropped.
pub fn replace_in_request(headers: &mut HeaderMap, cookie: &Cookie<'_>) {
    let mut pairs: Vec<String> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .filter(|other| other.name() != cookie.name())
        .map(|other| other.stripped().to_string())
        .collect();
    pairs.push(cookie.encoded().stripped().to_string());

    headers.remove(COOKIE);
    if let Ok(value) = HeaderValue::from_str(&pairs.join("; ")) {
        headers.insert(COOKIE, value);
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, header::COOKIE};
    use gateway::Session;

    use super::*;

    fn session() -> Session {
        Session {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
            expires_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_round_trip_through_header() {
        let cookie = session_cookie("admin-session", &session(), true);
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}", cookie.encoded().stripped())).unwrap(),
        );

        assert_eq!(read_session(&headers, "admin-session"), Some(session()));
        assert_eq!(read_session(&headers, "other"), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let header = set_cookie_value(&session_cookie("admin-session", &session(), true)).unwrap();
        let header = header.to_str().unwrap();

        assert!(header.starts_with("admin-session="));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Secure"));
    }

    #[test]
    fn test_malformed_cookie_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("admin-session=%7Bnot-json"));

        assert_eq!(read_session(&headers, "admin-session"), None);
    }

    #[test]
    fn test_replace_in_request() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; admin-session=old"));

        replace_in_request(&mut headers, &session_cookie("admin-session", &session(), false));

        let raw = headers.get(COOKIE).unwrap().to_str().unwrap();
        assert!(raw.starts_with("theme=dark; admin-session="));
        assert!(!raw.contains("=old"));
        assert_eq!(read_session(&headers, "admin-session"), Some(session()));
    }

    #[test]
    fn test_replace_across_headers_keeps_other_values() {
        let mut headers = HeaderMap::new();
        headers.append(
            COOKIE,
            HeaderValue::from_static("theme=dark;  lang=en%20US ; admin-session=old"),
        );
        headers.append(COOKIE, HeaderValue::from_static("admin-session=older; junk"));

        replace_in_request(&mut headers, &session_cookie("admin-session", &session(), false));

        assert_eq!(headers.get_all(COOKIE).iter().count(), 1);
        let raw = headers.get(COOKIE).unwrap().to_str().unwrap();
        assert!(raw.starts_with("theme=dark; lang=en%20US; admin-session="));
        assert_eq!(raw.matches("admin-session=").count(), 1);
        assert!(!raw.contains("junk"));
        assert_eq!(read_session(&headers, "admin-session"), Some(session()));
    }

    #[test]
    fn test_expired_cookie() {
        let header = set_cookie_value(&expired_cookie("admin-session", false)).unwrap();

        assert!(header.to_str().unwrap().contains("Max-Age=0"));
    }
}
