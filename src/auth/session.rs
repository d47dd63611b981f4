//! Session token transport: the cookie and the `Authorization` header.

use axum::http::{header, request::Parts};

pub const SESSION_COOKIE: &str = "academix.session-token";

/// `Set-Cookie` value carrying a freshly minted session token.
pub fn session_cookie(token: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that makes the browser drop the session.
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

/// Pull the session token from the request, preferring a bearer header.
pub fn token_from_parts(parts: &Parts) -> Option<&str> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|c| c.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .find(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_header_wins() {
        let p = parts(&[
            ("authorization", "Bearer abc.def.ghi"),
            ("cookie", "academix.session-token=from-cookie"),
        ]);
        assert_eq!(token_from_parts(&p), Some("abc.def.ghi"));
    }

    #[test]
    fn cookie_is_found_among_others() {
        let p = parts(&[("cookie", "theme=dark; academix.session-token=tok; lang=en")]);
        assert_eq!(token_from_parts(&p), Some("tok"));
    }

    #[test]
    fn similar_cookie_names_are_ignored() {
        let p = parts(&[("cookie", "academix.session-token-old=stale")]);
        assert_eq!(token_from_parts(&p), None);
    }

    #[test]
    fn nothing_to_find() {
        assert_eq!(token_from_parts(&parts(&[])), None);
        assert_eq!(token_from_parts(&parts(&[("authorization", "Basic Zm9vOmJhcg==")])), None);
        assert_eq!(token_from_parts(&parts(&[("cookie", "academix.session-token=")])), None);
    }

    #[test]
    fn cookie_attributes() {
        let c = session_cookie("tok", 60, true);
        assert_eq!(
            c,
            "academix.session-token=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=60; Secure"
        );
        assert!(clear_session_cookie(false).contains("Max-Age=0"));
        assert!(!clear_session_cookie(false).contains("Secure"));
    }
}
