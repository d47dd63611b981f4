//! Guard for protected pages: no session means a trip to the sign-in page.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, OriginalUri},
    http::request::Parts,
    response::Redirect,
};
use tracing::debug;

use super::{claims::Claims, jwt::JwtKeys, session::token_from_parts};

pub const SIGN_IN_PATH: &str = "/signin";

/// Sign-in URL that brings the visitor back to `return_to` afterwards.
pub fn sign_in_redirect(return_to: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(return_to.as_bytes()).collect();
    format!("{SIGN_IN_PATH}?callbackUrl={encoded}")
}

/// Session of a visitor allowed onto a protected page.
pub struct RequireSession(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        if let Some(claims) = token_from_parts(parts).and_then(|t| keys.verify(t).ok()) {
            return Ok(RequireSession(claims));
        }

        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|o| o.0.clone())
            .unwrap_or_else(|| parts.uri.clone());
        let return_to = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        debug!(path = %return_to, "no session, redirecting to sign-in");
        Err(Redirect::to(&sign_in_redirect(return_to)))
    }
}
