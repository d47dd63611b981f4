use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::SessionUser, password::verify_password_blocking, repo::UserStore,
        services::normalize_email,
    },
    error::AppError,
};

/// Check an email/password pair against the user table.
///
/// Returns `Ok(None)` for every kind of mismatch (missing input, unknown
/// email, wrong password, unreadable stored hash) so callers cannot tell them
/// apart. Only storage failures surface as errors.
#[instrument(skip(store, password))]
pub async fn authorize(
    store: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<Option<SessionUser>, AppError> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Ok(None);
    }

    let Some(user) = store
        .find_by_email(&email)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
    else {
        warn!("sign-in for unknown email");
        return Ok(None);
    };

    match verify_password_blocking(password.to_string(), user.password_hash.clone()).await {
        Ok(true) => Ok(Some(SessionUser::from(&user))),
        Ok(false) => {
            warn!(user_id = %user.id, "sign-in with wrong password");
            Ok(None)
        }
        Err(e) => {
            warn!(user_id = %user.id, error = %e, "stored password hash unreadable");
            Ok(None)
        }
    }
}
