use anyhow::Context;
use url::Url;

use crate::auth::password::{MAX_COST, MIN_COST};

/// Session token lifetime when `SESSION_TTL_MINUTES` is unset: 30 days.
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 60 * 24 * 30;

/// Longest session lifetime accepted from the environment: one year.
pub const MAX_SESSION_TTL_MINUTES: i64 = 60 * 24 * 365;

/// Work factor used for new password hashes.
pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Public origin of the site; absolute redirect targets must share it.
    pub base_url: Url,
    /// Safe redirect target used when a requested one is rejected.
    pub callback_url: Option<String>,
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    /// Cookies get the `Secure` flag when the site is served over https.
    pub fn secure_cookies(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("AUTH_SECRET").context("AUTH_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "academix".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "academix-web".into()),
            ttl_minutes: parse_session_ttl(std::env::var("SESSION_TTL_MINUTES").ok().as_deref())?,
        };

        let base_url = std::env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".into());
        let auth = AuthConfig {
            base_url: Url::parse(&base_url).with_context(|| format!("invalid APP_BASE_URL {base_url:?}"))?,
            callback_url: std::env::var("AUTH_CALLBACK_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            bcrypt_cost: parse_bcrypt_cost(std::env::var("BCRYPT_COST").ok().as_deref()),
        };

        Ok(Self {
            database_url,
            jwt,
            auth,
        })
    }
}

/// Session lifetime in minutes; unset means the default, anything outside
/// `1..=MAX_SESSION_TTL_MINUTES` is a configuration error.
fn parse_session_ttl(raw: Option<&str>) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_SESSION_TTL_MINUTES);
    };
    let minutes = raw
        .trim()
        .parse::<i64>()
        .with_context(|| format!("invalid SESSION_TTL_MINUTES {raw:?}"))?;
    if !(1..=MAX_SESSION_TTL_MINUTES).contains(&minutes) {
        anyhow::bail!(
            "SESSION_TTL_MINUTES must be between 1 and {MAX_SESSION_TTL_MINUTES}, got {minutes}"
        );
    }
    Ok(minutes)
}

/// bcrypt work factor; falls back to the default when unset or out of range.
fn parse_bcrypt_cost(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|c| (MIN_COST..=MAX_COST).contains(c))
        .unwrap_or(DEFAULT_BCRYPT_COST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ttl_defaults_to_thirty_days() {
        assert_eq!(parse_session_ttl(None).unwrap(), 60 * 24 * 30);
        assert_eq!(parse_session_ttl(Some("90")).unwrap(), 90);
    }

    #[test]
    fn session_ttl_out_of_range_is_rejected() {
        assert!(parse_session_ttl(Some("0")).is_err());
        assert!(parse_session_ttl(Some("-5")).is_err());
        assert!(parse_session_ttl(Some("1000000000000")).is_err());
        assert!(parse_session_ttl(Some("forever")).is_err());
        assert!(parse_session_ttl(Some(&MAX_SESSION_TTL_MINUTES.to_string())).is_ok());
    }

    #[test]
    fn bcrypt_cost_stays_within_bounds() {
        assert_eq!(parse_bcrypt_cost(None), 12);
        assert_eq!(parse_bcrypt_cost(Some("10")), 10);
        assert_eq!(parse_bcrypt_cost(Some("3")), 12);
        assert_eq!(parse_bcrypt_cost(Some("32")), 12);
        assert_eq!(parse_bcrypt_cost(Some("lots")), 12);
    }
}
