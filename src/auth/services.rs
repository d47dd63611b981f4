use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{PublicUser, RegisterRequest},
        password::hash_password_blocking,
        repo::{RepoError, UserStore},
        repo_types::{NewUser, Role},
    },
    error::{AppError, FieldError},
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A registration that passed shape checks; the password is still plain text.
#[derive(Debug)]
pub struct ValidRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub institution_name: String,
    pub role: Role,
    pub subscribe_newsletter: bool,
}

fn required_text(
    value: Option<String>,
    field: &str,
    label: &str,
    errors: &mut Vec<FieldError>,
) -> String {
    match value.map(|v| v.trim().to_string()) {
        None => {
            errors.push(FieldError::new(field, "Required"));
            String::new()
        }
        Some(v) if v.is_empty() => {
            errors.push(FieldError::new(field, format!("{label} is required")));
            String::new()
        }
        Some(v) => v,
    }
}

/// Check every field of `req` and report all problems at once.
pub fn validate_registration(req: RegisterRequest) -> Result<ValidRegistration, AppError> {
    let mut errors = Vec::new();

    let first_name = required_text(req.first_name, "firstName", "First name", &mut errors);
    let last_name = required_text(req.last_name, "lastName", "Last name", &mut errors);
    let institution_name = required_text(
        req.institution_name,
        "institutionName",
        "Institution name",
        &mut errors,
    );

    let email = match req.email {
        None => {
            errors.push(FieldError::new("email", "Required"));
            String::new()
        }
        Some(e) => {
            let e = normalize_email(&e);
            if !is_valid_email(&e) {
                errors.push(FieldError::new("email", "Invalid email address"));
            }
            e
        }
    };

    let password = match req.password {
        None => {
            errors.push(FieldError::new("password", "Required"));
            String::new()
        }
        Some(p) => {
            if p.chars().count() < MIN_PASSWORD_LEN {
                errors.push(FieldError::new(
                    "password",
                    format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
                ));
            }
            p
        }
    };

    let role = match req.role.as_deref() {
        None => {
            errors.push(FieldError::new("role", "Required"));
            None
        }
        Some(r) => {
            let parsed = Role::parse(r);
            if parsed.is_none() {
                let allowed: Vec<&str> = Role::ALL.iter().map(Role::as_str).collect();
                errors.push(FieldError::new(
                    "role",
                    format!("Invalid role, expected one of: {}", allowed.join(", ")),
                ));
            }
            parsed
        }
    };

    match role {
        Some(role) if errors.is_empty() => Ok(ValidRegistration {
            first_name,
            last_name,
            email,
            password,
            institution_name,
            role,
            subscribe_newsletter: req.subscribe_newsletter.unwrap_or(false),
        }),
        _ => Err(AppError::Validation(errors)),
    }
}

/// Store a new user after checking the email is free.
pub async fn register(
    store: &dyn UserStore,
    bcrypt_cost: u32,
    reg: ValidRegistration,
) -> Result<PublicUser, AppError> {
    let existing = store
        .find_by_email(&reg.email)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    if existing.is_some() {
        warn!(email = %reg.email, "email already registered");
        return Err(AppError::EmailTaken);
    }

    let password_hash = hash_password_blocking(reg.password, bcrypt_cost).await?;

    let user = store
        .create(NewUser {
            email: reg.email,
            first_name: reg.first_name,
            last_name: reg.last_name,
            password_hash,
            institution_name: reg.institution_name,
            role: reg.role,
            subscribe_newsletter: reg.subscribe_newsletter,
        })
        .await
        .map_err(|e| match e {
            // lost a race with a concurrent registration
            RepoError::DuplicateEmail => AppError::EmailTaken,
            other => AppError::Internal(other.into()),
        })?;

    info!(user_id = %user.id, email = %user.email, role = %user.role, "user registered");
    Ok(user.into())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::auth::{
        password::MIN_COST,
        repo::memory::MemoryUserStore,
        repo_types::User,
    };

    /// Sees no existing row, then loses the insert to a concurrent signup.
    struct RacingStore;

    #[async_trait]
    impl UserStore for RacingStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, RepoError> {
            Ok(None)
        }

        async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, RepoError> {
            Ok(None)
        }

        async fn create(&self, _new: NewUser) -> Result<User, RepoError> {
            Err(RepoError::DuplicateEmail)
        }
    }

    fn request() -> RegisterRequest {
        RegisterRequest {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            email: Some("  Ada@School.EDU ".into()),
            password: Some("analytical".into()),
            institution_name: Some("Analytical Academy".into()),
            role: Some("it_manager".into()),
            subscribe_newsletter: None,
        }
    }

    fn fields(err: AppError) -> Vec<String> {
        match err {
            AppError::Validation(details) => details.into_iter().map(|d| d.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_request_is_normalized() {
        let reg = validate_registration(request()).expect("valid");
        assert_eq!(reg.email, "ada@school.edu");
        assert_eq!(reg.role, Role::ItManager);
        assert!(!reg.subscribe_newsletter);
    }

    #[test]
    fn short_password_fails_validation() {
        let mut req = request();
        req.password = Some("short".into());
        assert_eq!(fields(validate_registration(req).unwrap_err()), vec!["password"]);
    }

    #[test]
    fn password_length_counts_characters() {
        let mut req = request();
        req.password = Some("пароль12".into());
        assert!(validate_registration(req).is_ok());
    }

    #[test]
    fn all_problems_reported_together() {
        let req = RegisterRequest {
            first_name: Some("   ".into()),
            email: Some("not-an-email".into()),
            role: Some("janitor".into()),
            ..Default::default()
        };
        let got = fields(validate_registration(req).unwrap_err());
        assert_eq!(
            got,
            vec!["firstName", "lastName", "institutionName", "email", "password", "role"]
        );
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
        assert!(!is_valid_email(""));
    }

    #[tokio::test]
    async fn register_then_duplicate_conflicts() {
        let store = MemoryUserStore::default();
        let user = register(&store, MIN_COST, validate_registration(request()).unwrap())
            .await
            .expect("first registration");
        assert_eq!(user.email, "ada@school.edu");

        let stored = store.find_by_email("ada@school.edu").await.unwrap().unwrap();
        assert!(stored.password_hash.starts_with("$2b$"));
        assert_ne!(stored.password_hash, "analytical");

        let mut again = request();
        again.email = Some("ADA@school.edu".into());
        let err = register(&store, MIN_COST, validate_registration(again).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailTaken));
    }

    #[tokio::test]
    async fn losing_insert_race_reports_email_taken() {
        let reg = validate_registration(request()).unwrap();
        let err = register(&RacingStore, MIN_COST, reg).await.unwrap_err();
        assert!(matches!(err, AppError::EmailTaken));
    }

    #[tokio::test]
    async fn newsletter_opt_in_is_stored() {
        let store = MemoryUserStore::default();
        let mut req = request();
        req.subscribe_newsletter = Some(true);
        register(&store, MIN_COST, validate_registration(req).unwrap())
            .await
            .expect("registration");

        let stored = store.find_by_email("ada@school.edu").await.unwrap().unwrap();
        assert!(stored.subscribe_newsletter);
    }
}
