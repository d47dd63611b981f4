use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Job role a user registers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum Role {
    Administrator,
    Principal,
    Teacher,
    Accountant,
    ItManager,
    Other,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Administrator,
        Role::Principal,
        Role::Teacher,
        Role::Accountant,
        Role::ItManager,
        Role::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::Principal => "principal",
            Role::Teacher => "teacher",
            Role::Accountant => "accountant",
            Role::ItManager => "it_manager",
            Role::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.as_str() == s)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt, never leaves the server
    pub institution_name: String,
    pub role: Role,
    pub subscribe_newsletter: bool,
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Validated registration, ready to be stored.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub institution_name: String,
    pub role: Role,
    pub subscribe_newsletter: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_matches_wire_names() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
        assert_eq!(Role::parse("it_manager"), Some(Role::ItManager));
        assert_eq!(Role::parse("Teacher"), None);
        assert_eq!(Role::parse("janitor"), None);
    }
}
