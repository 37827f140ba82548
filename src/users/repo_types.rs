use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Provider value stored for password-based accounts.
pub const LOCAL_PROVIDER: &str = "local";

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String, // Argon2 PHC string, empty for OAuth-only accounts
    pub provider: String,
    pub provider_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Fields supplied by the caller when inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub provider: String,
    pub provider_id: String,
}

impl NewUser {
    pub fn local(name: &str, email: &str, password_hash: String) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            provider: LOCAL_PROVIDER.to_string(),
            provider_id: String::new(),
        }
    }

    pub fn oauth(name: &str, email: &str, provider: &str, provider_id: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: String::new(),
            provider: provider.to_string(),
            provider_id: provider_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_not_serialized() {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            provider: LOCAL_PROVIDER.into(),
            provider_id: String::new(),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "alice@example.com");
        assert_eq!(json["provider"], "local");
        assert!(json["created_at"].is_string());
    }

    #[test]
    fn oauth_new_user_has_no_password() {
        let new = NewUser::oauth("Bob", "bob@example.com", "google", "g-123");
        assert!(new.password_hash.is_empty());
        assert_eq!(new.provider, "google");
        assert_eq!(new.provider_id, "g-123");
    }
}
