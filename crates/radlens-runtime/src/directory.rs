//! User lookup for front ends that authenticate before analysis.
//!
//! The analysis engine never consults this; it exists so a service can
//! inject whatever credential store it has behind one trait.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Radiologist,
    Reviewer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Credential-checked user lookup.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// The user whose email and password match, if any.
    async fn find_by_credentials(&self, email: &str, password: &str) -> Option<User>;
}

/// In-memory directory, e.g. for demos and tests.
#[derive(Default)]
pub struct StaticUserDirectory {
    users: HashMap<String, (User, SecretString)>,
}

impl StaticUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user. Emails are matched case-insensitively.
    pub fn with_user(mut self, user: User, password: impl Into<String>) -> Self {
        self.users.insert(
            user.email.to_lowercase(),
            (user, SecretString::from(password.into())),
        );
        self
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl std::fmt::Debug for StaticUserDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticUserDirectory")
            .field("users", &self.users.len())
            .finish()
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn find_by_credentials(&self, email: &str, password: &str) -> Option<User> {
        let (user, secret) = self.users.get(&email.trim().to_lowercase())?;
        if secret.expose_secret() == password {
            Some(user.clone())
        } else {
            tracing::debug!(email = %user.email, "Credential mismatch");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> StaticUserDirectory {
        StaticUserDirectory::new().with_user(
            User {
                id: "u-1".to_string(),
                email: "Radiologist@Example.org".to_string(),
                name: "Dr. Example".to_string(),
                role: Role::Radiologist,
            },
            "correct horse",
        )
    }

    #[tokio::test]
    async fn test_matching_credentials() {
        let user = directory()
            .find_by_credentials("radiologist@example.org", "correct horse")
            .await
            .unwrap();
        assert_eq!(user.role, Role::Radiologist);
    }

    #[tokio::test]
    async fn test_wrong_password_or_unknown_user() {
        let directory = directory();
        assert!(directory
            .find_by_credentials("radiologist@example.org", "battery staple")
            .await
            .is_none());
        assert!(directory
            .find_by_credentials("nobody@example.org", "correct horse")
            .await
            .is_none());
    }

    #[test]
    fn test_debug_hides_passwords() {
        let debug = format!("{:?}", directory());
        assert!(!debug.contains("correct horse"));
        assert_eq!(directory().len(), 1);
    }
}
