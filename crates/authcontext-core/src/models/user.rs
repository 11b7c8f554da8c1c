use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The signed-in user as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl User {
    pub fn new<P, R>(email: impl Into<String>, permissions: P, roles: R) -> Self
    where
        P: IntoIterator<Item = String>,
        R: IntoIterator<Item = String>,
    {
        Self {
            email: email.into(),
            permissions: permissions.into_iter().collect(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Check access against a set of required permissions and roles.
    ///
    /// Every listed permission must be held. When roles are listed, holding
    /// any one of them is enough. Empty lists do not restrict access.
    pub fn can(&self, permissions: &[&str], roles: &[&str]) -> bool {
        let has_all_permissions = permissions.iter().all(|p| self.has_permission(p));
        let has_any_role = roles.is_empty() || roles.iter().any(|r| self.has_role(r));
        has_all_permissions && has_any_role
    }
}

/// Email/password pair submitted on sign-in. Never persisted.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> User {
        User::new(
            "diego@example.com",
            vec!["metrics.list".to_string(), "users.list".to_string()],
            vec!["editor".to_string()],
        )
    }

    #[test]
    fn test_can_requires_all_permissions() {
        let user = editor();
        assert!(user.can(&["metrics.list"], &[]));
        assert!(user.can(&["metrics.list", "users.list"], &[]));
        assert!(!user.can(&["metrics.list", "users.create"], &[]));
    }

    #[test]
    fn test_can_requires_any_role() {
        let user = editor();
        assert!(user.can(&[], &["administrator", "editor"]));
        assert!(!user.can(&[], &["administrator"]));
        assert!(!user.can(&["metrics.list"], &["administrator"]));
    }

    #[test]
    fn test_can_with_no_requirements() {
        let user = User::new("nobody@example.com", Vec::new(), Vec::new());
        assert!(user.can(&[], &[]));
    }

    #[test]
    fn test_user_deserializes_without_lists() {
        let user: User = serde_json::from_str(r#"{"email":"a@b.c"}"#)
            .expect("Failed to parse user JSON");
        assert_eq!(user.email, "a@b.c");
        assert!(user.permissions.is_empty());
        assert!(user.roles.is_empty());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials::new("a@b.c", "hunter2");
        let printed = format!("{:?}", credentials);
        assert!(printed.contains("a@b.c"));
        assert!(!printed.contains("hunter2"));
    }
}
