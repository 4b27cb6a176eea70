//! Status enums for sessions and users.

use serde::{Deserialize, Serialize};

/// Authentication status of the client session.
///
/// Every session starts in [`SessionStatus::Checking`] until the persisted
/// token (if any) has been validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    /// Persisted token is being validated.
    #[default]
    Checking,
    /// A valid token is held.
    Authenticated,
    /// No token is held.
    NotAuthenticated,
}

impl SessionStatus {
    /// Whether the status is [`SessionStatus::Authenticated`].
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Checking => write!(f, "checking"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::NotAuthenticated => write!(f, "not-authenticated"),
        }
    }
}

/// Role assigned to a catalog user by the server.
///
/// Unknown roles are preserved in [`UserRole::Other`] so a newer server
/// never breaks deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    /// Full catalog administration.
    Admin,
    /// Regular user.
    User,
    /// Sales staff.
    Sales,
    /// Any role string this client does not know about.
    Other(String),
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "ADMIN_ROLE"),
            Self::User => write!(f, "USER_ROLE"),
            Self::Sales => write!(f, "VENTAS_ROLE"),
            Self::Other(role) => write!(f, "{role}"),
        }
    }
}

impl From<String> for UserRole {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ADMIN_ROLE" => Self::Admin,
            "USER_ROLE" => Self::User,
            "VENTAS_ROLE" => Self::Sales,
            _ => Self::Other(s),
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.to_string()
    }
}

impl std::str::FromStr for UserRole {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_status_default_is_checking() {
        assert_eq!(SessionStatus::default(), SessionStatus::Checking);
    }

    #[test]
    fn test_session_status_display() {
        assert_eq!(SessionStatus::NotAuthenticated.to_string(), "not-authenticated");
        assert_eq!(
            serde_json::to_string(&SessionStatus::NotAuthenticated).expect("serialize"),
            r#""not-authenticated""#
        );
    }

    #[test]
    fn test_user_role_wire_names() {
        let role: UserRole = serde_json::from_str(r#""VENTAS_ROLE""#).expect("deserialize");
        assert_eq!(role, UserRole::Sales);
        assert_eq!(
            serde_json::to_string(&UserRole::Admin).expect("serialize"),
            r#""ADMIN_ROLE""#
        );
    }

    #[test]
    fn test_user_role_unknown_is_preserved() {
        let role: UserRole = "BARISTA_ROLE".parse().expect("infallible");
        assert_eq!(role, UserRole::Other("BARISTA_ROLE".to_string()));
        assert_eq!(role.to_string(), "BARISTA_ROLE");
    }
}
