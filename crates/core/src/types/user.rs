//! Catalog user as returned by the authentication endpoints.

use serde::{Deserialize, Serialize};

use super::{UserId, UserRole};

/// A catalog user.
///
/// Deserialized from the `usuario` object of the login, registration and
/// token validation responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned id.
    #[serde(rename = "uid", alias = "_id")]
    pub id: UserId,
    /// Display name.
    #[serde(rename = "nombre")]
    pub name: String,
    /// Login email.
    #[serde(rename = "correo")]
    pub email: String,
    /// Permission role.
    #[serde(rename = "rol")]
    pub role: UserRole,
    /// Avatar URL.
    #[serde(rename = "img", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Whether the account is enabled.
    #[serde(rename = "estado", default = "default_true")]
    pub active: bool,
    /// Whether the account was created through Google sign-in.
    #[serde(default)]
    pub google: bool,
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_from_wire() {
        let json = r#"{
            "rol": "ADMIN_ROLE",
            "estado": true,
            "google": false,
            "nombre": "Test 1",
            "correo": "test1@test.com",
            "uid": "60a6d0b1c2"
        }"#;

        let user: User = serde_json::from_str(json).expect("deserialize");
        assert_eq!(user.id.as_str(), "60a6d0b1c2");
        assert_eq!(user.name, "Test 1");
        assert_eq!(user.email, "test1@test.com");
        assert_eq!(user.role, UserRole::Admin);
        assert!(user.image_url.is_none());
        assert!(user.active);
    }

    #[test]
    fn test_user_accepts_mongo_id_alias() {
        let json = r#"{"_id": "abc", "nombre": "Ana", "correo": "ana@cafe.com", "rol": "USER_ROLE"}"#;
        let user: User = serde_json::from_str(json).expect("deserialize");
        assert_eq!(user.id.as_str(), "abc");
        assert!(user.active);
        assert!(!user.google);
    }
}
