//! Request and response types for the catalog API.

use std::path::{Path, PathBuf};

use cafe_catalog_core::{Category, CategoryId, Product, User};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Login form contents.
#[derive(Clone)]
pub struct Credentials {
    /// Login email.
    pub email: String,
    /// Account password.
    pub password: SecretString,
}

impl Credentials {
    /// Create credentials.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub(crate) fn to_request(&self) -> LoginRequest<'_> {
        LoginRequest {
            correo: &self.email,
            password: self.password.expose_secret(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Registration form contents.
#[derive(Clone)]
pub struct Registration {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Account password.
    pub password: SecretString,
}

impl Registration {
    /// Create a registration.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub(crate) fn to_request(&self) -> RegisterRequest<'_> {
        RegisterRequest {
            nombre: &self.name,
            correo: &self.email,
            password: self.password.expose_secret(),
        }
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Body of `POST /auth/login`.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    correo: &'a str,
    password: &'a str,
}

/// Body of `POST /usuarios`.
#[derive(Serialize)]
pub(crate) struct RegisterRequest<'a> {
    nombre: &'a str,
    correo: &'a str,
    password: &'a str,
}

/// Body of `POST /productos` and `PUT /productos/:id`.
#[derive(Serialize)]
pub(crate) struct ProductRequest<'a> {
    pub nombre: &'a str,
    pub categoria: &'a CategoryId,
}

/// Response of the login, registration and token validation endpoints.
#[derive(Deserialize)]
pub struct AuthResponse {
    /// Freshly issued token.
    pub token: String,
    /// Authenticated user.
    #[serde(alias = "user")]
    pub usuario: User,
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("token", &"[REDACTED]")
            .field("usuario", &self.usuario)
            .finish()
    }
}

/// Response of `GET /productos`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductsResponse {
    /// Total products on the server.
    #[serde(default)]
    pub total: u64,
    /// The requested page.
    pub productos: Vec<Product>,
}

/// Response of `GET /categorias`.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesResponse {
    /// Total categories on the server.
    #[serde(default)]
    pub total: u64,
    /// The categories.
    pub categorias: Vec<Category>,
}

/// A local image picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// Local file path.
    pub path: PathBuf,
    /// File name sent to the server; defaults to the path's file name.
    pub file_name: Option<String>,
    /// MIME type; guessed from the extension when absent.
    pub mime_type: Option<String>,
}

impl ImageAsset {
    /// Asset for a local file, with name and type derived from the path.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file_name: None,
            mime_type: None,
        }
    }

    /// File name to send.
    #[must_use]
    pub fn upload_name(&self) -> String {
        self.file_name.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned())
        })
    }

    /// MIME type to send.
    #[must_use]
    pub fn upload_mime(&self) -> String {
        self.mime_type
            .clone()
            .unwrap_or_else(|| guess_mime(&self.path))
    }
}

fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
