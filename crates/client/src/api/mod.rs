//! Catalog REST API client.
//!
//! [`CafeApi`] wraps a `reqwest::Client` configured once with the base URL
//! and timeout. Every request goes through [`BearerAuth`] before dispatch,
//! which reads the persisted token and attaches `Authorization: Bearer` when
//! one exists. The decorator is an explicit step of [`CafeApi::send`] rather
//! than global interception, so requests built elsewhere are never touched.
//!
//! # Endpoints
//!
//! | method | path | used by |
//! |---|---|---|
//! | `GET` | `/auth` | token validation |
//! | `POST` | `/auth/login` | sign-in |
//! | `POST` | `/usuarios` | sign-up |
//! | `GET` | `/productos?limite=N` | product list |
//! | `POST` | `/productos` | create product |
//! | `GET`/`PUT`/`DELETE` | `/productos/:id` | single product |
//! | `PUT` | `/uploads/productos/:id` | image upload (multipart) |
//! | `GET` | `/categorias` | category list |

mod types;

pub use types::{
    AuthResponse, CategoriesResponse, Credentials, ImageAsset, ProductsResponse, Registration,
};

use std::sync::Arc;

use cafe_catalog_core::{CategoryId, Product, ProductId};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ApiError, ErrorBody};
use crate::storage::{KeyValueStore, TOKEN_KEY};
use types::ProductRequest;

/// Multipart field carrying the uploaded file.
const UPLOAD_FIELD: &str = "archivo";

/// Request decorator attaching the persisted bearer token.
#[derive(Clone)]
pub struct BearerAuth {
    storage: Arc<dyn KeyValueStore>,
}

impl BearerAuth {
    /// Create a decorator reading from `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Attach `Authorization: Bearer <token>` if a token is stored.
    ///
    /// A storage failure sends the request unauthenticated; the server then
    /// decides.
    pub async fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self.storage.get_item(TOKEN_KEY).await {
            Ok(Some(token)) if !token.is_empty() => request.bearer_auth(token),
            Ok(_) => request,
            Err(e) => {
                warn!(error = %e, "Could not read token, sending request without it");
                request
            }
        }
    }
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth").finish_non_exhaustive()
    }
}

/// Catalog API client.
///
/// Cheap to clone; clones share the connection pool and token storage.
#[derive(Clone)]
pub struct CafeApi {
    inner: Arc<CafeApiInner>,
}

struct CafeApiInner {
    client: reqwest::Client,
    base_url: Url,
    storage: Arc<dyn KeyValueStore>,
    auth: BearerAuth,
}

impl std::fmt::Debug for CafeApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CafeApi")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl CafeApi {
    /// Create a client for `config.base_url` using `storage` for the token.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry a path or the HTTP
    /// client cannot be built.
    pub fn new(config: &ClientConfig, storage: Arc<dyn KeyValueStore>) -> Result<Self, ApiError> {
        if config.base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(config.base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(CafeApiInner {
                client,
                base_url: config.base_url.clone(),
                auth: BearerAuth::new(Arc::clone(&storage)),
                storage,
            }),
        })
    }

    /// Token storage shared with the request decorator.
    #[must_use]
    pub fn storage(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.inner.storage)
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Validate the persisted token. The server answers with a rotated one.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or malformed body.
    #[instrument(skip(self))]
    pub async fn validate_token(&self) -> Result<AuthResponse, ApiError> {
        let request = self.request(Method::GET, &["auth"])?;
        self.send(request).await
    }

    /// Exchange credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or malformed body.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let request = self
            .request(Method::POST, &["auth", "login"])?
            .json(&credentials.to_request());
        self.send(request).await
    }

    /// Create an account and obtain a token.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or malformed body.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        let request = self
            .request(Method::POST, &["usuarios"])?
            .json(&registration.to_request());
        self.send(request).await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Fetch up to `limit` products.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or malformed body.
    #[instrument(skip(self))]
    pub async fn list_products(&self, limit: u32) -> Result<ProductsResponse, ApiError> {
        let request = self
            .request(Method::GET, &["productos"])?
            .query(&[("limite", limit)]);
        self.send(request).await
    }

    /// Fetch a single product.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or malformed body.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let request = self.request(Method::GET, &["productos", id.as_str()])?;
        self.send(request).await
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or malformed body.
    #[instrument(skip(self), fields(category = %category_id))]
    pub async fn create_product(
        &self,
        category_id: &CategoryId,
        name: &str,
    ) -> Result<Product, ApiError> {
        let request = self
            .request(Method::POST, &["productos"])?
            .json(&ProductRequest {
                nombre: name,
                categoria: category_id,
            });
        self.send(request).await
    }

    /// Update a product's name and category.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or malformed body.
    #[instrument(skip(self), fields(id = %id, category = %category_id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        category_id: &CategoryId,
        name: &str,
    ) -> Result<Product, ApiError> {
        let request = self
            .request(Method::PUT, &["productos", id.as_str()])?
            .json(&ProductRequest {
                nombre: name,
                categoria: category_id,
            });
        self.send(request).await
    }

    /// Delete a product. The server echoes the deleted record.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or malformed body.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let request = self.request(Method::DELETE, &["productos", id.as_str()])?;
        self.send(request).await
    }

    /// Upload an image for a product as multipart field `archivo`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, on transport failure,
    /// non-2xx status or malformed body.
    #[instrument(skip(self, asset), fields(id = %id, path = %asset.path.display()))]
    pub async fn upload_product_image(
        &self,
        id: &ProductId,
        asset: &ImageAsset,
    ) -> Result<Product, ApiError> {
        let bytes = tokio::fs::read(&asset.path).await?;
        let part = Part::bytes(bytes)
            .file_name(asset.upload_name())
            .mime_str(&asset.upload_mime())?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let request = self
            .request(Method::PUT, &["uploads", "productos", id.as_str()])?
            .multipart(form);
        self.send(request).await
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Fetch all categories.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or malformed body.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<CategoriesResponse, ApiError> {
        let request = self.request(Method::GET, &["categorias"])?;
        self.send(request).await
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    /// Resolve `segments` against the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        Ok(self.inner.client.request(method, self.endpoint(segments)?))
    }

    /// Decorate and dispatch a request, decoding a JSON body on success.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.inner.auth.apply(request).await.send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.bytes().await?;

        if !status.is_success() {
            let body = serde_json::from_slice::<ErrorBody>(&body).ok();
            warn!(%status, path = %url, "Catalog API returned an error");
            return Err(ApiError::Status { status, body });
        }

        debug!(%status, path = %url, "Catalog API request succeeded");
        serde_json::from_slice(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }
}
