//! Integration test support for the cafe catalog client.
//!
//! [`FakeCafeApi`] is an in-process stand-in for the catalog API, served by
//! axum on `127.0.0.1:0` under `/api`. It implements the endpoints the client
//! uses with the same wire shapes and error bodies as the real server, and
//! records what it received so tests can assert on it.
//!
//! Tokens are issued sequentially (`t1`, `t2`, ...) and every successful
//! `GET /auth` rotates the token.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cafe-catalog-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use cafe_catalog_client::{CafeApi, ClientConfig, KeyValueStore};
use cafe_catalog_core::{
    Category, CategoryId, CategoryRef, Product, ProductId, User, UserId, UserRef, UserRole,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// A file received by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Product the image was uploaded for.
    pub product_id: ProductId,
    /// Multipart field name.
    pub field: String,
    /// File name sent by the client.
    pub file_name: Option<String>,
    /// Content type sent by the client.
    pub content_type: Option<String>,
    /// Uploaded bytes.
    pub bytes: Vec<u8>,
}

struct Account {
    user: User,
    password: String,
}

/// Server-side state of the fake.
#[derive(Default)]
pub struct FakeState {
    accounts: Vec<Account>,
    tokens: HashMap<String, UserId>,
    products: Vec<Product>,
    categories: Vec<Category>,
    token_counter: u64,
    id_counter: u64,
    /// Answer every `GET /auth` with 401.
    pub reject_token_validation: bool,
    /// Id echoed by `DELETE /productos/:id` instead of the deleted one.
    pub delete_echo: Option<ProductId>,
    /// Files received by the upload endpoint.
    pub uploads: Vec<Upload>,
    /// `Authorization` header of every request, in order.
    pub authorization_headers: Vec<Option<String>>,
}

impl FakeState {
    fn issue_token(&mut self, user: &UserId) -> String {
        self.token_counter += 1;
        let token = format!("t{}", self.token_counter);
        self.tokens.insert(token.clone(), user.clone());
        token
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.id_counter += 1;
        format!("{prefix}{}", self.id_counter)
    }

    fn user(&self, id: &UserId) -> Option<&User> {
        self.accounts.iter().map(|a| &a.user).find(|u| &u.id == id)
    }

    fn category_ref(&self, id: &CategoryId) -> Option<CategoryRef> {
        self.categories
            .iter()
            .find(|c| &c.id == id)
            .map(|c| CategoryRef {
                id: c.id.clone(),
                name: Some(c.name.clone()),
            })
    }

    /// Record the request and resolve its bearer token to a user.
    fn authorize(&mut self, headers: &HeaderMap) -> Result<User, Response> {
        let header = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.authorization_headers.push(header.clone());

        let token = header
            .as_deref()
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| error_msg(StatusCode::UNAUTHORIZED, "No hay token en la petición"))?;

        self.tokens
            .get(token)
            .and_then(|id| self.user(id))
            .cloned()
            .ok_or_else(|| error_msg(StatusCode::UNAUTHORIZED, "Token no válido"))
    }

    fn record_anonymous(&mut self, headers: &HeaderMap) {
        let header = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.authorization_headers.push(header);
    }
}

type SharedState = Arc<Mutex<FakeState>>;

/// Running fake catalog API.
pub struct FakeCafeApi {
    base_url: String,
    state: SharedState,
    server: JoinHandle<()>,
}

impl Drop for FakeCafeApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl FakeCafeApi {
    /// Start the fake on an ephemeral port.
    pub async fn spawn() -> Self {
        let state = SharedState::default();
        let app = Router::new().nest("/api", routes(Arc::clone(&state)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake API");
        let addr = listener.local_addr().expect("fake API address");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake API server");
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
            server,
        }
    }

    /// Base URL clients should use.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Client configuration pointing at the fake.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url.parse().expect("fake API url"))
    }

    /// Client pointing at the fake, persisting tokens in `storage`.
    #[must_use]
    pub fn client(&self, storage: Arc<dyn KeyValueStore>) -> CafeApi {
        CafeApi::new(&self.config(), storage).expect("client")
    }

    /// Direct access to the server-side state.
    pub async fn state(&self) -> tokio::sync::MutexGuard<'_, FakeState> {
        self.state.lock().await
    }

    /// Register an account directly.
    pub async fn seed_user(&self, name: &str, email: &str, password: &str) -> User {
        let mut state = self.state.lock().await;
        let user = User {
            id: UserId::new(state.next_id("u")),
            name: name.to_string(),
            email: email.to_string(),
            role: UserRole::Admin,
            image_url: None,
            active: true,
            google: false,
        };
        state.accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
        });
        user
    }

    /// Issue a token for an existing account, as a previous login would have.
    pub async fn issue_token(&self, user: &UserId) -> String {
        self.state.lock().await.issue_token(user)
    }

    /// Create a category directly.
    pub async fn seed_category(&self, name: &str) -> Category {
        let mut state = self.state.lock().await;
        let category = Category {
            id: CategoryId::new(state.next_id("c")),
            name: name.to_string(),
            created_by: None,
        };
        state.categories.push(category.clone());
        category
    }

    /// Create a product directly under a chosen id.
    pub async fn seed_product(&self, id: &str, name: &str, category: &CategoryId) -> Product {
        let mut state = self.state.lock().await;
        let product = Product {
            id: ProductId::new(id),
            name: name.to_string(),
            category: state
                .category_ref(category)
                .unwrap_or_else(|| CategoryRef::id_only(category.clone())),
            image_url: None,
            price: None,
            available: true,
            description: None,
            created_by: None,
        };
        state.products.push(product.clone());
        product
    }

    /// Products currently on the server.
    pub async fn products(&self) -> Vec<Product> {
        self.state.lock().await.products.clone()
    }

    /// Most recent `Authorization` header received.
    pub async fn last_authorization(&self) -> Option<String> {
        self.state
            .lock()
            .await
            .authorization_headers
            .last()
            .cloned()
            .flatten()
    }
}

/// An address nothing listens on, for transport-failure tests.
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("address");
    drop(listener);
    format!("http://{addr}/api")
}

fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/auth", get(validate_token))
        .route("/auth/login", post(login))
        .route("/usuarios", post(register))
        .route("/productos", get(list_products).post(create_product))
        .route(
            "/productos/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/uploads/productos/{id}", put(upload_product_image))
        .route("/categorias", get(list_categories))
        .with_state(state)
}

fn error_msg(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "msg": msg }))).into_response()
}

fn validation_errors(errors: &[(&str, String)]) -> Response {
    let errors: Vec<_> = errors
        .iter()
        .map(|(param, msg)| json!({ "msg": msg, "param": param, "location": "body" }))
        .collect();
    (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
}

// =============================================================================
// Auth
// =============================================================================

async fn validate_token(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let mut state = state.lock().await;
    let user = match state.authorize(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if state.reject_token_validation {
        return error_msg(StatusCode::UNAUTHORIZED, "Token no válido");
    }

    let token = state.issue_token(&user.id);
    Json(json!({ "usuario": user, "token": token })).into_response()
}

#[derive(Deserialize)]
struct LoginBody {
    #[serde(default)]
    correo: String,
    #[serde(default)]
    password: String,
}

async fn login(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<LoginBody>,
) -> Response {
    let mut state = state.lock().await;
    state.record_anonymous(&headers);

    if !body.correo.contains('@') {
        return validation_errors(&[("correo", "El correo no es válido".to_string())]);
    }

    let user = state
        .accounts
        .iter()
        .find(|a| a.user.email == body.correo && a.password == body.password)
        .map(|a| a.user.clone());

    match user {
        Some(user) => {
            let token = state.issue_token(&user.id);
            Json(json!({ "usuario": user, "token": token })).into_response()
        }
        None => error_msg(
            StatusCode::BAD_REQUEST,
            "Usuario / Password no son correctos - correo",
        ),
    }
}

#[derive(Deserialize)]
struct RegisterBody {
    #[serde(default)]
    nombre: String,
    #[serde(default)]
    correo: String,
    #[serde(default)]
    password: String,
}

async fn register(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<RegisterBody>,
) -> Response {
    let mut state = state.lock().await;
    state.record_anonymous(&headers);

    let mut errors = Vec::new();
    if body.nombre.trim().is_empty() {
        errors.push(("nombre", "El nombre es obligatorio".to_string()));
    }
    if body.password.len() < 6 {
        errors.push(("password", "El password debe de ser más de 6 letras".to_string()));
    }
    if !body.correo.contains('@') {
        errors.push(("correo", "El correo no es válido".to_string()));
    } else if state.accounts.iter().any(|a| a.user.email == body.correo) {
        errors.push((
            "correo",
            format!("El correo {} ya está registrado", body.correo),
        ));
    }
    if !errors.is_empty() {
        return validation_errors(&errors);
    }

    let user = User {
        id: UserId::new(state.next_id("u")),
        name: body.nombre,
        email: body.correo,
        role: UserRole::User,
        image_url: None,
        active: true,
        google: false,
    };
    state.accounts.push(Account {
        user: user.clone(),
        password: body.password,
    });
    let token = state.issue_token(&user.id);
    Json(json!({ "usuario": user, "token": token })).into_response()
}

// =============================================================================
// Products
// =============================================================================

#[derive(Deserialize)]
struct ListQuery {
    limite: Option<usize>,
}

async fn list_products(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    let mut state = state.lock().await;
    state.record_anonymous(&headers);

    let limit = query.limite.unwrap_or(5);
    let productos: Vec<_> = state.products.iter().take(limit).cloned().collect();
    Json(json!({ "total": state.products.len(), "productos": productos })).into_response()
}

async fn get_product(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut state = state.lock().await;
    state.record_anonymous(&headers);

    match state.products.iter().find(|p| p.id.as_str() == id) {
        Some(product) => Json(product.clone()).into_response(),
        None => error_msg(
            StatusCode::NOT_FOUND,
            &format!("No existe un producto con el id {id}"),
        ),
    }
}

#[derive(Deserialize)]
struct ProductBody {
    #[serde(default)]
    nombre: String,
    #[serde(default)]
    categoria: String,
}

async fn create_product(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<ProductBody>,
) -> Response {
    let mut state = state.lock().await;
    let user = match state.authorize(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };

    if body.nombre.trim().is_empty() {
        return validation_errors(&[("nombre", "El nombre es obligatorio".to_string())]);
    }
    let Some(category) = state.category_ref(&CategoryId::new(body.categoria.clone())) else {
        return validation_errors(&[(
            "categoria",
            format!("La categoria {} no existe", body.categoria),
        )]);
    };
    if state.products.iter().any(|p| p.name == body.nombre) {
        return error_msg(
            StatusCode::BAD_REQUEST,
            &format!("El producto {}, ya existe", body.nombre),
        );
    }

    let product = Product {
        id: ProductId::new(state.next_id("p")),
        name: body.nombre,
        category,
        image_url: None,
        price: None,
        available: true,
        description: None,
        created_by: Some(UserRef {
            id: user.id,
            name: Some(user.name),
        }),
    };
    state.products.push(product.clone());
    (StatusCode::CREATED, Json(product)).into_response()
}

async fn update_product(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ProductBody>,
) -> Response {
    let mut state = state.lock().await;
    if let Err(response) = state.authorize(&headers) {
        return response;
    }

    let Some(category) = state.category_ref(&CategoryId::new(body.categoria.clone())) else {
        return validation_errors(&[(
            "categoria",
            format!("La categoria {} no existe", body.categoria),
        )]);
    };
    let Some(product) = state.products.iter_mut().find(|p| p.id.as_str() == id) else {
        return error_msg(
            StatusCode::NOT_FOUND,
            &format!("No existe un producto con el id {id}"),
        );
    };

    product.name = body.nombre;
    product.category = category;
    Json(product.clone()).into_response()
}

async fn delete_product(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut state = state.lock().await;
    if let Err(response) = state.authorize(&headers) {
        return response;
    }

    let Some(index) = state.products.iter().position(|p| p.id.as_str() == id) else {
        return error_msg(
            StatusCode::NOT_FOUND,
            &format!("No existe un producto con el id {id}"),
        );
    };
    let mut deleted = state.products.remove(index);
    if let Some(echo) = state.delete_echo.clone() {
        deleted.id = echo;
    }
    deleted.available = false;
    Json(deleted).into_response()
}

async fn upload_product_image(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Response {
    if let Err(response) = state.lock().await.authorize(&headers) {
        return response;
    }

    let mut upload = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let Ok(bytes) = field.bytes().await else {
            return error_msg(StatusCode::BAD_REQUEST, "Archivo ilegible");
        };
        if name == "archivo" {
            upload = Some(Upload {
                product_id: ProductId::new(id.clone()),
                field: name,
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
        }
    }

    let Some(upload) = upload else {
        return error_msg(StatusCode::BAD_REQUEST, "No hay archivos que subir");
    };

    let mut state = state.lock().await;
    let url = format!(
        "https://images.example.com/productos/{id}/{}",
        upload.file_name.as_deref().unwrap_or("archivo")
    );
    let Some(product) = state.products.iter_mut().find(|p| p.id.as_str() == id) else {
        return error_msg(
            StatusCode::NOT_FOUND,
            &format!("No existe un producto con el id {id}"),
        );
    };
    product.image_url = Some(url);
    let product = product.clone();
    state.uploads.push(upload);
    Json(product).into_response()
}

// =============================================================================
// Categories
// =============================================================================

async fn list_categories(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let mut state = state.lock().await;
    state.record_anonymous(&headers);
    Json(json!({ "total": state.categories.len(), "categorias": state.categories })).into_response()
}
