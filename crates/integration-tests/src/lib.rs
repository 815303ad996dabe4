//! Integration test helpers for the Sanital storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p sanital-integration-tests
//! ```
//!
//! Nothing external is needed: [`FakeBackend`] serves the backend REST API
//! on a loopback port and [`TestClient`] drives the storefront router
//! in-process, carrying the session cookie between requests.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Method, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sanital_storefront::config::StorefrontConfig;
use sanital_storefront::state::AppState;
use sanital_storefront::storage::MemoryStorage;
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;

/// Password accepted by the fake backend for every account.
pub const PASSWORD: &str = "segreto";

/// Admin account known to the fake backend.
pub const ADMIN_EMAIL: &str = "admin@sanital.it";

/// Customer account known to the fake backend.
pub const CUSTOMER_EMAIL: &str = "mario@sanital.it";

// =============================================================================
// Fake backend
// =============================================================================

/// What the fake backend has been sent.
#[derive(Debug, Default)]
pub struct Recorded {
    pub orders: Vec<Value>,
    pub uploads: Vec<String>,
    pub product_requests: usize,
    pub deleted: Vec<String>,
}

#[derive(Clone)]
struct BackendState {
    products: Value,
    recorded: Arc<Mutex<Recorded>>,
    fail_orders: bool,
}

/// A backend REST API serving a fixed catalog on a loopback port.
pub struct FakeBackend {
    pub url: Url,
    recorded: Arc<Mutex<Recorded>>,
}

impl FakeBackend {
    /// Start a backend serving [`catalog`].
    pub async fn start() -> Self {
        Self::start_with(catalog(), false).await
    }

    /// Start a backend whose `POST /orders` always fails with a 500.
    pub async fn start_failing_orders() -> Self {
        Self::start_with(catalog(), true).await
    }

    async fn start_with(products: Value, fail_orders: bool) -> Self {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let state = BackendState {
            products,
            recorded: Arc::clone(&recorded),
            fail_orders,
        };

        let app = Router::new()
            .route("/products", get(list_products))
            .route("/products/upload-csv", post(upload_csv))
            .route(
                "/products/{id}",
                get(get_product).patch(patch_product).delete(delete_product),
            )
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/users/profile", get(profile))
            .route("/orders", post(create_order))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: Url::parse(&format!("http://{addr}/")).unwrap(),
            recorded,
        }
    }

    /// Inspect what the backend has received.
    pub fn recorded<T>(&self, f: impl FnOnce(&Recorded) -> T) -> T {
        f(&self.recorded.lock().unwrap())
    }
}

/// The catalog served by [`FakeBackend`], in the backend's loose shapes.
#[must_use]
pub fn catalog() -> Value {
    json!([
        {"_id": "P1", "name": "Detergente Pavimenti", "description": "Detergente professionale",
         "price": "10,00", "category": "Detergenti", "image_main": "/img/p1.jpg", "onHomepage": true},
        {"id": 2, "name": "Guanti Nitrile", "description": "Guanti monouso",
         "price": 4.5, "category": "Protezione", "img": "/img/p2.jpg"},
        {"_id": "P3", "name": "Sgrassatore", "description": "Sgrassatore universale",
         "price": 7, "category": "Detergenti", "onHomepage": true},
        {"name": "Record senza id", "price": 1}
    ])
}

/// A JWT-shaped token whose payload is `claims`.
#[must_use]
pub fn token_for(claims: &Value) -> String {
    format!(
        "eyJhbGciOiJIUzI1NiJ9.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

async fn list_products(State(state): State<BackendState>) -> Json<Value> {
    state.recorded.lock().unwrap().product_requests += 1;
    Json(json!({ "data": state.products }))
}

async fn get_product(State(state): State<BackendState>, Path(id): Path<String>) -> Response {
    let found = state.products.as_array().and_then(|products| {
        products.iter().find(|p| {
            p.get("_id").and_then(Value::as_str) == Some(id.as_str())
                || p.get("id").map(Value::to_string).as_deref() == Some(id.as_str())
        })
    });
    match found {
        Some(product) => Json(product.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"statusCode": 404, "message": "Product not found"})),
        )
            .into_response(),
    }
}

async fn patch_product(Path(_id): Path<String>, Json(_body): Json<Value>) -> StatusCode {
    StatusCode::OK
}

async fn delete_product(State(state): State<BackendState>, Path(id): Path<String>) -> StatusCode {
    state.recorded.lock().unwrap().deleted.push(id);
    StatusCode::OK
}

async fn upload_csv(State(state): State<BackendState>, headers: HeaderMap) -> StatusCode {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.recorded.lock().unwrap().uploads.push(content_type);
    StatusCode::CREATED
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid credentials"})),
        )
            .into_response();
    }

    // The admin token carries its role; customers must be looked up
    let claims = if body["email"] == ADMIN_EMAIL {
        json!({"sub": "u-admin", "email": ADMIN_EMAIL, "role": "admin"})
    } else {
        json!({"sub": "u-customer", "email": body["email"]})
    };
    Json(json!({ "access_token": token_for(&claims) })).into_response()
}

async fn register(Json(_body): Json<Value>) -> StatusCode {
    StatusCode::CREATED
}

async fn profile(headers: HeaderMap) -> Response {
    if headers.get(header::AUTHORIZATION).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({"_id": "u-customer", "email": CUSTOMER_EMAIL, "role": "user"})).into_response()
}

async fn create_order(State(state): State<BackendState>, Json(order): Json<Value>) -> Response {
    if state.fail_orders {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "database unavailable"})),
        )
            .into_response();
    }
    state.recorded.lock().unwrap().orders.push(order);
    (StatusCode::CREATED, Json(json!({"_id": "order-1"}))).into_response()
}

// =============================================================================
// Storefront client
// =============================================================================

/// Drives the storefront router in-process, keeping the session cookie.
pub struct TestClient {
    app: Router,
    cookies: BTreeMap<String, String>,
    pub storage: Arc<MemoryStorage>,
}

impl TestClient {
    /// A storefront talking to `backend`, persisting carts in memory.
    #[must_use]
    pub fn new(backend: &FakeBackend) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        Self::with_storage(backend, storage)
    }

    /// A storefront talking to `backend`, persisting carts in `storage`.
    #[must_use]
    pub fn with_storage(backend: &FakeBackend, storage: Arc<MemoryStorage>) -> Self {
        let config = StorefrontConfig::with_api_url(backend.url.clone());
        let state = AppState::new(config, storage.clone()).unwrap();
        Self {
            app: sanital_storefront::app(state),
            cookies: BTreeMap::new(),
            storage,
        }
    }

    /// Forget every cookie, as a new visitor would.
    pub fn forget_session(&mut self) {
        self.cookies.clear();
    }

    /// Present the cookies `other` holds, as the same browser would after
    /// a restart.
    pub fn adopt_cookies(&mut self, other: &TestClient) {
        self.cookies = other.cookies.clone();
    }

    /// The value of cookie `name`, if set.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    /// Send a JSON request and parse the JSON response (`null` when empty).
    pub async fn send(
        &mut self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        self.send_request(request).await
    }

    /// Send a prepared request, adding the stored cookies.
    pub async fn send_request(&mut self, mut request: Request<Body>) -> (StatusCode, Value) {
        if !self.cookies.is_empty() && !request.headers().contains_key(header::COOKIE) {
            let header = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            request
                .headers_mut()
                .insert(header::COOKIE, header.parse().unwrap());
        }

        let response = self.app.clone().oneshot(request).await.unwrap();
        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();
            if value.is_empty() {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    /// Log in and assert success.
    pub async fn login(&mut self, email: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/auth/login",
                json!({"email": email, "password": PASSWORD}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body
    }
}

/// A complete checkout form.
#[must_use]
pub fn checkout_form() -> Value {
    json!({
        "first_name": "Mario",
        "last_name": "Rossi",
        "email": CUSTOMER_EMAIL,
        "phone": "3331234567",
        "address": "Via Roma 1",
        "city": "Milano",
        "zip": "20100",
        "province": "MI",
        "notes": "Citofono 3",
        "payment_method": "bonifico"
    })
}
