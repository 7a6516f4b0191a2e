//! Integration test harness for the Yakimoto shop.
//!
//! Both web apps run in-process against an in-memory fake of the shop REST
//! backend, with `MemoryStore` sessions. No database or network services are
//! needed; the session pools are lazy and never connect.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p yakimoto-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::Mutex;
use tower_sessions::MemoryStore;
use yakimoto_core::ProductId;
use yakimoto_core::catalog::{Category, Product};
use yakimoto_core::checkout::OrderRequest;
use yakimoto_core::inventory::Location;

/// The shop password the fake backend accepts.
pub const ADMIN_PASSWORD: &str = "judo-2026";

/// Client secret returned for every payment intent.
pub const CLIENT_SECRET: &str = "pi_test_123_secret_456";

// =============================================================================
// Fake Backend
// =============================================================================

/// An inventory move as the backend received it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecordedMove {
    pub size: String,
    pub quantity: i64,
    pub from_location: Location,
    pub to_location: Location,
}

/// Everything the fake backend stores or has been sent.
#[derive(Debug, Default)]
pub struct BackendData {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub orders: Vec<OrderRequest>,
    pub payment_intents: Vec<OrderRequest>,
    pub confirmations: Vec<Value>,
    pub moves: Vec<(ProductId, RecordedMove)>,
    /// Token issued at the last successful login
    pub token: Option<String>,
    /// When set, every authenticated call is refused with 401
    pub reject_tokens: bool,
}

/// Handle on a running fake backend.
#[derive(Clone)]
pub struct FakeBackend {
    pub url: String,
    data: Arc<Mutex<BackendData>>,
}

impl FakeBackend {
    /// Start the fake on a random local port with the given catalog.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start(products: Vec<Product>, categories: Vec<Category>) -> Self {
        let data = Arc::new(Mutex::new(BackendData {
            products,
            categories,
            ..BackendData::default()
        }));
        let router = fake_routes().with_state(Arc::clone(&data));
        let url = serve(router).await;
        Self { url, data }
    }

    /// Inspect or change the stored state.
    pub async fn data(&self) -> tokio::sync::MutexGuard<'_, BackendData> {
        self.data.lock().await
    }

    /// Refuse every token from now on, as after a key rotation.
    pub async fn revoke_tokens(&self) {
        self.data.lock().await.reject_tokens = true;
    }
}

type Shared = State<Arc<Mutex<BackendData>>>;

fn fake_routes() -> Router<Arc<Mutex<BackendData>>> {
    Router::new()
        .route("/", get(|| async { Json(json!({ "message": "Yakimoto API" })) }))
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/products/{id}/move-inventory", post(move_inventory))
        .route("/categories", get(list_categories))
        .route(
            "/stripe-publishable-key",
            get(|| async { Json(json!({ "publishable_key": "pk_test_yakimoto" })) }),
        )
        .route("/checkout", post(checkout))
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/confirm-payment", post(confirm_payment))
        .route("/login", post(login))
        .route("/admin/thumbnail-status", get(thumbnail_status))
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

async fn list_products(State(data): Shared) -> Json<Vec<Product>> {
    Json(data.lock().await.products.clone())
}

async fn get_product(State(data): Shared, Path(id): Path<i64>) -> Response {
    let data = data.lock().await;
    match data.products.iter().find(|p| p.id.as_i64() == id) {
        Some(product) => Json(product.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Product not found"),
    }
}

async fn list_categories(State(data): Shared) -> Json<Vec<Category>> {
    Json(data.lock().await.categories.clone())
}

async fn checkout(State(data): Shared, Json(order): Json<OrderRequest>) -> Json<Value> {
    data.lock().await.orders.push(order);
    Json(json!({ "message": "Order received" }))
}

async fn create_payment_intent(State(data): Shared, Json(order): Json<OrderRequest>) -> Json<Value> {
    data.lock().await.payment_intents.push(order);
    Json(json!({ "client_secret": CLIENT_SECRET }))
}

async fn confirm_payment(State(data): Shared, Json(body): Json<Value>) -> Json<Value> {
    data.lock().await.confirmations.push(body);
    Json(json!({ "message": "Payment confirmed" }))
}

#[derive(Deserialize)]
struct LoginBody {
    password: String,
    #[serde(default)]
    remember_me: bool,
}

async fn login(State(data): Shared, Form(body): Form<LoginBody>) -> Response {
    if body.password != ADMIN_PASSWORD {
        return detail(StatusCode::UNAUTHORIZED, "Incorrect password");
    }
    let lifetime = if body.remember_me {
        chrono::Duration::days(30)
    } else {
        chrono::Duration::hours(8)
    };
    let expires = chrono::Utc::now() + lifetime;
    #[allow(clippy::cast_precision_loss)]
    let exp = expires.timestamp() as f64 + f64::from(expires.timestamp_subsec_micros()) / 1e6;
    let token = token_expiring_at(exp);
    data.lock().await.token = Some(token.clone());
    Json(json!({ "token": token })).into_response()
}

/// Check the bearer token against the one issued at login.
fn authorized(data: &BackendData, headers: &HeaderMap) -> bool {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    !data.reject_tokens && presented.is_some() && presented == data.token.as_deref()
}

async fn move_inventory(
    State(data): Shared,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Form(body): Form<RecordedMove>,
) -> Response {
    let mut data = data.lock().await;
    if !authorized(&data, &headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    let Some(product) = data.products.iter_mut().find(|p| p.id.as_i64() == id) else {
        return detail(StatusCode::NOT_FOUND, "Product not found");
    };
    if let Err(e) = product.sizes.move_between(
        &body.size,
        body.quantity,
        body.from_location,
        body.to_location,
    ) {
        return detail(StatusCode::BAD_REQUEST, &e.to_string());
    }
    data.moves.push((ProductId::new(id), body));
    Json(json!({ "message": "Inventory moved" })).into_response()
}

async fn thumbnail_status(State(data): Shared, headers: HeaderMap) -> Response {
    let data = data.lock().await;
    if !authorized(&data, &headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    Json(json!({
        "with_thumbnails": ["gi.jpg"],
        "without_thumbnails": [],
        "missing_originals": [],
        "total": 1,
        "thumbnail_count": 1,
        "missing_count": 0
    }))
    .into_response()
}

/// An unsigned JWT carrying only an `exp` claim.
///
/// `exp` is written as a JSON float, the way the Python backend signs it.
#[must_use]
pub fn token_expiring_at(exp: f64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(json!({ "sub": "admin", "exp": exp }).to_string());
    format!("{header}.{claims}.c2lnbmF0dXJl")
}

// =============================================================================
// Fixtures
// =============================================================================

/// A judogi with stock in both locations.
///
/// # Panics
///
/// Panics if the fixture JSON no longer matches `Product`.
#[must_use]
pub fn judogi() -> Product {
    serde_json::from_value(json!({
        "id": 7,
        "name": "Judogi Yakimoto Kids",
        "price": 500,
        "sizes": { "130": { "online": 3, "club": 1 }, "140": { "online": 0, "club": 2 } },
        "images": ["gi.jpg"],
        "categories": [{ "id": 1, "name": "judo" }],
        "category": "judo",
        "color": "vit"
    }))
    .expect("judogi fixture")
}

/// The single category of the fixture catalog.
///
/// # Panics
///
/// Panics if the fixture JSON no longer matches `Category`.
#[must_use]
pub fn judo_category() -> Category {
    serde_json::from_value(json!({ "id": 1, "name": "judo", "display_order": 0 }))
        .expect("category fixture")
}

// =============================================================================
// App Servers
// =============================================================================

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local port");
    let addr = listener.local_addr().expect("local address");
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    });
    format!("http://{addr}")
}

fn lazy_pool() -> sqlx::PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .expect("lazy pool")
}

/// Start the storefront against `backend_url` and return its base URL.
///
/// # Panics
///
/// Panics if the app cannot be built or no port can be bound.
pub async fn spawn_storefront(backend_url: &str) -> String {
    use yakimoto_storefront::config::{
        AnalyticsConfig, BackendConfig, ShopConfig, StorefrontConfig,
    };

    let config = StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/unused"),
        host: "127.0.0.1".parse().expect("loopback"),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        backend: BackendConfig {
            api_url: backend_url.to_string(),
            timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(60),
        },
        shop: ShopConfig::default(),
        analytics: AnalyticsConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    };
    let state = yakimoto_storefront::state::AppState::new(config, lazy_pool())
        .expect("storefront state");
    let layer = yakimoto_storefront::middleware::session_layer(MemoryStore::default(), false);
    serve(yakimoto_storefront::app(state, layer)).await
}

/// Start the admin panel against `backend_url` and return its base URL.
///
/// # Panics
///
/// Panics if the app cannot be built or no port can be bound.
pub async fn spawn_admin(backend_url: &str) -> String {
    use yakimoto_admin::config::AdminConfig;

    let config = AdminConfig {
        database_url: SecretString::from("postgres://localhost/unused"),
        host: "127.0.0.1".parse().expect("loopback"),
        port: 0,
        base_url: "http://localhost:3001".to_string(),
        backend_api_url: backend_url.to_string(),
        backend_timeout: Duration::from_secs(5),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
        tls: None,
    };
    let state = yakimoto_admin::state::AppState::new(config, lazy_pool()).expect("admin state");
    let layer = yakimoto_admin::middleware::session_layer(MemoryStore::default(), false);
    serve(yakimoto_admin::app(state, layer)).await
}

/// A browser-like client: keeps cookies, does not follow redirects.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialized.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("http client")
}

/// `Location` header of a redirect response.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}
