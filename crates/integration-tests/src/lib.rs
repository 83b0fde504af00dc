//! End-to-end tests for the FitSupply client.
//!
//! Each test starts an in-process mock of the REST backend on an ephemeral
//! port and drives a real [`Store`] against it over HTTP, with durable state
//! in a temporary directory.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p fitsupply-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session` - Login, registration, bootstrap and 401 teardown
//! - `cart_sync` - Persistence and debounced server upload
//! - `catalog` - Product lookup and staff catalog management
//! - `checkout` - Order placement, history and status updates
//! - `dashboard` - Staff widgets and partial failure

use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use fitsupply_client::{ClientConfig, RecordingNavigator, Store};
use fitsupply_core::User;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use url::Url;

/// A regular shopper account.
pub const CUSTOMER: (&str, &str) = ("jdoe", "secret123");

/// A staff account.
pub const STAFF: (&str, &str) = ("admin", "adminpass");

/// Cart upload quiet period used by every test store.
pub const SYNC_DEBOUNCE: Duration = Duration::from_millis(50);

const API_PREFIX: &str = "/api/v1";

// =============================================================================
// Backend state
// =============================================================================

/// One request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path below the API prefix, e.g. `/cart/`.
    pub path: String,
    pub query: Option<String>,
    pub bearer: Option<String>,
}

#[derive(Debug)]
struct Account {
    username: String,
    password: String,
    profile: Value,
}

/// Everything the mock backend knows.
#[derive(Debug, Default)]
pub struct BackendState {
    accounts: Vec<Account>,
    /// Live access tokens, mapped to usernames.
    tokens: BTreeMap<String, String>,
    issued: u64,
    pub products: Vec<Value>,
    /// Saved carts, keyed by username.
    pub carts: BTreeMap<String, Value>,
    pub orders: Vec<Value>,
    pub requests: Vec<RecordedRequest>,
    /// Answer `?slug=` queries with the unfiltered list.
    pub ignore_slug_filter: bool,
    /// Paths that answer 500.
    pub failing: HashSet<String>,
    /// Paths held back before the handler runs.
    pub delays: BTreeMap<String, Duration>,
}

impl BackendState {
    fn seeded() -> Self {
        Self {
            accounts: vec![
                Account {
                    username: CUSTOMER.0.to_string(),
                    password: CUSTOMER.1.to_string(),
                    profile: json!({
                        "id": 1,
                        "username": CUSTOMER.0,
                        "email": "jane@example.com",
                        "first_name": "Jane",
                        "last_name": "Doe",
                        "phone": "555-0100",
                        "is_staff": false
                    }),
                },
                Account {
                    username: STAFF.0.to_string(),
                    password: STAFF.1.to_string(),
                    profile: json!({
                        "id": 2,
                        "username": STAFF.0,
                        "email": "ops@fitsupply.test",
                        "first_name": "Ada",
                        "last_name": "Admin",
                        "is_staff": true
                    }),
                },
            ],
            products: vec![
                json!({
                    "id": 1,
                    "slug": "whey-isolate",
                    "name": "Whey Isolate",
                    "description": "Cold-filtered whey protein isolate.",
                    "price": "49.99",
                    "compare_price": "59.99",
                    "stock_quantity": 25,
                    "sku": "WHEY-ISO-2KG",
                    "category": { "id": 1, "name": "Protein", "slug": "protein" },
                    "images": [{ "image": "https://cdn.fitsupply.test/whey.jpg" }],
                    "is_active": true,
                    "is_featured": true
                }),
                json!({
                    "id": 2,
                    "slug": "creatine-monohydrate",
                    "name": "Creatine Monohydrate",
                    "description": "Micronized creatine.",
                    "price": "19.50",
                    "stock_quantity": 3,
                    "category": { "id": 2, "name": "Supplements", "slug": "supplements" },
                    "images": ["https://cdn.fitsupply.test/creatine.jpg"],
                    "is_active": true
                }),
                json!({
                    "id": 3,
                    "slug": "shaker-bottle",
                    "name": "Shaker Bottle",
                    "price": 9.99,
                    "stock_quantity": 0,
                    "category": "Accessories",
                    "image": "https://cdn.fitsupply.test/shaker.jpg"
                }),
            ],
            ..Self::default()
        }
    }

    fn profile_for_token(&self, token: &str) -> Option<Value> {
        let username = self.tokens.get(token)?;
        self.accounts
            .iter()
            .find(|a| &a.username == username)
            .map(|a| a.profile.clone())
    }

    fn product_index(&self, key: &str) -> Option<usize> {
        self.products
            .iter()
            .position(|p| p["id"].to_string() == key || p["slug"] == key)
    }
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(shared: &Shared) -> MutexGuard<'_, BackendState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Mock backend
// =============================================================================

/// An in-process FitSupply backend listening on `127.0.0.1`.
pub struct MockBackend {
    addr: SocketAddr,
    shared: Shared,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Start a backend seeded with two accounts and three products.
    pub async fn start() -> Self {
        let shared: Shared = Arc::new(Mutex::new(BackendState::seeded()));
        let app = router(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener
            .local_addr()
            .expect("Mock backend has no local address");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            shared,
            server,
        }
    }

    /// Origin to configure clients with.
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("Mock backend URL is valid")
    }

    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        lock(&self.shared)
    }

    /// Recorded requests matching a method and path.
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.state()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests_to(method, path).len()
    }

    /// Invalidate every issued token, as if they all expired.
    pub fn revoke_tokens(&self) {
        self.state().tokens.clear();
    }

    /// Make a path answer 500.
    pub fn fail(&self, path: &str) {
        self.state().failing.insert(path.to_string());
    }

    /// Hold requests to a path for `delay` before answering.
    pub fn delay(&self, path: &str, delay: Duration) {
        self.state().delays.insert(path.to_string(), delay);
    }

    pub fn ignore_slug_filter(&self) {
        self.state().ignore_slug_filter = true;
    }

    pub fn cart_of(&self, username: &str) -> Option<Value> {
        self.state().carts.get(username).cloned()
    }

    pub fn set_cart(&self, username: &str, cart: Value) {
        self.state().carts.insert(username.to_string(), cart);
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn router(shared: Shared) -> Router {
    let api = Router::new()
        .route("/token/", post(issue_token))
        .route("/register/", post(register))
        .route("/user/", get(current_user))
        .route("/categories/", get(list_categories))
        .route("/products/", get(list_products).post(create_product))
        .route(
            "/products/{key}/",
            get(get_product)
                .put(replace_product)
                .patch(patch_product)
                .delete(delete_product),
        )
        .route("/cart/", get(get_cart).post(save_cart))
        .route("/orders/", get(list_orders).post(create_order))
        .route("/orders/{id}/", axum::routing::patch(update_order))
        .route("/dashboard/summary/", get(dashboard_summary))
        .route("/dashboard/recent-orders/", get(dashboard_recent_orders))
        .route("/dashboard/sales-chart/", get(dashboard_sales_chart));

    Router::new()
        .nest(API_PREFIX, api)
        .layer(middleware::from_fn_with_state(shared.clone(), record))
        .with_state(shared)
}

/// Record every request, then apply any delay or failure set for its path.
async fn record(State(shared): State<Shared>, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    let path = path.strip_prefix(API_PREFIX).unwrap_or(path).to_owned();
    let (failing, delay) = {
        let mut state = lock(&shared);
        state.requests.push(RecordedRequest {
            method: request.method().to_string(),
            path: path.clone(),
            query: request.uri().query().map(str::to_owned),
            bearer: bearer(request.headers()),
        });
        (
            state.failing.contains(&path),
            state.delays.get(&path).copied(),
        )
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if failing {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.");
    }
    next.run(request).await
}

// =============================================================================
// Helpers
// =============================================================================

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn field_error(field: &str, message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ field: [message] }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_owned)
}

fn caller(state: &BackendState, headers: &HeaderMap) -> Result<Value, Response> {
    let token = bearer(headers).ok_or_else(|| {
        detail(
            StatusCode::UNAUTHORIZED,
            "Authentication credentials were not provided.",
        )
    })?;
    state.profile_for_token(&token).ok_or_else(|| {
        detail(
            StatusCode::UNAUTHORIZED,
            "Given token not valid for any token type",
        )
    })
}

fn staff(state: &BackendState, headers: &HeaderMap) -> Result<Value, Response> {
    let profile = caller(state, headers)?;
    if profile["is_staff"] == true {
        Ok(profile)
    } else {
        Err(detail(
            StatusCode::FORBIDDEN,
            "You do not have permission to perform this action.",
        ))
    }
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

async fn issue_token(State(shared): State<Shared>, Json(creds): Json<Credentials>) -> Response {
    let mut state = lock(&shared);
    let known = state
        .accounts
        .iter()
        .any(|a| a.username == creds.username && a.password == creds.password);
    if !known {
        return detail(
            StatusCode::UNAUTHORIZED,
            "No active account found with the given credentials",
        );
    }
    state.issued += 1;
    let access = format!("access-{}-{}", creds.username, state.issued);
    let refresh = format!("refresh-{}", state.issued);
    state.tokens.insert(access.clone(), creds.username);
    Json(json!({ "access": access, "refresh": refresh })).into_response()
}

#[derive(Deserialize)]
struct Signup {
    username: String,
    email: String,
    password: String,
    password2: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

async fn register(State(shared): State<Shared>, Json(form): Json<Signup>) -> Response {
    let mut state = lock(&shared);
    if state.accounts.iter().any(|a| a.username == form.username) {
        return field_error("username", "A user with that username already exists.");
    }
    if form.password != form.password2 {
        return field_error("password", "Password fields didn't match.");
    }
    let profile = json!({
        "id": state.accounts.len() + 1,
        "username": form.username,
        "email": form.email,
        "first_name": form.first_name,
        "last_name": form.last_name,
        "is_staff": false
    });
    state.accounts.push(Account {
        username: form.username,
        password: form.password,
        profile: profile.clone(),
    });
    (
        StatusCode::CREATED,
        Json(json!({ "user": profile, "message": "User registered successfully" })),
    )
        .into_response()
}

async fn current_user(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    match caller(&lock(&shared), &headers) {
        Ok(profile) => Json(profile).into_response(),
        Err(rejection) => rejection,
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Deserialize)]
struct ProductQuery {
    category: Option<String>,
    slug: Option<String>,
}

fn category_matches(category: &Value, filter: &str) -> bool {
    [
        category.as_str(),
        category["name"].as_str(),
        category["slug"].as_str(),
    ]
    .into_iter()
    .flatten()
    .any(|name| name.eq_ignore_ascii_case(filter))
}

async fn list_products(
    State(shared): State<Shared>,
    Query(query): Query<ProductQuery>,
) -> Json<Value> {
    let state = lock(&shared);
    let results: Vec<Value> = state
        .products
        .iter()
        .filter(|p| {
            query
                .slug
                .as_deref()
                .is_none_or(|slug| state.ignore_slug_filter || p["slug"] == slug)
        })
        .filter(|p| {
            query
                .category
                .as_deref()
                .is_none_or(|c| category_matches(&p["category"], c))
        })
        .cloned()
        .collect();
    Json(json!({
        "count": results.len(),
        "next": null,
        "previous": null,
        "results": results
    }))
}

async fn list_categories(State(shared): State<Shared>) -> Json<Value> {
    let state = lock(&shared);
    let mut categories: Vec<Value> = Vec::new();
    for category in state.products.iter().map(|p| &p["category"]) {
        if category.is_object() && !categories.contains(category) {
            categories.push(category.clone());
        }
    }
    Json(Value::Array(categories))
}

async fn get_product(State(shared): State<Shared>, Path(key): Path<String>) -> Response {
    let state = lock(&shared);
    match state.product_index(&key).and_then(|i| state.products.get(i)) {
        Some(product) => Json(product.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Not found."),
    }
}

/// Writes name a category by id; reads embed the category object.
fn embed_category(state: &BackendState, body: &mut Value) {
    let Some(id) = body["category"].as_i64() else {
        return;
    };
    let known = state
        .products
        .iter()
        .map(|p| &p["category"])
        .find(|c| c["id"].as_i64() == Some(id))
        .cloned();
    if let Some(category) = known {
        body["category"] = category;
    }
}

async fn create_product(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    let mut state = lock(&shared);
    if let Err(rejection) = staff(&state, &headers) {
        return rejection;
    }
    if body["slug"].as_str().is_none_or(str::is_empty) {
        return field_error("slug", "This field is required.");
    }
    let id = state
        .products
        .iter()
        .filter_map(|p| p["id"].as_i64())
        .max()
        .unwrap_or(0)
        + 1;
    body["id"] = json!(id);
    embed_category(&state, &mut body);
    state.products.push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

fn write_product(
    shared: &Shared,
    headers: &HeaderMap,
    key: &str,
    mut body: Value,
    replace: bool,
) -> Response {
    let mut state = lock(shared);
    if let Err(rejection) = staff(&state, headers) {
        return rejection;
    }
    embed_category(&state, &mut body);
    let Some(product) = state
        .product_index(key)
        .and_then(|i| state.products.get_mut(i))
    else {
        return detail(StatusCode::NOT_FOUND, "Not found.");
    };
    let id = product["id"].clone();
    if replace {
        *product = body;
        product["id"] = id;
    } else if let (Some(target), Value::Object(fields)) = (product.as_object_mut(), body) {
        target.extend(fields);
    }
    Json(product.clone()).into_response()
}

async fn replace_product(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(key): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    write_product(&shared, &headers, &key, body, true)
}

async fn patch_product(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(key): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    write_product(&shared, &headers, &key, body, false)
}

async fn delete_product(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Response {
    let mut state = lock(&shared);
    if let Err(rejection) = staff(&state, &headers) {
        return rejection;
    }
    match state.product_index(&key) {
        Some(i) => {
            state.products.remove(i);
            StatusCode::NO_CONTENT.into_response()
        }
        None => detail(StatusCode::NOT_FOUND, "Not found."),
    }
}

// =============================================================================
// Cart
// =============================================================================

async fn get_cart(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&shared);
    match caller(&state, &headers) {
        Ok(profile) => {
            let username = profile["username"].as_str().unwrap_or_default();
            let cart = state
                .carts
                .get(username)
                .cloned()
                .unwrap_or_else(|| json!({ "items": [] }));
            Json(cart).into_response()
        }
        Err(rejection) => rejection,
    }
}

async fn save_cart(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(cart): Json<Value>,
) -> Response {
    let mut state = lock(&shared);
    match caller(&state, &headers) {
        Ok(profile) => {
            let username = profile["username"].as_str().unwrap_or_default().to_owned();
            state.carts.insert(username, cart);
            Json(json!({ "status": "saved" })).into_response()
        }
        Err(rejection) => rejection,
    }
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Deserialize)]
struct NewOrderLine {
    product_id: String,
    quantity: u32,
    price: String,
}

#[derive(Deserialize)]
struct NewOrder {
    items: Vec<NewOrderLine>,
    shipping_address: String,
    billing_address: String,
    payment_method: String,
    total_amount: String,
    #[serde(default)]
    notes: String,
}

async fn list_orders(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&shared);
    let profile = match caller(&state, &headers) {
        Ok(profile) => profile,
        Err(rejection) => return rejection,
    };
    let everyone = profile["is_staff"] == true;
    let orders: Vec<Value> = state
        .orders
        .iter()
        .rev()
        .filter(|o| everyone || o["user"]["id"] == profile["id"])
        .cloned()
        .collect();
    Json(Value::Array(orders)).into_response()
}

async fn create_order(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(order): Json<NewOrder>,
) -> Response {
    let mut state = lock(&shared);
    let profile = match caller(&state, &headers) {
        Ok(profile) => profile,
        Err(rejection) => return rejection,
    };
    if order.items.is_empty() {
        return field_error("items", "This list may not be empty.");
    }

    let mut items = Vec::with_capacity(order.items.len());
    for (n, line) in order.items.iter().enumerate() {
        let Some(product) = state
            .product_index(&line.product_id)
            .and_then(|i| state.products.get(i))
        else {
            return field_error("items", "Invalid product.");
        };
        items.push(json!({
            "id": n + 1,
            "product": { "id": product["id"], "name": product["name"] },
            "quantity": line.quantity,
            "price_at_time": line.price
        }));
    }

    let id = state.orders.len() + 1;
    let created = json!({
        "id": id,
        "order_number": format!("FS-{id:05}"),
        "user": {
            "id": profile["id"],
            "username": profile["username"],
            "email": profile["email"],
            "first_name": profile["first_name"],
            "last_name": profile["last_name"]
        },
        "status": "pending",
        "total_amount": order.total_amount,
        "shipping_address": order.shipping_address,
        "billing_address": order.billing_address,
        "payment_method": order.payment_method,
        "notes": order.notes,
        "created_at": format!("2026-03-{:02}T10:00:00Z", id.min(28)),
        "items": items
    });
    state.orders.push(created.clone());
    (StatusCode::CREATED, Json(created)).into_response()
}

#[derive(Deserialize)]
struct StatusChange {
    status: String,
}

async fn update_order(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(change): Json<StatusChange>,
) -> Response {
    let mut state = lock(&shared);
    if let Err(rejection) = staff(&state, &headers) {
        return rejection;
    }
    match state.orders.iter_mut().find(|o| o["id"] == id) {
        Some(order) => {
            order["status"] = json!(change.status);
            Json(order.clone()).into_response()
        }
        None => detail(StatusCode::NOT_FOUND, "Not found."),
    }
}

// =============================================================================
// Dashboard
// =============================================================================

async fn dashboard_summary(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(rejection) = staff(&lock(&shared), &headers) {
        return rejection;
    }
    Json(json!({
        "total_sales": "1234.50",
        "total_sales_previous": "1000.00",
        "new_orders": 12,
        "new_orders_previous": 10,
        "new_customers": 4,
        "new_customers_previous": 0
    }))
    .into_response()
}

async fn dashboard_recent_orders(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(rejection) = staff(&lock(&shared), &headers) {
        return rejection;
    }
    Json(json!([{
        "id": 7,
        "customer_name": "Jane Doe",
        "total": "99.98",
        "status": "shipped",
        "created_at": "2026-03-05T10:00:00Z"
    }]))
    .into_response()
}

async fn dashboard_sales_chart(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(rejection) = staff(&lock(&shared), &headers) {
        return rejection;
    }
    Json(json!([
        { "date": "2026-03-04", "sales": "120.00" },
        { "date": "2026-03-05", "sales": 99.98 }
    ]))
    .into_response()
}

// =============================================================================
// Test context
// =============================================================================

/// A backend, a state directory and a store wired to both.
pub struct TestContext {
    pub backend: MockBackend,
    pub navigator: Arc<RecordingNavigator>,
    pub store: Store,
    state_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        let backend = MockBackend::start().await;
        let state_dir = TempDir::new().expect("Failed to create state directory");
        let navigator = Arc::new(RecordingNavigator::new());
        let config = ClientConfig::for_backend(backend.url(), state_dir.path())
            .with_cart_sync_debounce(SYNC_DEBOUNCE);
        let store = Store::open(&config, navigator.clone()).expect("Failed to open store");
        Self {
            backend,
            navigator,
            store,
            state_dir,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::for_backend(self.backend.url(), self.state_dir.path())
            .with_cart_sync_debounce(SYNC_DEBOUNCE)
    }

    /// A second store over the same state directory, as after a restart.
    pub fn reopen(&self) -> Store {
        Store::open(&self.config(), self.navigator.clone()).expect("Failed to reopen store")
    }

    pub async fn sign_in(&self, (username, password): (&str, &str)) -> User {
        self.store
            .sign_in(username, &secret(password))
            .await
            .expect("Sign-in failed")
    }
}

pub fn secret(value: &str) -> SecretString {
    SecretString::from(value)
}

/// Poll `check` until it holds or about two seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
