#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{
        Path, Query, Request, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

use coinwatch_client::services::stomp::StompFrame;

pub const TEST_TOKEN: &str = "test-token";
pub const REFRESHED_TOKEN: &str = "refreshed-token";
pub const TEST_EMAIL: &str = "alice@example.com";
pub const TEST_PASSWORD: &str = "secret";

/// One request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub bearer: Option<String>,
}

/// In-memory stand-in for the REST backend.
#[derive(Clone, Default)]
pub struct MockBackend {
    pub requests: Arc<Mutex<Vec<Recorded>>>,
    pub coins: Arc<Mutex<Vec<Value>>>,
    pub favorites: Arc<Mutex<Vec<String>>>,
    pub fail_logout: Arc<Mutex<bool>>,
}

impl MockBackend {
    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn last(&self) -> Option<Recorded> {
        self.requests.lock().last().cloned()
    }
}

pub struct TestServer {
    pub base_url: String,
    pub backend: MockBackend,
}

pub fn sample_coins() -> Vec<Value> {
    vec![
        json!({
            "id": "bitcoin", "name": "Bitcoin", "symbol": "btc", "price": 64250.5,
            "percent_change_1h": 0.12, "percent_change_24h": -1.5, "percent_change_7d": 4.2,
            "market_cap": 1.26e12, "volume_24h": 3.2e10
        }),
        json!({
            "id": "ethereum", "name": "Ethereum", "symbol": "eth", "price": 3120.0,
            "percent_change_1h": -0.3, "percent_change_24h": 2.1, "percent_change_7d": -0.8,
            "market_cap": 3.75e11, "volume_24h": 1.5e10
        }),
        json!({ "id": 3, "name": "Dogecoin", "symbol": "doge", "price": 0.1234 }),
    ]
}

/// Start the mock backend on an ephemeral port. The base URL includes `/api`.
pub async fn spawn_backend() -> TestServer {
    let backend = MockBackend::default();
    *backend.coins.lock() = sample_coins();

    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/profile", get(get_profile).put(update_profile))
        .route("/currency", get(currency_list))
        .route("/currency/{id}", get(currency_detail))
        .route("/favorites", get(list_favorites).post(add_favorite))
        .route("/favorites/{id}", get(favorite_status).delete(remove_favorite))
        .route("/news", get(news));

    let app = Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(backend.clone(), record))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}/api", addr),
        backend,
    }
}

async fn record(State(state): State<MockBackend>, request: Request, next: Next) -> Response {
    let bearer = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    state.requests.lock().push(Recorded {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        bearer,
    });

    next.run(request).await
}

fn authorized(headers: &HeaderMap) -> bool {
    matches!(
        headers.get("authorization").and_then(|v| v.to_str().ok()),
        Some(v) if v == format!("Bearer {}", TEST_TOKEN) || v == format!("Bearer {}", REFRESHED_TOKEN)
    )
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["email"] == TEST_EMAIL && body["password"] == TEST_PASSWORD {
        Json(json!({ "success": true, "token": TEST_TOKEN })).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "error": "Invalid email or password" })),
        )
            .into_response()
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["email"] == TEST_EMAIL {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "Email already used" })),
        )
            .into_response()
    } else {
        Json(json!({ "success": true, "message": "User registered" })).into_response()
    }
}

async fn logout(State(state): State<MockBackend>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if *state.fail_logout.lock() {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Logout failed" }))).into_response();
    }
    Json(json!({ "success": true, "message": "Logged out" })).into_response()
}

async fn get_profile(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "id": 1,
        "username": "alice",
        "email": TEST_EMAIL,
        "dateTimeOfCreated": "2024-01-02T03:04:05"
    }))
    .into_response()
}

async fn update_profile(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if body["username"].as_str().unwrap_or_default().is_empty() {
        return Json(json!({ "error": "Username cannot be empty" })).into_response();
    }
    if body["username"] == "silent" {
        return Json(json!({})).into_response();
    }
    Json(json!({
        "message": "Profile updated successfully",
        "username": body["username"],
        "email": body["email"],
        "token": REFRESHED_TOKEN
    }))
    .into_response()
}

async fn currency_list(State(state): State<MockBackend>) -> Json<Value> {
    Json(Value::Array(state.coins.lock().clone()))
}

fn coin_id(coin: &Value) -> String {
    match &coin["id"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn currency_detail(State(state): State<MockBackend>, Path(id): Path<String>) -> Response {
    let coins = state.coins.lock().clone();
    match coins.into_iter().find(|c| coin_id(c) == id) {
        Some(coin) => Json(coin).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "error": "Coin not found" }))).into_response(),
    }
}

async fn list_favorites(State(state): State<MockBackend>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let favorites = state.favorites.lock().clone();
    let coins = state.coins.lock().clone();
    let cards: Vec<Value> = coins
        .iter()
        .filter(|c| favorites.contains(&coin_id(c)))
        .map(|c| {
            json!({
                "id": c["id"],
                "name": c["name"],
                "symbol": c["symbol"],
                "current_price": c["price"],
                "price_change_percentage_24h": c["percent_change_24h"]
            })
        })
        .collect();
    Json(Value::Array(cards)).into_response()
}

async fn add_favorite(State(state): State<MockBackend>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let Some(id) = body["coinId"].as_str() else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "coinId is required" }))).into_response();
    };
    let mut favorites = state.favorites.lock();
    if !favorites.iter().any(|f| f == id) {
        favorites.push(id.to_string());
    }
    (StatusCode::CREATED, Json(json!({ "message": "Added" }))).into_response()
}

async fn favorite_status(State(state): State<MockBackend>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let is_favorite = state.favorites.lock().contains(&id);
    Json(json!({ "isFavorite": is_favorite, "coinId": id })).into_response()
}

async fn remove_favorite(State(state): State<MockBackend>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut favorites = state.favorites.lock();
    let before = favorites.len();
    favorites.retain(|f| f != &id);
    if favorites.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "Favorite not found" }))).into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn news(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
    let size: u32 = params.get("size").and_then(|s| s.parse().ok()).unwrap_or(20);
    Json(json!({
        "content": [
            {
                "id": 10, "title": "Bitcoin breaks resistance", "category": "market",
                "description": "Price action", "publishedAt": "2024-05-01T08:30:00"
            },
            { "id": 11, "title": "New lending protocol", "category": "DeFi" }
        ],
        "totalPages": 3,
        "totalElements": 42,
        "number": page,
        "size": size
    }))
}

/// STOMP-over-WebSocket mock. Answers CONNECT with CONNECTED and sends one
/// MESSAGE per payload after the client subscribes. The subscribed
/// destination is recorded in `subscriptions`.
pub struct StompServer {
    pub ws_url: String,
    pub subscriptions: Arc<Mutex<Vec<String>>>,
}

#[derive(Clone)]
struct StompState {
    payloads: Vec<String>,
    subscriptions: Arc<Mutex<Vec<String>>>,
}

pub async fn spawn_stomp_server(payloads: Vec<String>) -> StompServer {
    let subscriptions = Arc::new(Mutex::new(Vec::new()));
    let state = StompState {
        payloads,
        subscriptions: subscriptions.clone(),
    };

    let app = Router::new().route("/ws", get(ws_upgrade)).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StompServer {
        ws_url: format!("ws://{}/ws", addr),
        subscriptions,
    }
}

async fn ws_upgrade(State(state): State<StompState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| stomp_session(socket, state))
}

async fn stomp_session(mut socket: WebSocket, state: StompState) {
    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(Some(frame)) = StompFrame::decode(text.as_str()) else {
            continue;
        };

        match frame.command.as_str() {
            "CONNECT" => {
                let connected = StompFrame::new("CONNECTED").header("version", "1.2").encode();
                if socket.send(Message::Text(connected.into())).await.is_err() {
                    return;
                }
            }
            "SUBSCRIBE" => {
                let destination = frame.get("destination").unwrap_or_default().to_string();
                let subscription = frame.get("id").unwrap_or_default().to_string();
                state.subscriptions.lock().push(destination.clone());

                for (i, payload) in state.payloads.iter().enumerate() {
                    let message = StompFrame::new("MESSAGE")
                        .header("destination", &destination)
                        .header("subscription", &subscription)
                        .header("message-id", &i.to_string())
                        .header("content-type", "application/json")
                        .body(payload)
                        .encode();
                    if socket.send(Message::Text(message.into())).await.is_err() {
                        return;
                    }
                }
            }
            "DISCONNECT" => return,
            _ => {}
        }
    }
}
