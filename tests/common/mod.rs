#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub mod app;

pub const PASSWORD: &str = "secret";
pub const DEFAULT_TOKEN: &str = "token-123";

/// In-memory stand-in for the gym REST backend.
#[derive(Clone)]
pub struct Backend {
    inner: Arc<Mutex<BackendData>>,
}

pub struct BackendData {
    pub members: Vec<Value>,
    pub events: Vec<Value>,
    pub next_id: u64,
    pub valid_token: String,
    /// Answer for the next member write instead of processing it.
    pub fail_next: Option<(StatusCode, Value)>,
    /// (method, path, authorization header) for every request received.
    pub requests: Vec<(String, String, Option<String>)>,
    /// Per-request hold for member listings. The listing is taken when the
    /// request arrives and sent after the hold.
    pub list_delays: VecDeque<Duration>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BackendData {
                members: Vec::new(),
                events: Vec::new(),
                next_id: 7,
                valid_token: DEFAULT_TOKEN.to_string(),
                fail_next: None,
                requests: Vec::new(),
                list_delays: VecDeque::new(),
            })),
        }
    }
}

impl Backend {
    pub fn data(&self) -> MutexGuard<'_, BackendData> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn seed_member(&self, id: u64, name: &str, joined_at: &str) {
        self.data().members.push(json!({
            "id": id,
            "full_name": name,
            "cedula": format!("C{id}"),
            "email": format!("m{id}@gym.test"),
            "phone": "555",
            "membership_type": "Mensual",
            "is_active": true,
            "joined_at": joined_at,
        }));
    }

    pub fn request_count(&self) -> usize {
        self.data().requests.len()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/token/", post(token))
            .route("/api/gyms/members/", get(list_members).post(create_member))
            .route(
                "/api/gyms/members/:id/",
                put(replace_member).patch(patch_member).delete(delete_member),
            )
            .route("/api/gym/estadisticas/:gym_id/", get(gym_stats))
            .route("/api/calendario/events/", get(list_events).post(create_event))
            .route("/api/calendario/events/:id/", put(replace_event).delete(delete_event))
            .with_state(self.clone())
    }
}

/// Serves the backend on an ephemeral port of the current runtime.
pub async fn spawn(backend: Backend) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub backend");
    let addr = listener.local_addr().expect("stub address");
    let app = backend.router();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub backend crashed");
    });
    format!("http://{addr}")
}

/// Serves the backend from its own thread and runtime, so it outlives any
/// single test runtime.
pub fn spawn_detached(backend: Backend) -> String {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("stub runtime");
        runtime.block_on(async move {
            let url = spawn(backend).await;
            tx.send(url).expect("report stub url");
            std::future::pending::<()>().await;
        });
    });
    rx.recv().expect("stub backend url")
}

/// A local port that was free a moment ago.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind random port");
    listener.local_addr().expect("address").port()
}

/// A base URL nothing listens on.
pub fn closed_port_url() -> String {
    format!("http://127.0.0.1:{}", free_port())
}

fn record(backend: &Backend, method: &str, path: String, headers: &HeaderMap) -> Result<(), Response> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let mut data = backend.data();
    data.requests.push((method.to_string(), path, auth.clone()));
    if auth.as_deref() != Some(format!("Bearer {}", data.valid_token).as_str()) {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Authentication credentials were not provided."})),
        )
            .into_response());
    }
    Ok(())
}

fn injected_failure(backend: &Backend) -> Option<Response> {
    backend
        .data()
        .fail_next
        .take()
        .map(|(status, body)| (status, Json(body)).into_response())
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            if key != "id" && key != "joined_at" {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

async fn token(State(backend): State<Backend>, Json(body): Json<Value>) -> Response {
    let mut data = backend.data();
    data.requests.push(("POST".into(), "/api/token/".into(), None));
    if body["password"] == json!(PASSWORD) && body["username"].as_str().is_some_and(|u| !u.is_empty()) {
        Json(json!({"access": data.valid_token, "refresh": "refresh-456"})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "No active account found with the given credentials"})),
        )
            .into_response()
    }
}

async fn list_members(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if let Err(denied) = record(&backend, "GET", "/api/gyms/members/".into(), &headers) {
        return denied;
    }
    let (members, delay) = {
        let mut data = backend.data();
        (data.members.clone(), data.list_delays.pop_front())
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    Json(Value::Array(members)).into_response()
}

async fn create_member(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = record(&backend, "POST", "/api/gyms/members/".into(), &headers) {
        return denied;
    }
    if let Some(failure) = injected_failure(&backend) {
        return failure;
    }
    let mut data = backend.data();
    let id = data.next_id;
    data.next_id += 1;
    let mut member = Value::Object(Map::new());
    merge(&mut member, &body);
    member["id"] = json!(id);
    member["joined_at"] = json!("2024-01-01");
    data.members.push(member.clone());
    (StatusCode::CREATED, Json(member)).into_response()
}

async fn update(backend: &Backend, method: &str, id: u64, headers: &HeaderMap, body: &Value) -> Response {
    if let Err(denied) = record(backend, method, format!("/api/gyms/members/{id}/"), headers) {
        return denied;
    }
    if let Some(failure) = injected_failure(backend) {
        return failure;
    }
    let mut data = backend.data();
    match data.members.iter_mut().find(|m| m["id"] == json!(id)) {
        Some(member) => {
            merge(member, body);
            Json(member.clone()).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response(),
    }
}

async fn replace_member(
    State(backend): State<Backend>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    update(&backend, "PUT", id, &headers, &body).await
}

async fn patch_member(
    State(backend): State<Backend>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    update(&backend, "PATCH", id, &headers, &body).await
}

async fn delete_member(State(backend): State<Backend>, Path(id): Path<u64>, headers: HeaderMap) -> Response {
    if let Err(denied) = record(&backend, "DELETE", format!("/api/gyms/members/{id}/"), &headers) {
        return denied;
    }
    if let Some(failure) = injected_failure(&backend) {
        return failure;
    }
    backend.data().members.retain(|m| m["id"] != json!(id));
    StatusCode::NO_CONTENT.into_response()
}

async fn gym_stats(State(backend): State<Backend>, Path(gym_id): Path<u64>, headers: HeaderMap) -> Response {
    if let Err(denied) = record(&backend, "GET", format!("/api/gym/estadisticas/{gym_id}/"), &headers) {
        return denied;
    }
    let data = backend.data();
    let total = data.members.len();
    let active = data.members.iter().filter(|m| m["is_active"] == json!(true)).count();
    Json(json!({
        "total_clientes": total,
        "clientes_activos": active,
        "clientes_presentes": 2,
    }))
    .into_response()
}

async fn list_events(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if let Err(denied) = record(&backend, "GET", "/api/calendario/events/".into(), &headers) {
        return denied;
    }
    Json(Value::Array(backend.data().events.clone())).into_response()
}

async fn create_event(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = record(&backend, "POST", "/api/calendario/events/".into(), &headers) {
        return denied;
    }
    let mut data = backend.data();
    let id = data.next_id;
    data.next_id += 1;
    let mut event = Value::Object(Map::new());
    merge(&mut event, &body);
    event["id"] = json!(id);
    data.events.push(event.clone());
    (StatusCode::CREATED, Json(event)).into_response()
}

async fn replace_event(
    State(backend): State<Backend>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = record(&backend, "PUT", format!("/api/calendario/events/{id}/"), &headers) {
        return denied;
    }
    let mut data = backend.data();
    match data.events.iter_mut().find(|e| e["id"] == json!(id)) {
        Some(event) => {
            merge(event, &body);
            Json(event.clone()).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn delete_event(State(backend): State<Backend>, Path(id): Path<u64>, headers: HeaderMap) -> Response {
    if let Err(denied) = record(&backend, "DELETE", format!("/api/calendario/events/{id}/"), &headers) {
        return denied;
    }
    backend.data().events.retain(|e| e["id"] != json!(id));
    StatusCode::NO_CONTENT.into_response()
}
