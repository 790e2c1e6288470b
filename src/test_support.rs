//! In-process fake of the platform API for tests
//!
//! Serves a small stateful backend with axum on an ephemeral port. Routes
//! keyed `"METHOD path"` (path relative to `/api/`) can be overridden with a
//! canned response or slowed down with a delay.

use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::ApiClient;
use crate::config::{Config, StorageDriver};

pub(crate) const EMAIL: &str = "thandi@uni.ac.za";
pub(crate) const PASSWORD: &str = "hunter22";
pub(crate) const OTP: &str = "123456";

#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub route: String,
    pub bearer: Option<String>,
    pub body: Value,
}

#[derive(Debug, Default)]
pub(crate) struct Backend {
    pub user: Value,
    pub password: String,
    pub token: String,
    pub warnings: Vec<Value>,
    pub all_warnings: Vec<Value>,
    pub messages: Vec<Value>,
    pub books: Vec<Value>,
    pub documents: Vec<Value>,
    pub overrides: HashMap<String, (u16, Value)>,
    pub delays: HashMap<String, Duration>,
    pub requests: Vec<Recorded>,
    pub forms: Vec<Vec<(String, String)>>,
}

impl Backend {
    /// A student with one module, 40 points and an uploaded avatar
    pub fn student() -> Self {
        Self {
            user: json!({
                "_id": "u1",
                "username": "thandi",
                "email": EMAIL,
                "role": "user",
                "isActive": true,
                "points": 40,
                "ownedBooks": [],
                "currentModules": ["CS101"],
                "avatar": { "path": "/uploads/thandi.png" }
            }),
            password: PASSWORD.to_string(),
            token: "tok-1".to_string(),
            books: vec![
                json!({ "id": "b1", "title": "Linear Algebra", "price": 30, "pdf": "/books/la.pdf" }),
                json!({ "id": "b2", "title": "Organic Chemistry", "price": 90 }),
            ],
            documents: vec![
                json!({ "_id": "d1", "title": "Recursion notes", "courseCode": "CS101", "likes": 4, "dislikes": 0 }),
                json!({ "_id": "d2", "title": "Limits past paper", "courseCode": "MAT201", "likes": 9, "dislikes": 1 }),
                json!({ "_id": "d3", "title": "Pointers summary", "courseCode": "cs101", "likes": 0, "dislikes": 0 }),
            ],
            ..Self::default()
        }
    }

    fn respond(&mut self, route: &str, bearer: Option<&str>, body: &Value) -> (u16, Value) {
        if let Some(canned) = self.overrides.get(route) {
            return canned.clone();
        }

        // Public routes
        match route {
            "POST auth/login" => {
                return if body["email"] == self.user["email"] && body["password"] == self.password.as_str() {
                    (200, json!({ "user": self.user, "token": self.token }))
                } else {
                    (401, json!({ "message": "Invalid email or password" }))
                };
            }
            "POST auth/verify-otp" | "POST auth/verify-reset-otp" => {
                return if body["otp"] == OTP {
                    if route == "POST auth/verify-otp" {
                        self.user["emailVerified"] = json!(true);
                    }
                    (200, json!({ "message": "OTP verified" }))
                } else {
                    (400, json!({ "message": "Invalid or expired OTP" }))
                };
            }
            "POST auth/request-reset-password" | "POST auth/resend-otp" | "POST auth/resend-reset-otp" => {
                return (200, json!({ "message": "OTP sent to your email" }));
            }
            "GET auth/documents" => {
                return (200, json!({ "success": true, "documents": self.documents }));
            }
            "GET auth/documents/newest" => {
                let newest: Vec<&Value> = self.documents.iter().rev().collect();
                return (200, json!({ "success": true, "documents": newest }));
            }
            "GET auth/documents/most-liked" => {
                let mut liked: Vec<&Value> = self.documents.iter().collect();
                liked.sort_by_key(|d| std::cmp::Reverse(d["likes"].as_i64().unwrap_or_default()));
                return (200, json!({ "success": true, "documents": liked }));
            }
            "POST auth/reset-password" => {
                if let Some(password) = body["newPassword"].as_str() {
                    self.password = password.to_string();
                }
                return (200, json!({ "message": "Password reset successful" }));
            }
            _ => {}
        }

        if let Some(id) = route.strip_prefix("GET auth/document/") {
            return match self.documents.iter().find(|d| d["_id"] == id) {
                Some(document) => (200, json!({ "document": document })),
                None => (404, json!({ "message": "Document not found" })),
            };
        }

        if bearer != Some(self.token.as_str()) {
            return (401, json!({ "message": "Not authorized, token failed" }));
        }

        match route {
            "GET auth/me" => (200, json!({ "user": self.user })),
            "GET auth/warnings" => (200, json!({ "success": true, "warnings": self.warnings })),
            "GET auth/warnings/all" => (200, json!({ "success": true, "warnings": self.all_warnings })),
            "PATCH auth/warnings/mark-seen" => {
                for warning in &mut self.warnings {
                    warning["seen"] = json!(true);
                }
                (200, json!({ "success": true }))
            }
            "GET messages/inbox" => (200, json!({ "messages": self.messages })),
            "POST auth/update-modules" => {
                self.user["currentModules"] = body["modules"].clone();
                (200, json!({ "success": true, "user": self.user }))
            }
            "GET rewards/books" => (200, json!({ "books": self.books })),
            "POST rewards/redeem" => self.redeem(body["bookId"].as_str().unwrap_or_default()),
            "GET auth/documents/recently-viewed" => {
                (200, json!({ "success": true, "documents": self.documents.first().into_iter().collect::<Vec<_>>() }))
            }
            "GET auth/my-documents" => (200, self.saved_groups()),
            "POST admin/broadcast-message" => {
                if self.user["role"] != "admin" {
                    return (403, json!({ "message": "Admin access required" }));
                }
                self.messages.push(json!({ "_id": format!("m{}", self.messages.len() + 1), "title": body["title"], "read": false }));
                (200, json!({ "success": true }))
            }
            _ => self.respond_by_id(route),
        }
    }

    fn respond_by_id(&mut self, route: &str) -> (u16, Value) {
        if let Some(id) = route.strip_prefix("POST messages/mark-read/") {
            for message in &mut self.messages {
                if message["_id"] == id {
                    message["read"] = json!(true);
                }
            }
            return (200, json!({ "success": true }));
        }
        if let Some(rest) = route.strip_prefix("POST auth/document/") {
            let Some((id, action)) = rest.split_once('/') else {
                return (404, json!({ "message": "Not found" }));
            };
            let Some(document) = self.documents.iter_mut().find(|d| d["_id"] == id) else {
                return (404, json!({ "message": "Document not found" }));
            };
            let (field, delta) = match action {
                "like" => ("likes", 1),
                "dislike" => ("dislikes", 1),
                "remove-like" => ("likes", -1),
                "remove-dislike" => ("dislikes", -1),
                _ => return (404, json!({ "message": "Not found" })),
            };
            let current = document[field].as_i64().unwrap_or_default();
            document[field] = json!((current + delta).max(0));
            return (200, json!({ "success": true }));
        }
        if let Some(id) = route.strip_prefix("POST auth/save/") {
            if !self.documents.iter().any(|d| d["_id"] == id) {
                return (200, json!({ "success": false }));
            }
            if let Some(saved) = self.user["savedDocuments"].as_array_mut() {
                saved.push(json!(id));
            } else {
                self.user["savedDocuments"] = json!([id]);
            }
            return (200, json!({ "success": true }));
        }
        if let Some(id) = route.strip_prefix("DELETE auth/unsave/") {
            if let Some(saved) = self.user["savedDocuments"].as_array_mut() {
                saved.retain(|d| d != id);
            }
            return (200, json!({ "success": true }));
        }
        if let Some(id) = route.strip_prefix("DELETE auth/documents/") {
            self.documents.retain(|d| d["_id"] != id);
            return (200, json!({ "success": true }));
        }
        (404, json!({ "message": "Not found" }))
    }

    fn saved_groups(&self) -> Value {
        let saved: Vec<&Value> = self
            .documents
            .iter()
            .filter(|d| {
                self.user["savedDocuments"]
                    .as_array()
                    .is_some_and(|ids| ids.contains(&d["_id"]))
            })
            .collect();
        let mut groups: Vec<Value> = Vec::new();
        for document in saved {
            let code = document["courseCode"].as_str().unwrap_or_default().to_uppercase();
            match groups.iter().position(|g| g["courseCode"] == code.as_str()) {
                Some(i) => {
                    if let Some(docs) = groups[i]["documents"].as_array_mut() {
                        docs.push(document.clone());
                    }
                }
                None => groups.push(json!({ "courseCode": code, "documents": [document] })),
            }
        }
        Value::Array(groups)
    }

    fn redeem(&mut self, book_id: &str) -> (u16, Value) {
        let Some(price) = self
            .books
            .iter()
            .find(|b| b["id"] == book_id)
            .and_then(|b| b["price"].as_i64())
        else {
            return (404, json!({ "message": "Book not found" }));
        };
        let points = self.user["points"].as_i64().unwrap_or_default();
        if points < price {
            return (400, json!({ "message": "Not enough points" }));
        }
        self.user["points"] = json!(points - price);
        if let Some(owned) = self.user["ownedBooks"].as_array_mut() {
            owned.push(json!(book_id));
        }
        (200, json!({ "message": "Book unlocked" }))
    }
}

type Shared = Arc<Mutex<Backend>>;

/// Running fake server
pub(crate) struct FakeApi {
    backend: Shared,
    pub base_url: String,
}

impl FakeApi {
    pub async fn start(backend: Backend) -> Self {
        let backend = Arc::new(Mutex::new(backend));
        let app = Router::new()
            .route("/api/auth/update-profile/{id}", put(update_profile))
            .route("/api/auth/register", post(register))
            .route("/api/auth/upload", post(upload))
            .fallback(dispatch)
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            backend,
            base_url: format!("http://{addr}/api"),
        }
    }

    /// Configuration pointing at this server with an in-memory store
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.api.base_url = self.base_url.clone();
        config.api.timeout_secs = 5;
        config.storage.driver = StorageDriver::Memory;
        config.poller.request_timeout_secs = 1;
        config
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.config().api).unwrap()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Backend) -> R) -> R {
        f(&mut self.backend.lock().unwrap())
    }

    pub fn respond_with(&self, route: &str, status: u16, body: Value) {
        self.with(|b| b.overrides.insert(route.to_string(), (status, body)));
    }

    pub fn delay(&self, route: &str, delay: Duration) {
        self.with(|b| b.delays.insert(route.to_string(), delay));
    }

    pub fn requests(&self, route: &str) -> Vec<Recorded> {
        self.with(|b| b.requests.iter().filter(|r| r.route == route).cloned().collect())
    }

    pub fn bearers(&self, route: &str) -> Vec<Option<String>> {
        self.requests(route).into_iter().map(|r| r.bearer).collect()
    }

    pub fn last_body(&self, route: &str) -> Value {
        self.requests(route).pop().map(|r| r.body).unwrap_or(Value::Null)
    }

    pub fn last_form(&self) -> Vec<(String, String)> {
        self.with(|b| b.forms.last().cloned().unwrap_or_default())
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn reply((status, body): (u16, Value)) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}

async fn dispatch(
    State(backend): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let route = format!("{} {}", method, uri.path().trim_start_matches("/api/"));
    let bearer = bearer(&headers);
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let delay = {
        let mut b = backend.lock().unwrap();
        b.requests.push(Recorded {
            route: route.clone(),
            bearer: bearer.clone(),
            body: body.clone(),
        });
        b.delays.get(&route).copied()
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let response = backend.lock().unwrap().respond(&route, bearer.as_deref(), &body);
    reply(response)
}

async fn read_form(mut multipart: Multipart) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let value = match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let _ = field.bytes().await;
                format!("file:{file_name}")
            }
            None => field.text().await.unwrap_or_default(),
        };
        fields.push((name, value));
    }
    fields
}

async fn update_profile(
    State(backend): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let route = "PUT auth/update-profile".to_string();
    let bearer = bearer(&headers);
    let fields = read_form(multipart).await;

    let mut b = backend.lock().unwrap();
    b.requests.push(Recorded {
        route: route.clone(),
        bearer: bearer.clone(),
        body: json!({ "id": id }),
    });
    b.forms.push(fields.clone());

    if let Some(canned) = b.overrides.get(&route) {
        return reply(canned.clone());
    }
    if bearer.as_deref() != Some(b.token.as_str()) {
        return reply((401, json!({ "message": "Not authorized, token failed" })));
    }
    if b.user["_id"] != id.as_str() {
        return reply((403, json!({ "message": "Cannot update another user" })));
    }
    for (name, value) in fields {
        if name == "username" || name == "email" {
            b.user[name.as_str()] = json!(value);
        }
    }
    let user = b.user.clone();
    reply((200, json!({ "user": user })))
}

async fn register(State(backend): State<Shared>, multipart: Multipart) -> Response {
    let fields = read_form(multipart).await;
    let mut b = backend.lock().unwrap();
    b.requests.push(Recorded {
        route: "POST auth/register".to_string(),
        bearer: None,
        body: Value::Null,
    });
    b.forms.push(fields);
    reply((201, json!({ "message": "Registered. Check your email for the OTP." })))
}

async fn upload(State(backend): State<Shared>, headers: HeaderMap, multipart: Multipart) -> Response {
    let bearer = bearer(&headers);
    let fields = read_form(multipart).await;
    let mut b = backend.lock().unwrap();
    b.requests.push(Recorded {
        route: "POST auth/upload".to_string(),
        bearer: bearer.clone(),
        body: Value::Null,
    });
    b.forms.push(fields.clone());

    if bearer.as_deref() != Some(b.token.as_str()) {
        return reply((401, json!({ "message": "Not authorized, token failed" })));
    }
    let field = |name: &str| {
        fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    };
    let id = format!("d{}", b.documents.len() + 1);
    b.documents.push(json!({ "_id": id, "title": field("title"), "courseCode": field("courseCode") }));
    let points = b.user["points"].as_i64().unwrap_or_default() + 10;
    b.user["points"] = json!(points);
    reply((200, json!({ "success": true, "points": points })))
}
