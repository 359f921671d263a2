//! Per-request state threaded through middleware and handlers.
//!
//! # Responsibilities
//! - Carry the parsed request (method, path, query, form/JSON input)
//! - Carry the session snapshot loaded by the server
//! - Accumulate the response (status, headers, body) set by handlers
//!
//! # Design Decisions
//! - No ambient globals: everything a handler may read or write lives here
//! - The server builds one context per request and owns its lifetime

use std::collections::HashMap;

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};

use crate::session::SessionData;

/// Fixed body emitted for unmatched routes.
pub const NOT_FOUND_BODY: &str = "<!DOCTYPE html><html><head><title>404 Not Found</title></head>\
<body><h1>404 Not Found</h1><p>The page you are looking for does not exist.</p>\
<p><a href=\"/\">Back to the store</a></p></body></html>";

/// Response being built for the client.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Default for Reply {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }
}

impl Reply {
    /// Drop the body, keeping status and headers.
    pub fn clear_body(&mut self) {
        self.body.clear();
    }

    fn set_content_type(&mut self, value: &'static str) {
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(value));
    }
}

/// Request/response context for a single resolution.
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    path: String,
    query: HashMap<String, String>,
    input: HashMap<String, String>,
    request_id: String,
    base_path: String,
    session_id: String,
    rotate_session: bool,
    /// Session snapshot; written back to the store after resolution.
    pub session: SessionData,
    reply: Reply,
}

impl RequestContext {
    /// Create a context for `method` and a raw request path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: HashMap::new(),
            input: HashMap::new(),
            request_id: String::new(),
            base_path: String::new(),
            session_id: String::new(),
            rotate_session: false,
            session: SessionData::default(),
            reply: Reply::default(),
        }
    }

    /// Attach a raw query string (`a=1&b=2`).
    pub fn with_query(mut self, raw: &str) -> Self {
        self.query = parse_urlencoded(raw.as_bytes());
        self
    }

    /// Attach already-decoded body fields.
    pub fn with_input(mut self, input: HashMap<String, String>) -> Self {
        self.input = input;
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>, session: SessionData) -> Self {
        self.session_id = session_id.into();
        self.session = session;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Raw request path, before any routing normalization.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Query string parameter.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Body field from a JSON or form-encoded request.
    pub fn input(&self, name: &str) -> Option<&str> {
        self.input.get(name).map(String::as_str)
    }

    /// Build an absolute in-app URL honoring the configured base path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_path, path)
    }

    /// Ask the server to issue a fresh session id after this request.
    pub fn rotate_session(&mut self) {
        self.rotate_session = true;
    }

    pub fn session_rotated(&self) -> bool {
        self.rotate_session
    }

    pub fn reply(&self) -> &Reply {
        &self.reply
    }

    pub fn reply_mut(&mut self) -> &mut Reply {
        &mut self.reply
    }

    pub fn into_reply(self) -> Reply {
        self.reply
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.reply.status = status;
    }

    /// Respond with an HTML document.
    pub fn html(&mut self, body: impl Into<String>) {
        self.reply.set_content_type("text/html; charset=utf-8");
        self.reply.body = body.into();
    }

    /// Respond with a JSON document and status.
    pub fn json(&mut self, status: StatusCode, value: serde_json::Value) {
        self.reply.status = status;
        self.reply.set_content_type("application/json");
        self.reply.body = value.to_string();
    }

    /// Respond with a `302 Found` to `location`.
    pub fn redirect(&mut self, location: &str) {
        match HeaderValue::from_str(location) {
            Ok(value) => {
                self.reply.status = StatusCode::FOUND;
                self.reply.headers.insert(header::LOCATION, value);
            }
            Err(_) => {
                tracing::warn!(request_id = %self.request_id, location, "Refusing invalid redirect target");
                self.reply.status = StatusCode::INTERNAL_SERVER_ERROR;
            }
        }
    }

    /// The router's not-found fallback.
    pub fn not_found(&mut self) {
        self.reply.status = StatusCode::NOT_FOUND;
        self.html(NOT_FOUND_BODY);
    }
}

/// Decode `application/x-www-form-urlencoded` pairs. Later keys win.
pub fn parse_urlencoded(raw: &[u8]) -> HashMap<String, String> {
    url::form_urlencoded::parse(raw).into_owned().collect()
}

/// Flatten a JSON object body into string fields.
///
/// Scalars are stringified; nested values are kept as their JSON text.
pub fn flatten_json(raw: &[u8]) -> HashMap<String, String> {
    let Ok(serde_json::Value::Object(map)) = serde_json::from_slice::<serde_json::Value>(raw) else {
        return HashMap::new();
    };
    map.into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                serde_json::Value::Null => return None,
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            Some((key, value))
        })
        .collect()
}
