//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum app with a single fallback that feeds the route table
//! - Wire up middleware (timeout, request ID, tracing)
//! - Decode bodies and load sessions into a [`RequestContext`]
//! - Write sessions back and turn the finished context into a response
//! - Sweep idle sessions and their carts in the background
//!
//! # Data Flow
//! ```text
//! Request
//!     → SetRequestId → Trace → PropagateRequestId → Timeout
//!     → dispatch (body limit, body decoding, session load)
//!     → Router::resolve (middleware, handler)
//!     → session save, Set-Cookie
//!     → Response
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::context::{flatten_json, parse_urlencoded, RequestContext};
use crate::routing::{PatternError, Router};
use crate::session::SessionStore;
use crate::shop::{self, Shop};
use crate::store::Database;

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub sessions: Arc<SessionStore>,
    pub max_body_bytes: usize,
}

/// HTTP server for the storefront.
pub struct HttpServer {
    app: axum::Router,
    config: AppConfig,
    routes: Arc<Router>,
    sessions: Arc<SessionStore>,
    db: Arc<Database>,
}

impl HttpServer {
    /// Create a server exposing the storefront routes over `db`.
    pub fn new(config: AppConfig, db: Arc<Database>) -> Self {
        let storefront = Arc::new(Shop::new(Arc::clone(&db), config.shop.clone()));
        let routes = Arc::new(shop::routes(storefront, &config.routing.base_path));
        Self::with_routes(config, db, routes)
    }

    /// Create a server around a prepared route table.
    pub fn with_routes(config: AppConfig, db: Arc<Database>, routes: Arc<Router>) -> Self {
        let sessions = Arc::new(SessionStore::new(&config.session));
        let state = AppState {
            router: Arc::clone(&routes),
            sessions: Arc::clone(&sessions),
            max_body_bytes: config.listener.max_body_bytes,
        };

        let app = Self::build_app(&config, state);
        Self {
            app,
            config,
            routes,
            sessions,
            db,
        }
    }

    /// Build the Axum app with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &AppConfig, state: AppState) -> axum::Router {
        axum::Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Compile every route pattern, reporting the broken ones.
    pub fn check_patterns(&self) -> Vec<PatternError> {
        self.routes.check_patterns()
    }

    /// The Axum app, for driving the server without a socket.
    pub fn app(&self) -> axum::Router {
        self.app.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires (or its sender is dropped).
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.routes.len(),
            base_path = %self.routes.base_path(),
            "HTTP server starting"
        );

        let sweeper = tokio::spawn(sweep_sessions(
            Arc::clone(&self.sessions),
            Arc::clone(&self.db),
            Duration::from_secs(self.config.session.sweep_interval_secs),
        ));

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        sweeper.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Drop idle sessions and the carts that belonged to them.
async fn sweep_sessions(sessions: Arc<SessionStore>, db: Arc<Database>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let expired = sessions.purge_idle();
        if expired.is_empty() {
            continue;
        }
        for id in &expired {
            if let Err(err) = db.clear_cart(id) {
                tracing::warn!(error = %err, "Failed to clear cart of expired session");
            }
        }
        tracing::debug!(expired = expired.len(), remaining = sessions.len(), "Swept idle sessions");
    }
}

/// Decode a JSON object or form-encoded body into string fields.
fn decode_body(headers: &HeaderMap, body: &[u8]) -> HashMap<String, String> {
    if body.is_empty() {
        return HashMap::new();
    }
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if is_json || body.trim_ascii_start().starts_with(b"{") {
        flatten_json(body)
    } else {
        parse_urlencoded(body)
    }
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

/// Every request lands here; the route table decides what happens.
async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let request_id = parts
        .headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let body = match to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(request_id = %request_id, error = %err, "Request body rejected");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let session = state.sessions.load(&parts.headers);
    let mut ctx = RequestContext::new(parts.method.clone(), parts.uri.path())
        .with_query(parts.uri.query().unwrap_or(""))
        .with_input(decode_body(&parts.headers, &body))
        .with_request_id(request_id.as_str())
        .with_base_path(state.router.base_path())
        .with_session(session.id.as_str(), session.data.clone());

    if let Err(err) = state.router.resolve(&mut ctx) {
        tracing::error!(
            request_id = %request_id,
            method = %parts.method,
            path = %parts.uri.path(),
            error = %err,
            "Request failed"
        );
        return internal_error();
    }

    let rotated = ctx.session_rotated();
    let data = std::mem::take(&mut ctx.session);
    let session_id = if rotated {
        state.sessions.remove(&session.id);
        let id = SessionStore::new_id();
        state.sessions.save(&id, data);
        id
    } else if session.is_new {
        state.sessions.save(&session.id, data);
        session.id
    } else {
        if !state.sessions.update(&session.id, &session.data, data) {
            tracing::debug!(request_id = %request_id, "Session ended while the request was in flight");
        }
        session.id
    };

    let reply = ctx.into_reply();
    let mut response = Response::new(Body::from(reply.body));
    *response.status_mut() = reply.status;
    *response.headers_mut() = reply.headers;

    if session.is_new || rotated {
        match HeaderValue::from_str(&state.sessions.cookie_header(&session_id)) {
            Ok(cookie) => {
                response.headers_mut().append(header::SET_COOKIE, cookie);
            }
            Err(err) => tracing::error!(request_id = %request_id, error = %err, "Invalid session cookie"),
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::context::NOT_FOUND_BODY;
    use crate::routing::{HandlerError, PathParams};
    use axum::http::Method;
    use tower::ServiceExt;

    fn server(routes: Router) -> HttpServer {
        HttpServer::with_routes(AppConfig::default(), Arc::new(Database::in_memory()), Arc::new(routes))
    }

    async fn send(app: axum::Router, request: Request) -> (StatusCode, HeaderMap, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    fn echo_routes() -> Router {
        let mut routes = Router::new();
        routes.post(
            "/echo",
            |ctx: &mut RequestContext, _: &PathParams| -> Result<(), HandlerError> {
                let body = format!("{}|{}", ctx.input("name").unwrap_or("-"), ctx.query("page").unwrap_or("-"));
                ctx.html(body);
                Ok(())
            },
            Vec::new(),
        );
        routes.get(
            "/boom",
            |_: &mut RequestContext, _: &PathParams| -> Result<(), HandlerError> { Err("kaput".into()) },
            Vec::new(),
        );
        routes
    }

    #[test]
    fn test_decode_body_by_content_type() {
        let mut headers = HeaderMap::new();
        assert_eq!(decode_body(&headers, b"a=1&b=two")["b"], "two");
        assert_eq!(decode_body(&headers, br#"{"a": 1}"#)["a"], "1");
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        assert_eq!(decode_body(&headers, br#" {"a": "x"}"#)["a"], "x");
        assert!(decode_body(&headers, b"").is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_decodes_form_and_query() {
        let app = server(echo_routes()).app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/echo?page=2")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("name=ada+l"))
            .unwrap();
        let (status, headers, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ada l|2");
        assert!(headers.contains_key("x-request-id"));
        assert!(headers.get(header::SET_COOKIE).unwrap().to_str().unwrap().starts_with("storefront_session="));
    }

    #[tokio::test]
    async fn test_dispatch_not_found() {
        let app = server(echo_routes()).app();
        let request = Request::builder().uri("/nope").body(Body::empty()).unwrap();
        let (status, _, body) = send(app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, NOT_FOUND_BODY);
    }

    #[tokio::test]
    async fn test_handler_error_is_generic_500() {
        let app = server(echo_routes()).app();
        let request = Request::builder().uri("/boom").body(Body::empty()).unwrap();
        let (status, _, body) = send(app, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("kaput"));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mut config = AppConfig::default();
        config.listener.max_body_bytes = 8;
        let app = HttpServer::with_routes(config, Arc::new(Database::in_memory()), Arc::new(echo_routes())).app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .body(Body::from("name=far-too-long"))
            .unwrap();
        let (status, _, _) = send(app, request).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_known_session_gets_no_new_cookie() {
        let server = server(echo_routes());
        let app = server.app();
        let request = Request::builder().uri("/nope").body(Body::empty()).unwrap();
        let (_, headers, _) = send(app.clone(), request).await;
        let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        let pair = cookie.split(';').next().unwrap().to_string();

        let request = Request::builder()
            .uri("/nope")
            .header(header::COOKIE, pair)
            .body(Body::empty())
            .unwrap();
        let (_, headers, _) = send(app, request).await;
        assert!(!headers.contains_key(header::SET_COOKIE));
        assert_eq!(server.sessions.len(), 1);
    }

    fn get(path: &str, cookie: Option<&str>) -> Request {
        let mut builder = Request::builder().uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn session_pair(headers: &HeaderMap) -> String {
        let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        cookie.split(';').next().unwrap().to_string()
    }

    fn session_routes() -> Router {
        let mut routes = Router::new();
        routes.get(
            "/login",
            |ctx: &mut RequestContext, _: &PathParams| -> Result<(), HandlerError> {
                ctx.session.log_in(1, "ada", "Ada Lovelace".into());
                Ok(())
            },
            Vec::new(),
        );
        routes.get(
            "/logout",
            |ctx: &mut RequestContext, _: &PathParams| -> Result<(), HandlerError> {
                ctx.session = Default::default();
                ctx.rotate_session();
                Ok(())
            },
            Vec::new(),
        );
        routes.get(
            "/slow-read",
            |_: &mut RequestContext, _: &PathParams| -> Result<(), HandlerError> {
                std::thread::sleep(Duration::from_millis(300));
                Ok(())
            },
            Vec::new(),
        );
        routes.get(
            "/slow-write",
            |ctx: &mut RequestContext, _: &PathParams| -> Result<(), HandlerError> {
                std::thread::sleep(Duration::from_millis(300));
                ctx.session.redirect_after_login = Some("/orders".into());
                Ok(())
            },
            Vec::new(),
        );
        routes.get(
            "/whoami",
            |ctx: &mut RequestContext, _: &PathParams| -> Result<(), HandlerError> {
                let who = ctx.session.user_id.map_or_else(|| "anonymous".to_string(), |id| id.to_string());
                ctx.html(who);
                Ok(())
            },
            Vec::new(),
        );
        routes
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_in_flight_request_cannot_revive_logged_out_session() {
        let server = server(session_routes());
        let app = server.app();
        let (_, headers, _) = send(app.clone(), get("/login", None)).await;
        let old = session_pair(&headers);

        let slow = tokio::spawn(send(app.clone(), get("/slow-write", Some(&old))));
        tokio::time::sleep(Duration::from_millis(100)).await;
        let (_, headers, _) = send(app.clone(), get("/logout", Some(&old))).await;
        let rotated = session_pair(&headers);
        assert_ne!(rotated, old);
        slow.await.unwrap();

        let (_, headers, body) = send(app.clone(), get("/whoami", Some(&old))).await;
        assert_eq!(body, "anonymous");
        assert!(headers.contains_key(header::SET_COOKIE));
        let (_, _, body) = send(app, get("/whoami", Some(&rotated))).await;
        assert_eq!(body, "anonymous");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_read_does_not_undo_login() {
        let server = server(session_routes());
        let app = server.app();
        let (_, headers, _) = send(app.clone(), get("/whoami", None)).await;
        let cookie = session_pair(&headers);

        let slow = tokio::spawn(send(app.clone(), get("/slow-read", Some(&cookie))));
        tokio::time::sleep(Duration::from_millis(100)).await;
        send(app.clone(), get("/login", Some(&cookie))).await;
        slow.await.unwrap();

        let (_, _, body) = send(app, get("/whoami", Some(&cookie))).await;
        assert_eq!(body, "1");
    }

    #[tokio::test]
    async fn test_broken_pattern_is_generic_500() {
        let mut routes = Router::new();
        routes.get(
            "/item/{id:[0-9}",
            |ctx: &mut RequestContext, _: &PathParams| -> Result<(), HandlerError> {
                ctx.html("unreachable");
                Ok(())
            },
            Vec::new(),
        );
        let server = server(routes);
        assert_eq!(server.check_patterns().len(), 1);

        let (status, _, body) = send(server.app(), get("/item/5", None)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal Server Error");
    }
}
