//! # keepmark-api
//!
//! HTTP API for keepmark: accounts, notes, and bookmarks.
//!
//! ## Routes
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | POST | `/api/auth/register` | none |
//! | POST | `/api/auth/login` | none |
//! | GET | `/api/auth/me` | required |
//! | POST, GET | `/api/notes` | optional |
//! | GET, PUT, DELETE | `/api/notes/:id` | optional |
//! | POST, GET | `/api/bookmarks` | optional |
//! | GET, PUT, DELETE | `/api/bookmarks/:id` | optional |
//! | GET | `/api/health` | none |
//!
//! Anonymous callers work in a shared pool of ownerless records; an
//! authenticated caller sees only their own.

pub mod config;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod services;
pub mod state;

use std::any::Any;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any as AnyOrigin, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::warn;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::{expose_error_detail, ApiError};
use crate::handlers::{auth, bookmarks, health, notes};

pub use crate::state::AppState;

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Render a handler panic as a 500 envelope.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "handler panicked".to_string());
    ApiError::Internal(format!("panic: {}", detail)).into_response()
}

fn parse_allowed_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(subsystem = "api", "Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect()
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    match &config.allowed_origins {
        Some(origins) => layer.allow_origin(AllowOrigin::list(parse_allowed_origins(origins))),
        None => layer.allow_origin(AnyOrigin),
    }
}

/// Unsupported methods on a known path get the same 404 envelope as unknown paths.
fn endpoint(methods: MethodRouter<AppState>) -> MethodRouter<AppState> {
    methods.fallback(health::route_not_found)
}

/// Build the application router.
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    let mut router = Router::new()
        // Auth
        .route("/api/auth/register", endpoint(post(auth::register)))
        .route("/api/auth/login", endpoint(post(auth::login)))
        .route("/api/auth/me", endpoint(get(auth::me)))
        // Notes
        .route(
            "/api/notes",
            endpoint(post(notes::create_note).get(notes::list_notes)),
        )
        .route(
            "/api/notes/:id",
            endpoint(
                get(notes::get_note)
                    .put(notes::update_note)
                    .delete(notes::delete_note),
            ),
        )
        // Bookmarks
        .route(
            "/api/bookmarks",
            endpoint(post(bookmarks::create_bookmark).get(bookmarks::list_bookmarks)),
        )
        .route(
            "/api/bookmarks/:id",
            endpoint(
                get(bookmarks::get_bookmark)
                    .put(bookmarks::update_bookmark)
                    .delete(bookmarks::delete_bookmark),
            ),
        )
        .route("/api/health", endpoint(get(health::health_check)))
        .fallback(health::route_not_found)
        .layer(CatchPanicLayer::custom(handle_panic));

    if config.environment.is_development() {
        router = router.layer(axum::middleware::map_response(expose_error_detail));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer(config))
        .with_state(state)
}
