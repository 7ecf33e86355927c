//! HTTP surface: JSON API, upload serving and health probe.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod payload;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post, put};
use tower_http::cors::{Any, CorsLayer};

use crate::application::auth::AuthService;
use crate::application::categories::CategoryRegistry;
use crate::application::menu::MenuService;
use crate::application::news::NewsService;
use crate::application::repos::HealthRepo;
use crate::infra::uploads::UploadStorage;

use self::handlers::{auth, categories, menu, news, system};
use self::middleware::{log_responses, require_admin, set_request_context};

/// Cap for a whole request body; several 5 MiB images fit in one batch.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone)]
pub struct HttpState {
    pub menu: Arc<MenuService>,
    pub categories: Arc<CategoryRegistry>,
    pub news: Arc<NewsService>,
    pub auth: Arc<AuthService>,
    pub uploads: Arc<UploadStorage>,
    pub health: Arc<dyn HealthRepo>,
}

pub fn build_router(state: HttpState, max_request_bytes: usize) -> Router {
    let gate = from_fn_with_state(state.clone(), require_admin);

    // Unprefixed paths: reads are public, writes need the admin token.
    let api = read_routes().merge(write_routes().route_layer(gate.clone()));
    // `/api/admin` mirrors everything behind the token.
    let admin = read_routes().merge(write_routes()).route_layer(gate);

    Router::new()
        .nest("/api", api)
        .nest("/api/admin", admin)
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/uploads/{file}", get(system::serve_upload))
        .route("/_health/db", get(system::db_health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .layer(from_fn(log_responses))
        .layer(from_fn(set_request_context))
        .layer(cors_layer())
}

fn read_routes() -> Router<HttpState> {
    Router::new()
        .route("/menu", get(menu::list_menu))
        .route("/menu/{id}", get(menu::get_menu_item))
        .route("/menu-categories", get(categories::list_categories))
        .route("/news", get(news::list_news))
        .route("/news/{id}", get(news::get_news))
}

fn write_routes() -> Router<HttpState> {
    Router::new()
        .route("/menu", post(menu::create_menu_item))
        .route(
            "/menu/{id}",
            put(menu::update_menu_item).delete(menu::delete_menu_item),
        )
        .route(
            "/menu-categories/{id}/sort-order",
            put(categories::update_sort_order),
        )
        .route("/menu-categories/{id}", delete(categories::delete_category))
        .route("/news", post(news::create_news))
        .route(
            "/news/{id}",
            put(news::update_news).delete(news::delete_news),
        )
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}
