use crate::state::AppState;
use axum::Router;

pub mod claims;
pub mod credentials;
pub mod dto;
pub(crate) mod extractors;
pub mod guard;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod redirect;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod session;

/// JSON API, mounted under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}

/// Protected pages, mounted at the site root.
pub fn pages() -> Router<AppState> {
    handlers::page_routes()
}
