use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::{middleware, Router};

use crate::auth;
use crate::config::AppConfig;
use crate::handlers;
use crate::search::PropertySearch;
use crate::store::PropertyManager;

/// Shared handler state: one store instance constructed at process start and
/// injected everywhere, no hidden statics.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub manager: Arc<PropertyManager>,
    pub search: Arc<PropertySearch>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let manager = Arc::new(PropertyManager::new());
        let search = Arc::new(PropertySearch::new(manager.clone()));
        AppState {
            config,
            manager,
            search,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/api/v1/properties",
            post(handlers::create_listing).get(handlers::list_owned),
        )
        .route(
            "/api/v1/properties/shortlist",
            put(handlers::shortlist_listing).get(handlers::list_shortlisted),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));

    Router::new()
        .route("/", get(|| async { "Hello, Property Listing Service!" }))
        .route("/login", post(handlers::login))
        .route("/api/v1/properties/search", get(handlers::search_listings))
        .merge(protected_routes)
        .with_state(state)
}
