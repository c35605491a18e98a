use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config;
use crate::database::ModelService;
use crate::handlers::{applications, conversations, health, pickups, stores};
use crate::services::{ApplicationService, StoreService};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub models: ModelService,
    pub stores: StoreService,
    pub applications: ApplicationService,
}

impl AppState {
    pub fn new(models: ModelService) -> Self {
        Self {
            stores: StoreService::new(models.clone()),
            applications: ApplicationService::new(models.clone()),
            models,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let router = Router::new()
        // Public
        .route("/health", get(health::health))
        // Authenticated API
        .merge(store_routes())
        .merge(conversation_routes())
        .merge(application_routes())
        .route("/api/pickups/:id/cancel", post(pickups::cancel))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config::config().security.enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stores", post(stores::create))
        .route("/api/stores/:id", get(stores::get).patch(stores::update))
        .route("/api/stores/:id/history", get(stores::history))
}

fn conversation_routes() -> Router<AppState> {
    Router::new()
        .route("/api/conversations/:id/messages", get(conversations::list_messages).post(conversations::create_message))
        .route("/api/messages/:id/reactions", post(conversations::create_reaction))
        .route("/api/conversations/:id/participants", post(conversations::join))
        .route("/api/conversations/:id/participants/me", delete(conversations::leave))
}

fn application_routes() -> Router<AppState> {
    use axum::routing::patch;

    Router::new()
        .route("/api/groups/:id/applications", post(applications::create))
        .route("/api/groups/:id/application-stats", get(applications::stats))
        .route("/api/applications/:id", patch(applications::decide))
}
