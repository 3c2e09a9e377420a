pub mod cache;
pub mod clients;
pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::{response::Json, routing::get, Router};
use serde_json::json;

use middleware::cors::cors_middleware;
use state::AppState;

/// Construir el router completo de la API
pub fn create_app(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_endpoint))
        .nest("/api/planning", routes::planning_routes::create_planning_router())
        .nest("/api/route", routes::route_routes::create_route_router())
        .nest("/api/poi", routes::poi_routes::create_poi_router())
        .layer(cors_middleware())
        .with_state(app_state)
}

/// Health check simple
async fn health_endpoint() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "travel-planning",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
