use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::planning_controller::PlanningController;
use crate::dto::planning_dto::{
    ApiResponse, ExportRouteRequest, ExportRouteResponse, PlanRouteRequest, RouteResponse,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_planning_router() -> Router<AppState> {
    Router::new()
        .route("/plan", post(plan_route))
        .route("/:id/export", post(export_route))
        .route("/cache/stats", get(cache_stats))
        .route("/cache/invalidate/:city_id", post(invalidate_city_cache))
}

async fn plan_route(
    State(state): State<AppState>,
    Json(request): Json<PlanRouteRequest>,
) -> Result<Json<RouteResponse>, AppError> {
    let controller = PlanningController::new(&state);
    let response = controller.plan_route(request).await?;
    Ok(Json(response))
}

async fn export_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ExportRouteRequest>,
) -> Result<Json<ExportRouteResponse>, AppError> {
    let controller = PlanningController::new(&state);
    let response = controller.export_route(id, request).await?;
    Ok(Json(response))
}

async fn cache_stats(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let controller = PlanningController::new(&state);
    let stats = controller.cache_stats().await;
    let redis_connected = state.route_cache.redis_connected().await;
    Ok(Json(serde_json::json!({
        "success": true,
        "stats": stats,
        "redis_connected": redis_connected
    })))
}

async fn invalidate_city_cache(
    State(state): State<AppState>,
    Path(city_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let controller = PlanningController::new(&state);
    let removed = controller.invalidate_city_cache(&city_id).await;
    Ok(Json(ApiResponse::success_with_message(
        serde_json::json!({ "entries_removed": removed }),
        format!("Cache invalidado para la ciudad {}", city_id),
    )))
}
