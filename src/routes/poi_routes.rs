use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::controllers::poi_controller::PoiController;
use crate::dto::planning_dto::{PoiResponse, PoiSearchQuery};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_poi_router() -> Router<AppState> {
    Router::new()
        .route("/search", get(search_pois))
        .route("/:id", get(get_poi))
}

async fn get_poi(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PoiResponse>, AppError> {
    let controller = PoiController::new(state.gateway.clone());
    let response = controller.get_by_id(&id).await?;
    Ok(Json(response))
}

async fn search_pois(
    State(state): State<AppState>,
    Query(query): Query<PoiSearchQuery>,
) -> Result<Json<Vec<PoiResponse>>, AppError> {
    let controller = PoiController::new(state.gateway.clone());
    let response = controller
        .search(
            &query.city_id,
            query.category.as_deref(),
            query.limit.unwrap_or(20),
        )
        .await?;
    Ok(Json(response))
}
