use std::sync::Arc;

use crate::clients::poi_gateway::PoiGateway;
use crate::dto::planning_dto::PoiResponse;
use crate::utils::errors::{not_found_error, AppResult};

/// Controlador de consulta de POIs (pass-through sobre el gateway)
pub struct PoiController {
    gateway: Arc<dyn PoiGateway>,
}

impl PoiController {
    pub fn new(gateway: Arc<dyn PoiGateway>) -> Self {
        Self { gateway }
    }

    pub async fn get_by_id(&self, id: &str) -> AppResult<PoiResponse> {
        let poi = self
            .gateway
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("POI", id))?;

        Ok(PoiResponse::from_poi(poi))
    }

    pub async fn search(
        &self,
        city_id: &str,
        category: Option<&str>,
        limit: u32,
    ) -> AppResult<Vec<PoiResponse>> {
        let pois = self
            .gateway
            .search_by_city_and_type(city_id, category, limit)
            .await?;

        Ok(pois.into_iter().map(PoiResponse::from_poi).collect())
    }
}
