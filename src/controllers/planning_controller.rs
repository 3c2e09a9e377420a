//! Controlador de planificación
//!
//! Orquesta el flujo completo: validación → selección de candidatos →
//! builder → cache (single-flight) → store, y el export offline.

use uuid::Uuid;
use validator::Validate;

use crate::cache::route_cache::{RouteCache, RouteCacheStats};
use crate::dto::planning_dto::{
    ExportRouteRequest, ExportRouteResponse, PlanRouteRequest, RouteResponse,
};
use crate::repositories::route_repository::RouteRepository;
use crate::services::candidate_selector::CandidateSelector;
use crate::services::itinerary_builder::{validate_request, ItineraryBuilder};
use crate::services::offline_bundler::OfflineBundler;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppError};

pub struct PlanningController {
    selector: CandidateSelector,
    builder: ItineraryBuilder,
    bundler: OfflineBundler,
    cache: RouteCache,
    repository: RouteRepository,
}

impl PlanningController {
    pub fn new(state: &AppState) -> Self {
        Self {
            selector: CandidateSelector::new(state.gateway.clone()),
            builder: ItineraryBuilder::new(),
            bundler: OfflineBundler::new(state.gateway.clone()),
            cache: state.route_cache.clone(),
            repository: RouteRepository::new(state.pool.clone()),
        }
    }

    /// Planificar una ruta para la petición dada.
    ///
    /// La validación va primero: una petición inválida se rechaza antes
    /// de emitir ninguna llamada de red. El build corre bajo single-flight
    /// por fingerprint y el ganador persiste la ruta en el store.
    pub async fn plan_route(&self, request: PlanRouteRequest) -> Result<RouteResponse, AppError> {
        request.validate()?;
        let planning = request.into_planning_request();
        validate_request(&planning)?;

        let fingerprint = planning.fingerprint();
        log::info!(
            "🧭 Planificando ruta para la ciudad {} (fingerprint {})",
            planning.city_id,
            fingerprint
        );

        let selector = self.selector.clone();
        let builder = self.builder;
        let repository = self.repository.clone();
        let build_input = planning.clone();

        let route = self
            .cache
            .get_or_build(&fingerprint, move || async move {
                let candidates = selector.select(&build_input).await?;
                let route = builder.build(&build_input, candidates)?;
                // El store estampa created_at al guardar
                repository.save(&route).await
            })
            .await?;

        // Hit de cache de un brief idéntico de otro usuario: se re-asigna
        // la ruta al caller y se persiste su copia
        let route = if route.user_id != planning.user_id {
            self.repository.save(&route.rebind(planning.user_id)).await?
        } else {
            route
        };

        Ok(RouteResponse::from_route(route))
    }

    /// Exportar una ruta existente como bundle offline
    pub async fn export_route(
        &self,
        route_id: Uuid,
        request: ExportRouteRequest,
    ) -> Result<ExportRouteResponse, AppError> {
        let route = self
            .repository
            .find_by_id(route_id)
            .await?
            .ok_or_else(|| not_found_error("Route", &route_id.to_string()))?;

        let outcome = self
            .bundler
            .export(&route, request.include_poi_details, request.include_map_data)
            .await?;

        Ok(ExportRouteResponse::from_outcome(outcome))
    }

    /// Invalidar las rutas cacheadas de una ciudad (su set de POIs cambió)
    pub async fn invalidate_city_cache(&self, city_id: &str) -> u64 {
        self.cache.invalidate_city(city_id).await
    }

    pub async fn cache_stats(&self) -> RouteCacheStats {
        self.cache.stats().await
    }
}
