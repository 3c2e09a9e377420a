//! DTOs de la API de planificación
//!
//! Requests y responses de la API pública, separados de las entidades
//! internas, con conversiones explícitas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::geo::Coordinate;
use crate::models::offline::OfflineRouteBundle;
use crate::models::poi::PointOfInterest;
use crate::models::route::{PlanningRequest, Route};
use crate::services::offline_bundler::ExportOutcome;

/// Coordenada tal como llega en el payload
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CoordinateDto {
    pub latitude: f64,
    pub longitude: f64,
}

/// Request para planificar una ruta
#[derive(Debug, Deserialize, Validate)]
pub struct PlanRouteRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1, message = "city_id is required"))]
    pub city_id: String,
    pub origin: CoordinateDto,
    #[serde(default)]
    pub categories: Vec<String>,
    pub radius_meters: f64,
    #[validate(range(min = 1, message = "max_stops must be at least 1"))]
    pub max_stops: u32,
    #[validate(range(min = 1, message = "max_duration_minutes must be greater than zero"))]
    pub max_duration_minutes: u32,
    pub max_distance_meters: f64,
    pub poi_allow_list: Option<Vec<String>>,
}

impl PlanRouteRequest {
    /// Conversión explícita al modelo interno; los invariantes numéricos
    /// se comprueban después con `validate_request` (fail fast, antes de
    /// cualquier llamada de red)
    pub fn into_planning_request(self) -> PlanningRequest {
        PlanningRequest {
            user_id: self.user_id,
            city_id: self.city_id,
            origin: Coordinate::new(self.origin.latitude, self.origin.longitude),
            categories: self.categories,
            radius_meters: self.radius_meters,
            max_stops: self.max_stops as usize,
            max_duration_minutes: self.max_duration_minutes,
            max_distance_meters: self.max_distance_meters,
            poi_allow_list: self.poi_allow_list,
        }
    }
}

/// Parada de la ruta en la respuesta
#[derive(Debug, Serialize, Deserialize)]
pub struct RouteStopResponse {
    pub poi_id: String,
    pub name: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub sequence: u32,
    pub arrival_offset_seconds: u32,
    pub dwell_seconds: u32,
    pub leg_distance_meters: f64,
}

/// Response de ruta
#[derive(Debug, Serialize, Deserialize)]
pub struct RouteResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub city_id: String,
    pub name: String,
    pub stops: Vec<RouteStopResponse>,
    pub total_distance_meters: f64,
    pub total_duration_seconds: u32,
    pub fingerprint: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl RouteResponse {
    pub fn from_route(route: Route) -> Self {
        Self {
            id: route.id,
            user_id: route.user_id,
            city_id: route.city_id,
            name: route.name,
            stops: route
                .stops
                .into_iter()
                .map(|s| RouteStopResponse {
                    poi_id: s.poi_id,
                    name: s.name,
                    category: s.category,
                    latitude: s.location.latitude,
                    longitude: s.location.longitude,
                    sequence: s.sequence,
                    arrival_offset_seconds: s.arrival_offset_seconds,
                    dwell_seconds: s.dwell_seconds,
                    leg_distance_meters: s.leg_distance_meters,
                })
                .collect(),
            total_distance_meters: route.total_distance_meters,
            total_duration_seconds: route.total_duration_seconds,
            fingerprint: route.fingerprint,
            created_at: route.created_at,
        }
    }
}

/// Request de export offline
#[derive(Debug, Deserialize)]
pub struct ExportRouteRequest {
    #[serde(default)]
    pub include_poi_details: bool,
    #[serde(default)]
    pub include_map_data: bool,
}

/// Response de export: el bundle más los POIs que quedaron sin resolver.
/// Un export parcial sigue siendo usable (degradado), así que se devuelve
/// con el código distintivo en vez de tirar todo el export.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportRouteResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub bundle: OfflineRouteBundle,
    pub unresolved_poi_ids: Vec<String>,
}

impl ExportRouteResponse {
    pub fn from_outcome(outcome: ExportOutcome) -> Self {
        let complete = outcome.is_complete();
        Self {
            success: true,
            code: if complete {
                None
            } else {
                Some("EXPORT_INCOMPLETE".to_string())
            },
            bundle: outcome.bundle,
            unresolved_poi_ids: outcome.unresolved_poi_ids,
        }
    }
}

/// Response de POI
#[derive(Debug, Serialize, Deserialize)]
pub struct PoiResponse {
    pub id: String,
    pub name: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: Option<f64>,
    pub visit_duration_minutes: Option<u32>,
}

impl PoiResponse {
    pub fn from_poi(poi: PointOfInterest) -> Self {
        Self {
            id: poi.id,
            name: poi.name,
            category: poi.category,
            latitude: poi.location.latitude,
            longitude: poi.location.longitude,
            rating: poi.rating,
            visit_duration_minutes: poi.visit_duration_minutes,
        }
    }
}

/// Query de búsqueda de POIs por ciudad y tipo
#[derive(Debug, Deserialize)]
pub struct PoiSearchQuery {
    pub city_id: String,
    pub category: Option<String>,
    pub limit: Option<u32>,
}

/// Query para operaciones sobre rutas guardadas que requieren dueño
#[derive(Debug, Deserialize)]
pub struct RouteOwnerQuery {
    pub user_id: Uuid,
}

/// Response genérica
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
            data: Some(data),
        }
    }
}
