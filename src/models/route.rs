//! Rutas y peticiones de planificación
//!
//! Este módulo define la petición de planificación normalizada, su
//! fingerprint determinista y la ruta resultante con sus paradas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geo::Coordinate;

/// Petición de planificación ya validada (transitoria, por request)
#[derive(Debug, Clone)]
pub struct PlanningRequest {
    pub user_id: Uuid,
    pub city_id: String,
    pub origin: Coordinate,
    pub categories: Vec<String>,
    pub radius_meters: f64,
    pub max_stops: usize,
    pub max_duration_minutes: u32,
    pub max_distance_meters: f64,
    pub poi_allow_list: Option<Vec<String>>,
}

impl PlanningRequest {
    /// Forma canónica de la petición para el fingerprint.
    ///
    /// El user_id queda fuera: dos usuarios con el mismo brief comparten
    /// la entrada de cache. Categorías en minúsculas y ordenadas,
    /// allow-list ordenada, coordenadas a 6 decimales.
    fn normalized(&self) -> String {
        let mut categories: Vec<String> = self
            .categories
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        categories.sort();
        categories.dedup();

        let allow_list = match &self.poi_allow_list {
            Some(ids) => {
                let mut ids: Vec<String> = ids.iter().map(|i| i.trim().to_string()).collect();
                ids.sort();
                ids.join(",")
            }
            None => String::new(),
        };

        format!(
            "{}|{:.6}|{:.6}|{}|{:.1}|{}|{}|{:.1}|{}",
            self.city_id.trim().to_lowercase(),
            self.origin.latitude,
            self.origin.longitude,
            categories.join(","),
            self.radius_meters,
            self.max_stops,
            self.max_duration_minutes,
            self.max_distance_meters,
            allow_list,
        )
    }

    /// Fingerprint determinista de la petición normalizada (clave de cache)
    pub fn fingerprint(&self) -> String {
        format!("{:x}", md5::compute(self.normalized().as_bytes()))
    }

    /// Presupuesto de duración en segundos
    pub fn max_duration_seconds(&self) -> u32 {
        self.max_duration_minutes.saturating_mul(60)
    }
}

/// Parada de una ruta
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteStop {
    pub poi_id: String,
    pub name: String,
    pub category: String,
    pub location: Coordinate,
    /// Índice de secuencia 0-based, único y contiguo
    pub sequence: u32,
    /// Offset de llegada desde el inicio de la ruta
    pub arrival_offset_seconds: u32,
    /// Tiempo de visita estimado
    pub dwell_seconds: u32,
    /// Distancia del tramo desde la parada anterior (o el origen)
    pub leg_distance_meters: f64,
}

/// Ruta turística calculada
///
/// Los totales son las sumas acumuladas por el builder, nunca se editan a
/// mano. `created_at` lo estampa el Route Store al guardar; el motor no
/// pone timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub user_id: Uuid,
    pub city_id: String,
    pub name: String,
    pub stops: Vec<RouteStop>,
    pub total_distance_meters: f64,
    pub total_duration_seconds: u32,
    pub fingerprint: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Route {
    /// Re-asignar la ruta a otro usuario (hit de cache de un brief ajeno):
    /// id nuevo, mismas paradas y fingerprint, sin timestamp hasta guardar.
    pub fn rebind(&self, user_id: Uuid) -> Route {
        Route {
            id: Uuid::new_v4(),
            user_id,
            created_at: None,
            ..self.clone()
        }
    }
}
