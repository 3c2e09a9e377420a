//! Puntos de interés
//!
//! El servicio de contenido es el dueño de los POIs; el motor solo mantiene
//! copias de lectura con vigencia limitada por el TTL del cache.

use serde::{Deserialize, Serialize};

use super::geo::Coordinate;

/// Tiempo de visita por defecto cuando el POI no trae estimación (30 min)
pub const DEFAULT_DWELL_SECONDS: u32 = 1_800;

/// Punto de interés
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: String,
    pub name: String,
    pub category: String,
    pub location: Coordinate,
    pub rating: Option<f64>,
    pub visit_duration_minutes: Option<u32>,
}

impl PointOfInterest {
    /// Tiempo de visita estimado en segundos
    pub fn dwell_seconds(&self) -> u32 {
        self.visit_duration_minutes
            .map(|m| m.saturating_mul(60))
            .unwrap_or(DEFAULT_DWELL_SECONDS)
    }

    /// Rating para ordenar: un POI sin rating pierde los desempates
    pub fn rating_or_zero(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }
}
