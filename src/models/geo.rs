//! Tipos geoespaciales
//!
//! Coordenadas WGS84 y distancia de círculo máximo para calcular
//! los tramos entre paradas.

use serde::{Deserialize, Serialize};

/// Radio medio de la Tierra en metros
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Velocidad de caminata usada para convertir distancia en tiempo de viaje
pub const WALKING_SPEED_MPS: f64 = 1.4;

/// Coordenada WGS84 en grados
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Invariante: |lat| <= 90, |lng| <= 180
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }

    /// Distancia de círculo máximo (haversine) en metros
    pub fn distance_meters(&self, other: &Coordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlng = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_METERS * c
    }
}

/// Tiempo de viaje a pie en segundos para una distancia en metros
pub fn walking_seconds(distance_meters: f64) -> f64 {
    distance_meters / WALKING_SPEED_MPS
}
