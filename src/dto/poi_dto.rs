//! DTOs del servicio de contenido de POIs
//!
//! Structs de wire separados de las entidades internas, con funciones de
//! mapeo explícitas campo a campo (nada de proxies mágicos: el mapeo se
//! revisa a mano).

use serde::{Deserialize, Serialize};

use crate::clients::poi_gateway::GatewayError;
use crate::models::geo::Coordinate;
use crate::models::poi::PointOfInterest;

/// POI tal como lo devuelve el servicio de contenido
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoiDto {
    pub id: String,
    pub name: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: Option<f64>,
    pub visit_duration_minutes: Option<u32>,
}

/// Respuesta de búsqueda (nearby y city+type)
#[derive(Debug, Deserialize)]
pub struct PoiListDto {
    pub pois: Vec<PoiDto>,
}

/// Respuesta del endpoint batch: puede venir incompleta
#[derive(Debug, Deserialize)]
pub struct BatchPoisDto {
    pub pois: Vec<PoiDto>,
    #[serde(default)]
    pub missing: Vec<String>,
}

/// Request del endpoint batch
#[derive(Debug, Serialize)]
pub struct BatchPoisRequestDto {
    pub ids: Vec<String>,
}

/// Convertir un DTO de wire en la entidad interna.
///
/// Una coordenada fuera de rango es una respuesta malformada del upstream,
/// no un dato con el que se pueda planificar.
pub fn poi_from_dto(dto: PoiDto) -> Result<PointOfInterest, GatewayError> {
    let location = Coordinate::new(dto.latitude, dto.longitude);
    if !location.is_valid() {
        return Err(GatewayError::Protocol(format!(
            "POI '{}' has out-of-range coordinates ({}, {})",
            dto.id, dto.latitude, dto.longitude
        )));
    }

    Ok(PointOfInterest {
        id: dto.id,
        name: dto.name,
        category: dto.category,
        location,
        rating: dto.rating,
        visit_duration_minutes: dto.visit_duration_minutes,
    })
}
