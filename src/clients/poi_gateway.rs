//! Gateway del servicio de contenido de POIs
//!
//! Cliente tipado sobre el servicio remoto de contenido. Normaliza fallos
//! transitorios y resultados parciales: el resto del motor nunca ve
//! detalles de transporte.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::dto::poi_dto::{poi_from_dto, BatchPoisDto, BatchPoisRequestDto, PoiDto, PoiListDto};
use crate::models::geo::Coordinate;
use crate::models::poi::PointOfInterest;

/// Radio máximo que acepta el endpoint nearby del upstream (metros)
pub const MAX_NEARBY_RADIUS_METERS: f64 = 1_000.0;

/// Límite máximo de la primera página en la búsqueda por ciudad
pub const MAX_SEARCH_LIMIT: u32 = 50;

/// Errores del gateway
///
/// `Unavailable` y `Protocol` son reintentables por el caller con backoff.
/// `PartialBatch` lleva el subconjunto resuelto: el caller decide si un
/// resultado parcial le sirve.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("POI service unavailable: {0}")]
    Unavailable(String),

    #[error("POI service protocol error: {0}")]
    Protocol(String),

    #[error("batch lookup incomplete: {} POIs missing", missing.len())]
    PartialBatch {
        resolved: HashMap<String, PointOfInterest>,
        missing: Vec<String>,
    },
}

impl From<GatewayError> for crate::utils::errors::AppError {
    fn from(e: GatewayError) -> Self {
        use crate::utils::errors::AppError;
        match e {
            GatewayError::Unavailable(msg) => AppError::UpstreamUnavailable(msg),
            GatewayError::Protocol(msg) => AppError::UpstreamProtocol(msg),
            // Quien tolere un batch parcial debe tratarlo antes de llegar aquí
            GatewayError::PartialBatch { missing, .. } => AppError::UpstreamProtocol(format!(
                "batch lookup missing {} POIs",
                missing.len()
            )),
        }
    }
}

/// Contrato del gateway de POIs
///
/// Interfaz explícita con métodos tipados, timeouts explícitos y variantes
/// de error explícitas; solo llamadas de red, sin mutación local.
#[async_trait]
pub trait PoiGateway: Send + Sync {
    /// Lookup puntual: un id inexistente upstream es `None`, no un error
    async fn get_by_id(&self, id: &str) -> Result<Option<PointOfInterest>, GatewayError>;

    /// Lookup batch por conjunto de ids
    async fn get_batch(&self, ids: &[String]) -> Result<HashMap<String, PointOfInterest>, GatewayError>;

    /// Búsqueda por cercanía, ordenada por distancia ascendente al centro
    async fn search_nearby(
        &self,
        center: Coordinate,
        radius_meters: f64,
        category: Option<&str>,
    ) -> Result<Vec<PointOfInterest>, GatewayError>;

    /// Búsqueda por ciudad y tipo (solo primera página)
    async fn search_by_city_and_type(
        &self,
        city_id: &str,
        category: Option<&str>,
        limit: u32,
    ) -> Result<Vec<PointOfInterest>, GatewayError>;
}

/// Implementación HTTP del gateway
pub struct HttpPoiGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPoiGateway {
    pub fn new(base_url: String, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// GET con un único reintento transparente ante fallos de conexión.
    ///
    /// Nunca se reintenta sobre respuestas 4xx: si el upstream contestó,
    /// la respuesta se devuelve tal cual y el mapeo de status decide.
    async fn get_with_retry(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, GatewayError> {
        match self.client.get(url).query(query).send().await {
            Ok(response) => Ok(response),
            Err(e) if e.is_connect() => {
                log::warn!("⚠️ Fallo de conexión con el servicio de POIs, reintentando: {}", e);
                self.client
                    .get(url)
                    .query(query)
                    .send()
                    .await
                    .map_err(map_transport_error)
            }
            Err(e) => Err(map_transport_error(e)),
        }
    }

    async fn parse_poi_list(&self, response: reqwest::Response) -> Result<Vec<PointOfInterest>, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            return Err(map_status_error(status));
        }

        let list: PoiListDto = response
            .json()
            .await
            .map_err(|e| GatewayError::Protocol(format!("Failed to parse POI list: {}", e)))?;

        list.pois.into_iter().map(poi_from_dto).collect()
    }
}

#[async_trait]
impl PoiGateway for HttpPoiGateway {
    async fn get_by_id(&self, id: &str) -> Result<Option<PointOfInterest>, GatewayError> {
        let url = format!("{}/pois/{}", self.base_url, id);
        log::debug!("🔍 Buscando POI {}", id);

        let response = self.get_with_retry(&url, &[]).await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(map_status_error(status));
        }

        let dto: PoiDto = response
            .json()
            .await
            .map_err(|e| GatewayError::Protocol(format!("Failed to parse POI response: {}", e)))?;

        Ok(Some(poi_from_dto(dto)?))
    }

    async fn get_batch(&self, ids: &[String]) -> Result<HashMap<String, PointOfInterest>, GatewayError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let url = format!("{}/pois/batch", self.base_url);
        log::debug!("🔍 Lookup batch de {} POIs", ids.len());

        // POST: sin reintento transparente (solo aplica a GETs idempotentes)
        let response = self
            .client
            .post(&url)
            .json(&BatchPoisRequestDto { ids: ids.to_vec() })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_status_error(status));
        }

        let batch: BatchPoisDto = response
            .json()
            .await
            .map_err(|e| GatewayError::Protocol(format!("Failed to parse batch response: {}", e)))?;

        let mut resolved = HashMap::new();
        for dto in batch.pois {
            let poi = poi_from_dto(dto)?;
            resolved.insert(poi.id.clone(), poi);
        }

        // Faltantes: los que declara el upstream más los que simplemente
        // no vinieron en la respuesta
        let mut missing = batch.missing;
        missing.extend(ids.iter().cloned());
        missing.retain(|id| !resolved.contains_key(id));
        missing.sort();
        missing.dedup();

        if !missing.is_empty() {
            log::warn!("⚠️ Batch incompleto: faltan {} de {} POIs", missing.len(), ids.len());
            return Err(GatewayError::PartialBatch { resolved, missing });
        }

        Ok(resolved)
    }

    async fn search_nearby(
        &self,
        center: Coordinate,
        radius_meters: f64,
        category: Option<&str>,
    ) -> Result<Vec<PointOfInterest>, GatewayError> {
        let radius = clamp_radius(radius_meters);
        let url = format!("{}/pois/nearby", self.base_url);

        let mut query = vec![
            ("lat", center.latitude.to_string()),
            ("lng", center.longitude.to_string()),
            ("radius_meters", radius.to_string()),
        ];
        if let Some(category) = category {
            query.push(("category", category.to_string()));
        }

        let response = self.get_with_retry(&url, &query).await?;
        let mut pois = self.parse_poi_list(response).await?;

        // Contrato: orden ascendente por distancia al centro, venga como
        // venga del upstream
        pois.sort_by(|a, b| {
            center
                .distance_meters(&a.location)
                .total_cmp(&center.distance_meters(&b.location))
        });

        Ok(pois)
    }

    async fn search_by_city_and_type(
        &self,
        city_id: &str,
        category: Option<&str>,
        limit: u32,
    ) -> Result<Vec<PointOfInterest>, GatewayError> {
        let limit = limit.min(MAX_SEARCH_LIMIT);
        let url = format!("{}/pois/search", self.base_url);

        let mut query = vec![
            ("city_id", city_id.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(category) = category {
            query.push(("category", category.to_string()));
        }

        let response = self.get_with_retry(&url, &query).await?;
        self.parse_poi_list(response).await
    }
}

/// El gateway nunca debe exceder en silencio el radio máximo del upstream
pub(crate) fn clamp_radius(radius_meters: f64) -> f64 {
    radius_meters.min(MAX_NEARBY_RADIUS_METERS)
}

fn map_transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() || e.is_connect() {
        GatewayError::Unavailable(e.to_string())
    } else if e.is_decode() {
        GatewayError::Protocol(e.to_string())
    } else {
        GatewayError::Unavailable(e.to_string())
    }
}

fn map_status_error(status: reqwest::StatusCode) -> GatewayError {
    if status.is_server_error() {
        GatewayError::Unavailable(format!("upstream returned {}", status))
    } else {
        GatewayError::Protocol(format!("unexpected upstream status {}", status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_radius_respects_upstream_cap() {
        assert_eq!(clamp_radius(500.0), 500.0);
        assert_eq!(clamp_radius(1_000.0), 1_000.0);
        assert_eq!(clamp_radius(5_000.0), MAX_NEARBY_RADIUS_METERS);
    }

    #[test]
    fn test_status_mapping_distinguishes_5xx_from_4xx() {
        assert!(matches!(
            map_status_error(reqwest::StatusCode::BAD_GATEWAY),
            GatewayError::Unavailable(_)
        ));
        assert!(matches!(
            map_status_error(reqwest::StatusCode::UNPROCESSABLE_ENTITY),
            GatewayError::Protocol(_)
        ));
    }
}
