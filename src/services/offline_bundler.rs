//! Bundler offline
//!
//! Serializa una ruta finalizada, con los detalles de sus POIs si se
//! piden, en un paquete versionado y portable.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::clients::poi_gateway::{GatewayError, PoiGateway};
use crate::models::offline::{OfflineRouteBundle, OFFLINE_BUNDLE_FORMAT, OFFLINE_BUNDLE_VERSION};
use crate::models::poi::PointOfInterest;
use crate::models::route::Route;
use crate::utils::errors::AppError;

/// Payload serializado del bundle.
///
/// No incluye `downloaded_at`: re-exportar la misma ruta con los mismos
/// flags produce bundles idénticos salvo por ese timestamp.
#[derive(Debug, Serialize)]
struct OfflinePayload<'a> {
    format: &'static str,
    version: &'static str,
    route: &'a Route,
    #[serde(skip_serializing_if = "Option::is_none")]
    pois: Option<&'a Vec<PointOfInterest>>,
}

/// Resultado de un export: el bundle más los POIs que no se pudieron
/// resolver (bundle degradado pero usable)
#[derive(Debug)]
pub struct ExportOutcome {
    pub bundle: OfflineRouteBundle,
    pub unresolved_poi_ids: Vec<String>,
}

impl ExportOutcome {
    pub fn is_complete(&self) -> bool {
        self.unresolved_poi_ids.is_empty()
    }
}

/// Bundler offline sobre el gateway de POIs
#[derive(Clone)]
pub struct OfflineBundler {
    gateway: Arc<dyn PoiGateway>,
}

impl OfflineBundler {
    pub fn new(gateway: Arc<dyn PoiGateway>) -> Self {
        Self { gateway }
    }

    /// Exportar una ruta como bundle offline.
    ///
    /// Los detalles de POI se resuelven por batch solo si se piden (lazy:
    /// sin flag no hay llamada al upstream). Un batch parcial degrada el
    /// bundle en vez de tirar el export completo.
    pub async fn export(
        &self,
        route: &Route,
        include_poi_details: bool,
        include_map_data: bool,
    ) -> Result<ExportOutcome, AppError> {
        let (pois, unresolved) = if include_poi_details {
            self.resolve_poi_details(route).await?
        } else {
            (None, vec![])
        };

        let payload = OfflinePayload {
            format: OFFLINE_BUNDLE_FORMAT,
            version: OFFLINE_BUNDLE_VERSION,
            route,
            pois: pois.as_ref(),
        };
        let serialized = serde_json::to_vec(&payload)
            .map_err(|e| AppError::Internal(format!("Failed to serialize offline bundle: {}", e)))?;

        let bundle = OfflineRouteBundle {
            user_id: route.user_id,
            route_id: route.id,
            route_name: route.name.clone(),
            city_id: route.city_id.clone(),
            includes_poi_details: include_poi_details,
            includes_map_data: include_map_data,
            size_bytes: serialized.len() as u64,
            downloaded_at: Utc::now(),
            format: OFFLINE_BUNDLE_FORMAT.to_string(),
            version: OFFLINE_BUNDLE_VERSION.to_string(),
        };

        if !unresolved.is_empty() {
            log::warn!(
                "⚠️ Export degradado de la ruta {}: {} POIs sin resolver",
                route.id,
                unresolved.len()
            );
        } else {
            log::info!("📦 Ruta {} exportada ({} bytes)", route.id, bundle.size_bytes);
        }

        Ok(ExportOutcome {
            bundle,
            unresolved_poi_ids: unresolved,
        })
    }

    async fn resolve_poi_details(
        &self,
        route: &Route,
    ) -> Result<(Option<Vec<PointOfInterest>>, Vec<String>), AppError> {
        let ids: Vec<String> = route.stops.iter().map(|s| s.poi_id.clone()).collect();

        let (resolved, unresolved) = match self.gateway.get_batch(&ids).await {
            Ok(resolved) => (resolved, vec![]),
            Err(GatewayError::PartialBatch { resolved, missing }) => (resolved, missing),
            Err(e) => return Err(e.into()),
        };

        // Orden estable: los POIs siguen la secuencia de paradas de la ruta
        let pois: Vec<PointOfInterest> = route
            .stops
            .iter()
            .filter_map(|s| resolved.get(&s.poi_id).cloned())
            .collect();

        Ok((Some(pois), unresolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::geo::Coordinate;
    use crate::models::route::RouteStop;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct MockGateway {
        pois: Vec<PointOfInterest>,
        missing_from_batch: Vec<String>,
        batch_calls: AtomicUsize,
    }

    #[async_trait]
    impl PoiGateway for MockGateway {
        async fn get_by_id(&self, id: &str) -> Result<Option<PointOfInterest>, GatewayError> {
            Ok(self.pois.iter().find(|p| p.id == id).cloned())
        }

        async fn get_batch(
            &self,
            ids: &[String],
        ) -> Result<HashMap<String, PointOfInterest>, GatewayError> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            let resolved: HashMap<String, PointOfInterest> = self
                .pois
                .iter()
                .filter(|p| ids.contains(&p.id) && !self.missing_from_batch.contains(&p.id))
                .map(|p| (p.id.clone(), p.clone()))
                .collect();
            let missing: Vec<String> = ids
                .iter()
                .filter(|id| !resolved.contains_key(*id))
                .cloned()
                .collect();
            if missing.is_empty() {
                Ok(resolved)
            } else {
                Err(GatewayError::PartialBatch { resolved, missing })
            }
        }

        async fn search_nearby(
            &self,
            _center: Coordinate,
            _radius_meters: f64,
            _category: Option<&str>,
        ) -> Result<Vec<PointOfInterest>, GatewayError> {
            Ok(vec![])
        }

        async fn search_by_city_and_type(
            &self,
            _city_id: &str,
            _category: Option<&str>,
            _limit: u32,
        ) -> Result<Vec<PointOfInterest>, GatewayError> {
            Ok(vec![])
        }
    }

    fn poi(id: &str) -> PointOfInterest {
        PointOfInterest {
            id: id.to_string(),
            name: format!("POI {}", id),
            category: "museum".to_string(),
            location: Coordinate::new(0.001, 0.0),
            rating: Some(4.0),
            visit_duration_minutes: Some(30),
        }
    }

    fn route_with_stops(ids: &[&str]) -> Route {
        let stops = ids
            .iter()
            .enumerate()
            .map(|(i, id)| RouteStop {
                poi_id: id.to_string(),
                name: format!("POI {}", id),
                category: "museum".to_string(),
                location: Coordinate::new(0.001, 0.0),
                sequence: i as u32,
                arrival_offset_seconds: (i as u32) * 2_000,
                dwell_seconds: 1_800,
                leg_distance_meters: 120.0,
            })
            .collect();
        Route {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            city_id: "paris".to_string(),
            name: "Ruta por paris".to_string(),
            stops,
            total_distance_meters: 360.0,
            total_duration_seconds: 7_400,
            fingerprint: "fp".to_string(),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_export_without_details_skips_the_gateway() {
        let gateway = Arc::new(MockGateway {
            pois: vec![poi("a")],
            missing_from_batch: vec![],
            batch_calls: AtomicUsize::new(0),
        });
        let bundler = OfflineBundler::new(gateway.clone());
        let route = route_with_stops(&["a"]);

        let outcome = bundler.export(&route, false, false).await.unwrap();

        assert!(outcome.is_complete());
        assert!(!outcome.bundle.includes_poi_details);
        assert_eq!(gateway.batch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_scenario_c_partial_batch_yields_degraded_bundle() {
        // El batch resuelve 2 de 3 POIs: el bundle sale igual, degradado,
        // con el id no resuelto nombrado
        let gateway = Arc::new(MockGateway {
            pois: vec![poi("a"), poi("b"), poi("c")],
            missing_from_batch: vec!["c".to_string()],
            batch_calls: AtomicUsize::new(0),
        });
        let bundler = OfflineBundler::new(gateway);
        let route = route_with_stops(&["a", "b", "c"]);

        let outcome = bundler.export(&route, true, false).await.unwrap();

        assert!(!outcome.is_complete());
        assert_eq!(outcome.unresolved_poi_ids, vec!["c".to_string()]);
        assert!(outcome.bundle.includes_poi_details);
        assert!(outcome.bundle.size_bytes > 0);
    }

    #[tokio::test]
    async fn test_idempotent_export_differs_only_in_downloaded_at() {
        let gateway = Arc::new(MockGateway {
            pois: vec![poi("a"), poi("b")],
            missing_from_batch: vec![],
            batch_calls: AtomicUsize::new(0),
        });
        let bundler = OfflineBundler::new(gateway);
        let route = route_with_stops(&["a", "b"]);

        let first = bundler.export(&route, true, true).await.unwrap();
        let second = bundler.export(&route, true, true).await.unwrap();

        assert_eq!(first.bundle.route_id, second.bundle.route_id);
        assert_eq!(first.bundle.size_bytes, second.bundle.size_bytes);
        assert_eq!(first.bundle.format, second.bundle.format);
        assert_eq!(first.bundle.version, second.bundle.version);
        assert_eq!(first.bundle.includes_map_data, second.bundle.includes_map_data);
    }

    #[tokio::test]
    async fn test_bundle_metadata_matches_route() {
        let gateway = Arc::new(MockGateway {
            pois: vec![poi("a")],
            missing_from_batch: vec![],
            batch_calls: AtomicUsize::new(0),
        });
        let bundler = OfflineBundler::new(gateway);
        let route = route_with_stops(&["a"]);

        let outcome = bundler.export(&route, true, false).await.unwrap();

        assert_eq!(outcome.bundle.route_id, route.id);
        assert_eq!(outcome.bundle.user_id, route.user_id);
        assert_eq!(outcome.bundle.city_id, "paris");
        assert_eq!(outcome.bundle.format, OFFLINE_BUNDLE_FORMAT);
    }
}
