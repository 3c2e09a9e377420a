//! Selector de candidatos
//!
//! Convierte una petición de planificación en un conjunto deduplicado de
//! POIs candidatos, ordenado por relevancia, usando el gateway.

use std::collections::HashMap;
use std::sync::Arc;

use crate::clients::poi_gateway::{GatewayError, PoiGateway};
use crate::models::poi::PointOfInterest;
use crate::models::route::PlanningRequest;
use crate::utils::errors::AppError;

/// Tamaño del working set: un múltiplo pequeño de max_stops deja margen
/// para el filtrado de factibilidad del builder
pub const CANDIDATE_POOL_FACTOR: usize = 3;

/// Selector de candidatos sobre el gateway de POIs
#[derive(Clone)]
pub struct CandidateSelector {
    gateway: Arc<dyn PoiGateway>,
}

impl CandidateSelector {
    pub fn new(gateway: Arc<dyn PoiGateway>) -> Self {
        Self { gateway }
    }

    /// Resolver el conjunto de candidatos para una petición.
    ///
    /// Si hay allow-list la intención explícita del usuario manda: se
    /// resuelve por batch y no se busca nada más. Si no, una búsqueda
    /// nearby por categoría pedida (o una sin filtro), merge y dedup.
    pub async fn select(&self, request: &PlanningRequest) -> Result<Vec<PointOfInterest>, AppError> {
        let candidates = match &request.poi_allow_list {
            Some(ids) => self.resolve_allow_list(ids).await?,
            None => self.search_candidates(request).await?,
        };

        let mut deduped = dedup_by_id(candidates);
        if deduped.is_empty() {
            return Err(AppError::NoCandidatesFound(format!(
                "No POIs found for city '{}' within {:.0}m of the origin",
                request.city_id, request.radius_meters
            )));
        }

        sort_by_relevance(&mut deduped, request);
        deduped.truncate(CANDIDATE_POOL_FACTOR.saturating_mul(request.max_stops));

        log::info!(
            "🔎 {} candidatos seleccionados para la ciudad {}",
            deduped.len(),
            request.city_id
        );
        Ok(deduped)
    }

    /// La allow-list se acepta aunque el batch venga parcial: el subconjunto
    /// resuelto sigue representando la intención del usuario
    async fn resolve_allow_list(&self, ids: &[String]) -> Result<Vec<PointOfInterest>, AppError> {
        match self.gateway.get_batch(ids).await {
            Ok(resolved) => Ok(resolved.into_values().collect()),
            Err(GatewayError::PartialBatch { resolved, missing }) => {
                log::warn!(
                    "⚠️ Allow-list resuelta parcialmente: faltan {} POIs ({})",
                    missing.len(),
                    missing.join(", ")
                );
                Ok(resolved.into_values().collect())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn search_candidates(&self, request: &PlanningRequest) -> Result<Vec<PointOfInterest>, AppError> {
        let categories: Vec<Option<&str>> = if request.categories.is_empty() {
            vec![None]
        } else {
            request.categories.iter().map(|c| Some(c.as_str())).collect()
        };

        // Una búsqueda nearby por categoría, en paralelo
        let searches = categories.iter().map(|category| {
            self.gateway
                .search_nearby(request.origin, request.radius_meters, *category)
        });
        let results = futures::future::join_all(searches).await;

        let mut merged = Vec::new();
        for result in results {
            merged.extend(result.map_err(AppError::from)?);
        }
        Ok(merged)
    }
}

/// Dedup por id conservando la primera aparición
fn dedup_by_id(candidates: Vec<PointOfInterest>) -> Vec<PointOfInterest> {
    let mut seen: HashMap<String, ()> = HashMap::new();
    let mut deduped = Vec::with_capacity(candidates.len());
    for poi in candidates {
        if seen.insert(poi.id.clone(), ()).is_none() {
            deduped.push(poi);
        }
    }
    deduped
}

/// Relevancia: distancia al origen ascendente, rating descendente y el id
/// ascendente como desempate determinista
fn sort_by_relevance(candidates: &mut [PointOfInterest], request: &PlanningRequest) {
    candidates.sort_by(|a, b| {
        request
            .origin
            .distance_meters(&a.location)
            .total_cmp(&request.origin.distance_meters(&b.location))
            .then_with(|| b.rating_or_zero().total_cmp(&a.rating_or_zero()))
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::geo::Coordinate;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct MockGateway {
        pois: Vec<PointOfInterest>,
        missing_from_batch: Vec<String>,
        nearby_calls: AtomicUsize,
        batch_calls: AtomicUsize,
    }

    impl MockGateway {
        fn with_pois(pois: Vec<PointOfInterest>) -> Self {
            Self {
                pois,
                missing_from_batch: vec![],
                nearby_calls: AtomicUsize::new(0),
                batch_calls: AtomicUsize::new(0),
            }
        }
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
            center: Coordinate,
            radius_meters: f64,
            category: Option<&str>,
        ) -> Result<Vec<PointOfInterest>, GatewayError> {
            self.nearby_calls.fetch_add(1, Ordering::SeqCst);
            let mut pois: Vec<PointOfInterest> = self
                .pois
                .iter()
                .filter(|p| center.distance_meters(&p.location) <= radius_meters)
                .filter(|p| category.map_or(true, |c| p.category == c))
                .cloned()
                .collect();
            pois.sort_by(|a, b| {
                center
                    .distance_meters(&a.location)
                    .total_cmp(&center.distance_meters(&b.location))
            });
            Ok(pois)
        }

        async fn search_by_city_and_type(
            &self,
            _city_id: &str,
            category: Option<&str>,
            limit: u32,
        ) -> Result<Vec<PointOfInterest>, GatewayError> {
            Ok(self
                .pois
                .iter()
                .filter(|p| category.map_or(true, |c| p.category == c))
                .take(limit as usize)
                .cloned()
                .collect())
        }
    }

    fn poi(id: &str, category: &str, lat: f64, rating: Option<f64>) -> PointOfInterest {
        PointOfInterest {
            id: id.to_string(),
            name: format!("POI {}", id),
            category: category.to_string(),
            location: Coordinate::new(lat, 0.0),
            rating,
            visit_duration_minutes: None,
        }
    }

    fn request(categories: Vec<&str>, allow_list: Option<Vec<&str>>) -> PlanningRequest {
        PlanningRequest {
            user_id: Uuid::new_v4(),
            city_id: "paris".to_string(),
            origin: Coordinate::new(0.0, 0.0),
            categories: categories.into_iter().map(String::from).collect(),
            radius_meters: 1_000.0,
            max_stops: 2,
            max_duration_minutes: 480,
            max_distance_meters: 10_000.0,
            poi_allow_list: allow_list.map(|ids| ids.into_iter().map(String::from).collect()),
        }
    }

    #[tokio::test]
    async fn test_search_merges_and_dedups_across_categories() {
        // El mismo POI aparece en ambas búsquedas si coincide con ambas;
        // aquí forzamos el solapamiento listándolo dos veces
        let gateway = Arc::new(MockGateway::with_pois(vec![
            poi("a", "museum", 0.001, Some(4.0)),
            poi("b", "park", 0.002, Some(3.5)),
            poi("a", "museum", 0.001, Some(4.0)),
        ]));
        let selector = CandidateSelector::new(gateway.clone());

        let candidates = selector.select(&request(vec!["museum", "park"], None)).await.unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].id, "a");
        assert_eq!(candidates[1].id, "b");
        assert_eq!(gateway.nearby_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_categories_issues_single_unfiltered_search() {
        let gateway = Arc::new(MockGateway::with_pois(vec![poi("a", "museum", 0.001, None)]));
        let selector = CandidateSelector::new(gateway.clone());

        let candidates = selector.select(&request(vec![], None)).await.unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(gateway.nearby_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_relevance_orders_by_distance_then_rating_then_id() {
        let gateway = Arc::new(MockGateway::with_pois(vec![
            poi("far", "museum", 0.005, Some(5.0)),
            poi("near-low", "museum", 0.001, Some(2.0)),
            poi("z-tie", "museum", 0.002, Some(3.0)),
            poi("a-tie", "museum", 0.002, Some(3.0)),
        ]));
        let selector = CandidateSelector::new(gateway);

        let candidates = selector.select(&request(vec!["museum"], None)).await.unwrap();

        let ids: Vec<&str> = candidates.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["near-low", "a-tie", "z-tie", "far"]);
    }

    #[tokio::test]
    async fn test_working_set_is_truncated_to_three_times_max_stops() {
        let pois: Vec<PointOfInterest> = (0..20)
            .map(|i| poi(&format!("p{:02}", i), "museum", 0.0001 * (i as f64 + 1.0), None))
            .collect();
        let selector = CandidateSelector::new(Arc::new(MockGateway::with_pois(pois)));

        let candidates = selector.select(&request(vec!["museum"], None)).await.unwrap();

        assert_eq!(candidates.len(), CANDIDATE_POOL_FACTOR * 2);
    }

    #[tokio::test]
    async fn test_allow_list_overrides_search() {
        let gateway = Arc::new(MockGateway::with_pois(vec![
            poi("a", "museum", 0.001, None),
            poi("b", "park", 0.002, None),
        ]));
        let selector = CandidateSelector::new(gateway.clone());

        let candidates = selector
            .select(&request(vec!["museum"], Some(vec!["b"])))
            .await
            .unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "b");
        assert_eq!(gateway.nearby_calls.load(Ordering::SeqCst), 0);
        assert_eq!(gateway.batch_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_allow_list_accepts_partial_batch() {
        let mut gateway = MockGateway::with_pois(vec![
            poi("a", "museum", 0.001, None),
            poi("b", "park", 0.002, None),
        ]);
        gateway.missing_from_batch = vec!["b".to_string()];
        let selector = CandidateSelector::new(Arc::new(gateway));

        let candidates = selector
            .select(&request(vec![], Some(vec!["a", "b"])))
            .await
            .unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "a");
    }

    #[tokio::test]
    async fn test_empty_result_is_no_candidates_found() {
        let selector = CandidateSelector::new(Arc::new(MockGateway::with_pois(vec![])));

        let err = selector.select(&request(vec!["museum"], None)).await.unwrap_err();

        assert!(matches!(err, AppError::NoCandidatesFound(_)));
    }
}
