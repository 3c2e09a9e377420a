//! Cache de rutas con single-flight
//!
//! Memoiza las rutas calculadas por fingerprint de la petición. Garantiza
//! como máximo un build en vuelo por fingerprint: los callers concurrentes
//! se suscriben al resultado del ganador en vez de duplicar trabajo.
//!
//! El cache es una capa de aceleración pura: su ausencia o un fallo de
//! Redis produce la misma ruta por build directo. El lock del mapa nunca
//! se mantiene mientras se espera red: el build corre en una task
//! desacoplada, así que un caller cancelado se desengancha sin abortar el
//! build que otros esperan.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use super::redis_client::{CacheOperations, RedisClient};
use crate::models::route::Route;
use crate::utils::errors::AppError;

/// Ruta cacheada con su timestamp de entrada
#[derive(Debug, Clone)]
struct CachedRoute {
    route: Route,
    cached_at: Instant,
}

/// Estado de un fingerprint en el cache
enum CacheSlot {
    /// Ruta lista para servir
    Ready(CachedRoute),
    /// Build en vuelo: los que llegan se suscriben al broadcast
    Building(broadcast::Sender<Result<Route, AppError>>),
}

/// Estadísticas del cache de rutas
#[derive(Debug, Default, Clone, Serialize)]
pub struct RouteCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub builds: u64,
    pub joined_builds: u64,
    pub entries_expired: u64,
    pub entries_invalidated: u64,
}

/// Cache de rutas por fingerprint con single-flight y TTL
#[derive(Clone)]
pub struct RouteCache {
    entries: Arc<Mutex<HashMap<String, CacheSlot>>>,
    stats: Arc<Mutex<RouteCacheStats>>,
    ttl: Duration,
    redis: Option<RedisClient>,
}

impl RouteCache {
    pub fn new(ttl: Duration, redis: Option<RedisClient>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            stats: Arc::new(Mutex::new(RouteCacheStats::default())),
            ttl,
            redis,
        }
    }

    /// Obtener la ruta del fingerprint, construyéndola si hace falta.
    ///
    /// Los callers concurrentes del mismo fingerprint bloquean sobre el
    /// único build en vuelo; fingerprints distintos avanzan en paralelo.
    /// Un build fallido no se cachea: se difunde el error y el siguiente
    /// caller reintenta.
    pub async fn get_or_build<F, Fut>(&self, fingerprint: &str, build: F) -> Result<Route, AppError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Route, AppError>> + Send + 'static,
    {
        let mut receiver = {
            let mut entries = self.entries.lock().await;

            match entries.get(fingerprint) {
                Some(CacheSlot::Ready(cached)) if cached.cached_at.elapsed() < self.ttl => {
                    debug!("📥 Cache HIT para fingerprint {}", fingerprint);
                    self.stats.lock().await.hits += 1;
                    return Ok(cached.route.clone());
                }
                Some(CacheSlot::Ready(_)) => {
                    debug!("⏰ Entrada expirada para fingerprint {}", fingerprint);
                    entries.remove(fingerprint);
                    self.stats.lock().await.entries_expired += 1;
                }
                Some(CacheSlot::Building(tx)) => {
                    debug!("⏳ Build en vuelo para fingerprint {}, suscribiendo", fingerprint);
                    let rx = tx.subscribe();
                    drop(entries);
                    self.stats.lock().await.joined_builds += 1;
                    return Self::await_build(rx).await;
                }
                None => {}
            }

            // Este caller gana la carrera: registra el build y lo lanza en
            // una task aparte para que su cancelación no lo aborte
            let (tx, rx) = broadcast::channel(16);
            entries.insert(fingerprint.to_string(), CacheSlot::Building(tx.clone()));
            drop(entries);

            {
                let mut stats = self.stats.lock().await;
                stats.misses += 1;
                stats.builds += 1;
            }

            let cache = self.clone();
            let fp = fingerprint.to_string();
            tokio::spawn(async move {
                let result = match cache.redis_lookup(&fp).await {
                    Some(route) => Ok(route),
                    None => build().await,
                };

                {
                    let mut entries = cache.entries.lock().await;
                    match &result {
                        Ok(route) => {
                            entries.insert(
                                fp.clone(),
                                CacheSlot::Ready(CachedRoute {
                                    route: route.clone(),
                                    cached_at: Instant::now(),
                                }),
                            );
                        }
                        Err(_) => {
                            entries.remove(&fp);
                        }
                    }
                }

                if let Ok(route) = &result {
                    cache.redis_store(&fp, route).await;
                }

                // Sin receptores vivos no hay a quién avisar; no es un error
                let _ = tx.send(result);
            });

            rx
        };

        match receiver.recv().await {
            Ok(result) => result,
            Err(_) => Err(AppError::Internal(
                "route build task dropped before publishing a result".to_string(),
            )),
        }
    }

    async fn await_build(
        mut rx: broadcast::Receiver<Result<Route, AppError>>,
    ) -> Result<Route, AppError> {
        match rx.recv().await {
            Ok(result) => result,
            Err(_) => Err(AppError::Internal(
                "route build task dropped before publishing a result".to_string(),
            )),
        }
    }

    /// Invalidar todas las rutas cacheadas de una ciudad (el set de POIs
    /// de esa ciudad cambió upstream). Devuelve cuántas entradas cayeron.
    pub async fn invalidate_city(&self, city_id: &str) -> u64 {
        let removed: Vec<String> = {
            let mut entries = self.entries.lock().await;
            let stale: Vec<String> = entries
                .iter()
                .filter_map(|(fp, slot)| match slot {
                    CacheSlot::Ready(cached) if cached.route.city_id == city_id => Some(fp.clone()),
                    _ => None,
                })
                .collect();
            for fp in &stale {
                entries.remove(fp);
            }
            stale
        };

        if let Some(redis) = &self.redis {
            for fp in &removed {
                if let Err(e) = redis.delete(&redis.route_key(fp)).await {
                    warn!("⚠️ No se pudo invalidar en Redis el fingerprint {}: {}", fp, e);
                }
            }
        }

        let count = removed.len() as u64;
        if count > 0 {
            info!("🗑️ {} rutas invalidadas para la ciudad {}", count, city_id);
            self.stats.lock().await.entries_invalidated += count;
        }
        count
    }

    /// Purgar entradas expiradas
    pub async fn cleanup_expired(&self) -> u64 {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, slot| match slot {
            CacheSlot::Ready(cached) => cached.cached_at.elapsed() < self.ttl,
            CacheSlot::Building(_) => true,
        });
        let cleaned = (before - entries.len()) as u64;
        drop(entries);

        if cleaned > 0 {
            info!("🧹 Cache cleanup: {} entradas expiradas eliminadas", cleaned);
            self.stats.lock().await.entries_expired += cleaned;
        }
        cleaned
    }

    /// Estadísticas del cache
    pub async fn stats(&self) -> RouteCacheStats {
        self.stats.lock().await.clone()
    }

    /// Tamaño actual del cache en memoria
    pub async fn size(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Estado de la capa Redis: `None` si no está configurada
    pub async fn redis_connected(&self) -> Option<bool> {
        match &self.redis {
            Some(redis) => Some(redis.is_connected().await),
            None => None,
        }
    }

    async fn redis_lookup(&self, fingerprint: &str) -> Option<Route> {
        let redis = self.redis.as_ref()?;
        match redis.get::<Route>(&redis.route_key(fingerprint)).await {
            Ok(found) => found,
            Err(e) => {
                warn!("⚠️ Lectura de Redis fallida para {}: {}", fingerprint, e);
                None
            }
        }
    }

    async fn redis_store(&self, fingerprint: &str, route: &Route) {
        if let Some(redis) = &self.redis {
            if let Err(e) = redis
                .set(&redis.route_key(fingerprint), route, self.ttl.as_secs())
                .await
            {
                warn!("⚠️ Escritura de Redis fallida para {}: {}", fingerprint, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    fn route(city_id: &str, fingerprint: &str) -> Route {
        Route {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            city_id: city_id.to_string(),
            name: format!("Ruta por {}", city_id),
            stops: vec![],
            total_distance_meters: 500.0,
            total_duration_seconds: 3_600,
            fingerprint: fingerprint.to_string(),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_trigger_exactly_one_build() {
        let cache = RouteCache::new(Duration::from_secs(60), None);
        let build_count = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let cache = cache.clone();
            let build_count = build_count.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_build("fp-1", move || async move {
                        build_count.fetch_add(1, Ordering::SeqCst);
                        // Build lento para que los 10 callers coincidan
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(route("paris", "fp-1"))
                    })
                    .await
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            let result = handle.await.unwrap().unwrap();
            ids.push(result.id);
        }

        assert_eq!(build_count.load(Ordering::SeqCst), 1);
        // Todos leyeron la ruta del ganador
        assert!(ids.iter().all(|id| *id == ids[0]));
    }

    #[tokio::test]
    async fn test_distinct_fingerprints_build_independently() {
        let cache = RouteCache::new(Duration::from_secs(60), None);
        let build_count = Arc::new(AtomicUsize::new(0));

        for fp in ["fp-a", "fp-b"] {
            let count = build_count.clone();
            cache
                .get_or_build(fp, move || async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok(route("paris", fp))
                })
                .await
                .unwrap();
        }

        assert_eq!(build_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let cache = RouteCache::new(Duration::from_millis(40), None);
        let build_count = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let count = build_count.clone();
            cache
                .get_or_build("fp-1", move || async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok(route("paris", "fp-1"))
                })
                .await
                .unwrap();
        }
        assert_eq!(build_count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(80)).await;

        let count = build_count.clone();
        cache
            .get_or_build("fp-1", move || async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(route("paris", "fp-1"))
            })
            .await
            .unwrap();
        assert_eq!(build_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_builds_are_not_cached() {
        let cache = RouteCache::new(Duration::from_secs(60), None);

        let err = cache
            .get_or_build("fp-1", || async {
                Err(AppError::UpstreamUnavailable("boom".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));

        // El siguiente caller reintenta el build
        let result = cache
            .get_or_build("fp-1", || async { Ok(route("paris", "fp-1")) })
            .await;
        assert!(result.is_ok());
        assert_eq!(cache.stats().await.builds, 2);
    }

    #[tokio::test]
    async fn test_invalidate_city_only_drops_that_city() {
        let cache = RouteCache::new(Duration::from_secs(60), None);

        cache
            .get_or_build("fp-paris", || async { Ok(route("paris", "fp-paris")) })
            .await
            .unwrap();
        cache
            .get_or_build("fp-rome", || async { Ok(route("rome", "fp-rome")) })
            .await
            .unwrap();

        let dropped = cache.invalidate_city("paris").await;
        assert_eq!(dropped, 1);
        assert_eq!(cache.size().await, 1);

        // Rome sigue cacheada; Paris se reconstruye
        let build_count = Arc::new(AtomicUsize::new(0));
        let count = build_count.clone();
        cache
            .get_or_build("fp-rome", move || async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(route("rome", "fp-rome"))
            })
            .await
            .unwrap();
        assert_eq!(build_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancelled_caller_does_not_abort_build_for_others() {
        let cache = RouteCache::new(Duration::from_secs(60), None);
        let build_count = Arc::new(AtomicUsize::new(0));

        // El primer caller lanza el build y se cancela enseguida
        let first = {
            let cache = cache.clone();
            let count = build_count.clone();
            tokio::spawn(async move {
                cache
                    .get_or_build("fp-1", move || async move {
                        count.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(60)).await;
                        Ok(route("paris", "fp-1"))
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        first.abort();

        // Un segundo caller se engancha al build en vuelo del cancelado
        let count = build_count.clone();
        let result = cache
            .get_or_build("fp-1", move || async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(route("paris", "fp-1"))
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(build_count.load(Ordering::SeqCst), 1);
    }
}
