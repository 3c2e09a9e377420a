//! Configuración de cache
//!
//! Este módulo contiene la configuración para el sistema de cache.

use serde::{Deserialize, Serialize};

/// Configuración del cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub redis_url: String,
    /// TTL de las rutas cacheadas: más allá de esta ventana no se
    /// garantiza la frescura de los datos de POI del upstream
    pub route_ttl_seconds: u64,
    pub max_connections: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            route_ttl_seconds: 3600, // 1 hora
            max_connections: 10,
        }
    }
}
