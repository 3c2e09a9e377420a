//! Cache
//!
//! Este módulo contiene los sistemas de cache del motor de rutas.

pub mod cache_config;
pub mod redis_client;
pub mod route_cache;

pub use cache_config::CacheConfig;
pub use route_cache::RouteCache;
