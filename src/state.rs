//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::route_cache::RouteCache;
use crate::clients::poi_gateway::PoiGateway;
use crate::config::environment::EnvironmentConfig;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub gateway: Arc<dyn PoiGateway>,
    pub route_cache: RouteCache,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        config: EnvironmentConfig,
        gateway: Arc<dyn PoiGateway>,
        route_cache: RouteCache,
    ) -> Self {
        Self {
            pool,
            config,
            gateway,
            route_cache,
        }
    }
}
