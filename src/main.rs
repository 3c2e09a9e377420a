use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};

use travel_planning::cache::cache_config::CacheConfig;
use travel_planning::cache::redis_client::RedisClient;
use travel_planning::cache::route_cache::RouteCache;
use travel_planning::clients::poi_gateway::HttpPoiGateway;
use travel_planning::config::environment::EnvironmentConfig;
use travel_planning::create_app;
use travel_planning::database::connection::create_pool;
use travel_planning::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::default();

    // Configurar logging
    let level = if config.is_development() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("🧭 Travel Planning Engine - API de rutas turísticas");
    info!("===================================================");

    if config.is_production() {
        warn!("⚠️ CORS permisivo activo en producción");
    }

    // Inicializar base de datos
    let pool = match create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    // Redis es opcional: sin él, el cache de rutas trabaja solo en memoria
    let redis_client = match &config.redis_url {
        Some(redis_url) => {
            let redis_config = CacheConfig {
                redis_url: redis_url.clone(),
                route_ttl_seconds: config.route_cache_ttl_seconds,
                max_connections: 10,
            };
            match RedisClient::new(redis_config).await {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!("⚠️ Redis no disponible, cache solo en memoria: {}", e);
                    None
                }
            }
        }
        None => {
            info!("ℹ️ REDIS_URL no configurado, cache solo en memoria");
            None
        }
    };

    let route_cache = RouteCache::new(
        Duration::from_secs(config.route_cache_ttl_seconds),
        redis_client,
    );

    // Purga periódica de entradas expiradas del cache en memoria
    let cleanup_cache = route_cache.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            cleanup_cache.cleanup_expired().await;
        }
    });

    let gateway = Arc::new(HttpPoiGateway::new(
        config.poi_service_base_url.clone(),
        config.poi_service_timeout_secs,
    ));

    let app_state = AppState::new(pool, config.clone(), gateway, route_cache);
    let app = create_app(app_state);

    let addr: SocketAddr = config.server_url().parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("🗺️ Endpoints - Planning:");
    info!("   POST /api/planning/plan - Planificar ruta");
    info!("   POST /api/planning/:id/export - Exportar bundle offline");
    info!("   GET  /api/planning/cache/stats - Estadísticas del cache");
    info!("   POST /api/planning/cache/invalidate/:city_id - Invalidar cache por ciudad");
    info!("📌 Endpoints - Route:");
    info!("   GET  /api/route/:id - Obtener ruta guardada");
    info!("   GET  /api/route/user/:user_id - Rutas de un usuario");
    info!("   DELETE /api/route/:id - Eliminar ruta");
    info!("🏛️ Endpoints - POI:");
    info!("   GET  /api/poi/:id - Obtener POI");
    info!("   GET  /api/poi/search - Buscar POIs por ciudad y categoría");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
