//! Route Store
//!
//! Persistencia de rutas calculadas/guardadas. El contrato es estrecho:
//! save, find_by_id, find_all_by_user y delete; ningún lenguaje de query
//! se filtra más allá de esta interfaz. El store es quien estampa
//! `created_at` al guardar; el motor nunca pone timestamps.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::route::{Route, RouteStop};
use crate::utils::errors::AppError;

/// Fila de la tabla routes
#[derive(Debug, sqlx::FromRow)]
struct RouteRecord {
    id: Uuid,
    user_id: Uuid,
    city_id: String,
    name: String,
    stops: sqlx::types::Json<Vec<RouteStop>>,
    total_distance_meters: f64,
    total_duration_seconds: i64,
    fingerprint: String,
    created_at: DateTime<Utc>,
}

impl RouteRecord {
    fn into_route(self) -> Route {
        Route {
            id: self.id,
            user_id: self.user_id,
            city_id: self.city_id,
            name: self.name,
            stops: self.stops.0,
            total_distance_meters: self.total_distance_meters,
            total_duration_seconds: self.total_duration_seconds.max(0) as u32,
            fingerprint: self.fingerprint,
            created_at: Some(self.created_at),
        }
    }
}

#[derive(Clone)]
pub struct RouteRepository {
    pool: PgPool,
}

impl RouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Guardar una ruta; `created_at` lo estampa la base con NOW()
    pub async fn save(&self, route: &Route) -> Result<Route, AppError> {
        let record = sqlx::query_as::<_, RouteRecord>(
            r#"
            INSERT INTO routes (id, user_id, city_id, name, stops, total_distance_meters, total_duration_seconds, fingerprint, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            RETURNING *
            "#,
        )
        .bind(route.id)
        .bind(route.user_id)
        .bind(&route.city_id)
        .bind(&route.name)
        .bind(sqlx::types::Json(route.stops.clone()))
        .bind(route.total_distance_meters)
        .bind(route.total_duration_seconds as i64)
        .bind(&route.fingerprint)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error saving route: {}", e)))?;

        Ok(record.into_route())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Route>, AppError> {
        let record = sqlx::query_as::<_, RouteRecord>("SELECT * FROM routes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error finding route: {}", e)))?;

        Ok(record.map(RouteRecord::into_route))
    }

    pub async fn find_all_by_user(&self, user_id: Uuid) -> Result<Vec<Route>, AppError> {
        let records = sqlx::query_as::<_, RouteRecord>(
            "SELECT * FROM routes WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error listing routes: {}", e)))?;

        Ok(records.into_iter().map(RouteRecord::into_route).collect())
    }

    /// Borrar una ruta del usuario (borrado explícito, único camino por el
    /// que una ruta desaparece)
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let route = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Route not found".to_string()))?;

        if route.user_id != user_id {
            return Err(AppError::Forbidden(
                "Route does not belong to this user".to_string(),
            ));
        }

        sqlx::query("DELETE FROM routes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error deleting route: {}", e)))?;

        Ok(())
    }
}
