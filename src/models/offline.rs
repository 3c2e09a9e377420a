//! Bundle offline de ruta
//!
//! Export versionado y portable de una ruta finalizada. Inmutable una vez
//! producido: un re-export lo reemplaza, nunca lo muta.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::errors::AppError;

/// Tag de formato del bundle offline
pub const OFFLINE_BUNDLE_FORMAT: &str = "travelapp-offline-v1";

/// Versión semántica del serializador de bundles
pub const OFFLINE_BUNDLE_VERSION: &str = "1.0.0";

/// Bundle offline de una ruta
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineRouteBundle {
    pub user_id: Uuid,
    pub route_id: Uuid,
    pub route_name: String,
    pub city_id: String,
    pub includes_poi_details: bool,
    pub includes_map_data: bool,
    pub size_bytes: u64,
    pub downloaded_at: DateTime<Utc>,
    pub format: String,
    pub version: String,
}

impl OfflineRouteBundle {
    /// Parsear un bundle serializado.
    ///
    /// Los consumidores deben rechazar formatos desconocidos en vez de
    /// intentar adivinar cómo parsearlos.
    pub fn from_json(raw: &str) -> Result<OfflineRouteBundle, AppError> {
        let bundle: OfflineRouteBundle = serde_json::from_str(raw)
            .map_err(|e| AppError::BadRequest(format!("Invalid offline bundle: {}", e)))?;

        if bundle.format != OFFLINE_BUNDLE_FORMAT {
            return Err(AppError::BadRequest(format!(
                "Unknown offline bundle format '{}', expected '{}'",
                bundle.format, OFFLINE_BUNDLE_FORMAT
            )));
        }

        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle_json(format: &str) -> String {
        serde_json::json!({
            "user_id": "7f2c1a90-54f4-4f3a-9f6e-1f2d3c4b5a69",
            "route_id": "0d9a6b7c-8e1f-4a2b-b3c4-d5e6f7a8b9c0",
            "route_name": "Ruta por paris",
            "city_id": "paris",
            "includes_poi_details": true,
            "includes_map_data": false,
            "size_bytes": 2048,
            "downloaded_at": "2026-08-29T10:00:00Z",
            "format": format,
            "version": "1.0.0"
        })
        .to_string()
    }

    #[test]
    fn test_from_json_accepts_current_format() {
        let bundle = OfflineRouteBundle::from_json(&bundle_json(OFFLINE_BUNDLE_FORMAT)).unwrap();
        assert_eq!(bundle.city_id, "paris");
        assert_eq!(bundle.size_bytes, 2048);
    }

    #[test]
    fn test_from_json_rejects_unknown_format() {
        let err = OfflineRouteBundle::from_json(&bundle_json("travelapp-offline-v9")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
