//! Builder de itinerarios
//!
//! Núcleo de secuenciación: ordena los candidatos en una ruta factible
//! bajo presupuestos de tiempo y distancia mediante vecino-más-cercano
//! factible con poda por presupuesto. O(n·max_stops), determinista y
//! explicable; un solver TSP completo no aporta nada a este tamaño de
//! problema y mete comportamiento que el usuario no puede razonar.

use uuid::Uuid;

use crate::models::geo::walking_seconds;
use crate::models::poi::PointOfInterest;
use crate::models::route::{PlanningRequest, Route, RouteStop};
use crate::utils::errors::{validation_error, AppError};

/// Builder de itinerarios (sin estado; la posición va en el bucle)
#[derive(Clone, Copy, Default)]
pub struct ItineraryBuilder;

impl ItineraryBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Ordenar los candidatos en una ruta que respeta max_stops y los
    /// presupuestos de duración y distancia, partiendo del origen.
    ///
    /// La selección es estrictamente secuencial: cada paso depende de la
    /// posición elegida en el anterior.
    pub fn build(
        &self,
        request: &PlanningRequest,
        candidates: Vec<PointOfInterest>,
    ) -> Result<Route, AppError> {
        validate_request(request)?;

        let mut unvisited = candidates;
        let mut current = request.origin;
        let mut remaining_duration = request.max_duration_seconds() as f64;
        let mut remaining_distance = request.max_distance_meters;
        let mut elapsed_seconds = 0.0_f64;
        let mut total_distance = 0.0_f64;
        let mut stops: Vec<RouteStop> = Vec::new();

        while stops.len() < request.max_stops && !unvisited.is_empty() {
            // Tramo desde la posición actual a cada candidato no visitado,
            // filtrando los que reventarían algún presupuesto
            let next = unvisited
                .iter()
                .enumerate()
                .map(|(idx, poi)| {
                    let leg = current.distance_meters(&poi.location);
                    let cost = walking_seconds(leg) + poi.dwell_seconds() as f64;
                    (idx, leg, cost)
                })
                .filter(|(_, leg, cost)| *leg <= remaining_distance && *cost <= remaining_duration)
                .min_by(|(ai, a_leg, _), (bi, b_leg, _)| {
                    let a = &unvisited[*ai];
                    let b = &unvisited[*bi];
                    // Más cercano primero; desempate: mejor rating, luego id menor
                    a_leg
                        .total_cmp(b_leg)
                        .then_with(|| b.rating_or_zero().total_cmp(&a.rating_or_zero()))
                        .then_with(|| a.id.cmp(&b.id))
                });

            // Sin candidato factible: la ruta queda más corta de lo pedido,
            // no es un error
            let Some((idx, leg, cost)) = next else {
                break;
            };

            let poi = unvisited.swap_remove(idx);
            let travel = walking_seconds(leg);
            let arrival = elapsed_seconds + travel;

            stops.push(RouteStop {
                poi_id: poi.id.clone(),
                name: poi.name.clone(),
                category: poi.category.clone(),
                location: poi.location,
                sequence: stops.len() as u32,
                arrival_offset_seconds: arrival.round() as u32,
                dwell_seconds: poi.dwell_seconds(),
                leg_distance_meters: leg,
            });

            elapsed_seconds = arrival + poi.dwell_seconds() as f64;
            total_distance += leg;
            remaining_duration -= cost;
            remaining_distance -= leg;
            current = poi.location;
        }

        if stops.is_empty() {
            return Err(AppError::RouteInfeasible(format!(
                "No candidate fits within {:.0}m / {} min from the origin",
                request.max_distance_meters, request.max_duration_minutes
            )));
        }

        log::info!(
            "🗺️ Ruta construida: {} paradas, {:.0}m, {}s",
            stops.len(),
            total_distance,
            elapsed_seconds.round()
        );

        Ok(Route {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            city_id: request.city_id.clone(),
            name: format!("Ruta por {}", request.city_id),
            stops,
            total_distance_meters: total_distance,
            total_duration_seconds: elapsed_seconds.round() as u32,
            fingerprint: request.fingerprint(),
            created_at: None,
        })
    }
}

/// Invariantes de la petición (fail fast, antes de cualquier búsqueda)
pub fn validate_request(request: &PlanningRequest) -> Result<(), AppError> {
    if !request.origin.is_valid() {
        return Err(validation_error(
            "origin",
            &format!(
                "out of range ({}, {})",
                request.origin.latitude, request.origin.longitude
            ),
        ));
    }
    if request.radius_meters <= 0.0 || !request.radius_meters.is_finite() {
        return Err(validation_error(
            "radius_meters",
            "must be greater than zero",
        ));
    }
    if request.max_stops < 1 {
        return Err(validation_error("max_stops", "must be at least 1"));
    }
    if request.max_duration_minutes == 0 {
        return Err(validation_error(
            "max_duration_minutes",
            "must be greater than zero",
        ));
    }
    if request.max_distance_meters <= 0.0 || !request.max_distance_meters.is_finite() {
        return Err(validation_error(
            "max_distance_meters",
            "must be greater than zero",
        ));
    }
    if request.city_id.trim().is_empty() {
        return Err(validation_error("city_id", "is required"));
    }
    Ok(())
}
