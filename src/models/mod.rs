//! Modelos de dominio
//!
//! Este módulo contiene las entidades internas del motor de planificación.

pub mod geo;
pub mod offline;
pub mod poi;
pub mod route;

pub use geo::Coordinate;
pub use offline::OfflineRouteBundle;
pub use poi::PointOfInterest;
pub use route::{PlanningRequest, Route, RouteStop};
