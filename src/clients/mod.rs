//! Clientes de servicios externos
//!
//! Este módulo contiene los clientes tipados hacia colaboradores remotos.

pub mod poi_gateway;

pub use poi_gateway::{GatewayError, HttpPoiGateway, PoiGateway};
