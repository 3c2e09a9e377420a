//! DTOs
//!
//! Este módulo contiene los objetos de transferencia de la API pública y
//! del servicio de contenido de POIs.

pub mod planning_dto;
pub mod poi_dto;
