//! Repositorios
//!
//! Este módulo contiene el acceso a persistencia.

pub mod route_repository;

pub use route_repository::RouteRepository;
