//! Servicios
//!
//! Este módulo contiene el núcleo del motor de planificación: selección
//! de candidatos, secuenciación y export offline.

pub mod candidate_selector;
pub mod itinerary_builder;
pub mod offline_bundler;

pub use candidate_selector::CandidateSelector;
pub use itinerary_builder::ItineraryBuilder;
pub use offline_bundler::OfflineBundler;
