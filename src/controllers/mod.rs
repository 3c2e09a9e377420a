pub mod planning_controller;
pub mod poi_controller;
pub mod route_controller;
