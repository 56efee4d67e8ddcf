//! delivery-planner core
//!
//! Resolves delivery locations, builds a pairwise travel graph, orders the
//! stops and produces a drawable path for the chosen order.

pub mod error;
pub mod geocode;
pub mod haversine;
pub mod model;
pub mod osrm;
pub mod planner;
pub mod polyline;
pub mod render;
pub mod resolver;
pub mod route;
pub mod segments;
pub mod solver;
pub mod traits;
