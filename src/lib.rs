//! Highlights the parts of a city that satisfy several proximity criteria
//! at once, e.g. "within a 10 minute drive of a supermarket AND a 15 minute
//! walk of a school".
//!
//! Places come from the OpenStreetMap Overpass API, reachability polygons
//! from a hosted routing service's isochrone endpoint. The crate unions
//! each criterion's isochrones, intersects the unions across every subset
//! of criteria and renders the ranked regions on a Leaflet map.

pub mod cache;
pub mod combine;
pub mod config;
pub mod error;
pub mod map;
pub mod overpass;
pub mod routing;
pub mod utils;

pub use combine::{combine, Criterion, CriterionLayer, RegionSet};
pub use config::AppConfig;
pub use error::{ReachError, Result};
pub use overpass::{Category, Place};
pub use routing::{Isochrone, TravelMode};
