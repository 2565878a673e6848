//! Map catchment overlay.
//!
//! A tile is caught by a station when it lies within the station's
//! catchment radius and the station passes the controller's filter.

mod controller;
mod radius;

pub use controller::{CatchmentController, ClassCounts, OverlayTint, TileClass};
pub use radius::{catchment_radius, coverage};
