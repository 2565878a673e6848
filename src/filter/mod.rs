//! Multi-axis filter and selection engine shared by all listing windows.
//!
//! - [`FilterModel`]: per-window axis lists with tri-state elements
//! - [`predicate`]: the inclusion rule over a model's active selection
//! - [`FilterIndex`]: registry that keeps every open model live under
//!   domain lifecycle events

mod axis;
mod element;
mod index;
mod model;
pub mod predicate;

pub use axis::{
    AxisMask, CatchmentProperty, ClickMode, CycleFilter, ElementState, FilterAxis, TownProperty,
    VehicleProperty,
};
pub use element::{ActiveSelection, ElementId, ElementList, FilterElement};
pub use index::{FilterIndex, IndexUpdate, ModelHandle};
pub use model::FilterModel;
pub use predicate::{Candidate, Projection};
