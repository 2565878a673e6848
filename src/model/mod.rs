//! Domain registry: read-only views of companies, towns, cargos, stations,
//! vehicles, groups and order lists, plus the events their mutations raise.
//!
//! # Example
//!
//! ```ignore
//! let mut world = World::new();
//! world.insert_company(company)?;
//! world.insert_vehicle(bus)?;
//!
//! for v in world.primary_vehicles(CompanyId(0), VehicleType::Road) {
//!     println!("{} serves {:?}", v.id, world.served_towns(v));
//! }
//! ```

mod cargo;
mod entities;
mod events;
mod ids;
mod orders;
mod scenario;
mod world;

pub use cargo::*;
pub use entities::*;
pub use events::*;
pub use ids::*;
pub use orders::*;
pub use scenario::*;
pub use world::*;
