//! Lifecycle and state-change events raised by domain mutations.
//!
//! Events are delivered synchronously after the domain has been updated,
//! so handlers always observe the post-mutation world.

use super::ids::{CompanyId, GroupId, OrderListId, StationId, TownId, VehicleId};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum DomainEvent {
    CompanyCreated { company: CompanyId },
    /// Company colour or name changed
    CompanyRenamed { company: CompanyId },
    CompanyDestroyed { company: CompanyId },
    TownCreated { town: TownId },
    TownRenamed { town: TownId },
    TownDestroyed { town: TownId },
    StationCreated { station: StationId },
    StationRenamed { station: StationId },
    StationDestroyed { station: StationId },
    VehicleCreated { vehicle: VehicleId },
    VehicleDestroyed { vehicle: VehicleId },
    VehicleMovedToGroup {
        vehicle: VehicleId,
        from: GroupId,
        to: GroupId,
    },
    OrderListMutated { order_list: OrderListId },
}

impl DomainEvent {
    /// True for events that change the membership of some filter axis.
    #[must_use]
    pub const fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::CompanyCreated { .. }
                | Self::CompanyRenamed { .. }
                | Self::CompanyDestroyed { .. }
                | Self::TownCreated { .. }
                | Self::TownRenamed { .. }
                | Self::TownDestroyed { .. }
                | Self::StationCreated { .. }
                | Self::StationRenamed { .. }
                | Self::StationDestroyed { .. }
        )
    }
}
