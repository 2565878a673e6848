//! Order lists and their health classification.

use super::cargo::CargoTypes;
use super::ids::{CargoId, OrderListId, StationId, VehicleId};
use serde::{Deserialize, Serialize};

/// A single order: go to a station, optionally refitting on arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub destination: StationId,
    #[serde(default)]
    pub refit_cargo: Option<CargoId>,
    /// Timetabled wait time; `None` if not timetabled
    #[serde(default)]
    pub wait_ticks: Option<u32>,
    /// Timetabled travel time; `None` if not timetabled
    #[serde(default)]
    pub travel_ticks: Option<u32>,
}

impl Order {
    #[must_use]
    pub const fn to(destination: StationId) -> Self {
        Self {
            destination,
            refit_cargo: None,
            wait_ticks: Some(0),
            travel_ticks: Some(0),
        }
    }

    #[must_use]
    pub const fn with_refit(mut self, cargo: CargoId) -> Self {
        self.refit_cargo = Some(cargo);
        self
    }

    #[must_use]
    pub const fn untimetabled(mut self) -> Self {
        self.wait_ticks = None;
        self.travel_ticks = None;
        self
    }

    const fn is_timetabled(&self) -> bool {
        self.wait_ticks.is_some() && self.travel_ticks.is_some()
    }
}

/// Order list health, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderListType {
    Empty,
    Incomplete,
    Unpunctual,
    Autofilling,
    Ok,
}

impl OrderListType {
    pub const ALL: [Self; 5] = [
        Self::Empty,
        Self::Incomplete,
        Self::Unpunctual,
        Self::Autofilling,
        Self::Ok,
    ];

    /// Fold a new classification into a bucket's current one.
    #[must_use]
    pub fn merge(self, new: Self) -> Self {
        match (self, new) {
            (Self::Autofilling, Self::Incomplete | Self::Unpunctual) => new,
            (Self::Incomplete | Self::Unpunctual, Self::Autofilling) => self,
            _ => self.min(new),
        }
    }

    #[must_use]
    pub const fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Empty),
            1 => Some(Self::Incomplete),
            2 => Some(Self::Unpunctual),
            3 => Some(Self::Autofilling),
            4 => Some(Self::Ok),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Incomplete => "incomplete",
            Self::Unpunctual => "unpunctual",
            Self::Autofilling => "autofilling",
            Self::Ok => "ok",
        }
    }
}

/// Orders shared by one or more vehicles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderList {
    pub id: OrderListId,
    #[serde(default)]
    pub orders: Vec<Order>,
    /// Timetable autofill is running
    #[serde(default)]
    pub autofilling: bool,
    /// Current lateness of the timetable in ticks
    #[serde(default)]
    pub lateness_ticks: i32,
    /// Primary vehicles sharing this list, in join order
    #[serde(default)]
    pub sharers: Vec<VehicleId>,
}

impl OrderList {
    #[must_use]
    pub fn new(id: OrderListId, orders: Vec<Order>) -> Self {
        Self {
            id,
            orders,
            autofilling: false,
            lateness_ticks: 0,
            sharers: Vec::new(),
        }
    }

    #[must_use]
    pub fn classify(&self) -> OrderListType {
        if self.orders.is_empty() {
            OrderListType::Empty
        } else if self.autofilling {
            OrderListType::Autofilling
        } else if !self.orders.iter().all(Order::is_timetabled) {
            OrderListType::Incomplete
        } else if self.lateness_ticks > 0 {
            OrderListType::Unpunctual
        } else {
            OrderListType::Ok
        }
    }

    /// Cargo the list refits to.
    #[must_use]
    pub fn refit_cargos(&self) -> CargoTypes {
        self.orders.iter().filter_map(|o| o.refit_cargo).collect()
    }

    /// Destinations in order, keeping the first visit of each station.
    #[must_use]
    pub fn unique_destinations(&self) -> Vec<StationId> {
        let mut seen = Vec::with_capacity(self.orders.len());
        for order in &self.orders {
            if !seen.contains(&order.destination) {
                seen.push(order.destination);
            }
        }
        seen
    }

    #[must_use]
    pub fn is_shared(&self) -> bool {
        self.sharers.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let mut list = OrderList::new(OrderListId(1), Vec::new());
        assert_eq!(list.classify(), OrderListType::Empty);

        list.orders.push(Order::to(StationId(1)));
        assert_eq!(list.classify(), OrderListType::Ok);

        list.lateness_ticks = 30;
        assert_eq!(list.classify(), OrderListType::Unpunctual);

        list.orders.push(Order::to(StationId(2)).untimetabled());
        assert_eq!(list.classify(), OrderListType::Incomplete);

        list.autofilling = true;
        assert_eq!(list.classify(), OrderListType::Autofilling);
    }

    #[test]
    fn test_merge_rules() {
        use OrderListType::*;
        assert_eq!(Autofilling.merge(Incomplete), Incomplete);
        assert_eq!(Autofilling.merge(Unpunctual), Unpunctual);
        assert_eq!(Incomplete.merge(Autofilling), Incomplete);
        assert_eq!(Unpunctual.merge(Autofilling), Unpunctual);
        assert_eq!(Ok.merge(Autofilling), Autofilling);
        assert_eq!(Ok.merge(Empty), Empty);
        assert_eq!(Unpunctual.merge(Incomplete), Incomplete);
    }

    #[test]
    fn test_unique_destinations_keeps_first_visit() {
        let list = OrderList::new(
            OrderListId(1),
            vec![
                Order::to(StationId(3)),
                Order::to(StationId(1)),
                Order::to(StationId(3)).with_refit(CargoId(2)),
            ],
        );
        assert_eq!(list.unique_destinations(), vec![StationId(3), StationId(1)]);
        assert!(list.refit_cargos().contains(CargoId(2)));
    }
}
