//! Cargo sets.

use super::ids::{CargoId, NUM_CARGO};
use serde::{Deserialize, Serialize};

/// Bitset over cargo slots. Serialized as a list of cargo ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<CargoId>", into = "Vec<CargoId>")]
pub struct CargoTypes(pub u64);

impl CargoTypes {
    pub const EMPTY: Self = Self(0);

    /// Set of one cargo. Ids outside the cargo slots give the empty set.
    #[must_use]
    pub const fn single(cargo: CargoId) -> Self {
        if cargo.0 as usize >= NUM_CARGO {
            return Self::EMPTY;
        }
        Self(1u64 << cargo.0)
    }

    pub fn insert(&mut self, cargo: CargoId) {
        self.0 |= Self::single(cargo).0;
    }

    #[must_use]
    pub const fn contains(self, cargo: CargoId) -> bool {
        self.0 & Self::single(cargo).0 != 0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Cargo slots in ascending order.
    pub fn iter(self) -> impl Iterator<Item = CargoId> {
        (0..NUM_CARGO as u8).filter(move |&c| self.contains(CargoId(c))).map(CargoId)
    }
}

impl FromIterator<CargoId> for CargoTypes {
    fn from_iter<I: IntoIterator<Item = CargoId>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for cargo in iter {
            set.insert(cargo);
        }
        set
    }
}

impl From<Vec<CargoId>> for CargoTypes {
    fn from(cargos: Vec<CargoId>) -> Self {
        cargos.into_iter().collect()
    }
}

impl From<CargoTypes> for Vec<CargoId> {
    fn from(set: CargoTypes) -> Self {
        set.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cargo_types_set_ops() {
        let mut set = CargoTypes::EMPTY;
        assert!(set.is_empty());
        set.insert(CargoId(3));
        set.insert(CargoId(63));
        assert!(set.contains(CargoId(3)));
        assert!(!set.contains(CargoId(4)));
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![CargoId(3), CargoId(63)]);

        let other: CargoTypes = [CargoId(0)].into_iter().collect();
        assert_eq!(set.union(other).len(), 3);
    }

    #[test]
    fn test_out_of_range_cargo_does_not_alias() {
        assert_eq!(CargoTypes::single(CargoId(66)), CargoTypes::EMPTY);
        assert!(!CargoTypes::single(CargoId(66)).contains(CargoId(2)));
        assert!(CargoTypes::single(CargoId(63)).contains(CargoId(63)));
    }
}
