//! Filter elements and the per-axis element lists that hold them.

use super::axis::{ElementState, FilterAxis};
use crate::error::{messages, FleetError, Result};
use crate::model::Colour;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;

/// Id of an element within its axis (a town id, cargo id, facility index, ...).
pub type ElementId = u32;

/// The unit of selection. Identity is `(axis, id)`.
#[derive(Debug, Clone, Serialize)]
pub struct FilterElement {
    pub axis: FilterAxis,
    pub id: ElementId,
    pub state: ElementState,
    /// Display colour only; never affects filtering
    pub colour: Option<Colour>,
    pub sort_key: String,
}

impl FilterElement {
    #[must_use]
    pub fn new(axis: FilterAxis, id: ElementId, sort_key: impl Into<String>) -> Self {
        Self {
            axis,
            id,
            state: ElementState::Neutral,
            colour: None,
            sort_key: sort_key.into(),
        }
    }

    #[must_use]
    pub const fn with_colour(mut self, colour: Colour) -> Self {
        self.colour = Some(colour);
        self
    }
}

impl PartialEq for FilterElement {
    fn eq(&self, other: &Self) -> bool {
        self.axis == other.axis && self.id == other.id
    }
}

impl Eq for FilterElement {}

/// Positive and negative ids of one axis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSelection {
    pub positive: BTreeSet<ElementId>,
    pub negative: BTreeSet<ElementId>,
}

impl ActiveSelection {
    /// True if the axis does not constrain anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }
}

/// Insertion-ordered, duplicate-free list of one axis.
#[derive(Debug, Clone)]
pub struct ElementList {
    axis: FilterAxis,
    elements: IndexMap<ElementId, FilterElement>,
}

impl ElementList {
    #[must_use]
    pub fn new(axis: FilterAxis) -> Self {
        Self {
            axis,
            elements: IndexMap::new(),
        }
    }

    #[must_use]
    pub const fn axis(&self) -> FilterAxis {
        self.axis
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Append an element. Duplicates and foreign-axis elements are rejected.
    pub fn insert(&mut self, element: FilterElement) -> Result<()> {
        if element.axis != self.axis {
            return Err(FleetError::invariant(
                messages::DUPLICATE_ELEMENT,
                format!("{} element {} offered to {}", element.axis, element.id, self.axis),
            ));
        }
        if self.elements.contains_key(&element.id) {
            return Err(FleetError::invariant(
                messages::DUPLICATE_ELEMENT,
                format!("{} already lists {}", self.axis, element.id),
            ));
        }
        self.elements.insert(element.id, element);
        Ok(())
    }

    /// Remove an element, keeping the order of the rest.
    pub fn remove(&mut self, id: ElementId) -> Option<FilterElement> {
        self.elements.shift_remove(&id)
    }

    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&FilterElement> {
        self.elements.get(&id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut FilterElement> {
        self.elements.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterElement> {
        self.elements.values()
    }

    pub fn retain(&mut self, keep: impl FnMut(&ElementId, &mut FilterElement) -> bool) {
        self.elements.retain(keep);
    }

    /// Stable sort by display name or by id, depending on the axis.
    pub fn sort(&mut self) {
        if self.axis.sorts_by_name() {
            self.elements
                .sort_by(|_, a, _, b| a.sort_key.cmp(&b.sort_key));
        } else {
            self.elements.sort_keys();
        }
    }

    pub fn reset(&mut self) {
        for element in self.elements.values_mut() {
            element.state = ElementState::Neutral;
        }
    }

    #[must_use]
    pub fn active(&self) -> ActiveSelection {
        let mut selection = ActiveSelection::default();
        for element in self.elements.values() {
            match element.state {
                ElementState::Positive => {
                    selection.positive.insert(element.id);
                }
                ElementState::Negative => {
                    selection.negative.insert(element.id);
                }
                ElementState::Neutral => {}
            }
        }
        selection
    }
}
