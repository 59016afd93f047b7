use indexmap::IndexMap;

use crate::shared::{Duration, Time};

/// A vertex of the search graph: a stop, or one of the two zone
/// pseudo-vertices at the ends of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Place {
    Taz(u32),
    Stop(u32),
}

/// How a state is left (outbound) or entered (inbound).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Walk between the origin zone and a stop.
    Access,
    /// Walk between a stop and the destination zone.
    Egress,
    /// Walk between two stops.
    Transfer,
    /// Ride on the trip with this index.
    Trip(u32),
}

impl Mode {
    pub fn is_trip(&self) -> bool {
        matches!(self, Mode::Trip(_))
    }

    pub fn is_walk(&self) -> bool {
        !self.is_trip()
    }

    pub fn trip(&self) -> Option<u32> {
        match self {
            Mode::Trip(trip_idx) => Some(*trip_idx),
            _ => None,
        }
    }
}

/// One labeled link of a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    /// Best-known cost (minutes-equivalent) or travel time (minutes) from
    /// the search anchor.
    pub label: f64,
    /// Departure time for outbound states, arrival time for inbound ones.
    pub deparr_time: Time,
    pub mode: Mode,
    /// Successor (outbound) or predecessor (inbound): the next place visited
    /// when traversing the path in forward travel order.
    pub link: Place,
    /// Duration of this link.
    pub link_time: Duration,
    /// Generalized cost of this state alone. Mirrors `label` for the
    /// shortest-path search, where no aggregation happens.
    pub cost: f64,
    /// Opposite-boundary time of trip links in the hyperpath (vehicle
    /// arrival for outbound, departure for inbound); `Time::MAX` otherwise.
    pub arrival: Time,
}

/// A chosen path: states keyed by the place they attach to.
///
/// For outbound paths the sequence begins at the origin zone and ends at the
/// destination zone; inbound paths are the mirror. Traversal order matches
/// insertion order and is never re-sorted.
#[derive(Debug, Clone, Default)]
pub struct Itinerary {
    states: IndexMap<Place, State>,
}

impl Itinerary {
    pub fn is_found(&self) -> bool {
        !self.states.is_empty()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn insert(&mut self, place: Place, state: State) {
        self.states.insert(place, state);
    }

    pub fn get(&self, place: &Place) -> Option<&State> {
        self.states.get(place)
    }

    pub fn get_index(&self, index: usize) -> Option<(&Place, &State)> {
        self.states.get_index(index)
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<(&Place, &mut State)> {
        self.states.get_index_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Place, &State)> {
        self.states.iter()
    }

    pub fn reset(&mut self) {
        self.states.clear();
    }
}
