use crate::demand::Request;
use crate::pathfinder::state::Mode;
use crate::repository::{Repository, TripCall, TripStop};
use crate::shared::{Duration, Time};

/// Which end of a request is fixed in time.
///
/// Outbound requests fix the arrival time, so the search runs backwards in
/// clock time from the destination. Inbound requests fix the departure time
/// and run forwards from the origin. Every piece of time arithmetic in the
/// searches is mirrored through this type instead of threading a ±1 factor
/// around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outbound,
    Inbound,
}

impl Direction {
    pub fn outbound(&self) -> bool {
        matches!(self, Direction::Outbound)
    }

    /// The zone the search seeds from: destination for outbound, origin for
    /// inbound.
    pub fn anchor_taz(&self, request: &Request) -> u32 {
        match self {
            Direction::Outbound => request.destination_taz,
            Direction::Inbound => request.origin_taz,
        }
    }

    /// The zone the search finishes at, opposite of [`Direction::anchor_taz`].
    pub fn target_taz(&self, request: &Request) -> u32 {
        match self {
            Direction::Outbound => request.origin_taz,
            Direction::Inbound => request.destination_taz,
        }
    }

    /// The walk mode of states seeded at the anchor zone.
    pub fn anchor_mode(&self) -> Mode {
        match self {
            Direction::Outbound => Mode::Egress,
            Direction::Inbound => Mode::Access,
        }
    }

    /// The walk mode of the terminal state at the target zone.
    pub fn target_mode(&self) -> Mode {
        match self {
            Direction::Outbound => Mode::Access,
            Direction::Inbound => Mode::Egress,
        }
    }

    /// Moves an instant across a link toward the search target: earlier in
    /// clock time for outbound, later for inbound.
    pub fn toward_target(&self, time: Time, link: Duration) -> Time {
        match self {
            Direction::Outbound => time - link,
            Direction::Inbound => time + link,
        }
    }

    /// Mirror of [`Direction::toward_target`]; moves an instant back toward
    /// the anchor, i.e. forward in travel order.
    pub fn toward_anchor(&self, time: Time, link: Duration) -> Time {
        match self {
            Direction::Outbound => time + link,
            Direction::Inbound => time - link,
        }
    }

    /// The span between two instants measured along the search direction:
    /// `a − b` for outbound, `b − a` for inbound.
    pub fn elapsed(&self, a: Time, b: Time) -> Duration {
        match self {
            Direction::Outbound => a - b,
            Direction::Inbound => b - a,
        }
    }

    /// The trips that can connect to a state at `time`: vehicles arriving at
    /// the stop within the window for outbound, departing within it for
    /// inbound.
    pub fn trips_within<'a>(
        &self,
        repository: &'a Repository,
        stop_idx: u32,
        time: Time,
        window: Duration,
    ) -> &'a [TripCall] {
        match self {
            Direction::Outbound => repository.trips_arriving_within(stop_idx, time, window),
            Direction::Inbound => repository.trips_departing_within(stop_idx, time, window),
        }
    }

    /// The scheduled board (outbound) or alight (inbound) time of a trip
    /// call, as seen from the search target side.
    pub fn board_alight_time(&self, call: &TripStop) -> Time {
        match self {
            Direction::Outbound => call.departure,
            Direction::Inbound => call.arrival,
        }
    }
}
