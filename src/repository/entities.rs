use std::sync::Arc;

use crate::shared::{Duration, Time};

/// A physical point where passengers can board or alight from a vehicle.
#[derive(Debug, Default, Clone)]
pub struct Stop {
    /// The global internal index used for O(1) array lookups in the repository.
    pub index: u32,
    /// The unique external identifier.
    pub id: Arc<str>,
    /// The display name of the stop.
    pub name: Arc<str>,
    /// Whether passengers may originate transfers here. The hyperpath skips
    /// stops with the flag off when it pulls them from the queue.
    pub transfer_allowed: bool,
}

/// A walk connection between two stops.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransferLink {
    pub to_stop_idx: u32,
    /// The time required to walk this transfer.
    pub time: Duration,
}

/// A walk connection between a traffic-analysis zone and a stop.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccessLink {
    pub stop_idx: u32,
    /// The time required to walk between the zone and the stop.
    pub time: Duration,
}

/// A traffic-analysis zone; the origin or destination region of a request,
/// connected to the network through its access links.
#[derive(Debug, Default, Clone)]
pub struct Taz {
    pub index: u32,
    pub id: Arc<str>,
}

/// Dwell time as a linear function of passenger movements, in seconds.
///
/// Coefficients come from the vehicle table; a vehicle without a formula
/// dwells for zero seconds.
#[derive(Debug, Default, Clone, Copy)]
pub struct DwellFormula {
    pub constant: f64,
    pub per_board: f64,
    pub per_alight: f64,
}

impl DwellFormula {
    pub fn evaluate(&self, boards: u32, alights: u32) -> Duration {
        if boards == 0 && alights == 0 {
            return Duration::ZERO;
        }
        let secs = self.constant + self.per_board * boards as f64 + self.per_alight * alights as f64;
        Duration::from_millis((secs * 1000.0).round() as i64)
    }
}

/// A single scheduled run of a vehicle through an ordered sequence of stops.
#[derive(Debug, Default, Clone)]
pub struct Trip {
    pub index: u32,
    pub id: Arc<str>,
    /// Total passenger capacity (seated + standing). `None` when the vehicle
    /// table carries no capacity columns.
    pub capacity: Option<u32>,
    pub dwell: DwellFormula,
    /// Pointer to the full range of scheduled calls for this trip.
    pub(crate) slice: TripStopSlice,
}

/// One scheduled call of a trip at a stop.
#[derive(Debug, Default, Clone, Copy)]
pub struct TripStop {
    pub trip_idx: u32,
    pub stop_idx: u32,
    /// The order of this stop within the trip (starts from 1).
    pub seq: u32,
    pub arrival: Time,
    pub departure: Time,
}

/// Metadata describing a contiguous range within the global `trip_stops` array.
#[derive(Default, Debug, Clone, Copy)]
pub struct TripStopSlice {
    pub start_idx: u32,
    pub count: u32,
}

/// A `(trip, sequence, scheduled time)` answer to a stop's time-window query.
#[derive(Debug, Clone, Copy)]
pub struct TripCall {
    pub time: Time,
    pub trip_idx: u32,
    /// 1-based stop sequence of the call within the trip.
    pub seq: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventKind {
    Arrival,
    Departure,
}

/// A vehicle arriving at or departing from a stop; the unit of the
/// simulator's global timeline.
#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub time: Time,
    pub stop_idx: u32,
    pub trip_idx: u32,
    pub kind: EventKind,
}
