mod builder;
mod entities;
pub mod source;

pub use builder::*;
pub use entities::*;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use crate::shared::{Duration, Time};

#[derive(Error, Debug)]
pub enum Error {
    #[error("stop id `{id}` does not match any entry ({context})")]
    UnknownStop { id: Arc<str>, context: &'static str },
    #[error("trip id `{id}` does not match any entry ({context})")]
    UnknownTrip { id: Arc<str>, context: &'static str },
    #[error("zone id `{id}` does not match any entry ({context})")]
    UnknownTaz { id: Arc<str>, context: &'static str },
    #[error("vehicle `{id}` does not match any entry ({context})")]
    UnknownVehicle { id: Arc<str>, context: &'static str },
    #[error("invalid clock time `{0}`")]
    InvalidTime(String),
    #[error("invalid direction `{0}`, expected `outbound` or `inbound`")]
    InvalidDirection(String),
    #[error("failed to read input table")]
    Csv(#[from] csv::Error),
    #[error("failed to open input table")]
    Io(#[from] std::io::Error),
}

/// A read-only, memory-efficient store of the published schedule and the
/// zone connectors around it.
///
/// The `Repository` acts as a flattened relational database, optimized for
/// the labeling searches and the event pass. It uses `Box<[T]>` instead of
/// `Vec<T>` to minimize memory overhead and signal immutability after
/// construction; every entity carries an internal index for O(1) lookups.
#[derive(Debug, Clone, Default)]
pub struct Repository {
    // --- Core Entities ---
    pub stops: Box<[Stop]>,
    pub trips: Box<[Trip]>,
    pub tazs: Box<[Taz]>,
    /// The scheduled calls of every trip, grouped per trip.
    pub trip_stops: Box<[TripStop]>,
    /// The global vehicle timeline, sorted by (time, stop, trip, kind) with
    /// arrivals before departures at equal keys.
    pub events: Box<[Event]>,

    /// The service day all times are anchored to.
    pub day: NaiveDate,

    // --- Primary Key Lookups ---
    stop_lookup: HashMap<Arc<str>, u32>,
    trip_lookup: HashMap<Arc<str>, u32>,
    taz_lookup: HashMap<Arc<str>, u32>,

    // --- Relationship Indices (Adjacency Lists) ---
    /// Index mapping: `stop_index -> [transfer, ...]`.
    stop_to_transfers: Box<[Box<[TransferLink]>]>,
    /// Index mapping: `taz_index -> [access link, ...]`.
    taz_to_access: Box<[Box<[AccessLink]>]>,
    /// Per stop, every scheduled arrival sorted by time.
    stop_arrivals: Box<[Box<[TripCall]>]>,
    /// Per stop, every scheduled departure sorted by time.
    stop_departures: Box<[Box<[TripCall]>]>,
}

impl Repository {
    /// Retrieves a [`Stop`] by its string identifier.
    pub fn stop_by_id(&self, id: &str) -> Option<&Stop> {
        let stop_index = self.stop_lookup.get(id)?;
        Some(&self.stops[*stop_index as usize])
    }

    /// Retrieves a [`Trip`] by its string identifier.
    pub fn trip_by_id(&self, id: &str) -> Option<&Trip> {
        let trip_index = self.trip_lookup.get(id)?;
        Some(&self.trips[*trip_index as usize])
    }

    /// Retrieves a [`Taz`] by its string identifier.
    pub fn taz_by_id(&self, id: &str) -> Option<&Taz> {
        let taz_index = self.taz_lookup.get(id)?;
        Some(&self.tazs[*taz_index as usize])
    }

    /// Retrieves all transfer connections available from a stop.
    pub fn transfers_at(&self, stop_idx: u32) -> &[TransferLink] {
        &self.stop_to_transfers[stop_idx as usize]
    }

    /// Whether passengers may originate transfers at this stop.
    pub fn is_transfer(&self, stop_idx: u32) -> bool {
        self.stops[stop_idx as usize].transfer_allowed
    }

    /// Retrieves the walk links between a zone and its stops.
    pub fn access_links(&self, taz_idx: u32) -> &[AccessLink] {
        &self.taz_to_access[taz_idx as usize]
    }

    /// Efficiently retrieves the slice of scheduled calls for a trip.
    pub fn trip_stops(&self, trip_idx: u32) -> &[TripStop] {
        let slice = self.trips[trip_idx as usize].slice;
        let start = slice.start_idx as usize;
        let end = start + slice.count as usize;
        &self.trip_stops[start..end]
    }

    pub fn number_of_stops(&self, trip_idx: u32) -> u32 {
        self.trips[trip_idx as usize].slice.count
    }

    /// The scheduled departure of a trip at a stop, or `None` when the trip
    /// never calls there.
    pub fn scheduled_departure(&self, trip_idx: u32, stop_idx: u32) -> Option<Time> {
        self.trip_stops(trip_idx)
            .iter()
            .find(|call| call.stop_idx == stop_idx)
            .map(|call| call.departure)
    }

    /// Every trip whose scheduled arrival at the stop falls in
    /// `[time - window, time]`.
    pub fn trips_arriving_within(&self, stop_idx: u32, time: Time, window: Duration) -> &[TripCall] {
        let calls = &self.stop_arrivals[stop_idx as usize];
        let earliest = time - window;
        let lo = calls.partition_point(|call| call.time < earliest);
        let hi = calls.partition_point(|call| call.time <= time);
        &calls[lo..hi]
    }

    /// Every trip whose scheduled departure from the stop falls in
    /// `[time, time + window]`.
    pub fn trips_departing_within(
        &self,
        stop_idx: u32,
        time: Time,
        window: Duration,
    ) -> &[TripCall] {
        let calls = &self.stop_departures[stop_idx as usize];
        let latest = time + window;
        let lo = calls.partition_point(|call| call.time < time);
        let hi = calls.partition_point(|call| call.time <= latest);
        &calls[lo..hi]
    }
}
