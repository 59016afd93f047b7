use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::repository::{
    AccessLink, DwellFormula, Error, Event, EventKind, Repository, Stop, Taz, TransferLink, Trip,
    TripCall, TripStop, TripStopSlice,
};
use crate::shared::{Duration, Time};

#[derive(Debug, Clone)]
struct VehicleDef {
    capacity: Option<u32>,
    dwell: DwellFormula,
}

#[derive(Debug, Clone)]
struct TripDef {
    id: Arc<str>,
    vehicle: Option<Arc<str>>,
    calls: Vec<(Arc<str>, Time, Time)>,
}

/// Collects the raw schedule tables and assembles an immutable [`Repository`].
///
/// References between tables are held by string id and resolved in
/// [`RepositoryBuilder::build`], so insertion order does not matter. A
/// dangling reference fails the build with the offending id and the table
/// it appeared in.
#[derive(Debug, Clone)]
pub struct RepositoryBuilder {
    day: NaiveDate,
    stops: Vec<Stop>,
    stop_lookup: HashMap<Arc<str>, u32>,
    tazs: Vec<Taz>,
    taz_lookup: HashMap<Arc<str>, u32>,
    vehicles: HashMap<Arc<str>, VehicleDef>,
    transfers: Vec<(Arc<str>, Arc<str>, Duration)>,
    access: Vec<(Arc<str>, Arc<str>, Duration)>,
    trips: Vec<TripDef>,
}

impl RepositoryBuilder {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day,
            stops: Vec::new(),
            stop_lookup: HashMap::new(),
            tazs: Vec::new(),
            taz_lookup: HashMap::new(),
            vehicles: HashMap::new(),
            transfers: Vec::new(),
            access: Vec::new(),
            trips: Vec::new(),
        }
    }

    pub fn stop(&mut self, id: &str, name: &str) -> &mut Self {
        self.stop_flagged(id, name, true)
    }

    pub fn stop_flagged(&mut self, id: &str, name: &str, transfer_allowed: bool) -> &mut Self {
        let id: Arc<str> = id.into();
        let index = self.stops.len() as u32;
        self.stop_lookup.insert(id.clone(), index);
        self.stops.push(Stop {
            index,
            id,
            name: name.into(),
            transfer_allowed,
        });
        self
    }

    pub fn taz(&mut self, id: &str) -> &mut Self {
        let id: Arc<str> = id.into();
        let index = self.tazs.len() as u32;
        self.taz_lookup.insert(id.clone(), index);
        self.tazs.push(Taz { index, id });
        self
    }

    pub fn vehicle(&mut self, name: &str, capacity: Option<u32>, dwell: DwellFormula) -> &mut Self {
        self.vehicles
            .insert(name.into(), VehicleDef { capacity, dwell });
        self
    }

    /// Registers a walk connection between two stops. Transfers are
    /// symmetric; the reverse direction is inserted as well.
    pub fn transfer(&mut self, from_stop: &str, to_stop: &str, time: Duration) -> &mut Self {
        self.transfers.push((from_stop.into(), to_stop.into(), time));
        self.transfers.push((to_stop.into(), from_stop.into(), time));
        self
    }

    pub fn access_link(&mut self, taz: &str, stop: &str, time: Duration) -> &mut Self {
        self.access.push((taz.into(), stop.into(), time));
        self
    }

    pub fn trip(
        &mut self,
        id: &str,
        vehicle: Option<&str>,
        calls: &[(&str, Time, Time)],
    ) -> &mut Self {
        self.trips.push(TripDef {
            id: id.into(),
            vehicle: vehicle.map(Into::into),
            calls: calls
                .iter()
                .map(|(stop, arrival, departure)| ((*stop).into(), *arrival, *departure))
                .collect(),
        });
        self
    }

    pub fn build(self) -> Result<Repository, Error> {
        let stop_count = self.stops.len();

        let mut trips = Vec::with_capacity(self.trips.len());
        let mut trip_lookup: HashMap<Arc<str>, u32> = HashMap::new();
        let mut trip_stops: Vec<TripStop> = Vec::new();
        let mut stop_arrivals: Vec<Vec<TripCall>> = vec![Vec::new(); stop_count];
        let mut stop_departures: Vec<Vec<TripCall>> = vec![Vec::new(); stop_count];
        let mut events: Vec<Event> = Vec::new();

        for def in &self.trips {
            let trip_idx = trips.len() as u32;
            let (capacity, dwell) = match &def.vehicle {
                Some(name) => {
                    let vehicle =
                        self.vehicles
                            .get(name)
                            .ok_or_else(|| Error::UnknownVehicle {
                                id: name.clone(),
                                context: "trip table",
                            })?;
                    (vehicle.capacity, vehicle.dwell)
                }
                None => (None, DwellFormula::default()),
            };

            let slice = TripStopSlice {
                start_idx: trip_stops.len() as u32,
                count: def.calls.len() as u32,
            };
            for (seq0, (stop_id, arrival, departure)) in def.calls.iter().enumerate() {
                let stop_idx = *self.stop_lookup.get(stop_id).ok_or_else(|| {
                    Error::UnknownStop {
                        id: stop_id.clone(),
                        context: "stop-time table",
                    }
                })?;
                let seq = seq0 as u32 + 1;
                trip_stops.push(TripStop {
                    trip_idx,
                    stop_idx,
                    seq,
                    arrival: *arrival,
                    departure: *departure,
                });
                stop_arrivals[stop_idx as usize].push(TripCall {
                    time: *arrival,
                    trip_idx,
                    seq,
                });
                stop_departures[stop_idx as usize].push(TripCall {
                    time: *departure,
                    trip_idx,
                    seq,
                });
                events.push(Event {
                    time: *arrival,
                    stop_idx,
                    trip_idx,
                    kind: EventKind::Arrival,
                });
                events.push(Event {
                    time: *departure,
                    stop_idx,
                    trip_idx,
                    kind: EventKind::Departure,
                });
            }

            trip_lookup.insert(def.id.clone(), trip_idx);
            trips.push(Trip {
                index: trip_idx,
                id: def.id.clone(),
                capacity,
                dwell,
                slice,
            });
        }

        let mut stop_to_transfers: Vec<Vec<TransferLink>> = vec![Vec::new(); stop_count];
        for (from, to, time) in &self.transfers {
            let from_idx = *self.stop_lookup.get(from).ok_or_else(|| Error::UnknownStop {
                id: from.clone(),
                context: "transfer table",
            })?;
            let to_idx = *self.stop_lookup.get(to).ok_or_else(|| Error::UnknownStop {
                id: to.clone(),
                context: "transfer table",
            })?;
            stop_to_transfers[from_idx as usize].push(TransferLink {
                to_stop_idx: to_idx,
                time: *time,
            });
        }

        let mut taz_to_access: Vec<Vec<AccessLink>> = vec![Vec::new(); self.tazs.len()];
        for (taz, stop, time) in &self.access {
            let taz_idx = *self.taz_lookup.get(taz).ok_or_else(|| Error::UnknownTaz {
                id: taz.clone(),
                context: "access-link table",
            })?;
            let stop_idx = *self.stop_lookup.get(stop).ok_or_else(|| Error::UnknownStop {
                id: stop.clone(),
                context: "access-link table",
            })?;
            taz_to_access[taz_idx as usize].push(AccessLink {
                stop_idx,
                time: *time,
            });
        }

        for calls in stop_arrivals.iter_mut().chain(stop_departures.iter_mut()) {
            calls.sort_by_key(|call| (call.time, call.trip_idx, call.seq));
        }
        // The event order is the sole source of causality in the simulator:
        // arrivals must precede departures at equal keys so alighting
        // passengers free capacity before boards are served.
        events.sort_by_key(|event| (event.time, event.stop_idx, event.trip_idx, event.kind));

        Ok(Repository {
            stops: self.stops.into(),
            trips: trips.into(),
            tazs: self.tazs.into(),
            trip_stops: trip_stops.into(),
            events: events.into(),
            day: self.day,
            stop_lookup: self.stop_lookup,
            trip_lookup,
            taz_lookup: self.taz_lookup,
            stop_to_transfers: stop_to_transfers
                .into_iter()
                .map(Into::into)
                .collect(),
            taz_to_access: taz_to_access.into_iter().map(Into::into).collect(),
            stop_arrivals: stop_arrivals.into_iter().map(Into::into).collect(),
            stop_departures: stop_departures.into_iter().map(Into::into).collect(),
        })
    }
}
