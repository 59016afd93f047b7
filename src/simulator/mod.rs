mod bump;

pub use bump::*;

use tracing::{debug, info};

use crate::config::Config;
use crate::demand::{Passenger, PassengerStatus};
use crate::pathfinder::{Mode, Place};
use crate::repository::{EventKind, Repository};
use crate::shared::{Duration, Time};

/// Per-stop loading of one trip, aligned with the order of the trip's
/// arrival/departure events.
#[derive(Debug, Clone, Default)]
pub struct TripLoad {
    pub boards: Vec<u32>,
    pub alights: Vec<u32>,
    pub dwells: Vec<Duration>,
}

/// What one event pass produced.
#[derive(Debug, Clone, Default)]
pub struct SimulationSummary {
    /// Passengers that reached their destination zone.
    pub arrived: usize,
    /// Passengers denied boarding by a full vehicle.
    pub bumped: usize,
    /// Loading per trip, indexed by trip index.
    pub loads: Vec<TripLoad>,
}

/// Loads the chosen itineraries onto vehicles along the global event
/// timeline, enforcing capacity when configured.
///
/// The pass is strictly sequential: event order is the sole source of
/// causality, so an earlier-timed alight frees capacity before a
/// later-timed board on the same vehicle sees it. Updates the passengers'
/// experienced status and times in place and records bumped queues into
/// `bump_wait`.
pub fn simulate(
    repository: &Repository,
    config: &Config,
    passengers: &mut [Passenger],
    bump_wait: &mut BumpWait,
) -> SimulationSummary {
    let mut arrived = 0usize;
    let mut bumped = 0usize;

    // Runtime (status, path position); positions ascend for outbound
    // passengers and descend for inbound ones.
    let mut runtime: Vec<(PassengerStatus, isize)> =
        vec![(PassengerStatus::Initial, 0); passengers.len()];
    let mut walking: Vec<usize> = Vec::new();
    let mut trip_pax: Vec<Vec<usize>> = vec![Vec::new(); repository.trips.len()];
    let mut stop_pax: Vec<Vec<usize>> = vec![Vec::new(); repository.stops.len()];

    let mut stop_arrivals: Vec<Vec<Time>> = vec![Vec::new(); passengers.len()];
    let mut boards: Vec<Vec<Time>> = vec![Vec::new(); passengers.len()];
    let mut alights: Vec<Vec<Time>> = vec![Vec::new(); passengers.len()];
    let mut destination_arrivals: Vec<Option<Time>> = vec![None; passengers.len()];

    let mut loads: Vec<TripLoad> = vec![TripLoad::default(); repository.trips.len()];

    for (p, passenger) in passengers.iter().enumerate() {
        if !passenger.request.goes_somewhere() || !passenger.path_found() {
            continue;
        }
        let start = if passenger.request.direction.outbound() {
            0
        } else {
            passenger.itinerary.len() as isize - 1
        };
        runtime[p] = (PassengerStatus::Walking, start);
        walking.push(p);
    }

    for event in repository.events.iter() {
        match event.kind {
            EventKind::Arrival => {
                let mut num_alights = 0u32;
                for p in trip_pax[event.trip_idx as usize].clone() {
                    let passenger = &passengers[p];
                    let outbound = passenger.request.direction.outbound();
                    let pos = runtime[p].1;
                    let Some((place, state)) = passenger.itinerary.get_index(pos as usize) else {
                        continue;
                    };
                    let alight_place = if outbound { state.link } else { *place };
                    if alight_place != Place::Stop(event.stop_idx) {
                        continue;
                    }

                    runtime[p] = (
                        PassengerStatus::Walking,
                        pos + if outbound { 1 } else { -1 },
                    );
                    alights[p].push(event.time);
                    walking.push(p);
                    trip_pax[event.trip_idx as usize].retain(|&other| other != p);
                    num_alights += 1;
                    debug!(
                        passenger = %passenger.id,
                        stop = %repository.stops[event.stop_idx as usize].id,
                        time = %event.time,
                        "alighted"
                    );
                }
                loads[event.trip_idx as usize].alights.push(num_alights);
            }
            EventKind::Departure => {
                // Walking passengers who have reached their next stop start
                // waiting there (or, past the egress walk, arrive).
                for p in walking.clone() {
                    let passenger = &passengers[p];
                    let outbound = passenger.request.direction.outbound();
                    let pos = runtime[p].1;
                    let path_len = passenger.itinerary.len();
                    let Some((place, state)) = passenger.itinerary.get_index(pos as usize) else {
                        continue;
                    };

                    let alight_time = if outbound && pos == 0 {
                        // Outbound access link: depart-origin time.
                        state.deparr_time
                    } else if !outbound && pos as usize == path_len - 1 {
                        // Inbound access link: depart-origin time.
                        state.deparr_time - state.link_time
                    } else {
                        match alights[p].last() {
                            Some(&time) => time,
                            None => continue,
                        }
                    };

                    let (walk_time, board_place, new_pos) = if state.mode.is_walk() {
                        (
                            state.link_time,
                            if outbound { state.link } else { *place },
                            pos + if outbound { 1 } else { -1 },
                        )
                    } else {
                        (
                            Duration::ZERO,
                            if outbound { *place } else { state.link },
                            pos,
                        )
                    };
                    let arrive_time = alight_time + walk_time;

                    if event.time >= arrive_time {
                        if state.mode == Mode::Egress {
                            runtime[p] = (PassengerStatus::Arrived, new_pos);
                            destination_arrivals[p] = Some(arrive_time);
                            arrived += 1;
                            debug!(passenger = %passenger.id, time = %arrive_time, "arrived at destination");
                        } else {
                            runtime[p] = (PassengerStatus::Waiting, new_pos);
                            if let Place::Stop(board_stop) = board_place {
                                stop_pax[board_stop as usize].push(p);
                            }
                            stop_arrivals[p].push(arrive_time);
                        }
                        walking.retain(|&other| other != p);
                    }
                }

                // Board what fits; alights at this stop already ran on the
                // arrival event and have freed their seats.
                let mut num_boards = 0u32;
                for p in stop_pax[event.stop_idx as usize].clone() {
                    let passenger = &passengers[p];
                    let pos = runtime[p].1;
                    let Some((_, state)) = passenger.itinerary.get_index(pos as usize) else {
                        continue;
                    };
                    if state.mode != Mode::Trip(event.trip_idx) {
                        continue;
                    }

                    let trip = &repository.trips[event.trip_idx as usize];
                    let full = config.capacity_constraint
                        && trip
                            .capacity
                            .map(|capacity| {
                                trip_pax[event.trip_idx as usize].len() >= capacity as usize
                            })
                            .unwrap_or(false);

                    if full {
                        runtime[p] = (PassengerStatus::Bumped, -1);
                        if let Some(&started_waiting) = stop_arrivals[p].last() {
                            bump_wait.record(event.trip_idx, event.stop_idx, started_waiting);
                        }
                        bumped += 1;
                        debug!(
                            passenger = %passenger.id,
                            trip = %trip.id,
                            stop = %repository.stops[event.stop_idx as usize].id,
                            "bumped, vehicle full"
                        );
                    } else {
                        trip_pax[event.trip_idx as usize].push(p);
                        runtime[p] = (PassengerStatus::OnBoard, pos);
                        boards[p].push(event.time);
                        num_boards += 1;
                        debug!(
                            passenger = %passenger.id,
                            trip = %trip.id,
                            time = %event.time,
                            "boarded"
                        );
                    }
                    stop_pax[event.stop_idx as usize].retain(|&other| other != p);
                }

                let trip_load = &mut loads[event.trip_idx as usize];
                trip_load.boards.push(num_boards);
                let last_alights = trip_load.alights.last().copied().unwrap_or(0);
                trip_load.dwells.push(
                    repository.trips[event.trip_idx as usize]
                        .dwell
                        .evaluate(num_boards, last_alights),
                );
            }
        }
    }

    // Whoever is still en route when the timeline ends could not be served
    // by their chosen schedule.
    for state in runtime.iter_mut() {
        if matches!(
            state.0,
            PassengerStatus::Walking | PassengerStatus::Waiting | PassengerStatus::OnBoard
        ) {
            state.0 = PassengerStatus::Bumped;
        }
    }

    for (p, passenger) in passengers.iter_mut().enumerate() {
        passenger.experience.status = runtime[p].0;
        passenger.experience.stop_arrivals = std::mem::take(&mut stop_arrivals[p]);
        passenger.experience.boards = std::mem::take(&mut boards[p]);
        passenger.experience.alights = std::mem::take(&mut alights[p]);
        passenger.experience.destination_arrival = destination_arrivals[p];
    }

    info!(
        events = repository.events.len(),
        arrived, bumped, "event pass complete"
    );

    SimulationSummary {
        arrived,
        bumped,
        loads,
    }
}
