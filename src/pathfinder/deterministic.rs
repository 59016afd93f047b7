use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use tracing::debug;

use crate::config::Config;
use crate::demand::Request;
use crate::pathfinder::{BUMP_GRACE, Direction, Error, Itinerary, MAX_LABEL, Mode, Place, State};
use crate::repository::Repository;
use crate::shared::{Duration, Time};
use crate::simulator::BumpWait;

/// A label in the shortest-path search; cumulative travel time from the
/// anchor zone.
#[derive(Debug, Clone, Copy)]
struct SearchState {
    label: Duration,
    deparr_time: Time,
    mode: Mode,
    link: Place,
    link_time: Duration,
}

impl SearchState {
    fn emit(&self) -> State {
        State {
            label: self.label.as_minutes(),
            deparr_time: self.deparr_time,
            mode: self.mode,
            link: self.link,
            link_time: self.link_time,
            cost: self.label.as_minutes(),
            arrival: Time::MAX,
        }
    }
}

/// Trip-based shortest path. Runs backwards (destination to origin) for
/// outbound requests and forwards (origin to destination) for inbound ones.
pub(crate) fn search(
    repository: &Repository,
    config: &Config,
    bump_wait: &BumpWait,
    request: &Request,
    trace: bool,
) -> Result<Itinerary, Error> {
    let direction = request.direction;
    let anchor_taz = direction.anchor_taz(request);

    let mut stop_states: HashMap<u32, SearchState> = HashMap::new();
    // The counter breaks label ties in favor of the first-enqueued entry,
    // keeping the search deterministic for a given input order.
    let mut queue: BinaryHeap<Reverse<(Duration, u64, u32)>> = BinaryHeap::new();
    let mut enqueued: u64 = 0;
    let mut stop_done = vec![false; repository.stops.len()];
    let mut trips_used = vec![false; repository.trips.len()];

    // Anchor walk links: egress legs for outbound, access legs for inbound.
    for link in repository.access_links(anchor_taz) {
        let state = SearchState {
            label: link.time,
            deparr_time: direction.toward_target(request.preferred_time, link.time),
            mode: direction.anchor_mode(),
            link: Place::Taz(anchor_taz),
            link_time: link.time,
        };
        stop_states.insert(link.stop_idx, state);
        queue.push(Reverse((state.label, enqueued, link.stop_idx)));
        enqueued += 1;
        if trace {
            debug!(
                stop = %repository.stops[link.stop_idx as usize].id,
                label = state.label.as_minutes(),
                deparr = %state.deparr_time,
                "seeded anchor walk"
            );
        }
    }

    while let Some(Reverse((current_label, _, current_stop))) = queue.pop() {
        if stop_done[current_stop as usize] {
            continue;
        }
        stop_done[current_stop as usize] = true;

        let Some(&current) = stop_states.get(&current_stop) else {
            continue;
        };
        if trace {
            debug!(
                stop = %repository.stops[current_stop as usize].id,
                label = current_label.as_minutes(),
                "pulled from queue"
            );
        }

        // Update by transfer. Walk states cannot chain into another walk, so
        // only trip-moded states originate transfers.
        if let Mode::Trip(current_trip) = current.mode {
            for transfer in repository.transfers_at(current_stop) {
                let mut new_label = current.label + transfer.time;
                let mut deparr_time = direction.toward_target(current.deparr_time, transfer.time);

                // Someone was bumped here waiting for this trip; leave early
                // enough to get a place in the queue. Only outbound searches
                // re-cost the transfer this way.
                if direction.outbound()
                    && let Some(bump_time) = bump_wait.get(current_trip, current_stop)
                {
                    if deparr_time - config.path_time_window > bump_time {
                        continue;
                    }
                    new_label = new_label + (current.deparr_time - bump_time) + config.bump_buffer;
                    deparr_time = bump_time - transfer.time - config.bump_buffer;
                }

                let old_label = stop_states
                    .get(&transfer.to_stop_idx)
                    .map(|state| state.label)
                    .unwrap_or(MAX_LABEL);
                if new_label < old_label {
                    let state = SearchState {
                        label: new_label,
                        deparr_time,
                        mode: Mode::Transfer,
                        link: Place::Stop(current_stop),
                        link_time: transfer.time,
                    };
                    stop_states.insert(transfer.to_stop_idx, state);
                    queue.push(Reverse((new_label, enqueued, transfer.to_stop_idx)));
                    enqueued += 1;
                    if trace {
                        debug!(
                            stop = %repository.stops[transfer.to_stop_idx as usize].id,
                            label = new_label.as_minutes(),
                            "relaxed transfer"
                        );
                    }
                }
            }
        }

        // Update by trips: vehicles that arrive in time to depart on time
        // (outbound) or depart in time for the passenger (inbound).
        let calls =
            direction.trips_within(repository, current_stop, current.deparr_time, config.path_time_window);
        for call in calls {
            if trips_used[call.trip_idx as usize] {
                continue;
            }

            let arrdep_time = call.time;
            let wait_time = direction.elapsed(current.deparr_time, arrdep_time);

            // A bumped queue at this stop makes late arrivals infeasible:
            // outbound keys on the trip being left, inbound on the trip
            // being boarded.
            let (bump_key_trip, arrive_time) = match direction {
                Direction::Outbound => (current.mode.trip(), arrdep_time),
                Direction::Inbound => (Some(call.trip_idx), current.deparr_time),
            };
            if let Some(key_trip) = bump_key_trip
                && let Some(bump_time) = bump_wait.get(key_trip, current_stop)
                && arrive_time + BUMP_GRACE >= bump_time
                && current.mode != Mode::Trip(call.trip_idx)
            {
                if trace {
                    debug!(
                        trip = %repository.trips[call.trip_idx as usize].id,
                        bump = %bump_time,
                        "arriving after the bumped queue formed, skipping"
                    );
                }
                continue;
            }

            trips_used[call.trip_idx as usize] = true;
            let trip_calls = repository.trip_stops(call.trip_idx);
            let stop_count = repository.number_of_stops(call.trip_idx);
            // Outbound: stops before this one are candidate boardings.
            // Inbound: stops after this one are candidate alightings.
            let seqs: Vec<u32> = match direction {
                Direction::Outbound => (1..call.seq).rev().collect(),
                Direction::Inbound => (call.seq + 1..=stop_count).collect(),
            };
            for seq in seqs {
                let board_alight = &trip_calls[(seq - 1) as usize];
                let deparr_time = direction.board_alight_time(board_alight);
                let in_vehicle_time = direction.elapsed(arrdep_time, deparr_time);
                let new_label = current.label + in_vehicle_time + wait_time;

                let old_label = stop_states
                    .get(&board_alight.stop_idx)
                    .map(|state| state.label)
                    .unwrap_or(MAX_LABEL);
                if new_label < old_label {
                    let state = SearchState {
                        label: new_label,
                        deparr_time,
                        mode: Mode::Trip(call.trip_idx),
                        link: Place::Stop(current_stop),
                        link_time: in_vehicle_time + wait_time,
                    };
                    stop_states.insert(board_alight.stop_idx, state);
                    queue.push(Reverse((new_label, enqueued, board_alight.stop_idx)));
                    enqueued += 1;
                    if trace {
                        debug!(
                            stop = %repository.stops[board_alight.stop_idx as usize].id,
                            trip = %repository.trips[call.trip_idx as usize].id,
                            label = new_label.as_minutes(),
                            "relaxed trip"
                        );
                    }
                }
            }
        }
    }

    // All stops labeled; close the path over the target zone's walk links.
    let target_taz = direction.target_taz(request);
    let mut taz_state: Option<SearchState> = None;
    for link in repository.access_links(target_taz) {
        let Some(stop_state) = stop_states.get(&link.stop_idx).copied() else {
            continue;
        };
        // The first leg away from the zone has to be a trip.
        let Mode::Trip(stop_trip) = stop_state.mode else {
            continue;
        };

        let mut new_label = stop_state.label + link.time;
        let mut deparr_time = direction.toward_target(stop_state.deparr_time, link.time);

        if direction.outbound()
            && let Some(bump_time) = bump_wait.get(stop_trip, link.stop_idx)
        {
            if deparr_time - config.path_time_window > bump_time {
                continue;
            }
            new_label = new_label + (stop_state.deparr_time - bump_time) + config.bump_buffer;
            deparr_time = bump_time - link.time - config.bump_buffer;
        }

        if taz_state.map(|state| new_label < state.label).unwrap_or(true) {
            taz_state = Some(SearchState {
                label: new_label,
                deparr_time,
                mode: direction.target_mode(),
                link: Place::Stop(link.stop_idx),
                link_time: link.time,
            });
        }
    }

    let Some(taz_state) = taz_state else {
        return Err(Error::NoPathFound);
    };

    // Chase successor/predecessor links back to the anchor walk.
    let mut itinerary = Itinerary::default();
    itinerary.insert(Place::Taz(target_taz), taz_state.emit());
    let mut cursor = taz_state;
    let final_mode = direction.anchor_mode();
    while cursor.mode != final_mode {
        let Place::Stop(next_stop) = cursor.link else {
            break;
        };
        let Some(&next_state) = stop_states.get(&next_stop) else {
            break;
        };
        cursor = next_state;
        itinerary.insert(Place::Stop(next_stop), cursor.emit());
    }

    // With a preferred departure time we don't have to leave right away and
    // stand waiting at the stop.
    if !direction.outbound()
        && itinerary.len() >= 2
        && !delay_inbound_departure(repository, config, bump_wait, request, &mut itinerary, trace)
    {
        return Err(Error::NoPathFound);
    }

    if trace {
        for (place, state) in itinerary.iter() {
            debug!(?place, ?state, "final path state");
        }
    }
    Ok(itinerary)
}

/// Shifts an inbound path's access walk to arrive at the boarding stop just
/// in time for the scheduled departure, instead of at the preferred time.
///
/// Returns false when a recorded bump-wait at the boarding stop makes the
/// delayed (or any) departure infeasible; the itinerary is reset in that
/// case.
pub(crate) fn delay_inbound_departure(
    repository: &Repository,
    config: &Config,
    bump_wait: &BumpWait,
    request: &Request,
    itinerary: &mut Itinerary,
    trace: bool,
) -> bool {
    // Inbound itineraries run destination-first, so the access walk is the
    // last state and the first trip ridden sits just before it.
    let first_trip_idx = itinerary.len() - 2;
    let access_idx = itinerary.len() - 1;

    let (alight_stop, trip_idx, board_stop, trip_arrival) = {
        let Some((alight_place, state)) = itinerary.get_index(first_trip_idx) else {
            return false;
        };
        let Place::Stop(alight_stop) = *alight_place else {
            return false;
        };
        let Mode::Trip(trip_idx) = state.mode else {
            return true;
        };
        let Place::Stop(board_stop) = state.link else {
            return false;
        };
        (alight_stop, trip_idx, board_stop, state.deparr_time)
    };

    let (Some(alight_departure), Some(board_departure)) = (
        repository.scheduled_departure(trip_idx, alight_stop),
        repository.scheduled_departure(trip_idx, board_stop),
    ) else {
        return false;
    };

    // Re-time the first trip leg against the schedule, then pull the access
    // walk up to meet it.
    let link_time = alight_departure - board_departure;
    if let Some((_, state)) = itinerary.get_index_mut(first_trip_idx) {
        state.link_time = link_time;
    }
    let stop_depart_time = trip_arrival - link_time;

    let access_link_time = match itinerary.get_index_mut(access_idx) {
        Some((_, state)) => {
            state.deparr_time = stop_depart_time;
            state.link_time
        }
        None => return false,
    };

    if let Some(bump_time) = bump_wait.get(trip_idx, board_stop) {
        // The earliest we can reach the stop is after the bumped queue
        // formed; this path cannot work.
        if request.preferred_time + access_link_time + BUMP_GRACE >= bump_time {
            itinerary.reset();
            return false;
        }
        // Start out in time to get there early.
        let start_time = Time::max(
            request.preferred_time,
            bump_time - access_link_time - config.bump_buffer,
        );
        if trace {
            debug!(start = %start_time, "delayed departure backed off for bumped queue");
        }
        let access_arrival = start_time + access_link_time;
        if let Some((_, state)) = itinerary.get_index_mut(access_idx) {
            state.deparr_time = access_arrival;
        }
        if let Some((_, state)) = itinerary.get_index_mut(first_trip_idx) {
            state.link_time = state.deparr_time - access_arrival;
        }
    }
    true
}
