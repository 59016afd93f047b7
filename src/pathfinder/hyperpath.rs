use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use tracing::debug;

use crate::config::Config;
use crate::demand::Request;
use crate::pathfinder::deterministic::delay_inbound_departure;
use crate::pathfinder::sampling::{self, RandomSource};
use crate::pathfinder::{Error, Itinerary, MAX_COST, Mode, Place, State};
use crate::repository::Repository;
use crate::shared::Time;
use crate::simulator::BumpWait;

/// `f64` cost usable as a priority-queue key.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CostKey(f64);

impl Eq for CostKey {}

impl Ord for CostKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for CostKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Aggregates a new alternative into an existing label with the logit
/// log-sum, floored to keep exp underflow from producing degenerate labels.
fn combine(theta: f64, old_label: f64, cost: f64) -> f64 {
    let sum = (-theta * old_label).exp() + (-theta * cost).exp();
    (-(1.0 / theta) * sum.ln()).max(0.01)
}

/// Collapses the non-walk candidates of a state bag into a reference label,
/// so incoming transfers are not priced against walk alternatives.
fn nonwalk_label(theta: f64, states: &[State], not_found: f64) -> f64 {
    let sum: f64 = states
        .iter()
        .filter(|state| state.mode.is_trip())
        .map(|state| (-theta * state.cost).exp())
        .sum();
    if sum == 0.0 {
        not_found
    } else {
        -(1.0 / theta) * sum.ln()
    }
}

/// Trip-based hyperpath search followed by probabilistic path sampling.
///
/// Labels a superset of states per stop, aggregated by log-sum, then draws a
/// single itinerary whose selection frequency matches the choice
/// probabilities.
pub(crate) fn search(
    repository: &Repository,
    config: &Config,
    bump_wait: &BumpWait,
    request: &Request,
    rng: &mut dyn RandomSource,
    trace: bool,
) -> Result<Itinerary, Error> {
    let direction = request.direction;
    let theta = config.dispersion;
    let weights = &config.weights;
    let anchor_taz = direction.anchor_taz(request);

    let mut stop_states: HashMap<u32, Vec<State>> = HashMap::new();
    let mut queue: BinaryHeap<Reverse<(CostKey, u64, u32)>> = BinaryHeap::new();
    let mut enqueued: u64 = 0;
    let mut stop_done = vec![false; repository.stops.len()];
    let mut trips_used = vec![false; repository.trips.len()];

    for link in repository.access_links(anchor_taz) {
        let walk_weight = if direction.outbound() {
            weights.walk_egress
        } else {
            weights.walk_access
        };
        // TODO: the extra unit on the seed cost predates this implementation
        // and its purpose is unclear; kept for behavioral parity.
        let cost = 1.0 + walk_weight * link.time.as_minutes();
        let state = State {
            label: cost,
            deparr_time: direction.toward_target(request.preferred_time, link.time),
            mode: direction.anchor_mode(),
            link: Place::Taz(anchor_taz),
            link_time: link.time,
            cost,
            arrival: Time::MAX,
        };
        stop_states.entry(link.stop_idx).or_default().push(state);
        queue.push(Reverse((CostKey(cost), enqueued, link.stop_idx)));
        enqueued += 1;
        if trace {
            debug!(
                stop = %repository.stops[link.stop_idx as usize].id,
                cost,
                "seeded anchor walk"
            );
        }
    }

    while let Some(Reverse((CostKey(current_label), _, current_stop))) = queue.pop() {
        if stop_done[current_stop as usize] {
            continue;
        }
        // Stops without transfer neighbors never originate new states.
        if !repository.is_transfer(current_stop) {
            continue;
        }
        stop_done[current_stop as usize] = true;

        let current_states = match stop_states.get(&current_stop) {
            Some(states) => states.clone(),
            None => continue,
        };
        let current_mode = current_states[0].mode;
        // Latest departure for outbound, earliest arrival for inbound.
        let mut latest_dep_earliest_arr = current_states[0].deparr_time;
        for state in &current_states[1..] {
            latest_dep_earliest_arr = if direction.outbound() {
                latest_dep_earliest_arr.max(state.deparr_time)
            } else {
                latest_dep_earliest_arr.min(state.deparr_time)
            };
        }
        if trace {
            debug!(
                stop = %repository.stops[current_stop as usize].id,
                label = current_label,
                states = current_states.len(),
                "pulled from queue"
            );
        }

        // Update by transfer.
        if current_mode != Mode::Egress && current_mode != Mode::Access {
            let nonwalk = nonwalk_label(theta, &current_states, MAX_COST);
            for transfer in repository.transfers_at(current_stop) {
                let deparr_time = direction.toward_target(latest_dep_earliest_arr, transfer.time);
                let cost = nonwalk + weights.walk_transfer * transfer.time.as_minutes();
                let new_label = match stop_states
                    .get(&transfer.to_stop_idx)
                    .and_then(|states| states.last())
                {
                    Some(last) => combine(theta, last.label, cost),
                    None => cost,
                };
                if new_label < MAX_COST && new_label > 0.0 {
                    stop_states
                        .entry(transfer.to_stop_idx)
                        .or_default()
                        .push(State {
                            label: new_label,
                            deparr_time,
                            mode: Mode::Transfer,
                            link: Place::Stop(current_stop),
                            link_time: transfer.time,
                            cost,
                            arrival: Time::MAX,
                        });
                    queue.push(Reverse((CostKey(new_label), enqueued, transfer.to_stop_idx)));
                    enqueued += 1;
                }
            }
        }

        // Update by trips.
        let calls = direction.trips_within(
            repository,
            current_stop,
            latest_dep_earliest_arr,
            config.path_time_window,
        );
        for call in calls {
            if trips_used[call.trip_idx as usize] {
                continue;
            }
            trips_used[call.trip_idx as usize] = true;

            let arrdep_time = call.time;
            let wait_time = direction.elapsed(latest_dep_earliest_arr, arrdep_time);
            let trip_calls = repository.trip_stops(call.trip_idx);
            let stop_count = repository.number_of_stops(call.trip_idx);
            let seqs: Vec<u32> = if direction.outbound() {
                (1..call.seq).collect()
            } else {
                (call.seq + 1..=stop_count).collect()
            };
            for seq in seqs {
                let board_alight = &trip_calls[(seq - 1) as usize];
                // Zone-seeded stops never become intermediate boardings.
                if let Some(states) = stop_states.get(&board_alight.stop_idx)
                    && matches!(states[0].mode, Mode::Egress | Mode::Access)
                {
                    continue;
                }

                let deparr_time = direction.board_alight_time(board_alight);
                let in_vehicle_time = direction.elapsed(arrdep_time, deparr_time);
                let fare_cost = weights.fare_per_boarding * 60.0 / weights.value_of_time;
                // Boarding straight off a zone walk is schedule delay;
                // boarding anywhere else is a weighted wait plus the flat
                // transfer penalty.
                let cost = if matches!(current_mode, Mode::Egress | Mode::Access) {
                    current_label
                        + in_vehicle_time.as_minutes()
                        + weights.schedule_delay * wait_time.as_minutes()
                        + fare_cost
                } else {
                    current_label
                        + in_vehicle_time.as_minutes()
                        + weights.wait * wait_time.as_minutes()
                        + fare_cost
                        + weights.transfer_penalty
                };

                let new_label = match stop_states
                    .get(&board_alight.stop_idx)
                    .and_then(|states| states.last())
                {
                    Some(last) => combine(theta, last.label, cost),
                    None => cost,
                };
                if new_label < MAX_COST && new_label > 0.0 {
                    stop_states
                        .entry(board_alight.stop_idx)
                        .or_default()
                        .push(State {
                            label: new_label,
                            deparr_time,
                            mode: Mode::Trip(call.trip_idx),
                            link: Place::Stop(current_stop),
                            link_time: in_vehicle_time + wait_time,
                            cost,
                            arrival: arrdep_time,
                        });
                    queue.push(Reverse((
                        CostKey(new_label),
                        enqueued,
                        board_alight.stop_idx,
                    )));
                    enqueued += 1;
                }
            }
        }
    }

    // All stops labeled; aggregate the target zone's walk links into a
    // single zone label.
    let target_taz = direction.target_taz(request);
    let mut taz_states: Vec<State> = Vec::new();
    for link in repository.access_links(target_taz) {
        // A stop the labeling never reached would truncate to a
        // zero-probability bucket; skip it outright.
        let Some(states) = stop_states.get(&link.stop_idx) else {
            continue;
        };
        // Earliest departure for outbound, latest arrival for inbound.
        let mut earliest_dep_latest_arr = states[0].deparr_time;
        for state in &states[1..] {
            earliest_dep_latest_arr = if direction.outbound() {
                earliest_dep_latest_arr.min(state.deparr_time)
            } else {
                earliest_dep_latest_arr.max(state.deparr_time)
            };
        }
        let nonwalk = nonwalk_label(theta, states, MAX_COST);
        let deparr_time = earliest_dep_latest_arr - link.time;
        let walk_weight = if direction.outbound() {
            weights.walk_access
        } else {
            weights.walk_egress
        };
        let new_cost = nonwalk + walk_weight * link.time.as_minutes();
        let new_label = match taz_states.last() {
            Some(last) => combine(theta, last.label, new_cost),
            None => new_cost,
        };
        if new_label < MAX_COST && new_label > 0.0 {
            taz_states.push(State {
                label: new_label,
                deparr_time,
                mode: direction.target_mode(),
                link: Place::Stop(link.stop_idx),
                link_time: link.time,
                cost: new_cost,
                arrival: Time::MAX,
            });
        }
    }

    if taz_states.is_empty() {
        return Err(Error::NoPathFound);
    }

    // Draw an itinerary; a dead-ended draw is retried from scratch.
    for attempt in 0..config.max_sampling_attempts {
        let Some(mut itinerary) =
            choose_path(repository, config, request, &taz_states, &stop_states, rng, trace)
        else {
            if trace {
                debug!(attempt, "sampling dead end, retrying");
            }
            continue;
        };

        if !direction.outbound()
            && itinerary.len() >= 2
            && !delay_inbound_departure(repository, config, bump_wait, request, &mut itinerary, trace)
        {
            return Err(Error::NoPathFound);
        }
        return Ok(itinerary);
    }
    Err(Error::SamplingExhausted)
}

/// Draws one itinerary from the hyperpath states. Returns `None` when the
/// draw runs into a stop with no feasible continuation.
fn choose_path(
    repository: &Repository,
    config: &Config,
    request: &Request,
    taz_states: &[State],
    stop_states: &HashMap<u32, Vec<State>>,
    rng: &mut dyn RandomSource,
    trace: bool,
) -> Option<Itinerary> {
    let direction = request.direction;
    let theta = config.dispersion;
    let taz_label = taz_states.last()?.label;

    // Cumulative integer probabilities over the zone walk alternatives;
    // buckets under one permille are dropped.
    let denom = (-theta * taz_label).exp();
    let mut access_cum: Vec<(u32, &State)> = Vec::new();
    let mut cum = 0u32;
    for state in taz_states {
        let prob = (1000.0 * (-theta * state.cost).exp() / denom) as u32;
        if prob < 1 {
            continue;
        }
        cum += prob;
        access_cum.push((cum, state));
    }
    let chosen = **sampling::choose(&access_cum, rng)?;

    let mut itinerary = Itinerary::default();
    let start_taz = if direction.outbound() {
        request.origin_taz
    } else {
        request.destination_taz
    };
    itinerary.insert(Place::Taz(start_taz), chosen);
    if trace {
        debug!(state = ?chosen, "chose zone walk");
    }

    let Place::Stop(mut current_stop) = chosen.link else {
        return None;
    };
    // Arrival time at the stop for outbound, departure from it for inbound.
    let mut arrdep_time = direction.toward_anchor(chosen.deparr_time, chosen.link_time);
    let mut last_mode = chosen.mode;

    loop {
        let states = stop_states.get(&current_stop)?;
        let mut candidates: Vec<&State> = Vec::new();
        let mut sum_exp = 0.0;
        for state in states {
            // No double walk: a walk link must be followed by a ride.
            if direction.outbound()
                && matches!(state.mode, Mode::Egress | Mode::Transfer)
                && matches!(last_mode, Mode::Access | Mode::Transfer)
            {
                continue;
            }
            if !direction.outbound()
                && matches!(state.mode, Mode::Access | Mode::Transfer)
                && matches!(last_mode, Mode::Egress | Mode::Transfer)
            {
                continue;
            }
            // We cannot depart before we arrive (outbound) or arrive after
            // we depart (inbound).
            if direction.outbound() && state.deparr_time < arrdep_time {
                continue;
            }
            if !direction.outbound() && state.deparr_time > arrdep_time {
                continue;
            }
            sum_exp += (-theta * state.cost).exp();
            candidates.push(state);
        }
        if candidates.is_empty() {
            return None;
        }

        let mut cum_prob: Vec<(u32, &State)> = Vec::with_capacity(candidates.len());
        let mut cum = 0u32;
        for state in candidates {
            let prob = (1000.0 * (-theta * state.cost).exp() / sum_exp) as u32;
            cum += prob;
            cum_prob.push((cum, state));
        }
        let next_state = **sampling::choose(&cum_prob, rng)?;
        if trace {
            debug!(stop = %repository.stops[current_stop as usize].id, state = ?next_state, "chose state");
        }

        // Revise the first link so the passenger leaves the origin just in
        // time for the boarding instead of at the preferred time.
        if direction.outbound()
            && itinerary.len() == 1
            && let Mode::Trip(trip_idx) = next_state.mode
            && let Some(scheduled) = repository.scheduled_departure(trip_idx, current_stop)
            && let Some((_, origin_state)) = itinerary.get_index_mut(0)
        {
            origin_state.deparr_time = scheduled - origin_state.link_time;
        }

        itinerary.insert(Place::Stop(current_stop), next_state);
        last_mode = next_state.mode;
        arrdep_time = if next_state.mode == Mode::Transfer {
            direction.toward_anchor(arrdep_time, next_state.link_time)
        } else {
            next_state.arrival
        };

        // Reaching the anchor-side walk closes the path.
        if next_state.mode == direction.anchor_mode() {
            break;
        }
        let Place::Stop(next_stop) = next_state.link else {
            return None;
        };
        current_stop = next_stop;
    }
    Some(itinerary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_improves_on_both_alternatives() {
        let label = combine(1.0, 10.0, 10.0);
        assert!(label < 10.0);
        assert!(label > 9.0);
    }

    #[test]
    fn combine_is_floored() {
        let label = combine(1.0, 0.005, 0.005);
        assert_eq!(label, 0.01);
    }

    #[test]
    fn nonwalk_label_ignores_walk_states() {
        let walk = State {
            label: 1.0,
            deparr_time: Time::from_minutes(480),
            mode: Mode::Transfer,
            link: Place::Stop(0),
            link_time: crate::shared::Duration::from_minutes(2),
            cost: 1.0,
            arrival: Time::MAX,
        };
        let ride = State {
            mode: Mode::Trip(3),
            cost: 12.0,
            ..walk
        };
        assert_eq!(nonwalk_label(1.0, &[walk], 42.0), 42.0);
        let label = nonwalk_label(1.0, &[walk, ride], 42.0);
        assert!((label - 12.0).abs() < 1e-9);
    }
}
