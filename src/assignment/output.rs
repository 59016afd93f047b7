use std::io::Write;

use serde::Serialize;

use crate::demand::Passenger;
use crate::pathfinder::{Mode, Place};
use crate::repository::Repository;
use crate::shared::Time;
use crate::simulator::TripLoad;

fn place_id<'a>(repository: &'a Repository, place: &Place) -> &'a str {
    match place {
        Place::Taz(taz_idx) => &repository.tazs[*taz_idx as usize].id,
        Place::Stop(stop_idx) => &repository.stops[*stop_idx as usize].id,
    }
}

fn mode_str<'a>(repository: &'a Repository, mode: &Mode) -> &'a str {
    match mode {
        Mode::Access => "access",
        Mode::Egress => "egress",
        Mode::Transfer => "transfer",
        Mode::Trip(trip_idx) => &repository.trips[*trip_idx as usize].id,
    }
}

fn join_times(times: &[Time]) -> String {
    times
        .iter()
        .map(Time::to_hms_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Serialize)]
struct PathRow<'a> {
    passenger_id: &'a str,
    place: &'a str,
    label_min: f64,
    deparr_time: String,
    mode: &'a str,
    link: &'a str,
    link_time_min: f64,
}

/// One row per itinerary state, traversal order preserved.
pub fn write_passenger_paths<W: Write>(
    writer: W,
    repository: &Repository,
    passengers: &[Passenger],
) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    for passenger in passengers.iter().filter(|p| p.path_found()) {
        for (place, state) in passenger.itinerary.iter() {
            out.serialize(PathRow {
                passenger_id: &passenger.id,
                place: place_id(repository, place),
                label_min: state.label,
                deparr_time: state.deparr_time.to_hms_string(),
                mode: mode_str(repository, &state.mode),
                link: place_id(repository, &state.link),
                link_time_min: state.link_time.as_minutes(),
            })?;
        }
    }
    out.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct TimeRow<'a> {
    passenger_id: &'a str,
    status: &'a str,
    stop_arrival_times: String,
    board_times: String,
    alight_times: String,
    destination_arrival: String,
}

/// One row per passenger that experienced an arrival in simulation.
pub fn write_passenger_times<W: Write>(
    writer: W,
    passengers: &[Passenger],
) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    for passenger in passengers
        .iter()
        .filter(|p| p.path_found() && p.experienced_arrival())
    {
        let experience = &passenger.experience;
        out.serialize(TimeRow {
            passenger_id: &passenger.id,
            status: experience.status.as_str(),
            stop_arrival_times: join_times(&experience.stop_arrivals),
            board_times: join_times(&experience.boards),
            alight_times: join_times(&experience.alights),
            destination_arrival: experience
                .destination_arrival
                .map(|time| time.to_hms_string())
                .unwrap_or_default(),
        })?;
    }
    out.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct LoadRow<'a> {
    trip_id: &'a str,
    stop_id: &'a str,
    stop_sequence: u32,
    arrival_time: String,
    departure_time: String,
    boards: u32,
    alights: u32,
    onboard: i64,
    dwell_sec: i64,
}

/// One row per trip-stop with the loading from the last event pass.
pub fn write_load_profile<W: Write>(
    writer: W,
    repository: &Repository,
    loads: &[TripLoad],
) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    for trip in repository.trips.iter() {
        let Some(load) = loads.get(trip.index as usize) else {
            continue;
        };
        let mut onboard: i64 = 0;
        for (position, call) in repository.trip_stops(trip.index).iter().enumerate() {
            let boards = load.boards.get(position).copied().unwrap_or(0);
            let alights = load.alights.get(position).copied().unwrap_or(0);
            onboard += boards as i64 - alights as i64;
            out.serialize(LoadRow {
                trip_id: &trip.id,
                stop_id: &repository.stops[call.stop_idx as usize].id,
                stop_sequence: call.seq,
                arrival_time: call.arrival.to_hms_string(),
                departure_time: call.departure.to_hms_string(),
                boards,
                alights,
                onboard,
                dwell_sec: load
                    .dwells
                    .get(position)
                    .map(|dwell| dwell.as_seconds())
                    .unwrap_or(0),
            })?;
        }
    }
    out.flush()?;
    Ok(())
}
