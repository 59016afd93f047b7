mod models;

pub use models::*;

use std::path::Path;

use chrono::NaiveDate;
use tracing::info;

use crate::demand::{Passenger, Request};
use crate::pathfinder::Direction;
use crate::repository::{DwellFormula, Error, Repository, RepositoryBuilder};
use crate::shared::{Duration, Time};

/// File names of the input tables inside the network directory.
pub struct Config {
    pub stops_path: String,
    pub transfers_path: String,
    pub access_links_path: String,
    pub vehicles_path: String,
    pub trips_path: String,
    pub stop_times_path: String,
    pub demand_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stops_path: "stops.txt".into(),
            transfers_path: "transfers.txt".into(),
            access_links_path: "access_links.txt".into(),
            vehicles_path: "vehicles.txt".into(),
            trips_path: "trips.txt".into(),
            stop_times_path: "stop_times.txt".into(),
            demand_path: "demand.txt".into(),
        }
    }
}

fn parse_time(value: &str) -> Result<Time, Error> {
    Time::from_hms(value).ok_or_else(|| Error::InvalidTime(value.to_owned()))
}

fn minutes(value: f64) -> Duration {
    Duration::from_millis((value * 60_000.0).round() as i64)
}

/// Reads the network tables into a [`RepositoryBuilder`].
///
/// Depending on the size of the tables this can be a long blocking function.
pub fn load_network(dir: &Path, config: &Config, day: NaiveDate) -> Result<RepositoryBuilder, Error> {
    let mut builder = RepositoryBuilder::new(day);

    let mut reader = csv::Reader::from_path(dir.join(&config.stops_path))?;
    for row in reader.deserialize() {
        let row: StopRow = row?;
        builder.stop_flagged(&row.stop_id, &row.stop_name, row.transfer != Some(0));
    }

    let mut reader = csv::Reader::from_path(dir.join(&config.transfers_path))?;
    for row in reader.deserialize() {
        let row: TransferRow = row?;
        builder.transfer(&row.from_stop_id, &row.to_stop_id, minutes(row.transfer_time_min));
    }

    let mut reader = csv::Reader::from_path(dir.join(&config.access_links_path))?;
    let mut seen_tazs: Vec<String> = Vec::new();
    for row in reader.deserialize() {
        let row: AccessLinkRow = row?;
        if !seen_tazs.contains(&row.taz_id) {
            builder.taz(&row.taz_id);
            seen_tazs.push(row.taz_id.clone());
        }
        builder.access_link(&row.taz_id, &row.stop_id, minutes(row.walk_time_min));
    }

    let mut reader = csv::Reader::from_path(dir.join(&config.vehicles_path))?;
    for row in reader.deserialize() {
        let row: VehicleRow = row?;
        let capacity = match (row.seated_capacity, row.standing_capacity) {
            (Some(seated), Some(standing)) => Some(seated + standing),
            (Some(seated), None) => Some(seated),
            _ => None,
        };
        let dwell = DwellFormula {
            constant: row.dwell_constant.unwrap_or_default(),
            per_board: row.dwell_per_board.unwrap_or_default(),
            per_alight: row.dwell_per_alight.unwrap_or_default(),
        };
        builder.vehicle(&row.vehicle_name, capacity, dwell);
    }

    let mut reader = csv::Reader::from_path(dir.join(&config.stop_times_path))?;
    let mut stop_times: Vec<StopTimeRow> = Vec::new();
    for row in reader.deserialize() {
        let row: StopTimeRow = row?;
        stop_times.push(row);
    }
    stop_times.sort_by(|a, b| {
        a.trip_id
            .cmp(&b.trip_id)
            .then(a.stop_sequence.cmp(&b.stop_sequence))
    });

    let mut reader = csv::Reader::from_path(dir.join(&config.trips_path))?;
    let mut trip_count = 0usize;
    for row in reader.deserialize() {
        let row: TripRow = row?;
        let mut calls: Vec<(&str, Time, Time)> = Vec::new();
        for stop_time in stop_times.iter().filter(|s| s.trip_id == row.trip_id) {
            calls.push((
                &stop_time.stop_id,
                parse_time(&stop_time.arrival_time)?,
                parse_time(&stop_time.departure_time)?,
            ));
        }
        builder.trip(&row.trip_id, row.vehicle_name.as_deref(), &calls);
        trip_count += 1;
    }
    info!(trips = trip_count, stop_times = stop_times.len(), "read network tables");

    Ok(builder)
}

/// Reads the demand table, resolving zone references against the repository.
pub fn load_demand(
    dir: &Path,
    config: &Config,
    repository: &Repository,
) -> Result<Vec<Passenger>, Error> {
    let mut passengers = Vec::new();
    let mut reader = csv::Reader::from_path(dir.join(&config.demand_path))?;
    for row in reader.deserialize() {
        let row: DemandRow = row?;
        let direction = match row.direction.to_ascii_lowercase().as_str() {
            "outbound" => Direction::Outbound,
            "inbound" => Direction::Inbound,
            other => return Err(Error::InvalidDirection(other.to_owned())),
        };
        let origin_taz = repository
            .taz_by_id(&row.origin_taz)
            .ok_or_else(|| Error::UnknownTaz {
                id: row.origin_taz.as_str().into(),
                context: "demand table",
            })?
            .index;
        let destination_taz = repository
            .taz_by_id(&row.destination_taz)
            .ok_or_else(|| Error::UnknownTaz {
                id: row.destination_taz.as_str().into(),
                context: "demand table",
            })?
            .index;
        passengers.push(Passenger::new(
            &row.passenger_id,
            Request {
                origin_taz,
                destination_taz,
                direction,
                preferred_time: parse_time(&row.preferred_time)?,
            },
        ));
    }
    info!(passengers = passengers.len(), "read demand table");
    Ok(passengers)
}
