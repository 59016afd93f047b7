mod common;

use std::fs;

use common::{day, minutes, single_trip_network, t};
use ridership::repository::{Error, EventKind, RepositoryBuilder, source};

#[test]
fn arrival_window_is_inclusive_behind() {
    let repository = single_trip_network(Some(50));
    let stop = repository.stop_by_id("Y").unwrap().index;

    // t1 arrives at Y at 07:55.
    let calls = repository.trips_arriving_within(stop, t("07:55:00"), minutes(30));
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].time, t("07:55:00"));

    let calls = repository.trips_arriving_within(stop, t("08:25:00"), minutes(30));
    assert_eq!(calls.len(), 1);

    let calls = repository.trips_arriving_within(stop, t("07:54:00"), minutes(30));
    assert!(calls.is_empty());
}

#[test]
fn departure_window_is_inclusive_ahead() {
    let repository = single_trip_network(Some(50));
    let stop = repository.stop_by_id("X").unwrap().index;

    // t1 departs X at 07:40.
    let calls = repository.trips_departing_within(stop, t("07:40:00"), minutes(30));
    assert_eq!(calls.len(), 1);

    let calls = repository.trips_departing_within(stop, t("07:10:00"), minutes(30));
    assert_eq!(calls.len(), 1);

    let calls = repository.trips_departing_within(stop, t("07:41:00"), minutes(30));
    assert!(calls.is_empty());
}

#[test]
fn events_are_time_ordered_with_arrivals_first() {
    let repository = single_trip_network(Some(50));

    let mut previous = None;
    for event in repository.events.iter() {
        if let Some(previous) = previous {
            assert!(event.time >= previous, "events must be time sorted");
        }
        previous = Some(event.time);
    }

    // At a single (trip, stop) the arrival comes before the departure.
    let trip = repository.trip_by_id("t1").unwrap().index;
    let stop = repository.stop_by_id("X").unwrap().index;
    let kinds: Vec<EventKind> = repository
        .events
        .iter()
        .filter(|event| event.trip_idx == trip && event.stop_idx == stop)
        .map(|event| event.kind)
        .collect();
    assert_eq!(kinds, vec![EventKind::Arrival, EventKind::Departure]);
}

#[test]
fn dangling_stop_reference_fails_the_build() {
    let mut builder = RepositoryBuilder::new(day());
    builder.taz("A");
    builder.stop("X", "West Portal");
    builder.trip(
        "t1",
        None,
        &[("X", t("07:40:00"), t("07:40:00")), ("GHOST", t("07:55:00"), t("07:55:00"))],
    );
    assert!(matches!(
        builder.build(),
        Err(Error::UnknownStop { .. })
    ));
}

#[test]
fn scheduled_departure_resolves_by_stop() {
    let repository = single_trip_network(Some(50));
    let trip = repository.trip_by_id("t1").unwrap().index;
    let board = repository.stop_by_id("X").unwrap().index;
    assert_eq!(
        repository.scheduled_departure(trip, board),
        Some(t("07:40:00"))
    );
    let elsewhere = repository.stop_by_id("Y").unwrap().index;
    assert_eq!(
        repository.scheduled_departure(trip, elsewhere),
        Some(t("07:55:00"))
    );
}

#[test]
fn loads_network_and_demand_from_tables() {
    let dir = std::env::temp_dir().join(format!("ridership_tables_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();

    fs::write(dir.join("stops.txt"), "stop_id,stop_name,transfer\nX,West Portal,1\nY,Civic Center,0\n").unwrap();
    fs::write(dir.join("transfers.txt"), "from_stop_id,to_stop_id,transfer_time_min\nX,Y,7.5\n").unwrap();
    fs::write(
        dir.join("access_links.txt"),
        "taz_id,stop_id,walk_time_min\nA,X,5\nB,Y,5\n",
    )
    .unwrap();
    fs::write(
        dir.join("vehicles.txt"),
        "vehicle_name,seated_capacity,standing_capacity,dwell_constant,dwell_per_board,dwell_per_alight\nstandard_bus,30,20,4,2,1.5\n",
    )
    .unwrap();
    fs::write(dir.join("trips.txt"), "trip_id,vehicle_name\nt1,standard_bus\n").unwrap();
    fs::write(
        dir.join("stop_times.txt"),
        "trip_id,stop_id,stop_sequence,arrival_time,departure_time\nt1,X,1,07:40:00,07:40:00\nt1,Y,2,07:55:00,07:55:00\n",
    )
    .unwrap();
    fs::write(
        dir.join("demand.txt"),
        "passenger_id,origin_taz,destination_taz,direction,preferred_time\np1,A,B,outbound,08:00:00\np2,B,A,inbound,09:00:00\n",
    )
    .unwrap();

    let config = source::Config::default();
    let builder = source::load_network(&dir, &config, day()).unwrap();
    let repository = builder.build().unwrap();

    assert_eq!(repository.stops.len(), 2);
    assert_eq!(repository.trips.len(), 1);
    assert_eq!(repository.tazs.len(), 2);

    let trip = repository.trip_by_id("t1").unwrap();
    assert_eq!(trip.capacity, Some(50));

    let x = repository.stop_by_id("X").unwrap();
    let y = repository.stop_by_id("Y").unwrap();
    assert!(repository.is_transfer(x.index));
    assert!(!repository.is_transfer(y.index));
    // Transfers are symmetric even when listed once.
    assert_eq!(repository.transfers_at(y.index).len(), 1);
    assert_eq!(
        repository.transfers_at(x.index)[0].time,
        ridership::shared::Duration::from_seconds(450)
    );

    let passengers = source::load_demand(&dir, &config, &repository).unwrap();
    assert_eq!(passengers.len(), 2);
    assert_eq!(passengers[0].request.preferred_time, t("08:00:00"));
    assert!(passengers[1].request.goes_somewhere());

    fs::remove_dir_all(&dir).ok();
}
