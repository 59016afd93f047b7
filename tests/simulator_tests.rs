mod common;

use common::{day, minutes, single_trip_network, t};
use ridership::config::Config;
use ridership::demand::{Passenger, PassengerStatus, Request};
use ridership::pathfinder::{Direction, Itinerary, Mode, Place, State};
use ridership::repository::{DwellFormula, Repository, RepositoryBuilder};
use ridership::shared::Time;
use ridership::simulator::{self, BumpWait};

/// Hand-built outbound walk–ride–walk itinerary on the single-trip network,
/// leaving home at `leave_home`.
fn outbound_rider(repository: &Repository, id: &str, leave_home: &str) -> Passenger {
    let origin = repository.taz_by_id("A").unwrap().index;
    let destination = repository.taz_by_id("B").unwrap().index;
    let board = repository.stop_by_id("X").unwrap().index;
    let alight = repository.stop_by_id("Y").unwrap().index;
    let trip = repository.trip_by_id("t1").unwrap().index;

    let mut passenger = Passenger::new(
        id,
        Request {
            origin_taz: origin,
            destination_taz: destination,
            direction: Direction::Outbound,
            preferred_time: t("08:00:00"),
        },
    );
    let mut itinerary = Itinerary::default();
    itinerary.insert(
        Place::Taz(origin),
        State {
            label: 25.0,
            deparr_time: t(leave_home),
            mode: Mode::Access,
            link: Place::Stop(board),
            link_time: minutes(5),
            cost: 25.0,
            arrival: Time::MAX,
        },
    );
    itinerary.insert(
        Place::Stop(board),
        State {
            label: 20.0,
            deparr_time: t("07:40:00"),
            mode: Mode::Trip(trip),
            link: Place::Stop(alight),
            link_time: minutes(15),
            cost: 20.0,
            arrival: Time::MAX,
        },
    );
    itinerary.insert(
        Place::Stop(alight),
        State {
            label: 5.0,
            deparr_time: t("07:55:00"),
            mode: Mode::Egress,
            link: Place::Taz(destination),
            link_time: minutes(5),
            cost: 5.0,
            arrival: Time::MAX,
        },
    );
    passenger.itinerary = itinerary;
    passenger
}

#[test]
fn single_rider_full_journey() {
    let repository = single_trip_network(Some(50));
    let config = Config {
        capacity_constraint: true,
        ..Default::default()
    };
    let mut passengers = vec![outbound_rider(&repository, "p1", "07:35:00")];
    let mut bump_wait = BumpWait::new();

    let summary = simulator::simulate(&repository, &config, &mut passengers, &mut bump_wait);

    assert_eq!(summary.arrived, 1);
    assert_eq!(summary.bumped, 0);
    assert!(bump_wait.is_empty());

    let experience = &passengers[0].experience;
    assert_eq!(experience.status, PassengerStatus::Arrived);
    assert_eq!(experience.stop_arrivals, vec![t("07:40:00")]);
    assert_eq!(experience.boards, vec![t("07:40:00")]);
    assert_eq!(experience.alights, vec![t("07:55:00")]);
    assert_eq!(experience.destination_arrival, Some(t("08:00:00")));
}

#[test]
fn seat_competition_bumps_the_later_arrival() {
    let repository = single_trip_network(Some(1));
    let config = Config {
        capacity_constraint: true,
        ..Default::default()
    };
    let mut passengers = vec![
        outbound_rider(&repository, "early", "07:25:00"),
        outbound_rider(&repository, "late", "07:29:00"),
    ];
    let mut bump_wait = BumpWait::new();

    let summary = simulator::simulate(&repository, &config, &mut passengers, &mut bump_wait);

    assert_eq!(summary.arrived, 1);
    assert_eq!(summary.bumped, 1);
    assert_eq!(passengers[0].experience.status, PassengerStatus::Arrived);
    assert_eq!(passengers[1].experience.status, PassengerStatus::Bumped);

    let trip = repository.trip_by_id("t1").unwrap().index;
    let stop = repository.stop_by_id("X").unwrap().index;
    assert_eq!(bump_wait.get(trip, stop), Some(t("07:34:00")));
}

#[test]
fn bump_wait_keeps_the_earliest_waiter() {
    let repository = single_trip_network(Some(1));
    let config = Config {
        capacity_constraint: true,
        ..Default::default()
    };
    let mut passengers = vec![
        outbound_rider(&repository, "boards", "07:23:00"),
        outbound_rider(&repository, "bumped_late", "07:29:00"),
        outbound_rider(&repository, "bumped_early", "07:25:00"),
    ];
    let mut bump_wait = BumpWait::new();

    simulator::simulate(&repository, &config, &mut passengers, &mut bump_wait);

    let trip = repository.trip_by_id("t1").unwrap().index;
    let stop = repository.stop_by_id("X").unwrap().index;
    assert_eq!(bump_wait.get(trip, stop), Some(t("07:30:00")));
}

#[test]
fn capacity_is_never_exceeded() {
    let repository = single_trip_network(Some(2));
    let config = Config {
        capacity_constraint: true,
        ..Default::default()
    };
    let mut passengers = vec![
        outbound_rider(&repository, "p1", "07:25:00"),
        outbound_rider(&repository, "p2", "07:27:00"),
        outbound_rider(&repository, "p3", "07:29:00"),
    ];
    let mut bump_wait = BumpWait::new();

    let summary = simulator::simulate(&repository, &config, &mut passengers, &mut bump_wait);

    assert_eq!(summary.arrived, 2);
    assert_eq!(summary.bumped, 1);

    let trip = repository.trip_by_id("t1").unwrap().index;
    let load = &summary.loads[trip as usize];
    assert_eq!(load.boards, vec![2, 0]);
    assert_eq!(load.alights, vec![0, 2]);
    for boards in &load.boards {
        assert!(*boards <= 2);
    }
}

#[test]
fn dwell_follows_the_vehicle_formula() {
    let mut builder = RepositoryBuilder::new(day());
    builder.taz("A").taz("B");
    builder.stop("X", "West Portal").stop("Y", "Civic Center");
    builder.vehicle(
        "articulated_bus",
        Some(50),
        DwellFormula {
            constant: 4.0,
            per_board: 2.0,
            per_alight: 1.5,
        },
    );
    builder.trip(
        "t1",
        Some("articulated_bus"),
        &[
            ("X", t("07:40:00"), t("07:40:00")),
            ("Y", t("07:55:00"), t("07:55:00")),
        ],
    );
    builder.trip(
        "closer",
        Some("articulated_bus"),
        &[("Y", t("08:30:00"), t("08:30:00"))],
    );
    builder.access_link("A", "X", minutes(5));
    builder.access_link("B", "Y", minutes(5));
    let repository = builder.build().unwrap();

    let config = Config::default();
    let mut passengers = vec![outbound_rider(&repository, "p1", "07:35:00")];
    let mut bump_wait = BumpWait::new();

    let summary = simulator::simulate(&repository, &config, &mut passengers, &mut bump_wait);

    let trip = repository.trip_by_id("t1").unwrap().index;
    let dwells = &summary.loads[trip as usize].dwells;
    assert_eq!(dwells[0].as_millis(), 6_000);
    assert_eq!(dwells[1].as_millis(), 5_500);
}

#[test]
fn inbound_rider_full_journey() {
    let repository = single_trip_network(Some(50));
    let config = Config::default();

    let origin = repository.taz_by_id("A").unwrap().index;
    let destination = repository.taz_by_id("B").unwrap().index;
    let board = repository.stop_by_id("X").unwrap().index;
    let alight = repository.stop_by_id("Y").unwrap().index;
    let trip = repository.trip_by_id("t1").unwrap().index;

    let mut passenger = Passenger::new(
        "p1",
        Request {
            origin_taz: origin,
            destination_taz: destination,
            direction: Direction::Inbound,
            preferred_time: t("07:30:00"),
        },
    );
    // Inbound itineraries run destination-first.
    let mut itinerary = Itinerary::default();
    itinerary.insert(
        Place::Taz(destination),
        State {
            label: 35.0,
            deparr_time: t("08:00:00"),
            mode: Mode::Egress,
            link: Place::Stop(alight),
            link_time: minutes(5),
            cost: 35.0,
            arrival: Time::MAX,
        },
    );
    itinerary.insert(
        Place::Stop(alight),
        State {
            label: 30.0,
            deparr_time: t("07:55:00"),
            mode: Mode::Trip(trip),
            link: Place::Stop(board),
            link_time: minutes(15),
            cost: 30.0,
            arrival: Time::MAX,
        },
    );
    itinerary.insert(
        Place::Stop(board),
        State {
            label: 5.0,
            deparr_time: t("07:40:00"),
            mode: Mode::Access,
            link: Place::Taz(origin),
            link_time: minutes(5),
            cost: 5.0,
            arrival: Time::MAX,
        },
    );
    passenger.itinerary = itinerary;

    let mut passengers = vec![passenger];
    let mut bump_wait = BumpWait::new();
    let summary = simulator::simulate(&repository, &config, &mut passengers, &mut bump_wait);

    assert_eq!(summary.arrived, 1);
    let experience = &passengers[0].experience;
    assert_eq!(experience.status, PassengerStatus::Arrived);
    assert_eq!(experience.boards, vec![t("07:40:00")]);
    assert_eq!(experience.alights, vec![t("07:55:00")]);
    assert_eq!(experience.destination_arrival, Some(t("08:00:00")));
}

#[test]
fn stranded_rider_is_bumped() {
    // Leaves home after the only trip has departed; the itinerary cannot be
    // served.
    let repository = single_trip_network(Some(50));
    let config = Config {
        capacity_constraint: true,
        ..Default::default()
    };
    let mut passengers = vec![outbound_rider(&repository, "p1", "07:50:00")];
    let mut bump_wait = BumpWait::new();

    let summary = simulator::simulate(&repository, &config, &mut passengers, &mut bump_wait);

    assert_eq!(summary.arrived, 0);
    assert_eq!(passengers[0].experience.status, PassengerStatus::Bumped);
    assert!(passengers[0].experience.boards.is_empty());
}
