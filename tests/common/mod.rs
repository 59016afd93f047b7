#![allow(dead_code)]

use chrono::NaiveDate;
use ridership::demand::Request;
use ridership::pathfinder::Direction;
use ridership::repository::{DwellFormula, Repository, RepositoryBuilder};
use ridership::shared::{Duration, Time};

pub fn t(hms: &str) -> Time {
    Time::from_hms(hms).unwrap()
}

pub fn minutes(m: i64) -> Duration {
    Duration::from_minutes(m)
}

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 4, 6).unwrap()
}

pub fn request(
    repository: &Repository,
    from: &str,
    to: &str,
    direction: Direction,
    preferred: &str,
) -> Request {
    Request {
        origin_taz: repository.taz_by_id(from).unwrap().index,
        destination_taz: repository.taz_by_id(to).unwrap().index,
        direction,
        preferred_time: t(preferred),
    }
}

/// `A → X ─t1→ Y → B` with 5-minute walks on both ends; t1 leaves X at
/// 07:40 and reaches Y at 07:55. A late single-stop `closer` run keeps the
/// event timeline alive past every egress walk.
pub fn single_trip_network(capacity: Option<u32>) -> Repository {
    let mut builder = RepositoryBuilder::new(day());
    builder.taz("A").taz("B");
    builder.stop("X", "West Portal").stop("Y", "Civic Center");
    builder.vehicle("standard_bus", capacity, DwellFormula::default());
    builder.trip(
        "t1",
        Some("standard_bus"),
        &[
            ("X", t("07:40:00"), t("07:40:00")),
            ("Y", t("07:55:00"), t("07:55:00")),
        ],
    );
    builder.trip(
        "closer",
        Some("standard_bus"),
        &[("Y", t("08:30:00"), t("08:30:00"))],
    );
    builder.access_link("A", "X", minutes(5));
    builder.access_link("B", "Y", minutes(5));
    builder.build().unwrap()
}

/// `A → S1 ─t1→ S2 ↔ S3 ─t2→ S4 → B`: two rides joined by a 5-minute
/// transfer.
pub fn transfer_network() -> Repository {
    let mut builder = RepositoryBuilder::new(day());
    builder.taz("A").taz("B");
    builder
        .stop("S1", "Quarry Road")
        .stop("S2", "Mill Junction")
        .stop("S3", "Mill Junction East")
        .stop("S4", "Harbor Gate");
    builder.vehicle("standard_bus", Some(50), DwellFormula::default());
    builder.trip(
        "t1",
        Some("standard_bus"),
        &[
            ("S1", t("07:00:00"), t("07:00:00")),
            ("S2", t("07:20:00"), t("07:20:00")),
        ],
    );
    builder.trip(
        "t2",
        Some("standard_bus"),
        &[
            ("S3", t("07:30:00"), t("07:30:00")),
            ("S4", t("07:50:00"), t("07:50:00")),
        ],
    );
    builder.trip(
        "closer",
        Some("standard_bus"),
        &[("S4", t("08:30:00"), t("08:30:00"))],
    );
    builder.transfer("S2", "S3", minutes(5));
    builder.access_link("A", "S1", minutes(5));
    builder.access_link("B", "S4", minutes(5));
    builder.build().unwrap()
}

/// Two runs with identical times between X and Y; the only difference a
/// chooser can express is which vehicle to ride.
pub fn parallel_trips_network() -> Repository {
    let mut builder = RepositoryBuilder::new(day());
    builder.taz("A").taz("B");
    builder.stop("X", "West Portal").stop("Y", "Civic Center");
    builder.vehicle("standard_bus", Some(50), DwellFormula::default());
    for id in ["t1", "t2"] {
        builder.trip(
            id,
            Some("standard_bus"),
            &[
                ("X", t("07:40:00"), t("07:40:00")),
                ("Y", t("07:55:00"), t("07:55:00")),
            ],
        );
    }
    builder.access_link("A", "X", minutes(5));
    builder.access_link("B", "Y", minutes(5));
    builder.build().unwrap()
}
