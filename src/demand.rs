use std::sync::Arc;

use crate::pathfinder::{Direction, Itinerary};
use crate::shared::Time;

/// Where a passenger wants to go and when.
#[derive(Debug, Clone, Copy)]
pub struct Request {
    pub origin_taz: u32,
    pub destination_taz: u32,
    pub direction: Direction,
    /// Preferred arrival time for outbound requests, preferred departure
    /// time for inbound ones.
    pub preferred_time: Time,
}

impl Request {
    /// A request between identical zones never enters assignment.
    pub fn goes_somewhere(&self) -> bool {
        self.origin_taz != self.destination_taz
    }
}

/// Where the simulator last left a passenger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PassengerStatus {
    #[default]
    Initial,
    Walking,
    Waiting,
    OnBoard,
    Arrived,
    Bumped,
}

impl PassengerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassengerStatus::Initial => "initial",
            PassengerStatus::Walking => "walking",
            PassengerStatus::Waiting => "waiting",
            PassengerStatus::OnBoard => "on_board",
            PassengerStatus::Arrived => "arrived",
            PassengerStatus::Bumped => "bumped",
        }
    }
}

/// What a passenger actually experienced during the event pass.
#[derive(Debug, Clone, Default)]
pub struct Experience {
    pub status: PassengerStatus,
    /// Arrival times at boarding stops.
    pub stop_arrivals: Vec<Time>,
    pub boards: Vec<Time>,
    pub alights: Vec<Time>,
    pub destination_arrival: Option<Time>,
}

#[derive(Debug, Clone)]
pub struct Passenger {
    pub id: Arc<str>,
    pub request: Request,
    /// The itinerary chosen by the last assignment pass; empty when no
    /// feasible path was found.
    pub itinerary: Itinerary,
    pub experience: Experience,
}

impl Passenger {
    pub fn new(id: &str, request: Request) -> Self {
        Self {
            id: id.into(),
            request,
            itinerary: Itinerary::default(),
            experience: Experience::default(),
        }
    }

    pub fn path_found(&self) -> bool {
        self.itinerary.is_found()
    }

    /// True once the simulator walked this passenger to the destination zone.
    pub fn experienced_arrival(&self) -> bool {
        self.experience.destination_arrival.is_some()
    }
}
