mod deterministic;
mod direction;
mod hyperpath;
mod sampling;
mod state;

pub use direction::*;
pub use sampling::{RandomSource, ReplayRandom, SeededRandom};
pub use state::*;

use thiserror::Error;

use crate::config::Config;
use crate::demand::Request;
use crate::repository::Repository;
use crate::shared::Duration;
use crate::simulator::BumpWait;

/// Sentinel label for unreached stops in the shortest-path search.
pub(crate) const MAX_LABEL: Duration = Duration::from_minutes(999_999);
/// Sentinel cost for absent states in the hyperpath.
pub(crate) const MAX_COST: f64 = 999_999.0;
/// Grace applied when comparing an arrival against a recorded bump time.
pub(crate) const BUMP_GRACE: Duration = Duration::from_millis(600);

#[derive(Error, Debug)]
pub enum Error {
    /// No feasible itinerary exists for the request. Recorded on the
    /// passenger; never aborts the batch.
    #[error("no feasible itinerary")]
    NoPathFound,
    /// Hyperpath sampling hit the attempt cap; collapses to no-path at the
    /// passenger level.
    #[error("hyperpath sampling attempts exhausted")]
    SamplingExhausted,
}

/// The labeling engine: time-dependent searches over a graph whose vertices
/// are stops plus two zone pseudo-vertices, with access/egress, transfer and
/// trip-segment edges.
///
/// Both algorithms are direction-symmetric. Outbound requests fix the
/// arrival time and search backwards from the destination; inbound requests
/// fix the departure time and search forwards from the origin.
///
/// The finder is short-lived: it borrows the schedule, the run
/// configuration and the current iteration's bump-wait snapshot, and keeps
/// all search state per invocation. Concurrent searches over the same
/// borrows are safe.
pub struct PathFinder<'a> {
    repository: &'a Repository,
    config: &'a Config,
    bump_wait: &'a BumpWait,
}

impl<'a> PathFinder<'a> {
    pub fn new(repository: &'a Repository, config: &'a Config, bump_wait: &'a BumpWait) -> Self {
        Self {
            repository,
            config,
            bump_wait,
        }
    }

    /// Deterministic trip-based shortest path: one best itinerary, labels
    /// are cumulative travel time.
    pub fn find_shortest_path(&self, request: &Request, trace: bool) -> Result<Itinerary, Error> {
        deterministic::search(self.repository, self.config, self.bump_wait, request, trace)
    }

    /// Stochastic trip-based hyperpath: a probability-weighted superset of
    /// states per stop, sampled down to a single itinerary.
    pub fn find_hyperpath(
        &self,
        request: &Request,
        rng: &mut dyn RandomSource,
        trace: bool,
    ) -> Result<Itinerary, Error> {
        hyperpath::search(
            self.repository,
            self.config,
            self.bump_wait,
            request,
            rng,
            trace,
        )
    }
}
