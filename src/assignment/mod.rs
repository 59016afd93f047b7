pub mod output;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{AssignmentType, Config, ConfigError};
use crate::demand::{Passenger, PassengerStatus};
use crate::pathfinder::{PathFinder, SeededRandom};
use crate::repository::Repository;
use crate::simulator::{self, BumpWait, TripLoad};

/// Outcome of the outer assignment loop.
#[derive(Debug, Clone, Default)]
pub struct AssignmentSummary {
    /// Iterations actually run.
    pub iterations: u32,
    /// Passengers holding an itinerary after the last assignment pass.
    pub assigned: usize,
    /// Passengers that reached their destination in the last event pass.
    pub arrived: usize,
    /// `100 · (assigned − arrived) / assigned` of the last iteration.
    pub capacity_gap: f64,
    /// Loading per trip from the last event pass.
    pub loads: Vec<TripLoad>,
    /// Bumped queues observed so far; feeds the next run when reused.
    pub bump_wait: BumpWait,
}

/// The outer iteration loop.
///
/// Each iteration assigns every unserved passenger with the configured
/// route-choice algorithm, loads all itineraries onto vehicles, and measures
/// the capacity gap. Capacity shortfalls are fed back through the bump-wait
/// table so the next iteration plans around full vehicles. The loop stops
/// when the gap closes, when the iteration cap is reached, or after one
/// iteration in stochastic mode.
pub struct Assignment<'a> {
    repository: &'a Repository,
    config: Config,
}

impl<'a> Assignment<'a> {
    /// Validates the configuration before any passenger is touched.
    pub fn new(repository: &'a Repository, config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { repository, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(&self, passengers: &mut [Passenger]) -> AssignmentSummary {
        let mut bump_wait = BumpWait::new();
        let mut summary = AssignmentSummary::default();

        for iteration in 1..=self.config.max_iterations {
            info!(iteration, "generating paths");
            let assigned = self.assign_passengers(passengers, &bump_wait, iteration);

            let (arrived, loads) = if self.config.simulate {
                info!(iteration, "simulating");
                let sim =
                    simulator::simulate(self.repository, &self.config, passengers, &mut bump_wait);
                (sim.arrived, sim.loads)
            } else {
                // Without loading there is nothing to bump; every assigned
                // passenger counts as served.
                (assigned, Vec::new())
            };

            let missed = assigned.saturating_sub(arrived);
            let capacity_gap = if assigned > 0 {
                100.0 * missed as f64 / assigned as f64
            } else {
                0.0
            };
            info!(assigned, arrived, missed, capacity_gap, "iteration complete");

            summary = AssignmentSummary {
                iterations: iteration,
                assigned,
                arrived,
                capacity_gap,
                loads,
                bump_wait: bump_wait.clone(),
            };

            if capacity_gap < 0.001
                || self.config.assignment_type == AssignmentType::Stochastic
            {
                break;
            }
        }
        summary
    }

    /// One assignment pass. Per-passenger searches share nothing but the
    /// read-only schedule and bump-wait snapshot, so they run in parallel;
    /// stochastic searches derive an independent draw stream per passenger.
    fn assign_passengers(
        &self,
        passengers: &mut [Passenger],
        bump_wait: &BumpWait,
        iteration: u32,
    ) -> usize {
        if self.config.assignment_type == AssignmentType::SimulationOnly {
            return passengers
                .iter()
                .filter(|passenger| passenger.request.goes_somewhere() && passenger.path_found())
                .count();
        }
        let stochastic = self.config.assignment_type == AssignmentType::Stochastic;

        let finder = PathFinder::new(self.repository, &self.config, bump_wait);
        let seed = self.config.seed;
        passengers
            .par_iter_mut()
            .enumerate()
            .map(|(index, passenger)| {
                if !passenger.request.goes_somewhere() {
                    return 0;
                }
                // Whoever the last pass served keeps their itinerary.
                if iteration > 1 && passenger.experience.status == PassengerStatus::Arrived {
                    return 1;
                }

                let trace = self.config.trace_passengers.contains(&passenger.id);
                if trace {
                    debug!(passenger = %passenger.id, "tracing assignment");
                }

                let result = if stochastic {
                    let mut rng = SeededRandom::new(
                        seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15),
                    );
                    finder.find_hyperpath(&passenger.request, &mut rng, trace)
                } else {
                    finder.find_shortest_path(&passenger.request, trace)
                };

                match result {
                    Ok(itinerary) => {
                        passenger.itinerary = itinerary;
                        1
                    }
                    Err(error) => {
                        debug!(passenger = %passenger.id, %error, "no path");
                        passenger.itinerary.reset();
                        0
                    }
                }
            })
            .sum()
    }
}
