use std::sync::Arc;

use thiserror::Error;

use crate::shared::Duration;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("dispersion parameter must be nonnegative, got {0}")]
    NegativeDispersion(f64),
    #[error("path time window must be positive, got {0} minutes")]
    NonPositiveWindow(f64),
    #[error("bump buffer must not be negative, got {0} minutes")]
    NegativeBumpBuffer(f64),
    #[error("value of time must be positive, got {0}")]
    NonPositiveValueOfTime(f64),
    #[error("at least one sampling attempt is required")]
    NoSamplingAttempts,
    #[error("at least one iteration is required")]
    NoIterations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentType {
    /// Trip-based shortest path; one best itinerary per passenger.
    Deterministic,
    /// Trip-based hyperpath with probabilistic path sampling.
    Stochastic,
    /// Load the itineraries already on the passengers without re-planning.
    SimulationOnly,
}

/// Weights of the generalized cost, all expressed against in-vehicle minutes.
#[derive(Debug, Clone, Copy)]
pub struct Weights {
    pub walk_access: f64,
    pub walk_egress: f64,
    pub walk_transfer: f64,
    pub wait: f64,
    /// Weight of the wait that follows an access or egress boundary.
    pub schedule_delay: f64,
    pub fare_per_boarding: f64,
    pub value_of_time: f64,
    pub transfer_penalty: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            walk_access: 3.93,
            walk_egress: 3.93,
            walk_transfer: 3.93,
            wait: 1.77,
            schedule_delay: 1.77,
            fare_per_boarding: 0.0,
            value_of_time: 999.0,
            transfer_penalty: 47.73,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of outer iterations. With capacity constraints off,
    /// or an uncrowded network, the loop converges after the first one.
    pub max_iterations: u32,
    pub assignment_type: AssignmentType,
    /// Whether chosen paths are loaded onto vehicles. Must be on for
    /// iterative assignment.
    pub simulate: bool,
    /// Trips are only considered within this window of a label's time.
    pub path_time_window: Duration,
    /// Dispersion parameter θ of the logit aggregation; higher values give
    /// sharper choices.
    pub dispersion: f64,
    /// Enforce vehicle capacity during simulation, bumping surplus riders.
    pub capacity_constraint: bool,
    /// Head start to get in line before a recorded bump-wait time.
    pub bump_buffer: Duration,
    /// Retry cap for hyperpath sampling before the passenger is declared
    /// unroutable.
    pub max_sampling_attempts: u32,
    /// Passenger ids whose assignment is traced to the debug log.
    pub trace_passengers: Vec<Arc<str>>,
    /// Seed for the stochastic sampler; fixed seed, fixed itineraries.
    pub seed: u64,
    pub weights: Weights,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iterations: 1,
            assignment_type: AssignmentType::Deterministic,
            simulate: true,
            path_time_window: Duration::from_minutes(30),
            dispersion: 1.0,
            capacity_constraint: false,
            bump_buffer: Duration::from_minutes(5),
            max_sampling_attempts: 1001,
            trace_passengers: Vec::new(),
            seed: 0,
            weights: Weights::default(),
        }
    }
}

impl Config {
    /// Out-of-range parameters fail here, before any passenger is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispersion < 0.0 || self.dispersion.is_nan() {
            return Err(ConfigError::NegativeDispersion(self.dispersion));
        }
        if self.path_time_window <= Duration::ZERO {
            return Err(ConfigError::NonPositiveWindow(
                self.path_time_window.as_minutes(),
            ));
        }
        if self.bump_buffer < Duration::ZERO {
            return Err(ConfigError::NegativeBumpBuffer(self.bump_buffer.as_minutes()));
        }
        if self.weights.value_of_time <= 0.0 {
            return Err(ConfigError::NonPositiveValueOfTime(self.weights.value_of_time));
        }
        if self.max_sampling_attempts == 0 {
            return Err(ConfigError::NoSamplingAttempts);
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::NoIterations);
        }
        Ok(())
    }
}
