pub mod assignment;
pub mod config;
pub mod demand;
pub mod pathfinder;
pub mod repository;
pub mod shared;
pub mod simulator;
