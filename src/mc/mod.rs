pub mod config;
pub mod estimator;
pub mod payoffs;

pub use config::{ExecutionMode, SamplingConfig};
