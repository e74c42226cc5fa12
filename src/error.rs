//! Error taxonomy for cell simulation runs
//!
//! Configuration problems and numerical divergence are the only conditions
//! that stop a run. Convergence shortfalls and domain clamping are reported
//! through `tracing` and never surface here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Unknown material tag: {0}")]
    UnknownMaterial(String),

    #[error("Material {material} has no {property} data")]
    MissingProperty {
        material: &'static str,
        property: &'static str,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed schedule line {line}: {message}")]
    Schedule { line: usize, message: String },

    #[error("Unsupported solver method: {0}")]
    UnsupportedSolver(String),

    #[error("Numerical divergence at t = {time:.3} s: {message}")]
    Diverged { time: f64, message: String },

    #[error("Linear algebra error: {0}")]
    LinAlg(String),

    #[error("Step limit of {0} time steps exceeded")]
    StepLimitExceeded(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type SimResult<T> = Result<T, SimError>;
