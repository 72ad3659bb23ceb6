//! Rain Attenuation Library
//!
//! Slant-path rain attenuation between a ground station and a spacecraft,
//! in two flavours: a deterministic model driven by ITU exceedance
//! statistics ([`ItuRain`]) and a stochastic discrete-time Markov chain
//! over rain-rate bins ([`MarkovRain`]). Both specialize a shared
//! slant-path geometry and the empirical Saunders power law
//! ([`SlantPath`]), and both implement the [`RainAttenuation`] capability
//! the link-budget composer is generic over.

use thiserror::Error;

pub mod itu;
pub mod markov;
pub mod propagation;
pub mod slant_path;

pub use itu::{AttenuationMode, ItuRain};
pub use markov::{MarkovChain, MarkovRain};
pub use propagation::{FixedPropagation, PropagationModel};
pub use slant_path::{SlantPath, DEFAULT_SAUNDERS_A, DEFAULT_SAUNDERS_B};

#[derive(Error, Debug)]
pub enum RainError {
    #[error("station has no elevation distribution")]
    MissingElevationDistribution,
    #[error("Saunders power-law constants a/b are not set")]
    MissingConstants,
    #[error("elevation must be positive, got {0} deg")]
    InvalidElevation(f64),
    #[error("exceedance probability must be in (0, 1), got {0}")]
    InvalidProbability(f64),
    #[error("unknown attenuation mode: {0}")]
    InvalidMode(String),
    #[error("transition matrix row {row} sums to {sum}, expected 1")]
    NonStochasticMatrix { row: usize, sum: f64 },
    #[error("transition matrix is {rows}x{cols} for {states} states")]
    DimensionMismatch {
        rows: usize,
        cols: usize,
        states: usize,
    },
    #[error("Markov chain has no states")]
    EmptyChain,
}

pub type Result<T> = std::result::Result<T, RainError>;

/// Capability set shared by the rain-model variants.
///
/// `&mut self` because the Markov variant advances its chain (and RNG)
/// when no explicit rain rate is supplied; callers sharing one instance
/// across threads must serialize access externally.
pub trait RainAttenuation {
    /// Attenuation in dB at a single elevation. `None` lets the model
    /// pick its own rate: the cached exceedance rate for ITU, one chain
    /// draw for Markov.
    fn attenuation_at(&mut self, elevation_deg: f64, rain_rate_mmhr: Option<f64>) -> Result<f64>;

    /// Expected attenuation in dB over the station's elevation
    /// distribution. The same `None` contract as [`Self::attenuation_at`];
    /// the Markov variant draws once and applies that single rate across
    /// every elevation bin.
    fn equivalent_attenuation(&mut self, rain_rate_mmhr: Option<f64>) -> Result<f64>;
}
