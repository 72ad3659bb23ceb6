//! Stochastic rain model: a discrete-time Markov chain over rain-rate
//! bins.
//!
//! Successive draws are correlated by construction — the next rain state
//! is sampled from the transition row of the current one — so a sequence
//! of draws models the temporal evolution of rain at the station rather
//! than independent samples.

use ground_station::Station;
use nalgebra::{DMatrix, DVector};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;
use tracing::debug;

use crate::{PropagationModel, RainAttenuation, RainError, Result, SlantPath};

/// Native chain states are rain depth per minute; draws are reported
/// in mm/hr.
const PER_MINUTE_TO_MMHR: f64 = 60.0;

/// Row-sum tolerance for the stochastic-matrix check.
const ROW_SUM_TOLERANCE: f64 = 1e-9;

/// Samples the next state index from one transition row.
///
/// Weighted categorical draw over the row; the row is assumed
/// row-stochastic (validated at chain construction). Rounding in the
/// cumulative scan falls back to the last state.
pub fn next_state<'a, R: Rng>(row: impl IntoIterator<Item = &'a f64>, rng: &mut R) -> usize {
    let r: f64 = rng.random();
    let mut cumulative = 0.0;
    let mut last = 0;
    for (i, &p) in row.into_iter().enumerate() {
        cumulative += p;
        last = i;
        if r < cumulative {
            return i;
        }
    }
    last
}

/// Discrete-time Markov chain over `N` rain-rate bins.
///
/// Owns its current state and generator; every [`MarkovChain::draw`] is a
/// read-modify-write on both, so concurrent callers must serialize
/// access externally.
#[derive(Debug)]
pub struct MarkovChain {
    state: usize,
    transition: DMatrix<f64>,
    states: DVector<f64>,
    rng: StdRng,
}

impl MarkovChain {
    /// Builds a chain from a row-stochastic `N×N` transition matrix and
    /// `N` native (per-minute) rain-rate values, seeding the generator
    /// from the OS.
    pub fn new(transition: DMatrix<f64>, states: DVector<f64>) -> Result<Self> {
        Self::with_rng(transition, states, StdRng::from_os_rng())
    }

    /// Like [`MarkovChain::new`] with a caller-supplied generator, for
    /// deterministic runs.
    pub fn with_rng(transition: DMatrix<f64>, states: DVector<f64>, rng: StdRng) -> Result<Self> {
        let n = states.len();
        if n == 0 {
            return Err(RainError::EmptyChain);
        }
        if transition.nrows() != n || transition.ncols() != n {
            return Err(RainError::DimensionMismatch {
                rows: transition.nrows(),
                cols: transition.ncols(),
                states: n,
            });
        }
        for (row, sum) in transition
            .row_iter()
            .map(|r| r.iter().sum::<f64>())
            .enumerate()
        {
            if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(RainError::NonStochasticMatrix { row, sum });
            }
        }

        Ok(Self {
            state: 0,
            transition,
            states,
            rng,
        })
    }

    /// Current state index, always in `[0, N)`.
    pub fn state(&self) -> usize {
        self.state
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// Advances the chain one step and returns the drawn rain rate in
    /// mm/hr.
    pub fn draw(&mut self) -> f64 {
        let row = self.transition.row(self.state);
        self.state = next_state(row.iter(), &mut self.rng);
        let rain_rate_mmhr = self.states[self.state] * PER_MINUTE_TO_MMHR;
        debug!(state = self.state, rain_rate_mmhr, "markov rain draw");
        rain_rate_mmhr
    }
}

/// Rain model that sources its rain rate from a Markov chain.
pub struct MarkovRain {
    path: SlantPath,
    chain: MarkovChain,
}

impl MarkovRain {
    pub fn new(
        station: Arc<Station>,
        propagation: &dyn PropagationModel,
        chain: MarkovChain,
    ) -> Self {
        Self {
            path: SlantPath::new(station, propagation),
            chain,
        }
    }

    pub fn slant_path(&self) -> &SlantPath {
        &self.path
    }

    pub fn slant_path_mut(&mut self) -> &mut SlantPath {
        &mut self.path
    }

    pub fn chain(&self) -> &MarkovChain {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut MarkovChain {
        &mut self.chain
    }

    /// Saunders attenuation at one elevation; `None` advances the chain
    /// once and uses the drawn rate for this computation.
    pub fn attenuation_saunders(
        &mut self,
        elevation_deg: f64,
        rain_rate_mmhr: Option<f64>,
    ) -> Result<f64> {
        let rate = rain_rate_mmhr.unwrap_or_else(|| self.chain.draw());
        self.path.attenuation_saunders(elevation_deg, rate)
    }

    /// Expected attenuation over the station's elevation distribution.
    ///
    /// `None` performs exactly one draw and applies that single rate
    /// across every elevation bin: one rain condition holds station-wide
    /// at a given instant.
    pub fn equivalent_attenuation(&mut self, rain_rate_mmhr: Option<f64>) -> Result<f64> {
        let rate = rain_rate_mmhr.unwrap_or_else(|| self.chain.draw());
        self.path.equivalent_attenuation(rate)
    }
}

impl RainAttenuation for MarkovRain {
    fn attenuation_at(&mut self, elevation_deg: f64, rain_rate_mmhr: Option<f64>) -> Result<f64> {
        self.attenuation_saunders(elevation_deg, rain_rate_mmhr)
    }

    fn equivalent_attenuation(&mut self, rain_rate_mmhr: Option<f64>) -> Result<f64> {
        MarkovRain::equivalent_attenuation(self, rain_rate_mmhr)
    }
}
