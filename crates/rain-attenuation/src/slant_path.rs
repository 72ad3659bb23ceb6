//! Shared slant-path geometry and the Saunders power-law attenuation.
//!
//! Both rain-model variants reduce to the same two ingredients: the
//! length of the signal path through the rain layer at a given elevation,
//! and an empirical specific attenuation `a·R^b` (dB/km) integrated over
//! that path. The expectation over a station's elevation distribution
//! lives here too, so the variants only differ in where the rain rate
//! comes from.

use ground_station::Station;
use std::sync::Arc;

use crate::{PropagationModel, RainError, Result};

/// Default Saunders power-law constant `a` (Ka-band).
pub const DEFAULT_SAUNDERS_A: f64 = 0.187;
/// Default Saunders power-law constant `b` (Ka-band).
pub const DEFAULT_SAUNDERS_B: f64 = 1.099;

/// Slant-path geometry for one station, with the rain height queried
/// once from the propagation model at construction.
#[derive(Debug, Clone)]
pub struct SlantPath {
    station: Arc<Station>,
    rain_height_km: f64,
    constants: Option<(f64, f64)>,
}

impl SlantPath {
    /// Builds the geometry with the default Ka-band power-law constants.
    pub fn new(station: Arc<Station>, propagation: &dyn PropagationModel) -> Self {
        let rain_height_km =
            propagation.rain_height_km(station.latitude_deg(), station.longitude_deg());
        Self {
            station,
            rain_height_km,
            constants: Some((DEFAULT_SAUNDERS_A, DEFAULT_SAUNDERS_B)),
        }
    }

    /// Replaces the power-law constants, or clears them with `None`.
    pub fn set_constants(&mut self, constants: Option<(f64, f64)>) {
        self.constants = constants;
    }

    pub fn constants(&self) -> Option<(f64, f64)> {
        self.constants
    }

    pub fn station(&self) -> &Arc<Station> {
        &self.station
    }

    pub fn rain_height_km(&self) -> f64 {
        self.rain_height_km
    }

    /// Path length through the rain layer at `elevation_deg`, in km.
    ///
    /// Unbounded as elevation approaches the horizon; elevations at or
    /// below zero are rejected.
    pub fn rain_path_length_km(&self, elevation_deg: f64) -> Result<f64> {
        if elevation_deg <= 0.0 {
            return Err(RainError::InvalidElevation(elevation_deg));
        }
        let sin_el = elevation_deg.to_radians().sin();
        Ok((self.rain_height_km - self.station.altitude_km()) / sin_el)
    }

    /// Saunders attenuation in dB: `a·R^b` dB/km over the rain path.
    pub fn attenuation_saunders(&self, elevation_deg: f64, rain_rate_mmhr: f64) -> Result<f64> {
        let (a, b) = self.constants.ok_or(RainError::MissingConstants)?;
        let path_km = self.rain_path_length_km(elevation_deg)?;
        Ok(a * rain_rate_mmhr.powf(b) * path_km)
    }

    /// Expectation of the Saunders attenuation over the station's
    /// elevation distribution, for one station-wide rain rate.
    pub fn equivalent_attenuation(&self, rain_rate_mmhr: f64) -> Result<f64> {
        self.expect_over_elevations(|el| self.attenuation_saunders(el, rain_rate_mmhr))
    }

    /// Probability-weighted expectation of `f(elevation)` over the
    /// station's elevation distribution.
    pub fn expect_over_elevations<F>(&self, f: F) -> Result<f64>
    where
        F: Fn(f64) -> Result<f64>,
    {
        let distribution = self
            .station
            .elevation_distribution()
            .ok_or(RainError::MissingElevationDistribution)?;

        let mut total = 0.0;
        for (elevation_deg, probability) in distribution.iter() {
            total += f(elevation_deg)? * probability;
        }
        Ok(total)
    }
}
