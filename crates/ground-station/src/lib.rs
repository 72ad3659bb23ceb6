//! Ground Station Library
//!
//! Static characterization of deep-space ground antennas: parabolic
//! aperture gain, G/T-derived system temperature, and the empirical
//! elevation-angle distribution a station sees over its tracked passes.
//!
//! Gain and system temperature are frozen at construction; the elevation
//! distribution is attached afterwards from observed pass data.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

/// Speed of light in m/s, as used throughout the link equations.
pub const SPEED_OF_LIGHT: f64 = 3.0e8;

/// Brightness temperature assumed in the G/T calibration of the ESA
/// deep-space antennas, in Kelvin.
pub const ASSUMED_BRIGHTNESS_TEMP_K: f64 = 220.0;

/// Aperture efficiency of the ESA 35 m deep-space antennas.
const ESA_DSA_EFFICIENCY: f64 = 0.65;

#[derive(Error, Debug)]
pub enum StationError {
    #[error("antenna efficiency must be in (0, 1], got {0}")]
    InvalidEfficiency(f64),
    #[error("carrier frequency must be positive, got {0} GHz")]
    InvalidFrequency(f64),
    #[error("dish diameter must be positive, got {0} m")]
    InvalidDiameter(f64),
    #[error("elevation sample set is empty")]
    InvalidSamples,
    #[error("histogram resolution must be positive, got {0} deg")]
    InvalidResolution(f64),
    #[error("elevation distribution weights sum to {0}, expected 1")]
    NonNormalizedDistribution(f64),
}

pub type Result<T> = std::result::Result<T, StationError>;

/// Normalized histogram over observed elevation angles.
///
/// Stored as ordered `(bin_left_edge_deg, probability)` pairs whose
/// probabilities sum to 1. Built either from raw pass samples
/// ([`ElevationDistribution::from_samples`]) or directly from
/// pre-binned pairs ([`ElevationDistribution::from_bins`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevationDistribution {
    bins: Vec<(f64, f64)>,
}

impl ElevationDistribution {
    /// Builds a distribution from pre-binned `(elevation_deg, probability)`
    /// pairs. The probabilities must sum to 1 within 1e-9.
    pub fn from_bins(bins: Vec<(f64, f64)>) -> Result<Self> {
        if bins.is_empty() {
            return Err(StationError::InvalidSamples);
        }
        let total: f64 = bins.iter().map(|(_, p)| p).sum();
        if (total - 1.0).abs() > 1e-9 {
            return Err(StationError::NonNormalizedDistribution(total));
        }
        Ok(Self { bins })
    }

    /// Histograms raw elevation samples at `resolution_deg` bin width.
    ///
    /// Bins are left-edged starting at the sample minimum; each sample
    /// contributes `1/n`, so the weights sum to 1 by construction.
    pub fn from_samples(samples: &[f64], resolution_deg: f64) -> Result<Self> {
        if samples.is_empty() {
            return Err(StationError::InvalidSamples);
        }
        if resolution_deg <= 0.0 {
            return Err(StationError::InvalidResolution(resolution_deg));
        }

        let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let bin_count = (((max - min) / resolution_deg).ceil() as usize).max(1);

        let weight = 1.0 / samples.len() as f64;
        let mut weights = vec![0.0; bin_count];
        for &el in samples {
            let idx = (((el - min) / resolution_deg) as usize).min(bin_count - 1);
            weights[idx] += weight;
        }

        let bins = weights
            .into_iter()
            .enumerate()
            .filter(|(_, p)| *p > 0.0)
            .map(|(i, p)| (min + i as f64 * resolution_deg, p))
            .collect();

        Ok(Self { bins })
    }

    /// Iterates `(elevation_deg, probability)` pairs in ascending
    /// elevation order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.bins.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

/// A ground station with a parabolic dish and a calibrated G/T figure.
///
/// Derived quantities (gain, system temperature) are computed once in
/// [`Station::new`] and never recomputed; [`Station::effective_gt`] is the
/// explicit re-derivation for an arbitrary total antenna temperature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    latitude_deg: f64,
    longitude_deg: f64,
    altitude_km: f64,
    frequency_ghz: f64,
    gt_dbk: f64,
    diameter_m: f64,
    efficiency: f64,
    tb_assumed_k: f64,
    gain_dbi: f64,
    system_temp_k: f64,
    elevation_distribution: Option<ElevationDistribution>,
}

impl Station {
    /// Creates a station and freezes its derived gain and system
    /// temperature.
    ///
    /// `altitude_km` is height above mean sea level, in kilometres to match
    /// the ITU rain-height unit. `gt_dbk` is the measured G/T in dB/K;
    /// `tb_assumed_k` is the brightness temperature assumed in that
    /// measurement.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        latitude_deg: f64,
        longitude_deg: f64,
        altitude_km: f64,
        frequency_ghz: f64,
        gt_dbk: f64,
        diameter_m: f64,
        efficiency: f64,
        tb_assumed_k: f64,
    ) -> Result<Self> {
        if !(efficiency > 0.0 && efficiency <= 1.0) {
            return Err(StationError::InvalidEfficiency(efficiency));
        }
        if frequency_ghz <= 0.0 {
            return Err(StationError::InvalidFrequency(frequency_ghz));
        }
        if diameter_m <= 0.0 {
            return Err(StationError::InvalidDiameter(diameter_m));
        }

        let gain_dbi = estimate_gain_dbi(frequency_ghz, diameter_m, efficiency);
        let system_temp_k = estimate_system_temp_k(gain_dbi, gt_dbk, tb_assumed_k);

        Ok(Self {
            latitude_deg,
            longitude_deg,
            altitude_km,
            frequency_ghz,
            gt_dbk,
            diameter_m,
            efficiency,
            tb_assumed_k,
            gain_dbi,
            system_temp_k,
            elevation_distribution: None,
        })
    }

    /// ESA Cebreros (DSA-2), 35 m at Ka-band.
    pub fn cebreros() -> Self {
        Self::new(
            40.453103969741,
            -4.367822163003614,
            0.727 + 0.04,
            32.0,
            55.8,
            35.0,
            ESA_DSA_EFFICIENCY,
            ASSUMED_BRIGHTNESS_TEMP_K,
        )
        .expect("preset station parameters are valid")
    }

    /// ESA Malargüe (DSA-3), 35 m at Ka-band.
    pub fn malargue() -> Self {
        Self::new(
            -33.02128801912456,
            -69.04629959947883,
            0.787 + 0.04,
            32.0,
            55.8,
            35.0,
            ESA_DSA_EFFICIENCY,
            ASSUMED_BRIGHTNESS_TEMP_K,
        )
        .expect("preset station parameters are valid")
    }

    /// ESA New Norcia (DSA-1), 35 m at Ka-band.
    pub fn new_norcia() -> Self {
        Self::new(
            -31.016434952605326,
            116.19856261578303,
            0.221 + 0.04,
            32.0,
            55.8,
            35.0,
            ESA_DSA_EFFICIENCY,
            ASSUMED_BRIGHTNESS_TEMP_K,
        )
        .expect("preset station parameters are valid")
    }

    pub fn latitude_deg(&self) -> f64 {
        self.latitude_deg
    }

    pub fn longitude_deg(&self) -> f64 {
        self.longitude_deg
    }

    pub fn altitude_km(&self) -> f64 {
        self.altitude_km
    }

    pub fn frequency_ghz(&self) -> f64 {
        self.frequency_ghz
    }

    pub fn gt_dbk(&self) -> f64 {
        self.gt_dbk
    }

    pub fn diameter_m(&self) -> f64 {
        self.diameter_m
    }

    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    pub fn tb_assumed_k(&self) -> f64 {
        self.tb_assumed_k
    }

    /// Parabolic aperture gain in dBi, frozen at construction.
    pub fn gain_dbi(&self) -> f64 {
        self.gain_dbi
    }

    /// G/T-derived system temperature in Kelvin, frozen at construction.
    pub fn system_temp_k(&self) -> f64 {
        self.system_temp_k
    }

    /// Operative G/T in dB/K for an actual total antenna temperature.
    ///
    /// `effective_gt(tb_assumed_k)` recovers the calibrated G/T exactly.
    pub fn effective_gt(&self, antenna_temp_k: f64) -> f64 {
        let gain_lin = 10f64.powf(self.gain_dbi / 10.0);
        10.0 * (gain_lin / (antenna_temp_k + self.system_temp_k)).log10()
    }

    /// Histograms observed pass elevations and stores the result.
    pub fn build_elevation_distribution(
        &mut self,
        samples: &[f64],
        resolution_deg: f64,
    ) -> Result<()> {
        self.elevation_distribution =
            Some(ElevationDistribution::from_samples(samples, resolution_deg)?);
        Ok(())
    }

    /// Attaches a pre-built elevation distribution.
    pub fn set_elevation_distribution(&mut self, distribution: ElevationDistribution) {
        self.elevation_distribution = Some(distribution);
    }

    pub fn elevation_distribution(&self) -> Option<&ElevationDistribution> {
        self.elevation_distribution.as_ref()
    }
}

/// Peak gain of a parabolic reflector: `10·log10(η·(π·D/λ)²)`.
fn estimate_gain_dbi(frequency_ghz: f64, diameter_m: f64, efficiency: f64) -> f64 {
    let wavelength_m = SPEED_OF_LIGHT / (frequency_ghz * 1e9);
    let gain_lin = efficiency * (PI * diameter_m / wavelength_m).powi(2);
    10.0 * gain_lin.log10()
}

/// System temperature implied by a G/T measurement: linear gain over
/// linear G/T, minus the brightness temperature assumed in the
/// calibration.
fn estimate_system_temp_k(gain_dbi: f64, gt_dbk: f64, tb_assumed_k: f64) -> f64 {
    let gain_lin = 10f64.powf(gain_dbi / 10.0);
    let gt_lin = 10f64.powf(gt_dbk / 10.0);
    gain_lin / gt_lin - tb_assumed_k
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_station() -> Station {
        Station::new(40.45, -4.37, 0.767, 32.0, 55.8, 35.0, 0.65, 220.0).unwrap()
    }

    #[test]
    fn gain_matches_aperture_formula() {
        let station = test_station();
        let wavelength = SPEED_OF_LIGHT / 32.0e9;
        let expected = 10.0 * (0.65 * (PI * 35.0 / wavelength).powi(2)).log10();
        assert!((station.gain_dbi() - expected).abs() < 1e-12);
        // 35 m dish at 32 GHz lands near 79.5 dBi
        assert!((station.gain_dbi() - 79.5).abs() < 0.1);
    }

    #[test]
    fn system_temperature_is_positive() {
        let station = test_station();
        assert!(station.system_temp_k() > 0.0);
    }

    #[test]
    fn effective_gt_at_assumed_brightness_recovers_gt() {
        let station = test_station();
        assert!((station.effective_gt(220.0) - 55.8).abs() < 1e-9);
    }

    #[test]
    fn effective_gt_zero_recovers_gt_without_brightness_correction() {
        let station = Station::new(0.0, 0.0, 0.0, 32.0, 55.8, 35.0, 0.65, 0.0).unwrap();
        assert!((station.effective_gt(0.0) - 55.8).abs() < 1e-9);
    }

    #[test]
    fn rejects_invalid_efficiency() {
        assert!(matches!(
            Station::new(0.0, 0.0, 0.0, 32.0, 55.8, 35.0, 0.0, 220.0),
            Err(StationError::InvalidEfficiency(_))
        ));
        assert!(matches!(
            Station::new(0.0, 0.0, 0.0, 32.0, 55.8, 35.0, 1.5, 220.0),
            Err(StationError::InvalidEfficiency(_))
        ));
    }

    #[test]
    fn rejects_invalid_geometry() {
        assert!(matches!(
            Station::new(0.0, 0.0, 0.0, 0.0, 55.8, 35.0, 0.65, 220.0),
            Err(StationError::InvalidFrequency(_))
        ));
        assert!(matches!(
            Station::new(0.0, 0.0, 0.0, 32.0, 55.8, -1.0, 0.65, 220.0),
            Err(StationError::InvalidDiameter(_))
        ));
    }

    #[test]
    fn histogram_weights_sum_to_one() {
        let samples: Vec<f64> = (0..500).map(|i| 5.0 + (i as f64) * 0.17 % 85.0).collect();
        let dist = ElevationDistribution::from_samples(&samples, 0.5).unwrap();
        let total: f64 = dist.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn histogram_rejects_bad_inputs() {
        assert!(matches!(
            ElevationDistribution::from_samples(&[], 0.1),
            Err(StationError::InvalidSamples)
        ));
        assert!(matches!(
            ElevationDistribution::from_samples(&[10.0, 20.0], 0.0),
            Err(StationError::InvalidResolution(_))
        ));
    }

    #[test]
    fn single_valued_samples_collapse_to_one_bin() {
        let dist = ElevationDistribution::from_samples(&[30.0, 30.0, 30.0], 0.1).unwrap();
        assert_eq!(dist.len(), 1);
        let (el, p) = dist.iter().next().unwrap();
        assert!((el - 30.0).abs() < 1e-12);
        assert!((p - 1.0).abs() < 1e-12);
    }

    #[test]
    fn from_bins_validates_normalization() {
        assert!(ElevationDistribution::from_bins(vec![(10.0, 0.5), (50.0, 0.5)]).is_ok());
        assert!(matches!(
            ElevationDistribution::from_bins(vec![(10.0, 0.5), (50.0, 0.4)]),
            Err(StationError::NonNormalizedDistribution(_))
        ));
    }

    #[test]
    fn presets_build() {
        for station in [Station::cebreros(), Station::malargue(), Station::new_norcia()] {
            assert!(station.gain_dbi() > 70.0);
            assert!(station.system_temp_k() > 0.0);
            assert!(station.elevation_distribution().is_none());
        }
    }

    proptest! {
        // effective_gt(tb_assumed) must recover the calibrated G/T for any
        // physically plausible configuration.
        #[test]
        fn effective_gt_round_trip(
            gt_dbk in 30.0..70.0f64,
            frequency_ghz in 1.0..50.0f64,
            diameter_m in 1.0..70.0f64,
            efficiency in 0.3..1.0f64,
        ) {
            let station = Station::new(
                0.0, 0.0, 0.0, frequency_ghz, gt_dbk, diameter_m, efficiency, 0.0,
            ).unwrap();
            prop_assert!((station.effective_gt(0.0) - gt_dbk).abs() < 1e-9);
        }
    }
}
