//! Deterministic rain model driven by ITU exceedance statistics.
//!
//! Parameterized by an exceedance probability `p`: the model caches the
//! rainfall rate exceeded for `p` of an average year and feeds it through
//! the Saunders power law, or defers entirely to the standardized P.618
//! attenuation value.

use std::str::FromStr;
use std::sync::Arc;

use ground_station::Station;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{PropagationModel, RainAttenuation, RainError, Result, SlantPath};

/// Which attenuation estimate to average in
/// [`ItuRain::equivalent_attenuation_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttenuationMode {
    /// Saunders power law with the cached (or supplied) rain rate.
    Saunders,
    /// Standardized P.618 attenuation at the model's exceedance
    /// probability; ignores the power-law constants and any supplied rate.
    Standardized,
}

impl FromStr for AttenuationMode {
    type Err = RainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Saunders" | "saunders" => Ok(Self::Saunders),
            "Standardized" | "standardized" => Ok(Self::Standardized),
            other => Err(RainError::InvalidMode(other.to_string())),
        }
    }
}

/// Rain model for a fixed exceedance probability.
pub struct ItuRain {
    path: SlantPath,
    propagation: Box<dyn PropagationModel>,
    p: f64,
    rain_rate_mmhr: f64,
}

impl ItuRain {
    /// Builds the model, querying rain height once and caching the
    /// exceedance rain rate for `p`.
    pub fn new(
        station: Arc<Station>,
        propagation: Box<dyn PropagationModel>,
        p: f64,
    ) -> Result<Self> {
        validate_probability(p)?;
        let path = SlantPath::new(station, propagation.as_ref());
        let rain_rate_mmhr = propagation.rainfall_rate_mmhr(
            path.station().latitude_deg(),
            path.station().longitude_deg(),
            p,
        );
        Ok(Self {
            path,
            propagation,
            p,
            rain_rate_mmhr,
        })
    }

    pub fn probability(&self) -> f64 {
        self.p
    }

    /// Cached rainfall rate for the current exceedance probability.
    pub fn rain_rate_mmhr(&self) -> f64 {
        self.rain_rate_mmhr
    }

    pub fn slant_path(&self) -> &SlantPath {
        &self.path
    }

    pub fn slant_path_mut(&mut self) -> &mut SlantPath {
        &mut self.path
    }

    /// Changes the exceedance probability, recomputing the cached rain
    /// rate in the same step. Returns the new rate.
    pub fn set_probability(&mut self, p: f64) -> Result<f64> {
        validate_probability(p)?;
        self.p = p;
        self.rain_rate_mmhr = self.propagation.rainfall_rate_mmhr(
            self.path.station().latitude_deg(),
            self.path.station().longitude_deg(),
            p,
        );
        debug!(p, rain_rate_mmhr = self.rain_rate_mmhr, "exceedance rate refreshed");
        Ok(self.rain_rate_mmhr)
    }

    /// Saunders attenuation at one elevation; `None` uses the cached
    /// exceedance rate.
    pub fn attenuation_saunders(
        &self,
        elevation_deg: f64,
        rain_rate_mmhr: Option<f64>,
    ) -> Result<f64> {
        let rate = rain_rate_mmhr.unwrap_or(self.rain_rate_mmhr);
        self.path.attenuation_saunders(elevation_deg, rate)
    }

    /// Standardized P.618 attenuation at one elevation. Queried per call;
    /// `p` defaults to the model's exceedance probability. The external
    /// model is parameterized by probability only, so there is no rain
    /// rate override on this path.
    pub fn attenuation_standardized(&self, elevation_deg: f64, p: Option<f64>) -> Result<f64> {
        if elevation_deg <= 0.0 {
            return Err(RainError::InvalidElevation(elevation_deg));
        }
        let p = match p {
            Some(p) => {
                validate_probability(p)?;
                p
            }
            None => self.p,
        };
        let station = self.path.station();
        Ok(self.propagation.rain_attenuation_db(
            station.latitude_deg(),
            station.longitude_deg(),
            station.frequency_ghz(),
            elevation_deg,
            station.altitude_km(),
            p,
        ))
    }

    /// Expected attenuation over the station's elevation distribution.
    ///
    /// `Standardized` mode averages the P.618 value at the current
    /// exceedance probability and ignores `rain_rate_mmhr`.
    pub fn equivalent_attenuation_with(
        &self,
        mode: AttenuationMode,
        rain_rate_mmhr: Option<f64>,
    ) -> Result<f64> {
        match mode {
            AttenuationMode::Saunders => {
                let rate = rain_rate_mmhr.unwrap_or(self.rain_rate_mmhr);
                self.path.equivalent_attenuation(rate)
            }
            AttenuationMode::Standardized => self
                .path
                .expect_over_elevations(|el| self.attenuation_standardized(el, None)),
        }
    }
}

impl RainAttenuation for ItuRain {
    fn attenuation_at(&mut self, elevation_deg: f64, rain_rate_mmhr: Option<f64>) -> Result<f64> {
        self.attenuation_saunders(elevation_deg, rain_rate_mmhr)
    }

    fn equivalent_attenuation(&mut self, rain_rate_mmhr: Option<f64>) -> Result<f64> {
        self.equivalent_attenuation_with(AttenuationMode::Saunders, rain_rate_mmhr)
    }
}

fn validate_probability(p: f64) -> Result<()> {
    if p > 0.0 && p < 1.0 {
        Ok(())
    } else {
        Err(RainError::InvalidProbability(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixedPropagation;
    use ground_station::ElevationDistribution;

    fn test_model(p: f64) -> ItuRain {
        let mut station =
            Station::new(40.45, -4.37, 0.767, 32.0, 55.8, 35.0, 0.65, 220.0).unwrap();
        station.set_elevation_distribution(
            ElevationDistribution::from_bins(vec![(10.0, 0.5), (50.0, 0.5)]).unwrap(),
        );
        ItuRain::new(
            Arc::new(station),
            Box::new(FixedPropagation::default()),
            p,
        )
        .unwrap()
    }

    #[test]
    fn construction_caches_exceedance_rate() {
        let model = test_model(0.01);
        assert!((model.rain_rate_mmhr() - 30.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_probability_out_of_range() {
        let station = Arc::new(
            Station::new(40.45, -4.37, 0.767, 32.0, 55.8, 35.0, 0.65, 220.0).unwrap(),
        );
        for p in [0.0, 1.0, -0.1, 2.0] {
            assert!(matches!(
                ItuRain::new(station.clone(), Box::new(FixedPropagation::default()), p),
                Err(RainError::InvalidProbability(_))
            ));
        }
    }

    #[test]
    fn set_probability_refreshes_cached_rate() {
        let mut model = test_model(0.01);
        let before = model.rain_rate_mmhr();
        let after = model.set_probability(0.001).unwrap();
        assert!(after > before);
        assert!((model.rain_rate_mmhr() - after).abs() < 1e-12);

        // Default-rate calls must now use the refreshed rate
        let att = model.attenuation_saunders(30.0, None).unwrap();
        let expected = model.slant_path().attenuation_saunders(30.0, after).unwrap();
        assert!((att - expected).abs() < 1e-12);

        let eqv = model
            .equivalent_attenuation_with(AttenuationMode::Saunders, None)
            .unwrap();
        let expected_eqv = model.slant_path().equivalent_attenuation(after).unwrap();
        assert!((eqv - expected_eqv).abs() < 1e-12);
    }

    #[test]
    fn set_probability_rejects_invalid_and_keeps_state() {
        let mut model = test_model(0.01);
        let before = model.rain_rate_mmhr();
        assert!(model.set_probability(1.5).is_err());
        assert!((model.probability() - 0.01).abs() < 1e-12);
        assert!((model.rain_rate_mmhr() - before).abs() < 1e-12);
    }

    #[test]
    fn explicit_rate_overrides_cache() {
        let model = test_model(0.01);
        let att = model.attenuation_saunders(30.0, Some(10.0)).unwrap();
        let expected = model.slant_path().attenuation_saunders(30.0, 10.0).unwrap();
        assert!((att - expected).abs() < 1e-12);
    }

    #[test]
    fn standardized_expectation_matches_weighted_average() {
        let model = test_model(0.01);
        let expected = 0.5 * model.attenuation_standardized(10.0, None).unwrap()
            + 0.5 * model.attenuation_standardized(50.0, None).unwrap();
        let eqv = model
            .equivalent_attenuation_with(AttenuationMode::Standardized, None)
            .unwrap();
        assert!((eqv - expected).abs() < 1e-12);
    }

    #[test]
    fn standardized_survives_cleared_constants() {
        let mut model = test_model(0.01);
        model.slant_path_mut().set_constants(None);
        assert!(model
            .equivalent_attenuation_with(AttenuationMode::Standardized, None)
            .is_ok());
        assert!(matches!(
            model.equivalent_attenuation_with(AttenuationMode::Saunders, None),
            Err(RainError::MissingConstants)
        ));
    }

    #[test]
    fn mode_parses_from_strings() {
        assert_eq!(
            "Saunders".parse::<AttenuationMode>().unwrap(),
            AttenuationMode::Saunders
        );
        assert_eq!(
            "standardized".parse::<AttenuationMode>().unwrap(),
            AttenuationMode::Standardized
        );
        assert!(matches!(
            "Fresnel".parse::<AttenuationMode>(),
            Err(RainError::InvalidMode(_))
        ));
    }
}
