//! Seam to the standardized ITU-R propagation models.
//!
//! The reference library (P.839 rain height, P.837 rainfall rate, P.618
//! rain attenuation) is consumed as a set of deterministic pure functions
//! behind [`PropagationModel`]; [`FixedPropagation`] is the offline
//! stand-in for tests and air-gapped runs.

/// Black-box view of the standardized propagation models.
///
/// All three lookups are deterministic functions of their inputs; no
/// retry or caching policy applies at this boundary.
pub trait PropagationModel: Send + Sync {
    /// Mean annual rain height above sea level (ITU-R P.839), in km.
    fn rain_height_km(&self, latitude_deg: f64, longitude_deg: f64) -> f64;

    /// Rainfall rate exceeded for probability `p` of an average year
    /// (ITU-R P.837), in mm/hr.
    fn rainfall_rate_mmhr(&self, latitude_deg: f64, longitude_deg: f64, p: f64) -> f64;

    /// Slant-path rain attenuation exceeded for probability `p`
    /// (ITU-R P.618), in dB.
    #[allow(clippy::too_many_arguments)]
    fn rain_attenuation_db(
        &self,
        latitude_deg: f64,
        longitude_deg: f64,
        frequency_ghz: f64,
        elevation_deg: f64,
        station_altitude_km: f64,
        p: f64,
    ) -> f64;
}

/// Offline propagation stand-in with a fixed rain height and a reference
/// exceedance rate at p = 0.01%.
///
/// The rate follows the usual inverse power scaling in `p` and the
/// attenuation reuses the Saunders-shaped slant path, which is close
/// enough in shape to the standardized curves for shakeout runs.
#[derive(Debug, Clone)]
pub struct FixedPropagation {
    pub rain_height_km: f64,
    /// Rainfall rate exceeded at p = 0.01% of an average year, mm/hr.
    pub reference_rate_mmhr: f64,
}

/// Reference exceedance probability the stand-in's rate is anchored at.
const REFERENCE_P: f64 = 0.01;

impl Default for FixedPropagation {
    fn default() -> Self {
        // Mid-latitude values: ~3 km rain height, ~30 mm/hr at 0.01%
        Self {
            rain_height_km: 3.0,
            reference_rate_mmhr: 30.0,
        }
    }
}

impl PropagationModel for FixedPropagation {
    fn rain_height_km(&self, _latitude_deg: f64, _longitude_deg: f64) -> f64 {
        self.rain_height_km
    }

    fn rainfall_rate_mmhr(&self, _latitude_deg: f64, _longitude_deg: f64, p: f64) -> f64 {
        self.reference_rate_mmhr * (REFERENCE_P / p).powf(0.6)
    }

    fn rain_attenuation_db(
        &self,
        _latitude_deg: f64,
        _longitude_deg: f64,
        frequency_ghz: f64,
        elevation_deg: f64,
        station_altitude_km: f64,
        p: f64,
    ) -> f64 {
        let rate = self.rainfall_rate_mmhr(0.0, 0.0, p);
        // Frequency-scaled specific attenuation over the rain slant path
        let specific_db_per_km = 0.0101 * (frequency_ghz / 20.0).powi(2) * rate.powf(1.1);
        let path_km =
            (self.rain_height_km - station_altitude_km) / elevation_deg.to_radians().sin();
        specific_db_per_km * path_km.max(0.0)
    }
}
