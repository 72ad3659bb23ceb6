//! Link Budget Library
//!
//! Composes station characteristics, slant-path rain attenuation, and
//! free-space geometry into an achievable SNR, then maps SNR to a
//! transmittable rate: the Shannon bound as a sanity ceiling and the
//! DVB-S2 modcod catalogue for the rate the coding actually supports.
//!
//! The composer is generic over the rain model, so the same budget runs
//! against the deterministic ITU exceedance model or the stochastic
//! Markov chain.

use ground_station::{Station, SPEED_OF_LIGHT};
use rain_attenuation::{RainAttenuation, RainError};
use std::f64::consts::PI;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub mod dvbs2;

pub use dvbs2::{Dvbs2, Modcod, Modulation, MODCODS};

/// Boltzmann constant in J/K.
pub const BOLTZMANN_J_PER_K: f64 = 1.380649e-23;

/// Physical temperature of the rain medium assumed in the sky-noise
/// model, in Kelvin.
pub const RAIN_PHYSICAL_TEMP_K: f64 = 290.0;

/// Default link margin in dB.
pub const DEFAULT_LINK_MARGIN_DB: f64 = 3.0;

/// Default brightness temperature seen by the antenna in clear sky, K.
pub const DEFAULT_TB_K: f64 = 220.0;

#[derive(Error, Debug)]
pub enum LinkBudgetError {
    #[error("ES/N0 of {esno_db} dB is below the lowest modcod threshold of {floor_db} dB")]
    BelowCodingThreshold { esno_db: f64, floor_db: f64 },
    #[error(transparent)]
    Rain(#[from] RainError),
}

pub type Result<T> = std::result::Result<T, LinkBudgetError>;

/// Link budget for one ground station and one rain model.
///
/// Everything but the link margin is fixed at construction; the margin
/// is the one knob operators move between runs of the same scenario.
pub struct LinkBudget<R: RainAttenuation> {
    station: Arc<Station>,
    rain: R,
    bandwidth_hz: f64,
    link_constant_db: f64,
    link_margin_db: f64,
    tb_k: f64,
    dvb: Dvbs2,
}

impl<R: RainAttenuation> LinkBudget<R> {
    /// Builds a budget over `bandwidth_hz`. `constants_db` are the fixed
    /// dB gains and losses of the link (transmit EIRP, gaseous and
    /// pointing losses, ...), summed once into the link constant.
    pub fn new(station: Arc<Station>, rain: R, bandwidth_hz: f64, constants_db: &[f64]) -> Self {
        Self {
            station,
            rain,
            bandwidth_hz,
            link_constant_db: constants_db.iter().sum(),
            link_margin_db: DEFAULT_LINK_MARGIN_DB,
            tb_k: DEFAULT_TB_K,
            dvb: Dvbs2::new(bandwidth_hz),
        }
    }

    pub fn with_link_margin(mut self, margin_db: f64) -> Self {
        self.link_margin_db = margin_db;
        self
    }

    pub fn with_tb(mut self, tb_k: f64) -> Self {
        self.tb_k = tb_k;
        self
    }

    pub fn station(&self) -> &Arc<Station> {
        &self.station
    }

    pub fn rain(&self) -> &R {
        &self.rain
    }

    pub fn rain_mut(&mut self) -> &mut R {
        &mut self.rain
    }

    pub fn dvb(&self) -> &Dvbs2 {
        &self.dvb
    }

    pub fn bandwidth_hz(&self) -> f64 {
        self.bandwidth_hz
    }

    pub fn link_constant_db(&self) -> f64 {
        self.link_constant_db
    }

    pub fn link_margin_db(&self) -> f64 {
        self.link_margin_db
    }

    /// Adjusts the link margin without rebuilding the scenario.
    pub fn set_link_margin(&mut self, margin_db: f64) {
        self.link_margin_db = margin_db;
    }

    pub fn tb_k(&self) -> f64 {
        self.tb_k
    }

    /// Free-space path loss in dB at the station's carrier frequency.
    pub fn free_space_path_loss(&self, distance_m: f64) -> f64 {
        let frequency_hz = self.station.frequency_ghz() * 1e9;
        let lin = (4.0 * PI * distance_m * frequency_hz / SPEED_OF_LIGHT).powi(2);
        10.0 * lin.log10()
    }

    /// Total antenna noise temperature under `attenuation_db` of rain.
    ///
    /// The rain layer both emits (approaching the physical temperature as
    /// attenuation grows) and attenuates the clear-sky brightness behind
    /// it.
    pub fn antenna_temperature(&self, attenuation_db: f64, physical_temp_k: f64) -> f64 {
        let att_lin = 10f64.powf(-attenuation_db / 10.0);
        let t_atmosphere = physical_temp_k * (1.0 - att_lin);
        let t_b_eff = self.tb_k * att_lin;
        t_b_eff + t_atmosphere
    }

    /// Instantaneous SNR in dB for one distance/elevation/rain sample.
    ///
    /// `rain_rate_mmhr = None` defers to the rain model: the cached
    /// exceedance rate for ITU, one chain draw for Markov.
    pub fn snr_at_t(
        &mut self,
        distance_m: f64,
        elevation_deg: f64,
        rain_rate_mmhr: Option<f64>,
    ) -> Result<f64> {
        let fspl_db = self.free_space_path_loss(distance_m);
        let rain_att_db = self.rain.attenuation_at(elevation_deg, rain_rate_mmhr)?;
        Ok(self.compose_snr(fspl_db, rain_att_db))
    }

    /// Long-run average SNR in dB over the station's elevation
    /// distribution, for one distance and rain condition.
    pub fn snr_eqv(&mut self, distance_m: f64, rain_rate_mmhr: Option<f64>) -> Result<f64> {
        let fspl_db = self.free_space_path_loss(distance_m);
        let rain_att_db = self.rain.equivalent_attenuation(rain_rate_mmhr)?;
        Ok(self.compose_snr(fspl_db, rain_att_db))
    }

    fn compose_snr(&self, fspl_db: f64, rain_att_db: f64) -> f64 {
        let antenna_temp_k = self.antenna_temperature(rain_att_db, RAIN_PHYSICAL_TEMP_K);
        let gt_db = self.station.effective_gt(antenna_temp_k);

        let power_db =
            self.link_constant_db - self.link_margin_db + gt_db - fspl_db - rain_att_db;
        let power_lin = 10f64.powf(power_db / 10.0);
        let snr_lin = power_lin / (BOLTZMANN_J_PER_K * self.bandwidth_hz);
        let snr_db = 10.0 * snr_lin.log10();
        debug!(fspl_db, rain_att_db, gt_db, snr_db, "link budget composed");
        snr_db
    }

    /// Shannon capacity in bits/s for `snr_db` over the full bandwidth.
    pub fn shannon_capacity(&self, snr_db: f64) -> f64 {
        self.bandwidth_hz * (1.0 + 10f64.powf(snr_db / 10.0)).log2()
    }

    /// SNR in dB required to reach `rate_bps` at the Shannon bound.
    pub fn shannon_power_for_rate(&self, rate_bps: f64) -> f64 {
        let snr_lin = 2f64.powf(rate_bps / self.bandwidth_hz) - 1.0;
        10.0 * snr_lin.log10()
    }

    /// Highest DVB-S2 rate the link supports at `snr_db`; 0 below the
    /// coding floor.
    pub fn dvb_capacity(&self, snr_db: f64) -> f64 {
        self.dvb.capacity_at_snr(snr_db)
    }

    /// Rate of the modcod closest to `target_rate_bps`, if `snr_db`
    /// closes it; 0 otherwise.
    pub fn dvb_capacity_for_target(&self, snr_db: f64, target_rate_bps: f64) -> f64 {
        self.dvb.rate_for_target(snr_db, target_rate_bps)
    }
}
