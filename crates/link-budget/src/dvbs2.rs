//! DVB-S2 adaptive coding and modulation.
//!
//! The modcod catalogue is the fixed reference table from ETSI EN 302 307
//! (normal FECFRAME, AWGN ES/N0 thresholds), ordered ascending by
//! required ES/N0. Selection picks the most spectrally efficient entry a
//! given SNR can close, boundary-inclusive: a link sitting exactly at an
//! entry's threshold qualifies for it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{LinkBudgetError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modulation {
    Qpsk,
    Psk8,
    Apsk16,
    Apsk32,
}

/// One (modulation, code rate) operating point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modcod {
    pub modulation: Modulation,
    pub code_rate: f64,
    /// Spectral efficiency in bits/s/Hz.
    pub spectral_efficiency: f64,
    /// Required ES/N0 in dB for quasi-error-free demodulation.
    pub esno_db: f64,
}

impl Modcod {
    const fn new(
        modulation: Modulation,
        code_rate: f64,
        spectral_efficiency: f64,
        esno_db: f64,
    ) -> Self {
        Self {
            modulation,
            code_rate,
            spectral_efficiency,
            esno_db,
        }
    }

    /// Required Eb/N0 in dB: `ES/N0 − 10·log10(spectral efficiency)`.
    pub fn ebno_db(&self) -> f64 {
        self.esno_db - 10.0 * self.spectral_efficiency.log10()
    }
}

/// The DVB-S2 reference catalogue, ascending in required ES/N0.
pub const MODCODS: [Modcod; 28] = [
    Modcod::new(Modulation::Qpsk, 1.0 / 4.0, 0.490243, -2.35),
    Modcod::new(Modulation::Qpsk, 1.0 / 3.0, 0.656448, -1.24),
    Modcod::new(Modulation::Qpsk, 2.0 / 5.0, 0.789412, -0.30),
    Modcod::new(Modulation::Qpsk, 1.0 / 2.0, 0.988858, 1.00),
    Modcod::new(Modulation::Qpsk, 3.0 / 5.0, 1.188304, 2.23),
    Modcod::new(Modulation::Qpsk, 2.0 / 3.0, 1.322253, 3.10),
    Modcod::new(Modulation::Qpsk, 3.0 / 4.0, 1.487473, 4.03),
    Modcod::new(Modulation::Qpsk, 4.0 / 5.0, 1.587196, 4.68),
    Modcod::new(Modulation::Qpsk, 5.0 / 6.0, 1.654663, 5.18),
    Modcod::new(Modulation::Psk8, 3.0 / 5.0, 1.779991, 5.50),
    Modcod::new(Modulation::Qpsk, 8.0 / 9.0, 1.766451, 6.20),
    Modcod::new(Modulation::Qpsk, 9.0 / 10.0, 1.788612, 6.42),
    Modcod::new(Modulation::Psk8, 2.0 / 3.0, 1.980636, 6.62),
    Modcod::new(Modulation::Psk8, 3.0 / 4.0, 2.228124, 7.91),
    Modcod::new(Modulation::Apsk16, 2.0 / 3.0, 2.637201, 8.97),
    Modcod::new(Modulation::Psk8, 5.0 / 6.0, 2.478562, 9.35),
    Modcod::new(Modulation::Apsk16, 3.0 / 4.0, 2.966728, 10.21),
    Modcod::new(Modulation::Psk8, 8.0 / 9.0, 2.646012, 10.69),
    Modcod::new(Modulation::Psk8, 9.0 / 10.0, 2.679207, 10.98),
    Modcod::new(Modulation::Apsk16, 4.0 / 5.0, 3.165623, 11.03),
    Modcod::new(Modulation::Apsk16, 5.0 / 6.0, 3.300184, 11.61),
    Modcod::new(Modulation::Apsk32, 3.0 / 4.0, 3.703295, 12.73),
    Modcod::new(Modulation::Apsk16, 8.0 / 9.0, 3.523143, 12.89),
    Modcod::new(Modulation::Apsk16, 9.0 / 10.0, 3.567342, 13.13),
    Modcod::new(Modulation::Apsk32, 4.0 / 5.0, 3.951571, 13.64),
    Modcod::new(Modulation::Apsk32, 5.0 / 6.0, 4.119540, 14.28),
    Modcod::new(Modulation::Apsk32, 8.0 / 9.0, 4.397854, 15.69),
    Modcod::new(Modulation::Apsk32, 9.0 / 10.0, 4.453027, 16.05),
];

/// DVB-S2 carrier: occupied bandwidth shaped by the root-raised-cosine
/// roll-off, so the symbol-bearing bandwidth is `bw / (1 + rolloff)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Dvbs2 {
    bandwidth_hz: f64,
    rolloff: f64,
    effective_bandwidth_hz: f64,
}

impl Dvbs2 {
    /// Standard 0.1 roll-off carrier.
    pub fn new(bandwidth_hz: f64) -> Self {
        Self::with_rolloff(bandwidth_hz, 0.1)
    }

    pub fn with_rolloff(bandwidth_hz: f64, rolloff: f64) -> Self {
        Self {
            bandwidth_hz,
            rolloff,
            effective_bandwidth_hz: bandwidth_hz / (1.0 + rolloff),
        }
    }

    pub fn bandwidth_hz(&self) -> f64 {
        self.bandwidth_hz
    }

    pub fn rolloff(&self) -> f64 {
        self.rolloff
    }

    pub fn effective_bandwidth_hz(&self) -> f64 {
        self.effective_bandwidth_hz
    }

    /// The most spectrally efficient modcod whose ES/N0 requirement is
    /// met at `esno_db` (threshold-inclusive; efficiency ties keep the
    /// earliest catalogued entry).
    pub fn select_best(&self, esno_db: f64) -> Result<&'static Modcod> {
        let floor = &MODCODS[0];
        if esno_db < floor.esno_db {
            return Err(LinkBudgetError::BelowCodingThreshold {
                esno_db,
                floor_db: floor.esno_db,
            });
        }

        let mut best = floor;
        for modcod in &MODCODS[1..] {
            if modcod.esno_db <= esno_db && modcod.spectral_efficiency > best.spectral_efficiency
            {
                best = modcod;
            }
        }
        Ok(best)
    }

    /// Data rate of a modcod over this carrier, in bits/s.
    pub fn rate(&self, modcod: &Modcod) -> f64 {
        modcod.spectral_efficiency * self.effective_bandwidth_hz
    }

    /// Best achievable rate at `esno_db`; 0 below the coding floor.
    ///
    /// No throughput is a policy outcome here, not an error.
    pub fn capacity_at_snr(&self, esno_db: f64) -> f64 {
        match self.select_best(esno_db) {
            Ok(modcod) => self.rate(modcod),
            Err(_) => {
                debug!(esno_db, "below coding floor, zero rate");
                0.0
            }
        }
    }

    /// The catalogued modcod whose rate over this carrier is closest to
    /// `target_rate_bps`.
    pub fn modcod_for_rate(&self, target_rate_bps: f64) -> &'static Modcod {
        MODCODS
            .iter()
            .min_by(|a, b| {
                let da = (self.rate(a) - target_rate_bps).abs();
                let db = (self.rate(b) - target_rate_bps).abs();
                da.total_cmp(&db)
            })
            .expect("catalogue is non-empty")
    }

    /// Rate of the modcod closest to `target_rate_bps`, provided the
    /// link at `esno_db` can close it; 0 otherwise.
    pub fn rate_for_target(&self, esno_db: f64, target_rate_bps: f64) -> f64 {
        let modcod = self.modcod_for_rate(target_rate_bps);
        if modcod.esno_db <= esno_db {
            self.rate(modcod)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn catalogue_is_sorted_by_threshold() {
        for pair in MODCODS.windows(2) {
            assert!(pair[0].esno_db <= pair[1].esno_db);
        }
    }

    #[test]
    fn ebno_derivation() {
        let qpsk14 = &MODCODS[0];
        let expected = -2.35 - 10.0 * 0.490243f64.log10();
        assert!((qpsk14.ebno_db() - expected).abs() < 1e-12);
    }

    #[test]
    fn select_best_is_threshold_inclusive() {
        let dvb = Dvbs2::new(1e6);
        // Exactly at the floor threshold: QPSK 1/4 qualifies
        let modcod = dvb.select_best(-2.35).unwrap();
        assert_eq!(modcod.modulation, Modulation::Qpsk);
        assert!((modcod.spectral_efficiency - 0.490243).abs() < 1e-12);
    }

    #[test]
    fn select_best_below_floor_errors() {
        let dvb = Dvbs2::new(1e6);
        assert!(matches!(
            dvb.select_best(-3.0),
            Err(LinkBudgetError::BelowCodingThreshold { .. })
        ));
    }

    #[test]
    fn select_best_prefers_efficiency_over_threshold_order() {
        let dvb = Dvbs2::new(1e6);
        // At 6.3 dB, 8PSK 3/5 (5.50 dB, 1.779991) beats QPSK 8/9
        // (6.20 dB, 1.766451) on efficiency
        let modcod = dvb.select_best(6.3).unwrap();
        assert_eq!(modcod.modulation, Modulation::Psk8);
        assert!((modcod.spectral_efficiency - 1.779991).abs() < 1e-12);
    }

    #[test]
    fn capacity_is_zero_below_floor() {
        let dvb = Dvbs2::new(1e6);
        assert_eq!(dvb.capacity_at_snr(-3.0), 0.0);
    }

    #[test]
    fn capacity_at_top_of_table() {
        let dvb = Dvbs2::new(1e6);
        let expected = 4.453027 * 1e6 / 1.1;
        assert!((dvb.capacity_at_snr(16.05) - expected).abs() < 1e-3);
    }

    #[test]
    fn effective_bandwidth_accounts_for_rolloff() {
        let dvb = Dvbs2::with_rolloff(36e6, 0.2);
        assert!((dvb.effective_bandwidth_hz() - 30e6).abs() < 1e-6);
    }

    #[test]
    fn rate_for_target_checks_the_threshold() {
        let dvb = Dvbs2::new(1e6);
        let target = 2.0e6; // closest to 8PSK 2/3 at 1.980636 bits/s/Hz
        let modcod = dvb.modcod_for_rate(target);
        assert!((modcod.spectral_efficiency - 1.980636).abs() < 1e-12);

        assert!((dvb.rate_for_target(10.0, target) - dvb.rate(modcod)).abs() < 1e-9);
        assert_eq!(dvb.rate_for_target(3.0, target), 0.0);
    }

    proptest! {
        // Selected spectral efficiency never decreases as ES/N0 rises.
        #[test]
        fn selection_is_monotone(esno_a in -2.35..20.0f64, esno_b in -2.35..20.0f64) {
            let dvb = Dvbs2::new(1e6);
            let (lo, hi) = if esno_a <= esno_b { (esno_a, esno_b) } else { (esno_b, esno_a) };
            let eff_lo = dvb.select_best(lo).unwrap().spectral_efficiency;
            let eff_hi = dvb.select_best(hi).unwrap().spectral_efficiency;
            prop_assert!(eff_hi >= eff_lo);
        }

        // Capacity never exceeds what the effective bandwidth and the
        // top catalogue entry allow.
        #[test]
        fn capacity_is_bounded(esno in -10.0..30.0f64) {
            let dvb = Dvbs2::new(1e6);
            let cap = dvb.capacity_at_snr(esno);
            prop_assert!(cap >= 0.0);
            prop_assert!(cap <= 4.453027 * dvb.effective_bandwidth_hz() + 1e-6);
        }
    }
}
