//! Bundled observation compilations.
//!
//! Growth measurements are `f·σ8` at the survey's effective redshift from
//! peculiar-velocity and RSD compilations; the muon datum is the world-average
//! `Δa_μ` anomaly. Values are baked in because the engine does no file I/O.

use crate::domain::Observation;

/// `f·σ8(z)` compilation: `(z, value, error)`.
pub fn growth_observations() -> Vec<Observation> {
    [
        (0.02, 0.398, 0.065),
        (0.067, 0.423, 0.055),
        (0.17, 0.510, 0.060),
        (0.18, 0.360, 0.090),
        (0.38, 0.440, 0.060),
        (0.51, 0.458, 0.038),
        (0.52, 0.397, 0.110),
        (0.59, 0.488, 0.060),
        (0.86, 0.400, 0.110),
        (0.978, 0.379, 0.176),
    ]
    .into_iter()
    .map(|(x, target, sigma)| Observation { x, target, sigma })
    .collect()
}

/// Normalized laboratory observables (decoherence, thermal noise, lifetime).
pub fn micro_observations() -> Vec<Observation> {
    [
        // C60 decoherence
        (1.0, 0.10),
        // interferometer thermal noise
        (1.0, 0.15),
        // cosmic-ray muon lifetime
        (1.0, 0.05),
    ]
    .into_iter()
    .map(|(target, sigma)| Observation { x: 0.0, target, sigma })
    .collect()
}

/// Muon anomalous moment `Δa_μ` (world average).
pub fn muon_observation() -> Observation {
    Observation {
        x: 0.0,
        target: 25.1e-10,
        sigma: 4.8e-10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::check_observations;

    #[test]
    fn bundled_data_passes_validation() {
        check_observations("growth", &growth_observations()).unwrap();
        check_observations("micro", &micro_observations()).unwrap();
        check_observations("muon", std::slice::from_ref(&muon_observation())).unwrap();
    }

    #[test]
    fn growth_redshifts_are_sorted_and_positive() {
        let obs = growth_observations();
        assert!(obs.windows(2).all(|w| w[0].x < w[1].x));
        assert!(obs.iter().all(|o| o.x > 0.0));
    }
}
