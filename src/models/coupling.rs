//! Modified gravitational coupling `μ(a, k)`.
//!
//! The coupling is a product of three independent suppression factors applied
//! to a base strength:
//!
//! - `F(k) = 1 / (1 + (k/k*)²)` — wavenumber low-pass
//! - `S(a) = 1 / (1 + exp(-s·(a - a_t)))` — logistic time transition
//! - `screen = 1 / (1 + 1/ρ)` — density screening
//!
//! The strength interpolates between an early value (`eps_mass`) and a late
//! value (`eps_0`) through the same logistic, frozen at a fixed reference
//! epoch for the whole solve:
//!
//! `μ(a, k) = 1 − ε(a_ref) · S(a) · F(k) · screen`
//!
//! The transition factor switches the modification on around `transition_a`,
//! so `μ → 1` well before the epoch and gravity stays unmodified at early
//! times. `μ ≡ 1` everywhere is recovered for `eps_mass = eps_0 = 0`.

use serde::{Deserialize, Serialize};

use crate::domain::ParameterVector;

/// Parameters of the coupling, pulled by name from a trial vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CouplingParams {
    pub eps_mass: f64,
    pub eps_0: f64,
    pub transition_a: f64,
    pub sharpness: f64,
    pub k_star: f64,
    pub rho_screen: f64,
}

impl CouplingParams {
    /// Epoch at which the effective strength is frozen for a growth solve.
    pub const REFERENCE_EPOCH: f64 = 0.5;

    /// Unmodified gravity: `μ(a, k) ≡ 1` for any `a`, `k`.
    pub fn unmodified() -> Self {
        Self {
            eps_mass: 0.0,
            eps_0: 0.0,
            transition_a: 0.5,
            sharpness: 20.0,
            k_star: 0.5,
            rho_screen: 100.0,
        }
    }

    /// Read the six coupling parameters from a trial vector.
    ///
    /// Returns `None` if the vector's space does not declare one of the names.
    pub fn from_vector(pv: &ParameterVector) -> Option<Self> {
        Some(Self {
            eps_mass: pv.get("eps_mass")?,
            eps_0: pv.get("eps_0")?,
            transition_a: pv.get("transition_a")?,
            sharpness: pv.get("sharpness")?,
            k_star: pv.get("k_star")?,
            rho_screen: pv.get("rho_screen")?,
        })
    }

    /// Wavenumber low-pass factor `F(k)`.
    pub fn lowpass(&self, k: f64) -> f64 {
        let r = k / self.k_star;
        1.0 / (1.0 + r * r)
    }

    /// Logistic time-transition factor `S(a)`.
    pub fn transition(&self, a: f64) -> f64 {
        1.0 / (1.0 + (-self.sharpness * (a - self.transition_a)).exp())
    }

    /// Density-screening factor.
    pub fn screening(&self) -> f64 {
        1.0 / (1.0 + 1.0 / self.rho_screen)
    }

    /// Effective strength `ε(a)` interpolating early → late through `S(a)`.
    pub fn strength(&self, a: f64) -> f64 {
        self.eps_mass + (self.eps_0 - self.eps_mass) * self.transition(a)
    }

    /// The full coupling `μ(a, k)`.
    ///
    /// The strength is frozen at [`Self::REFERENCE_EPOCH`]; the time
    /// dependence comes entirely from the transition factor.
    pub fn mu(&self, a: f64, k: f64) -> f64 {
        let eps = self.strength(Self::REFERENCE_EPOCH);
        1.0 - eps * self.transition(a) * self.lowpass(k) * self.screening()
    }
}
