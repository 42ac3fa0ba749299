//! Classical 4th-order Runge–Kutta with a fixed step.
//!
//! The growth equation is a linear second-order ODE, so the state is the
//! 2-component vector `(D, D')`. We deliberately use a fixed step and no
//! adaptive control:
//!
//! - deterministic cost per solve (the optimizer calls this thousands of times)
//! - deterministic results for a given step count
//! - global error `O(h^4)`, which the caller controls via the step count
//!
//! Numerical notes:
//! - This function never panics on finite inputs. If a stiff or inadmissible
//!   parameter region blows the state up, the result is `NaN`/`Inf` and the
//!   caller detects it with a plain `is_finite()` check.

use nalgebra::Vector2;

/// Integrate `y' = f(x, y)` from `x0` to `x1` in `n_steps` fixed RK4 steps.
///
/// With `n_steps == 0` the initial state is returned unchanged.
pub fn rk4_integrate<F>(x0: f64, x1: f64, y0: Vector2<f64>, n_steps: usize, f: F) -> Vector2<f64>
where
    F: Fn(f64, Vector2<f64>) -> Vector2<f64>,
{
    if n_steps == 0 {
        return y0;
    }

    let h = (x1 - x0) / n_steps as f64;
    let mut x = x0;
    let mut y = y0;

    for _ in 0..n_steps {
        let k1 = f(x, y);
        let k2 = f(x + 0.5 * h, y + k1 * (0.5 * h));
        let k3 = f(x + 0.5 * h, y + k2 * (0.5 * h));
        let k4 = f(x + h, y + k3 * h);
        y += (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0);
        x += h;
    }

    y
}
