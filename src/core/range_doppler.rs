//! Zero-Doppler geolocation: ground point (ECEF) to azimuth time and slant range
//!
//! The sensor images a target when its velocity is perpendicular to the line
//! of sight. The solver looks for the root of
//!
//! ```text
//! f(t) = v(t) · (x - p(t))
//! ```
//!
//! which has the same zero as the true Doppler frequency without the
//! wavelength and range normalisation.

use std::convert::Infallible;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::orbit::Orbit;
use crate::types::{SarError, SarResult};

/// Root-finding strategy for the zero-Doppler equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverMethod {
    /// Newton-Raphson from an initial guess using the orbit acceleration
    Newton,
    /// Bisection over the orbit span; needs a sign change across the span
    Bisection,
}

impl Default for SolverMethod {
    fn default() -> Self {
        SolverMethod::Newton
    }
}

/// Case-insensitive; unknown names fall back to Newton
impl FromStr for SolverMethod {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "newton" => SolverMethod::Newton,
            "bisection" | "bisect" => SolverMethod::Bisection,
            _ => SolverMethod::Newton,
        })
    }
}

/// Convergence settings for the zero-Doppler solve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub method: SolverMethod,
    /// Stop once the azimuth-time update (or half bracket) is below this, seconds
    pub time_tolerance: f64,
    /// Stop once |v · (x - p)| is below this, m²/s
    pub residual_tolerance: f64,
    /// Hard iteration cap
    pub max_iterations: usize,
    /// How far outside the orbit span a solution may lie, seconds
    pub max_extrapolation: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            method: SolverMethod::Newton,
            time_tolerance: 1e-9,
            residual_tolerance: 1e-6,
            max_iterations: 50,
            max_extrapolation: 0.0,
        }
    }
}

/// Solved radar geometry of one target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadarCoordinate {
    /// Zero-Doppler time on the orbit's time axis, seconds
    pub azimuth_time: f64,
    /// Sensor-to-target distance at `azimuth_time`, meters
    pub slant_range: f64,
    pub iterations: usize,
}

/// Range-Doppler solver; stateless apart from its configuration
#[derive(Debug, Clone, Default)]
pub struct RangeDopplerSolver {
    config: SolverConfig,
}

impl RangeDopplerSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve for the zero-Doppler time and slant range of `target`.
    ///
    /// `initial_guess` defaults to the middle of the orbit span. When solving a
    /// spatially coherent grid, passing the previous point's azimuth time cuts
    /// the iteration count and keeps the solver on the same root.
    pub fn solve(
        &self,
        target: &[f64; 3],
        orbit: &Orbit,
        initial_guess: Option<f64>,
    ) -> SarResult<RadarCoordinate> {
        let (azimuth_time, iterations) = match self.config.method {
            SolverMethod::Newton => self.newton(target, orbit, initial_guess)?,
            SolverMethod::Bisection => self.bisection(target, orbit)?,
        };

        let (t_min, t_max) = orbit.time_bounds();
        let margin = self.config.max_extrapolation.max(0.0);
        if azimuth_time < t_min - margin || azimuth_time > t_max + margin {
            return Err(SarError::RootFinding {
                iterations,
                reason: format!(
                    "zero-Doppler time {:.6} s outside orbit span [{:.3}, {:.3}] s",
                    azimuth_time, t_min, t_max
                ),
            });
        }

        let slant_range = norm(&sub(target, &orbit.position(azimuth_time)));

        log::debug!(
            "Zero-Doppler solution t = {:.9} s, R = {:.3} m after {} iterations",
            azimuth_time, slant_range, iterations
        );

        Ok(RadarCoordinate {
            azimuth_time,
            slant_range,
            iterations,
        })
    }

    fn newton(&self, target: &[f64; 3], orbit: &Orbit, initial_guess: Option<f64>) -> SarResult<(f64, usize)> {
        let (t_min, t_max) = orbit.time_bounds();
        let span = t_max - t_min;
        let mut t = initial_guess.unwrap_or_else(|| orbit.midpoint_time());

        if !t.is_finite() {
            return Err(SarError::RootFinding {
                iterations: 0,
                reason: format!("non-finite initial guess {}", t),
            });
        }

        for iteration in 1..=self.config.max_iterations {
            let sv = orbit.evaluate(t);
            let los = sub(target, &sv.position);
            let residual = dot(&sv.velocity, &los);

            if residual.abs() < self.config.residual_tolerance {
                return Ok((t, iteration));
            }

            let slope = dot(&orbit.acceleration(t), &los) - dot(&sv.velocity, &sv.velocity);
            if !(residual.is_finite() && slope.is_finite()) || slope == 0.0 {
                return Err(SarError::RootFinding {
                    iterations: iteration,
                    reason: format!("degenerate Doppler slope {:e} at t = {:.6} s", slope, t),
                });
            }

            let step = residual / slope;
            t -= step;

            if !t.is_finite() || t < t_min - span || t > t_max + span {
                return Err(SarError::RootFinding {
                    iterations: iteration,
                    reason: format!("iterate diverged to t = {:.6} s", t),
                });
            }

            if step.abs() < self.config.time_tolerance {
                return Ok((t, iteration));
            }
        }

        Err(SarError::RootFinding {
            iterations: self.config.max_iterations,
            reason: format!("no convergence, last t = {:.6} s", t),
        })
    }

    fn bisection(&self, target: &[f64; 3], orbit: &Orbit) -> SarResult<(f64, usize)> {
        let (t_min, t_max) = orbit.time_bounds();
        let margin = self.config.max_extrapolation.max(0.0);
        let mut a = t_min - margin;
        let mut b = t_max + margin;

        let mut fa = doppler_residual(target, orbit, a);
        let fb = doppler_residual(target, orbit, b);

        if fa == 0.0 {
            return Ok((a, 0));
        }
        if fb == 0.0 {
            return Ok((b, 0));
        }
        if (fa > 0.0) == (fb > 0.0) {
            return Err(SarError::RootFinding {
                iterations: 0,
                reason: format!(
                    "no zero-Doppler crossing in [{:.3}, {:.3}] s (f = {:e}, {:e})",
                    a, b, fa, fb
                ),
            });
        }

        for iteration in 1..=self.config.max_iterations {
            let c = 0.5 * (a + b);
            let fc = doppler_residual(target, orbit, c);
            if fc == 0.0 || 0.5 * (b - a) < self.config.time_tolerance {
                return Ok((c, iteration));
            }

            if (fc > 0.0) == (fa > 0.0) {
                a = c;
                fa = fc;
            } else {
                b = c;
            }
        }

        Err(SarError::RootFinding {
            iterations: self.config.max_iterations,
            reason: format!("bracket [{:.9}, {:.9}] s still wider than tolerance", a, b),
        })
    }
}

/// `v(t) · (x - p(t))`, zero at the zero-Doppler time of `target`
pub fn doppler_residual(target: &[f64; 3], orbit: &Orbit, t: f64) -> f64 {
    let sv = orbit.evaluate(t);
    dot(&sv.velocity, &sub(target, &sv.position))
}

fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn norm(a: &[f64; 3]) -> f64 {
    dot(a, a).sqrt()
}
