//! Continuous orbit model built from evenly spaced state vectors
//!
//! Every position and velocity component is interpolated with its own cubic
//! spline using not-a-knot end conditions, giving a C² trajectory through
//! the supplied samples. Times are seconds relative to an arbitrary origin;
//! PALSAR products use image sensing start as the origin, see
//! [`crate::core::geolocation::PalsarProduct`].

use crate::core::grid::LinearSpace;
use crate::types::{SarError, SarResult, StateVector};

/// Orbit interpolant over uniformly sampled state vectors
#[derive(Debug, Clone)]
pub struct Orbit {
    time: LinearSpace<f64>,
    state_vectors: Vec<StateVector>,
    /// Spline second derivatives at each sample, per component
    curvature: Vec<[f64; 6]>,
}

impl Orbit {
    /// Fewest samples a not-a-knot cubic spline can be fitted through
    pub const MIN_STATE_VECTORS: usize = 4;

    /// Build an orbit whose i-th state vector is valid at `start_time + i * spacing`
    pub fn new(start_time: f64, spacing: f64, state_vectors: Vec<StateVector>) -> SarResult<Self> {
        if !start_time.is_finite() {
            return Err(SarError::InvalidOrbit(format!("Non-finite start time: {}", start_time)));
        }
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(SarError::InvalidOrbit(format!(
                "State vector spacing must be positive, got {}", spacing
            )));
        }
        if state_vectors.len() < Self::MIN_STATE_VECTORS {
            return Err(SarError::InvalidOrbit(format!(
                "At least {} state vectors required, got {}",
                Self::MIN_STATE_VECTORS,
                state_vectors.len()
            )));
        }
        if let Some(i) = state_vectors
            .iter()
            .position(|sv| sv.components().iter().any(|c| !c.is_finite()))
        {
            return Err(SarError::InvalidOrbit(format!("State vector {} is not finite", i)));
        }

        let curvature = fit_not_a_knot(&state_vectors, spacing);

        log::debug!(
            "Orbit built from {} state vectors, t = [{:.3}, {:.3}] s, spacing {:.3} s",
            state_vectors.len(),
            start_time,
            start_time + (state_vectors.len() - 1) as f64 * spacing,
            spacing
        );

        Ok(Self {
            time: LinearSpace::new(start_time, spacing),
            state_vectors,
            curvature,
        })
    }

    /// Build from a flat `[x, y, z, vx, vy, vz, x, y, ...]` array
    pub fn from_flat(start_time: f64, spacing: f64, posvel: &[f64]) -> SarResult<Self> {
        if posvel.is_empty() {
            return Err(SarError::InvalidOrbit("No state vectors provided".to_string()));
        }
        if posvel.len() % 6 != 0 {
            return Err(SarError::InvalidOrbit(format!(
                "Pos/vel array length must be a multiple of 6, got {}", posvel.len()
            )));
        }

        let state_vectors = posvel
            .chunks_exact(6)
            .map(|c| StateVector::from_components([c[0], c[1], c[2], c[3], c[4], c[5]]))
            .collect();

        Self::new(start_time, spacing, state_vectors)
    }

    pub fn start_time(&self) -> f64 {
        self.time.start()
    }

    pub fn end_time(&self) -> f64 {
        self.sample_time(self.state_vectors.len() - 1)
    }

    pub fn spacing(&self) -> f64 {
        self.time.spacing()
    }

    /// First and last sample times
    pub fn time_bounds(&self) -> (f64, f64) {
        (self.start_time(), self.end_time())
    }

    pub fn midpoint_time(&self) -> f64 {
        0.5 * (self.start_time() + self.end_time())
    }

    /// Time of the i-th state vector
    pub fn sample_time(&self, i: usize) -> f64 {
        self.time.value_at(i as f64)
    }

    /// Whether `t` lies inside the sampled span (no extrapolation)
    pub fn contains_time(&self, t: f64) -> bool {
        t >= self.start_time() && t <= self.end_time()
    }

    pub fn state_vectors(&self) -> &[StateVector] {
        &self.state_vectors
    }

    pub fn len(&self) -> usize {
        self.state_vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state_vectors.is_empty()
    }

    /// Interpolated position and velocity at time `t`.
    ///
    /// Outside the sampled span the end polynomials are extrapolated, which
    /// degrades quickly with distance from the span.
    pub fn evaluate(&self, t: f64) -> StateVector {
        let seg = self.segment(t);
        let mut out = [0.0; 6];
        for (j, value) in out.iter_mut().enumerate() {
            *value = seg.value(j);
        }
        StateVector::from_components(out)
    }

    pub fn position(&self, t: f64) -> [f64; 3] {
        let seg = self.segment(t);
        [seg.value(0), seg.value(1), seg.value(2)]
    }

    pub fn velocity(&self, t: f64) -> [f64; 3] {
        let seg = self.segment(t);
        [seg.value(3), seg.value(4), seg.value(5)]
    }

    /// Time derivative of the velocity interpolant
    pub fn acceleration(&self, t: f64) -> [f64; 3] {
        let seg = self.segment(t);
        [seg.derivative(3), seg.derivative(4), seg.derivative(5)]
    }

    /// Time derivative of the position interpolant.
    ///
    /// Independent of the interpolated velocity; for consistent input the two agree
    /// to within the interpolation error.
    pub fn position_rate(&self, t: f64) -> [f64; 3] {
        let seg = self.segment(t);
        [seg.derivative(0), seg.derivative(1), seg.derivative(2)]
    }

    fn segment(&self, t: f64) -> Segment<'_> {
        let last = self.state_vectors.len() - 2;
        let idx = self.time.index_of(t).floor();
        let k = if idx.is_nan() || idx < 0.0 {
            0
        } else {
            (idx as usize).min(last)
        };

        let h = self.spacing();
        let s = t - self.sample_time(k);
        Segment {
            y0: self.state_vectors[k].components(),
            y1: self.state_vectors[k + 1].components(),
            m0: &self.curvature[k],
            m1: &self.curvature[k + 1],
            h,
            s,
            u: h - s,
        }
    }
}

/// One spline interval `[t_k, t_k + h]` evaluated at offset `s` from `t_k`
struct Segment<'a> {
    y0: [f64; 6],
    y1: [f64; 6],
    m0: &'a [f64; 6],
    m1: &'a [f64; 6],
    h: f64,
    s: f64,
    u: f64,
}

impl Segment<'_> {
    fn value(&self, j: usize) -> f64 {
        let (h, s, u) = (self.h, self.s, self.u);
        let (m0, m1) = (self.m0[j], self.m1[j]);
        m0 * u * u * u / (6.0 * h)
            + m1 * s * s * s / (6.0 * h)
            + (self.y0[j] / h - m0 * h / 6.0) * u
            + (self.y1[j] / h - m1 * h / 6.0) * s
    }

    fn derivative(&self, j: usize) -> f64 {
        let (h, s, u) = (self.h, self.s, self.u);
        let (m0, m1) = (self.m0[j], self.m1[j]);
        -m0 * u * u / (2.0 * h) + m1 * s * s / (2.0 * h) + (self.y1[j] - self.y0[j]) / h
            - (m1 - m0) * h / 6.0
    }
}

/// Second derivatives of the not-a-knot cubic spline through every component.
///
/// With uniform knots the not-a-knot conditions `M0 = 2 M1 - M2` and
/// `M[n-1] = 2 M[n-2] - M[n-3]` fold into the first and last interior rows,
/// keeping the system tridiagonal.
fn fit_not_a_knot(state_vectors: &[StateVector], h: f64) -> Vec<[f64; 6]> {
    let n = state_vectors.len();
    let mut curvature = vec![[0.0; 6]; n];

    for j in 0..6 {
        let y: Vec<f64> = state_vectors.iter().map(|sv| sv.components()[j]).collect();
        let m = solve_interior(&y, h);

        curvature[1..n - 1]
            .iter_mut()
            .zip(&m)
            .for_each(|(c, mi)| c[j] = *mi);
        curvature[0][j] = 2.0 * m[0] - m[1];
        curvature[n - 1][j] = 2.0 * m[m.len() - 1] - m[m.len() - 2];
    }

    curvature
}

/// Thomas algorithm for the interior second derivatives `M[1..n-1]`
fn solve_interior(y: &[f64], h: f64) -> Vec<f64> {
    let n = y.len();
    let size = n - 2;

    let rhs: Vec<f64> = (1..n - 1)
        .map(|i| 6.0 * (y[i + 1] - 2.0 * y[i] + y[i - 1]) / (h * h))
        .collect();

    // rows: sub * M[i-1] + diag * M[i] + sup * M[i+1] = rhs
    let row = |r: usize| -> (f64, f64, f64) {
        let sub = if r == 0 || r == size - 1 { 0.0 } else { 1.0 };
        let sup = if r == 0 || r == size - 1 { 0.0 } else { 1.0 };
        let diag = if r == 0 || r == size - 1 { 6.0 } else { 4.0 };
        (sub, diag, sup)
    };

    let mut c_prime = vec![0.0; size];
    let mut d_prime = vec![0.0; size];

    let (_, diag, sup) = row(0);
    c_prime[0] = sup / diag;
    d_prime[0] = rhs[0] / diag;
    for r in 1..size {
        let (sub, diag, sup) = row(r);
        let denom = diag - sub * c_prime[r - 1];
        c_prime[r] = sup / denom;
        d_prime[r] = (rhs[r] - sub * d_prime[r - 1]) / denom;
    }

    let mut m = vec![0.0; size];
    m[size - 1] = d_prime[size - 1];
    for r in (0..size - 1).rev() {
        m[r] = d_prime[r] - c_prime[r] * m[r + 1];
    }
    m
}
