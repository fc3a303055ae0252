use approx::{assert_abs_diff_eq, assert_relative_eq};
use sarloc::{Orbit, SarError, StateVector};

const GM: f64 = 3.986004418e14;
const RADIUS: f64 = 7.0e6;
const SPACING: f64 = 60.0;

fn angular_rate() -> f64 {
    (GM / RADIUS.powi(3)).sqrt()
}

/// Circular equatorial orbit sampled every minute, t = 0 at the first sample
fn circular_state(t: f64) -> StateVector {
    let w = angular_rate();
    let (s, c) = (w * t).sin_cos();
    StateVector::new(
        [RADIUS * c, RADIUS * s, 0.0],
        [-RADIUS * w * s, RADIUS * w * c, 0.0],
    )
}

fn circular_orbit(start: f64) -> Orbit {
    let svs = (0..28).map(|i| circular_state(i as f64 * SPACING)).collect();
    Orbit::new(start, SPACING, svs).expect("Failed to build orbit")
}

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

#[test]
fn test_passes_through_state_vectors() {
    let orbit = circular_orbit(-800.0);
    assert_eq!(orbit.time_bounds(), (-800.0, -800.0 + 27.0 * SPACING));

    for (i, expected) in orbit.state_vectors().iter().enumerate() {
        let sv = orbit.evaluate(orbit.sample_time(i));
        for k in 0..3 {
            assert_relative_eq!(sv.position[k], expected.position[k], epsilon = 1e-6, max_relative = 1e-12);
            assert_relative_eq!(sv.velocity[k], expected.velocity[k], epsilon = 1e-9, max_relative = 1e-12);
        }
    }
}

#[test]
fn test_position_derivative_matches_velocity() {
    let orbit = circular_orbit(0.0);
    let speed = RADIUS * angular_rate();

    for i in 0..orbit.len() {
        let t = orbit.sample_time(i);
        let rate = orbit.position_rate(t);
        let truth = circular_state(t).velocity;
        let err = norm([rate[0] - truth[0], rate[1] - truth[1], rate[2] - truth[2]]);
        assert!(err / speed < 1e-3, "derivative error {} m/s at sample {}", err, i);
    }
}

#[test]
fn test_between_samples() {
    let orbit = circular_orbit(0.0);
    let mut worst: f64 = 0.0;
    for i in 0..orbit.len() - 1 {
        let t = (i as f64 + 0.5) * SPACING;
        let p = orbit.position(t);
        let truth = circular_state(t).position;
        worst = worst.max(norm([p[0] - truth[0], p[1] - truth[1], p[2] - truth[2]]));
    }
    println!("Worst midpoint position error: {:.3} m", worst);
    assert!(worst < 10.0);
}

#[test]
fn test_continuity_at_knots() {
    let orbit = circular_orbit(0.0);
    for i in 1..orbit.len() - 1 {
        let t = orbit.sample_time(i);
        let before = orbit.evaluate(t - 1e-9);
        let after = orbit.evaluate(t + 1e-9);
        for k in 0..3 {
            assert_abs_diff_eq!(before.position[k], after.position[k], epsilon = 1e-4);
            assert_abs_diff_eq!(before.velocity[k], after.velocity[k], epsilon = 1e-6);
        }
    }
}

#[test]
fn test_acceleration_points_inward() {
    let orbit = circular_orbit(0.0);
    let w = angular_rate();
    let t = 13.5 * SPACING;
    let acc = orbit.acceleration(t);
    let p = circular_state(t).position;
    for k in 0..2 {
        assert_relative_eq!(acc[k], -w * w * p[k], max_relative = 1e-2, epsilon = 1e-4);
    }
}

#[test]
fn test_straight_line_is_reproduced_exactly() {
    let svs: Vec<_> = (0..6)
        .map(|i| StateVector::new([1.0e6, 2.0e6 + 100.0 * i as f64, -5.0], [0.0, 10.0, 0.0]))
        .collect();
    let orbit = Orbit::new(0.0, 10.0, svs).expect("Failed to build orbit");

    let p = orbit.position(-15.0);
    assert_relative_eq!(p[1], 2.0e6 - 150.0, max_relative = 1e-12);
    let p = orbit.position(63.0);
    assert_relative_eq!(p[1], 2.0e6 + 630.0, max_relative = 1e-12);
    assert_abs_diff_eq!(orbit.acceleration(22.0)[1], 0.0, epsilon = 1e-9);
}

#[test]
fn test_flat_layout() {
    let flat: Vec<f64> = (0..28)
        .flat_map(|i| circular_state(i as f64 * SPACING).components())
        .collect();
    let orbit = Orbit::from_flat(0.0, SPACING, &flat).expect("Failed to build orbit");
    assert_eq!(orbit.len(), 28);
    assert_eq!(orbit.state_vectors()[3], circular_state(180.0));

    assert!(matches!(
        Orbit::from_flat(0.0, SPACING, &flat[..flat.len() - 1]),
        Err(SarError::InvalidOrbit(_))
    ));
}

#[test]
fn test_invalid_orbits() {
    let three: Vec<_> = (0..3).map(|i| circular_state(i as f64 * SPACING)).collect();
    assert!(matches!(Orbit::new(0.0, SPACING, three), Err(SarError::InvalidOrbit(_))));

    let four: Vec<_> = (0..4).map(|i| circular_state(i as f64 * SPACING)).collect();
    assert!(matches!(Orbit::new(0.0, 0.0, four.clone()), Err(SarError::InvalidOrbit(_))));
    assert!(matches!(Orbit::new(f64::NAN, SPACING, four.clone()), Err(SarError::InvalidOrbit(_))));
    assert!(Orbit::new(0.0, SPACING, four).is_ok());

    let mut bad: Vec<_> = (0..5).map(|i| circular_state(i as f64 * SPACING)).collect();
    bad[2].velocity[1] = f64::INFINITY;
    assert!(matches!(Orbit::new(0.0, SPACING, bad), Err(SarError::InvalidOrbit(_))));
}
