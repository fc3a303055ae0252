use approx::{assert_abs_diff_eq, assert_relative_eq};
use sarloc::core::range_doppler::doppler_residual;
use sarloc::{Orbit, RangeDopplerSolver, SarError, SolverConfig, SolverMethod, StateVector, WGS84};

const GM: f64 = 3.986004418e14;

/// Polar circular orbit at 700 km altitude, 28 samples 10 s apart centred on t = 0
fn polar_orbit() -> (Orbit, f64, f64) {
    let r = WGS84.semi_major_axis() + 700.0e3;
    let w = (GM / r.powi(3)).sqrt();
    let svs = (0..28)
        .map(|i| {
            let t = (i as f64 - 14.0) * 10.0;
            let (s, c) = (w * t).sin_cos();
            StateVector::new([r * c, 0.0, r * s], [-r * w * s, 0.0, r * w * c])
        })
        .collect();
    (Orbit::new(-140.0, 10.0, svs).expect("Failed to build orbit"), r, w)
}

#[test]
fn test_target_under_track() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (orbit, r, w) = polar_orbit();

    // 100 km across-track from the sub-satellite point at t = 42 s; for a
    // circular orbit the zero-Doppler plane contains the orbit normal
    let theta = w * 42.0;
    let rho = 6.37e6;
    let target = [rho * theta.cos(), 100.0e3, rho * theta.sin()];

    let rc = RangeDopplerSolver::default()
        .solve(&target, &orbit, None)
        .expect("Solver failed");

    assert_abs_diff_eq!(doppler_residual(&target, &orbit, rc.azimuth_time), 0.0, epsilon = 1e-3);
    let p = orbit.position(rc.azimuth_time);
    let d = [target[0] - p[0], target[1] - p[1], target[2] - p[2]];
    assert_relative_eq!(rc.slant_range, (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt(), max_relative = 1e-12);
    assert_abs_diff_eq!(rc.azimuth_time, 42.0, epsilon = 1e-5);
    let expected = ((r - rho).powi(2) + 100.0e3_f64.powi(2)).sqrt();
    assert_relative_eq!(rc.slant_range, expected, max_relative = 1e-6);
    println!("t* = {:.6} s, R = {:.3} m in {} iterations", rc.azimuth_time, rc.slant_range, rc.iterations);
}

#[test]
fn test_methods_agree() {
    let (orbit, _, _) = polar_orbit();
    let target = WGS84.geodetic_degrees_to_ecef(1.2, -3.0, 850.0);

    let newton = RangeDopplerSolver::default()
        .solve(&target, &orbit, None)
        .expect("Newton failed");
    let bisection = RangeDopplerSolver::new(SolverConfig {
        method: SolverMethod::Bisection,
        max_iterations: 200,
        ..SolverConfig::default()
    })
    .solve(&target, &orbit, None)
    .expect("Bisection failed");

    assert_abs_diff_eq!(newton.azimuth_time, bisection.azimuth_time, epsilon = 1e-6);
    assert_abs_diff_eq!(newton.slant_range, bisection.slant_range, epsilon = 1e-2);
    assert!(newton.iterations < bisection.iterations);
}

#[test]
fn test_seed_from_previous_solution() {
    let (orbit, _, _) = polar_orbit();
    let solver = RangeDopplerSolver::default();
    let first = WGS84.geodetic_degrees_to_ecef(0.9, 2.0, 0.0);
    let second = WGS84.geodetic_degrees_to_ecef(0.9, 2.0005, 0.0);

    let cold = solver.solve(&second, &orbit, None).expect("Solver failed");
    let seed = solver.solve(&first, &orbit, None).expect("Solver failed").azimuth_time;
    let warm = solver.solve(&second, &orbit, Some(seed)).expect("Solver failed");

    assert_abs_diff_eq!(warm.azimuth_time, cold.azimuth_time, epsilon = 1e-7);
    assert!(warm.iterations <= cold.iterations);

    let exact = solver.solve(&second, &orbit, Some(cold.azimuth_time)).expect("Solver failed");
    assert_eq!(exact.iterations, 1);
}

#[test]
fn test_target_outside_orbit_span() {
    let (orbit, _, _) = polar_orbit();
    // well north of the last state vector: the zero-Doppler time lies beyond the span
    let target = WGS84.geodetic_degrees_to_ecef(0.0, 20.0, 0.0);

    for method in [SolverMethod::Newton, SolverMethod::Bisection] {
        let solver = RangeDopplerSolver::new(SolverConfig {
            method,
            ..SolverConfig::default()
        });
        let err = solver.solve(&target, &orbit, None).unwrap_err();
        match err {
            SarError::RootFinding { iterations, .. } => assert!(iterations <= 50),
            other => panic!("unexpected error {:?}", other),
        }
    }
}

#[test]
fn test_non_finite_seed() {
    let (orbit, _, _) = polar_orbit();
    let target = WGS84.geodetic_degrees_to_ecef(0.0, 0.0, 0.0);
    let result = RangeDopplerSolver::default().solve(&target, &orbit, Some(f64::NAN));
    assert!(matches!(result, Err(SarError::RootFinding { iterations: 0, .. })));
}
