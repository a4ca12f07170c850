//! Derived series over parsed networks

use approx::assert_relative_eq;
use snpview_core::network::{
    admittance_to_gamma, gamma_to_impedance, phase_difference, AngleUnit, DerivedError, MagnitudeScale, Network,
    PortPair, Quantity,
};
use snpview_core::touchstone::Touchstone;
use snpview_core::ErrorKind;
use std::f64::consts::PI;

const TEST_DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../tests/data");

const S11: PortPair = PortPair { row: 0, col: 0 };
const S21: PortPair = PortPair { row: 1, col: 0 };

fn load(name: &str) -> Network {
    Touchstone::from_file(format!("{}/{}", TEST_DATA_DIR, name)).unwrap()
}

/// 1-port file with unit magnitude and the given phase (degrees) per point
fn one_port(points: &[(f64, f64)]) -> Network {
    let mut content = String::from("# Hz S MA R 50\n");
    for (f, deg) in points {
        content.push_str(&format!("{} 1.0 {}\n", f, deg));
    }
    Touchstone::from_bytes(content.as_bytes(), 1).unwrap()
}

#[test]
fn test_db_series_matches_file() {
    let ntwk = load("filter.s2p");
    let db: Vec<f64> = ntwk
        .series(S21, Quantity::Magnitude(MagnitudeScale::Db), None)
        .unwrap()
        .iter()
        .map(|s| s.value)
        .collect();
    assert_eq!(db.len(), 3);
    assert_relative_eq!(db[0], -1.0, epsilon = 1e-9);
    assert_relative_eq!(db[1], -0.5, epsilon = 1e-9);
    assert_relative_eq!(db[2], -3.0, epsilon = 1e-9);
}

#[test]
fn test_phase_degrees_and_range() {
    let ntwk = load("simple.s1p");
    let quantity = Quantity::Phase {
        unit: AngleUnit::Degrees,
        unwrap: false,
    };
    let series = ntwk.series(S11, quantity, Some((1.5e9, 4e9))).unwrap();
    let samples = series.to_vec();
    let freqs: Vec<f64> = samples.iter().map(|s| s.frequency).collect();
    assert_eq!(freqs, vec![2e9, 3e9, 4e9]);
    assert_relative_eq!(samples[0].value, -20.0, epsilon = 1e-9);
    assert_relative_eq!(samples[2].value, -40.0, epsilon = 1e-9);
}

#[test]
fn test_unwrap_across_180() {
    let ntwk = one_port(&[(1e9, 170.0), (2e9, 179.0), (3e9, -179.0), (4e9, -170.0)]);
    let unwrapped: Vec<f64> = ntwk
        .series(
            S11,
            Quantity::Phase {
                unit: AngleUnit::Degrees,
                unwrap: true,
            },
            None,
        )
        .unwrap()
        .iter()
        .map(|s| s.value)
        .collect();
    for w in unwrapped.windows(2) {
        assert!((w[1] - w[0]).abs() <= 180.0, "jump {} -> {}", w[0], w[1]);
    }
    assert_relative_eq!(unwrapped[2], 181.0, epsilon = 1e-9);
    assert_relative_eq!(unwrapped[3], 190.0, epsilon = 1e-9);
}

#[test]
fn test_group_delay_linear_phase() {
    // phase = -k f (radians), k = 2π * 1 ns
    let k = 2.0 * PI * 1e-9;
    let points: Vec<(f64, f64)> = (0..101)
        .map(|i| {
            let f = 1e9 + i as f64 * 2e7;
            (f, (-k * f).to_degrees())
        })
        .collect();
    let ntwk = one_port(&points);

    let delay = ntwk.series(S11, Quantity::GroupDelay, None).unwrap();
    assert_eq!(delay.len(), 101);
    let expected = k / (2.0 * PI);
    for s in delay.iter().skip(1).take(99) {
        assert_relative_eq!(s.value, expected, max_relative = 0.01);
    }
}

#[test]
fn test_group_delay_needs_three_points() {
    let ntwk = one_port(&[(1e9, 0.0), (2e9, -10.0)]);
    let err = ntwk.series(S11, Quantity::GroupDelay, None).unwrap_err();
    assert_eq!(
        err,
        DerivedError::InsufficientSamples {
            required: 3,
            available: 2
        }
    );
    assert_eq!(err.kind(), ErrorKind::InsufficientSamples);

    // Enough points overall, too few inside the window
    let ntwk = load("simple.s1p");
    assert!(ntwk
        .series(S11, Quantity::GroupDelay, Some((1e9, 2e9)))
        .is_err());
    assert!(ntwk.series(S11, Quantity::GroupDelay, Some((1e9, 3e9))).is_ok());
}

#[test]
fn test_series_restarts() {
    let ntwk = load("coupler.s3p");
    let series = ntwk
        .series(
            PortPair::new(2, 0),
            Quantity::Phase {
                unit: AngleUnit::Radians,
                unwrap: true,
            },
            None,
        )
        .unwrap();
    let first: Vec<f64> = series.iter().map(|s| s.value).collect();
    let second: Vec<f64> = (&series).into_iter().map(|s| s.value).collect();
    assert_eq!(first, second);
}

#[test]
fn test_non_s_parameters_rejected() {
    let ntwk = Touchstone::from_bytes(b"# GHz Z RI R 50\n1 10 5\n2 11 6\n3 12 7\n", 1).unwrap();
    let err = ntwk
        .series(S11, Quantity::Magnitude(MagnitudeScale::Linear), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedParameterKind);
    assert!(ntwk.reflection(S11, None).is_err());
}

#[test]
fn test_reflection_and_impedance() {
    let ntwk = load("filter.s2p");
    let gamma = ntwk.reflection(S11, None).unwrap();
    assert_eq!(gamma.len(), 3);
    let first = gamma.iter().next().unwrap();
    assert_relative_eq!(first.gamma.norm(), 0.1, epsilon = 1e-12);

    let z = gamma_to_impedance(first.gamma).unwrap();
    let back = (z - 1.0) / (z + 1.0);
    assert_relative_eq!(back.re, first.gamma.re, epsilon = 1e-12);
    assert_relative_eq!(back.im, first.gamma.im, epsilon = 1e-12);

    assert!(matches!(
        ntwk.reflection(S21, None),
        Err(DerivedError::NotReflection(_))
    ));
    assert!(matches!(
        ntwk.series(
            PortPair::new(2, 2),
            Quantity::Magnitude(MagnitudeScale::Db),
            None
        ),
        Err(DerivedError::PortOutOfRange { .. })
    ));
}

#[test]
fn test_reflection_admittance() {
    let ntwk = load("simple.s1p");
    let gamma = ntwk.reflection(S11, None).unwrap();
    let admittances: Vec<_> = gamma.admittances().collect();
    assert_eq!(admittances.len(), ntwk.nfreq());
    for ((f, y), (fz, z)) in admittances.iter().zip(gamma.impedances()) {
        assert_eq!(*f, fz);
        let (y, z) = (y.unwrap(), z.unwrap());
        assert_relative_eq!((y * z).re, 1.0, epsilon = 1e-9);
    }
    let first = gamma.iter().next().unwrap();
    let back = admittance_to_gamma(admittances[0].1.unwrap()).unwrap();
    assert_relative_eq!(back.re, first.gamma.re, epsilon = 1e-12);
    assert_relative_eq!(back.im, first.gamma.im, epsilon = 1e-12);
}

#[test]
fn test_linear_phase_fit_on_file() {
    let points: Vec<(f64, f64)> = (0..30)
        .map(|i| {
            let f = 1e9 + i as f64 * 1e8;
            (f, -50.0 * f / 1e9 + 20.0)
        })
        .collect();
    let ntwk = one_port(&points);
    let fit = ntwk.linear_phase_fit(S11, None).unwrap();
    assert_relative_eq!(fit.slope * 1e9, -50.0, epsilon = 1e-6);
    assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-9);
    assert!(fit.stats.rms < 1e-6);
}

#[test]
fn test_phase_difference_between_files() {
    let a = one_port(&[(1e9, 0.0), (2e9, -60.0), (3e9, -120.0)]);
    let b = one_port(&[(1e9, 10.0), (3e9, -110.0)]);
    let diff = phase_difference(&a, &b, S11, None, true).unwrap();
    assert_eq!(diff.len(), 3);
    for s in &diff {
        assert_relative_eq!(s.value, 10.0, epsilon = 1e-9);
    }
}
