//! Touchstone reading tests against the files in tests/data

use approx::assert_relative_eq;
use num_complex::Complex64;
use snpview_core::error::ErrorKind;
use snpview_core::network::Network;
use snpview_core::touchstone::{
    DataFormat, ParameterType, ParserOptions, Touchstone, TouchstoneError, TouchstoneVersion,
    TwoPortOrder,
};
use snpview_core::FrequencyUnit;

const TEST_DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../tests/data");

fn load(name: &str) -> Network {
    let path = format!("{}/{}", TEST_DATA_DIR, name);
    Touchstone::from_file(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e))
}

fn load_err(name: &str) -> TouchstoneError {
    let path = format!("{}/{}", TEST_DATA_DIR, name);
    match Touchstone::from_file(&path) {
        Ok(_) => panic!("{} should not parse", name),
        Err(e) => e,
    }
}

fn assert_complex(actual: Complex64, expected: Complex64) {
    assert_relative_eq!(actual.re, expected.re, epsilon = 1e-9);
    assert_relative_eq!(actual.im, expected.im, epsilon = 1e-9);
}

#[test]
fn test_one_port_ma() {
    let ntwk = load("simple.s1p");
    assert_eq!(ntwk.nports(), 1);
    assert_eq!(ntwk.nfreq(), 5);
    assert_eq!(ntwk.version(), TouchstoneVersion::V1);
    assert_eq!(ntwk.format(), DataFormat::MA);
    assert_eq!(ntwk.param_type(), ParameterType::S);
    assert_eq!(ntwk.frequency().unit(), FrequencyUnit::GHz);
    assert_eq!(ntwk.comments(), &["1-port load, magnitude/angle".to_string()]);
    assert_relative_eq!(ntwk.frequency_at(0), 1e9);
    assert_relative_eq!(ntwk.frequency_at(4), 5e9);
    assert_relative_eq!(ntwk.z0()[0], 50.0);

    let s11 = ntwk.element(0, 0, 0);
    assert_relative_eq!(s11.norm(), 0.5, epsilon = 1e-12);
    assert_relative_eq!(s11.arg().to_degrees(), -10.0, epsilon = 1e-9);
    assert_eq!(ntwk.name(), "simple.s1p");
}

#[test]
fn test_two_port_db_default_order() {
    let ntwk = load("filter.s2p");
    assert_eq!(ntwk.nports(), 2);
    assert_eq!(ntwk.nfreq(), 3);
    assert_eq!(ntwk.frequency().unit(), FrequencyUnit::MHz);
    assert_relative_eq!(ntwk.frequency_at(1), 1.5e9);

    // S11 S21 S12 S22 on disk
    let s11 = ntwk.element(0, 0, 0);
    let s21 = ntwk.element(1, 0, 0);
    let s22 = ntwk.element(1, 1, 0);
    assert_relative_eq!(20.0 * s11.norm().log10(), -20.0, epsilon = 1e-9);
    assert_relative_eq!(20.0 * s21.norm().log10(), -1.0, epsilon = 1e-9);
    assert_relative_eq!(s21.arg().to_degrees(), -45.0, epsilon = 1e-9);
    assert_relative_eq!(20.0 * s22.norm().log10(), -18.0, epsilon = 1e-9);
}

#[test]
fn test_two_port_ri_and_inline_comment() {
    let ntwk = load("line_ri.s2p");
    assert_eq!(ntwk.frequency().unit(), FrequencyUnit::Hz);
    assert_complex(ntwk.element(1, 0, 0), Complex64::new(0.0, -0.9));
    assert_complex(ntwk.element(0, 1, 0), Complex64::new(0.0, -0.8));
    assert_complex(ntwk.element(1, 0, 1), Complex64::new(-0.9, 0.0));
}

#[test]
fn test_forced_two_port_order() {
    let path = format!("{}/line_ri.s2p", TEST_DATA_DIR);
    let options = ParserOptions::default().with_two_port_order(TwoPortOrder::Order12_21);
    let ntwk = Touchstone::from_file_with(&path, &options).unwrap();
    assert_complex(ntwk.element(0, 1, 0), Complex64::new(0.0, -0.9));
    assert_complex(ntwk.element(1, 0, 0), Complex64::new(0.0, -0.8));
}

#[test]
fn test_three_port_wrapped_rows() {
    let ntwk = load("coupler.s3p");
    assert_eq!(ntwk.nports(), 3);
    assert_eq!(ntwk.nfreq(), 2);
    let s13 = ntwk.element(0, 2, 0);
    assert_relative_eq!(s13.norm(), 0.7, epsilon = 1e-12);
    assert_relative_eq!(s13.arg().to_degrees().abs(), 180.0, epsilon = 1e-9);
    let s23 = ntwk.element(1, 2, 1);
    assert_relative_eq!(s23.norm(), 0.06, epsilon = 1e-12);
    assert_relative_eq!(s23.arg().to_degrees(), 40.0, epsilon = 1e-9);
}

#[test]
fn test_four_port_row_major() {
    let ntwk = load("switch.s4p");
    assert_eq!(ntwk.nports(), 4);
    for r in 0..4 {
        for c in 0..4 {
            let expected = (r + 1) as f64 * 0.1 + (c + 1) as f64 * 0.01;
            assert_complex(ntwk.element(r, c, 0), Complex64::new(expected, 0.0));
            assert_complex(ntwk.element(r, c, 1), Complex64::new(expected, 0.01));
        }
    }
    assert_eq!(ntwk.matrix_at(1).shape(), &[4, 4]);
}

#[test]
fn test_v2_one_port_db() {
    let ntwk = load("v2/one_port_db.s1p");
    assert_eq!(ntwk.version(), TouchstoneVersion::V2);
    assert_eq!(ntwk.format(), DataFormat::DB);
    assert_eq!(ntwk.nfreq(), 3);
    assert_relative_eq!(ntwk.element(0, 0, 1).norm(), 0.1, epsilon = 1e-12);
    assert_relative_eq!(ntwk.element(0, 0, 2).arg().to_degrees(), -90.0, epsilon = 1e-9);
}

#[test]
fn test_v2_two_port_order_keyword() {
    let ntwk = load("v2/two_port_12_21.s2p");
    assert_complex(ntwk.element(0, 1, 0), Complex64::new(0.2, 0.0));
    assert_complex(ntwk.element(1, 0, 0), Complex64::new(0.3, 0.0));
}

#[test]
fn test_v2_skips_information_and_broadcasts_reference() {
    let ntwk = load("v2/information_block.s2p");
    assert_eq!(ntwk.nfreq(), 2);
    assert_eq!(ntwk.z0().to_vec(), vec![75.0, 75.0]);
    assert_relative_eq!(ntwk.element(1, 0, 0).norm(), 0.9, epsilon = 1e-12);
    assert_relative_eq!(ntwk.element(0, 1, 0).norm(), 0.8, epsilon = 1e-12);
}

#[test]
fn test_v2_reference_continuation() {
    let ntwk = load("v2/reference_continuation.s3p");
    assert_eq!(ntwk.z0().to_vec(), vec![50.0, 75.0, 100.0]);
    assert_relative_eq!(ntwk.element(2, 1, 0).re, 0.8, epsilon = 1e-12);
}

#[test]
fn test_v2_lower_matrix_is_symmetric() {
    let ntwk = load("v2/lower_matrix.s3p");
    assert_eq!(ntwk.nfreq(), 2);
    assert_complex(ntwk.element(0, 1, 0), Complex64::new(0.21, 0.0));
    assert_complex(ntwk.element(1, 0, 0), Complex64::new(0.21, 0.0));
    assert_complex(ntwk.element(0, 2, 1), Complex64::new(0.31, 0.1));
    assert_complex(ntwk.element(2, 2, 1), Complex64::new(0.33, 0.1));
}

#[test]
fn test_v2_frequency_count_mismatch() {
    let err = load_err("v2/frequency_count_mismatch.s2p");
    assert!(matches!(
        err,
        TouchstoneError::FrequencyCountMismatch {
            declared: 3,
            found: 2
        }
    ));
}

#[test]
fn test_port_count_mismatch_against_extension() {
    let err = load_err("malformed/test.s2p");
    assert_eq!(err.kind(), ErrorKind::PortCountMismatch);
    assert!(matches!(
        err,
        TouchstoneError::PortCountMismatch {
            line: 3,
            declared: 2,
            found: 3
        }
    ));
}

#[test]
fn test_short_row_reports_line() {
    let err = load_err("malformed/short_row.s2p");
    assert_eq!(err.kind(), ErrorKind::MalformedRow);
    assert_eq!(err.line(), Some(4));
}

#[test]
fn test_wrapped_record_short_row_reports_line() {
    let err = load_err("malformed/wrapped_short_row.s3p");
    assert_eq!(err.kind(), ErrorKind::MalformedRow);
    assert_eq!(err.line(), Some(4));
    assert!(err.to_string().contains("matrix row 2"), "{}", err);
}

#[test]
fn test_non_monotonic_frequency() {
    let err = load_err("malformed/non_monotonic.s1p");
    assert_eq!(err.kind(), ErrorKind::NonMonotonicFrequency);
    assert_eq!(err.line(), Some(4));
}

#[test]
fn test_header_errors() {
    for (name, line) in [
        ("malformed/missing_option.s1p", 2),
        ("malformed/bad_format.s1p", 1),
        ("malformed/negative_reference.s1p", 1),
    ] {
        let err = load_err(name);
        assert_eq!(err.kind(), ErrorKind::MalformedHeader, "{}", name);
        assert_eq!(err.line(), Some(line), "{}", name);
    }
}

#[test]
fn test_non_numeric_token() {
    let err = load_err("malformed/bad_token.s1p");
    assert_eq!(err.kind(), ErrorKind::MalformedRow);
    assert_eq!(err.line(), Some(3));
}

#[test]
fn test_empty_dataset() {
    let err = load_err("malformed/comments_only.s1p");
    assert_eq!(err.kind(), ErrorKind::EmptyDataset);
    assert!(err.line().is_none());

    let err = Touchstone::from_bytes(b"# GHz S MA R 50\n", 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyDataset);
}

#[test]
fn test_unknown_extension_and_missing_file() {
    assert!(matches!(
        Touchstone::from_file("notes.txt"),
        Err(TouchstoneError::InvalidExtension)
    ));
    let err = Touchstone::from_file(format!("{}/absent.s1p", TEST_DATA_DIR)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_network_is_shareable() {
    let ntwk = std::sync::Arc::new(load("filter.s2p"));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ntwk = std::sync::Arc::clone(&ntwk);
            std::thread::spawn(move || ntwk.element(1, 0, 2).norm())
        })
        .collect();
    for h in handles {
        assert_relative_eq!(h.join().unwrap(), 10f64.powf(-3.0 / 20.0), epsilon = 1e-12);
    }
}

/// Walk tests/data: good files parse, malformed ones fail cleanly
#[test]
fn test_read_all_files_in_data_dir() {
    fn visit(dir: &std::path::Path, seen: &mut usize) {
        for entry in std::fs::read_dir(dir).expect("Failed to read directory") {
            let path = entry.expect("Failed to read directory entry").path();
            if path.is_dir() {
                visit(&path, seen);
                continue;
            }
            let malformed = path.components().any(|c| c.as_os_str() == "malformed")
                || path.ends_with("frequency_count_mismatch.s2p");
            let result = Touchstone::from_file(&path);
            assert_eq!(result.is_err(), malformed, "{}", path.display());
            *seen += 1;
        }
    }

    let mut seen = 0;
    visit(std::path::Path::new(TEST_DATA_DIR), &mut seen);
    assert!(seen >= 19);
}
