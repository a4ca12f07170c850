//! Write-then-read round trips
//!
//! Every readable fixture is written in each data format and read back; the
//! matrices must agree to 1e-9 relative.

use num_complex::Complex64;
use snpview_core::network::Network;
use snpview_core::touchstone::{DataFormat, Touchstone, TouchstoneVersion};

const TEST_DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../tests/data");

const FIXTURES: &[&str] = &[
    "simple.s1p",
    "filter.s2p",
    "line_ri.s2p",
    "coupler.s3p",
    "switch.s4p",
    "v2/one_port_db.s1p",
    "v2/two_port_12_21.s2p",
    "v2/information_block.s2p",
    "v2/reference_continuation.s3p",
    "v2/lower_matrix.s3p",
];

fn close(a: Complex64, b: Complex64) -> bool {
    let scale = a.norm().max(b.norm()).max(1e-300);
    (a - b).norm() <= 1e-9 * scale
}

fn assert_equivalent(original: &Network, reread: &Network, label: &str) {
    assert_eq!(original.nports(), reread.nports(), "{}", label);
    assert_eq!(original.nfreq(), reread.nfreq(), "{}", label);
    for (f0, f1) in original.frequency().f().iter().zip(reread.frequency().f()) {
        assert!((f0 - f1).abs() <= 1e-9 * f0.abs().max(1.0), "{}: {} vs {}", label, f0, f1);
    }
    for (idx, (a, b)) in original.data().iter().zip(reread.data().iter()).enumerate() {
        assert!(close(*a, *b), "{} value {}: {} vs {}", label, idx, a, b);
    }
    assert_eq!(original.z0(), reread.z0(), "{}", label);
}

#[test]
fn test_round_trip_every_fixture_and_format() {
    for name in FIXTURES {
        let path = format!("{}/{}", TEST_DATA_DIR, name);
        let original = Touchstone::from_file(&path).unwrap();

        for format in [DataFormat::MA, DataFormat::DB, DataFormat::RI] {
            let text = original.to_touchstone_as(format);
            let reread = Touchstone::from_bytes(text.as_bytes(), original.nports())
                .unwrap_or_else(|e| panic!("{} as {:?}: {}\n{}", name, format, e, text));
            assert_eq!(reread.format(), format);
            assert_eq!(reread.version(), original.version());
            assert_eq!(reread.frequency().unit(), original.frequency().unit());
            assert_equivalent(&original, &reread, &format!("{} as {:?}", name, format));
        }
    }
}

#[test]
fn test_round_trip_through_file() {
    let original = Touchstone::from_file(format!("{}/coupler.s3p", TEST_DATA_DIR)).unwrap();
    let out = std::env::temp_dir().join(format!("snpview_roundtrip_{}.s3p", std::process::id()));
    original.write_touchstone(&out).unwrap();
    let reread = Touchstone::from_file(&out).unwrap();
    std::fs::remove_file(&out).unwrap();

    assert_equivalent(&original, &reread, "coupler.s3p");
    assert_eq!(reread.comments(), original.comments());
}

#[test]
fn test_v2_output_keeps_per_port_reference() {
    let path = format!("{}/v2/reference_continuation.s3p", TEST_DATA_DIR);
    let original = Touchstone::from_file(&path).unwrap();
    assert_eq!(original.version(), TouchstoneVersion::V2);

    let text = original.to_touchstone_contents();
    assert!(text.contains("[Reference] 50 75 100"));
    assert!(text.contains("[Number of Frequencies] 1"));
    assert!(text.trim_end().ends_with("[End]"));
}

#[test]
fn test_synthetic_dense_round_trip() {
    // 201 points, awkward magnitudes and phases
    let mut content = String::from("# GHZ S RI R 50\n");
    for i in 0..201 {
        let f = 0.01 + i as f64 * 0.0497;
        let a = (i as f64 * 0.37).sin() * 0.9;
        let b = (i as f64 * 0.11).cos() * 1e-4;
        content.push_str(&format!(
            "{} {} {} {} {} {} {} {} {}\n",
            f, a, b, b, a, -a, b, 1e-6 * a, 0.5
        ));
    }
    let original = Touchstone::from_bytes(content.as_bytes(), 2).unwrap();
    for format in [DataFormat::MA, DataFormat::DB, DataFormat::RI] {
        let text = original.to_touchstone_as(format);
        let reread = Touchstone::from_bytes(text.as_bytes(), 2).unwrap();
        assert_equivalent(&original, &reread, &format!("synthetic as {:?}", format));
    }
}
