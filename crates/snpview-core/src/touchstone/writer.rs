//! Touchstone file writer
//!
//! Serialises a [`Network`] back to Touchstone text using the unit,
//! parameter kind, data format and version it was parsed with. Values are
//! written with enough significant digits that reading the output back
//! reproduces the data to within 1e-9 relative.

use num_complex::Complex64;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::parser::{DataFormat, TouchstoneError, TouchstoneVersion};
use crate::constants::{PAIRS_PER_LINE, WRITE_PRECISION};
use crate::math::{reim_2_dbdeg, reim_2_magdeg};
use crate::network::Network;

/// 2-port records are written S11 S21 S12 S22
const TWO_PORT_ORDER: [(usize, usize); 4] = [(0, 0), (1, 0), (0, 1), (1, 1)];

/// Write a network to a file
pub fn write_file<P: AsRef<Path>>(network: &Network, path: P) -> Result<(), TouchstoneError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_network(network, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a network to any writer
pub fn write_network<W: Write>(network: &Network, writer: &mut W) -> Result<(), TouchstoneError> {
    writer.write_all(network_to_string(network).as_bytes())?;
    Ok(())
}

/// Render a network as Touchstone text
pub fn network_to_string(network: &Network) -> String {
    let mut out = String::new();

    for comment in network.comments() {
        push_line(&mut out, &format!("! {}", comment));
    }

    let z0 = network.z0();
    let option_line = format!(
        "# {} {} {} R {}",
        network.frequency().unit().touchstone_token(),
        network.param_type().token(),
        network.format().token(),
        z0[0]
    );

    let nports = network.nports();
    match network.version() {
        TouchstoneVersion::V1 => {
            if z0.iter().any(|&z| z != z0[0]) {
                tracing::warn!(
                    "Touchstone v1 cannot carry per-port impedances; writing R {}",
                    z0[0]
                );
            }
            push_line(&mut out, &option_line);
            write_records(&mut out, network);
        }
        TouchstoneVersion::V2 => {
            push_line(&mut out, "[Version] 2.0");
            push_line(&mut out, &option_line);
            push_line(&mut out, &format!("[Number of Ports] {}", nports));
            if nports == 2 {
                push_line(&mut out, "[Two-Port Data Order] 21_12");
            }
            push_line(&mut out, &format!("[Number of Frequencies] {}", network.nfreq()));
            let reference: Vec<String> = z0.iter().map(|z| z.to_string()).collect();
            push_line(&mut out, &format!("[Reference] {}", reference.join(" ")));
            push_line(&mut out, "[Network Data]");
            write_records(&mut out, network);
            push_line(&mut out, "[End]");
        }
    }

    out
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

fn write_records(out: &mut String, network: &Network) {
    let nports = network.nports();
    let format = network.format();
    let f_scaled = network.frequency().f_scaled();

    for (idx, freq) in f_scaled.iter().enumerate() {
        let matrix = network.matrix_at(idx);
        out.push_str(&format_real(*freq));

        if nports <= 2 {
            let entries: Vec<Complex64> = if nports == 2 {
                TWO_PORT_ORDER.iter().map(|&(i, j)| matrix[[i, j]]).collect()
            } else {
                vec![matrix[[0, 0]]]
            };
            for c in entries {
                push_pair(out, format, c);
            }
            out.push('\n');
            continue;
        }

        // Each matrix row starts a new line, wrapped at PAIRS_PER_LINE
        for (row_idx, row) in matrix.outer_iter().enumerate() {
            let row = row.to_vec();
            for (chunk_idx, chunk) in row.chunks(PAIRS_PER_LINE).enumerate() {
                if row_idx > 0 || chunk_idx > 0 {
                    out.push('\n');
                    out.push_str(&" ".repeat(19));
                }
                for &c in chunk {
                    push_pair(out, format, c);
                }
            }
        }
        out.push('\n');
    }
}

fn push_pair(out: &mut String, format: DataFormat, c: Complex64) {
    let (v1, v2) = match format {
        DataFormat::RI => (c.re, c.im),
        DataFormat::MA => reim_2_magdeg(c),
        DataFormat::DB => reim_2_dbdeg(c),
    };
    out.push(' ');
    out.push_str(&format_real(v1));
    out.push(' ');
    out.push_str(&format_real(v2));
}

fn format_real(v: f64) -> String {
    format!("{:>19.*e}", WRITE_PRECISION - 1, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::touchstone::parser::parse;

    #[test]
    fn test_format_real_precision() {
        let s = format_real(0.123456789012345);
        assert_eq!(s.trim(), "1.23456789012e-1");
        let back: f64 = s.trim().parse().unwrap();
        assert!((back - 0.123456789012345).abs() < 1e-12);
    }

    #[test]
    fn test_one_port_v1_output() {
        let content = b"! sweep\n# MHz S RI R 75\n100 0.5 -0.25\n200 0.4 0.1\n";
        let ntwk = parse(content, 1).unwrap();
        let text = network_to_string(&ntwk);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("! sweep"));
        assert_eq!(lines.next(), Some("# MHZ S RI R 75"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_v2_header_output() {
        let content = b"[Version] 2.0\n# GHz S MA R 50\n[Number of Ports] 2\n[Reference] 50 75\n[Network Data]\n1 0.1 0 0.9 0 0.9 0 0.1 0\n[End]\n";
        let ntwk = parse(content, 2).unwrap();
        let text = network_to_string(&ntwk);
        assert!(text.contains("[Number of Ports] 2"));
        assert!(text.contains("[Two-Port Data Order] 21_12"));
        assert!(text.contains("[Number of Frequencies] 1"));
        assert!(text.contains("[Reference] 50 75"));
        assert!(text.trim_end().ends_with("[End]"));
    }

    #[test]
    fn test_multiport_wraps_rows() {
        let mut content = String::from("# Hz S RI\n1");
        for k in 0..25 {
            content.push_str(&format!(" {} 0", k));
        }
        content.push('\n');
        let ntwk = parse(content.as_bytes(), 5).unwrap();
        let text = network_to_string(&ntwk);
        // 5 rows of 5 pairs: 4 + 1 per row
        assert_eq!(text.lines().filter(|l| !l.starts_with('#')).count(), 10);
    }
}
