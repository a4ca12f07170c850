//! snpview command-line interface.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use snpview_core::limits::{check, limits_from_json};
use snpview_core::loader::{load_files, LoaderConfig};
use snpview_core::network::{AngleUnit, MagnitudeScale, Network, PortPair, Quantity, Sample};
use snpview_core::numeric::parse_numeric_input;
use snpview_core::prelude::format_frequency;
use snpview_core::touchstone::{DataFormat, Touchstone};

#[derive(Parser)]
#[command(name = "snpview")]
#[command(about = "Inspect, trace and limit-check Touchstone files", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarise one or more Touchstone files
    Info {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },
    /// Print a derived trace as frequency/value rows
    Trace {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[command(flatten)]
        trace: TraceArgs,
    },
    /// Evaluate a trace against saved limit lines
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[command(flatten)]
        trace: TraceArgs,
        /// JSON array of limit records
        #[arg(long, value_name = "LIMITS")]
        limits: PathBuf,
    },
    /// Re-encode a file in another data format
    Convert {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, value_enum)]
        format: FormatArg,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct TraceArgs {
    /// Matrix element as 1-based "row,col", e.g. 2,1
    #[arg(short, long, default_value = "1,1")]
    element: String,

    #[arg(short, long, value_enum, default_value = "db")]
    quantity: QuantityArg,

    /// Phase in degrees instead of radians
    #[arg(long)]
    degrees: bool,

    /// Smith traces: normalised admittance instead of impedance
    #[arg(long)]
    admittance: bool,

    /// Lower frequency bound, e.g. 1GHz
    #[arg(long)]
    start: Option<String>,

    /// Upper frequency bound, e.g. 6GHz
    #[arg(long)]
    stop: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum QuantityArg {
    Mag,
    Db,
    Phase,
    UnwrappedPhase,
    GroupDelay,
    Smith,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Ma,
    Db,
    Ri,
}

impl From<FormatArg> for DataFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Ma => DataFormat::MA,
            FormatArg::Db => DataFormat::DB,
            FormatArg::Ri => DataFormat::RI,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Info { files } => info(&files),
        Command::Trace { file, trace } => {
            let network = load(&file)?;
            if let QuantityArg::Smith = trace.quantity {
                let pair = parse_element(&trace.element)?;
                let range = parse_range(&trace, &network)?;
                let reflection = network.reflection(pair, range)?;
                let normalised: Vec<_> = if trace.admittance {
                    reflection.admittances().collect()
                } else {
                    reflection.impedances().collect()
                };
                // frequency, Γ re, Γ im, z (or y) re, im
                for (s, (_, point)) in reflection.iter().zip(normalised) {
                    match point {
                        Some(p) => println!(
                            "{}\t{}\t{}\t{}\t{}",
                            s.frequency, s.gamma.re, s.gamma.im, p.re, p.im
                        ),
                        None => println!(
                            "{}\t{}\t{}\tinf\tinf",
                            s.frequency, s.gamma.re, s.gamma.im
                        ),
                    }
                }
                return Ok(ExitCode::SUCCESS);
            }
            for sample in trace_samples(&network, &trace)? {
                println!("{}\t{}", sample.frequency, sample.value);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Check {
            file,
            trace,
            limits,
        } => check_limits(&file, &trace, &limits),
        Command::Convert {
            file,
            format,
            output,
        } => {
            let network = load(&file)?;
            let contents = network.to_touchstone_as(format.into());
            match output {
                Some(path) => fs::write(&path, contents)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => print!("{}", contents),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load(path: &Path) -> Result<Network> {
    Touchstone::from_file(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn info(files: &[PathBuf]) -> Result<ExitCode> {
    let mut failed = false;
    for outcome in load_files(files, &LoaderConfig::default()) {
        match &outcome.result {
            Ok(ntwk) => {
                let (lo, hi) = ntwk.frequency_range();
                println!(
                    "{}: {}-port {}-parameters, {} points, {} to {} (span {}), {} format, {:?}",
                    outcome.path.display(),
                    ntwk.nports(),
                    ntwk.param_type().token(),
                    ntwk.nfreq(),
                    format_frequency(lo),
                    format_frequency(hi),
                    format_frequency(ntwk.frequency().span()),
                    ntwk.format().token(),
                    ntwk.version(),
                );
            }
            Err(e) => {
                failed = true;
                match e.line() {
                    Some(line) => eprintln!(
                        "{}: {:?} at line {}: {}",
                        outcome.path.display(),
                        e.kind(),
                        line,
                        e
                    ),
                    None => eprintln!("{}: {:?}: {}", outcome.path.display(), e.kind(), e),
                }
            }
        }
    }
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn check_limits(file: &Path, trace: &TraceArgs, limits: &Path) -> Result<ExitCode> {
    let network = load(file)?;
    let text = fs::read_to_string(limits)
        .with_context(|| format!("Failed to read limits {}", limits.display()))?;
    let json: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Invalid JSON in {}", limits.display()))?;
    let limits = limits_from_json(&json).context("Invalid limit record")?;

    let samples = trace_samples(&network, trace)?;
    let report = check(&samples, &limits);
    for v in report.violations() {
        println!(
            "FAIL {}\t{}\t{}",
            v.limit_id,
            format_frequency(v.frequency),
            v.value
        );
    }
    for (id, count) in report.counts() {
        println!("{}: {} violation(s)", id, count);
    }
    println!(
        "{}: {} samples, {}",
        network.name(),
        report.samples(),
        if report.passed() { "PASS" } else { "FAIL" }
    );
    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// 1-based "row,col" to a 0-based element
fn parse_element(text: &str) -> Result<PortPair> {
    let (row, col) = text
        .split_once(',')
        .ok_or_else(|| anyhow!("element '{}' must look like 'row,col'", text))?;
    let row: usize = row.trim().parse().context("invalid element row")?;
    let col: usize = col.trim().parse().context("invalid element column")?;
    if row == 0 || col == 0 {
        bail!("element indices are 1-based");
    }
    Ok(PortPair::new(row - 1, col - 1))
}

fn parse_range(trace: &TraceArgs, network: &Network) -> Result<Option<(f64, f64)>> {
    if trace.start.is_none() && trace.stop.is_none() {
        return Ok(None);
    }
    let (lo, hi) = network.frequency_range();
    let start = match &trace.start {
        Some(s) => parse_numeric_input(s).context("invalid --start")?,
        None => lo,
    };
    let stop = match &trace.stop {
        Some(s) => parse_numeric_input(s).context("invalid --stop")?,
        None => hi,
    };
    Ok(Some((start, stop)))
}

fn trace_samples(network: &Network, trace: &TraceArgs) -> Result<Vec<Sample>> {
    let pair = parse_element(&trace.element)?;
    let range = parse_range(trace, network)?;
    let unit = if trace.degrees {
        AngleUnit::Degrees
    } else {
        AngleUnit::Radians
    };

    let quantity = match trace.quantity {
        QuantityArg::Mag => Quantity::Magnitude(MagnitudeScale::Linear),
        QuantityArg::Db => Quantity::Magnitude(MagnitudeScale::Db),
        QuantityArg::Phase => Quantity::Phase {
            unit,
            unwrap: false,
        },
        QuantityArg::UnwrappedPhase => Quantity::Phase { unit, unwrap: true },
        QuantityArg::GroupDelay => Quantity::GroupDelay,
        QuantityArg::Smith => bail!("smith traces are complex; use `trace` to print them"),
    };
    Ok(network.series(pair, quantity, range)?.to_vec())
}
