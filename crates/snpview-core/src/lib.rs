//! snpview-core: Touchstone network data for viewers and checkers
//!
//! Reads Touchstone v1/v2 files into immutable [`Network`] values and derives
//! plottable traces from them.
//!
//! ## Modules
//!
//! - `numeric` - Engineering-notation input parsing
//! - `frequency` - Frequency axis and units
//! - `touchstone` - Touchstone file reading and writing
//! - `network` - N-port network data, derived series and phase analysis
//! - `limits` - Pass/fail limit lines and their records
//! - `loader` - Parallel batch loading
//! - `math` - Complex conversions and interpolation

pub mod constants;
pub mod error;
pub mod frequency;
pub mod limits;
pub mod loader;
pub mod math;
pub mod network;
pub mod numeric;
pub mod touchstone;

pub use error::ErrorKind;
pub use frequency::{Frequency, FrequencyUnit};
pub use network::{Network, PortPair};
pub use touchstone::Touchstone;

/// Common imports
pub mod prelude {
    pub use crate::error::ErrorKind;
    pub use crate::frequency::{format_frequency, Frequency, FrequencyUnit};
    pub use crate::limits::{
        check, evaluate, BandSense, FailSide, LimitKind, LimitLine, LimitReport, StyleDefaults,
        Violation,
    };
    pub use crate::loader::{load_files, load_folder, LoadOutcome, LoaderConfig};
    pub use crate::network::{
        AngleUnit, DerivedError, MagnitudeScale, Network, PortPair, Quantity, Sample, Series,
    };
    pub use crate::numeric::parse_numeric_input;
    pub use crate::touchstone::{DataFormat, ParameterType, ParserOptions, Touchstone};
}
