//! Network I/O convenience methods

use std::path::Path;

use super::core::Network;
use crate::touchstone::{DataFormat, Touchstone, TouchstoneError};

impl Network {
    /// Write the network to a Touchstone file in its retained format
    ///
    /// # Example
    /// ```ignore
    /// let ntwk = Network::from_touchstone("input.s2p")?;
    /// ntwk.clone().with_format(DataFormat::RI).write_touchstone("output.s2p")?;
    /// ```
    pub fn write_touchstone<P: AsRef<Path>>(&self, path: P) -> Result<(), TouchstoneError> {
        Touchstone::write(self, path)
    }

    /// Touchstone text in the retained format
    pub fn to_touchstone_contents(&self) -> String {
        Touchstone::to_string(self)
    }

    /// Touchstone text re-encoded as `format`
    pub fn to_touchstone_as(&self, format: DataFormat) -> String {
        Touchstone::to_string(&self.clone().with_format(format))
    }
}
