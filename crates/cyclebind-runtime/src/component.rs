#![forbid(unsafe_code)]

//! The contract every reactive component implements.

use crate::ports::{Sinks, Sources};
use crate::registry::DriverRegistry;

/// A component whose behavior is a function from sources to sinks.
///
/// `cycle` runs once per mount, after every declared driver has been created.
/// It should only build stream pipelines; side effects belong in sinks.
pub trait Component: 'static {
    /// The driver declarations shared by every instance of this type.
    fn registry(&self) -> &'static DriverRegistry;

    /// Build the sinks for one mount.
    fn cycle(&self, sources: &Sources) -> Sinks;
}
