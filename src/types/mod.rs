//! Core type definitions using newtype patterns for type safety.
//!
//! These types prevent common logic errors by making invalid states unrepresentable
//! at compile time.

mod descriptor;
mod port;
mod target;

pub use descriptor::ProbeDescriptor;
pub(crate) use descriptor::url_host;
pub use port::{Port, PortError, PortRange, PortSpec};
pub use target::{ScanTarget, TargetError};
