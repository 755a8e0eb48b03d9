//! # armgpuinfo - Arm GPU configuration via the kbase driver
//!
//! A lightweight Rust library for querying the configuration of Arm Mali and
//! Immortalis GPUs on Linux and Android, by talking to the kbase kernel
//! driver through its ioctl interface.
//!
//! ## Features
//!
//! - **Both kbase interface generations**: pre-r21 and r21+ (JM and CSF)
//! - **Model database** covering Midgard through Arm 5th Gen
//! - **Per-core and per-GPU throughput**: FMAs, texels and pixels per cycle
//! - **Serde support** for the resulting record
//! - **No root required**: works in normal user-space
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gpu_info = armgpuinfo::get_gpu_info()?;
//!     println!("GPU: {} ({})", gpu_info.gpu_name, gpu_info.architecture);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod api;
pub mod device;
pub mod error;
pub mod mappings;
pub mod props;
pub mod protocol;

// Re-export main API for easy access
pub use api::{get_gpu_info, get_gpu_info_with_device, CapabilityRecord, Instance};
pub use device::{find_gpu_device, find_gpu_devices, DeviceConfig, KbaseChannel, MaliDevice};
pub use error::{DecodeError, GpuInfoError, Result};
pub use mappings::{ModelDatabase, ModelDescriptor, ModelMetrics};
pub use protocol::DriverDialect;

use std::path::PathBuf;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Scan for kbase device nodes on the system
///
/// # Example
///
/// ```no_run
/// for device in armgpuinfo::scan_devices() {
///     println!("Found GPU device: {}", device.display());
/// }
/// ```
pub fn scan_devices() -> Vec<PathBuf> {
    device::find_gpu_devices()
}

/// Run a quick compatibility check
///
/// Returns `true` if the system has at least one `/dev/mali<N>` node. The
/// driver is not queried.
///
/// # Example
///
/// ```no_run
/// if armgpuinfo::is_supported() {
///     println!("System has a Mali device node");
/// }
/// ```
pub fn is_supported() -> bool {
    !scan_devices().is_empty()
}

/// Get library information
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_is_supported_matches_scan() {
        assert_eq!(is_supported(), !scan_devices().is_empty());
    }
}

/// Prelude module for convenient imports
///
/// # Example
///
/// ```no_run
/// use armgpuinfo::prelude::*;
///
/// # fn main() -> Result<()> {
/// let gpu_info = get_gpu_info()?;
/// println!("{} shader cores", gpu_info.shader_cores);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::api::{get_gpu_info, get_gpu_info_with_device, CapabilityRecord, Instance};
    pub use crate::device::DeviceConfig;
    pub use crate::error::{GpuInfoError, Result};
    pub use crate::protocol::DriverDialect;
    pub use crate::{is_supported, scan_devices, version};
}
