//! kbase control channel
//!
//! [`KbaseChannel`] is the seam between the negotiation logic and the
//! kernel: [`MaliDevice`] implements it with real ioctls, tests substitute
//! fakes.

pub mod kbase;
mod channel;

pub use channel::MaliDevice;

use crate::protocol::{DriverDialect, VersionProbe, VersionReply};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Number of `/dev/mali<N>` nodes probed by [`find_gpu_devices`]
pub const MAX_DEVICE_INDEX: u32 = 10;

/// Location of the kbase device node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Directory holding the device nodes
    pub device_dir: PathBuf,
    /// Node name prefix
    pub prefix: String,
    /// Node index appended to the prefix
    pub index: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_dir: PathBuf::from("/dev"),
            prefix: "mali".to_string(),
            index: 0,
        }
    }
}

impl DeviceConfig {
    /// Default location with a different node index
    pub fn with_index(index: u32) -> Self {
        Self { index, ..Self::default() }
    }

    /// Full path of the device node, e.g. `/dev/mali0`
    pub fn device_path(&self) -> PathBuf {
        self.device_dir.join(format!("{}{}", self.prefix, self.index))
    }
}

/// Requests the negotiator and the property providers send to the driver
///
/// Version probes report "no answer" as an all-zero reply instead of an
/// error, since a failing probe is an expected outcome of negotiation.
#[cfg_attr(test, mockall::automock)]
pub trait KbaseChannel {
    /// Send one version-check request
    fn version_check(&self, probe: VersionProbe) -> VersionReply;

    /// Set the context creation flags using the given dialect's request
    fn set_flags(&self, dialect: DriverDialect, flags: u32) -> io::Result<()>;

    /// Read the pre-r21 fixed property block
    fn read_fixed_props(&self) -> io::Result<kbase::pre_r21::GpuProps>;

    /// Ask a post-r21 driver for the property buffer size
    fn props_size(&self) -> io::Result<usize>;

    /// Read up to `size` bytes of the post-r21 property stream
    fn read_props(&self, size: usize) -> io::Result<Vec<u8>>;
}

/// Find all kbase device nodes on the system
pub fn find_gpu_devices() -> Vec<PathBuf> {
    (0..MAX_DEVICE_INDEX)
        .map(|index| DeviceConfig::with_index(index).device_path())
        .filter(|path| fs::metadata(path).is_ok())
        .collect()
}

/// First kbase device node, if any
pub fn find_gpu_device() -> Option<PathBuf> {
    find_gpu_devices().into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn default_config_points_at_mali0() {
        let config = DeviceConfig::default();
        assert_eq!(config.device_path(), Path::new("/dev/mali0"));
    }

    #[test]
    fn index_is_appended_to_prefix() {
        assert_eq!(DeviceConfig::with_index(3).device_path(), Path::new("/dev/mali3"));

        let config = DeviceConfig {
            device_dir: PathBuf::from("/tmp/nodes"),
            prefix: "kbase".to_string(),
            index: 1,
        };
        assert_eq!(config.device_path(), Path::new("/tmp/nodes/kbase1"));
    }

    #[test]
    fn found_devices_are_mali_nodes() {
        for path in find_gpu_devices() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            assert!(name.starts_with("mali"), "{}", path.display());
        }
    }
}
