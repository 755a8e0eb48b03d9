//! Error types for the armgpuinfo library

use std::io;
use thiserror::Error;

/// Main error type for GPU queries
///
/// Every variant is terminal: an instance is either fully constructed or not
/// constructed at all.
#[derive(Error, Debug)]
pub enum GpuInfoError {
    /// The device node is missing or inaccessible
    #[error("Failed to open device: {0}")]
    ChannelOpen(io::Error),

    /// The device node exists but is not a character device
    #[error("Not a character device: {0}")]
    NotACharacterDevice(String),

    /// The driver reported an interface version below 10.2
    #[error("Unsupported kbase interface version {major}.{minor}")]
    UnsupportedVersion {
        /// Reported major version
        major: u16,
        /// Reported minor version
        minor: u16,
    },

    /// None of the version probes got a response
    #[error("No kbase driver interface detected")]
    NoDialectDetected,

    /// Setting the context flags failed with an intolerable error
    #[error("Failed to configure context flags: {0}")]
    Configuration(io::Error),

    /// The property query ioctl failed
    #[error("GPU property query failed: {0}")]
    PropertyQuery(io::Error),

    /// The property data could not be decoded
    #[error("Failed to decode GPU properties: {0}")]
    Decode(#[from] DecodeError),

    /// The GPU id is not in the model database
    #[error("Unknown GPU model (gpu_id=0x{gpu_id:x}, cores={core_count})")]
    UnknownModel {
        /// Raw product id reported by the driver
        gpu_id: u32,
        /// Number of shader cores found
        core_count: u32,
    },
}

/// Errors raised while decoding driver property data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A header or value extends past the end of the buffer
    #[error("truncated property stream at offset {offset}: need {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Byte offset of the failed read
        offset: usize,
        /// Bytes required by the read
        needed: usize,
        /// Bytes left in the buffer
        remaining: usize,
    },

    /// The driver reported more coherency groups than can be stored
    #[error("driver reports {count} coherency groups, at most {max} are supported")]
    TooManyCoherencyGroups {
        /// Reported group count
        count: u64,
        /// Maximum number of groups this path can represent
        max: usize,
    },

    /// A property value does not fit the field it describes
    #[error("property {property} has out-of-range value {value}")]
    ValueOutOfRange {
        /// Property name
        property: &'static str,
        /// Raw value
        value: u64,
    },
}

impl From<io::Error> for GpuInfoError {
    fn from(err: io::Error) -> Self {
        GpuInfoError::ChannelOpen(err)
    }
}

/// Result type for armgpuinfo operations
pub type Result<T> = std::result::Result<T, GpuInfoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_channel_open() {
        let err: GpuInfoError = io::Error::from(io::ErrorKind::NotFound).into();
        assert!(matches!(err, GpuInfoError::ChannelOpen(_)));
    }

    #[test]
    fn decode_errors_render_their_context() {
        let err = GpuInfoError::from(DecodeError::Truncated { offset: 12, needed: 8, remaining: 3 });
        assert_eq!(
            err.to_string(),
            "Failed to decode GPU properties: truncated property stream at offset 12: need 8 bytes, 3 remaining"
        );
    }
}
