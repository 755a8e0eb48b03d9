//! Typed GPU properties and their aggregation into raw hardware quantities

mod decoder;

pub use decoder::{decode, encode_property, PropertyDecoder, ValueWidth};

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};

/// Number of coherency group masks the tag-value stream can carry
pub const MAX_STREAM_COHERENCY_GROUPS: usize = 4;

/// Property codes understood by this crate
///
/// Codes are the wire ids of the post-r21 `GET_GPUPROPS` stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum PropertyId {
    /// Product id
    ProductId = 1,
    /// L2 log2 line size
    L2Log2LineSize = 13,
    /// L2 log2 cache size
    L2Log2CacheSize = 14,
    /// Number of L2 slices
    L2NumL2Slices = 15,
    /// Max threads
    MaxThreads = 18,
    /// Max registers
    MaxRegisters = 21,
    /// Raw L2_FEATURES register
    RawL2Features = 29,
    /// Raw CORE_FEATURES register
    RawCoreFeatures = 30,
    /// Raw THREAD_MAX_THREADS register
    RawThreadMaxThreads = 56,
    /// Raw THREAD_MAX_WORKGROUP_SIZE register
    RawThreadMaxWorkgroupSize = 57,
    /// Raw THREAD_MAX_BARRIER_SIZE register
    RawThreadMaxBarrierSize = 58,
    /// Raw THREAD_FEATURES register
    RawThreadFeatures = 59,
    /// Raw coherency mode
    RawCoherencyMode = 60,
    /// Number of coherency groups
    CoherencyNumGroups = 61,
    /// Number of core groups
    CoherencyNumCoreGroups = 62,
    /// Coherency features
    CoherencyCoherency = 63,
    /// Core mask of coherency group 0
    CoherencyGroup0 = 64,
    /// Core mask of coherency group 1
    CoherencyGroup1 = 65,
    /// Core mask of coherency group 2
    CoherencyGroup2 = 66,
    /// Core mask of coherency group 3
    CoherencyGroup3 = 67,
    /// Number of execution engines
    NumExecEngines = 82,
}

impl PropertyId {
    /// Map a wire id to a known property
    pub fn from_code(code: u32) -> Option<Self> {
        use PropertyId::*;
        let id = match code {
            1 => ProductId,
            13 => L2Log2LineSize,
            14 => L2Log2CacheSize,
            15 => L2NumL2Slices,
            18 => MaxThreads,
            21 => MaxRegisters,
            29 => RawL2Features,
            30 => RawCoreFeatures,
            56 => RawThreadMaxThreads,
            57 => RawThreadMaxWorkgroupSize,
            58 => RawThreadMaxBarrierSize,
            59 => RawThreadFeatures,
            60 => RawCoherencyMode,
            61 => CoherencyNumGroups,
            62 => CoherencyNumCoreGroups,
            63 => CoherencyCoherency,
            64 => CoherencyGroup0,
            65 => CoherencyGroup1,
            66 => CoherencyGroup2,
            67 => CoherencyGroup3,
            82 => NumExecEngines,
            _ => return None,
        };
        Some(id)
    }

    /// Wire id
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Slot of a coherency group mask property
    pub fn coherency_group_index(self) -> Option<usize> {
        match self {
            PropertyId::CoherencyGroup0 => Some(0),
            PropertyId::CoherencyGroup1 => Some(1),
            PropertyId::CoherencyGroup2 => Some(2),
            PropertyId::CoherencyGroup3 => Some(3),
            _ => None,
        }
    }
}

/// A decoded property, widened to 64 bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyField {
    /// Property code
    pub id: PropertyId,
    /// Value as read from the stream
    pub value: u64,
}

/// Hardware quantities common to both driver dialects
///
/// `l2_slice_bytes` is the size of one slice; the total is computed once by
/// the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawProperties {
    /// Raw product id, before masking
    pub gpu_id: u32,
    /// L2 size of one slice, in bytes
    pub l2_slice_bytes: u64,
    /// Number of L2 slices
    pub l2_slices: u32,
    /// External bus width in bits
    pub bus_bits: u32,
    /// Shader cores across all coherency groups
    pub shader_cores: u32,
    /// Raw CORE_FEATURES register
    pub core_features: u32,
    /// Raw THREAD_FEATURES register
    pub thread_features: u32,
}

impl RawProperties {
    /// Aggregate decoded tag-value fields
    ///
    /// Later occurrences of the same property override earlier ones. If the
    /// stream reports a group count it selects how many masks are summed,
    /// otherwise every mask present is summed.
    pub fn from_fields(fields: &[PropertyField]) -> Result<Self, DecodeError> {
        let mut props = RawProperties::default();
        let mut group_masks = [0u64; MAX_STREAM_COHERENCY_GROUPS];
        let mut group_count: Option<usize> = None;

        for field in fields {
            let value = field.value;
            match field.id {
                PropertyId::ProductId => props.gpu_id = narrow("product_id", value)?,
                PropertyId::L2Log2CacheSize => props.l2_slice_bytes = pow2_u64("l2_log2_cache_size", value)?,
                PropertyId::L2NumL2Slices => props.l2_slices = narrow("l2_num_l2_slices", value)?,
                PropertyId::RawL2Features => props.bus_bits = bus_width_bits(value)?,
                PropertyId::RawCoreFeatures => props.core_features = narrow("raw_core_features", value)?,
                PropertyId::RawThreadFeatures => props.thread_features = narrow("raw_thread_features", value)?,
                PropertyId::CoherencyNumGroups => {
                    if value > MAX_STREAM_COHERENCY_GROUPS as u64 {
                        return Err(DecodeError::TooManyCoherencyGroups {
                            count: value,
                            max: MAX_STREAM_COHERENCY_GROUPS,
                        });
                    }
                    group_count = Some(value as usize);
                }
                id => {
                    if let Some(slot) = id.coherency_group_index() {
                        group_masks[slot] = value;
                    }
                }
            }
        }

        let groups = group_count.unwrap_or(MAX_STREAM_COHERENCY_GROUPS);
        props.shader_cores = count_cores(&group_masks[..groups]);
        Ok(props)
    }
}

/// Population count summed over core masks
pub fn count_cores(masks: &[u64]) -> u32 {
    masks.iter().map(|mask| mask.count_ones()).sum()
}

/// Bus width from L2_FEATURES, whose top byte holds log2(bus width)
pub fn bus_width_bits(l2_features: u64) -> Result<u32, DecodeError> {
    let log2 = (l2_features >> 24) & 0xFF;
    1u32.checked_shl(log2 as u32).ok_or(DecodeError::ValueOutOfRange {
        property: "raw_l2_features",
        value: l2_features,
    })
}

/// `1 << log2` as a byte count
pub fn pow2_u64(property: &'static str, log2: u64) -> Result<u64, DecodeError> {
    u32::try_from(log2)
        .ok()
        .and_then(|shift| 1u64.checked_shl(shift))
        .ok_or(DecodeError::ValueOutOfRange { property, value: log2 })
}

fn narrow(property: &'static str, value: u64) -> Result<u32, DecodeError> {
    u32::try_from(value).map_err(|_| DecodeError::ValueOutOfRange { property, value })
}
