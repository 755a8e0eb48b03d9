//! High-level API for GPU information retrieval

use crate::device::{DeviceConfig, KbaseChannel, MaliDevice};
use crate::error::{DecodeError, GpuInfoError, Result};
use crate::mappings::ModelDatabase;
use crate::props::RawProperties;
use crate::protocol::{configure, negotiate, provider_for, DriverDialect};
use log::debug;
use serde::{Deserialize, Serialize};

/// Structured GPU configuration
///
/// All per-core rates are per clock cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityRecord {
    /// GPU model name
    pub gpu_name: String,
    /// Architecture generation
    pub architecture: String,
    /// Canonical GPU id, revision bits masked off
    pub gpu_id: u32,
    /// Number of shader cores
    pub shader_cores: u32,
    /// Number of L2 cache slices
    pub l2_slices: u32,
    /// Total L2 cache size in bytes
    pub l2_bytes: u64,
    /// External memory bus width in bits
    pub bus_bits: u32,
    /// Execution engines per core
    pub engines_per_core: u32,
    /// FP32 FMAs per cycle per core
    pub fp32_fmas_per_core: u32,
    /// FP16 FMAs per cycle per core
    pub fp16_fmas_per_core: u32,
    /// Texels per cycle per core
    pub texels_per_core: u32,
    /// Pixels per cycle per core
    pub pixels_per_core: u32,
}

impl CapabilityRecord {
    /// Resolve raw properties against the built-in model table
    pub fn from_raw(raw: &RawProperties) -> Result<Self> {
        Self::from_raw_with(&ModelDatabase::builtin(), raw)
    }

    /// Resolve raw properties against `db`
    ///
    /// Fails with [`GpuInfoError::UnknownModel`] if no descriptor matches.
    pub fn from_raw_with(db: &ModelDatabase<'_>, raw: &RawProperties) -> Result<Self> {
        let metrics = db.resolve(raw.gpu_id, raw.shader_cores, raw.core_features, raw.thread_features);
        if !metrics.is_known() {
            return Err(GpuInfoError::UnknownModel {
                gpu_id: raw.gpu_id,
                core_count: raw.shader_cores,
            });
        }

        let l2_bytes = raw
            .l2_slice_bytes
            .checked_mul(u64::from(raw.l2_slices))
            .ok_or(DecodeError::ValueOutOfRange {
                property: "l2_num_l2_slices",
                value: u64::from(raw.l2_slices),
            })?;

        Ok(Self {
            gpu_name: metrics.name.to_string(),
            architecture: metrics.architecture.to_string(),
            gpu_id: metrics.gpu_id,
            shader_cores: raw.shader_cores,
            l2_slices: raw.l2_slices,
            l2_bytes,
            bus_bits: raw.bus_bits,
            engines_per_core: metrics.engines,
            fp32_fmas_per_core: metrics.fp32_fmas,
            fp16_fmas_per_core: metrics.fp16_fmas,
            texels_per_core: metrics.texels,
            pixels_per_core: metrics.pixels,
        })
    }

    fn total(&self, per_core: u32) -> u64 {
        u64::from(per_core) * u64::from(self.shader_cores)
    }

    /// FP32 FMAs per cycle across all cores
    pub fn total_fp32_fmas_per_cycle(&self) -> u64 {
        self.total(self.fp32_fmas_per_core)
    }

    /// FP16 FMAs per cycle across all cores
    pub fn total_fp16_fmas_per_cycle(&self) -> u64 {
        self.total(self.fp16_fmas_per_core)
    }

    /// Texels per cycle across all cores
    pub fn total_texels_per_cycle(&self) -> u64 {
        self.total(self.texels_per_core)
    }

    /// Pixels per cycle across all cores
    pub fn total_pixels_per_cycle(&self) -> u64 {
        self.total(self.pixels_per_core)
    }
}

/// A GPU queried once at construction
///
/// Owns the control channel for its whole lifetime. Construction either
/// yields a complete record or fails; the channel is released either way.
#[derive(Debug)]
pub struct Instance<C: KbaseChannel = MaliDevice> {
    channel: C,
    dialect: DriverDialect,
    info: CapabilityRecord,
}

impl Instance<MaliDevice> {
    /// Query `/dev/mali<index>`
    pub fn create(index: u32) -> Result<Self> {
        Self::with_config(&DeviceConfig::with_index(index))
    }

    /// Query the device node described by `config`
    pub fn with_config(config: &DeviceConfig) -> Result<Self> {
        let device = MaliDevice::open(&config.device_path())?;
        Self::from_channel(device)
    }
}

impl<C: KbaseChannel> Instance<C> {
    /// Negotiate, configure and query an already open channel
    pub fn from_channel(channel: C) -> Result<Self> {
        let dialect = negotiate(&channel)?;

        let raw = {
            let provider = provider_for(dialect, &channel);
            configure(provider.as_ref())?;
            provider.fetch()?
        };
        debug!("raw properties: {:?}", raw);

        let info = CapabilityRecord::from_raw(&raw)?;
        Ok(Self { channel, dialect, info })
    }

    /// The resolved GPU configuration
    pub fn info(&self) -> &CapabilityRecord {
        &self.info
    }

    /// Dialect negotiated with the driver
    pub fn dialect(&self) -> DriverDialect {
        self.dialect
    }

    /// The underlying control channel
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Release the channel and keep the record
    pub fn into_info(self) -> CapabilityRecord {
        self.info
    }
}

/// Get GPU information for `/dev/mali0`
///
/// This is the main entry point for most applications.
pub fn get_gpu_info() -> Result<CapabilityRecord> {
    get_gpu_info_with_device(0)
}

/// Get GPU information for `/dev/mali<index>`
pub fn get_gpu_info_with_device(index: u32) -> Result<CapabilityRecord> {
    Instance::create(index).map(Instance::into_info)
}
