//! Model matching and derived per-core metrics

use super::mali::{ModelDescriptor, MALI_GPU_MODELS};

/// Name and architecture reported when no descriptor matches
pub const UNKNOWN_MODEL: &str = "Unknown";

/// An ordered, read-only table of model descriptors
///
/// Lookups scan in declaration order and stop at the first match.
#[derive(Debug, Clone, Copy)]
pub struct ModelDatabase<'a> {
    models: &'a [ModelDescriptor],
}

/// Name, architecture and per-core rates resolved for one GPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelMetrics {
    /// Marketing name, or [`UNKNOWN_MODEL`]
    pub name: &'static str,
    /// Architecture name, or [`UNKNOWN_MODEL`]
    pub architecture: &'static str,
    /// Canonical (masked) product id
    pub gpu_id: u32,
    /// Execution engines per core; 0 when the model is unknown
    pub engines: u32,
    /// FP32 FMAs per cycle per core
    pub fp32_fmas: u32,
    /// FP16 FMAs per cycle per core
    pub fp16_fmas: u32,
    /// Texels per cycle per core
    pub texels: u32,
    /// Pixels per cycle per core
    pub pixels: u32,
}

impl ModelMetrics {
    /// True if the GPU resolved to a known model with at least one engine
    pub fn is_known(&self) -> bool {
        self.engines != 0
    }
}

impl Default for ModelDatabase<'static> {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ModelDatabase<'static> {
    /// The built-in Mali/Immortalis table
    pub const fn builtin() -> Self {
        Self { models: MALI_GPU_MODELS }
    }
}

impl<'a> ModelDatabase<'a> {
    /// Wrap an arbitrary descriptor table
    pub const fn new(models: &'a [ModelDescriptor]) -> Self {
        Self { models }
    }

    /// First descriptor matching the product id and core count
    pub fn find(&self, raw_gpu_id: u32, core_count: u32) -> Option<&'a ModelDescriptor> {
        self.models.iter().find(|m| m.matches(raw_gpu_id, core_count))
    }

    /// First descriptor matching the product id alone
    pub fn find_by_id(&self, raw_gpu_id: u32) -> Option<&'a ModelDescriptor> {
        self.models.iter().find(|m| m.matches_id(raw_gpu_id))
    }

    /// Mask off revision bits, using the first id-only match
    ///
    /// Unknown ids are returned unchanged, so the result is idempotent.
    pub fn normalize(&self, raw_gpu_id: u32) -> u32 {
        match self.find_by_id(raw_gpu_id) {
            Some(model) => raw_gpu_id & model.mask,
            None => raw_gpu_id,
        }
    }

    /// Architecture name from an id-only match
    pub fn architecture(&self, raw_gpu_id: u32) -> Option<&'static str> {
        self.find_by_id(raw_gpu_id).map(|m| m.architecture)
    }

    /// Resolve name, architecture and per-core rates for one GPU
    pub fn resolve(
        &self,
        raw_gpu_id: u32,
        core_count: u32,
        core_features: u32,
        thread_features: u32,
    ) -> ModelMetrics {
        let architecture = self.architecture(raw_gpu_id).unwrap_or(UNKNOWN_MODEL);
        let gpu_id = self.normalize(raw_gpu_id);

        let Some(model) = self.find(raw_gpu_id, core_count) else {
            return ModelMetrics {
                name: UNKNOWN_MODEL,
                architecture,
                gpu_id,
                engines: 0,
                fp32_fmas: 0,
                fp16_fmas: 0,
                texels: 0,
                pixels: 0,
            };
        };

        let engines = model.engines.eval(core_count, core_features, thread_features);
        let fp32_fmas = model.fp32_fmas_per_engine.saturating_mul(engines);

        ModelMetrics {
            name: model.name,
            architecture,
            gpu_id,
            engines,
            fp32_fmas,
            fp16_fmas: fp32_fmas.saturating_mul(2),
            texels: model.texels.eval(core_count, core_features, thread_features),
            pixels: model.pixels.eval(core_count, core_features, thread_features),
        }
    }
}
