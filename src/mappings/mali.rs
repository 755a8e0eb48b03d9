//! ARM Mali GPU model database

use serde::{Deserialize, Serialize};

/// Mask for Midgard-era product ids, which compare all 16 bits
pub const MASK_LEGACY: u32 = 0xFFFF;

/// Mask for Bifrost and later product ids (arch major + product major only)
pub const MASK_MODERN: u32 = 0xF00F;

/// Per-core rate formula, evaluated from the core count and raw feature registers
///
/// Each descriptor carries three of these (texels, pixels, engines) instead of
/// function pointers so the database stays a plain const table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Formula {
    /// Fixed value
    Const(u32),
    /// The given value, except single-core parts with the reduced thread
    /// configuration (`THREAD_FEATURES[15:0] == 0x2000`) which have 1
    SingleCoreReduced(u32),
    /// Engine count stored in `CORE_FEATURES[3:0]`
    CoreFeatureCount,
    /// 1 when `CORE_FEATURES[3:0] <= 1`, otherwise 2
    CoreFeatureThreshold,
}

impl Formula {
    /// Evaluate the formula for one GPU configuration
    pub const fn eval(self, core_count: u32, core_features: u32, thread_features: u32) -> u32 {
        match self {
            Formula::Const(n) => n,
            Formula::SingleCoreReduced(n) => {
                if core_count == 1 && (thread_features & 0xFFFF) == 0x2000 {
                    1
                } else {
                    n
                }
            }
            Formula::CoreFeatureCount => core_features & 0xF,
            Formula::CoreFeatureThreshold => {
                if (core_features & 0xF) <= 1 {
                    1
                } else {
                    2
                }
            }
        }
    }
}

/// One row of the model database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelDescriptor {
    /// Product id pattern, already masked
    pub pattern: u32,
    /// Mask applied to the raw product id before comparison
    pub mask: u32,
    /// Minimum number of cores required for this marketing name/variant
    pub min_cores: u32,
    /// Marketing name (e.g. "Mali-G78", "Immortalis-G715")
    pub name: &'static str,
    /// Architecture generation/family
    pub architecture: &'static str,
    /// Number of FP32 FMA operations per engine per cycle
    pub fp32_fmas_per_engine: u32,
    /// Bilinear texels per cycle per core
    pub texels: Formula,
    /// Output pixels per cycle per core
    pub pixels: Formula,
    /// Execution engines per core
    pub engines: Formula,
}

impl ModelDescriptor {
    /// True if the product id matches this row, ignoring the core threshold
    pub const fn matches_id(&self, raw_gpu_id: u32) -> bool {
        (raw_gpu_id & self.mask) == self.pattern
    }

    /// True if both the product id and the core threshold match
    pub const fn matches(&self, raw_gpu_id: u32, core_count: u32) -> bool {
        self.matches_id(raw_gpu_id) && core_count >= self.min_cores
    }
}

use Formula::{Const, CoreFeatureCount, CoreFeatureThreshold, SingleCoreReduced};

/// Complete database of known Mali GPU models
///
/// Order is significant: rows sharing a pattern are listed from the highest
/// `min_cores` down, and the first match wins.
pub const MALI_GPU_MODELS: &[ModelDescriptor] = &[
    // Midgard Architecture
    ModelDescriptor { pattern: 0x6956, mask: MASK_LEGACY, min_cores: 1,  name: "Mali-T600",       architecture: "Midgard",     fp32_fmas_per_engine: 4,  texels: Const(1), pixels: Const(1), engines: Const(2) },
    ModelDescriptor { pattern: 0x0620, mask: MASK_LEGACY, min_cores: 1,  name: "Mali-T620",       architecture: "Midgard",     fp32_fmas_per_engine: 4,  texels: Const(1), pixels: Const(1), engines: Const(2) },
    ModelDescriptor { pattern: 0x0720, mask: MASK_LEGACY, min_cores: 1,  name: "Mali-T720",       architecture: "Midgard",     fp32_fmas_per_engine: 4,  texels: Const(1), pixels: Const(1), engines: Const(1) },
    ModelDescriptor { pattern: 0x0750, mask: MASK_LEGACY, min_cores: 1,  name: "Mali-T760",       architecture: "Midgard",     fp32_fmas_per_engine: 4,  texels: Const(1), pixels: Const(1), engines: Const(2) },
    ModelDescriptor { pattern: 0x0820, mask: MASK_LEGACY, min_cores: 1,  name: "Mali-T820",       architecture: "Midgard",     fp32_fmas_per_engine: 4,  texels: Const(1), pixels: Const(1), engines: Const(1) },
    ModelDescriptor { pattern: 0x0830, mask: MASK_LEGACY, min_cores: 1,  name: "Mali-T830",       architecture: "Midgard",     fp32_fmas_per_engine: 4,  texels: Const(1), pixels: Const(1), engines: Const(2) },
    ModelDescriptor { pattern: 0x0860, mask: MASK_LEGACY, min_cores: 1,  name: "Mali-T860",       architecture: "Midgard",     fp32_fmas_per_engine: 4,  texels: Const(1), pixels: Const(1), engines: Const(2) },
    ModelDescriptor { pattern: 0x0880, mask: MASK_LEGACY, min_cores: 1,  name: "Mali-T880",       architecture: "Midgard",     fp32_fmas_per_engine: 4,  texels: Const(1), pixels: Const(1), engines: Const(3) },

    // Bifrost Architecture
    ModelDescriptor { pattern: 0x6000, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G71",        architecture: "Bifrost",     fp32_fmas_per_engine: 4,  texels: Const(1), pixels: Const(1), engines: Const(3) },
    ModelDescriptor { pattern: 0x6001, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G72",        architecture: "Bifrost",     fp32_fmas_per_engine: 4,  texels: Const(1), pixels: Const(1), engines: Const(3) },
    ModelDescriptor { pattern: 0x7000, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G51",        architecture: "Bifrost",     fp32_fmas_per_engine: 4,  texels: Const(2), pixels: Const(2), engines: SingleCoreReduced(3) },
    ModelDescriptor { pattern: 0x7001, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G76",        architecture: "Bifrost",     fp32_fmas_per_engine: 8,  texels: Const(2), pixels: Const(2), engines: Const(3) },
    ModelDescriptor { pattern: 0x7002, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G52",        architecture: "Bifrost",     fp32_fmas_per_engine: 8,  texels: Const(2), pixels: Const(2), engines: CoreFeatureCount },
    ModelDescriptor { pattern: 0x7003, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G31",        architecture: "Bifrost",     fp32_fmas_per_engine: 4,  texels: Const(2), pixels: Const(2), engines: SingleCoreReduced(2) },

    // Valhall Architecture
    ModelDescriptor { pattern: 0x9000, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G77",        architecture: "Valhall",     fp32_fmas_per_engine: 16, texels: Const(4), pixels: Const(2), engines: Const(2) },
    ModelDescriptor { pattern: 0x9001, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G57",        architecture: "Valhall",     fp32_fmas_per_engine: 16, texels: Const(4), pixels: Const(2), engines: Const(2) },
    ModelDescriptor { pattern: 0x9003, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G57",        architecture: "Valhall",     fp32_fmas_per_engine: 16, texels: Const(4), pixels: Const(2), engines: Const(2) },
    ModelDescriptor { pattern: 0x9004, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G68",        architecture: "Valhall",     fp32_fmas_per_engine: 16, texels: Const(4), pixels: Const(2), engines: Const(2) },
    ModelDescriptor { pattern: 0x9002, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G78",        architecture: "Valhall",     fp32_fmas_per_engine: 16, texels: Const(4), pixels: Const(2), engines: Const(2) },
    ModelDescriptor { pattern: 0x9005, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G78AE",      architecture: "Valhall",     fp32_fmas_per_engine: 16, texels: Const(4), pixels: Const(2), engines: Const(2) },
    ModelDescriptor { pattern: 0xa002, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G710",       architecture: "Valhall",     fp32_fmas_per_engine: 32, texels: Const(8), pixels: Const(4), engines: Const(2) },
    ModelDescriptor { pattern: 0xa007, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G610",       architecture: "Valhall",     fp32_fmas_per_engine: 32, texels: Const(8), pixels: Const(4), engines: Const(2) },
    ModelDescriptor { pattern: 0xa003, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G510",       architecture: "Valhall",     fp32_fmas_per_engine: 32, texels: Const(8), pixels: Const(4), engines: CoreFeatureThreshold },
    ModelDescriptor { pattern: 0xa004, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G310",       architecture: "Valhall",     fp32_fmas_per_engine: 32, texels: Const(8), pixels: Const(4), engines: CoreFeatureThreshold },
    ModelDescriptor { pattern: 0xb002, mask: MASK_MODERN, min_cores: 10, name: "Immortalis-G715", architecture: "Valhall",     fp32_fmas_per_engine: 64, texels: Const(8), pixels: Const(4), engines: Const(2) },
    ModelDescriptor { pattern: 0xb003, mask: MASK_MODERN, min_cores: 10, name: "Immortalis-G715", architecture: "Valhall",     fp32_fmas_per_engine: 64, texels: Const(8), pixels: Const(4), engines: Const(2) },
    ModelDescriptor { pattern: 0xb002, mask: MASK_MODERN, min_cores: 7,  name: "Mali-G715",       architecture: "Valhall",     fp32_fmas_per_engine: 64, texels: Const(8), pixels: Const(4), engines: Const(2) },
    ModelDescriptor { pattern: 0xb003, mask: MASK_MODERN, min_cores: 7,  name: "Mali-G715",       architecture: "Valhall",     fp32_fmas_per_engine: 64, texels: Const(8), pixels: Const(4), engines: Const(2) },
    ModelDescriptor { pattern: 0xb002, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G615",       architecture: "Valhall",     fp32_fmas_per_engine: 64, texels: Const(8), pixels: Const(4), engines: Const(2) },
    ModelDescriptor { pattern: 0xb003, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G615",       architecture: "Valhall",     fp32_fmas_per_engine: 64, texels: Const(8), pixels: Const(4), engines: Const(2) },

    // 5th Generation / Immortalis
    ModelDescriptor { pattern: 0xc000, mask: MASK_MODERN, min_cores: 10, name: "Immortalis-G720", architecture: "Arm 5th Gen", fp32_fmas_per_engine: 64, texels: Const(8), pixels: Const(4), engines: Const(2) },
    ModelDescriptor { pattern: 0xc000, mask: MASK_MODERN, min_cores: 6,  name: "Mali-G720",       architecture: "Arm 5th Gen", fp32_fmas_per_engine: 64, texels: Const(8), pixels: Const(4), engines: Const(2) },
    ModelDescriptor { pattern: 0xc000, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G620",       architecture: "Arm 5th Gen", fp32_fmas_per_engine: 64, texels: Const(8), pixels: Const(4), engines: Const(2) },
    ModelDescriptor { pattern: 0xc001, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G620",       architecture: "Arm 5th Gen", fp32_fmas_per_engine: 64, texels: Const(8), pixels: Const(4), engines: Const(2) },
    ModelDescriptor { pattern: 0xd000, mask: MASK_MODERN, min_cores: 10, name: "Immortalis-G925", architecture: "Arm 5th Gen", fp32_fmas_per_engine: 64, texels: Const(8), pixels: Const(4), engines: Const(2) },
    ModelDescriptor { pattern: 0xd000, mask: MASK_MODERN, min_cores: 6,  name: "Mali-G725",       architecture: "Arm 5th Gen", fp32_fmas_per_engine: 64, texels: Const(8), pixels: Const(4), engines: Const(2) },
    ModelDescriptor { pattern: 0xd001, mask: MASK_MODERN, min_cores: 1,  name: "Mali-G625",       architecture: "Arm 5th Gen", fp32_fmas_per_engine: 64, texels: Const(8), pixels: Const(4), engines: Const(2) },
    ModelDescriptor { pattern: 0xe000, mask: MASK_MODERN, min_cores: 10, name: "Mali G1-Ultra",   architecture: "Arm 5th Gen", fp32_fmas_per_engine: 64, texels: Const(8), pixels: Const(4), engines: Const(2) },
    ModelDescriptor { pattern: 0xe001, mask: MASK_MODERN, min_cores: 6,  name: "Mali G1-Premium", architecture: "Arm 5th Gen", fp32_fmas_per_engine: 64, texels: Const(8), pixels: Const(4), engines: Const(2) },
    ModelDescriptor { pattern: 0xe003, mask: MASK_MODERN, min_cores: 1,  name: "Mali G1-Pro",     architecture: "Arm 5th Gen", fp32_fmas_per_engine: 64, texels: Const(8), pixels: Const(4), engines: Const(2) },
];
