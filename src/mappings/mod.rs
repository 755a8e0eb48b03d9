//! Hardware database for GPU model identification

pub mod mali;
mod resolver;

// Re-exports for convenient usage
pub use mali::{Formula, ModelDescriptor, MALI_GPU_MODELS, MASK_LEGACY, MASK_MODERN};
pub use resolver::{ModelDatabase, ModelMetrics, UNKNOWN_MODEL};
