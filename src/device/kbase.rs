//! kbase ioctl numbers and argument layouts for both interface generations

#![allow(missing_docs)]

use std::mem::size_of;

/// ioctl type ("magic") used by every kbase request
pub const KBASE_IOCTL_TYPE: u32 = 0x80;

const IOC_WRITE: u32 = 1;
const IOC_READ: u32 = 2;

/// Linux `_IOC` encoding. `nr` is not masked: pre-r21 numbers spill into
/// the type field exactly as the C macro does.
pub const fn ioc(dir: u32, ty: u32, nr: u32, size: usize) -> u32 {
    (dir << 30) | ((size as u32) << 16) | (ty << 8) | nr
}

/// `_IOW`
pub const fn iow(ty: u32, nr: u32, size: usize) -> u32 {
    ioc(IOC_WRITE, ty, nr, size)
}

/// `_IOWR`
pub const fn iowr(ty: u32, nr: u32, size: usize) -> u32 {
    ioc(IOC_READ | IOC_WRITE, ty, nr, size)
}

/// Context flag that stops the system monitor from submitting work
pub const SYSTEM_MONITOR_FLAG_SUBMIT_DISABLED: u32 = 1 << 1;

/// Pre-r21 "UK" interface, used by drivers before the r21 release
pub mod pre_r21 {
    use super::*;

    /// UK function id: version check
    pub const FUNC_VERSION_CHECK: u64 = 0;
    /// UK function id: get GPU properties
    pub const FUNC_GET_PROPS: u64 = 526;
    /// UK function id: set context flags
    pub const FUNC_SET_FLAGS: u64 = 530;

    /// Number of coherency group slots in the fixed layout
    pub const MAX_COHERENT_GROUPS: usize = 16;
    const MAX_JOB_SLOTS: usize = 16;

    /// Version check arguments
    #[repr(C)]
    #[derive(Debug, Default, Copy, Clone)]
    pub struct VersionCheck {
        /// Function id in, return code out
        pub header: u64,
        /// Major version
        pub major: u16,
        /// Minor version
        pub minor: u16,
    }

    /// Set flags arguments
    #[repr(C)]
    #[derive(Debug, Default, Copy, Clone)]
    pub struct SetFlags {
        /// Function id in, return code out
        pub header: u64,
        /// Context creation flags
        pub create_flags: u32,
        /// Padding
        pub padding: u32,
    }

    #[repr(C)]
    #[derive(Debug, Default, Copy, Clone)]
    pub struct CoreProps {
        pub product_id: u32,
        pub version_status: u16,
        pub minor_revision: u16,
        pub major_revision: u16,
        pub padding: u16,
        pub gpu_speed_mhz: u32,
        pub gpu_freq_khz_max: u32,
        pub gpu_freq_khz_min: u32,
        pub log2_program_counter_size: u32,
        pub texture_features: [u32; 3],
        pub gpu_available_memory_size: u64,
    }

    #[repr(C)]
    #[derive(Debug, Default, Copy, Clone)]
    pub struct L2Props {
        pub log2_line_size: u8,
        pub log2_cache_size: u8,
        pub num_l2_slices: u8,
        pub padding: [u8; 5],
    }

    #[repr(C)]
    #[derive(Debug, Default, Copy, Clone)]
    pub struct TilerProps {
        pub bin_size_bytes: u32,
        pub max_active_levels: u32,
    }

    #[repr(C)]
    #[derive(Debug, Default, Copy, Clone)]
    pub struct ThreadProps {
        pub max_threads: u32,
        pub max_workgroup_size: u32,
        pub max_barrier_size: u32,
        pub max_registers: u16,
        pub max_task_queue: u8,
        pub max_thread_group_split: u8,
        pub impl_tech: u8,
        pub padding: [u8; 7],
    }

    /// Raw hardware discovery registers
    #[repr(C)]
    #[derive(Debug, Default, Copy, Clone)]
    pub struct RawProps {
        pub shader_present: u64,
        pub tiler_present: u64,
        pub l2_present: u64,
        pub unused_1: u64,
        pub l2_features: u32,
        pub suspend_size: u32,
        pub mem_features: u32,
        pub mmu_features: u32,
        pub as_present: u32,
        pub js_present: u32,
        pub js_features: [u32; MAX_JOB_SLOTS],
        pub tiler_features: u32,
        pub texture_features: [u32; 3],
        pub gpu_id: u32,
        pub thread_max_threads: u32,
        pub thread_max_workgroup_size: u32,
        pub thread_max_barrier_size: u32,
        pub thread_features: u32,
        pub coherency_mode: u32,
    }

    #[repr(C)]
    #[derive(Debug, Default, Copy, Clone)]
    pub struct CoherentGroup {
        pub core_mask: u64,
        pub num_cores: u16,
        pub padding: [u16; 3],
    }

    #[repr(C)]
    #[derive(Debug, Default, Copy, Clone)]
    pub struct CoherentGroupInfo {
        /// Number of valid entries in `group`
        pub num_groups: u32,
        /// Number of L2 caches; not a bound on `group`
        pub num_core_groups: u32,
        pub coherency: u32,
        pub padding: u32,
        pub group: [CoherentGroup; MAX_COHERENT_GROUPS],
    }

    #[repr(C)]
    #[derive(Debug, Default, Copy, Clone)]
    pub struct GpuProps {
        pub core_props: CoreProps,
        pub l2_props: L2Props,
        pub unused: u64,
        pub tiler_props: TilerProps,
        pub thread_props: ThreadProps,
        pub raw_props: RawProps,
        pub coherency_info: CoherentGroupInfo,
    }

    /// Get props arguments, filled in place by the driver
    #[repr(C)]
    #[derive(Debug, Default, Copy, Clone)]
    pub struct GetProps {
        /// Function id in, return code out
        pub header: u64,
        /// Property block
        pub props: GpuProps,
    }

    pub const VERSION_CHECK: u32 = iowr(KBASE_IOCTL_TYPE, 0x0, size_of::<VersionCheck>());
    pub const SET_FLAGS: u32 = iowr(KBASE_IOCTL_TYPE, 0x212, size_of::<SetFlags>());
    pub const GET_GPUPROPS: u32 = iowr(KBASE_IOCTL_TYPE, 0x20e, size_of::<GetProps>());
}

/// Post-r21 interface, shared by job-manager (JM) and command-stream (CSF) drivers
pub mod post_r21 {
    use super::*;

    /// Version check arguments
    #[repr(C)]
    #[derive(Debug, Default, Copy, Clone)]
    pub struct VersionCheck {
        /// Major version
        pub major: u16,
        /// Minor version
        pub minor: u16,
    }

    /// Set flags arguments
    #[repr(C)]
    #[derive(Debug, Default, Copy, Clone)]
    pub struct SetFlags {
        /// Context creation flags
        pub create_flags: u32,
    }

    /// Get props arguments
    ///
    /// With `size == 0` the driver returns the buffer size it needs;
    /// otherwise it returns the number of bytes written to `buffer`.
    #[repr(C)]
    #[derive(Debug, Default, Copy, Clone)]
    pub struct GetProps {
        /// User pointer to the output buffer
        pub buffer: u64,
        /// Buffer size in bytes
        pub size: u32,
        /// Must be zero
        pub flags: u32,
    }

    pub const VERSION_CHECK_JM: u32 = iowr(KBASE_IOCTL_TYPE, 0x0, size_of::<VersionCheck>());
    pub const VERSION_CHECK_CSF: u32 = iowr(KBASE_IOCTL_TYPE, 0x34, size_of::<VersionCheck>());
    pub const SET_FLAGS: u32 = iow(KBASE_IOCTL_TYPE, 0x1, size_of::<SetFlags>());
    pub const GET_GPUPROPS: u32 = iow(KBASE_IOCTL_TYPE, 0x3, size_of::<GetProps>());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_sizes_match_the_kernel_abi() {
        assert_eq!(size_of::<pre_r21::VersionCheck>(), 16);
        assert_eq!(size_of::<pre_r21::SetFlags>(), 16);
        assert_eq!(size_of::<pre_r21::CoreProps>(), 48);
        assert_eq!(size_of::<pre_r21::ThreadProps>(), 24);
        assert_eq!(size_of::<pre_r21::RawProps>(), 160);
        assert_eq!(size_of::<pre_r21::CoherentGroupInfo>(), 272);
        assert_eq!(size_of::<pre_r21::GetProps>(), 536);
        assert_eq!(size_of::<post_r21::VersionCheck>(), 4);
        assert_eq!(size_of::<post_r21::GetProps>(), 16);
    }

    #[test]
    fn request_codes() {
        assert_eq!(pre_r21::VERSION_CHECK, 0xC010_8000);
        assert_eq!(pre_r21::SET_FLAGS, 0xC010_8212);
        assert_eq!(pre_r21::GET_GPUPROPS, 0xC218_820E);
        assert_eq!(post_r21::VERSION_CHECK_JM, 0xC004_8000);
        assert_eq!(post_r21::VERSION_CHECK_CSF, 0xC004_8034);
        assert_eq!(post_r21::SET_FLAGS, 0x4004_8001);
        assert_eq!(post_r21::GET_GPUPROPS, 0x4010_8003);
    }
}
