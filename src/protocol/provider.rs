//! Dialect-specific property retrieval

use super::DriverDialect;
use crate::device::kbase::pre_r21::{GpuProps, MAX_COHERENT_GROUPS};
use crate::device::KbaseChannel;
use crate::error::{DecodeError, GpuInfoError, Result};
use crate::props::{bus_width_bits, count_cores, decode, pow2_u64, RawProperties};
use log::debug;
use std::io;

/// Property access for one negotiated dialect
///
/// Chosen once by [`provider_for`] and used for the rest of the session.
pub trait PropertyProvider {
    /// Dialect this provider speaks
    fn dialect(&self) -> DriverDialect;

    /// Send the set-flags request
    fn set_flags(&self, flags: u32) -> io::Result<()>;

    /// Query and aggregate the GPU properties
    fn fetch(&self) -> Result<RawProperties>;
}

/// Fixed-layout property query of pre-r21 drivers
pub struct PreEpochProvider<'a, C: ?Sized> {
    channel: &'a C,
}

impl<'a, C: KbaseChannel + ?Sized> PreEpochProvider<'a, C> {
    /// Wrap a channel
    pub fn new(channel: &'a C) -> Self {
        Self { channel }
    }
}

impl<C: KbaseChannel + ?Sized> PropertyProvider for PreEpochProvider<'_, C> {
    fn dialect(&self) -> DriverDialect {
        DriverDialect::PreEpoch
    }

    fn set_flags(&self, flags: u32) -> io::Result<()> {
        self.channel.set_flags(DriverDialect::PreEpoch, flags)
    }

    fn fetch(&self) -> Result<RawProperties> {
        let props = self.channel.read_fixed_props().map_err(GpuInfoError::PropertyQuery)?;
        Ok(raw_from_fixed(&props)?)
    }
}

/// Two-phase size probe + tag-value buffer of r21+ drivers
pub struct PostEpochProvider<'a, C: ?Sized> {
    channel: &'a C,
}

impl<'a, C: KbaseChannel + ?Sized> PostEpochProvider<'a, C> {
    /// Wrap a channel
    pub fn new(channel: &'a C) -> Self {
        Self { channel }
    }
}

impl<C: KbaseChannel + ?Sized> PropertyProvider for PostEpochProvider<'_, C> {
    fn dialect(&self) -> DriverDialect {
        DriverDialect::PostEpoch
    }

    fn set_flags(&self, flags: u32) -> io::Result<()> {
        self.channel.set_flags(DriverDialect::PostEpoch, flags)
    }

    fn fetch(&self) -> Result<RawProperties> {
        let size = self.channel.props_size().map_err(GpuInfoError::PropertyQuery)?;
        let buffer = self.channel.read_props(size).map_err(GpuInfoError::PropertyQuery)?;
        debug!("property buffer: {} of {} bytes", buffer.len(), size);

        let fields = decode(&buffer)?;
        Ok(RawProperties::from_fields(&fields)?)
    }
}

/// Select the provider for a negotiated dialect
pub fn provider_for<'a, C: KbaseChannel + ?Sized>(
    dialect: DriverDialect,
    channel: &'a C,
) -> Box<dyn PropertyProvider + 'a> {
    match dialect {
        DriverDialect::PreEpoch => Box::new(PreEpochProvider::new(channel)),
        DriverDialect::PostEpoch => Box::new(PostEpochProvider::new(channel)),
    }
}

/// Extract the common quantities from the pre-r21 fixed layout
///
/// The layout has no CORE_FEATURES register, so `core_features` is 0.
pub fn raw_from_fixed(props: &GpuProps) -> std::result::Result<RawProperties, DecodeError> {
    let coherency = &props.coherency_info;
    let groups = coherency.num_groups as usize;
    if groups > MAX_COHERENT_GROUPS {
        return Err(DecodeError::TooManyCoherencyGroups {
            count: u64::from(coherency.num_groups),
            max: MAX_COHERENT_GROUPS,
        });
    }

    let masks: Vec<u64> = coherency.group[..groups].iter().map(|g| g.core_mask).collect();

    Ok(RawProperties {
        gpu_id: props.core_props.product_id,
        l2_slice_bytes: pow2_u64("log2_cache_size", u64::from(props.l2_props.log2_cache_size))?,
        l2_slices: u32::from(props.l2_props.num_l2_slices),
        bus_bits: bus_width_bits(u64::from(props.raw_props.l2_features))?,
        shader_cores: count_cores(&masks),
        core_features: 0,
        thread_features: props.raw_props.thread_features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MockKbaseChannel;
    use crate::mappings::ModelDatabase;
    use crate::props::{encode_property, PropertyId, ValueWidth};
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn fixed_props(product_id: u32, masks: &[u64]) -> GpuProps {
        let mut props = GpuProps::default();
        props.core_props.product_id = product_id;
        props.l2_props.log2_cache_size = 18;
        props.l2_props.num_l2_slices = 1;
        props.raw_props.l2_features = 0x0700_0000;
        props.raw_props.thread_features = 0x2000;
        props.coherency_info.num_groups = masks.len() as u32;
        props.coherency_info.num_core_groups = masks.len() as u32;
        for (slot, mask) in props.coherency_info.group.iter_mut().zip(masks) {
            slot.core_mask = *mask;
            slot.num_cores = mask.count_ones() as u16;
        }
        props
    }

    #[test]
    fn fixed_layout_extraction() {
        let raw = raw_from_fixed(&fixed_props(0x0750, &[0xF, 0x30])).unwrap();
        assert_eq!(
            raw,
            RawProperties {
                gpu_id: 0x0750,
                l2_slice_bytes: 256 * 1024,
                l2_slices: 1,
                bus_bits: 128,
                shader_cores: 6,
                core_features: 0,
                thread_features: 0x2000,
            }
        );
    }

    #[test]
    fn fixed_layout_only_counts_reported_groups() {
        let mut props = fixed_props(0x0750, &[0x3, 0xFF]);
        props.coherency_info.num_groups = 1;
        assert_eq!(raw_from_fixed(&props).unwrap().shader_cores, 2);
    }

    #[test]
    fn fixed_layout_rejects_group_overflow() {
        let mut props = fixed_props(0x0750, &[0x3]);
        props.coherency_info.num_groups = 17;
        assert_eq!(
            raw_from_fixed(&props),
            Err(DecodeError::TooManyCoherencyGroups { count: 17, max: 16 })
        );
    }

    #[test]
    fn fixed_layout_rejects_absurd_cache_size() {
        let mut props = fixed_props(0x0750, &[0x3]);
        props.l2_props.log2_cache_size = 200;
        assert!(matches!(raw_from_fixed(&props), Err(DecodeError::ValueOutOfRange { .. })));
    }

    #[test]
    fn fixed_layout_thread_features_reach_the_resolver() {
        // Single-core G31 in the reduced thread configuration
        let mut props = fixed_props(0x7003, &[0x1]);
        props.raw_props.thread_features = 0x2000;
        let raw = raw_from_fixed(&props).unwrap();
        assert_eq!(raw.thread_features, 0x2000);
        assert_eq!(raw.core_features, 0);

        let metrics = ModelDatabase::builtin().resolve(raw.gpu_id, raw.shader_cores, raw.core_features, raw.thread_features);
        assert_eq!(metrics.name, "Mali-G31");
        assert_eq!(metrics.engines, 1);
        assert_eq!(metrics.fp32_fmas, 4);

        props.raw_props.thread_features = 0x4000;
        let raw = raw_from_fixed(&props).unwrap();
        let metrics = ModelDatabase::builtin().resolve(raw.gpu_id, raw.shader_cores, raw.core_features, raw.thread_features);
        assert_eq!(metrics.engines, 2);
    }

    #[test]
    fn pre_epoch_fetch_propagates_query_errors() {
        let mut channel = MockKbaseChannel::new();
        channel
            .expect_read_fixed_props()
            .times(1)
            .returning(|| Err(io::Error::from_raw_os_error(libc::EFAULT)));

        let provider = PreEpochProvider::new(&channel);
        assert!(matches!(provider.fetch(), Err(GpuInfoError::PropertyQuery(_))));
    }

    #[test]
    fn post_epoch_fetch_sizes_then_reads() {
        let mut stream = Vec::new();
        encode_property(&mut stream, PropertyId::ProductId.code(), ValueWidth::U32, 0x7212);
        encode_property(&mut stream, PropertyId::L2Log2CacheSize.code(), ValueWidth::U8, 17);
        encode_property(&mut stream, PropertyId::L2NumL2Slices.code(), ValueWidth::U8, 1);
        encode_property(&mut stream, PropertyId::RawL2Features.code(), ValueWidth::U32, 0x0700_0000);
        encode_property(&mut stream, PropertyId::RawCoreFeatures.code(), ValueWidth::U32, 0x4);
        encode_property(&mut stream, PropertyId::CoherencyNumGroups.code(), ValueWidth::U8, 1);
        encode_property(&mut stream, PropertyId::CoherencyGroup0.code(), ValueWidth::U64, 0xFF);
        let len = stream.len();

        let mut channel = MockKbaseChannel::new();
        channel.expect_props_size().times(1).returning(move || Ok(len));
        channel
            .expect_read_props()
            .with(eq(len))
            .times(1)
            .returning(move |_| Ok(stream.clone()));

        let provider = PostEpochProvider::new(&channel);
        let raw = provider.fetch().unwrap();
        assert_eq!(raw.gpu_id, 0x7212);
        assert_eq!(raw.l2_slice_bytes, 128 * 1024);
        assert_eq!(raw.shader_cores, 8);
        assert_eq!(raw.core_features, 4);
    }

    #[test]
    fn post_epoch_size_probe_failure_skips_the_read() {
        let mut channel = MockKbaseChannel::new();
        channel
            .expect_props_size()
            .times(1)
            .returning(|| Err(io::Error::from_raw_os_error(libc::EINVAL)));
        channel.expect_read_props().never();

        let provider = PostEpochProvider::new(&channel);
        assert!(matches!(provider.fetch(), Err(GpuInfoError::PropertyQuery(_))));
    }

    #[test]
    fn post_epoch_truncated_buffer_is_a_decode_error() {
        let mut channel = MockKbaseChannel::new();
        channel.expect_props_size().returning(|| Ok(6));
        channel
            .expect_read_props()
            .returning(|_| Ok(vec![0x07, 0x00, 0x00, 0x00, 0x01, 0x02]));

        let provider = PostEpochProvider::new(&channel);
        assert!(matches!(
            provider.fetch(),
            Err(GpuInfoError::Decode(DecodeError::Truncated { .. }))
        ));
    }

    #[test]
    fn providers_follow_the_dialect() {
        let channel = MockKbaseChannel::new();
        assert_eq!(provider_for(DriverDialect::PreEpoch, &channel).dialect(), DriverDialect::PreEpoch);
        assert_eq!(provider_for(DriverDialect::PostEpoch, &channel).dialect(), DriverDialect::PostEpoch);
    }
}
