//! kbase interface negotiation
//!
//! The driver exposes one of two incompatible ioctl dialects. The version
//! probes are sent in a fixed order because their request codes alias:
//! the command-stream probe reuses the number of an old pre-r21 request, so
//! the pre-r21 probe has to run (and be checked) first.

mod provider;

pub use provider::{provider_for, raw_from_fixed, PostEpochProvider, PreEpochProvider, PropertyProvider};

use crate::device::{kbase::SYSTEM_MONITOR_FLAG_SUBMIT_DISABLED, KbaseChannel};
use crate::error::{GpuInfoError, Result};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// Oldest supported job-manager interface version
pub const MIN_SUPPORTED_VERSION: (u16, u16) = (10, 2);

/// kbase ioctl dialect, fixed once negotiated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverDialect {
    /// UK interface of drivers older than r21
    PreEpoch,
    /// Interface of r21 and newer drivers (JM and CSF)
    PostEpoch,
}

/// Version-check requests, in the order they are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionProbe {
    /// Pre-r21 version check
    PreEpoch,
    /// Post-r21 job-manager version check
    JobManager,
    /// Post-r21 command-stream (CSF) version check
    CommandStream,
}

impl VersionProbe {
    /// Probe order used by [`negotiate`]
    pub const ORDER: [VersionProbe; 3] = [
        VersionProbe::PreEpoch,
        VersionProbe::JobManager,
        VersionProbe::CommandStream,
    ];

    /// Dialect implied by a non-zero reply to this probe
    pub fn dialect(self) -> DriverDialect {
        match self {
            VersionProbe::PreEpoch => DriverDialect::PreEpoch,
            VersionProbe::JobManager | VersionProbe::CommandStream => DriverDialect::PostEpoch,
        }
    }

    /// CSF drivers are supported at any version
    pub fn enforces_minimum(self) -> bool {
        !matches!(self, VersionProbe::CommandStream)
    }
}

/// Interface version reported by the driver; all-zero when the probe got no answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionReply {
    /// Major version
    pub major: u16,
    /// Minor version
    pub minor: u16,
}

impl VersionReply {
    /// True if the driver answered the probe
    pub fn is_set(&self) -> bool {
        self.major != 0 || self.minor != 0
    }
}

/// True for job-manager interface versions 10.2 and newer
pub fn is_supported_version(major: u16, minor: u16) -> bool {
    let (min_major, min_minor) = MIN_SUPPORTED_VERSION;
    major > min_major || (major == min_major && minor >= min_minor)
}

/// Detect the driver dialect
///
/// The first probe with a non-zero reply decides the dialect. An answered
/// probe with an unsupported version fails immediately; later probes are
/// not tried.
pub fn negotiate<C: KbaseChannel + ?Sized>(channel: &C) -> Result<DriverDialect> {
    for probe in VersionProbe::ORDER {
        let reply = channel.version_check(probe);
        trace!("version probe {:?} -> {}.{}", probe, reply.major, reply.minor);

        if !reply.is_set() {
            continue;
        }

        if probe.enforces_minimum() && !is_supported_version(reply.major, reply.minor) {
            return Err(GpuInfoError::UnsupportedVersion { major: reply.major, minor: reply.minor });
        }

        let dialect = probe.dialect();
        debug!("kbase interface {}.{} ({:?}, {:?})", reply.major, reply.minor, probe, dialect);
        return Ok(dialect);
    }

    Err(GpuInfoError::NoDialectDetected)
}

/// Set the context flags for a negotiated session
///
/// EINVAL (flags already set on this file) and EPERM are benign.
pub fn configure(provider: &dyn PropertyProvider) -> Result<()> {
    match provider.set_flags(SYSTEM_MONITOR_FLAG_SUBMIT_DISABLED) {
        Ok(()) => Ok(()),
        Err(err) if matches!(err.raw_os_error(), Some(libc::EINVAL) | Some(libc::EPERM)) => {
            debug!("ignoring set_flags error: {}", err);
            Ok(())
        }
        Err(err) => Err(GpuInfoError::Configuration(err)),
    }
}
