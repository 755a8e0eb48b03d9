//! RAII handle on a kbase device node

use super::kbase::{post_r21, pre_r21};
use super::KbaseChannel;
use crate::error::{GpuInfoError, Result};
use crate::protocol::{DriverDialect, VersionProbe, VersionReply};
use log::{debug, trace};
use std::ffi::CString;
use std::io;
use std::mem;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

/// Open kbase device node
///
/// The descriptor is closed when the value is dropped, including when
/// construction of a higher-level object fails after the open succeeded.
#[derive(Debug)]
pub struct MaliDevice {
    fd: RawFd,
    path: PathBuf,
}

impl MaliDevice {
    /// Open `path` read-only and check that it is a character device
    pub fn open(path: &Path) -> Result<Self> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| GpuInfoError::ChannelOpen(io::Error::new(io::ErrorKind::InvalidInput, e)))?;

        let fd = unsafe { libc::open(c_path.as_ptr(), libc::O_RDONLY | libc::O_CLOEXEC) };
        if fd < 0 {
            return Err(GpuInfoError::ChannelOpen(io::Error::last_os_error()));
        }

        // Owned from here on so every early return closes it.
        let device = Self { fd, path: path.to_path_buf() };

        let mut stat: libc::stat = unsafe { mem::zeroed() };
        if unsafe { libc::fstat(device.fd, &mut stat) } < 0 {
            return Err(GpuInfoError::ChannelOpen(io::Error::last_os_error()));
        }
        if stat.st_mode & libc::S_IFMT != libc::S_IFCHR {
            return Err(GpuInfoError::NotACharacterDevice(path.display().to_string()));
        }

        debug!("opened {} (fd {})", path.display(), fd);
        Ok(device)
    }

    /// Path the device was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ioctl<T>(&self, request: u32, arg: &mut T) -> io::Result<i32> {
        let ret = unsafe { libc::ioctl(self.fd, request as _, arg as *mut T) };
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(ret)
        }
    }
}

impl AsRawFd for MaliDevice {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for MaliDevice {
    fn drop(&mut self) {
        if self.fd >= 0 {
            unsafe { libc::close(self.fd) };
            self.fd = -1;
        }
    }
}

impl KbaseChannel for MaliDevice {
    fn version_check(&self, probe: VersionProbe) -> VersionReply {
        let result = match probe {
            VersionProbe::PreEpoch => {
                let mut args = pre_r21::VersionCheck {
                    header: pre_r21::FUNC_VERSION_CHECK,
                    ..Default::default()
                };
                self.ioctl(pre_r21::VERSION_CHECK, &mut args)
                    .map(|_| VersionReply { major: args.major, minor: args.minor })
            }
            VersionProbe::JobManager | VersionProbe::CommandStream => {
                let request = if probe == VersionProbe::JobManager {
                    post_r21::VERSION_CHECK_JM
                } else {
                    post_r21::VERSION_CHECK_CSF
                };
                let mut args = post_r21::VersionCheck::default();
                self.ioctl(request, &mut args)
                    .map(|_| VersionReply { major: args.major, minor: args.minor })
            }
        };

        result.unwrap_or_else(|err| {
            trace!("{:?} version check failed: {}", probe, err);
            VersionReply::default()
        })
    }

    fn set_flags(&self, dialect: DriverDialect, flags: u32) -> io::Result<()> {
        match dialect {
            DriverDialect::PreEpoch => {
                let mut args = pre_r21::SetFlags {
                    header: pre_r21::FUNC_SET_FLAGS,
                    create_flags: flags,
                    padding: 0,
                };
                self.ioctl(pre_r21::SET_FLAGS, &mut args)?;
            }
            DriverDialect::PostEpoch => {
                let mut args = post_r21::SetFlags { create_flags: flags };
                self.ioctl(post_r21::SET_FLAGS, &mut args)?;
            }
        }
        Ok(())
    }

    fn read_fixed_props(&self) -> io::Result<pre_r21::GpuProps> {
        let mut args = pre_r21::GetProps {
            header: pre_r21::FUNC_GET_PROPS,
            ..Default::default()
        };
        self.ioctl(pre_r21::GET_GPUPROPS, &mut args)?;
        Ok(args.props)
    }

    fn props_size(&self) -> io::Result<usize> {
        let mut args = post_r21::GetProps::default();
        let size = self.ioctl(post_r21::GET_GPUPROPS, &mut args)?;
        Ok(size as usize)
    }

    fn read_props(&self, size: usize) -> io::Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        let mut args = post_r21::GetProps {
            buffer: buffer.as_mut_ptr() as u64,
            size: u32::try_from(size).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?,
            flags: 0,
        };
        let written = self.ioctl(post_r21::GET_GPUPROPS, &mut args)?;
        buffer.truncate((written as usize).min(size));
        Ok(buffer)
    }
}
