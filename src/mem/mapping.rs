//! Peripheral register mapping
//!
//! Owns the device-memory file handle and the `mmap`ed page. This is the
//! only place in the crate that dereferences raw pointers.

use log::{debug, trace, warn};
use std::fs::{File, OpenOptions};
use std::marker::PhantomData;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::ptr::{self, NonNull};

use super::DEV_MEM;
use crate::error::{GpioError, Result};
use crate::regs::{checked_word_index, RegisterView, PAGE_SIZE};

// 32-bit glibc has a 32-bit off_t; peripheral bases above 2 GiB need the 64-bit call
#[cfg(all(target_os = "linux", target_env = "gnu"))]
use libc::{mmap64 as mmap, off64_t as off_t};
#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
use libc::{mmap, off_t};

/// One page of peripheral registers mapped from a device-memory node.
///
/// The mapped pointer is present if and only if the mapping is active.
/// `close` is idempotent and also runs on drop.
#[derive(Debug)]
pub struct PeripheralMapping {
    base: u32,
    device: PathBuf,
    file: Option<File>,
    mapped: Option<NonNull<u32>>,
}

impl PeripheralMapping {
    /// Create a disconnected mapping for `base` on `device`
    pub fn new(device: impl AsRef<Path>, base: u32) -> Self {
        Self {
            base,
            device: device.as_ref().to_path_buf(),
            file: None,
            mapped: None,
        }
    }

    /// Map one page of `/dev/mem` at physical address `base`
    pub fn open(base: u32) -> Result<Self> {
        Self::open_device(DEV_MEM, base)
    }

    /// Map one page of `device` at offset `base`
    pub fn open_device(device: impl AsRef<Path>, base: u32) -> Result<Self> {
        let mut mapping = Self::new(device, base);
        mapping.connect()?;
        Ok(mapping)
    }

    /// Open the device node and map the page. No-op if already connected.
    pub fn connect(&mut self) -> Result<()> {
        if self.mapped.is_some() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(&self.device)
            .map_err(|source| GpioError::Acquisition {
                action: "open",
                device: self.device.clone(),
                source,
            })?;

        // SAFETY: a fresh shared mapping of a file we hold open; the kernel
        // picks the address and the result is checked below.
        let ptr = unsafe {
            mmap(
                ptr::null_mut(),
                PAGE_SIZE,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                off_t::from(self.base),
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(GpioError::Acquisition {
                action: "map",
                device: self.device.clone(),
                source: std::io::Error::last_os_error(),
            });
        }

        let mapped = NonNull::new(ptr.cast::<u32>()).ok_or_else(|| GpioError::Acquisition {
            action: "map",
            device: self.device.clone(),
            source: std::io::Error::from_raw_os_error(libc::EFAULT),
        })?;

        debug!(
            "Mapped {} bytes of {} at {:#010x}",
            PAGE_SIZE,
            self.device.display(),
            self.base
        );

        self.file = Some(file);
        self.mapped = Some(mapped);
        Ok(())
    }

    /// Unmap the page and close the device. Safe to call any number of times.
    pub fn close(&mut self) {
        if let Some(mapped) = self.mapped.take() {
            // SAFETY: `mapped` came from a successful mmap of PAGE_SIZE bytes
            // and was just taken out of `self`, so nothing can use it again.
            let rc = unsafe { libc::munmap(mapped.as_ptr().cast(), PAGE_SIZE) };
            if rc != 0 {
                warn!(
                    "munmap of {} failed: {}",
                    self.device.display(),
                    std::io::Error::last_os_error()
                );
            }
        }

        if self.file.take().is_some() {
            debug!("Released {}", self.device.display());
        }
    }

    /// Whether the page is currently mapped
    pub fn is_connected(&self) -> bool {
        self.mapped.is_some()
    }

    /// Offset (physical address for `/dev/mem`) the page is mapped from
    pub fn base_address(&self) -> u32 {
        self.base
    }

    /// Device-memory node backing the mapping
    pub fn device(&self) -> &Path {
        &self.device
    }

    /// Borrow a register view over the live mapping
    pub fn registers(&mut self) -> Result<MappedRegisters<'_>> {
        let base = self.mapped.ok_or(GpioError::NotConnected)?;
        Ok(MappedRegisters {
            base,
            _mapping: PhantomData,
        })
    }
}

impl Drop for PeripheralMapping {
    fn drop(&mut self) {
        self.close();
    }
}

/// Volatile register access over a live `PeripheralMapping`.
///
/// Holds the mapping mutably borrowed, so the page cannot be unmapped while
/// a view exists.
#[derive(Debug)]
pub struct MappedRegisters<'a> {
    base: NonNull<u32>,
    _mapping: PhantomData<&'a mut PeripheralMapping>,
}

impl RegisterView for MappedRegisters<'_> {
    fn read(&self, offset: usize) -> u32 {
        let index = checked_word_index(offset);
        // SAFETY: index is within the mapped page and the borrow keeps it mapped
        let value = unsafe { ptr::read_volatile(self.base.as_ptr().add(index)) };
        trace!("read  [{:#04x}] -> {:#010x}", offset, value);
        value
    }

    fn write(&mut self, offset: usize, value: u32) {
        let index = checked_word_index(offset);
        trace!("write [{:#04x}] <- {:#010x}", offset, value);
        // SAFETY: index is within the mapped page and the borrow keeps it mapped
        unsafe { ptr::write_volatile(self.base.as_ptr().add(index), value) };
    }
}
