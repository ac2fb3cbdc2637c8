//! RAM-backed block device

use std::io;

use super::blockdev_trait::DeviceState;
use super::{BackendKind, BlockDevice, BlockNumber, DeviceError, Geometry};
use crate::status::DiskStatus;

/// A volatile block device held in a zero-initialized buffer.
///
/// There is nothing to reopen: every instance starts zeroed and its contents
/// are gone when it is dropped.
#[derive(Debug)]
pub struct MemoryBlockDevice {
    data: Vec<u8>,
    geometry: Option<Geometry>,
    state: DeviceState,
}

impl MemoryBlockDevice {
    /// Create a zeroed device with the given geometry.
    ///
    /// Invalid geometry, or a buffer that cannot be allocated, yields a device
    /// whose status reports the failure and which refuses all I/O.
    pub fn new(block_size: usize, block_count: usize) -> Self {
        match Self::allocate(block_size, block_count) {
            Ok((geometry, data)) => {
                log::info!(
                    "Created memory device: {} blocks of {} bytes",
                    geometry.block_count,
                    geometry.block_size
                );
                Self {
                    data,
                    geometry: Some(geometry),
                    state: DeviceState::ok(),
                }
            }
            Err(err) => {
                log::error!("Failed to create memory device: {}", err);
                Self {
                    data: Vec::new(),
                    geometry: None,
                    state: DeviceState::failed(err),
                }
            }
        }
    }

    fn allocate(block_size: usize, block_count: usize) -> Result<(Geometry, Vec<u8>), DeviceError> {
        let geometry = Geometry::new(block_size, block_count)?;
        let len = geometry.data_len();

        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| {
            DeviceError::Io(io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!("cannot allocate {} bytes", len),
            ))
        })?;
        data.resize(len, 0);

        Ok((geometry, data))
    }
}

impl BlockDevice for MemoryBlockDevice {
    fn block_size(&self) -> usize {
        self.geometry.map_or(0, |g| g.block_size)
    }

    fn block_count(&self) -> usize {
        self.geometry.map_or(0, |g| g.block_count)
    }

    fn status(&self) -> DiskStatus {
        self.state.status()
    }

    fn read(&mut self, block: BlockNumber, buf: &mut [u8]) -> DiskStatus {
        let Some(geometry) = self.geometry else {
            return self.state.refuse();
        };

        match geometry.locate(block, buf.len()) {
            Ok(range) => {
                buf.copy_from_slice(&self.data[range]);
                self.state.succeed()
            }
            Err(err) => self.state.fail(err),
        }
    }

    fn write(&mut self, block: BlockNumber, data: &[u8]) -> DiskStatus {
        let Some(geometry) = self.geometry else {
            return self.state.refuse();
        };

        self.state.begin();
        match geometry.locate(block, data.len()) {
            Ok(range) => {
                self.data[range].copy_from_slice(data);
                self.state.succeed()
            }
            Err(err) => self.state.fail(err),
        }
    }

    fn sync(&mut self) -> DiskStatus {
        self.state.status()
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn last_error(&self) -> Option<&DeviceError> {
        self.state.last_error()
    }
}
