//! Stub device that implements nothing

use super::blockdev_trait::DeviceState;
use super::{BackendKind, BlockDevice, BlockNumber, DeviceError};
use crate::status::DiskStatus;

/// A device whose every operation reports `NotYetImplemented`.
///
/// Useful for exercising callers of the device contract without any storage
/// behind it. Geometry queries return 0.
#[derive(Debug)]
pub struct UnimplementedBlockDevice {
    state: DeviceState,
}

impl UnimplementedBlockDevice {
    /// Create the stub. The requested geometry is ignored.
    pub fn new(_block_size: usize, _block_count: usize) -> Self {
        Self {
            state: DeviceState::failed(DeviceError::Unsupported),
        }
    }
}

impl BlockDevice for UnimplementedBlockDevice {
    fn block_size(&self) -> usize {
        0
    }

    fn block_count(&self) -> usize {
        0
    }

    fn status(&self) -> DiskStatus {
        self.state.status()
    }

    fn read(&mut self, _block: BlockNumber, _buf: &mut [u8]) -> DiskStatus {
        DiskStatus::NotYetImplemented
    }

    fn write(&mut self, _block: BlockNumber, _data: &[u8]) -> DiskStatus {
        DiskStatus::NotYetImplemented
    }

    fn sync(&mut self) -> DiskStatus {
        DiskStatus::NotYetImplemented
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Unimplemented
    }

    fn last_error(&self) -> Option<&DeviceError> {
        self.state.last_error()
    }
}
