//! Block device trait definitions for VSSD

use std::io;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::BackendKind;
use crate::format::FormatError;
use crate::status::DiskStatus;

/// Smallest block size a device may be created with
pub const MIN_BLOCK_SIZE: usize = 32;
/// Smallest number of user-addressable blocks a device may be created with
pub const MIN_BLOCK_COUNT: usize = 2;

/// Index of a block within a device
pub type BlockNumber = u64;

/// Error type for block device operations
///
/// Backends report results as [`DiskStatus`] values; this type carries the
/// detail behind a failing status so callers can tell apart failures that
/// collapse to the same status.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The operating system failed a request
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The image failed validation
    #[error("Invalid device image: {0}")]
    Format(#[from] FormatError),
    /// Block size or count below the minimum, or too large for the header
    #[error(
        "Invalid geometry: block size {block_size} (minimum {MIN_BLOCK_SIZE}), \
         block count {block_count} (minimum {MIN_BLOCK_COUNT})"
    )]
    InvalidGeometry {
        /// Requested bytes per block
        block_size: usize,
        /// Requested number of blocks
        block_count: usize,
    },
    /// Block number at or past the block count
    #[error("Invalid block number: {block} (device has {block_count} blocks)")]
    InvalidBlockNumber {
        /// Requested block
        block: BlockNumber,
        /// Blocks on the device
        block_count: usize,
    },
    /// Buffer length differs from the block size
    #[error("Invalid buffer size: {actual} (expected {expected})")]
    InvalidBufferSize {
        /// The block size
        expected: usize,
        /// Length of the caller's buffer
        actual: usize,
    },
    /// The device implements no operations
    #[error("Operation not supported by this device")]
    Unsupported,
}

impl DeviceError {
    /// The status a device reports after failing with this error
    pub fn status(&self) -> DiskStatus {
        match self {
            DeviceError::Io(_) | DeviceError::Format(FormatError::Io(_)) => DiskStatus::IoError,
            DeviceError::InvalidBlockNumber { .. } => DiskStatus::BlockOutOfRange,
            DeviceError::Unsupported => DiskStatus::NotYetImplemented,
            DeviceError::Format(_)
            | DeviceError::InvalidGeometry { .. }
            | DeviceError::InvalidBufferSize { .. } => DiskStatus::Error,
        }
    }
}

/// Result type for block device operations
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Shape of a device: the size of its blocks and how many a user can address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    /// Bytes per block
    pub block_size: usize,
    /// Number of user-addressable blocks
    pub block_count: usize,
}

impl Geometry {
    /// Validate and build a geometry
    pub fn new(block_size: usize, block_count: usize) -> Result<Self> {
        let geometry = Self { block_size, block_count };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Check the minimums and that the geometry fits the on-disk header
    pub fn validate(&self) -> Result<()> {
        let invalid = DeviceError::InvalidGeometry {
            block_size: self.block_size,
            block_count: self.block_count,
        };
        if self.block_size < MIN_BLOCK_SIZE || self.block_count < MIN_BLOCK_COUNT {
            return Err(invalid);
        }
        if u32::try_from(self.block_size).is_err() || u32::try_from(self.block_count).is_err() {
            return Err(invalid);
        }
        // Room for the data blocks plus one reserved header block
        match self.block_count.checked_add(1).and_then(|n| n.checked_mul(self.block_size)) {
            Some(_) => Ok(()),
            None => Err(invalid),
        }
    }

    /// Bytes occupied by the user-addressable blocks
    pub fn data_len(&self) -> usize {
        self.block_size * self.block_count
    }

    /// Check a request against the geometry and return the byte range of the
    /// block within a flat array of data blocks.
    ///
    /// The block number is checked before the buffer length so an out-of-range
    /// request always reports `BlockOutOfRange`.
    pub fn locate(&self, block: BlockNumber, buf_len: usize) -> Result<Range<usize>> {
        if block >= self.block_count as u64 {
            return Err(DeviceError::InvalidBlockNumber {
                block,
                block_count: self.block_count,
            });
        }
        if buf_len != self.block_size {
            return Err(DeviceError::InvalidBufferSize {
                expected: self.block_size,
                actual: buf_len,
            });
        }
        let start = block as usize * self.block_size;
        Ok(start..start + self.block_size)
    }
}

/// Trait for block device operations
///
/// Every operation reports its outcome as a [`DiskStatus`] and leaves the same
/// value in the device's last status.
pub trait BlockDevice: Send {
    /// Get the block size in bytes, or 0 if the device failed to initialize
    fn block_size(&self) -> usize;

    /// Get the number of user-addressable blocks, or 0 if the device failed
    /// to initialize
    fn block_count(&self) -> usize;

    /// Get the status of the most recent operation
    fn status(&self) -> DiskStatus;

    /// Read a block into `buf`, which must be exactly `block_size` bytes.
    /// `buf` is left untouched on failure.
    fn read(&mut self, block: BlockNumber, buf: &mut [u8]) -> DiskStatus;

    /// Write `data`, which must be exactly `block_size` bytes, to a block.
    /// Storage is left unchanged when the request is rejected.
    fn write(&mut self, block: BlockNumber, data: &[u8]) -> DiskStatus;

    /// Flush any buffered state to durable storage
    fn sync(&mut self) -> DiskStatus;

    /// Which backend this is
    fn kind(&self) -> BackendKind;

    /// Detail behind the current status, if the last operation failed
    fn last_error(&self) -> Option<&DeviceError> {
        None
    }

    /// Geometry of an initialized device
    fn geometry(&self) -> Option<Geometry> {
        Geometry::new(self.block_size(), self.block_count()).ok()
    }
}

/// Last status plus the error behind it, shared by the backends
#[derive(Debug)]
pub(crate) struct DeviceState {
    status: DiskStatus,
    last_error: Option<DeviceError>,
}

impl DeviceState {
    pub(crate) fn ok() -> Self {
        Self {
            status: DiskStatus::Ok,
            last_error: None,
        }
    }

    pub(crate) fn failed(err: DeviceError) -> Self {
        Self {
            status: err.status(),
            last_error: Some(err),
        }
    }

    pub(crate) fn status(&self) -> DiskStatus {
        self.status
    }

    pub(crate) fn last_error(&self) -> Option<&DeviceError> {
        self.last_error.as_ref()
    }

    /// Mark an operation as in progress
    pub(crate) fn begin(&mut self) {
        self.status = DiskStatus::NotReady;
    }

    pub(crate) fn succeed(&mut self) -> DiskStatus {
        self.status = DiskStatus::Ok;
        self.last_error = None;
        self.status
    }

    pub(crate) fn fail(&mut self, err: DeviceError) -> DiskStatus {
        self.status = err.status();
        log::warn!("{}", err);
        self.last_error = Some(err);
        self.status
    }

    /// Refuse an operation on a device that never initialized. The failing
    /// construction status stays in place.
    pub(crate) fn refuse(&self) -> DiskStatus {
        log::warn!("Refusing operation on uninitialized device ({})", self.status);
        self.status
    }
}
