//! Block device backends for VSSD

mod blockdev_trait;
mod file;
mod memory;
mod unimplemented;

use std::fmt;
use std::path::PathBuf;

// Re-export the block device trait and related types
pub use self::blockdev_trait::{
    BlockDevice, BlockNumber, DeviceError, Geometry, Result, MIN_BLOCK_COUNT, MIN_BLOCK_SIZE,
};
pub use self::file::FileBlockDevice;
pub use self::memory::MemoryBlockDevice;
pub use self::unimplemented::UnimplementedBlockDevice;

/// The available storage strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Volatile, zero-initialized buffer
    Memory,
    /// Persistent image file
    File,
    /// Stub that reports `NotYetImplemented` for everything
    Unimplemented,
}

impl BackendKind {
    /// Look up a backend-type token, ignoring case
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "memory" | "ram" | "ramvssd" => Some(BackendKind::Memory),
            "file" | "filevssd" => Some(BackendKind::File),
            "unimplemented" | "stub" | "unimplvssd" => Some(BackendKind::Unimplemented),
            _ => None,
        }
    }

    /// Canonical token for the backend
    pub fn token(self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::File => "file",
            BackendKind::Unimplemented => "unimplemented",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Parameters for constructing a device through [`make_device`]
#[derive(Debug, Clone, Default)]
pub struct DeviceRequest {
    /// Bytes per block
    pub block_size: usize,
    /// Number of user-addressable blocks
    pub block_count: usize,
    /// Image path, required by the file backend
    pub path: Option<PathBuf>,
    /// Create a fresh image instead of opening an existing one
    pub truncate: bool,
}

impl DeviceRequest {
    /// Request for a device with the given geometry and no backing path
    pub fn new(block_size: usize, block_count: usize) -> Self {
        Self {
            block_size,
            block_count,
            ..Default::default()
        }
    }

    /// Back the device with the image at `path`
    pub fn with_path(mut self, path: impl Into<PathBuf>, truncate: bool) -> Self {
        self.path = Some(path.into());
        self.truncate = truncate;
        self
    }
}

/// Construct a device for a backend-type token.
///
/// Returns `None` when the token is unrecognized, or when a file device is
/// requested without a path. Construction failures are reported through the
/// returned device's status, not here.
pub fn make_device(token: &str, request: &DeviceRequest) -> Option<Box<dyn BlockDevice>> {
    let Some(kind) = BackendKind::from_token(token) else {
        log::warn!("Unknown device type {:?}", token);
        return None;
    };
    build_device(kind, request)
}

/// Construct a device of a known backend kind
pub fn build_device(kind: BackendKind, request: &DeviceRequest) -> Option<Box<dyn BlockDevice>> {
    let device: Box<dyn BlockDevice> = match kind {
        BackendKind::Memory => Box::new(MemoryBlockDevice::new(request.block_size, request.block_count)),
        BackendKind::Unimplemented => Box::new(UnimplementedBlockDevice::new(
            request.block_size,
            request.block_count,
        )),
        BackendKind::File => {
            let Some(path) = request.path.as_ref() else {
                log::warn!("File device requested without an image path");
                return None;
            };
            if request.truncate {
                Box::new(FileBlockDevice::create(request.block_size, request.block_count, path))
            } else {
                Box::new(FileBlockDevice::open(path))
            }
        }
    };
    Some(device)
}
