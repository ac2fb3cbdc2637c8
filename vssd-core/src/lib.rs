//! VSSD Core - the Very Simple Simulated Disk
//!
//! This crate provides a fixed-geometry block device abstraction with three
//! backends (memory, image file and an unimplemented stub), the on-disk image
//! format used by the file backend, and a line-oriented command interpreter
//! for exercising devices from scripts or an interactive shell.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rust_2018_idioms)]

pub mod block_util;
pub mod blockdev;
pub mod config;
pub mod error;
pub mod format;
pub mod protocol;
pub mod status;

// Re-export the error types
pub use error::{Error, Result};

pub use blockdev::{make_device, BackendKind, BlockDevice, BlockNumber, DeviceError, DeviceRequest, Geometry};
pub use config::{DumpFormat, SessionConfig};
pub use protocol::{Command, Flow, Session};
pub use status::DiskStatus;

/// Re-export common types and traits
pub mod prelude {
    pub use crate::blockdev::{BlockDevice, BlockNumber};
    pub use crate::error::Result;
    pub use crate::status::DiskStatus;
}
