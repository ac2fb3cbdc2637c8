//! Disk status model shared by every backend

use std::fmt;

/// Placeholder returned by [`name_of_code`] for values outside the enumeration
pub const UNKNOWN_STATUS: &str = "UNKNOWN_STATUS";

/// Outcome of a disk operation.
///
/// Every device operation leaves the device's last status set to exactly one
/// of these. `NoSuchStatus` is never an operation result; it is only produced
/// by [`DiskStatus::from_name`] when the input names no status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DiskStatus {
    /// The operation completed
    Ok = 0,
    /// An operation is in progress or the device is not usable yet
    NotReady = 1,
    /// The block number is outside `[0, block_count)`
    BlockOutOfRange = 2,
    // Implementation-defined codes go between BlockOutOfRange and Error
    /// The operating system failed an I/O request
    IoError = 3,
    /// Structural or validation failure (bad header, size mismatch, bad signature)
    Error = 4,
    /// The backend does not support the operation
    NotYetImplemented = 5,
    /// Name lookup sentinel
    NoSuchStatus = 255,
}

const OPERATIONAL: [DiskStatus; 6] = [
    DiskStatus::Ok,
    DiskStatus::NotReady,
    DiskStatus::BlockOutOfRange,
    DiskStatus::IoError,
    DiskStatus::Error,
    DiskStatus::NotYetImplemented,
];

impl DiskStatus {
    /// Canonical name of the status
    pub fn to_name(self) -> &'static str {
        match self {
            DiskStatus::Ok => "OK",
            DiskStatus::NotReady => "NOT_READY",
            DiskStatus::BlockOutOfRange => "BLOCK_OUT_OF_RANGE",
            DiskStatus::IoError => "IO_ERROR",
            DiskStatus::Error => "ERROR",
            DiskStatus::NotYetImplemented => "NOT_YET_IMPLEMENTED",
            DiskStatus::NoSuchStatus => "NO_SUCH_STATUS",
        }
    }

    /// Parse a status name.
    ///
    /// Accepts the canonical names and the CamelCase variant names. Anything
    /// else, including the sentinel's own name, yields `NoSuchStatus`.
    pub fn from_name(name: &str) -> DiskStatus {
        let name = name.trim();
        OPERATIONAL
            .iter()
            .copied()
            .find(|status| status.to_name() == name || status.variant_name() == name)
            .unwrap_or(DiskStatus::NoSuchStatus)
    }

    /// Numeric code of the status
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Status for a numeric code, if there is one
    pub fn from_code(code: u8) -> Option<DiskStatus> {
        match code {
            255 => Some(DiskStatus::NoSuchStatus),
            _ => OPERATIONAL.iter().copied().find(|s| s.code() == code),
        }
    }

    /// Whether this is `Ok`
    pub fn is_ok(self) -> bool {
        self == DiskStatus::Ok
    }

    fn variant_name(self) -> &'static str {
        match self {
            DiskStatus::Ok => "Ok",
            DiskStatus::NotReady => "NotReady",
            DiskStatus::BlockOutOfRange => "BlockOutOfRange",
            DiskStatus::IoError => "IoError",
            DiskStatus::Error => "Error",
            DiskStatus::NotYetImplemented => "NotYetImplemented",
            DiskStatus::NoSuchStatus => "NoSuchStatus",
        }
    }
}

/// Name for a raw status code, or [`UNKNOWN_STATUS`]
pub fn name_of_code(code: u8) -> &'static str {
    DiskStatus::from_code(code)
        .map(DiskStatus::to_name)
        .unwrap_or(UNKNOWN_STATUS)
}

impl fmt::Display for DiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}
