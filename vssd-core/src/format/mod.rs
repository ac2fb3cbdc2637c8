//! VSSD on-disk image format
//!
//! An image is one reserved header block followed by `block_count` data
//! blocks:
//!
//! | Offset            | Width          | Contents                              |
//! |-------------------|----------------|---------------------------------------|
//! | 0                 | 4              | block size, little-endian             |
//! | 4                 | 4              | block count, little-endian            |
//! | 8 .. block_size   | block_size - 8 | signature padding                     |
//! | block_size ..     | count × size   | data blocks, zeroed at creation       |
//!
//! The padding repeats `CA FE CA 75` aligned to the absolute offset, so the
//! word at offset 8 reads `0xCAFECA75` most significant byte first.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

use crate::blockdev::{BlockNumber, Geometry, MIN_BLOCK_COUNT, MIN_BLOCK_SIZE};

/// Signature word stored at offset 8
pub const SIGNATURE: u32 = 0xCAFE_CA75;
/// Bytes taken by the two geometry fields
pub const GEOMETRY_FIELDS_LEN: u64 = 8;
/// Offset of the signature word
pub const SIGNATURE_OFFSET: u64 = GEOMETRY_FIELDS_LEN;

/// Error type for image validation
#[derive(Error, Debug)]
pub enum FormatError {
    /// The image could not be read
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Fewer bytes than the geometry fields need
    #[error("Image too short to hold a header: {0} bytes")]
    TooShort(u64),
    /// File length differs from the length the header declares
    #[error("File size does not match header: {actual} bytes, expected {expected} bytes")]
    SizeMismatch {
        /// Length the header declares
        expected: u64,
        /// Length of the file
        actual: u64,
    },
    /// Header geometry below the minimums
    #[error("Header declares invalid geometry: block size {block_size}, block count {block_count}")]
    InvalidGeometry {
        /// Declared bytes per block
        block_size: u64,
        /// Declared number of blocks
        block_count: u64,
    },
    /// Signature word missing at its offset
    #[error("Bad signature: found {found:#010x}, expected {SIGNATURE:#010x}")]
    BadSignature {
        /// Word read at the signature offset
        found: u32,
    },
}

/// Signature padding byte stored at an absolute offset in the header block
pub fn signature_byte(offset: u64) -> u8 {
    match offset % 4 {
        0 | 2 => 0xCA,
        1 => 0xFE,
        _ => 0x75,
    }
}

/// Byte offset of a data block; block 0 sits after the reserved header block
pub fn data_offset(block_size: usize, block: BlockNumber) -> u64 {
    (block + 1) * block_size as u64
}

/// Geometry fields of the reserved header block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceHeader {
    /// Bytes per block
    pub block_size: u32,
    /// Number of data blocks
    pub block_count: u32,
}

impl DeviceHeader {
    /// Size an image with this header must have
    pub fn expected_file_len(&self) -> u64 {
        // u32::MAX * (u32::MAX + 1) still fits in a u64
        self.block_size as u64 * (self.block_count as u64 + 1)
    }

    /// Geometry described by the header
    pub fn geometry(&self) -> Result<Geometry, FormatError> {
        Geometry::new(self.block_size as usize, self.block_count as usize).map_err(|_| {
            FormatError::InvalidGeometry {
                block_size: self.block_size as u64,
                block_count: self.block_count as u64,
            }
        })
    }

    /// Write the full reserved block: geometry fields and signature padding
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.block_size)?;
        writer.write_u32::<LittleEndian>(self.block_count)?;

        let padding: Vec<u8> = (GEOMETRY_FIELDS_LEN..self.block_size as u64)
            .map(signature_byte)
            .collect();
        writer.write_all(&padding)
    }

    /// Read the geometry fields from the start of `reader`
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let block_size = reader.read_u32::<LittleEndian>()?;
        let block_count = reader.read_u32::<LittleEndian>()?;
        Ok(Self {
            block_size,
            block_count,
        })
    }
}

impl TryFrom<Geometry> for DeviceHeader {
    type Error = FormatError;

    fn try_from(geometry: Geometry) -> Result<Self, Self::Error> {
        let invalid = || FormatError::InvalidGeometry {
            block_size: geometry.block_size as u64,
            block_count: geometry.block_count as u64,
        };
        Ok(Self {
            block_size: u32::try_from(geometry.block_size).map_err(|_| invalid())?,
            block_count: u32::try_from(geometry.block_count).map_err(|_| invalid())?,
        })
    }
}

/// Write a fresh image: header block followed by zeroed data blocks
pub fn format_image<W: Write>(writer: &mut W, header: &DeviceHeader) -> io::Result<()> {
    header.write_to(writer)?;

    let zero = vec![0u8; header.block_size as usize];
    for _ in 0..header.block_count {
        writer.write_all(&zero)?;
    }
    writer.flush()
}

/// Validate an image and return its header.
///
/// Checks, in order: the image holds the geometry fields, its length equals
/// the length the header declares, the declared geometry meets the minimums,
/// and the signature word is present.
pub fn probe<R: Read + Seek>(reader: &mut R) -> Result<DeviceHeader, FormatError> {
    let actual = reader.seek(SeekFrom::End(0))?;
    if actual < GEOMETRY_FIELDS_LEN {
        return Err(FormatError::TooShort(actual));
    }

    reader.seek(SeekFrom::Start(0))?;
    let header = DeviceHeader::read_from(reader)?;

    let expected = header.expected_file_len();
    if actual != expected {
        return Err(FormatError::SizeMismatch { expected, actual });
    }

    if (header.block_size as usize) < MIN_BLOCK_SIZE || (header.block_count as usize) < MIN_BLOCK_COUNT {
        return Err(FormatError::InvalidGeometry {
            block_size: header.block_size as u64,
            block_count: header.block_count as u64,
        });
    }

    // The minimum block size leaves room for the signature word
    reader.seek(SeekFrom::Start(SIGNATURE_OFFSET))?;
    let found = reader.read_u32::<BigEndian>()?;
    if found != SIGNATURE {
        return Err(FormatError::BadSignature { found });
    }

    Ok(header)
}

/// Open the image file at `path` and validate it with [`probe`]
pub fn probe_file(path: impl AsRef<Path>) -> crate::Result<DeviceHeader> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let header = probe(&mut file)?;
    log::debug!("Validated image {}: {:?}", path.display(), header);
    Ok(header)
}
