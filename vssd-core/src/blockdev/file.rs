//! Block device backed by an image file

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::blockdev_trait::DeviceState;
use super::{BackendKind, BlockDevice, BlockNumber, DeviceError, Geometry, Result};
use crate::format::{self, DeviceHeader};
use crate::status::DiskStatus;

/// A block device that is backed by an image file on the filesystem.
///
/// The image starts with one reserved header block (see [`crate::format`]);
/// user block `n` lives at byte offset `(n + 1) * block_size`. The file handle
/// is owned by the device and closed when it is dropped.
#[derive(Debug)]
pub struct FileBlockDevice {
    file: Option<File>,
    path: PathBuf,
    geometry: Option<Geometry>,
    state: DeviceState,
}

impl FileBlockDevice {
    /// Create a new image at `path`, replacing any existing file
    pub fn create(block_size: usize, block_count: usize, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        match Self::create_image(block_size, block_count, &path) {
            Ok((file, geometry)) => {
                log::info!(
                    "Created device image {}: {} blocks of {} bytes",
                    path.display(),
                    geometry.block_count,
                    geometry.block_size
                );
                Self::ready(file, path, geometry)
            }
            Err(err) => {
                log::error!("Failed to create device image {}: {}", path.display(), err);
                Self::failed(path, err)
            }
        }
    }

    /// Open and validate an existing image at `path`
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        match Self::open_image(&path) {
            Ok((file, geometry)) => {
                log::info!(
                    "Opened device image {}: {} blocks of {} bytes",
                    path.display(),
                    geometry.block_count,
                    geometry.block_size
                );
                Self::ready(file, path, geometry)
            }
            Err(err) => {
                log::error!("Failed to open device image {}: {}", path.display(), err);
                Self::failed(path, err)
            }
        }
    }

    /// Path of the backing image
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ready(file: File, path: PathBuf, geometry: Geometry) -> Self {
        Self {
            file: Some(file),
            path,
            geometry: Some(geometry),
            state: DeviceState::ok(),
        }
    }

    fn failed(path: PathBuf, err: DeviceError) -> Self {
        Self {
            file: None,
            path,
            geometry: None,
            state: DeviceState::failed(err),
        }
    }

    fn create_image(block_size: usize, block_count: usize, path: &Path) -> Result<(File, Geometry)> {
        // Validate before touching the filesystem
        let geometry = Geometry::new(block_size, block_count)?;
        let header = DeviceHeader::try_from(geometry)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(&file);
        format::format_image(&mut writer, &header)?;
        drop(writer);

        Ok((file, geometry))
    }

    fn open_image(path: &Path) -> Result<(File, Geometry)> {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;
        let header = format::probe(&mut file)?;
        let geometry = header.geometry()?;
        Ok((file, geometry))
    }

    fn read_at(file: &mut File, offset: u64, buf: &mut [u8]) -> Result<()> {
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write_at(file: &mut File, offset: u64, data: &[u8]) -> Result<()> {
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        file.flush()?;
        Ok(())
    }
}

impl BlockDevice for FileBlockDevice {
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
        let (Some(geometry), Some(file)) = (self.geometry, self.file.as_mut()) else {
            return self.state.refuse();
        };

        if let Err(err) = geometry.locate(block, buf.len()) {
            return self.state.fail(err);
        }

        // Read into scratch space so a failed read leaves `buf` untouched
        let mut scratch = vec![0u8; geometry.block_size];
        let offset = format::data_offset(geometry.block_size, block);
        match Self::read_at(file, offset, &mut scratch) {
            Ok(()) => {
                buf.copy_from_slice(&scratch);
                log::debug!("Read block {} from {}", block, self.path.display());
                self.state.succeed()
            }
            Err(err) => self.state.fail(err),
        }
    }

    fn write(&mut self, block: BlockNumber, data: &[u8]) -> DiskStatus {
        let (Some(geometry), Some(file)) = (self.geometry, self.file.as_mut()) else {
            return self.state.refuse();
        };

        self.state.begin();
        if let Err(err) = geometry.locate(block, data.len()) {
            return self.state.fail(err);
        }

        let offset = format::data_offset(geometry.block_size, block);
        match Self::write_at(file, offset, data) {
            Ok(()) => {
                log::debug!("Wrote block {} to {}", block, self.path.display());
                self.state.succeed()
            }
            Err(err) => self.state.fail(err),
        }
    }

    fn sync(&mut self) -> DiskStatus {
        let Some(file) = self.file.as_mut() else {
            return self.state.refuse();
        };

        self.state.begin();
        match file.sync_all() {
            Ok(()) => self.state.succeed(),
            Err(err) => self.state.fail(err.into()),
        }
    }

    fn kind(&self) -> BackendKind {
        BackendKind::File
    }

    fn last_error(&self) -> Option<&DeviceError> {
        self.state.last_error()
    }
}

impl Drop for FileBlockDevice {
    fn drop(&mut self) {
        if self.file.take().is_some() {
            log::debug!("Closed device image {}", self.path.display());
        }
    }
}
