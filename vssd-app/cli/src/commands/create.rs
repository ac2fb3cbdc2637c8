//! Create command for fresh disk images

use anyhow::{anyhow, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use vssd::blockdev::FileBlockDevice;
use vssd::{BlockDevice, DiskStatus};

/// Create a zeroed disk image
#[derive(Parser, Debug)]
#[command(about = "Create a zeroed disk image")]
pub struct CreateArgs {
    /// Image file to create; an existing file is overwritten
    pub image: PathBuf,

    /// Bytes per block
    #[arg(short = 's', long = "block-size", default_value_t = 512)]
    pub block_size: usize,

    /// Number of data blocks
    #[arg(short = 'n', long = "block-count", default_value_t = 128)]
    pub block_count: usize,
}

pub fn run(args: CreateArgs) -> Result<()> {
    let mut device = FileBlockDevice::create(args.block_size, args.block_count, &args.image);
    if device.status() != DiskStatus::Ok {
        return Err(match device.last_error() {
            Some(err) => anyhow!("Failed to create {:?}: {}", args.image, err),
            None => anyhow!("Failed to create {:?}: {}", args.image, device.status()),
        });
    }

    let status = device.sync();
    if status != DiskStatus::Ok {
        return Err(anyhow!("Failed to sync {:?}: {}", device.path(), status));
    }

    info!("Created image {}", device.path().display());
    println!(
        "Created {}: {} blocks of {} bytes",
        device.path().display(),
        device.block_count(),
        device.block_size()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_writes_fresh_image() {
        let temp_dir = TempDir::new().unwrap();
        let image = temp_dir.path().join("new.img");

        run(CreateArgs {
            image: image.clone(),
            block_size: 128,
            block_count: 8,
        })
        .unwrap();

        assert_eq!(std::fs::metadata(&image).unwrap().len(), 128 * 9);
        let header = vssd::format::probe_file(&image).unwrap();
        assert_eq!((header.block_size, header.block_count), (128, 8));

        let mut device = FileBlockDevice::open(&image);
        assert_eq!(device.path(), image.as_path());
        let mut buf = [0xFFu8; 128];
        assert_eq!(device.read(7, &mut buf), DiskStatus::Ok);
        assert_eq!(buf, [0u8; 128]);
    }

    #[test]
    fn test_create_rejects_bad_geometry() {
        let temp_dir = TempDir::new().unwrap();
        let image = temp_dir.path().join("tiny.img");

        let err = run(CreateArgs {
            image: image.clone(),
            block_size: 16,
            block_count: 8,
        })
        .unwrap_err();
        assert!(err.to_string().contains("Invalid geometry"));
        assert!(!image.exists());
    }
}
