//! Inspect command for validating disk images

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use vssd::format::{self, DeviceHeader, SIGNATURE, SIGNATURE_OFFSET};

/// Show the header of a disk image and whether it validates
#[derive(Parser, Debug)]
#[command(about = "Show and validate the header of a disk image")]
pub struct InspectArgs {
    /// Image file to inspect
    pub image: PathBuf,
}

pub fn run(args: InspectArgs) -> Result<()> {
    let file = File::open(&args.image)
        .with_context(|| format!("Failed to open image: {:?}", args.image))?;
    let actual_len = file
        .metadata()
        .with_context(|| format!("Failed to get file metadata: {:?}", args.image))?
        .len();

    println!("Image:           {}", args.image.display());
    println!("File size:       {} bytes", actual_len);

    // A file shorter than the geometry fields has nothing to show
    match DeviceHeader::read_from(&mut BufReader::new(file)) {
        Ok(header) => {
            println!("Block size:      {}", header.block_size);
            println!("Block count:     {}", header.block_count);
            println!("Expected size:   {} bytes", header.expected_file_len());
        }
        Err(_) => println!("Header:          unreadable"),
    }
    println!("Signature:       {:#010x} at offset {}", SIGNATURE, SIGNATURE_OFFSET);

    match format::probe_file(&args.image) {
        Ok(_) => {
            println!("Verdict:         valid");
            Ok(())
        }
        Err(err) => {
            println!("Verdict:         invalid ({})", err);
            bail!("{:?} is not a valid disk image", args.image)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use tempfile::TempDir;
    use vssd::blockdev::FileBlockDevice;

    fn inspect(image: &std::path::Path) -> Result<()> {
        run(InspectArgs {
            image: image.to_path_buf(),
        })
    }

    #[test]
    fn test_inspect_fresh_image() {
        let temp_dir = TempDir::new().unwrap();
        let image = temp_dir.path().join("fresh.img");
        drop(FileBlockDevice::create(64, 4, &image));

        assert!(inspect(&image).is_ok());
    }

    #[test]
    fn test_inspect_truncated_image_fails() {
        let temp_dir = TempDir::new().unwrap();
        let image = temp_dir.path().join("cut.img");
        drop(FileBlockDevice::create(1024, 256, &image));
        OpenOptions::new()
            .write(true)
            .open(&image)
            .and_then(|f| f.set_len(255 * 1024))
            .unwrap();

        let err = inspect(&image).unwrap_err();
        assert!(err.to_string().contains("not a valid disk image"));
    }

    #[test]
    fn test_inspect_short_and_missing_files() {
        let temp_dir = TempDir::new().unwrap();
        let short = temp_dir.path().join("short.txt");
        std::fs::write(&short, "hi").unwrap();
        assert!(inspect(&short).is_err());

        let missing = temp_dir.path().join("missing.img");
        let err = inspect(&missing).unwrap_err();
        assert!(err.to_string().starts_with("Failed to open image"));
    }
}
