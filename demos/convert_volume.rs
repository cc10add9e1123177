//! Example: Convert a volume file between NRRD and MetaImage
//!
//! Run with: cargo run --example convert_volume -- <input> <output>
//!
//! Input and output formats are chosen by extension (.nrrd/.nhdr/.mhd/.mha).
//! With no arguments, a synthetic gradient volume is generated and converted
//! in a temp directory.

use std::path::Path;
use voxelio::{
    decode_mhd, decode_nrrd, encode_mhd, encode_nrrd, mhd::is_mhd_extension,
    nrrd::is_nrrd_extension, MhdEncodeOptions, NrrdEncodeOptions, PixelType, Volume, VoxelIoError,
};

fn decode_any(path: &Path) -> Result<Volume, VoxelIoError> {
    if is_nrrd_extension(path) {
        decode_nrrd(path)
    } else if is_mhd_extension(path) {
        decode_mhd(path)
    } else {
        Err(VoxelIoError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
    }
}

fn encode_any(path: &Path, vol: &Volume) -> Result<(), VoxelIoError> {
    if is_nrrd_extension(path) {
        encode_nrrd(path, vol, &NrrdEncodeOptions::default())
    } else if is_mhd_extension(path) {
        encode_mhd(path, vol, &MhdEncodeOptions::default())
    } else {
        Err(VoxelIoError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("voxelio Example: Volume Conversion");
    println!("==================================\n");

    let args: Vec<String> = std::env::args().collect();
    let temp_dir;
    let (input, output) = if args.len() >= 3 {
        (
            Path::new(&args[1]).to_path_buf(),
            Path::new(&args[2]).to_path_buf(),
        )
    } else {
        // Synthesize a small gradient volume to convert
        temp_dir = tempfile::tempdir()?;
        let input = temp_dir.path().join("gradient.nrrd");
        let output = temp_dir.path().join("gradient.mha");

        let mut vol = Volume::new([32, 32, 16], PixelType::U8)?;
        vol.spacing = [1.0, 1.0, 2.5];
        for (i, b) in vol.data.iter_mut().enumerate() {
            *b = (i % 256) as u8;
        }
        encode_nrrd(&input, &vol, &NrrdEncodeOptions::default())?;
        println!("(no arguments given - generated {})\n", input.display());
        (input, output)
    };

    println!("Reading {}", input.display());
    let volume = decode_any(&input)?;
    println!("  {}", volume.summary());
    println!(
        "  spacing: {:?}  origin: {:?}",
        volume.spacing, volume.origin
    );
    if let Some((min, max)) = volume.value_range() {
        println!("  value range: {} .. {}", min, max);
    }
    println!();

    println!("Writing {}", output.display());
    encode_any(&output, &volume)?;

    // Verify the conversion by reading it back
    let check = decode_any(&output)?;
    assert_eq!(check.dims, volume.dims);
    assert_eq!(check.data, volume.data);
    println!("Verified: output decodes to identical voxel data");

    Ok(())
}
