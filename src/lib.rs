//! voxelio - CPU-side volume asset ingestion
//!
//! Decodes volumetric (medical-imaging style) data from files into in-memory
//! typed buffers, independent of any GPU upload path.
//!
//! # Features
//!
//! - NRRD decode/encode: attached `.nrrd` or detached `.nhdr` + raw file,
//!   1D-3D, eight scalar types, raw or ascii encoding, endian correction
//! - MetaImage (MHD/MHA) decode/encode: inline or external payload
//! - Loader adapters implementing the registry dispatch contract
//! - Typed `ndarray` views of decoded volumes
//!
//! All operations are synchronous blocking file IO and return typed errors;
//! no global state is involved, so independent decodes may run on
//! independent threads freely.
//!
//! # Example
//!
//! ```rust,ignore
//! use voxelio::{decode_nrrd, encode_mhd, MhdEncodeOptions};
//!
//! let volume = decode_nrrd("scan.nrrd")?;
//! println!("{}", volume.summary());
//! encode_mhd("scan.mha", &volume, &MhdEncodeOptions::default())?;
//! ```

pub mod binio;
pub mod error;
pub mod loader;
pub mod mhd;
pub mod nrrd;
pub mod utils;
pub mod volume;

// Re-exports
pub use binio::ByteOrder;
pub use error::{ErrorKind, Result, VoxelIoError};
pub use loader::{AssetType, LoadRequest, MhdLoader, NrrdLoader, VolumeLoader};
pub use mhd::{decode_mhd, encode_mhd, MhdEncodeOptions};
pub use nrrd::{decode_nrrd, encode_nrrd, NrrdEncodeOptions};
pub use volume::{PixelType, Volume, VolumeElement};

/// Version of the voxelio implementation
pub const VOXELIO_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Magic token opening every NRRD header
pub const NRRD_MAGIC: &[u8; 4] = b"NRRD";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VOXELIO_VERSION.is_empty());
    }
}
