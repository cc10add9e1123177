//! Loader adapters - the contract the asset registry dispatches through

use crate::error::{Result, VoxelIoError};
use crate::mhd::{self, is_mhd_extension};
use crate::nrrd::{self, is_nrrd_extension};
use crate::volume::Volume;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Asset kind for load requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AssetType {
    /// 2D image (PNG, JPG, etc.)
    Image = 0,
    /// 3D mesh (OBJ, STL, glTF, etc.)
    Mesh = 1,
    /// 3D volume (NRRD, MHD, etc.)
    Volume = 2,
    /// DICOM series (directory of slices)
    DicomSeries = 3,
}

/// Request to load an asset from a file path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Kind of asset to load
    pub asset_type: AssetType,
    /// File path of the asset
    pub path: PathBuf,
    /// Optional format hint (e.g. "nrrd", "mhd") for registry tie-breaking
    pub format_hint: Option<String>,
}

impl LoadRequest {
    /// Create a volume load request for the given path
    pub fn volume(path: impl Into<PathBuf>) -> Self {
        Self {
            asset_type: AssetType::Volume,
            path: path.into(),
            format_hint: None,
        }
    }
}

/// Contract for volume loaders dispatched by the asset registry.
///
/// `supports_extension` lets the registry pick a loader without attempting a
/// decode; `can_load` additionally checks the requested asset kind.
pub trait VolumeLoader: Send + Sync {
    /// Whether this loader claims the given request
    fn can_load(&self, request: &LoadRequest) -> bool {
        request.asset_type == AssetType::Volume && self.supports_extension(&request.path)
    }

    /// Whether this loader handles the path's file extension
    fn supports_extension(&self, path: &Path) -> bool;

    /// Decode the requested file into a volume
    fn load_volume(&self, request: &LoadRequest) -> Result<Volume>;
}

/// Loader for NRRD volumes (`.nrrd`, `.nhdr`)
#[derive(Debug, Default)]
pub struct NrrdLoader;

impl VolumeLoader for NrrdLoader {
    fn supports_extension(&self, path: &Path) -> bool {
        is_nrrd_extension(path)
    }

    fn load_volume(&self, request: &LoadRequest) -> Result<Volume> {
        if !self.can_load(request) {
            return Err(VoxelIoError::UnsupportedFormat {
                path: request.path.clone(),
            });
        }
        nrrd::decode_nrrd(&request.path)
    }
}

/// Loader for MetaImage volumes (`.mhd`, `.mha`)
#[derive(Debug, Default)]
pub struct MhdLoader;

impl VolumeLoader for MhdLoader {
    fn supports_extension(&self, path: &Path) -> bool {
        is_mhd_extension(path)
    }

    fn load_volume(&self, request: &LoadRequest) -> Result<Volume> {
        if !self.can_load(request) {
            return Err(VoxelIoError::UnsupportedFormat {
                path: request.path.clone(),
            });
        }
        mhd::decode_mhd(&request.path)
    }
}
