//! Core volume data model - dimensions, spacing, orientation, typed raw buffer

use crate::error::{Result, VoxelIoError};
use crate::utils::{bytes_to_typed_data, format_bytes};
use ndarray::Array3;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar voxel types supported by the volume codecs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum PixelType {
    /// Not yet determined / unsupported
    #[default]
    Unknown = 0,
    /// Unsigned 8-bit integer
    U8 = 1,
    /// Signed 8-bit integer
    I8 = 2,
    /// Unsigned 16-bit integer
    U16 = 3,
    /// Signed 16-bit integer
    I16 = 4,
    /// Unsigned 32-bit integer
    U32 = 5,
    /// Signed 32-bit integer
    I32 = 6,
    /// 32-bit floating point
    F32 = 7,
    /// 64-bit floating point
    F64 = 8,
}

impl PixelType {
    /// Size in bytes of one voxel of this type (0 for Unknown)
    pub fn size_in_bytes(&self) -> usize {
        match self {
            PixelType::Unknown => 0,
            PixelType::U8 | PixelType::I8 => 1,
            PixelType::U16 | PixelType::I16 => 2,
            PixelType::U32 | PixelType::I32 | PixelType::F32 => 4,
            PixelType::F64 => 8,
        }
    }

    /// Check if this is a floating point type
    pub fn is_float(&self) -> bool {
        matches!(self, PixelType::F32 | PixelType::F64)
    }

    /// Check if this is an integer type
    pub fn is_integer(&self) -> bool {
        !matches!(self, PixelType::Unknown) && !self.is_float()
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Rust scalar types that can back a [`Volume`] buffer.
///
/// Links each native element type to its [`PixelType`] tag so typed views can
/// be checked at runtime.
pub trait VolumeElement: Copy + ToPrimitive + 'static {
    /// The pixel type tag matching this element type.
    const PIXEL_TYPE: PixelType;
}

impl VolumeElement for u8 {
    const PIXEL_TYPE: PixelType = PixelType::U8;
}
impl VolumeElement for i8 {
    const PIXEL_TYPE: PixelType = PixelType::I8;
}
impl VolumeElement for u16 {
    const PIXEL_TYPE: PixelType = PixelType::U16;
}
impl VolumeElement for i16 {
    const PIXEL_TYPE: PixelType = PixelType::I16;
}
impl VolumeElement for u32 {
    const PIXEL_TYPE: PixelType = PixelType::U32;
}
impl VolumeElement for i32 {
    const PIXEL_TYPE: PixelType = PixelType::I32;
}
impl VolumeElement for f32 {
    const PIXEL_TYPE: PixelType = PixelType::F32;
}
impl VolumeElement for f64 {
    const PIXEL_TYPE: PixelType = PixelType::F64;
}

/// 3D volume for medical/imaging data
///
/// Dimensions (width, height, depth), physical spacing, world-space origin,
/// direction cosines, pixel type, and a contiguous raw buffer in host byte
/// order. Axis 0 (x) is fastest-varying in the buffer; 1D/2D sources are
/// stored with unused trailing dimensions padded to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    /// Width (x), height (y), depth (z) in voxels
    pub dims: [usize; 3],
    /// Physical units per voxel along each axis
    pub spacing: [f64; 3],
    /// World-space position of voxel (0, 0, 0)
    pub origin: [f64; 3],
    /// Row-major axis direction cosines
    pub direction: [[f64; 3]; 3],
    /// Scalar type of each voxel
    pub pixel_type: PixelType,
    /// Scalar components per voxel (the codecs only handle 1)
    pub components: usize,
    /// Raw voxel bytes, host byte order
    pub data: Vec<u8>,
}

impl Default for Volume {
    fn default() -> Self {
        Self {
            dims: [0, 0, 0],
            spacing: [1.0, 1.0, 1.0],
            origin: [0.0, 0.0, 0.0],
            direction: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            pixel_type: PixelType::Unknown,
            components: 1,
            data: Vec::new(),
        }
    }
}

impl Volume {
    /// Create a scalar volume with the given dimensions and a zeroed buffer
    pub fn new(dims: [usize; 3], pixel_type: PixelType) -> Result<Self> {
        if dims.iter().any(|&d| d == 0) {
            return Err(VoxelIoError::InvalidArgument(format!(
                "volume dimensions must be positive, got {}x{}x{}",
                dims[0], dims[1], dims[2]
            )));
        }
        if pixel_type == PixelType::Unknown {
            return Err(VoxelIoError::InvalidArgument(
                "volume pixel type must be known".to_string(),
            ));
        }

        let mut vol = Volume {
            dims,
            pixel_type,
            ..Default::default()
        };
        vol.data = vec![0u8; vol.byte_count()];
        Ok(vol)
    }

    /// Width (x) in voxels
    pub fn width(&self) -> usize {
        self.dims[0]
    }

    /// Height (y) in voxels
    pub fn height(&self) -> usize {
        self.dims[1]
    }

    /// Depth (z) in voxels
    pub fn depth(&self) -> usize {
        self.dims[2]
    }

    /// Total number of voxels
    pub fn voxel_count(&self) -> usize {
        self.dims.iter().product()
    }

    /// Required buffer size in bytes for a valid volume
    pub fn byte_count(&self) -> usize {
        self.voxel_count() * self.components * self.pixel_type.size_in_bytes()
    }

    /// The single authoritative validity check: true when any dimension is
    /// zero or the buffer is shorter than [`byte_count`](Self::byte_count).
    pub fn is_empty(&self) -> bool {
        self.dims.iter().any(|&d| d == 0) || self.data.len() < self.byte_count()
    }

    /// View the buffer as typed data.
    ///
    /// Fails with `InvalidArgument` when `T` does not match
    /// [`pixel_type`](Self::pixel_type) or the volume is empty.
    pub fn as_typed<T: VolumeElement>(&self) -> Result<Vec<T>> {
        if T::PIXEL_TYPE != self.pixel_type {
            return Err(VoxelIoError::InvalidArgument(format!(
                "element type {} does not match volume pixel type {}",
                T::PIXEL_TYPE,
                self.pixel_type
            )));
        }
        if self.is_empty() {
            return Err(VoxelIoError::InvalidArgument(
                "cannot view an empty volume".to_string(),
            ));
        }
        bytes_to_typed_data(&self.data[..self.byte_count()])
    }

    /// Copy the buffer into a typed `ndarray` with shape (depth, height,
    /// width), so the x axis stays contiguous.
    pub fn to_ndarray<T: VolumeElement>(&self) -> Result<Array3<T>> {
        let data = self.as_typed::<T>()?;
        Array3::from_shape_vec((self.depth(), self.height(), self.width()), data)
            .map_err(|e| VoxelIoError::InvalidArgument(e.to_string()))
    }

    /// Scan the buffer for its minimum and maximum values as f64.
    ///
    /// Returns `None` for empty volumes or an `Unknown` pixel type.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        if self.is_empty() {
            return None;
        }
        match self.pixel_type {
            PixelType::Unknown => None,
            PixelType::U8 => self.scan_range::<u8>(),
            PixelType::I8 => self.scan_range::<i8>(),
            PixelType::U16 => self.scan_range::<u16>(),
            PixelType::I16 => self.scan_range::<i16>(),
            PixelType::U32 => self.scan_range::<u32>(),
            PixelType::I32 => self.scan_range::<i32>(),
            PixelType::F32 => self.scan_range::<f32>(),
            PixelType::F64 => self.scan_range::<f64>(),
        }
    }

    fn scan_range<T: VolumeElement>(&self) -> Option<(f64, f64)> {
        let values = self.as_typed::<T>().ok()?;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            let v = v.to_f64()?;
            min = min.min(v);
            max = max.max(v);
        }
        Some((min, max))
    }

    /// Get a summary string of the volume
    pub fn summary(&self) -> String {
        format!(
            "Volume: {} x {} x {} ({:?}), {}",
            self.dims[0],
            self.dims[1],
            self.dims[2],
            self.pixel_type,
            format_bytes(self.byte_count())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_type_sizes() {
        assert_eq!(PixelType::Unknown.size_in_bytes(), 0);
        assert_eq!(PixelType::U8.size_in_bytes(), 1);
        assert_eq!(PixelType::I16.size_in_bytes(), 2);
        assert_eq!(PixelType::F32.size_in_bytes(), 4);
        assert_eq!(PixelType::F64.size_in_bytes(), 8);
        assert!(PixelType::F32.is_float());
        assert!(PixelType::U32.is_integer());
        assert!(!PixelType::Unknown.is_integer());
    }

    #[test]
    fn test_default_is_empty() {
        let vol = Volume::default();
        assert_eq!(vol.width(), 0);
        assert_eq!(vol.height(), 0);
        assert_eq!(vol.depth(), 0);
        assert_eq!(vol.voxel_count(), 0);
        assert_eq!(vol.byte_count(), 0);
        assert!(vol.is_empty());
    }

    #[test]
    fn test_new_allocates_exact_buffer() {
        let vol = Volume::new([4, 3, 2], PixelType::U16).unwrap();
        assert!(!vol.is_empty());
        assert_eq!(vol.voxel_count(), 24);
        assert_eq!(vol.byte_count(), 48);
        assert_eq!(vol.data.len(), 48);
    }

    #[test]
    fn test_new_rejects_bad_args() {
        assert!(Volume::new([0, 2, 2], PixelType::U8).is_err());
        assert!(Volume::new([2, 2, 2], PixelType::Unknown).is_err());
    }

    #[test]
    fn test_empty_when_buffer_short() {
        let mut vol = Volume::new([2, 2, 2], PixelType::U8).unwrap();
        vol.data.truncate(7);
        assert!(vol.is_empty());
    }

    #[test]
    fn test_typed_view_and_range() {
        let mut vol = Volume::new([2, 2, 1], PixelType::I16).unwrap();
        let values: Vec<i16> = vec![-5, 0, 7, 100];
        vol.data = crate::utils::typed_data_to_bytes(&values);

        assert_eq!(vol.as_typed::<i16>().unwrap(), values);
        assert!(vol.as_typed::<u8>().is_err());
        assert_eq!(vol.value_range(), Some((-5.0, 100.0)));

        let arr = vol.to_ndarray::<i16>().unwrap();
        assert_eq!(arr.shape(), &[1, 2, 2]);
        assert_eq!(arr[[0, 0, 0]], -5);
        assert_eq!(arr[[0, 1, 1]], 100);
    }
}
