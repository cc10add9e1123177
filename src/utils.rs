//! Utility functions

use crate::error::{Result, VoxelIoError};
use std::mem;

/// Convert raw bytes (host order) to typed data
pub fn bytes_to_typed_data<T: Copy>(bytes: &[u8]) -> Result<Vec<T>> {
    let elem = mem::size_of::<T>();
    if elem == 0 || bytes.len() % elem != 0 {
        return Err(VoxelIoError::InvalidArgument(
            "byte length not aligned with element size".to_string(),
        ));
    }

    let count = bytes.len() / elem;
    let mut data = Vec::with_capacity(count);

    // read_unaligned: the source buffer carries no alignment guarantee
    unsafe {
        let ptr = bytes.as_ptr() as *const T;
        for i in 0..count {
            data.push(ptr.add(i).read_unaligned());
        }
    }

    Ok(data)
}

/// Convert typed data to raw bytes (host order)
pub fn typed_data_to_bytes<T: Copy>(data: &[T]) -> Vec<u8> {
    let byte_len = mem::size_of_val(data);
    let mut bytes = vec![0u8; byte_len];

    unsafe {
        std::ptr::copy_nonoverlapping(data.as_ptr() as *const u8, bytes.as_mut_ptr(), byte_len);
    }

    bytes
}

/// Format byte size in human-readable form
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_conversion() {
        let data: Vec<f32> = vec![1.0, 2.0, 3.0, 4.0];
        let bytes = typed_data_to_bytes(&data);
        assert_eq!(bytes.len(), data.len() * 4);

        let recovered: Vec<f32> = bytes_to_typed_data(&bytes).unwrap();
        assert_eq!(data, recovered);
    }

    #[test]
    fn test_misaligned_length_rejected() {
        let bytes = [0u8; 7];
        assert!(bytes_to_typed_data::<u16>(&bytes).is_err());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
    }
}
