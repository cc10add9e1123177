//! Binary IO helpers shared by the volume format codecs

use crate::error::{Result, VoxelIoError};
use bytes::Bytes;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Byte order of multi-byte scalar elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Least significant byte first
    Little,
    /// Most significant byte first
    Big,
}

impl ByteOrder {
    /// Byte order of the machine this code runs on
    pub fn host() -> ByteOrder {
        if cfg!(target_endian = "little") {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        }
    }
}

/// Read an entire file into a byte buffer
pub fn read_file(path: impl AsRef<Path>) -> Result<Bytes> {
    let path = path.as_ref();
    let mut f = File::open(path).map_err(|e| VoxelIoError::FileOpen {
        path: path.to_path_buf(),
        source: e,
    })?;
    let size = f
        .metadata()
        .map_err(|e| VoxelIoError::FileRead {
            path: path.to_path_buf(),
            reason: format!("failed to determine file size: {}", e),
        })?
        .len() as usize;

    let mut data = Vec::with_capacity(size);
    f.read_to_end(&mut data).map_err(|e| VoxelIoError::FileRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(Bytes::from(data))
}

/// Write a full buffer to a file, creating or truncating it
pub fn write_file(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let mut f = File::create(path).map_err(|e| VoxelIoError::FileOpen {
        path: path.to_path_buf(),
        source: e,
    })?;
    f.write_all(data).map_err(|e| VoxelIoError::FileWrite {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(())
}

/// Read a text header terminated by the first blank line.
///
/// Consumes lines (including their `\n` or `\r\n` terminator) until an empty
/// line is seen. Returns all text up to and including the blank line, plus the
/// stream position where the payload starts. `path` is used only for error
/// attribution.
///
/// Fails with `DataTruncated` when EOF is reached before a blank line.
pub fn read_header_until_blank_line<R: BufRead>(
    reader: &mut R,
    path: &Path,
) -> Result<(String, u64)> {
    let mut header = String::new();
    let mut offset = 0u64;
    let mut line = Vec::new();

    loop {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| VoxelIoError::FileRead {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        if n == 0 {
            return Err(VoxelIoError::truncated(
                path,
                "header not terminated with blank line",
            ));
        }
        offset += n as u64;
        header.push_str(&String::from_utf8_lossy(&line));

        let content = trim_line_terminator(&line);
        if content.is_empty() {
            return Ok((header, offset));
        }
    }
}

fn trim_line_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Byte-swap a single element in place (e.g. big-endian to little-endian)
pub fn byte_swap_in_place(elem: &mut [u8]) {
    elem.reverse();
}

/// Byte-swap every `elem_size`-byte element of a flat buffer in place.
/// No-op when `elem_size <= 1`.
pub fn byte_swap_buffer_in_place(buf: &mut [u8], elem_size: usize) {
    if elem_size <= 1 {
        return;
    }
    for chunk in buf.chunks_exact_mut(elem_size) {
        byte_swap_in_place(chunk);
    }
}

/// Copy a buffer of host-order elements into little-endian byte order.
/// The encoders always declare little endian, so this is a plain copy
/// everywhere but big-endian hosts.
pub fn to_little_endian(buf: &[u8], elem_size: usize) -> Vec<u8> {
    let mut out = buf.to_vec();
    if ByteOrder::host() == ByteOrder::Big {
        byte_swap_buffer_in_place(&mut out, elem_size);
    }
    out
}

/// Where a format header says its payload bytes live.
///
/// Resolved once after header parsing; both codecs then feed it into the same
/// skip-and-read routines below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
    /// Payload follows the header in the same file, at this absolute offset
    Attached { offset: u64 },
    /// Payload lives in a separate file
    Detached { path: PathBuf },
}

impl PayloadSource {
    /// Build a detached source from a header-declared file name, resolved
    /// relative to the header file's directory unless already absolute.
    pub fn detached(header_path: &Path, name: &str) -> PayloadSource {
        let name_path = Path::new(name);
        let path = if name_path.is_absolute() {
            name_path.to_path_buf()
        } else {
            match header_path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir.join(name),
                _ => name_path.to_path_buf(),
            }
        };
        PayloadSource::Detached { path }
    }

    /// The file the payload bytes are read from
    pub fn data_path<'a>(&'a self, header_path: &'a Path) -> &'a Path {
        match self {
            PayloadSource::Attached { .. } => header_path,
            PayloadSource::Detached { path } => path,
        }
    }

    /// Open a reader positioned at the first payload byte: seeks to the
    /// attached offset (or the detached file start), then discards
    /// `line_skip` full text lines and seeks `byte_skip` bytes forward.
    pub fn open(
        &self,
        header_path: &Path,
        line_skip: usize,
        byte_skip: u64,
    ) -> Result<BufReader<File>> {
        let data_path = self.data_path(header_path);
        let mut f = File::open(data_path).map_err(|e| VoxelIoError::FileOpen {
            path: data_path.to_path_buf(),
            source: e,
        })?;
        if let PayloadSource::Attached { offset } = self {
            f.seek(SeekFrom::Start(*offset))
                .map_err(|e| VoxelIoError::FileRead {
                    path: data_path.to_path_buf(),
                    reason: e.to_string(),
                })?;
        }

        let mut reader = BufReader::new(f);
        let mut skipped = Vec::new();
        for _ in 0..line_skip {
            skipped.clear();
            let n = reader
                .read_until(b'\n', &mut skipped)
                .map_err(|e| VoxelIoError::FileRead {
                    path: data_path.to_path_buf(),
                    reason: e.to_string(),
                })?;
            if n == 0 {
                return Err(VoxelIoError::truncated(
                    data_path,
                    "line skip ran past end of data",
                ));
            }
        }
        if byte_skip > 0 {
            reader
                .seek_relative(byte_skip as i64)
                .map_err(|e| VoxelIoError::FileRead {
                    path: data_path.to_path_buf(),
                    reason: format!("byte skip failed: {}", e),
                })?;
        }
        Ok(reader)
    }

    /// Read exactly `len` payload bytes after applying the skip rules
    pub fn read_exact_bytes(
        &self,
        header_path: &Path,
        line_skip: usize,
        byte_skip: u64,
        len: usize,
    ) -> Result<Vec<u8>> {
        let mut reader = self.open(header_path, line_skip, byte_skip)?;
        let data_path = self.data_path(header_path);

        let mut data = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let n = reader
                .read(&mut data[filled..])
                .map_err(|e| VoxelIoError::FileRead {
                    path: data_path.to_path_buf(),
                    reason: e.to_string(),
                })?;
            if n == 0 {
                return Err(VoxelIoError::truncated(
                    data_path,
                    format!("expected {} payload bytes, got {}", len, filled),
                ));
            }
            filled += n;
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_read_write_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob.bin");

        let payload = b"voxelio payload";
        write_file(&path, payload).unwrap();
        let read = read_file(&path).unwrap();
        assert_eq!(&read[..], payload);
    }

    #[test]
    fn test_read_file_missing() {
        let err = read_file("/nonexistent/file.bin").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileOpen);
    }

    #[test]
    fn test_header_until_blank_line() {
        let mut cur = Cursor::new(b"key: value\nother: 1\n\npayload".to_vec());
        let (header, offset) =
            read_header_until_blank_line(&mut cur, Path::new("test.nrrd")).unwrap();
        assert_eq!(header, "key: value\nother: 1\n\n");
        assert_eq!(offset, 21);
        assert_eq!(cur.position(), 21);
    }

    #[test]
    fn test_header_crlf_terminator() {
        let mut cur = Cursor::new(b"a = b\r\n\r\nDATA".to_vec());
        let (header, offset) = read_header_until_blank_line(&mut cur, Path::new("t.mhd")).unwrap();
        assert_eq!(header, "a = b\r\n\r\n");
        assert_eq!(offset, 9);
    }

    #[test]
    fn test_header_missing_blank_line() {
        let mut cur = Cursor::new(b"key: value\nno terminator".to_vec());
        let err = read_header_until_blank_line(&mut cur, Path::new("t.nhdr")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataTruncated);
    }

    #[test]
    fn test_byte_swap_identity() {
        let original: Vec<u8> = (0..16).collect();
        let mut buf = original.clone();
        byte_swap_buffer_in_place(&mut buf, 4);
        assert_ne!(buf, original);
        byte_swap_buffer_in_place(&mut buf, 4);
        assert_eq!(buf, original);
    }

    #[test]
    fn test_byte_swap_single_byte_noop() {
        let mut buf = vec![1u8, 2, 3];
        byte_swap_buffer_in_place(&mut buf, 1);
        assert_eq!(buf, vec![1, 2, 3]);
    }

    #[test]
    fn test_payload_source_attached_skips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.nrrd");
        write_file(&path, b"HEADER\nskip me\nXXrealdata").unwrap();

        // Attached at the end of "HEADER\n" (offset 7), one line skip, two byte skip
        let source = PayloadSource::Attached { offset: 7 };
        let data = source.read_exact_bytes(&path, 1, 2, 8).unwrap();
        assert_eq!(&data, b"realdata");
    }

    #[test]
    fn test_payload_source_detached_resolution() {
        let source = PayloadSource::detached(Path::new("/data/vol.nhdr"), "vol.raw");
        assert_eq!(
            source,
            PayloadSource::Detached {
                path: PathBuf::from("/data/vol.raw")
            }
        );

        let source = PayloadSource::detached(Path::new("/data/vol.nhdr"), "/abs/vol.raw");
        assert_eq!(
            source,
            PayloadSource::Detached {
                path: PathBuf::from("/abs/vol.raw")
            }
        );
    }

    #[test]
    fn test_payload_source_short_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.raw");
        write_file(&path, b"1234").unwrap();

        let source = PayloadSource::Detached { path: path.clone() };
        let err = source
            .read_exact_bytes(Path::new("header.nhdr"), 0, 0, 16)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataTruncated);
        assert_eq!(err.path().unwrap(), path);
    }
}
