//! NRRD volume format - text header plus raw or ascii payload
//!
//! Decodes 1D, 2D, or 3D NRRD files (attached `.nrrd` or detached `.nhdr` +
//! data file) into a [`Volume`], and encodes scalar volumes back out. Header
//! tokenization is hand-rolled: `key: value` lines, case-insensitive keys,
//! `#` comments, tolerant of key order. Raw payloads are endian-corrected
//! against the host byte order.

use crate::binio::{self, ByteOrder, PayloadSource};
use crate::error::{Result, VoxelIoError};
use crate::utils::typed_data_to_bytes;
use crate::volume::{PixelType, Volume, VolumeElement};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

/// Check whether a path carries an NRRD extension (`.nrrd` or `.nhdr`)
pub fn is_nrrd_extension(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.eq_ignore_ascii_case("nrrd") || ext.eq_ignore_ascii_case("nhdr"),
        None => false,
    }
}

/// Payload encodings accepted by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NrrdEncoding {
    Raw,
    Ascii,
}

fn pixel_type_from_token(token: &str) -> Option<PixelType> {
    match token.to_ascii_lowercase().as_str() {
        "uchar" | "uint8" | "unsigned char" | "uint8_t" => Some(PixelType::U8),
        "char" | "int8" | "signed char" | "int8_t" => Some(PixelType::I8),
        "ushort" | "uint16" | "unsigned short" | "unsigned short int" | "uint16_t" => {
            Some(PixelType::U16)
        }
        "short" | "int16" | "signed short" | "short int" | "int16_t" => Some(PixelType::I16),
        "uint" | "uint32" | "unsigned int" | "uint32_t" => Some(PixelType::U32),
        "int" | "int32" | "signed int" | "int32_t" => Some(PixelType::I32),
        "float" | "float32" => Some(PixelType::F32),
        "double" | "float64" => Some(PixelType::F64),
        _ => None,
    }
}

fn pixel_type_to_token(t: PixelType) -> Option<&'static str> {
    match t {
        PixelType::U8 => Some("uint8"),
        PixelType::I8 => Some("int8"),
        PixelType::U16 => Some("uint16"),
        PixelType::I16 => Some("int16"),
        PixelType::U32 => Some("uint32"),
        PixelType::I32 => Some("int32"),
        PixelType::F32 => Some("float"),
        PixelType::F64 => Some("double"),
        PixelType::Unknown => None,
    }
}

/// Accumulated header fields, validated as a whole after the scan
#[derive(Debug, Default)]
struct NrrdHeader {
    dimension: Option<usize>,
    sizes: Vec<usize>,
    pixel_type: PixelType,
    encoding: Option<NrrdEncoding>,
    data_file: Option<String>,
    spacings: Vec<f64>,
    byte_skip: u64,
    line_skip: usize,
    endian: Option<ByteOrder>,
    origin: Option<[f64; 3]>,
    directions: Vec<Option<[f64; 3]>>,
}

fn parse_vector3(value: &str, path: &Path) -> Result<[f64; 3]> {
    let inner = value
        .trim()
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
        .ok_or_else(|| {
            VoxelIoError::parse(path, format!("expected parenthesized triple, got '{}'", value))
        })?;
    let mut out = [0.0f64; 3];
    let mut parts = inner.split(',');
    for slot in &mut out {
        let part = parts.next().ok_or_else(|| {
            VoxelIoError::parse(path, format!("expected 3 components in '{}'", value))
        })?;
        *slot = part.trim().parse::<f64>().map_err(|_| {
            VoxelIoError::parse(path, format!("invalid float '{}' in '{}'", part.trim(), value))
        })?;
    }
    if parts.next().is_some() {
        return Err(VoxelIoError::parse(
            path,
            format!("expected 3 components in '{}'", value),
        ));
    }
    Ok(out)
}

fn parse_direction_rows(value: &str, path: &Path) -> Result<Vec<Option<[f64; 3]>>> {
    let mut rows = Vec::new();
    for token in value.split_whitespace() {
        if token.eq_ignore_ascii_case("none") {
            rows.push(None);
        } else {
            rows.push(Some(parse_vector3(token, path)?));
        }
    }
    Ok(rows)
}

fn parse_float_list(value: &str, key: &str, path: &Path) -> Result<Vec<f64>> {
    value
        .split_whitespace()
        .map(|tok| {
            tok.parse::<f64>().map_err(|_| {
                VoxelIoError::parse(path, format!("invalid float '{}' in '{}'", tok, key))
            })
        })
        .collect()
}

/// Scan the header text (including the magic line, which is skipped) into an
/// unvalidated field set
fn parse_header(text: &str, path: &Path) -> Result<NrrdHeader> {
    let mut hdr = NrrdHeader::default();

    for line in text.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();

        match key.as_str() {
            "dimension" => {
                let d = value.parse::<usize>().map_err(|_| {
                    VoxelIoError::parse(path, format!("invalid dimension value '{}'", value))
                })?;
                if !(1..=3).contains(&d) {
                    return Err(VoxelIoError::parse(
                        path,
                        format!("dimension {} not supported (expected 1-3)", d),
                    ));
                }
                hdr.dimension = Some(d);
            }
            "sizes" => {
                let mut sizes = Vec::new();
                for tok in value.split_whitespace() {
                    let n = tok.parse::<usize>().map_err(|_| {
                        VoxelIoError::parse(path, format!("invalid size token '{}'", tok))
                    })?;
                    if n == 0 {
                        return Err(VoxelIoError::parse(path, "sizes must be positive"));
                    }
                    sizes.push(n);
                }
                if sizes.is_empty() || sizes.len() > 3 {
                    return Err(VoxelIoError::parse(
                        path,
                        format!("sizes must list 1 to 3 values, got {}", sizes.len()),
                    ));
                }
                hdr.sizes = sizes;
            }
            "type" => {
                hdr.pixel_type = pixel_type_from_token(value).ok_or_else(|| {
                    VoxelIoError::parse(path, format!("unrecognized type token '{}'", value))
                })?;
            }
            "encoding" => {
                hdr.encoding = Some(match value.to_ascii_lowercase().as_str() {
                    "raw" => NrrdEncoding::Raw,
                    "ascii" | "text" | "txt" => NrrdEncoding::Ascii,
                    other => {
                        return Err(VoxelIoError::parse(
                            path,
                            format!("unsupported encoding '{}'", other),
                        ))
                    }
                });
            }
            "data file" | "datafile" => {
                hdr.data_file = Some(value.to_string());
            }
            "spacings" => {
                hdr.spacings = parse_float_list(value, "spacings", path)?;
            }
            "byte skip" | "byteskip" => {
                let v = value.parse::<i64>().map_err(|_| {
                    VoxelIoError::parse(path, format!("invalid byte skip '{}'", value))
                })?;
                if v < 0 {
                    return Err(VoxelIoError::parse(path, "negative byte skip not supported"));
                }
                hdr.byte_skip = v as u64;
            }
            "line skip" | "lineskip" => {
                hdr.line_skip = value.parse::<usize>().map_err(|_| {
                    VoxelIoError::parse(path, format!("invalid line skip '{}'", value))
                })?;
            }
            "endian" => {
                hdr.endian = Some(match value.to_ascii_lowercase().as_str() {
                    "little" => ByteOrder::Little,
                    "big" => ByteOrder::Big,
                    other => {
                        return Err(VoxelIoError::parse(
                            path,
                            format!("unknown endian '{}'", other),
                        ))
                    }
                });
            }
            "space origin" => {
                hdr.origin = Some(parse_vector3(value, path)?);
            }
            "space directions" => {
                hdr.directions = parse_direction_rows(value, path)?;
            }
            _ => {} // unknown keys are ignored
        }
    }

    Ok(hdr)
}

fn ascii_payload_typed<T>(text: &str, count: usize, path: &Path) -> Result<Vec<u8>>
where
    T: VolumeElement + FromStr,
    <T as FromStr>::Err: fmt::Display,
{
    let mut values: Vec<T> = Vec::with_capacity(count);
    for tok in text.split_whitespace().take(count) {
        let v = tok.parse::<T>().map_err(|e| {
            VoxelIoError::parse(path, format!("invalid ascii token '{}': {}", tok, e))
        })?;
        values.push(v);
    }
    if values.len() < count {
        return Err(VoxelIoError::truncated(
            path,
            format!("ascii payload has {} values, expected {}", values.len(), count),
        ));
    }
    Ok(typed_data_to_bytes(&values))
}

fn ascii_payload(text: &str, count: usize, t: PixelType, path: &Path) -> Result<Vec<u8>> {
    match t {
        PixelType::U8 => ascii_payload_typed::<u8>(text, count, path),
        PixelType::I8 => ascii_payload_typed::<i8>(text, count, path),
        PixelType::U16 => ascii_payload_typed::<u16>(text, count, path),
        PixelType::I16 => ascii_payload_typed::<i16>(text, count, path),
        PixelType::U32 => ascii_payload_typed::<u32>(text, count, path),
        PixelType::I32 => ascii_payload_typed::<i32>(text, count, path),
        PixelType::F32 => ascii_payload_typed::<f32>(text, count, path),
        PixelType::F64 => ascii_payload_typed::<f64>(text, count, path),
        PixelType::Unknown => Err(VoxelIoError::parse(path, "missing required key 'type'")),
    }
}

/// Decode an NRRD file (`.nrrd` attached or `.nhdr` detached) into a volume
pub fn decode_nrrd(path: impl AsRef<Path>) -> Result<Volume> {
    let path = path.as_ref();

    let file = File::open(path).map_err(|e| VoxelIoError::FileOpen {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = BufReader::new(file);

    // Magic line; an empty file fails here, before the blank-line scan
    let mut magic = Vec::new();
    let magic_len = reader
        .read_until(b'\n', &mut magic)
        .map_err(|e| VoxelIoError::FileRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    if magic_len == 0 {
        return Err(VoxelIoError::parse(path, "invalid magic: file is empty"));
    }
    if !magic.starts_with(crate::NRRD_MAGIC) {
        return Err(VoxelIoError::parse(path, "invalid magic: not an NRRD file"));
    }

    let (rest, rest_len) = binio::read_header_until_blank_line(&mut reader, path)?;
    let data_offset = magic_len as u64 + rest_len;
    drop(reader);

    let mut header_text = String::from_utf8_lossy(&magic).into_owned();
    header_text.push_str(&rest);
    let hdr = parse_header(&header_text, path)?;

    // Whole-header validation
    let dimension = hdr
        .dimension
        .ok_or_else(|| VoxelIoError::parse(path, "missing required key 'dimension'"))?;
    if hdr.sizes.is_empty() {
        return Err(VoxelIoError::parse(path, "missing required key 'sizes'"));
    }
    if hdr.pixel_type == PixelType::Unknown {
        return Err(VoxelIoError::parse(path, "missing required key 'type'"));
    }
    if hdr.sizes.len() != dimension {
        return Err(VoxelIoError::parse(
            path,
            format!(
                "sizes lists {} values but dimension is {}",
                hdr.sizes.len(),
                dimension
            ),
        ));
    }

    // Pad unused trailing axes to 1
    let mut dims = [1usize; 3];
    dims[..hdr.sizes.len()].copy_from_slice(&hdr.sizes);

    let mut vol = Volume {
        dims,
        pixel_type: hdr.pixel_type,
        ..Default::default()
    };

    // Direction rows carry spacing in their norms; normalize into cosines
    let mut row_norms = [None; 3];
    for (i, row) in hdr.directions.iter().take(3).enumerate() {
        if let Some(row) = row {
            let norm = (row[0] * row[0] + row[1] * row[1] + row[2] * row[2]).sqrt();
            if norm > 0.0 {
                vol.direction[i] = [row[0] / norm, row[1] / norm, row[2] / norm];
                row_norms[i] = Some(norm);
            }
        }
    }
    for i in 0..3 {
        match hdr.spacings.get(i) {
            Some(&s) if s.is_finite() && s > 0.0 => vol.spacing[i] = s,
            _ => {
                if let Some(norm) = row_norms[i] {
                    vol.spacing[i] = norm;
                }
            }
        }
    }
    if let Some(origin) = hdr.origin {
        vol.origin = origin;
    }

    let source = match &hdr.data_file {
        Some(name) => PayloadSource::detached(path, name),
        None => PayloadSource::Attached { offset: data_offset },
    };

    match hdr.encoding.unwrap_or(NrrdEncoding::Raw) {
        NrrdEncoding::Raw => {
            let mut data =
                source.read_exact_bytes(path, hdr.line_skip, hdr.byte_skip, vol.byte_count())?;
            if let Some(declared) = hdr.endian {
                if declared != ByteOrder::host() {
                    binio::byte_swap_buffer_in_place(
                        &mut data,
                        vol.pixel_type.size_in_bytes(),
                    );
                }
            }
            vol.data = data;
        }
        NrrdEncoding::Ascii => {
            let mut reader = source.open(path, hdr.line_skip, hdr.byte_skip)?;
            let mut text = String::new();
            reader
                .read_to_string(&mut text)
                .map_err(|e| VoxelIoError::parse(
                    source.data_path(path),
                    format!("ascii payload is not readable text: {}", e),
                ))?;
            vol.data = ascii_payload(
                &text,
                vol.voxel_count(),
                vol.pixel_type,
                source.data_path(path),
            )?;
        }
    }

    Ok(vol)
}

/// Options for [`encode_nrrd`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NrrdEncodeOptions {
    /// Write the payload to a sibling raw file even for a `.nrrd` target
    pub detached_data: bool,
    /// Override for the detached payload file name (default `<stem>.raw`)
    pub detached_data_name: Option<String>,
}

/// Encode a scalar volume as NRRD.
///
/// Writes an attached `.nrrd` by default; a `.nhdr` target or
/// `detached_data` produces a header plus a sibling raw payload file.
/// Always raw encoding, always declared little-endian (the payload is
/// swapped first on a big-endian host).
pub fn encode_nrrd(
    path: impl AsRef<Path>,
    vol: &Volume,
    opts: &NrrdEncodeOptions,
) -> Result<()> {
    let path = path.as_ref();

    if vol.is_empty() {
        return Err(VoxelIoError::InvalidArgument(
            "cannot encode an empty volume".to_string(),
        ));
    }
    if vol.components != 1 {
        return Err(VoxelIoError::InvalidArgument(
            "only scalar volumes (components == 1) are supported".to_string(),
        ));
    }
    let type_token = pixel_type_to_token(vol.pixel_type).ok_or_else(|| {
        VoxelIoError::InvalidArgument("unsupported pixel type for NRRD export".to_string())
    })?;

    let writing_nhdr = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("nhdr")
    );
    let detached = opts.detached_data || writing_nhdr;

    let raw_name = match &opts.detached_data_name {
        Some(name) => name.clone(),
        None => {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "volume".to_string());
            format!("{}.raw", stem)
        }
    };
    let raw_path = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(&raw_name),
        _ => Path::new(&raw_name).to_path_buf(),
    };

    let mut header = String::new();
    header.push_str("NRRD0005\n");
    header.push_str(&format!("type: {}\n", type_token));
    header.push_str("dimension: 3\n");
    header.push_str(&format!(
        "sizes: {} {} {}\n",
        vol.dims[0], vol.dims[1], vol.dims[2]
    ));
    header.push_str("encoding: raw\n");
    header.push_str("endian: little\n");
    header.push_str(&format!(
        "spacings: {} {} {}\n",
        vol.spacing[0], vol.spacing[1], vol.spacing[2]
    ));
    header.push_str(&format!(
        "space origin: ({},{},{})\n",
        vol.origin[0], vol.origin[1], vol.origin[2]
    ));
    header.push_str("space directions:");
    for i in 0..3 {
        header.push_str(&format!(
            " ({},{},{})",
            vol.direction[i][0] * vol.spacing[i],
            vol.direction[i][1] * vol.spacing[i],
            vol.direction[i][2] * vol.spacing[i]
        ));
    }
    header.push('\n');
    if detached {
        header.push_str(&format!("data file: {}\n", raw_name));
    }
    header.push('\n');

    let byte_count = vol.byte_count();
    let payload = binio::to_little_endian(&vol.data[..byte_count], vol.pixel_type.size_in_bytes());

    if detached {
        binio::write_file(path, header.as_bytes())?;
        binio::write_file(&raw_path, &payload)?;
    } else {
        let mut out = header.into_bytes();
        out.extend_from_slice(&payload);
        binio::write_file(path, &out)?;
    }
    Ok(())
}
