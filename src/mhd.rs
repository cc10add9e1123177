//! MetaImage (MHD/MHA) volume format - `Key = Value` header, raw payload
//!
//! Decodes 3D MetaImage files into a [`Volume`]: inline `.mha` (payload right
//! after the header's blank line) or `.mhd` with an external data file. The
//! inverse encoder writes both layouts. Only uncompressed data is handled;
//! `CompressedData = True` headers are rejected.

use crate::binio::{self, ByteOrder, PayloadSource};
use crate::error::{Result, VoxelIoError};
use crate::volume::{PixelType, Volume};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Check whether a path carries a MetaImage extension (`.mhd` or `.mha`)
pub fn is_mhd_extension(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.eq_ignore_ascii_case("mhd") || ext.eq_ignore_ascii_case("mha"),
        None => false,
    }
}

fn pixel_type_from_met(token: &str) -> Option<PixelType> {
    match token.to_ascii_uppercase().as_str() {
        "MET_UCHAR" => Some(PixelType::U8),
        "MET_CHAR" => Some(PixelType::I8),
        "MET_USHORT" => Some(PixelType::U16),
        "MET_SHORT" => Some(PixelType::I16),
        "MET_UINT" => Some(PixelType::U32),
        "MET_INT" => Some(PixelType::I32),
        "MET_FLOAT" => Some(PixelType::F32),
        "MET_DOUBLE" => Some(PixelType::F64),
        _ => None,
    }
}

fn pixel_type_to_met(t: PixelType) -> Option<&'static str> {
    match t {
        PixelType::U8 => Some("MET_UCHAR"),
        PixelType::I8 => Some("MET_CHAR"),
        PixelType::U16 => Some("MET_USHORT"),
        PixelType::I16 => Some("MET_SHORT"),
        PixelType::U32 => Some("MET_UINT"),
        PixelType::I32 => Some("MET_INT"),
        PixelType::F32 => Some("MET_FLOAT"),
        PixelType::F64 => Some("MET_DOUBLE"),
        PixelType::Unknown => None,
    }
}

#[derive(Debug, Default)]
struct MhdHeader {
    ndims: Option<usize>,
    dims: Option<[usize; 3]>,
    pixel_type: PixelType,
    spacing: Vec<f64>,
    origin: Option<[f64; 3]>,
    direction: Option<[[f64; 3]; 3]>,
    data_file: Option<String>,
    msb: bool,
}

fn parse_floats(value: &str, key: &str, path: &Path) -> Result<Vec<f64>> {
    value
        .split_whitespace()
        .map(|tok| {
            tok.parse::<f64>().map_err(|_| {
                VoxelIoError::parse(path, format!("invalid float '{}' in {}", tok, key))
            })
        })
        .collect()
}

fn parse_triple(value: &str, key: &str, path: &Path) -> Result<[f64; 3]> {
    let floats = parse_floats(value, key, path)?;
    if floats.len() != 3 {
        return Err(VoxelIoError::parse(
            path,
            format!("{} must list 3 values, got {}", key, floats.len()),
        ));
    }
    Ok([floats[0], floats[1], floats[2]])
}

fn is_true_token(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

fn parse_header(text: &str, path: &Path) -> Result<MhdHeader> {
    let mut hdr = MhdHeader::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_uppercase();
        let value = value.trim();

        match key.as_str() {
            "NDIMS" => {
                let n = value.parse::<usize>().map_err(|_| {
                    VoxelIoError::parse(path, format!("invalid NDims value '{}'", value))
                })?;
                if n != 3 {
                    return Err(VoxelIoError::parse(
                        path,
                        format!("only NDims 3 is supported, got {}", n),
                    ));
                }
                hdr.ndims = Some(n);
            }
            "DIMSIZE" => {
                // Some files place DimSize before NDims; parse as 3 regardless
                let mut dims = [0usize; 3];
                let mut tokens = value.split_whitespace();
                for slot in &mut dims {
                    let tok = tokens
                        .next()
                        .ok_or_else(|| VoxelIoError::parse(path, "invalid DimSize"))?;
                    *slot = tok
                        .parse::<usize>()
                        .ok()
                        .filter(|&d| d > 0)
                        .ok_or_else(|| VoxelIoError::parse(path, "invalid DimSize"))?;
                }
                if tokens.next().is_some() {
                    return Err(VoxelIoError::parse(path, "invalid DimSize"));
                }
                hdr.dims = Some(dims);
            }
            "ELEMENTTYPE" => {
                hdr.pixel_type = pixel_type_from_met(value).ok_or_else(|| {
                    VoxelIoError::parse(path, format!("unsupported ElementType: {}", value))
                })?;
            }
            "ELEMENTSPACING" => {
                hdr.spacing = parse_floats(value, "ElementSpacing", path)?;
            }
            "POSITION" | "OFFSET" | "ORIGIN" => {
                hdr.origin = Some(parse_triple(value, &key, path)?);
            }
            "TRANSFORMMATRIX" => {
                let floats = parse_floats(value, "TransformMatrix", path)?;
                if floats.len() != 9 {
                    return Err(VoxelIoError::parse(
                        path,
                        format!("TransformMatrix must list 9 values, got {}", floats.len()),
                    ));
                }
                let mut m = [[0.0f64; 3]; 3];
                for i in 0..3 {
                    m[i].copy_from_slice(&floats[i * 3..i * 3 + 3]);
                }
                hdr.direction = Some(m);
            }
            "ELEMENTDATAFILE" => {
                hdr.data_file = Some(value.to_string());
            }
            "ELEMENTBYTEORDERMSB" | "BINARYDATABYTEORDERMSB" => {
                hdr.msb = is_true_token(value);
            }
            "COMPRESSEDDATA" => {
                if is_true_token(value) {
                    return Err(VoxelIoError::parse(
                        path,
                        "compressed MetaImage data is not supported",
                    ));
                }
            }
            _ => {} // ObjectType, BinaryData, AnatomicalOrientation, ...
        }
    }

    Ok(hdr)
}

/// Decode a MetaImage file (`.mhd` or `.mha`) into a volume
pub fn decode_mhd(path: impl AsRef<Path>) -> Result<Volume> {
    let path = path.as_ref();

    let file = File::open(path).map_err(|e| VoxelIoError::FileOpen {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = BufReader::new(file);
    let (header_text, data_offset) = binio::read_header_until_blank_line(&mut reader, path)?;
    drop(reader);

    let hdr = parse_header(&header_text, path)?;

    if hdr.ndims != Some(3) {
        return Err(VoxelIoError::parse(path, "NDims not set (expected NDims = 3)"));
    }
    let dims = hdr
        .dims
        .ok_or_else(|| VoxelIoError::parse(path, "DimSize not set"))?;
    if hdr.pixel_type == PixelType::Unknown {
        return Err(VoxelIoError::parse(path, "ElementType not set"));
    }

    let mut vol = Volume {
        dims,
        pixel_type: hdr.pixel_type,
        ..Default::default()
    };
    for (i, &s) in hdr.spacing.iter().take(3).enumerate() {
        if s.is_finite() && s > 0.0 {
            vol.spacing[i] = s;
        }
    }
    if let Some(origin) = hdr.origin {
        vol.origin = origin;
    }
    if let Some(direction) = hdr.direction {
        vol.direction = direction;
    }

    // LOCAL or an absent/empty ElementDataFile means the payload is inline
    let source = match hdr.data_file.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() && !name.eq_ignore_ascii_case("local") => {
            PayloadSource::detached(path, name)
        }
        _ => PayloadSource::Attached {
            offset: data_offset,
        },
    };

    let mut data = source.read_exact_bytes(path, 0, 0, vol.byte_count())?;
    let declared = if hdr.msb {
        ByteOrder::Big
    } else {
        ByteOrder::Little
    };
    if declared != ByteOrder::host() {
        binio::byte_swap_buffer_in_place(&mut data, vol.pixel_type.size_in_bytes());
    }
    vol.data = data;

    Ok(vol)
}

/// Options for [`encode_mhd`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MhdEncodeOptions {
    /// Force the payload inline even for a `.mhd` target
    pub inline_data: bool,
    /// Override for the external payload file name (default `<stem>.raw`)
    pub raw_data_name: Option<String>,
}

/// Encode a scalar volume as MetaImage.
///
/// A `.mha` target (or `inline_data`) appends the payload after the header
/// in the same file; otherwise the header references a sibling raw file.
/// Byte order is always declared `False` (little-endian); the payload is
/// swapped first on a big-endian host.
pub fn encode_mhd(path: impl AsRef<Path>, vol: &Volume, opts: &MhdEncodeOptions) -> Result<()> {
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
    let element_type = pixel_type_to_met(vol.pixel_type).ok_or_else(|| {
        VoxelIoError::InvalidArgument("unsupported pixel type for MetaImage export".to_string())
    })?;

    let writing_mha = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("mha")
    ) || opts.inline_data;

    let raw_name = match &opts.raw_data_name {
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
    header.push_str("ObjectType = Image\n");
    header.push_str("NDims = 3\n");
    header.push_str(&format!(
        "DimSize = {} {} {}\n",
        vol.dims[0], vol.dims[1], vol.dims[2]
    ));
    header.push_str(&format!("ElementType = {}\n", element_type));
    header.push_str(&format!(
        "ElementSpacing = {} {} {}\n",
        vol.spacing[0], vol.spacing[1], vol.spacing[2]
    ));
    header.push_str(&format!(
        "Position = {} {} {}\n",
        vol.origin[0], vol.origin[1], vol.origin[2]
    ));
    header.push_str("ElementByteOrderMSB = False\n");

    let byte_count = vol.byte_count();
    let payload = binio::to_little_endian(&vol.data[..byte_count], vol.pixel_type.size_in_bytes());

    if writing_mha {
        header.push_str("ElementDataFile = LOCAL\n\n");
        let mut out = header.into_bytes();
        out.extend_from_slice(&payload);
        binio::write_file(path, &out)?;
    } else {
        header.push_str(&format!("ElementDataFile = {}\n\n", raw_name));
        binio::write_file(path, header.as_bytes())?;
        binio::write_file(&raw_path, &payload)?;
    }
    Ok(())
}
