//! This module defines the `NiftiHeader` struct, which is used
//! to provide important information about NIFTI volumes.
//!
//! Both header layouts of the standard are recognized: the 348-byte
//! NIFTI-1 header and the 540-byte NIFTI-2 header. Either may be stored in
//! little or big endian byte order, which is detected from the
//! `sizeof_hdr` field.

use crate::error::{NiftiError, Result};
use crate::typedef::NiftiType;
use byteordered::{ByteOrdered, Endian, Endianness};
use std::io::Read;

/// Magic code for NIFTI-1 header files (extention ".hdr[.gz]").
pub const MAGIC_CODE_NI1: &[u8; 4] = b"ni1\0";
/// Magic code for full NIFTI-1 files (extention ".nii[.gz]").
pub const MAGIC_CODE_NIP1: &[u8; 4] = b"n+1\0";
/// Magic code for full NIFTI-2 files.
pub const MAGIC_CODE_NIP2: &[u8; 8] = b"n+2\0\r\n\x1a\n";

/// Size of a NIFTI-1 header, in bytes.
pub const NIFTI1_HEADER_SIZE: i32 = 348;
/// Size of a NIFTI-2 header, in bytes.
pub const NIFTI2_HEADER_SIZE: i32 = 540;

/// The revision of the standard a header was written with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NiftiVersion {
    /// 348-byte header, 16-bit dimensions
    Nifti1,
    /// 540-byte header, 64-bit dimensions
    Nifti2,
}

/// The NIFTI header data type, normalized across both revisions of the
/// standard. Fields are named after the `nifti1.h` and `nifti2.h` structs and
/// widened to the NIFTI-2 types. Fields irrelevant to viewing a volume
/// (intent parameters, slice timing, quaternion parameters) are skipped
/// while parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct NiftiHeader {
    /// Header revision
    pub version: NiftiVersion,
    /// Header size, 348 or 540
    pub sizeof_hdr: i32,
    /// Data array dimensions
    pub dim: [i64; 8],
    /// Defines the data type!
    pub datatype: i16,
    /// Number of bits per voxel
    pub bitpix: i16,
    /// Grid spacings
    pub pixdim: [f64; 8],
    /// Offset into .nii file to reach the volume
    pub vox_offset: f64,
    /// Data scaling: slope
    pub scl_slope: f64,
    /// Data scaling: offset
    pub scl_inter: f64,
    /// Max display intensity
    pub cal_max: f64,
    /// Min display intensity
    pub cal_min: f64,
    /// Units of pixdim[1..4]
    pub xyzt_units: i32,
    /// Any text you like
    pub descrip: Vec<u8>,
    /// NIFTI_XFORM_* code
    pub qform_code: i32,
    /// NIFTI_XFORM_* code
    pub sform_code: i32,
    /// 1st row affine transform
    pub srow_x: [f64; 4],
    /// 2nd row affine transform
    pub srow_y: [f64; 4],
    /// 3rd row affine transform
    pub srow_z: [f64; 4],
    /// Magic code, `b"ni1\0"`, `b"n+1\0"` or `b"n+2\0"`
    pub magic: [u8; 4],
    /// Original data Endianness
    pub endianness: Endianness,
}

impl Default for NiftiHeader {
    fn default() -> NiftiHeader {
        NiftiHeader {
            version: NiftiVersion::Nifti1,
            sizeof_hdr: NIFTI1_HEADER_SIZE,
            dim: [1, 0, 0, 0, 0, 0, 0, 0],
            datatype: 0,
            bitpix: 0,
            pixdim: [0.; 8],
            vox_offset: 352.,
            scl_slope: 0.,
            scl_inter: 0.,
            cal_max: 0.,
            cal_min: 0.,
            xyzt_units: 0,
            descrip: vec![0; 80],
            qform_code: 0,
            sform_code: 0,
            srow_x: [0.; 4],
            srow_y: [0.; 4],
            srow_z: [0.; 4],
            magic: *MAGIC_CODE_NIP1,
            endianness: Endianness::Little,
        }
    }
}

impl NiftiHeader {
    /// Read a NIFTI header from the given byte source. The revision and
    /// byte order are detected from the `sizeof_hdr` field; the magic code is
    /// then validated.
    ///
    /// # Errors
    ///
    /// - `NiftiError::NotVolumeFile` if the source does not start with a
    ///   NIFTI header.
    /// - `NiftiError::Io` if the source ends before the header does.
    pub fn from_reader<S: Read>(mut input: S) -> Result<NiftiHeader> {
        let mut size = [0u8; 4];
        input.read_exact(&mut size).map_err(not_a_volume)?;
        let (version, endianness) = detect_version(size).ok_or(NiftiError::NotVolumeFile)?;
        match version {
            NiftiVersion::Nifti1 => parse_header_1(ByteOrdered::runtime(input, endianness)),
            NiftiVersion::Nifti2 => parse_header_2(ByteOrdered::runtime(input, endianness)),
        }
    }

    /// Whether the given buffer starts with a valid NIFTI-1 or NIFTI-2
    /// signature. This only inspects the size field and magic code.
    pub fn is_nifti(data: &[u8]) -> bool {
        if data.len() < 4 {
            return false;
        }
        match detect_version([data[0], data[1], data[2], data[3]]) {
            Some((NiftiVersion::Nifti1, _)) => {
                data.len() >= 348
                    && (&data[344..348] == MAGIC_CODE_NIP1 || &data[344..348] == MAGIC_CODE_NI1)
            }
            Some((NiftiVersion::Nifti2, _)) => data.len() >= 12 && &data[4..12] == MAGIC_CODE_NIP2,
            None => false,
        }
    }

    /// Get the data type as a validated enum.
    pub fn data_type(&self) -> Result<NiftiType> {
        NiftiType::from_code(self.datatype)
    }

    /// The three spatial dimensions, as declared (possibly non-positive).
    pub fn spatial_dim(&self) -> [i64; 3] {
        [self.dim[1], self.dim[2], self.dim[3]]
    }

    /// The voxel pitch of the three spatial axes, in millimeters. The sign of
    /// the stored values is discarded.
    pub fn voxel_size(&self) -> [f32; 3] {
        [
            self.pixdim[1].abs() as f32,
            self.pixdim[2].abs() as f32,
            self.pixdim[3].abs() as f32,
        ]
    }

    /// Whether the volume data follows the header in the same source.
    pub fn has_volume_data(&self) -> bool {
        &self.magic != MAGIC_CODE_NI1
    }

    /// The description text, up to the first null byte.
    pub fn description(&self) -> String {
        let end = self
            .descrip
            .iter()
            .position(|b| *b == 0)
            .unwrap_or_else(|| self.descrip.len());
        String::from_utf8_lossy(&self.descrip[..end]).into_owned()
    }
}

fn not_a_volume(_: std::io::Error) -> NiftiError {
    NiftiError::NotVolumeFile
}

fn detect_version(size: [u8; 4]) -> Option<(NiftiVersion, Endianness)> {
    for &e in &[Endianness::Little, Endianness::Big] {
        let v = e.read_i32(&size[..]).ok()?;
        if v == NIFTI1_HEADER_SIZE {
            return Some((NiftiVersion::Nifti1, e));
        }
        if v == NIFTI2_HEADER_SIZE {
            return Some((NiftiVersion::Nifti2, e));
        }
    }
    None
}

fn skip<R: Read>(input: &mut R, n: u64) -> Result<()> {
    let mut limited = Read::take(input, n);
    let skipped = std::io::copy(&mut limited, &mut std::io::sink())?;
    if skipped < n {
        return Err(NiftiError::NotVolumeFile);
    }
    Ok(())
}

fn parse_header_1<S: Read>(mut input: ByteOrdered<S, Endianness>) -> Result<NiftiHeader> {
    let mut h = NiftiHeader::default();

    // data_type, db_name, extents, session_error, regular, dim_info
    skip(input.inner_mut(), 36)?;
    for v in &mut h.dim {
        *v = i64::from(input.read_i16()?);
    }
    // intent_p1..3, intent_code
    skip(input.inner_mut(), 14)?;
    h.datatype = input.read_i16()?;
    h.bitpix = input.read_i16()?;
    let _slice_start = input.read_i16()?;
    for v in &mut h.pixdim {
        *v = f64::from(input.read_f32()?);
    }
    h.vox_offset = f64::from(input.read_f32()?);
    h.scl_slope = f64::from(input.read_f32()?);
    h.scl_inter = f64::from(input.read_f32()?);
    // slice_end, slice_code
    skip(input.inner_mut(), 3)?;
    h.xyzt_units = i32::from(input.read_u8()?);
    h.cal_max = f64::from(input.read_f32()?);
    h.cal_min = f64::from(input.read_f32()?);
    // slice_duration, toffset, glmax, glmin
    skip(input.inner_mut(), 16)?;
    input.inner_mut().read_exact(&mut h.descrip)?;
    // aux_file
    skip(input.inner_mut(), 24)?;
    h.qform_code = i32::from(input.read_i16()?);
    h.sform_code = i32::from(input.read_i16()?);
    // quatern_b..z
    skip(input.inner_mut(), 24)?;
    for v in h
        .srow_x
        .iter_mut()
        .chain(h.srow_y.iter_mut())
        .chain(h.srow_z.iter_mut())
    {
        *v = f64::from(input.read_f32()?);
    }
    // intent_name
    skip(input.inner_mut(), 16)?;
    input.inner_mut().read_exact(&mut h.magic)?;
    h.endianness = input.endianness();

    debug_assert_eq!(h.descrip.len(), 80);

    if &h.magic != MAGIC_CODE_NI1 && &h.magic != MAGIC_CODE_NIP1 {
        Err(NiftiError::NotVolumeFile)
    } else {
        Ok(h)
    }
}

fn parse_header_2<S: Read>(mut input: ByteOrdered<S, Endianness>) -> Result<NiftiHeader> {
    let mut h = NiftiHeader {
        version: NiftiVersion::Nifti2,
        sizeof_hdr: NIFTI2_HEADER_SIZE,
        ..NiftiHeader::default()
    };

    let mut magic = [0u8; 8];
    input.inner_mut().read_exact(&mut magic)?;
    if &magic != MAGIC_CODE_NIP2 {
        return Err(NiftiError::NotVolumeFile);
    }
    h.magic.copy_from_slice(&magic[..4]);
    h.datatype = input.read_i16()?;
    h.bitpix = input.read_i16()?;
    for v in &mut h.dim {
        *v = input.read_i64()?;
    }
    // intent_p1..3
    skip(input.inner_mut(), 24)?;
    for v in &mut h.pixdim {
        *v = input.read_f64()?;
    }
    h.vox_offset = input.read_i64()? as f64;
    h.scl_slope = input.read_f64()?;
    h.scl_inter = input.read_f64()?;
    h.cal_max = input.read_f64()?;
    h.cal_min = input.read_f64()?;
    // slice_duration, toffset, slice_start, slice_end
    skip(input.inner_mut(), 32)?;
    input.inner_mut().read_exact(&mut h.descrip)?;
    // aux_file
    skip(input.inner_mut(), 24)?;
    h.qform_code = input.read_i32()?;
    h.sform_code = input.read_i32()?;
    // quatern_b..z
    skip(input.inner_mut(), 48)?;
    for v in h
        .srow_x
        .iter_mut()
        .chain(h.srow_y.iter_mut())
        .chain(h.srow_z.iter_mut())
    {
        *v = input.read_f64()?;
    }
    let _slice_code = input.read_i32()?;
    h.xyzt_units = input.read_i32()?;
    // intent_code, intent_name, dim_info, unused_str
    skip(input.inner_mut(), 36)?;
    h.endianness = input.endianness();

    Ok(h)
}
