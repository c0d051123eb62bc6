//! Utility functions to write nifti images.
//!
//! Volumes are written as single-file NIFTI images (".nii" or ".nii.gz"),
//! with a fresh header describing the volume's geometry. This is used to
//! export volumes and to produce fixtures for the decoder.

use crate::error::{NiftiError, Result};
use crate::header::{
    NiftiHeader, NiftiVersion, MAGIC_CODE_NIP1, MAGIC_CODE_NIP2, NIFTI1_HEADER_SIZE,
    NIFTI2_HEADER_SIZE,
};
use crate::typedef::NiftiType;
use crate::util::is_gz_file;
use crate::volume::Volume;
use byteordered::{ByteOrdered, Endianness};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Options for encoding a volume.
///
/// # Example
///
/// ```no_run
/// use niiview::{NiftiType, Volume, WriterOptions};
/// # use niiview::Result;
///
/// # fn run() -> Result<()> {
/// let volume = Volume::new(vec![0.; 8], [2, 2, 2], [2., 2., 2.])?;
/// WriterOptions::new()
///     .data_type(NiftiType::Int16)
///     .description("blank")
///     .write_file("blank.nii.gz", &volume)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WriterOptions {
    datatype: NiftiType,
    version: NiftiVersion,
    endianness: Endianness,
    description: Vec<u8>,
    compress: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            datatype: NiftiType::Float32,
            version: NiftiVersion::Nifti1,
            endianness: Endianness::Little,
            description: Vec::new(),
            compress: false,
        }
    }
}

impl WriterOptions {
    /// Float32 samples in a little endian NIFTI-1 file, uncompressed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store samples with the given data type. Integer types round each
    /// sample to the nearest representable value.
    pub fn data_type(mut self, datatype: NiftiType) -> Self {
        self.datatype = datatype;
        self
    }

    /// Write the header with the given revision of the standard.
    pub fn version(mut self, version: NiftiVersion) -> Self {
        self.version = version;
        self
    }

    /// Write header and samples in the given byte order.
    pub fn endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    /// Set the header's description, truncated to 79 bytes.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.bytes().take(79).collect();
        self
    }

    /// Whether to gzip the output of [`to_bytes`]. Files are compressed
    /// according to their extension instead.
    ///
    /// [`to_bytes`]: #method.to_bytes
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Build the header that would be written for `volume`.
    ///
    /// # Errors
    ///
    /// - `NiftiError::UnsupportedDataType` if the chosen data type cannot be
    ///   decoded back.
    /// - `NiftiError::MalformedVolume` if a dimension does not fit in a
    ///   NIFTI-1 header.
    pub fn header_for(&self, volume: &Volume) -> Result<NiftiHeader> {
        if !self.datatype.is_supported() {
            return Err(NiftiError::UnsupportedDataType(self.datatype as i16));
        }
        let [nx, ny, nz] = volume.dim();
        let sdim = [nx as i64, ny as i64, nz as i64];
        if self.version == NiftiVersion::Nifti1
            && sdim.iter().any(|d| *d > i64::from(i16::max_value()))
        {
            return Err(NiftiError::MalformedVolume(sdim));
        }
        let [vx, vy, vz] = volume.voxel_size();

        let mut descrip = self.description.clone();
        descrip.resize(80, 0);
        let (sizeof_hdr, magic) = match self.version {
            NiftiVersion::Nifti1 => (NIFTI1_HEADER_SIZE, *MAGIC_CODE_NIP1),
            NiftiVersion::Nifti2 => {
                let mut magic = [0; 4];
                magic.copy_from_slice(&MAGIC_CODE_NIP2[..4]);
                (NIFTI2_HEADER_SIZE, magic)
            }
        };

        Ok(NiftiHeader {
            version: self.version,
            sizeof_hdr,
            dim: [3, sdim[0], sdim[1], sdim[2], 1, 1, 1, 1],
            datatype: self.datatype as i16,
            bitpix: (self.datatype.size_of() * 8) as i16,
            pixdim: [
                1.,
                f64::from(vx),
                f64::from(vy),
                f64::from(vz),
                0.,
                0.,
                0.,
                0.,
            ],
            // header plus the empty extension flag
            vox_offset: f64::from(sizeof_hdr + 4),
            scl_slope: 1.,
            cal_max: f64::from(volume.max()),
            cal_min: f64::from(volume.min()),
            // mm
            xyzt_units: 2,
            descrip,
            magic,
            endianness: self.endianness,
            ..NiftiHeader::default()
        })
    }

    /// Encode `volume` into a memory buffer.
    pub fn to_bytes(&self, volume: &Volume) -> Result<Vec<u8>> {
        let header = self.header_for(volume)?;
        if self.compress {
            let mut e = GzEncoder::new(Vec::new(), Compression::default());
            write_volume(&mut e, &header, volume)?;
            Ok(e.finish()?)
        } else {
            let mut out = Vec::with_capacity(header.vox_offset as usize + volume.len() * 4);
            write_volume(&mut out, &header, volume)?;
            Ok(out)
        }
    }

    /// Write `volume` to a file, gzip compressed if the path ends with
    /// ".gz".
    pub fn write_file<P: AsRef<Path>>(&self, path: P, volume: &Volume) -> Result<()> {
        let path = path.as_ref();
        let header = self.header_for(volume)?;
        let writer = BufWriter::new(File::create(path)?);
        if is_gz_file(path) {
            let mut e = GzEncoder::new(writer, Compression::default());
            write_volume(&mut e, &header, volume)?;
            let _ = e.finish()?.into_inner().map_err(|e| e.into_error())?;
        } else {
            let mut writer = writer;
            write_volume(&mut writer, &header, volume)?;
            writer.flush()?;
        }
        debug!(path = %path.display(), dim = ?volume.dim(), "volume written");
        Ok(())
    }
}

/// Write a volume to a ".nii" or ".nii.gz" file with the default options.
pub fn write_nifti<P: AsRef<Path>>(path: P, volume: &Volume) -> Result<()> {
    WriterOptions::new().write_file(path, volume)
}

fn write_volume<W: Write>(writer: W, header: &NiftiHeader, volume: &Volume) -> Result<()> {
    let mut writer = ByteOrdered::runtime(writer, header.endianness);
    match header.version {
        NiftiVersion::Nifti1 => write_header_1(&mut writer, header)?,
        NiftiVersion::Nifti2 => write_header_2(&mut writer, header)?,
    }
    // no extensions
    writer.write_u32(0)?;
    write_samples(&mut writer, NiftiType::from_code(header.datatype)?, volume.data())
}

fn write_header_1<W: Write>(w: &mut ByteOrdered<W, Endianness>, h: &NiftiHeader) -> Result<()> {
    w.write_i32(h.sizeof_hdr)?;
    // data_type, db_name, extents, session_error, regular, dim_info
    w.inner_mut().write_all(&[0; 36])?;
    for d in &h.dim {
        w.write_i16(*d as i16)?;
    }
    // intent_p1..3, intent_code
    w.inner_mut().write_all(&[0; 14])?;
    w.write_i16(h.datatype)?;
    w.write_i16(h.bitpix)?;
    // slice_start
    w.write_i16(0)?;
    for p in &h.pixdim {
        w.write_f32(*p as f32)?;
    }
    w.write_f32(h.vox_offset as f32)?;
    w.write_f32(h.scl_slope as f32)?;
    w.write_f32(h.scl_inter as f32)?;
    // slice_end, slice_code
    w.inner_mut().write_all(&[0; 3])?;
    w.write_u8(h.xyzt_units as u8)?;
    w.write_f32(h.cal_max as f32)?;
    w.write_f32(h.cal_min as f32)?;
    // slice_duration, toffset, glmax, glmin
    w.inner_mut().write_all(&[0; 16])?;
    w.inner_mut().write_all(&h.descrip)?;
    // aux_file
    w.inner_mut().write_all(&[0; 24])?;
    w.write_i16(h.qform_code as i16)?;
    w.write_i16(h.sform_code as i16)?;
    // quatern_b..z
    w.inner_mut().write_all(&[0; 24])?;
    for v in h.srow_x.iter().chain(&h.srow_y).chain(&h.srow_z) {
        w.write_f32(*v as f32)?;
    }
    // intent_name
    w.inner_mut().write_all(&[0; 16])?;
    w.inner_mut().write_all(&h.magic)?;
    Ok(())
}

fn write_header_2<W: Write>(w: &mut ByteOrdered<W, Endianness>, h: &NiftiHeader) -> Result<()> {
    w.write_i32(h.sizeof_hdr)?;
    w.inner_mut().write_all(MAGIC_CODE_NIP2)?;
    w.write_i16(h.datatype)?;
    w.write_i16(h.bitpix)?;
    for d in &h.dim {
        w.write_i64(*d)?;
    }
    // intent_p1..3
    w.inner_mut().write_all(&[0; 24])?;
    for p in &h.pixdim {
        w.write_f64(*p)?;
    }
    w.write_i64(h.vox_offset as i64)?;
    w.write_f64(h.scl_slope)?;
    w.write_f64(h.scl_inter)?;
    w.write_f64(h.cal_max)?;
    w.write_f64(h.cal_min)?;
    // slice_duration, toffset, slice_start, slice_end
    w.inner_mut().write_all(&[0; 32])?;
    w.inner_mut().write_all(&h.descrip)?;
    // aux_file
    w.inner_mut().write_all(&[0; 24])?;
    w.write_i32(h.qform_code)?;
    w.write_i32(h.sform_code)?;
    // quatern_b..z
    w.inner_mut().write_all(&[0; 48])?;
    for v in h.srow_x.iter().chain(&h.srow_y).chain(&h.srow_z) {
        w.write_f64(*v)?;
    }
    // slice_code
    w.write_i32(0)?;
    w.write_i32(h.xyzt_units)?;
    // intent_code, intent_name, dim_info, unused_str
    w.inner_mut().write_all(&[0; 36])?;
    Ok(())
}

fn write_samples<W: Write>(
    w: &mut ByteOrdered<W, Endianness>,
    datatype: NiftiType,
    data: &[f32],
) -> Result<()> {
    match datatype {
        NiftiType::Uint8 => data.iter().try_for_each(|v| w.write_u8(v.round() as u8)),
        NiftiType::Int8 => data.iter().try_for_each(|v| w.write_i8(v.round() as i8)),
        NiftiType::Uint16 => data.iter().try_for_each(|v| w.write_u16(v.round() as u16)),
        NiftiType::Int16 => data.iter().try_for_each(|v| w.write_i16(v.round() as i16)),
        NiftiType::Uint32 => data.iter().try_for_each(|v| w.write_u32(v.round() as u32)),
        NiftiType::Int32 => data.iter().try_for_each(|v| w.write_i32(v.round() as i32)),
        NiftiType::Float32 => data.iter().try_for_each(|v| w.write_f32(*v)),
        NiftiType::Float64 => data.iter().try_for_each(|v| w.write_f64(f64::from(*v))),
        other => return Err(NiftiError::UnsupportedDataType(other as i16)),
    }?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{write_nifti, WriterOptions};
    use crate::header::{NiftiHeader, NiftiVersion};
    use crate::object::NiftiObject;
    use crate::typedef::NiftiType;
    use crate::util::is_gz_data;
    use crate::volume::Volume;
    use byteordered::Endianness;
    use tempfile::tempdir;

    fn volume() -> Volume {
        let data = (0..24).map(|x| x as f32 * 0.5 - 3.).collect();
        Volume::new(data, [4, 3, 2], [1.5, 2., 3.]).unwrap()
    }

    #[test]
    fn header_layout() {
        let bytes = WriterOptions::new().to_bytes(&volume()).unwrap();
        assert_eq!(bytes.len(), 352 + 24 * 4);
        assert!(NiftiHeader::is_nifti(&bytes));
        let header = NiftiHeader::from_reader(&bytes[..]).unwrap();
        assert_eq!(header.version, NiftiVersion::Nifti1);
        assert_eq!(header.spatial_dim(), [4, 3, 2]);
        assert_eq!(header.voxel_size(), [1.5, 2., 3.]);
        assert_eq!(header.vox_offset, 352.);
    }

    #[test]
    fn float_round_trips() {
        let volume = volume();
        for &version in &[NiftiVersion::Nifti1, NiftiVersion::Nifti2] {
            for &endianness in &[Endianness::Little, Endianness::Big] {
                let bytes = WriterOptions::new()
                    .version(version)
                    .endianness(endianness)
                    .description("round trip")
                    .to_bytes(&volume)
                    .unwrap();
                let obj = NiftiObject::from_bytes(&bytes).unwrap();
                assert_eq!(obj.header().version, version);
                assert_eq!(obj.header().endianness, endianness);
                assert_eq!(obj.header().description(), "round trip");
                assert_eq!(obj.volume(), &volume);
            }
        }
    }

    #[test]
    fn compressed_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("volume.nii.gz");
        write_nifti(&path, &volume()).unwrap();
        let raw = std::fs::read(&path).unwrap();
        assert!(is_gz_data(&raw));
        assert_eq!(Volume::from_file(&path).unwrap(), volume());

        let plain = dir.path().join("volume.nii");
        write_nifti(&plain, &volume()).unwrap();
        assert!(!is_gz_data(&std::fs::read(&plain).unwrap()));
    }

    #[test]
    fn unsupported_output_type() {
        let err = WriterOptions::new()
            .data_type(NiftiType::Rgb24)
            .to_bytes(&volume());
        assert!(err.is_err());
    }
}
