//! Module for decoding complete NIfTI objects: a header plus the first
//! three-dimensional volume of its payload.

use crate::error::{NiftiError, Result};
use crate::header::NiftiHeader;
use crate::util::is_gz_data;
use crate::volume::{RawVoxels, Volume};
use flate2::bufread::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, trace};

/// Data type for a NIfTI object that is fully contained in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct NiftiObject {
    header: NiftiHeader,
    volume: Volume,
}

impl NiftiObject {
    /// Decode a NIfTI object from the full contents of a file. The data is
    /// inflated first if it starts with a gzip signature.
    ///
    /// # Errors
    ///
    /// - `NiftiError::CorruptCompression` if the gzip stream cannot be
    ///   inflated.
    /// - `NiftiError::NotVolumeFile` if no NIfTI signature is found.
    /// - `NiftiError::NoVolumeData` if the source only contains a header.
    /// - `NiftiError::MalformedVolume` if a spatial dimension is not positive.
    /// - `NiftiError::UnsupportedDataType` if the voxels are not one of the
    ///   eight real scalar types.
    /// - `NiftiError::IncompletePayload` if the payload is too short.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use niiview::NiftiObject;
    /// # use niiview::Result;
    ///
    /// # fn run() -> Result<()> {
    /// let bytes = std::fs::read("minimal.nii.gz")?;
    /// let obj = NiftiObject::from_bytes(&bytes)?;
    /// println!("{}", obj.header().description());
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if is_gz_data(data) {
            let mut inflated = Vec::new();
            let inflated_len = GzDecoder::new(data)
                .read_to_end(&mut inflated)
                .map_err(NiftiError::CorruptCompression)?;
            debug!(
                compressed = data.len(),
                inflated = inflated_len,
                "inflated gzip stream"
            );
            Self::from_uncompressed(&inflated)
        } else {
            Self::from_uncompressed(data)
        }
    }

    /// Read and decode a NIfTI object from a ".nii" or ".nii.gz" file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Read and decode a NIfTI object from an arbitrary byte source.
    pub fn from_reader<R: Read>(mut source: R) -> Result<Self> {
        let mut data = Vec::new();
        let len = source.read_to_end(&mut data)?;
        trace!(len, "read volume source");
        Self::from_bytes(&data)
    }

    fn from_uncompressed(data: &[u8]) -> Result<Self> {
        if !NiftiHeader::is_nifti(data) {
            return Err(NiftiError::NotVolumeFile);
        }
        let header = NiftiHeader::from_reader(data)?;
        if !header.has_volume_data() {
            return Err(NiftiError::NoVolumeData);
        }

        let sdim = header.spatial_dim();
        if sdim.iter().any(|d| *d <= 0) {
            return Err(NiftiError::MalformedVolume(sdim));
        }
        let dim = [sdim[0] as usize, sdim[1] as usize, sdim[2] as usize];
        let datatype = header.data_type()?;
        if !datatype.is_supported() {
            return Err(NiftiError::UnsupportedDataType(header.datatype));
        }

        let nbytes = dim
            .iter()
            .try_fold(datatype.size_of(), |acc, d| acc.checked_mul(*d))
            .ok_or(NiftiError::MalformedVolume(sdim))?;
        // a volume never starts inside its own header
        let offset = (header.vox_offset.max(0.) as usize).max(header.sizeof_hdr as usize);
        let available = data.len().saturating_sub(offset);
        if available < nbytes {
            return Err(NiftiError::IncompletePayload(nbytes, available));
        }
        trace!(?datatype, ?dim, offset, nbytes, "reading volume payload");

        let raw = RawVoxels::from_bytes(
            datatype,
            data[offset..offset + nbytes].to_vec(),
            header.endianness,
        )?;
        let volume = Volume::new(raw.into_f32(), dim, header.voxel_size())?;
        debug!(
            ?dim,
            voxel_size = ?volume.voxel_size(),
            min = volume.min(),
            max = volume.max(),
            "decoded volume"
        );

        Ok(NiftiObject { header, volume })
    }

    /// Obtain a reference to the NIFTI header.
    pub fn header(&self) -> &NiftiHeader {
        &self.header
    }

    /// Obtain a reference to the object's volume.
    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    /// Move the volume out of the object, discarding the header.
    pub fn into_volume(self) -> Volume {
        self.volume
    }
}
