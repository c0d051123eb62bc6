//! This module defines the in-memory volume type used by the viewer, as
//! well as the means to slice it along each axis.
//!
//! A [`Volume`] always holds single precision samples, whatever the data
//! type of the file it was decoded from (see [`element`]). An integration
//! with `ndarray` is available with the `ndarray_volumes` feature.
//!
//! [`Volume`]: ./struct.Volume.html
//! [`element`]: ./element/index.html

pub mod element;
#[cfg(feature = "ndarray_volumes")]
pub mod ndarray;
pub mod slice;
mod util;

pub use self::element::{DataElement, RawVoxels};
pub use self::slice::{Axis, SliceView};

use self::util::coords_to_index;
use crate::error::{NiftiError, Result};
use crate::object::NiftiObject;
use std::path::Path;

/// A 3-D scalar volume held in memory, along with its geometry.
///
/// Samples are stored with X varying fastest:
/// `index = x + y * nx + z * nx * ny`. Volumes are immutable once built;
/// loading another file produces another volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    data: Vec<f32>,
    dim: [usize; 3],
    voxel_size: [f32; 3],
    min: f32,
    max: f32,
}

impl Volume {
    /// Build a volume from its samples and geometry. The value range is
    /// computed here, ignoring NaN samples.
    ///
    /// # Errors
    ///
    /// - `NiftiError::MalformedVolume` if a dimension is zero or the number
    ///   of samples does not match the dimensions.
    pub fn new(data: Vec<f32>, dim: [usize; 3], voxel_size: [f32; 3]) -> Result<Self> {
        let malformed = || NiftiError::MalformedVolume([dim[0] as i64, dim[1] as i64, dim[2] as i64]);
        if dim.iter().any(|d| *d == 0) {
            return Err(malformed());
        }
        let expected = dim[0]
            .checked_mul(dim[1])
            .and_then(|n| n.checked_mul(dim[2]))
            .ok_or_else(malformed)?;
        if data.len() != expected {
            return Err(malformed());
        }
        let (min, max) = data
            .iter()
            .fold((std::f32::INFINITY, std::f32::NEG_INFINITY), |(mn, mx), &v| {
                (if v < mn { v } else { mn }, if v > mx { v } else { mx })
            });
        Ok(Volume {
            data,
            dim,
            voxel_size,
            min,
            max,
        })
    }

    /// Decode a volume from the full contents of a NIfTI file, gzip
    /// compressed or not.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use niiview::Volume;
    /// # use niiview::Result;
    ///
    /// # fn run() -> Result<()> {
    /// let bytes = std::fs::read("mni_2mm.nii.gz")?;
    /// let volume = Volume::from_bytes(&bytes)?;
    /// assert_eq!(volume.dim(), [91, 109, 91]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        NiftiObject::from_bytes(data).map(NiftiObject::into_volume)
    }

    /// Decode a volume from a ".nii" or ".nii.gz" file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        NiftiObject::from_file(path).map(NiftiObject::into_volume)
    }

    /// The samples, X varying fastest.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Number of samples along X, Y and Z.
    pub fn dim(&self) -> [usize; 3] {
        self.dim
    }

    /// Physical voxel pitch along X, Y and Z, in millimeters.
    pub fn voxel_size(&self) -> [f32; 3] {
        self.voxel_size
    }

    /// The smallest sample.
    pub fn min(&self) -> f32 {
        self.min
    }

    /// The largest sample.
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false, volumes have at least one voxel.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fetch a single voxel.
    ///
    /// # Errors
    ///
    /// - `NiftiError::OutOfBounds` if the given coordinates surpass this
    /// volume's boundaries.
    pub fn get(&self, coords: [usize; 3]) -> Result<f32> {
        let index = coords_to_index(coords, self.dim)?;
        Ok(self.data[index])
    }

    /// Obtain a 2-D view of the volume with the given axis fixed at `index`.
    pub fn slice(&self, axis: Axis, index: usize) -> Result<SliceView<'_>> {
        SliceView::new(self, axis, index)
    }

    /// The voxel at the geometric center of the volume.
    pub fn center(&self) -> [usize; 3] {
        [self.dim[0] / 2, self.dim[1] / 2, self.dim[2] / 2]
    }
}
