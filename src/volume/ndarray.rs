//! Interfaces and implementations specific to integration with `ndarray`.
//!
//! This module introduces the trait [`IntoNdArray`], which maps a volume into
//! a three-dimensional [`Array`] indexed as `[x, y, z]`.
//!
//! #### Note on memory order
//!
//! Volumes are stored with X varying fastest, which is column major order
//! (also called Fortran order) for an `[x, y, z]` index. The resulting array
//! keeps this memory order rather than the usual row major order, so that no
//! sample needs to be moved.
//!
//! [`IntoNdArray`]: ./trait.IntoNdArray.html
//! [`Array`]: ../../../ndarray/type.Array.html
use super::{Axis as VolumeAxis, Volume};
use crate::error::{NiftiError, Result};
use ndarray::{Array2, Array3, ArrayView3, Axis, ShapeBuilder};

/// Trait for volumes which can be converted to an ndarray.
///
/// Please see the [module-level documentation](index.html) for more details.
pub trait IntoNdArray {
    /// Consume the volume into an `[x, y, z]` array.
    fn into_ndarray(self) -> Result<Array3<f32>>;
}

impl IntoNdArray for Volume {
    fn into_ndarray(self) -> Result<Array3<f32>> {
        let [nx, ny, nz] = self.dim();
        let bad_shape = |_| NiftiError::MalformedVolume([nx as i64, ny as i64, nz as i64]);
        Array3::from_shape_vec((nx, ny, nz).f(), self.data).map_err(bad_shape)
    }
}

impl Volume {
    /// Borrow the volume as an `[x, y, z]` array view.
    pub fn view(&self) -> Result<ArrayView3<'_, f32>> {
        let [nx, ny, nz] = self.dim();
        let bad_shape = |_| NiftiError::MalformedVolume([nx as i64, ny as i64, nz as i64]);
        ArrayView3::from_shape((nx, ny, nz).f(), self.data()).map_err(bad_shape)
    }

    /// Copy out one slice as a 2-D array, indexed as `[u, v]` in the
    /// convention of [`SliceView`](./slice/struct.SliceView.html), without
    /// display mirroring.
    pub fn slice_to_ndarray(&self, axis: VolumeAxis, index: usize) -> Result<Array2<f32>> {
        // validates the index
        let _ = self.slice(axis, index)?;
        let view = self.view()?;
        Ok(view.index_axis(Axis(axis.index()), index).to_owned())
    }
}
