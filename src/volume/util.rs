//! Miscellaneous volume-related functions
use crate::error::{NiftiError, Result};

/// Linear index of a voxel in a volume stored with X varying fastest.
pub fn coords_to_index(coords: [usize; 3], dim: [usize; 3]) -> Result<usize> {
    if !coords.iter().zip(&dim).all(|(i, d)| i < d) {
        return Err(NiftiError::OutOfBounds(coords.to_vec()));
    }
    Ok(coords[0] + coords[1] * dim[0] + coords[2] * dim[0] * dim[1])
}
