//! Voxel data types defined by the NIfTI standard.
//!
//! Every code of the standard can be represented by [`NiftiType`], but only
//! the eight real scalar types are decoded by this crate. The remaining ones
//! (complex, RGB, 64-bit and 128-bit types) are rejected when a volume is
//! read.
//!
//! [`NiftiType`]: ./enum.NiftiType.html

use crate::error::{NiftiError, Result};
use num_traits::FromPrimitive;

/// Data type for representing a NIFTI value type in a volume.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum NiftiType {
    /// unsigned char.
    // NIFTI_TYPE_UINT8           2
    Uint8 = 2,
    /// signed short.
    // NIFTI_TYPE_INT16           4
    Int16 = 4,
    /// signed int.
    // NIFTI_TYPE_INT32           8
    Int32 = 8,
    /// 32 bit float.
    // NIFTI_TYPE_FLOAT32        16
    Float32 = 16,
    /// 64 bit complex = 2 32 bit floats.
    // NIFTI_TYPE_COMPLEX64      32
    Complex64 = 32,
    /// 64 bit float = double.
    // NIFTI_TYPE_FLOAT64        64
    Float64 = 64,
    /// 3 8 bit bytes.
    // NIFTI_TYPE_RGB24         128
    Rgb24 = 128,
    /// signed char.
    // NIFTI_TYPE_INT8          256
    Int8 = 256,
    /// unsigned short.
    // NIFTI_TYPE_UINT16        512
    Uint16 = 512,
    /// unsigned int.
    // NIFTI_TYPE_UINT32        768
    Uint32 = 768,
    /// signed long long.
    // NIFTI_TYPE_INT64        1024
    Int64 = 1024,
    /// unsigned long long.
    // NIFTI_TYPE_UINT64       1280
    Uint64 = 1280,
    /// 128 bit float = long double.
    // NIFTI_TYPE_FLOAT128     1536
    Float128 = 1536,
    /// 128 bit complex = 2 64 bit floats.
    // NIFTI_TYPE_COMPLEX128   1792
    Complex128 = 1792,
    /// 256 bit complex = 2 128 bit floats
    // NIFTI_TYPE_COMPLEX256   2048
    Complex256 = 2048,
    /// 4 8 bit bytes.
    // NIFTI_TYPE_RGBA32       2304
    Rgba32 = 2304,
}

impl NiftiType {
    /// Validate a raw `datatype` header code.
    ///
    /// # Errors
    ///
    /// - `NiftiError::UnsupportedDataType` if the code is not defined by the
    ///   standard.
    pub fn from_code(code: i16) -> Result<Self> {
        FromPrimitive::from_i16(code).ok_or(NiftiError::UnsupportedDataType(code))
    }

    /// Retrieve the size of an element of this data type, in bytes.
    pub fn size_of(self) -> usize {
        use NiftiType::*;
        match self {
            Int8 | Uint8 => 1,
            Int16 | Uint16 => 2,
            Rgb24 => 3,
            Int32 | Uint32 | Float32 | Rgba32 => 4,
            Int64 | Uint64 | Float64 | Complex64 => 8,
            Float128 | Complex128 => 16,
            Complex256 => 32,
        }
    }

    /// Whether voxels of this type can be decoded into a volume.
    pub fn is_supported(self) -> bool {
        use NiftiType::*;
        matches!(
            self,
            Int8 | Uint8 | Int16 | Uint16 | Int32 | Uint32 | Float32 | Float64
        )
    }

    /// Whether this is an integer type, which is normalized to `[0, 1]`
    /// when decoded.
    pub fn is_integer(self) -> bool {
        use NiftiType::*;
        matches!(
            self,
            Int8 | Uint8 | Int16 | Uint16 | Int32 | Uint32 | Int64 | Uint64
        )
    }
}

#[cfg(test)]
mod tests {
    use super::NiftiType;

    #[test]
    fn codes() {
        assert_eq!(NiftiType::from_code(2).unwrap(), NiftiType::Uint8);
        assert_eq!(NiftiType::from_code(256).unwrap(), NiftiType::Int8);
        assert_eq!(NiftiType::from_code(768).unwrap(), NiftiType::Uint32);
        assert!(NiftiType::from_code(3).is_err());
        assert!(NiftiType::from_code(-1).is_err());
    }

    #[test]
    fn supported() {
        assert!(NiftiType::Float64.is_supported());
        assert!(NiftiType::Int16.is_integer());
        assert!(!NiftiType::Float32.is_integer());
        assert!(!NiftiType::Rgb24.is_supported());
        assert!(!NiftiType::Int64.is_supported());
        assert_eq!(NiftiType::Uint16.size_of(), 2);
    }
}
