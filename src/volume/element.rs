//! This module defines the data element API, which turns the raw payload of
//! a NIfTI file into typed voxel arrays, and from there into the canonical
//! `f32` representation of a [`Volume`].
//!
//! Floating point sources keep their values (`f64` is downcast). Integer
//! sources of any width and signedness are rescaled into `[0, 1]` using the
//! global minimum and maximum of the raw values, so that differently scaled
//! integer encodings end up visually comparable.
//!
//! [`Volume`]: ../struct.Volume.html
use crate::error::{NiftiError, Result};
use crate::typedef::NiftiType;
use crate::util::{convert_bytes_to, min_max};
use byteordered::Endianness;
use bytemuck::Pod;
use num_traits::AsPrimitive;

/// Trait type for characterizing a NIfTI data element, implemented for
/// the primitive numeric types which can be decoded by this crate.
pub trait DataElement: 'static + Sized + Copy + Pod + PartialOrd + AsPrimitive<f64> {
    /// The `datatype` mapped to the type T
    const DATA_TYPE: NiftiType;

    /// Transform the given data vector into a vector of data elements.
    fn from_raw_vec(vec: Vec<u8>, endianness: Endianness) -> Vec<Self> {
        convert_bytes_to(vec, endianness)
    }
}

impl DataElement for u8 {
    const DATA_TYPE: NiftiType = NiftiType::Uint8;
    fn from_raw_vec(vec: Vec<u8>, _: Endianness) -> Vec<Self> {
        vec
    }
}
impl DataElement for i8 {
    const DATA_TYPE: NiftiType = NiftiType::Int8;
}
impl DataElement for u16 {
    const DATA_TYPE: NiftiType = NiftiType::Uint16;
}
impl DataElement for i16 {
    const DATA_TYPE: NiftiType = NiftiType::Int16;
}
impl DataElement for u32 {
    const DATA_TYPE: NiftiType = NiftiType::Uint32;
}
impl DataElement for i32 {
    const DATA_TYPE: NiftiType = NiftiType::Int32;
}
impl DataElement for f32 {
    const DATA_TYPE: NiftiType = NiftiType::Float32;
}
impl DataElement for f64 {
    const DATA_TYPE: NiftiType = NiftiType::Float64;
}

/// A decoded voxel payload in its source type, one variant per supported
/// NIfTI data type.
#[derive(Debug, Clone, PartialEq)]
pub enum RawVoxels {
    /// signed char
    Int8(Vec<i8>),
    /// unsigned char
    Uint8(Vec<u8>),
    /// signed short
    Int16(Vec<i16>),
    /// unsigned short
    Uint16(Vec<u16>),
    /// signed int
    Int32(Vec<i32>),
    /// unsigned int
    Uint32(Vec<u32>),
    /// 32 bit float
    Float32(Vec<f32>),
    /// 64 bit float
    Float64(Vec<f64>),
}

impl RawVoxels {
    /// Interpret raw payload bytes of the given data type and byte order.
    ///
    /// # Errors
    ///
    /// - `NiftiError::UnsupportedDataType` if `datatype` is not one of the
    ///   eight real scalar types.
    pub fn from_bytes(datatype: NiftiType, bytes: Vec<u8>, endianness: Endianness) -> Result<Self> {
        use NiftiType::*;
        Ok(match datatype {
            Int8 => RawVoxels::Int8(i8::from_raw_vec(bytes, endianness)),
            Uint8 => RawVoxels::Uint8(u8::from_raw_vec(bytes, endianness)),
            Int16 => RawVoxels::Int16(i16::from_raw_vec(bytes, endianness)),
            Uint16 => RawVoxels::Uint16(u16::from_raw_vec(bytes, endianness)),
            Int32 => RawVoxels::Int32(i32::from_raw_vec(bytes, endianness)),
            Uint32 => RawVoxels::Uint32(u32::from_raw_vec(bytes, endianness)),
            Float32 => RawVoxels::Float32(f32::from_raw_vec(bytes, endianness)),
            Float64 => RawVoxels::Float64(f64::from_raw_vec(bytes, endianness)),
            other => return Err(NiftiError::UnsupportedDataType(other as i16)),
        })
    }

    /// The source data type of these voxels.
    pub fn data_type(&self) -> NiftiType {
        match self {
            RawVoxels::Int8(_) => i8::DATA_TYPE,
            RawVoxels::Uint8(_) => u8::DATA_TYPE,
            RawVoxels::Int16(_) => i16::DATA_TYPE,
            RawVoxels::Uint16(_) => u16::DATA_TYPE,
            RawVoxels::Int32(_) => i32::DATA_TYPE,
            RawVoxels::Uint32(_) => u32::DATA_TYPE,
            RawVoxels::Float32(_) => f32::DATA_TYPE,
            RawVoxels::Float64(_) => f64::DATA_TYPE,
        }
    }

    /// The number of voxels.
    pub fn len(&self) -> usize {
        match self {
            RawVoxels::Int8(v) => v.len(),
            RawVoxels::Uint8(v) => v.len(),
            RawVoxels::Int16(v) => v.len(),
            RawVoxels::Uint16(v) => v.len(),
            RawVoxels::Int32(v) => v.len(),
            RawVoxels::Uint32(v) => v.len(),
            RawVoxels::Float32(v) => v.len(),
            RawVoxels::Float64(v) => v.len(),
        }
    }

    /// Whether there are no voxels at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert into the canonical single precision representation.
    pub fn into_f32(self) -> Vec<f32> {
        match self {
            RawVoxels::Float32(v) => v,
            RawVoxels::Float64(v) => v.into_iter().map(|x| x as f32).collect(),
            RawVoxels::Int8(v) => normalize_integers(&v),
            RawVoxels::Uint8(v) => normalize_integers(&v),
            RawVoxels::Int16(v) => normalize_integers(&v),
            RawVoxels::Uint16(v) => normalize_integers(&v),
            RawVoxels::Int32(v) => normalize_integers(&v),
            RawVoxels::Uint32(v) => normalize_integers(&v),
        }
    }
}

/// Map integer values linearly onto `[0, 1]`, the raw minimum going to 0 and
/// the raw maximum to 1. A constant input maps to all zeros.
pub fn normalize_integers<T: DataElement>(raw: &[T]) -> Vec<f32> {
    let (mn, mx) = match min_max(raw.iter().copied()) {
        Some((mn, mx)) => (mn.as_(), mx.as_()),
        None => return Vec::new(),
    };
    let range = mx - mn;
    let range = if range == 0. { 1. } else { range };
    raw.iter().map(|v| ((v.as_() - mn) / range) as f32).collect()
}
