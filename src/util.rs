//! Private utility module
use byteordered::Endianness;
use bytemuck::Pod;
use std::mem::size_of;
use std::path::Path;

/// The two bytes opening every gzip member.
pub const GZ_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Whether the given buffer starts like a gzip stream.
pub fn is_gz_data(data: &[u8]) -> bool {
    data.len() >= 2 && data[..2] == GZ_MAGIC
}

/// Check whether the path has a ".gz" extension.
pub fn is_gz_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .file_name()
        .map(|a| a.to_string_lossy().ends_with(".gz"))
        .unwrap_or(false)
}

/// Reinterpret a buffer of raw bytes stored with the given byte order as a
/// vector of scalars in native order. Trailing bytes which do not form a
/// whole element are dropped.
pub fn convert_bytes_to<T>(mut bytes: Vec<u8>, endianness: Endianness) -> Vec<T>
where
    T: Pod,
{
    let n = size_of::<T>();
    let whole = bytes.len() - bytes.len() % n;
    bytes.truncate(whole);
    if n > 1 && endianness != Endianness::native() {
        for chunk in bytes.chunks_exact_mut(n) {
            chunk.reverse();
        }
    }
    bytemuck::pod_collect_to_vec(&bytes)
}

/// Linear search for the minimum and maximum of the given values.
/// Returns `None` on an empty sequence.
pub fn min_max<T, I>(values: I) -> Option<(T, T)>
where
    T: PartialOrd + Copy,
    I: IntoIterator<Item = T>,
{
    let mut it = values.into_iter();
    let first = it.next()?;
    Some(it.fold((first, first), |(mn, mx), v| {
        (if v < mn { v } else { mn }, if v > mx { v } else { mx })
    }))
}

#[cfg(test)]
mod tests {
    use super::{convert_bytes_to, is_gz_data, is_gz_file, min_max};
    use byteordered::Endianness;

    #[test]
    fn gz_detection() {
        assert!(is_gz_data(&[0x1f, 0x8b, 8, 0]));
        assert!(!is_gz_data(&[0x1f]));
        assert!(!is_gz_data(&[0x5c, 0x01, 0, 0]));
        assert!(is_gz_file("/path/to/something.nii.gz"));
        assert!(is_gz_file("volume.img.gz"));
        assert!(!is_gz_file("/path/to/something.nii"));
        assert!(!is_gz_file("gz"));
    }

    #[test]
    fn bytes_to_u16() {
        let le: Vec<u16> = convert_bytes_to(vec![1, 0, 0, 1], Endianness::Little);
        assert_eq!(le, vec![1, 256]);
        let be: Vec<u16> = convert_bytes_to(vec![1, 0, 0, 1, 7], Endianness::Big);
        assert_eq!(be, vec![256, 1]);
    }

    #[test]
    fn bytes_to_f32() {
        let raw = 1.5f32.to_be_bytes().to_vec();
        let v: Vec<f32> = convert_bytes_to(raw, Endianness::Big);
        assert_eq!(v, vec![1.5]);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(min_max(vec![3, -2, 9, 0]), Some((-2, 9)));
        assert_eq!(min_max(Vec::<f32>::new()), None);
        assert_eq!(min_max(vec![4.5f32]), Some((4.5, 4.5)));
    }
}
