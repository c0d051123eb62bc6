use niiview::{NiftiType, Volume, WriterOptions};

/// Dimensions of the MNI template grid.
#[allow(dead_code)]
pub const MNI_DIM: [usize; 3] = [91, 109, 91];

/// A volume whose samples are given by a function of the voxel position.
pub fn volume_from_fn<F>(dim: [usize; 3], voxel_size: [f32; 3], f: F) -> Volume
where
    F: Fn(usize, usize, usize) -> f32,
{
    let mut data = Vec::with_capacity(dim[0] * dim[1] * dim[2]);
    for z in 0..dim[2] {
        for y in 0..dim[1] {
            for x in 0..dim[0] {
                data.push(f(x, y, z));
            }
        }
    }
    Volume::new(data, dim, voxel_size).unwrap()
}

/// A template-like background: brighter towards the center.
#[allow(dead_code)]
pub fn mni_background() -> Volume {
    volume_from_fn(MNI_DIM, [2., 2., 2.], |x, y, z| {
        let d = (x as f32 - 45.).abs() + (y as f32 - 54.).abs() + (z as f32 - 45.).abs();
        200. - d
    })
}

/// A statistical map with a positive blob and a negative blob.
#[allow(dead_code)]
pub fn blob_map(dim: [usize; 3], voxel: f32) -> Volume {
    let c = [dim[0] / 2, dim[1] / 2, dim[2] / 2];
    volume_from_fn(dim, [voxel; 3], |x, y, z| {
        let d2 = |a: usize, b: usize| (a as f32 - b as f32).powi(2);
        let pos = d2(x, c[0]) + d2(y, c[1]) + d2(z, c[2]);
        let neg = d2(x, c[0] / 2) + d2(y, c[1]) + d2(z, c[2]);
        5. * (-pos / 8.).exp() - 5. * (-neg / 8.).exp()
    })
}

/// Encode a volume as a NIfTI-1 file.
#[allow(dead_code)]
pub fn nii_bytes(volume: &Volume, datatype: NiftiType, compress: bool) -> Vec<u8> {
    WriterOptions::new()
        .data_type(datatype)
        .compress(compress)
        .to_bytes(volume)
        .unwrap()
}

/// A little endian NIfTI-1 file with the given raw header fields, 2 mm
/// voxels and the payload right after the header.
#[allow(dead_code)]
pub fn raw_nifti1(dim: [i16; 8], datatype: i16, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; 352];
    out[0..4].copy_from_slice(&348i32.to_le_bytes());
    for (i, d) in dim.iter().enumerate() {
        out[40 + 2 * i..42 + 2 * i].copy_from_slice(&d.to_le_bytes());
    }
    out[70..72].copy_from_slice(&datatype.to_le_bytes());
    let pixdim = [1f32, 2., 2., 2., 0., 0., 0., 0.];
    for (i, p) in pixdim.iter().enumerate() {
        out[76 + 4 * i..80 + 4 * i].copy_from_slice(&p.to_le_bytes());
    }
    out[108..112].copy_from_slice(&352f32.to_le_bytes());
    out[344..348].copy_from_slice(b"n+1\0");
    out.extend_from_slice(payload);
    out
}
