#![no_main]
use libfuzzer_sys::fuzz_target;
use niiview::NiftiHeader;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = NiftiHeader::from_reader(data) {
        let _ = header.spatial_dim();
        let _ = header.data_type();
        let _ = header.voxel_size();
        let _ = header.description();
    }
});
