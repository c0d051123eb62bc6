//! An application for reading NIFTI file meta-data and volume statistics.

use niiview::{CoordinateMapper, NiftiObject};
use std::env;

fn main() {
    let mut args = env::args().skip(1);
    let filename = args.next().expect("Path to NIFTI file is required");
    let obj = NiftiObject::from_file(filename).expect("Failed to read NIFTI file");
    println!("{:#?}", obj.header());

    let volume = obj.volume();
    let mapper = CoordinateMapper::for_volume(volume);
    println!("dimensions: {:?}", volume.dim());
    println!("voxel size: {:?}", volume.voxel_size());
    println!("value range: [{}, {}]", volume.min(), volume.max());
    println!("template grid: {}", mapper.is_canonical());
}
