//! An application for writing a synthetic template and statistical map, to
//! try out the viewer without a map service.

use niiview::{Volume, WriterOptions};
use std::env;

const DIM: [usize; 3] = [91, 109, 91];

fn generate<F>(f: F) -> Volume
where
    F: Fn(f32, f32, f32) -> f32,
{
    let mut data = Vec::with_capacity(DIM.iter().product());
    for z in 0..DIM[2] {
        for y in 0..DIM[1] {
            for x in 0..DIM[0] {
                // distance to the center, in voxels
                let dx = x as f32 - 45.;
                let dy = y as f32 - 54.;
                let dz = z as f32 - 45.;
                data.push(f(dx, dy, dz));
            }
        }
    }
    Volume::new(data, DIM, [2., 2., 2.]).expect("Grid and samples should agree")
}

fn main() {
    let mut args = env::args().skip(1);
    let template = args.next().expect("Path to the template file is required");
    let map = args.next().expect("Path to the map file is required");

    // an ellipsoid "brain"
    let background = generate(|dx, dy, dz| {
        let r = (dx / 40.).powi(2) + (dy / 50.).powi(2) + (dz / 38.).powi(2);
        if r < 1. {
            1. - 0.5 * r
        } else {
            0.
        }
    });
    WriterOptions::new()
        .description("synthetic template")
        .write_file(&template, &background)
        .expect("Failed to write the template");

    // two activation blobs, one each side
    let overlay = generate(|dx, dy, dz| {
        let left = (dx + 15.).powi(2) + dy.powi(2) + (dz - 5.).powi(2);
        let right = (dx - 15.).powi(2) + (dy + 10.).powi(2) + dz.powi(2);
        6. * (-left / 20.).exp() - 4. * (-right / 30.).exp()
    });
    WriterOptions::new()
        .description("synthetic map")
        .write_file(&map, &overlay)
        .expect("Failed to write the map");
}
