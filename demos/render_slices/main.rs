//! An application for rendering the three planes through the center of a
//! template, with an optional statistical map over it, into PNG files.
//!
//! Usage: `render_slices <template> [map] [threshold]`

use niiview::{Channel, ViewerController, Volume};
use std::env;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let template = args.next().expect("Path to the template file is required");
    let map = args.next();
    let threshold = args.next().map(|t| t.parse::<f32>().expect("Threshold must be a number"));

    let mut viewer = ViewerController::default();
    let ticket = viewer.request_background();
    let volume = Volume::from_file(&template);
    let _ = viewer.complete(ticket.channel(), ticket.generation(), volume);
    if let Some(error) = viewer.error(Channel::Background) {
        eprintln!("{}: {}", template, error);
    }

    if let Some(map) = map {
        let ticket = viewer.set_query(Some(map.as_str())).expect("A new query starts a load");
        let volume = Volume::from_file(&map);
        let _ = viewer.complete(ticket.channel(), ticket.generation(), volume);
        if let Some(error) = viewer.error(Channel::Overlay) {
            eprintln!("{}: {}", map, error);
        }
    }
    if let Some(threshold) = threshold {
        viewer.set_threshold_mode(niiview::ThresholdMode::Value);
        viewer.set_threshold_value(threshold);
    }

    let frame = match viewer.frame() {
        Some(frame) => frame,
        None => {
            eprintln!("Nothing to render");
            std::process::exit(1);
        }
    };
    println!("cursor at {:?}, coordinates {:?}", viewer.cursor(), frame.coords());
    for plane in frame.planes() {
        let name = format!("{}.png", plane.axis().plane_name().to_lowercase());
        plane
            .to_rgba_image()
            .expect("Pixel buffer should match the plane size")
            .save(&name)
            .expect("Failed to save the image");
        println!("wrote {} ({}x{})", name, plane.width(), plane.height());
    }
}
