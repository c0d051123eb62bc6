#![no_main]
use libfuzzer_sys::fuzz_target;
use niiview::{Axis, Compositor, OverlayStyle, Volume};

fuzz_target!(|data: &[u8]| {
    if let Ok(volume) = Volume::from_bytes(data) {
        let compositor = Compositor {
            grid: volume.dim(),
            background: Some(&volume),
            overlay: Some(&volume),
            style: OverlayStyle::default(),
            threshold: Some(volume.max()),
        };
        let _ = compositor.render_plane(Axis::Z, volume.center());
    }
});
