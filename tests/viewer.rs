#[macro_use]
extern crate pretty_assertions;

mod util;

use futures::channel::oneshot;
use futures::future::{BoxFuture, FutureExt};
use niiview::render::CROSSHAIR_COLOR;
use niiview::threshold::percentile;
use niiview::{
    Axis, Channel, ChannelState, Compositor, CoordinateMapper, MemorySource, NiftiError,
    NiftiType, OverlayStyle, Result, ThresholdConfig, ViewerController, ViewerOptions,
    ViewerSession, Volume, VolumeRequest, VolumeSource,
};
use std::collections::HashMap;
use std::sync::Mutex;
use util::{blob_map, mni_background, nii_bytes, volume_from_fn, MNI_DIM};

fn load(viewer: &mut ViewerController, background: Option<Volume>, overlay: Option<Volume>) {
    if let Some(volume) = background {
        let ticket = viewer.request_background();
        assert!(viewer.complete(ticket.channel(), ticket.generation(), Ok(volume)));
    }
    if let Some(volume) = overlay {
        let ticket = viewer.set_query(Some("emotion")).unwrap();
        assert!(viewer.complete(ticket.channel(), ticket.generation(), Ok(volume)));
    }
}

#[test]
fn template_grid_is_canonical() {
    let mut viewer = ViewerController::default();
    load(&mut viewer, Some(mni_background()), None);

    assert_eq!(viewer.dim(), MNI_DIM);
    assert_eq!(viewer.cursor(), [45, 54, 45]);
    assert_eq!(viewer.coord_texts(), &["0", "0", "0"]);
    let mapper = viewer.mapper().unwrap();
    assert!(mapper.is_canonical());
    assert_eq!(mapper.index_to_coord(Axis::X, 45), 0.);
    assert_eq!(mapper.index_to_coord(Axis::Y, 54), -18.);
    assert_eq!(mapper.index_to_coord(Axis::Z, 45), 18.);

    viewer.set_index(Axis::X, 45);
    assert_eq!(viewer.coord_texts(), &["0", "-18", "18"]);

    let frame = viewer.frame().unwrap();
    let sizes: Vec<_> = frame.planes().iter().map(|p| (p.width(), p.height())).collect();
    assert_eq!(sizes, vec![(91, 109), (91, 91), (109, 91)]);
    // crosshair through the cursor on the axial plane
    let axial = frame.plane(Axis::Z);
    assert_eq!(axial.pixel(45, 0), Some(CROSSHAIR_COLOR));
    assert_eq!(axial.pixel(0, 54), Some(CROSSHAIR_COLOR));
}

#[test]
fn template_coordinates_round_trip() {
    let mapper = CoordinateMapper::new(MNI_DIM, [2., 2., 2.]);
    for &axis in &Axis::ALL {
        for i in 0..MNI_DIM[axis.index()] {
            let c = mapper.index_to_coord(axis, i);
            assert_eq!(mapper.coord_to_index(axis, c), i);
        }
    }
}

#[test]
fn mismatched_overlay_is_left_out() {
    let mut plain = ViewerController::default();
    load(&mut plain, Some(mni_background()), None);

    let mut viewer = ViewerController::default();
    load(
        &mut viewer,
        Some(mni_background()),
        Some(blob_map([64, 64, 40], 3.)),
    );
    assert_eq!(viewer.state(Channel::Overlay), &ChannelState::Ready);
    assert_eq!(viewer.dim(), MNI_DIM);
    assert_eq!(viewer.frame(), plain.frame());
}

#[test]
fn overlay_is_blended_over_the_template() {
    let overlay = blob_map(MNI_DIM, 2.);
    let mut plain = ViewerController::default();
    load(&mut plain, Some(mni_background()), None);
    let mut viewer = ViewerController::default();
    load(&mut viewer, Some(mni_background()), Some(overlay.clone()));

    assert_eq!(viewer.cutoff(), Some(percentile(overlay.data(), 95.)));

    // voxel (44, 53, 45), next to the cursor
    let gray = plain.frame().unwrap().plane(Axis::Z).pixel(46, 55).unwrap();
    assert_eq!(gray.r, gray.g);
    let red = viewer.frame().unwrap().plane(Axis::Z).pixel(46, 55).unwrap();
    assert!(red.r > red.g);
    assert_eq!(red.g, red.b);

    // the negative blob only shows when magnitudes count
    let (col, row) = (90 - 22, 108 - 53);
    let before = viewer.frame().unwrap().plane(Axis::Z).pixel(col, row).unwrap();
    assert_eq!(before.r, before.g);
    viewer.set_style(OverlayStyle {
        pos_only: false,
        use_abs: true,
        ..OverlayStyle::default()
    });
    let after = viewer.frame().unwrap().plane(Axis::Z).pixel(col, row).unwrap();
    assert!(after.r > after.g);

    viewer.set_alpha(0.);
    let hidden = viewer.frame().unwrap().plane(Axis::Z).pixel(col, row).unwrap();
    assert_eq!(hidden, before);
}

#[test]
fn infinite_threshold_hides_the_overlay() {
    let mut plain = ViewerController::default();
    load(&mut plain, Some(mni_background()), None);
    let mut viewer = ViewerController::default();
    load(&mut viewer, Some(mni_background()), Some(blob_map(MNI_DIM, 2.)));

    viewer.set_threshold(ThresholdConfig::value(std::f32::INFINITY));
    assert_eq!(viewer.cutoff(), Some(std::f32::INFINITY));
    assert_eq!(viewer.frame(), plain.frame());

    viewer.set_threshold(ThresholdConfig::value(std::f32::NAN));
    assert_eq!(viewer.cutoff(), Some(0.));
    assert_ne!(viewer.frame(), plain.frame());
}

#[test]
fn clicks_update_the_coordinates() {
    let mut viewer = ViewerController::default();
    load(&mut viewer, Some(mni_background()), None);
    viewer.click(Axis::Z, 46, 55);
    assert_eq!(viewer.cursor(), [44, 53, 45]);
    assert_eq!(viewer.coord_texts(), &["2", "-20", "18"]);
    assert_eq!(viewer.frame().unwrap().coords(), viewer.coord_texts());

    viewer.set_coord_text(Axis::Z, " -71 ");
    assert!(viewer.commit_coord(Axis::Z));
    assert_eq!(viewer.cursor()[2], 1);
    assert_eq!(viewer.coord_text(Axis::Z), "-70");
    let sagittal = viewer.frame().unwrap().plane(Axis::X);
    assert_eq!(sagittal.index(), 44);
    assert_eq!(sagittal.pixel(53, 90 - 1), Some(CROSSHAIR_COLOR));
}

#[test]
fn coordinates_with_units_and_infinities() {
    let mut viewer = ViewerController::default();
    load(&mut viewer, Some(mni_background()), None);

    viewer.set_coord_text(Axis::X, "12mm");
    assert!(viewer.commit_coord(Axis::X));
    assert_eq!(viewer.cursor()[0], 39);
    assert_eq!(viewer.coord_text(Axis::X), "12");

    viewer.set_coord_text(Axis::Y, "Infinity");
    assert!(viewer.commit_coord(Axis::Y));
    assert_eq!(viewer.cursor()[1], 108);
    assert_eq!(viewer.coord_text(Axis::Y), "90");

    viewer.set_coord_text(Axis::Z, "-Infinity");
    assert!(viewer.commit_coord(Axis::Z));
    assert_eq!(viewer.cursor()[2], 0);
    assert_eq!(viewer.coord_text(Axis::Z), "-72");

    viewer.set_coord_text(Axis::Z, "mm12");
    assert!(!viewer.commit_coord(Axis::Z));
    assert_eq!(viewer.cursor(), [39, 108, 0]);
}

#[test]
fn renders_are_idempotent() {
    let background = mni_background();
    let overlay = blob_map(MNI_DIM, 2.);
    let compositor = Compositor {
        grid: MNI_DIM,
        background: Some(&background),
        overlay: Some(&overlay),
        style: OverlayStyle::default(),
        threshold: Some(1.),
    };
    let first = compositor.render([30, 60, 40]).unwrap();
    let second = compositor.render([30, 60, 40]).unwrap();
    assert_eq!(first, second);
    assert!(compositor.render([91, 0, 0]).is_none());

    let mut viewer = ViewerController::default();
    load(&mut viewer, Some(background.clone()), Some(overlay.clone()));
    viewer.set_threshold(ThresholdConfig::value(1.));
    let before = viewer.frame().cloned().unwrap();
    let rendered = viewer.frames_rendered();
    viewer.set_threshold(ThresholdConfig::value(1.));
    assert_eq!(viewer.frames_rendered(), rendered + 1);
    assert_eq!(viewer.frame(), Some(&before));
}

#[test]
fn overlay_alone_defines_the_grid() {
    let mut viewer = ViewerController::default();
    let overlay = volume_from_fn([10, 8, 6], [3., 3., 3.], |x, _, _| x as f32 - 5.);
    load(&mut viewer, None, Some(overlay));
    assert_eq!(viewer.dim(), [10, 8, 6]);
    assert!(!viewer.mapper().unwrap().is_canonical());
    viewer.set_index(Axis::X, 0);
    assert_eq!(viewer.coord_text(Axis::X), "15");
    let frame = viewer.frame().unwrap();
    assert_eq!(frame.plane(Axis::Z).width(), 10);
}

/// A source whose overlays are only delivered when the test says so.
#[derive(Default)]
struct GatedSource {
    background: Vec<u8>,
    gates: Mutex<HashMap<String, oneshot::Receiver<Vec<u8>>>>,
}

impl GatedSource {
    fn gate(&self, query: &str) -> oneshot::Sender<Vec<u8>> {
        let (sender, receiver) = oneshot::channel();
        let _ = self.gates.lock().unwrap().insert(query.to_string(), receiver);
        sender
    }
}

impl VolumeSource for GatedSource {
    fn fetch(&self, request: &VolumeRequest) -> BoxFuture<'static, Result<Vec<u8>>> {
        match request {
            VolumeRequest::Background => futures::future::ready(Ok(self.background.clone())).boxed(),
            VolumeRequest::Overlay { query, .. } => {
                let gate = self.gates.lock().unwrap().remove(query);
                async move {
                    let gate = gate.ok_or(NiftiError::Network {
                        status: Some(404),
                        body: String::new(),
                    })?;
                    gate.await.map_err(|_| NiftiError::Network {
                        status: None,
                        body: "cancelled".to_string(),
                    })
                }
                .boxed()
            }
        }
    }
}

fn small(value: f32) -> Vec<u8> {
    let volume = volume_from_fn([6, 5, 4], [2., 2., 2.], |x, _, _| x as f32 * value);
    nii_bytes(&volume, NiftiType::Float32, true)
}

#[tokio::test]
async fn late_overlays_are_discarded() {
    let source = GatedSource {
        background: small(1.),
        ..GatedSource::default()
    };
    let gate_a = source.gate("a");
    let gate_b = source.gate("b");

    let mut session = ViewerSession::new(source, &ViewerOptions::new());
    session.start();
    session.set_query(Some("a"));
    session.set_query(Some("b"));
    assert_eq!(session.controller().query(), Some("b"));

    gate_b.send(small(10.)).unwrap();
    session.settle().await;
    let viewer = session.controller();
    assert_eq!(viewer.state(Channel::Background), &ChannelState::Ready);
    assert_eq!(viewer.state(Channel::Overlay), &ChannelState::Ready);
    assert_eq!(viewer.volume(Channel::Overlay).unwrap().max(), 50.);

    // the load of "a" was superseded
    let _ = gate_a.send(small(100.));
    tokio::task::yield_now().await;
    assert_eq!(session.poll_completions(), 0);
    assert_eq!(session.controller().volume(Channel::Overlay).unwrap().max(), 50.);
}

#[tokio::test]
async fn template_through_a_session() {
    let source = MemorySource::new()
        .with_background(nii_bytes(&mni_background(), NiftiType::Float32, true))
        .with_overlay("emotion", nii_bytes(&blob_map([64, 64, 40], 3.), NiftiType::Float32, false));
    let mut session = ViewerSession::new(source, &ViewerOptions::new().query("emotion"));
    session.start();
    session.settle().await;

    let viewer = session.controller();
    assert_eq!(viewer.cursor(), [45, 54, 45]);
    assert_eq!(viewer.coord_texts(), &["0", "0", "0"]);
    assert_eq!(viewer.volume(Channel::Overlay).unwrap().dim(), [64, 64, 40]);

    let mut plain = ViewerController::default();
    load(&mut plain, Some(mni_background()), None);
    assert_eq!(viewer.frame().unwrap().planes(), plain.frame().unwrap().planes());

    session.controller_mut().set_index(Axis::Y, 54);
    assert_eq!(session.controller().coord_texts(), &["0", "-18", "18"]);
}
