//! The viewer state machine.
//!
//! [`ViewerController`] owns the two volume slots, the cursor, the
//! coordinate text fields and the compositing settings. It is purely
//! synchronous: loads are started by asking the controller for a
//! [`LoadTicket`], and finished by handing the decoded result back with
//! [`ViewerController::complete`]. The [`session`] module drives this with
//! asynchronous tasks.
//!
//! Every change of state that affects the picture re-renders the three
//! planes into a new [`Frame`].
//!
//! [`ViewerController`]: struct.ViewerController.html
//! [`LoadTicket`]: struct.LoadTicket.html
//! [`ViewerController::complete`]: struct.ViewerController.html#method.complete
//! [`session`]: session/index.html
//! [`Frame`]: struct.Frame.html

pub mod session;

pub use self::session::ViewerSession;

use crate::config::{SamplingParams, ViewerOptions};
use crate::coords::{parse_coord, CoordinateMapper};
use crate::error::Result;
use crate::render::{Compositor, OverlayStyle, PlaneImage};
use crate::source::VolumeRequest;
use crate::threshold::{ThresholdConfig, ThresholdMode, DEFAULT_PERCENTILE};
use crate::volume::{Axis, Volume};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One of the two independently loaded volumes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    /// The anatomical template
    Background,
    /// The statistical map of the current query
    Overlay,
}

/// Load status of a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState {
    /// Nothing requested
    Idle,
    /// A request is in flight
    Loading,
    /// The volume is available
    Ready,
    /// The last request failed with this message
    Failed(String),
}

#[derive(Debug)]
struct Slot {
    state: ChannelState,
    generation: u64,
    volume: Option<Arc<Volume>>,
}

impl Slot {
    fn new() -> Self {
        Slot {
            state: ChannelState::Idle,
            generation: 0,
            volume: None,
        }
    }
}

/// A started load. The result must be handed back to
/// [`ViewerController::complete`](struct.ViewerController.html#method.complete)
/// along with the ticket's channel and generation.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a load ticket must be fetched and completed"]
pub struct LoadTicket {
    channel: Channel,
    generation: u64,
    request: VolumeRequest,
}

impl LoadTicket {
    /// The channel being loaded.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Identifies this load among the loads of its channel.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// What to fetch.
    pub fn request(&self) -> &VolumeRequest {
        &self.request
    }
}

/// The three rendered planes of one state, with the coordinate text shown
/// next to them.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    planes: [PlaneImage; 3],
    coords: [String; 3],
}

impl Frame {
    /// Axial, coronal and sagittal planes, in that order.
    pub fn planes(&self) -> &[PlaneImage; 3] {
        &self.planes
    }

    /// The plane perpendicular to `axis`.
    pub fn plane(&self, axis: Axis) -> &PlaneImage {
        match axis {
            Axis::Z => &self.planes[0],
            Axis::Y => &self.planes[1],
            Axis::X => &self.planes[2],
        }
    }

    /// Text of the X, Y and Z coordinate fields.
    pub fn coords(&self) -> &[String; 3] {
        &self.coords
    }
}

/// State of one viewer.
#[derive(Debug)]
pub struct ViewerController {
    background: Slot,
    overlay: Slot,
    dim: [usize; 3],
    cursor: [usize; 3],
    coord_text: [String; 3],
    threshold: ThresholdConfig,
    cutoff: Option<f32>,
    style: OverlayStyle,
    query: Option<String>,
    sampling: SamplingParams,
    frame: Option<Frame>,
    frames_rendered: u64,
}

impl Default for ViewerController {
    fn default() -> Self {
        Self::new(&ViewerOptions::default())
    }
}

impl ViewerController {
    /// Create an empty viewer with the given settings. No load is started;
    /// see [`request_background`](#method.request_background) and
    /// [`set_query`](#method.set_query).
    pub fn new(options: &ViewerOptions) -> Self {
        ViewerController {
            background: Slot::new(),
            overlay: Slot::new(),
            dim: [0; 3],
            cursor: [0; 3],
            coord_text: ["0".to_string(), "0".to_string(), "0".to_string()],
            threshold: options.get_threshold(),
            cutoff: None,
            style: options.get_style(),
            query: None,
            sampling: options.get_sampling().clone(),
            frame: None,
            frames_rendered: 0,
        }
    }

    fn slot(&self, channel: Channel) -> &Slot {
        match channel {
            Channel::Background => &self.background,
            Channel::Overlay => &self.overlay,
        }
    }

    fn slot_mut(&mut self, channel: Channel) -> &mut Slot {
        match channel {
            Channel::Background => &mut self.background,
            Channel::Overlay => &mut self.overlay,
        }
    }

    fn begin_load(&mut self, channel: Channel, request: VolumeRequest) -> LoadTicket {
        let slot = self.slot_mut(channel);
        slot.generation += 1;
        slot.state = ChannelState::Loading;
        debug!(?channel, generation = slot.generation, "load started");
        LoadTicket {
            channel,
            generation: slot.generation,
            request,
        }
    }

    /// Start (or restart) loading the background.
    pub fn request_background(&mut self) -> LoadTicket {
        self.begin_load(Channel::Background, VolumeRequest::Background)
    }

    /// The request for the overlay of the current query, if there is one.
    pub fn overlay_request(&self) -> Option<VolumeRequest> {
        self.query.as_ref().map(|query| VolumeRequest::Overlay {
            query: query.clone(),
            sampling: self.sampling.clone(),
        })
    }

    fn reload_overlay(&mut self) -> Option<LoadTicket> {
        match self.overlay_request() {
            Some(request) => Some(self.begin_load(Channel::Overlay, request)),
            None => {
                // invalidates any load in flight
                self.overlay.generation += 1;
                self.overlay.state = ChannelState::Idle;
                if self.overlay.volume.take().is_some() {
                    self.overlay_changed();
                }
                None
            }
        }
    }

    /// Change the overlay query. An empty query drops the overlay. A load
    /// ticket is returned if the overlay must be fetched again.
    pub fn set_query<S: Into<String>>(&mut self, query: Option<S>) -> Option<LoadTicket> {
        let query = query.map(Into::into).filter(|q| !q.is_empty());
        if query == self.query {
            return None;
        }
        self.query = query;
        self.reload_overlay()
    }

    /// Change the overlay sampling parameters. A load ticket is returned if
    /// the overlay must be fetched again.
    pub fn set_sampling(&mut self, sampling: SamplingParams) -> Option<LoadTicket> {
        if sampling == self.sampling {
            return None;
        }
        self.sampling = sampling;
        self.reload_overlay()
    }

    /// Apply the result of a load. Results of loads which have since been
    /// superseded are discarded; the return value tells whether the result
    /// was applied.
    pub fn complete(&mut self, channel: Channel, generation: u64, result: Result<Volume>) -> bool {
        if generation != self.slot(channel).generation {
            debug!(?channel, generation, "discarding stale load");
            return false;
        }
        match result {
            Ok(volume) => {
                info!(?channel, dim = ?volume.dim(), "volume loaded");
                let volume = Arc::new(volume);
                let slot = self.slot_mut(channel);
                slot.state = ChannelState::Ready;
                slot.volume = Some(Arc::clone(&volume));
                let takes_grid = match channel {
                    Channel::Background => true,
                    Channel::Overlay => self.background.volume.is_none(),
                };
                if takes_grid {
                    self.reset_grid(volume.dim());
                }
            }
            Err(e) => {
                warn!(?channel, error = %e, "volume failed to load");
                let slot = self.slot_mut(channel);
                slot.state = ChannelState::Failed(e.to_string());
                slot.volume = None;
            }
        }
        match channel {
            Channel::Overlay => self.overlay_changed(),
            Channel::Background => self.redraw(),
        }
        true
    }

    fn reset_grid(&mut self, dim: [usize; 3]) {
        self.dim = dim;
        self.cursor = [dim[0] / 2, dim[1] / 2, dim[2] / 2];
        for text in &mut self.coord_text {
            *text = "0".to_string();
        }
    }

    fn overlay_changed(&mut self) {
        let (min, max) = self
            .overlay
            .volume
            .as_ref()
            .map(|v| (v.min(), v.max()))
            .unwrap_or((0., 1.));
        if self.threshold.snap_value(min, max) {
            debug!(value = self.threshold.value, "threshold value snapped into overlay range");
        }
        self.refresh_cutoff();
    }

    fn refresh_cutoff(&mut self) {
        self.cutoff = self.threshold.resolve(self.overlay.volume.as_deref());
        self.redraw();
    }

    /// The coordinate mapping of the current grid, if there is one. Voxel
    /// sizes come from the background, or else from the overlay.
    pub fn mapper(&self) -> Option<CoordinateMapper> {
        if self.dim[0] == 0 {
            return None;
        }
        let voxel_size = self
            .background
            .volume
            .as_ref()
            .or_else(|| self.overlay.volume.as_ref())
            .map(|v| v.voxel_size())
            .unwrap_or([1., 1., 1.]);
        Some(CoordinateMapper::new(self.dim, voxel_size))
    }

    fn sync_coord_text(&mut self) {
        if let Some(mapper) = self.mapper() {
            for &axis in &Axis::ALL {
                self.coord_text[axis.index()] = mapper.coord_text(axis, self.cursor[axis.index()]);
            }
        }
    }

    /// Move the cursor along one axis, clamped into the grid.
    pub fn set_index(&mut self, axis: Axis, index: usize) {
        let n = self.dim[axis.index()];
        if n == 0 {
            return;
        }
        self.cursor[axis.index()] = index.min(n - 1);
        self.sync_coord_text();
        self.redraw();
    }

    /// Handle a click at pixel `(x, y)` of the plane perpendicular to
    /// `axis`, row 0 being the top. The two cursor indices in that plane
    /// move to the clicked voxel.
    pub fn click(&mut self, axis: Axis, x: usize, y: usize) {
        if self.dim[0] == 0 {
            return;
        }
        let (width, height) = axis.plane_size(self.dim);
        let x = x.min(width - 1);
        let v = height - 1 - y.min(height - 1);
        let (h, vert) = axis.in_plane();
        let u = if axis.is_mirrored() { width - 1 - x } else { x };
        self.cursor[h.index()] = u;
        self.cursor[vert.index()] = v;
        debug!(?axis, cursor = ?self.cursor, "cursor moved by click");
        self.sync_coord_text();
        self.redraw();
    }

    /// Replace the text of a coordinate field while it is being edited.
    /// Nothing else changes until the field is committed.
    pub fn set_coord_text<S: Into<String>>(&mut self, axis: Axis, text: S) {
        let text = text.into();
        if let Some(frame) = &mut self.frame {
            frame.coords[axis.index()] = text.clone();
        }
        self.coord_text[axis.index()] = text;
    }

    /// Commit the text of a coordinate field: if it holds a number, the
    /// cursor moves to the nearest voxel and every field shows the cursor
    /// position again. Returns whether the text was accepted.
    pub fn commit_coord(&mut self, axis: Axis) -> bool {
        let mapper = match self.mapper() {
            Some(mapper) => mapper,
            None => return false,
        };
        let c = match parse_coord(&self.coord_text[axis.index()]) {
            Some(c) => c,
            None => return false,
        };
        self.cursor[axis.index()] = mapper.coord_to_index(axis, c);
        self.sync_coord_text();
        self.redraw();
        true
    }

    /// Set the overlay opacity.
    pub fn set_alpha(&mut self, alpha: f32) {
        self.style.alpha = alpha;
        self.redraw();
    }

    /// Only paint positive overlay samples.
    pub fn set_pos_only(&mut self, pos_only: bool) {
        self.style.pos_only = pos_only;
        self.redraw();
    }

    /// Compare overlay magnitudes with the threshold.
    pub fn set_use_abs(&mut self, use_abs: bool) {
        self.style.use_abs = use_abs;
        self.redraw();
    }

    /// Replace every overlay style setting.
    pub fn set_style(&mut self, style: OverlayStyle) {
        self.style = style;
        self.redraw();
    }

    /// Replace the threshold settings.
    pub fn set_threshold(&mut self, threshold: ThresholdConfig) {
        self.threshold = threshold;
        self.refresh_cutoff();
    }

    /// Switch between a literal and a percentile threshold.
    pub fn set_threshold_mode(&mut self, mode: ThresholdMode) {
        self.threshold.mode = mode;
        self.refresh_cutoff();
    }

    /// Set the literal threshold.
    pub fn set_threshold_value(&mut self, value: f32) {
        self.threshold.value = value;
        self.refresh_cutoff();
    }

    /// Set the threshold percentile. Zero and non-numbers select the
    /// default percentile.
    pub fn set_percentile(&mut self, percentile: f32) {
        self.threshold.percentile = if percentile.is_nan() || percentile == 0. {
            DEFAULT_PERCENTILE
        } else {
            percentile
        };
        self.refresh_cutoff();
    }

    fn redraw(&mut self) {
        if self.dim[0] == 0 {
            return;
        }
        let compositor = Compositor {
            grid: self.dim,
            background: self.background.volume.as_deref(),
            overlay: self.overlay.volume.as_deref(),
            style: self.style,
            threshold: self.cutoff,
        };
        if let Some(planes) = compositor.render(self.cursor) {
            self.frame = Some(Frame {
                planes,
                coords: self.coord_text.clone(),
            });
            self.frames_rendered += 1;
        }
    }

    /// The latest rendered frame. There is none before a grid is known.
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    /// Number of times the planes were rendered.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Dimensions of the display grid, zero before any volume is loaded.
    pub fn dim(&self) -> [usize; 3] {
        self.dim
    }

    /// The voxel under the cursor.
    pub fn cursor(&self) -> [usize; 3] {
        self.cursor
    }

    /// Text of one coordinate field.
    pub fn coord_text(&self, axis: Axis) -> &str {
        &self.coord_text[axis.index()]
    }

    /// Text of the X, Y and Z coordinate fields.
    pub fn coord_texts(&self) -> &[String; 3] {
        &self.coord_text
    }

    /// Load status of a channel.
    pub fn state(&self, channel: Channel) -> &ChannelState {
        &self.slot(channel).state
    }

    /// The error message of a channel's last load, if it failed.
    pub fn error(&self, channel: Channel) -> Option<&str> {
        match &self.slot(channel).state {
            ChannelState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Whether a load is in flight on either channel.
    pub fn is_loading(&self) -> bool {
        self.background.state == ChannelState::Loading || self.overlay.state == ChannelState::Loading
    }

    /// Generation of the latest load of a channel.
    pub fn generation(&self, channel: Channel) -> u64 {
        self.slot(channel).generation
    }

    /// The loaded volume of a channel.
    pub fn volume(&self, channel: Channel) -> Option<&Arc<Volume>> {
        self.slot(channel).volume.as_ref()
    }

    /// Threshold settings.
    pub fn threshold(&self) -> ThresholdConfig {
        self.threshold
    }

    /// The overlay cutoff in effect, if an overlay is loaded.
    pub fn cutoff(&self) -> Option<f32> {
        self.cutoff
    }

    /// Overlay style settings.
    pub fn style(&self) -> OverlayStyle {
        self.style
    }

    /// The current overlay query.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// The current sampling parameters.
    pub fn sampling(&self) -> &SamplingParams {
        &self.sampling
    }
}
