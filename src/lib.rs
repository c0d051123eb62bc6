//! Engine of a NIfTI brain volume viewer.
//!
//! This crate decodes NIfTI-1 and NIfTI-2 volumes (optionally gzip
//! compressed) into single precision [`Volume`]s, and renders the three
//! orthogonal planes through a cursor: a grayscale background template with
//! a thresholded statistical map blended over it in red, and a green
//! crosshair.
//!
//! The pieces can be used on their own, from [`Volume::from_bytes`] and
//! [`SliceView`] to the [`Compositor`], or through a [`ViewerController`],
//! which keeps the cursor, coordinate text and settings of one viewer in
//! sync. A [`ViewerSession`] loads both volumes concurrently from a
//! [`VolumeSource`].
//!
//! # Example
//!
//! ```no_run
//! use niiview::{Axis, Compositor, OverlayStyle, Volume};
//! # use niiview::Result;
//!
//! # fn run() -> Result<()> {
//! let background = Volume::from_file("mni_2mm.nii.gz")?;
//! let compositor = Compositor {
//!     grid: background.dim(),
//!     background: Some(&background),
//!     overlay: None,
//!     style: OverlayStyle::default(),
//!     threshold: None,
//! };
//! let axial = compositor.render_plane(Axis::Z, background.center());
//! # Ok(())
//! # }
//! ```
//!
//! [`Volume`]: ./volume/struct.Volume.html
//! [`Volume::from_bytes`]: ./volume/struct.Volume.html#method.from_bytes
//! [`SliceView`]: ./volume/slice/struct.SliceView.html
//! [`Compositor`]: ./render/struct.Compositor.html
//! [`ViewerController`]: ./controller/struct.ViewerController.html
//! [`ViewerSession`]: ./controller/session/struct.ViewerSession.html
//! [`VolumeSource`]: ./source/trait.VolumeSource.html
#![deny(missing_debug_implementations)]
#![warn(missing_docs, unused_extern_crates, trivial_casts, unused_results)]

#[macro_use]
extern crate quick_error;
#[macro_use]
extern crate num_derive;

pub mod config;
pub mod controller;
pub mod coords;
pub mod error;
pub mod header;
pub mod object;
pub mod render;
pub mod source;
pub mod threshold;
pub mod typedef;
mod util;
pub mod volume;
pub mod writer;

pub use crate::config::{SamplingParams, ViewerOptions};
pub use crate::controller::{
    Channel, ChannelState, Frame, LoadTicket, ViewerController, ViewerSession,
};
pub use crate::coords::CoordinateMapper;
pub use crate::error::{ErrorKind, NiftiError, Result};
pub use crate::header::NiftiHeader;
pub use crate::object::NiftiObject;
pub use crate::render::{Compositor, OverlayStyle, PlaneImage};
#[cfg(feature = "http")]
pub use crate::source::HttpSource;
pub use crate::source::{FileSource, MemorySource, VolumeRequest, VolumeSource};
pub use crate::threshold::{ThresholdConfig, ThresholdMode};
pub use crate::typedef::NiftiType;
pub use crate::volume::{Axis, SliceView, Volume};
pub use crate::writer::{write_nifti, WriterOptions};
pub use byteordered::Endianness;

#[cfg(feature = "ndarray_volumes")]
pub use crate::volume::ndarray::IntoNdArray;
