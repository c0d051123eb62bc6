//! Slice compositing.
//!
//! Each plane is rendered as a grayscale image of the background slice,
//! over which overlay voxels passing the threshold are blended with a fixed
//! red, and a green crosshair marks the cursor. Row 0 of an image is the
//! top of the screen, which is the anatomical top of the slice.

use crate::volume::{Axis, SliceView, Volume};
use rgb::{ComponentBytes, RGBA8};
use tracing::trace;

/// Color blended over voxels passing the overlay threshold.
pub const OVERLAY_COLOR: RGBA8 = RGBA8 {
    r: 255,
    g: 0,
    b: 0,
    a: 255,
};

/// Color of the cursor lines.
pub const CROSSHAIR_COLOR: RGBA8 = RGBA8 {
    r: 0,
    g: 255,
    b: 0,
    a: 255,
};

const BLACK: RGBA8 = RGBA8 {
    r: 0,
    g: 0,
    b: 0,
    a: 255,
};

/// How overlay voxels are selected and blended.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverlayStyle {
    /// Opacity of the overlay color, clamped into `[0, 1]` when rendering
    pub alpha: f32,
    /// Only positive overlay samples may pass
    pub pos_only: bool,
    /// Compare the magnitude of overlay samples with the threshold
    pub use_abs: bool,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        OverlayStyle {
            alpha: 0.5,
            pos_only: true,
            use_abs: false,
        }
    }
}

impl OverlayStyle {
    /// Whether an overlay sample is painted. Without a threshold, any
    /// strictly positive value passes. The positive-only gate looks at the
    /// signed sample, even when magnitudes are compared.
    pub fn passes(&self, raw: f32, threshold: Option<f32>) -> bool {
        let v = if self.use_abs { raw.abs() } else { raw };
        let pass = match threshold {
            None => v > 0.,
            Some(t) => v >= t,
        };
        pass && !(self.pos_only && raw <= 0.)
    }
}

/// One rendered plane, stored row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneImage {
    axis: Axis,
    index: usize,
    width: usize,
    height: usize,
    pixels: Vec<RGBA8>,
}

impl PlaneImage {
    /// The axis perpendicular to this plane.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// The slice index along the axis.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// All pixels, row by row from the top.
    pub fn pixels(&self) -> &[RGBA8] {
        &self.pixels
    }

    /// The pixel at column `x` of row `y`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<RGBA8> {
        if x < self.width && y < self.height {
            Some(self.pixels[x + y * self.width])
        } else {
            None
        }
    }

    /// The pixels as a flat RGBA byte buffer.
    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_bytes()
    }

    /// Copy into an `image` buffer, for encoding to common image formats.
    #[cfg(feature = "image")]
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(
            self.width as u32,
            self.height as u32,
            self.as_bytes().to_vec(),
        )
    }
}

/// Everything needed to render the three planes of one state.
#[derive(Debug, Copy, Clone)]
pub struct Compositor<'a> {
    /// Dimensions of the display grid
    pub grid: [usize; 3],
    /// Grayscale layer
    pub background: Option<&'a Volume>,
    /// Thresholded color layer
    pub overlay: Option<&'a Volume>,
    /// Overlay blending settings
    pub style: OverlayStyle,
    /// Resolved overlay cutoff
    pub threshold: Option<f32>,
}

impl<'a> Compositor<'a> {
    /// Render the plane perpendicular to `axis` through `cursor`. There is
    /// no image if the cursor lies outside of the grid on that axis, or if
    /// the plane is empty.
    ///
    /// Layers whose dimensions differ from the grid are left out.
    pub fn render_plane(&self, axis: Axis, cursor: [usize; 3]) -> Option<PlaneImage> {
        let index = cursor[axis.index()];
        if index >= self.grid[axis.index()] {
            return None;
        }
        let (width, height) = axis.plane_size(self.grid);
        if width == 0 || height == 0 {
            return None;
        }
        let bg = SliceView::on_grid(self.background, self.grid, axis, index);
        let ov = SliceView::on_grid(self.overlay, self.grid, axis, index);
        trace!(
            ?axis,
            index,
            background = bg.is_some(),
            overlay = ov.is_some(),
            "rendering plane"
        );

        let (bg_min, bg_range) = match self.background {
            Some(v) => {
                let range = f64::from(v.max()) - f64::from(v.min());
                (f64::from(v.min()), if range == 0. { 1. } else { range })
            }
            None => (0., 1.),
        };
        let alpha = f64::from(self.style.alpha.max(0.).min(1.));

        let mut pixels = Vec::with_capacity(width * height);
        for row in 0..height {
            let v = height - 1 - row;
            for u in 0..width {
                let mut px = BLACK;
                if let Some(bg) = &bg {
                    let g = (f64::from(bg.sample_display(u, v)) - bg_min) / bg_range;
                    let g = if g < 0. {
                        0.
                    } else if g > 1. {
                        1.
                    } else {
                        g
                    };
                    let gray = (g * 255.) as u8;
                    px = RGBA8::new(gray, gray, gray, 255);
                }
                if let Some(ov) = &ov {
                    if self.style.passes(ov.sample_display(u, v), self.threshold) {
                        px = blend(px, OVERLAY_COLOR, alpha);
                    }
                }
                pixels.push(px);
            }
        }

        let mut image = PlaneImage {
            axis,
            index,
            width,
            height,
            pixels,
        };
        draw_crosshair(&mut image, cursor);
        Some(image)
    }

    /// Render the axial, coronal and sagittal planes, in that order.
    pub fn render(&self, cursor: [usize; 3]) -> Option<[PlaneImage; 3]> {
        Some([
            self.render_plane(Axis::Z, cursor)?,
            self.render_plane(Axis::Y, cursor)?,
            self.render_plane(Axis::X, cursor)?,
        ])
    }
}

fn blend(under: RGBA8, over: RGBA8, alpha: f64) -> RGBA8 {
    let mix = |a: u8, b: u8| ((1. - alpha) * f64::from(a) + alpha * f64::from(b)) as u8;
    RGBA8::new(
        mix(under.r, over.r),
        mix(under.g, over.g),
        mix(under.b, over.b),
        under.a,
    )
}

/// Screen position (column, row) of the cursor on a plane.
pub fn crosshair_position(
    axis: Axis,
    width: usize,
    height: usize,
    cursor: [usize; 3],
) -> (usize, usize) {
    let [ix, iy, iz] = cursor;
    let last_col = width.saturating_sub(1);
    let last_row = height.saturating_sub(1);
    let (col, r) = match axis {
        Axis::Z => (last_col.saturating_sub(ix), iy),
        Axis::Y => (last_col.saturating_sub(ix), iz),
        Axis::X => (iy.min(last_col), iz),
    };
    (col, last_row - r.min(last_row))
}

fn draw_crosshair(image: &mut PlaneImage, cursor: [usize; 3]) {
    let (col, row) = crosshair_position(image.axis, image.width, image.height, cursor);
    let width = image.width;
    for y in 0..image.height {
        image.pixels[col + y * width] = CROSSHAIR_COLOR;
    }
    for px in &mut image.pixels[row * width..(row + 1) * width] {
        *px = CROSSHAIR_COLOR;
    }
}
