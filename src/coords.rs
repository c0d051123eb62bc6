//! Conversion between voxel indices and physical coordinates.
//!
//! Two mappings are known. The canonical MNI template grid (91x109x91
//! voxels of 2 mm) uses its fixed affine: the X axis runs from +90 mm on
//! the first voxel towards the left, Y starts at -126 mm and Z at -72 mm.
//! Any other grid is centered on its middle voxel, with the X axis mirrored.
//!
//! The volume's own orientation matrices are never consulted.

use crate::volume::{Axis, Volume};
use approx::abs_diff_eq;

/// Dimensions of the canonical 2 mm template grid.
pub const MNI_2MM_DIM: [usize; 3] = [91, 109, 91];
/// Voxel pitch of the canonical template grid, in millimeters.
pub const MNI_2MM_PITCH: f64 = 2.;
/// Physical coordinates of voxel `(0, 0, 0)` on the canonical grid.
pub const MNI_2MM_ORIGIN: [f64; 3] = [90., -126., -72.];
/// Direction of each axis relative to increasing voxel indices.
pub const AXIS_SIGN: [f64; 3] = [-1., 1., 1.];

const PITCH_TOLERANCE: f32 = 1e-3;

/// Bidirectional mapping between voxel indices and millimeters for one
/// grid.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CoordinateMapper {
    dim: [usize; 3],
    voxel_size: [f32; 3],
    canonical: bool,
}

impl CoordinateMapper {
    /// Create a mapper for a grid of the given dimensions and voxel pitch.
    pub fn new(dim: [usize; 3], voxel_size: [f32; 3]) -> Self {
        let canonical = dim == MNI_2MM_DIM
            && voxel_size
                .iter()
                .all(|v| abs_diff_eq!(*v, MNI_2MM_PITCH as f32, epsilon = PITCH_TOLERANCE));
        CoordinateMapper {
            dim,
            voxel_size,
            canonical,
        }
    }

    /// Create a mapper for the grid of the given volume.
    pub fn for_volume(volume: &Volume) -> Self {
        Self::new(volume.dim(), volume.voxel_size())
    }

    /// Whether this is the canonical template grid.
    pub fn is_canonical(&self) -> bool {
        self.canonical
    }

    /// The grid dimensions.
    pub fn dim(&self) -> [usize; 3] {
        self.dim
    }

    /// Physical coordinate of voxel index `i` along `axis`, in millimeters.
    pub fn index_to_coord(&self, axis: Axis, i: usize) -> f64 {
        let a = axis.index();
        let i = i as f64;
        if self.canonical {
            AXIS_SIGN[a] * MNI_2MM_PITCH * i + MNI_2MM_ORIGIN[a]
        } else {
            let half = (self.dim[a] / 2) as f64;
            AXIS_SIGN[a] * (i - half) * f64::from(self.voxel_size[a])
        }
    }

    /// Voxel index nearest to the physical coordinate `c` along `axis`,
    /// clamped into the grid. Halfway positions round up.
    pub fn coord_to_index(&self, axis: Axis, c: f64) -> usize {
        let a = axis.index();
        let v = if self.canonical {
            AXIS_SIGN[a] * (c - MNI_2MM_ORIGIN[a]) / MNI_2MM_PITCH
        } else {
            let half = (self.dim[a] / 2) as f64;
            AXIS_SIGN[a] * (c / f64::from(self.voxel_size[a])) + half
        };
        let last = self.dim[a].saturating_sub(1);
        if v.is_nan() {
            return (self.dim[a] / 2).min(last);
        }
        let idx = (v + 0.5).floor();
        if idx <= 0. {
            0
        } else if idx >= last as f64 {
            last
        } else {
            idx as usize
        }
    }

    /// Text for the coordinate of index `i` along `axis`, see
    /// [`format_coord`](fn.format_coord.html).
    pub fn coord_text(&self, axis: Axis, i: usize) -> String {
        format_coord(self.index_to_coord(axis, i))
    }
}

/// Format a coordinate the way it is shown in a text field: integral values
/// have no fractional part, others use the shortest representation which
/// reads back to the same value. Negative zero is shown as `0`.
pub fn format_coord(c: f64) -> String {
    if c == 0. {
        "0".to_string()
    } else {
        c.to_string()
    }
}

/// Parse the text of a coordinate field.
///
/// Leading whitespace is skipped and the longest numeric prefix is read, so
/// `"12mm"` parses as `12`. A signed `Infinity` is accepted as well. Text
/// without such a prefix, including empty text and a lone minus sign,
/// yields `None`.
pub fn parse_coord(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    let negative = match bytes.first() {
        Some(b'-') => {
            end = 1;
            true
        }
        Some(b'+') => {
            end = 1;
            false
        }
        _ => false,
    };
    if text[end..].starts_with("Infinity") {
        return Some(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let digits = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };
    let integral = digits(end);
    end += integral;
    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits(end + 1);
        if integral > 0 || fraction > 0 {
            end += 1 + fraction;
        }
    }
    if integral == 0 && fraction == 0 {
        return None;
    }
    if let Some(b'e') | Some(b'E') = bytes.get(end) {
        let mut exp = end + 1;
        if let Some(b'-') | Some(b'+') = bytes.get(exp) {
            exp += 1;
        }
        let exp_digits = digits(exp);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }
    text[..end].parse().ok()
}
