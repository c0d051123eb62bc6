//! Orthogonal slices of a volume.
//!
//! A [`SliceView`] fixes one voxel index along an [`Axis`] and exposes the
//! remaining two axes as a 2-D sampler over the volume's own buffer, without
//! copying anything. Horizontal position `u` and vertical position `v` follow
//! the table below, with `v = 0` at the anatomical bottom.
//!
//! | axis | width | height | address(u, v)                 |
//! |------|-------|--------|-------------------------------|
//! | z    | nx    | ny     | `u + v*nx + index*nx*ny`      |
//! | y    | nx    | nz     | `u + index*nx + v*nx*ny`      |
//! | x    | ny    | nz     | `index + u*nx + v*nx*ny`      |
//!
//! For display, slices whose horizontal axis is X (axial and coronal) are
//! mirrored so that the anatomical right side ends up on the right of the
//! screen.
//!
//! [`SliceView`]: ./struct.SliceView.html
//! [`Axis`]: ./enum.Axis.html
use super::Volume;
use crate::error::{NiftiError, Result};

/// One of the three spatial axes of a volume. Each axis also names the
/// plane perpendicular to it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    /// Left-right axis; sagittal planes
    X,
    /// Posterior-anterior axis; coronal planes
    Y,
    /// Inferior-superior axis; axial planes
    Z,
}

impl Axis {
    /// All axes, in storage order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Position of this axis in a `[x, y, z]` triplet.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Name of the plane perpendicular to this axis.
    pub fn plane_name(self) -> &'static str {
        match self {
            Axis::X => "Sagittal",
            Axis::Y => "Coronal",
            Axis::Z => "Axial",
        }
    }

    /// The (horizontal, vertical) axes of the plane perpendicular to this
    /// axis.
    pub fn in_plane(self) -> (Axis, Axis) {
        match self {
            Axis::X => (Axis::Y, Axis::Z),
            Axis::Y => (Axis::X, Axis::Z),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }

    /// Whether the horizontal axis of this plane is flipped for display.
    pub fn is_mirrored(self) -> bool {
        self.in_plane().0 == Axis::X
    }

    /// (width, height) of the plane perpendicular to this axis on a grid of
    /// the given dimensions.
    pub fn plane_size(self, dim: [usize; 3]) -> (usize, usize) {
        let (h, v) = self.in_plane();
        (dim[h.index()], dim[v.index()])
    }
}

/// A 2-D view into a volume with one axis fixed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SliceView<'a> {
    data: &'a [f32],
    dim: [usize; 3],
    axis: Axis,
    index: usize,
}

impl<'a> SliceView<'a> {
    /// Create a slice of `volume` at the given index of `axis`.
    ///
    /// # Errors
    ///
    /// - `NiftiError::OutOfBounds` if `index` is not within the axis.
    pub fn new(volume: &'a Volume, axis: Axis, index: usize) -> Result<Self> {
        let dim = volume.dim();
        if index >= dim[axis.index()] {
            let mut coords = vec![0; 3];
            coords[axis.index()] = index;
            return Err(NiftiError::OutOfBounds(coords));
        }
        Ok(SliceView {
            data: volume.data(),
            dim,
            axis,
            index,
        })
    }

    /// Create a slice for a display grid of dimensions `grid`. The result is
    /// `None` when there is no volume, when its dimensions differ from the
    /// grid, or when `index` lies outside of it: a structurally incompatible
    /// volume is simply left out of the picture.
    pub fn on_grid(
        volume: Option<&'a Volume>,
        grid: [usize; 3],
        axis: Axis,
        index: usize,
    ) -> Option<Self> {
        let volume = volume?;
        if volume.dim() != grid {
            return None;
        }
        SliceView::new(volume, axis, index).ok()
    }

    /// The fixed axis.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// The fixed index along the axis.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.axis.plane_size(self.dim).0
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.axis.plane_size(self.dim).1
    }

    /// Position in the volume buffer of the sample at column `u`, row `v`.
    pub fn address(&self, u: usize, v: usize) -> usize {
        let [nx, ny, _] = self.dim;
        match self.axis {
            Axis::Z => u + v * nx + self.index * nx * ny,
            Axis::Y => u + self.index * nx + v * nx * ny,
            Axis::X => self.index + u * nx + v * nx * ny,
        }
    }

    /// The sample at column `u`, row `v`, in volume order.
    pub fn sample(&self, u: usize, v: usize) -> f32 {
        self.data[self.address(u, v)]
    }

    /// The volume column shown at screen column `u`.
    pub fn display_column(&self, u: usize) -> usize {
        if self.axis.is_mirrored() {
            self.width() - 1 - u
        } else {
            u
        }
    }

    /// The sample shown at screen column `u`, volume row `v`.
    pub fn sample_display(&self, u: usize, v: usize) -> f32 {
        self.sample(self.display_column(u), v)
    }
}

#[cfg(test)]
mod tests {
    use super::{Axis, SliceView};
    use crate::volume::Volume;

    fn ramp(dim: [usize; 3]) -> Volume {
        let n = dim.iter().product::<usize>();
        let data = (0..n).map(|i| i as f32).collect();
        Volume::new(data, dim, [1., 1., 1.]).unwrap()
    }

    #[test]
    fn sizes_and_addresses_stay_in_range() {
        for &dim in &[[1, 1, 1], [4, 3, 2], [2, 5, 7], [9, 1, 4]] {
            let volume = ramp(dim);
            let len = volume.len();
            for &axis in &Axis::ALL {
                for index in 0..dim[axis.index()] {
                    let slice = SliceView::new(&volume, axis, index).unwrap();
                    let (h, v) = axis.in_plane();
                    assert_eq!(
                        slice.width() * slice.height(),
                        dim[h.index()] * dim[v.index()]
                    );
                    for v in 0..slice.height() {
                        for u in 0..slice.width() {
                            assert!(slice.address(u, v) < len);
                            assert!(slice.display_column(u) < slice.width());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn addresses_follow_axes() {
        let volume = ramp([4, 3, 2]);
        let z = SliceView::new(&volume, Axis::Z, 1).unwrap();
        assert_eq!((z.width(), z.height()), (4, 3));
        assert_eq!(z.sample(2, 1), volume.get([2, 1, 1]).unwrap());

        let y = SliceView::new(&volume, Axis::Y, 2).unwrap();
        assert_eq!((y.width(), y.height()), (4, 2));
        assert_eq!(y.sample(3, 1), volume.get([3, 2, 1]).unwrap());

        let x = SliceView::new(&volume, Axis::X, 3).unwrap();
        assert_eq!((x.width(), x.height()), (3, 2));
        assert_eq!(x.sample(1, 1), volume.get([3, 1, 1]).unwrap());
    }

    #[test]
    fn mirroring() {
        let volume = ramp([4, 3, 2]);
        let z = SliceView::new(&volume, Axis::Z, 0).unwrap();
        assert_eq!(z.sample_display(0, 0), volume.get([3, 0, 0]).unwrap());
        let y = SliceView::new(&volume, Axis::Y, 0).unwrap();
        assert_eq!(y.sample_display(3, 1), volume.get([0, 0, 1]).unwrap());
        let x = SliceView::new(&volume, Axis::X, 2).unwrap();
        assert_eq!(x.sample_display(0, 1), volume.get([2, 0, 1]).unwrap());
    }

    #[test]
    fn out_of_bounds_and_mismatched_grids() {
        let volume = ramp([4, 3, 2]);
        assert!(SliceView::new(&volume, Axis::Z, 2).is_err());
        assert!(SliceView::on_grid(Some(&volume), [4, 3, 2], Axis::Y, 1).is_some());
        assert!(SliceView::on_grid(Some(&volume), [4, 3, 3], Axis::Y, 1).is_none());
        assert!(SliceView::on_grid(Some(&volume), [4, 3, 2], Axis::X, 4).is_none());
        assert!(SliceView::on_grid(None, [4, 3, 2], Axis::X, 0).is_none());
    }
}
