//! Block scatter/gather: copying between a block's strided sub-grid and a
//! caller's dense row-major buffer.

use crate::bounds::Bounds;
use crate::vector::{Axis, Vector3};

/// A `(from, to, stride)` sub-grid of the dataset, as produced by the bit
/// string machinery or a block's own addressing.
///
/// `from <= to` componentwise and every component of `stride` is a positive
/// power of two.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid3 {
    /// Inclusive lower corner.
    pub from: Vector3<i64>,
    /// Inclusive upper corner.
    pub to: Vector3<i64>,
    /// Per-axis step between consecutive samples.
    pub stride: Vector3<i64>,
}

impl Grid3 {
    /// A grid containing the single point `(0, 0, 0)`.
    pub fn origin() -> Grid3 {
        Grid3 {
            from: Vector3::splat(0),
            to: Vector3::splat(0),
            stride: Vector3::splat(1),
        }
    }

    /// The number of samples along each axis.
    pub fn dims(&self) -> Vector3<i64> {
        Vector3::from_fn(|a| (self.to[a] - self.from[a]) / self.stride[a] + 1)
    }

    /// Total sample count, the product of [`Grid3::dims`].
    pub fn sample_count(&self) -> u64 {
        let d = self.dims();
        Axis::ALL.iter().map(|&a| d[a] as u64).product()
    }

    /// The bounding box of this grid, ignoring stride.
    pub fn bounds(&self) -> Bounds {
        Bounds {
            min: self.from,
            max: self.to,
        }
    }
}

/// Number of bytes occupied by one sample, dispatch-friendly: always one of
/// `{1, 2, 4, 8, 16}` in practice (scalar widths up to `f64`/`i64`, or a
/// 2-component `f64`/`i64` vector).
pub type ElemBytes = usize;

type CopyFn = fn(&[u8], &mut [u8]);

fn copy1(src: &[u8], dst: &mut [u8]) {
    dst[0] = src[0];
}
fn copy2(src: &[u8], dst: &mut [u8]) {
    dst[..2].copy_from_slice(&src[..2]);
}
fn copy4(src: &[u8], dst: &mut [u8]) {
    dst[..4].copy_from_slice(&src[..4]);
}
fn copy8(src: &[u8], dst: &mut [u8]) {
    dst[..8].copy_from_slice(&src[..8]);
}
fn copy16(src: &[u8], dst: &mut [u8]) {
    dst[..16].copy_from_slice(&src[..16]);
}
fn copy_dyn(src: &[u8], dst: &mut [u8]) {
    dst.copy_from_slice(src);
}

/// Picks the per-sample copy routine once per call, not once per sample, so
/// the inner loop never branches on width.
fn copy_fn_for_width(width: ElemBytes) -> CopyFn {
    match width {
        1 => copy1,
        2 => copy2,
        4 => copy4,
        8 => copy8,
        16 => copy16,
        _ => copy_dyn,
    }
}

/// Aligns `block`'s bounds with `grid`, rounding `from` up to the next
/// sample on the block's stride, and returns the overlap if non-empty.
pub(crate) fn intersect(block: &Grid3, grid: &Bounds) -> Option<Bounds> {
    let overlap = block.bounds().intersect(grid)?;
    let min = Vector3::from_fn(|a| {
        let stride = block.stride[a];
        let rem = (overlap.min[a] - block.from[a]).rem_euclid(stride);
        if rem == 0 {
            overlap.min[a]
        } else {
            overlap.min[a] + (stride - rem)
        }
    });
    let aligned = Bounds {
        min,
        max: overlap.max,
    };
    if aligned.is_valid() {
        Some(aligned)
    } else {
        None
    }
}

pub(crate) fn linear_index(p: Vector3<i64>, origin: Vector3<i64>, stride: Vector3<i64>, dims: Vector3<i64>) -> usize {
    let k = Vector3::from_fn(|a| (p[a] - origin[a]) / stride[a]);
    ((k.z * dims.y + k.y) * dims.x + k.x) as usize
}

/// Copies the overlap of `block` and `grid` from the block's buffer into the
/// grid's dense row-major buffer. Used by the read engine.
///
/// `grid` describes `grid_buf`'s extent; `grid_buf` is addressed with
/// implicit stride 1. No-op if the two boxes don't overlap.
pub fn scatter_block_to_grid(
    block: &Grid3,
    block_buf: &[u8],
    grid: &Bounds,
    grid_buf: &mut [u8],
    elem_bytes: ElemBytes,
) {
    let Some(inter) = intersect(block, grid) else {
        return;
    };
    let block_dims = block.dims();
    let grid_dims = Vector3::from_fn(|a| grid.max[a] - grid.min[a] + 1);
    let copy = copy_fn_for_width(elem_bytes);

    let mut z = inter.min.z;
    while z <= inter.max.z {
        let mut y = inter.min.y;
        while y <= inter.max.y {
            let mut x = inter.min.x;
            while x <= inter.max.x {
                let p = Vector3::new(x, y, z);
                let bi = linear_index(p, block.from, block.stride, block_dims) * elem_bytes;
                let gi = linear_index(p, grid.min, Vector3::splat(1), grid_dims) * elem_bytes;
                copy(&block_buf[bi..bi + elem_bytes], &mut grid_buf[gi..gi + elem_bytes]);
                x += block.stride.x;
            }
            y += block.stride.y;
        }
        z += block.stride.z;
    }
}

/// The inverse of [`scatter_block_to_grid`]: copies the overlap from the
/// grid's buffer into the block's buffer. Used by the write engine.
pub fn gather_grid_to_block(
    grid: &Bounds,
    grid_buf: &[u8],
    block: &Grid3,
    block_buf: &mut [u8],
    elem_bytes: ElemBytes,
) {
    let Some(inter) = intersect(block, grid) else {
        return;
    };
    let block_dims = block.dims();
    let grid_dims = Vector3::from_fn(|a| grid.max[a] - grid.min[a] + 1);
    let copy = copy_fn_for_width(elem_bytes);

    let mut z = inter.min.z;
    while z <= inter.max.z {
        let mut y = inter.min.y;
        while y <= inter.max.y {
            let mut x = inter.min.x;
            while x <= inter.max.x {
                let p = Vector3::new(x, y, z);
                let gi = linear_index(p, grid.min, Vector3::splat(1), grid_dims) * elem_bytes;
                let bi = linear_index(p, block.from, block.stride, block_dims) * elem_bytes;
                copy(&grid_buf[gi..gi + elem_bytes], &mut block_buf[bi..bi + elem_bytes]);
                x += block.stride.x;
            }
            y += block.stride.y;
        }
        z += block.stride.z;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dims_and_count() {
        let g = Grid3 {
            from: Vector3::new(0, 0, 0),
            to: Vector3::new(3, 1, 0),
            stride: Vector3::new(1, 1, 1),
        };
        assert_eq!(g.dims(), Vector3::new(4, 2, 1));
        assert_eq!(g.sample_count(), 8);
    }

    #[test]
    fn scatter_full_overlap_row_major() {
        // a 4x4x1 block at stride 1, matching the grid exactly
        let block = Grid3 {
            from: Vector3::new(0, 0, 0),
            to: Vector3::new(3, 3, 0),
            stride: Vector3::new(1, 1, 1),
        };
        let block_buf: Vec<u8> = (0u8..16).collect();
        let grid_extent = block.bounds();
        let mut grid_buf = vec![0u8; 16];
        scatter_block_to_grid(&block, &block_buf, &grid_extent, &mut grid_buf, 1);
        assert_eq!(grid_buf, block_buf);
    }

    #[test]
    fn scatter_partial_overlap() {
        let block = Grid3 {
            from: Vector3::new(0, 0, 0),
            to: Vector3::new(3, 3, 0),
            stride: Vector3::new(1, 1, 1),
        };
        let block_buf: Vec<u8> = (0u8..16).collect();
        // grid is the single x=1 plane (column), 1x4x1
        let grid_extent = Bounds {
            min: Vector3::new(1, 0, 0),
            max: Vector3::new(1, 3, 0),
        };
        let mut grid_buf = vec![0xffu8; 4];
        scatter_block_to_grid(&block, &block_buf, &grid_extent, &mut grid_buf, 1);
        // row-major x fastest: row y has values [4y, 4y+1, 4y+2, 4y+3]; x=1 picks 4y+1
        assert_eq!(grid_buf, vec![1, 5, 9, 13]);
    }

    #[test]
    fn gather_is_scatter_inverse() {
        let block = Grid3 {
            from: Vector3::new(0, 0, 0),
            to: Vector3::new(3, 3, 0),
            stride: Vector3::new(1, 1, 1),
        };
        let grid_extent = block.bounds();
        let grid_buf: Vec<u8> = (0u8..16).collect();
        let mut block_buf = vec![0u8; 16];
        gather_grid_to_block(&grid_extent, &grid_buf, &block, &mut block_buf, 1);
        assert_eq!(block_buf, grid_buf);
    }

    #[test]
    fn disjoint_is_noop() {
        let block = Grid3 {
            from: Vector3::new(0, 0, 0),
            to: Vector3::new(3, 3, 0),
            stride: Vector3::new(1, 1, 1),
        };
        let block_buf: Vec<u8> = (0u8..16).collect();
        let grid_extent = Bounds {
            min: Vector3::new(10, 10, 10),
            max: Vector3::new(12, 12, 12),
        };
        let mut grid_buf = vec![0xaau8; 27];
        scatter_block_to_grid(&block, &block_buf, &grid_extent, &mut grid_buf, 1);
        assert!(grid_buf.iter().all(|&b| b == 0xaa));
    }
}
