//! Bit-string parsing and the HZ-curve mapping (component A): the bijection
//! between HZ addresses and 3D coordinates, and the per-level grid geometry
//! derived from it.
//!
//! The bit string's *stripped* form (its `'V'` terminator removed) is a
//! sequence of axis-split characters read right to left: the rightmost
//! character is the least significant decision in the HZ address. Each
//! character's bit, within its own axis, is assigned most-significant-first
//! — the earliest (rightmost) occurrence of an axis sets that axis's
//! coarsest bit, the latest (leftmost) occurrence sets its finest bit. This
//! is what makes a low HZ address a coarse, evenly spread sample of the
//! whole volume rather than a dense cluster near the origin, and it is the
//! reading that makes the per-level grids in this module disjoint across
//! levels and union to the full-resolution grid at `max_hz` — both
//! properties this module's invariants rely on.

use crate::error::{Error, Result};
use crate::grid::Grid3;
use crate::vector::{Axis, Vector3};

/// A parsed, stripped bit string: the axis-split sequence driving the HZ
/// curve for one descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitString {
    chars: Vec<Axis>,
    /// `suffix_count[j][axis]` = occurrences of `axis` in `chars[j..]`.
    suffix_count: Vec<[u32; 3]>,
}

impl BitString {
    /// Parses a raw bit string, stripping its trailing `'V'` terminator (if
    /// any) and validating that every remaining character is `'0'`, `'1'`
    /// or `'2'` and that the stripped length is in `[1, 64]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use idx::BitString;
    /// let bits = BitString::parse("0101V").unwrap();
    /// assert_eq!(bits.max_hz(), 4);
    /// ```
    pub fn parse(raw: &str) -> Result<BitString> {
        let stripped = raw.strip_suffix('V').unwrap_or(raw);
        if stripped.is_empty() {
            return Err(Error::InvalidIdxFile("empty bit string".to_string()));
        }
        if stripped.len() > 64 {
            return Err(Error::InvalidIdxFile(format!(
                "bit string too long: {} characters (max 64)",
                stripped.len()
            )));
        }
        let chars = stripped
            .bytes()
            .map(|b| {
                Axis::from_char(b)
                    .ok_or_else(|| Error::InvalidIdxFile(format!("invalid bit string character: {}", b as char)))
            })
            .collect::<Result<Vec<Axis>>>()?;
        let l = chars.len();
        let mut suffix_count = vec![[0u32; 3]; l + 1];
        for j in (0..l).rev() {
            suffix_count[j] = suffix_count[j + 1];
            suffix_count[j][chars[j].index()] += 1;
        }
        Ok(BitString { chars, suffix_count })
    }

    /// `L`, the stripped length; equal to `max_hz`.
    pub fn max_hz(&self) -> u32 {
        self.chars.len() as u32
    }

    /// `min_hz`, the lowest level at which blocks other than block 0 can
    /// appear, given `bits_per_block`.
    pub fn min_hz(&self, bits_per_block: u32) -> u32 {
        bits_per_block + 1
    }

    /// Total occurrences of `axis` across the whole bit string.
    pub fn axis_count(&self, axis: Axis) -> u32 {
        self.suffix_count[0][axis.index()]
    }

    /// `2^(axis_count(axis))`, the axis's full-resolution sample count.
    pub fn axis_extent(&self, axis: Axis) -> i64 {
        1i64 << self.axis_count(axis)
    }

    /// The full-resolution extent of the dataset, one value per axis.
    pub fn extent(&self) -> Vector3<i64> {
        Vector3::from_fn(|a| self.axis_extent(a))
    }

    fn window_count(&self, window_start: usize, axis: Axis) -> u32 {
        self.suffix_count[window_start][axis.index()]
    }

    /// Reconstructs the stripped bit string's character form, for
    /// re-serialization by the text descriptor writer.
    pub(crate) fn chars_as_string(&self) -> String {
        self.chars
            .iter()
            .map(|a| match a {
                Axis::X => '0',
                Axis::Y => '1',
                Axis::Z => '2',
            })
            .collect()
    }

    /// Maps an HZ address in `[0, 2^max_hz)` to its full-resolution 3D
    /// coordinate. A bijection over that range.
    pub fn hz_to_coord(&self, hz: u64) -> Vector3<i64> {
        let l = self.chars.len();
        let mut coord = [0i64; 3];
        let mut consumed = [0u32; 3];
        for p in 0..l {
            let axis = self.chars[l - 1 - p];
            let ai = axis.index();
            let bit = (hz >> p) & 1;
            let bitpos = self.axis_count(axis) - 1 - consumed[ai];
            if bit == 1 {
                coord[ai] |= 1i64 << bitpos;
            }
            consumed[ai] += 1;
        }
        Vector3::new(coord[0], coord[1], coord[2])
    }

    /// The inverse of [`BitString::hz_to_coord`].
    pub fn coord_to_hz(&self, coord: Vector3<i64>) -> u64 {
        let l = self.chars.len();
        let mut hz = 0u64;
        let mut consumed = [0u32; 3];
        for p in 0..l {
            let axis = self.chars[l - 1 - p];
            let ai = axis.index();
            let bitpos = self.axis_count(axis) - 1 - consumed[ai];
            let bit = (coord[ai] >> bitpos) & 1;
            hz |= (bit as u64) << p;
            consumed[ai] += 1;
        }
        hz
    }

    /// `block_address(hz) = hz & ~((1 << bits_per_block) - 1)`.
    pub fn block_address(&self, hz: u64, bits_per_block: u32) -> u64 {
        hz & !((1u64 << bits_per_block) - 1)
    }

    /// The non-inclusive per-level grid: the sample set whose HZ index lies
    /// in `[2^(l-1), 2^l)` for `l >= 1`, or the single point `(0,0,0)` for
    /// `l == 0`.
    ///
    /// Disjoint across levels; their union over `0..=max_hz` is the full
    /// resolution grid.
    pub fn grid_for_level(&self, level: u32) -> Result<Grid3> {
        self.check_level(level)?;
        Ok(self.grid_for_level_raw(level))
    }

    fn grid_for_level_raw(&self, level: u32) -> Grid3 {
        if level == 0 {
            return Grid3::origin();
        }
        let l = level as usize;
        let big_l = self.chars.len();
        let window_start = big_l - l;
        let fixed_axis = self.chars[window_start];

        let mut from = [0i64; 3];
        let mut to = [0i64; 3];
        let mut stride = [1i64; 3];
        for axis in Axis::ALL {
            let ai = axis.index();
            let c = self.window_count(window_start, axis);
            if c == 0 {
                continue;
            }
            let extent = self.axis_extent(axis);
            let stride_base = 1i64 << (self.axis_count(axis) - c);
            if axis == fixed_axis {
                stride[ai] = 2 * stride_base;
                from[ai] = stride_base;
                to[ai] = extent - stride_base;
            } else {
                stride[ai] = stride_base;
                from[ai] = 0;
                to[ai] = extent - stride_base;
            }
        }
        Grid3 {
            from: Vector3::new(from[0], from[1], from[2]),
            to: Vector3::new(to[0], to[1], to[2]),
            stride: Vector3::new(stride[0], stride[1], stride[2]),
        }
    }

    /// The inclusive per-level grid: the union of [`BitString::grid_for_level`]
    /// for every level `0..=level`.
    pub fn grid_for_level_inclusive(&self, level: u32) -> Result<Grid3> {
        self.check_level(level)?;
        Ok(self.grid_for_level_inclusive_raw(level))
    }

    fn grid_for_level_inclusive_raw(&self, level: u32) -> Grid3 {
        if level == 0 {
            return Grid3::origin();
        }
        let l = level as usize;
        let big_l = self.chars.len();
        let window_start = big_l - l;

        let mut to = [0i64; 3];
        let mut stride = [1i64; 3];
        for axis in Axis::ALL {
            let ai = axis.index();
            let c = self.window_count(window_start, axis);
            if c == 0 {
                continue;
            }
            let extent = self.axis_extent(axis);
            let s = 1i64 << (self.axis_count(axis) - c);
            stride[ai] = s;
            to[ai] = extent - s;
        }
        Grid3 {
            from: Vector3::splat(0),
            to: Vector3::new(to[0], to[1], to[2]),
            stride: Vector3::new(stride[0], stride[1], stride[2]),
        }
    }

    /// The block bounding grid: the `(from, to, stride)` sub-grid occupied
    /// by the `2^bits_per_block` samples of the block starting at
    /// `block_address`.
    ///
    /// The block's samples are exactly the HZ range
    /// `[block_address, block_address + 2^B)`: the low `B` characters free,
    /// everything above fixed to `block_address`'s own bits. That's the
    /// inclusive grid at level `B` (which always has `from = (0,0,0)`),
    /// translated by `block_address`'s coordinate.
    pub fn block_grid(&self, block_address: u64, bits_per_block: u32) -> Grid3 {
        let base = self.hz_to_coord(block_address);
        let inner = self.grid_for_level_inclusive_raw(bits_per_block);
        Grid3 {
            from: base,
            to: Vector3::from_fn(|a| base[a] + inner.to[a]),
            stride: inner.stride,
        }
    }

    fn check_level(&self, level: u32) -> Result<()> {
        if level > self.max_hz() {
            Err(Error::InvalidHzLevel(level))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty() {
        assert!(BitString::parse("V").is_err());
        assert!(BitString::parse("").is_err());
    }

    #[test]
    fn rejects_bad_character() {
        assert!(BitString::parse("013").is_err());
    }

    #[test]
    fn strips_terminator() {
        let bits = BitString::parse("0101V").unwrap();
        assert_eq!(bits.max_hz(), 4);
    }

    #[test]
    fn axis_counts() {
        let bits = BitString::parse("001122").unwrap();
        assert_eq!(bits.axis_count(Axis::X), 2);
        assert_eq!(bits.axis_count(Axis::Y), 2);
        assert_eq!(bits.axis_count(Axis::Z), 2);
        assert_eq!(bits.extent(), Vector3::new(4, 4, 4));
    }

    #[test]
    fn bijection_roundtrip() {
        let bits = BitString::parse("0101").unwrap();
        for hz in 0u64..16 {
            let coord = bits.hz_to_coord(hz);
            assert_eq!(bits.coord_to_hz(coord), hz);
        }
    }

    #[test]
    fn bijection_covers_every_coordinate_once() {
        let bits = BitString::parse("0101").unwrap();
        let mut seen = std::collections::HashSet::new();
        for hz in 0u64..16 {
            let c = bits.hz_to_coord(hz);
            assert!(seen.insert((c.x, c.y, c.z)), "duplicate coordinate {c:?}");
        }
        assert_eq!(seen.len(), 16);
    }

    #[test]
    fn level_zero_is_origin() {
        let bits = BitString::parse("0101").unwrap();
        let g = bits.grid_for_level(0).unwrap();
        assert_eq!(g.sample_count(), 1);
        assert_eq!(g.from, Vector3::splat(0));
    }

    #[test]
    fn non_inclusive_levels_have_power_of_two_minus_one_counts() {
        let bits = BitString::parse("0101").unwrap();
        for level in 1..=bits.max_hz() {
            let g = bits.grid_for_level(level).unwrap();
            assert_eq!(g.sample_count(), 1u64 << (level - 1));
        }
    }

    #[test]
    fn inclusive_levels_have_power_of_two_counts() {
        let bits = BitString::parse("0101").unwrap();
        for level in 0..=bits.max_hz() {
            let g = bits.grid_for_level_inclusive(level).unwrap();
            assert_eq!(g.sample_count(), 1u64 << level);
        }
    }

    #[test]
    fn inclusive_at_max_hz_is_full_resolution_stride_one() {
        let bits = BitString::parse("0101").unwrap();
        let g = bits.grid_for_level_inclusive(bits.max_hz()).unwrap();
        assert_eq!(g.stride, Vector3::splat(1));
        assert_eq!(g.from, Vector3::splat(0));
        assert_eq!(g.to, Vector3::new(3, 3, 0));
    }

    #[test]
    fn non_inclusive_levels_partition_full_resolution() {
        let bits = BitString::parse("0101").unwrap();
        let mut seen = std::collections::HashSet::new();
        for level in 0..=bits.max_hz() {
            let g = bits.grid_for_level(level).unwrap();
            let d = g.dims();
            for z in 0..d.z {
                for y in 0..d.y {
                    for x in 0..d.x {
                        let p = Vector3::new(
                            g.from.x + x * g.stride.x,
                            g.from.y + y * g.stride.y,
                            g.from.z + z * g.stride.z,
                        );
                        assert!(seen.insert((p.x, p.y, p.z)), "level {level} re-visited {p:?}");
                    }
                }
            }
        }
        assert_eq!(seen.len(), 16);
    }

    #[test]
    fn invalid_level_is_an_error() {
        let bits = BitString::parse("0101").unwrap();
        assert!(bits.grid_for_level(bits.max_hz() + 1).is_err());
    }

    #[test]
    fn block_address_masks_low_bits() {
        let bits = BitString::parse("0101010101").unwrap();
        assert_eq!(bits.block_address(0b1011, 2), 0b1000);
    }

    #[test]
    fn block_grid_matches_inclusive_level_b_at_origin() {
        let bits = BitString::parse("0101").unwrap();
        let block0 = bits.block_grid(0, 2);
        let inclusive_b = bits.grid_for_level_inclusive(2).unwrap();
        assert_eq!(block0.from, inclusive_b.from);
        assert_eq!(block0.to, inclusive_b.to);
        assert_eq!(block0.stride, inclusive_b.stride);
    }

    #[test]
    fn every_block_grid_sample_maps_back_into_the_block() {
        let bits = BitString::parse("0101").unwrap();
        let b = 2u32;
        for block_start in (0u64..16).step_by(1usize << b) {
            let g = bits.block_grid(block_start, b);
            let d = g.dims();
            let mut count = 0u64;
            for z in 0..d.z {
                for y in 0..d.y {
                    for x in 0..d.x {
                        let p = Vector3::new(
                            g.from.x + x * g.stride.x,
                            g.from.y + y * g.stride.y,
                            g.from.z + z * g.stride.z,
                        );
                        let hz = bits.coord_to_hz(p);
                        assert!(hz >= block_start && hz < block_start + (1 << b));
                        count += 1;
                    }
                }
            }
            assert_eq!(count, 1 << b);
        }
    }
}
