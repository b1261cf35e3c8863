//! Block addressing (component B): which blocks intersect a query, and
//! where a block lives physically.

use std::collections::BTreeSet;

use crate::bitstring::BitString;
use crate::bounds::Bounds;
use crate::error::Result;
use crate::grid;

/// `(block_address >> bits_per_block) mod blocks_per_file`.
pub fn block_in_file(block_address: u64, bits_per_block: u32, blocks_per_file: u64) -> u64 {
    (block_address >> bits_per_block) % blocks_per_file
}

/// `(block_address >> bits_per_block) / blocks_per_file`.
pub fn file_index(block_address: u64, bits_per_block: u32, blocks_per_file: u64) -> u64 {
    (block_address >> bits_per_block) / blocks_per_file
}

/// Enumerates the HZ addresses of every block whose per-level grid
/// intersects `query`, in ascending order with duplicates removed.
///
/// `inclusive` selects [`BitString::grid_for_level_inclusive`] over
/// [`BitString::grid_for_level`] for the level's own grid before
/// intersecting with `query`.
pub fn block_addresses(
    bits: &BitString,
    query: &Bounds,
    level: u32,
    bits_per_block: u32,
    inclusive: bool,
) -> Result<Vec<u64>> {
    let level_grid = if inclusive {
        bits.grid_for_level_inclusive(level)?
    } else {
        bits.grid_for_level(level)?
    };
    let Some(inter) = grid::intersect(&level_grid, query) else {
        return Ok(Vec::new());
    };

    let mut addresses = BTreeSet::new();
    let mut z = inter.min.z;
    while z <= inter.max.z {
        let mut y = inter.min.y;
        while y <= inter.max.y {
            let mut x = inter.min.x;
            while x <= inter.max.x {
                let hz = bits.coord_to_hz(crate::Vector3::new(x, y, z));
                addresses.insert(bits.block_address(hz, bits_per_block));
                x += level_grid.stride.x;
            }
            y += level_grid.stride.y;
        }
        z += level_grid.stride.z;
    }
    Ok(addresses.into_iter().collect())
}
