//! The read engine (component F, §4.F): fills a caller's grid at one HZ
//! level, or inclusively over `0..=level`.
//!
//! Block reads and decompression fan out across [`EngineContext::workers`]
//! worker threads; scattering the decoded bytes into the caller's buffer
//! happens back on the calling thread. That split keeps the output buffer
//! under a single `&mut` borrow instead of reaching for unsafe aliasing to
//! let workers write disjoint strided regions directly.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

use crate::bitstring::BitString;
use crate::block;
use crate::bounds::Bounds;
use crate::codec;
use crate::context::EngineContext;
use crate::descriptor::IdxFile;
use crate::error::{Error, Result};
use crate::field::Layout;
use crate::grid::{self, Grid3};

/// Fills `buf` with the samples of `query` at `level`, non-inclusively:
/// only the sample set specific to that one level.
pub fn read_idx_grid(
    idx: &IdxFile,
    field_index: usize,
    time: f64,
    level: u32,
    query: &Bounds,
    buf: &mut [u8],
    ctx: &EngineContext,
) -> Result<()> {
    read_level(idx, field_index, time, level, query, buf, ctx)
}

/// As [`read_idx_grid`], but the union of every level `0..=level`: each
/// level is read in turn into the same buffer, matching the teacher's
/// windowed-wave-per-call shape repeated once per level.
pub fn read_idx_grid_inclusive(
    idx: &IdxFile,
    field_index: usize,
    time: f64,
    level: u32,
    query: &Bounds,
    buf: &mut [u8],
    ctx: &EngineContext,
) -> Result<()> {
    if level > idx.get_max_hz_level() {
        return Err(Error::InvalidHzLevel(level));
    }
    for l in 0..=level {
        read_level(idx, field_index, time, l, query, buf, ctx)?;
    }
    Ok(())
}

fn read_level(
    idx: &IdxFile,
    field_index: usize,
    time: f64,
    level: u32,
    query: &Bounds,
    buf: &mut [u8],
    ctx: &EngineContext,
) -> Result<()> {
    idx.validate_time(time)?;
    idx.validate_query(query)?;
    let elem_bytes = idx.field(field_index)?.ty.bytes();

    let addresses = block::block_addresses(&idx.bits, query, level, idx.bits_per_block, false)?;
    if addresses.is_empty() {
        return Ok(());
    }

    let workers = ctx.workers.min(addresses.len()).max(1);
    let chunk_size = addresses.len().div_ceil(workers).max(1);

    let results: Vec<Result<Vec<Option<(u64, Vec<u8>)>>>> = std::thread::scope(|scope| {
        let handles: Vec<_> = addresses
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    let mut open_files: HashMap<PathBuf, File> = HashMap::new();
                    let mut out = Vec::with_capacity(chunk.len());
                    for &address in chunk {
                        out.push(read_block(idx, field_index, elem_bytes, address, &mut open_files, ctx)?);
                    }
                    Ok(out)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("reader worker panicked")).collect()
    });

    for chunk_result in results {
        for (address, bytes) in chunk_result?.into_iter().flatten() {
            let block_grid = idx.bits.block_grid(address, idx.bits_per_block);
            grid::scatter_block_to_grid(&block_grid, &bytes, query, buf, elem_bytes);
        }
    }
    Ok(())
}

fn read_block(
    idx: &IdxFile,
    field_index: usize,
    elem_bytes: usize,
    address: u64,
    open_files: &mut HashMap<PathBuf, File>,
    ctx: &EngineContext,
) -> Result<Option<(u64, Vec<u8>)>> {
    let (block_in_file, file_index) = idx.locate_block(address);
    let path = idx.filename_template.file_path(file_index);

    // a missing file is logically equivalent to every block in it being
    // absent, not an error
    let table = ctx.header_cache.get_or_load(&path, idx.fields.len(), idx.blocks_per_file)?;
    let header = *table.get(field_index, block_in_file);
    if !header.is_present() {
        return Ok(None);
    }

    let file = match open_files.get_mut(&path) {
        Some(file) => file,
        None => {
            let file = File::open(&path)?;
            open_files.entry(path).or_insert(file)
        }
    };
    file.seek(SeekFrom::Start(header.offset))?;
    let mut raw = vec![0u8; header.bytes as usize];
    file.read_exact(&mut raw)
        .map_err(|e| Error::BlockReadFailed(format!("block at hz {address}: {e}")))?;

    let sample_count = 1u64 << idx.bits_per_block;
    let decoded = codec::decode(header.compression, &raw, sample_count as usize * elem_bytes)?;

    let block_grid = idx.bits.block_grid(address, idx.bits_per_block);
    let ordered = match header.format {
        Layout::RowMajor => decoded,
        Layout::Hz => reorder_hz_to_row_major(&idx.bits, address, &block_grid, &decoded, elem_bytes),
    };
    Ok(Some((address, ordered)))
}

/// Reorders a block payload stored in HZ-curve sample order into the
/// block's own row-major sub-grid order, so the scatter path can treat it
/// the same as a `RowMajor` block. Only reached for files this crate did
/// not itself write (see DESIGN.md open question 3).
fn reorder_hz_to_row_major(bits: &BitString, block_address: u64, block_grid: &Grid3, hz_buf: &[u8], elem_bytes: usize) -> Vec<u8> {
    let dims = block_grid.dims();
    let mut out = vec![0u8; hz_buf.len()];
    let samples = hz_buf.len() / elem_bytes;
    for offset in 0..samples {
        let coord = bits.hz_to_coord(block_address + offset as u64);
        let dst = grid::linear_index(coord, block_grid.from, block_grid.stride, dims) * elem_bytes;
        out[dst..dst + elem_bytes].copy_from_slice(&hz_buf[offset * elem_bytes..offset * elem_bytes + elem_bytes]);
    }
    out
}
