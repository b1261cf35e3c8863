//! The write engine (component G, §4.G): persists a caller's grid into
//! blocks, creating files and maintaining header tables as needed.
//!
//! Per §5's recommended design, the block list for one write call is
//! partitioned by destination file and each file is owned by exactly one
//! worker from open to header flush — no per-file lock is needed because
//! no two workers in a call ever touch the same file.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};

use crate::block;
use crate::bounds::Bounds;
use crate::context::EngineContext;
use crate::descriptor::IdxFile;
use crate::error::{Error, Result};
use crate::field::{Compression, Layout};
use crate::grid;
use crate::headercache::{self, HeaderTable};
use crate::layout;

/// Which levels a single [`write_idx_grid`] call targets.
#[derive(Clone, Copy, Debug)]
pub enum WriteLevel {
    /// One HZ level, non-inclusive.
    Level(u32),
    /// Every level: the coarsest block-0 content (levels `0..min_hz`) as
    /// one inclusive call, then each level `min_hz..=max_hz` individually —
    /// matching the read engine's own inclusive-mode level split.
    All,
}

/// Persists `buf`'s samples over `query` into `idx`'s on-disk blocks.
pub fn write_idx_grid(
    idx: &IdxFile,
    field_index: usize,
    time: f64,
    level: WriteLevel,
    query: &Bounds,
    buf: &[u8],
    ctx: &EngineContext,
) -> Result<()> {
    idx.validate_time(time)?;
    idx.validate_query(query)?;
    let elem_bytes = idx.field(field_index)?.ty.bytes();

    match level {
        WriteLevel::Level(l) => {
            let addresses = block::block_addresses(&idx.bits, query, l, idx.bits_per_block, false)?;
            write_blocks(idx, field_index, elem_bytes, &addresses, query, buf, ctx)
        }
        WriteLevel::All => {
            let min_hz = idx.get_min_hz_level();
            let max_hz = idx.get_max_hz_level();
            let block0_level = min_hz.saturating_sub(1);
            let addresses = block::block_addresses(&idx.bits, query, block0_level, idx.bits_per_block, true)?;
            write_blocks(idx, field_index, elem_bytes, &addresses, query, buf, ctx)?;
            for l in min_hz..=max_hz {
                let addresses = block::block_addresses(&idx.bits, query, l, idx.bits_per_block, false)?;
                write_blocks(idx, field_index, elem_bytes, &addresses, query, buf, ctx)?;
            }
            Ok(())
        }
    }
}

fn write_blocks(
    idx: &IdxFile,
    field_index: usize,
    elem_bytes: usize,
    addresses: &[u64],
    query: &Bounds,
    buf: &[u8],
    ctx: &EngineContext,
) -> Result<()> {
    if addresses.is_empty() {
        return Ok(());
    }

    let mut by_file: HashMap<u64, Vec<u64>> = HashMap::new();
    for &address in addresses {
        let (_, file_index) = idx.locate_block(address);
        by_file.entry(file_index).or_default().push(address);
    }
    let partitions: Vec<(u64, Vec<u64>)> = by_file.into_iter().collect();

    for window in partitions.chunks(ctx.workers.max(1)) {
        let results: Vec<Result<()>> = std::thread::scope(|scope| {
            let handles: Vec<_> = window
                .iter()
                .map(|(file_index, blocks)| {
                    scope.spawn(move || write_file_partition(idx, field_index, elem_bytes, *file_index, blocks, query, buf, ctx))
                })
                .collect();
            handles.into_iter().map(|h| h.join().expect("writer worker panicked")).collect()
        });
        for r in results {
            r?;
        }
    }
    Ok(())
}

fn write_file_partition(
    idx: &IdxFile,
    field_index: usize,
    elem_bytes: usize,
    file_index: u64,
    blocks: &[u64],
    query: &Bounds,
    buf: &[u8],
    ctx: &EngineContext,
) -> Result<()> {
    let path = idx.filename_template.file_path(file_index);
    let num_fields = idx.fields.len();
    let blocks_per_file = idx.blocks_per_file;

    if !path.exists() {
        headercache::create_file(&path, num_fields, blocks_per_file)?;
    }
    let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
    let mut table = {
        let mut reader = BufReader::new(&file);
        reader.seek(SeekFrom::Start(layout::header_table_offset()))?;
        HeaderTable::read_from(&mut reader, num_fields, blocks_per_file)?
    };

    let sample_count = 1u64 << idx.bits_per_block;
    let block_bytes = sample_count as usize * elem_bytes;

    for &address in blocks {
        let block_in_file = block::block_in_file(address, idx.bits_per_block, blocks_per_file);
        let block_grid = idx.bits.block_grid(address, idx.bits_per_block);
        let header = *table.get(field_index, block_in_file);

        let mut block_buf = ctx.allocator.acquire(block_bytes);
        if header.is_present() {
            file.seek(SeekFrom::Start(header.offset))?;
            file.read_exact(&mut block_buf)
                .map_err(|e| Error::BlockReadFailed(format!("block at hz {address}: {e}")))?;
        }
        grid::gather_grid_to_block(query, buf, &block_grid, &mut block_buf, elem_bytes);

        let offset = if header.is_present() {
            header.offset
        } else {
            let file_size = file.seek(SeekFrom::End(0))?;
            file_size.max(layout::header_region_end(num_fields, blocks_per_file))
        };
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&block_buf)
            .map_err(|e| Error::BlockWriteFailed(format!("block at hz {address}: {e}")))?;

        let record = table.get_mut(field_index, block_in_file);
        record.offset = offset;
        record.bytes = block_buf.len() as u32;
        record.compression = Compression::None;
        record.format = Layout::RowMajor;

        ctx.allocator.release(block_buf);
    }

    table
        .write_field(&mut file, field_index)
        .map_err(|_| Error::HeaderWriteFailed(path.display().to_string()))
}
