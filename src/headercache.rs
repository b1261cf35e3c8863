//! Per-file header tables (component C/H): the in-memory image of a file's
//! `IdxBlockHeader` records, and a cache that lets the read path share one
//! loaded table across every worker touching the same file.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::layout;
use crate::raw::IdxBlockHeader;

/// The full header table of one file: `num_fields * blocks_per_file`
/// records, indexed `[field_index * blocks_per_file + block_in_file]`.
#[derive(Clone, Debug)]
pub struct HeaderTable {
    headers: Vec<IdxBlockHeader>,
    blocks_per_file: u64,
}

impl HeaderTable {
    /// A fresh, all-absent table, as written for a newly created file.
    pub fn zeroed(num_fields: usize, blocks_per_file: u64) -> HeaderTable {
        HeaderTable {
            headers: vec![IdxBlockHeader::default(); num_fields * blocks_per_file as usize],
            blocks_per_file,
        }
    }

    /// Reads a complete table of `num_fields * blocks_per_file` records from
    /// `reader`, which must already be positioned at
    /// [`layout::header_table_offset`].
    pub fn read_from<R: std::io::Read>(
        reader: &mut R,
        num_fields: usize,
        blocks_per_file: u64,
    ) -> Result<HeaderTable> {
        let count = num_fields * blocks_per_file as usize;
        let mut headers = Vec::with_capacity(count);
        for _ in 0..count {
            headers.push(IdxBlockHeader::read_from(reader)?);
        }
        Ok(HeaderTable {
            headers,
            blocks_per_file,
        })
    }

    /// Writes every record for `field_index` back to its fixed position in
    /// `writer`.
    pub fn write_field<W: std::io::Write + Seek>(&self, writer: &mut W, field_index: usize) -> Result<()> {
        for block_in_file in 0..self.blocks_per_file {
            let header = self.get(field_index, block_in_file);
            writer.seek(SeekFrom::Start(layout::header_entry_offset(
                field_index,
                block_in_file,
                self.blocks_per_file,
            )))?;
            header.write_to(writer)?;
        }
        Ok(())
    }

    /// The header for `(field_index, block_in_file)`.
    pub fn get(&self, field_index: usize, block_in_file: u64) -> &IdxBlockHeader {
        &self.headers[field_index * self.blocks_per_file as usize + block_in_file as usize]
    }

    /// Mutable access to the header for `(field_index, block_in_file)`.
    pub fn get_mut(&mut self, field_index: usize, block_in_file: u64) -> &mut IdxBlockHeader {
        &mut self.headers[field_index * self.blocks_per_file as usize + block_in_file as usize]
    }
}

/// Caches one [`HeaderTable`] per physical file for the read path, where the
/// table is shared (read-only) across every worker that touches that file
/// within a single engine call.
///
/// The write path does not use this cache: per §5's recommended design,
/// each file is owned by exactly one worker from open to flush, so its
/// table never needs cross-worker sharing.
#[derive(Default)]
pub struct HeaderCache {
    tables: Mutex<HashMap<PathBuf, Arc<HeaderTable>>>,
}

impl HeaderCache {
    /// Creates an empty cache.
    pub fn new() -> HeaderCache {
        HeaderCache::default()
    }

    /// Returns the cached table for `path`, loading it on first access.
    ///
    /// A missing file is not an error here: it is logically equivalent to
    /// an all-absent header table, per §4.F's "file not found" rule.
    pub fn get_or_load(&self, path: &Path, num_fields: usize, blocks_per_file: u64) -> Result<Arc<HeaderTable>> {
        let mut tables = self.tables.lock().expect("header cache lock poisoned");
        if let Some(table) = tables.get(path) {
            return Ok(Arc::clone(table));
        }
        let table = match File::open(path) {
            Ok(file) => {
                let mut reader = BufReader::new(file);
                reader.seek(SeekFrom::Start(layout::header_table_offset()))?;
                HeaderTable::read_from(&mut reader, num_fields, blocks_per_file)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::trace!("header cache: {} absent, treating as all-absent", path.display());
                HeaderTable::zeroed(num_fields, blocks_per_file)
            }
            Err(e) => return Err(e.into()),
        };
        let table = Arc::new(table);
        tables.insert(path.to_path_buf(), Arc::clone(&table));
        Ok(table)
    }
}

/// Creates a new file on disk with a zeroed [`crate::raw::IdxFileHeader`]
/// followed by a zeroed header table, per §4.C's file creation rule.
pub fn create_file(path: &Path, num_fields: usize, blocks_per_file: u64) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    crate::raw::IdxFileHeader::default().write_to(&mut writer)?;
    let zero_record = IdxBlockHeader::default();
    for _ in 0..(num_fields as u64 * blocks_per_file) {
        zero_record.write_to(&mut writer)?;
    }
    Ok(())
}
