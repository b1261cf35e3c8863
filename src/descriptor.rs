//! The dataset descriptor (§3): everything the engines need to know about
//! one IDX dataset, independent of any particular field or query.

use std::path::PathBuf;

use crate::bitstring::BitString;
use crate::bounds::Bounds;
use crate::error::{Error, Result};
use crate::field::{Field, FieldType};
use crate::grid::Grid3;
use crate::layout::FileNameTemplate;
use crate::vector::Vector3;
use crate::{block, grid};

/// A fully parsed or programmatically built IDX descriptor.
///
/// Read-only from the engines' point of view: `read_idx_grid`/
/// `write_idx_grid` never mutate an `IdxFile`, so one descriptor is safe to
/// share across a call's worker fan-out.
#[derive(Clone, Debug)]
pub struct IdxFile {
    /// Where this descriptor was read from, if it came from disk.
    pub path: Option<PathBuf>,
    /// Format version. Always `6`; this crate targets no other version.
    pub version: u32,
    /// The 4x4 logic-to-physic transform. Informational only — round-tripped
    /// through the text format but never consumed by any engine.
    pub logic_to_physic: [f64; 16],
    /// The inclusive logical bounding box of the full-resolution dataset.
    pub logical_box: Bounds,
    /// The dataset's fields, in descriptor order.
    pub fields: Vec<Field>,
    /// The HZ-curve bit string.
    pub bits: BitString,
    /// `B`, the block size exponent.
    pub bits_per_block: u32,
    /// `F`, the number of blocks packed into one physical file.
    pub blocks_per_file: u64,
    /// Opaque, undocumented upstream; preserved verbatim and never consumed
    /// (see DESIGN.md).
    pub interleave_block: u32,
    /// First timestep value.
    pub time_begin: f64,
    /// Last timestep value.
    pub time_end: f64,
    /// The `%f`-style template used to name a timestep's subdirectory.
    pub time_template: String,
    /// The per-file-index path template.
    pub filename_template: FileNameTemplate,
}

impl IdxFile {
    /// `max_hz`, the finest HZ level: the stripped bit string's length.
    pub fn get_max_hz_level(&self) -> u32 {
        self.bits.max_hz()
    }

    /// `min_hz`: levels at or below this all live in block 0.
    pub fn get_min_hz_level(&self) -> u32 {
        self.bits.min_hz(self.bits_per_block)
    }

    /// Looks up a field's index by name.
    pub fn get_field_index(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| Error::FieldNotFound(name.to_string()))
    }

    /// The full-resolution logical bounding box.
    pub fn get_logical_extent(&self) -> &Bounds {
        &self.logical_box
    }

    /// The `(from, to, stride)` grid for `level`, optionally intersected
    /// with `query`. Non-inclusive: the sample set specific to this one
    /// level.
    pub fn get_grid(&self, level: u32, query: Option<&Bounds>) -> Result<Grid3> {
        self.resolve_grid(self.bits.grid_for_level(level)?, query)
    }

    /// As [`IdxFile::get_grid`], but the union of every level `0..=level`.
    pub fn get_grid_inclusive(&self, level: u32, query: Option<&Bounds>) -> Result<Grid3> {
        self.resolve_grid(self.bits.grid_for_level_inclusive(level)?, query)
    }

    fn resolve_grid(&self, level_grid: Grid3, query: Option<&Bounds>) -> Result<Grid3> {
        let Some(query) = query else {
            return Ok(level_grid);
        };
        self.validate_query(query)?;
        match grid::intersect(&level_grid, query) {
            Some(inter) => Ok(Grid3 {
                from: inter.min,
                to: inter.max,
                stride: level_grid.stride,
            }),
            None => {
                // genuinely empty: `to` one stride below `from` on every
                // axis so `dims()`/`sample_count()` report zero, not a
                // phantom single point at `query.min`
                let stride = level_grid.stride;
                Ok(Grid3 {
                    from: query.min,
                    to: Vector3::from_fn(|a| query.min[a] - stride[a]),
                    stride,
                })
            }
        }
    }

    /// Byte size of the output buffer `get_grid`/`get_grid_inclusive` would
    /// require for `field_index` at `level` (default: `max_hz`).
    pub fn get_size(&self, field_index: usize, level: Option<u32>, query: Option<&Bounds>) -> Result<u64> {
        let level = level.unwrap_or_else(|| self.get_max_hz_level());
        let grid = self.get_grid(level, query)?;
        let bytes = self.field(field_index)?.ty.bytes() as u64;
        Ok(grid.sample_count() * bytes)
    }

    /// As [`IdxFile::get_size`], using the inclusive grid.
    pub fn get_size_inclusive(&self, field_index: usize, level: Option<u32>, query: Option<&Bounds>) -> Result<u64> {
        let level = level.unwrap_or_else(|| self.get_max_hz_level());
        let grid = self.get_grid_inclusive(level, query)?;
        let bytes = self.field(field_index)?.ty.bytes() as u64;
        Ok(grid.sample_count() * bytes)
    }

    pub(crate) fn field(&self, field_index: usize) -> Result<&Field> {
        self.fields
            .get(field_index)
            .ok_or_else(|| Error::FieldNotFound(field_index.to_string()))
    }

    /// Validates that `query` is a well-formed box contained in the logical
    /// extent, per §4.F step 1.
    pub fn validate_query(&self, query: &Bounds) -> Result<()> {
        if !query.is_valid() {
            return Err(Error::InvalidVolume);
        }
        if !self.logical_box.contains(query) {
            return Err(Error::VolumeTooBig);
        }
        Ok(())
    }

    /// Validates `time` against `[time_begin, time_end]`.
    pub fn validate_time(&self, time: f64) -> Result<()> {
        if time < self.time_begin || time > self.time_end {
            Err(Error::TimeStepNotFound(time))
        } else {
            Ok(())
        }
    }

    /// The block-in-file and file-index pair for `block_address`.
    pub fn locate_block(&self, block_address: u64) -> (u64, u64) {
        (
            block::block_in_file(block_address, self.bits_per_block, self.blocks_per_file),
            block::file_index(block_address, self.bits_per_block, self.blocks_per_file),
        )
    }

    /// Structural validation of the descriptor itself, independent of any
    /// query: non-empty field list, a `bits_per_block` no larger than
    /// `max_hz`, and a power-of-two `blocks_per_file`.
    pub fn verify_idx_file(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(Error::InvalidIdxFile("no fields".to_string()));
        }
        if !self.logical_box.is_valid() {
            return Err(Error::InvalidIdxFile("logical box is invalid".to_string()));
        }
        if self.bits_per_block > self.bits.max_hz() {
            return Err(Error::InvalidIdxFile(format!(
                "bits_per_block {} exceeds max_hz {}",
                self.bits_per_block,
                self.bits.max_hz()
            )));
        }
        if self.blocks_per_file == 0 || !self.blocks_per_file.is_power_of_two() {
            return Err(Error::InvalidIdxFile(format!(
                "blocks_per_file {} is not a power of two",
                self.blocks_per_file
            )));
        }
        let extent = self.bits.extent();
        let expect_max = Vector3::new(extent.x - 1, extent.y - 1, extent.z - 1);
        if self.logical_box.max != expect_max || self.logical_box.min != Vector3::splat(0) {
            return Err(Error::InvalidIdxFile(
                "logical box does not match the bit string's implied resolution".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds a fresh descriptor for a new dataset: derives a balanced bit
    /// string from `dims`, one field of `(type_name, components)` per
    /// requested field, and default block/time parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use idx::{IdxFile, Vector3};
    /// let idx = IdxFile::create(Vector3::new(4, 4, 1), "int8", 1, 1).unwrap();
    /// assert_eq!(idx.get_max_hz_level(), 4);
    /// ```
    pub fn create(dims: Vector3<i64>, type_name: &str, num_fields: usize, num_time_steps: u32) -> Result<IdxFile> {
        let scalar = crate::field::ScalarType::parse(type_name)?;
        let bits = BitString::parse(&derive_bit_string(dims))?;
        let logical_box = Bounds {
            min: Vector3::splat(0),
            max: Vector3::new(dims.x - 1, dims.y - 1, dims.z - 1),
        };
        let fields = (0..num_fields.max(1))
            .map(|i| Field::new(format!("field{i}"), FieldType::scalar(scalar)))
            .collect();
        Ok(IdxFile {
            path: None,
            version: 6,
            logic_to_physic: identity_transform(),
            logical_box,
            fields,
            bits,
            bits_per_block: default_bits_per_block(&bits_field_string(dims)),
            blocks_per_file: 256,
            interleave_block: 0,
            time_begin: 0.0,
            time_end: if num_time_steps > 0 { (num_time_steps - 1) as f64 } else { 0.0 },
            time_template: "./%04d/".to_string(),
            filename_template: FileNameTemplate {
                head: PathBuf::from("."),
                groups: vec![2, 4],
                ext: "bin".to_string(),
            },
        })
    }
}

fn identity_transform() -> [f64; 16] {
    let mut m = [0.0; 16];
    for i in 0..4 {
        m[i * 4 + i] = 1.0;
    }
    m
}

/// Interleaves a bit string round-robin across axes so each axis gets
/// `ceil(log2(dim))` characters, matching the "balanced split" the original
/// `create_idx_file` produces.
fn derive_bit_string(dims: Vector3<i64>) -> String {
    bits_field_string(dims)
}

fn bits_field_string(dims: Vector3<i64>) -> String {
    let bits_needed = |d: i64| -> u32 {
        if d <= 1 {
            0
        } else {
            (64 - (d - 1).leading_zeros()).max(1)
        }
    };
    let mut remaining = [bits_needed(dims.x), bits_needed(dims.y), bits_needed(dims.z)];
    let mut s = String::new();
    loop {
        let mut progressed = false;
        for (axis_char, count) in [('0', &mut remaining[0]), ('1', &mut remaining[1]), ('2', &mut remaining[2])] {
            if *count > 0 {
                s.push(axis_char);
                *count -= 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
    if s.is_empty() {
        s.push('0');
    }
    s
}

fn default_bits_per_block(bit_string: &str) -> u32 {
    (bit_string.len() as u32 / 2).clamp(1, bit_string.len() as u32)
}
