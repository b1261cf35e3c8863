//! Reads and writes volumetric scientific datasets stored in the IDX
//! multi-resolution format: data sharded across binary files whose blocks
//! are addressed along a Hilbert-Z-order-like hierarchical curve, so that
//! any prefix of the curve is a valid, progressively refined sub-sample of
//! the whole volume.
//!
//! # Reading a grid
//!
//! ```
//! use idx::{writer, reader, Bounds, EngineContext, IdxFile, Vector3};
//!
//! # let dir = std::env::temp_dir().join(format!("idx-doctest-{}", std::process::id()));
//! let mut idx = IdxFile::create(Vector3::new(4, 4, 1), "int8", 1, 1).unwrap();
//! idx.filename_template.head = dir.clone();
//!
//! let ctx = EngineContext::default();
//! let query = Bounds { min: Vector3::new(0, 0, 0), max: Vector3::new(3, 3, 0) };
//! let data: Vec<u8> = (0u8..16).collect();
//! writer::write_idx_grid(&idx, 0, 0.0, writer::WriteLevel::All, &query, &data, &ctx).unwrap();
//!
//! let mut out = vec![0u8; 16];
//! reader::read_idx_grid_inclusive(&idx, 0, 0.0, idx.get_max_hz_level(), &query, &mut out, &ctx).unwrap();
//! assert_eq!(out, data);
//! # let _ = std::fs::remove_dir_all(&dir);
//! ```
//!
//! # Reading and writing descriptors
//!
//! ```
//! use idx::{text, IdxFile, Vector3};
//!
//! let idx = IdxFile::create(Vector3::new(4, 4, 1), "int8", 1, 1).unwrap();
//! # let path = std::env::temp_dir().join(format!("idx-doctest-descriptor-{}.idx", std::process::id()));
//! text::write_idx_file(&path, &idx).unwrap();
//! let read_back = text::read_idx_file(&path).unwrap();
//! assert_eq!(read_back.get_max_hz_level(), idx.get_max_hz_level());
//! # let _ = std::fs::remove_file(&path);
//! ```

#![forbid(unsafe_code)]

pub mod alloc;
pub mod bitstring;
pub mod block;
pub mod bounds;
pub mod codec;
pub mod context;
mod descriptor;
pub mod error;
pub mod field;
pub mod grid;
pub mod headercache;
pub mod layout;
pub mod raw;
pub mod reader;
pub mod text;
pub mod vector;
pub mod writer;

pub use bitstring::BitString;
pub use bounds::Bounds;
pub use context::{EngineContext, EngineOptions};
pub use descriptor::IdxFile;
pub use error::{Error, Result};
pub use field::{Compression, Field, FieldType, Layout, ScalarType};
pub use vector::{Axis, Vector3};
