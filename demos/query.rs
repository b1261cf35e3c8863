//! Reads one field of a dataset at a given HZ level, inclusively, and
//! prints the resulting grid's dimensions and byte size.

use idx::{reader, text, EngineContext};

fn main() {
    let mut args = std::env::args().skip(1);
    let path = args.next().expect("Must provide a .idx path");
    let field_name = args.next().expect("Must provide a field name");
    let level: u32 = args.next().expect("Must provide a level").parse().expect("level must be an integer");

    let idx = text::read_idx_file(&path).expect("Unable to read descriptor");
    let field_index = idx.get_field_index(&field_name).expect("Unknown field");

    let query = *idx.get_logical_extent();
    let grid = idx.get_grid_inclusive(level, Some(&query)).expect("Invalid level or query");
    println!("grid dims: {:?} sample_count: {}", grid.dims(), grid.sample_count());

    let ctx = EngineContext::default();
    let mut buf = vec![0u8; idx.get_size_inclusive(field_index, Some(level), Some(&query)).expect("Unable to size buffer") as usize];
    reader::read_idx_grid_inclusive(&idx, field_index, idx.time_begin, level, &query, &mut buf, &ctx).expect("Unable to read grid");
    println!("read {} bytes", buf.len());
}
