//! Creates a fresh dataset from scratch and writes a `.idx` descriptor for
//! it, without touching any block data.

use idx::{text, IdxFile, Vector3};

fn main() {
    let mut args = std::env::args().skip(1);
    let path = args.next().expect("Must provide an output .idx path");
    let nx = args.next().expect("Must provide nx").parse().expect("nx must be an integer");
    let ny = args.next().expect("Must provide ny").parse().expect("ny must be an integer");
    let nz = args.next().expect("Must provide nz").parse().expect("nz must be an integer");
    let type_name = args.next().unwrap_or_else(|| "float32".to_string());

    let idx = IdxFile::create(Vector3::new(nx, ny, nz), &type_name, 1, 1).expect("Unable to build descriptor");
    println!(
        "max_hz={} min_hz={} bits_per_block={}",
        idx.get_max_hz_level(),
        idx.get_min_hz_level(),
        idx.bits_per_block
    );
    text::write_idx_file(&path, &idx).expect("Unable to write descriptor");
}
