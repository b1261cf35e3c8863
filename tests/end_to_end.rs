//! End-to-end scenarios over a temporary on-disk dataset.

use idx::{reader, writer, Bounds, EngineContext, IdxFile, Vector3};

fn temp_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("idx-e2e-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Scenario 1: tiny write/read.
#[test]
fn tiny_write_read_back_inclusive() {
    let dir = temp_dir("tiny");
    let mut idx = IdxFile::create(Vector3::new(4, 4, 1), "int8", 1, 1).unwrap();
    idx.filename_template.head = dir.clone();

    let ctx = EngineContext::default();
    let query = Bounds {
        min: Vector3::new(0, 0, 0),
        max: Vector3::new(3, 3, 0),
    };
    let input: Vec<u8> = (0u8..16).collect();
    writer::write_idx_grid(&idx, 0, 0.0, writer::WriteLevel::All, &query, &input, &ctx).unwrap();

    let mut out = vec![0u8; 16];
    let max = idx.get_max_hz_level();
    reader::read_idx_grid_inclusive(&idx, 0, 0.0, max, &query, &mut out, &ctx).unwrap();
    assert_eq!(out, input);

    let _ = std::fs::remove_dir_all(&dir);
}

/// Scenario 2: multi-file write.
#[test]
fn multi_file_write_spans_several_files() {
    let dir = temp_dir("multifile");
    let mut idx = IdxFile::create(Vector3::new(4, 4, 4), "int32", 1, 1).unwrap();
    idx.bits_per_block = 4;
    idx.blocks_per_file = 1;
    idx.filename_template.head = dir.clone();
    idx.filename_template.groups = vec![2];

    let ctx = EngineContext::default();
    let query = Bounds {
        min: Vector3::new(0, 0, 0),
        max: Vector3::new(3, 3, 3),
    };
    let input: Vec<u8> = (0i32..64).flat_map(|v| v.to_le_bytes()).collect();
    writer::write_idx_grid(&idx, 0, 0.0, writer::WriteLevel::All, &query, &input, &ctx).unwrap();

    let mut out = vec![0u8; input.len()];
    let max = idx.get_max_hz_level();
    reader::read_idx_grid_inclusive(&idx, 0, 0.0, max, &query, &mut out, &ctx).unwrap();
    assert_eq!(out, input);

    let mut file_count = 0usize;
    for entry in walk(&dir) {
        if entry.extension().map(|e| e == "bin").unwrap_or(false) {
            file_count += 1;
        }
    }
    assert!(file_count > 1, "expected multiple physical files, found {file_count}");

    let _ = std::fs::remove_dir_all(&dir);
}

fn walk(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir).unwrap() {
        let entry = entry.unwrap();
        let path = entry.path();
        if path.is_dir() {
            out.extend(walk(&path));
        } else {
            out.push(path);
        }
    }
    out
}

/// Scenario 3: low-level read, grid dims match the level-3 sub-grid formula.
#[test]
fn low_level_read_matches_level_grid_dims() {
    let dir = temp_dir("lowlevel");
    let mut idx = IdxFile::create(Vector3::new(128, 64, 64), "float64", 1, 1).unwrap();
    idx.filename_template.head = dir.clone();

    let level = 3u32;
    let expected = idx.get_grid(level, None).unwrap();

    let full_box = *idx.get_logical_extent();
    let mut buf = vec![0u8; idx.get_size(0, Some(level), Some(&full_box)).unwrap() as usize];
    let ctx = EngineContext::default();
    reader::read_idx_grid(&idx, 0, 0.0, level, &full_box, &mut buf, &ctx).unwrap();

    let got = idx.get_grid(level, Some(&full_box)).unwrap();
    assert_eq!(got.dims(), expected.dims());

    let _ = std::fs::remove_dir_all(&dir);
}

/// Scenario 4: sliced read, a single-x-plane sub-grid at max_hz.
#[test]
fn sliced_read_is_single_plane_at_max_hz() {
    let dir = temp_dir("sliced");
    let mut idx = IdxFile::create(Vector3::new(128, 64, 64), "int8", 1, 1).unwrap();
    idx.filename_template.head = dir.clone();

    let query = Bounds {
        min: Vector3::new(70, 0, 0),
        max: Vector3::new(70, 63, 63),
    };
    let max = idx.get_max_hz_level();
    let grid = idx.get_grid_inclusive(max, Some(&query)).unwrap();
    assert_eq!(grid.dims(), Vector3::new(1, 64, 64));
    assert_eq!(grid.stride, Vector3::splat(1));

    let _ = std::fs::remove_dir_all(&dir);
}

/// Scenario 5: progressive (inclusive) equivalence.
#[test]
fn inclusive_read_equals_union_of_non_inclusive_levels() {
    let dir = temp_dir("progressive");
    let mut idx = IdxFile::create(Vector3::new(4, 4, 1), "int8", 1, 1).unwrap();
    idx.filename_template.head = dir.clone();

    let ctx = EngineContext::default();
    let query = Bounds {
        min: Vector3::new(0, 0, 0),
        max: Vector3::new(3, 3, 0),
    };
    let input: Vec<u8> = (0u8..16).collect();
    writer::write_idx_grid(&idx, 0, 0.0, writer::WriteLevel::All, &query, &input, &ctx).unwrap();

    let max = idx.get_max_hz_level();
    let mut inclusive = vec![0xffu8; 16];
    reader::read_idx_grid_inclusive(&idx, 0, 0.0, max, &query, &mut inclusive, &ctx).unwrap();

    let mut progressive = vec![0xffu8; 16];
    for level in 0..=max {
        reader::read_idx_grid(&idx, 0, 0.0, level, &query, &mut progressive, &ctx).unwrap();
    }
    assert_eq!(inclusive, progressive);

    let _ = std::fs::remove_dir_all(&dir);
}

/// Scenario 6: absent block, output buffer is left unchanged.
#[test]
fn absent_block_leaves_buffer_unchanged() {
    let dir = temp_dir("absent");
    let mut idx = IdxFile::create(Vector3::new(4, 4, 1), "int8", 1, 1).unwrap();
    idx.filename_template.head = dir.clone();

    let ctx = EngineContext::default();
    let query = Bounds {
        min: Vector3::new(0, 0, 0),
        max: Vector3::new(3, 3, 0),
    };
    let max = idx.get_max_hz_level();
    let mut buf = vec![0x42u8; 16];
    reader::read_idx_grid_inclusive(&idx, 0, 0.0, max, &query, &mut buf, &ctx).unwrap();
    assert!(buf.iter().all(|&b| b == 0x42));

    let _ = std::fs::remove_dir_all(&dir);
}
