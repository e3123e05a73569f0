//! End-to-end write/read/extract scenarios (spec §8).

use std::fs;
use tempfile::tempdir;
use zip_core::config::{Config, LineMode, OverwritePolicy, Session};
use zip_core::dostime::DosDateTime;
use zip_core::entry::{Action, Entry, Method, Origin};
use zip_core::reader::Reader;
use zip_core::writer::write_archive;

fn entry(name: &str, data: &[u8]) -> Entry {
    Entry {
        name: name.to_string(),
        method: Method::Deflate,
        flags: 0,
        crc32: 0,
        comp_size: 0,
        uncomp_size: 0,
        mtime_dos: DosDateTime { time: 0, date: 0x21 },
        external_attrs: (0o100644u32) << 16,
        extra: Vec::new(),
        comment: Vec::new(),
        lho_offset: 0,
        origin: Origin::FromMemory(data.to_vec()),
        action: Action::Add,
    }
}

#[test]
fn full_write_then_extract_round_trip() {
    let dir = tempdir().unwrap();
    let archive_path = dir.path().join("bundle.zip");

    let mut entries = vec![
        entry("readme.txt", b"top level file\n"),
        entry("src/main.rs", b"fn main() {}\n"),
        entry("data.bin", &(0u8..=255).cycle().take(8192).collect::<Vec<_>>()),
    ];
    let config = Config::default();
    let mut session = Session::new();
    write_archive(&archive_path, None, &mut entries, b"a test archive", &config, &mut session).unwrap();

    let mut reader = Reader::open(&archive_path).unwrap();
    reader.check_invariants().unwrap();
    assert_eq!(reader.entries.len(), 3);
    assert_eq!(reader.archive_comment, b"a test archive");

    let out_dir = dir.path().join("out");
    fs::create_dir_all(&out_dir).unwrap();
    let mut extract_config = Config::default();
    extract_config.target_dir = Some(out_dir.clone());
    extract_config.overwrite = OverwritePolicy::Always;

    for i in 0..reader.entries.len() {
        let e = reader.entries[i].clone();
        reader.extract_entry(&e, &extract_config, &mut session).unwrap();
    }

    assert_eq!(fs::read(out_dir.join("readme.txt")).unwrap(), b"top level file\n");
    assert_eq!(fs::read(out_dir.join("src/main.rs")).unwrap(), b"fn main() {}\n");
    assert_eq!(fs::read(out_dir.join("data.bin")).unwrap().len(), 8192);
}

#[test]
fn update_then_rewrite_keeps_unrelated_entries_byte_identical() {
    let dir = tempdir().unwrap();
    let first_path = dir.path().join("first.zip");

    let mut entries = vec![
        entry("keep.txt", b"unchanged across rewrites"),
        entry("stale.txt", b"will be replaced"),
    ];
    let config = Config::default();
    let mut session = Session::new();
    write_archive(&first_path, None, &mut entries, &[], &config, &mut session).unwrap();

    let reader = Reader::open(&first_path).unwrap();
    let mut plan = reader.entries_for_copy_through();
    let stale = plan.iter_mut().find(|e| e.name == "stale.txt").unwrap();
    stale.action = Action::Replace;
    stale.origin = Origin::FromMemory(b"fresh replacement content".to_vec());

    let second_path = dir.path().join("second.zip");
    let mut input = reader.reopen_input(&first_path).unwrap();
    write_archive(&second_path, Some(&mut input), &mut plan, &[], &config, &mut session).unwrap();

    let mut reader2 = Reader::open(&second_path).unwrap();
    let kept = reader2.find("keep.txt").unwrap().clone();
    let replaced = reader2.find("stale.txt").unwrap().clone();
    assert_eq!(reader2.read_entry(&kept).unwrap(), b"unchanged across rewrites");
    assert_eq!(reader2.read_entry(&replaced).unwrap(), b"fresh replacement content");
}

#[test]
fn delete_mode_drops_matching_entries_on_rewrite() {
    let dir = tempdir().unwrap();
    let first_path = dir.path().join("first.zip");

    let mut entries = vec![entry("a.txt", b"a"), entry("b.txt", b"b")];
    let config = Config::default();
    let mut session = Session::new();
    write_archive(&first_path, None, &mut entries, &[], &config, &mut session).unwrap();

    let reader = Reader::open(&first_path).unwrap();
    let mut plan: Vec<Entry> = reader
        .entries_for_copy_through()
        .into_iter()
        .map(|mut e| {
            if e.name == "b.txt" {
                e.action = Action::Delete;
            }
            e
        })
        .collect();

    let second_path = dir.path().join("second.zip");
    let mut input = reader.reopen_input(&first_path).unwrap();
    write_archive(&second_path, Some(&mut input), &mut plan, &[], &config, &mut session).unwrap();

    let reader2 = Reader::open(&second_path).unwrap();
    assert_eq!(reader2.entries.len(), 1);
    assert_eq!(reader2.entries[0].name, "a.txt");
}

#[test]
fn pipe_and_test_modes_never_touch_the_filesystem() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("piped.zip");
    let mut entries = vec![entry("only.txt", b"pipe this out")];
    let config = Config::default();
    let mut session = Session::new();
    write_archive(&path, None, &mut entries, &[], &config, &mut session).unwrap();

    let mut reader = Reader::open(&path).unwrap();
    let e = reader.entries[0].clone();
    reader.test_entry(&e).unwrap();

    let mut sink = Vec::new();
    reader.pipe_entry(&e, &mut sink).unwrap();
    assert_eq!(sink, b"pipe this out");
}

#[test]
fn crlf_translation_round_trips_through_extraction() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("text.zip");
    let mut entries = vec![entry("unix.txt", b"line one\nline two\n")];
    let mut config = Config::default();
    config.line_mode = LineMode::LfToCrlf;
    let mut session = Session::new();
    write_archive(&path, None, &mut entries, &[], &config, &mut session).unwrap();

    let mut reader = Reader::open(&path).unwrap();
    let e = reader.entries[0].clone();
    let data = reader.read_entry(&e).unwrap();
    assert_eq!(data, b"line one\r\nline two\r\n");
}
