//! zipinfo-style listing scenarios against a real archive (spec §8).

use tempfile::tempdir;
use zip_core::config::{Config, Session};
use zip_core::dostime::DosDateTime;
use zip_core::entry::{Action, Entry, Method, Origin};
use zip_core::inspector::{render, Format, InspectorOptions};
use zip_core::reader::Reader;
use zip_core::writer::write_archive;

fn build_archive(dir: &std::path::Path) -> std::path::PathBuf {
    let target = dir.join("listing.zip");
    let mut entries = vec![
        Entry {
            name: "notes.txt".to_string(),
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
            origin: Origin::FromMemory(b"hello there, this compresses a little".to_vec()),
            action: Action::Add,
        },
        Entry {
            name: "bin/tool".to_string(),
            method: Method::Store,
            flags: 0,
            crc32: 0,
            comp_size: 0,
            uncomp_size: 0,
            mtime_dos: DosDateTime { time: 0, date: 0x21 },
            external_attrs: (0o100755u32) << 16,
            extra: Vec::new(),
            comment: Vec::new(),
            lho_offset: 0,
            origin: Origin::FromMemory(vec![0u8; 64]),
            action: Action::Add,
        },
    ];
    let config = Config::default();
    let mut session = Session::new();
    write_archive(&target, None, &mut entries, b"archive comment", &config, &mut session).unwrap();
    target
}

#[test]
fn short_listing_is_names_only() {
    let dir = tempdir().unwrap();
    let path = build_archive(dir.path());
    let reader = Reader::open(&path).unwrap();
    let options = InspectorOptions {
        format: Format::Short,
        ..Default::default()
    };
    let out = render(&reader, &path, 500, &options);
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(lines, vec!["notes.txt", "bin/tool"]);
}

#[test]
fn medium_listing_includes_ratio_column() {
    let dir = tempdir().unwrap();
    let path = build_archive(dir.path());
    let reader = Reader::open(&path).unwrap();
    let options = InspectorOptions {
        format: Format::Medium,
        ..Default::default()
    };
    let out = render(&reader, &path, 500, &options);
    assert!(out.contains('%'));
    assert!(out.contains("notes.txt"));
}

#[test]
fn archive_comment_appended_only_when_requested() {
    let dir = tempdir().unwrap();
    let path = build_archive(dir.path());
    let reader = Reader::open(&path).unwrap();

    let without = render(&reader, &path, 500, &InspectorOptions::default());
    assert!(!without.contains("archive comment"));

    let with_comment = InspectorOptions {
        show_comment: true,
        ..Default::default()
    };
    let with = render(&reader, &path, 500, &with_comment);
    assert!(with.contains("archive comment"));
}

#[test]
fn permission_string_reflects_directory_and_executable_entries() {
    let dir = tempdir().unwrap();
    let path = build_archive(dir.path());
    let reader = Reader::open(&path).unwrap();
    let options = InspectorOptions {
        format: Format::Long,
        ..Default::default()
    };
    let out = render(&reader, &path, 500, &options);
    let tool_line = out.lines().find(|l| l.contains("bin/tool")).unwrap();
    assert!(tool_line.starts_with("-rwxr-xr-x"));
}
