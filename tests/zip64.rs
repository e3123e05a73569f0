//! A hand-crafted ZIP64 archive, read back through the real parser.
//!
//! Builds the record sequence by hand (LFH with data descriptor, central
//! directory with a ZIP64 extra field, ZIP64 EOCD + locator, classic EOCD
//! with sentinels) since there is no everyday path that produces a
//! >4GiB archive in a test.

use std::fs::File;
use std::io::{Seek, Write};
use tempfile::tempdir;
use zip_core::reader::Reader;

#[test]
fn reads_zip64_promoted_fields_and_verifies_crc() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("zip64_test.zip");
    let mut f = File::create(&path).unwrap();

    // Local file header for a.txt, sizes unknown up front (data descriptor).
    f.write_all(&[0x50, 0x4b, 0x03, 0x04]).unwrap();
    f.write_all(&[45, 0]).unwrap(); // version needed
    f.write_all(&[8, 0]).unwrap(); // flags: bit 3 set
    f.write_all(&[0, 0]).unwrap(); // method: stored
    f.write_all(&[0, 0, 0, 0]).unwrap(); // mod time/date
    f.write_all(&0u32.to_le_bytes()).unwrap(); // crc placeholder
    f.write_all(&0xFFFF_FFFFu32.to_le_bytes()).unwrap(); // comp size sentinel
    f.write_all(&0xFFFF_FFFFu32.to_le_bytes()).unwrap(); // uncomp size sentinel
    f.write_all(&(5u16).to_le_bytes()).unwrap(); // name len
    f.write_all(&0u16.to_le_bytes()).unwrap(); // extra len
    f.write_all(b"a.txt").unwrap();

    let data = b"hello";
    let data_offset = f.stream_position().unwrap();
    f.write_all(data).unwrap();

    let crc = crc32fast::hash(data);
    f.write_all(&[0x50, 0x4b, 0x07, 0x08]).unwrap();
    f.write_all(&crc.to_le_bytes()).unwrap();
    f.write_all(&(data.len() as u64).to_le_bytes()).unwrap();
    f.write_all(&(data.len() as u64).to_le_bytes()).unwrap();

    let cd_start = f.stream_position().unwrap();
    f.write_all(&[0x50, 0x4b, 0x01, 0x02]).unwrap();
    f.write_all(&[45, 0]).unwrap(); // version made by
    f.write_all(&[45, 0]).unwrap(); // version needed
    f.write_all(&[8, 0]).unwrap(); // flags
    f.write_all(&[0, 0]).unwrap(); // method
    f.write_all(&[0, 0, 0, 0]).unwrap(); // mod time/date
    f.write_all(&crc.to_le_bytes()).unwrap();
    f.write_all(&0xFFFF_FFFFu32.to_le_bytes()).unwrap(); // comp size sentinel
    f.write_all(&0xFFFF_FFFFu32.to_le_bytes()).unwrap(); // uncomp size sentinel
    f.write_all(&(5u16).to_le_bytes()).unwrap(); // name len
    f.write_all(&(28u16).to_le_bytes()).unwrap(); // extra len: header(4) + 3x u64(24)
    f.write_all(&0u16.to_le_bytes()).unwrap(); // comment len
    f.write_all(&0u16.to_le_bytes()).unwrap(); // disk start
    f.write_all(&0u16.to_le_bytes()).unwrap(); // internal attrs
    f.write_all(&0u32.to_le_bytes()).unwrap(); // external attrs
    f.write_all(&0xFFFF_FFFFu32.to_le_bytes()).unwrap(); // lho offset sentinel
    f.write_all(b"a.txt").unwrap();
    f.write_all(&0x0001u16.to_le_bytes()).unwrap(); // ZIP64 extra id
    f.write_all(&(24u16).to_le_bytes()).unwrap(); // data length
    f.write_all(&(data.len() as u64).to_le_bytes()).unwrap(); // uncompressed
    f.write_all(&(data.len() as u64).to_le_bytes()).unwrap(); // compressed
    f.write_all(&0u64.to_le_bytes()).unwrap(); // lho offset (archive starts at 0)
    let _ = data_offset;

    let cd_end = f.stream_position().unwrap();
    let cd_size = cd_end - cd_start;

    let zip64_eocd_start = f.stream_position().unwrap();
    f.write_all(&[0x50, 0x4b, 0x06, 0x06]).unwrap();
    f.write_all(&(44u64).to_le_bytes()).unwrap();
    f.write_all(&[45, 0]).unwrap();
    f.write_all(&[45, 0]).unwrap();
    f.write_all(&0u32.to_le_bytes()).unwrap();
    f.write_all(&0u32.to_le_bytes()).unwrap();
    f.write_all(&(1u64).to_le_bytes()).unwrap();
    f.write_all(&(1u64).to_le_bytes()).unwrap();
    f.write_all(&cd_size.to_le_bytes()).unwrap();
    f.write_all(&cd_start.to_le_bytes()).unwrap();

    f.write_all(&[0x50, 0x4b, 0x06, 0x07]).unwrap();
    f.write_all(&0u32.to_le_bytes()).unwrap();
    f.write_all(&zip64_eocd_start.to_le_bytes()).unwrap();
    f.write_all(&1u32.to_le_bytes()).unwrap();

    f.write_all(&[0x50, 0x4b, 0x05, 0x06]).unwrap();
    f.write_all(&0u16.to_le_bytes()).unwrap();
    f.write_all(&0u16.to_le_bytes()).unwrap();
    f.write_all(&0xFFFFu16.to_le_bytes()).unwrap();
    f.write_all(&0xFFFFu16.to_le_bytes()).unwrap();
    f.write_all(&0xFFFF_FFFFu32.to_le_bytes()).unwrap();
    f.write_all(&0xFFFF_FFFFu32.to_le_bytes()).unwrap();
    f.write_all(&0u16.to_le_bytes()).unwrap(); // archive comment len
    f.flush().unwrap();
    drop(f);

    let mut reader = Reader::open(&path).unwrap();
    assert_eq!(reader.entries.len(), 1);
    let entry = &reader.entries[0];
    assert_eq!(entry.name, "a.txt");
    assert_eq!(entry.comp_size, 5);
    assert_eq!(entry.uncomp_size, 5);
    assert_eq!(entry.lho_offset, 0);

    let e = reader.entries[0].clone();
    let content = reader.read_entry(&e).unwrap();
    assert_eq!(content, b"hello");
}
