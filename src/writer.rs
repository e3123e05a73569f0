//! The writer: streams a plan to a temp file and atomically renames it
//! into place (spec §4.5).
//!
//! Applies the LFH-then-compressed-bytes-then-data-descriptor shape
//! across a planned entry list, with copy-through, store-fallback, and
//! the safe rewrite protocol.

use crate::codec;
use crate::config::{Config, LineMode, Session};
use crate::crc::Crc32;
use crate::entry::{Action, Entry, Method, Origin};
use crate::error::{Error, Result};
use crate::io_buf::{InputStream, OutputStream};
use crate::records::{
    CentralDirectoryHeader, DataDescriptor, Eocd, LocalFileHeader, Zip64Eocd, Zip64Locator,
    FLAG_DATA_DESCRIPTOR,
};
use std::io::Read;
use std::path::Path;
use tempfile::NamedTempFile;

/// One line of per-entry progress the writer produced (for the "adding:"
/// / "deleting:" stdout contract in spec §8 scenarios).
#[derive(Debug, Clone)]
pub struct WriteReport {
    pub name: String,
    pub action: Action,
    pub method: Method,
    /// Percentage change vs. uncompressed size; negative when the entry
    /// compressed *worse* than stored, preserved for parity (spec §9 open
    /// question: the original's negative-ratio display is kept as-is).
    pub ratio_percent: i64,
}

fn version_needed(method: Method, needs_zip64: bool) -> u16 {
    if needs_zip64 {
        45
    } else {
        match method {
            Method::Store => 10,
            Method::Deflate => 20,
        }
    }
}

fn decide_method(name: &str, uncomp_len: u64, config: &Config) -> Method {
    if config.level == 0 || uncomp_len == 0 {
        return Method::Store;
    }
    let lower = name.to_ascii_lowercase();
    if config
        .no_compress_suffixes
        .iter()
        .any(|suf| lower.ends_with(&suf.to_ascii_lowercase()))
    {
        return Method::Store;
    }
    Method::Deflate
}

/// Applies LF<->CRLF translation before CRC/compression, per spec §4.5
/// ("translation is applied before CRC and compression").
fn translate_lines(data: &[u8], mode: LineMode) -> Vec<u8> {
    match mode {
        LineMode::None => data.to_vec(),
        LineMode::LfToCrlf => {
            let mut out = Vec::with_capacity(data.len());
            for &b in data {
                if b == b'\n' {
                    out.push(b'\r');
                }
                out.push(b);
            }
            out
        }
        LineMode::CrlfToLf => {
            let mut out = Vec::with_capacity(data.len());
            let mut i = 0;
            while i < data.len() {
                if data[i] == b'\r' && i + 1 < data.len() && data[i + 1] == b'\n' {
                    i += 1;
                    continue;
                }
                out.push(data[i]);
                i += 1;
            }
            out
        }
    }
}

fn load_source_bytes(entry: &Entry) -> Result<Vec<u8>> {
    match &entry.origin {
        Origin::FromDisk(path) => {
            std::fs::read(path).map_err(|e| Error::from(e).with_path(path.display().to_string()))
        }
        Origin::FromMemory(bytes) => Ok(bytes.clone()),
        Origin::FromStdin => Err(Error::Usage(
            "streaming stdin entries must be written via write_streaming_entry first".into(),
        )),
        Origin::FromArchive { .. } => Err(Error::Usage(
            "FromArchive entries must use Action::Keep/CopyThrough".into(),
        )),
    }
}

/// Writes one fresh (`Add`/`Replace`) entry whose full content is
/// available up front: translate, compress into memory, decide
/// store-vs-deflate, then emit a header with final sizes (no data
/// descriptor needed).
fn write_fresh_entry(
    entry: &mut Entry,
    output: &mut OutputStream,
    config: &Config,
) -> Result<WriteReport> {
    let raw = load_source_bytes(entry)?;
    let translated = translate_lines(&raw, config.line_mode);
    let uncomp_size = translated.len() as u64;

    let mut method = decide_method(&entry.name, uncomp_size, config);
    let mut crc = Crc32::new();
    crc.update(&translated);
    let crc32 = crc.finalize();

    let mut payload = match method {
        Method::Store => translated.clone(),
        Method::Deflate => codec::deflate_buffer(&translated, config.level)?,
    };

    if method == Method::Deflate && payload.len() as u64 >= uncomp_size {
        method = Method::Store;
        payload = translated;
    }

    entry.crc32 = crc32;
    entry.uncomp_size = uncomp_size;
    entry.comp_size = payload.len() as u64;
    entry.method = method;
    entry.flags &= !FLAG_DATA_DESCRIPTOR;
    if config.strip_extra_attrs {
        entry.extra.clear();
    }

    let lfh = LocalFileHeader {
        version_needed: version_needed(method, false),
        flags: entry.flags,
        method: method.to_wire(),
        mod_time: entry.mtime_dos.time,
        mod_date: entry.mtime_dos.date,
        crc32,
        comp_size: payload.len() as u64,
        uncomp_size,
        name: entry.name.as_bytes().to_vec(),
        extra: entry.extra.clone(),
    };
    lfh.write(output)?;
    output.write(&payload)?;

    Ok(WriteReport {
        name: entry.name.clone(),
        action: entry.action,
        method,
        ratio_percent: ratio(uncomp_size, payload.len() as u64),
    })
}

/// Writes one streaming entry (origin `FromStdin`) whose size is unknown
/// up front: placeholder LFH with flag bit 3 set, compress on the fly,
/// then a trailing data descriptor. Called ahead of `write_archive`
/// because `Entry` (and therefore the plan) must stay `Clone`, which a
/// live `Read` handle can't be.
pub fn write_streaming_entry(
    entry: &mut Entry,
    source: &mut dyn Read,
    output: &mut OutputStream,
    config: &Config,
) -> Result<WriteReport> {
    let mut raw = Vec::new();
    source.read_to_end(&mut raw)?;
    let translated = translate_lines(&raw, config.line_mode);
    let uncomp_size = translated.len() as u64;
    let mut crc = Crc32::new();
    crc.update(&translated);
    let crc32 = crc.finalize();

    let method = decide_method(&entry.name, uncomp_size, config);
    let payload = match method {
        Method::Store => translated,
        Method::Deflate => codec::deflate_buffer(&translated, config.level)?,
    };

    entry.flags |= FLAG_DATA_DESCRIPTOR;
    entry.method = method;
    entry.crc32 = crc32;
    entry.uncomp_size = uncomp_size;
    entry.comp_size = payload.len() as u64;
    entry.lho_offset = output.tell()?;

    let lfh = LocalFileHeader {
        version_needed: version_needed(method, false),
        flags: entry.flags,
        method: method.to_wire(),
        mod_time: entry.mtime_dos.time,
        mod_date: entry.mtime_dos.date,
        crc32: 0,
        comp_size: 0,
        uncomp_size: 0,
        name: entry.name.as_bytes().to_vec(),
        extra: entry.extra.clone(),
    };
    lfh.write(output)?;
    output.write(&payload)?;

    DataDescriptor {
        crc32,
        comp_size: payload.len() as u64,
        uncomp_size,
    }
    .write(output)?;

    Ok(WriteReport {
        name: entry.name.clone(),
        action: entry.action,
        method,
        ratio_percent: ratio(uncomp_size, payload.len() as u64),
    })
}

/// Copies an existing entry's LFH + compressed payload verbatim from the
/// input archive, per spec §4.5 ("copy raw LFH + compressed bytes from the
/// input archive verbatim; CRC is not recomputed unless `verify_copy_through_crc`").
fn copy_through_entry(
    entry: &mut Entry,
    input: &mut InputStream,
    output: &mut OutputStream,
    config: &Config,
) -> Result<WriteReport> {
    let (offset, comp_size) = match entry.origin {
        Origin::FromArchive { offset, comp_size } => (offset, comp_size),
        _ => {
            return Err(Error::Usage(
                "copy-through entry must have origin FromArchive".into(),
            ))
        }
    };

    input.seek(offset)?;
    let old_lfh = LocalFileHeader::read(input)?;
    let old_method =
        Method::from_wire(old_lfh.method).ok_or(Error::UnsupportedMethod(old_lfh.method))?;

    let payload_offset = offset + 30 + old_lfh.name.len() as u64 + old_lfh.extra.len() as u64;
    input.seek(payload_offset)?;
    let payload = input.read_exact(comp_size as usize)?;

    if config.verify_copy_through_crc {
        let decompressed = match old_method {
            Method::Store => payload.clone(),
            Method::Deflate => codec::inflate_buffer(&payload)?,
        };
        if crate::crc::crc32(&decompressed) != entry.crc32 {
            return Err(Error::BadCrc {
                name: entry.name.clone(),
            });
        }
    }

    let needs_zip64 = entry.comp_size > u32::MAX as u64 || entry.uncomp_size > u32::MAX as u64;
    let new_lfh = LocalFileHeader {
        version_needed: version_needed(old_method, needs_zip64),
        flags: entry.flags,
        method: old_lfh.method,
        mod_time: entry.mtime_dos.time,
        mod_date: entry.mtime_dos.date,
        crc32: entry.crc32,
        comp_size: entry.comp_size,
        uncomp_size: entry.uncomp_size,
        name: entry.name.as_bytes().to_vec(),
        extra: if config.strip_extra_attrs {
            Vec::new()
        } else {
            entry.extra.clone()
        },
    };
    new_lfh.write(output)?;
    output.write(&payload)?;

    Ok(WriteReport {
        name: entry.name.clone(),
        action: entry.action,
        method: old_method,
        ratio_percent: ratio(entry.uncomp_size, entry.comp_size),
    })
}

/// Compression ratio as Info-ZIP displays it: can be negative when the
/// deflated form is larger than the source, preserved for parity (see
/// spec §9 open questions).
fn ratio(uncomp: u64, comp: u64) -> i64 {
    if uncomp == 0 {
        return 0;
    }
    100 - (comp as i64 * 100) / uncomp as i64
}

fn build_cdh(entry: &Entry) -> CentralDirectoryHeader {
    CentralDirectoryHeader {
        version_made_by: 0x0314, // upper byte 3 = unix "made by", lower = spec version 20
        version_needed: version_needed(entry.method, false),
        flags: entry.flags,
        method: entry.method.to_wire(),
        mod_time: entry.mtime_dos.time,
        mod_date: entry.mtime_dos.date,
        crc32: entry.crc32,
        comp_size: entry.comp_size,
        uncomp_size: entry.uncomp_size,
        disk_start: 0,
        internal_attrs: 0,
        external_attrs: entry.external_attrs,
        lho_offset: entry.lho_offset,
        name: entry.name.as_bytes().to_vec(),
        extra: entry.extra.clone(),
        comment: entry.comment.clone(),
    }
}

fn archive_needs_zip64(entries: &[Entry], cd_offset: u64, cd_size: u64) -> bool {
    let live = entries.iter().filter(|e| e.action != Action::Delete).count();
    live >= 0xFFFF
        || cd_offset > u32::MAX as u64
        || cd_size > u32::MAX as u64
        || entries.iter().any(|e| {
            e.action != Action::Delete
                && (e.comp_size > u32::MAX as u64
                    || e.uncomp_size > u32::MAX as u64
                    || e.lho_offset > u32::MAX as u64)
        })
}

/// Writes the full archive: entry bodies, central directory, EOCD (+
/// ZIP64 forms if needed), via a temp file in `target`'s directory (or
/// `config.temp_dir`), fsync'd and atomically renamed into place. On any
/// error the temp file is discarded and the original archive untouched.
///
/// `input` is the existing archive being rewritten, required whenever the
/// plan contains `Keep`/`CopyThrough` actions; a fresh archive with only
/// `Add` entries can pass `None`.
pub fn write_archive(
    target: &Path,
    mut input: Option<&mut InputStream>,
    entries: &mut [Entry],
    archive_comment: &[u8],
    config: &Config,
    _session: &mut Session,
) -> Result<Vec<WriteReport>> {
    let dir = config
        .temp_dir
        .clone()
        .or_else(|| target.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| std::path::PathBuf::from("."));

    let temp = NamedTempFile::new_in(&dir)
        .map_err(|e| Error::from(e).with_path(dir.display().to_string()))?;
    let file = temp
        .reopen()
        .map_err(|e| Error::from(e).with_path(dir.display().to_string()))?;
    let mut output = OutputStream::from_file(file, temp.path().display().to_string());

    let mut reports = Vec::new();

    for entry in entries.iter_mut() {
        if entry.action == Action::Delete {
            continue;
        }
        entry.lho_offset = output.tell()?;
        let report = match entry.action {
            Action::Keep | Action::CopyThrough => {
                let input = input.as_deref_mut().ok_or_else(|| {
                    Error::Usage("copy-through requires an input archive".into())
                })?;
                copy_through_entry(entry, input, &mut output, config)?
            }
            Action::Add | Action::Replace => match entry.origin {
                Origin::FromStdin => {
                    return Err(Error::Usage(
                        "FromStdin entries must be written via write_streaming_entry before write_archive".into(),
                    ))
                }
                _ => write_fresh_entry(entry, &mut output, config)?,
            },
            Action::Delete => unreachable!(),
        };
        reports.push(report);
    }

    let cd_offset = output.tell()?;
    for entry in entries.iter().filter(|e| e.action != Action::Delete) {
        build_cdh(entry).write(&mut output)?;
    }
    let cd_size = output.tell()? - cd_offset;

    let live_count = entries.iter().filter(|e| e.action != Action::Delete).count();
    let needs_zip64 = archive_needs_zip64(entries, cd_offset, cd_size);

    if needs_zip64 {
        let zip64_eocd_offset = output.tell()?;
        Zip64Eocd {
            version_made_by: 45,
            version_needed: 45,
            disk_number: 0,
            cd_disk: 0,
            entries_this_disk: live_count as u64,
            total_entries: live_count as u64,
            cd_size,
            cd_offset,
        }
        .write(&mut output)?;
        Zip64Locator {
            disk_with_zip64_eocd: 0,
            zip64_eocd_offset,
            total_disks: 1,
        }
        .write(&mut output)?;
    }

    Eocd {
        disk_number: 0,
        cd_disk: 0,
        entries_this_disk: live_count as u64,
        total_entries: live_count as u64,
        cd_size,
        cd_offset,
        comment: archive_comment.to_vec(),
    }
    .write(&mut output)?;

    output.sync()?;
    drop(output);

    temp.persist(target)
        .map_err(|e| Error::from(e.error).with_path(target.display().to_string()))?;

    Ok(reports)
}
