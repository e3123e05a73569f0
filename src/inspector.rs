//! The inspector: zipinfo-style archive listings (spec §4.7).
//!
//! Builds on the central-directory walk `reader.rs` already does to
//! enumerate entries; this module only formats what `reader::Reader`
//! already loaded, never touches the file itself.

use crate::entry::Entry;
use crate::reader::Reader;
use std::fmt::Write as _;
use std::path::Path;

/// Which of the five listing formats to render (spec §4.7's table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `-1`: name only, no header/footer.
    Short,
    /// `-m`: perms, made-by version, size, type flag, ratio, method, mtime, name.
    Medium,
    /// default: perms, made-by version, size, type flag, method, mtime, name.
    Long,
    /// `-v`: Long plus per-entry version-needed/flags/method-num/offset/sizes/crc/extra dump.
    Verbose,
    /// `-1` without header: identical columns to Short, forced headerless.
    Names,
}

#[derive(Debug, Clone)]
pub struct InspectorOptions {
    pub format: Format,
    /// `-T`: switch mtime to `YYMMDD.HHMMSS`.
    pub decimal_time: bool,
    /// `-z`: append the archive comment to the listing.
    pub show_comment: bool,
    /// `-h`: force the header even for formats that default to skipping it.
    pub force_header: bool,
    /// `-t`: force the footer even for formats that default to skipping it.
    pub force_footer: bool,
}

impl Default for InspectorOptions {
    fn default() -> Self {
        Self {
            format: Format::Long,
            decimal_time: false,
            show_comment: false,
            force_header: false,
            force_footer: false,
        }
    }
}

fn default_shows_header_footer(format: Format) -> bool {
    !matches!(format, Format::Short | Format::Names)
}

/// Renders the full listing for `reader`'s entries against `archive_path`
/// (for the header line) and `archive_size` (the on-disk byte count).
pub fn render(reader: &Reader, archive_path: &Path, archive_size: u64, options: &InspectorOptions) -> String {
    let mut out = String::new();
    let show_header_footer = default_shows_header_footer(options.format)
        || options.force_header
        || options.force_footer;

    if show_header_footer && (default_shows_header_footer(options.format) || options.force_header) {
        let _ = writeln!(
            out,
            "Archive:  {}   {} bytes   {} files",
            archive_path.display(),
            archive_size,
            reader.entries.len()
        );
    }

    for entry in &reader.entries {
        let _ = writeln!(out, "{}", format_entry(entry, options));
    }

    if show_header_footer && (default_shows_header_footer(options.format) || options.force_footer) {
        let total_uncomp: u64 = reader.entries.iter().map(|e| e.uncomp_size).sum();
        let total_comp: u64 = reader.entries.iter().map(|e| e.comp_size).sum();
        let ratio = compression_ratio(total_uncomp, total_comp);
        let _ = writeln!(
            out,
            "{} files, {} bytes uncompressed, {} bytes compressed:  {}%",
            reader.entries.len(),
            total_uncomp,
            total_comp,
            ratio
        );
    }

    if options.show_comment && !reader.archive_comment.is_empty() {
        out.push_str(&String::from_utf8_lossy(&reader.archive_comment));
        out.push('\n');
    }

    out
}

fn format_entry(entry: &Entry, options: &InspectorOptions) -> String {
    match options.format {
        Format::Short | Format::Names => entry.name.clone(),
        Format::Medium => format!(
            "{} {} {:>10} {} {:>3}% {} {} {}",
            perm_string(entry),
            made_by_version(entry),
            entry.uncomp_size,
            type_flag(entry),
            compression_ratio(entry.uncomp_size, entry.comp_size),
            method_name(entry),
            mtime_string(entry, options.decimal_time),
            entry.name
        ),
        Format::Long => format!(
            "{} {} {:>10} {} {} {} {}",
            perm_string(entry),
            made_by_version(entry),
            entry.uncomp_size,
            type_flag(entry),
            method_name(entry),
            mtime_string(entry, options.decimal_time),
            entry.name
        ),
        Format::Verbose => {
            let long = format!(
                "{} {} {:>10} {} {} {} {}",
                perm_string(entry),
                made_by_version(entry),
                entry.uncomp_size,
                type_flag(entry),
                method_name(entry),
                mtime_string(entry, options.decimal_time),
                entry.name
            );
            format!(
                "{}\n  version needed {}  flags 0x{:04x}  method# {}  offset {}  comp/uncomp {}/{}  crc32 0x{:08x}\n  extra: {}",
                long,
                version_needed_display(entry),
                entry.flags,
                entry.method.to_wire(),
                entry.lho_offset,
                entry.comp_size,
                entry.uncomp_size,
                entry.crc32,
                hex_dump(&entry.extra),
            )
        }
    }
}

fn perm_string(entry: &Entry) -> String {
    let kind = if entry.is_directory() {
        'd'
    } else if entry.is_symlink() {
        'l'
    } else {
        '-'
    };
    let mode = entry.unix_mode().unwrap_or(0o644);
    let mut perms = String::with_capacity(10);
    perms.push(kind);
    for shift in [6, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        perms.push(if bits & 0b100 != 0 { 'r' } else { '-' });
        perms.push(if bits & 0b010 != 0 { 'w' } else { '-' });
        perms.push(if bits & 0b001 != 0 { 'x' } else { '-' });
    }
    perms
}

fn type_flag(entry: &Entry) -> char {
    if entry.is_directory() {
        'd'
    } else if entry.is_symlink() {
        'l'
    } else {
        '-'
    }
}

fn method_name(entry: &Entry) -> &'static str {
    match entry.method {
        crate::entry::Method::Store => "stor",
        crate::entry::Method::Deflate => "defN",
    }
}

/// "made by" version, rendered as `major.minor`; derived the same way the
/// writer decides `version_needed` since entries don't separately retain
/// the CDH's `version_made_by` byte once loaded.
fn made_by_version(entry: &Entry) -> String {
    let v = version_needed_raw(entry);
    format!("{}.{}", v / 10, v % 10)
}

fn version_needed_display(entry: &Entry) -> String {
    let v = version_needed_raw(entry);
    format!("{}.{}", v / 10, v % 10)
}

fn version_needed_raw(entry: &Entry) -> u16 {
    let needs_zip64 = entry.comp_size > u32::MAX as u64 || entry.uncomp_size > u32::MAX as u64;
    if needs_zip64 {
        45
    } else {
        match entry.method {
            crate::entry::Method::Store => 10,
            crate::entry::Method::Deflate => 20,
        }
    }
}

fn compression_ratio(uncomp: u64, comp: u64) -> i64 {
    if uncomp == 0 {
        return 0;
    }
    100 - (comp as i64 * 100) / uncomp as i64
}

fn civil_from_dos(entry: &Entry) -> (u16, u32, u32, u32, u32, u32) {
    let date = entry.mtime_dos.date;
    let time = entry.mtime_dos.time;
    let year = 1980 + (date >> 9);
    let month = ((date >> 5) & 0x0F) as u32;
    let day = (date & 0x1F) as u32;
    let hour = (time >> 11) as u32;
    let minute = ((time >> 5) & 0x3F) as u32;
    let second = ((time & 0x1F) * 2) as u32;
    (year, month, day, hour, minute, second)
}

fn mtime_string(entry: &Entry, decimal: bool) -> String {
    let (year, month, day, hour, minute, _second) = civil_from_dos(entry);
    if decimal {
        format!("{:02}{:02}{:02}.{:02}{:02}00", year % 100, month, day, hour, minute)
    } else {
        format!("{:04}-{:02}-{:02} {:02}:{:02}", year, month, day, hour, minute)
    }
}

fn hex_dump(data: &[u8]) -> String {
    if data.is_empty() {
        return "(none)".to_string();
    }
    data.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join(" ")
}
