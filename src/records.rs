//! Binary record codec (spec §4.3)
//!
//! Encode/decode for the five ZIP records plus the ZIP64 extensions: Local
//! File Header (LFH), Data Descriptor, Central Directory Header (CDH),
//! End-of-Central-Directory (EOCD), and ZIP64 EOCD + Locator. Factored into
//! reusable structs so the archive model and writer/reader don't duplicate
//! the field layout or the ZIP64-extra-field promotion rules.

use crate::error::{Error, Result};
use crate::io_buf::{InputStream, OutputStream};

pub const SIG_LFH: u32 = 0x0403_4b50;
pub const SIG_DATA_DESCRIPTOR: u32 = 0x0807_4b50;
pub const SIG_CDH: u32 = 0x0201_4b50;
pub const SIG_EOCD: u32 = 0x0605_4b50;
pub const SIG_ZIP64_EOCD: u32 = 0x0606_4b50;
pub const SIG_ZIP64_LOCATOR: u32 = 0x0706_4b50;

pub const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Flag bit 3: sizes/CRC are carried in a trailing data descriptor instead
/// of the local file header.
pub const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;
/// Flag bit 11: name/comment are UTF-8 (Info-ZIP "language encoding flag").
pub const FLAG_UTF8_NAME: u16 = 1 << 11;
/// Flag bit 0: entry is encrypted (traditional crypto or AE-x).
pub const FLAG_ENCRYPTED: u16 = 1 << 0;

const ZIP64_SENTINEL_32: u32 = 0xFFFF_FFFF;
const ZIP64_SENTINEL_16: u16 = 0xFFFF;

/// A single TLV record parsed out of an extra field.
#[derive(Debug, Clone)]
pub struct ExtraField {
    pub id: u16,
    pub data: Vec<u8>,
}

/// Walks a raw extra-field byte blob into its `(id, size, data)` records.
/// Truncated trailing bytes are reported as `BadExtra` rather than silently
/// dropped, since a short TLV means the blob itself is corrupt.
pub fn parse_extra(blob: &[u8]) -> Result<Vec<ExtraField>> {
    let mut fields = Vec::new();
    let mut i = 0usize;
    while i < blob.len() {
        if i + 4 > blob.len() {
            return Err(Error::BadExtra("truncated TLV header".into()));
        }
        let id = u16::from_le_bytes([blob[i], blob[i + 1]]);
        let size = u16::from_le_bytes([blob[i + 2], blob[i + 3]]) as usize;
        i += 4;
        if i + size > blob.len() {
            return Err(Error::BadExtra("TLV data length exceeds extra field".into()));
        }
        fields.push(ExtraField {
            id,
            data: blob[i..i + size].to_vec(),
        });
        i += size;
    }
    Ok(fields)
}

/// Serializes TLV records back into a raw extra-field blob.
pub fn write_extra(fields: &[ExtraField]) -> Vec<u8> {
    let mut out = Vec::new();
    for f in fields {
        out.extend_from_slice(&f.id.to_le_bytes());
        out.extend_from_slice(&(f.data.len() as u16).to_le_bytes());
        out.extend_from_slice(&f.data);
    }
    out
}

/// The three fields the ZIP64 extra field (id 0x0001) can promote, read in
/// the fixed field order: uncompressed size, compressed size, offset, disk
/// start — and only the ones whose classic-field value is the placeholder
/// sentinel.
#[derive(Debug, Clone, Copy, Default)]
pub struct Zip64Promoted {
    pub uncomp_size: Option<u64>,
    pub comp_size: Option<u64>,
    pub lho_offset: Option<u64>,
    pub disk_start: Option<u32>,
}

/// Resolves ZIP64-promoted fields given the classic 32/16-bit field values
/// and the entry's raw extra-field blob.
pub fn resolve_zip64(
    extra: &[u8],
    comp_size_32: u32,
    uncomp_size_32: u32,
    offset_32: u32,
    disk_16: u16,
) -> Result<Zip64Promoted> {
    let needs_any = comp_size_32 == ZIP64_SENTINEL_32
        || uncomp_size_32 == ZIP64_SENTINEL_32
        || offset_32 == ZIP64_SENTINEL_32
        || disk_16 == ZIP64_SENTINEL_16;
    let mut promoted = Zip64Promoted::default();
    if !needs_any {
        return Ok(promoted);
    }
    let fields = parse_extra(extra)?;
    let Some(z) = fields.iter().find(|f| f.id == ZIP64_EXTRA_ID) else {
        return Ok(promoted);
    };
    let mut cursor = 0usize;
    let take_u64 = |data: &[u8], cursor: &mut usize| -> Option<u64> {
        if *cursor + 8 <= data.len() {
            let v = u64::from_le_bytes(data[*cursor..*cursor + 8].try_into().unwrap());
            *cursor += 8;
            Some(v)
        } else {
            None
        }
    };
    if uncomp_size_32 == ZIP64_SENTINEL_32 {
        promoted.uncomp_size = take_u64(&z.data, &mut cursor);
    }
    if comp_size_32 == ZIP64_SENTINEL_32 {
        promoted.comp_size = take_u64(&z.data, &mut cursor);
    }
    if offset_32 == ZIP64_SENTINEL_32 {
        promoted.lho_offset = take_u64(&z.data, &mut cursor);
    }
    if disk_16 == ZIP64_SENTINEL_16 && cursor + 4 <= z.data.len() {
        promoted.disk_start = Some(u32::from_le_bytes(
            z.data[cursor..cursor + 4].try_into().unwrap(),
        ));
    }
    Ok(promoted)
}

/// Builds a ZIP64 extra field containing only the fields that actually need
/// promotion, in the fixed order the format requires.
pub fn build_zip64_extra(uncomp_size: Option<u64>, comp_size: Option<u64>, lho_offset: Option<u64>) -> Option<ExtraField> {
    let mut data = Vec::new();
    if let Some(v) = uncomp_size {
        data.extend_from_slice(&v.to_le_bytes());
    }
    if let Some(v) = comp_size {
        data.extend_from_slice(&v.to_le_bytes());
    }
    if let Some(v) = lho_offset {
        data.extend_from_slice(&v.to_le_bytes());
    }
    if data.is_empty() {
        None
    } else {
        Some(ExtraField {
            id: ZIP64_EXTRA_ID,
            data,
        })
    }
}

/// Local File Header.
#[derive(Debug, Clone)]
pub struct LocalFileHeader {
    pub version_needed: u16,
    pub flags: u16,
    pub method: u16,
    pub mod_time: u16,
    pub mod_date: u16,
    pub crc32: u32,
    pub comp_size: u64,
    pub uncomp_size: u64,
    pub name: Vec<u8>,
    pub extra: Vec<u8>,
}

impl LocalFileHeader {
    pub fn read(input: &mut InputStream) -> Result<Self> {
        let sig = input.read_u32()?;
        if sig != SIG_LFH {
            return Err(Error::BadSignature {
                expected: SIG_LFH,
                found: sig,
            });
        }
        let version_needed = input.read_u16()?;
        let flags = input.read_u16()?;
        let method = input.read_u16()?;
        let mod_time = input.read_u16()?;
        let mod_date = input.read_u16()?;
        let crc32 = input.read_u32()?;
        let comp_size_32 = input.read_u32()?;
        let uncomp_size_32 = input.read_u32()?;
        let name_len = input.read_u16()? as usize;
        let extra_len = input.read_u16()? as usize;
        let name = input.read_exact(name_len)?;
        let extra = input.read_exact(extra_len)?;

        let promoted = resolve_zip64(&extra, comp_size_32, uncomp_size_32, 0, 0)?;
        Ok(Self {
            version_needed,
            flags,
            method,
            mod_time,
            mod_date,
            crc32,
            comp_size: promoted.comp_size.unwrap_or(comp_size_32 as u64),
            uncomp_size: promoted.uncomp_size.unwrap_or(uncomp_size_32 as u64),
            name,
            extra,
        })
    }

    /// Writes the header. If `comp_size`/`uncomp_size` are `None` the sizes
    /// are unknown at write time (streaming) and zero placeholders are
    /// emitted with flag bit 3 set by the caller beforehand.
    pub fn write(&self, output: &mut OutputStream) -> Result<()> {
        output.write_u32(SIG_LFH)?;
        output.write_u16(self.version_needed)?;
        output.write_u16(self.flags)?;
        output.write_u16(self.method)?;
        output.write_u16(self.mod_time)?;
        output.write_u16(self.mod_date)?;
        output.write_u32(self.crc32)?;
        let needs_zip64 = self.comp_size > u32::MAX as u64 || self.uncomp_size > u32::MAX as u64;
        if needs_zip64 {
            output.write_u32(ZIP64_SENTINEL_32)?;
            output.write_u32(ZIP64_SENTINEL_32)?;
        } else {
            output.write_u32(self.comp_size as u32)?;
            output.write_u32(self.uncomp_size as u32)?;
        }
        output.write_u16(self.name.len() as u16)?;
        let mut extra = self.extra.clone();
        if needs_zip64 {
            if let Some(z) = build_zip64_extra(Some(self.uncomp_size), Some(self.comp_size), None) {
                extra.extend_from_slice(&write_extra(&[z]));
            }
        }
        output.write_u16(extra.len() as u16)?;
        output.write(&self.name)?;
        output.write(&extra)?;
        Ok(())
    }
}

/// Optional trailer carrying CRC/sizes when they were unknown at LFH time.
#[derive(Debug, Clone)]
pub struct DataDescriptor {
    pub crc32: u32,
    pub comp_size: u64,
    pub uncomp_size: u64,
}

impl DataDescriptor {
    /// Writes the descriptor, 24 bytes (+ signature) if either size needs
    /// 64 bits, else the classic 12-byte (+ signature) form.
    pub fn write(&self, output: &mut OutputStream) -> Result<()> {
        output.write_u32(SIG_DATA_DESCRIPTOR)?;
        output.write_u32(self.crc32)?;
        if self.comp_size > u32::MAX as u64 || self.uncomp_size > u32::MAX as u64 {
            output.write_u64(self.comp_size)?;
            output.write_u64(self.uncomp_size)?;
        } else {
            output.write_u32(self.comp_size as u32)?;
            output.write_u32(self.uncomp_size as u32)?;
        }
        Ok(())
    }

    /// Reads a data descriptor, given whether the caller knows sizes are
    /// 64-bit wide (ZIP64 entry). The leading signature is optional per
    /// APPNOTE but Info-ZIP always writes it, so it is required here.
    pub fn read(input: &mut InputStream, sizes_are_64bit: bool) -> Result<Self> {
        let sig = input.read_u32()?;
        if sig != SIG_DATA_DESCRIPTOR {
            return Err(Error::BadSignature {
                expected: SIG_DATA_DESCRIPTOR,
                found: sig,
            });
        }
        let crc32 = input.read_u32()?;
        let (comp_size, uncomp_size) = if sizes_are_64bit {
            (input.read_u64()?, input.read_u64()?)
        } else {
            (input.read_u32()? as u64, input.read_u32()? as u64)
        };
        Ok(Self {
            crc32,
            comp_size,
            uncomp_size,
        })
    }
}

/// Central Directory Header.
#[derive(Debug, Clone)]
pub struct CentralDirectoryHeader {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub method: u16,
    pub mod_time: u16,
    pub mod_date: u16,
    pub crc32: u32,
    pub comp_size: u64,
    pub uncomp_size: u64,
    pub disk_start: u32,
    pub internal_attrs: u16,
    pub external_attrs: u32,
    pub lho_offset: u64,
    pub name: Vec<u8>,
    pub extra: Vec<u8>,
    pub comment: Vec<u8>,
}

impl CentralDirectoryHeader {
    pub fn read(input: &mut InputStream) -> Result<Self> {
        let sig = input.read_u32()?;
        if sig != SIG_CDH {
            return Err(Error::BadSignature {
                expected: SIG_CDH,
                found: sig,
            });
        }
        let version_made_by = input.read_u16()?;
        let version_needed = input.read_u16()?;
        let flags = input.read_u16()?;
        let method = input.read_u16()?;
        let mod_time = input.read_u16()?;
        let mod_date = input.read_u16()?;
        let crc32 = input.read_u32()?;
        let comp_size_32 = input.read_u32()?;
        let uncomp_size_32 = input.read_u32()?;
        let name_len = input.read_u16()? as usize;
        let extra_len = input.read_u16()? as usize;
        let comment_len = input.read_u16()? as usize;
        let disk_start_16 = input.read_u16()?;
        let internal_attrs = input.read_u16()?;
        let external_attrs = input.read_u32()?;
        let offset_32 = input.read_u32()?;
        let name = input.read_exact(name_len)?;
        let extra = input.read_exact(extra_len)?;
        let comment = input.read_exact(comment_len)?;

        let promoted = resolve_zip64(
            &extra,
            comp_size_32,
            uncomp_size_32,
            offset_32,
            disk_start_16,
        )?;

        Ok(Self {
            version_made_by,
            version_needed,
            flags,
            method,
            mod_time,
            mod_date,
            crc32,
            comp_size: promoted.comp_size.unwrap_or(comp_size_32 as u64),
            uncomp_size: promoted.uncomp_size.unwrap_or(uncomp_size_32 as u64),
            disk_start: promoted.disk_start.unwrap_or(disk_start_16 as u32),
            internal_attrs,
            external_attrs,
            lho_offset: promoted.lho_offset.unwrap_or(offset_32 as u64),
            name,
            extra,
            comment,
        })
    }

    pub fn write(&self, output: &mut OutputStream) -> Result<()> {
        output.write_u32(SIG_CDH)?;
        output.write_u16(self.version_made_by)?;
        output.write_u16(self.version_needed)?;
        output.write_u16(self.flags)?;
        output.write_u16(self.method)?;
        output.write_u16(self.mod_time)?;
        output.write_u16(self.mod_date)?;
        output.write_u32(self.crc32)?;

        let comp_over = self.comp_size > u32::MAX as u64;
        let uncomp_over = self.uncomp_size > u32::MAX as u64;
        let offset_over = self.lho_offset > u32::MAX as u64;

        output.write_u32(if comp_over {
            ZIP64_SENTINEL_32
        } else {
            self.comp_size as u32
        })?;
        output.write_u32(if uncomp_over {
            ZIP64_SENTINEL_32
        } else {
            self.uncomp_size as u32
        })?;
        output.write_u16(self.name.len() as u16)?;

        let mut extra = self.extra.clone();
        if comp_over || uncomp_over || offset_over {
            if let Some(z) = build_zip64_extra(
                uncomp_over.then_some(self.uncomp_size),
                comp_over.then_some(self.comp_size),
                offset_over.then_some(self.lho_offset),
            ) {
                extra.extend_from_slice(&write_extra(&[z]));
            }
        }

        output.write_u16(extra.len() as u16)?;
        output.write_u16(self.comment.len() as u16)?;
        output.write_u16(self.disk_start as u16)?;
        output.write_u16(self.internal_attrs)?;
        output.write_u32(self.external_attrs)?;
        output.write_u32(if offset_over {
            ZIP64_SENTINEL_32
        } else {
            self.lho_offset as u32
        })?;
        output.write(&self.name)?;
        output.write(&extra)?;
        output.write(&self.comment)?;
        Ok(())
    }
}

/// End of Central Directory Record.
#[derive(Debug, Clone)]
pub struct Eocd {
    pub disk_number: u16,
    pub cd_disk: u16,
    pub entries_this_disk: u64,
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
    pub comment: Vec<u8>,
}

impl Eocd {
    pub fn write(&self, output: &mut OutputStream) -> Result<()> {
        output.write_u32(SIG_EOCD)?;
        output.write_u16(self.disk_number)?;
        output.write_u16(self.cd_disk)?;
        let entries_over = self.total_entries > u16::MAX as u64;
        output.write_u16(if entries_over {
            ZIP64_SENTINEL_16
        } else {
            self.entries_this_disk as u16
        })?;
        output.write_u16(if entries_over {
            ZIP64_SENTINEL_16
        } else {
            self.total_entries as u16
        })?;
        let size_over = self.cd_size > u32::MAX as u64;
        let off_over = self.cd_offset > u32::MAX as u64;
        output.write_u32(if size_over {
            ZIP64_SENTINEL_32
        } else {
            self.cd_size as u32
        })?;
        output.write_u32(if off_over {
            ZIP64_SENTINEL_32
        } else {
            self.cd_offset as u32
        })?;
        output.write_u16(self.comment.len() as u16)?;
        output.write(&self.comment)?;
        Ok(())
    }

    pub fn read_at(input: &mut InputStream, offset: u64) -> Result<Self> {
        input.seek(offset)?;
        let sig = input.read_u32()?;
        if sig != SIG_EOCD {
            return Err(Error::BadSignature {
                expected: SIG_EOCD,
                found: sig,
            });
        }
        let disk_number = input.read_u16()?;
        let cd_disk = input.read_u16()?;
        let entries_this_disk = input.read_u16()? as u64;
        let total_entries = input.read_u16()? as u64;
        let cd_size = input.read_u32()? as u64;
        let cd_offset = input.read_u32()? as u64;
        let comment_len = input.read_u16()? as usize;
        let comment = input.read_exact(comment_len)?;
        if disk_number != 0 || cd_disk != 0 {
            return Err(Error::MultiDisk);
        }
        Ok(Self {
            disk_number,
            cd_disk,
            entries_this_disk,
            total_entries,
            cd_size,
            cd_offset,
            comment,
        })
    }
}

/// ZIP64 End of Central Directory Record.
#[derive(Debug, Clone)]
pub struct Zip64Eocd {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub disk_number: u32,
    pub cd_disk: u32,
    pub entries_this_disk: u64,
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64Eocd {
    /// Fixed-size payload following the 12-byte signature+size header:
    /// version made by(2) + version needed(2) + disk(4) + cd_disk(4) +
    /// entries_this_disk(8) + total_entries(8) + cd_size(8) + cd_offset(8).
    const RECORD_SIZE: u64 = 2 + 2 + 4 + 4 + 8 + 8 + 8 + 8;

    pub fn write(&self, output: &mut OutputStream) -> Result<()> {
        output.write_u32(SIG_ZIP64_EOCD)?;
        output.write_u64(Self::RECORD_SIZE)?;
        output.write_u16(self.version_made_by)?;
        output.write_u16(self.version_needed)?;
        output.write_u32(self.disk_number)?;
        output.write_u32(self.cd_disk)?;
        output.write_u64(self.entries_this_disk)?;
        output.write_u64(self.total_entries)?;
        output.write_u64(self.cd_size)?;
        output.write_u64(self.cd_offset)?;
        Ok(())
    }

    pub fn read_at(input: &mut InputStream, offset: u64) -> Result<Self> {
        input.seek(offset)?;
        let sig = input.read_u32()?;
        if sig != SIG_ZIP64_EOCD {
            return Err(Error::BadSignature {
                expected: SIG_ZIP64_EOCD,
                found: sig,
            });
        }
        let _size = input.read_u64()?;
        let version_made_by = input.read_u16()?;
        let version_needed = input.read_u16()?;
        let disk_number = input.read_u32()?;
        let cd_disk = input.read_u32()?;
        let entries_this_disk = input.read_u64()?;
        let total_entries = input.read_u64()?;
        let cd_size = input.read_u64()?;
        let cd_offset = input.read_u64()?;
        Ok(Self {
            version_made_by,
            version_needed,
            disk_number,
            cd_disk,
            entries_this_disk,
            total_entries,
            cd_size,
            cd_offset,
        })
    }
}

/// ZIP64 End of Central Directory Locator.
#[derive(Debug, Clone)]
pub struct Zip64Locator {
    pub disk_with_zip64_eocd: u32,
    pub zip64_eocd_offset: u64,
    pub total_disks: u32,
}

impl Zip64Locator {
    pub fn write(&self, output: &mut OutputStream) -> Result<()> {
        output.write_u32(SIG_ZIP64_LOCATOR)?;
        output.write_u32(self.disk_with_zip64_eocd)?;
        output.write_u64(self.zip64_eocd_offset)?;
        output.write_u32(self.total_disks)?;
        Ok(())
    }

    pub fn read_at(input: &mut InputStream, offset: u64) -> Result<Self> {
        input.seek(offset)?;
        let sig = input.read_u32()?;
        if sig != SIG_ZIP64_LOCATOR {
            return Err(Error::BadSignature {
                expected: SIG_ZIP64_LOCATOR,
                found: sig,
            });
        }
        let disk_with_zip64_eocd = input.read_u32()?;
        let zip64_eocd_offset = input.read_u64()?;
        let total_disks = input.read_u32()?;
        Ok(Self {
            disk_with_zip64_eocd,
            zip64_eocd_offset,
            total_disks,
        })
    }
}

/// Scans backward from end-of-file over the last `min(65557, file_size)`
/// bytes for the EOCD signature, per spec §4.3/§9. Returns the absolute
/// offset of the EOCD record.
pub fn find_eocd(input: &mut InputStream) -> Result<u64> {
    let file_size = input.len()?;
    const MAX_COMMENT: u64 = 65535;
    const EOCD_MIN: u64 = 22;
    let window = (MAX_COMMENT + EOCD_MIN).min(file_size);
    let search_start = file_size - window;
    input.seek(search_start)?;
    let buffer = input.read_exact(window as usize)?;

    for i in (0..buffer.len().saturating_sub(3)).rev() {
        if buffer[i] == 0x50 && buffer[i + 1] == 0x4b && buffer[i + 2] == 0x05 && buffer[i + 3] == 0x06
        {
            return Ok(search_start + i as u64);
        }
    }
    Err(Error::NotAnArchive)
}

/// Given an EOCD offset, probes for a ZIP64 locator immediately preceding
/// it and, if present and valid, returns the resolved ZIP64 EOCD record.
pub fn find_zip64_eocd(input: &mut InputStream, eocd_offset: u64) -> Result<Option<Zip64Eocd>> {
    if eocd_offset < 20 {
        return Ok(None);
    }
    let locator_offset = eocd_offset - 20;
    let saved = input.tell()?;
    input.seek(locator_offset)?;
    let sig = input.read_u32()?;
    if sig != SIG_ZIP64_LOCATOR {
        input.seek(saved)?;
        return Ok(None);
    }
    let locator = Zip64Locator::read_at(input, locator_offset)?;
    if locator.total_disks > 1 || locator.disk_with_zip64_eocd != 0 {
        return Err(Error::MultiDisk);
    }
    let record = Zip64Eocd::read_at(input, locator.zip64_eocd_offset)?;
    Ok(Some(record))
}
