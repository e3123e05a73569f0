//! The reader/extractor: loads the central directory, then lazily
//! re-reads each entry's LFH at extract time (spec §4.6).
//!
//! Finds the EOCD, walks the CDH sequence via the `records.rs` codec, and
//! adds the extract policies (overwrite, target directory containment,
//! symlinks, pipe mode, test mode) on top.

use crate::codec;
use crate::config::{Config, OverwritePolicy, Session};
use crate::entry::{normalize_name, Action, Entry, Method, Origin};
use crate::error::{Error, Result};
use crate::io_buf::InputStream;
use crate::records::{find_eocd, find_zip64_eocd, CentralDirectoryHeader, Eocd, LocalFileHeader};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// A loaded archive: the central directory entries plus enough of the
/// EOCD to reconstruct it on a later rewrite.
pub struct Reader {
    input: InputStream,
    pub entries: Vec<Entry>,
    pub archive_comment: Vec<u8>,
}

/// Outcome of extracting (or testing) one entry, for progress reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    Written(PathBuf),
    SkippedExists(PathBuf),
    SymlinkCreated(PathBuf),
}

impl Reader {
    /// Opens `path`, locates the EOCD (and ZIP64 EOCD if present), and
    /// reads the full central directory into an `Entry` list.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut input = InputStream::open(path)?;
        let eocd_offset = find_eocd(&mut input)?;
        let zip64 = find_zip64_eocd(&mut input, eocd_offset)?;
        let eocd = Eocd::read_at(&mut input, eocd_offset)?;

        let (total_entries, cd_offset) = match &zip64 {
            Some(z) => (z.total_entries, z.cd_offset),
            None => (eocd.total_entries, eocd.cd_offset),
        };

        input.seek(cd_offset)?;
        let mut entries = Vec::with_capacity(total_entries as usize);
        for _ in 0..total_entries {
            let cdh = CentralDirectoryHeader::read(&mut input)?;
            entries.push(entry_from_cdh(cdh)?);
        }

        Ok(Self {
            input,
            entries,
            archive_comment: eocd.comment,
        })
    }

    /// Validates cross-entry invariants (duplicate names, unsafe names)
    /// once the central directory is fully loaded.
    pub fn check_invariants(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for entry in &self.entries {
            if normalize_name(&entry.name).is_none() {
                return Err(Error::NameUnsafe(entry.name.clone()));
            }
            if !seen.insert(entry.name.clone()) {
                return Err(Error::Usage(format!("duplicate entry name: {}", entry.name)));
            }
        }
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Converts every non-deleted entry into a copy-through `Entry` whose
    /// `Origin::FromArchive` points back into this reader's file, ready
    /// to be spliced into a new plan by the writer.
    pub fn entries_for_copy_through(&self) -> Vec<Entry> {
        self.entries
            .iter()
            .map(|e| {
                let mut copy = e.clone();
                copy.action = Action::Keep;
                copy
            })
            .collect()
    }

    /// Returns a fresh `InputStream` handle positioned for the writer's
    /// copy-through reads (the writer needs an exclusive `&mut` handle,
    /// separate from whatever the reader used to load the directory).
    pub fn reopen_input(&self, path: impl AsRef<Path>) -> Result<InputStream> {
        InputStream::open(path)
    }

    /// Decompresses one entry's payload fully into memory, verifying CRC.
    pub fn read_entry(&mut self, entry: &Entry) -> Result<Vec<u8>> {
        let payload = self.read_entry_compressed(entry)?;
        let data = match entry.method {
            Method::Store => payload,
            Method::Deflate => codec::inflate_buffer(&payload)?,
        };
        if crate::crc::crc32(&data) != entry.crc32 {
            return Err(Error::BadCrc {
                name: entry.name.clone(),
            });
        }
        Ok(data)
    }

    /// Reads the raw (still-compressed) payload bytes for `entry`,
    /// re-reading its LFH first since the LFH's own `extra` length is the
    /// authoritative payload offset, not the CDH's (spec §4.6).
    fn read_entry_compressed(&mut self, entry: &Entry) -> Result<Vec<u8>> {
        let Origin::FromArchive { offset, comp_size } = entry.origin else {
            return Err(Error::Usage(
                "read_entry requires an entry loaded from an archive".into(),
            ));
        };
        self.input.seek(offset)?;
        let lfh = LocalFileHeader::read(&mut self.input)?;
        let payload_offset = offset + 30 + lfh.name.len() as u64 + lfh.extra.len() as u64;
        self.input.seek(payload_offset)?;
        self.input.read_exact(comp_size as usize)
    }

    /// Verifies one entry's CRC without writing it anywhere (`-t` test
    /// mode); returns `Ok(())` on a match.
    pub fn test_entry(&mut self, entry: &Entry) -> Result<()> {
        self.read_entry(entry).map(|_| ())
    }

    /// Decompresses `entry` straight to `out` (`-p` pipe mode): no
    /// filesystem writes, no progress output.
    pub fn pipe_entry(&mut self, entry: &Entry, out: &mut dyn Write) -> Result<()> {
        let data = self.read_entry(entry)?;
        out.write_all(&data)?;
        Ok(())
    }

    /// Extracts `entry` to disk under `config.target_dir` (or cwd),
    /// honoring the overwrite policy, target-directory containment, and
    /// symlink handling of spec §4.6.
    pub fn extract_entry(
        &mut self,
        entry: &Entry,
        config: &Config,
        session: &mut Session,
    ) -> Result<ExtractOutcome> {
        let name = if config.junk_paths {
            crate::fs_candidates::junk_path(&entry.name)
        } else {
            entry.name.clone()
        };
        let normalized = normalize_name(&name).ok_or_else(|| Error::NameUnsafe(name.clone()))?;

        let root = config
            .target_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let dest = root.join(&normalized);

        let canonical_root = root.canonicalize().unwrap_or(root.clone());
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if let Ok(canonical_dest_parent) = dest
            .parent()
            .unwrap_or(Path::new("."))
            .canonicalize()
        {
            if !canonical_dest_parent.starts_with(&canonical_root) {
                return Err(Error::NameUnsafe(entry.name.clone()));
            }
        }

        if entry.is_directory() {
            std::fs::create_dir_all(&dest)?;
            return Ok(ExtractOutcome::Written(dest));
        }

        if dest.exists() {
            match config.overwrite {
                OverwritePolicy::Never => {
                    session.warn_once(format!("skipping existing file: {}", dest.display()));
                    return Ok(ExtractOutcome::SkippedExists(dest));
                }
                OverwritePolicy::PromptNonInteractive => {
                    return Err(Error::FileExists(dest.display().to_string()));
                }
                OverwritePolicy::Always => {}
            }
        }

        if config.store_symlinks && entry.is_symlink() {
            let target = self.read_entry(entry)?;
            let target_str = String::from_utf8_lossy(&target).into_owned();
            create_symlink(&target_str, &dest)?;
            return Ok(ExtractOutcome::SymlinkCreated(dest));
        }

        let data = self.read_entry(entry)?;
        std::fs::write(&dest, &data)?;
        if let Some(mode) = entry.unix_mode() {
            set_unix_mode(&dest, mode);
        }
        Ok(ExtractOutcome::Written(dest))
    }
}

#[cfg(unix)]
fn create_symlink(target: &str, dest: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, dest)?;
    Ok(())
}

/// Non-unix targets have no portable symlink syscall; `store_symlinks` is
/// accepted but treated as a no-op capability flag, writing the entry's
/// content as a regular file instead.
#[cfg(not(unix))]
fn create_symlink(target: &str, dest: &Path) -> Result<()> {
    std::fs::write(dest, target.as_bytes())?;
    Ok(())
}

#[cfg(unix)]
fn set_unix_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode));
}

#[cfg(not(unix))]
fn set_unix_mode(_path: &Path, _mode: u32) {}

fn entry_from_cdh(cdh: CentralDirectoryHeader) -> Result<Entry> {
    let name = String::from_utf8_lossy(&cdh.name).into_owned();
    let method = Method::from_wire(cdh.method).ok_or(Error::UnsupportedMethod(cdh.method))?;
    if cdh.flags & crate::entry::FLAG_ENCRYPTED != 0 {
        return Err(Error::UnsupportedEncryption);
    }
    Ok(Entry {
        name,
        method,
        flags: cdh.flags,
        crc32: cdh.crc32,
        comp_size: cdh.comp_size,
        uncomp_size: cdh.uncomp_size,
        mtime_dos: crate::dostime::DosDateTime {
            time: cdh.mod_time,
            date: cdh.mod_date,
        },
        external_attrs: cdh.external_attrs,
        extra: cdh.extra,
        comment: cdh.comment,
        lho_offset: cdh.lho_offset,
        origin: Origin::FromArchive {
            offset: cdh.lho_offset,
            comp_size: cdh.comp_size,
        },
        action: Action::Keep,
    })
}
