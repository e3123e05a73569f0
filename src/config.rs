//! Config/Session split (spec §9 "Context-as-god-object")
//!
//! The source threads one large state record through every function; here
//! it is split into an immutable `Config` built once (mirrors CLI flags at
//! the core's interface, see spec §6), a mutable `Session` holding open
//! handles/scratch buffers/warnings, and `Archive` (in `archive.rs`) owning
//! the entry list. Callers pass these explicitly.

use crate::io_buf::Scratch;
use crate::planner::Mode;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::SystemTime;

/// Line-ending translation applied before CRC/compression (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMode {
    None,
    LfToCrlf,
    CrlfToLf,
}

/// How an existing extraction target is handled (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwritePolicy {
    Never,
    Always,
    PromptNonInteractive,
}

/// Immutable configuration built once from CLI parsing (which this crate
/// does not perform; a front end fills this struct in).
#[derive(Debug, Clone)]
pub struct Config {
    pub level: i32,
    pub mode: Mode,
    pub recursive: bool,
    pub pattern_recursive: bool,
    pub junk_paths: bool,
    pub no_dir_entries: bool,
    pub store_symlinks: bool,
    pub move_after_success: bool,
    pub set_archive_mtime: bool,
    pub strip_extra_attrs: bool,
    pub no_compress_suffixes: Vec<String>,
    pub temp_dir: Option<PathBuf>,
    pub line_mode: LineMode,
    pub test_after_write: bool,
    pub filter_after: Option<SystemTime>,
    pub filter_before: Option<SystemTime>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub match_case: bool,
    pub sort_entries: bool,
    pub quiet: bool,
    /// Governs the streaming (`FromStdin`) write path only: when false, a
    /// spooled store fallback is used there if the compressed size would
    /// exceed the uncompressed size. The in-memory write path always runs
    /// this fallback, since it already holds the full payload (spec §4.5).
    pub fast_write: bool,
    pub fast_write_threshold: usize,
    pub overwrite: OverwritePolicy,
    pub target_dir: Option<PathBuf>,
    /// Recompute CRC for copy-through entries instead of trusting the
    /// source archive's central directory (spec §4.5 `test_integrity`).
    pub verify_copy_through_crc: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: 6,
            mode: Mode::Create,
            recursive: false,
            pattern_recursive: false,
            junk_paths: false,
            no_dir_entries: false,
            store_symlinks: false,
            move_after_success: false,
            set_archive_mtime: false,
            strip_extra_attrs: false,
            no_compress_suffixes: Vec::new(),
            temp_dir: None,
            line_mode: LineMode::None,
            test_after_write: false,
            filter_after: None,
            filter_before: None,
            include: Vec::new(),
            exclude: Vec::new(),
            match_case: true,
            sort_entries: false,
            quiet: false,
            fast_write: true,
            fast_write_threshold: 1024 * 1024,
            overwrite: OverwritePolicy::PromptNonInteractive,
            target_dir: None,
            verify_copy_through_crc: false,
        }
    }
}

/// Mutable per-run state: open handles live in the writer/reader that own
/// them, but scratch buffers and deduplicated warnings live here so they
/// survive across entries within one session.
pub struct Session {
    scratch_a: Scratch,
    scratch_b: Scratch,
    warnings_seen: HashSet<String>,
    cancel_requested: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            scratch_a: Scratch::new(),
            scratch_b: Scratch::new(),
            warnings_seen: HashSet::new(),
            cancel_requested: false,
        }
    }

    pub fn scratch_a(&mut self, min_size: usize) -> &mut [u8] {
        self.scratch_a.get(min_size)
    }

    pub fn scratch_b(&mut self, min_size: usize) -> &mut [u8] {
        self.scratch_b.get(min_size)
    }

    /// Emits a warning at most once per session (spec §7: "a warning seen
    /// once per session is printed at most once").
    pub fn warn_once(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.warnings_seen.insert(message.clone()) {
            log::warn!("{}", message);
        }
    }

    pub fn request_cancel(&mut self) {
        self.cancel_requested = true;
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
