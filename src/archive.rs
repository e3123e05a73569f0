//! The `Archive` model (spec §3) — an ordered list of entries plus derived
//! totals, with the invariant checks spec §3 requires to hold after every
//! operation.

use crate::entry::{Action, Entry};
use crate::error::{Error, Result};
use std::collections::HashSet;

/// An ordered sequence of entries plus archive-wide metadata.
pub struct Archive {
    pub entries: Vec<Entry>,
    pub comment: Vec<u8>,
}

impl Archive {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            comment: Vec::new(),
        }
    }

    pub fn total_entries(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.action != Action::Delete)
            .count()
    }

    /// True iff any of the ZIP64 trigger conditions in spec §3 hold.
    pub fn needs_zip64(&self) -> bool {
        if self.total_entries() >= 0xFFFF {
            return true;
        }
        self.entries.iter().any(|e| {
            e.action != Action::Delete
                && (e.comp_size >= u32::MAX as u64
                    || e.uncomp_size >= u32::MAX as u64
                    || e.lho_offset >= u32::MAX as u64)
        })
    }

    /// Checks the invariants spec §3 requires to hold. Returns the first
    /// violation found, if any, as an error describing it.
    pub fn check_invariants(&self) -> Result<()> {
        let mut seen_names: HashSet<&str> = HashSet::new();
        for entry in self.entries.iter().filter(|e| e.action != Action::Delete) {
            if !seen_names.insert(entry.name.as_str()) {
                return Err(Error::Usage(format!(
                    "duplicate entry name: {}",
                    entry.name
                )));
            }
        }
        Ok(())
    }

    /// Entry count as it will appear once deleted entries are dropped,
    /// which the lifecycle rule in spec §3 requires to happen before the
    /// writer runs.
    pub fn drop_deleted(&mut self) {
        self.entries.retain(|e| e.action != Action::Delete);
    }

    pub fn find(&self, name: &str) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|e| e.name == name && e.action != Action::Delete)
    }
}

impl Default for Archive {
    fn default() -> Self {
        Self::new()
    }
}
