//! The add/update/freshen/filesync/delete/copy planner (spec §4.4)

use crate::dostime::DosDateTime;
use crate::entry::{Action, Entry, Method, Origin};
use crate::error::{Error, Result};
use crate::fs_candidates::{junk_path, FsCandidate};
use crate::glob::{matches_any, Pattern};
use std::collections::HashSet;
use std::time::SystemTime;

/// Planner operating mode (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
    Freshen,
    Filesync,
    Delete,
    Copy,
}

/// Everything the planner needs besides the existing entry list and
/// filesystem candidates.
pub struct PlannerOptions {
    pub mode: Mode,
    pub include: Vec<Pattern>,
    pub exclude: Vec<Pattern>,
    pub match_case: bool,
    pub filter_after: Option<SystemTime>,
    pub filter_before: Option<SystemTime>,
    pub junk_paths: bool,
    pub no_dir_entries: bool,
    pub sort_entries: bool,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Create,
            include: Vec::new(),
            exclude: Vec::new(),
            match_case: true,
            filter_after: None,
            filter_before: None,
            junk_paths: false,
            no_dir_entries: false,
            sort_entries: false,
        }
    }
}

/// Runs the planner, producing the final ordered entry list with per-entry
/// actions decided. Never touches the disk; `candidates` is assumed
/// already collected (see `fs_candidates::collect`).
pub fn plan(existing: &[Entry], candidates: &[FsCandidate], opts: &PlannerOptions) -> Result<Vec<Entry>> {
    match opts.mode {
        Mode::Delete => Ok(plan_delete(existing, opts)),
        Mode::Copy => Ok(plan_copy(existing, opts)),
        _ => plan_fs_driven(existing, candidates, opts),
    }
}

fn name_matches_includes(name: &str, opts: &PlannerOptions) -> bool {
    opts.include.is_empty() || matches_any(&opts.include, name, opts.match_case)
}

fn name_matches_excludes(name: &str, opts: &PlannerOptions) -> bool {
    !opts.exclude.is_empty() && matches_any(&opts.exclude, name, opts.match_case)
}

fn plan_delete(existing: &[Entry], opts: &PlannerOptions) -> Vec<Entry> {
    existing
        .iter()
        .cloned()
        .map(|mut e| {
            if name_matches_includes(&e.name, opts) {
                e.action = Action::Delete;
            } else {
                e.action = Action::Keep;
            }
            e
        })
        .collect()
}

fn plan_copy(existing: &[Entry], opts: &PlannerOptions) -> Result<Vec<Entry>> {
    let mut result: Vec<Entry> = existing
        .iter()
        .filter(|e| name_matches_includes(&e.name, opts))
        .cloned()
        .map(|mut e| {
            e.action = Action::CopyThrough;
            e
        })
        .collect();
    if opts.sort_entries {
        result.sort_by(|a, b| a.name.cmp(&b.name));
    }
    Ok(result)
}

/// Prepared filesystem candidate: archive name resolved through junk-paths
/// and surviving include/exclude/time filtering.
struct Survivor<'a> {
    name: String,
    candidate: &'a FsCandidate,
}

fn surviving_candidates<'a>(candidates: &'a [FsCandidate], opts: &PlannerOptions) -> Vec<Survivor<'a>> {
    let mut out = Vec::new();
    for c in candidates {
        let name = if opts.junk_paths {
            let stripped = junk_path(&c.name);
            if c.is_dir {
                format!("{}/", stripped)
            } else {
                stripped
            }
        } else {
            c.name.clone()
        };

        if !name_matches_includes(&name, opts) {
            continue;
        }
        if name_matches_excludes(&name, opts) {
            continue;
        }
        if let Some(after) = opts.filter_after {
            if c.mtime <= after {
                continue;
            }
        }
        if let Some(before) = opts.filter_before {
            if c.mtime >= before {
                continue;
            }
        }
        if opts.no_dir_entries && name.ends_with('/') {
            continue;
        }
        out.push(Survivor { name, candidate: c });
    }
    out
}

fn new_entry_from_candidate(name: String, candidate: &FsCandidate, action: Action) -> Entry {
    Entry {
        name,
        method: Method::Deflate,
        flags: 0,
        crc32: 0,
        comp_size: 0,
        uncomp_size: candidate.size,
        mtime_dos: DosDateTime::from_system_time(candidate.mtime),
        external_attrs: 0,
        extra: Vec::new(),
        comment: Vec::new(),
        lho_offset: 0,
        origin: Origin::FromDisk(candidate.source_path.clone()),
        action,
    }
}

fn plan_fs_driven(existing: &[Entry], candidates: &[FsCandidate], opts: &PlannerOptions) -> Result<Vec<Entry>> {
    let survivors = surviving_candidates(candidates, opts);
    let mut result: Vec<Entry> = existing.iter().cloned().collect();
    let mut touched = false;

    for survivor in &survivors {
        let existing_idx = result
            .iter()
            .position(|e| e.name == survivor.name && e.action != Action::Delete);

        match (opts.mode, existing_idx) {
            (Mode::Create | Mode::Filesync, Some(idx)) => {
                result[idx] = new_entry_from_candidate(survivor.name.clone(), survivor.candidate, Action::Replace);
                touched = true;
            }
            (Mode::Create | Mode::Filesync, None) => {
                result.push(new_entry_from_candidate(
                    survivor.name.clone(),
                    survivor.candidate,
                    Action::Add,
                ));
                touched = true;
            }
            (Mode::Update, Some(idx)) => {
                if survivor.candidate.mtime > result[idx].mtime_dos.to_system_time() {
                    result[idx] =
                        new_entry_from_candidate(survivor.name.clone(), survivor.candidate, Action::Replace);
                    touched = true;
                }
            }
            (Mode::Update, None) => {
                result.push(new_entry_from_candidate(
                    survivor.name.clone(),
                    survivor.candidate,
                    Action::Add,
                ));
                touched = true;
            }
            (Mode::Freshen, Some(idx)) => {
                if survivor.candidate.mtime > result[idx].mtime_dos.to_system_time() {
                    result[idx] =
                        new_entry_from_candidate(survivor.name.clone(), survivor.candidate, Action::Replace);
                    touched = true;
                }
            }
            (Mode::Freshen, None) => {
                // freshen never adds
            }
            (Mode::Delete | Mode::Copy, _) => unreachable!("handled by plan()"),
        }
    }

    if opts.mode == Mode::Filesync {
        let survivor_names: HashSet<&str> = survivors.iter().map(|s| s.name.as_str()).collect();
        for e in result.iter_mut() {
            if e.action == Action::Delete {
                continue;
            }
            if !survivor_names.contains(e.name.as_str()) {
                e.action = Action::Delete;
                touched = true;
            }
        }
    }

    if opts.mode == Mode::Update && !touched {
        return Err(Error::NothingToDo);
    }

    if opts.sort_entries {
        result.sort_by(|a, b| a.name.cmp(&b.name));
    }

    Ok(result)
}
