//! Filesystem candidate collection (spec §1 ambient addition; see
//! SPEC_FULL.md §1)
//!
//! Stats the filesystem and hands the planner a flat list of candidates
//! with archive-relative names already computed; it does not evaluate
//! globs (that is `glob.rs`'s job) and does not itself decide add/replace/
//! delete (that is `planner.rs`'s job). Kept deliberately thin and
//! swappable: a CLI front end is free to build its own `FsCandidate` list
//! (say, from `-@`'s stdin name list) instead of calling this.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// One filesystem item eligible for inclusion in an archive.
#[derive(Debug, Clone)]
pub struct FsCandidate {
    /// Archive-relative name, forward-slash separated.
    pub name: String,
    pub source_path: PathBuf,
    pub mtime: SystemTime,
    pub size: u64,
    pub is_dir: bool,
}

/// Walks `root`, producing one candidate per file (and, if `recursive` is
/// true, per subdirectory too — the planner's `-D` rule decides whether
/// directory entries survive into the plan). Names are relative to
/// `root`'s parent, matching `zip -r archive dir` naming a `dir/...` entry
/// rather than dropping the leading directory component.
pub fn collect(root: &Path, recursive: bool) -> std::io::Result<Vec<FsCandidate>> {
    let base = root.parent().unwrap_or_else(|| Path::new(""));
    let mut out = Vec::new();

    if root.is_file() {
        let meta = fs::metadata(root)?;
        out.push(FsCandidate {
            name: archive_name(base, root),
            source_path: root.to_path_buf(),
            mtime: meta.modified()?,
            size: meta.len(),
            is_dir: false,
        });
        return Ok(out);
    }

    let walker = if recursive {
        WalkDir::new(root)
    } else {
        WalkDir::new(root).max_depth(1)
    };

    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if !recursive && entry.path() == root && entry.file_type().is_dir() {
            continue;
        }
        let meta = entry.metadata().map_err(std::io::Error::from)?;
        out.push(FsCandidate {
            name: archive_name(base, entry.path()),
            source_path: entry.path().to_path_buf(),
            mtime: meta.modified()?,
            size: meta.len(),
            is_dir: meta.is_dir(),
        });
    }
    Ok(out)
}

/// Builds the archive-relative, forward-slash name for `path` relative to
/// `base`, appending a trailing slash for directories.
fn archive_name(base: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    let mut name = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    if path.is_dir() && !name.ends_with('/') {
        name.push('/');
    }
    name
}

/// Strips any directory components, keeping only the basename — the `-j`
/// (junk paths) rule from spec §4.4.
pub fn junk_path(name: &str) -> String {
    name.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write as _;

    #[test]
    fn collects_recursive_tree_with_dir_entries() {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("dir");
        fs::create_dir_all(tree.join("sub")).unwrap();
        File::create(tree.join("c.txt")).unwrap().write_all(b"c").unwrap();
        File::create(tree.join("sub/d.txt")).unwrap().write_all(b"d").unwrap();

        let candidates = collect(&tree, true).unwrap();
        let mut names: Vec<_> = candidates.iter().map(|c| c.name.clone()).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "dir/".to_string(),
                "dir/c.txt".to_string(),
                "dir/sub/".to_string(),
                "dir/sub/d.txt".to_string(),
            ]
        );
    }

    #[test]
    fn non_recursive_excludes_root_itself() {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("dir");
        fs::create_dir_all(tree.join("sub")).unwrap();
        File::create(tree.join("c.txt")).unwrap().write_all(b"c").unwrap();

        let candidates = collect(&tree, false).unwrap();
        let names: Vec<_> = candidates.iter().map(|c| c.name.clone()).collect();
        assert!(!names.contains(&"dir/".to_string()));
    }

    #[test]
    fn non_recursive_stops_at_one_level() {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("dir");
        fs::create_dir_all(tree.join("sub")).unwrap();
        File::create(tree.join("c.txt")).unwrap().write_all(b"c").unwrap();
        File::create(tree.join("sub/d.txt")).unwrap().write_all(b"d").unwrap();

        let candidates = collect(&tree, false).unwrap();
        let names: Vec<_> = candidates.iter().map(|c| c.name.clone()).collect();
        assert!(names.contains(&"dir/c.txt".to_string()));
        assert!(!names.contains(&"dir/sub/d.txt".to_string()));
    }

    #[test]
    fn junk_path_keeps_only_basename() {
        assert_eq!(junk_path("dir/sub/c.txt"), "c.txt");
        assert_eq!(junk_path("dir/sub/"), "sub");
        assert_eq!(junk_path("c.txt"), "c.txt");
    }
}
