// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::storage::{EntryKind, Storage};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extension of Move source files.
pub const SOURCE_EXTENSION: &str = "move";

/// An entry left out of a [`SourceListing`] because storage could not read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of enumerating the sources under a package root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceListing {
    pub files: Vec<PathBuf>,
    /// Entries that could not be read. The listing is incomplete if this is non-empty.
    pub skipped: Vec<SkippedEntry>,
}

/// Recursively lists every `.move` file under `path`, depth-first, with the entries of each
/// directory visited in name order.
///
/// Unreadable entries never abort the enumeration: they are left out and recorded in
/// [`SourceListing::skipped`], so a partially materialized package still yields what is there.
pub fn list_source_files<S: Storage + ?Sized>(path: &Path, storage: &S) -> SourceListing {
    let mut listing = SourceListing::default();
    collect_source_files(path, storage, &mut listing);
    if !listing.skipped.is_empty() {
        warn!(
            "Skipped {} unreadable entries while listing sources under '{}'",
            listing.skipped.len(),
            path.display()
        );
    }
    listing
}

fn collect_source_files<S: Storage + ?Sized>(dir: &Path, storage: &S, listing: &mut SourceListing) {
    let mut entries = match storage.list_directory(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Skipping unreadable directory '{}': {}", dir.display(), e);
            listing.skipped.push(SkippedEntry {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            });
            return;
        },
    };
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    for entry in entries {
        let path = dir.join(&entry.name);
        match entry.kind {
            EntryKind::Directory => collect_source_files(&path, storage, listing),
            EntryKind::File => {
                if is_source_file(&path) {
                    listing.files.push(path);
                }
            },
            EntryKind::Unreadable(reason) => {
                debug!("Skipping unreadable entry '{}': {}", path.display(), reason);
                listing.skipped.push(SkippedEntry { path, reason });
            },
        }
    }
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension == SOURCE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;

    #[test]
    fn only_move_files_are_listed() {
        let mut storage = InMemoryStorage::new();
        storage
            .add_file("/pkg/x.move", "")
            .add_file("/pkg/x.txt", "")
            .add_file("/pkg/z/y.move", "");

        let listing = list_source_files(Path::new("/pkg"), &storage);
        assert_eq!(listing.files, vec![
            PathBuf::from("/pkg/x.move"),
            PathBuf::from("/pkg/z/y.move"),
        ]);
        assert!(listing.skipped.is_empty());
    }

    #[test]
    fn nested_directories_are_walked_depth_first() {
        let mut storage = InMemoryStorage::new();
        storage
            .add_file("/pkg/sources/b.move", "")
            .add_file("/pkg/sources/a/inner.move", "")
            .add_file("/pkg/Move.toml", "")
            .add_dir("/pkg/build")
            .add_file("/pkg/tests/t.move", "");

        let listing = list_source_files(Path::new("/pkg"), &storage);
        assert_eq!(listing.files, vec![
            PathBuf::from("/pkg/sources/a/inner.move"),
            PathBuf::from("/pkg/sources/b.move"),
            PathBuf::from("/pkg/tests/t.move"),
        ]);
    }

    #[test]
    fn unreadable_entries_are_skipped_and_reported() {
        let mut storage = InMemoryStorage::new();
        storage
            .add_file("/pkg/sources/a.move", "")
            .add_broken("/pkg/sources/broken.move", "dangling symlink")
            .add_file("/pkg/sources/c.move", "");

        let listing = list_source_files(Path::new("/pkg"), &storage);
        assert_eq!(listing.files, vec![
            PathBuf::from("/pkg/sources/a.move"),
            PathBuf::from("/pkg/sources/c.move"),
        ]);
        assert_eq!(listing.skipped, vec![SkippedEntry {
            path: PathBuf::from("/pkg/sources/broken.move"),
            reason: "dangling symlink".to_string(),
        }]);
    }

    #[test]
    fn missing_root_yields_empty_listing() {
        let storage = InMemoryStorage::new();
        let listing = list_source_files(Path::new("/nowhere"), &storage);
        assert!(listing.files.is_empty());
        assert_eq!(listing.skipped.len(), 1);
        assert_eq!(listing.skipped[0].path, PathBuf::from("/nowhere"));
    }
}
