// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::paths::normalize_path;
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

/// Kind of a directory entry as reported by [`Storage::list_directory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// The entry was listed but its metadata could not be read, e.g. a dangling symlink.
    Unreadable(String),
}

/// A single entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// File-system-like accessor used to load manifests and enumerate sources.
///
/// Implementations must support nested directories. They are used from a single thread per
/// resolution; sharing one across threads is up to the implementation.
pub trait Storage {
    /// Reads the whole file at `path`.
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Lists the entries of the directory at `path`. Failing to read the directory itself is an
    /// error; failing to inspect an individual entry is reported as [`EntryKind::Unreadable`].
    fn list_directory(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    fn exists(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self.read_file(path)?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl<S: Storage + ?Sized> Storage for &S {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        (**self).read_file(path)
    }

    fn list_directory(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        (**self).list_directory(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }
}

/// [`Storage`] backed by the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskStorage;

impl Storage for DiskStorage {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn list_directory(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = vec![];
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // `fs::metadata` follows symlinks, so a dangling link surfaces here.
            let kind = match fs::metadata(entry.path()) {
                Ok(metadata) if metadata.is_dir() => EntryKind::Directory,
                Ok(_) => EntryKind::File,
                Err(e) => EntryKind::Unreadable(e.to_string()),
            };
            entries.push(DirEntry { name, kind });
        }
        Ok(entries)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Directory,
    Broken(String),
}

/// In-memory [`Storage`], mainly for tests and for hosts that materialize packages without a
/// real file system. Paths are normalized on insertion and lookup.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    nodes: BTreeMap<PathBuf, Node>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, creating all missing parent directories.
    pub fn add_file(&mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> &mut Self {
        let path = normalize_path(path.as_ref());
        self.add_parents(&path);
        self.nodes.insert(path, Node::File(contents.into()));
        self
    }

    /// Adds an empty directory, creating all missing parent directories.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) -> &mut Self {
        let path = normalize_path(path.as_ref());
        self.add_parents(&path);
        self.nodes.insert(path, Node::Directory);
        self
    }

    /// Adds an entry that shows up in its parent's listing but cannot be inspected or read.
    pub fn add_broken(&mut self, path: impl AsRef<Path>, reason: impl Into<String>) -> &mut Self {
        let path = normalize_path(path.as_ref());
        self.add_parents(&path);
        self.nodes.insert(path, Node::Broken(reason.into()));
        self
    }

    fn add_parents(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.nodes
                .entry(ancestor.to_path_buf())
                .or_insert(Node::Directory);
        }
    }

    fn node(&self, path: &Path) -> Option<&Node> {
        self.nodes.get(&normalize_path(path))
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file or directory: {}", path.display()),
    )
}

impl Storage for InMemoryStorage {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        match self.node(path) {
            Some(Node::File(contents)) => Ok(contents.clone()),
            Some(Node::Directory) => Err(io::Error::other(format!(
                "is a directory: {}",
                path.display()
            ))),
            Some(Node::Broken(reason)) => Err(io::Error::other(reason.clone())),
            None => Err(not_found(path)),
        }
    }

    fn list_directory(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let dir = normalize_path(path);
        match self.nodes.get(&dir) {
            Some(Node::Directory) => {},
            Some(Node::File(_)) => {
                return Err(io::Error::other(format!(
                    "not a directory: {}",
                    path.display()
                )));
            },
            Some(Node::Broken(reason)) => return Err(io::Error::other(reason.clone())),
            None => return Err(not_found(path)),
        }

        let entries = self
            .nodes
            .iter()
            .filter(|(child, _)| child.parent() == Some(dir.as_path()))
            .filter_map(|(child, node)| {
                let name = child.file_name()?.to_string_lossy().into_owned();
                let kind = match node {
                    Node::File(_) => EntryKind::File,
                    Node::Directory => EntryKind::Directory,
                    Node::Broken(reason) => EntryKind::Unreadable(reason.clone()),
                };
                Some(DirEntry { name, kind })
            })
            .collect();
        Ok(entries)
    }

    fn exists(&self, path: &Path) -> bool {
        matches!(self.node(path), Some(Node::File(_)) | Some(Node::Directory))
    }
}
