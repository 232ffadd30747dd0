// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Resolution of a Move package's dependency closure.
//!
//! Starting from a root manifest, the resolver follows local-path and aliased dependencies
//! depth-first, left to right, dependencies before dev-dependencies. The traversal produces:
//!
//! - the [`ResolvedPackageSet`]: every dependency package root, deduplicated, root excluded;
//! - the [`AddressTable`]: every package's named addresses merged first-writer-wins;
//! - the [`ResolutionGraph`]: packages and the dependency edges between them.
//!
//! [`build_request`] then flattens the dependencies' source files and the address table into the
//! argument shape the external compiler expects.

mod addresses;
mod build_request;
mod config;
mod error;
mod fetch;
mod graph;
mod paths;
mod resolver;
mod sources;
mod storage;

pub use addresses::{AddressArg, AddressArgError, AddressBinding, AddressConflict, AddressTable};
pub use build_request::{build_request, BuildRequest};
pub use config::{AliasArg, AliasArgError, BuildConfig};
pub use error::{ManifestLoadError, ResolutionError};
pub use fetch::{git_repo_dir_name, move_home, prefetch_git_dependencies, FetchError, Fetcher};
pub use graph::{graph_to_mermaid, Dependency, Package, ResolutionGraph};
pub use paths::{absolute_path, normalize_path};
pub use resolver::{
    find_package_root, load_manifest, AliasOverrides, DependencyResolver, ResolvedPackageSet,
    Resolution,
};
pub use sources::{list_source_files, SkippedEntry, SourceListing, SOURCE_EXTENSION};
pub use storage::{DirEntry, DiskStorage, EntryKind, InMemoryStorage, Storage};
