// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::fetch::FetchError;
use move_web_manifest::{PackageName, ParseError};
use std::{io, path::PathBuf};
use thiserror::Error;

/// Why a package manifest could not be loaded.
#[derive(Debug, Error)]
pub enum ManifestLoadError {
    #[error("cannot read manifest: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Failures that abort a whole resolution. No partial result is ever returned alongside one.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Unable to load package at '{}': {source}", .path.display())]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: ManifestLoadError,
    },
    #[error("Cyclic dependency on package at '{}': {}", .path.display(), format_chain(.chain))]
    CyclicDependency { path: PathBuf, chain: Vec<PathBuf> },
    #[error("Unable to find package manifest in '{}' or in its parents", .0.display())]
    NoPackageRoot(PathBuf),
    #[error("Failed to fetch git dependency '{name}': {source}")]
    Fetch {
        name: PackageName,
        #[source]
        source: FetchError,
    },
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
