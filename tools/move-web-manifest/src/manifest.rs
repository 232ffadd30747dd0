// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{NamedAddress, PackageName};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

/***************************************************************************************************
 * Manifest Definition
 *
 **************************************************************************************************/
/// Represents the parsed contents of a `Move.toml` manifest file.
///
/// All maps keep the order in which entries were declared in the manifest. The resolver relies
/// on that order: it decides which package gets visited first and therefore which binding wins
/// when two packages declare the same address symbol.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize)]
pub struct PackageManifest {
    /// Metadata about the package itself, such as package name etc.
    pub package: PackageMetadata,

    /// Named address bindings declared by the package.
    pub addresses: IndexMap<NamedAddress, String>,

    /// Regular (non-dev) package dependencies.
    pub dependencies: IndexMap<PackageName, Dependency>,

    /// Dev-only package dependencies.
    #[serde(rename = "dev-dependencies")]
    pub dev_dependencies: IndexMap<PackageName, Dependency>,
}

/// Metadata defined in the `[package]` section of `Move.toml`.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize)]
pub struct PackageMetadata {
    /// Name of the Move package. Never empty.
    pub name: PackageName,

    /// Version of the package. Never empty.
    pub version: String,

    /// List of authors.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,

    /// Optional license string for the package.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

/// Represents a dependency entry in `[dependencies]` or `[dev-dependencies]`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Dependency {
    /// Location of the dependency: local, git, or none at all.
    pub location: PackageLocation,
}

/// Location of a package dependency.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PackageLocation {
    /// Refers to a package stored in the local file system, relative to the declaring package.
    Local { path: PathBuf },

    /// Refers to a package stored in a git repository.
    Git {
        /// URL of the Git repository.
        url: String,
        /// Optional Git revision to pin the dependency to.
        /// This can be a commit hash, a branch name or a tag name.
        rev: Option<String>,
    },

    /// The entry names neither `local` nor `git`.
    ///
    /// Such an entry is only useful together with an alias override supplied by the caller,
    /// which substitutes an already materialized package for it.
    Unspecified,
}

/// Which section of the manifest a dependency was declared in.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    Regular,
    Dev,
}

impl PackageManifest {
    /// Iterates over `[dependencies]` followed by `[dev-dependencies]`, each in declaration order.
    pub fn all_dependencies(
        &self,
    ) -> impl Iterator<Item = (&PackageName, &Dependency, DependencyKind)> + '_ {
        self.dependencies
            .iter()
            .map(|(name, dep)| (name, dep, DependencyKind::Regular))
            .chain(
                self.dev_dependencies
                    .iter()
                    .map(|(name, dep)| (name, dep, DependencyKind::Dev)),
            )
    }

    /// Returns true if the package declares neither regular nor dev dependencies.
    pub fn has_no_dependencies(&self) -> bool {
        self.dependencies.is_empty() && self.dev_dependencies.is_empty()
    }
}

impl Dependency {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            location: PackageLocation::Local { path: path.into() },
        }
    }

    pub fn git(url: impl Into<String>, rev: Option<String>) -> Self {
        Self {
            location: PackageLocation::Git {
                url: url.into(),
                rev,
            },
        }
    }

    /// The relative path of a local dependency.
    pub fn local_path(&self) -> Option<&Path> {
        match &self.location {
            PackageLocation::Local { path } => Some(path),
            _ => None,
        }
    }

    pub fn is_git(&self) -> bool {
        matches!(self.location, PackageLocation::Git { .. })
    }
}

/***************************************************************************************************
 * Custom Serializer Implementations
 *
 **************************************************************************************************/
#[derive(Debug, Default, Serialize)]
pub(crate) struct RawDependency {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) local: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) git: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) rev: Option<String>,
}

impl Dependency {
    fn to_raw(&self) -> RawDependency {
        match &self.location {
            PackageLocation::Local { path } => RawDependency {
                local: Some(path.clone()),
                ..Default::default()
            },
            PackageLocation::Git { url, rev } => RawDependency {
                git: Some(url.clone()),
                rev: rev.clone(),
                ..Default::default()
            },
            PackageLocation::Unspecified => RawDependency::default(),
        }
    }
}

impl Serialize for Dependency {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_raw().serialize(serializer)
    }
}
