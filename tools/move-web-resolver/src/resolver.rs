// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    addresses::{AddressArg, AddressTable},
    error::{ManifestLoadError, ResolutionError},
    graph::{self, GraphBuilder, ResolutionGraph},
    paths::{absolute_path, normalize_path},
    storage::Storage,
};
use indexmap::IndexSet;
use move_web_manifest::{
    parse_manifest, PackageLocation, PackageManifest, PackageName, MANIFEST_FILE_NAME,
};
use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// Caller supplied substitutions of dependency names by already materialized package roots.
///
/// Overrides only apply to the dependencies of the package they are handed to, never
/// transitively.
pub type AliasOverrides = BTreeMap<PackageName, PathBuf>;

/// The deduplicated set of dependency package roots, in the order they were first visited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedPackageSet(IndexSet<PathBuf>);

impl ResolvedPackageSet {
    pub fn contains(&self, path: &Path) -> bool {
        self.0.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.0.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn insert(&mut self, path: PathBuf) -> bool {
        self.0.insert(path)
    }
}

impl IntoIterator for ResolvedPackageSet {
    type IntoIter = indexmap::set::IntoIter<PathBuf>;
    type Item = PathBuf;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Everything a single traversal of the dependency closure produces.
#[derive(Debug)]
pub struct Resolution {
    pub root_path: PathBuf,
    pub root_manifest: PackageManifest,
    pub packages: ResolvedPackageSet,
    pub addresses: AddressTable,
    pub graph: ResolutionGraph,
}

/// Reads and parses `<package_root>/Move.toml`.
pub fn load_manifest<S: Storage + ?Sized>(
    storage: &S,
    package_root: &Path,
) -> Result<PackageManifest, ResolutionError> {
    let load = || -> Result<PackageManifest, ManifestLoadError> {
        let contents = storage.read_to_string(&package_root.join(MANIFEST_FILE_NAME))?;
        Ok(parse_manifest(&contents)?)
    };
    load().map_err(|source| ResolutionError::ManifestUnreadable {
        path: package_root.to_path_buf(),
        source,
    })
}

/// Walks up from `start` to the first directory containing a `Move.toml`. Relative paths are
/// taken against the current directory.
pub fn find_package_root<S: Storage + ?Sized>(
    storage: &S,
    start: &Path,
) -> Result<PathBuf, ResolutionError> {
    let start = absolute_path(start);
    match start
        .ancestors()
        .find(|dir| storage.exists(&dir.join(MANIFEST_FILE_NAME)))
    {
        Some(root) => Ok(root.to_path_buf()),
        None => Err(ResolutionError::NoPackageRoot(start)),
    }
}

/// Discovers the transitive dependency closure of a package.
///
/// Dependencies are visited depth-first: `[dependencies]` before `[dev-dependencies]`, entries
/// in declaration order, each package before its own dependencies. For every entry an alias
/// override takes precedence over the entry's own location; local paths are resolved against
/// the declaring package's root; git entries without an override contribute nothing, since
/// fetching them is up to the caller (see [`crate::prefetch_git_dependencies`]).
///
/// Relative root paths and alias overrides are taken against the current directory, so every
/// package root in the results is absolute.
///
/// A package reappearing on the current traversal path is a [`ResolutionError::CyclicDependency`].
/// A package reached again through another path (a diamond) is not walked twice; its subtree has
/// already contributed everything it can.
pub struct DependencyResolver<'s, S: ?Sized> {
    storage: &'s S,
    additional_named_addresses: Vec<AddressArg>,
}

impl<'s, S: Storage + ?Sized> DependencyResolver<'s, S> {
    pub fn new(storage: &'s S) -> Self {
        Self {
            storage,
            additional_named_addresses: vec![],
        }
    }

    /// Addresses bound ahead of everything else, including the root package's own bindings.
    pub fn with_additional_named_addresses(mut self, addresses: Vec<AddressArg>) -> Self {
        self.additional_named_addresses = addresses;
        self
    }

    pub fn load_manifest(&self, package_root: &Path) -> Result<PackageManifest, ResolutionError> {
        load_manifest(self.storage, package_root)
    }

    /// Returns the set of dependency package roots. The root itself is never included.
    pub fn resolve(
        &self,
        root_manifest: &PackageManifest,
        root_path: &Path,
        aliases: &AliasOverrides,
    ) -> Result<ResolvedPackageSet, ResolutionError> {
        Ok(self.traverse(root_manifest, root_path, aliases)?.packages)
    }

    /// Returns the root's named addresses merged with those of every dependency.
    pub fn collect_addresses(
        &self,
        root_manifest: &PackageManifest,
        root_path: &Path,
        aliases: &AliasOverrides,
    ) -> Result<AddressTable, ResolutionError> {
        Ok(self.traverse(root_manifest, root_path, aliases)?.addresses)
    }

    /// Loads the manifest at `root_path` and resolves its whole closure in one traversal.
    pub fn resolve_package(
        &self,
        root_path: &Path,
        aliases: &AliasOverrides,
    ) -> Result<Resolution, ResolutionError> {
        let root_manifest = self.load_manifest(root_path)?;
        self.resolve_all(root_manifest, root_path, aliases)
    }

    /// Resolves the closure of an already loaded root manifest, keeping every product.
    pub fn resolve_all(
        &self,
        root_manifest: PackageManifest,
        root_path: &Path,
        aliases: &AliasOverrides,
    ) -> Result<Resolution, ResolutionError> {
        let root_path = absolute_path(root_path);
        let outcome = self.traverse(&root_manifest, &root_path, aliases)?;
        Ok(Resolution {
            root_path,
            root_manifest,
            packages: outcome.packages,
            addresses: outcome.addresses,
            graph: outcome.graph.finish(),
        })
    }

    fn traverse(
        &self,
        root_manifest: &PackageManifest,
        root_path: &Path,
        aliases: &AliasOverrides,
    ) -> Result<Outcome, ResolutionError> {
        let root_path = absolute_path(root_path);
        let root_name = &root_manifest.package.name;

        let mut outcome = Outcome::default();
        for arg in &self.additional_named_addresses {
            outcome
                .addresses
                .bind(&arg.symbol, &arg.address, "<command line>");
        }
        for (symbol, address) in &root_manifest.addresses {
            outcome.addresses.bind(symbol, address, root_name);
        }
        outcome.graph.add_package(root_name, &root_path);

        let mut traversal = Traversal {
            visiting: vec![root_path.clone()],
            completed: BTreeSet::new(),
            outcome,
        };
        self.walk(&mut traversal, root_manifest, &root_path, aliases)?;
        Ok(traversal.outcome)
    }

    fn walk(
        &self,
        traversal: &mut Traversal,
        manifest: &PackageManifest,
        package_root: &Path,
        aliases: &AliasOverrides,
    ) -> Result<(), ResolutionError> {
        for (name, dep, kind) in manifest.all_dependencies() {
            let (dep_path, aliased) = match aliases.get(name) {
                Some(alias) => (absolute_path(alias), true),
                None => match &dep.location {
                    PackageLocation::Local { path } => {
                        (normalize_path(&package_root.join(path)), false)
                    },
                    PackageLocation::Git { url, .. } => {
                        debug!(
                            "Skipping git dependency '{}' ({}) of '{}': not fetched",
                            name, url, manifest.package.name
                        );
                        continue;
                    },
                    PackageLocation::Unspecified => {
                        warn!(
                            "Dependency '{}' of '{}' has no location and no alias override",
                            name, manifest.package.name
                        );
                        continue;
                    },
                },
            };

            if traversal.visiting.contains(&dep_path) {
                let mut chain = traversal.visiting.clone();
                chain.push(dep_path.clone());
                return Err(ResolutionError::CyclicDependency {
                    path: dep_path,
                    chain,
                });
            }

            let edge = graph::Dependency {
                name: name.clone(),
                kind,
                aliased,
            };
            if traversal.completed.contains(&dep_path) {
                traversal
                    .outcome
                    .graph
                    .add_dependency(package_root, &dep_path, edge);
                continue;
            }

            let dep_manifest = self.load_manifest(&dep_path)?;
            debug!(
                "Visiting '{}' at '{}' (dependency '{}' of '{}')",
                dep_manifest.package.name,
                dep_path.display(),
                name,
                manifest.package.name
            );
            traversal.visit(package_root, &dep_path, &dep_manifest, edge);

            traversal.visiting.push(dep_path.clone());
            self.walk(traversal, &dep_manifest, &dep_path, &AliasOverrides::new())?;
            traversal.visiting.pop();
            traversal.completed.insert(dep_path);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Outcome {
    packages: ResolvedPackageSet,
    addresses: AddressTable,
    graph: GraphBuilder,
}

/// Traversal state, owned by the top-level call and threaded through every frame by exclusive
/// borrow.
struct Traversal {
    /// Packages on the current path from the root, root first.
    visiting: Vec<PathBuf>,
    /// Packages whose whole subtree has been walked.
    completed: BTreeSet<PathBuf>,
    outcome: Outcome,
}

impl Traversal {
    fn visit(
        &mut self,
        parent: &Path,
        path: &Path,
        manifest: &PackageManifest,
        edge: graph::Dependency,
    ) {
        let outcome = &mut self.outcome;
        outcome.packages.insert(path.to_path_buf());
        for (symbol, address) in &manifest.addresses {
            outcome
                .addresses
                .bind(symbol, address, &manifest.package.name);
        }
        outcome.graph.add_package(&manifest.package.name, path);
        outcome.graph.add_dependency(parent, path, edge);
    }
}
