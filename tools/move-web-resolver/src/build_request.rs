// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    addresses::AddressTable,
    resolver::ResolvedPackageSet,
    sources::{list_source_files, SkippedEntry},
    storage::Storage,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// The flattened input of one compiler invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildRequest {
    /// Source files of every dependency, in resolution order.
    pub dependency_source_files: Vec<PathBuf>,
    /// `symbol:address` pairs, in address table order.
    pub address_args: Vec<String>,
    pub test_mode: bool,
    /// Empty if the package has no initializer.
    pub init_function: String,
    /// Entries the source enumeration could not read. Not passed to the compiler.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_entries: Vec<SkippedEntry>,
}

/// Assembles a [`BuildRequest`] from a resolved dependency closure.
///
/// The sources of each package in `resolved` are enumerated and concatenated in the set's
/// iteration order. No check is made that `addresses` covers the symbols the sources use.
pub fn build_request<S: Storage + ?Sized>(
    resolved: &ResolvedPackageSet,
    addresses: &AddressTable,
    test_mode: bool,
    init_function: Option<&str>,
    storage: &S,
) -> BuildRequest {
    let mut request = BuildRequest {
        test_mode,
        init_function: init_function.unwrap_or_default().to_string(),
        address_args: addresses
            .to_address_args()
            .iter()
            .map(ToString::to_string)
            .collect(),
        ..BuildRequest::default()
    };

    for package in resolved.iter() {
        let listing = list_source_files(package, storage);
        request.dependency_source_files.extend(listing.files);
        request.skipped_entries.extend(listing.skipped);
    }

    info!(
        "Build request: {} dependency sources from {} packages, {} named addresses",
        request.dependency_source_files.len(),
        resolved.len(),
        request.address_args.len()
    );
    request
}

impl BuildRequest {
    /// Comma separated dependency source files, as `--dependency_dirs` expects them.
    pub fn dependency_dirs_arg(&self) -> String {
        self.dependency_source_files
            .iter()
            .map(|path| path.to_string_lossy())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Comma separated `symbol:address` pairs, as `--address_maps` expects them.
    pub fn address_maps_arg(&self) -> String {
        self.address_args.join(",")
    }

    /// Argument list of the compiler's `build` command.
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "build".to_string(),
            "--dependency_dirs".to_string(),
            self.dependency_dirs_arg(),
            "--address_maps".to_string(),
            self.address_maps_arg(),
            "--test".to_string(),
            self.test_mode.to_string(),
            "--init_function".to_string(),
            self.init_function.clone(),
        ]
    }
}
