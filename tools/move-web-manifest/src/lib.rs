// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Typed representation of a `Move.toml` package manifest, together with the parser that
//! turns manifest text into a [`PackageManifest`].
//!
//! The parser is a pure transformation: it never touches the file system. Loading a manifest
//! from a package root is the job of the resolver, which owns the storage abstraction.

mod manifest;
mod parser;
#[cfg(test)]
mod tests;

pub use manifest::{
    Dependency, DependencyKind, PackageLocation, PackageManifest, PackageMetadata,
};
pub use parser::{parse_manifest, parse_move_manifest_string, parse_source_manifest, ParseError};

/// Name of a package, as used for keys in `[dependencies]` and `[dev-dependencies]`.
pub type PackageName = String;

/// A named address symbol, as used for keys in `[addresses]`.
pub type NamedAddress = String;

/// File name of the manifest at the root of every package.
pub const MANIFEST_FILE_NAME: &str = "Move.toml";
