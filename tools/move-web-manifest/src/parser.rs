// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    manifest::{Dependency, PackageLocation, PackageManifest, PackageMetadata},
    NamedAddress, PackageName,
};
use indexmap::IndexMap;
use std::path::PathBuf;
use thiserror::Error;
use toml::{value::Table, Value};

const PACKAGE_SECTION: &str = "package";
const ADDRESSES_SECTION: &str = "addresses";
const DEPENDENCIES_SECTION: &str = "dependencies";
const DEV_DEPENDENCIES_SECTION: &str = "dev-dependencies";

const NAME_FIELD: &str = "name";
const VERSION_FIELD: &str = "version";
const AUTHORS_FIELD: &str = "authors";
const LICENSE_FIELD: &str = "license";

const LOCAL_FIELD: &str = "local";
const GIT_FIELD: &str = "git";
const REV_FIELD: &str = "rev";

/// Reasons a manifest can be rejected.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Missing required field `{0}`")]
    MissingField(&'static str),
    #[error("Malformed entry `{key}` in [{section}]: {reason}")]
    MalformedEntry {
        section: String,
        key: String,
        reason: String,
    },
    #[error("Dependency `{0}` cannot specify both a `local` and a `git` location")]
    AmbiguousDependencyKind(PackageName),
}

impl ParseError {
    fn malformed(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ParseError::MalformedEntry {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Parses manifest text into a generic TOML value, reporting syntax errors only.
pub fn parse_move_manifest_string(manifest_string: &str) -> Result<Value, ParseError> {
    Ok(toml::from_str::<Value>(manifest_string)?)
}

/// Parses manifest text all the way into a [`PackageManifest`].
pub fn parse_manifest(manifest_string: &str) -> Result<PackageManifest, ParseError> {
    parse_source_manifest(parse_move_manifest_string(manifest_string)?)
}

/// Converts an already parsed TOML document into a [`PackageManifest`].
///
/// `[package]` with a non-empty `name` and `version` is required. `[addresses]`,
/// `[dependencies]` and `[dev-dependencies]` are optional; any other section is ignored.
pub fn parse_source_manifest(value: Value) -> Result<PackageManifest, ParseError> {
    let table = match value {
        Value::Table(table) => table,
        _ => return Err(ParseError::MissingField(PACKAGE_SECTION)),
    };

    let package = match table.get(PACKAGE_SECTION) {
        Some(Value::Table(package)) => parse_package_metadata(package)?,
        Some(other) => {
            return Err(ParseError::malformed(
                PACKAGE_SECTION,
                PACKAGE_SECTION,
                format!("expected a table, found {}", other.type_str()),
            ));
        },
        None => return Err(ParseError::MissingField(PACKAGE_SECTION)),
    };

    let addresses = match section(&table, ADDRESSES_SECTION)? {
        Some(addresses) => parse_addresses(addresses)?,
        None => IndexMap::new(),
    };

    let dependencies = parse_dependencies(&table, DEPENDENCIES_SECTION)?;
    let dev_dependencies = parse_dependencies(&table, DEV_DEPENDENCIES_SECTION)?;

    Ok(PackageManifest {
        package,
        addresses,
        dependencies,
        dev_dependencies,
    })
}

fn section<'a>(table: &'a Table, name: &str) -> Result<Option<&'a Table>, ParseError> {
    match table.get(name) {
        None => Ok(None),
        Some(Value::Table(section)) => Ok(Some(section)),
        Some(other) => Err(ParseError::malformed(
            name,
            name,
            format!("expected a table, found {}", other.type_str()),
        )),
    }
}

fn parse_package_metadata(table: &Table) -> Result<PackageMetadata, ParseError> {
    let name = required_string(table, NAME_FIELD, "package.name")?;
    let version = required_string(table, VERSION_FIELD, "package.version")?;

    let authors: Vec<String> = match table.get(AUTHORS_FIELD) {
        None => vec![],
        Some(Value::Array(values)) => values
            .iter()
            .map(|value| {
                value.as_str().map(str::to_string).ok_or_else(|| {
                    ParseError::malformed(PACKAGE_SECTION, AUTHORS_FIELD, "authors must be strings")
                })
            })
            .collect::<Result<_, _>>()?,
        Some(other) => {
            return Err(ParseError::malformed(
                PACKAGE_SECTION,
                AUTHORS_FIELD,
                format!("expected an array, found {}", other.type_str()),
            ));
        },
    };

    let license = optional_string(table, PACKAGE_SECTION, LICENSE_FIELD)?;

    Ok(PackageMetadata {
        name,
        version,
        authors,
        license,
    })
}

fn required_string(table: &Table, key: &str, path: &'static str) -> Result<String, ParseError> {
    match table.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) | None => Err(ParseError::MissingField(path)),
        Some(other) => Err(ParseError::malformed(
            PACKAGE_SECTION,
            key,
            format!("expected a string, found {}", other.type_str()),
        )),
    }
}

fn optional_string(table: &Table, section: &str, key: &str) -> Result<Option<String>, ParseError> {
    match table.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ParseError::malformed(
            section,
            key,
            format!("expected a string, found {}", other.type_str()),
        )),
    }
}

fn parse_addresses(table: &Table) -> Result<IndexMap<NamedAddress, String>, ParseError> {
    table
        .iter()
        .map(|(symbol, value)| match value {
            Value::String(addr) => Ok((symbol.clone(), addr.clone())),
            other => Err(ParseError::malformed(
                ADDRESSES_SECTION,
                symbol,
                format!("expected an address string, found {}", other.type_str()),
            )),
        })
        .collect()
}

fn parse_dependencies(
    table: &Table,
    section_name: &str,
) -> Result<IndexMap<PackageName, Dependency>, ParseError> {
    let Some(entries) = section(table, section_name)? else {
        return Ok(IndexMap::new());
    };

    entries
        .iter()
        .map(|(name, value)| -> Result<_, ParseError> {
            let entry = value.as_table().ok_or_else(|| {
                ParseError::malformed(
                    section_name,
                    name,
                    format!("expected an inline table, found {}", value.type_str()),
                )
            })?;
            Ok((name.clone(), parse_dependency(section_name, name, entry)?))
        })
        .collect()
}

fn parse_dependency(section: &str, name: &str, entry: &Table) -> Result<Dependency, ParseError> {
    // Unknown fields are tolerated so that manifests written for richer tool chains still load.
    let field = |key: &str| match entry.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ParseError::malformed(
            section,
            name,
            format!("field `{}` must be a string, found {}", key, other.type_str()),
        )),
    };
    let local = field(LOCAL_FIELD)?.map(PathBuf::from);
    let git = field(GIT_FIELD)?;
    let rev = field(REV_FIELD)?;

    let location = match (local, git) {
        (Some(path), None) => PackageLocation::Local { path },
        (None, Some(url)) => PackageLocation::Git { url, rev },
        (None, None) => PackageLocation::Unspecified,
        (Some(_), Some(_)) => return Err(ParseError::AmbiguousDependencyKind(name.to_string())),
    };

    Ok(Dependency { location })
}
