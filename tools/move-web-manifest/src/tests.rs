// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{parse_manifest, Dependency, DependencyKind, PackageLocation, ParseError};
use std::path::Path;

const COUNTER_MANIFEST: &str = r#"
[package]
name = "MyCounter"
version = "0.0.1"
authors = ["alice", "bob"]

[addresses]
counter = "0x0"
std = "0x1"

[dependencies]
Sui = { local = "../framework/sui-framework" }
MoveStdlib = { git = "https://github.com/MystenLabs/sui.git", rev = "devnet" }

[dev-dependencies]
TestUtils = { local = "../test-utils" }
"#;

#[test]
fn parse_full_manifest() {
    let manifest = parse_manifest(COUNTER_MANIFEST).unwrap();

    assert_eq!(manifest.package.name, "MyCounter");
    assert_eq!(manifest.package.version, "0.0.1");
    assert_eq!(manifest.package.authors, vec!["alice", "bob"]);
    assert_eq!(manifest.package.license, None);

    assert_eq!(manifest.addresses.len(), 2);
    assert_eq!(manifest.addresses["counter"], "0x0");
    assert_eq!(manifest.addresses["std"], "0x1");

    assert_eq!(
        manifest.dependencies["Sui"],
        Dependency::local("../framework/sui-framework")
    );
    assert_eq!(
        manifest.dependencies["MoveStdlib"],
        Dependency::git(
            "https://github.com/MystenLabs/sui.git",
            Some("devnet".to_string())
        )
    );
    assert_eq!(
        manifest.dev_dependencies["TestUtils"].local_path(),
        Some(Path::new("../test-utils"))
    );
}

#[test]
fn dependencies_keep_declaration_order() {
    let manifest = parse_manifest(
        r#"
[package]
name = "Ordered"
version = "1.0.0"

[dev-dependencies]
Zeta = { local = "../zeta" }
Alpha = { local = "../alpha" }

[dependencies]
Omega = { local = "../omega" }
Beta = { local = "../beta" }
Delta = { local = "../delta" }
"#,
    )
    .unwrap();

    let order: Vec<_> = manifest
        .all_dependencies()
        .map(|(name, _, kind)| (name.as_str(), kind))
        .collect();
    assert_eq!(order, vec![
        ("Omega", DependencyKind::Regular),
        ("Beta", DependencyKind::Regular),
        ("Delta", DependencyKind::Regular),
        ("Zeta", DependencyKind::Dev),
        ("Alpha", DependencyKind::Dev),
    ]);
}

#[test]
fn addresses_keep_declaration_order() {
    let manifest = parse_manifest(
        r#"
[package]
name = "Ordered"
version = "1.0.0"

[addresses]
zed = "0x3"
alpha = "0x1"
mid = "0x2"
"#,
    )
    .unwrap();

    let symbols: Vec<_> = manifest.addresses.keys().map(String::as_str).collect();
    assert_eq!(symbols, vec!["zed", "alpha", "mid"]);
}

#[test]
fn missing_package_section_is_rejected() {
    let err = parse_manifest(
        r#"
[addresses]
std = "0x1"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::MissingField("package")));
}

#[test]
fn missing_version_is_rejected() {
    let err = parse_manifest(
        r#"
[package]
name = "NoVersion"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::MissingField("package.version")));
}

#[test]
fn empty_name_is_rejected() {
    let err = parse_manifest(
        r#"
[package]
name = ""
version = "0.1.0"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::MissingField("package.name")));
}

#[test]
fn invalid_toml_is_rejected() {
    let err = parse_manifest("[package\nname = ").unwrap_err();
    assert!(matches!(err, ParseError::Toml(_)));
}

#[test]
fn optional_sections_default_to_empty() {
    let manifest = parse_manifest(
        r#"
[package]
name = "Bare"
version = "0.1.0"
"#,
    )
    .unwrap();
    assert!(manifest.addresses.is_empty());
    assert!(manifest.has_no_dependencies());
}

#[test]
fn unknown_sections_are_ignored() {
    let manifest = parse_manifest(
        r#"
[package]
name = "Extra"
version = "0.1.0"

[build]
language_version = "2"

[dev-addresses]
std = "0x1"
"#,
    )
    .unwrap();
    assert_eq!(manifest.package.name, "Extra");
    assert!(manifest.addresses.is_empty());
}

#[test]
fn entry_without_location_is_kept() {
    let manifest = parse_manifest(
        r#"
[package]
name = "Aliased"
version = "0.1.0"

[dependencies]
Sui = {}
Framework = { version = "1.0.0" }
"#,
    )
    .unwrap();
    assert_eq!(
        manifest.dependencies["Sui"].location,
        PackageLocation::Unspecified
    );
    assert_eq!(
        manifest.dependencies["Framework"].location,
        PackageLocation::Unspecified
    );
}

#[test]
fn git_dependency_without_rev() {
    let manifest = parse_manifest(
        r#"
[package]
name = "Unpinned"
version = "0.1.0"

[dependencies]
Sui = { git = "https://github.com/MystenLabs/sui.git" }
"#,
    )
    .unwrap();
    assert!(manifest.dependencies["Sui"].is_git());
    assert_eq!(
        manifest.dependencies["Sui"],
        Dependency::git("https://github.com/MystenLabs/sui.git", None)
    );
}

#[test]
fn local_and_git_together_are_ambiguous() {
    let err = parse_manifest(
        r#"
[package]
name = "Confused"
version = "0.1.0"

[dev-dependencies]
Sui = { git = "https://github.com/MystenLabs/sui.git", local = "../sui" }
"#,
    )
    .unwrap_err();
    match err {
        ParseError::AmbiguousDependencyKind(name) => assert_eq!(name, "Sui"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn non_table_dependency_is_malformed() {
    let err = parse_manifest(
        r#"
[package]
name = "Versioned"
version = "0.1.0"

[dependencies]
Sui = "1.0.0"
"#,
    )
    .unwrap_err();
    match err {
        ParseError::MalformedEntry { section, key, .. } => {
            assert_eq!(section, "dependencies");
            assert_eq!(key, "Sui");
        },
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn non_string_dependency_field_is_malformed() {
    let err = parse_manifest(
        r#"
[package]
name = "Typed"
version = "0.1.0"

[dependencies]
Sui = { local = 42 }
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::MalformedEntry { .. }));
}

#[test]
fn non_string_address_is_malformed() {
    let err = parse_manifest(
        r#"
[package]
name = "Numbers"
version = "0.1.0"

[addresses]
std = 1
"#,
    )
    .unwrap_err();
    match err {
        ParseError::MalformedEntry { section, key, .. } => {
            assert_eq!(section, "addresses");
            assert_eq!(key, "std");
        },
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn manifest_serializes_dependencies_in_raw_form() {
    let manifest = parse_manifest(COUNTER_MANIFEST).unwrap();
    let json = serde_json::to_value(&manifest).unwrap();

    assert_eq!(
        json["dependencies"]["Sui"],
        serde_json::json!({ "local": "../framework/sui-framework" })
    );
    assert_eq!(
        json["dependencies"]["MoveStdlib"],
        serde_json::json!({ "git": "https://github.com/MystenLabs/sui.git", "rev": "devnet" })
    );
    assert_eq!(json["dev-dependencies"]["TestUtils"]["local"], "../test-utils");
}
