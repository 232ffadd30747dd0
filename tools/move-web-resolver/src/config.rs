// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    addresses::AddressArg,
    build_request::{build_request, BuildRequest},
    error::ResolutionError,
    fetch::{prefetch_git_dependencies, Fetcher},
    resolver::{find_package_root, load_manifest, AliasOverrides, DependencyResolver, Resolution},
    storage::Storage,
};
use clap::Args;
use move_web_manifest::PackageName;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Args, Clone, Serialize, Deserialize, Eq, PartialEq, Default)]
pub struct BuildConfig {
    /// Compile in 'test' mode
    #[clap(name = "test-mode", long = "test", global = true)]
    pub test_mode: bool,

    /// Fully qualified function the package runs on publish, e.g. `0x0::counter::init`
    #[clap(long = "init-function", global = true)]
    pub init_function: Option<String>,

    /// Use the package at PATH for dependency NAME, regardless of what the manifest says.
    /// Only applies to the root package's own dependencies
    #[clap(long = "alias", value_name = "NAME=PATH", global = true)]
    pub aliases: Vec<AliasArg>,

    /// Named address bound ahead of every package's own addresses
    #[clap(long = "named-address", value_name = "SYMBOL:ADDR", global = true)]
    pub additional_named_addresses: Vec<AddressArg>,

    /// Skip fetching git dependencies. They are left unresolved unless aliased
    #[clap(long = "skip-fetch-git-deps", global = true)]
    pub skip_fetch_git_deps: bool,
}

impl BuildConfig {
    pub fn alias_overrides(&self) -> AliasOverrides {
        self.aliases
            .iter()
            .map(|alias| (alias.name.clone(), alias.path.clone()))
            .collect()
    }

    /// Resolves the package at `path` or the package containing it.
    ///
    /// Root-level git dependencies are fetched through `fetcher` first, unless fetching is
    /// disabled or no fetcher is given.
    pub fn resolve_package<S: Storage + ?Sized>(
        &self,
        path: &Path,
        storage: &S,
        fetcher: Option<&dyn Fetcher>,
    ) -> Result<Resolution, ResolutionError> {
        let root = find_package_root(storage, path)?;
        let manifest = load_manifest(storage, &root)?;
        info!(
            "Resolving dependencies of '{}' at '{}'",
            manifest.package.name,
            root.display()
        );

        let mut aliases = self.alias_overrides();
        if let Some(fetcher) = fetcher.filter(|_| !self.skip_fetch_git_deps) {
            aliases = prefetch_git_dependencies(&manifest, &aliases, fetcher)?;
        }

        DependencyResolver::new(storage)
            .with_additional_named_addresses(self.additional_named_addresses.clone())
            .resolve_all(manifest, &root, &aliases)
    }

    pub fn build_request_for<S: Storage + ?Sized>(
        &self,
        resolution: &Resolution,
        storage: &S,
    ) -> BuildRequest {
        build_request(
            &resolution.packages,
            &resolution.addresses,
            self.test_mode,
            self.init_function.as_deref(),
            storage,
        )
    }
}

/// A `NAME=PATH` alias override as passed on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasArg {
    pub name: PackageName,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AliasArgError {
    #[error("expected `NAME=PATH`, found '{0}'")]
    MissingSeparator(String),
    #[error("empty dependency name in '{0}'")]
    EmptyName(String),
    #[error("empty path in '{0}'")]
    EmptyPath(String),
}

impl FromStr for AliasArg {
    type Err = AliasArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, path) = s
            .split_once('=')
            .ok_or_else(|| AliasArgError::MissingSeparator(s.to_string()))?;
        let (name, path) = (name.trim(), path.trim());
        if name.is_empty() {
            return Err(AliasArgError::EmptyName(s.to_string()));
        }
        if path.is_empty() {
            return Err(AliasArgError::EmptyPath(s.to_string()));
        }
        Ok(AliasArg {
            name: name.to_string(),
            path: PathBuf::from(path),
        })
    }
}

impl fmt::Display for AliasArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fetch::FetchError, storage::InMemoryStorage};
    use clap::Parser;
    use std::cell::Cell;

    #[derive(Parser)]
    struct TestCli {
        #[clap(flatten)]
        config: BuildConfig,
    }

    struct StaticFetcher {
        calls: Cell<usize>,
    }

    impl Fetcher for StaticFetcher {
        fn fetch(&self, name: &str, _: &str, _: Option<&str>) -> Result<PathBuf, FetchError> {
            self.calls.set(self.calls.get() + 1);
            Ok(PathBuf::from("/cache").join(name.to_lowercase()))
        }
    }

    fn storage() -> InMemoryStorage {
        let mut storage = InMemoryStorage::new();
        storage
            .add_file(
                "/ws/pkg/Move.toml",
                r#"
[package]
name = "MyCounter"
version = "0.0.1"

[addresses]
counter = "0x0"

[dependencies]
Sui = { git = "https://github.com/MystenLabs/sui.git", rev = "devnet" }
"#,
            )
            .add_file("/ws/pkg/sources/counter.move", "")
            .add_file(
                "/cache/sui/Move.toml",
                "[package]\nname = \"Sui\"\nversion = \"0.0.1\"\n\n[addresses]\nsui = \"0x2\"\n",
            )
            .add_file("/cache/sui/sources/coin.move", "")
            .add_file(
                "/local/sui/Move.toml",
                "[package]\nname = \"Sui\"\nversion = \"0.0.1\"\n",
            );
        storage
    }

    #[test]
    fn parses_command_line() {
        let cli = TestCli::parse_from([
            "test",
            "--test",
            "--init-function",
            "0x0::counter::init",
            "--alias",
            "Sui=/local/sui",
            "--named-address",
            "std:0x1",
            "--skip-fetch-git-deps",
        ]);
        assert_eq!(cli.config, BuildConfig {
            test_mode: true,
            init_function: Some("0x0::counter::init".to_string()),
            aliases: vec![AliasArg {
                name: "Sui".to_string(),
                path: PathBuf::from("/local/sui"),
            }],
            additional_named_addresses: vec![AddressArg {
                symbol: "std".to_string(),
                address: "0x1".to_string(),
            }],
            skip_fetch_git_deps: true,
        });
    }

    #[test]
    fn parse_alias_arg() {
        assert_eq!(
            "Sui".parse::<AliasArg>().unwrap_err(),
            AliasArgError::MissingSeparator("Sui".to_string())
        );
        assert_eq!(
            "=/x".parse::<AliasArg>().unwrap_err(),
            AliasArgError::EmptyName("=/x".to_string())
        );
        assert_eq!(
            "Sui=".parse::<AliasArg>().unwrap_err(),
            AliasArgError::EmptyPath("Sui=".to_string())
        );
        assert_eq!("Sui=/a=b".parse::<AliasArg>().unwrap().to_string(), "Sui=/a=b");
    }

    #[test]
    fn git_dependencies_are_fetched_from_a_nested_start() {
        let storage = storage();
        let fetcher = StaticFetcher {
            calls: Cell::new(0),
        };
        let config = BuildConfig::default();

        let resolution = config
            .resolve_package(Path::new("/ws/pkg/sources"), &storage, Some(&fetcher))
            .unwrap();
        assert_eq!(fetcher.calls.get(), 1);
        assert_eq!(resolution.root_path, PathBuf::from("/ws/pkg"));
        assert!(resolution.packages.contains(Path::new("/cache/sui")));

        let request = config.build_request_for(&resolution, &storage);
        assert_eq!(request.dependency_source_files, vec![PathBuf::from(
            "/cache/sui/sources/coin.move"
        )]);
        assert_eq!(request.address_args, vec!["counter:0x0", "sui:0x2"]);
    }

    #[test]
    fn aliased_git_dependency_is_not_fetched() {
        let storage = storage();
        let fetcher = StaticFetcher {
            calls: Cell::new(0),
        };
        let config = BuildConfig {
            aliases: vec!["Sui=/local/sui".parse().unwrap()],
            ..BuildConfig::default()
        };

        let resolution = config
            .resolve_package(Path::new("/ws/pkg"), &storage, Some(&fetcher))
            .unwrap();
        assert_eq!(fetcher.calls.get(), 0);
        assert_eq!(
            resolution.packages.iter().collect::<Vec<_>>(),
            vec![Path::new("/local/sui")]
        );
    }

    #[test]
    fn skip_fetch_leaves_git_dependencies_unresolved() {
        let storage = storage();
        let fetcher = StaticFetcher {
            calls: Cell::new(0),
        };
        let config = BuildConfig {
            skip_fetch_git_deps: true,
            test_mode: true,
            init_function: Some("0x0::counter::init".to_string()),
            ..BuildConfig::default()
        };

        let resolution = config
            .resolve_package(Path::new("/ws/pkg"), &storage, Some(&fetcher))
            .unwrap();
        assert_eq!(fetcher.calls.get(), 0);
        assert!(resolution.packages.is_empty());

        let request = config.build_request_for(&resolution, &storage);
        assert!(request.test_mode);
        assert_eq!(request.init_function, "0x0::counter::init");
    }
}
