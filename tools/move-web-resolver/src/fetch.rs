// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{error::ResolutionError, resolver::AliasOverrides};
use move_web_manifest::{PackageLocation, PackageManifest};
use std::path::PathBuf;
use tracing::{debug, info};

/// Error type returned by a [`Fetcher`].
pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

/// Materializes git-hosted packages so the resolver can treat them as local ones.
pub trait Fetcher {
    /// Makes the package `name` hosted at `url` (optionally pinned to `rev`) available on
    /// storage and returns its package root.
    fn fetch(&self, name: &str, url: &str, rev: Option<&str>) -> Result<PathBuf, FetchError>;
}

/// Fetches every git dependency of the root manifest that has no alias override yet, and
/// returns `aliases` extended with the fetched package roots.
///
/// Only the root's own dependencies can be substituted this way, since alias overrides do not
/// apply below the root. Git dependencies of dependencies stay unresolved.
pub fn prefetch_git_dependencies<F: Fetcher + ?Sized>(
    manifest: &PackageManifest,
    aliases: &AliasOverrides,
    fetcher: &F,
) -> Result<AliasOverrides, ResolutionError> {
    let mut aliases = aliases.clone();
    for (name, dep, _) in manifest.all_dependencies() {
        let PackageLocation::Git { url, rev } = &dep.location else {
            continue;
        };
        if aliases.contains_key(name) {
            debug!("Git dependency '{}' is overridden by an alias, not fetching", name);
            continue;
        }

        info!("Fetching git dependency '{}' from {}", name, url);
        let path = fetcher
            .fetch(name, url, rev.as_deref())
            .map_err(|source| ResolutionError::Fetch {
                name: name.clone(),
                source,
            })?;
        aliases.insert(name.clone(), path);
    }
    Ok(aliases)
}

/// Root of the package cache: `$MOVE_HOME`, or `~/.move` if unset.
pub fn move_home() -> PathBuf {
    std::env::var_os("MOVE_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".move")))
        .unwrap_or_else(|| PathBuf::from(".move"))
}

/// Name of the directory under `$MOVE_HOME/git` that caches the checkout of `url` at `rev`.
/// Only ASCII alphanumerics and `_` appear in it.
pub fn git_repo_dir_name(url: &str, rev: Option<&str>) -> String {
    let sanitize = |s: &str| -> String {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    };
    match rev {
        Some(rev) => format!("{}_{}", sanitize(url), sanitize(rev)),
        None => sanitize(url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use move_web_manifest::parse_manifest;
    use std::{cell::RefCell, path::Path};

    struct RecordingFetcher {
        calls: RefCell<Vec<(String, String, Option<String>)>>,
    }

    impl Fetcher for RecordingFetcher {
        fn fetch(&self, name: &str, url: &str, rev: Option<&str>) -> Result<PathBuf, FetchError> {
            self.calls
                .borrow_mut()
                .push((name.to_string(), url.to_string(), rev.map(str::to_string)));
            Ok(PathBuf::from(format!("/cache/{}", name)))
        }
    }

    struct FailingFetcher;

    impl Fetcher for FailingFetcher {
        fn fetch(&self, _: &str, _: &str, _: Option<&str>) -> Result<PathBuf, FetchError> {
            Err("network unreachable".into())
        }
    }

    const MANIFEST: &str = r#"
[package]
name = "Root"
version = "0.1.0"

[dependencies]
Sui = { git = "https://github.com/MystenLabs/sui.git", rev = "devnet" }
Local = { local = "../local" }
Std = { git = "https://github.com/move-language/move.git" }

[dev-dependencies]
Utils = { git = "https://example.com/utils.git", rev = "v1" }
"#;

    #[test]
    fn fetches_git_dependencies_without_aliases() {
        let manifest = parse_manifest(MANIFEST).unwrap();
        let mut aliases = AliasOverrides::new();
        aliases.insert("Std".to_string(), PathBuf::from("/prefetched/std"));

        let fetcher = RecordingFetcher {
            calls: RefCell::new(vec![]),
        };
        let aliases = prefetch_git_dependencies(&manifest, &aliases, &fetcher).unwrap();

        assert_eq!(fetcher.calls.into_inner(), vec![
            (
                "Sui".to_string(),
                "https://github.com/MystenLabs/sui.git".to_string(),
                Some("devnet".to_string())
            ),
            (
                "Utils".to_string(),
                "https://example.com/utils.git".to_string(),
                Some("v1".to_string())
            ),
        ]);
        assert_eq!(aliases["Sui"], Path::new("/cache/Sui"));
        assert_eq!(aliases["Std"], Path::new("/prefetched/std"));
        assert_eq!(aliases["Utils"], Path::new("/cache/Utils"));
        assert!(!aliases.contains_key("Local"));
    }

    #[test]
    fn fetch_failure_names_the_dependency() {
        let manifest = parse_manifest(MANIFEST).unwrap();
        let err =
            prefetch_git_dependencies(&manifest, &AliasOverrides::new(), &FailingFetcher).unwrap_err();
        match err {
            ResolutionError::Fetch { name, source } => {
                assert_eq!(name, "Sui");
                assert_eq!(source.to_string(), "network unreachable");
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cache_path_is_sanitized() {
        assert_eq!(
            git_repo_dir_name("https://github.com/MystenLabs/sui.git", Some("devnet/v1")),
            "https___github_com_MystenLabs_sui_git_devnet_v1"
        );
        assert_eq!(git_repo_dir_name("file:///tmp/lib", None), "file____tmp_lib");
    }
}
