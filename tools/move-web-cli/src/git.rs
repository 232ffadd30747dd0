// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use anyhow::{bail, Context};
use move_web_resolver::{git_repo_dir_name, move_home, FetchError, Fetcher};
use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};
use tracing::{debug, info, warn};

/// Fetches git dependencies with the `git` executable into a checkout cache, by default
/// `$MOVE_HOME/git`.
///
/// A checkout already present in the cache is reused as is. Checkouts are staged next to their
/// final location and only moved into place once the requested revision is checked out.
#[derive(Debug, Clone)]
pub struct GitFetcher {
    cache_root: PathBuf,
}

impl GitFetcher {
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
        }
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    fn fetch_into_cache(
        &self,
        name: &str,
        url: &str,
        rev: Option<&str>,
    ) -> anyhow::Result<PathBuf> {
        let dir_name = git_repo_dir_name(url, rev);
        let repo_path = self.cache_root.join(&dir_name);
        if repo_path.exists() {
            debug!(
                "Using cached checkout of '{}' at '{}'",
                name,
                repo_path.display()
            );
            return Ok(repo_path);
        }

        confirm_git_available()?;
        fs::create_dir_all(&self.cache_root).with_context(|| {
            format!("Failed to create git cache '{}'", self.cache_root.display())
        })?;

        // Cache directory names never contain '.', so the staging name cannot collide.
        let staging = self.cache_root.join(format!("{}.partial", dir_name));
        remove_checkout(&staging)?;
        info!("Cloning {} into '{}'", url, repo_path.display());
        let staged = clone(url, &staging, name).and_then(|()| match rev {
            Some(rev) => checkout(&staging, rev, name),
            None => Ok(()),
        });
        if let Err(e) = staged {
            if let Err(cleanup) = remove_checkout(&staging) {
                warn!("{:#}", cleanup);
            }
            return Err(e);
        }

        fs::rename(&staging, &repo_path).with_context(|| {
            format!(
                "Failed to move checkout of '{}' into '{}'",
                name,
                repo_path.display()
            )
        })?;
        Ok(repo_path)
    }
}

impl Default for GitFetcher {
    fn default() -> Self {
        Self::new(move_home().join("git"))
    }
}

impl Fetcher for GitFetcher {
    fn fetch(&self, name: &str, url: &str, rev: Option<&str>) -> Result<PathBuf, FetchError> {
        Ok(self.fetch_into_cache(name, url, rev)?)
    }
}

fn remove_checkout(path: &Path) -> anyhow::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove '{}'", path.display())),
    }
}

pub(crate) fn confirm_git_available() -> anyhow::Result<()> {
    match Command::new("git").arg("--version").output() {
        Ok(_) => Ok(()),
        Err(e) => {
            if let std::io::ErrorKind::NotFound = e.kind() {
                bail!(
                    "git was not found, confirm you have git installed and it is on your PATH. \
                    Alternatively, skip with --skip-fetch-git-deps"
                );
            } else {
                bail!(
                    "Unexpected error occurred when checking for presence of `git`: {:#}",
                    e
                );
            }
        },
    }
}

fn clone(url: &str, target_path: &Path, dep_name: &str) -> anyhow::Result<()> {
    let status = Command::new("git")
        .arg("clone")
        .arg(url)
        .arg(target_path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|_| {
            anyhow::anyhow!("Failed to clone Git repository for package '{}'", dep_name)
        })?;
    if !status.success() {
        return Err(anyhow::anyhow!(
            "Failed to clone Git repository for package '{}' | Exit status: {}",
            dep_name,
            status
        ));
    }
    Ok(())
}

fn checkout(repo_path: &Path, rev: &str, dep_name: &str) -> anyhow::Result<()> {
    let status = Command::new("git")
        .arg("-C")
        .arg(repo_path)
        .args(["checkout", rev])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|_| {
            anyhow::anyhow!(
                "Failed to checkout Git reference '{}' for package '{}'",
                rev,
                dep_name
            )
        })?;
    if !status.success() {
        return Err(anyhow::anyhow!(
            "Failed to checkout Git reference '{}' for package '{}' | Exit status: {}",
            rev,
            dep_name,
            status
        ));
    }
    Ok(())
}
