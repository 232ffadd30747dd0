// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use anyhow::{bail, Context, Result};
use move_web_resolver::BuildRequest;
use serde::Serialize;
use std::{
    ffi::{OsStr, OsString},
    fs, io,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};
use tracing::{debug, info};

/// Directory, relative to the package root, the compiler writes its artifacts to.
pub const OUTPUT_DIR: &str = "target/sui/release";
pub const BLOB_FILE: &str = "package.blob";
pub const HASH_FILE: &str = "hash.txt";
pub const ERROR_FILE: &str = "error.txt";

/// Suffixes the disassembler appends to the bytecode file name for its listing and its errors.
pub const DISASSEMBLY_SUFFIX: &str = ".d";
pub const DISASSEMBLY_ERROR_SUFFIX: &str = ".e";

/// What a compiler run left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildOutcome {
    Success { blob: PathBuf, hash: String },
    Failure { message: String },
}

/// One invocation of the external compiler on a package.
///
/// The compiler only sees the package directory and the preopened roots, so every dependency
/// source in a request has to live under one of them.
#[derive(Debug, Clone)]
pub struct CompilerInvocation {
    pub executable: PathBuf,
    pub package_path: PathBuf,
    pub preopens: Vec<PathBuf>,
}

impl CompilerInvocation {
    /// Preopens the package's parent directory, where sibling dependencies usually live.
    pub fn new(executable: PathBuf, package_path: PathBuf) -> Self {
        let preopens = package_path.parent().map(Path::to_path_buf).into_iter().collect();
        Self {
            executable,
            package_path,
            preopens,
        }
    }

    pub fn with_preopens(mut self, preopens: Vec<PathBuf>) -> Self {
        self.preopens = preopens;
        self
    }

    pub fn output_dir(&self) -> PathBuf {
        self.package_path.join(OUTPUT_DIR)
    }

    /// Fails if a dependency source is outside the package and every preopened root.
    pub fn check_access(&self, request: &BuildRequest) -> Result<()> {
        let inaccessible: Vec<_> = request
            .dependency_source_files
            .iter()
            .filter(|file| {
                !file.starts_with(&self.package_path)
                    && !self.preopens.iter().any(|root| file.starts_with(root))
            })
            .collect();
        if let Some(first) = inaccessible.first() {
            bail!(
                "{} dependency source(s) are not accessible to the compiler, e.g. '{}'. \
                Preopen their root with --preopen",
                inaccessible.len(),
                first.display()
            );
        }
        Ok(())
    }

    pub fn run(&self, request: &BuildRequest) -> Result<BuildOutcome> {
        self.check_access(request)?;

        let output_dir = self.output_dir();
        for artifact in [BLOB_FILE, HASH_FILE, ERROR_FILE] {
            remove_stale(&output_dir.join(artifact))?;
        }

        let status = run_backend(&self.executable, request.to_args(), &self.package_path)?;

        let blob = output_dir.join(BLOB_FILE);
        if blob.is_file() {
            let hash = fs::read_to_string(output_dir.join(HASH_FILE))
                .with_context(|| format!("Compiler wrote '{}' but no hash", blob.display()))?;
            info!("Build finished: '{}'", blob.display());
            return Ok(BuildOutcome::Success {
                blob,
                hash: hash.trim().to_string(),
            });
        }

        let error_file = output_dir.join(ERROR_FILE);
        if error_file.is_file() {
            let message = fs::read_to_string(&error_file)
                .with_context(|| format!("Failed to read '{}'", error_file.display()))?;
            return Ok(BuildOutcome::Failure { message });
        }

        bail!(
            "Compiler exited with {} without writing '{}' or '{}'",
            status,
            BLOB_FILE,
            ERROR_FILE
        )
    }
}

/// What a disassembler run left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DisassembleOutcome {
    Success { disassembly: String },
    Failure { message: String },
}

/// One invocation of the external compiler's `disassemble` command on a bytecode file.
///
/// The backend runs in the file's directory and writes `<file>.d` on success or `<file>.e` on
/// failure.
#[derive(Debug, Clone)]
pub struct DisassemblerInvocation {
    pub executable: PathBuf,
    pub file_path: PathBuf,
}

impl DisassemblerInvocation {
    pub fn new(executable: PathBuf, file_path: PathBuf) -> Self {
        Self {
            executable,
            file_path,
        }
    }

    pub fn listing_path(&self) -> PathBuf {
        with_suffix(&self.file_path, DISASSEMBLY_SUFFIX)
    }

    pub fn error_path(&self) -> PathBuf {
        with_suffix(&self.file_path, DISASSEMBLY_ERROR_SUFFIX)
    }

    pub fn run(&self) -> Result<DisassembleOutcome> {
        if !self.file_path.is_file() {
            bail!("Bytecode file '{}' does not exist", self.file_path.display());
        }
        let listing = self.listing_path();
        let error_file = self.error_path();
        remove_stale(&listing)?;
        remove_stale(&error_file)?;

        let working_dir = self.file_path.parent().unwrap_or_else(|| Path::new("."));
        let args = [
            OsStr::new("disassemble"),
            OsStr::new("--file_path"),
            self.file_path.as_os_str(),
        ];
        let status = run_backend(&self.executable, args, working_dir)?;

        if listing.is_file() {
            let disassembly = fs::read_to_string(&listing)
                .with_context(|| format!("Failed to read '{}'", listing.display()))?;
            return Ok(DisassembleOutcome::Success { disassembly });
        }
        if error_file.is_file() {
            let message = fs::read_to_string(&error_file)
                .with_context(|| format!("Failed to read '{}'", error_file.display()))?;
            return Ok(DisassembleOutcome::Failure { message });
        }

        bail!(
            "Disassembler exited with {} without writing '{}' or '{}'",
            status,
            listing.display(),
            error_file.display()
        )
    }
}

/// Runs `executable` in `working_dir`, with `PWD` pointing there as well.
fn run_backend<I, A>(executable: &Path, args: I, working_dir: &Path) -> Result<ExitStatus>
where
    I: IntoIterator<Item = A>,
    A: AsRef<OsStr>,
{
    let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
    info!(
        "Running '{}' in '{}'",
        executable.display(),
        working_dir.display()
    );
    debug!("Arguments: {:?}", args);
    Command::new(executable)
        .args(&args)
        .current_dir(working_dir)
        .env("PWD", working_dir)
        .status()
        .with_context(|| format!("Failed to run compiler '{}'", executable.display()))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove stale '{}'", path.display())),
    }
}
