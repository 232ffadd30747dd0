// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    compiler::{BuildOutcome, CompilerInvocation, DisassembleOutcome, DisassemblerInvocation},
    git::GitFetcher,
};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use move_web_resolver::{
    absolute_path, graph_to_mermaid, normalize_path, BuildConfig, DiskStorage, Fetcher, Resolution,
};
use serde::Serialize;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[clap(
    name = "move-web",
    author,
    version,
    about = "Resolve the dependency closure of a Move package and build it"
)]
pub struct MoveWebCli {
    #[clap(flatten)]
    pub move_args: MoveWeb,

    #[clap(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Args)]
pub struct MoveWeb {
    /// Path to a package which the command should be run with respect to.
    #[clap(long = "path", short = 'p', global = true, default_value = ".")]
    pub package_path: PathBuf,

    /// Print debug logs to stderr.
    #[clap(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,

    /// Print results as JSON.
    #[clap(long = "json", global = true)]
    pub json: bool,

    /// Package build options
    #[clap(flatten)]
    pub build_config: BuildConfig,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the root directories of every package the package depends on
    Resolve,
    /// Print the named addresses merged across the dependency closure
    Addresses,
    /// Print the source files of every dependency
    Sources,
    /// Print the dependency graph as a Mermaid flowchart
    Graph,
    /// Build the package with the external compiler
    Build {
        /// Compiler executable
        #[clap(long, env = "MOVE_WEB_COMPILER")]
        compiler: PathBuf,
        /// Directory the compiler may read from besides the package itself. Defaults to the
        /// package's parent directory
        #[clap(long = "preopen")]
        preopens: Vec<PathBuf>,
    },
    /// Disassemble a compiled bytecode file with the external compiler
    Disassemble {
        /// Bytecode file to disassemble
        #[clap(long)]
        file: PathBuf,
        /// Compiler executable
        #[clap(long, env = "MOVE_WEB_COMPILER")]
        compiler: PathBuf,
    },
}

#[derive(Serialize)]
struct ResolveOutput<'a> {
    root: &'a str,
    root_path: &'a Path,
    packages: Vec<&'a Path>,
}

pub fn run_cli<W: Write>(move_args: &MoveWeb, cmd: &Command, out: &mut W) -> Result<()> {
    let config = &move_args.build_config;
    match cmd {
        Command::Resolve => print_resolution(&resolve(move_args)?, move_args.json, out),
        Command::Addresses => {
            let resolution = resolve(move_args)?;
            if move_args.json {
                return print_json(&resolution.addresses, out);
            }
            for (symbol, address) in resolution.addresses.iter() {
                writeln!(out, "{}:{}", symbol, address)?;
            }
            for conflict in resolution.addresses.conflicts() {
                writeln!(
                    out,
                    "# '{}' in '{}' ignored: {} is bound to {}",
                    conflict.ignored, conflict.package, conflict.symbol, conflict.kept
                )?;
            }
            Ok(())
        },
        Command::Sources => {
            let resolution = resolve(move_args)?;
            let request = config.build_request_for(&resolution, &DiskStorage);
            if move_args.json {
                return print_json(&request, out);
            }
            for file in &request.dependency_source_files {
                writeln!(out, "{}", file.display())?;
            }
            for skipped in &request.skipped_entries {
                writeln!(out, "# skipped '{}': {}", skipped.path.display(), skipped.reason)?;
            }
            Ok(())
        },
        Command::Graph => {
            let resolution = resolve(move_args)?;
            let strip = resolution.root_path.parent();
            write!(out, "{}", graph_to_mermaid(&resolution.graph, strip))?;
            Ok(())
        },
        Command::Build { compiler, preopens } => {
            let resolution = resolve(move_args)?;
            let request = config.build_request_for(&resolution, &DiskStorage);
            let mut invocation =
                CompilerInvocation::new(executable_path(compiler), resolution.root_path.clone());
            if !preopens.is_empty() {
                let preopens = preopens
                    .iter()
                    .map(|p| std::path::absolute(p).map(|p| normalize_path(&p)))
                    .collect::<Result<Vec<_>, _>>()
                    .context("Invalid preopen path")?;
                invocation = invocation.with_preopens(preopens);
            }

            let outcome = invocation.run(&request)?;
            if move_args.json {
                print_json(&outcome, out)?;
            }
            match outcome {
                BuildOutcome::Success { blob, hash } => {
                    if !move_args.json {
                        writeln!(out, "Built '{}'", blob.display())?;
                        writeln!(out, "hash: {}", hash)?;
                    }
                    Ok(())
                },
                BuildOutcome::Failure { message } => {
                    bail!(
                        "Failed to build package '{}':\n{}",
                        resolution.root_manifest.package.name,
                        message
                    )
                },
            }
        },
        Command::Disassemble { file, compiler } => {
            disassemble(file, compiler, move_args.json, out)
        },
    }
}

/// Resolves the package at `--path`, fetching its git dependencies into the cache.
fn resolve(move_args: &MoveWeb) -> Result<Resolution> {
    let path = std::path::absolute(&move_args.package_path).with_context(|| {
        format!(
            "Invalid package path '{}'",
            move_args.package_path.display()
        )
    })?;
    let path = normalize_path(&path);

    let fetcher: &dyn Fetcher = &GitFetcher::default();
    Ok(move_args
        .build_config
        .resolve_package(&path, &DiskStorage, Some(fetcher))?)
}

fn disassemble<W: Write>(file: &Path, compiler: &Path, json: bool, out: &mut W) -> Result<()> {
    let invocation = DisassemblerInvocation::new(executable_path(compiler), absolute_path(file));
    let outcome = invocation.run()?;
    if json {
        print_json(&outcome, out)?;
    }
    match outcome {
        DisassembleOutcome::Success { disassembly } => {
            if !json {
                write!(out, "{}", disassembly)?;
            }
            Ok(())
        },
        DisassembleOutcome::Failure { message } => {
            bail!("Failed to disassemble '{}':\n{}", file.display(), message)
        },
    }
}

/// Paths with a directory part are taken against the current directory, since the compiler is
/// started from another one. Bare names are left to the `PATH` lookup.
fn executable_path(executable: &Path) -> PathBuf {
    if executable.components().count() > 1 {
        absolute_path(executable)
    } else {
        executable.to_path_buf()
    }
}

fn print_resolution<W: Write>(resolution: &Resolution, json: bool, out: &mut W) -> Result<()> {
    if json {
        return print_json(
            &ResolveOutput {
                root: &resolution.root_manifest.package.name,
                root_path: &resolution.root_path,
                packages: resolution.packages.iter().collect(),
            },
            out,
        );
    }
    for package in resolution.packages.iter() {
        writeln!(out, "{}", package.display())?;
    }
    Ok(())
}

fn print_json<W: Write, T: Serialize>(value: &T, out: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
