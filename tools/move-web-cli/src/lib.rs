// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod cli;
pub mod compiler;
pub mod git;

pub use cli::{run_cli, Command, MoveWeb, MoveWebCli};
