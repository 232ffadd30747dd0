// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use indexmap::IndexMap;
use move_web_manifest::{NamedAddress, PackageName};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use tracing::warn;

/// The package (or other origin) that bound a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressBinding {
    pub address: String,
    pub package: PackageName,
}

/// A binding that lost to an earlier one for the same symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressConflict {
    pub symbol: NamedAddress,
    /// Address that stays bound.
    pub kept: String,
    /// Address that was ignored.
    pub ignored: String,
    /// Package that declared the ignored address.
    pub package: PackageName,
}

/// Named addresses merged across a dependency closure.
///
/// Merging is first-writer-wins: once a symbol is bound, later bindings are ignored. Combined
/// with the resolver's fixed traversal order this makes the root package's own bindings win,
/// followed by packages visited earlier. Iteration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressTable {
    bindings: IndexMap<NamedAddress, AddressBinding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    conflicts: Vec<AddressConflict>,
}

impl AddressTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `symbol` unless it is already bound. Returns whether the binding was taken.
    ///
    /// A rejected binding with a different address is recorded as an [`AddressConflict`].
    pub fn bind(&mut self, symbol: &str, address: &str, package: &str) -> bool {
        if let Some(existing) = self.bindings.get(symbol) {
            if existing.address != address {
                warn!(
                    "Named address '{}' is bound to {} by '{}'; ignoring {} from '{}'",
                    symbol, existing.address, existing.package, address, package
                );
                self.conflicts.push(AddressConflict {
                    symbol: symbol.to_string(),
                    kept: existing.address.clone(),
                    ignored: address.to_string(),
                    package: package.to_string(),
                });
            }
            return false;
        }

        self.bindings.insert(symbol.to_string(), AddressBinding {
            address: address.to_string(),
            package: package.to_string(),
        });
        true
    }

    pub fn get(&self, symbol: &str) -> Option<&str> {
        self.bindings.get(symbol).map(|b| b.address.as_str())
    }

    pub fn binding(&self, symbol: &str) -> Option<&AddressBinding> {
        self.bindings.get(symbol)
    }

    /// Symbols and their addresses, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(symbol, binding)| (symbol.as_str(), binding.address.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn conflicts(&self) -> &[AddressConflict] {
        &self.conflicts
    }

    /// Renders the table as compiler address arguments, in insertion order.
    pub fn to_address_args(&self) -> Vec<AddressArg> {
        self.iter()
            .map(|(symbol, address)| AddressArg {
                symbol: symbol.to_string(),
                address: address.to_string(),
            })
            .collect()
    }
}

/// A `symbol:address` pair as passed on the command line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
pub struct AddressArg {
    pub symbol: NamedAddress,
    pub address: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressArgError {
    #[error("expected `symbol:address`, found '{0}'")]
    MissingSeparator(String),
    #[error("empty symbol in '{0}'")]
    EmptySymbol(String),
    #[error("empty address in '{0}'")]
    EmptyAddress(String),
}

impl FromStr for AddressArg {
    type Err = AddressArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (symbol, address) = s
            .split_once(':')
            .ok_or_else(|| AddressArgError::MissingSeparator(s.to_string()))?;
        let (symbol, address) = (symbol.trim(), address.trim());
        if symbol.is_empty() {
            return Err(AddressArgError::EmptySymbol(s.to_string()));
        }
        if address.is_empty() {
            return Err(AddressArgError::EmptyAddress(s.to_string()));
        }
        Ok(AddressArg {
            symbol: symbol.to_string(),
            address: address.to_string(),
        })
    }
}

impl fmt::Display for AddressArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.symbol, self.address)
    }
}
