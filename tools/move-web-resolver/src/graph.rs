// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use move_web_manifest::{DependencyKind, PackageName};
use petgraph::{visit::EdgeRef, Graph};
use std::{
    collections::BTreeMap,
    fmt::{self, Write},
    path::{Path, PathBuf},
};

/// Represents a node in the resolution graph, with metadata attached.
#[derive(Debug)]
pub struct Package {
    pub name: PackageName,
    pub local_path: PathBuf,
}

/// Represents an edge in the resolution graph -- a dependency between two packages.
#[derive(Debug)]
pub struct Dependency {
    /// Key of the entry in the depending package's manifest.
    pub name: PackageName,
    pub kind: DependencyKind,
    /// Whether the target was substituted by an alias override.
    pub aliased: bool,
}

pub type ResolutionGraph = Graph<Package, Dependency>;

/// Incrementally builds a [`ResolutionGraph`], one node per distinct package root.
#[derive(Debug, Default)]
pub(crate) struct GraphBuilder {
    graph: ResolutionGraph,
    nodes: BTreeMap<PathBuf, petgraph::graph::NodeIndex>,
}

impl GraphBuilder {
    pub(crate) fn add_package(&mut self, name: &str, path: &Path) {
        if !self.nodes.contains_key(path) {
            let idx = self.graph.add_node(Package {
                name: name.to_string(),
                local_path: path.to_path_buf(),
            });
            self.nodes.insert(path.to_path_buf(), idx);
        }
    }

    pub(crate) fn add_dependency(&mut self, from: &Path, to: &Path, edge: Dependency) {
        if let (Some(&from), Some(&to)) = (self.nodes.get(from), self.nodes.get(to)) {
            self.graph.add_edge(from, to, edge);
        }
    }

    pub(crate) fn finish(self) -> ResolutionGraph {
        self.graph
    }
}

/// Converts a [`ResolutionGraph`] into a Mermaid flowchart for visualization.
pub fn graph_to_mermaid(graph: &ResolutionGraph, strip_root_path: Option<&Path>) -> String {
    let mut mermaid = String::new();
    match write_mermaid(&mut mermaid, graph, strip_root_path) {
        Ok(()) => mermaid,
        // Writing into a `String` cannot fail.
        Err(fmt::Error) => String::new(),
    }
}

fn write_mermaid(
    out: &mut impl Write,
    graph: &ResolutionGraph,
    strip_root_path: Option<&Path>,
) -> fmt::Result {
    writeln!(out, "flowchart TD")?;
    let mut node_map = BTreeMap::new();

    let path_prefix = strip_root_path.unwrap_or_else(|| Path::new(""));

    // Assign a simple identifier to each node
    for node_idx in graph.node_indices() {
        let id = format!("N{}", node_idx.index());

        let package = &graph[node_idx];
        let path = package
            .local_path
            .strip_prefix(path_prefix)
            .unwrap_or(&package.local_path)
            .to_string_lossy();

        writeln!(out, "    {}[\"{}<br><br>{}\"]", id, package.name, path)?;
        node_map.insert(node_idx, id);
    }

    for edge in graph.edge_references() {
        let (Some(source), Some(target)) =
            (node_map.get(&edge.source()), node_map.get(&edge.target()))
        else {
            continue;
        };
        let dependency = edge.weight();
        let mut label = dependency.name.clone();
        if dependency.kind == DependencyKind::Dev {
            label.push_str(" (dev)");
        }
        if dependency.aliased {
            label.push_str(" (alias)");
        }
        writeln!(out, "    {} -->|{}| {}", source, label, target)?;
    }

    Ok(())
}
