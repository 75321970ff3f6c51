//! The `depends on` graph and cycle detection.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rustworkx_core::connectivity::johnson_simple_cycles;
use rustworkx_core::petgraph::algo::{is_cyclic_directed, kosaraju_scc};
use rustworkx_core::petgraph::graph::{DiGraph, NodeIndex};
use rustworkx_core::petgraph::visit::Dfs;
use tracing::warn;
use varimap_core::FeatureSymbol;

/// Upper bound on cycles enumerated for diagnostics. Cyclic membership is
/// computed from strongly connected components and is never truncated.
pub const MAX_REPORTED_CYCLES: usize = 256;

/// A dependency cycle as a closed path: the first name is repeated at the end
/// (`A -> B -> A`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DependencyCycle {
    pub path: Vec<String>,
}

impl DependencyCycle {
    /// Distinct members of the cycle.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.path[..self.path.len().saturating_sub(1)]
            .iter()
            .map(String::as_str)
    }
}

impl std::fmt::Display for DependencyCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path.join(" -> "))
    }
}

/// Directed graph with an edge `A -> B` for every `A depends on ... B ...`.
///
/// Undeclared dependency targets get a node too, so closures include them.
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    id_to_index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Build the graph from declared features. Nodes and edges are added in
    /// name order so traversal order is stable.
    #[must_use]
    pub fn build(features: &BTreeMap<String, FeatureSymbol>) -> Self {
        let mut graph = DiGraph::new();
        let mut id_to_index = HashMap::new();

        let mut node = |graph: &mut DiGraph<String, ()>, name: &str| -> NodeIndex {
            *id_to_index
                .entry(name.to_string())
                .or_insert_with(|| graph.add_node(name.to_string()))
        };

        for (name, feature) in features {
            let src_idx = node(&mut graph, name);
            let targets: BTreeSet<&str> = feature.dependency_names().into_iter().collect();
            for target in targets {
                let dst_idx = node(&mut graph, target);
                graph.add_edge(src_idx, dst_idx, ());
            }
        }

        Self { graph, id_to_index }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Every name reachable from `name` along `depends on` edges, excluding
    /// `name` itself unless it lies on a cycle.
    #[must_use]
    pub fn closure(&self, name: &str) -> BTreeSet<String> {
        let Some(&start) = self.id_to_index.get(name) else {
            return BTreeSet::new();
        };
        let mut out = BTreeSet::new();
        // Seed with successors rather than `start` so a self-loop shows up.
        let mut dfs = Dfs::empty(&self.graph);
        dfs.stack.extend(self.graph.neighbors(start));
        while let Some(idx) = dfs.next(&self.graph) {
            out.insert(self.graph[idx].clone());
        }
        out
    }

    /// Every elementary cycle, each reported once and rotated to start at
    /// its smallest name. Enumeration stops after [`MAX_REPORTED_CYCLES`].
    #[must_use]
    pub fn cycles(&self) -> Vec<DependencyCycle> {
        // Johnson's enumeration takes self-loops separately.
        let mut graph = self.graph.clone();
        let self_loops: Vec<NodeIndex> = graph
            .node_indices()
            .filter(|idx| graph.contains_edge(*idx, *idx))
            .collect();
        for idx in &self_loops {
            while let Some(edge) = graph.find_edge(*idx, *idx) {
                graph.remove_edge(edge);
            }
        }

        let self_cycles = (!self_loops.is_empty()).then_some(self_loops);
        let mut iter = johnson_simple_cycles(&graph, self_cycles);
        let mut found = BTreeSet::new();
        while let Some(members) = iter.next(&graph) {
            if found.len() == MAX_REPORTED_CYCLES {
                warn!(
                    limit = MAX_REPORTED_CYCLES,
                    "dependency cycle enumeration truncated"
                );
                break;
            }
            found.insert(self.closed_path(&members));
        }
        found.into_iter().collect()
    }

    /// Names lying on at least one cycle: members of a strongly connected
    /// component with more than one node, plus self-dependent names.
    #[must_use]
    pub fn cyclic_members(&self) -> BTreeSet<String> {
        kosaraju_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|idx| self.graph.contains_edge(*idx, *idx))
            })
            .flatten()
            .map(|idx| self.graph[idx].clone())
            .collect()
    }

    fn closed_path(&self, members: &[NodeIndex]) -> DependencyCycle {
        let names: Vec<&String> = members.iter().map(|idx| &self.graph[*idx]).collect();
        let start = names
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.cmp(b.1))
            .map_or(0, |(pos, _)| pos);
        let mut path: Vec<String> = names[start..]
            .iter()
            .chain(names[..start].iter())
            .map(|name| (*name).clone())
            .collect();
        if let Some(first) = path.first().cloned() {
            path.push(first);
        }
        DependencyCycle { path }
    }
}
