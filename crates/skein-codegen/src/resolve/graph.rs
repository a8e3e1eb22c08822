use petgraph::Direction;
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use std::collections::{BTreeSet, HashMap};

/// Directed "refers to" graph over named types
///
/// Used for recursion detection (strongly connected components and
/// self-loops) and for reachability pruning.
#[derive(Debug, Clone, Default)]
pub struct ReferenceGraph {
    graph: DiGraph<String, ()>,
    indices: HashMap<String, NodeIndex>,
}

impl ReferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.indices.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.indices.insert(name.to_string(), idx);
        idx
    }

    pub fn add_edge(&mut self, from: &str, to: &str) {
        let a = self.add_node(from);
        let b = self.add_node(to);
        if self.graph.find_edge(a, b).is_none() {
            self.graph.add_edge(a, b, ());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Direct successors of `name`
    pub fn refs_out(&self, name: &str) -> Vec<&str> {
        let Some(&idx) = self.indices.get(name) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .filter_map(|e| self.graph.node_weight(e.target()))
            .map(String::as_str)
            .collect()
    }

    /// Every node reachable from `roots`, roots included
    pub fn reachable_from<'a>(&self, roots: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        for root in roots {
            let Some(&start) = self.indices.get(root) else {
                continue;
            };
            let mut dfs = Dfs::new(&self.graph, start);
            while let Some(idx) = dfs.next(&self.graph) {
                if let Some(name) = self.graph.node_weight(idx) {
                    seen.insert(name.clone());
                }
            }
        }
        seen
    }

    /// Group nodes that take part in a reference cycle
    pub fn cycles(&self) -> Cycles {
        let mut component = HashMap::new();
        let mut count = 0;
        for scc in kosaraju_scc(&self.graph) {
            let cyclic = scc.len() > 1
                || scc.first().is_some_and(|&idx| {
                    self.graph
                        .edges_directed(idx, Direction::Outgoing)
                        .any(|e| e.target() == idx)
                });
            if !cyclic {
                continue;
            }
            for idx in scc {
                if let Some(name) = self.graph.node_weight(idx) {
                    component.insert(name.clone(), count);
                }
            }
            count += 1;
        }
        Cycles { component }
    }
}

/// Cycle membership computed by [`ReferenceGraph::cycles`]
#[derive(Debug, Clone, Default)]
pub struct Cycles {
    component: HashMap<String, usize>,
}

impl Cycles {
    pub fn is_recursive(&self, name: &str) -> bool {
        self.component.contains_key(name)
    }

    /// Whether a reference from `from` to `to` closes a cycle and so needs
    /// deferred indirection
    pub fn same_cycle(&self, from: &str, to: &str) -> bool {
        match (self.component.get(from), self.component.get(to)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    pub fn recursive_names(&self) -> BTreeSet<&str> {
        self.component.keys().map(String::as_str).collect()
    }
}
