use hls_ir::OpId;
use itertools::Itertools;
use petgraph::{
    graph::{NodeIndex, UnGraph},
    Graph,
};
use std::{collections::HashMap, fmt};

/// Undirected graph of operations that cannot share a resource instance.
pub struct ConflictGraph {
    graph: UnGraph<OpId, ()>,
    index_map: HashMap<OpId, NodeIndex>,
}

impl Default for ConflictGraph {
    fn default() -> Self {
        ConflictGraph {
            graph: Graph::new_undirected(),
            index_map: HashMap::new(),
        }
    }
}

impl ConflictGraph {
    pub fn insert_node(&mut self, op: OpId) -> NodeIndex {
        if let Some(&node) = self.index_map.get(&op) {
            return node;
        }
        let node = self.graph.add_node(op);
        self.index_map.insert(op, node);
        node
    }

    pub fn insert_conflict(&mut self, a: OpId, b: OpId) {
        // self edges only register the node
        let a_node = self.insert_node(a);
        if a == b {
            return;
        }
        let b_node = self.insert_node(b);
        self.graph.update_edge(a_node, b_node, ());
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.graph.node_count()
    }

    #[cfg(test)]
    fn conflicts(&self, a: OpId, b: OpId) -> bool {
        match (self.index_map.get(&a), self.index_map.get(&b)) {
            (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// Visit the nodes in `ordering` and give each the smallest color that
    /// none of its already colored neighbors has.
    ///
    /// With a left-endpoint ordering of an interval graph this uses as many
    /// colors as the largest clique, which is optimal.
    pub fn color_greedy_with(
        &self,
        ordering: impl Iterator<Item = OpId>,
    ) -> HashMap<OpId, u32> {
        let mut coloring: HashMap<OpId, u32> = HashMap::new();
        let mut taken: Vec<bool> = Vec::new();

        for op in ordering {
            let Some(&node) = self.index_map.get(&op) else {
                continue;
            };
            taken.iter_mut().for_each(|t| *t = false);
            for nbr in self.graph.neighbors(node) {
                if let Some(&c) = coloring.get(&self.graph[nbr]) {
                    taken[c as usize] = true;
                }
            }
            let color = match taken.iter().position(|t| !t) {
                Some(c) => c,
                None => {
                    taken.push(true);
                    taken.len() - 1
                }
            };
            coloring.insert(op, color as u32);
        }
        coloring
    }
}

impl fmt::Display for ConflictGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = self
            .graph
            .node_indices()
            .map(|idx| format!("  {} [label=\"op{}\"];", self.graph[idx], self.graph[idx]))
            .join("\n");
        let edges = self
            .graph
            .edge_indices()
            .filter_map(|idx| self.graph.edge_endpoints(idx))
            .unique()
            .map(|(a, b)| format!("  {} -- {};", self.graph[a], self.graph[b]))
            .join("\n");
        write!(f, "graph {{ \n{nodes}\n{edges}\n }}")
    }
}
