use crate::{BlockId, Cdfg, OpCategory, OpId, ResourceId};
use hls_utils::{Error, HlsResult};
use itertools::Itertools;
use linked_hash_map::LinkedHashMap;
use std::collections::VecDeque;

/// A vertex of a [DependencyGraph]: the number of unresolved producers and
/// the operations consuming this one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepNode {
    pub in_degree: usize,
    pub succs: Vec<OpId>,
}

/// The data dependency graph induced by the operations of one basic block.
///
/// Only operands produced inside the block become edges. Values flowing in
/// from other blocks (including loop back-edges) are ignored, and so are the
/// operands of PHI nodes: a PHI merges values and must not order the
/// operations it reads from.
///
/// Vertices iterate in the order the block lists its operations.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    block: BlockId,
    nodes: LinkedHashMap<OpId, DepNode>,
}

impl DependencyGraph {
    pub fn build(cdfg: &Cdfg, block: BlockId) -> Self {
        let bb = &cdfg.blocks[block];
        let mut nodes: LinkedHashMap<OpId, DepNode> = bb
            .ops
            .iter()
            .map(|&op| (op, DepNode::default()))
            .collect();

        for &v in &bb.ops {
            if cdfg.category(v) == OpCategory::Phi {
                continue;
            }
            for u in cdfg.operations[v].producers() {
                if !nodes.contains_key(&u) {
                    continue;
                }
                if let Some(node) = nodes.get_mut(&v) {
                    node.in_degree += 1;
                }
                if let Some(node) = nodes.get_mut(&u) {
                    node.succs.push(v);
                }
            }
        }

        DependencyGraph { block, nodes }
    }

    #[inline]
    pub fn block(&self) -> BlockId {
        self.block
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, op: OpId) -> Option<&DepNode> {
        self.nodes.get(&op)
    }

    /// Vertices in block order.
    pub fn iter(&self) -> impl Iterator<Item = (OpId, &DepNode)> + '_ {
        self.nodes.iter().map(|(&op, node)| (op, node))
    }

    /// All `(producer, consumer)` edges.
    pub fn edges(&self) -> impl Iterator<Item = (OpId, OpId)> + '_ {
        self.iter()
            .flat_map(|(u, node)| node.succs.iter().map(move |&v| (u, v)))
    }

    /// Kahn's algorithm. Calls `visit` on every vertex in a topological order
    /// and fails if some vertices are never released.
    fn worklist<F>(&self, mut visit: F) -> HlsResult<()>
    where
        F: FnMut(OpId),
    {
        let mut in_degree: LinkedHashMap<OpId, usize> = self
            .nodes
            .iter()
            .map(|(&op, node)| (op, node.in_degree))
            .collect();
        let mut ready: VecDeque<OpId> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&op, _)| op)
            .collect();

        let mut visited = 0;
        while let Some(v) = ready.pop_front() {
            visited += 1;
            visit(v);
            for &u in &self.nodes[&v].succs {
                if let Some(deg) = in_degree.get_mut(&u) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push_back(u);
                    }
                }
            }
        }

        if visited != self.nodes.len() {
            let stuck = in_degree
                .iter()
                .filter(|(_, &deg)| deg > 0)
                .map(|(op, _)| op)
                .sorted()
                .join(", ");
            return Err(Error::cycle(format!(
                "block {} has a dependency cycle through operations [{stuck}]",
                self.block
            )));
        }
        Ok(())
    }

    /// Operations of the block in a dependency-respecting order.
    pub fn topological_sort(&self) -> HlsResult<Vec<OpId>> {
        let mut out = Vec::with_capacity(self.len());
        self.worklist(|v| out.push(v))?;
        Ok(out)
    }

    /// Topological order bucketed by operation type: `out[ot]` lists the
    /// operations of type `ot` in the order they were released.
    pub fn sort_by_op_type(&self, cdfg: &Cdfg) -> HlsResult<Vec<Vec<OpId>>> {
        let mut out = vec![Vec::new(); cdfg.op_types.len()];
        self.worklist(|v| out[cdfg.operations[v].op_type].push(v))?;
        Ok(out)
    }

    /// Topological order bucketed by the resource type implementing each
    /// operation. Operations without a resource type are left out.
    pub fn sort_by_resource(
        &self,
        cdfg: &Cdfg,
        op_resource: &[Option<ResourceId>],
        n_resources: usize,
    ) -> HlsResult<Vec<Vec<OpId>>> {
        let mut out = vec![Vec::new(); n_resources];
        self.worklist(|v| match op_resource[cdfg.operations[v].op_type] {
            Some(rtid) => out[rtid].push(v),
            None if cdfg.category(v).needs_schedule() => {
                log::warn!("operation {v} needs scheduling but has no resource type")
            }
            None => (),
        })?;
        Ok(out)
    }
}
