//! Binding: map every scheduled ARITHMETIC/BOOLEAN/COMPARE operation onto an
//! instance of its resource type.
//!
//! Operations that compete for the same instances form a conflict graph. Two
//! operations conflict when their occupied intervals overlap. The graph of a
//! group of operations is colored greedily in start-cycle order, which is a
//! left-endpoint order of an interval graph, so each group uses exactly as
//! many instances as its peak concurrency.
mod conflict;

pub use conflict::ConflictGraph;

use crate::traversal::Named;
use hls_ir::{HlsInput, OpId, ResourceId, Solution};
use hls_utils::{Error, HlsResult};
use itertools::Itertools;
use std::fmt;

/// A binding strategy. Returns the instance index of every operation, `None`
/// for the operations that are never bound.
pub trait Binder: Named {
    fn bind(
        &mut self,
        input: &HlsInput,
        sol: &Solution,
    ) -> HlsResult<Vec<Option<u32>>>;
}

/// Which operations compete for the same instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scope {
    /// Operations of the same operation type.
    OpType,
    /// Operations mapped to the same resource type.
    Resource,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::OpType => f.write_str("operation type"),
            Scope::Resource => f.write_str("resource type"),
        }
    }
}

/// Every operation type gets its own instances. Instance indices of later
/// operation types mapped to the same resource type start after the ones
/// used by earlier operation types.
#[derive(Default)]
pub struct ExclusiveBinder;

impl Named for ExclusiveBinder {
    fn name() -> &'static str {
        "exclusive"
    }

    fn description() -> &'static str {
        "operation types never share resource instances"
    }
}

impl Binder for ExclusiveBinder {
    fn bind(
        &mut self,
        input: &HlsInput,
        sol: &Solution,
    ) -> HlsResult<Vec<Option<u32>>> {
        let groups = color_groups(input, sol, Scope::OpType)?;
        let mut offset = vec![0; input.library.resources.len()];
        let mut binding = vec![None; input.cdfg.operations.len()];
        for (ot, group) in groups.into_iter().enumerate() {
            let Some(group) = group else { continue };
            for &(op, color) in &group.colors {
                binding[op] = Some(offset[group.resource] + color);
            }
            offset[group.resource] += group.used;
            log::debug!(
                "exclusive: operation type {ot} uses {} instances of resource type {}",
                group.used,
                group.resource
            );
        }
        Ok(binding)
    }
}

/// All operation types mapped to a resource type share its instances.
#[derive(Default)]
pub struct SharedBinder;

impl Named for SharedBinder {
    fn name() -> &'static str {
        "shared"
    }

    fn description() -> &'static str {
        "operation types mapped to one resource type share its instances"
    }
}

impl Binder for SharedBinder {
    fn bind(
        &mut self,
        input: &HlsInput,
        sol: &Solution,
    ) -> HlsResult<Vec<Option<u32>>> {
        let groups = color_groups(input, sol, Scope::Resource)?;
        let mut binding = vec![None; input.cdfg.operations.len()];
        for group in groups.into_iter().flatten() {
            log::debug!(
                "shared: resource type {} uses {} instances",
                group.resource,
                group.used
            );
            for (op, color) in group.colors {
                binding[op] = Some(color);
            }
        }
        Ok(binding)
    }
}

/// The coloring of one group of competing operations.
struct Group {
    resource: ResourceId,
    colors: Vec<(OpId, u32)>,
    /// Number of distinct colors.
    used: u32,
}

/// Split the bindable operations by `scope` and color each group. The
/// result is indexed by operation type or resource type.
fn color_groups(
    input: &HlsInput,
    sol: &Solution,
    scope: Scope,
) -> HlsResult<Vec<Option<Group>>> {
    let cdfg = &input.cdfg;
    let n_groups = match scope {
        Scope::OpType => cdfg.op_types.len(),
        Scope::Resource => input.library.resources.len(),
    };
    let mut members: Vec<Vec<(OpId, u32)>> = vec![Vec::new(); n_groups];
    let mut resource_of = vec![None; n_groups];

    for op in &cdfg.operations {
        if !cdfg.op_types[op.op_type].needs_bind() {
            continue;
        }
        let rtid = sol.op_resource[op.op_type].ok_or_else(|| {
            Error::coverage(format!(
                "operation {} has no resource type to bind to",
                op.id
            ))
        })?;
        let cycle = sol.schedule[op.id].ok_or_else(|| {
            Error::misc(format!("operation {} is bound before it is scheduled", op.id))
        })?;
        let key = match scope {
            Scope::OpType => op.op_type,
            Scope::Resource => rtid,
        };
        resource_of[key] = Some(rtid);
        members[key].push((op.id, cycle));
    }

    Ok(members
        .into_iter()
        .zip(resource_of)
        .enumerate()
        .map(|(key, (ops, rtid))| {
            let rtid = rtid?;
            Some(color_group(input, scope, key, rtid, ops))
        })
        .collect())
}

fn color_group(
    input: &HlsInput,
    scope: Scope,
    key: usize,
    rtid: ResourceId,
    ops: Vec<(OpId, u32)>,
) -> Group {
    let rt = &input.library.resources[rtid];
    let mut graph = ConflictGraph::default();
    for (i, &(a, ca)) in ops.iter().enumerate() {
        graph.insert_node(a);
        for &(b, cb) in &ops[..i] {
            if rt.overlaps(ca, cb) {
                graph.insert_conflict(a, b);
            }
        }
    }
    log::trace!("conflicts of {scope} {key}:\n{graph}");

    let order = ops
        .iter()
        .sorted_by_key(|&&(op, cycle)| (cycle, op))
        .map(|&(op, _)| op);
    let coloring = graph.color_greedy_with(order);

    let colors = ops
        .iter()
        .filter_map(|&(op, _)| coloring.get(&op).map(|&c| (op, c)))
        .collect_vec();
    let used = colors.iter().map(|&(_, c)| c + 1).max().unwrap_or(0);
    Group {
        resource: rtid,
        colors,
        used,
    }
}
