//! Scheduling: assign a start cycle to every operation that needs one.
//!
//! Block-based schedulers ([BaselineScheduler], [SdcScheduler]) place one
//! basic block at a time, in the order given by [block_order], and stack the
//! blocks one after the other starting at cycle 1. The [ListScheduler] works
//! on the whole CDFG at once.
mod baseline;
mod block_order;
mod list;
mod sdc;

pub use baseline::BaselineScheduler;
pub use block_order::block_order;
pub use list::ListScheduler;
pub use sdc::SdcScheduler;

use crate::traversal::Named;
use hls_ir::{DependencyGraph, HlsInput, OpId, Solution};
use hls_utils::{Error, HlsResult};

/// Which constraints a scheduler honours besides data dependencies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Limit {
    /// As many concurrent operations as the schedule wants.
    Unlimited,
    /// No more concurrent operations than the provisioned instances.
    Provisioned,
}

/// A scheduling strategy. Returns the start cycle of every operation, `None`
/// for the operations that are never scheduled.
pub trait Scheduler: Named {
    fn schedule(
        &mut self,
        input: &HlsInput,
        sol: &Solution,
        limit: Limit,
    ) -> HlsResult<Vec<Option<u32>>>;
}

/// A scheduler that works on one basic block at a time.
pub trait BlockScheduler {
    /// Start cycles of the schedulable operations of `graph`'s block,
    /// relative to the start of the block.
    fn schedule_block(
        &mut self,
        input: &HlsInput,
        sol: &Solution,
        graph: &DependencyGraph,
    ) -> HlsResult<Vec<(OpId, u32)>>;
}

/// Schedule every block with `sched` and lay the blocks out one after the
/// other. A block lasts until its last operation has produced its result.
pub fn schedule_blocks<S: BlockScheduler>(
    sched: &mut S,
    input: &HlsInput,
    sol: &Solution,
) -> HlsResult<Vec<Option<u32>>> {
    let mut schedule = vec![None; input.cdfg.operations.len()];
    let mut start = 1;
    for bb in block_order(&input.cdfg)? {
        let graph = DependencyGraph::build(&input.cdfg, bb);
        let mut makespan = 0;
        for (op, cycle) in sched.schedule_block(input, sol, &graph)? {
            schedule[op] = Some(start + cycle);
            makespan = makespan.max(cycle + sol.latency_of(input, op) + 1);
        }
        log::debug!("block {bb}: cycles {start}..{}", start + makespan);
        start += makespan;
    }
    Ok(schedule)
}

/// Concurrency bound of every operation type. Only bindable operation types
/// are bounded, and only under [Limit::Provisioned].
pub(crate) fn op_type_limits(
    input: &HlsInput,
    sol: &Solution,
    limit: Limit,
) -> HlsResult<Vec<Option<u32>>> {
    let cdfg = &input.cdfg;
    let mut limits = vec![None; cdfg.op_types.len()];
    if limit == Limit::Unlimited {
        return Ok(limits);
    }
    for op in &cdfg.operations {
        let ot = op.op_type;
        if limits[ot].is_some() || !cdfg.op_types[ot].needs_bind() {
            continue;
        }
        if sol.op_resource[ot].is_none() || sol.op_instances[ot] == 0 {
            return Err(Error::coverage(format!(
                "operation type {ot} has no provisioned instance"
            )));
        }
        limits[ot] = Some(sol.op_instances[ot]);
    }
    Ok(limits)
}

/// Concurrency bound of every resource type used by bindable operations,
/// under [Limit::Provisioned].
pub(crate) fn resource_limits(
    input: &HlsInput,
    sol: &Solution,
    limit: Limit,
) -> HlsResult<Vec<Option<u32>>> {
    let cdfg = &input.cdfg;
    let mut limits = vec![None; input.library.resources.len()];
    if limit == Limit::Unlimited {
        return Ok(limits);
    }
    for op in &cdfg.operations {
        if !cdfg.op_types[op.op_type].needs_bind() {
            continue;
        }
        let Some(rtid) = sol.op_resource[op.op_type] else {
            return Err(Error::coverage(format!(
                "operation type {} has no resource type",
                op.op_type
            )));
        };
        if sol.resource_instances[rtid] == 0 {
            return Err(Error::coverage(format!(
                "resource type {rtid} has no provisioned instance"
            )));
        }
        limits[rtid] = Some(sol.resource_instances[rtid]);
    }
    Ok(limits)
}
