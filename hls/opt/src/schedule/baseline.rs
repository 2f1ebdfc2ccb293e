use super::{schedule_blocks, BlockScheduler, Limit, Scheduler};
use crate::traversal::Named;
use hls_ir::{DependencyGraph, HlsInput, OpId, Solution};
use hls_utils::HlsResult;

/// Runs the operations of every block one after the other, in a topological
/// order. Never uses more than one instance of anything, so it satisfies any
/// provisioning.
#[derive(Default)]
pub struct BaselineScheduler;

impl Named for BaselineScheduler {
    fn name() -> &'static str {
        "baseline"
    }

    fn description() -> &'static str {
        "fully serial schedule in topological order"
    }
}

impl BlockScheduler for BaselineScheduler {
    fn schedule_block(
        &mut self,
        input: &HlsInput,
        sol: &Solution,
        graph: &DependencyGraph,
    ) -> HlsResult<Vec<(OpId, u32)>> {
        let mut cycle = 0;
        let mut out = Vec::new();
        for op in graph.topological_sort()? {
            if !input.category(op).needs_schedule() {
                continue;
            }
            out.push((op, cycle));
            cycle += sol.latency_of(input, op) + 1;
        }
        Ok(out)
    }
}

impl Scheduler for BaselineScheduler {
    fn schedule(
        &mut self,
        input: &HlsInput,
        sol: &Solution,
        _limit: Limit,
    ) -> HlsResult<Vec<Option<u32>>> {
        schedule_blocks(self, input, sol)
    }
}
