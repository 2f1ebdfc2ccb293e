use super::{resource_limits, schedule_blocks, BlockScheduler, Limit, Scheduler};
use crate::{lp, traversal::Named};
use good_lp::{
    constraint, default_solver, variable, ProblemVariables, SolverModel,
    Variable,
};
use hls_ir::{DependencyGraph, HlsInput, OpId, Solution};
use hls_utils::HlsResult;
use linked_hash_map::LinkedHashMap;

/// Schedules every block by solving a system of difference constraints.
///
/// Each schedulable operation gets an integer start cycle and the block gets
/// an end variable that bounds all of them; the objective minimizes the end.
/// Data dependencies keep a consumer `latency + 1` cycles behind its
/// producer. Under [Limit::Provisioned], the operations sharing a resource
/// type with `k` instances are taken in topological order and every
/// operation must start at least one occupancy after the operation `k`
/// positions before it.
#[derive(Default)]
pub struct SdcScheduler {
    /// Instances per resource type, `None` when unconstrained.
    limits: Vec<Option<u32>>,
}

impl Named for SdcScheduler {
    fn name() -> &'static str {
        "sdc"
    }

    fn description() -> &'static str {
        "per-block integer program over difference constraints"
    }
}

impl BlockScheduler for SdcScheduler {
    fn schedule_block(
        &mut self,
        input: &HlsInput,
        sol: &Solution,
        graph: &DependencyGraph,
    ) -> HlsResult<Vec<(OpId, u32)>> {
        let cdfg = &input.cdfg;
        // reject cycles before building a model around them
        graph.topological_sort()?;

        let mut vars = ProblemVariables::new();
        let start: LinkedHashMap<OpId, Variable> = graph
            .iter()
            .filter(|(op, _)| cdfg.category(*op).needs_schedule())
            .map(|(op, _)| (op, vars.add(variable().integer().min(0))))
            .collect();
        if start.is_empty() {
            return Ok(Vec::new());
        }
        let end = vars.add(variable().integer().min(0));
        let mut model = vars.minimise(end).using(default_solver);
        let mut rows = 0;

        for (u, v) in graph.edges() {
            let (Some(&xu), Some(&xv)) = (start.get(&u), start.get(&v)) else {
                continue;
            };
            let distance = f64::from(sol.latency_of(input, u) + 1);
            model = model.with(constraint!(xv - xu >= distance));
            rows += 1;
        }
        for &x in start.values() {
            model = model.with(constraint!(x - end <= 0));
            rows += 1;
        }

        let n_resources = input.library.resources.len();
        let by_resource =
            graph.sort_by_resource(cdfg, &sol.op_resource, n_resources)?;
        for (rtid, ops) in by_resource.into_iter().enumerate() {
            let Some(k) = self.limits[rtid] else { continue };
            let ops: Vec<Variable> = ops
                .into_iter()
                .filter(|&op| cdfg.category(op).needs_bind())
                .filter_map(|op| start.get(&op).copied())
                .collect();
            let occupancy = f64::from(input.library.resources[rtid].occupancy());
            for (&earlier, &later) in ops.iter().zip(ops.iter().skip(k as usize)) {
                model = model.with(constraint!(later - earlier >= occupancy));
                rows += 1;
            }
        }

        log::debug!(
            "sdc: block {} model with {} variables and {rows} constraints",
            graph.block(),
            start.len() + 1
        );
        let solution = model.solve().map_err(|e| {
            lp::solver_error(&format!("schedule of block {}", graph.block()), e)
        })?;
        Ok(start
            .iter()
            .map(|(&op, &x)| (op, lp::int_value(&solution, x).max(0) as u32))
            .collect())
    }
}

impl Scheduler for SdcScheduler {
    fn schedule(
        &mut self,
        input: &HlsInput,
        sol: &Solution,
        limit: Limit,
    ) -> HlsResult<Vec<Option<u32>>> {
        self.limits = resource_limits(input, sol, limit)?;
        schedule_blocks(self, input, sol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::tests::two_blocks;
    use hls_ir::{
        BasicBlock, Cdfg, OpCategory, OperationDef, ResourceLibrary,
        ResourceType,
    };

    #[test]
    fn dependencies_set_the_pace() {
        let (input, sol) = two_blocks();
        let schedule = SdcScheduler::default()
            .schedule(&input, &sol, Limit::Unlimited)
            .unwrap();
        // the chain 0 -> 1 is tight: it decides the makespan of block 0
        assert_eq!(schedule[0], Some(1));
        assert_eq!(schedule[1], Some(4));
        assert_eq!(schedule[2], None);
        assert_eq!(schedule[3], None);
        assert_eq!(schedule[4], Some(7));
    }

    fn parallel_adds(n: usize, pipelined: bool) -> (HlsInput, Solution) {
        let library = ResourceLibrary::new(
            10.0,
            100,
            vec![ResourceType::sequential(10, 2, pipelined, 1.0, [0])],
        )
        .unwrap();
        let cdfg = Cdfg::new(
            vec![OpCategory::Arithmetic],
            vec![BasicBlock::new((0..n).collect(), vec![], vec![], 1.0)],
            (0..n).map(|_| OperationDef::new(0, [None])).collect(),
        )
        .unwrap();
        let input = HlsInput::new(library, cdfg).unwrap();
        let mut sol = Solution::new(&input);
        sol.op_resource = vec![Some(0)];
        sol.op_instances = vec![1];
        sol.resource_instances = vec![1];
        (input, sol)
    }

    #[test]
    fn one_instance_serializes_independent_operations() {
        let (input, sol) = parallel_adds(3, false);
        let schedule = SdcScheduler::default()
            .schedule(&input, &sol, Limit::Provisioned)
            .unwrap();
        let mut cycles: Vec<u32> = schedule.into_iter().flatten().collect();
        cycles.sort_unstable();
        assert_eq!(cycles, vec![1, 4, 7]);

        let schedule = SdcScheduler::default()
            .schedule(&input, &sol, Limit::Unlimited)
            .unwrap();
        assert_eq!(schedule, vec![Some(1); 3]);
    }

    #[test]
    fn pipelined_units_accept_one_operation_per_cycle() {
        let (input, sol) = parallel_adds(3, true);
        let schedule = SdcScheduler::default()
            .schedule(&input, &sol, Limit::Provisioned)
            .unwrap();
        let mut cycles: Vec<u32> = schedule.into_iter().flatten().collect();
        cycles.sort_unstable();
        assert_eq!(cycles, vec![1, 2, 3]);
    }
}
