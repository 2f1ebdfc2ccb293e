use super::{
    check_coverage, clamp_op_instances, schedulable_types, trim_to_budget,
    Allocation, Allocator, Provisioning,
};
use crate::{lp, traversal::Named};
use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables,
    SolverModel, Variable,
};
use hls_ir::{HlsInput, ResourceId};
use hls_utils::{Error, HlsResult};

/// Discount applied to the latency-weighted area of a resource type when
/// ranking the selected types of an operation type.
const PIPELINE_REWARD: f64 = 2.0;

/// Coverage-driven allocation through a 0/1 integer program.
///
/// The program selects as many resource types as fit in the area limit
/// (assuming one instance each) while covering every schedulable operation
/// type. Each operation type then uses its cheapest selected resource type.
/// Instance counts start at one per operation type and are trimmed back to
/// the area limit; they are tentative and revised after scheduling.
#[derive(Default)]
pub struct IlpAllocator;

impl Named for IlpAllocator {
    fn name() -> &'static str {
        "ilp"
    }

    fn description() -> &'static str {
        "select resource types with a coverage-maximizing 0/1 program"
    }
}

impl IlpAllocator {
    /// Solve the selection program. Resource types that implement no
    /// schedulable operation type are pinned to zero.
    fn select(input: &HlsInput) -> HlsResult<Vec<bool>> {
        let resources = &input.library.resources;
        if resources.is_empty() {
            return Ok(Vec::new());
        }
        let op_types = &input.cdfg.op_types;

        let mut vars = ProblemVariables::new();
        let selected: Vec<Variable> = resources
            .iter()
            .map(|rt| {
                let useful =
                    rt.compatible.iter().any(|&ot| op_types[ot].needs_schedule());
                if useful {
                    vars.add(variable().binary())
                } else {
                    vars.add(variable().integer().min(0).max(0))
                }
            })
            .collect();

        let objective: Expression = selected.iter().copied().sum();
        let mut model = vars.maximise(objective).using(default_solver);
        let mut rows = 1;
        for ot in schedulable_types(input) {
            let cover: Expression =
                input.compatible_resources(ot).map(|rt| selected[rt]).sum();
            model = model.with(constraint!(cover >= 1));
            rows += 1;
        }
        let area: Expression = selected
            .iter()
            .zip(resources)
            .map(|(&x, rt)| f64::from(rt.area) * x)
            .sum();
        let limit = f64::from(input.library.area_limit);
        model = model.with(constraint!(area <= limit));

        log::debug!(
            "ilp: selection model with {} variables and {rows} constraints",
            selected.len()
        );
        let sol = model
            .solve()
            .map_err(|e| lp::solver_error("resource type selection", e))?;
        Ok(selected.iter().map(|&x| lp::int_value(&sol, x) == 1).collect())
    }

    /// Cheapest selected resource type of every schedulable operation type.
    fn assign(
        input: &HlsInput,
        selected: &[bool],
    ) -> HlsResult<Vec<Option<ResourceId>>> {
        let mut op_resource = vec![None; input.cdfg.op_types.len()];
        for ot in schedulable_types(input) {
            let mut best = f64::INFINITY;
            for rtid in input.compatible_resources(ot).filter(|&r| selected[r]) {
                let rt = &input.library.resources[rtid];
                let cost =
                    f64::from(rt.area) * f64::from(rt.latency + 1) / PIPELINE_REWARD;
                if cost < best {
                    best = cost;
                    op_resource[ot] = Some(rtid);
                }
            }
            if op_resource[ot].is_none() {
                return Err(Error::coverage(format!(
                    "no selected resource type implements operation type {ot}"
                )));
            }
        }
        Ok(op_resource)
    }
}

impl Allocator for IlpAllocator {
    fn allocate(&mut self, input: &HlsInput) -> HlsResult<Allocation> {
        check_coverage(input)?;
        let selected = Self::select(input)?;
        log::debug!("ilp: selected resource types {selected:?}");
        let op_resource = Self::assign(input, &selected)?;

        let op_instances = op_resource.iter().map(|rt| u32::from(rt.is_some())).collect();
        let mut alloc = Allocation::new(
            input,
            op_resource,
            op_instances,
            Provisioning::Tentative,
        );
        trim_to_budget(input, &alloc.op_resource, &mut alloc.resource_instances)?;
        clamp_op_instances(
            input,
            &alloc.op_resource,
            &alloc.resource_instances,
            &mut alloc.op_instances,
        );
        alloc.check_budget(input)?;
        Ok(alloc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocate::tests::independent_adds;
    use hls_ir::{
        BasicBlock, Cdfg, OpCategory, OperationDef, ResourceLibrary,
        ResourceType,
    };

    #[test]
    fn never_selects_useless_resources() {
        let input = independent_adds(
            3,
            100,
            vec![
                ResourceType::sequential(10, 1, false, 1.0, [0]),
                ResourceType::combinational(5, 1.0, []),
                // type 1 is a branch and never scheduled
                ResourceType::combinational(3, 1.0, [1]),
            ],
        );
        let alloc = IlpAllocator.allocate(&input).unwrap();
        assert_eq!(alloc.op_resource, vec![Some(0), None]);
        assert_eq!(alloc.resource_instances, vec![1, 0, 0]);
        assert_eq!(alloc.provisioning, Provisioning::Tentative);
    }

    #[test]
    fn prefers_cheap_latency_weighted_area() {
        let input = independent_adds(
            2,
            100,
            vec![
                ResourceType::sequential(4, 2, true, 1.0, [0]),
                ResourceType::combinational(10, 1.0, [0]),
            ],
        );
        // 4*3/2 = 6 against 10*1/2 = 5
        let alloc = IlpAllocator.allocate(&input).unwrap();
        assert_eq!(alloc.op_resource, vec![Some(1), None]);
    }

    #[test]
    fn infeasible_selection_is_a_solver_failure() {
        let input = independent_adds(
            1,
            5,
            vec![ResourceType::combinational(10, 1.0, [0])],
        );
        let err = IlpAllocator.allocate(&input).unwrap_err();
        assert_eq!(err.kind(), "solver");
    }

    #[test]
    fn uncovered_type_fails_before_solving() {
        let input = independent_adds(
            1,
            50,
            vec![ResourceType::combinational(10, 1.0, [1])],
        );
        let err = IlpAllocator.allocate(&input).unwrap_err();
        assert_eq!(err.kind(), "coverage");
    }

    #[test]
    fn shared_resource_is_trimmed_to_the_limit() {
        let library = ResourceLibrary::new(
            10.0,
            15,
            vec![ResourceType::sequential(10, 1, false, 1.0, [0, 1])],
        )
        .unwrap();
        let cdfg = Cdfg::new(
            vec![OpCategory::Arithmetic, OpCategory::Compare],
            vec![BasicBlock::new(vec![0, 1], vec![], vec![], 1.0)],
            vec![OperationDef::new(0, []), OperationDef::new(1, [Some(0)])],
        )
        .unwrap();
        let input = HlsInput::new(library, cdfg).unwrap();
        let alloc = IlpAllocator.allocate(&input).unwrap();
        assert_eq!(alloc.op_resource, vec![Some(0), Some(0)]);
        assert_eq!(alloc.resource_instances, vec![1]);
        assert_eq!(alloc.op_instances, vec![1, 1]);
    }
}
