use crate::{HlsInput, OpId, Report, ResourceId, ResourceType};

/// Synthesis state built up by the passes.
///
/// The allocator fills in the resource map and the instance counts, the
/// scheduler the start cycles and the binder the instance indices. `None`
/// marks an unmapped operation type, an unscheduled or an unbound operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Solution {
    /// Resource type implementing each operation type.
    pub op_resource: Vec<Option<ResourceId>>,
    /// Instances provisioned for each operation type.
    pub op_instances: Vec<u32>,
    /// Instances provisioned for each resource type.
    pub resource_instances: Vec<u32>,
    /// Start cycle of each operation.
    pub schedule: Vec<Option<u32>>,
    /// Instance index of each operation, relative to its resource type.
    pub binding: Vec<Option<u32>>,
}

impl Solution {
    /// An empty solution sized for `input`.
    pub fn new(input: &HlsInput) -> Self {
        let n_op_type = input.cdfg.op_types.len();
        let n_ops = input.cdfg.operations.len();
        Solution {
            op_resource: vec![None; n_op_type],
            op_instances: vec![0; n_op_type],
            resource_instances: vec![0; input.library.resources.len()],
            schedule: vec![None; n_ops],
            binding: vec![None; n_ops],
        }
    }

    /// Resource type implementing operation `op`, if any.
    pub fn resource_of(&self, input: &HlsInput, op: OpId) -> Option<ResourceId> {
        self.op_resource[input.cdfg.operations[op].op_type]
    }

    /// Latency of the unit executing `op`. Operations without a resource
    /// type complete in the cycle they start.
    pub fn latency_of(&self, input: &HlsInput, op: OpId) -> u32 {
        self.resource_type(input, op).map_or(0, |rt| rt.latency)
    }

    pub fn resource_type<'a>(
        &self,
        input: &'a HlsInput,
        op: OpId,
    ) -> Option<&'a ResourceType> {
        self.resource_of(input, op)
            .map(|rtid| &input.library.resources[rtid])
    }

    /// Total area of the provisioned instances.
    pub fn area(&self, input: &HlsInput) -> u64 {
        self.resource_instances
            .iter()
            .zip(&input.library.resources)
            .map(|(&n, rt)| u64::from(n) * u64::from(rt.area))
            .sum()
    }

    /// Forget the schedule and the binding, keeping the allocation.
    pub fn clear_schedule(&mut self) {
        self.schedule.iter_mut().for_each(|c| *c = None);
        self.binding.iter_mut().for_each(|b| *b = None);
    }

    /// Rewrite the instance counts to the number of instance indices the
    /// binding actually uses. Memory operations are never bound and keep
    /// their provisioned ports.
    pub fn recount_instances(&mut self, input: &HlsInput) {
        let mut used: Vec<Vec<u32>> = vec![Vec::new(); self.op_instances.len()];
        let mut per_resource = vec![0u32; self.resource_instances.len()];
        for op in &input.cdfg.operations {
            let (Some(inst), Some(rtid)) =
                (self.binding[op.id], self.op_resource[op.op_type])
            else {
                continue;
            };
            per_resource[rtid] = per_resource[rtid].max(inst + 1);
            used[op.op_type].push(inst);
        }
        for (ot, insts) in used.iter_mut().enumerate() {
            let category = input.cdfg.op_types[ot];
            if category.is_memory() {
                if let Some(rtid) = self.op_resource[ot] {
                    per_resource[rtid] += self.op_instances[ot];
                }
            } else {
                // distinct instances occupied by this operation type
                insts.sort_unstable();
                insts.dedup();
                self.op_instances[ot] = insts.len() as u32;
            }
        }
        self.resource_instances = per_resource;
    }

    /// The externally visible result.
    pub fn report(&self, input: &HlsInput) -> Report {
        let binding = input
            .cdfg
            .operations
            .iter()
            .map(|op| {
                let rtid = self.op_resource[op.op_type]?;
                let inst = self.binding[op.id]?;
                Some((rtid, inst))
            })
            .collect();
        Report {
            schedule: self.schedule.clone(),
            instances: self.resource_instances.clone(),
            binding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BasicBlock, Cdfg, OpCategory, OperationDef, ResourceLibrary};

    fn input() -> HlsInput {
        let library = ResourceLibrary::new(
            10.0,
            100,
            vec![
                ResourceType::sequential(10, 2, false, 1.0, [0]),
                ResourceType::combinational(3, 1.0, [0, 1]),
            ],
        )
        .unwrap();
        let cdfg = Cdfg::new(
            vec![OpCategory::Arithmetic, OpCategory::Compare, OpCategory::Phi],
            vec![BasicBlock::new(vec![0, 1, 2, 3], vec![], vec![], 1.0)],
            vec![
                OperationDef::new(0, [None]),
                OperationDef::new(0, [None]),
                OperationDef::new(1, [Some(0), Some(1)]),
                OperationDef::new(2, [Some(2)]),
            ],
        )
        .unwrap();
        HlsInput::new(library, cdfg).unwrap()
    }

    #[test]
    fn starts_empty() {
        let input = input();
        let sol = Solution::new(&input);
        assert_eq!(sol.op_resource, vec![None; 3]);
        assert_eq!(sol.schedule, vec![None; 4]);
        assert_eq!(sol.area(&input), 0);
        assert_eq!(sol.latency_of(&input, 0), 0);
    }

    #[test]
    fn area_and_latency_follow_the_allocation() {
        let input = input();
        let mut sol = Solution::new(&input);
        sol.op_resource = vec![Some(0), Some(1), None];
        sol.resource_instances = vec![2, 1];
        assert_eq!(sol.area(&input), 23);
        assert_eq!(sol.latency_of(&input, 1), 2);
        assert_eq!(sol.latency_of(&input, 2), 0);
        assert_eq!(sol.resource_of(&input, 3), None);
    }

    #[test]
    fn recount_uses_the_binding() {
        let input = input();
        let mut sol = Solution::new(&input);
        sol.op_resource = vec![Some(0), Some(1), None];
        sol.op_instances = vec![4, 4, 0];
        sol.resource_instances = vec![4, 4];
        sol.schedule = vec![Some(1), Some(1), Some(4), None];
        sol.binding = vec![Some(0), Some(1), Some(0), None];
        sol.recount_instances(&input);
        assert_eq!(sol.op_instances, vec![2, 1, 0]);
        assert_eq!(sol.resource_instances, vec![2, 1]);

        let report = sol.report(&input);
        assert_eq!(
            report.binding,
            vec![Some((0, 0)), Some((0, 1)), Some((1, 0)), None]
        );
        assert_eq!(report.to_string(), "1 1 4 -1\n2 1\n0 0\n0 1\n1 0\n-1\n");
    }
}
