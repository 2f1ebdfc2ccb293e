//! Resource allocation: choose a resource type for every operation type and
//! decide how many instances of it to provision.
mod ilp;
mod min_area;
mod perf;
mod trim;

pub use ilp::IlpAllocator;
pub use min_area::MinAreaAllocator;
pub use perf::PerfAllocator;
pub use trim::{clamp_op_instances, trim_to_budget};

use crate::traversal::Named;
use hls_ir::{HlsInput, OpTypeId, ResourceId, Solution};
use hls_utils::{Error, HlsResult};
use itertools::Itertools;

/// How the scheduler should treat the instance counts of an allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provisioning {
    /// The counts bound the number of concurrent operations.
    Fixed,
    /// The counts are a first guess; the schedule decides the real ones.
    Tentative,
}

/// The output of an allocator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub op_resource: Vec<Option<ResourceId>>,
    pub op_instances: Vec<u32>,
    pub resource_instances: Vec<u32>,
    pub provisioning: Provisioning,
}

impl Allocation {
    /// Build an allocation where every resource type provides the instances
    /// of all operation types mapped onto it.
    pub fn new(
        input: &HlsInput,
        op_resource: Vec<Option<ResourceId>>,
        op_instances: Vec<u32>,
        provisioning: Provisioning,
    ) -> Self {
        let mut resource_instances = vec![0; input.library.resources.len()];
        for (ot, rtid) in op_resource.iter().enumerate() {
            if let Some(rtid) = rtid {
                resource_instances[*rtid] += op_instances[ot];
            }
        }
        Allocation {
            op_resource,
            op_instances,
            resource_instances,
            provisioning,
        }
    }

    pub fn area(&self, input: &HlsInput) -> u64 {
        self.resource_instances
            .iter()
            .zip(&input.library.resources)
            .map(|(&n, rt)| u64::from(n) * u64::from(rt.area))
            .sum()
    }

    /// Fail unless the provisioned instances fit in the area limit.
    pub fn check_budget(&self, input: &HlsInput) -> HlsResult<()> {
        let area = self.area(input);
        let limit = input.library.area_limit;
        if area > u64::from(limit) {
            return Err(Error::budget(format!(
                "allocation needs area {area}, the limit is {limit}"
            )));
        }
        Ok(())
    }

    /// Write the allocation into `sol`, discarding any schedule.
    pub fn commit(self, sol: &mut Solution) {
        sol.op_resource = self.op_resource;
        sol.op_instances = self.op_instances;
        sol.resource_instances = self.resource_instances;
        sol.clear_schedule();
    }
}

/// A resource allocation strategy.
pub trait Allocator: Named {
    fn allocate(&mut self, input: &HlsInput) -> HlsResult<Allocation>;
}

/// Operation types that must be scheduled, in index order.
pub(crate) fn schedulable_types(
    input: &HlsInput,
) -> impl Iterator<Item = OpTypeId> + '_ {
    input
        .cdfg
        .op_types
        .iter()
        .enumerate()
        .filter(|(_, cat)| cat.needs_schedule())
        .map(|(ot, _)| ot)
}

/// Every schedulable operation type needs at least one compatible resource
/// type.
pub(crate) fn check_coverage(input: &HlsInput) -> HlsResult<()> {
    let uncovered = schedulable_types(input)
        .filter(|&ot| input.compatible_resources(ot).next().is_none())
        .collect_vec();
    if !uncovered.is_empty() {
        return Err(Error::coverage(format!(
            "no resource type implements operation types [{}]",
            uncovered.iter().join(", ")
        )));
    }
    Ok(())
}
