use super::{check_coverage, Allocation, Allocator, Provisioning};
use crate::traversal::Named;
use hls_ir::HlsInput;
use hls_utils::HlsResult;

/// Implements every schedulable operation type with its smallest compatible
/// resource type and provisions exactly one instance for it.
#[derive(Default)]
pub struct MinAreaAllocator;

impl Named for MinAreaAllocator {
    fn name() -> &'static str {
        "min-area"
    }

    fn description() -> &'static str {
        "smallest compatible resource type, one instance per operation type"
    }
}

impl Allocator for MinAreaAllocator {
    fn allocate(&mut self, input: &HlsInput) -> HlsResult<Allocation> {
        check_coverage(input)?;

        let n_op_type = input.cdfg.op_types.len();
        let mut op_resource = vec![None; n_op_type];
        let mut op_instances = vec![0; n_op_type];
        for (ot, cat) in input.cdfg.op_types.iter().enumerate() {
            if !cat.needs_schedule() {
                continue;
            }
            // first smallest wins
            op_resource[ot] = input
                .compatible_resources(ot)
                .min_by_key(|&rtid| input.library.resources[rtid].area);
            op_instances[ot] = 1;
        }

        let alloc =
            Allocation::new(input, op_resource, op_instances, Provisioning::Fixed);
        log::debug!(
            "min-area: {:?} with area {}",
            alloc.op_resource,
            alloc.area(input)
        );
        alloc.check_budget(input)?;
        Ok(alloc)
    }
}
