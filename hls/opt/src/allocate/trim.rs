use hls_ir::{HlsInput, ResourceId};
use hls_utils::{Error, HlsResult};
use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

/// Trimming priority of a resource type. The lowest value loses an instance
/// first.
struct Keep {
    value: f64,
    rtid: ResourceId,
}

impl Ord for Keep {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then_with(|| self.rtid.cmp(&other.rtid))
    }
}

impl PartialOrd for Keep {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Keep {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Keep {}

/// Remove instances from `resource_instances` until their total area fits
/// the area limit. Resource types are never trimmed below one instance.
///
/// The instance removed next is the one of least value
/// `exp_uses * (latency + 1) / (count * (count - 1))`, where `exp_uses` is
/// the expected number of executions of the operations mapped onto the
/// resource type.
pub fn trim_to_budget(
    input: &HlsInput,
    op_resource: &[Option<ResourceId>],
    resource_instances: &mut [u32],
) -> HlsResult<()> {
    let resources = &input.library.resources;
    let limit = u64::from(input.library.area_limit);
    let mut total: u64 = resource_instances
        .iter()
        .zip(resources)
        .map(|(&n, rt)| u64::from(n) * u64::from(rt.area))
        .sum();
    if total <= limit {
        return Ok(());
    }

    let mut exp_uses = vec![0.0f64; resources.len()];
    for op in &input.cdfg.operations {
        if let Some(rtid) = op_resource[op.op_type] {
            exp_uses[rtid] += input.cdfg.blocks[op.block].exp_times;
        }
    }
    let value = |rtid: ResourceId, count: u32| {
        let (lat, count) = (f64::from(resources[rtid].latency), f64::from(count));
        exp_uses[rtid] * (lat + 1.0) / (count * (count - 1.0))
    };

    let mut queue: BinaryHeap<Reverse<Keep>> = resource_instances
        .iter()
        .enumerate()
        .filter(|(_, &n)| n > 1)
        .map(|(rtid, &n)| {
            Reverse(Keep {
                value: value(rtid, n),
                rtid,
            })
        })
        .collect();

    while total > limit {
        let Some(Reverse(Keep { rtid, .. })) = queue.pop() else {
            return Err(Error::budget(format!(
                "area {total} still exceeds the limit {limit} with one instance per resource type"
            )));
        };
        resource_instances[rtid] -= 1;
        total -= u64::from(resources[rtid].area);
        log::debug!(
            "trim: resource type {rtid} down to {} instances",
            resource_instances[rtid]
        );
        if resource_instances[rtid] > 1 {
            queue.push(Reverse(Keep {
                value: value(rtid, resource_instances[rtid]),
                rtid,
            }));
        }
    }
    Ok(())
}

/// Share the instances of every resource type round-robin among the
/// operation types mapped onto it. Every operation type keeps at least one
/// instance, so when a resource type has fewer instances than users the
/// per-type counts add up to more than the resource count. Schedulers bound
/// the resource count separately.
pub fn clamp_op_instances(
    input: &HlsInput,
    op_resource: &[Option<ResourceId>],
    resource_instances: &[u32],
    op_instances: &mut [u32],
) {
    for (rtid, &available) in resource_instances.iter().enumerate() {
        let users: Vec<_> = op_resource
            .iter()
            .enumerate()
            .filter(|(ot, rt)| {
                **rt == Some(rtid) && input.cdfg.op_types[*ot].needs_bind()
            })
            .map(|(ot, _)| ot)
            .collect();
        if users.is_empty() {
            continue;
        }

        let wanted: Vec<u32> = users.iter().map(|&ot| op_instances[ot].max(1)).collect();
        let mut granted = vec![0u32; users.len()];
        let mut left = available;
        // round-robin so no type starves
        while left > 0 {
            let mut progressed = false;
            for (g, &w) in granted.iter_mut().zip(&wanted) {
                if left > 0 && *g < w {
                    *g += 1;
                    left -= 1;
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
        for (&ot, g) in users.iter().zip(granted) {
            op_instances[ot] = g.max(1);
        }
    }
}
