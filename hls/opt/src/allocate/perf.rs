use super::{
    check_coverage, schedulable_types, Allocation, Allocator, Provisioning,
};
use crate::traversal::Named;
use hls_ir::{
    BlockId, DependencyGraph, HlsInput, OpTypeId, ResourceId, ResourceType,
};
use hls_utils::{Error, HlsResult};
use std::{cmp::Ordering, collections::BinaryHeap, collections::HashMap};

/// Abstract view of a basic block used for latency estimation.
///
/// `depths[ot][d]` counts the operations of type `ot` that sit at the end of
/// a chain of `d` operations of the same type. Operations at the same depth
/// can run in parallel, given enough instances.
struct Histogram {
    exp_times: f64,
    depths: Vec<Vec<u32>>,
}

impl Histogram {
    fn build(input: &HlsInput, block: BlockId) -> HlsResult<Self> {
        let cdfg = &input.cdfg;
        let graph = DependencyGraph::build(cdfg, block);
        let mut depth: HashMap<_, u32> =
            graph.iter().map(|(op, _)| (op, 0)).collect();

        for v in graph.topological_sort()? {
            let dv = depth[&v];
            let ty = cdfg.operations[v].op_type;
            for &u in graph.node(v).map(|n| n.succs.as_slice()).unwrap_or(&[])
            {
                if cdfg.operations[u].op_type == ty {
                    let du = depth.entry(u).or_insert(0);
                    *du = (*du).max(dv + 1);
                }
            }
        }

        let mut depths = vec![Vec::new(); cdfg.op_types.len()];
        for (op, _) in graph.iter() {
            let bucket: &mut Vec<u32> = &mut depths[cdfg.operations[op].op_type];
            let d = depth[&op] as usize;
            if bucket.len() <= d {
                bucket.resize(d + 1, 0);
            }
            bucket[d] += 1;
        }

        Ok(Histogram {
            exp_times: cdfg.blocks[block].exp_times,
            depths,
        })
    }

    /// Expected time spent on operations of type `ot` when they run on `n`
    /// instances of `rt`. Each depth level must finish before the next one.
    fn estimate(&self, ot: OpTypeId, rt: &ResourceType, n: u32, cp: f64) -> f64 {
        let n = f64::from(n);
        let lat = f64::from(rt.latency);
        let per_level = self.depths[ot].iter().map(|&count| {
            let count = f64::from(count);
            if rt.pipelined {
                cp * (lat + (count / n).floor()) + rt.delay
            } else {
                (count / n).ceil() * (cp * lat + rt.delay)
            }
        });
        per_level.sum::<f64>() * self.exp_times
    }
}

/// A candidate for one more instance of an operation type.
struct Increment {
    ot: OpTypeId,
    /// Instance count after committing this increment.
    count: u32,
    area: u32,
    old: f64,
    new: f64,
}

impl Increment {
    fn gain(&self) -> f64 {
        (self.old - self.new) / f64::from(self.area.max(1))
    }
}

// Higher gain first, then the smaller resulting count.
impl Ord for Increment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.gain()
            .total_cmp(&other.gain())
            .then_with(|| other.count.cmp(&self.count))
            .then_with(|| other.ot.cmp(&self.ot))
    }
}

impl PartialOrd for Increment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Increment {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Increment {}

/// Performance-driven allocation.
///
/// A knapsack over the area budget picks the resource type of every
/// operation type so that the estimated latency is minimal with one
/// instance each. The remaining area then goes, one instance at a time, to
/// the operation type with the best latency gain per unit of area.
#[derive(Default)]
pub struct PerfAllocator;

impl Named for PerfAllocator {
    fn name() -> &'static str {
        "perf"
    }

    fn description() -> &'static str {
        "latency-estimate knapsack over resource types, then greedy instance growth"
    }
}

impl PerfAllocator {
    fn estimate(
        input: &HlsInput,
        hists: &[Histogram],
        ot: OpTypeId,
        rtid: ResourceId,
        n: u32,
    ) -> f64 {
        let rt = &input.library.resources[rtid];
        let cp = input.library.target_cp;
        hists.iter().map(|h| h.estimate(ot, rt, n, cp)).sum()
    }

    /// Choose one resource type per schedulable operation type.
    fn choose_types(
        input: &HlsInput,
        hists: &[Histogram],
    ) -> HlsResult<Vec<Option<ResourceId>>> {
        let n_op_type = input.cdfg.op_types.len();
        // no choice needs more than the largest candidate of every type
        let widest: u64 = schedulable_types(input)
            .filter_map(|ot| {
                input
                    .compatible_resources(ot)
                    .map(|rtid| u64::from(input.library.resources[rtid].area))
                    .max()
            })
            .sum();
        let limit = widest.min(u64::from(input.library.area_limit)) as usize;

        // best[a]: minimal estimate of the types seen so far within area a
        let mut best = vec![0.0f64; limit + 1];
        let mut choice: Vec<Vec<Option<ResourceId>>> =
            vec![vec![None; limit + 1]; n_op_type];

        for (ot, cat) in input.cdfg.op_types.iter().enumerate() {
            if !cat.needs_schedule() {
                continue;
            }
            let mut candidates: Vec<ResourceId> =
                input.compatible_resources(ot).collect();
            candidates.sort_by_key(|&rtid| input.library.resources[rtid].area);

            let mut next = vec![f64::INFINITY; limit + 1];
            for rtid in candidates {
                let area = input.library.resources[rtid].area as usize;
                let cost = Self::estimate(input, hists, ot, rtid, 1);
                for a in area..=limit {
                    let cand = best[a - area] + cost;
                    if cand < next[a] {
                        next[a] = cand;
                        choice[ot][a] = Some(rtid);
                    }
                }
            }
            best = next;
        }

        if !best[limit].is_finite() {
            return Err(Error::budget(format!(
                "no choice of resource types fits in area {}",
                input.library.area_limit
            )));
        }

        let mut op_resource = vec![None; n_op_type];
        let mut a = limit;
        for ot in (0..n_op_type).rev() {
            if let Some(rtid) = choice[ot][a] {
                op_resource[ot] = Some(rtid);
                a -= input.library.resources[rtid].area as usize;
            }
        }
        log::debug!("perf: estimate {} with types {op_resource:?}", best[limit]);
        Ok(op_resource)
    }

    /// Spend the remaining area on extra instances.
    fn grow_instances(
        input: &HlsInput,
        hists: &[Histogram],
        op_resource: &[Option<ResourceId>],
    ) -> Vec<u32> {
        let limit = u64::from(input.library.area_limit);
        let mut counts = vec![0u32; op_resource.len()];
        let mut total = 0u64;
        let mut queue = BinaryHeap::new();

        for (ot, rtid) in op_resource.iter().enumerate() {
            let Some(rtid) = *rtid else { continue };
            let area = input.library.resources[rtid].area;
            counts[ot] = 1;
            total += u64::from(area);
            if input.cdfg.op_types[ot].needs_bind() {
                queue.push(Increment {
                    ot,
                    count: 2,
                    area,
                    old: Self::estimate(input, hists, ot, rtid, 1),
                    new: Self::estimate(input, hists, ot, rtid, 2),
                });
            }
        }

        while let Some(inc) = queue.pop() {
            if inc.gain() <= 0.0 || total + u64::from(inc.area) > limit {
                continue;
            }
            total += u64::from(inc.area);
            counts[inc.ot] = inc.count;
            log::debug!(
                "perf: operation type {} grows to {} instances",
                inc.ot,
                inc.count
            );
            if let Some(rtid) = op_resource[inc.ot] {
                queue.push(Increment {
                    count: inc.count + 1,
                    old: inc.new,
                    new: Self::estimate(input, hists, inc.ot, rtid, inc.count + 1),
                    ..inc
                });
            }
        }
        counts
    }
}

impl Allocator for PerfAllocator {
    fn allocate(&mut self, input: &HlsInput) -> HlsResult<Allocation> {
        check_coverage(input)?;
        let hists = (0..input.cdfg.blocks.len())
            .map(|bb| Histogram::build(input, bb))
            .collect::<HlsResult<Vec<_>>>()?;

        let op_resource = Self::choose_types(input, &hists)?;
        let op_instances = Self::grow_instances(input, &hists, &op_resource);
        let alloc =
            Allocation::new(input, op_resource, op_instances, Provisioning::Fixed);
        alloc.check_budget(input)?;
        Ok(alloc)
    }
}
