use super::{op_type_limits, resource_limits, Limit, Scheduler};
use crate::traversal::Named;
use hls_ir::{BlockId, HlsInput, OpId, ResourceId, Solution};
use hls_utils::{Error, HlsResult};
use itertools::Itertools;
use std::collections::VecDeque;

/// Free issue slots of a bounded pool of instances.
struct Slots {
    /// `None` when the pool is not bounded.
    max: Option<u32>,
    available: u32,
    /// A pipelined instance accepts a new operation every cycle.
    pipelined: bool,
}

impl Slots {
    fn new(max: Option<u32>, pipelined: bool) -> Self {
        Slots {
            max,
            available: max.unwrap_or(0),
            pipelined,
        }
    }

    fn is_free(&self) -> bool {
        self.max.is_none() || self.available > 0
    }

    fn take(&mut self) {
        if self.max.is_some() {
            self.available -= 1;
        }
    }

    fn next_cycle(&mut self) {
        if self.pipelined {
            self.available = self.max.unwrap_or(0);
        }
    }

    fn release(&mut self) {
        if !self.pipelined && self.max.is_some() {
            self.available += 1;
        }
    }
}

/// Instances available to one operation type.
struct Unit {
    latency: u32,
    slots: Slots,
    /// Resource type whose instances the operation type shares with the
    /// other types mapped onto it. Only set for bindable types.
    resource: Option<ResourceId>,
    /// Issued operations and their start cycles, oldest first.
    in_flight: VecDeque<(OpId, u32)>,
}

impl Unit {
    /// Pop the oldest operation if its result is available at `cycle`.
    fn retire_one(&mut self, cycle: u32) -> Option<OpId> {
        let &(op, start) = self.in_flight.front()?;
        if start + self.latency + 1 > cycle {
            return None;
        }
        self.in_flight.pop_front();
        self.slots.release();
        Some(op)
    }
}

/// State of a list scheduling run over the whole CDFG.
struct ListState<'a> {
    input: &'a HlsInput,
    /// Producers of every operation that have not retired yet.
    pending: Vec<usize>,
    consumers: Vec<Vec<OpId>>,
    ready: Vec<OpId>,
    units: Vec<Unit>,
    /// Slots of every resource type, shared by all operation types mapped
    /// onto it.
    resources: Vec<Slots>,
    cycle: u32,
    /// Block of the last issued operation; its operations go first.
    current_block: Option<BlockId>,
    schedule: Vec<Option<u32>>,
    /// Schedulable operations that have not retired yet.
    remaining: usize,
}

impl<'a> ListState<'a> {
    fn new(
        input: &'a HlsInput,
        sol: &Solution,
        op_limits: Vec<Option<u32>>,
        rt_limits: Vec<Option<u32>>,
    ) -> Self {
        let cdfg = &input.cdfg;
        let n_ops = cdfg.operations.len();
        let mut pending = vec![0; n_ops];
        let mut consumers = vec![Vec::new(); n_ops];
        let mut ready = Vec::new();
        let mut remaining = 0;

        for op in cdfg.schedulable_ops() {
            remaining += 1;
            // never scheduled operations are resolved from the start
            for u in op.producers() {
                if cdfg.category(u).needs_schedule() {
                    pending[op.id] += 1;
                    consumers[u].push(op.id);
                }
            }
            if pending[op.id] == 0 {
                ready.push(op.id);
            }
        }

        let resources = &input.library.resources;
        let units = op_limits
            .into_iter()
            .enumerate()
            .map(|(ot, max)| {
                let rt = sol.op_resource[ot].map(|rtid| &resources[rtid]);
                Unit {
                    latency: rt.map_or(0, |rt| rt.latency),
                    slots: Slots::new(max, rt.is_some_and(|rt| rt.pipelined)),
                    resource: sol.op_resource[ot]
                        .filter(|_| cdfg.op_types[ot].needs_bind()),
                    in_flight: VecDeque::new(),
                }
            })
            .collect();
        let resources = rt_limits
            .into_iter()
            .zip(resources)
            .map(|(max, rt)| Slots::new(max, rt.pipelined))
            .collect();

        ListState {
            input,
            pending,
            consumers,
            ready,
            units,
            resources,
            cycle: 1,
            current_block: None,
            schedule: vec![None; n_ops],
            remaining,
        }
    }

    /// Issue ready operations in priority order while instances last.
    fn issue(&mut self) {
        let input = self.input;
        let ops = &input.cdfg.operations;
        let current = self.current_block;
        self.ready
            .sort_by_key(|&op| (Some(ops[op].block) != current, op));

        let mut waiting = Vec::new();
        for op in std::mem::take(&mut self.ready) {
            let unit = &mut self.units[ops[op].op_type];
            let shared = unit.resource.map(|rtid| &mut self.resources[rtid]);
            let free = unit.slots.is_free()
                && shared.as_deref().map_or(true, Slots::is_free);
            if free {
                unit.slots.take();
                if let Some(shared) = shared {
                    shared.take();
                }
                unit.in_flight.push_back((op, self.cycle));
                self.schedule[op] = Some(self.cycle);
                self.current_block = Some(ops[op].block);
            } else {
                waiting.push(op);
            }
        }
        self.ready = waiting;
    }

    /// Move to the next cycle, retiring finished operations.
    fn advance(&mut self) {
        self.cycle += 1;
        let mut done = Vec::new();
        for slots in &mut self.resources {
            slots.next_cycle();
        }
        for unit in &mut self.units {
            unit.slots.next_cycle();
            while let Some(op) = unit.retire_one(self.cycle) {
                if let Some(rtid) = unit.resource {
                    self.resources[rtid].release();
                }
                done.push(op);
            }
        }
        for op in done {
            self.remaining -= 1;
            for &v in &self.consumers[op] {
                self.pending[v] -= 1;
                if self.pending[v] == 0 {
                    self.ready.push(v);
                }
            }
        }
    }

    fn is_idle(&self) -> bool {
        self.units.iter().all(|u| u.in_flight.is_empty())
    }

    fn run(mut self, max_cycle: u32) -> HlsResult<Vec<Option<u32>>> {
        while self.remaining > 0 {
            if self.cycle > max_cycle {
                return Err(Error::cycle(format!(
                    "list scheduling did not finish within {max_cycle} cycles"
                )));
            }
            self.issue();
            if self.is_idle() {
                let stuck = self
                    .input
                    .cdfg
                    .schedulable_ops()
                    .filter(|op| self.schedule[op.id].is_none())
                    .map(|op| op.id)
                    .join(", ");
                return Err(Error::cycle(format!(
                    "operations [{stuck}] wait on each other"
                )));
            }
            self.advance();
        }
        Ok(self.schedule)
    }
}

/// Cycle-by-cycle list scheduling of the whole CDFG, starting at cycle 1.
///
/// Every cycle the ready operations are issued in priority order (operations
/// of the block issued last first, then by id) as long as their operation
/// type has a free instance and its resource type has a free instance
/// shared among all the operation types mapped onto it. An operation becomes
/// ready once all its producers have retired. Memory operations are never
/// bounded.
#[derive(Default)]
pub struct ListScheduler;

impl Named for ListScheduler {
    fn name() -> &'static str {
        "list"
    }

    fn description() -> &'static str {
        "resource-constrained list scheduling over the whole CDFG"
    }
}

impl Scheduler for ListScheduler {
    fn schedule(
        &mut self,
        input: &HlsInput,
        sol: &Solution,
        limit: Limit,
    ) -> HlsResult<Vec<Option<u32>>> {
        let op_limits = op_type_limits(input, sol, limit)?;
        let rt_limits = resource_limits(input, sol, limit)?;
        // a fully serial schedule always fits
        let max_cycle = input
            .cdfg
            .schedulable_ops()
            .map(|op| sol.latency_of(input, op.id) + 1)
            .sum::<u32>()
            + 1;
        ListState::new(input, sol, op_limits, rt_limits).run(max_cycle)
    }
}
