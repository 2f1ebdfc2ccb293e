//! Helpers shared by the integration tests.
#![allow(dead_code)]

use hls_ir::{
    BasicBlock, Cdfg, HlsInput, OpCategory, OperationDef, ResourceLibrary,
    ResourceType, Solution,
};
use std::collections::HashMap;

/// Three independent adds in one block, executed by a single non-pipelined
/// adder type of area 10 and latency 1.
pub fn three_adds(area_limit: u32) -> HlsInput {
    let library = ResourceLibrary::new(
        10.0,
        area_limit,
        vec![ResourceType::sequential(10, 1, false, 1.0, [0])],
    )
    .unwrap();
    let cdfg = Cdfg::new(
        vec![OpCategory::Arithmetic],
        vec![BasicBlock::new(vec![0, 1, 2], vec![], vec![], 1.0)],
        (0..3).map(|_| OperationDef::new(0, [None, None])).collect(),
    )
    .unwrap();
    HlsInput::new(library, cdfg).unwrap()
}

/// An independent add and compare in one block, both implemented by a
/// single non-pipelined resource type of area 10 and latency 1.
pub fn shared_alu(area_limit: u32) -> HlsInput {
    let library = ResourceLibrary::new(
        10.0,
        area_limit,
        vec![ResourceType::sequential(10, 1, false, 1.0, [0, 1])],
    )
    .unwrap();
    let cdfg = Cdfg::new(
        vec![OpCategory::Arithmetic, OpCategory::Compare],
        vec![BasicBlock::new(vec![0, 1], vec![], vec![], 1.0)],
        vec![
            OperationDef::new(0, [None, None]),
            OperationDef::new(1, [None, None]),
        ],
    )
    .unwrap();
    HlsInput::new(library, cdfg).unwrap()
}

/// A loop-shaped CDFG with every operation category.
///
/// Block 0 allocates and loads, block 1 is the loop header, block 2 the
/// body and block 3 stores the result.
pub fn loop_kernel(area_limit: u32) -> HlsInput {
    use OpCategory::*;
    let op_types = vec![
        Alloca, Load, Store, Phi, Arithmetic, Compare, Boolean, Branch,
    ];
    let library = ResourceLibrary::new(
        5.0,
        area_limit,
        vec![
            // memory port
            ResourceType::sequential(4, 1, true, 2.0, [1, 2]),
            ResourceType::sequential(12, 2, false, 3.0, [4]),
            ResourceType::sequential(20, 1, true, 2.5, [4]),
            ResourceType::combinational(3, 1.0, [5, 6]),
        ],
    )
    .unwrap();
    let blocks = vec![
        BasicBlock::new(vec![0, 1, 2, 3], vec![], vec![1], 1.0),
        BasicBlock::new(vec![4, 5, 6, 7], vec![0, 2], vec![2, 3], 10.0),
        BasicBlock::new(vec![8, 9, 10, 11, 12], vec![1], vec![1], 9.0),
        BasicBlock::new(vec![13, 14], vec![1], vec![], 1.0),
    ];
    let operations = vec![
        // block 0
        OperationDef::new(0, []),
        OperationDef::new(1, [Some(0)]),
        OperationDef::new(4, [Some(1), None]),
        OperationDef::new(7, []),
        // block 1
        OperationDef::new(3, [Some(2), Some(9)]),
        OperationDef::new(5, [Some(4), None]),
        OperationDef::new(6, [Some(5), None]),
        OperationDef::new(7, [Some(6)]),
        // block 2
        OperationDef::new(4, [Some(4), Some(2)]),
        OperationDef::new(4, [Some(8), None]),
        OperationDef::new(4, [Some(4), None]),
        OperationDef::new(5, [Some(10), Some(9)]),
        OperationDef::new(7, [Some(11)]),
        // block 3
        OperationDef::new(2, [Some(0), Some(4)]),
        OperationDef::new(7, []),
    ];
    let cdfg = Cdfg::new(op_types, blocks, operations).unwrap();
    HlsInput::new(library, cdfg).unwrap()
}

/// Check every property a valid solution has.
pub fn check_solution(input: &HlsInput, sol: &Solution) {
    let cdfg = &input.cdfg;
    let resources = &input.library.resources;

    for op in &cdfg.operations {
        let cat = cdfg.category(op.id);
        if cat.needs_schedule() {
            assert!(sol.schedule[op.id].is_some(), "op {} unscheduled", op.id);
        } else {
            assert_eq!(sol.schedule[op.id], None, "{cat} op {} scheduled", op.id);
        }
        if cat.needs_bind() {
            let rtid = sol.op_resource[op.op_type].expect("unmapped op type");
            let inst = sol.binding[op.id].expect("unbound op");
            assert!(
                inst < sol.resource_instances[rtid],
                "op {} bound to instance {inst} of {} instances",
                op.id,
                sol.resource_instances[rtid]
            );
            assert!(resources[rtid].is_compatible(op.op_type));
        } else {
            assert_eq!(sol.binding[op.id], None, "{cat} op {} bound", op.id);
        }
    }

    // dependency soundness
    for op in cdfg.schedulable_ops() {
        for u in op.producers() {
            if !cdfg.category(u).needs_schedule() {
                continue;
            }
            let (Some(cu), Some(cv)) = (sol.schedule[u], sol.schedule[op.id])
            else {
                panic!("schedulable operations without a cycle");
            };
            let lat = sol.latency_of(input, u);
            assert!(
                cv >= cu + lat + 1,
                "op {} at {cv} reads op {u} at {cu} with latency {lat}",
                op.id
            );
        }
    }

    // resource exclusivity
    let report = sol.report(input);
    let mut users: HashMap<(usize, u32), Vec<u32>> = HashMap::new();
    for op in &cdfg.operations {
        if let Some((rtid, inst)) = report.binding[op.id] {
            let cycle = sol.schedule[op.id].expect("bound but unscheduled");
            users.entry((rtid, inst)).or_default().push(cycle);
        }
    }
    for ((rtid, inst), cycles) in users {
        for (i, &a) in cycles.iter().enumerate() {
            for &b in &cycles[..i] {
                assert!(
                    !resources[rtid].overlaps(a, b),
                    "instance {inst} of resource type {rtid} used at {a} and {b}"
                );
            }
        }
    }

    // area bound
    assert!(
        sol.area(input) <= u64::from(input.library.area_limit),
        "area {} over the limit {}",
        sol.area(input),
        input.library.area_limit
    );
}
