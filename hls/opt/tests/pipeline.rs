mod common;

use common::{check_solution, loop_kernel, shared_alu, three_adds};
use hls_ir::{
    BasicBlock, Cdfg, HlsInput, OpCategory, OperationDef, ResourceLibrary,
    ResourceType,
};
use hls_opt::{
    bind::{Binder, ExclusiveBinder, SharedBinder},
    AllocatorKind, BinderKind, Pipeline, PipelineConfig, SchedulerKind,
};

fn config(
    allocator: AllocatorKind,
    scheduler: SchedulerKind,
    binder: BinderKind,
) -> PipelineConfig {
    PipelineConfig {
        allocator,
        scheduler,
        binder,
    }
}

#[test]
fn one_instance_serializes_the_adds() {
    let input = three_adds(30);
    let sol = Pipeline::new(config(
        AllocatorKind::MinArea,
        SchedulerKind::List,
        BinderKind::Shared,
    ))
    .run(&input)
    .unwrap();
    check_solution(&input, &sol);
    assert_eq!(sol.schedule, vec![Some(1), Some(3), Some(5)]);
    assert_eq!(sol.resource_instances, vec![1]);
    assert_eq!(sol.report(&input).to_string(), "1 3 5\n1\n0 0\n0 0\n0 0\n");
}

#[test]
fn two_instances_alternate() {
    let input = three_adds(20);
    let sol = Pipeline::new(config(
        AllocatorKind::Perf,
        SchedulerKind::List,
        BinderKind::Shared,
    ))
    .run(&input)
    .unwrap();
    check_solution(&input, &sol);
    assert_eq!(sol.resource_instances, vec![2]);
    assert_eq!(sol.schedule, vec![Some(1), Some(1), Some(3)]);
    assert_eq!(sol.binding, vec![Some(0), Some(1), Some(0)]);
}

#[test]
fn canonical_pipeline_fits_the_budget() {
    let input = three_adds(20);
    let sol = Pipeline::new(PipelineConfig::default()).run(&input).unwrap();
    check_solution(&input, &sol);
    assert_eq!(sol.resource_instances, vec![2]);

    let input = loop_kernel(100);
    let sol = Pipeline::new(PipelineConfig::default()).run(&input).unwrap();
    check_solution(&input, &sol);
}

#[test]
fn one_shared_instance_serves_two_op_types() {
    let input = shared_alu(15);
    for &scheduler in SchedulerKind::ALL {
        let cfg = config(AllocatorKind::Ilp, scheduler, BinderKind::Shared);
        let sol = Pipeline::new(cfg)
            .run(&input)
            .unwrap_or_else(|e| panic!("{cfg}: {e}"));
        check_solution(&input, &sol);
        assert_eq!(sol.schedule, vec![Some(1), Some(3)], "{cfg}");
        assert_eq!(sol.binding, vec![Some(0), Some(0)], "{cfg}");
        assert_eq!(sol.resource_instances, vec![1], "{cfg}");
    }
}

#[test]
fn every_combination_is_valid() {
    let input = loop_kernel(100);
    for &allocator in AllocatorKind::ALL {
        for &scheduler in SchedulerKind::ALL {
            for &binder in BinderKind::ALL {
                let cfg = config(allocator, scheduler, binder);
                let sol = Pipeline::new(cfg)
                    .run(&input)
                    .unwrap_or_else(|e| panic!("{cfg}: {e}"));
                check_solution(&input, &sol);
            }
        }
    }
}

#[test]
fn cyclic_operands_abort_scheduling() {
    let library = ResourceLibrary::new(
        10.0,
        100,
        vec![ResourceType::sequential(10, 1, false, 1.0, [0])],
    )
    .unwrap();
    let cdfg = Cdfg::new(
        vec![OpCategory::Arithmetic],
        vec![BasicBlock::new(vec![0, 1], vec![], vec![], 1.0)],
        vec![OperationDef::new(0, [Some(1)]), OperationDef::new(0, [Some(0)])],
    )
    .unwrap();
    let input = HlsInput::new(library, cdfg).unwrap();
    for &scheduler in SchedulerKind::ALL {
        let err = Pipeline::new(config(
            AllocatorKind::MinArea,
            scheduler,
            BinderKind::Shared,
        ))
        .run(&input)
        .unwrap_err();
        assert_eq!(err.kind(), "cycle", "{scheduler}: {err}");
    }
}

#[test]
fn ilp_never_selects_useless_resources() {
    let library = ResourceLibrary::new(
        10.0,
        30,
        vec![
            ResourceType::combinational(1, 0.5, []),
            ResourceType::sequential(10, 1, false, 1.0, [0]),
        ],
    )
    .unwrap();
    let cdfg = Cdfg::new(
        vec![OpCategory::Arithmetic],
        vec![BasicBlock::new(vec![0, 1, 2], vec![], vec![], 1.0)],
        (0..3).map(|_| OperationDef::new(0, [None])).collect(),
    )
    .unwrap();
    let input = HlsInput::new(library, cdfg).unwrap();
    let sol = Pipeline::new(PipelineConfig::default()).run(&input).unwrap();
    check_solution(&input, &sol);
    assert_eq!(sol.op_resource, vec![Some(1)]);
    assert_eq!(sol.resource_instances[0], 0);
}

#[test]
fn rebinding_gives_the_same_instances() {
    let input = loop_kernel(100);
    for binder in BinderKind::ALL {
        let sol = Pipeline::new(config(
            AllocatorKind::MinArea,
            SchedulerKind::List,
            *binder,
        ))
        .run(&input)
        .unwrap();
        let again = match binder {
            BinderKind::Exclusive => ExclusiveBinder.bind(&input, &sol),
            BinderKind::Shared => SharedBinder.bind(&input, &sol),
        }
        .unwrap();
        assert_eq!(again, sol.binding);
    }
}

#[test]
fn impossible_budgets_fail() {
    let input = three_adds(5);
    for &allocator in AllocatorKind::ALL {
        let err = Pipeline::new(config(
            allocator,
            SchedulerKind::List,
            BinderKind::Shared,
        ))
        .run(&input)
        .unwrap_err();
        assert!(
            matches!(err.kind(), "budget" | "solver"),
            "{allocator}: {err}"
        );
    }
}
