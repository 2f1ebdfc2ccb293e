mod common;

use common::check_solution;
use hls_ir::{
    BasicBlock, Cdfg, HlsInput, OpCategory, OperationDef, ResourceLibrary,
    ResourceType,
};
use hls_opt::{AllocatorKind, BinderKind, Pipeline, PipelineConfig, SchedulerKind};
use proptest::{prelude::*, sample::Index};

const OP_TYPES: [OpCategory; 5] = [
    OpCategory::Arithmetic,
    OpCategory::Compare,
    OpCategory::Load,
    OpCategory::Phi,
    OpCategory::Boolean,
];

prop_compose! {
    /// A chain of blocks whose operations only read earlier operations, so
    /// every dependency points forward.
    fn arb_cdfg()(
        ops in prop::collection::vec(
            (0..OP_TYPES.len(), any::<bool>(), prop::collection::vec(any::<Index>(), 0..3)),
            1..16,
        ),
    ) -> Cdfg {
        let mut owner = Vec::with_capacity(ops.len());
        let mut n_blocks = 1;
        for (id, (_, new_block, _)) in ops.iter().enumerate() {
            if *new_block && id > 0 {
                n_blocks += 1;
            }
            owner.push(n_blocks - 1);
        }
        let blocks = (0..n_blocks)
            .map(|bb| {
                let members = (0..ops.len()).filter(|&op| owner[op] == bb).collect();
                let preds = if bb > 0 { vec![bb - 1] } else { vec![] };
                let succs = if bb + 1 < n_blocks { vec![bb + 1] } else { vec![] };
                BasicBlock::new(members, preds, succs, (bb + 1) as f64)
            })
            .collect();
        let operations = ops
            .iter()
            .enumerate()
            .map(|(id, (ot, _, inputs))| {
                let inputs = inputs
                    .iter()
                    .map(|idx| (id > 0).then(|| idx.index(id)));
                OperationDef::new(*ot, inputs)
            })
            .collect();
        Cdfg::new(OP_TYPES.to_vec(), blocks, operations).unwrap()
    }
}

prop_compose! {
    /// A roomy budget over a library with alternative resource types.
    fn arb_input()(
        cdfg in arb_cdfg(),
        latency in 0..4u32,
        pipelined in any::<bool>(),
        shared_compare in any::<bool>(),
    ) -> HlsInput {
        let adder_ops = if shared_compare { vec![0, 1, 4] } else { vec![0, 4] };
        let library = ResourceLibrary::new(
            10.0,
            1000,
            vec![
                ResourceType::sequential(10, latency, pipelined, 2.0, adder_ops),
                ResourceType::combinational(3, 1.0, [1, 4]),
                ResourceType::sequential(5, 1, true, 1.0, [2]),
            ],
        )
        .unwrap();
        HlsInput::new(library, cdfg).unwrap()
    }
}

prop_compose! {
    /// Every bindable operation type runs on one ALU type, and the budget
    /// leaves room for a single ALU next to the memory port.
    fn arb_tight_input()(
        cdfg in arb_cdfg(),
        latency in 0..4u32,
        pipelined in any::<bool>(),
        slack in 0..5u32,
    ) -> HlsInput {
        let library = ResourceLibrary::new(
            10.0,
            15 + slack,
            vec![
                ResourceType::sequential(10, latency, pipelined, 2.0, [0, 1, 4]),
                ResourceType::sequential(5, 1, true, 1.0, [2]),
            ],
        )
        .unwrap();
        HlsInput::new(library, cdfg).unwrap()
    }
}

fn configs() -> impl Iterator<Item = PipelineConfig> {
    AllocatorKind::ALL.iter().flat_map(|&allocator| {
        SchedulerKind::ALL.iter().flat_map(move |&scheduler| {
            BinderKind::ALL.iter().map(move |&binder| PipelineConfig {
                allocator,
                scheduler,
                binder,
            })
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn pipelines_produce_valid_solutions(input in arb_input()) {
        for config in configs() {
            let sol = Pipeline::new(config).run(&input);
            prop_assert!(sol.is_ok(), "{}: {:?}", config, sol.as_ref().err());
            let sol = sol.unwrap();
            check_solution(&input, &sol);

            let again = config.binder.bind(&input, &sol)?;
            prop_assert_eq!(&again, &sol.binding);
        }
    }

    #[test]
    fn tight_budgets_share_one_alu(input in arb_tight_input()) {
        for config in configs() {
            match Pipeline::new(config).run(&input) {
                Ok(sol) => {
                    check_solution(&input, &sol);
                    prop_assert!(sol.resource_instances[0] <= 1, "{}", config);
                }
                // per-type provisioning may not fit, a shared ILP plan always does
                Err(err) => prop_assert!(
                    err.kind() == "budget"
                        && !(config.allocator == AllocatorKind::Ilp
                            && config.binder == BinderKind::Shared),
                    "{}: {}",
                    config,
                    err
                ),
            }
        }
    }
}
