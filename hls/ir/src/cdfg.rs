use crate::{BlockId, OpId, OpTypeId};
use hls_utils::{Error, HlsResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed taxonomy operation types are drawn from.
///
/// * BRANCH, ALLOCA and PHI are neither scheduled nor bound.
/// * LOAD and STORE are scheduled but never bound: memory ports are not
///   modeled, so they have an unlimited number of logical instances.
/// * ARITHMETIC, BOOLEAN and COMPARE are both scheduled and bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpCategory {
    Branch,
    Alloca,
    Load,
    Store,
    Phi,
    Arithmetic,
    Boolean,
    Compare,
}

impl OpCategory {
    /// Operations of this category get a start cycle.
    #[inline]
    pub fn needs_schedule(self) -> bool {
        !matches!(self, OpCategory::Branch | OpCategory::Alloca | OpCategory::Phi)
    }

    /// Operations of this category get a resource instance.
    #[inline]
    pub fn needs_bind(self) -> bool {
        matches!(
            self,
            OpCategory::Arithmetic | OpCategory::Boolean | OpCategory::Compare
        )
    }

    #[inline]
    pub fn is_memory(self) -> bool {
        matches!(self, OpCategory::Load | OpCategory::Store)
    }
}

impl fmt::Display for OpCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpCategory::Branch => "branch",
            OpCategory::Alloca => "alloca",
            OpCategory::Load => "load",
            OpCategory::Store => "store",
            OpCategory::Phi => "phi",
            OpCategory::Arithmetic => "arithmetic",
            OpCategory::Boolean => "boolean",
            OpCategory::Compare => "compare",
        };
        f.write_str(name)
    }
}

/// A basic block: an ordered list of operations plus its control edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub ops: Vec<OpId>,
    #[serde(default)]
    pub preds: Vec<BlockId>,
    #[serde(default)]
    pub succs: Vec<BlockId>,
    /// Expected number of executions, used for performance estimation.
    #[serde(default = "default_exp_times")]
    pub exp_times: f64,
}

fn default_exp_times() -> f64 {
    1.0
}

impl BasicBlock {
    pub fn new(
        ops: Vec<OpId>,
        preds: Vec<BlockId>,
        succs: Vec<BlockId>,
        exp_times: f64,
    ) -> Self {
        BasicBlock {
            ops,
            preds,
            succs,
            exp_times,
        }
    }
}

/// An operation as it appears in the input: its type and its operands.
/// `None` operands stand for values without a producer (constants, arguments).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OperationDef {
    pub op_type: OpTypeId,
    #[serde(default)]
    pub inputs: Vec<Option<OpId>>,
}

impl OperationDef {
    pub fn new<I>(op_type: OpTypeId, inputs: I) -> Self
    where
        I: IntoIterator<Item = Option<OpId>>,
    {
        OperationDef {
            op_type,
            inputs: inputs.into_iter().collect(),
        }
    }
}

/// An operation of the CDFG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub id: OpId,
    pub op_type: OpTypeId,
    pub inputs: Vec<Option<OpId>>,
    /// The block containing this operation.
    pub block: BlockId,
}

impl Operation {
    /// Operands that are produced by another operation.
    pub fn producers(&self) -> impl Iterator<Item = OpId> + '_ {
        self.inputs.iter().flatten().copied()
    }
}

/// Control/data-flow graph. Immutable after construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "CdfgDef")]
pub struct Cdfg {
    /// Category of every operation type.
    pub op_types: Vec<OpCategory>,
    pub blocks: Vec<BasicBlock>,
    pub operations: Vec<Operation>,
}

#[derive(Deserialize)]
struct CdfgDef {
    op_types: Vec<OpCategory>,
    blocks: Vec<BasicBlock>,
    operations: Vec<OperationDef>,
}

impl TryFrom<CdfgDef> for Cdfg {
    type Error = Error;
    fn try_from(def: CdfgDef) -> HlsResult<Self> {
        Cdfg::new(def.op_types, def.blocks, def.operations)
    }
}

impl Cdfg {
    /// Build a CDFG and check its structure: every operation lives in exactly
    /// one block, every reference is in range and no block has more than two
    /// successors.
    pub fn new(
        op_types: Vec<OpCategory>,
        blocks: Vec<BasicBlock>,
        operations: Vec<OperationDef>,
    ) -> HlsResult<Self> {
        let n_ops = operations.len();
        let n_blocks = blocks.len();

        let mut owner: Vec<Option<BlockId>> = vec![None; n_ops];
        for (bbid, bb) in blocks.iter().enumerate() {
            for &op in &bb.ops {
                let slot = owner.get_mut(op).ok_or_else(|| {
                    Error::malformed(format!(
                        "block {bbid} lists unknown operation {op}"
                    ))
                })?;
                if let Some(other) = slot.replace(bbid) {
                    return Err(Error::malformed(format!(
                        "operation {op} appears in blocks {other} and {bbid}"
                    )));
                }
            }
            if let Some(b) =
                bb.preds.iter().chain(&bb.succs).find(|&&b| b >= n_blocks)
            {
                return Err(Error::malformed(format!(
                    "block {bbid} refers to unknown block {b}"
                )));
            }
            if bb.succs.len() > 2 {
                return Err(Error::malformed(format!(
                    "block {bbid} has {} successors, at most 2 are allowed",
                    bb.succs.len()
                )));
            }
            if !bb.exp_times.is_finite() || bb.exp_times < 0.0 {
                return Err(Error::malformed(format!(
                    "block {bbid} has invalid execution frequency {}",
                    bb.exp_times
                )));
            }
        }

        let mut ops = Vec::with_capacity(n_ops);
        for (id, def) in operations.into_iter().enumerate() {
            let block = owner[id].ok_or_else(|| {
                Error::malformed(format!("operation {id} is not in any block"))
            })?;
            if def.op_type >= op_types.len() {
                return Err(Error::malformed(format!(
                    "operation {id} has unknown operation type {}",
                    def.op_type
                )));
            }
            if let Some(u) = def.inputs.iter().flatten().find(|&&u| u >= n_ops)
            {
                return Err(Error::malformed(format!(
                    "operation {id} reads unknown operation {u}"
                )));
            }
            ops.push(Operation {
                id,
                op_type: def.op_type,
                inputs: def.inputs,
                block,
            });
        }

        let cdfg = Cdfg {
            op_types,
            blocks,
            operations: ops,
        };
        for (bbid, bb) in cdfg.blocks.iter().enumerate() {
            if bb.succs.len() == 2
                && !bb
                    .ops
                    .iter()
                    .any(|&op| cdfg.category(op) == OpCategory::Branch)
            {
                log::warn!("block {bbid} has two successors but no branch");
            }
        }
        Ok(cdfg)
    }

    #[inline]
    pub fn category(&self, op: OpId) -> OpCategory {
        self.op_types[self.operations[op].op_type]
    }

    /// The entry block: the first block without predecessors.
    pub fn entry(&self) -> Option<BlockId> {
        self.blocks.iter().position(|bb| bb.preds.is_empty())
    }

    /// Operations that must be scheduled.
    pub fn schedulable_ops(&self) -> impl Iterator<Item = &Operation> + '_ {
        self.operations
            .iter()
            .filter(|op| self.op_types[op.op_type].needs_schedule())
    }
}
