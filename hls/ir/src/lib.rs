//! # HLS Intermediate Representation
//!
//! Data structures shared by every pass of the synthesis pipeline:
//! - [Cdfg]: the control/data-flow graph, operations grouped into basic blocks.
//! - [ResourceLibrary]: the functional units available to implement operations.
//! - [Solution]: the allocation, schedule and binding built up by the passes.
//! - [DependencyGraph]: the per-block dependency graph and its topological sorts.
//!
//! The inputs are immutable once constructed; operations, blocks, operation
//! types and resource types are referred to by their dense indices.
mod cdfg;
mod graph;
mod library;
mod report;
mod solution;

pub use cdfg::{BasicBlock, Cdfg, OpCategory, Operation, OperationDef};
pub use graph::{DepNode, DependencyGraph};
pub use library::{ResourceLibrary, ResourceType};
pub use report::Report;
pub use solution::Solution;

use hls_utils::{Error, HlsResult};
use serde::Deserialize;

/// Index of an operation in [Cdfg::operations].
pub type OpId = usize;
/// Index of a basic block in [Cdfg::blocks].
pub type BlockId = usize;
/// Index of an operation type in [Cdfg::op_types].
pub type OpTypeId = usize;
/// Index of a resource type in [ResourceLibrary::resources].
pub type ResourceId = usize;

/// The complete input of a synthesis run: a resource library and a CDFG.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "InputDef")]
pub struct HlsInput {
    pub library: ResourceLibrary,
    pub cdfg: Cdfg,
}

#[derive(Deserialize)]
struct InputDef {
    library: ResourceLibrary,
    cdfg: Cdfg,
}

impl TryFrom<InputDef> for HlsInput {
    type Error = Error;
    fn try_from(def: InputDef) -> HlsResult<Self> {
        HlsInput::new(def.library, def.cdfg)
    }
}

impl HlsInput {
    /// Pair a library with a CDFG, checking that every compatibility entry
    /// names an existing operation type.
    pub fn new(library: ResourceLibrary, cdfg: Cdfg) -> HlsResult<Self> {
        let n_op_type = cdfg.op_types.len();
        for (rtid, rt) in library.resources.iter().enumerate() {
            if let Some(ot) = rt.compatible.iter().find(|&&ot| ot >= n_op_type)
            {
                return Err(Error::malformed(format!(
                    "resource type {rtid} lists unknown operation type {ot}"
                )));
            }
        }
        library.check_timing();
        Ok(HlsInput { library, cdfg })
    }

    /// Parse and validate an input from its JSON form.
    pub fn from_json<R: std::io::Read>(reader: R) -> HlsResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Category of the operation `op`.
    #[inline]
    pub fn category(&self, op: OpId) -> OpCategory {
        self.cdfg.category(op)
    }

    /// Resource types able to implement operation type `ot`.
    pub fn compatible_resources(
        &self,
        ot: OpTypeId,
    ) -> impl Iterator<Item = ResourceId> + '_ {
        self.library
            .resources
            .iter()
            .enumerate()
            .filter(move |(_, rt)| rt.is_compatible(ot))
            .map(|(rtid, _)| rtid)
    }
}
