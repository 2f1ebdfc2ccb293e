use hls_ir::{BlockId, Cdfg, OpCategory};
use hls_utils::{Error, HlsResult};
use itertools::Itertools;
use std::collections::VecDeque;

/// Order in which basic blocks are scheduled.
///
/// Blocks are visited breadth-first from the entry block. A visited block is
/// finalized once every value it reads from other blocks is produced by an
/// already finalized block; PHI operands are exempt. Finalized blocks are
/// never revisited, so each block is scheduled exactly once.
pub fn block_order(cdfg: &Cdfg) -> HlsResult<Vec<BlockId>> {
    let n_blocks = cdfg.blocks.len();
    if n_blocks == 0 {
        return Ok(Vec::new());
    }
    let entry = cdfg.entry().ok_or_else(|| {
        Error::malformed("no entry block: every block has a predecessor")
    })?;

    let mut finished = vec![false; n_blocks];
    let mut visited = vec![false; n_blocks];
    let mut produced = vec![false; cdfg.operations.len()];
    let mut order = Vec::with_capacity(n_blocks);
    let mut queue = VecDeque::from([entry]);

    while let Some(bb) = queue.pop_front() {
        visited[bb] = true;
        if finished[bb] || !is_ready(cdfg, bb, &produced) {
            continue;
        }
        let block = &cdfg.blocks[bb];
        for &op in &block.ops {
            produced[op] = true;
        }
        finished[bb] = true;
        order.push(bb);
        queue.extend(block.succs.iter().copied());
    }

    if order.len() != n_blocks {
        let (stuck, unreachable): (Vec<_>, Vec<_>) =
            (0..n_blocks).filter(|&bb| !finished[bb]).partition(|&bb| visited[bb]);
        if !stuck.is_empty() {
            return Err(Error::cycle(format!(
                "blocks [{}] read values that are never produced before them",
                stuck.iter().join(", ")
            )));
        }
        return Err(Error::malformed(format!(
            "blocks [{}] are unreachable from entry block {entry}",
            unreachable.iter().join(", ")
        )));
    }
    Ok(order)
}

fn is_ready(cdfg: &Cdfg, bb: BlockId, produced: &[bool]) -> bool {
    cdfg.blocks[bb]
        .ops
        .iter()
        .filter(|&&op| cdfg.category(op) != OpCategory::Phi)
        .flat_map(|&op| cdfg.operations[op].producers())
        .all(|u| cdfg.operations[u].block == bb || produced[u])
}
