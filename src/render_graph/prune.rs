//! Backward reachability from the required outputs.

use crate::error::{GraphError, GraphResult};
use crate::render_graph::description::GraphDescription;
use crate::render_graph::descriptor::BufferHandle;
use crate::render_graph::flatten::FlatOperation;

/// Select the operations needed to produce `required`.
///
/// Returns indices into `operations` in declaration order. Fails if some
/// needed buffer has no producer.
pub(crate) fn prune<R, C>(
    description: &GraphDescription<R, C>,
    operations: &[FlatOperation<'_>],
    required: &[BufferHandle],
) -> GraphResult<Vec<usize>> {
    let buffer_count = description.buffers().len();
    let mut needed = vec![false; buffer_count];
    let mut produced = vec![false; buffer_count];
    let mut selected = vec![false; operations.len()];

    for &buffer in required {
        description.buffer(buffer)?;
        needed[buffer.index()] = true;
    }

    // Every productive pass selects at least one operation.
    let max_passes = operations.len() + 1;
    let mut passes = 0;
    loop {
        passes += 1;
        if passes > max_passes {
            return Err(unresolved(description, &needed));
        }

        let mut changed = false;
        for (index, op) in operations.iter().enumerate() {
            if selected[index] || !op.outputs.iter().any(|o| needed[o.index()]) {
                continue;
            }

            selected[index] = true;
            changed = true;
            for output in &op.outputs {
                needed[output.index()] = false;
                produced[output.index()] = true;
            }
            for input in &op.inputs {
                if !produced[input.index()] {
                    needed[input.index()] = true;
                }
            }
        }

        if !changed {
            break;
        }
    }

    if needed.iter().any(|&n| n) {
        return Err(unresolved(description, &needed));
    }

    let selected: Vec<usize> = selected
        .iter()
        .enumerate()
        .filter_map(|(i, &s)| s.then_some(i))
        .collect();

    log::debug!(
        "Pruning kept {} of {} operations after {} passes",
        selected.len(),
        operations.len(),
        passes
    );

    Ok(selected)
}

fn unresolved<R, C>(description: &GraphDescription<R, C>, needed: &[bool]) -> GraphError {
    let buffers = needed
        .iter()
        .enumerate()
        .filter_map(|(i, &n)| n.then_some(i))
        .map(|i| description.buffer_name(BufferHandle::new(i)).to_string())
        .collect();

    GraphError::Unrealizable {
        buffers,
        operations: Vec::new(),
    }
}
