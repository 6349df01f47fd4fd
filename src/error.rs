//! Render graph error types.

use thiserror::Error;

use crate::render_graph::BufferHandle;

/// Errors that can occur while compiling or running a render graph.
///
/// None of these are recoverable by retrying: compilation is deterministic,
/// so the same input fails the same way until the graph itself is changed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// An operation descriptor is internally inconsistent.
    #[error("malformed operation '{operation}': {reason}")]
    MalformedOperation { operation: String, reason: String },

    /// A buffer handle does not belong to the graph description.
    #[error("invalid buffer handle: {0:?}")]
    InvalidBufferHandle(BufferHandle),

    /// Some needed buffers can never be produced, either because no
    /// operation writes them or because of a cyclic dependency.
    #[error("render graph is unrealizable: unresolved buffers [{}]{}", .buffers.join(", "), blocked_suffix(.operations))]
    Unrealizable {
        buffers: Vec<String>,
        operations: Vec<String>,
    },

    /// The allocator or scheduler bookkeeping went inconsistent.
    #[error("allocator invariant violated: {0}")]
    AllocatorInvariant(String),

    /// The resource factory failed to create a physical resource.
    #[error("failed to create resource: {0}")]
    ResourceCreationFailed(String),

    /// `render` was called before a successful `setup`.
    #[error("render graph has not been compiled")]
    NotCompiled,
}

fn blocked_suffix(operations: &[String]) -> String {
    if operations.is_empty() {
        String::new()
    } else {
        format!(", blocked operations [{}]", operations.join(", "))
    }
}

impl GraphError {
    pub(crate) fn malformed(operation: &str, reason: impl Into<String>) -> Self {
        Self::MalformedOperation {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}

pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphError::Unrealizable {
            buffers: vec!["hdr".to_string(), "depth".to_string()],
            operations: vec![],
        };
        assert_eq!(
            err.to_string(),
            "render graph is unrealizable: unresolved buffers [hdr, depth]"
        );

        let err = GraphError::Unrealizable {
            buffers: vec!["a".to_string()],
            operations: vec!["blur".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "render graph is unrealizable: unresolved buffers [a], blocked operations [blur]"
        );

        let err = GraphError::malformed("ssao", "binding references absent port 'normal'");
        assert_eq!(
            err.to_string(),
            "malformed operation 'ssao': binding references absent port 'normal'"
        );
    }
}
