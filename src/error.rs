use thiserror::Error;

use crate::vertex::IndexWidth;

/// Structural failures raised before any output buffer is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RigError {
    #[error("bone '{bone}' lists itself as its parent")]
    SelfParent { bone: String },

    #[error("bone '{bone}' references parent index {parent} but the skeleton has {count} bones")]
    DanglingParent {
        bone: String,
        parent: usize,
        count: usize,
    },

    #[error("bone '{bone}' is part of a parent cycle")]
    ParentCycle { bone: String },

    #[error("bone name '{name}' appears more than once")]
    DuplicateBoneName { name: String },

    #[error("bone index {index} is out of range (bone count: {count})")]
    BoneOutOfRange { index: usize, count: usize },

    #[error("vertex stream '{stream}' has {found} vertices, expected {expected}")]
    StreamLengthMismatch {
        stream: String,
        expected: usize,
        found: usize,
    },

    #[error("submesh {submesh} index {value} does not fit {width:?} indices")]
    IndexOverflow {
        submesh: usize,
        value: u64,
        width: IndexWidth,
    },

    #[error("bind resolution is stale: taken at generation {taken}, skeleton is at {current}")]
    StaleResolution { taken: u64, current: u64 },
}
