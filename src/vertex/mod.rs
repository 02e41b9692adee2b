//! Interleaved vertex layout planning, vertex transcoding and index
//! flattening.

mod assignment;
mod catalog;
mod index;
mod layout;
mod transcode;

pub use assignment::{AssignmentEntry, AttributeAssignment};
pub use catalog::{AttributeSemantic, ScalarType, shader_name};
pub use index::{FlattenedIndices, IndexRun, IndexWidth, SubmeshIndices, flatten_indices};
pub use layout::{PlannedAttribute, VertexLayout, plan_layout};
pub use transcode::{StreamValues, VertexStream, common_vertex_count, transcode};
