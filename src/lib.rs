//! Skeleton transform resolution and render-buffer packing for rigged models.
//!
//! [`skeleton`] resolves bone hierarchies into world and inverse-bind
//! matrices. [`vertex`] plans interleaved vertex layouts and flattens index
//! buffers. [`import`] reads glTF documents into a [`model::SourceModel`].

pub mod error;
pub mod import;
pub mod model;
pub mod settings;
pub mod skeleton;
pub mod vertex;

pub use error::RigError;
