use log::debug;

use super::catalog::{AttributeSemantic, ScalarType};
use super::layout::VertexLayout;
use crate::error::RigError;

/// Per-vertex tuples of one source attribute. Lanes past the attribute's
/// element count are ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamValues {
    Float(Vec<[f32; 4]>),
    Int(Vec<[u32; 4]>),
}

/// A named source attribute stream (`_p0`, `_i0`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct VertexStream {
    pub name: String,
    pub values: StreamValues,
}

impl VertexStream {
    pub fn float(name: impl Into<String>, values: Vec<[f32; 4]>) -> Self {
        Self {
            name: name.into(),
            values: StreamValues::Float(values),
        }
    }

    pub fn int(name: impl Into<String>, values: Vec<[u32; 4]>) -> Self {
        Self {
            name: name.into(),
            values: StreamValues::Int(values),
        }
    }

    pub fn len(&self) -> usize {
        match &self.values {
            StreamValues::Float(values) => values.len(),
            StreamValues::Int(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lane(&self, vertex: usize, lane: usize) -> Scalar {
        match &self.values {
            StreamValues::Float(values) => Scalar::Float(values[vertex][lane]),
            StreamValues::Int(values) => Scalar::Int(values[vertex][lane]),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Scalar {
    Float(f32),
    Int(u32),
}

impl Scalar {
    fn as_f32(self) -> f32 {
        match self {
            Scalar::Float(value) => value,
            Scalar::Int(value) => value as f32,
        }
    }

    fn as_u32(self) -> u32 {
        match self {
            Scalar::Float(value) => value as u32,
            Scalar::Int(value) => value,
        }
    }

    fn write(self, scalar_type: ScalarType, out: &mut [u8]) {
        match scalar_type {
            ScalarType::Float => out.copy_from_slice(&self.as_f32().to_le_bytes()),
            ScalarType::Int => out.copy_from_slice(&self.as_u32().to_le_bytes()),
        }
    }
}

/// Vertex count shared by every stream of a mesh.
pub fn common_vertex_count(streams: &[VertexStream]) -> Result<usize, RigError> {
    let Some(first) = streams.first() else {
        return Ok(0);
    };

    let expected = first.len();
    for stream in &streams[1..] {
        if stream.len() != expected {
            return Err(RigError::StreamLengthMismatch {
                stream: stream.name.clone(),
                expected,
                found: stream.len(),
            });
        }
    }

    Ok(expected)
}

/// Interleaves vertex streams into one little-endian vertex buffer.
///
/// Fan-out duplicates rewrite the bytes at their shared offset.
///
/// # Arguments
///
/// * `streams` - Source attribute streams, all with the same vertex count.
/// * `layout` - Layout planned by [`plan_layout`](super::plan_layout).
/// * `bone_remap` - Mesh-local bone index to skeleton bone index; indices
///   outside the table pass through.
/// * `unit_scale` - Factor applied to every position lane.
///
/// # Returns
///
/// A buffer of exactly `vertex_count * layout.stride` bytes, or
/// `StreamLengthMismatch` when the streams disagree on vertex count.
pub fn transcode(
    streams: &[VertexStream],
    layout: &VertexLayout,
    bone_remap: Option<&[u32]>,
    unit_scale: f32,
) -> Result<Vec<u8>, RigError> {
    let vertex_count = common_vertex_count(streams)?;
    let stride = layout.stride;
    let mut buffer = vec![0u8; vertex_count * stride];

    let bindings: Vec<_> = layout
        .attributes
        .iter()
        .filter_map(|attribute| {
            let stream = streams.iter().find(|stream| stream.name == attribute.source);
            if stream.is_none() {
                debug!(
                    "no stream '{}' for planned attribute '{}'",
                    attribute.source, attribute.name
                );
            }
            stream.map(|stream| (attribute, stream))
        })
        .collect();

    for vertex in 0..vertex_count {
        for (attribute, stream) in &bindings {
            let scalar_size = attribute.scalar_type.byte_size();
            let base = vertex * stride + attribute.offset;

            for lane in 0..attribute.element_count {
                let value = match (attribute.semantic, stream.lane(vertex, lane)) {
                    (AttributeSemantic::BoneIndex, raw) => bone_remap
                        .and_then(|table| table.get(raw.as_u32() as usize))
                        .map(|&bone| Scalar::Int(bone))
                        .unwrap_or(raw),
                    (AttributeSemantic::Position, raw) => Scalar::Float(raw.as_f32() * unit_scale),
                    (_, raw) => raw,
                };

                let start = base + lane * scalar_size;
                value.write(attribute.scalar_type, &mut buffer[start..start + scalar_size]);
            }
        }
    }

    Ok(buffer)
}
