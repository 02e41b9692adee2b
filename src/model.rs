use log::{debug, info};

use crate::error::RigError;
use crate::settings::PackSettings;
use crate::skeleton::BoneGraph;
use crate::vertex::{
    AttributeAssignment, FlattenedIndices, SubmeshIndices, VertexLayout, VertexStream,
    common_vertex_count, flatten_indices, plan_layout, transcode,
};

/// Geometry sharing one set of vertex streams, drawn with one material.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceShape {
    pub name: String,
    pub streams: Vec<VertexStream>,
    pub submeshes: Vec<SubmeshIndices>,
    pub assignment: AttributeAssignment,
}

/// A rigged model as handed over by an asset loader.
#[derive(Debug)]
pub struct SourceModel {
    pub name: String,
    pub skeleton: BoneGraph,
    pub shapes: Vec<SourceShape>,
}

/// Render-ready buffers for one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeBuffers {
    pub name: String,
    pub layout: VertexLayout,
    pub vertex_count: usize,
    pub vertices: Vec<u8>,
    pub indices: FlattenedIndices,
}

/// Plans, transcodes and flattens one shape.
///
/// # Arguments
///
/// * `skeleton` - Skeleton providing the skin remap table.
/// * `shape` - Streams, submeshes and material assignment of the shape.
/// * `settings` - Unit scale and remap switch.
///
/// # Returns
///
/// The shape's buffers, or the first structural error; nothing partial is
/// returned.
pub fn pack_shape(
    skeleton: &BoneGraph,
    shape: &SourceShape,
    settings: &PackSettings,
) -> Result<ShapeBuffers, RigError> {
    let vertex_count = common_vertex_count(&shape.streams)?;
    let layout = plan_layout(
        shape.streams.iter().map(|stream| stream.name.as_str()),
        &shape.assignment,
    );

    let remap = (settings.apply_skin_remap && !skeleton.remap_table().is_empty())
        .then(|| skeleton.remap_table());
    let vertices = transcode(&shape.streams, &layout, remap, settings.unit_scale)?;
    let indices = flatten_indices(&shape.submeshes)?;

    debug!(
        "packed shape '{}': {} vertices, stride {}, {} attributes, {} indices",
        shape.name,
        vertex_count,
        layout.stride,
        layout.attributes.len(),
        indices.index_count()
    );

    Ok(ShapeBuffers {
        name: shape.name.clone(),
        layout,
        vertex_count,
        vertices,
        indices,
    })
}

impl SourceModel {
    /// Pack every shape independently; a failing shape does not affect its
    /// siblings.
    pub fn pack_all(&self, settings: &PackSettings) -> Vec<Result<ShapeBuffers, RigError>> {
        info!(
            "packing {} shapes of '{}' ({} bones)",
            self.shapes.len(),
            self.name,
            self.skeleton.len()
        );
        self.shapes
            .iter()
            .map(|shape| pack_shape(&self.skeleton, shape, settings))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{Bone, BoneTransform};
    use crate::vertex::IndexWidth;

    fn skeleton() -> BoneGraph {
        BoneGraph::new(vec![
            Bone::new("root", None, BoneTransform::default()),
            Bone::new("arm", Some(0), BoneTransform::default()),
        ])
        .unwrap()
        .with_remap_table(vec![1, 0])
    }

    fn triangle_shape(name: &str) -> SourceShape {
        SourceShape {
            name: name.to_string(),
            streams: vec![
                VertexStream::float(
                    "_p0",
                    vec![
                        [0.0, 0.0, 0.0, 0.0],
                        [1.0, 0.0, 0.0, 0.0],
                        [0.0, 1.0, 0.0, 0.0],
                    ],
                ),
                VertexStream::int("_i0", vec![[0, 0, 0, 0], [1, 0, 0, 0], [0, 1, 0, 0]]),
            ],
            submeshes: vec![SubmeshIndices {
                indices: vec![0, 1, 2],
                first_vertex: 0,
                width: IndexWidth::U16,
            }],
            assignment: AttributeAssignment::new(),
        }
    }

    #[test]
    fn given_skinned_shape_when_packing_then_buffers_match_layout() {
        let settings = PackSettings {
            unit_scale: 0.5,
            ..PackSettings::default()
        };

        let buffers = pack_shape(&skeleton(), &triangle_shape("body"), &settings).expect("pack");

        assert_eq!(buffers.layout.stride, 12 + 16);
        assert_eq!(buffers.vertices.len(), 3 * 28);
        assert_eq!(buffers.indices.data.len(), 6);
        assert_eq!(&buffers.vertices[28..32], &0.5f32.to_le_bytes());
        assert_eq!(&buffers.vertices[12..16], &1u32.to_le_bytes());
    }

    #[test]
    fn given_remap_disabled_when_packing_then_bone_indices_are_raw() {
        let settings = PackSettings {
            apply_skin_remap: false,
            ..PackSettings::default()
        };

        let buffers = pack_shape(&skeleton(), &triangle_shape("body"), &settings).expect("pack");

        assert_eq!(&buffers.vertices[12..16], &0u32.to_le_bytes());
    }

    #[test]
    fn given_broken_sibling_when_packing_all_then_healthy_shape_still_packs() {
        let mut broken = triangle_shape("broken");
        broken.streams[1] = VertexStream::int("_i0", vec![[0, 0, 0, 0]]);
        let model = SourceModel {
            name: "sample".to_string(),
            skeleton: skeleton(),
            shapes: vec![triangle_shape("body"), broken],
        };

        let results = model.pack_all(&PackSettings::default());

        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(RigError::StreamLengthMismatch { .. })
        ));
    }
}
